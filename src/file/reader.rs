// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The file reader (tail metadata parsing, dialect selection) and the
//! record reader that drives stripe and row-group iteration.

use std::cmp;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use chrono_tz::Tz;
use prost::Message;

use crate::basic::{CompressionKind, OrcTypeKind};
use crate::column::reader::{create_column_reader, ColumnReader, ReaderContext};
use crate::column::vector::{Batch, ColumnVector};
use crate::errors::{OrcError, Result};
use crate::file::stripe::{region_sources, stripe_layout, RowGroupPositions, StripeSources};
use crate::metadata::{DwrfMetadataReader, Footer, Metadata, MetadataReader, OrcMetadataReader,
                      OrcType, PostScript, RowGroupIndex, StripeInformation};
use crate::predicate::TupleDomain;
use crate::proto;
use crate::stream::OrcByteSource;
use crate::util::io::OrcDataSource;
use crate::util::memory::BytePtr;

/// How many bytes to read in the first read from the file tail.
/// Ideally covers the postscript, footer and metadata sections.
const EXPECTED_TAIL_SIZE: u64 = 16 * 1024;

/// Caller-facing batch size bounds.
const MIN_BATCH_SIZE: usize = 1;
const MAX_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrcDialect {
  ORC,
  DWRF
}

fn metadata_reader_for(dialect: OrcDialect) -> Box<dyn MetadataReader> {
  match dialect {
    OrcDialect::ORC => Box::new(OrcMetadataReader),
    OrcDialect::DWRF => Box::new(DwrfMetadataReader)
  }
}

/// A postscript that parses with an empty version list and no metadata
/// section length is a DWRF postscript.
fn detect_dialect(postscript_bytes: &[u8]) -> OrcDialect {
  match proto::orc::PostScript::decode(postscript_bytes) {
    Ok(ps) if ps.version.is_empty() && ps.metadata_length.is_none() => OrcDialect::DWRF,
    _ => OrcDialect::ORC
  }
}

/// Decompresses a whole tail section or stripe footer region. With
/// `NONE` this is a zero-copy pass-through.
fn decompress_region(region: BytePtr, compression: CompressionKind, block_size: usize)
    -> Result<BytePtr> {
  OrcByteSource::new(region, compression, block_size)?.read_to_end()
}


// ----------------------------------------------------------------------
// File reader

/// An open ORC or DWRF file: the parsed tail metadata plus the data
/// source. Record readers over (disjoint ranges of) the file are
/// created from this.
pub struct OrcReader {
  data_source: Rc<dyn OrcDataSource>,
  dialect: OrcDialect,
  postscript: PostScript,
  footer: Footer,
  metadata: Metadata
}

impl fmt::Debug for OrcReader {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OrcReader")
      .field("dialect", &self.dialect)
      .field("postscript", &self.postscript)
      .field("footer", &self.footer)
      .field("metadata", &self.metadata)
      .finish()
  }
}

impl OrcReader {
  /// Reads and parses the file tail: the one-byte postscript length,
  /// the postscript, the footer and (for ORC) the metadata section.
  /// The dialect is auto-detected unless `dialect_hint` pins it.
  pub fn open(data_source: Rc<dyn OrcDataSource>, dialect_hint: Option<OrcDialect>)
      -> Result<OrcReader> {
    let size = data_source.size();
    if size < 2 {
      return Err(malformed_err!("File of {} bytes cannot hold a postscript", size));
    }

    let tail_size = cmp::min(EXPECTED_TAIL_SIZE, size);
    let tail_start = size - tail_size;
    let tail = data_source.read(tail_start, tail_size as usize)?;

    let postscript_length = tail.slice()[tail.len() - 1] as usize;
    if postscript_length + 1 > tail.len() {
      return Err(malformed_err!(
        "Postscript of {} bytes does not fit a {} byte file", postscript_length, size));
    }
    let postscript_bytes = tail.range(tail.len() - 1 - postscript_length, postscript_length);

    let dialect = dialect_hint
      .unwrap_or_else(|| detect_dialect(postscript_bytes.slice()));
    let metadata_reader = metadata_reader_for(dialect);
    let postscript = metadata_reader.read_postscript(postscript_bytes.slice())?;
    let compression = postscript.compression;
    let block_size = postscript.compression_block_size as usize;

    let tail_sections = 1 + postscript_length as u64
      + postscript.footer_length + postscript.metadata_length;
    if tail_sections > size {
      return Err(malformed_err!(
        "Tail sections of {} bytes do not fit a {} byte file", tail_sections, size));
    }
    let footer_offset = size - 1 - postscript_length as u64 - postscript.footer_length;
    let metadata_offset = footer_offset - postscript.metadata_length;

    // sections usually sit inside the first tail read; fall back to a
    // direct read when the tail is larger than the initial chunk
    let section = |offset: u64, length: u64| -> Result<BytePtr> {
      if length == 0 {
        return Ok(BytePtr::empty());
      }
      if offset >= tail_start {
        Ok(tail.range((offset - tail_start) as usize, length as usize))
      } else {
        data_source.read(offset, length as usize)
      }
    };

    let footer_bytes = decompress_region(
      section(footer_offset, postscript.footer_length)?, compression, block_size)?;
    let footer = metadata_reader.read_footer(footer_bytes.slice())?;

    let metadata = if postscript.metadata_length > 0 {
      let metadata_bytes = decompress_region(
        section(metadata_offset, postscript.metadata_length)?, compression, block_size)?;
      metadata_reader.read_metadata(metadata_bytes.slice())?
    } else {
      Metadata { stripe_statistics: vec![] }
    };

    log::debug!("opened {:?} file: {} rows, {} stripes, {} compression",
                dialect, footer.number_of_rows, footer.stripes.len(), compression);

    Ok(OrcReader { data_source, dialect, postscript, footer, metadata })
  }

  pub fn dialect(&self) -> OrcDialect {
    self.dialect
  }

  pub fn postscript(&self) -> &PostScript {
    &self.postscript
  }

  pub fn footer(&self) -> &Footer {
    &self.footer
  }

  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }

  pub fn record_reader(&self, options: RecordReaderOptions) -> Result<OrcRecordReader> {
    OrcRecordReader::new(self, options)
  }
}


// ----------------------------------------------------------------------
// Record reader

pub struct RecordReaderOptions {
  /// Type ids of the root's children to materialize; empty means all.
  pub included_columns: HashSet<u32>,
  pub predicate: TupleDomain,
  /// Byte range of the file to scan: a stripe is taken when its region
  /// overlaps the range.
  pub offset: u64,
  pub length: u64,
  pub storage_time_zone: Tz,
  pub session_time_zone: Tz,
  pub batch_size: usize
}

impl Default for RecordReaderOptions {
  fn default() -> Self {
    Self {
      included_columns: HashSet::new(),
      predicate: TupleDomain::all(),
      offset: 0,
      length: u64::MAX,
      storage_time_zone: Tz::UTC,
      session_time_zone: Tz::UTC,
      batch_size: 1024
    }
  }
}

#[derive(Clone, Copy)]
struct GroupPlan {
  rows: usize,
  selected: bool
}

struct CurrentStripe {
  /// Parsed row indexes per read column, when this stripe needed them
  /// (a non-trivial predicate or row-group dictionaries).
  row_indexes: Option<HashMap<u32, Vec<RowGroupIndex>>>,
  groups: Vec<GroupPlan>,
  next_group: usize,
  /// Rows not yet served from the group most recently entered.
  rows_left: usize
}

/// Pulls batches over the selected stripes of a file. A single reader
/// is a single-threaded state machine; parallel scans use several
/// readers over disjoint byte ranges. Any error closes the reader for
/// good.
pub struct OrcRecordReader {
  data_source: Rc<dyn OrcDataSource>,
  metadata_reader: Box<dyn MetadataReader>,
  compression: CompressionKind,
  block_size: usize,
  types: Vec<OrcType>,
  row_index_stride: usize,
  predicate: TupleDomain,
  batch_size: usize,
  /// Column ids whose streams this reader touches: the included root
  /// children plus their subtrees.
  read_columns: HashSet<u32>,
  column_readers: Vec<Box<dyn ColumnReader>>,
  /// Selected stripes with their ordinal in the footer.
  stripes: Vec<(usize, StripeInformation)>,
  next_stripe: usize,
  current: Option<CurrentStripe>,
  batch: Batch,
  poisoned: bool
}

fn collect_subtree(types: &[OrcType], id: u32, out: &mut HashSet<u32>) {
  if out.insert(id) {
    if let Some(tp) = types.get(id as usize) {
      for child in &tp.children {
        collect_subtree(types, *child, out);
      }
    }
  }
}

impl OrcRecordReader {
  fn new(reader: &OrcReader, options: RecordReaderOptions) -> Result<OrcRecordReader> {
    let footer = &reader.footer;
    let types = footer.types.clone();
    let root = types.first()
      .ok_or_else(|| corrupt_err!("File has an empty type tree"))?;

    // the root is a struct of the file's columns; non-struct roots
    // degenerate to a single column 0
    let candidates: Vec<u32> = if root.kind == OrcTypeKind::STRUCT {
      root.children.clone()
    } else {
      vec![0]
    };
    let included: Vec<u32> = candidates.into_iter()
      .filter(|id| options.included_columns.is_empty()
              || options.included_columns.contains(id))
      .collect();
    if included.is_empty() {
      return Err(malformed_err!("None of the included columns exist in the file"));
    }

    let mut read_columns = HashSet::new();
    for id in &included {
      collect_subtree(&types, *id, &mut read_columns);
    }

    let context = ReaderContext {
      storage_time_zone: options.storage_time_zone,
      session_time_zone: options.session_time_zone
    };
    let mut column_readers = Vec::with_capacity(included.len());
    let mut columns = Vec::with_capacity(included.len());
    for id in &included {
      column_readers.push(create_column_reader(&types, *id, &context)?);
      columns.push(ColumnVector::for_type(&types, *id)?);
    }

    // stripe selection: byte range overlap, then stripe statistics
    let range_end = options.offset.saturating_add(options.length);
    let mut stripes = Vec::new();
    for (ordinal, stripe) in footer.stripes.iter().enumerate() {
      let stripe_end = stripe.offset + stripe.total_length();
      if stripe_end <= options.offset || stripe.offset >= range_end {
        continue;
      }
      if let Some(stats) = reader.metadata.stripe_statistics.get(ordinal) {
        let rows = stripe.number_of_rows as u64;
        if !options.predicate.matches(rows, |c| stats.column_statistics.get(c as usize)) {
          log::debug!("stripe {} pruned by stripe statistics", ordinal);
          continue;
        }
      }
      stripes.push((ordinal, stripe.clone()));
    }

    Ok(OrcRecordReader {
      data_source: reader.data_source.clone(),
      metadata_reader: metadata_reader_for(reader.dialect),
      compression: reader.postscript.compression,
      block_size: reader.postscript.compression_block_size as usize,
      types,
      row_index_stride: footer.row_index_stride as usize,
      predicate: options.predicate,
      batch_size: cmp::max(MIN_BATCH_SIZE, cmp::min(options.batch_size, MAX_BATCH_SIZE)),
      read_columns,
      column_readers,
      stripes,
      next_stripe: 0,
      current: None,
      batch: Batch { row_count: 0, columns },
      poisoned: false
    })
  }

  /// Serves the next batch of at most `batch_size` rows, never crossing
  /// a row-group boundary. `None` once every selected stripe is
  /// exhausted. After an error the reader only reports `Closed`.
  pub fn next_batch(&mut self) -> Result<Option<&Batch>> {
    if self.poisoned {
      return Err(OrcError::Closed);
    }
    match self.advance() {
      Ok(true) => Ok(Some(&self.batch)),
      Ok(false) => Ok(None),
      Err(e) => {
        self.close();
        Err(e)
      }
    }
  }

  /// Releases the current stripe's buffers and refuses further reads.
  pub fn close(&mut self) {
    self.poisoned = true;
    self.current = None;
  }

  fn advance(&mut self) -> Result<bool> {
    loop {
      if self.current.is_none() {
        if self.next_stripe >= self.stripes.len() {
          return Ok(false);
        }
        let (ordinal, stripe) = self.stripes[self.next_stripe].clone();
        self.next_stripe += 1;
        self.current = self.open_stripe(ordinal, &stripe)?;
        continue;
      }

      let mut current = self.current.take().expect("current stripe");
      if current.rows_left == 0 && !self.advance_group(&mut current)? {
        // stripe exhausted; drop it and move on
        continue;
      }
      let rows = cmp::min(self.batch_size, current.rows_left);
      for (reader, vector) in self.column_readers.iter_mut()
          .zip(self.batch.columns.iter_mut()) {
        reader.next_batch(rows, vector)?;
      }
      self.batch.row_count = rows;
      current.rows_left -= rows;
      self.current = Some(current);
      return Ok(true);
    }
  }

  /// Moves to the next surviving row group: seeks via the row-group
  /// positions when indexes were read, crosses rejected groups with
  /// `skip` otherwise.
  fn advance_group(&mut self, current: &mut CurrentStripe) -> Result<bool> {
    while current.next_group < current.groups.len() {
      let group = current.next_group;
      let plan = current.groups[group];
      if plan.selected {
        if let Some(ref row_indexes) = current.row_indexes {
          let positions = RowGroupPositions::for_group(row_indexes, group)?;
          for reader in self.column_readers.iter_mut() {
            reader.start_row_group(&positions)?;
          }
        }
        current.rows_left = plan.rows;
        current.next_group += 1;
        return Ok(true);
      }
      if current.row_indexes.is_none() {
        for reader in self.column_readers.iter_mut() {
          reader.skip(plan.rows);
        }
      }
      current.next_group += 1;
    }
    Ok(false)
  }

  /// Opens one stripe: stripe footer, stream layout, row indexes and
  /// row-group pruning, then stream wiring. Answers `None` when the
  /// predicate rejects every row group, in which case no data-region
  /// bytes are read.
  fn open_stripe(&mut self, ordinal: usize, stripe: &StripeInformation)
      -> Result<Option<CurrentStripe>> {
    let footer_offset = stripe.offset + stripe.index_length + stripe.data_length;
    let footer_region =
      self.data_source.read(footer_offset, stripe.footer_length as usize)?;
    let footer_bytes =
      decompress_region(footer_region, self.compression, self.block_size)?;
    let stripe_footer =
      self.metadata_reader.read_stripe_footer(&self.types, footer_bytes.slice())?;

    let layouts: Vec<_> = stripe_layout(stripe, &stripe_footer)?
      .into_iter()
      .filter(|l| self.read_columns.contains(&l.column))
      .collect();

    let has_row_group_dictionary = layouts.iter()
      .any(|l| l.kind == crate::basic::StreamKind::IN_DICTIONARY);
    let has_row_indexes = layouts.iter()
      .any(|l| l.kind == crate::basic::StreamKind::ROW_INDEX);
    let need_positions = !self.predicate.is_all() || has_row_group_dictionary;
    if has_row_group_dictionary && !has_row_indexes {
      return Err(corrupt_err!(
        "Stripe {} uses row group dictionaries but has no row index", ordinal));
    }

    let row_indexes = if need_positions && has_row_indexes {
      let index_region =
        self.data_source.read(stripe.offset, stripe.index_length as usize)?;
      let mut index_sources = StripeSources::new(self.compression, self.block_size);
      region_sources(&mut index_sources, &layouts, 0, &index_region, true)?;
      let mut map = HashMap::new();
      for layout in &layouts {
        if layout.kind != crate::basic::StreamKind::ROW_INDEX {
          continue;
        }
        let mut source = index_sources.byte_source(layout.column, layout.kind)?
          .expect("row index stream was just inserted");
        let bytes = source.read_to_end()?;
        map.insert(layout.column, self.metadata_reader.read_row_indexes(bytes.slice())?);
      }
      Some(map)
    } else {
      None
    };

    // row-group pruning against the index statistics
    let total_rows = stripe.number_of_rows;
    let stride = self.row_index_stride;
    let group_count = if stride == 0 {
      1
    } else {
      (total_rows + stride - 1) / stride
    };
    let mut groups = Vec::with_capacity(group_count);
    let mut survivors = 0;
    for group in 0..group_count {
      let rows = if stride == 0 {
        total_rows
      } else {
        cmp::min(stride, total_rows - group * stride)
      };
      let selected = match row_indexes {
        Some(ref map) if !self.predicate.is_all() => {
          self.predicate.matches(rows as u64, |c| {
            map.get(&c).and_then(|entries| entries.get(group)).map(|e| &e.statistics)
          })
        },
        _ => true
      };
      if selected {
        survivors += 1;
      }
      groups.push(GroupPlan { rows, selected });
    }
    if survivors == 0 {
      log::debug!("stripe {} pruned: all {} row groups rejected", ordinal, group_count);
      return Ok(None);
    }
    log::debug!("stripe {}: reading {} of {} row groups", ordinal, survivors, group_count);

    let data_region = self.data_source
      .read(stripe.offset + stripe.index_length, stripe.data_length as usize)?;
    let mut sources = StripeSources::new(self.compression, self.block_size);
    region_sources(&mut sources, &layouts, stripe.index_length, &data_region, false)?;

    for reader in self.column_readers.iter_mut() {
      reader.start_stripe(&sources, &stripe_footer)?;
    }

    Ok(Some(CurrentStripe {
      row_indexes,
      groups,
      next_group: 0,
      rows_left: 0
    }))
  }
}



#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;

  use crate::predicate::{Domain, OrcValue};
  use crate::proto::dwrf as fb;
  use crate::proto::orc as pb;
  use crate::util::io::MemoryDataSource;

  // ----------------------------------------------------------------------
  // In-memory file assembly

  struct TestStream {
    column: u32,
    kind: i32,
    bytes: Vec<u8>
  }

  fn stream(column: u32, kind: pb::stream::Kind, bytes: Vec<u8>) -> TestStream {
    TestStream { column, kind: kind as i32, bytes }
  }

  struct TestStripe {
    rows: u64,
    streams: Vec<TestStream>
  }

  struct TestFile {
    compression: pb::CompressionKind,
    types: Vec<pb::Type>,
    encodings: Vec<(pb::column_encoding::Kind, u32)>,
    stripes: Vec<TestStripe>,
    stride: u32,
    /// Per-stripe column statistics for the metadata section.
    stripe_stats: Option<Vec<Vec<pb::ColumnStatistics>>>
  }

  fn frame(compression: pb::CompressionKind, payload: &[u8]) -> Vec<u8> {
    match compression {
      pb::CompressionKind::None => payload.to_vec(),
      pb::CompressionKind::Zlib => {
        use std::io::Write;
        let mut encoder = flate2::write::DeflateEncoder::new(
          Vec::new(), flate2::Compression::default());
        encoder.write_all(payload).unwrap();
        let compressed = encoder.finish().unwrap();
        let (body, original) = if compressed.len() < payload.len() {
          (compressed, 0usize)
        } else {
          (payload.to_vec(), 1usize)
        };
        let header = (body.len() << 1) | original;
        let mut out = vec![
          (header & 0xFF) as u8,
          ((header >> 8) & 0xFF) as u8,
          ((header >> 16) & 0xFF) as u8
        ];
        out.extend_from_slice(&body);
        out
      },
      other => panic!("no test framing for {:?}", other)
    }
  }

  fn build_file(config: TestFile) -> Vec<u8> {
    let mut out = b"ORC".to_vec();
    let total_rows: u64 = config.stripes.iter().map(|s| s.rows).sum();

    let mut stripe_infos = vec![];
    for stripe in &config.stripes {
      let stripe_offset = out.len() as u64;
      let mut index = vec![];
      let mut data = vec![];
      let mut stream_protos = vec![];
      for s in &stripe.streams {
        let body = frame(config.compression, &s.bytes);
        stream_protos.push(pb::Stream {
          kind: Some(s.kind),
          column: Some(s.column),
          length: Some(body.len() as u64)
        });
        if s.kind == pb::stream::Kind::RowIndex as i32 {
          index.extend_from_slice(&body);
        } else {
          data.extend_from_slice(&body);
        }
      }
      out.extend_from_slice(&index);
      out.extend_from_slice(&data);

      let stripe_footer = pb::StripeFooter {
        streams: stream_protos,
        columns: config.encodings.iter()
          .map(|(kind, dictionary_size)| pb::ColumnEncoding {
            kind: Some(*kind as i32),
            dictionary_size: if *dictionary_size > 0 {
              Some(*dictionary_size)
            } else {
              None
            }
          })
          .collect(),
        writer_timezone: None
      };
      let footer_bytes = frame(config.compression, &stripe_footer.encode_to_vec());
      out.extend_from_slice(&footer_bytes);

      stripe_infos.push(pb::StripeInformation {
        offset: Some(stripe_offset),
        index_length: Some(index.len() as u64),
        data_length: Some(data.len() as u64),
        footer_length: Some(footer_bytes.len() as u64),
        number_of_rows: Some(stripe.rows)
      });
    }

    let metadata_bytes = match config.stripe_stats {
      Some(per_stripe) => {
        let metadata = pb::Metadata {
          stripe_stats: per_stripe.into_iter()
            .map(|col_stats| pb::StripeStatistics { col_stats })
            .collect()
        };
        frame(config.compression, &metadata.encode_to_vec())
      },
      None => vec![]
    };
    out.extend_from_slice(&metadata_bytes);

    let footer = pb::Footer {
      header_length: Some(3),
      content_length: Some(out.len() as u64),
      stripes: stripe_infos,
      types: config.types,
      metadata: vec![],
      number_of_rows: Some(total_rows),
      statistics: vec![],
      row_index_stride: Some(config.stride)
    };
    let footer_bytes = frame(config.compression, &footer.encode_to_vec());
    out.extend_from_slice(&footer_bytes);

    let postscript = pb::PostScript {
      footer_length: Some(footer_bytes.len() as u64),
      compression: Some(config.compression as i32),
      compression_block_size: Some(256 * 1024),
      version: vec![0, 12],
      metadata_length: Some(metadata_bytes.len() as u64),
      writer_version: Some(1),
      magic: Some("ORC".to_owned())
    };
    let postscript_bytes = postscript.encode_to_vec();
    out.extend_from_slice(&postscript_bytes);
    out.push(postscript_bytes.len() as u8);
    out
  }

  fn long_schema() -> Vec<pb::Type> {
    vec![
      pb::Type {
        kind: Some(pb::r#type::Kind::Struct as i32),
        subtypes: vec![1],
        field_names: vec!["x".to_owned()],
        ..Default::default()
      },
      pb::Type {
        kind: Some(pb::r#type::Kind::Long as i32),
        ..Default::default()
      },
    ]
  }

  fn schema_of(kind: pb::r#type::Kind) -> Vec<pb::Type> {
    vec![
      pb::Type {
        kind: Some(pb::r#type::Kind::Struct as i32),
        subtypes: vec![1],
        field_names: vec!["x".to_owned()],
        ..Default::default()
      },
      pb::Type { kind: Some(kind as i32), ..Default::default() },
    ]
  }

  fn direct_v2_encodings() -> Vec<(pb::column_encoding::Kind, u32)> {
    vec![
      (pb::column_encoding::Kind::Direct, 0),
      (pb::column_encoding::Kind::DirectV2, 0),
    ]
  }

  fn open(file: Vec<u8>) -> OrcReader {
    OrcReader::open(Rc::new(MemoryDataSource::new(file)), None).unwrap()
  }

  /// Drains column 0 of every batch as optional longs.
  fn read_longs(reader: &mut OrcRecordReader) -> Vec<Option<i64>> {
    let mut out = vec![];
    loop {
      let batch = match reader.next_batch().unwrap() {
        Some(batch) => batch,
        None => break
      };
      match &batch.columns[0] {
        ColumnVector::Long { nulls, values } => {
          for i in 0..batch.row_count {
            out.push(if nulls.is_null(i) { None } else { Some(values[i]) });
          }
        },
        other => panic!("expected a long vector, got {:?}", other)
      }
    }
    out
  }

  // ----------------------------------------------------------------------
  // End to end

  #[test]
  fn test_read_long_column() {
    // v2 delta run 1..=6
    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 6,
        streams: vec![stream(1, pb::stream::Kind::Data, vec![0xc0, 0x05, 0x02, 0x02])]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let reader = open(file);
    assert_eq!(reader.dialect(), OrcDialect::ORC);
    assert_eq!(reader.footer().number_of_rows, 6);

    let mut record_reader = reader.record_reader(RecordReaderOptions {
      batch_size: 4,
      ..Default::default()
    }).unwrap();
    assert_eq!(read_longs(&mut record_reader),
               (1..=6).map(Some).collect::<Vec<_>>());
  }

  #[test]
  fn test_batch_sizes_within_row_group() {
    // 10000 rows of 7 in one row group; batches of 3000 come out as
    // 3000, 3000, 3000, 1000
    let mut data = vec![];
    let mut left = 10000usize;
    while left > 0 {
      let run = ::std::cmp::min(512, left);
      let len = run - 1;
      data.push(0xc0 | ((len >> 8) as u8 & 1));
      data.push((len & 0xFF) as u8);
      data.push(0x0e); // base 7
      data.push(0x00); // fixed delta 0
      left -= run;
    }
    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 10000,
        streams: vec![stream(1, pb::stream::Kind::Data, data)]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let reader = open(file);
    let mut record_reader = reader.record_reader(RecordReaderOptions {
      batch_size: 3000,
      ..Default::default()
    }).unwrap();
    let mut sizes = vec![];
    let mut total = 0;
    while let Some(batch) = record_reader.next_batch().unwrap() {
      sizes.push(batch.row_count);
      match &batch.columns[0] {
        ColumnVector::Long { values, .. } => {
          assert!(values[..batch.row_count].iter().all(|v| *v == 7));
        },
        _ => unreachable!()
      }
      total += batch.row_count;
    }
    assert_eq!(sizes, vec![3000, 3000, 3000, 1000]);
    assert_eq!(total, 10000);
  }

  #[test]
  fn test_single_row_batches_read_the_same_rows() {
    let build = || build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 6,
        streams: vec![stream(1, pb::stream::Kind::Data, vec![0xc0, 0x05, 0x02, 0x02])]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let mut by_group = open(build()).record_reader(RecordReaderOptions {
      batch_size: 10000,
      ..Default::default()
    }).unwrap();
    let mut by_row = open(build()).record_reader(RecordReaderOptions {
      batch_size: 1,
      ..Default::default()
    }).unwrap();
    assert_eq!(read_longs(&mut by_group), read_longs(&mut by_row));
  }

  #[test]
  fn test_full_width_integers_round_trip() {
    let values: Vec<i64> = vec![0, 1, -1, 1 << 31, -(1i64 << 31), 1 << 62, -(1i64 << 62)];
    let mut data = vec![0x7e, 0x06];
    for v in values.iter() {
      let zigzagged = ((*v as u64) << 1) ^ ((*v >> 63) as u64);
      data.extend_from_slice(&zigzagged.to_be_bytes());
    }
    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 7,
        streams: vec![stream(1, pb::stream::Kind::Data, data)]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let reader = open(file);
    let mut record_reader = reader.record_reader(Default::default()).unwrap();
    let read: Vec<Option<i64>> = read_longs(&mut record_reader);
    assert_eq!(read, values.into_iter().map(Some).collect::<Vec<_>>());
  }

  #[test]
  fn test_string_dictionary_round_trip() {
    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: schema_of(pb::r#type::Kind::String),
      encodings: vec![
        (pb::column_encoding::Kind::Direct, 0),
        (pb::column_encoding::Kind::DictionaryV2, 4),
      ],
      stripes: vec![TestStripe {
        rows: 12,
        streams: vec![
          stream(1, pb::stream::Kind::Data, vec![0x42, 0x0b, 0x1b, 0x1b, 0x1b]),
          stream(1, pb::stream::Kind::Length, vec![0x44, 0x03, 0xaf, 0xc0]),
          stream(1, pb::stream::Kind::DictionaryData, b"alicebobcharliedave".to_vec()),
        ]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let reader = open(file);
    let mut record_reader = reader.record_reader(Default::default()).unwrap();
    let batch = record_reader.next_batch().unwrap().expect("one batch");
    assert_eq!(batch.row_count, 12);
    let names = ["alice", "bob", "charlie", "dave"];
    for i in 0..12 {
      assert_eq!(batch.columns[0].slice_at(i), Some(names[i % 4].as_bytes()));
    }
    assert!(record_reader.next_batch().unwrap().is_none());
  }

  #[test]
  fn test_timestamp_zone_correction() {
    // seconds 0, nanos (7 << 3) | 0, written in America/Los_Angeles
    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: schema_of(pb::r#type::Kind::Timestamp),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 1,
        streams: vec![
          stream(1, pb::stream::Kind::Data, vec![0x40, 0x00, 0x00]),
          stream(1, pb::stream::Kind::Secondary, vec![0x4a, 0x00, 0b111000_00]),
        ]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let reader = open(file);
    let mut record_reader = reader.record_reader(RecordReaderOptions {
      storage_time_zone: "America/Los_Angeles".parse().unwrap(),
      session_time_zone: "UTC".parse().unwrap(),
      ..Default::default()
    }).unwrap();
    // 2015-01-01 08:00:00.000000007 UTC
    assert_eq!(read_longs(&mut record_reader),
               vec![Some(1_420_099_200_000_000_007)]);
  }

  #[test]
  fn test_included_columns_select_a_subset() {
    let types = vec![
      pb::Type {
        kind: Some(pb::r#type::Kind::Struct as i32),
        subtypes: vec![1, 2],
        field_names: vec!["a".to_owned(), "b".to_owned()],
        ..Default::default()
      },
      pb::Type { kind: Some(pb::r#type::Kind::Long as i32), ..Default::default() },
      pb::Type { kind: Some(pb::r#type::Kind::Long as i32), ..Default::default() },
    ];
    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types,
      encodings: vec![
        (pb::column_encoding::Kind::Direct, 0),
        (pb::column_encoding::Kind::DirectV2, 0),
        (pb::column_encoding::Kind::DirectV2, 0),
      ],
      stripes: vec![TestStripe {
        rows: 3,
        streams: vec![
          stream(1, pb::stream::Kind::Data, vec![0xc0, 0x02, 0x02, 0x02]),
          stream(2, pb::stream::Kind::Data, vec![0xc0, 0x02, 0xc8, 0x01, 0x02]),
        ]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let reader = open(file);
    let mut record_reader = reader.record_reader(RecordReaderOptions {
      included_columns: [2u32].into_iter().collect(),
      ..Default::default()
    }).unwrap();
    let batch = record_reader.next_batch().unwrap().expect("one batch");
    assert_eq!(batch.columns.len(), 1);
    match &batch.columns[0] {
      ColumnVector::Long { values, .. } => assert_eq!(values, &vec![100, 101, 102]),
      _ => unreachable!()
    }
  }

  #[test]
  fn test_zlib_file_round_trip() {
    // 1..=100 as one delta run, everything chunk-framed
    let file = build_file(TestFile {
      compression: pb::CompressionKind::Zlib,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 100,
        streams: vec![stream(1, pb::stream::Kind::Data, vec![0xc0, 0x63, 0x02, 0x02])]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let reader = open(file);
    assert_eq!(reader.postscript().compression, CompressionKind::ZLIB);
    let mut record_reader = reader.record_reader(Default::default()).unwrap();
    assert_eq!(read_longs(&mut record_reader),
               (1..=100).map(Some).collect::<Vec<_>>());
  }

  // ----------------------------------------------------------------------
  // Pruning

  /// Records every read so tests can assert what I/O happened.
  struct CountingDataSource {
    inner: MemoryDataSource,
    reads: RefCell<Vec<(u64, usize)>>
  }

  impl CountingDataSource {
    fn new(data: Vec<u8>) -> Self {
      Self { inner: MemoryDataSource::new(data), reads: RefCell::new(vec![]) }
    }
  }

  impl OrcDataSource for CountingDataSource {
    fn size(&self) -> u64 {
      self.inner.size()
    }

    fn read_fully(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
      self.reads.borrow_mut().push((offset, buf.len()));
      self.inner.read_fully(offset, buf)
    }
  }

  #[test]
  fn test_predicate_prunes_stripe_without_data_reads() {
    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 3,
        streams: vec![stream(1, pb::stream::Kind::Data, vec![0xc0, 0x02, 0x14, 0x02])]
      }],
      stride: 10000,
      stripe_stats: Some(vec![vec![
        pb::ColumnStatistics::default(),
        pb::ColumnStatistics {
          number_of_values: Some(3),
          int_statistics: Some(pb::IntegerStatistics {
            minimum: Some(10),
            maximum: Some(20),
            sum: None
          }),
          ..Default::default()
        },
      ]])
    });

    let source = Rc::new(CountingDataSource::new(file));
    let reader = OrcReader::open(source.clone(), None).unwrap();
    source.reads.borrow_mut().clear();

    // col1 = 5 cannot match [10, 20]
    let mut record_reader = reader.record_reader(RecordReaderOptions {
      predicate: TupleDomain::all()
        .with_column(1, Domain::single_value(OrcValue::Integer(5))),
      ..Default::default()
    }).unwrap();
    assert!(record_reader.next_batch().unwrap().is_none());
    assert!(source.reads.borrow().is_empty(), "stripe data was read");
  }

  #[test]
  fn test_predicate_prunes_row_groups_with_seek() {
    // two row groups of 2 rows: [1, 2] then [100, 200]; the second run
    // starts at byte 4 of the data stream
    let row_index = pb::RowIndex {
      entry: vec![
        pb::RowIndexEntry {
          positions: vec![0, 0],
          statistics: Some(pb::ColumnStatistics {
            number_of_values: Some(2),
            int_statistics: Some(pb::IntegerStatistics {
              minimum: Some(1), maximum: Some(2), sum: None
            }),
            ..Default::default()
          })
        },
        pb::RowIndexEntry {
          positions: vec![4, 0],
          statistics: Some(pb::ColumnStatistics {
            number_of_values: Some(2),
            int_statistics: Some(pb::IntegerStatistics {
              minimum: Some(100), maximum: Some(200), sum: None
            }),
            ..Default::default()
          })
        },
      ]
    };
    let mut data = vec![0xc0, 0x01, 0x02, 0x02];
    data.extend_from_slice(&[0xc0, 0x01, 0xc8, 0x01, 0xc8, 0x01]);

    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 4,
        streams: vec![
          stream(1, pb::stream::Kind::RowIndex, row_index.encode_to_vec()),
          stream(1, pb::stream::Kind::Data, data),
        ]
      }],
      stride: 2,
      stripe_stats: None
    });

    let reader = open(file);
    let mut record_reader = reader.record_reader(RecordReaderOptions {
      predicate: TupleDomain::all()
        .with_column(1, Domain::single_value(OrcValue::Integer(100))),
      ..Default::default()
    }).unwrap();
    assert_eq!(read_longs(&mut record_reader), vec![Some(100), Some(200)]);
  }

  #[test]
  fn test_byte_range_selects_stripes() {
    let stripe = |base: i64| TestStripe {
      rows: 2,
      streams: vec![stream(1, pb::stream::Kind::Data, vec![
        0xc0, 0x01, ((base as u64) << 1) as u8, 0x02
      ])]
    };
    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![stripe(1), stripe(50)],
      stride: 10000,
      stripe_stats: None
    });

    let reader = open(file);
    let second_offset = reader.footer().stripes[1].offset;

    let mut record_reader = reader.record_reader(RecordReaderOptions {
      offset: second_offset,
      length: u64::MAX,
      ..Default::default()
    }).unwrap();
    assert_eq!(read_longs(&mut record_reader), vec![Some(50), Some(51)]);

    let mut record_reader = reader.record_reader(RecordReaderOptions {
      offset: 0,
      length: second_offset,
      ..Default::default()
    }).unwrap();
    assert_eq!(read_longs(&mut record_reader), vec![Some(1), Some(2)]);
  }

  // ----------------------------------------------------------------------
  // Dialects

  fn build_dwrf_file(data_streams: Vec<(u32, fb::stream::Kind, Vec<u8>, Option<bool>)>,
                     rows: u64) -> Vec<u8> {
    let mut out = b"ORC".to_vec();
    let stripe_offset = out.len() as u64;
    let mut data = vec![];
    let mut stream_protos = vec![];
    for (column, kind, bytes, use_v_ints) in data_streams {
      stream_protos.push(fb::Stream {
        kind: Some(kind as i32),
        column: Some(column),
        length: Some(bytes.len() as u64),
        use_v_ints
      });
      data.extend_from_slice(&bytes);
    }
    out.extend_from_slice(&data);

    let stripe_footer = fb::StripeFooter {
      streams: stream_protos,
      columns: vec![
        fb::ColumnEncoding {
          kind: Some(fb::column_encoding::Kind::Direct as i32),
          dictionary_size: None
        },
        fb::ColumnEncoding {
          kind: Some(fb::column_encoding::Kind::Direct as i32),
          dictionary_size: None
        },
      ]
    };
    let stripe_footer_bytes = stripe_footer.encode_to_vec();
    out.extend_from_slice(&stripe_footer_bytes);

    let footer = fb::Footer {
      header_length: Some(3),
      content_length: None,
      stripes: vec![fb::StripeInformation {
        offset: Some(stripe_offset),
        index_length: Some(0),
        data_length: Some(data.len() as u64),
        footer_length: Some(stripe_footer_bytes.len() as u64),
        number_of_rows: Some(rows)
      }],
      types: vec![
        fb::Type {
          kind: Some(fb::r#type::Kind::Struct as i32),
          subtypes: vec![1],
          field_names: vec!["x".to_owned()]
        },
        fb::Type {
          kind: Some(fb::r#type::Kind::Long as i32),
          subtypes: vec![],
          field_names: vec![]
        },
      ],
      metadata: vec![],
      number_of_rows: Some(rows),
      statistics: vec![],
      row_index_stride: Some(10000)
    };
    let footer_bytes = footer.encode_to_vec();
    out.extend_from_slice(&footer_bytes);

    let postscript = fb::PostScript {
      footer_length: Some(footer_bytes.len() as u64),
      compression: Some(fb::CompressionKind::None as i32),
      compression_block_size: Some(256 * 1024)
    };
    let postscript_bytes = postscript.encode_to_vec();
    out.extend_from_slice(&postscript_bytes);
    out.push(postscript_bytes.len() as u8);
    out
  }

  #[test]
  fn test_dwrf_dialect_is_detected_and_read() {
    // v1 literals 1, 2, 3 (zig-zagged)
    let file = build_dwrf_file(
      vec![(1, fb::stream::Kind::Data, vec![0xfd, 0x02, 0x04, 0x06], None)], 3);

    let reader = open(file);
    assert_eq!(reader.dialect(), OrcDialect::DWRF);
    assert!(reader.metadata().stripe_statistics.is_empty());
    assert_eq!(reader.postscript().metadata_length, 0);

    let mut record_reader = reader.record_reader(Default::default()).unwrap();
    assert_eq!(read_longs(&mut record_reader), vec![Some(1), Some(2), Some(3)]);
  }

  #[test]
  fn test_dwrf_fixed_width_longs() {
    // use_v_ints off: a literal run of fixed eight byte words
    let mut data = vec![0xfe];
    data.extend_from_slice(&(-42i64).to_le_bytes());
    data.extend_from_slice(&(1i64 << 40).to_le_bytes());
    let file = build_dwrf_file(
      vec![(1, fb::stream::Kind::Data, data, Some(false))], 2);

    let reader = open(file);
    let mut record_reader = reader.record_reader(Default::default()).unwrap();
    assert_eq!(read_longs(&mut record_reader), vec![Some(-42), Some(1 << 40)]);
  }

  #[test]
  fn test_dialects_agree_on_content() {
    let dwrf = build_dwrf_file(
      vec![(1, fb::stream::Kind::Data, vec![0xfd, 0x02, 0x04, 0x06], None)], 3);
    let orc = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 3,
        streams: vec![stream(1, pb::stream::Kind::Data, vec![0xc0, 0x02, 0x02, 0x02])]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let mut dwrf_reader = open(dwrf).record_reader(Default::default()).unwrap();
    let mut orc_reader = open(orc).record_reader(Default::default()).unwrap();
    assert_eq!(read_longs(&mut dwrf_reader), read_longs(&mut orc_reader));
  }

  // ----------------------------------------------------------------------
  // Failure paths

  #[test]
  fn test_error_closes_the_reader() {
    // the delta run promises ten values but the stream ends early
    let file = build_file(TestFile {
      compression: pb::CompressionKind::None,
      types: long_schema(),
      encodings: direct_v2_encodings(),
      stripes: vec![TestStripe {
        rows: 10,
        streams: vec![stream(1, pb::stream::Kind::Data, vec![0xc6, 0x09, 0x02])]
      }],
      stride: 10000,
      stripe_stats: None
    });

    let reader = open(file);
    let mut record_reader = reader.record_reader(Default::default()).unwrap();
    assert!(record_reader.next_batch().is_err());
    match record_reader.next_batch() {
      Err(OrcError::Closed) => (),
      other => panic!("expected Closed, got {:?}", other)
    }
  }

  #[test]
  fn test_open_rejects_tiny_file() {
    let result = OrcReader::open(Rc::new(MemoryDataSource::new(vec![0])), None);
    match result {
      Err(OrcError::Malformed(_)) => (),
      other => panic!("expected Malformed, got {:?}", other)
    }
  }

  #[test]
  fn test_open_rejects_bad_postscript_length() {
    let result = OrcReader::open(
      Rc::new(MemoryDataSource::new(vec![1, 2, 3, 250])), None);
    match result {
      Err(OrcError::Malformed(_)) => (),
      other => panic!("expected Malformed, got {:?}", other)
    }
  }
}
