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

//! Column readers: one stateful decoder per included column, driven in
//! lock step over row groups by the record reader.

use chrono_tz::Tz;

use crate::basic::{ColumnEncodingKind, OrcTypeKind, StreamKind};
use crate::column::complex::{ListColumnReader, MapColumnReader, StructColumnReader,
                             UnionColumnReader};
use crate::column::string::SliceColumnReader;
use crate::column::timestamp::TimestampColumnReader;
use crate::column::vector::ColumnVector;
use crate::errors::Result;
use crate::file::stripe::{RowGroupPositions, StripeSources};
use crate::metadata::{ColumnEncoding, OrcType, StripeFooter};
use crate::stream::boolean::BooleanStream;
use crate::stream::byte_rle::ByteStream;
use crate::stream::float::{DoubleStream, FloatStream};
use crate::stream::int_v1::IntV1Stream;
use crate::stream::int_v2::IntV2Stream;
use crate::stream::PositionProvider;

/// Everything a reader needs beyond the stripe streams themselves.
#[derive(Clone, Copy)]
pub struct ReaderContext {
  pub storage_time_zone: Tz,
  pub session_time_zone: Tz
}

/// A stateful decoder for one column. Readers for every included column
/// advance in lock step: the record reader issues the same sequence of
/// `start_stripe`, `start_row_group`, `skip` and `next_batch` calls to
/// each of them.
pub trait ColumnReader {
  /// Wire up streams for a new stripe; loads stripe dictionaries.
  fn start_stripe(&mut self, sources: &StripeSources, footer: &StripeFooter) -> Result<()>;

  /// Seek every underlying stream to this row group's positions.
  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()>;

  /// Advance past `rows` rows without materializing them. The streams
  /// are moved lazily, on the next `next_batch` or `skip` application.
  fn skip(&mut self, rows: usize);

  /// Materialize the next `rows` rows into `out`.
  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()>;
}

/// Builds the reader for type `id` of the flat tree, recursing into
/// composite types.
pub fn create_column_reader(types: &[OrcType], id: u32, context: &ReaderContext)
    -> Result<Box<dyn ColumnReader>> {
  let tp = types.get(id as usize)
    .ok_or_else(|| corrupt_err!("Type id {} is outside the type tree", id))?;
  let reader: Box<dyn ColumnReader> = match tp.kind {
    OrcTypeKind::BOOLEAN => Box::new(BooleanColumnReader::new(id)),
    OrcTypeKind::BYTE => Box::new(ByteColumnReader::new(id)),
    OrcTypeKind::SHORT | OrcTypeKind::INT | OrcTypeKind::LONG | OrcTypeKind::DATE =>
      Box::new(LongColumnReader::new(id, tp.kind)),
    OrcTypeKind::FLOAT => Box::new(FloatColumnReader::new(id)),
    OrcTypeKind::DOUBLE => Box::new(DoubleColumnReader::new(id)),
    OrcTypeKind::STRING | OrcTypeKind::BINARY | OrcTypeKind::VARCHAR | OrcTypeKind::CHAR =>
      Box::new(SliceColumnReader::new(id)),
    OrcTypeKind::TIMESTAMP => Box::new(TimestampColumnReader::new(id, context)),
    OrcTypeKind::STRUCT => {
      let mut children = Vec::with_capacity(tp.children.len());
      for child in &tp.children {
        children.push(create_column_reader(types, *child, context)?);
      }
      Box::new(StructColumnReader::new(id, children))
    },
    OrcTypeKind::LIST => {
      let child = tp.children.first()
        .ok_or_else(|| corrupt_err!("LIST type {} has no element type", id))?;
      let child = create_column_reader(types, *child, context)?;
      Box::new(ListColumnReader::new(id, child))
    },
    OrcTypeKind::MAP => {
      if tp.children.len() != 2 {
        return Err(corrupt_err!("MAP type {} has {} child types", id, tp.children.len()));
      }
      let keys = create_column_reader(types, tp.children[0], context)?;
      let values = create_column_reader(types, tp.children[1], context)?;
      Box::new(MapColumnReader::new(id, keys, values))
    },
    OrcTypeKind::UNION => {
      let mut children = Vec::with_capacity(tp.children.len());
      for child in &tp.children {
        children.push(create_column_reader(types, *child, context)?);
      }
      Box::new(UnionColumnReader::new(id, children))
    },
    OrcTypeKind::DECIMAL => {
      return Err(unsupported_err!("DECIMAL column {} is not readable", id))
    }
  };
  Ok(reader)
}


// ----------------------------------------------------------------------
// Shared pieces

/// The PRESENT stream of one column, or the implicit all-present mask
/// when the stripe carries none.
pub(crate) struct Presence {
  stream: Option<BooleanStream>,
  /// Scratch per batch: true at null rows.
  pub is_null: Vec<bool>
}

impl Presence {
  pub fn new() -> Self {
    Self { stream: None, is_null: vec![] }
  }

  pub fn start_stripe(&mut self, sources: &StripeSources, column: u32) -> Result<()> {
    self.stream = sources.byte_source(column, StreamKind::PRESENT)?
      .map(BooleanStream::new);
    Ok(())
  }

  pub fn seek(&mut self, positions: &mut PositionProvider) -> Result<()> {
    if let Some(ref mut stream) = self.stream {
      stream.seek(positions)?;
    }
    Ok(())
  }

  /// Fills the null scratch for `rows` rows and returns the non-null
  /// count.
  pub fn begin_batch(&mut self, rows: usize) -> Result<usize> {
    self.is_null.clear();
    self.is_null.resize(rows, false);
    match self.stream {
      Some(ref mut stream) => {
        let nulls = stream.get_unset_bits(rows, &mut self.is_null)?;
        Ok(rows - nulls)
      },
      None => Ok(rows)
    }
  }

  /// Advances over `rows` rows and returns how many of them are
  /// non-null.
  pub fn count_present(&mut self, rows: usize) -> Result<usize> {
    match self.stream {
      Some(ref mut stream) => stream.count_set_bits(rows),
      None => Ok(rows)
    }
  }

  pub fn is_all_present(&self) -> bool {
    self.stream.is_none()
  }
}

/// Run-length integer stream of either version, chosen by the column
/// encoding.
pub(crate) enum IntegerStream {
  V1(IntV1Stream),
  V2(IntV2Stream)
}

impl IntegerStream {
  pub fn next(&mut self) -> Result<i64> {
    match self {
      IntegerStream::V1(s) => s.next(),
      IntegerStream::V2(s) => s.next()
    }
  }

  pub fn skip(&mut self, items: usize) -> Result<()> {
    match self {
      IntegerStream::V1(s) => s.skip(items),
      IntegerStream::V2(s) => s.skip(items)
    }
  }

  pub fn seek(&mut self, positions: &mut PositionProvider) -> Result<()> {
    match self {
      IntegerStream::V1(s) => s.seek(positions),
      IntegerStream::V2(s) => s.seek(positions)
    }
  }
}

/// Opens the integer stream `kind` of `column`, v1 or v2 per the column
/// encoding. DWRF's fixed-width long flag comes from the stream info.
pub(crate) fn integer_stream(sources: &StripeSources, column: u32, kind: StreamKind,
                             encoding: ColumnEncodingKind, signed: bool)
    -> Result<Option<IntegerStream>> {
  let source = match sources.byte_source(column, kind)? {
    None => return Ok(None),
    Some(source) => source
  };
  let stream = match encoding {
    ColumnEncodingKind::DIRECT_V2 | ColumnEncodingKind::DICTIONARY_V2 =>
      IntegerStream::V2(IntV2Stream::new(source, signed)),
    ColumnEncodingKind::DIRECT | ColumnEncodingKind::DICTIONARY
      | ColumnEncodingKind::DWRF_DIRECT => {
      let use_v_ints = sources.use_v_ints(column, kind);
      IntegerStream::V1(IntV1Stream::new(source, signed, use_v_ints))
    }
  };
  Ok(Some(stream))
}

pub(crate) fn encoding_for<'a>(footer: &'a StripeFooter, column: u32)
    -> Result<&'a ColumnEncoding> {
  footer.encodings.get(column as usize)
    .ok_or_else(|| corrupt_err!(
      "Stripe footer has {} encodings, column {} needs one",
      footer.encodings.len(), column))
}

pub(crate) fn missing_stream_err(column: u32, kind: StreamKind) -> crate::errors::OrcError {
  corrupt_err!("Column {} has no {} stream", column, kind)
}


// ----------------------------------------------------------------------
// Scalar readers

pub struct BooleanColumnReader {
  column: u32,
  presence: Presence,
  data: Option<BooleanStream>,
  pending_skip: usize
}

impl BooleanColumnReader {
  pub fn new(column: u32) -> Self {
    Self { column, presence: Presence::new(), data: None, pending_skip: 0 }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      let data = self.data.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
      data.skip(present)?;
    }
    Ok(())
  }
}

impl ColumnReader for BooleanColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, _footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    self.data = sources.byte_source(self.column, StreamKind::DATA)?
      .map(BooleanStream::new);
    self.pending_skip = 0;
    Ok(())
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    if let Some(ref mut data) = self.data {
      data.seek(&mut provider)?;
    }
    Ok(())
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, values) = match out {
      ColumnVector::Boolean { nulls, values } => (nulls, values),
      _ => return Err(corrupt_err!("Column {} expects a boolean vector", self.column))
    };
    nulls.reset(rows);
    values.clear();
    values.resize(rows, false);
    let data = self.data.as_mut()
      .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
    if self.presence.is_all_present() {
      data.get_set_bits(rows, values)?;
      nulls.set_all_non_null();
    } else {
      self.presence.begin_batch(rows)?;
      for i in 0..rows {
        if !self.presence.is_null[i] {
          values[i] = data.next_bit()?;
          nulls.set_non_null(i);
        }
      }
    }
    Ok(())
  }
}


pub struct ByteColumnReader {
  column: u32,
  presence: Presence,
  data: Option<ByteStream>,
  pending_skip: usize
}

impl ByteColumnReader {
  pub fn new(column: u32) -> Self {
    Self { column, presence: Presence::new(), data: None, pending_skip: 0 }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      let data = self.data.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
      data.skip(present)?;
    }
    Ok(())
  }
}

impl ColumnReader for ByteColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, _footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    self.data = sources.byte_source(self.column, StreamKind::DATA)?
      .map(ByteStream::new);
    self.pending_skip = 0;
    Ok(())
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    if let Some(ref mut data) = self.data {
      data.seek(&mut provider)?;
    }
    Ok(())
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, values) = match out {
      ColumnVector::Byte { nulls, values } => (nulls, values),
      _ => return Err(corrupt_err!("Column {} expects a byte vector", self.column))
    };
    nulls.reset(rows);
    values.clear();
    values.resize(rows, 0);
    let data = self.data.as_mut()
      .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
    if self.presence.is_all_present() {
      for value in values.iter_mut() {
        *value = data.next_signed()?;
      }
      nulls.set_all_non_null();
    } else {
      self.presence.begin_batch(rows)?;
      for i in 0..rows {
        if !self.presence.is_null[i] {
          values[i] = data.next_signed()?;
          nulls.set_non_null(i);
        }
      }
    }
    Ok(())
  }
}


pub struct LongColumnReader {
  column: u32,
  kind: OrcTypeKind,
  presence: Presence,
  data: Option<IntegerStream>,
  pending_skip: usize
}

impl LongColumnReader {
  pub fn new(column: u32, kind: OrcTypeKind) -> Self {
    Self { column, kind, presence: Presence::new(), data: None, pending_skip: 0 }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      let data = self.data.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
      data.skip(present)?;
    }
    Ok(())
  }
}

impl ColumnReader for LongColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    let encoding = encoding_for(footer, self.column)?;
    // plain DIRECT carries no run length version for the integer widths
    let integer_width = matches!(
      self.kind, OrcTypeKind::SHORT | OrcTypeKind::INT | OrcTypeKind::LONG);
    if integer_width && encoding.kind == ColumnEncodingKind::DIRECT {
      return Err(unsupported_err!(
        "{} encoding on {} column {}", encoding.kind, self.kind, self.column));
    }
    match encoding.kind {
      ColumnEncodingKind::DIRECT | ColumnEncodingKind::DIRECT_V2
        | ColumnEncodingKind::DWRF_DIRECT => (),
      other => {
        return Err(unsupported_err!(
          "{} encoding on {} column {}", other, self.kind, self.column))
      }
    }
    self.data = integer_stream(sources, self.column, StreamKind::DATA,
                               encoding.kind, true)?;
    if self.data.is_none() {
      return Err(missing_stream_err(self.column, StreamKind::DATA));
    }
    self.pending_skip = 0;
    Ok(())
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    if let Some(ref mut data) = self.data {
      data.seek(&mut provider)?;
    }
    Ok(())
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, values) = match out {
      ColumnVector::Long { nulls, values } => (nulls, values),
      _ => return Err(corrupt_err!("Column {} expects a long vector", self.column))
    };
    nulls.reset(rows);
    values.clear();
    values.resize(rows, 0);
    let data = self.data.as_mut()
      .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
    if self.presence.is_all_present() {
      for value in values.iter_mut() {
        *value = data.next()?;
      }
      nulls.set_all_non_null();
    } else {
      self.presence.begin_batch(rows)?;
      for i in 0..rows {
        if !self.presence.is_null[i] {
          values[i] = data.next()?;
          nulls.set_non_null(i);
        }
      }
    }
    Ok(())
  }
}


pub struct FloatColumnReader {
  column: u32,
  presence: Presence,
  data: Option<FloatStream>,
  pending_skip: usize
}

impl FloatColumnReader {
  pub fn new(column: u32) -> Self {
    Self { column, presence: Presence::new(), data: None, pending_skip: 0 }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      let data = self.data.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
      data.skip(present)?;
    }
    Ok(())
  }
}

impl ColumnReader for FloatColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, _footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    self.data = sources.byte_source(self.column, StreamKind::DATA)?
      .map(FloatStream::new);
    self.pending_skip = 0;
    Ok(())
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    if let Some(ref mut data) = self.data {
      data.seek(&mut provider)?;
    }
    Ok(())
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, values) = match out {
      ColumnVector::Float { nulls, values } => (nulls, values),
      _ => return Err(corrupt_err!("Column {} expects a float vector", self.column))
    };
    nulls.reset(rows);
    values.clear();
    values.resize(rows, 0.0);
    let data = self.data.as_mut()
      .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
    if self.presence.is_all_present() {
      for value in values.iter_mut() {
        *value = data.next()?;
      }
      nulls.set_all_non_null();
    } else {
      self.presence.begin_batch(rows)?;
      for i in 0..rows {
        if !self.presence.is_null[i] {
          values[i] = data.next()?;
          nulls.set_non_null(i);
        }
      }
    }
    Ok(())
  }
}


pub struct DoubleColumnReader {
  column: u32,
  presence: Presence,
  data: Option<DoubleStream>,
  pending_skip: usize
}

impl DoubleColumnReader {
  pub fn new(column: u32) -> Self {
    Self { column, presence: Presence::new(), data: None, pending_skip: 0 }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      let data = self.data.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
      data.skip(present)?;
    }
    Ok(())
  }
}

impl ColumnReader for DoubleColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, _footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    self.data = sources.byte_source(self.column, StreamKind::DATA)?
      .map(DoubleStream::new);
    self.pending_skip = 0;
    Ok(())
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    if let Some(ref mut data) = self.data {
      data.seek(&mut provider)?;
    }
    Ok(())
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, values) = match out {
      ColumnVector::Double { nulls, values } => (nulls, values),
      _ => return Err(corrupt_err!("Column {} expects a double vector", self.column))
    };
    nulls.reset(rows);
    values.clear();
    values.resize(rows, 0.0);
    let data = self.data.as_mut()
      .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
    if self.presence.is_all_present() {
      for value in values.iter_mut() {
        *value = data.next()?;
      }
      nulls.set_all_non_null();
    } else {
      self.presence.begin_batch(rows)?;
      for i in 0..rows {
        if !self.presence.is_null[i] {
          values[i] = data.next()?;
          nulls.set_non_null(i);
        }
      }
    }
    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::CompressionKind;
  use crate::util::memory::BytePtr;

  pub fn sources_with(streams: Vec<(u32, StreamKind, Vec<u8>)>) -> StripeSources {
    let mut sources = StripeSources::new(CompressionKind::NONE, 0);
    for (column, kind, data) in streams {
      sources.insert(column, kind, BytePtr::new(data), true);
    }
    sources
  }

  pub fn footer_with(encodings: Vec<ColumnEncodingKind>) -> StripeFooter {
    StripeFooter {
      streams: vec![],
      encodings: encodings.into_iter()
        .map(|kind| ColumnEncoding { kind, dictionary_size: 0 })
        .collect(),
      writer_timezone: None
    }
  }

  fn long_vector() -> ColumnVector {
    ColumnVector::Long { nulls: Default::default(), values: vec![] }
  }

  #[test]
  fn test_long_reader_all_present() {
    // v2 delta run: 2, 3, 5, 7, 11, 13, 17, 19, 23, 29
    let sources = sources_with(vec![
      (1, StreamKind::DATA, vec![0xc6, 0x09, 0x02, 0x02, 0x22, 0x42, 0x42, 0x46]),
    ]);
    let footer = footer_with(vec![ColumnEncodingKind::DIRECT,
                                  ColumnEncodingKind::DIRECT_V2]);
    let mut reader = LongColumnReader::new(1, OrcTypeKind::LONG);
    reader.start_stripe(&sources, &footer).unwrap();

    let mut out = long_vector();
    reader.next_batch(4, &mut out).unwrap();
    match &out {
      ColumnVector::Long { nulls, values } => {
        assert_eq!(values, &vec![2, 3, 5, 7]);
        assert_eq!(nulls.non_null_count(), 4);
      },
      _ => unreachable!()
    }

    reader.skip(3);
    reader.next_batch(3, &mut out).unwrap();
    match &out {
      ColumnVector::Long { values, .. } => assert_eq!(values, &vec![19, 23, 29]),
      _ => unreachable!()
    }
  }

  #[test]
  fn test_long_reader_with_nulls() {
    // PRESENT: one literal byte 0b1010_1100 (rows 0,2,4,5 non-null of 8)
    // DATA: v1 run of 4 values 7, 8, 9, 10
    let sources = sources_with(vec![
      (1, StreamKind::PRESENT, vec![0xff, 0b1010_1100]),
      (1, StreamKind::DATA, vec![0x01, 0x01, 0x07]),
    ]);
    let footer = footer_with(vec![ColumnEncodingKind::DIRECT,
                                  ColumnEncodingKind::DWRF_DIRECT]);
    let mut reader = LongColumnReader::new(1, OrcTypeKind::INT);
    reader.start_stripe(&sources, &footer).unwrap();

    let mut out = long_vector();
    reader.next_batch(8, &mut out).unwrap();
    match &out {
      ColumnVector::Long { nulls, values } => {
        assert_eq!(nulls.non_null_count(), 4);
        assert!(!nulls.is_null(0));
        assert!(nulls.is_null(1));
        assert_eq!(values[0], 7);
        assert_eq!(values[2], 8);
        assert_eq!(values[4], 9);
        assert_eq!(values[5], 10);
        // null slots hold the default
        assert_eq!(values[1], 0);
      },
      _ => unreachable!()
    }
  }

  #[test]
  fn test_long_reader_rejects_plain_direct_for_integers() {
    let sources = sources_with(vec![
      (1, StreamKind::DATA, vec![0x00]),
    ]);
    let footer = footer_with(vec![ColumnEncodingKind::DIRECT,
                                  ColumnEncodingKind::DIRECT]);
    let mut reader = LongColumnReader::new(1, OrcTypeKind::LONG);
    match reader.start_stripe(&sources, &footer) {
      Err(crate::errors::OrcError::UnsupportedMetadata(_)) => (),
      other => panic!("expected UnsupportedMetadata, got {:?}", other)
    }
  }

  #[test]
  fn test_long_reader_missing_data_stream_is_corrupt() {
    let sources = sources_with(vec![]);
    let footer = footer_with(vec![ColumnEncodingKind::DIRECT,
                                  ColumnEncodingKind::DIRECT_V2]);
    let mut reader = LongColumnReader::new(1, OrcTypeKind::LONG);
    assert!(reader.start_stripe(&sources, &footer).is_err());
  }

  #[test]
  fn test_boolean_reader() {
    // DATA: literal byte 0b1100_1010
    let sources = sources_with(vec![
      (1, StreamKind::DATA, vec![0xff, 0b1100_1010]),
    ]);
    let footer = footer_with(vec![ColumnEncodingKind::DIRECT,
                                  ColumnEncodingKind::DIRECT]);
    let mut reader = BooleanColumnReader::new(1);
    reader.start_stripe(&sources, &footer).unwrap();

    let mut out = ColumnVector::Boolean { nulls: Default::default(), values: vec![] };
    reader.next_batch(8, &mut out).unwrap();
    match &out {
      ColumnVector::Boolean { nulls, values } => {
        assert_eq!(values,
                   &vec![true, true, false, false, true, false, true, false]);
        assert_eq!(nulls.non_null_count(), 8);
      },
      _ => unreachable!()
    }
  }

  #[test]
  fn test_byte_reader_skip() {
    // DATA: run of 5 x 0x01 then literals 2, 3
    let sources = sources_with(vec![
      (1, StreamKind::DATA, vec![0x02, 0x01, 0xfe, 0x02, 0x03]),
    ]);
    let footer = footer_with(vec![ColumnEncodingKind::DIRECT,
                                  ColumnEncodingKind::DIRECT]);
    let mut reader = ByteColumnReader::new(1);
    reader.start_stripe(&sources, &footer).unwrap();

    reader.skip(5);
    let mut out = ColumnVector::Byte { nulls: Default::default(), values: vec![] };
    reader.next_batch(2, &mut out).unwrap();
    match &out {
      ColumnVector::Byte { values, .. } => assert_eq!(values, &vec![2, 3]),
      _ => unreachable!()
    }
  }

  #[test]
  fn test_double_reader() {
    let mut data = vec![];
    for v in [1.5f64, -2.5, 3.25] {
      data.extend_from_slice(&v.to_le_bytes());
    }
    let sources = sources_with(vec![(1, StreamKind::DATA, data)]);
    let footer = footer_with(vec![ColumnEncodingKind::DIRECT,
                                  ColumnEncodingKind::DIRECT]);
    let mut reader = DoubleColumnReader::new(1);
    reader.start_stripe(&sources, &footer).unwrap();

    let mut out = ColumnVector::Double { nulls: Default::default(), values: vec![] };
    reader.next_batch(3, &mut out).unwrap();
    match &out {
      ColumnVector::Double { values, .. } => assert_eq!(values, &vec![1.5, -2.5, 3.25]),
      _ => unreachable!()
    }
  }

  #[test]
  fn test_batch_then_skip_then_batch_with_nulls() {
    // PRESENT: two literal bytes 0b1111_0000 0b1111_1111 (12 non-null of 16)
    // DATA: v2 delta 1..12
    let sources = sources_with(vec![
      (1, StreamKind::PRESENT, vec![0xfe, 0b1111_0000, 0xff]),
      (1, StreamKind::DATA, vec![0xc0, 0x0b, 0x02, 0x02]),
    ]);
    let footer = footer_with(vec![ColumnEncodingKind::DIRECT,
                                  ColumnEncodingKind::DIRECT_V2]);
    let mut reader = LongColumnReader::new(1, OrcTypeKind::LONG);
    reader.start_stripe(&sources, &footer).unwrap();

    let mut out = long_vector();
    reader.next_batch(2, &mut out).unwrap();
    match &out {
      ColumnVector::Long { nulls, values } => {
        assert_eq!(values[..2], [1, 2]);
        assert_eq!(nulls.non_null_count(), 2);
      },
      _ => unreachable!()
    }

    // rows 2..10: rows 2,3 non-null (3, 4), rows 4..8 null, rows 8,9 non-null
    reader.skip(8);
    reader.next_batch(6, &mut out).unwrap();
    match &out {
      ColumnVector::Long { nulls, values } => {
        // rows 10..16 all non-null carrying 7..12
        assert_eq!(nulls.non_null_count(), 6);
        assert_eq!(values, &vec![7, 8, 9, 10, 11, 12]);
      },
      _ => unreachable!()
    }
  }
}
