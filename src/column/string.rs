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

//! Readers for the slice columns: STRING, BINARY, VARCHAR and CHAR.

use crate::basic::{ColumnEncodingKind, StreamKind};
use crate::column::reader::{encoding_for, integer_stream, missing_stream_err, ColumnReader,
                            IntegerStream, Presence};
use crate::column::vector::ColumnVector;
use crate::errors::Result;
use crate::file::stripe::{RowGroupPositions, StripeSources};
use crate::metadata::StripeFooter;
use crate::stream::boolean::BooleanStream;
use crate::stream::OrcByteSource;
use crate::util::memory::BytePtr;

/// A stripe- or row-group-scoped dictionary: entry bytes back to back
/// plus per-entry offsets.
struct Dictionary {
  data: BytePtr,
  entries: Vec<(usize, usize)>
}

impl Dictionary {
  fn empty() -> Self {
    Self { data: BytePtr::empty(), entries: vec![] }
  }

  fn load(data: &mut OrcByteSource, lengths: &mut IntegerStream, count: usize)
      -> Result<Dictionary> {
    let mut entries = Vec::with_capacity(count);
    let mut offset = 0;
    for _ in 0..count {
      let length = lengths.next()?;
      if length < 0 {
        return Err(corrupt_err!("Negative dictionary entry length {}", length));
      }
      entries.push((offset, length as usize));
      offset += length as usize;
    }
    let data = data.read_slice(offset)?;
    Ok(Dictionary { data, entries })
  }

  fn len(&self) -> usize {
    self.entries.len()
  }

  fn get(&self, index: usize) -> Option<&[u8]> {
    self.entries.get(index)
      .map(|(offset, length)| &self.data.slice()[*offset..*offset + *length])
  }
}

enum Mode {
  Unset,
  Direct {
    lengths: IntegerStream,
    data: OrcByteSource
  },
  Dictionary(DictionaryMode)
}

struct DictionaryMode {
  /// DATA stream of dictionary indices.
  indices: IntegerStream,
  dictionary: Dictionary,
  /// When present, a cleared bit redirects the row's index to the
  /// row-group dictionary. When the stream is absent every index is a
  /// stripe dictionary index, and any row-group dictionary streams are
  /// ignored; files that mean otherwise are unsupported by producers'
  /// contract.
  in_dictionary: Option<BooleanStream>,
  row_group_lengths: Option<IntegerStream>,
  row_group_data: Option<OrcByteSource>,
  row_group_dictionary: Dictionary
}

/// Reads slice columns in two modes selected by the stripe encoding:
/// DIRECT (a LENGTH stream plus concatenated DATA bytes) and DICTIONARY
/// (DATA holds indices into a stripe dictionary, with an optional
/// per-row-group overflow dictionary).
pub struct SliceColumnReader {
  column: u32,
  presence: Presence,
  mode: Mode,
  /// Batch-to-batch scratch for materialized dictionary values.
  scratch: Vec<u8>,
  pending_skip: usize
}

impl SliceColumnReader {
  pub fn new(column: u32) -> Self {
    Self {
      column,
      presence: Presence::new(),
      mode: Mode::Unset,
      scratch: vec![],
      pending_skip: 0
    }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip == 0 {
      return Ok(());
    }
    let rows = ::std::mem::replace(&mut self.pending_skip, 0);
    let present = self.presence.count_present(rows)?;
    match self.mode {
      Mode::Unset => Err(missing_stream_err(self.column, StreamKind::DATA)),
      Mode::Direct { ref mut lengths, ref mut data } => {
        let mut total = 0;
        for _ in 0..present {
          let length = lengths.next()?;
          if length < 0 {
            return Err(corrupt_err!("Negative value length {}", length));
          }
          total += length as usize;
        }
        data.skip(total)
      },
      Mode::Dictionary(ref mut dictionary) => {
        dictionary.indices.skip(present)?;
        if let Some(ref mut in_dictionary) = dictionary.in_dictionary {
          in_dictionary.skip(present)?;
        }
        Ok(())
      }
    }
  }
}

impl ColumnReader for SliceColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    self.pending_skip = 0;
    let encoding = encoding_for(footer, self.column)?;
    match encoding.kind {
      ColumnEncodingKind::DIRECT | ColumnEncodingKind::DIRECT_V2 => {
        let lengths =
          integer_stream(sources, self.column, StreamKind::LENGTH, encoding.kind, false)?
            .ok_or_else(|| missing_stream_err(self.column, StreamKind::LENGTH))?;
        let data = sources.byte_source(self.column, StreamKind::DATA)?
          .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
        self.mode = Mode::Direct { lengths, data };
      },
      ColumnEncodingKind::DICTIONARY | ColumnEncodingKind::DICTIONARY_V2 => {
        let indices =
          integer_stream(sources, self.column, StreamKind::DATA, encoding.kind, false)?
            .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;

        // entry lengths come from DICTIONARY_COUNT when the stripe
        // declares one, from LENGTH otherwise
        let length_kind = if sources.has(self.column, StreamKind::DICTIONARY_COUNT) {
          StreamKind::DICTIONARY_COUNT
        } else {
          StreamKind::LENGTH
        };
        let dictionary_size = encoding.dictionary_size as usize;
        let dictionary = if dictionary_size > 0 {
          let mut lengths =
            integer_stream(sources, self.column, length_kind, encoding.kind, false)?
              .ok_or_else(|| missing_stream_err(self.column, length_kind))?;
          let mut data = sources.byte_source(self.column, StreamKind::DICTIONARY_DATA)?
            .ok_or_else(|| missing_stream_err(self.column, StreamKind::DICTIONARY_DATA))?;
          Dictionary::load(&mut data, &mut lengths, dictionary_size)?
        } else {
          Dictionary::empty()
        };
        log::debug!("column {}: loaded stripe dictionary of {} entries",
                    self.column, dictionary.len());

        let in_dictionary = sources.byte_source(self.column, StreamKind::IN_DICTIONARY)?
          .map(BooleanStream::new);
        let (row_group_lengths, row_group_data) = if in_dictionary.is_some() {
          (integer_stream(sources, self.column, StreamKind::ROW_GROUP_DICTIONARY_LENGTH,
                          encoding.kind, false)?,
           sources.byte_source(self.column, StreamKind::ROW_GROUP_DICTIONARY)?)
        } else {
          (None, None)
        };

        self.mode = Mode::Dictionary(DictionaryMode {
          indices,
          dictionary,
          in_dictionary,
          row_group_lengths,
          row_group_data,
          row_group_dictionary: Dictionary::empty()
        });
      },
      other => {
        return Err(unsupported_err!(
          "{} encoding on slice column {}", other, self.column))
      }
    }
    Ok(())
  }

  /// Position order: PRESENT, DATA, then LENGTH for direct mode; for
  /// dictionary mode IN_DICTIONARY, the row-group dictionary entry
  /// count, ROW_GROUP_DICTIONARY_LENGTH and ROW_GROUP_DICTIONARY.
  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    match self.mode {
      Mode::Unset => Err(missing_stream_err(self.column, StreamKind::DATA)),
      Mode::Direct { ref mut lengths, ref mut data } => {
        data.seek(&mut provider)?;
        lengths.seek(&mut provider)
      },
      Mode::Dictionary(ref mut dictionary) => {
        dictionary.indices.seek(&mut provider)?;
        if let Some(ref mut in_dictionary) = dictionary.in_dictionary {
          in_dictionary.seek(&mut provider)?;
          if let (Some(lengths), Some(data)) =
              (dictionary.row_group_lengths.as_mut(), dictionary.row_group_data.as_mut()) {
            let entry_count = provider.next()? as usize;
            lengths.seek(&mut provider)?;
            data.seek(&mut provider)?;
            dictionary.row_group_dictionary =
              Dictionary::load(data, lengths, entry_count)?;
            log::debug!("column {}: loaded row group dictionary of {} entries",
                        self.column, entry_count);
          }
        }
        Ok(())
      }
    }
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let column = self.column;
    let (nulls, lengths_out, data_out) = match out {
      ColumnVector::Slice { nulls, lengths, data } => (nulls, lengths, data),
      _ => return Err(corrupt_err!("Column {} expects a slice vector", column))
    };
    nulls.reset(rows);
    lengths_out.clear();
    lengths_out.resize(rows, 0);

    self.presence.begin_batch(rows)?;
    let is_null = &self.presence.is_null;

    match self.mode {
      Mode::Unset => return Err(missing_stream_err(column, StreamKind::DATA)),
      Mode::Direct { ref mut lengths, ref mut data } => {
        let mut total = 0;
        for i in 0..rows {
          if is_null[i] {
            continue;
          }
          let length = lengths.next()?;
          if length < 0 {
            return Err(corrupt_err!("Negative value length {} in column {}", length, column));
          }
          lengths_out[i] = length as u32;
          total += length as usize;
          nulls.set_non_null(i);
        }
        *data_out = data.read_slice(total)?;
      },
      Mode::Dictionary(ref mut dictionary) => {
        self.scratch.clear();
        for i in 0..rows {
          if is_null[i] {
            continue;
          }
          let index = dictionary.indices.next()?;
          if index < 0 {
            return Err(corrupt_err!("Negative dictionary index {} in column {}", index, column));
          }
          let in_stripe_dictionary = match dictionary.in_dictionary {
            Some(ref mut stream) => stream.next_bit()?,
            None => true
          };
          let table = if in_stripe_dictionary {
            &dictionary.dictionary
          } else {
            &dictionary.row_group_dictionary
          };
          let entry = table.get(index as usize)
            .ok_or_else(|| corrupt_err!(
              "Dictionary index {} out of range for column {} ({} entries)",
              index, column, table.len()))?;
          lengths_out[i] = entry.len() as u32;
          self.scratch.extend_from_slice(entry);
          nulls.set_non_null(i);
        }
        *data_out = BytePtr::new(::std::mem::take(&mut self.scratch));
      }
    }
    Ok(())
  }
}
