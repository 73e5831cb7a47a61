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

//! Readers for the composite types. Each maintains its own PRESENT
//! stream and delegates element counts to its child readers.

use crate::basic::StreamKind;
use crate::column::reader::{encoding_for, integer_stream, missing_stream_err, ColumnReader,
                            IntegerStream, Presence};
use crate::column::vector::ColumnVector;
use crate::errors::Result;
use crate::file::stripe::{RowGroupPositions, StripeSources};
use crate::metadata::StripeFooter;
use crate::stream::byte_rle::ByteStream;

pub struct StructColumnReader {
  column: u32,
  presence: Presence,
  children: Vec<Box<dyn ColumnReader>>,
  pending_skip: usize
}

impl StructColumnReader {
  pub fn new(column: u32, children: Vec<Box<dyn ColumnReader>>) -> Self {
    Self { column, presence: Presence::new(), children, pending_skip: 0 }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      for child in self.children.iter_mut() {
        child.skip(present);
      }
    }
    Ok(())
  }
}

impl ColumnReader for StructColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    self.pending_skip = 0;
    for child in self.children.iter_mut() {
      child.start_stripe(sources, footer)?;
    }
    Ok(())
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    for child in self.children.iter_mut() {
      child.start_row_group(positions)?;
    }
    Ok(())
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, children_out) = match out {
      ColumnVector::Struct { nulls, children } => (nulls, children),
      _ => return Err(corrupt_err!("Column {} expects a struct vector", self.column))
    };
    if children_out.len() != self.children.len() {
      return Err(corrupt_err!(
        "Struct column {} has {} child readers for {} child vectors",
        self.column, self.children.len(), children_out.len()));
    }
    nulls.reset(rows);
    let present = self.presence.begin_batch(rows)?;
    for i in 0..rows {
      if !self.presence.is_null[i] {
        nulls.set_non_null(i);
      }
    }
    for (child, vector) in self.children.iter_mut().zip(children_out.iter_mut()) {
      child.next_batch(present, vector)?;
    }
    Ok(())
  }
}


pub struct ListColumnReader {
  column: u32,
  presence: Presence,
  lengths: Option<IntegerStream>,
  child: Box<dyn ColumnReader>,
  pending_skip: usize
}

impl ListColumnReader {
  pub fn new(column: u32, child: Box<dyn ColumnReader>) -> Self {
    Self { column, presence: Presence::new(), lengths: None, child, pending_skip: 0 }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      let lengths = self.lengths.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::LENGTH))?;
      let mut elements = 0;
      for _ in 0..present {
        let length = lengths.next()?;
        if length < 0 {
          return Err(corrupt_err!("Negative list length {}", length));
        }
        elements += length as usize;
      }
      self.child.skip(elements);
    }
    Ok(())
  }
}

impl ColumnReader for ListColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    let encoding = encoding_for(footer, self.column)?;
    self.lengths = integer_stream(sources, self.column, StreamKind::LENGTH,
                                  encoding.kind, false)?;
    if self.lengths.is_none() {
      return Err(missing_stream_err(self.column, StreamKind::LENGTH));
    }
    self.pending_skip = 0;
    self.child.start_stripe(sources, footer)
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    if let Some(ref mut lengths) = self.lengths {
      lengths.seek(&mut provider)?;
    }
    self.child.start_row_group(positions)
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, lengths_out, child_out) = match out {
      ColumnVector::List { nulls, lengths, child } => (nulls, lengths, child),
      _ => return Err(corrupt_err!("Column {} expects a list vector", self.column))
    };
    nulls.reset(rows);
    lengths_out.clear();
    lengths_out.resize(rows, 0);

    self.presence.begin_batch(rows)?;
    let lengths = self.lengths.as_mut()
      .ok_or_else(|| missing_stream_err(self.column, StreamKind::LENGTH))?;
    let mut elements = 0;
    for i in 0..rows {
      if self.presence.is_null[i] {
        continue;
      }
      let length = lengths.next()?;
      if length < 0 {
        return Err(corrupt_err!("Negative list length {} in column {}", length, self.column));
      }
      lengths_out[i] = length as u64;
      elements += length as usize;
      nulls.set_non_null(i);
    }
    self.child.next_batch(elements, child_out)
  }
}


pub struct MapColumnReader {
  column: u32,
  presence: Presence,
  lengths: Option<IntegerStream>,
  keys: Box<dyn ColumnReader>,
  values: Box<dyn ColumnReader>,
  pending_skip: usize
}

impl MapColumnReader {
  pub fn new(column: u32, keys: Box<dyn ColumnReader>, values: Box<dyn ColumnReader>) -> Self {
    Self {
      column,
      presence: Presence::new(),
      lengths: None,
      keys,
      values,
      pending_skip: 0
    }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      let lengths = self.lengths.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::LENGTH))?;
      let mut entries = 0;
      for _ in 0..present {
        let length = lengths.next()?;
        if length < 0 {
          return Err(corrupt_err!("Negative map length {}", length));
        }
        entries += length as usize;
      }
      self.keys.skip(entries);
      self.values.skip(entries);
    }
    Ok(())
  }
}

impl ColumnReader for MapColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    let encoding = encoding_for(footer, self.column)?;
    self.lengths = integer_stream(sources, self.column, StreamKind::LENGTH,
                                  encoding.kind, false)?;
    if self.lengths.is_none() {
      return Err(missing_stream_err(self.column, StreamKind::LENGTH));
    }
    self.pending_skip = 0;
    self.keys.start_stripe(sources, footer)?;
    self.values.start_stripe(sources, footer)
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    if let Some(ref mut lengths) = self.lengths {
      lengths.seek(&mut provider)?;
    }
    self.keys.start_row_group(positions)?;
    self.values.start_row_group(positions)
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, lengths_out, keys_out, values_out) = match out {
      ColumnVector::Map { nulls, lengths, keys, values } =>
        (nulls, lengths, keys, values),
      _ => return Err(corrupt_err!("Column {} expects a map vector", self.column))
    };
    nulls.reset(rows);
    lengths_out.clear();
    lengths_out.resize(rows, 0);

    self.presence.begin_batch(rows)?;
    let lengths = self.lengths.as_mut()
      .ok_or_else(|| missing_stream_err(self.column, StreamKind::LENGTH))?;
    let mut entries = 0;
    for i in 0..rows {
      if self.presence.is_null[i] {
        continue;
      }
      let length = lengths.next()?;
      if length < 0 {
        return Err(corrupt_err!("Negative map length {} in column {}", length, self.column));
      }
      lengths_out[i] = length as u64;
      entries += length as usize;
      nulls.set_non_null(i);
    }
    self.keys.next_batch(entries, keys_out)?;
    self.values.next_batch(entries, values_out)
  }
}


pub struct UnionColumnReader {
  column: u32,
  presence: Presence,
  tags: Option<ByteStream>,
  children: Vec<Box<dyn ColumnReader>>,
  /// Scratch: rows of the current batch routed to each child.
  child_rows: Vec<usize>,
  pending_skip: usize
}

impl UnionColumnReader {
  pub fn new(column: u32, children: Vec<Box<dyn ColumnReader>>) -> Self {
    let child_count = children.len();
    Self {
      column,
      presence: Presence::new(),
      tags: None,
      children,
      child_rows: vec![0; child_count],
      pending_skip: 0
    }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      let tags = self.tags.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
      for count in self.child_rows.iter_mut() {
        *count = 0;
      }
      for _ in 0..present {
        let tag = tags.next()? as usize;
        if tag >= self.child_rows.len() {
          return Err(corrupt_err!("Union tag {} of column {} has no child", tag, self.column));
        }
        self.child_rows[tag] += 1;
      }
      for (child, count) in self.children.iter_mut().zip(self.child_rows.iter()) {
        child.skip(*count);
      }
    }
    Ok(())
  }
}

impl ColumnReader for UnionColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    self.tags = sources.byte_source(self.column, StreamKind::DATA)?
      .map(ByteStream::new);
    if self.tags.is_none() {
      return Err(missing_stream_err(self.column, StreamKind::DATA));
    }
    self.pending_skip = 0;
    for child in self.children.iter_mut() {
      child.start_stripe(sources, footer)?;
    }
    Ok(())
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    if let Some(ref mut tags) = self.tags {
      tags.seek(&mut provider)?;
    }
    for child in self.children.iter_mut() {
      child.start_row_group(positions)?;
    }
    Ok(())
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, tags_out, children_out) = match out {
      ColumnVector::Union { nulls, tags, children } => (nulls, tags, children),
      _ => return Err(corrupt_err!("Column {} expects a union vector", self.column))
    };
    if children_out.len() != self.children.len() {
      return Err(corrupt_err!(
        "Union column {} has {} child readers for {} child vectors",
        self.column, self.children.len(), children_out.len()));
    }
    nulls.reset(rows);
    tags_out.clear();
    tags_out.resize(rows, 0);

    self.presence.begin_batch(rows)?;
    let tags = self.tags.as_mut()
      .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
    for count in self.child_rows.iter_mut() {
      *count = 0;
    }
    for i in 0..rows {
      if self.presence.is_null[i] {
        continue;
      }
      let tag = tags.next()?;
      if tag as usize >= self.children.len() {
        return Err(corrupt_err!("Union tag {} of column {} has no child", tag, self.column));
      }
      tags_out[i] = tag;
      self.child_rows[tag as usize] += 1;
      nulls.set_non_null(i);
    }
    for ((child, vector), count) in self.children.iter_mut()
        .zip(children_out.iter_mut())
        .zip(self.child_rows.iter()) {
      child.next_batch(*count, vector)?;
    }
    Ok(())
  }
}
