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

//! Splitting a stripe's byte region into its streams, and the per-row-
//! group position plumbing.

use std::collections::HashMap;

use crate::basic::{CompressionKind, StreamKind};
use crate::errors::Result;
use crate::metadata::{RowGroupIndex, StripeFooter, StripeInformation};
use crate::stream::{OrcByteSource, PositionProvider};
use crate::util::memory::BytePtr;

/// Where one stream lives inside the stripe, by declaration order
/// accumulation over the stripe footer's stream list.
#[derive(Debug, Clone)]
pub struct StreamLayout {
  pub column: u32,
  pub kind: StreamKind,
  pub use_v_ints: bool,
  /// Offset relative to the start of the stripe.
  pub offset: u64,
  pub length: u64
}

/// Computes the absolute placement of every stream in the stripe.
/// Index streams must land inside the index region and data streams
/// inside the data region, in their respective declaration order.
pub fn stripe_layout(stripe: &StripeInformation, footer: &StripeFooter)
    -> Result<Vec<StreamLayout>> {
  let mut layouts = Vec::with_capacity(footer.streams.len());
  let index_end = stripe.index_length;
  let data_end = stripe.index_length + stripe.data_length;
  let mut offset: u64 = 0;
  for stream in &footer.streams {
    // the first data stream starts the data region even when index
    // streams left the index region short
    if !stream.kind.is_index_stream() && offset < index_end {
      offset = index_end;
    }
    let limit = if stream.kind.is_index_stream() { index_end } else { data_end };
    let end = offset + stream.length;
    if end > limit {
      return Err(corrupt_err!(
        "Stream {} of column {} ({} bytes at offset {}) overflows its stripe region",
        stream.kind, stream.column, stream.length, offset));
    }
    layouts.push(StreamLayout {
      column: stream.column,
      kind: stream.kind,
      use_v_ints: stream.use_v_ints,
      offset,
      length: stream.length
    });
    offset = end;
  }
  Ok(layouts)
}

struct StreamRegion {
  data: BytePtr,
  use_v_ints: bool
}

/// The byte regions of a stripe's streams, keyed by column id and stream
/// kind. Hands out fresh `OrcByteSource`s so each consumer owns its own
/// cursor over the shared region.
pub struct StripeSources {
  compression: CompressionKind,
  block_size: usize,
  regions: HashMap<(u32, StreamKind), StreamRegion>
}

impl StripeSources {
  pub fn new(compression: CompressionKind, block_size: usize) -> Self {
    Self { compression, block_size, regions: HashMap::new() }
  }

  pub fn insert(&mut self, column: u32, kind: StreamKind, data: BytePtr, use_v_ints: bool) {
    self.regions.insert((column, kind), StreamRegion { data, use_v_ints });
  }

  pub fn has(&self, column: u32, kind: StreamKind) -> bool {
    self.regions.contains_key(&(column, kind))
  }

  pub fn byte_source(&self, column: u32, kind: StreamKind) -> Result<Option<OrcByteSource>> {
    match self.regions.get(&(column, kind)) {
      None => Ok(None),
      Some(region) => {
        let source =
          OrcByteSource::new(region.data.all(), self.compression, self.block_size)?;
        Ok(Some(source))
      }
    }
  }

  pub fn use_v_ints(&self, column: u32, kind: StreamKind) -> bool {
    self.regions.get(&(column, kind)).map(|r| r.use_v_ints).unwrap_or(true)
  }
}

/// Builds stream sources for one region of a stripe (index or data) from
/// the region's bytes and the precomputed layout.
pub fn region_sources(sources: &mut StripeSources, layouts: &[StreamLayout],
                      region_start: u64, region: &BytePtr, index: bool) -> Result<()> {
  for layout in layouts {
    if layout.kind.is_index_stream() != index {
      continue;
    }
    let start = (layout.offset - region_start) as usize;
    let length = layout.length as usize;
    if start + length > region.len() {
      return Err(corrupt_err!(
        "Stream {} of column {} is outside its {} byte region",
        layout.kind, layout.column, region.len()));
    }
    sources.insert(layout.column, layout.kind,
                   region.range(start, length), layout.use_v_ints);
  }
  Ok(())
}

/// The row-index position vectors of one row group, per column.
pub struct RowGroupPositions<'a> {
  positions: HashMap<u32, &'a [u64]>
}

impl<'a> RowGroupPositions<'a> {
  /// Collects the `group`-th entry of every column's row index.
  pub fn for_group(row_indexes: &'a HashMap<u32, Vec<RowGroupIndex>>, group: usize)
      -> Result<RowGroupPositions<'a>> {
    let mut positions = HashMap::new();
    for (column, entries) in row_indexes {
      let entry = entries.get(group)
        .ok_or_else(|| corrupt_err!(
          "Column {} has {} row index entries, row group {} needs one",
          column, entries.len(), group))?;
      positions.insert(*column, entry.positions.as_slice());
    }
    Ok(RowGroupPositions { positions })
  }

  pub fn provider(&self, column: u32) -> Option<PositionProvider> {
    self.positions.get(&column).map(|p| PositionProvider::new(p))
  }
}
