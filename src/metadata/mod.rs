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

//! Dialect-neutral records for the tail metadata, and the reader trait
//! the two dialects implement.

use crate::basic::{ColumnEncodingKind, CompressionKind, OrcTypeKind, StreamKind};
use crate::errors::Result;

mod dwrf;
mod orc;

pub use self::dwrf::DwrfMetadataReader;
pub use self::orc::OrcMetadataReader;


// ----------------------------------------------------------------------
// Records

#[derive(Debug, Clone)]
pub struct PostScript {
  /// File format versions; empty for DWRF.
  pub versions: Vec<u32>,
  pub footer_length: u64,
  /// Length of the metadata section; zero for DWRF, which has none.
  pub metadata_length: u64,
  pub compression: CompressionKind,
  pub compression_block_size: u64
}

#[derive(Debug, Clone)]
pub struct Footer {
  pub number_of_rows: u64,
  pub row_index_stride: u32,
  pub stripes: Vec<StripeInformation>,
  pub types: Vec<OrcType>,
  pub column_statistics: Vec<ColumnStatistics>
}

#[derive(Debug, Clone)]
pub struct StripeInformation {
  pub number_of_rows: usize,
  pub offset: u64,
  pub index_length: u64,
  pub data_length: u64,
  pub footer_length: u64
}

impl StripeInformation {
  /// Total on-disk footprint of the stripe.
  pub fn total_length(&self) -> u64 {
    self.index_length + self.data_length + self.footer_length
  }
}

#[derive(Debug, Clone)]
pub struct StripeFooter {
  pub streams: Vec<StreamInfo>,
  pub encodings: Vec<ColumnEncoding>,
  /// Time zone the writer recorded, ORC only. Overrides the storage
  /// time zone supplied at open when it parses.
  pub writer_timezone: Option<String>
}

#[derive(Debug, Clone)]
pub struct StreamInfo {
  pub column: u32,
  pub kind: StreamKind,
  pub length: u64,
  /// DWRF streams may store integers as fixed eight byte words instead
  /// of varints. Always true for ORC.
  pub use_v_ints: bool
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnEncoding {
  pub kind: ColumnEncodingKind,
  pub dictionary_size: u32
}

/// One node of the flat type tree. Children are type ids indexing the
/// footer's type list; field names parallel the children of a STRUCT.
#[derive(Debug, Clone)]
pub struct OrcType {
  pub kind: OrcTypeKind,
  pub children: Vec<u32>,
  pub field_names: Vec<String>
}

/// Min/max style statistics, one variant per statistics family.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedStatistics {
  Integer { min: Option<i64>, max: Option<i64> },
  Double { min: Option<f64>, max: Option<f64> },
  String { min: Option<String>, max: Option<String> },
  Date { min: Option<i32>, max: Option<i32> },
  /// Boolean columns record the number of true values.
  Bucket { true_count: u64 }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
  /// Number of non-null values. Compared against the row count of the
  /// enclosing stripe or row group to infer whether nulls are present.
  pub number_of_values: u64,
  pub typed: Option<TypedStatistics>
}

#[derive(Debug, Clone)]
pub struct RowGroupIndex {
  /// Stream positions at the row-group boundary, consumed per stream in
  /// declaration order.
  pub positions: Vec<u64>,
  pub statistics: ColumnStatistics
}

#[derive(Debug, Clone)]
pub struct StripeStatistics {
  pub column_statistics: Vec<ColumnStatistics>
}

/// The metadata section: per-stripe column statistics. Empty for DWRF.
#[derive(Debug, Clone)]
pub struct Metadata {
  pub stripe_statistics: Vec<StripeStatistics>
}


// ----------------------------------------------------------------------
// Reader abstraction over the two dialects

pub trait MetadataReader {
  fn read_postscript(&self, data: &[u8]) -> Result<PostScript>;

  fn read_metadata(&self, data: &[u8]) -> Result<Metadata>;

  fn read_footer(&self, data: &[u8]) -> Result<Footer>;

  fn read_stripe_footer(&self, types: &[OrcType], data: &[u8]) -> Result<StripeFooter>;

  fn read_row_indexes(&self, data: &[u8]) -> Result<Vec<RowGroupIndex>>;
}
