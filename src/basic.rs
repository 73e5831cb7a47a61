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

use std::fmt;


// ----------------------------------------------------------------------
// Dialect-neutral mirrors of the wire enums. Both the ORC and the DWRF
// protobuf enums map into these; the mapping lives in the metadata
// readers.


/// Mirrors `CompressionKind`. Only the kinds both dialects define are
/// supported by the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
  NONE,
  ZLIB,
  SNAPPY
}

/// Mirrors `Stream.Kind`, with the DWRF-only kinds folded in:
/// NANO_DATA arrives here as SECONDARY, STRIDE_DICTIONARY and
/// STRIDE_DICTIONARY_LENGTH as ROW_GROUP_DICTIONARY{_LENGTH}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
  PRESENT,
  DATA,
  LENGTH,
  DICTIONARY_DATA,
  DICTIONARY_COUNT,
  SECONDARY,
  ROW_INDEX,
  IN_DICTIONARY,
  ROW_GROUP_DICTIONARY,
  ROW_GROUP_DICTIONARY_LENGTH,
  BLOOM_FILTER
}

impl StreamKind {
  /// Index streams live in the stripe's index region, ahead of the data
  /// region, and are not consumed by value decoding.
  pub fn is_index_stream(&self) -> bool {
    match *self {
      StreamKind::ROW_INDEX | StreamKind::BLOOM_FILTER => true,
      _ => false
    }
  }
}

/// Mirrors `ColumnEncoding.Kind`. DWRF_DIRECT is the DWRF dialect's
/// DIRECT on SHORT/INT/LONG columns, which uses v1 run length encoding
/// where ORC DIRECT_V2 uses v2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnEncodingKind {
  DIRECT,
  DICTIONARY,
  DIRECT_V2,
  DICTIONARY_V2,
  DWRF_DIRECT
}

/// Mirrors `Type.Kind` of the type tree in the file footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrcTypeKind {
  BOOLEAN,
  BYTE,
  SHORT,
  INT,
  LONG,
  FLOAT,
  DOUBLE,
  STRING,
  BINARY,
  TIMESTAMP,
  LIST,
  MAP,
  STRUCT,
  UNION,
  DECIMAL,
  DATE,
  VARCHAR,
  CHAR
}

impl fmt::Display for CompressionKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for StreamKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for ColumnEncodingKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for OrcTypeKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_stream_kind() {
    assert_eq!(StreamKind::PRESENT.to_string(), "PRESENT");
    assert_eq!(StreamKind::DICTIONARY_DATA.to_string(), "DICTIONARY_DATA");
    assert_eq!(StreamKind::ROW_GROUP_DICTIONARY_LENGTH.to_string(),
               "ROW_GROUP_DICTIONARY_LENGTH");
  }

  #[test]
  fn test_index_streams() {
    assert!(StreamKind::ROW_INDEX.is_index_stream());
    assert!(StreamKind::BLOOM_FILTER.is_index_stream());
    assert!(!StreamKind::PRESENT.is_index_stream());
    assert!(!StreamKind::DATA.is_index_stream());
    assert!(!StreamKind::DICTIONARY_DATA.is_index_stream());
  }

  #[test]
  fn test_display_encoding_kind() {
    assert_eq!(ColumnEncodingKind::DIRECT_V2.to_string(), "DIRECT_V2");
    assert_eq!(ColumnEncodingKind::DWRF_DIRECT.to_string(), "DWRF_DIRECT");
  }
}
