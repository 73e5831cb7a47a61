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

use prost::Message;

use crate::basic::{ColumnEncodingKind, CompressionKind, OrcTypeKind, StreamKind};
use crate::errors::Result;
use crate::metadata::*;
use crate::proto::orc as proto;

/// Metadata reader for the Apache ORC dialect.
pub struct OrcMetadataReader;

impl MetadataReader for OrcMetadataReader {
  fn read_postscript(&self, data: &[u8]) -> Result<PostScript> {
    let postscript = proto::PostScript::decode(data)?;
    Ok(PostScript {
      versions: postscript.version.clone(),
      footer_length: postscript.footer_length.unwrap_or(0),
      metadata_length: postscript.metadata_length.unwrap_or(0),
      compression: to_compression(postscript.compression)?,
      compression_block_size: postscript.compression_block_size.unwrap_or(0)
    })
  }

  fn read_metadata(&self, data: &[u8]) -> Result<Metadata> {
    let metadata = proto::Metadata::decode(data)?;
    let mut stripe_statistics = Vec::with_capacity(metadata.stripe_stats.len());
    for stripe in metadata.stripe_stats {
      stripe_statistics.push(StripeStatistics {
        column_statistics: to_column_statistics_list(stripe.col_stats)
      });
    }
    Ok(Metadata { stripe_statistics })
  }

  fn read_footer(&self, data: &[u8]) -> Result<Footer> {
    let footer = proto::Footer::decode(data)?;
    Ok(Footer {
      number_of_rows: footer.number_of_rows.unwrap_or(0),
      row_index_stride: footer.row_index_stride.unwrap_or(0),
      stripes: footer.stripes.into_iter().map(to_stripe_information).collect(),
      types: to_types(&footer.types)?,
      column_statistics: to_column_statistics_list(footer.statistics)
    })
  }

  fn read_stripe_footer(&self, _types: &[OrcType], data: &[u8]) -> Result<StripeFooter> {
    let stripe_footer = proto::StripeFooter::decode(data)?;
    let mut streams = Vec::with_capacity(stripe_footer.streams.len());
    for stream in &stripe_footer.streams {
      streams.push(to_stream(stream)?);
    }
    let mut encodings = Vec::with_capacity(stripe_footer.columns.len());
    for encoding in &stripe_footer.columns {
      encodings.push(to_column_encoding(encoding)?);
    }
    Ok(StripeFooter {
      streams,
      encodings,
      writer_timezone: stripe_footer.writer_timezone
    })
  }

  fn read_row_indexes(&self, data: &[u8]) -> Result<Vec<RowGroupIndex>> {
    let row_index = proto::RowIndex::decode(data)?;
    Ok(row_index.entry.into_iter()
      .map(|entry| RowGroupIndex {
        positions: entry.positions,
        statistics: entry.statistics.map(to_column_statistics).unwrap_or(ColumnStatistics {
          number_of_values: 0,
          typed: None
        })
      })
      .collect())
  }
}

fn to_stripe_information(stripe: proto::StripeInformation) -> StripeInformation {
  StripeInformation {
    number_of_rows: stripe.number_of_rows.unwrap_or(0) as usize,
    offset: stripe.offset.unwrap_or(0),
    index_length: stripe.index_length.unwrap_or(0),
    data_length: stripe.data_length.unwrap_or(0),
    footer_length: stripe.footer_length.unwrap_or(0)
  }
}

fn to_stream(stream: &proto::Stream) -> Result<StreamInfo> {
  // ORC streams always use varints
  Ok(StreamInfo {
    column: stream.column.unwrap_or(0),
    kind: to_stream_kind(stream.kind)?,
    length: stream.length.unwrap_or(0),
    use_v_ints: true
  })
}

fn to_column_encoding(encoding: &proto::ColumnEncoding) -> Result<ColumnEncoding> {
  Ok(ColumnEncoding {
    kind: to_column_encoding_kind(encoding.kind)?,
    dictionary_size: encoding.dictionary_size.unwrap_or(0)
  })
}

fn to_column_statistics(statistics: proto::ColumnStatistics) -> ColumnStatistics {
  let typed = if let Some(ref s) = statistics.int_statistics {
    Some(TypedStatistics::Integer { min: s.minimum, max: s.maximum })
  } else if let Some(ref s) = statistics.double_statistics {
    Some(TypedStatistics::Double { min: s.minimum, max: s.maximum })
  } else if let Some(ref s) = statistics.string_statistics {
    Some(TypedStatistics::String { min: s.minimum.clone(), max: s.maximum.clone() })
  } else if let Some(ref s) = statistics.date_statistics {
    Some(TypedStatistics::Date { min: s.minimum, max: s.maximum })
  } else if let Some(ref s) = statistics.bucket_statistics {
    s.count.first().map(|count| TypedStatistics::Bucket { true_count: *count })
  } else {
    None
  };
  ColumnStatistics {
    number_of_values: statistics.number_of_values.unwrap_or(0),
    typed
  }
}

fn to_column_statistics_list(statistics: Vec<proto::ColumnStatistics>) -> Vec<ColumnStatistics> {
  statistics.into_iter().map(to_column_statistics).collect()
}

fn to_types(types: &[proto::Type]) -> Result<Vec<OrcType>> {
  let mut result = Vec::with_capacity(types.len());
  for tp in types {
    result.push(OrcType {
      kind: to_type_kind(tp.kind)?,
      children: tp.subtypes.clone(),
      field_names: tp.field_names.clone()
    });
  }
  Ok(result)
}

fn to_type_kind(kind: Option<i32>) -> Result<OrcTypeKind> {
  let raw = kind.unwrap_or(0);
  let kind = proto::r#type::Kind::try_from(raw)
    .map_err(|_| unsupported_err!("{} is not an ORC type kind", raw))?;
  Ok(match kind {
    proto::r#type::Kind::Boolean => OrcTypeKind::BOOLEAN,
    proto::r#type::Kind::Byte => OrcTypeKind::BYTE,
    proto::r#type::Kind::Short => OrcTypeKind::SHORT,
    proto::r#type::Kind::Int => OrcTypeKind::INT,
    proto::r#type::Kind::Long => OrcTypeKind::LONG,
    proto::r#type::Kind::Float => OrcTypeKind::FLOAT,
    proto::r#type::Kind::Double => OrcTypeKind::DOUBLE,
    proto::r#type::Kind::String => OrcTypeKind::STRING,
    proto::r#type::Kind::Binary => OrcTypeKind::BINARY,
    proto::r#type::Kind::Timestamp => OrcTypeKind::TIMESTAMP,
    proto::r#type::Kind::List => OrcTypeKind::LIST,
    proto::r#type::Kind::Map => OrcTypeKind::MAP,
    proto::r#type::Kind::Struct => OrcTypeKind::STRUCT,
    proto::r#type::Kind::Union => OrcTypeKind::UNION,
    proto::r#type::Kind::Decimal => OrcTypeKind::DECIMAL,
    proto::r#type::Kind::Date => OrcTypeKind::DATE,
    proto::r#type::Kind::Varchar => OrcTypeKind::VARCHAR,
    proto::r#type::Kind::Char => OrcTypeKind::CHAR
  })
}

fn to_stream_kind(kind: Option<i32>) -> Result<StreamKind> {
  let raw = kind.unwrap_or(0);
  let kind = proto::stream::Kind::try_from(raw)
    .map_err(|_| unsupported_err!("{} is not an ORC stream kind", raw))?;
  Ok(match kind {
    proto::stream::Kind::Present => StreamKind::PRESENT,
    proto::stream::Kind::Data => StreamKind::DATA,
    proto::stream::Kind::Length => StreamKind::LENGTH,
    proto::stream::Kind::DictionaryData => StreamKind::DICTIONARY_DATA,
    proto::stream::Kind::DictionaryCount => StreamKind::DICTIONARY_COUNT,
    proto::stream::Kind::Secondary => StreamKind::SECONDARY,
    proto::stream::Kind::RowIndex => StreamKind::ROW_INDEX,
    proto::stream::Kind::BloomFilter => StreamKind::BLOOM_FILTER
  })
}

fn to_column_encoding_kind(kind: Option<i32>) -> Result<ColumnEncodingKind> {
  let raw = kind.unwrap_or(0);
  let kind = proto::column_encoding::Kind::try_from(raw)
    .map_err(|_| unsupported_err!("{} is not an ORC column encoding", raw))?;
  Ok(match kind {
    proto::column_encoding::Kind::Direct => ColumnEncodingKind::DIRECT,
    proto::column_encoding::Kind::Dictionary => ColumnEncodingKind::DICTIONARY,
    proto::column_encoding::Kind::DirectV2 => ColumnEncodingKind::DIRECT_V2,
    proto::column_encoding::Kind::DictionaryV2 => ColumnEncodingKind::DICTIONARY_V2
  })
}

fn to_compression(compression: Option<i32>) -> Result<CompressionKind> {
  let raw = compression.unwrap_or(0);
  let kind = proto::CompressionKind::try_from(raw)
    .map_err(|_| unsupported_err!("{} is not an ORC compression kind", raw))?;
  Ok(match kind {
    proto::CompressionKind::None => CompressionKind::NONE,
    proto::CompressionKind::Zlib => CompressionKind::ZLIB,
    proto::CompressionKind::Snappy => CompressionKind::SNAPPY,
    other => {
      return Err(unsupported_err!("{:?} compression not implemented yet", other))
    }
  })
}


#[cfg(test)]
mod tests {
  use super::*;

  fn encode<M: Message>(message: &M) -> Vec<u8> {
    message.encode_to_vec()
  }

  #[test]
  fn test_read_postscript() {
    let postscript = proto::PostScript {
      footer_length: Some(120),
      compression: Some(proto::CompressionKind::Zlib as i32),
      compression_block_size: Some(262144),
      version: vec![0, 12],
      metadata_length: Some(40),
      writer_version: Some(1),
      magic: Some("ORC".to_owned())
    };
    let parsed = OrcMetadataReader.read_postscript(&encode(&postscript)).unwrap();
    assert_eq!(parsed.footer_length, 120);
    assert_eq!(parsed.metadata_length, 40);
    assert_eq!(parsed.versions, vec![0, 12]);
    assert_eq!(parsed.compression, CompressionKind::ZLIB);
    assert_eq!(parsed.compression_block_size, 262144);
  }

  #[test]
  fn test_unknown_compression_is_rejected() {
    let postscript = proto::PostScript {
      footer_length: Some(1),
      compression: Some(proto::CompressionKind::Zstd as i32),
      ..Default::default()
    };
    match OrcMetadataReader.read_postscript(&encode(&postscript)) {
      Err(crate::errors::OrcError::UnsupportedMetadata(_)) => (),
      other => panic!("expected UnsupportedMetadata, got {:?}", other)
    }
  }

  #[test]
  fn test_read_footer_types_and_stripes() {
    let footer = proto::Footer {
      number_of_rows: Some(1000),
      row_index_stride: Some(10000),
      stripes: vec![proto::StripeInformation {
        offset: Some(3),
        index_length: Some(10),
        data_length: Some(100),
        footer_length: Some(20),
        number_of_rows: Some(1000)
      }],
      types: vec![
        proto::Type {
          kind: Some(proto::r#type::Kind::Struct as i32),
          subtypes: vec![1, 2],
          field_names: vec!["a".to_owned(), "b".to_owned()],
          ..Default::default()
        },
        proto::Type {
          kind: Some(proto::r#type::Kind::Long as i32),
          ..Default::default()
        },
        proto::Type {
          kind: Some(proto::r#type::Kind::String as i32),
          ..Default::default()
        },
      ],
      statistics: vec![proto::ColumnStatistics {
        number_of_values: Some(990),
        int_statistics: Some(proto::IntegerStatistics {
          minimum: Some(-5),
          maximum: Some(40),
          sum: None
        }),
        ..Default::default()
      }],
      ..Default::default()
    };
    let parsed = OrcMetadataReader.read_footer(&encode(&footer)).unwrap();
    assert_eq!(parsed.number_of_rows, 1000);
    assert_eq!(parsed.row_index_stride, 10000);
    assert_eq!(parsed.stripes.len(), 1);
    assert_eq!(parsed.stripes[0].total_length(), 130);
    assert_eq!(parsed.types.len(), 3);
    assert_eq!(parsed.types[0].kind, OrcTypeKind::STRUCT);
    assert_eq!(parsed.types[0].children, vec![1, 2]);
    assert_eq!(parsed.types[0].field_names, vec!["a", "b"]);
    assert_eq!(parsed.column_statistics[0].typed,
               Some(TypedStatistics::Integer { min: Some(-5), max: Some(40) }));
  }

  #[test]
  fn test_read_stripe_footer() {
    let stripe_footer = proto::StripeFooter {
      streams: vec![
        proto::Stream {
          kind: Some(proto::stream::Kind::RowIndex as i32),
          column: Some(1),
          length: Some(30)
        },
        proto::Stream {
          kind: Some(proto::stream::Kind::Data as i32),
          column: Some(1),
          length: Some(1000)
        },
      ],
      columns: vec![
        proto::ColumnEncoding {
          kind: Some(proto::column_encoding::Kind::Direct as i32),
          dictionary_size: None
        },
        proto::ColumnEncoding {
          kind: Some(proto::column_encoding::Kind::DictionaryV2 as i32),
          dictionary_size: Some(4)
        },
      ],
      writer_timezone: Some("America/Los_Angeles".to_owned())
    };
    let parsed = OrcMetadataReader.read_stripe_footer(&[], &encode(&stripe_footer)).unwrap();
    assert_eq!(parsed.streams.len(), 2);
    assert_eq!(parsed.streams[0].kind, StreamKind::ROW_INDEX);
    assert_eq!(parsed.streams[1].kind, StreamKind::DATA);
    assert!(parsed.streams[1].use_v_ints);
    assert_eq!(parsed.encodings[1].kind, ColumnEncodingKind::DICTIONARY_V2);
    assert_eq!(parsed.encodings[1].dictionary_size, 4);
    assert_eq!(parsed.writer_timezone.as_deref(), Some("America/Los_Angeles"));
  }

  #[test]
  fn test_read_row_indexes() {
    let row_index = proto::RowIndex {
      entry: vec![
        proto::RowIndexEntry {
          positions: vec![0, 0, 0],
          statistics: Some(proto::ColumnStatistics {
            number_of_values: Some(10000),
            int_statistics: Some(proto::IntegerStatistics {
              minimum: Some(10),
              maximum: Some(20),
              sum: None
            }),
            ..Default::default()
          })
        },
        proto::RowIndexEntry {
          positions: vec![128, 3, 1],
          statistics: None
        },
      ]
    };
    let parsed = OrcMetadataReader.read_row_indexes(&encode(&row_index)).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].positions, vec![0, 0, 0]);
    assert_eq!(parsed[0].statistics.typed,
               Some(TypedStatistics::Integer { min: Some(10), max: Some(20) }));
    assert_eq!(parsed[1].positions, vec![128, 3, 1]);
  }

  #[test]
  fn test_bucket_statistics() {
    let statistics = proto::ColumnStatistics {
      number_of_values: Some(100),
      bucket_statistics: Some(proto::BucketStatistics { count: vec![37] }),
      ..Default::default()
    };
    let parsed = to_column_statistics(statistics);
    assert_eq!(parsed.typed, Some(TypedStatistics::Bucket { true_count: 37 }));
  }
}
