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
use crate::proto::dwrf as proto;

/// Metadata reader for the legacy DWRF dialect. There is no metadata
/// section, so stripe-level statistics are always empty; DIRECT on
/// SHORT/INT/LONG columns means v1 run length encoding; the stride
/// dictionary stream kinds map onto their row-group names.
pub struct DwrfMetadataReader;

impl MetadataReader for DwrfMetadataReader {
  fn read_postscript(&self, data: &[u8]) -> Result<PostScript> {
    let postscript = proto::PostScript::decode(data)?;
    Ok(PostScript {
      versions: vec![],
      footer_length: postscript.footer_length.unwrap_or(0),
      metadata_length: 0,
      compression: to_compression(postscript.compression)?,
      compression_block_size: postscript.compression_block_size.unwrap_or(0)
    })
  }

  fn read_metadata(&self, _data: &[u8]) -> Result<Metadata> {
    Ok(Metadata { stripe_statistics: vec![] })
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

  fn read_stripe_footer(&self, types: &[OrcType], data: &[u8]) -> Result<StripeFooter> {
    let stripe_footer = proto::StripeFooter::decode(data)?;
    if types.len() != stripe_footer.columns.len() {
      return Err(corrupt_err!(
        "Stripe footer has {} column encodings for {} types",
        stripe_footer.columns.len(), types.len()));
    }
    let mut streams = Vec::with_capacity(stripe_footer.streams.len());
    for stream in &stripe_footer.streams {
      streams.push(to_stream(stream)?);
    }
    let mut encodings = Vec::with_capacity(stripe_footer.columns.len());
    for (tp, encoding) in types.iter().zip(stripe_footer.columns.iter()) {
      encodings.push(to_column_encoding(tp.kind, encoding)?);
    }
    Ok(StripeFooter { streams, encodings, writer_timezone: None })
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
  Ok(StreamInfo {
    column: stream.column.unwrap_or(0),
    kind: to_stream_kind(stream.kind)?,
    length: stream.length.unwrap_or(0),
    use_v_ints: stream.use_v_ints.unwrap_or(true)
  })
}

fn to_column_encoding(tp: OrcTypeKind, encoding: &proto::ColumnEncoding) -> Result<ColumnEncoding> {
  Ok(ColumnEncoding {
    kind: to_column_encoding_kind(tp, encoding.kind)?,
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
    .map_err(|_| unsupported_err!("{} is not a DWRF type kind", raw))?;
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
    proto::r#type::Kind::Union => OrcTypeKind::UNION
  })
}

fn to_stream_kind(kind: Option<i32>) -> Result<StreamKind> {
  let raw = kind.unwrap_or(0);
  let kind = proto::stream::Kind::try_from(raw)
    .map_err(|_| unsupported_err!("{} is not a DWRF stream kind", raw))?;
  Ok(match kind {
    proto::stream::Kind::Present => StreamKind::PRESENT,
    proto::stream::Kind::Data => StreamKind::DATA,
    proto::stream::Kind::Length => StreamKind::LENGTH,
    proto::stream::Kind::DictionaryData => StreamKind::DICTIONARY_DATA,
    proto::stream::Kind::DictionaryCount => StreamKind::DICTIONARY_COUNT,
    proto::stream::Kind::NanoData => StreamKind::SECONDARY,
    proto::stream::Kind::RowIndex => StreamKind::ROW_INDEX,
    proto::stream::Kind::InDictionary => StreamKind::IN_DICTIONARY,
    proto::stream::Kind::StrideDictionary => StreamKind::ROW_GROUP_DICTIONARY,
    proto::stream::Kind::StrideDictionaryLength => StreamKind::ROW_GROUP_DICTIONARY_LENGTH
  })
}

fn to_column_encoding_kind(tp: OrcTypeKind, kind: Option<i32>) -> Result<ColumnEncodingKind> {
  let raw = kind.unwrap_or(0);
  let kind = proto::column_encoding::Kind::try_from(raw)
    .map_err(|_| unsupported_err!("{} is not a DWRF column encoding", raw))?;
  Ok(match kind {
    proto::column_encoding::Kind::Direct => {
      match tp {
        OrcTypeKind::SHORT | OrcTypeKind::INT | OrcTypeKind::LONG =>
          ColumnEncodingKind::DWRF_DIRECT,
        _ => ColumnEncodingKind::DIRECT
      }
    },
    proto::column_encoding::Kind::Dictionary => ColumnEncodingKind::DICTIONARY
  })
}

fn to_compression(compression: Option<i32>) -> Result<CompressionKind> {
  let raw = compression.unwrap_or(0);
  let kind = proto::CompressionKind::try_from(raw)
    .map_err(|_| unsupported_err!("{} is not a DWRF compression kind", raw))?;
  Ok(match kind {
    proto::CompressionKind::None => CompressionKind::NONE,
    proto::CompressionKind::Zlib => CompressionKind::ZLIB,
    proto::CompressionKind::Snappy => CompressionKind::SNAPPY,
    proto::CompressionKind::Lzo => {
      return Err(unsupported_err!("LZO compression not implemented yet"))
    }
  })
}


#[cfg(test)]
mod tests {
  use super::*;

  fn long_type() -> proto::Type {
    proto::Type {
      kind: Some(proto::r#type::Kind::Long as i32),
      ..Default::default()
    }
  }

  fn string_type() -> proto::Type {
    proto::Type {
      kind: Some(proto::r#type::Kind::String as i32),
      ..Default::default()
    }
  }

  #[test]
  fn test_postscript_has_no_metadata_section() {
    let postscript = proto::PostScript {
      footer_length: Some(64),
      compression: Some(proto::CompressionKind::Snappy as i32),
      compression_block_size: Some(262144)
    };
    let parsed = DwrfMetadataReader.read_postscript(&postscript.encode_to_vec()).unwrap();
    assert_eq!(parsed.footer_length, 64);
    assert_eq!(parsed.metadata_length, 0);
    assert!(parsed.versions.is_empty());
    assert_eq!(parsed.compression, CompressionKind::SNAPPY);
  }

  #[test]
  fn test_metadata_is_empty() {
    let parsed = DwrfMetadataReader.read_metadata(&[]).unwrap();
    assert!(parsed.stripe_statistics.is_empty());
  }

  #[test]
  fn test_direct_becomes_dwrf_direct_for_integers() {
    let types = DwrfMetadataReader.read_footer(&proto::Footer {
      types: vec![long_type(), string_type()],
      ..Default::default()
    }.encode_to_vec()).unwrap().types;

    let stripe_footer = proto::StripeFooter {
      streams: vec![],
      columns: vec![
        proto::ColumnEncoding {
          kind: Some(proto::column_encoding::Kind::Direct as i32),
          dictionary_size: None
        },
        proto::ColumnEncoding {
          kind: Some(proto::column_encoding::Kind::Direct as i32),
          dictionary_size: None
        },
      ]
    };
    let parsed = DwrfMetadataReader
      .read_stripe_footer(&types, &stripe_footer.encode_to_vec())
      .unwrap();
    assert_eq!(parsed.encodings[0].kind, ColumnEncodingKind::DWRF_DIRECT);
    assert_eq!(parsed.encodings[1].kind, ColumnEncodingKind::DIRECT);
  }

  #[test]
  fn test_encoding_count_mismatch_is_corrupt() {
    let types = vec![OrcType {
      kind: OrcTypeKind::LONG,
      children: vec![],
      field_names: vec![]
    }];
    let stripe_footer = proto::StripeFooter { streams: vec![], columns: vec![] };
    match DwrfMetadataReader.read_stripe_footer(&types, &stripe_footer.encode_to_vec()) {
      Err(crate::errors::OrcError::Corrupt(_)) => (),
      other => panic!("expected Corrupt, got {:?}", other)
    }
  }

  #[test]
  fn test_stride_dictionary_stream_kinds() {
    let stripe_footer = proto::StripeFooter {
      streams: vec![
        proto::Stream {
          kind: Some(proto::stream::Kind::NanoData as i32),
          column: Some(1),
          length: Some(10),
          use_v_ints: None
        },
        proto::Stream {
          kind: Some(proto::stream::Kind::StrideDictionary as i32),
          column: Some(2),
          length: Some(20),
          use_v_ints: Some(false)
        },
        proto::Stream {
          kind: Some(proto::stream::Kind::StrideDictionaryLength as i32),
          column: Some(2),
          length: Some(5),
          use_v_ints: None
        },
        proto::Stream {
          kind: Some(proto::stream::Kind::InDictionary as i32),
          column: Some(2),
          length: Some(2),
          use_v_ints: None
        },
      ],
      columns: vec![]
    };
    let parsed = DwrfMetadataReader
      .read_stripe_footer(&[], &stripe_footer.encode_to_vec())
      .unwrap();
    assert_eq!(parsed.streams[0].kind, StreamKind::SECONDARY);
    assert!(parsed.streams[0].use_v_ints);
    assert_eq!(parsed.streams[1].kind, StreamKind::ROW_GROUP_DICTIONARY);
    assert!(!parsed.streams[1].use_v_ints);
    assert_eq!(parsed.streams[2].kind, StreamKind::ROW_GROUP_DICTIONARY_LENGTH);
    assert_eq!(parsed.streams[3].kind, StreamKind::IN_DICTIONARY);
  }
}
