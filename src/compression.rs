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

use std::io::Read;

use crate::basic::CompressionKind;
use crate::errors::Result;
use flate2::read::DeflateDecoder;
use snap::raw::{decompress_len, Decoder};

pub trait Codec {
  /// Decompress data stored in slice `input_buf` and write output to
  /// `output_buf`, replacing its previous content. Return the total
  /// number of bytes written.
  fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize>;
}


/// Given the compression kind, return a codec used to decompress chunk
/// payloads of that kind. This returns `None` if the kind is `NONE`.
pub fn create_codec(codec: CompressionKind) -> Result<Option<Box<dyn Codec>>> {
  match codec {
    CompressionKind::SNAPPY => Ok(Some(Box::new(SnappyCodec::new()))),
    CompressionKind::ZLIB => Ok(Some(Box::new(ZlibCodec::new()))),
    CompressionKind::NONE => Ok(None)
  }
}

pub struct SnappyCodec {
  decoder: Decoder
}

impl SnappyCodec {
  fn new() -> Self {
    Self { decoder: Decoder::new() }
  }
}

impl Codec for SnappyCodec {
  fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize> {
    let len = decompress_len(input_buf)
      .map_err(|e| decompress_err!("Bad Snappy preamble: {}", e))?;
    output_buf.resize(len, 0);
    self.decoder.decompress(input_buf, output_buf)
      .map_err(|e| decompress_err!("Error when decompressing using Snappy: {}", e))
  }
}

/// ORC "ZLIB" chunks are raw DEFLATE, with neither a zlib nor a gzip
/// envelope.
pub struct ZlibCodec {
}

impl ZlibCodec {
  fn new() -> Self {
    Self { }
  }
}

impl Codec for ZlibCodec {
  fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize> {
    output_buf.clear();
    let mut decoder = DeflateDecoder::new(input_buf);
    decoder.read_to_end(output_buf)
      .map_err(|e| decompress_err!("Error when decompressing using Zlib: {}", e))
  }
}
