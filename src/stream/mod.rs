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

//! The typed value streams of a stripe, layered on a chunk-decompressing
//! byte source.

use crate::basic::CompressionKind;
use crate::compression::{create_codec, Codec};
use crate::errors::Result;
use crate::util::memory::BytePtr;

pub mod boolean;
pub mod byte_rle;
pub mod float;
pub mod int_v1;
pub mod int_v2;

/// Size of the chunk header that precedes every chunk of a compressed
/// stream: 23 bits of on-disk length plus the "original" flag bit,
/// little endian.
const CHUNK_HEADER_SIZE: usize = 3;


// ----------------------------------------------------------------------
// Varint helpers shared by the integer streams

/// Base-128 varint, least significant group first, high bit of each byte
/// marking continuation.
pub(crate) fn read_vu64(input: &mut OrcByteSource) -> Result<u64> {
  let mut result: u64 = 0;
  let mut shift: u32 = 0;
  loop {
    let byte = input.read_u8()?;
    if shift >= 64 {
      return Err(corrupt_err!("Varint is longer than 10 bytes"));
    }
    result |= ((byte & 0x7F) as u64) << shift;
    if byte & 0x80 == 0 {
      return Ok(result);
    }
    shift += 7;
  }
}

pub(crate) fn read_vs64(input: &mut OrcByteSource) -> Result<i64> {
  Ok(zigzag_decode(read_vu64(input)?))
}

#[inline]
pub(crate) fn zigzag_decode(v: u64) -> i64 {
  ((v >> 1) as i64) ^ -((v & 1) as i64)
}


// ----------------------------------------------------------------------
// Row-index positions

/// Hands out the entries of one row-index position vector. Each stream
/// of a column consumes the tuple arity it needs, in stream declaration
/// order, leaving the rest for the streams after it.
pub struct PositionProvider<'a> {
  positions: &'a [u64],
  index: usize
}

impl<'a> PositionProvider<'a> {
  pub fn new(positions: &'a [u64]) -> Self {
    Self { positions, index: 0 }
  }

  pub fn next(&mut self) -> Result<u64> {
    if self.index >= self.positions.len() {
      return Err(corrupt_err!(
        "Row index entry has {} positions, needed more", self.positions.len()));
    }
    let v = self.positions[self.index];
    self.index += 1;
    Ok(v)
  }
}


// ----------------------------------------------------------------------
// Chunk-decompressing byte source

/// The logical byte stream over one stripe stream's on-disk region.
///
/// With compression enabled the region is a sequence of chunks, each led
/// by a 3-byte little-endian header whose low bit marks an "original"
/// (stored verbatim) chunk and whose remaining bits give the on-disk
/// length. A decompressed chunk never exceeds the postscript's
/// compression block size. With `CompressionKind::NONE` there is no
/// framing and reads are zero-copy slices of the region.
pub struct OrcByteSource {
  data: BytePtr,
  codec: Option<Box<dyn Codec>>,
  block_size: usize,
  /// Decoded view of the current chunk; a zero-copy slice of `data` for
  /// original chunks and unframed streams.
  current: BytePtr,
  pos: usize,
  /// Offset in `data` of the next chunk header. At `data.len()` when no
  /// chunks remain.
  next_chunk: usize
}

impl OrcByteSource {
  pub fn new(data: BytePtr, compression: CompressionKind, block_size: usize) -> Result<Self> {
    let codec = create_codec(compression)?;
    let len = data.len();
    let current = match codec {
      None => data.all(),
      Some(_) => BytePtr::empty()
    };
    let next_chunk = match codec {
      None => len,
      Some(_) => 0
    };
    Ok(Self { data, codec, block_size, current, pos: 0, next_chunk })
  }

  /// Bytes that can be served without touching the next chunk.
  fn available_in_chunk(&self) -> usize {
    self.current.len() - self.pos
  }

  pub fn exhausted(&self) -> bool {
    self.pos >= self.current.len() && self.next_chunk >= self.data.len()
  }

  fn advance_chunk(&mut self) -> Result<()> {
    if self.next_chunk >= self.data.len() {
      return Err(corrupt_err!("Read past end of stream"));
    }
    if self.next_chunk + CHUNK_HEADER_SIZE > self.data.len() {
      return Err(malformed_err!(
        "Truncated chunk header at offset {} of {} byte stream",
        self.next_chunk, self.data.len()));
    }
    let bytes = self.data.slice();
    let header = bytes[self.next_chunk] as usize
      | (bytes[self.next_chunk + 1] as usize) << 8
      | (bytes[self.next_chunk + 2] as usize) << 16;
    let is_original = header & 1 == 1;
    let chunk_length = header >> 1;
    let chunk_start = self.next_chunk + CHUNK_HEADER_SIZE;
    if chunk_start + chunk_length > self.data.len() {
      return Err(malformed_err!(
        "Chunk of {} bytes at offset {} overflows {} byte stream",
        chunk_length, self.next_chunk, self.data.len()));
    }

    let chunk = self.data.range(chunk_start, chunk_length);
    if is_original {
      self.current = chunk;
    } else {
      let codec = self.codec.as_mut()
        .expect("compressed chunk in unframed stream");
      let mut out = Vec::with_capacity(self.block_size);
      codec.decompress(chunk.slice(), &mut out)?;
      if out.len() > self.block_size {
        return Err(malformed_err!(
          "Chunk decompressed to {} bytes, more than the {} byte block size",
          out.len(), self.block_size));
      }
      self.current = BytePtr::new(out);
    }
    self.pos = 0;
    self.next_chunk = chunk_start + chunk_length;
    Ok(())
  }

  pub fn read_u8(&mut self) -> Result<u8> {
    while self.pos >= self.current.len() {
      self.advance_chunk()?;
    }
    let b = self.current.slice()[self.pos];
    self.pos += 1;
    Ok(b)
  }

  pub fn read_exact(&mut self, out: &mut [u8]) -> Result<()> {
    let mut written = 0;
    while written < out.len() {
      let available = self.available_in_chunk();
      if available == 0 {
        self.advance_chunk()?;
        continue;
      }
      let n = ::std::cmp::min(available, out.len() - written);
      out[written..written + n]
        .copy_from_slice(&self.current.slice()[self.pos..self.pos + n]);
      self.pos += n;
      written += n;
    }
    Ok(())
  }

  /// Read `n` bytes as a shared slice: zero-copy when the run does not
  /// cross a chunk boundary, assembled into a fresh buffer otherwise.
  pub fn read_slice(&mut self, n: usize) -> Result<BytePtr> {
    if n == 0 {
      return Ok(BytePtr::empty());
    }
    if self.available_in_chunk() >= n {
      let slice = self.current.range(self.pos, n);
      self.pos += n;
      return Ok(slice);
    }
    let mut buf = vec![0; n];
    self.read_exact(&mut buf)?;
    Ok(BytePtr::new(buf))
  }

  /// Read the remainder of the stream, decompressing chunk by chunk.
  /// Used for the tail metadata sections and stripe footers, whose
  /// uncompressed size is not recorded anywhere.
  pub fn read_to_end(&mut self) -> Result<BytePtr> {
    if self.codec.is_none() {
      let rest = self.current.range(self.pos, self.current.len() - self.pos);
      self.pos = self.current.len();
      return Ok(rest);
    }
    let mut buf = Vec::new();
    loop {
      let available = self.available_in_chunk();
      buf.extend_from_slice(&self.current.slice()[self.pos..self.pos + available]);
      self.pos = self.current.len();
      if self.next_chunk >= self.data.len() {
        return Ok(BytePtr::new(buf));
      }
      self.advance_chunk()?;
    }
  }

  pub fn skip(&mut self, n: usize) -> Result<()> {
    let mut left = n;
    loop {
      let available = self.available_in_chunk();
      if left <= available {
        self.pos += left;
        return Ok(());
      }
      left -= available;
      self.pos = self.current.len();
      self.advance_chunk()?;
    }
  }

  /// Reposition to a row-group checkpoint. Framed streams consume two
  /// positions (compressed offset of the chunk header, uncompressed
  /// offset within the chunk); unframed streams consume one.
  pub fn seek(&mut self, positions: &mut PositionProvider) -> Result<()> {
    match self.codec {
      Some(_) => {
        let compressed = positions.next()? as usize;
        let uncompressed = positions.next()? as usize;
        if compressed > self.data.len() {
          return Err(corrupt_err!(
            "Checkpoint at compressed offset {} is past the {} byte stream",
            compressed, self.data.len()));
        }
        self.next_chunk = compressed;
        self.current = BytePtr::empty();
        self.pos = 0;
        if uncompressed > 0 {
          self.skip(uncompressed)?;
        }
      },
      None => {
        let offset = positions.next()? as usize;
        if offset > self.data.len() {
          return Err(corrupt_err!(
            "Checkpoint at offset {} is past the {} byte stream",
            offset, self.data.len()));
        }
        self.current = self.data.all();
        self.pos = offset;
      }
    }
    Ok(())
  }
}
