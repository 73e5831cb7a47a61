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

use crate::errors::Result;
use crate::stream::{OrcByteSource, PositionProvider};
use crate::stream::byte_rle::ByteStream;

const HIGH_BIT_MASK: u8 = 0b1000_0000;

/// Bit stream over a run-length byte stream, most significant bit first
/// within each byte. PRESENT streams and IN_DICTIONARY streams are
/// encoded this way.
pub struct BooleanStream {
  byte_stream: ByteStream,
  /// Remaining bits of the current byte, left-aligned so the next bit is
  /// always the high bit.
  data: u8,
  bits_in_data: usize
}

impl BooleanStream {
  pub fn new(input: OrcByteSource) -> Self {
    Self { byte_stream: ByteStream::new(input), data: 0, bits_in_data: 0 }
  }

  fn read_byte(&mut self) -> Result<()> {
    self.data = self.byte_stream.next()?;
    self.bits_in_data = 8;
    Ok(())
  }

  pub fn next_bit(&mut self) -> Result<bool> {
    if self.bits_in_data == 0 {
      self.read_byte()?;
    }
    let result = self.data & HIGH_BIT_MASK != 0;
    self.data <<= 1;
    self.bits_in_data -= 1;
    Ok(result)
  }

  pub fn skip(&mut self, items: usize) -> Result<()> {
    if items <= self.bits_in_data {
      self.data = ((self.data as u16) << items) as u8;
      self.bits_in_data -= items;
      return Ok(());
    }
    let items = items - self.bits_in_data;
    self.bits_in_data = 0;
    self.byte_stream.skip(items >> 3)?;
    let residual = items & 0b111;
    if residual > 0 {
      self.read_byte()?;
      self.data <<= residual;
      self.bits_in_data -= residual;
    }
    Ok(())
  }

  pub fn count_set_bits(&mut self, items: usize) -> Result<usize> {
    let mut items = items;
    let mut count = 0;

    // count buffered data; shifted-out bits are zero so counting the
    // whole byte is safe
    if items > self.bits_in_data && self.bits_in_data > 0 {
      count += self.data.count_ones() as usize;
      items -= self.bits_in_data;
      self.bits_in_data = 0;
    }

    // count whole bytes
    while items > 8 {
      count += self.byte_stream.next()?.count_ones() as usize;
      items -= 8;
    }

    // count remaining bits
    for _ in 0..items {
      if self.next_bit()? {
        count += 1;
      }
    }

    Ok(count)
  }

  /// Sets the vector element to true if the bit is set.
  pub fn get_set_bits(&mut self, batch_size: usize, vector: &mut [bool]) -> Result<()> {
    for slot in vector[..batch_size].iter_mut() {
      if self.bits_in_data == 0 {
        self.read_byte()?;
      }
      *slot = self.data & HIGH_BIT_MASK != 0;
      self.data <<= 1;
      self.bits_in_data -= 1;
    }
    Ok(())
  }

  /// Sets the vector element to true if the bit is set, skipping the
  /// null slots.
  pub fn get_set_bits_masked(&mut self, batch_size: usize, vector: &mut [bool],
                             is_null: &[bool]) -> Result<()> {
    for i in 0..batch_size {
      if !is_null[i] {
        vector[i] = self.next_bit()?;
      }
    }
    Ok(())
  }

  /// Sets the vector element to true if the bit is not set, and returns
  /// the number of unset bits seen.
  pub fn get_unset_bits(&mut self, batch_size: usize, vector: &mut [bool]) -> Result<usize> {
    let mut count = 0;
    for slot in vector[..batch_size].iter_mut() {
      if self.bits_in_data == 0 {
        self.read_byte()?;
      }
      *slot = self.data & HIGH_BIT_MASK == 0;
      if *slot {
        count += 1;
      }
      self.data <<= 1;
      self.bits_in_data -= 1;
    }
    Ok(count)
  }

  /// Positions: the byte stream checkpoint, then the number of bits
  /// already consumed from the byte at that checkpoint.
  pub fn seek(&mut self, positions: &mut PositionProvider) -> Result<()> {
    self.byte_stream.seek(positions)?;
    self.data = 0;
    self.bits_in_data = 0;
    let bit_offset = positions.next()? as usize;
    if bit_offset >= 8 {
      return Err(corrupt_err!("Bit offset {} in boolean stream checkpoint", bit_offset));
    }
    if bit_offset > 0 {
      self.read_byte()?;
      self.data <<= bit_offset;
      self.bits_in_data -= bit_offset;
    }
    Ok(())
  }
}
