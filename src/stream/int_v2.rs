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
use crate::stream::{read_vs64, read_vu64, zigzag_decode, OrcByteSource, PositionProvider};

/// The fixed 5-bit width table shared by all v2 sub-encodings. An
/// encoded width w maps to `FIXED_BIT_WIDTHS[w]` bits.
const FIXED_BIT_WIDTHS: [u32; 32] = [
  1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16,
  17, 18, 19, 20, 21, 22, 23, 24, 26, 28, 30, 32, 40, 48, 56, 64
];

/// A run holds at most this many values in every v2 sub-encoding.
const MAX_LITERALS: usize = 512;

#[inline]
fn decode_bit_width(encoded: u32) -> u32 {
  FIXED_BIT_WIDTHS[encoded as usize]
}

/// Smallest table width that can hold `bits` bits. Patch list entries
/// are packed with this rounded width.
fn closest_fixed_bits(bits: u32) -> u32 {
  for width in FIXED_BIT_WIDTHS.iter() {
    if *width >= bits {
      return *width;
    }
  }
  64
}

#[inline]
fn value_mask(width: u32) -> u64 {
  if width >= 64 {
    u64::MAX
  } else {
    (1u64 << width) - 1
  }
}

/// Version 2 run length integer stream: SHORT_REPEAT, DIRECT,
/// PATCHED_BASE and DELTA sub-encodings selected by the top two bits of
/// each run header. Bit-packed sections are most significant bit first
/// and byte aligned per run. Signed streams zig-zag the packed values,
/// except in PATCHED_BASE whose base value carries the sign.
pub struct IntV2Stream {
  input: OrcByteSource,
  signed: bool,
  /// Decoded values of the current run.
  literals: Vec<i64>,
  used: usize
}

enum SubEncoding {
  SHORT_REPEAT,
  DIRECT,
  PATCHED_BASE,
  DELTA
}

impl IntV2Stream {
  pub fn new(input: OrcByteSource, signed: bool) -> Self {
    Self { input, signed, literals: Vec::with_capacity(MAX_LITERALS), used: 0 }
  }

  pub fn next(&mut self) -> Result<i64> {
    while self.used == self.literals.len() {
      self.read_run()?;
    }
    let v = self.literals[self.used];
    self.used += 1;
    Ok(v)
  }

  pub fn next_buf(&mut self, out: &mut [i64]) -> Result<()> {
    let mut filled = 0;
    while filled < out.len() {
      if self.used == self.literals.len() {
        self.read_run()?;
        continue;
      }
      let n = ::std::cmp::min(self.literals.len() - self.used, out.len() - filled);
      out[filled..filled + n]
        .copy_from_slice(&self.literals[self.used..self.used + n]);
      self.used += n;
      filled += n;
    }
    Ok(())
  }

  pub fn skip(&mut self, items: usize) -> Result<()> {
    let mut left = items;
    loop {
      let available = self.literals.len() - self.used;
      if left <= available {
        self.used += left;
        return Ok(());
      }
      left -= available;
      self.used = self.literals.len();
      self.read_run()?;
    }
  }

  /// Positions: the byte source checkpoint, then the number of values
  /// already consumed from the run that starts there.
  pub fn seek(&mut self, positions: &mut PositionProvider) -> Result<()> {
    self.input.seek(positions)?;
    self.literals.clear();
    self.used = 0;
    let consumed = positions.next()? as usize;
    self.skip(consumed)
  }

  fn read_run(&mut self) -> Result<()> {
    self.literals.clear();
    self.used = 0;
    let header = self.input.read_u8()?;
    let sub_encoding = match header >> 6 {
      0 => SubEncoding::SHORT_REPEAT,
      1 => SubEncoding::DIRECT,
      2 => SubEncoding::PATCHED_BASE,
      _ => SubEncoding::DELTA
    };
    match sub_encoding {
      SubEncoding::SHORT_REPEAT => self.read_short_repeat(header),
      SubEncoding::DIRECT => self.read_direct(header),
      SubEncoding::PATCHED_BASE => self.read_patched_base(header),
      SubEncoding::DELTA => self.read_delta(header)
    }
  }

  /// Header: 2 bits tag, 3 bits value byte width - 1, 3 bits repeat
  /// count - 3. The value follows big endian.
  fn read_short_repeat(&mut self, header: u8) -> Result<()> {
    let byte_width = ((header >> 3) & 0x07) as usize + 1;
    let count = (header & 0x07) as usize + 3;
    let mut raw: u64 = 0;
    for _ in 0..byte_width {
      raw = (raw << 8) | self.input.read_u8()? as u64;
    }
    let value = if self.signed {
      zigzag_decode(raw)
    } else {
      raw as i64
    };
    for _ in 0..count {
      self.literals.push(value);
    }
    Ok(())
  }

  /// Reads the 9-bit run length that DIRECT, PATCHED_BASE and DELTA
  /// split across the header byte and the next byte.
  fn read_run_length(&mut self, header: u8) -> Result<usize> {
    Ok(((header as usize & 1) << 8) | self.input.read_u8()? as usize)
  }

  fn read_direct(&mut self, header: u8) -> Result<()> {
    let width = decode_bit_width((header as u32 >> 1) & 0x1F);
    let count = self.read_run_length(header)? + 1;
    let signed = self.signed;
    self.read_packed(count, width, |raw| {
      if signed {
        zigzag_decode(raw)
      } else {
        raw as i64
      }
    })
  }

  fn read_patched_base(&mut self, header: u8) -> Result<()> {
    let width = decode_bit_width((header as u32 >> 1) & 0x1F);
    let count = self.read_run_length(header)? + 1;

    let third = self.input.read_u8()?;
    let base_bytes = ((third >> 5) & 0x07) as usize + 1;
    let patch_width = decode_bit_width(third as u32 & 0x1F);
    let fourth = self.input.read_u8()?;
    let patch_gap_width = ((fourth >> 5) & 0x07) as u32 + 1;
    let patch_count = (fourth & 0x1F) as usize;

    // base value: big endian, most significant bit is the sign
    let mut raw_base: u64 = 0;
    for _ in 0..base_bytes {
      raw_base = (raw_base << 8) | self.input.read_u8()? as u64;
    }
    let sign_mask = 1u64 << (base_bytes as u32 * 8 - 1);
    let base = if raw_base & sign_mask != 0 {
      -((raw_base & (sign_mask - 1)) as i64)
    } else {
      raw_base as i64
    };

    let start = self.literals.len();
    self.read_packed(count, width, |raw| raw as i64)?;

    // sparse patches restore the high bits the narrow width dropped
    let patch_bits = closest_fixed_bits(patch_gap_width + patch_width);
    let mut patches = Vec::with_capacity(patch_count);
    self.read_packed_into(patch_count, patch_bits, &mut patches)?;
    let mut position: usize = 0;
    for entry in patches {
      let gap = if patch_width >= 64 { 0 } else { (entry >> patch_width) as usize };
      let patch = entry & value_mask(patch_width);
      position += gap;
      if patch != 0 {
        let index = start + position;
        if index >= self.literals.len() || width >= 64 {
          return Err(corrupt_err!(
            "Patch position {} is outside a run of {} values", position, count));
        }
        self.literals[index] = (self.literals[index] as u64 | (patch << width)) as i64;
      }
    }

    for value in self.literals[start..].iter_mut() {
      *value = value.wrapping_add(base);
    }
    Ok(())
  }

  fn read_delta(&mut self, header: u8) -> Result<()> {
    let width_code = (header as u32 >> 1) & 0x1F;
    // width code zero marks a fixed-delta run
    let width = if width_code != 0 {
      decode_bit_width(width_code)
    } else {
      0
    };
    let mut count = self.read_run_length(header)?;

    let first = if self.signed {
      read_vs64(&mut self.input)?
    } else {
      read_vu64(&mut self.input)? as i64
    };
    self.literals.push(first);
    let delta_base = read_vs64(&mut self.input)?;

    if width == 0 {
      let mut value = first;
      for _ in 0..count {
        value = value.wrapping_add(delta_base);
        self.literals.push(value);
      }
    } else {
      if count == 0 {
        return Err(corrupt_err!("Delta run has packed deltas but only one value"));
      }
      let mut value = first.wrapping_add(delta_base);
      self.literals.push(value);
      count -= 1;
      let mut deltas = Vec::with_capacity(count);
      self.read_packed_into(count, width, &mut deltas)?;
      for delta in deltas {
        if delta_base < 0 {
          value = value.wrapping_sub(delta as i64);
        } else {
          value = value.wrapping_add(delta as i64);
        }
        self.literals.push(value);
      }
    }
    Ok(())
  }

  /// Unpacks `count` big-endian values of `width` bits into the literal
  /// buffer through `convert`. Packed sections are byte aligned at the
  /// end of each run, so no bit state survives past the last value.
  fn read_packed<F>(&mut self, count: usize, width: u32, convert: F) -> Result<()>
      where F: Fn(u64) -> i64 {
    let mut buffered: u128 = 0;
    let mut bits: u32 = 0;
    for _ in 0..count {
      while bits < width {
        buffered = (buffered << 8) | self.input.read_u8()? as u128;
        bits += 8;
      }
      bits -= width;
      let raw = (buffered >> bits) as u64 & value_mask(width);
      self.literals.push(convert(raw));
    }
    Ok(())
  }

  fn read_packed_into(&mut self, count: usize, width: u32, out: &mut Vec<u64>) -> Result<()> {
    let mut buffered: u128 = 0;
    let mut bits: u32 = 0;
    for _ in 0..count {
      while bits < width {
        buffered = (buffered << 8) | self.input.read_u8()? as u128;
        bits += 8;
      }
      bits -= width;
      out.push((buffered >> bits) as u64 & value_mask(width));
    }
    Ok(())
  }
}
