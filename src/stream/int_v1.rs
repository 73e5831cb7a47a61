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

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::Result;
use crate::stream::{read_vu64, zigzag_decode, OrcByteSource, PositionProvider};

/// Version 1 run length integer stream, used by ORC v1 files and by the
/// DWRF dialect's DWRF_DIRECT encoding.
///
/// A signed control byte either announces a run (control >= 0:
/// `control + 3` values produced from a base value and a per-step delta
/// byte) or a literal sequence (control < 0: `-control` values follow
/// one by one). Values are base-128 varints, zig-zagged when the stream
/// is signed; a DWRF stream with `use_v_ints` unset stores each value
/// as a fixed eight byte little-endian word instead.
pub struct IntV1Stream {
  input: OrcByteSource,
  signed: bool,
  use_v_ints: bool,
  /// Values left in the current run or literal sequence.
  remaining: usize,
  literal: bool,
  /// Next value of the current run.
  value: i64,
  delta: i64
}

impl IntV1Stream {
  pub fn new(input: OrcByteSource, signed: bool, use_v_ints: bool) -> Self {
    Self {
      input, signed, use_v_ints,
      remaining: 0, literal: false, value: 0, delta: 0
    }
  }

  fn read_value(&mut self) -> Result<i64> {
    if self.use_v_ints {
      let raw = read_vu64(&mut self.input)?;
      if self.signed {
        Ok(zigzag_decode(raw))
      } else {
        Ok(raw as i64)
      }
    } else {
      let mut buf = [0u8; 8];
      self.input.read_exact(&mut buf)?;
      Ok(LittleEndian::read_i64(&buf))
    }
  }

  fn read_header(&mut self) -> Result<()> {
    let control = self.input.read_u8()? as i8;
    if control >= 0 {
      self.remaining = control as usize + 3;
      self.literal = false;
      self.delta = self.input.read_u8()? as i8 as i64;
      self.value = self.read_value()?;
    } else {
      self.remaining = -(control as i16) as usize;
      self.literal = true;
    }
    Ok(())
  }

  pub fn next(&mut self) -> Result<i64> {
    if self.remaining == 0 {
      self.read_header()?;
    }
    self.remaining -= 1;
    if self.literal {
      self.read_value()
    } else {
      let result = self.value;
      self.value = self.value.wrapping_add(self.delta);
      Ok(result)
    }
  }

  pub fn next_buf(&mut self, out: &mut [i64]) -> Result<()> {
    for slot in out.iter_mut() {
      *slot = self.next()?;
    }
    Ok(())
  }

  pub fn skip(&mut self, items: usize) -> Result<()> {
    let mut left = items;
    while left > 0 {
      if self.remaining == 0 {
        self.read_header()?;
      }
      let n = ::std::cmp::min(self.remaining, left);
      if self.literal {
        if self.use_v_ints {
          for _ in 0..n {
            self.read_value()?;
          }
        } else {
          self.input.skip(n * 8)?;
        }
      } else {
        self.value = self.value.wrapping_add(self.delta.wrapping_mul(n as i64));
      }
      self.remaining -= n;
      left -= n;
    }
    Ok(())
  }

  /// Positions: the byte source checkpoint, then the number of values
  /// already consumed from the run that starts there.
  pub fn seek(&mut self, positions: &mut PositionProvider) -> Result<()> {
    self.input.seek(positions)?;
    self.remaining = 0;
    self.literal = false;
    let consumed = positions.next()? as usize;
    self.skip(consumed)
  }
}
