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

/// ORC run-length byte stream. A signed control byte either announces a
/// run (control >= 0: the next byte repeats `control + 3` times, 3..=130)
/// or a literal sequence (control < 0: `-control` verbatim bytes follow,
/// 1..=128).
pub struct ByteStream {
  input: OrcByteSource,
  /// Values left in the current run or literal sequence.
  remaining: usize,
  literal: bool,
  value: u8
}

impl ByteStream {
  pub fn new(input: OrcByteSource) -> Self {
    Self { input, remaining: 0, literal: false, value: 0 }
  }

  fn read_header(&mut self) -> Result<()> {
    let control = self.input.read_u8()? as i8;
    if control >= 0 {
      self.remaining = control as usize + 3;
      self.literal = false;
      self.value = self.input.read_u8()?;
    } else {
      self.remaining = -(control as i16) as usize;
      self.literal = true;
    }
    Ok(())
  }

  pub fn next(&mut self) -> Result<u8> {
    if self.remaining == 0 {
      self.read_header()?;
    }
    self.remaining -= 1;
    if self.literal {
      self.input.read_u8()
    } else {
      Ok(self.value)
    }
  }

  pub fn next_signed(&mut self) -> Result<i8> {
    Ok(self.next()? as i8)
  }

  pub fn next_buf(&mut self, out: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < out.len() {
      if self.remaining == 0 {
        self.read_header()?;
      }
      let n = ::std::cmp::min(self.remaining, out.len() - filled);
      if self.literal {
        self.input.read_exact(&mut out[filled..filled + n])?;
      } else {
        for slot in out[filled..filled + n].iter_mut() {
          *slot = self.value;
        }
      }
      self.remaining -= n;
      filled += n;
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
        self.input.skip(n)?;
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


#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::CompressionKind;
  use crate::util::memory::BytePtr;

  pub fn byte_stream(data: Vec<u8>) -> ByteStream {
    let source =
      OrcByteSource::new(BytePtr::new(data), CompressionKind::NONE, 0).unwrap();
    ByteStream::new(source)
  }

  #[test]
  fn test_run() {
    // 0x61 = 97, run of 100 zero bytes
    let mut stream = byte_stream(vec![0x61, 0x00]);
    for _ in 0..100 {
      assert_eq!(stream.next().unwrap(), 0);
    }
    assert!(stream.next().is_err());
  }

  #[test]
  fn test_literals() {
    // 0xfe = -2, two literal bytes
    let mut stream = byte_stream(vec![0xfe, 0x44, 0x45]);
    assert_eq!(stream.next().unwrap(), 0x44);
    assert_eq!(stream.next().unwrap(), 0x45);
    assert!(stream.next().is_err());
  }

  #[test]
  fn test_mixed_runs_buf() {
    // run of 5 x 0x07, then 3 literals
    let mut stream = byte_stream(vec![0x02, 0x07, 0xfd, 0x01, 0x02, 0x03]);
    let mut out = vec![0; 8];
    stream.next_buf(&mut out).unwrap();
    assert_eq!(out, vec![7, 7, 7, 7, 7, 1, 2, 3]);
  }

  #[test]
  fn test_skip_within_and_across_runs() {
    let mut stream = byte_stream(vec![0x02, 0x07, 0xfd, 0x01, 0x02, 0x03]);
    stream.skip(6).unwrap();
    assert_eq!(stream.next().unwrap(), 2);
    assert_eq!(stream.next().unwrap(), 3);
  }

  #[test]
  fn test_skip_equivalent_to_read() {
    let data = vec![0x0a, 0xaa, 0xfc, 0x01, 0x02, 0x03, 0x04, 0x61, 0x55];
    let mut read_all = byte_stream(data.clone());
    let mut expected = vec![0; 30];
    read_all.next_buf(&mut expected).unwrap();

    for split in 0..expected.len() {
      let mut stream = byte_stream(data.clone());
      stream.skip(split).unwrap();
      let mut rest = vec![0; expected.len() - split];
      stream.next_buf(&mut rest).unwrap();
      assert_eq!(rest.as_slice(), &expected[split..]);
    }
  }

  #[test]
  fn test_signed_bytes() {
    let mut stream = byte_stream(vec![0xfe, 0xff, 0x80]);
    assert_eq!(stream.next_signed().unwrap(), -1);
    assert_eq!(stream.next_signed().unwrap(), -128);
  }

  #[test]
  fn test_seek() {
    // uncompressed: one position for the source, one for values consumed
    let mut stream = byte_stream(vec![0x61, 0x00, 0xfe, 0x44, 0x45]);
    let positions = vec![2, 1];
    let mut provider = PositionProvider::new(&positions);
    stream.seek(&mut provider).unwrap();
    assert_eq!(stream.next().unwrap(), 0x45);
  }
}
