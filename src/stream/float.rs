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
use crate::stream::{OrcByteSource, PositionProvider};

/// Raw little-endian IEEE-754 single precision values.
pub struct FloatStream {
  input: OrcByteSource
}

impl FloatStream {
  pub fn new(input: OrcByteSource) -> Self {
    Self { input }
  }

  pub fn next(&mut self) -> Result<f32> {
    let mut buf = [0u8; 4];
    self.input.read_exact(&mut buf)?;
    Ok(LittleEndian::read_f32(&buf))
  }

  pub fn skip(&mut self, items: usize) -> Result<()> {
    self.input.skip(items * 4)
  }

  pub fn seek(&mut self, positions: &mut PositionProvider) -> Result<()> {
    self.input.seek(positions)
  }
}

/// Raw little-endian IEEE-754 double precision values.
pub struct DoubleStream {
  input: OrcByteSource
}

impl DoubleStream {
  pub fn new(input: OrcByteSource) -> Self {
    Self { input }
  }

  pub fn next(&mut self) -> Result<f64> {
    let mut buf = [0u8; 8];
    self.input.read_exact(&mut buf)?;
    Ok(LittleEndian::read_f64(&buf))
  }

  pub fn skip(&mut self, items: usize) -> Result<()> {
    self.input.skip(items * 8)
  }

  pub fn seek(&mut self, positions: &mut PositionProvider) -> Result<()> {
    self.input.seek(positions)
  }
}
