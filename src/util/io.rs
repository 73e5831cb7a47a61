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

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::sync::Mutex;

use crate::errors::Result;
use crate::util::memory::BytePtr;

/// Random access over a file of known length. Reads are independent of
/// each other and must not mutate shared state, so one source may serve
/// several readers concurrently.
///
/// Coordination with deletion is the storage manager's concern: a source
/// stays readable for as long as the handle it owns is alive, and nothing
/// more is promised once the underlying file is dropped out from under it.
pub trait OrcDataSource {
  /// Total size of the file in bytes.
  fn size(&self) -> u64;

  /// Read exactly `buf.len()` bytes starting at `offset`. A short read
  /// is an error; retries are the concern of the I/O layer beneath.
  fn read_fully(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

  /// Read `length` bytes at `offset` into a fresh shared buffer.
  fn read(&self, offset: u64, length: usize) -> Result<BytePtr> {
    let mut buf = vec![0; length];
    self.read_fully(offset, &mut buf)?;
    Ok(BytePtr::new(buf))
  }
}


/// Data source over an open file handle. Internally clones the handle,
/// wraps it with a `BufReader` and seeks before every read, so the
/// position of the caller's handle is never disturbed and concurrent
/// range reads stay independent.
pub struct FileDataSource {
  reader: Mutex<BufReader<File>>,
  size: u64
}

impl FileDataSource {
  pub fn new(fd: &File) -> Result<Self> {
    let size = fd.metadata()
      .map_err(|e| io_err!(e, "Fail to get metadata for file"))?
      .len();
    let clone = fd.try_clone()
      .map_err(|e| io_err!(e, "Fail to clone file handle"))?;
    Ok(Self { reader: Mutex::new(BufReader::new(clone)), size })
  }
}

impl OrcDataSource for FileDataSource {
  fn size(&self) -> u64 {
    self.size
  }

  fn read_fully(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
    let mut reader = match self.reader.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner()
    };
    reader.seek(SeekFrom::Start(offset))
      .map_err(|e| io_err!(e, "Fail to seek to offset {}", offset))?;
    reader.read_exact(buf)
      .map_err(|e| io_err!(e, "Short read of {} bytes at offset {}", buf.len(), offset))
  }
}


/// Data source over bytes already resident in memory, e.g. a region the
/// caller mapped or a buffer assembled in tests.
pub struct MemoryDataSource {
  data: BytePtr
}

impl MemoryDataSource {
  pub fn new(data: Vec<u8>) -> Self {
    Self { data: BytePtr::new(data) }
  }
}

impl OrcDataSource for MemoryDataSource {
  fn size(&self) -> u64 {
    self.data.len() as u64
  }

  fn read_fully(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
    let offset = offset as usize;
    if offset + buf.len() > self.data.len() {
      return Err(corrupt_err!(
        "Read of {} bytes at offset {} is past end of {} byte file",
        buf.len(), offset, self.data.len()));
    }
    buf.copy_from_slice(&self.data.slice()[offset..offset + buf.len()]);
    Ok(())
  }

  fn read(&self, offset: u64, length: usize) -> Result<BytePtr> {
    let offset = offset as usize;
    if offset + length > self.data.len() {
      return Err(corrupt_err!(
        "Read of {} bytes at offset {} is past end of {} byte file",
        length, offset, self.data.len()));
    }
    Ok(self.data.range(offset, length))
  }
}
