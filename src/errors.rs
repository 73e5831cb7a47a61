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

use std::io;
use std::result;
use prost;
use snap;

quick_error! {
  #[derive(Debug)]
  pub enum OrcError {
    /// A read from the underlying data source failed. Short reads are
    /// reported here as well; the data source contract already factors
    /// in any retries its I/O layer performs.
    Io(message: String, err: io::Error) {
      from(err: io::Error) -> ("underlying IO error".to_owned(), err)
      display("IO error: {}, {}", message, err)
    }
    /// A header or framing element does not parse: bad postscript length,
    /// invalid chunk header, oversized compressed chunk.
    Malformed(message: String) {
      display("Malformed ORC file: {}", message)
    }
    /// An enum value outside the declared range for the dialect.
    UnsupportedMetadata(message: String) {
      display("Unsupported ORC metadata: {}", message)
    }
    /// A structural inconsistency in an otherwise parseable file:
    /// stream count mismatch, truncated stream, negative length,
    /// dictionary index out of range.
    Corrupt(message: String) {
      from(err: prost::DecodeError) -> (format!("invalid protobuf: {}", err))
      display("Corrupt ORC file: {}", message)
    }
    /// A compressed chunk failed to decompress.
    Decompress(message: String) {
      from(err: snap::Error) -> (format!("snappy: {}", err))
      display("Decompression failed: {}", message)
    }
    /// The reader hit a fatal error earlier and refuses further calls.
    Closed {
      display("ORC reader is closed")
    }
  }
}

pub type Result<T> = result::Result<T, OrcError>;

/// Convenient macros for different errors

macro_rules! malformed_err {
  ($fmt:expr) => (crate::errors::OrcError::Malformed($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (crate::errors::OrcError::Malformed(format!($fmt, $($args),*)));
}

macro_rules! corrupt_err {
  ($fmt:expr) => (crate::errors::OrcError::Corrupt($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (crate::errors::OrcError::Corrupt(format!($fmt, $($args),*)));
}

macro_rules! unsupported_err {
  ($fmt:expr) => (crate::errors::OrcError::UnsupportedMetadata($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (crate::errors::OrcError::UnsupportedMetadata(format!($fmt, $($args),*)));
}

macro_rules! decompress_err {
  ($fmt:expr) => (crate::errors::OrcError::Decompress($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (crate::errors::OrcError::Decompress(format!($fmt, $($args),*)));
}

macro_rules! io_err {
  ($e:expr, $fmt:expr) => (crate::errors::OrcError::Io($fmt.to_owned(), $e));
  ($e:expr, $fmt:expr, $($args:expr),*) => (
    crate::errors::OrcError::Io(format!($fmt, $($args),*), $e));
}
