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

use chrono::{NaiveDate, Offset, TimeZone};
use chrono_tz::Tz;

use crate::basic::StreamKind;
use crate::column::reader::{encoding_for, integer_stream, missing_stream_err, ColumnReader,
                            IntegerStream, Presence, ReaderContext};
use crate::column::vector::ColumnVector;
use crate::errors::Result;
use crate::file::stripe::{RowGroupPositions, StripeSources};
use crate::metadata::StripeFooter;

/// Timestamps count seconds from this date in the file's time zone.
const EPOCH_YEAR: i32 = 2015;

/// Reads TIMESTAMP columns: DATA carries seconds relative to the
/// 2015-01-01 epoch in the file's time zone and SECONDARY carries
/// nanoseconds with a trailing-zero run encoding. Values materialize as
/// nanoseconds since the Unix epoch, shifted into the session time zone
/// once, here.
pub struct TimestampColumnReader {
  column: u32,
  presence: Presence,
  seconds: Option<IntegerStream>,
  nanos: Option<IntegerStream>,
  storage_time_zone: Tz,
  session_time_zone: Tz,
  /// Unix seconds of the epoch in the stripe's effective storage zone.
  base_seconds: i64,
  pending_skip: usize
}

impl TimestampColumnReader {
  pub fn new(column: u32, context: &ReaderContext) -> Self {
    Self {
      column,
      presence: Presence::new(),
      seconds: None,
      nanos: None,
      storage_time_zone: context.storage_time_zone,
      session_time_zone: context.session_time_zone,
      base_seconds: 0,
      pending_skip: 0
    }
  }

  fn apply_pending_skip(&mut self) -> Result<()> {
    if self.pending_skip > 0 {
      let rows = ::std::mem::replace(&mut self.pending_skip, 0);
      let present = self.presence.count_present(rows)?;
      let seconds = self.seconds.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?;
      seconds.skip(present)?;
      let nanos = self.nanos.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::SECONDARY))?;
      nanos.skip(present)?;
    }
    Ok(())
  }

  fn materialize(&self, seconds: i64, encoded_nanos: i64) -> Result<i64> {
    let nanos = decode_nanos(encoded_nanos)?;
    let instant_nanos = (self.base_seconds + seconds)
      .checked_mul(1_000_000_000)
      .and_then(|n| n.checked_add(nanos))
      .ok_or_else(|| corrupt_err!(
        "Timestamp {}s {}ns in column {} overflows", seconds, nanos, self.column))?;
    // shift the instant into the session zone's wall clock, once
    let utc = chrono::DateTime::from_timestamp(
      instant_nanos.div_euclid(1_000_000_000),
      instant_nanos.rem_euclid(1_000_000_000) as u32)
      .ok_or_else(|| corrupt_err!(
        "Timestamp {}s in column {} is unrepresentable", seconds, self.column))?;
    let offset_seconds = self.session_time_zone
      .offset_from_utc_datetime(&utc.naive_utc())
      .fix()
      .local_minus_utc() as i64;
    Ok(instant_nanos + offset_seconds * 1_000_000_000)
  }
}

/// Unix seconds of `EPOCH_YEAR`-01-01 00:00:00 in `zone`.
fn epoch_base_seconds(zone: Tz) -> Result<i64> {
  let naive = NaiveDate::from_ymd_opt(EPOCH_YEAR, 1, 1)
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .expect("fixed epoch date");
  zone.from_local_datetime(&naive)
    .earliest()
    .map(|dt| dt.timestamp())
    .ok_or_else(|| corrupt_err!("Epoch does not exist in time zone {}", zone))
}

/// The SECONDARY stream drops trailing decimal zeros: the low 3 bits
/// hold the number of removed zeros minus 2 (or 0 for none), the rest
/// holds the remaining digits.
fn decode_nanos(encoded: i64) -> Result<i64> {
  if encoded < 0 {
    return Err(corrupt_err!("Negative encoded nanoseconds {}", encoded));
  }
  let zeros = encoded & 0x7;
  let mut nanos = encoded >> 3;
  if zeros != 0 {
    for _ in 0..zeros + 2 {
      nanos *= 10;
    }
  }
  if nanos > 999_999_999 {
    return Err(corrupt_err!("Encoded nanoseconds {} decode past one second", encoded));
  }
  Ok(nanos)
}

impl ColumnReader for TimestampColumnReader {
  fn start_stripe(&mut self, sources: &StripeSources, footer: &StripeFooter) -> Result<()> {
    self.presence.start_stripe(sources, self.column)?;
    let encoding = encoding_for(footer, self.column)?;
    self.seconds = integer_stream(sources, self.column, StreamKind::DATA,
                                  encoding.kind, true)?;
    if self.seconds.is_none() {
      return Err(missing_stream_err(self.column, StreamKind::DATA));
    }
    self.nanos = integer_stream(sources, self.column, StreamKind::SECONDARY,
                                encoding.kind, false)?;
    if self.nanos.is_none() {
      return Err(missing_stream_err(self.column, StreamKind::SECONDARY));
    }
    // the stripe footer's writer time zone overrides the storage zone
    let zone = match footer.writer_timezone {
      Some(ref name) => name.parse::<Tz>().unwrap_or(self.storage_time_zone),
      None => self.storage_time_zone
    };
    self.base_seconds = epoch_base_seconds(zone)?;
    self.pending_skip = 0;
    Ok(())
  }

  fn start_row_group(&mut self, positions: &RowGroupPositions) -> Result<()> {
    self.pending_skip = 0;
    let mut provider = positions.provider(self.column)
      .ok_or_else(|| corrupt_err!("No row index positions for column {}", self.column))?;
    self.presence.seek(&mut provider)?;
    if let Some(ref mut seconds) = self.seconds {
      seconds.seek(&mut provider)?;
    }
    if let Some(ref mut nanos) = self.nanos {
      nanos.seek(&mut provider)?;
    }
    Ok(())
  }

  fn skip(&mut self, rows: usize) {
    self.pending_skip += rows;
  }

  fn next_batch(&mut self, rows: usize, out: &mut ColumnVector) -> Result<()> {
    self.apply_pending_skip()?;
    let (nulls, values) = match out {
      ColumnVector::Long { nulls, values } => (nulls, values),
      _ => return Err(corrupt_err!("Column {} expects a long vector", self.column))
    };
    nulls.reset(rows);
    values.clear();
    values.resize(rows, 0);

    let non_null_all = self.presence.is_all_present();
    if !non_null_all {
      self.presence.begin_batch(rows)?;
    }
    for i in 0..rows {
      if !non_null_all && self.presence.is_null[i] {
        continue;
      }
      let seconds = self.seconds.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::DATA))?
        .next()?;
      let encoded_nanos = self.nanos.as_mut()
        .ok_or_else(|| missing_stream_err(self.column, StreamKind::SECONDARY))?
        .next()?;
      values[i] = self.materialize(seconds, encoded_nanos)?;
      nulls.set_non_null(i);
    }
    Ok(())
  }
}
