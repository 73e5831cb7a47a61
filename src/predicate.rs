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

//! Tuple-domain predicates evaluated against column statistics to skip
//! stripes and row groups. The evaluation is deliberately one-sided: a
//! block is rejected only when its statistics prove that no row can
//! match, so pruning never drops matching rows.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::metadata::{ColumnStatistics, TypedStatistics};

/// A single comparable constant. Comparisons are only defined between
/// values of the same variant; mixed comparisons answer `None` and the
/// engine treats them as a possible overlap.
#[derive(Debug, Clone, PartialEq)]
pub enum OrcValue {
  Boolean(bool),
  Integer(i64),
  Double(f64),
  String(String),
  Date(i32)
}

impl OrcValue {
  fn compare(&self, other: &OrcValue) -> Option<Ordering> {
    match (self, other) {
      (OrcValue::Boolean(a), OrcValue::Boolean(b)) => Some(a.cmp(b)),
      (OrcValue::Integer(a), OrcValue::Integer(b)) => Some(a.cmp(b)),
      (OrcValue::Double(a), OrcValue::Double(b)) => a.partial_cmp(b),
      (OrcValue::String(a), OrcValue::String(b)) => Some(a.cmp(b)),
      (OrcValue::Date(a), OrcValue::Date(b)) => Some(a.cmp(b)),
      _ => None
    }
  }
}

/// A contiguous range of values; `None` bounds are unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
  pub low: Option<OrcValue>,
  pub low_inclusive: bool,
  pub high: Option<OrcValue>,
  pub high_inclusive: bool
}

impl Range {
  pub fn all() -> Self {
    Range { low: None, low_inclusive: false, high: None, high_inclusive: false }
  }

  pub fn equal(value: OrcValue) -> Self {
    Range {
      low: Some(value.clone()),
      low_inclusive: true,
      high: Some(value),
      high_inclusive: true
    }
  }

  pub fn at_least(value: OrcValue) -> Self {
    Range { low: Some(value), low_inclusive: true, high: None, high_inclusive: false }
  }

  pub fn greater_than(value: OrcValue) -> Self {
    Range { low: Some(value), low_inclusive: false, high: None, high_inclusive: false }
  }

  pub fn at_most(value: OrcValue) -> Self {
    Range { low: None, low_inclusive: false, high: Some(value), high_inclusive: true }
  }

  pub fn less_than(value: OrcValue) -> Self {
    Range { low: None, low_inclusive: false, high: Some(value), high_inclusive: false }
  }

  /// Whether this range and `other` can share at least one value. Bound
  /// pairs that do not compare (mixed types, NaN) count as overlapping,
  /// keeping rejection sound.
  fn overlaps(&self, other: &Range) -> bool {
    below_or_touching(&self.low, self.low_inclusive, &other.high, other.high_inclusive)
      && below_or_touching(&other.low, other.low_inclusive, &self.high, self.high_inclusive)
  }
}

/// True unless `low` provably lies above `high`.
fn below_or_touching(low: &Option<OrcValue>, low_inclusive: bool,
                     high: &Option<OrcValue>, high_inclusive: bool) -> bool {
  let (low, high) = match (low, high) {
    (Some(low), Some(high)) => (low, high),
    _ => return true
  };
  match low.compare(high) {
    Some(Ordering::Less) => true,
    Some(Ordering::Equal) => low_inclusive && high_inclusive,
    Some(Ordering::Greater) => false,
    None => true
  }
}

/// The set of values a column may take: a union of ranges plus whether
/// null is allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
  pub ranges: Vec<Range>,
  pub null_allowed: bool
}

impl Domain {
  /// Any value, any nullability.
  pub fn all() -> Self {
    Domain { ranges: vec![Range::all()], null_allowed: true }
  }

  pub fn single_value(value: OrcValue) -> Self {
    Domain { ranges: vec![Range::equal(value)], null_allowed: false }
  }

  pub fn of_ranges(ranges: Vec<Range>, null_allowed: bool) -> Self {
    Domain { ranges, null_allowed }
  }

  pub fn only_null() -> Self {
    Domain { ranges: vec![], null_allowed: true }
  }

  fn overlaps(&self, other: &Domain) -> bool {
    if self.null_allowed && other.null_allowed {
      return true;
    }
    self.ranges.iter().any(|a| other.ranges.iter().any(|b| a.overlaps(b)))
  }
}

/// A conjunction of per-column domains. Columns not mentioned are
/// unconstrained; the empty predicate matches everything.
#[derive(Debug, Clone, Default)]
pub struct TupleDomain {
  domains: HashMap<u32, Domain>
}

impl TupleDomain {
  pub fn all() -> Self {
    TupleDomain { domains: HashMap::new() }
  }

  pub fn with_column(mut self, column: u32, domain: Domain) -> Self {
    self.domains.insert(column, domain);
    self
  }

  pub fn is_all(&self) -> bool {
    self.domains.is_empty()
  }

  pub fn columns(&self) -> impl Iterator<Item = &u32> {
    self.domains.keys()
  }

  /// Whether a block of `rows` rows described by per-column statistics
  /// may contain a qualifying row. `statistics` answers `None` for
  /// columns the block knows nothing about; such columns never reject.
  pub fn matches<'a, F>(&self, rows: u64, statistics: F) -> bool
      where F: Fn(u32) -> Option<&'a ColumnStatistics> {
    for (column, domain) in &self.domains {
      if let Some(stats) = statistics(*column) {
        if !domain.overlaps(&statistics_domain(stats, rows)) {
          return false;
        }
      }
    }
    true
  }
}

/// Widens column statistics into the domain of values the block may
/// hold: `[min, max]` with missing bounds open, nulls allowed whenever
/// fewer values than rows were recorded.
fn statistics_domain(stats: &ColumnStatistics, rows: u64) -> Domain {
  let null_allowed = stats.number_of_values < rows;
  let ranges = match &stats.typed {
    Some(TypedStatistics::Integer { min, max }) => vec![Range {
      low: min.map(OrcValue::Integer),
      low_inclusive: true,
      high: max.map(OrcValue::Integer),
      high_inclusive: true
    }],
    Some(TypedStatistics::Double { min, max }) => vec![Range {
      low: min.map(OrcValue::Double),
      low_inclusive: true,
      high: max.map(OrcValue::Double),
      high_inclusive: true
    }],
    Some(TypedStatistics::String { min, max }) => vec![Range {
      low: min.clone().map(OrcValue::String),
      low_inclusive: true,
      high: max.clone().map(OrcValue::String),
      high_inclusive: true
    }],
    Some(TypedStatistics::Date { min, max }) => vec![Range {
      low: min.map(OrcValue::Date),
      low_inclusive: true,
      high: max.map(OrcValue::Date),
      high_inclusive: true
    }],
    Some(TypedStatistics::Bucket { true_count }) => {
      let mut ranges = vec![];
      if *true_count > 0 {
        ranges.push(Range::equal(OrcValue::Boolean(true)));
      }
      if *true_count < stats.number_of_values {
        ranges.push(Range::equal(OrcValue::Boolean(false)));
      }
      ranges
    },
    None => vec![Range::all()]
  };
  Domain { ranges, null_allowed }
}
