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

//! The column-oriented batch representation handed to the executor.
//! Buffers are reused across batches and grow monotonically to the
//! largest batch served.

use crate::basic::OrcTypeKind;
use crate::errors::Result;
use crate::metadata::OrcType;
use crate::util::bit_util::{bytes_for_bits, count_set_bits, get_array_bit, set_array_bit};
use crate::util::memory::BytePtr;

/// Bit-packed nullability mask; a set bit marks a non-null row.
#[derive(Debug, Clone, Default)]
pub struct NullMask {
  bits: Vec<u8>,
  len: usize
}

impl NullMask {
  /// Clears the mask to `rows` all-null slots.
  pub fn reset(&mut self, rows: usize) {
    self.bits.clear();
    self.bits.resize(bytes_for_bits(rows), 0);
    self.len = rows;
  }

  pub fn set_non_null(&mut self, i: usize) {
    set_array_bit(&mut self.bits, i);
  }

  pub fn set_all_non_null(&mut self) {
    for byte in self.bits.iter_mut() {
      *byte = 0xFF;
    }
    // clear the padding bits past `len`
    for i in self.len..self.bits.len() * 8 {
      crate::util::bit_util::unset_array_bit(&mut self.bits, i);
    }
  }

  pub fn is_null(&self, i: usize) -> bool {
    !get_array_bit(&self.bits, i)
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn non_null_count(&self) -> usize {
    count_set_bits(&self.bits, self.len)
  }

  pub fn bits(&self) -> &[u8] {
    &self.bits
  }
}

/// One column's values for a batch.
///
/// Fixed-width variants carry one slot per row with a default at null
/// slots. The `Slice` variant carries per-row lengths (zero at nulls)
/// and a single data buffer holding the non-null values back to back.
/// `Struct` children carry one entry per non-null struct row; `List`
/// and `Map` children carry the concatenation of all element values,
/// with per-row element counts; `Union` children each carry the rows
/// tagged to them.
#[derive(Debug)]
pub enum ColumnVector {
  Boolean { nulls: NullMask, values: Vec<bool> },
  Byte { nulls: NullMask, values: Vec<i8> },
  /// SHORT, INT, LONG, DATE and TIMESTAMP columns all materialize here.
  Long { nulls: NullMask, values: Vec<i64> },
  Float { nulls: NullMask, values: Vec<f32> },
  Double { nulls: NullMask, values: Vec<f64> },
  /// STRING, BINARY, VARCHAR and CHAR columns.
  Slice { nulls: NullMask, lengths: Vec<u32>, data: BytePtr },
  Struct { nulls: NullMask, children: Vec<ColumnVector> },
  List { nulls: NullMask, lengths: Vec<u64>, child: Box<ColumnVector> },
  Map {
    nulls: NullMask,
    lengths: Vec<u64>,
    keys: Box<ColumnVector>,
    values: Box<ColumnVector>
  },
  Union { nulls: NullMask, tags: Vec<u8>, children: Vec<ColumnVector> }
}

impl ColumnVector {
  /// Builds the (nested) vector shape for type `id` of the flat tree.
  pub fn for_type(types: &[OrcType], id: u32) -> Result<ColumnVector> {
    let tp = types.get(id as usize)
      .ok_or_else(|| corrupt_err!("Type id {} is outside the type tree", id))?;
    let vector = match tp.kind {
      OrcTypeKind::BOOLEAN => ColumnVector::Boolean {
        nulls: NullMask::default(),
        values: vec![]
      },
      OrcTypeKind::BYTE => ColumnVector::Byte {
        nulls: NullMask::default(),
        values: vec![]
      },
      OrcTypeKind::SHORT | OrcTypeKind::INT | OrcTypeKind::LONG
        | OrcTypeKind::DATE | OrcTypeKind::TIMESTAMP => ColumnVector::Long {
        nulls: NullMask::default(),
        values: vec![]
      },
      OrcTypeKind::FLOAT => ColumnVector::Float {
        nulls: NullMask::default(),
        values: vec![]
      },
      OrcTypeKind::DOUBLE => ColumnVector::Double {
        nulls: NullMask::default(),
        values: vec![]
      },
      OrcTypeKind::STRING | OrcTypeKind::BINARY
        | OrcTypeKind::VARCHAR | OrcTypeKind::CHAR => ColumnVector::Slice {
        nulls: NullMask::default(),
        lengths: vec![],
        data: BytePtr::empty()
      },
      OrcTypeKind::STRUCT => {
        let mut children = Vec::with_capacity(tp.children.len());
        for child in &tp.children {
          children.push(ColumnVector::for_type(types, *child)?);
        }
        ColumnVector::Struct { nulls: NullMask::default(), children }
      },
      OrcTypeKind::LIST => {
        let child = tp.children.first()
          .ok_or_else(|| corrupt_err!("LIST type {} has no element type", id))?;
        ColumnVector::List {
          nulls: NullMask::default(),
          lengths: vec![],
          child: Box::new(ColumnVector::for_type(types, *child)?)
        }
      },
      OrcTypeKind::MAP => {
        if tp.children.len() != 2 {
          return Err(corrupt_err!(
            "MAP type {} has {} child types", id, tp.children.len()));
        }
        ColumnVector::Map {
          nulls: NullMask::default(),
          lengths: vec![],
          keys: Box::new(ColumnVector::for_type(types, tp.children[0])?),
          values: Box::new(ColumnVector::for_type(types, tp.children[1])?)
        }
      },
      OrcTypeKind::UNION => {
        let mut children = Vec::with_capacity(tp.children.len());
        for child in &tp.children {
          children.push(ColumnVector::for_type(types, *child)?);
        }
        ColumnVector::Union {
          nulls: NullMask::default(),
          tags: vec![],
          children
        }
      },
      OrcTypeKind::DECIMAL => {
        return Err(unsupported_err!("DECIMAL columns are not readable"))
      }
    };
    Ok(vector)
  }

  pub fn nulls(&self) -> &NullMask {
    match self {
      ColumnVector::Boolean { nulls, .. } => nulls,
      ColumnVector::Byte { nulls, .. } => nulls,
      ColumnVector::Long { nulls, .. } => nulls,
      ColumnVector::Float { nulls, .. } => nulls,
      ColumnVector::Double { nulls, .. } => nulls,
      ColumnVector::Slice { nulls, .. } => nulls,
      ColumnVector::Struct { nulls, .. } => nulls,
      ColumnVector::List { nulls, .. } => nulls,
      ColumnVector::Map { nulls, .. } => nulls,
      ColumnVector::Union { nulls, .. } => nulls
    }
  }

  /// The i-th slice of a `Slice` vector, or `None` when the row is null.
  pub fn slice_at(&self, i: usize) -> Option<&[u8]> {
    match self {
      ColumnVector::Slice { nulls, lengths, data } => {
        if nulls.is_null(i) {
          return None;
        }
        let start: usize = lengths[..i].iter()
          .enumerate()
          .filter(|(row, _)| !nulls.is_null(*row))
          .map(|(_, len)| *len as usize)
          .sum();
        Some(&data.slice()[start..start + lengths[i] as usize])
      },
      _ => None
    }
  }
}

/// A batch of rows: the row count plus one vector per included column,
/// in included-column order.
#[derive(Debug, Default)]
pub struct Batch {
  pub row_count: usize,
  pub columns: Vec<ColumnVector>
}
