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

//! Read path for ORC and DWRF columnar files: tail metadata parsing,
//! predicate-driven stripe and row-group pruning, compressed stream
//! demultiplexing, the run-length / bit-packed primitive streams, and
//! column readers that materialize batches of values.

#![allow(non_camel_case_types)]

#[macro_use]
extern crate quick_error;

#[macro_use]
pub mod errors;

pub mod basic;
pub mod proto;

pub mod util;

pub mod compression;
pub mod metadata;
pub mod predicate;
pub mod stream;

pub mod column;
pub mod file;
