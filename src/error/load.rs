// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Support code loading errors.

use std::io;

use derive_more::with_trait::{Display, Error};

/// Failure to load one support file, annotated with the file that caused it.
#[derive(Debug, Display, Error)]
#[display("{source}\nFailed to load {path}")]
pub struct LoadError {
    /// Support file that failed to load.
    #[error(not(source))]
    pub path: String,

    /// Original failure.
    pub source: io::Error,
}

/// Result type alias for support loading operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

impl LoadError {
    /// Annotates the given `source` failure with the `path` that caused it.
    #[must_use]
    pub fn new(path: impl Into<String>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
