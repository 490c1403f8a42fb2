// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Formatter output errors.
//!
//! Every [`Formatter`] callback returns a [`WriterResult`], so a broken
//! destination stops the dispatch at the first failing sink.
//!
//! [`Formatter`]: crate::Formatter

use std::{fmt, io};

use derive_more::with_trait::{Display, Error};

/// Formatter output errors.
#[derive(Debug, Display, Error)]
pub enum WriterError {
    /// I/O error during output operations.
    #[display("I/O error: {_0}")]
    Io(io::Error),

    /// Output formatting error.
    #[display("Format error: {_0}")]
    Format(fmt::Error),

    /// Failed to escape a value for embedding into a script directive.
    #[display("Serialization failed: {_0}")]
    Serialization(serde_json::Error),
}

/// Result type alias for writer operations.
pub type WriterResult<T> = std::result::Result<T, WriterError>;

impl WriterError {
    /// Returns true if this is an I/O error.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Returns true if this is a format error.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}

impl From<io::Error> for WriterError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<fmt::Error> for WriterError {
    fn from(err: fmt::Error) -> Self {
        Self::Format(err)
    }
}

impl From<serde_json::Error> for WriterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_variants() {
        let io_err = WriterError::from(io::Error::new(io::ErrorKind::Other, "x"));
        assert!(io_err.is_io_error());
        assert!(!io_err.is_format_error());

        let fmt_err = WriterError::from(fmt::Error);
        assert!(fmt_err.is_format_error());
        assert!(!fmt_err.is_io_error());
    }
}
