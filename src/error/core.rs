// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level error aborting a run.

use std::io;

use derive_more::with_trait::{Display, Error, From};

use super::{ConfigError, LoadError, WriterError};
use crate::parser;

/// Top-level error type for everything that aborts a run before or while
/// reporting.
///
/// Step failures are never represented here: they are outcomes, reported
/// through formatters, and only affect the exit status.
#[derive(Debug, Display, Error, From)]
pub enum CucumberError {
    /// Malformed configuration or command line.
    #[display("Configuration error: {_0}")]
    Config(ConfigError),

    /// Support file failed to load.
    #[display("{_0}")]
    Load(LoadError),

    /// No keywords are known for the configured language.
    #[display("Unsupported language: {tag}")]
    #[from(ignore)]
    UnsupportedLanguage {
        /// Requested language tag.
        #[error(not(source))]
        tag: String,
    },

    /// Specification file failed to parse.
    #[display("{_0}")]
    Parse(parser::Error),

    /// Output destination cannot be opened for writing.
    #[display("Failed to open output `{path}`: {source}")]
    #[from(ignore)]
    Output {
        /// Destination path.
        path: String,

        /// Underlying filesystem failure.
        source: io::Error,
    },

    /// Formatter failed to write its report.
    #[display("Writer error: {_0}")]
    Writer(WriterError),
}

/// Result type alias using [`CucumberError`].
pub type Result<T> = std::result::Result<T, CucumberError>;

impl CucumberError {
    /// Returns the [`ConfigError`], if this is a configuration error.
    #[must_use]
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if this is a support loading error.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::Load(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_language_display() {
        let err = CucumberError::UnsupportedLanguage { tag: "xx".into() };

        assert_eq!(err.to_string(), "Unsupported language: xx");
        assert!(err.as_config().is_none());
        assert!(!err.is_load_error());
    }

    #[test]
    fn output_error_names_the_path() {
        let err = CucumberError::Output {
            path: "out/report.html".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        assert_eq!(
            err.to_string(),
            "Failed to open output `out/report.html`: denied",
        );
    }
}
