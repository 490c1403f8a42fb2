// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types of the run pipeline.
//!
//! # Modules
//!
//! - [`core`] - Top-level [`CucumberError`] aborting a run.
//! - [`config`] - Configuration resolution and usage errors.
//! - [`load`] - Support code loading errors.
//! - [`writer`] - Output writing errors raised by formatters.

pub mod config;
pub mod core;
pub mod load;
pub mod writer;

pub use self::{
    config::{ConfigError, ConfigResult},
    core::{CucumberError, Result},
    load::{LoadError, LoadResult},
    writer::{WriterError, WriterResult},
};

#[cfg(test)]
mod integration_tests {
    use std::{error::Error as _, io};

    use super::*;

    #[test]
    fn config_error_converts_into_cucumber_error() {
        let err: CucumberError = ConfigError::invalid_format("fancy").into();

        assert!(matches!(err, CucumberError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid format: fancy",
        );
    }

    #[test]
    fn load_error_keeps_io_source() {
        let err = LoadError::new(
            "features/support/env.rs",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        let err = CucumberError::from(err);

        assert!(err.to_string().contains("Failed to load features/support/env.rs"));
        assert!(err.source().is_some());
    }

    #[test]
    fn writer_error_from_io() {
        let err: WriterError =
            io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed").into();

        assert!(err.is_io_error());
        assert!(CucumberError::from(err).to_string().contains("pipe closed"));
    }
}
