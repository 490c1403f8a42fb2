// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for parsing [Gherkin] files.
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

pub mod basic;

use std::{path::Path, sync::Arc};

use derive_more::{Display, Error, From};

use crate::feature::Feature;

#[doc(inline)]
pub use self::basic::{Basic, ExpandExamplesError};

/// Source of parsed [`Feature`]s.
pub trait Parser {
    /// Parses the file at the given `path` into a [`Feature`].
    ///
    /// # Errors
    ///
    /// If the file cannot be read or isn't valid [Gherkin].
    ///
    /// [Gherkin]: https://cucumber.io/docs/gherkin/reference
    fn parse(&self, path: &Path) -> Result<Feature>;
}

/// Result of parsing [Gherkin] files.
///
/// [Gherkin]: https://cucumber.io/docs/gherkin/reference
pub type Result<T> = std::result::Result<T, Error>;

/// [`Parser`] error.
#[derive(Clone, Debug, Display, Error, From)]
pub enum Error {
    /// Failed to parse a [`Feature`].
    #[display("Failed to parse feature: {_0}")]
    Parsing(Arc<gherkin::ParseFileError>),

    /// Failed to expand outline examples.
    #[display("Failed to expand examples: {_0}")]
    ExampleExpansion(ExpandExamplesError),

    /// No keywords are known for the language of a file.
    #[display("Failed to parse `{path}`: {reason}")]
    #[from(ignore)]
    Language {
        /// File being parsed.
        #[error(not(source))]
        path: String,

        /// Underlying failure.
        reason: String,
    },
}
