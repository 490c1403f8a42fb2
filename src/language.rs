// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Language packs the feature files may be written in.

use derive_more::Display;

use crate::error::CucumberError;

/// Validated language tag, with its keywords known to the parser.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct Language(String);

impl Language {
    /// Loads the language with the given `tag`.
    ///
    /// # Errors
    ///
    /// If no keywords are known for the `tag`.
    pub fn load(tag: &str) -> Result<Self, CucumberError> {
        if gherkin::is_language_supported(tag) {
            tracing::debug!(tag, "loaded language");
            Ok(Self(tag.to_owned()))
        } else {
            Err(CucumberError::UnsupportedLanguage { tag: tag.to_owned() })
        }
    }

    /// Tag of this [`Language`].
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self("en".to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_known_languages() {
        assert_eq!(Language::load("en").unwrap(), Language::default());
        assert_eq!(Language::load("fr").unwrap().tag(), "fr");
    }

    #[test]
    fn rejects_unknown_language() {
        let err = Language::load("klingon").unwrap_err();

        assert_eq!(err.to_string(), "Unsupported language: klingon");
    }
}
