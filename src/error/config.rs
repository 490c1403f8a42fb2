// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration and usage error types.
//!
//! This module defines errors that can occur while folding command-line
//! tokens and profiles into a [`Config`].
//!
//! [`Config`]: crate::Config

use derive_more::with_trait::{Display, Error};

/// Configuration and usage errors.
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    /// `--format` value outside of the supported set.
    #[display("Invalid format: {name}")]
    InvalidFormat {
        /// The rejected format name.
        #[error(not(source))]
        name: String,
    },

    /// Profile entry resolved to something other than a string.
    #[display(
        "Expected to find a String for profile `{profile}`, got {value}. \
         {file}:\n{contents}"
    )]
    ProfileNotString {
        /// Name of the requested profile.
        #[error(not(source))]
        profile: String,

        /// Offending value, rendered as YAML.
        value: String,

        /// Profile file the value was read from.
        file: String,

        /// Whole contents of the profile file.
        contents: String,
    },

    /// Profile file exists but cannot be read or parsed.
    #[display("Failed to read profiles from `{file}`: {reason}")]
    ProfileFile {
        /// Profile file path.
        #[error(not(source))]
        file: String,

        /// Underlying failure.
        reason: String,
    },

    /// Profile expands to itself, directly or through other profiles.
    #[display("Profile `{profile}` is included recursively")]
    ProfileCycle {
        /// Name of the profile included twice.
        #[error(not(source))]
        profile: String,
    },

    /// Line filter given while several features were discovered.
    #[display(
        "Line number can only be specified when there is 1 feature. \
         There were {features}."
    )]
    LineFilterAmbiguous {
        /// Number of discovered features.
        #[error(not(source))]
        features: usize,
    },

    /// Command line doesn't match the grammar, or help/version requested.
    #[display("{_0}")]
    Cli(clap::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Creates a new invalid format error.
    #[must_use]
    pub fn invalid_format(name: impl Into<String>) -> Self {
        Self::InvalidFormat { name: name.into() }
    }

    /// Creates a new profile cycle error.
    #[must_use]
    pub fn profile_cycle(profile: impl Into<String>) -> Self {
        Self::ProfileCycle {
            profile: profile.into(),
        }
    }

    /// Returns true if this is an invalid format error.
    #[must_use]
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, Self::InvalidFormat { .. })
    }

    /// Returns true if this is a profile shape error.
    #[must_use]
    pub fn is_profile_not_string(&self) -> bool {
        matches!(self, Self::ProfileNotString { .. })
    }

    /// Returns true if the user should be shown the help text along with
    /// this error.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        match self {
            Self::InvalidFormat { .. } => true,
            Self::Cli(e) => !matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp
                    | clap::error::ErrorKind::DisplayVersion,
            ),
            _ => false,
        }
    }

    /// Returns the rejected format name, if applicable.
    #[must_use]
    pub fn invalid_format_name(&self) -> Option<&str> {
        match self {
            Self::InvalidFormat { name } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_format_is_usage_error() {
        let err = ConfigError::invalid_format("fancy");

        assert!(err.is_invalid_format());
        assert!(err.is_usage());
        assert_eq!(err.invalid_format_name(), Some("fancy"));
        assert_eq!(err.to_string(), "Invalid format: fancy");
    }

    #[test]
    fn profile_errors_are_not_usage_errors() {
        let err = ConfigError::ProfileNotString {
            profile: "ci".into(),
            value: "- a\n- b".into(),
            file: "cucumber.yml".into(),
            contents: "ci:\n  - a\n  - b\n".into(),
        };

        assert!(err.is_profile_not_string());
        assert!(!err.is_usage());
        assert!(err.to_string().contains("got - a\n- b"));

        let err = ConfigError::profile_cycle("default");
        assert!(!err.is_usage());
        assert_eq!(
            err.to_string(),
            "Profile `default` is included recursively",
        );
    }

    #[test]
    fn line_filter_message_counts_features() {
        let err = ConfigError::LineFilterAmbiguous { features: 3 };

        assert!(err.to_string().ends_with("There were 3."));
        assert_eq!(err.invalid_format_name(), None);
    }
}
