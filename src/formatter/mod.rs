// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Report generators visiting the feature tree and receiving step outcomes.
//!
//! Reporting is a two-phase protocol. The structural visit (one call per
//! tree node, pre-order) lays the report out, as the structure is known
//! statically from the parsed tree. Outcome callbacks arrive later, as each
//! step actually runs, and update the already emitted layout rather than
//! re-rendering it, since the output may be append-only.

pub mod doc;
pub mod html;
pub mod out;
pub mod pretty;
pub mod profile;
pub mod progress;
mod summary;

use std::str::FromStr;

use derive_more::Display;

use crate::{
    error::{ConfigError, WriterResult},
    event::StepFailure,
    feature::{Feature, RegularScenario, RowScenario, Step},
    steps::StepMatch,
};

#[doc(inline)]
pub use self::{
    doc::Doc, html::Html, pretty::Pretty, profile::Profile,
    progress::Progress,
};

/// Report generator.
///
/// Structural callbacks are invoked in pre-order: [`visit_features()`] once,
/// then [`visit_feature()`] per feature, which by default makes the feature
/// dispatch [`visit_header()`] and one scenario visit per child. Outcome
/// callbacks follow each feature's structural visit. [`dump()`] is the last
/// call, and no output is valid after it.
///
/// [`dump()`]: Formatter::dump
/// [`visit_feature()`]: Formatter::visit_feature
/// [`visit_features()`]: Formatter::visit_features
/// [`visit_header()`]: Formatter::visit_header
pub trait Formatter {
    /// Called once before any [`Feature`] is visited.
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn visit_features(&mut self, features: &[Feature]) -> WriterResult<()> {
        _ = features;
        Ok(())
    }

    /// Called once per [`Feature`].
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn visit_feature(&mut self, feature: &Feature) -> WriterResult<()> {
        feature.accept(self)
    }

    /// Called with the header text of the visited [`Feature`].
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn visit_header(&mut self, header: &str) -> WriterResult<()>;

    /// Called per [`RegularScenario`].
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn visit_regular_scenario(
        &mut self,
        scenario: &RegularScenario,
    ) -> WriterResult<()> {
        scenario.accept(self)
    }

    /// Called per [`RowScenario`].
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn visit_row_scenario(&mut self, scenario: &RowScenario) -> WriterResult<()> {
        scenario.accept(self)
    }

    /// Called per [`Step`] of a [`RegularScenario`].
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn visit_regular_step(&mut self, step: &Step) -> WriterResult<()>;

    /// Called per [`Step`] of a [`RowScenario`].
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn visit_row_step(&mut self, step: &Step) -> WriterResult<()> {
        _ = step;
        Ok(())
    }

    /// Called right before a matched [`Step`] is executed.
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn step_executing(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        _ = (step, matched);
        Ok(())
    }

    /// Called when a [`Step`] passed.
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn step_passed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()>;

    /// Called when a [`Step`] failed.
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn step_failed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
        error: &StepFailure,
    ) -> WriterResult<()>;

    /// Called when a [`Step`] is pending.
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn step_pending(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()>;

    /// Called when a [`Step`] was skipped.
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn step_skipped(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()>;

    /// Finishes the report, flushing and closing the output.
    ///
    /// # Errors
    ///
    /// If the output cannot be written.
    fn dump(&mut self) -> WriterResult<()>;
}

impl<F: Formatter + ?Sized> Formatter for Box<F> {
    fn visit_features(&mut self, features: &[Feature]) -> WriterResult<()> {
        (**self).visit_features(features)
    }

    fn visit_feature(&mut self, feature: &Feature) -> WriterResult<()> {
        (**self).visit_feature(feature)
    }

    fn visit_header(&mut self, header: &str) -> WriterResult<()> {
        (**self).visit_header(header)
    }

    fn visit_regular_scenario(
        &mut self,
        scenario: &RegularScenario,
    ) -> WriterResult<()> {
        (**self).visit_regular_scenario(scenario)
    }

    fn visit_row_scenario(&mut self, scenario: &RowScenario) -> WriterResult<()> {
        (**self).visit_row_scenario(scenario)
    }

    fn visit_regular_step(&mut self, step: &Step) -> WriterResult<()> {
        (**self).visit_regular_step(step)
    }

    fn visit_row_step(&mut self, step: &Step) -> WriterResult<()> {
        (**self).visit_row_step(step)
    }

    fn step_executing(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        (**self).step_executing(step, matched)
    }

    fn step_passed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        (**self).step_passed(step, matched)
    }

    fn step_failed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
        error: &StepFailure,
    ) -> WriterResult<()> {
        (**self).step_failed(step, matched, error)
    }

    fn step_pending(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        (**self).step_pending(step, matched)
    }

    fn step_skipped(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        (**self).step_skipped(step, matched)
    }

    fn dump(&mut self) -> WriterResult<()> {
        (**self).dump()
    }
}

/// Name of a report format selectable with `--format`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Format {
    /// Console text with one line per step. The default.
    #[display("pretty")]
    Pretty,

    /// Progress characters plus the slowest step definitions.
    #[display("profile")]
    Profile,

    /// One character per step outcome.
    #[display("progress")]
    Progress,

    /// Full HTML report, including outline tables.
    #[display("html")]
    Html,

    /// HTML document with one list entry per step.
    #[display("doc")]
    Doc,
}

impl Format {
    /// All the supported formats, in the order they are listed in help.
    pub const ALL: [Self; 5] =
        [Self::Pretty, Self::Profile, Self::Progress, Self::Html, Self::Doc];
}

impl Default for Format {
    fn default() -> Self {
        Self::Pretty
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.to_string() == s)
            .ok_or_else(|| ConfigError::invalid_format(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_listed_format() {
        for format in Format::ALL {
            assert_eq!(format.to_string().parse::<Format>().unwrap(), format);
        }
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "fancy".parse::<Format>().unwrap_err();

        assert_eq!(err.invalid_format_name(), Some("fancy"));
    }
}
