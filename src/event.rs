// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Outcomes of running a [`Step`].
//!
//! Outcomes are reported to [`Formatter`]s separately from the structural
//! visit, as the run progresses.
//!
//! [`Formatter`]: crate::Formatter

use derive_more::Display;

use crate::{error::WriterResult, feature::Step, steps::StepMatch, Formatter};

/// Failure of a single [`Step`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display("{message}")]
pub struct StepFailure {
    /// Failure message.
    pub message: String,

    /// Backtrace lines, innermost first. Starts with the panic location
    /// when known.
    pub backtrace: Vec<String>,
}

impl StepFailure {
    /// Creates a new [`StepFailure`] with an empty backtrace.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    /// Adds the given `backtrace` lines.
    #[must_use]
    pub fn with_backtrace<I, S>(mut self, backtrace: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace.extend(backtrace.into_iter().map(Into::into));
        self
    }
}

/// Outcome of a single [`Step`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Step ran without failure.
    Passed,

    /// Step failed.
    Failed(StepFailure),

    /// Step has no matching definition, or marked itself pending.
    Pending,

    /// Step didn't run: dry run, or a previous step of the scenario didn't
    /// pass.
    Skipped,
}

impl Outcome {
    /// Indicates whether this is a [`Outcome::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Invokes the callback of the given `formatter` matching this
    /// [`Outcome`].
    ///
    /// # Errors
    ///
    /// If the `formatter` fails to write its output.
    pub fn report<F: Formatter + ?Sized>(
        &self,
        step: &Step,
        matched: Option<&StepMatch>,
        formatter: &mut F,
    ) -> WriterResult<()> {
        match self {
            Self::Passed => formatter.step_passed(step, matched),
            Self::Failed(err) => formatter.step_failed(step, matched, err),
            Self::Pending => formatter.step_pending(step, matched),
            Self::Skipped => formatter.step_skipped(step, matched),
        }
    }
}
