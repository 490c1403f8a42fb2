// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compact console [`Formatter`] printing one character per step.

use std::io;

use super::{
    out::{Styles, WriteStrExt as _},
    summary::{Status, Tally},
    Formatter,
};
use crate::{
    error::WriterResult,
    event::StepFailure,
    feature::{RegularScenario, RowScenario, Step},
    steps::StepMatch,
};

/// Console [`Formatter`] printing `.` for passed, `F` for failed, `P` for
/// pending and `_` for skipped steps, followed by failure details and the
/// summary.
#[derive(Debug)]
pub struct Progress<O> {
    out: O,
    styles: Styles,
    tally: Tally,
}

impl<O: io::Write> Progress<O> {
    /// Creates a new [`Progress`] formatter writing into the given `out`.
    #[must_use]
    pub fn new(out: O, styles: Styles) -> Self {
        Self {
            out,
            styles,
            tally: Tally::default(),
        }
    }

    /// Unwraps the underlying output.
    #[must_use]
    pub fn into_inner(self) -> O {
        self.out
    }

    /// Underlying output, for formatters extending this one.
    pub(crate) fn output(&mut self) -> &mut O {
        &mut self.out
    }

    fn outcome(&mut self, step: &Step, status: Status) -> WriterResult<()> {
        self.tally.record(step, status);
        let mark = match status {
            Status::Passed => self.styles.ok("."),
            Status::Failed => self.styles.err("F"),
            Status::Pending => self.styles.pending("P"),
            Status::Skipped => self.styles.skipped("_"),
        };
        self.out.write_str(mark)?;
        Ok(())
    }
}

impl<O: io::Write> Formatter for Progress<O> {
    fn visit_header(&mut self, _: &str) -> WriterResult<()> {
        Ok(())
    }

    fn visit_regular_scenario(
        &mut self,
        scenario: &RegularScenario,
    ) -> WriterResult<()> {
        if !scenario.is_outline() {
            _ = self.tally.register(&scenario.steps);
        }
        Ok(())
    }

    fn visit_row_scenario(&mut self, scenario: &RowScenario) -> WriterResult<()> {
        _ = self.tally.register(&scenario.steps);
        Ok(())
    }

    fn visit_regular_step(&mut self, _: &Step) -> WriterResult<()> {
        Ok(())
    }

    fn step_passed(
        &mut self,
        step: &Step,
        _: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.outcome(step, Status::Passed)
    }

    fn step_failed(
        &mut self,
        step: &Step,
        _: Option<&StepMatch>,
        error: &StepFailure,
    ) -> WriterResult<()> {
        self.tally.record_failure(step, error);
        self.out.write_str(self.styles.err("F"))?;
        Ok(())
    }

    fn step_pending(
        &mut self,
        step: &Step,
        _: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.outcome(step, Status::Pending)
    }

    fn step_skipped(
        &mut self,
        step: &Step,
        _: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.outcome(step, Status::Skipped)
    }

    fn dump(&mut self) -> WriterResult<()> {
        self.out.write_line("")?;
        self.tally.write_failures(&mut self.out, &self.styles)?;
        self.tally.write_counts(&mut self.out, &self.styles)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feature::{StepId, StepType},
        formatter::out::WritableString,
    };

    fn step(id: usize) -> Step {
        Step {
            id: StepId(id),
            keyword: "When".into(),
            ty: StepType::When,
            continuation: false,
            text: format!("step {id}"),
            line: id,
        }
    }

    #[test]
    fn prints_one_mark_per_outcome() {
        let scenario = RegularScenario {
            keyword: "Scenario".into(),
            name: "marks".into(),
            line: 1,
            table_header: vec![],
            steps: (1..=4).map(step).collect(),
        };
        let mut progress = Progress::new(WritableString::default(), Styles::new());

        progress.visit_regular_scenario(&scenario).unwrap();
        progress.step_passed(&step(1), None).unwrap();
        progress
            .step_failed(&step(2), None, &StepFailure::new("broken"))
            .unwrap();
        progress.step_pending(&step(3), None).unwrap();
        progress.step_skipped(&step(4), None).unwrap();
        progress.dump().unwrap();
        let out = progress.into_inner().0;

        assert!(out.starts_with(".FP_\n"));
        assert!(out.contains("1) When step 2\n   broken\n"));
        assert!(out.ends_with(
            "1 scenarios (1 failed)\n\
             4 steps (1 failed, 1 skipped, 1 pending, 1 passed)\n",
        ));
    }
}
