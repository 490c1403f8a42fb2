// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Progress`] output extended with step definition timings.

use std::{
    io,
    time::{Duration, Instant},
};

use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;

use super::{
    out::{Styles, WriteStrExt as _},
    Formatter, Progress,
};
use crate::{
    error::WriterResult,
    event::StepFailure,
    feature::{RegularScenario, RowScenario, Step},
    steps::StepMatch,
};

/// Number of step definitions listed in the report.
const TOP: usize = 10;

/// [`Formatter`] printing [`Progress`] output followed by the slowest step
/// definitions, by average duration.
///
/// A step is timed from [`Formatter::step_executing()`] until its outcome,
/// so skipped steps are never timed.
#[derive(Debug)]
pub struct Profile<O> {
    progress: Progress<O>,
    started: Option<Instant>,
    timings: LinkedHashMap<String, Vec<Duration>>,
}

impl<O: io::Write> Profile<O> {
    /// Creates a new [`Profile`] formatter writing into the given `out`.
    #[must_use]
    pub fn new(out: O, styles: Styles) -> Self {
        Self {
            progress: Progress::new(out, styles),
            started: None,
            timings: LinkedHashMap::new(),
        }
    }

    /// Unwraps the underlying output.
    #[must_use]
    pub fn into_inner(self) -> O {
        self.progress.into_inner()
    }

    /// Step definitions ordered from the slowest one, with their average
    /// durations.
    #[must_use]
    pub fn slowest(&self) -> Vec<(&str, Duration)> {
        self.timings
            .iter()
            .filter(|(_, d)| !d.is_empty())
            .map(|(pattern, durations)| {
                let total = durations.iter().sum::<Duration>();
                let count = u32::try_from(durations.len()).unwrap_or(u32::MAX);
                (pattern.as_str(), total / count)
            })
            .sorted_by(|(_, a), (_, b)| b.cmp(a))
            .take(TOP)
            .collect()
    }

    fn stop_timer(&mut self, matched: Option<&StepMatch>) {
        let started = self.started.take();
        if let (Some(started), Some(m)) = (started, matched) {
            self.timings
                .entry(m.pattern.clone())
                .or_insert_with(Vec::new)
                .push(started.elapsed());
        }
    }
}

/// Rounds the given `duration` to microseconds, for readability.
fn rounded(duration: Duration) -> Duration {
    Duration::from_micros(
        u64::try_from(duration.as_micros()).unwrap_or(u64::MAX),
    )
}

impl<O: io::Write> Formatter for Profile<O> {
    fn visit_header(&mut self, header: &str) -> WriterResult<()> {
        self.progress.visit_header(header)
    }

    fn visit_regular_scenario(
        &mut self,
        scenario: &RegularScenario,
    ) -> WriterResult<()> {
        self.progress.visit_regular_scenario(scenario)
    }

    fn visit_row_scenario(&mut self, scenario: &RowScenario) -> WriterResult<()> {
        self.progress.visit_row_scenario(scenario)
    }

    fn visit_regular_step(&mut self, step: &Step) -> WriterResult<()> {
        self.progress.visit_regular_step(step)
    }

    fn step_executing(
        &mut self,
        _: &Step,
        _: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn step_passed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.stop_timer(matched);
        self.progress.step_passed(step, matched)
    }

    fn step_failed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
        error: &StepFailure,
    ) -> WriterResult<()> {
        self.stop_timer(matched);
        self.progress.step_failed(step, matched, error)
    }

    fn step_pending(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.stop_timer(matched);
        self.progress.step_pending(step, matched)
    }

    fn step_skipped(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.started = None;
        self.progress.step_skipped(step, matched)
    }

    fn dump(&mut self) -> WriterResult<()> {
        self.progress.dump()?;

        let slowest = self
            .slowest()
            .into_iter()
            .map(|(pattern, avg)| {
                format!("  {}  {pattern}", humantime::format_duration(rounded(avg)))
            })
            .collect::<Vec<_>>();
        if slowest.is_empty() {
            return Ok(());
        }

        let out = self.progress.output();
        out.write_line("")?;
        out.write_line(format!("Top {TOP} average slowest step definitions:"))?;
        for line in slowest {
            out.write_line(line)?;
        }
        out.flush()?;
        Ok(())
    }
}
