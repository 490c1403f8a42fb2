// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step and scenario statistics shared by the console formatters.

use std::{collections::HashMap, io};

use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;

use super::out::{Styles, WriteStrExt as _};
use crate::{
    event::StepFailure,
    feature::{Step, StepId},
};

/// Result of a whole scenario, the worst of its step outcomes.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) enum Status {
    Passed,
    Skipped,
    Pending,
    Failed,
}

/// Failed step remembered for the final report.
#[derive(Clone, Debug)]
pub(crate) struct Failure {
    pub(crate) step: String,
    pub(crate) error: StepFailure,
}

/// Running statistics of step outcomes.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    /// Scenario index of every step seen in the structural visit.
    owners: HashMap<StepId, usize>,

    /// Number of scenarios registered so far.
    registered: usize,

    /// Worst status per scenario that received an outcome, in first-outcome
    /// order.
    scenarios: LinkedHashMap<usize, Status>,

    pub(crate) passed: usize,
    pub(crate) failed: usize,
    pub(crate) pending: usize,
    pub(crate) skipped: usize,
    pub(crate) failures: Vec<Failure>,
}

impl Tally {
    /// Registers a scenario made of the given `steps`, returning its index.
    pub(crate) fn register(&mut self, steps: &[Step]) -> usize {
        let index = self.registered;
        self.registered += 1;
        for step in steps {
            _ = self.owners.insert(step.id, index);
        }
        index
    }

    /// Index of the scenario the given `step` belongs to.
    pub(crate) fn owner(&self, step: &Step) -> Option<usize> {
        self.owners.get(&step.id).copied()
    }

    /// Records a step outcome of the given `status`.
    pub(crate) fn record(&mut self, step: &Step, status: Status) {
        match status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Pending => self.pending += 1,
            Status::Skipped => self.skipped += 1,
        }
        if let Some(owner) = self.owner(step) {
            let entry = self.scenarios.entry(owner).or_insert(status);
            *entry = (*entry).max(status);
        }
    }

    /// Records a failed step.
    pub(crate) fn record_failure(&mut self, step: &Step, error: &StepFailure) {
        self.record(step, Status::Failed);
        self.failures.push(Failure {
            step: format!("{} {}", step.keyword, step.text),
            error: error.clone(),
        });
    }

    /// Status of the scenario with the given `index`, if it has received any
    /// outcome yet.
    pub(crate) fn scenario_status(&self, index: usize) -> Option<Status> {
        self.scenarios.get(&index).copied()
    }

    /// Total number of step outcomes.
    pub(crate) fn steps(&self) -> usize {
        self.passed + self.failed + self.pending + self.skipped
    }

    /// Writes failure details, each one numbered.
    pub(crate) fn write_failures(
        &self,
        out: &mut impl io::Write,
        styles: &Styles,
    ) -> io::Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        out.write_line("")?;
        out.write_line(styles.err("Failed steps:"))?;
        for (n, failure) in self.failures.iter().enumerate() {
            out.write_line("")?;
            out.write_line(
                styles.err(format!("{}) {}", n + 1, failure.step)),
            )?;
            write_error(out, styles, &failure.error, "   ")?;
        }
        Ok(())
    }

    /// Writes the scenario and step counters.
    pub(crate) fn write_counts(
        &self,
        out: &mut impl io::Write,
        styles: &Styles,
    ) -> io::Result<()> {
        let count = |status| {
            self.scenarios.values().filter(|s| **s == status).count()
        };
        let scenarios = [
            (count(Status::Failed), "failed", styles.err.clone()),
            (count(Status::Skipped), "skipped", styles.skipped.clone()),
            (count(Status::Pending), "pending", styles.pending.clone()),
            (count(Status::Passed), "passed", styles.ok.clone()),
        ];
        let steps = [
            (self.failed, "failed", styles.err.clone()),
            (self.skipped, "skipped", styles.skipped.clone()),
            (self.pending, "pending", styles.pending.clone()),
            (self.passed, "passed", styles.ok.clone()),
        ];

        let describe = |total: usize, noun: &str, parts: &[(usize, &str, console::Style)]| {
            let details = parts
                .iter()
                .filter(|(n, ..)| *n > 0)
                .map(|(n, what, style)| {
                    let text = format!("{n} {what}");
                    if styles.is_present {
                        style.apply_to(text).to_string()
                    } else {
                        text
                    }
                })
                .join(", ");
            if details.is_empty() {
                format!("{total} {noun}")
            } else {
                format!("{total} {noun} ({details})")
            }
        };

        out.write_line("")?;
        out.write_line(describe(self.scenarios.len(), "scenarios", &scenarios))?;
        out.write_line(describe(self.steps(), "steps", &steps))
    }
}

/// Writes the message and backtrace of the given `error`, each line
/// prefixed with `indent`.
pub(crate) fn write_error(
    out: &mut impl io::Write,
    styles: &Styles,
    error: &StepFailure,
    indent: &str,
) -> io::Result<()> {
    for line in error.message.lines().chain(error.backtrace.iter().map(String::as_str)) {
        out.write_line(styles.err(format!("{indent}{line}")))?;
    }
    Ok(())
}
