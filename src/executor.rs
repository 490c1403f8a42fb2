// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution of parsed [`Feature`]s against registered [`Steps`].

use std::{fmt, rc::Rc};

use crate::{
    error::WriterResult,
    event::Outcome,
    feature::{Feature, Scenario},
    panic_trap::{self, Trapped},
    steps::Steps,
    Formatter,
};

/// Counters of step [`Outcome`]s of a whole run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// Number of executed scenarios.
    pub scenarios: usize,

    /// Number of passed steps.
    pub passed: usize,

    /// Number of failed steps.
    pub failed: usize,

    /// Number of pending steps.
    pub pending: usize,

    /// Number of skipped steps.
    pub skipped: usize,
}

impl RunSummary {
    /// Indicates whether any step failed.
    #[must_use]
    pub const fn has_failed(&self) -> bool {
        self.failed > 0
    }

    /// Total number of reported steps.
    #[must_use]
    pub const fn steps(&self) -> usize {
        self.passed + self.failed + self.pending + self.skipped
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed(_) => self.failed += 1,
            Outcome::Pending => self.pending += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

/// Runs scenarios step by step, reporting every [`Outcome`] to a
/// [`Formatter`].
///
/// Every scenario runs against a fresh `W::default()` world. After a step
/// fails or turns out pending, the remaining steps of its scenario are
/// skipped.
pub struct Executor<W> {
    steps: Rc<Steps<W>>,
    dry_run: bool,
}

impl<W> fmt::Debug for Executor<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("steps", &self.steps)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl<W: Default> Executor<W> {
    /// Creates a new [`Executor`] of the given `steps`.
    #[must_use]
    pub const fn new(steps: Rc<Steps<W>>) -> Self {
        Self {
            steps,
            dry_run: false,
        }
    }

    /// Makes every step skipped instead of executed.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Visits the given `features` with the `sink`, executing the scenarios
    /// of each one right after its structural visit, and finishes the
    /// report with [`Formatter::dump()`].
    ///
    /// Step failures don't stop the run.
    ///
    /// # Errors
    ///
    /// If the `sink` fails to write its output.
    pub fn visit_features<F: Formatter + ?Sized>(
        &self,
        features: &[Feature],
        sink: &mut F,
    ) -> WriterResult<RunSummary> {
        let mut summary = RunSummary::default();

        sink.visit_features(features)?;
        for feature in features {
            tracing::debug!(feature = feature.name(), "running feature");

            sink.visit_feature(feature)?;
            for scenario in feature.scenarios.iter().filter(|s| s.is_executable())
            {
                self.run_scenario(scenario, sink, &mut summary)?;
            }
        }
        sink.dump()?;

        tracing::info!(
            scenarios = summary.scenarios,
            passed = summary.passed,
            failed = summary.failed,
            pending = summary.pending,
            skipped = summary.skipped,
            "run finished",
        );
        Ok(summary)
    }

    fn run_scenario<F: Formatter + ?Sized>(
        &self,
        scenario: &Scenario,
        sink: &mut F,
        summary: &mut RunSummary,
    ) -> WriterResult<()> {
        summary.scenarios += 1;

        let mut world = None;
        let mut halted = self.dry_run;
        for step in scenario.steps() {
            let resolved = self.steps.resolve(step);
            let matched = resolved.as_ref().map(|(m, _)| m);

            let outcome = match &resolved {
                _ if halted => Outcome::Skipped,
                None => Outcome::Pending,
                Some((m, func)) => {
                    sink.step_executing(step, Some(m))?;
                    let world = world.get_or_insert_with(W::default);
                    let args = m.values();
                    match panic_trap::trap(|| func(world, args.as_slice())) {
                        Ok(()) => Outcome::Passed,
                        Err(Trapped::Pending) => Outcome::Pending,
                        Err(Trapped::Panicked(e)) => Outcome::Failed(e),
                    }
                }
            };
            if outcome != Outcome::Passed {
                halted = true;
            }

            summary.record(&outcome);
            outcome.report(step, matched, sink)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::StepFailure,
        feature::{RegularScenario, RowScenario, Step, StepId, StepType},
        pending,
        steps::StepMatch,
    };

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Formatter for Recorder {
        fn visit_header(&mut self, header: &str) -> WriterResult<()> {
            self.0.push(format!("header {header}"));
            Ok(())
        }

        fn visit_regular_step(&mut self, step: &Step) -> WriterResult<()> {
            self.0.push(format!("visit {}", step.text));
            Ok(())
        }

        fn step_executing(
            &mut self,
            step: &Step,
            _: Option<&StepMatch>,
        ) -> WriterResult<()> {
            self.0.push(format!("executing {}", step.text));
            Ok(())
        }

        fn step_passed(
            &mut self,
            step: &Step,
            _: Option<&StepMatch>,
        ) -> WriterResult<()> {
            self.0.push(format!("passed {}", step.text));
            Ok(())
        }

        fn step_failed(
            &mut self,
            step: &Step,
            _: Option<&StepMatch>,
            error: &StepFailure,
        ) -> WriterResult<()> {
            self.0.push(format!("failed {}: {error}", step.text));
            Ok(())
        }

        fn step_pending(
            &mut self,
            step: &Step,
            _: Option<&StepMatch>,
        ) -> WriterResult<()> {
            self.0.push(format!("pending {}", step.text));
            Ok(())
        }

        fn step_skipped(
            &mut self,
            step: &Step,
            _: Option<&StepMatch>,
        ) -> WriterResult<()> {
            self.0.push(format!("skipped {}", step.text));
            Ok(())
        }

        fn dump(&mut self) -> WriterResult<()> {
            self.0.push("dump".into());
            Ok(())
        }
    }

    fn step(id: usize, text: &str) -> Step {
        Step {
            id: StepId(id),
            keyword: "Given".into(),
            ty: StepType::Given,
            continuation: false,
            text: text.into(),
            line: id,
        }
    }

    fn feature(scenarios: Vec<Scenario>) -> Feature {
        Feature {
            keyword: "Feature".into(),
            header: "Eating".into(),
            path: None,
            scenarios,
        }
    }

    fn regular(steps: Vec<Step>) -> Scenario {
        Scenario::Regular(RegularScenario {
            keyword: "Scenario".into(),
            name: "eat".into(),
            line: 1,
            table_header: vec![],
            steps,
        })
    }

    fn steps() -> Rc<Steps<u32>> {
        let mut steps = Steps::<u32>::new();
        steps
            .given("^count$", |w, _| *w += 1)
            .given("^assert one$", |w, _| assert_eq!(*w, 1, "world is fresh"))
            .given("^boom$", |_, _| panic!("exploded"))
            .given("^later$", |_, _| pending!());
        Rc::new(steps)
    }

    #[test]
    fn reports_outcomes_after_each_feature_visit() {
        let features = [feature(vec![regular(vec![
            step(1, "count"),
            step(2, "assert one"),
        ])])];
        let mut sink = Recorder::default();

        let summary = Executor::new(steps())
            .visit_features(&features, &mut sink)
            .unwrap();

        assert_eq!(
            sink.0,
            [
                "header Eating",
                "visit count",
                "visit assert one",
                "executing count",
                "passed count",
                "executing assert one",
                "passed assert one",
                "dump",
            ],
        );
        assert_eq!(summary.passed, 2);
        assert!(!summary.has_failed());
    }

    #[test]
    fn skips_remaining_steps_after_failure() {
        let features = [feature(vec![
            regular(vec![step(1, "boom"), step(2, "count")]),
            regular(vec![step(3, "count"), step(4, "assert one")]),
        ])];
        let mut sink = Recorder::default();

        let summary = Executor::new(steps())
            .visit_features(&features, &mut sink)
            .unwrap();

        assert!(sink.0.contains(&"failed boom: exploded".to_owned()));
        assert!(sink.0.contains(&"skipped count".to_owned()));
        assert!(sink.0.contains(&"passed assert one".to_owned()));
        assert_eq!(
            summary,
            RunSummary {
                scenarios: 2,
                passed: 2,
                failed: 1,
                pending: 0,
                skipped: 1,
            },
        );
    }

    #[test]
    fn unmatched_and_marked_steps_are_pending() {
        let features = [feature(vec![
            regular(vec![step(1, "unknown"), step(2, "count")]),
            regular(vec![step(3, "later")]),
        ])];
        let mut sink = Recorder::default();

        let summary = Executor::new(steps())
            .visit_features(&features, &mut sink)
            .unwrap();

        assert!(!sink.0.contains(&"executing unknown".to_owned()));
        assert!(sink.0.contains(&"pending unknown".to_owned()));
        assert!(sink.0.contains(&"pending later".to_owned()));
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn dry_run_executes_nothing() {
        let features = [feature(vec![regular(vec![step(1, "boom")])])];
        let mut sink = Recorder::default();

        let summary = Executor::new(steps())
            .dry_run(true)
            .visit_features(&features, &mut sink)
            .unwrap();

        assert!(!sink.0.iter().any(|c| c.starts_with("executing")));
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.steps(), 1);
    }

    #[test]
    fn outline_template_is_not_executed() {
        let template = Scenario::Regular(RegularScenario {
            keyword: "Scenario Outline".into(),
            name: "eat".into(),
            line: 1,
            table_header: vec!["n".into()],
            steps: vec![step(1, "<n>")],
        });
        let row = Scenario::Row(RowScenario {
            keyword: "Scenario Outline".into(),
            name: "eat".into(),
            line: 5,
            values: vec!["count".into()],
            steps: vec![step(2, "count")],
        });
        let mut sink = Recorder::default();

        let summary = Executor::new(steps())
            .visit_features(&[feature(vec![template, row])], &mut sink)
            .unwrap();

        assert_eq!(summary.scenarios, 1);
        assert_eq!(summary.passed, 1);
        assert!(sink.0.contains(&"visit <n>".to_owned()));
        assert!(!sink.0.contains(&"pending <n>".to_owned()));
    }
}
