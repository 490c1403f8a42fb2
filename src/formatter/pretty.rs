// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Default console [`Formatter`].

use std::{collections::HashMap, fmt, io, mem, path::PathBuf, rc::Rc};

use itertools::Itertools as _;

use super::{
    out::{Styles, WriteStrExt as _},
    summary::{write_error, Status, Tally},
    Formatter,
};
use crate::{
    error::WriterResult,
    event::StepFailure,
    feature::{Feature, RegularScenario, RowScenario, Scenario, Step},
    steps::{StepMatch, StepMatcher},
};

/// Part of the output waiting for step outcomes.
#[derive(Debug)]
enum Block {
    /// Title of a scenario, printed along its first step outcome.
    Scenario { title: Option<String> },

    /// Outline example row, printed once all its steps are reported.
    Row {
        remaining: usize,
        cells: Vec<String>,
        widths: Vec<usize>,
        failures: Vec<StepFailure>,
    },
}

/// Console [`Formatter`] printing one line per step outcome.
///
/// Scenario titles are printed lazily, along the first outcome of the
/// scenario, while outline templates are printed as soon as they're visited.
/// Example rows are printed as table lines, once their last step completes.
pub struct Pretty<O> {
    out: O,
    matcher: Rc<dyn StepMatcher>,
    styles: Styles,
    source: bool,
    keyword: String,
    path: Option<PathBuf>,
    widths: HashMap<usize, Vec<usize>>,
    current_widths: Vec<usize>,
    blocks: HashMap<usize, Block>,
    tally: Tally,
}

impl<O> fmt::Debug for Pretty<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pretty")
            .field("styles", &self.styles)
            .field("source", &self.source)
            .field("tally", &self.tally)
            .finish_non_exhaustive()
    }
}

impl<O: io::Write> Pretty<O> {
    /// Creates a new [`Pretty`] formatter writing into the given `out`.
    ///
    /// With `source` enabled, step lines are annotated with the pattern of
    /// the matched definition, and scenario titles with their location.
    #[must_use]
    pub fn new(
        out: O,
        matcher: Rc<dyn StepMatcher>,
        styles: Styles,
        source: bool,
    ) -> Self {
        Self {
            out,
            matcher,
            styles,
            source,
            keyword: String::new(),
            path: None,
            widths: HashMap::new(),
            current_widths: Vec::new(),
            blocks: HashMap::new(),
            tally: Tally::default(),
        }
    }

    /// Unwraps the underlying output.
    #[must_use]
    pub fn into_inner(self) -> O {
        self.out
    }

    fn location(&self, line: usize) -> Option<String> {
        self.source.then(|| {
            self.path.as_ref().map_or_else(
                || format!("line {line}"),
                |p| format!("{}:{line}", p.display()),
            )
        })
    }

    fn with_comment(&self, text: String, comment: Option<String>) -> String {
        match comment {
            Some(c) => format!("{text}  {}", self.styles.comment(format!("# {c}"))),
            None => text,
        }
    }

    fn styled(&self, status: Status, text: &str) -> String {
        match status {
            Status::Passed => self.styles.ok(text),
            Status::Failed => self.styles.err(text),
            Status::Pending => self.styles.pending(text),
            Status::Skipped => self.styles.skipped(text),
        }
        .into_owned()
    }

    fn write_step(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
        status: Status,
        error: Option<&StepFailure>,
    ) -> io::Result<()> {
        let marker = match status {
            Status::Passed => "✔",
            Status::Failed => "✘",
            Status::Pending => "?",
            Status::Skipped => "-",
        };
        let text = step.format(
            matched,
            |t| self.styled(status, t),
            |a| self.styled(status, &self.styles.bold(a)),
        );
        let line = format!(
            "{}{text}",
            self.styled(status, &format!("    {marker} {} ", step.keyword)),
        );
        let comment = matched
            .filter(|_| self.source)
            .map(|m| m.pattern.clone());
        let line = self.with_comment(line, comment);
        self.out.write_line(line)?;

        if let Some(err) = error {
            write_error(&mut self.out, &self.styles, err, "      ")?;
        }
        Ok(())
    }

    fn write_row(
        &mut self,
        cells: &[String],
        widths: &[usize],
        status: Status,
        failures: &[StepFailure],
    ) -> io::Result<()> {
        let row = table_row(cells, widths);
        let line = self.styled(status, &format!("      {row}"));
        self.out.write_line(line)?;
        for failure in failures {
            write_error(&mut self.out, &self.styles, failure, "        ")?;
        }
        Ok(())
    }

    fn outcome(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
        status: Status,
        error: Option<&StepFailure>,
    ) -> WriterResult<()> {
        match error {
            Some(err) => self.tally.record_failure(step, err),
            None => self.tally.record(step, status),
        }
        let index = self.tally.owner(step);

        match index.and_then(|i| self.blocks.get_mut(&i)) {
            Some(Block::Row {
                remaining,
                cells,
                widths,
                failures,
            }) => {
                *remaining = remaining.saturating_sub(1);
                failures.extend(error.cloned());
                if *remaining == 0 {
                    let cells = mem::take(cells);
                    let widths = mem::take(widths);
                    let failures = mem::take(failures);
                    let status = index
                        .and_then(|i| self.tally.scenario_status(i))
                        .unwrap_or(status);
                    self.write_row(&cells, &widths, status, &failures)?;
                }
            }
            Some(Block::Scenario { title }) => {
                if let Some(title) = title.take() {
                    self.out.write_line("")?;
                    self.out.write_line(title)?;
                }
                self.write_step(step, matched, status, error)?;
            }
            None => self.write_step(step, matched, status, error)?,
        }
        Ok(())
    }
}

/// Formats the given `cells` as a table row, padding them to `widths`.
fn table_row(cells: &[String], widths: &[usize]) -> String {
    let cells = cells
        .iter()
        .enumerate()
        .map(|(n, c)| format!("{c:<0$}", widths.get(n).copied().unwrap_or(0)))
        .join(" | ");
    format!("| {cells} |")
}

/// Calculates column widths of every outline in the given `feature`, keyed
/// by the line of the outline template.
fn column_widths(feature: &Feature) -> HashMap<usize, Vec<usize>> {
    let mut widths = HashMap::new();
    let mut current: Option<(usize, Vec<usize>)> = None;
    let widen = |widths: &mut Vec<usize>, cells: &[String]| {
        for (n, cell) in cells.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(n) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    };

    for scenario in &feature.scenarios {
        match scenario {
            Scenario::Regular(s) => {
                if let Some((line, w)) = current.take() {
                    _ = widths.insert(line, w);
                }
                if s.is_outline() {
                    let mut w = Vec::new();
                    widen(&mut w, &s.table_header);
                    current = Some((s.line, w));
                }
            }
            Scenario::Row(r) => {
                if let Some((_, w)) = current.as_mut() {
                    widen(w, &r.values);
                }
            }
        }
    }
    if let Some((line, w)) = current {
        _ = widths.insert(line, w);
    }
    widths
}

impl<O: io::Write> Formatter for Pretty<O> {
    fn visit_feature(&mut self, feature: &Feature) -> WriterResult<()> {
        self.keyword.clone_from(&feature.keyword);
        self.path.clone_from(&feature.path);
        self.widths = column_widths(feature);
        feature.accept(self)
    }

    fn visit_header(&mut self, header: &str) -> WriterResult<()> {
        let mut lines = header.lines();
        let name = lines.next().unwrap_or_default();
        let title = self
            .styles
            .bold(format!("{}: {name}", self.keyword))
            .into_owned();
        let comment = self
            .source
            .then(|| self.path.as_ref().map(|p| p.display().to_string()))
            .flatten();
        let title = self.with_comment(title, comment);
        self.out.write_line(title)?;
        for line in lines {
            self.out.write_line(format!("  {}", line.trim()))?;
        }
        Ok(())
    }

    fn visit_regular_scenario(
        &mut self,
        scenario: &RegularScenario,
    ) -> WriterResult<()> {
        let title = self.with_comment(
            self.styles
                .bold(format!("  {}: {}", scenario.keyword, scenario.name))
                .into_owned(),
            self.location(scenario.line),
        );

        if !scenario.is_outline() {
            let index = self.tally.register(&scenario.steps);
            _ = self.blocks.insert(index, Block::Scenario { title: Some(title) });
            return Ok(());
        }

        self.current_widths =
            self.widths.get(&scenario.line).cloned().unwrap_or_default();
        self.out.write_line("")?;
        self.out.write_line(title)?;
        scenario.accept(self)?;
        self.out.write_line("")?;
        self.out.write_line("    Examples:")?;
        let header = table_row(&scenario.table_header, &self.current_widths);
        self.out.write_line(self.styles.skipped(format!("      {header}")))?;
        Ok(())
    }

    fn visit_row_scenario(&mut self, scenario: &RowScenario) -> WriterResult<()> {
        let index = self.tally.register(&scenario.steps);
        if scenario.steps.is_empty() {
            let widths = self.current_widths.clone();
            self.write_row(&scenario.values, &widths, Status::Passed, &[])?;
            return Ok(());
        }
        _ = self.blocks.insert(
            index,
            Block::Row {
                remaining: scenario.steps.len(),
                cells: scenario.values.clone(),
                widths: self.current_widths.clone(),
                failures: Vec::new(),
            },
        );
        Ok(())
    }

    fn visit_regular_step(&mut self, step: &Step) -> WriterResult<()> {
        let matched = self.matcher.match_step(step);
        let text = step.format(
            matched.as_ref(),
            |t| self.styles.skipped(t).into_owned(),
            |a| self.styles.skipped(self.styles.bold(a)).into_owned(),
        );
        let line = format!(
            "{}{text}",
            self.styles.skipped(format!("    {} ", step.keyword)),
        );
        let comment = matched.filter(|_| self.source).map(|m| m.pattern);
        let line = self.with_comment(line, comment);
        self.out.write_line(line)?;
        Ok(())
    }

    fn step_passed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.outcome(step, matched, Status::Passed, None)
    }

    fn step_failed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
        error: &StepFailure,
    ) -> WriterResult<()> {
        self.outcome(step, matched, Status::Failed, Some(error))
    }

    fn step_pending(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.outcome(step, matched, Status::Pending, None)
    }

    fn step_skipped(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.outcome(step, matched, Status::Skipped, None)
    }

    fn dump(&mut self) -> WriterResult<()> {
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
        steps::Steps,
    };

    fn step(id: usize, keyword: &str, text: &str) -> Step {
        Step {
            id: StepId(id),
            keyword: keyword.into(),
            ty: StepType::Given,
            continuation: false,
            text: text.into(),
            line: id + 2,
        }
    }

    fn pretty(source: bool) -> Pretty<WritableString> {
        let mut steps = Steps::<()>::new();
        steps.given(r"^I have (\d+) cucumbers$", |_, _| {});
        Pretty::new(
            WritableString::default(),
            Rc::new(steps),
            Styles::new(),
            source,
        )
    }

    #[test]
    fn prints_scenario_on_first_outcome() {
        let feature = Feature {
            keyword: "Feature".into(),
            header: "Eating\nAs a user".into(),
            path: Some("features/eat.feature".into()),
            scenarios: vec![Scenario::Regular(RegularScenario {
                keyword: "Scenario".into(),
                name: "eat".into(),
                line: 3,
                table_header: vec![],
                steps: vec![
                    step(1, "Given", "I have 5 cucumbers"),
                    step(2, "Then", "it hurts"),
                ],
            })],
        };
        let steps = feature.scenarios[0].steps().to_vec();
        let mut formatter = pretty(true);

        formatter.visit_feature(&feature).unwrap();
        let matched = formatter.matcher.match_step(&steps[0]);
        formatter.step_passed(&steps[0], matched.as_ref()).unwrap();
        formatter
            .step_failed(
                &steps[1],
                None,
                &StepFailure::new("boom").with_backtrace(["at eat.rs:3:5"]),
            )
            .unwrap();
        formatter.dump().unwrap();
        let out = formatter.into_inner().0;

        assert!(out.starts_with(
            "Feature: Eating  # features/eat.feature\n  As a user\n\n  \
             Scenario: eat  # features/eat.feature:3\n",
        ));
        assert!(out.contains(
            "    ✔ Given I have 5 cucumbers  # ^I have (\\d+) cucumbers$\n",
        ));
        assert!(out.contains("    ✘ Then it hurts\n      boom\n      at eat.rs:3:5\n"));
        assert!(out.contains("1 scenarios (1 failed)\n2 steps (1 failed, 1 passed)\n"));
    }

    #[test]
    fn prints_rows_once_completed() {
        let feature = Feature {
            keyword: "Feature".into(),
            header: "Eating".into(),
            path: None,
            scenarios: vec![
                Scenario::Regular(RegularScenario {
                    keyword: "Scenario Outline".into(),
                    name: "eating".into(),
                    line: 3,
                    table_header: vec!["start".into()],
                    steps: vec![step(1, "Given", "I have <start> cucumbers")],
                }),
                Scenario::Row(RowScenario {
                    keyword: "Scenario Outline".into(),
                    name: "eating".into(),
                    line: 7,
                    values: vec!["12345678".into()],
                    steps: vec![
                        step(2, "Given", "I have 12345678 cucumbers"),
                        step(3, "Then", "I am full"),
                    ],
                }),
            ],
        };
        let row = feature.scenarios[1].steps().to_vec();
        let mut formatter = pretty(false);

        formatter.visit_feature(&feature).unwrap();
        formatter.step_passed(&row[0], None).unwrap();
        let before = formatter.out.0.clone();
        formatter.step_pending(&row[1], None).unwrap();
        let out = formatter.into_inner().0;

        assert!(out.contains("  Scenario Outline: eating\n    Given I have <start> cucumbers\n"));
        assert!(out.contains("    Examples:\n      | start    |\n"));
        assert!(!before.contains("| 12345678 |"));
        assert!(out.ends_with("      | 12345678 |\n"));
    }
}
