// Copyright (c) 2018-2023  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Feature tree visited by [`Formatter`]s.
//!
//! The tree is built once by a [`Parser`] and is read-only afterwards. Its
//! variant set is closed, so dispatch happens through explicit `accept()`
//! methods rather than dynamic lookups:
//!
//! ```text
//! Feature ─┬─ visit_header
//!          ├─ Scenario::Regular ── visit_regular_scenario ── visit_regular_step*
//!          └─ Scenario::Row ────── visit_row_scenario ────── visit_row_step*
//! ```
//!
//! [`Formatter`]: crate::Formatter
//! [`Parser`]: crate::Parser

use std::path::PathBuf;

use derive_more::Display;
pub use gherkin::StepType;

use crate::{error::WriterResult, steps::StepMatch, Formatter};

/// Identifier of a [`Step`], unique within a single run.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct StepId(pub usize);

/// Single instruction line of a scenario.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Step {
    /// Run-wide unique identifier.
    pub id: StepId,

    /// Keyword as written in the file, without trailing whitespace.
    pub keyword: String,

    /// Type of the step, inherited from the preceding step for
    /// continuation keywords.
    pub ty: StepType,

    /// Whether the [`Step::keyword`] continues the group opened by a
    /// preceding step (`And`, `But`, `*` and their translations).
    pub continuation: bool,

    /// Literal text after the keyword.
    pub text: String,

    /// Line in the source file.
    pub line: usize,
}

/// Piece of a [`Step`] text produced by [`Step::segments()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Segment<'s> {
    /// Text outside of any matched argument.
    Text(&'s str),

    /// Text of a matched positional argument.
    Argument(&'s str),
}

impl Step {
    /// Indicates whether this [`Step`] is written with a continuation
    /// keyword.
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.continuation
    }

    /// Splits the text of this [`Step`] into plain and argument
    /// [`Segment`]s, according to the given resolved `matched` definition.
    ///
    /// Without a match the whole text is a single [`Segment::Text`].
    #[must_use]
    pub fn segments(&self, matched: Option<&StepMatch>) -> Vec<Segment<'_>> {
        let mut segments = Vec::new();
        let mut pos = 0;
        let ranges = matched
            .into_iter()
            .flat_map(|m| &m.args)
            .filter_map(|arg| arg.range.clone())
            .filter(|r| !r.is_empty());
        for range in ranges {
            if range.start < pos || range.end > self.text.len() {
                continue;
            }
            if range.start > pos {
                segments.push(Segment::Text(&self.text[pos..range.start]));
            }
            segments.push(Segment::Argument(&self.text[range.clone()]));
            pos = range.end;
        }
        if pos < self.text.len() || segments.is_empty() {
            segments.push(Segment::Text(&self.text[pos..]));
        }
        segments
    }

    /// Renders the text of this [`Step`], passing plain pieces through
    /// `text` and matched arguments through `argument`.
    #[must_use]
    pub fn format(
        &self,
        matched: Option<&StepMatch>,
        text: impl Fn(&str) -> String,
        argument: impl Fn(&str) -> String,
    ) -> String {
        self.segments(matched)
            .into_iter()
            .map(|s| match s {
                Segment::Text(t) => text(t),
                Segment::Argument(a) => argument(a),
            })
            .collect()
    }
}

/// Ordinary scenario, or the template of a scenario outline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegularScenario {
    /// Keyword as written in the file.
    pub keyword: String,

    /// Name of the scenario.
    pub name: String,

    /// Line in the source file.
    pub line: usize,

    /// Column headers of the outline examples. Empty for plain scenarios.
    pub table_header: Vec<String>,

    /// Steps in execution order.
    pub steps: Vec<Step>,
}

impl RegularScenario {
    /// Indicates whether this is an outline template, whose steps are only
    /// rendered and never executed (its rows are).
    #[must_use]
    pub fn is_outline(&self) -> bool {
        !self.table_header.is_empty()
    }

    /// Dispatches [`Formatter::visit_regular_step()`] for every [`Step`].
    ///
    /// # Errors
    ///
    /// If the `visitor` fails to write its output.
    pub fn accept<V: Formatter + ?Sized>(
        &self,
        visitor: &mut V,
    ) -> WriterResult<()> {
        self.steps
            .iter()
            .try_for_each(|step| visitor.visit_regular_step(step))
    }
}

/// Scenario generated from an outline template and one example row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RowScenario {
    /// Keyword of the outline.
    pub keyword: String,

    /// Name of the outline.
    pub name: String,

    /// Line of the example row in the source file.
    pub line: usize,

    /// Values of the example row, in column order.
    pub values: Vec<String>,

    /// Template steps with the row values substituted.
    pub steps: Vec<Step>,
}

impl RowScenario {
    /// Dispatches [`Formatter::visit_row_step()`] for every [`Step`].
    ///
    /// # Errors
    ///
    /// If the `visitor` fails to write its output.
    pub fn accept<V: Formatter + ?Sized>(
        &self,
        visitor: &mut V,
    ) -> WriterResult<()> {
        self.steps
            .iter()
            .try_for_each(|step| visitor.visit_row_step(step))
    }
}

/// Executable example within a [`Feature`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Scenario {
    /// Ordinary scenario or outline template.
    Regular(RegularScenario),

    /// One example row of an outline.
    Row(RowScenario),
}

impl Scenario {
    /// Name of this [`Scenario`].
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Regular(s) => &s.name,
            Self::Row(s) => &s.name,
        }
    }

    /// Keyword of this [`Scenario`].
    #[must_use]
    pub fn keyword(&self) -> &str {
        match self {
            Self::Regular(s) => &s.keyword,
            Self::Row(s) => &s.keyword,
        }
    }

    /// Line of this [`Scenario`] in the source file.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Regular(s) => s.line,
            Self::Row(s) => s.line,
        }
    }

    /// [`Step`]s of this [`Scenario`].
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        match self {
            Self::Regular(s) => &s.steps,
            Self::Row(s) => &s.steps,
        }
    }

    /// Indicates whether the [`Step`]s of this [`Scenario`] are executed.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        match self {
            Self::Regular(s) => !s.is_outline(),
            Self::Row(_) => true,
        }
    }

    /// Dispatches to the `visitor` method of the concrete variant.
    ///
    /// # Errors
    ///
    /// If the `visitor` fails to write its output.
    pub fn accept<V: Formatter + ?Sized>(
        &self,
        visitor: &mut V,
    ) -> WriterResult<()> {
        match self {
            Self::Regular(s) => visitor.visit_regular_scenario(s),
            Self::Row(s) => visitor.visit_row_scenario(s),
        }
    }
}

/// Root specification unit: a header plus ordered [`Scenario`]s.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Feature {
    /// Keyword as written in the file.
    pub keyword: String,

    /// Name line followed by the description lines.
    pub header: String,

    /// File this [`Feature`] was parsed from.
    pub path: Option<PathBuf>,

    /// Scenarios in file order, with outline rows following their
    /// template.
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    /// Name of this [`Feature`], the first line of its header.
    #[must_use]
    pub fn name(&self) -> &str {
        self.header.lines().next().unwrap_or_default()
    }

    /// Dispatches [`Formatter::visit_header()`] followed by one scenario
    /// visit per child.
    ///
    /// # Errors
    ///
    /// If the `visitor` fails to write its output.
    pub fn accept<V: Formatter + ?Sized>(
        &self,
        visitor: &mut V,
    ) -> WriterResult<()> {
        visitor.visit_header(&self.header)?;
        self.scenarios.iter().try_for_each(|sc| sc.accept(visitor))
    }

    /// Counts all the [`Step`]s of this [`Feature`].
    #[must_use]
    pub fn count_steps(&self) -> usize {
        self.scenarios.iter().map(|s| s.steps().len()).sum()
    }

    /// Keeps only the [`Scenario`] containing the given `line`: the one with
    /// the greatest starting line not after it.
    ///
    /// Outline rows stay selectable one by one, and selecting the outline
    /// template selects the template alone.
    pub fn retain_scenario_at(&mut self, line: usize) {
        let selected = self
            .scenarios
            .iter()
            .enumerate()
            .filter(|(_, s)| s.line() <= line)
            .max_by_key(|(_, s)| s.line())
            .map(|(n, _)| n);

        self.scenarios = match selected {
            Some(n) => vec![self.scenarios.swap_remove(n)],
            None => Vec::new(),
        };
    }
}
