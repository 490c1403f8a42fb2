// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Full HTML report [`Formatter`].

use std::{fmt, io, rc::Rc};

use itertools::Itertools as _;

use super::{
    doc::{
        write_closing, write_failure, write_header, write_preamble,
        write_script, StepList,
    },
    out::{escape_html, WriteStrExt as _},
    Formatter,
};
use crate::{
    error::WriterResult,
    event::StepFailure,
    feature::{Feature, RegularScenario, RowScenario, Step},
    steps::{StepMatch, StepMatcher},
};

/// HTML report [`Formatter`].
///
/// Renders the same document as [`Doc`], and additionally lists outline
/// rows as a table below their template, one row per [`RowScenario`]
/// carrying the identifiers of its steps. Every outcome is marked,
/// including pending and skipped steps.
///
/// [`Doc`]: super::Doc
pub struct Html<O> {
    out: O,
    matcher: Rc<dyn StepMatcher>,
    list: StepList,
    table_open: bool,
    errors: Vec<StepFailure>,
}

impl<O> fmt::Debug for Html<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Html")
            .field("in_sublist", &self.list.in_sublist())
            .field("table_open", &self.table_open)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<O: io::Write> Html<O> {
    /// Creates a new [`Html`] formatter writing into the given `out`, and
    /// rendering step arguments resolved with the given `matcher`.
    #[must_use]
    pub fn new(out: O, matcher: Rc<dyn StepMatcher>) -> Self {
        Self {
            out,
            matcher,
            list: StepList::default(),
            table_open: false,
            errors: Vec::new(),
        }
    }

    /// Failures received so far, in the order they were reported.
    #[must_use]
    pub fn errors(&self) -> &[StepFailure] {
        &self.errors
    }

    /// Unwraps the underlying output.
    #[must_use]
    pub fn into_inner(self) -> O {
        self.out
    }

    fn open_table(&mut self, header: &[String]) -> io::Result<()> {
        self.out.write_line(r#"          <table class="examples">"#)?;
        if !header.is_empty() {
            self.out.write_line(format!(
                "            <thead><tr>{}</tr></thead>",
                header
                    .iter()
                    .map(|h| format!("<th>{}</th>", escape_html(h)))
                    .join(""),
            ))?;
        }
        self.out.write_line("            <tbody>")?;
        self.table_open = true;
        Ok(())
    }

    fn close_table(&mut self) -> io::Result<()> {
        if self.table_open {
            self.table_open = false;
            self.out.write_line("            </tbody>")?;
            self.out.write_line("          </table>")?;
        }
        Ok(())
    }
}

impl<O: io::Write> Formatter for Html<O> {
    fn visit_features(&mut self, features: &[Feature]) -> WriterResult<()> {
        let title = features.first().map_or("Feature", |f| f.keyword.as_str());
        write_preamble(&mut self.out, title)?;
        Ok(())
    }

    fn visit_feature(&mut self, feature: &Feature) -> WriterResult<()> {
        self.out.write_line(r#"      <div class="story">"#)?;
        feature.accept(self)?;
        self.close_table()?;
        self.out.write_line("      </div>")?;
        Ok(())
    }

    fn visit_header(&mut self, header: &str) -> WriterResult<()> {
        write_header(&mut self.out, header)?;
        Ok(())
    }

    fn visit_regular_scenario(
        &mut self,
        scenario: &RegularScenario,
    ) -> WriterResult<()> {
        self.close_table()?;
        self.list.close(&mut self.out)?;

        self.out.write_line(format!(
            "        <h3>{}: {}</h3>",
            escape_html(&scenario.keyword),
            escape_html(&scenario.name),
        ))?;
        self.out.write_line("          <ul>")?;
        scenario.accept(self)?;
        self.list.close(&mut self.out)?;
        self.out.write_line("          </ul>")?;

        if scenario.is_outline() {
            self.open_table(&scenario.table_header)?;
        }
        Ok(())
    }

    fn visit_row_scenario(&mut self, scenario: &RowScenario) -> WriterResult<()> {
        if !self.table_open {
            self.open_table(&[])?;
        }
        self.out.write_line(format!(
            r#"              <tr data-steps="{}">{}</tr>"#,
            scenario.steps.iter().map(|s| s.id).join(" "),
            scenario
                .values
                .iter()
                .map(|v| format!("<td>{}</td>", escape_html(v)))
                .join(""),
        ))?;
        Ok(())
    }

    fn visit_regular_step(&mut self, step: &Step) -> WriterResult<()> {
        let matched = self.matcher.match_step(step);
        self.list.write_step(&mut self.out, step, matched.as_ref())?;
        Ok(())
    }

    fn step_passed(
        &mut self,
        step: &Step,
        _: Option<&StepMatch>,
    ) -> WriterResult<()> {
        write_script(&mut self.out, format!("stepPassed({})", step.id))?;
        Ok(())
    }

    fn step_failed(
        &mut self,
        step: &Step,
        _: Option<&StepMatch>,
        error: &StepFailure,
    ) -> WriterResult<()> {
        self.errors.push(error.clone());
        write_failure(&mut self.out, step, error)
    }

    fn step_pending(
        &mut self,
        step: &Step,
        _: Option<&StepMatch>,
    ) -> WriterResult<()> {
        write_script(&mut self.out, format!("stepPending({})", step.id))?;
        Ok(())
    }

    fn step_skipped(
        &mut self,
        step: &Step,
        _: Option<&StepMatch>,
    ) -> WriterResult<()> {
        write_script(&mut self.out, format!("stepSkipped({})", step.id))?;
        Ok(())
    }

    fn dump(&mut self) -> WriterResult<()> {
        write_closing(&mut self.out)?;
        Ok(())
    }
}
