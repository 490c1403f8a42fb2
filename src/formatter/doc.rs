// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Formatter`] rendering a self-contained HTML document.
//!
//! Every [`Step`] becomes one list entry carrying the step identifier, and
//! outcomes are reported as inline scripts marking those entries once the
//! run reaches them. Continuation steps (`And`, `But`) are nested into a
//! sublist under the step opening their group.

use std::{fmt, io, rc::Rc};

use itertools::Itertools as _;

use super::{
    out::{escape_html, script_string, WriteStrExt as _},
    Formatter,
};
use crate::{
    error::WriterResult,
    event::StepFailure,
    feature::{Feature, RegularScenario, Step},
    steps::{StepMatch, StepMatcher},
};

/// Stylesheet embedded into every generated document.
const STYLESHEET: &str = include_str!("doc.css");

/// Scripts marking list entries with their outcome.
const SCRIPTS: &str = r#"function markStep(id, status) {
  var el = document.getElementById('step-' + id)
    || document.querySelector('[data-steps~="' + id + '"]');
  if (el) {
    el.className = status;
  }
  return el;
}
function stepPassed(id) {
  markStep(id, 'passed');
}
function stepFailed(id, message, backtrace) {
  var el = markStep(id, 'failed');
  if (el) {
    var pre = document.createElement('pre');
    pre.className = 'error';
    pre.appendChild(document.createTextNode(message + '\n' + backtrace));
    (el.tagName === 'TR' ? el.lastElementChild : el).appendChild(pre);
  }
}
function stepPending(id) {
  markStep(id, 'pending');
}
function stepSkipped(id) {
  markStep(id, 'skipped');
}"#;

/// Writes the document head, titled with the given `title`.
pub(crate) fn write_preamble(
    out: &mut impl io::Write,
    title: &str,
) -> io::Result<()> {
    out.write_str(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html
  PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN"
  "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en" lang="en">
  <head>
    <title>{title}</title>
    <meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
    <meta http-equiv="Expires" content="-1" />
    <meta http-equiv="Pragma" content="no-cache" />
    <style type="text/css">
{STYLESHEET}
    </style>
    <script type="text/javascript">
//<![CDATA[
{SCRIPTS}
//]]>
    </script>
  </head>
  <body>
"#,
        title = escape_html(title),
    ))
}

/// Writes the [`Feature`] name and description.
pub(crate) fn write_header(
    out: &mut impl io::Write,
    header: &str,
) -> io::Result<()> {
    let mut lines = header.lines().map(escape_html);
    let name = lines.next().unwrap_or_default();
    out.write_line(format!("        <h1>{name}</h1>"))?;
    out.write_line(format!("        <p><em>{}", lines.join("<br />\n")))?;
    out.write_line("        </em></p>")
}

/// Writes an inline script invoking the given `call`.
pub(crate) fn write_script(
    out: &mut impl io::Write,
    call: impl fmt::Display,
) -> io::Result<()> {
    out.write_line(format!(
        r#"    <script type="text/javascript">{call}</script>"#,
    ))
}

/// Writes a script marking the given `step` as failed.
pub(crate) fn write_failure(
    out: &mut impl io::Write,
    step: &Step,
    error: &StepFailure,
) -> WriterResult<()> {
    let message = script_string(&error.message)?;
    let backtrace = script_string(&error.backtrace.join("\n"))?;
    write_script(out, format!("stepFailed({}, {message}, {backtrace})", step.id))?;
    Ok(())
}

/// Writes the end of the document.
pub(crate) fn write_closing(out: &mut impl io::Write) -> io::Result<()> {
    out.write_line("  </body>")?;
    out.write_line("</html>")?;
    out.flush()
}

/// List of scenario [`Step`]s with continuation steps nested into a
/// sublist.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct StepList {
    in_sublist: bool,
}

impl StepList {
    /// Indicates whether a sublist is currently open.
    pub(crate) const fn in_sublist(self) -> bool {
        self.in_sublist
    }

    /// Writes the list entry of the given `step`, opening or closing the
    /// sublist as its continuation flag requires.
    pub(crate) fn write_step(
        &mut self,
        out: &mut impl io::Write,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> io::Result<()> {
        if step.is_continuation() {
            if !self.in_sublist {
                self.in_sublist = true;
                out.write_line("            <ul>")?;
            }
        } else {
            self.close(out)?;
        }
        let text = step.format(
            matched,
            |t| escape_html(t).into_owned(),
            |a| format!("<span>{}</span>", escape_html(a)),
        );
        out.write_line(format!(
            r#"            <li id="step-{}">{} {text}</li>"#,
            step.id,
            escape_html(&step.keyword),
        ))
    }

    /// Closes the sublist, if open.
    pub(crate) fn close(&mut self, out: &mut impl io::Write) -> io::Result<()> {
        if self.in_sublist {
            self.in_sublist = false;
            out.write_line("            </ul>")?;
        }
        Ok(())
    }
}

/// HTML document [`Formatter`].
///
/// Outline rows are not rendered: only the outline template is listed, with
/// its example column names. Pending and skipped steps are left unmarked.
pub struct Doc<O> {
    out: O,
    matcher: Rc<dyn StepMatcher>,
    table_header: Vec<String>,
    list: StepList,
    errors: Vec<StepFailure>,
}

impl<O> fmt::Debug for Doc<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Doc")
            .field("table_header", &self.table_header)
            .field("in_sublist", &self.list.in_sublist())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<O: io::Write> Doc<O> {
    /// Creates a new [`Doc`] formatter writing into the given `out`, and
    /// rendering step arguments resolved with the given `matcher`.
    #[must_use]
    pub fn new(out: O, matcher: Rc<dyn StepMatcher>) -> Self {
        Self {
            out,
            matcher,
            table_header: Vec::new(),
            list: StepList::default(),
            errors: Vec::new(),
        }
    }

    /// Failures received so far, in the order they were reported.
    #[must_use]
    pub fn errors(&self) -> &[StepFailure] {
        &self.errors
    }

    /// Example column names of the last visited scenario.
    #[must_use]
    pub fn table_header(&self) -> &[String] {
        &self.table_header
    }

    /// Unwraps the underlying output.
    #[must_use]
    pub fn into_inner(self) -> O {
        self.out
    }
}

impl<O: io::Write> Formatter for Doc<O> {
    fn visit_features(&mut self, features: &[Feature]) -> WriterResult<()> {
        let title = features.first().map_or("Feature", |f| f.keyword.as_str());
        write_preamble(&mut self.out, title)?;
        Ok(())
    }

    fn visit_feature(&mut self, feature: &Feature) -> WriterResult<()> {
        self.out.write_line(r#"      <div class="story">"#)?;
        feature.accept(self)?;
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
        self.table_header.clone_from(&scenario.table_header);
        self.list.close(&mut self.out)?;

        self.out.write_line(format!(
            "        <h3>{}: {}</h3>",
            escape_html(&scenario.keyword),
            escape_html(&scenario.name),
        ))?;
        if scenario.is_outline() {
            self.out.write_line(format!(
                "        <h4>{}</h4>",
                escape_html(&self.table_header.join(", ")),
            ))?;
        }
        self.out.write_line("          <ul>")?;
        scenario.accept(self)?;
        self.list.close(&mut self.out)?;
        self.out.write_line("          </ul>")?;
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
        _: &Step,
        _: Option<&StepMatch>,
    ) -> WriterResult<()> {
        Ok(())
    }

    fn step_skipped(
        &mut self,
        _: &Step,
        _: Option<&StepMatch>,
    ) -> WriterResult<()> {
        Ok(())
    }

    fn dump(&mut self) -> WriterResult<()> {
        write_closing(&mut self.out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feature::{Scenario, StepId, StepType},
        formatter::out::WritableString,
        steps::Steps,
    };

    fn step(id: usize, keyword: &str, text: &str) -> Step {
        Step {
            id: StepId(id),
            keyword: keyword.into(),
            ty: StepType::Given,
            continuation: keyword == "And",
            text: text.into(),
            line: id,
        }
    }

    fn feature(steps: Vec<Step>) -> Feature {
        Feature {
            keyword: "Feature".into(),
            header: "Eating\nAs a user\nI want to eat".into(),
            path: None,
            scenarios: vec![Scenario::Regular(RegularScenario {
                keyword: "Scenario".into(),
                name: "eat <some>".into(),
                line: 3,
                table_header: vec![],
                steps,
            })],
        }
    }

    fn formatter() -> Doc<WritableString> {
        let mut steps = Steps::<()>::new();
        steps.given(r"^I have (\d+) cucumbers$", |_, _| {});
        Doc::new(WritableString::default(), Rc::new(steps))
    }

    #[test]
    fn renders_document_with_arguments() {
        let feature = feature(vec![step(1, "Given", "I have 5 cucumbers")]);
        let mut doc = formatter();

        doc.visit_features(&[feature.clone()]).unwrap();
        doc.visit_feature(&feature).unwrap();
        doc.step_passed(&feature.scenarios[0].steps()[0], None).unwrap();
        doc.dump().unwrap();
        let html = doc.into_inner().0;

        assert!(html.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(html.contains("<title>Feature</title>"));
        assert!(html.contains("<h1>Eating</h1>"));
        assert!(html.contains("<p><em>As a user<br />\nI want to eat\n"));
        assert!(html.contains("<h3>Scenario: eat &lt;some&gt;</h3>"));
        assert!(html.contains(
            r#"<li id="step-1">Given I have <span>5</span> cucumbers</li>"#,
        ));
        assert!(html.contains("stepPassed(1)</script>"));
        assert!(html.ends_with("  </body>\n</html>\n"));
    }

    #[test]
    fn nests_continuation_steps_once() {
        let feature = feature(vec![
            step(1, "Given", "one"),
            step(2, "And", "two"),
            step(3, "And", "three"),
            step(4, "When", "four"),
        ]);
        let mut doc = formatter();

        doc.visit_feature(&feature).unwrap();
        let html = doc.into_inner().0;

        let open = html.find("            <ul>").unwrap();
        let close = html.find("            </ul>").unwrap();
        assert_eq!(html.matches("            <ul>").count(), 1);
        assert_eq!(html.matches("            </ul>").count(), 1);
        assert!(html.find("step-1").unwrap() < open);
        assert!(open < html.find("step-2").unwrap());
        assert!(html.find("step-3").unwrap() < close);
        assert!(close < html.find("step-4").unwrap());
    }

    #[test]
    fn closes_sublist_at_end_of_scenario() {
        let feature =
            feature(vec![step(1, "Given", "one"), step(2, "And", "two")]);
        let mut doc = formatter();

        doc.visit_feature(&feature).unwrap();
        let html = doc.into_inner().0;

        assert_eq!(
            html.matches("            <ul>").count(),
            html.matches("            </ul>").count(),
        );
    }

    #[test]
    fn failures_are_recorded_and_escaped() {
        let st = step(7, "Then", "it breaks");
        let mut doc = formatter();
        let error = StepFailure::new("expected \"1\", got </b>")
            .with_backtrace(["at steps.rs:10:5"]);

        doc.step_failed(&st, None, &error).unwrap();
        doc.step_pending(&st, None).unwrap();
        doc.step_skipped(&st, None).unwrap();

        assert_eq!(doc.errors(), &[error]);
        assert_eq!(
            doc.into_inner().0,
            "    <script type=\"text/javascript\">stepFailed(7, \
             \"expected \\\"1\\\", got <\\/b>\", \"at steps.rs:10:5\")\
             </script>\n",
        );
    }
}
