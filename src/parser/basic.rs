// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Default [`Parser`] implementation.

use std::{
    cell::Cell,
    path::{Path, PathBuf},
    sync::Arc,
};

use derive_more::{Display, Error as StdError};
use lazy_regex::regex;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Error, Parser, Result};
use crate::{
    feature::{Feature, RegularScenario, RowScenario, Scenario, Step, StepId},
    language::Language,
};

/// Error of [`Scenario Outline`][1] expansion encountering an unknown
/// placeholder.
///
/// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
#[derive(Clone, Debug, Display, StdError)]
#[display("Failed to resolve <{name}> in `{scenario}` at {}:{line}", path.display())]
pub struct ExpandExamplesError {
    /// Name of the unknown placeholder.
    #[error(not(source))]
    pub name: String,

    /// Name of the outline template.
    pub scenario: String,

    /// Line of the step containing the placeholder.
    pub line: usize,

    /// Path to the `.feature` file.
    pub path: PathBuf,
}

/// Default [`Parser`], reading [Gherkin] files with the [`gherkin`] crate.
///
/// Step identifiers are drawn from a counter shared by every file parsed
/// with the same [`Basic`] instance, so they're unique within a run.
///
/// [Gherkin]: https://cucumber.io/docs/gherkin/reference
#[derive(Debug)]
pub struct Basic {
    language: Language,
    next_id: Cell<usize>,
}

impl Default for Basic {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl Basic {
    /// Creates a new [`Basic`] parser of files in the given `language`.
    #[must_use]
    pub const fn new(language: Language) -> Self {
        Self {
            language,
            next_id: Cell::new(1),
        }
    }

    /// [`Language`] the parsed files are written in.
    #[must_use]
    pub const fn language(&self) -> &Language {
        &self.language
    }

    fn next_id(&self) -> StepId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        StepId(id)
    }

    /// Converts the given `steps`, detecting continuation keywords and
    /// substituting placeholders with `row` values, if any.
    fn convert_steps<'s>(
        &self,
        steps: impl IntoIterator<Item = &'s gherkin::Step>,
        row: Option<(&[String], &[String])>,
        scenario: &str,
        path: &Path,
    ) -> Result<Vec<Step>> {
        let mut group: Option<(gherkin::StepType, String)> = None;
        steps
            .into_iter()
            .map(|step| -> Result<Step> {
                let keyword = step.keyword.trim().to_owned();
                let continuation = match &group {
                    _ if keyword == "*" => group.is_some(),
                    Some((ty, opener)) if *ty == step.ty => *opener != keyword,
                    _ => false,
                };
                if !continuation && keyword != "*" {
                    group = Some((step.ty, keyword.clone()));
                }

                let text = match row {
                    Some((header, values)) => substitute(&step.value, header, values)
                        .map_err(|name| ExpandExamplesError {
                            name,
                            scenario: scenario.to_owned(),
                            line: step.position.line,
                            path: path.to_path_buf(),
                        })?,
                    None => step.value.clone(),
                };

                Ok(Step {
                    id: self.next_id(),
                    keyword,
                    ty: step.ty,
                    continuation,
                    text,
                    line: step.position.line,
                })
            })
            .collect()
    }

    /// Converts the given `scenario`, expanding outline examples into rows
    /// following the template.
    fn convert_scenario(
        &self,
        background: &[gherkin::Step],
        scenario: &gherkin::Scenario,
        path: &Path,
    ) -> Result<Vec<Scenario>> {
        let all_steps = || background.iter().chain(&scenario.steps);
        let tables = scenario
            .examples
            .iter()
            .filter_map(|ex| {
                let table = ex.table.as_ref()?;
                let (header, rows) = table.rows.split_first()?;
                Some((header, rows, table.position.line))
            })
            .collect::<Vec<_>>();

        let template = RegularScenario {
            keyword: scenario.keyword.trim().to_owned(),
            name: scenario.name.clone(),
            line: scenario.position.line,
            table_header: tables
                .first()
                .map(|(header, ..)| header.to_vec())
                .unwrap_or_default(),
            steps: self.convert_steps(all_steps(), None, &scenario.name, path)?,
        };

        let mut scenarios = vec![Scenario::Regular(template)];
        for (header, rows, line) in tables {
            for (n, values) in rows.iter().enumerate() {
                let steps = self.convert_steps(
                    all_steps(),
                    Some((header.as_slice(), values.as_slice())),
                    &scenario.name,
                    path,
                )?;
                scenarios.push(Scenario::Row(RowScenario {
                    keyword: scenario.keyword.trim().to_owned(),
                    name: scenario.name.clone(),
                    line: line + n + 1,
                    values: values.clone(),
                    steps,
                }));
            }
        }
        Ok(scenarios)
    }

    /// Converts a parsed [`gherkin::Feature`] into a [`Feature`].
    ///
    /// # Errors
    ///
    /// If an outline refers to an unknown placeholder.
    pub fn convert(
        &self,
        feature: &gherkin::Feature,
        path: &Path,
    ) -> Result<Feature> {
        let background = feature
            .background
            .as_ref()
            .map(|b| b.steps.clone())
            .unwrap_or_default();

        let mut scenarios = Vec::new();
        for scenario in &feature.scenarios {
            scenarios.extend(self.convert_scenario(&background, scenario, path)?);
        }
        for rule in &feature.rules {
            let background = background
                .iter()
                .chain(rule.background.iter().flat_map(|b| &b.steps))
                .cloned()
                .collect::<Vec<_>>();
            for scenario in &rule.scenarios {
                scenarios
                    .extend(self.convert_scenario(&background, scenario, path)?);
            }
        }

        let header = std::iter::once(feature.name.trim())
            .chain(
                feature
                    .description
                    .iter()
                    .flat_map(|d| d.lines())
                    .map(str::trim)
                    .filter(|l| !l.is_empty()),
            )
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Feature {
            keyword: feature.keyword.trim().to_owned(),
            header,
            path: Some(path.to_path_buf()),
            scenarios,
        })
    }
}

/// Replaces `<placeholder>`s in the given `text` with the `values` of the
/// matching `header` columns.
///
/// # Errors
///
/// With the name of the first unknown placeholder.
fn substitute(
    text: &str,
    header: &[String],
    values: &[String],
) -> std::result::Result<String, String> {
    /// [`Regex`] matching placeholders of outline examples.
    static TEMPLATE_REGEX: &Lazy<Regex> = regex!(r"<([^>\s]+)>");

    let mut unknown = None;
    let replaced = TEMPLATE_REGEX.replace_all(text, |cap: &regex::Captures<'_>| {
        let name = &cap[1];
        header
            .iter()
            .zip(values)
            .find_map(|(k, v)| (k == name).then_some(v.as_str()))
            .unwrap_or_else(|| {
                if unknown.is_none() {
                    unknown = Some(name.to_owned());
                }
                ""
            })
            .to_owned()
    });

    unknown.map_or_else(|| Ok(replaced.into_owned()), Err)
}

impl Parser for Basic {
    fn parse(&self, path: &Path) -> Result<Feature> {
        tracing::debug!(path = %path.display(), "parsing feature file");

        let env = gherkin::GherkinEnv::new(self.language.tag()).map_err(|e| {
            Error::Language {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        let feature = gherkin::Feature::parse_path(path, env).map_err(Arc::new)?;
        self.convert(&feature, path)
    }
}
