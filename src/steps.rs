// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Registry of step definitions, matched against [`Step`] text.

use std::{fmt, ops::Range, rc::Rc};

use regex::Regex;

use crate::feature::{Step, StepType};

/// Step implementation receiving the scenario world and the positional
/// arguments captured from the step text.
///
/// A panic inside it fails the step, and [`pending!`] marks it pending.
///
/// [`pending!`]: crate::pending
pub type StepFn<W> = Rc<dyn Fn(&mut W, &[String])>;

/// Payload of a panic raised by [`pending!`] to mark a step as pending.
///
/// [`pending!`]: crate::pending
#[derive(Clone, Copy, Debug)]
pub struct Pending;

/// Positional argument captured from a [`Step`] text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Argument {
    /// Captured value, empty if the group didn't participate in the match.
    pub value: String,

    /// Byte range of the value within [`Step::text`].
    pub range: Option<Range<usize>>,
}

/// Step definition resolved for a [`Step`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepMatch {
    /// Pattern of the matched definition.
    pub pattern: String,

    /// Positional arguments, in capture group order.
    pub args: Vec<Argument>,
}

impl StepMatch {
    /// Values of the positional arguments.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.args.iter().map(|a| a.value.clone()).collect()
    }
}

/// Resolves [`Step`]s to their definitions without running them.
///
/// Formatters receive this to render matched arguments lazily.
pub trait StepMatcher {
    /// Finds the definition matching the given `step`, if any.
    fn match_step(&self, step: &Step) -> Option<StepMatch>;
}

struct Definition<W> {
    regex: Regex,
    func: StepFn<W>,
}

/// Collection of step definitions, searched in registration order.
pub struct Steps<W> {
    given: Vec<Definition<W>>,
    when: Vec<Definition<W>>,
    then: Vec<Definition<W>>,
    any: Vec<Definition<W>>,
}

impl<W> Default for Steps<W> {
    fn default() -> Self {
        Self {
            given: Vec::new(),
            when: Vec::new(),
            then: Vec::new(),
            any: Vec::new(),
        }
    }
}

impl<W> fmt::Debug for Steps<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn patterns<W>(defs: &[Definition<W>]) -> Vec<&str> {
            defs.iter().map(|d| d.regex.as_str()).collect()
        }

        f.debug_struct("Steps")
            .field("given", &patterns(&self.given))
            .field("when", &patterns(&self.when))
            .field("then", &patterns(&self.then))
            .field("any", &patterns(&self.any))
            .finish()
    }
}

impl<W> Steps<W> {
    /// Creates an empty [`Steps`] collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &mut self,
        ty: Option<StepType>,
        pattern: &str,
        func: StepFn<W>,
    ) -> &mut Self {
        let regex = Regex::new(pattern).unwrap_or_else(|_| {
            panic!("`{pattern}` is not a valid regular expression")
        });
        let defs = match ty {
            Some(StepType::Given) => &mut self.given,
            Some(StepType::When) => &mut self.when,
            Some(StepType::Then) => &mut self.then,
            None => &mut self.any,
        };
        defs.push(Definition { regex, func });
        self
    }

    /// Registers a `Given` step definition.
    ///
    /// # Panics
    ///
    /// If the `pattern` is not a valid regular expression.
    pub fn given(
        &mut self,
        pattern: &str,
        func: impl Fn(&mut W, &[String]) + 'static,
    ) -> &mut Self {
        self.insert(Some(StepType::Given), pattern, Rc::new(func))
    }

    /// Registers a `When` step definition.
    ///
    /// # Panics
    ///
    /// If the `pattern` is not a valid regular expression.
    pub fn when(
        &mut self,
        pattern: &str,
        func: impl Fn(&mut W, &[String]) + 'static,
    ) -> &mut Self {
        self.insert(Some(StepType::When), pattern, Rc::new(func))
    }

    /// Registers a `Then` step definition.
    ///
    /// # Panics
    ///
    /// If the `pattern` is not a valid regular expression.
    pub fn then(
        &mut self,
        pattern: &str,
        func: impl Fn(&mut W, &[String]) + 'static,
    ) -> &mut Self {
        self.insert(Some(StepType::Then), pattern, Rc::new(func))
    }

    /// Registers a step definition matching steps of any type.
    ///
    /// # Panics
    ///
    /// If the `pattern` is not a valid regular expression.
    pub fn step(
        &mut self,
        pattern: &str,
        func: impl Fn(&mut W, &[String]) + 'static,
    ) -> &mut Self {
        self.insert(None, pattern, Rc::new(func))
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.given.len() + self.when.len() + self.then.len() + self.any.len()
    }

    /// Indicates whether no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves the given `step` into its [`StepMatch`] and implementation.
    ///
    /// Definitions of the step's own type are searched before type-agnostic
    /// ones.
    #[must_use]
    pub fn resolve(&self, step: &Step) -> Option<(StepMatch, StepFn<W>)> {
        let typed = match step.ty {
            StepType::Given => &self.given,
            StepType::When => &self.when,
            StepType::Then => &self.then,
        };

        typed.iter().chain(&self.any).find_map(|def| {
            let captures = def.regex.captures(&step.text)?;
            let args = captures
                .iter()
                .skip(1)
                .map(|m| Argument {
                    value: m.map(|m| m.as_str().to_owned()).unwrap_or_default(),
                    range: m.map(|m| m.range()),
                })
                .collect();
            let matched = StepMatch {
                pattern: def.regex.as_str().to_owned(),
                args,
            };
            Some((matched, Rc::clone(&def.func)))
        })
    }
}

impl<W> StepMatcher for Steps<W> {
    fn match_step(&self, step: &Step) -> Option<StepMatch> {
        self.resolve(step).map(|(m, _)| m)
    }
}
