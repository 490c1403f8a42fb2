// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Behavior-driven test runner pipeline.
//!
//! A run resolves its [`Config`] from command-line tokens and profiles,
//! discovers and parses [Gherkin] feature files, executes their steps
//! against registered [`Steps`], and reports to every selected
//! [`Formatter`] through a [`Broadcaster`].
//!
//! ```rust,no_run
//! use cucumber_pipeline::{pending, Driver, Steps};
//!
//! #[derive(Default)]
//! struct World {
//!     cucumbers: u32,
//! }
//!
//! let mut steps = Steps::<World>::new();
//! steps
//!     .given(r"^I have (\d+) cucumbers$", |w, args| {
//!         w.cucumbers = args[0].parse().unwrap();
//!     })
//!     .when(r"^I eat (\d+) cucumbers$", |w, args| {
//!         w.cucumbers -= args[0].parse::<u32>().unwrap();
//!     })
//!     .then("^I feel full$", |_, _| pending!());
//!
//! let args = ["--format", "pretty", "features/"];
//! std::process::exit(Driver::new(steps).status(&args).into());
//! ```
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

#![forbid(non_ascii_idents, unsafe_code)]
#![warn(missing_debug_implementations, missing_docs, trivial_casts)]

pub mod broadcaster;
pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod executor;
pub mod feature;
pub mod formatter;
pub mod language;
pub mod locator;
pub mod panic_trap;
pub mod parser;
pub mod steps;
pub mod support;

pub use gherkin;

#[doc(inline)]
pub use self::{
    broadcaster::{Broadcaster, FormatterBroadcaster, OutputBroadcaster},
    config::{Config, ConfigResolver, Destination},
    driver::Driver,
    error::{CucumberError, Result},
    event::{Outcome, StepFailure},
    executor::{Executor, RunSummary},
    feature::{Feature, RegularScenario, RowScenario, Scenario, Step},
    formatter::{Format, Formatter},
    language::Language,
    parser::Parser,
    steps::{StepMatch, StepMatcher, Steps},
    support::SupportLoader,
};

/// Marks the running step as pending, skipping the rest of its scenario.
///
/// ```rust
/// # use cucumber_pipeline::{pending, Steps};
/// let mut steps = Steps::<()>::new();
/// steps.then("^not implemented yet$", |_, _| pending!());
/// ```
#[macro_export]
macro_rules! pending {
    () => {
        ::std::panic::panic_any($crate::steps::Pending)
    };
}
