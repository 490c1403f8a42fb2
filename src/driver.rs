// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level run pipeline.
//!
//! ```text
//! args ─► Config ─► Language ─► formatters ─► feature files ─► support
//!      ─► parse ─► line filter ─► Executor ─► exit status
//! ```

use std::{
    fmt,
    fs::File,
    io::{self, BufWriter},
    process::ExitCode,
    rc::Rc,
};

use itertools::Itertools as _;

use crate::{
    broadcaster::{FormatterBroadcaster, OutputBroadcaster},
    config::{self, Config, ConfigResolver, Destination},
    error::{ConfigError, CucumberError, Result},
    executor::{Executor, RunSummary},
    formatter::{out::Styles, Doc, Format, Html, Pretty, Profile, Progress},
    language::Language,
    locator,
    parser::{self, Basic, Parser as _},
    steps::{StepMatcher, Steps},
    support::{self, Presence, SupportLoader},
    Formatter,
};

/// Factory of console outputs, invoked once per console destination.
pub type ConsoleFactory = Box<dyn Fn() -> Box<dyn io::Write>>;

/// Runs features against step definitions, as configured by command-line
/// arguments.
pub struct Driver<W> {
    steps: Rc<Steps<W>>,
    resolver: ConfigResolver,
    loader: Box<dyn SupportLoader>,
    console: ConsoleFactory,
    styled_console: bool,
}

impl<W> fmt::Debug for Driver<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("steps", &self.steps)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl<W: Default + 'static> Driver<W> {
    /// Creates a new [`Driver`] of the given `steps`, reading profiles from
    /// the working directory, checking support files for presence and
    /// writing console reports to [`io::stdout()`].
    #[must_use]
    pub fn new(steps: Steps<W>) -> Self {
        Self {
            steps: Rc::new(steps),
            resolver: ConfigResolver::new(),
            loader: Box::new(Presence),
            console: Box::new(|| Box::new(io::stdout())),
            styled_console: true,
        }
    }

    /// Replaces the [`ConfigResolver`].
    #[must_use]
    pub fn resolver(mut self, resolver: ConfigResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the [`SupportLoader`].
    #[must_use]
    pub fn loader(mut self, loader: impl SupportLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Writes console reports into outputs made by the given `factory`
    /// instead, never styled.
    #[must_use]
    pub fn console(
        mut self,
        factory: impl Fn() -> Box<dyn io::Write> + 'static,
    ) -> Self {
        self.console = Box::new(factory);
        self.styled_console = false;
        self
    }

    /// Runs the pipeline with the given command-line `args` (without the
    /// binary name).
    ///
    /// # Errors
    ///
    /// If configuration, language, support loading, parsing or report
    /// writing fails. Failed steps are not errors, see
    /// [`RunSummary::has_failed()`].
    pub fn run<S: AsRef<str>>(&mut self, args: &[S]) -> Result<RunSummary> {
        let config = self.resolver.resolve(args)?;
        tracing::debug!(?config, "resolved configuration");

        let language = Language::load(&config.language)?;
        let mut formatters = self.formatters(&config)?;

        let files = locator::discover(&config.paths, &config.excludes);
        let support = match &config.require {
            Some(require) => support::support_files(require),
            None => support::support_files(&locator::derive_directories(&files)),
        };
        for path in &support {
            tracing::debug!(path = %path.display(), "loading support file");
            self.loader.load(path)?;
        }

        let parser = Basic::new(language);
        let mut features = files
            .iter()
            .map(|f| parser.parse(f))
            .collect::<parser::Result<Vec<_>>>()?;

        if let Some(line) = config.line {
            if features.len() > 1 {
                return Err(ConfigError::LineFilterAmbiguous {
                    features: features.len(),
                }
                .into());
            }
            for feature in &mut features {
                feature.retain_scenario_at(line);
            }
        }

        let summary = Executor::new(Rc::clone(&self.steps))
            .dry_run(config.dry_run)
            .visit_features(&features, &mut formatters)?;
        Ok(summary)
    }

    /// Runs the pipeline like [`Driver::run()`], reporting errors to
    /// stderr, and returns the process exit status: `0` on success, help or
    /// version, `1` on failed steps or any error.
    pub fn status<S: AsRef<str>>(&mut self, args: &[S]) -> u8 {
        match self.run(args) {
            Ok(summary) => u8::from(summary.has_failed()),
            Err(CucumberError::Config(ConfigError::Cli(e))) if !e.use_stderr() => {
                _ = e.print();
                0
            }
            Err(CucumberError::Config(e)) if e.is_usage() => {
                eprintln!("{e}");
                eprintln!("{}", config::command().render_help());
                1
            }
            Err(e) => {
                eprintln!("{e}");
                1
            }
        }
    }

    /// Runs the pipeline like [`Driver::status()`], as a process
    /// [`ExitCode`].
    pub fn execute<S: AsRef<str>>(&mut self, args: &[S]) -> ExitCode {
        ExitCode::from(self.status(args))
    }

    /// Builds one formatter per selected [`Format`], each writing into its
    /// own [`OutputBroadcaster`].
    fn formatters(&self, config: &Config) -> Result<FormatterBroadcaster> {
        let matcher: Rc<dyn StepMatcher> = self.steps.clone();

        config
            .formats
            .iter()
            .map(|(format, destinations)| -> Result<Box<dyn Formatter>> {
                let out = self.outputs(destinations)?;
                let styles = if self.styled_console {
                    Styles::for_destinations(destinations)
                } else {
                    Styles::new()
                };
                tracing::debug!(
                    %format,
                    destinations = %destinations.iter().join(", "),
                    "registered formatter",
                );

                let formatter: Box<dyn Formatter> = match format {
                    Format::Pretty => Box::new(Pretty::new(
                        out,
                        Rc::clone(&matcher),
                        styles,
                        config.source,
                    )),
                    Format::Profile => Box::new(Profile::new(out, styles)),
                    Format::Progress => Box::new(Progress::new(out, styles)),
                    Format::Html => Box::new(Html::new(out, Rc::clone(&matcher))),
                    Format::Doc => Box::new(Doc::new(out, Rc::clone(&matcher))),
                };
                Ok(formatter)
            })
            .collect()
    }

    /// Opens every destination, truncating files.
    fn outputs(&self, destinations: &[Destination]) -> Result<OutputBroadcaster> {
        destinations
            .iter()
            .map(|dest| -> Result<Box<dyn io::Write>> {
                Ok(match dest {
                    Destination::Console => (self.console)(),
                    Destination::File(path) => {
                        let file = File::create(path).map_err(|source| {
                            CucumberError::Output {
                                path: path.display().to_string(),
                                source,
                            }
                        })?;
                        Box::new(BufWriter::new(file))
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, fs};

    use super::*;
    use crate::formatter::out::WritableString;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<WritableString>>);

    impl io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn driver(dir: &tempfile::TempDir) -> (Driver<()>, Shared) {
        let console = Shared::default();
        let out = console.clone();
        let mut steps = Steps::<()>::new();
        steps.given("^it works$", |_, _| {});
        let driver = Driver::new(steps)
            .resolver(ConfigResolver::new().profile_file(dir.path().join("cucumber.yml")))
            .console(move || Box::new(out.clone()));
        (driver, console)
    }

    #[test]
    fn runs_discovered_features() {
        let dir = tempfile::tempdir().unwrap();
        let feature = dir.path().join("works.feature");
        fs::write(&feature, "Feature: Works\n\n  Scenario: it\n    Given it works\n")
            .unwrap();
        let path = feature.to_string_lossy().into_owned();
        let (mut driver, console) = driver(&dir);

        let summary = driver
            .run(&["--format", "progress", path.as_str()])
            .unwrap();

        assert_eq!(summary.passed, 1);
        assert!(console.0.borrow().0.starts_with('.'));
    }

    #[test]
    fn line_filter_with_several_features_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b"] {
            fs::write(
                dir.path().join(format!("{name}.feature")),
                "Feature: F\n\n  Scenario: s\n    Given it works\n",
            )
            .unwrap();
        }
        let path = dir.path().to_string_lossy().into_owned();
        let (mut driver, _) = driver(&dir);

        let err = driver.run(&["--line", "3", path.as_str()]).unwrap_err();

        assert!(matches!(
            err,
            CucumberError::Config(ConfigError::LineFilterAmbiguous { features: 2 }),
        ));
    }

    #[test]
    fn unsupported_language_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let (mut driver, console) = driver(&dir);

        let err = driver.run(&["--language", "klingon"]).unwrap_err();

        assert!(matches!(err, CucumberError::UnsupportedLanguage { .. }));
        assert!(console.0.borrow().0.is_empty());
    }

    #[test]
    fn invalid_format_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (mut driver, _) = driver(&dir);

        assert_eq!(driver.status(&["--format", "fancy"]), 1);
        assert_eq!(driver.status(&["--version"]), 0);
    }

    #[test]
    fn unopenable_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir
            .path()
            .join("no/such/dir/r.html")
            .to_string_lossy()
            .into_owned();
        let (mut driver, console) = driver(&dir);

        let err = driver
            .run(&["-f", "html", "-o", report.as_str()])
            .unwrap_err();

        assert!(
            matches!(&err, CucumberError::Output { path, .. } if *path == report),
            "{err}",
        );
        assert!(err.to_string().contains("r.html"));
        assert!(console.0.borrow().0.is_empty());
        assert_eq!(driver.status(&["-f", "html", "-o", report.as_str()]), 1);
    }

    #[test]
    fn missing_required_support_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut driver, _) = driver(&dir);
        let missing = dir.path().join("env.rs");
        let path = missing.to_string_lossy().into_owned();

        let err = driver.run(&["--require", path.as_str()]).unwrap_err();

        assert!(err.is_load_error());
        assert!(err.to_string().ends_with(&format!("Failed to load {}", missing.display())));
    }
}
