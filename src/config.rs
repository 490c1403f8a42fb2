// Copyright (c) 2018-2023  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Run configuration, resolved from command-line tokens and profiles.
//!
//! Command-line tokens are folded into a single [`Config`] in the order they
//! were given, so later tokens override earlier ones. A `--profile NAME`
//! token folds the tokens of the named profile in place, before the tokens
//! following it. Profiles are read from a [`PROFILE_FILE`] YAML mapping of
//! profile names to command-line strings.

use std::{fs, io, path::PathBuf};

use clap::{value_parser, Arg, ArgAction, Command};
use derive_more::Display;
use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;
use smart_default::SmartDefault;

use crate::{
    error::{ConfigError, ConfigResult},
    formatter::Format,
};

/// Default profile file, looked up in the working directory.
pub const PROFILE_FILE: &str = "cucumber.yml";

/// Profile used when no command-line tokens are given.
pub const DEFAULT_PROFILE: &str = "default";

/// Place a report is written to.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Destination {
    /// Standard output.
    #[display("STDOUT")]
    Console,

    /// File truncated when the run starts.
    #[display("{}", _0.display())]
    File(PathBuf),
}

/// Resolved configuration of a single run.
#[derive(Clone, Debug, Eq, PartialEq, SmartDefault)]
pub struct Config {
    /// Support files or directories to load. [`None`] means the directories
    /// of the discovered feature files.
    pub require: Option<Vec<String>>,

    /// Language tag the feature files are written in.
    #[default(_code = "\"en\".to_owned()")]
    pub language: String,

    /// Whether formatters are invoked without running any step.
    pub dry_run: bool,

    /// Whether step definition locations are shown along steps.
    #[default(true)]
    pub source: bool,

    /// Destinations of every selected [`Format`], in selection order.
    pub formats: LinkedHashMap<Format, Vec<Destination>>,

    /// Substrings excluding feature files containing them.
    pub excludes: Vec<String>,

    /// Line of the single scenario to run.
    pub line: Option<usize>,

    /// Last profile folded into this [`Config`].
    pub profile: Option<String>,

    /// Feature files or directories to run.
    pub paths: Vec<String>,
}

impl Config {
    /// Destinations of the given `format`, if it's selected.
    #[must_use]
    pub fn destinations(&self, format: Format) -> Option<&[Destination]> {
        self.formats.get(&format).map(Vec::as_slice)
    }
}

/// Builds the command-line grammar.
#[must_use]
pub fn command() -> Command {
    Command::new("cucumber")
        .version(env!("CARGO_PKG_VERSION"))
        .override_usage("cucumber [options] FILES|DIRS")
        .arg(
            Arg::new("require")
                .short('r')
                .long("require")
                .value_name("LIBRARY|DIR")
                .action(ArgAction::Append)
                .help("Require files before executing the features.")
                .long_help(
                    "Require files before executing the features. If this \
                     option is not specified, all support files that are \
                     siblings or below the features will be required.",
                ),
        )
        .arg(
            Arg::new("line")
                .short('l')
                .long("line")
                .value_name("LINE")
                .value_parser(value_parser!(usize))
                .action(ArgAction::Append)
                .help("Only execute the scenario at the given line"),
        )
        .arg(
            Arg::new("language")
                .short('a')
                .long("language")
                .value_name("LANG")
                .action(ArgAction::Append)
                .help("Specify language for features (Default: en)"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .action(ArgAction::Append)
                .help(format!(
                    "How to format features (Default: {}). Available formats: {}",
                    Format::default(),
                    Format::ALL.iter().join(", "),
                )),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .value_name("PATTERN")
                .action(ArgAction::Append)
                .help("Don't run features matching a pattern"),
        )
        .arg(
            Arg::new("profile")
                .short('p')
                .long("profile")
                .value_name("PROFILE")
                .action(ArgAction::Append)
                .help(format!("Pull commandline arguments from {PROFILE_FILE}")),
        )
        .arg(
            Arg::new("dry-run")
                .short('d')
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Invokes formatters without executing the steps"),
        )
        .arg(
            Arg::new("no-source")
                .short('n')
                .long("no-source")
                .action(ArgAction::SetTrue)
                .help(
                    "Don't show the file and line of the step definition \
                     with the steps",
                ),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Write output to a file instead of STDOUT"),
        )
        .arg(
            Arg::new("paths")
                .value_name("FILES|DIRS")
                .num_args(1..)
                .action(ArgAction::Append),
        )
}

/// Single value-carrying command-line token.
#[derive(Clone, Debug)]
enum Token {
    Require(String),
    Line(usize),
    Language(String),
    Format(String),
    Exclude(String),
    Profile(String),
    Out(String),
    Path(String),
}

/// Accumulator of a single resolution.
#[derive(Debug, Default)]
struct Fold {
    config: Config,
    active: Format,
    profiles: Vec<String>,
}

/// Loaded profile file.
#[derive(Debug)]
struct Profiles {
    file: String,
    contents: String,
    mapping: serde_yaml::Value,
}

/// Folds command-line tokens and profiles into a [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigResolver {
    profile_file: PathBuf,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self {
            profile_file: PathBuf::from(PROFILE_FILE),
        }
    }
}

impl ConfigResolver {
    /// Creates a new [`ConfigResolver`] reading profiles from
    /// [`PROFILE_FILE`] in the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads profiles from the given `path` instead.
    #[must_use]
    pub fn profile_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.profile_file = path.into();
        self
    }

    /// Resolves the given command-line `args` into a [`Config`].
    ///
    /// Empty `args` fall back to the [`DEFAULT_PROFILE`], and to an
    /// all-defaults [`Config`] if there is no such profile. A [`Format`] is
    /// always selected: [`Format::Pretty`] writing to the console, unless
    /// another one is requested.
    ///
    /// # Errors
    ///
    /// If the `args` don't match the grammar, name an unknown [`Format`], or
    /// refer to a malformed profile.
    pub fn resolve<S: AsRef<str>>(&self, args: &[S]) -> ConfigResult<Config> {
        let mut fold = Fold::default();
        if args.is_empty() {
            self.fold_profile(&mut fold, DEFAULT_PROFILE)?;
        } else {
            let args = args.iter().map(|a| a.as_ref().to_owned()).collect_vec();
            self.fold_args(&mut fold, &args)?;
        }
        Ok(finish(fold))
    }

    /// Resolves the tokens of the given `profile` alone into a [`Config`].
    ///
    /// # Errors
    ///
    /// If the profile is missing, isn't a string, or its tokens are invalid.
    pub fn resolve_profile(&self, profile: &str) -> ConfigResult<Config> {
        let mut fold = Fold::default();
        self.fold_profile(&mut fold, profile)?;
        Ok(finish(fold))
    }

    fn fold_args(&self, fold: &mut Fold, args: &[String]) -> ConfigResult<()> {
        let matches = command()
            .no_binary_name(true)
            .try_get_matches_from(args)
            .map_err(ConfigError::Cli)?;

        let strings = |id: &str, token: fn(String) -> Token| {
            matches
                .indices_of(id)
                .into_iter()
                .flatten()
                .zip(matches.get_many::<String>(id).into_iter().flatten())
                .map(move |(i, v)| (i, token(v.clone())))
                .collect_vec()
        };
        let lines = matches
            .indices_of("line")
            .into_iter()
            .flatten()
            .zip(matches.get_many::<usize>("line").into_iter().flatten())
            .map(|(i, l)| (i, Token::Line(*l)));

        let tokens = strings("require", Token::Require)
            .into_iter()
            .chain(strings("language", Token::Language))
            .chain(strings("format", Token::Format))
            .chain(strings("exclude", Token::Exclude))
            .chain(strings("profile", Token::Profile))
            .chain(strings("out", Token::Out))
            .chain(strings("paths", Token::Path))
            .chain(lines)
            .sorted_by_key(|(i, _)| *i)
            .map(|(_, t)| t);

        for token in tokens {
            self.apply(fold, token)?;
        }

        if matches.get_flag("dry-run") {
            fold.config.dry_run = true;
        }
        if matches.get_flag("no-source") {
            fold.config.source = false;
        }
        Ok(())
    }

    fn apply(&self, fold: &mut Fold, token: Token) -> ConfigResult<()> {
        tracing::debug!(?token, "folding command-line token");

        let config = &mut fold.config;
        match token {
            Token::Require(path) => {
                config.require.get_or_insert_with(Vec::new).push(path);
            }
            Token::Line(line) => config.line = Some(line),
            Token::Language(lang) => config.language = lang,
            Token::Format(name) => {
                let format = name.parse::<Format>()?;
                config
                    .formats
                    .entry(format)
                    .or_insert_with(Vec::new)
                    .push(Destination::Console);
                fold.active = format;
            }
            Token::Exclude(pattern) => config.excludes.push(pattern),
            Token::Profile(name) => self.fold_profile(fold, &name)?,
            Token::Out(file) => {
                let dests =
                    config.formats.entry(fold.active).or_insert_with(Vec::new);
                let dest = Destination::File(file.into());
                if dests.last() == Some(&Destination::Console) {
                    if let Some(last) = dests.last_mut() {
                        *last = dest;
                    }
                } else {
                    dests.push(dest);
                }
            }
            Token::Path(path) => config.paths.push(path),
        }
        Ok(())
    }

    fn fold_profile(&self, fold: &mut Fold, name: &str) -> ConfigResult<()> {
        let Some(profiles) = self.load_profiles()? else {
            tracing::debug!(
                file = %self.profile_file.display(),
                "no profile file, skipping profile `{name}`",
            );
            return Ok(());
        };

        let value = profiles.mapping.get(name);
        let Some(args) = value.and_then(serde_yaml::Value::as_str) else {
            let value = value.cloned().unwrap_or(serde_yaml::Value::Null);
            return Err(ConfigError::ProfileNotString {
                profile: name.to_owned(),
                value: serde_yaml::to_string(&value)
                    .map_or_else(|e| e.to_string(), |s| s.trim_end().to_owned()),
                file: profiles.file,
                contents: profiles.contents,
            });
        };

        if fold.profiles.iter().any(|p| p == name) {
            return Err(ConfigError::profile_cycle(name));
        }
        tracing::info!(profile = name, args, "using profile");

        fold.profiles.push(name.to_owned());
        fold.config.profile = Some(name.to_owned());
        let args = args.split_whitespace().map(str::to_owned).collect_vec();
        let result = if args.is_empty() {
            Ok(())
        } else {
            self.fold_args(fold, &args)
        };
        _ = fold.profiles.pop();
        result
    }

    fn load_profiles(&self) -> ConfigResult<Option<Profiles>> {
        let file = self.profile_file.display().to_string();
        let failure = |reason: String| ConfigError::ProfileFile {
            file: file.clone(),
            reason,
        };

        let contents = match fs::read_to_string(&self.profile_file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(failure(e.to_string())),
        };
        let mapping = serde_yaml::from_str::<serde_yaml::Value>(&contents)
            .map_err(|e| failure(e.to_string()))?;
        if !mapping.is_mapping() && !mapping.is_null() {
            return Err(failure("expected a mapping of profile names".into()));
        }

        Ok(Some(Profiles {
            file,
            contents,
            mapping,
        }))
    }
}

/// Installs the default [`Format`], unless any was selected.
fn finish(fold: Fold) -> Config {
    let mut config = fold.config;
    if config.formats.is_empty() {
        _ = config
            .formats
            .insert(Format::default(), vec![Destination::Console]);
    }
    config
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use tempfile::NamedTempFile;

    use super::*;

    fn resolver(profiles: &str) -> (ConfigResolver, NamedTempFile) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(profiles.as_bytes()).unwrap();
        (ConfigResolver::new().profile_file(file.path()), file)
    }

    fn missing() -> ConfigResolver {
        ConfigResolver::new().profile_file("does/not/exist/cucumber.yml")
    }

    #[test]
    fn no_args_without_profiles_is_default() {
        let config = missing().resolve::<&str>(&[]).unwrap();

        assert_eq!(config.language, "en");
        assert!(config.source);
        assert!(!config.dry_run);
        assert!(config.excludes.is_empty());
        assert!(config.require.is_none());
        assert_eq!(
            config.formats.iter().collect_vec(),
            [(&Format::Pretty, &vec![Destination::Console])],
        );
    }

    #[test]
    fn out_replaces_console_destination() {
        let config = missing()
            .resolve(&["--format", "progress", "--out", "progress.txt"])
            .unwrap();

        assert_eq!(
            config.destinations(Format::Progress),
            Some([Destination::File("progress.txt".into())].as_slice()),
        );
        assert_eq!(config.destinations(Format::Pretty), None);
    }

    #[test]
    fn second_out_appends_destination() {
        let config = missing()
            .resolve(&["-f", "html", "-o", "a.html", "-o", "b.html"])
            .unwrap();

        assert_eq!(
            config.destinations(Format::Html),
            Some(
                [
                    Destination::File("a.html".into()),
                    Destination::File("b.html".into()),
                ]
                .as_slice(),
            ),
        );
    }

    #[test]
    fn out_without_format_applies_to_pretty() {
        let config = missing().resolve(&["--out", "pretty.txt"]).unwrap();

        assert_eq!(
            config.destinations(Format::Pretty),
            Some([Destination::File("pretty.txt".into())].as_slice()),
        );
    }

    #[test]
    fn format_without_out_is_console() {
        let config = missing()
            .resolve(&["--format", "pretty", "--format", "html", "--out", "r.html"])
            .unwrap();

        assert_eq!(
            config.formats.keys().copied().collect_vec(),
            [Format::Pretty, Format::Html],
        );
        assert_eq!(
            config.destinations(Format::Pretty),
            Some([Destination::Console].as_slice()),
        );
    }

    #[test]
    fn folds_options_and_paths() {
        let config = missing()
            .resolve(&[
                "-r", "steps", "--language", "fr", "--exclude", "slow", "-d",
                "-n", "-l", "12", "features/a.feature", "features/b",
            ])
            .unwrap();

        assert_eq!(config.require, Some(vec!["steps".to_owned()]));
        assert_eq!(config.language, "fr");
        assert_eq!(config.excludes, ["slow"]);
        assert!(config.dry_run);
        assert!(!config.source);
        assert_eq!(config.line, Some(12));
        assert_eq!(config.paths, ["features/a.feature", "features/b"]);
    }

    #[test]
    fn unknown_format_is_usage_error() {
        let err = missing().resolve(&["--format", "fancy"]).unwrap_err();

        assert!(err.is_usage());
        assert_eq!(err.invalid_format_name(), Some("fancy"));
    }

    #[test]
    fn unknown_option_is_usage_error() {
        let err = missing().resolve(&["--fancy"]).unwrap_err();

        assert!(matches!(err, ConfigError::Cli(_)));
        assert!(err.is_usage());
    }

    #[test]
    fn help_is_not_usage_error() {
        let err = missing().resolve(&["--help"]).unwrap_err();

        assert!(!err.is_usage());
    }

    #[test]
    fn profile_equals_direct_tokens() {
        let (resolver, _file) = resolver("ci: --format progress --dry-run\n");

        let from_profile = resolver.resolve(&["--profile", "ci"]).unwrap();
        let direct = resolver.resolve(&["--format", "progress", "--dry-run"]).unwrap();

        assert_eq!(from_profile.formats, direct.formats);
        assert_eq!(from_profile.dry_run, direct.dry_run);
        assert_eq!(from_profile.profile.as_deref(), Some("ci"));
        assert_eq!(resolver.resolve_profile("ci").unwrap().formats, direct.formats);
    }

    #[test]
    fn profile_is_folded_in_place() {
        let (resolver, _file) = resolver("fr: --language fr features/fr\n");

        let config = resolver
            .resolve(&["-a", "de", "-p", "fr", "-a", "it", "features/it"])
            .unwrap();

        assert_eq!(config.language, "it");
        assert_eq!(config.paths, ["features/fr", "features/it"]);
    }

    #[test]
    fn empty_args_use_default_profile() {
        let (resolver, _file) = resolver("default: --format doc\n");

        let config = resolver.resolve::<&str>(&[]).unwrap();

        assert_eq!(config.formats.keys().copied().collect_vec(), [Format::Doc]);
        assert_eq!(config.profile.as_deref(), Some("default"));
    }

    #[test]
    fn missing_default_profile_is_fatal() {
        let (resolver, _file) = resolver("ci: --dry-run\n");

        let err = resolver.resolve::<&str>(&[]).unwrap_err();

        assert!(err.is_profile_not_string());
        assert!(err.to_string().contains("null"));
    }

    #[test]
    fn non_string_profile_is_fatal() {
        let (resolver, _file) = resolver("ci:\n  - --format\n  - html\n");

        let err = resolver.resolve(&["-p", "ci"]).unwrap_err();

        assert!(err.is_profile_not_string());
        assert!(!err.is_usage());
        assert!(err.to_string().contains("- --format\n- html"));
    }

    #[test]
    fn missing_named_profile_is_fatal() {
        let (resolver, _file) = resolver("ci: --dry-run\n");

        let err = resolver.resolve(&["-p", "nightly"]).unwrap_err();

        assert!(err.is_profile_not_string());
        assert!(err.to_string().contains("got null"));
    }

    #[test]
    fn recursive_profile_is_detected() {
        let (resolver, _file) = resolver("a: -p b\nb: --dry-run -p a\n");

        let err = resolver.resolve(&["-p", "a"]).unwrap_err();

        assert_eq!(err.to_string(), "Profile `a` is included recursively");
    }
}
