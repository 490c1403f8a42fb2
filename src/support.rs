// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Support code required before running features.
//!
//! Step definitions are compiled into the runner, so loading support code
//! means validating that every support file the run depends on is present.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use itertools::Itertools as _;

use crate::{
    error::{LoadError, LoadResult},
    locator,
};

/// Loader of a single support file.
pub trait SupportLoader {
    /// Loads the support file at the given `path`.
    ///
    /// # Errors
    ///
    /// If the file cannot be loaded, annotated with its `path`.
    fn load(&mut self, path: &Path) -> LoadResult<()>;
}

/// [`SupportLoader`] checking that support files exist and are readable.
#[derive(Clone, Copy, Debug, Default)]
pub struct Presence;

impl SupportLoader for Presence {
    fn load(&mut self, path: &Path) -> LoadResult<()> {
        let fail = |e| LoadError::new(path.display().to_string(), e);

        if fs::metadata(path).map_err(fail)?.is_dir() {
            return Err(fail(io::Error::new(
                io::ErrorKind::InvalidInput,
                "is a directory",
            )));
        }
        drop(File::open(path).map_err(fail)?);
        Ok(())
    }
}

/// Expands the given `requires` into support files: directories to the
/// `*.rs` files beneath them, files as is. Deduplicated, in input order.
#[must_use]
pub fn support_files<P: AsRef<Path>>(requires: &[P]) -> Vec<PathBuf> {
    requires
        .iter()
        .map(|p| PathBuf::from(locator::normalize(&p.as_ref().to_string_lossy())))
        .flat_map(|p| {
            if p.is_dir() {
                locator::walk(&p, "*.rs")
            } else {
                vec![p]
            }
        })
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn expands_directories_to_sources() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("steps")).unwrap();
        fs::write(dir.path().join("steps/eat.rs"), "").unwrap();
        fs::write(dir.path().join("env.rs"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = support_files(&[dir.path().to_path_buf(), dir.path().join("env.rs")]);

        let names = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect_vec();
        assert_eq!(names, ["env.rs", "eat.rs"]);
    }

    #[test]
    fn missing_file_names_the_file() {
        let err = Presence.load(Path::new("support/missing.rs")).unwrap_err();

        assert_eq!(err.path, "support/missing.rs");
        assert!(err.to_string().ends_with("\nFailed to load support/missing.rs"));
    }

    #[test]
    fn existing_file_loads() {
        let file = tempfile::NamedTempFile::new().unwrap();

        Presence.load(file.path()).unwrap();
    }
}
