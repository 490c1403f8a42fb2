// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Discovery of files to run.

use std::path::{Path, PathBuf};

use itertools::Itertools as _;

/// Normalizes the given `path` to forward slashes.
#[must_use]
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Lists the files matching the given glob `pattern` beneath the given
/// `dir`, in lexicographical order.
pub(crate) fn walk(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    match globwalk::GlobWalkerBuilder::new(dir, pattern)
        .case_insensitive(true)
        .build()
    {
        Ok(walker) => walker
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| PathBuf::from(normalize(&entry.path().to_string_lossy())))
            .sorted()
            .collect(),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "failed to walk directory: {e}");
            Vec::new()
        }
    }
}

/// Expands the given `paths` into the list of feature files to run.
///
/// Directories expand recursively to the `*.feature` files beneath them,
/// while file paths pass through as is, even if they don't exist. Results
/// are concatenated in input order, deduplicated keeping the first
/// occurrence, and any path containing one of the `excludes` is dropped.
#[must_use]
pub fn discover<P, E>(paths: &[P], excludes: &[E]) -> Vec<PathBuf>
where
    P: AsRef<str>,
    E: AsRef<str>,
{
    let files = paths
        .iter()
        .map(|p| normalize(p.as_ref()))
        .flat_map(|p| {
            let path = PathBuf::from(&p);
            if path.is_dir() {
                walk(&path, "*.feature")
            } else {
                vec![path]
            }
        })
        .unique()
        .filter(|file| {
            let file = file.to_string_lossy();
            let excluded = excludes.iter().find(|e| file.contains(e.as_ref()));
            if let Some(e) = excluded {
                tracing::debug!(%file, exclude = e.as_ref(), "excluded");
            }
            excluded.is_none()
        })
        .collect_vec();

    tracing::debug!(count = files.len(), "discovered feature files");
    files
}

/// Maps the given `files` to their containing directories, deduplicated.
/// Directories map to themselves.
#[must_use]
pub fn derive_directories(files: &[PathBuf]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|f| {
            if f.is_dir() {
                f.clone()
            } else {
                f.parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
            }
        })
        .unique()
        .collect()
}
