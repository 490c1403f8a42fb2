// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for writing output.

use std::{borrow::Cow, io, str};

use console::Style;
use derive_more::{Deref, DerefMut, Display, From};

use crate::{config::Destination, error::WriterResult};

/// [`Style`]s for terminal output.
#[derive(Clone, Debug)]
pub struct Styles {
    /// [`Style`] for rendering passed steps.
    pub ok: Style,

    /// [`Style`] for rendering skipped steps.
    pub skipped: Style,

    /// [`Style`] for rendering pending steps.
    pub pending: Style,

    /// [`Style`] for rendering errors and failed steps.
    pub err: Style,

    /// [`Style`] for rendering source comments.
    pub comment: Style,

    /// [`Style`] for rendering __bold__.
    pub bold: Style,

    /// Indicates whether styling is applied at all.
    pub is_present: bool,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            ok: Style::new().green(),
            skipped: Style::new().cyan(),
            pending: Style::new().yellow(),
            err: Style::new().red(),
            comment: Style::new().black().bright(),
            bold: Style::new().bold(),
            is_present: false,
        }
    }
}

macro_rules! styled {
    ($($(#[$attr:meta])* $name:ident),* $(,)?) => {$(
        $(#[$attr])*
        #[must_use]
        pub fn $name<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
            if self.is_present {
                self.$name.apply_to(input.into()).to_string().into()
            } else {
                input.into()
            }
        }
    )*};
}

impl Styles {
    /// Creates new uncolored [`Styles`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates [`Styles`] colored only when every one of the given
    /// `destinations` is an attended terminal.
    #[must_use]
    pub fn for_destinations(destinations: &[Destination]) -> Self {
        let is_present = !destinations.is_empty()
            && destinations.iter().all(|d| *d == Destination::Console)
            && console::user_attended()
            && console::colors_enabled();
        Self {
            is_present,
            ..Self::default()
        }
    }

    styled!(
        /// Colors `input` as passed, if styling is present.
        ok,
        /// Colors `input` as skipped, if styling is present.
        skipped,
        /// Colors `input` as pending, if styling is present.
        pending,
        /// Colors `input` as failed, if styling is present.
        err,
        /// Colors `input` as a comment, if styling is present.
        comment,
        /// Makes `input` __bold__, if styling is present.
        bold,
    );
}

/// [`io::Write`] extension for easier manipulation with strings.
pub trait WriteStrExt: io::Write {
    /// Writes the given `string` into this writer.
    ///
    /// # Errors
    ///
    /// If this writer fails to write the given `string`.
    fn write_str(&mut self, string: impl AsRef<str>) -> io::Result<()> {
        self.write_all(string.as_ref().as_bytes())
    }

    /// Writes the given `string` into this writer followed by a newline.
    ///
    /// # Errors
    ///
    /// If this writer fails to write the given `string`.
    fn write_line(&mut self, string: impl AsRef<str>) -> io::Result<()> {
        self.write_str(string.as_ref())
            .and_then(|()| self.write_str("\n"))
    }
}

impl<T: io::Write + ?Sized> WriteStrExt for T {}

/// [`String`] wrapper implementing [`io::Write`].
#[derive(
    Clone, Debug, Default, Deref, DerefMut, Display, Eq, From, PartialEq,
)]
pub struct WritableString(pub String);

impl io::Write for WritableString {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.push_str(
            str::from_utf8(buf)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        );
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Escapes the given `text` for embedding into HTML markup.
#[must_use]
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return text.into();
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped.into()
}

/// Renders the given `text` as a script string literal, safe for embedding
/// into an inline `<script>` element.
///
/// # Errors
///
/// If the `text` cannot be serialized.
pub fn script_string(text: &str) -> WriterResult<String> {
    Ok(serde_json::to_string(text)?.replace("</", "<\\/"))
}
