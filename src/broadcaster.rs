// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Multicast dispatch of one logical call to many sinks.

use std::{fmt, io};

use crate::{
    error::WriterResult,
    event::StepFailure,
    feature::{Feature, RegularScenario, RowScenario, Step},
    steps::StepMatch,
    Formatter,
};

/// Ordered collection of sinks receiving every call made on it.
///
/// Calls are forwarded sequentially, in registration order, and stop at the
/// first failing sink. Sinks already invoked are not rolled back.
pub struct Broadcaster<T> {
    sinks: Vec<T>,
}

/// [`Broadcaster`] of output destinations.
pub type OutputBroadcaster = Broadcaster<Box<dyn io::Write>>;

/// [`Broadcaster`] of report generators.
pub type FormatterBroadcaster = Broadcaster<Box<dyn Formatter>>;

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self { sinks: Vec::new() }
    }
}

impl<T> fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl<T> FromIterator<T> for Broadcaster<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            sinks: iter.into_iter().collect(),
        }
    }
}

impl<T> Broadcaster<T> {
    /// Creates an empty [`Broadcaster`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the given `sink`, to be invoked after all the already
    /// registered ones.
    pub fn register(&mut self, sink: T) -> &mut Self {
        self.sinks.push(sink);
        self
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Indicates whether no sinks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Iterates over the registered sinks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.sinks.iter()
    }

    /// Invokes the given `call` on every sink in registration order,
    /// stopping at the first error.
    ///
    /// # Errors
    ///
    /// The first error returned by a sink.
    pub fn broadcast<E>(
        &mut self,
        mut call: impl FnMut(&mut T) -> Result<(), E>,
    ) -> Result<(), E> {
        self.sinks.iter_mut().try_for_each(|sink| call(sink))
    }

    /// Unwraps the registered sinks.
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.sinks
    }
}

impl<T: Formatter> Formatter for Broadcaster<T> {
    fn visit_features(&mut self, features: &[Feature]) -> WriterResult<()> {
        self.broadcast(|f| f.visit_features(features))
    }

    // Each sink drives its own traversal, as it may override it.
    fn visit_feature(&mut self, feature: &Feature) -> WriterResult<()> {
        self.broadcast(|f| f.visit_feature(feature))
    }

    fn visit_header(&mut self, header: &str) -> WriterResult<()> {
        self.broadcast(|f| f.visit_header(header))
    }

    fn visit_regular_scenario(
        &mut self,
        scenario: &RegularScenario,
    ) -> WriterResult<()> {
        self.broadcast(|f| f.visit_regular_scenario(scenario))
    }

    fn visit_row_scenario(&mut self, scenario: &RowScenario) -> WriterResult<()> {
        self.broadcast(|f| f.visit_row_scenario(scenario))
    }

    fn visit_regular_step(&mut self, step: &Step) -> WriterResult<()> {
        self.broadcast(|f| f.visit_regular_step(step))
    }

    fn visit_row_step(&mut self, step: &Step) -> WriterResult<()> {
        self.broadcast(|f| f.visit_row_step(step))
    }

    fn step_executing(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.broadcast(|f| f.step_executing(step, matched))
    }

    fn step_passed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.broadcast(|f| f.step_passed(step, matched))
    }

    fn step_failed(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
        error: &StepFailure,
    ) -> WriterResult<()> {
        self.broadcast(|f| f.step_failed(step, matched, error))
    }

    fn step_pending(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.broadcast(|f| f.step_pending(step, matched))
    }

    fn step_skipped(
        &mut self,
        step: &Step,
        matched: Option<&StepMatch>,
    ) -> WriterResult<()> {
        self.broadcast(|f| f.step_skipped(step, matched))
    }

    fn dump(&mut self) -> WriterResult<()> {
        self.broadcast(Formatter::dump)
    }
}

impl<T: io::Write> io::Write for Broadcaster<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.broadcast(|w| w.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.broadcast(io::Write::flush)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, io::Write as _, rc::Rc};

    use super::*;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Failing;

    impl io::Write for Failing {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_into_every_sink() {
        let (a, b) = (Shared::default(), Shared::default());
        let mut out: OutputBroadcaster = Broadcaster::new();
        out.register(Box::new(a.clone())).register(Box::new(b.clone()));

        write!(out, "hello").unwrap();
        out.flush().unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(a.0.borrow().as_slice(), b"hello");
        assert_eq!(b.0.borrow().as_slice(), b"hello");
    }

    #[test]
    fn stops_at_first_error() {
        let (a, c) = (Shared::default(), Shared::default());
        let mut out: OutputBroadcaster = [
            Box::new(a.clone()) as Box<dyn io::Write>,
            Box::new(Failing),
            Box::new(c.clone()),
        ]
        .into_iter()
        .collect();

        let err = out.write_all(b"data").unwrap_err();

        assert_eq!(err.to_string(), "closed");
        assert_eq!(a.0.borrow().as_slice(), b"data");
        assert!(c.0.borrow().is_empty());
    }

    #[test]
    fn empty_broadcaster_accepts_everything() {
        let mut out = Broadcaster::<Shared>::new();

        assert!(out.is_empty());
        out.write_all(b"ignored").unwrap();
    }
}
