// Copyright (c) 2018-2021  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Capturing of panics raised by step functions.

use std::{
    any::Any,
    backtrace::{Backtrace, BacktraceStatus},
    panic,
    sync::{Arc, Mutex, PoisonError},
    thread,
};

use crate::{event::StepFailure, steps::Pending};

/// Location and backtrace of a panic, recorded by the panic hook.
#[derive(Clone, Debug, Default)]
struct Origin {
    location: Option<String>,
    backtrace: Vec<String>,
}

/// Reason a trapped function didn't return.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Trapped {
    /// Function marked itself pending with [`pending!`].
    ///
    /// [`pending!`]: crate::pending
    Pending,

    /// Function panicked.
    Panicked(StepFailure),
}

/// Extracts a readable message from a panic `payload`.
fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "Opaque panic payload".to_owned()
    }
}

/// Runs the given function, turning its panic into a [`Trapped`] value.
///
/// A panic hook recording the panic location and a backtrace (captured
/// according to `RUST_BACKTRACE`) is installed for the duration of the call,
/// and the previous hook is restored afterwards. Panics of other threads are
/// forwarded to the previous hook. As the hook is process-wide, traps are
/// serialized across threads and must not be nested.
pub fn trap<T>(f: impl FnOnce() -> T) -> Result<T, Trapped> {
    static HOOK: Mutex<()> = Mutex::new(());

    let _guard = HOOK.lock().unwrap_or_else(PoisonError::into_inner);
    let origin = Arc::new(Mutex::new(None::<Origin>));
    let previous = Arc::new(panic::take_hook());
    let current = thread::current().id();

    let recorded = Arc::clone(&origin);
    let forward = Arc::clone(&previous);
    panic::set_hook(Box::new(move |info| {
        if thread::current().id() != current {
            return forward(info);
        }
        let backtrace = Backtrace::capture();
        let backtrace = if backtrace.status() == BacktraceStatus::Captured {
            backtrace
                .to_string()
                .lines()
                .map(|l| l.trim().to_owned())
                .collect::<Vec<_>>()
        } else {
            Vec::new()
        };
        *recorded.lock().unwrap_or_else(PoisonError::into_inner) = Some(Origin {
            location: info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
            backtrace,
        });
    }));

    let result = panic::catch_unwind(panic::AssertUnwindSafe(f));

    drop(panic::take_hook());
    if let Ok(previous) = Arc::try_unwrap(previous) {
        panic::set_hook(previous);
    }

    result.map_err(|payload| {
        if payload.is::<Pending>() {
            return Trapped::Pending;
        }
        let origin = origin
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();
        let location = origin.location.map(|l| format!("at {l}"));
        Trapped::Panicked(
            StepFailure::new(payload_message(&*payload))
                .with_backtrace(location.into_iter().chain(origin.backtrace)),
        )
    })
}
