//! Turning panics of test bodies into [`TaskError`]s.
//!
//! A process wide panic hook is installed once. On threads that are currently
//! running a test body it prints the panic message to the console (which is
//! the test's log file while capturing) and remembers the location for the
//! error stack. Everywhere else it defers to the hook it replaced.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe},
    sync::Once,
    thread,
};

use crate::{body::TestBody, task::TaskError};

thread_local! {
    static RUNNING_BODY: Cell<bool> = const { Cell::new(false) };
    static PANIC_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

pub(crate) fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !RUNNING_BODY.get() {
                return previous(info);
            }

            let message = info.payload_as_str().unwrap_or("Box<dyn Any>");
            let location = info.location().map(ToString::to_string);
            let current = thread::current();
            let thread_name = current.name().unwrap_or("<unnamed>");
            match &location {
                Some(location) => {
                    crate::eprintln!("thread '{thread_name}' panicked at {location}:\n{message}")
                }
                None => crate::eprintln!("thread '{thread_name}' panicked:\n{message}"),
            }
            PANIC_LOCATION.set(location);
        }));
    });
}

pub(crate) fn downcast_panic_payload(payload: Box<dyn Any + Send + 'static>) -> String {
    payload
        .downcast::<&'static str>()
        .map(|s| s.to_string())
        .or_else(|payload| payload.downcast::<String>().map(|s| *s))
        .unwrap_or_else(|_| String::from("non-string panic payload"))
}

/// Run `body`, catching a panic.
///
/// The stack of the returned error is the message followed by the panic
/// location, errors returned by the body are rendered as `Error: <message>`.
pub(crate) fn run_body(body: &TestBody) -> Result<(), TaskError> {
    RUNNING_BODY.set(true);
    let result = panic::catch_unwind(AssertUnwindSafe(|| body.call()));
    RUNNING_BODY.set(false);
    let location = PANIC_LOCATION.take();

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(message)) => {
            let stack = format!("Error: {message}");
            Err(TaskError::new(message).with_stack(stack))
        }
        Err(payload) => {
            let message = downcast_panic_payload(payload);
            let stack = match location {
                Some(location) => format!("{message}\n ❯ {location}"),
                None => message.clone(),
            };
            Err(TaskError::new(message).with_stack(stack))
        }
    }
}
