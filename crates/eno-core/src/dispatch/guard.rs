use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::RefCell;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};

use crate::error::{CheckerError, CheckerResult};

thread_local! {
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Chain a hook that remembers where the last panic on this thread happened.
///
/// The previous hook still runs, so the usual stderr report is kept.
pub(crate) fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let mut report = match info.location() {
                Some(at) => format!("panicked at {}:{}:{}", at.file(), at.line(), at.column()),
                None => "panicked at an unknown location".to_string(),
            };
            let backtrace = Backtrace::capture();
            if backtrace.status() == BacktraceStatus::Captured {
                report.push_str(&format!("\n\nStack backtrace:\n{backtrace}"));
            }
            LAST_PANIC.with(|last| *last.borrow_mut() = Some(report));
            previous(info);
        }));
    });
}

fn take_report() -> Option<String> {
    LAST_PANIC.with(|last| last.borrow_mut().take())
}

/// Turns a panic while polling `F` into an `INTERNAL_ERROR` carrying the
/// panic location.
pub(crate) struct CatchPanic<F> {
    inner: Pin<Box<F>>,
}

impl<F> CatchPanic<F> {
    pub(crate) fn new(inner: F) -> Self {
        install_panic_hook();
        Self {
            inner: Box::pin(inner),
        }
    }
}

impl<F> Future for CatchPanic<F>
where
    F: Future<Output = CheckerResult>,
{
    type Output = CheckerResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let inner = self.inner.as_mut();
        match panic::catch_unwind(AssertUnwindSafe(move || inner.poll(cx))) {
            Ok(poll) => poll,
            Err(payload) => Poll::Ready(Err(CheckerError::from_panic(payload, take_report()))),
        }
    }
}
