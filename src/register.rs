//! Process-wide current-context register and its scoped-acquisition guard.
//!
//! The register is the single piece of shared mutable state in the crate: it
//! names which native context new implicit drawing operations target. It is
//! thread-local and callers must serialize all drawing on one logical thread;
//! mutation follows a strict stack discipline enforced by [`ContextScope`].

use std::cell::RefCell;

use cairo::Context;

use crate::backend::Backend;

thread_local! {
    static CURRENT_CONTEXT: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// Current context shared by the built-in back-ends, if any.
pub(crate) fn current() -> Option<Context> {
    CURRENT_CONTEXT.with(|register| register.borrow().clone())
}

/// Installs `next` as the shared current context, returning the previous
/// value. Callers must restore the returned value before returning.
pub(crate) fn replace(next: Option<Context>) -> Option<Context> {
    CURRENT_CONTEXT.with(|register| register.replace(next))
}

/// Region during which a context is the back-end's current context.
///
/// Construction pushes the context; `Drop` restores the previous value
/// exactly, so restoration runs on every exit path, including error
/// propagation and panic unwinding.
pub(crate) struct ContextScope<'a> {
    backend: &'a dyn Backend,
    previous: Option<Context>,
}

impl<'a> ContextScope<'a> {
    pub(crate) fn enter(backend: &'a dyn Backend, context: Context) -> Self {
        let previous = backend.replace_current(Some(context));
        Self { backend, previous }
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.backend.replace_current(self.previous.take());
    }
}
