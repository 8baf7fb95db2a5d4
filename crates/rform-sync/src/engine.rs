#![forbid(unsafe_code)]

//! Session lifecycle and remote event dispatch.
//!
//! # Show
//!
//! 1. Title and session state are set.
//! 2. The whole document is written.
//! 3. Every registered path is marked writable and subscribed.
//! 4. With a close button, `closeButton.onClick` is wired as a trigger.
//! 5. The surface presents the screen.
//!
//! If any step fails, subscriptions made so far are released and the
//! previous state is restored.
//!
//! # Triggers
//!
//! The surface only carries persisted values, so clicks arrive as an integer
//! counter. A value `<= 0` is the idle state and ignored. A positive value
//! is consumed by writing `0` back before the callback runs, which turns the
//! level into a single edge.
//!
//! # Callback isolation
//!
//! Each callback runs with no engine borrow held, so it may update, rebuild,
//! or close the form. With [`SyncConfig::catch_panics`] set, a panic is
//! caught at the dispatch boundary and logged; other paths keep receiving
//! events.
//!
//! [`SyncConfig::catch_panics`]: crate::config::SyncConfig::catch_panics

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use rform_layout::{FieldPath, FieldValue, trigger_count};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{FormError, Result, SurfaceError};
use crate::form::{FormBuilder, FormInner};
use crate::registry::{Callback, CloseCallback};
use crate::session::SessionState;

impl FormBuilder {
    /// Show the form.
    ///
    /// A closed form may be shown again; its callbacks are wired afresh.
    ///
    /// # Errors
    ///
    /// [`FormError::InvalidState`] if already shown, or the first surface
    /// error encountered while opening.
    pub fn show(
        &self,
        title: impl Into<String>,
        show_close_button: bool,
        on_close: Option<CloseCallback>,
    ) -> Result<()> {
        let inner = &self.inner;
        let (previous, json) = {
            let mut state = inner.state.borrow_mut();
            if state.session.is_shown() {
                return Err(FormError::InvalidState {
                    expected: SessionState::Idle,
                    actual: state.session,
                });
            }
            let previous = state.session;
            state.title = title.into();
            state.show_close_button = show_close_button;
            state.session = SessionState::Shown;
            (previous, inner.document_json(&state))
        };
        *inner.on_close.borrow_mut() = on_close;

        if let Err(err) = open(inner, &json, show_close_button) {
            warn!(subject = %inner.subject, error = %err, "show failed, rolling back");
            inner.release_subscriptions();
            inner.state.borrow_mut().session = previous;
            inner.on_close.borrow_mut().take();
            return Err(err);
        }
        debug!(
            subject = %inner.subject,
            doc = %inner.doc,
            subscriptions = inner.subscriptions.borrow().len(),
            "form shown"
        );
        Ok(())
    }

    /// Dismiss the form and release every subscription.
    ///
    /// Never fails: surface errors during teardown are logged. Safe to call
    /// repeatedly and from inside a callback of this form.
    pub fn close(&self) {
        let inner = &self.inner;
        let was_shown = {
            let mut state = inner.state.borrow_mut();
            let was_shown = state.session.is_shown();
            if was_shown {
                state.session = SessionState::Closed;
            }
            was_shown
        };
        if was_shown {
            if let Err(err) = inner.surface.dismiss(&inner.subject) {
                warn!(subject = %inner.subject, error = %err, "dismiss failed");
            }
        }
        let released = inner.release_subscriptions();
        if was_shown || released > 0 {
            debug!(subject = %inner.subject, released, "form closed");
        }
    }

    /// Rewrite the whole document in one push.
    ///
    /// Useful after several field changes. The close trigger is reset to 0.
    ///
    /// # Errors
    ///
    /// [`FormError::InvalidState`] unless shown, or the surface error.
    pub fn rebuild(&self) -> Result<()> {
        let json = {
            let state = self.inner.state.borrow();
            state.require_shown()?;
            self.inner.document_json(&state)
        };
        self.inner.surface.write_document(&self.inner.doc, &json)?;
        debug!(subject = %self.inner.subject, "form rebuilt");
        Ok(())
    }

    /// Change the title. While shown, the `title` path is pushed.
    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        let shown = {
            let mut state = self.inner.state.borrow_mut();
            state.title.clone_from(&title);
            state.session.is_shown()
        };
        if shown {
            self.inner
                .push_path(FieldPath::TITLE, &Value::String(title))?;
        }
        Ok(())
    }
}

impl FormInner {
    /// Unsubscribe and revoke every active path.
    ///
    /// The live set is emptied first, so a re-entrant call releases nothing.
    /// Returns the number of subscriptions released.
    pub(crate) fn release_subscriptions(&self) -> usize {
        let entries = self.subscriptions.borrow_mut().take_all();
        for entry in &entries {
            match self.surface.unsubscribe(entry.handle) {
                Ok(()) => {}
                Err(SurfaceError::SubscriptionDisposed(handle)) => {
                    trace!(
                        handle = handle.get(),
                        path = %entry.path,
                        "subscription already disposed"
                    );
                }
                Err(err) => warn!(path = %entry.path, error = %err, "unsubscribe failed"),
            }
            if let Err(err) = self.surface.mark_writable(&self.doc, &entry.path, false) {
                warn!(path = %entry.path, error = %err, "revoking write permission failed");
            }
        }
        entries.len()
    }
}

fn open(inner: &Rc<FormInner>, json: &str, show_close_button: bool) -> Result<()> {
    inner.surface.write_document(&inner.doc, json)?;
    let keys = inner.registry.borrow().keys();
    for key in keys {
        wire(inner, key.into())?;
    }
    if show_close_button {
        wire(inner, FieldPath::CloseTrigger)?;
    }
    inner.surface.present(&inner.subject, &inner.config.screen_id)?;
    Ok(())
}

/// Mark `path` writable and subscribe the dispatcher to it.
pub(crate) fn wire(inner: &Rc<FormInner>, path: FieldPath) -> Result<()> {
    let wire_path = path.to_string();
    inner.surface.mark_writable(&inner.doc, &wire_path, true)?;

    let weak = Rc::downgrade(inner);
    let subscribed = inner.surface.subscribe(
        &inner.doc,
        &wire_path,
        Box::new(move |raw: &Value| {
            if let Some(inner) = weak.upgrade() {
                dispatch(&inner, path, raw);
            }
        }),
    );
    match subscribed {
        Ok(handle) => {
            trace!(path = %wire_path, handle = handle.get(), "path wired");
            inner.subscriptions.borrow_mut().insert(handle, wire_path);
            Ok(())
        }
        Err(err) => {
            if let Err(revoke) = inner.surface.mark_writable(&inner.doc, &wire_path, false) {
                warn!(path = %wire_path, error = %revoke, "writability not revoked");
            }
            Err(err.into())
        }
    }
}

fn dispatch(inner: &Rc<FormInner>, path: FieldPath, raw: &Value) {
    if !inner.state.borrow().session.is_shown() {
        trace!(%path, "event for closed form ignored");
        return;
    }
    trace!(%path, %raw, "remote event");
    match path {
        FieldPath::CloseTrigger => {
            if consume_trigger(inner, path, raw).is_none() {
                return;
            }
            FormBuilder::from_inner(Rc::clone(inner)).close();
            let on_close = inner.on_close.borrow_mut().take();
            if let Some(mut on_close) = on_close {
                guarded(inner, path, || on_close(&inner.subject));
            }
        }
        FieldPath::Element(key) => {
            let Some(callback) = inner.registry.borrow().get(key) else {
                return;
            };
            let value = if path.is_trigger() {
                let Some(count) = consume_trigger(inner, path, raw) else {
                    return;
                };
                FieldValue::Number(count as f64)
            } else {
                let stored = key.property.ty().store_remote(raw);
                if let Err(err) = inner.state.borrow_mut().layout.write(key, stored) {
                    trace!(%path, error = %err, "remote value not stored");
                }
                FieldValue::from_remote(raw)
            };

            let Ok(mut callback) = callback.try_borrow_mut() else {
                warn!(%path, "re-entrant event skipped");
                return;
            };
            let form = FormBuilder::from_inner(Rc::clone(inner));
            match &mut *callback {
                Callback::Trigger(on_click) => {
                    guarded(inner, path, || on_click(&inner.subject, &form));
                }
                Callback::Value(on_change) => {
                    guarded(inner, path, || on_change(value, &inner.subject, &form));
                }
            }
        }
        FieldPath::Title => {}
    }
}

/// Consume a positive trigger count by writing 0 back. Returns the count,
/// or `None` for the idle state.
fn consume_trigger(inner: &FormInner, path: FieldPath, raw: &Value) -> Option<i64> {
    let count = trigger_count(raw);
    if count <= 0 {
        trace!(%path, count, "idle trigger ignored");
        return None;
    }
    if let FieldPath::Element(key) = path {
        if let Err(err) = inner.state.borrow_mut().layout.write(key, FieldValue::Number(0.0)) {
            trace!(%path, error = %err, "trigger reset not stored");
        }
    }
    if let Err(err) = inner.surface.write_path(&inner.doc, &path.to_string(), &Value::from(0)) {
        warn!(%path, error = %err, "trigger reset failed");
    }
    Some(count)
}

fn guarded(inner: &FormInner, path: FieldPath, f: impl FnOnce()) {
    if !inner.config.catch_panics {
        f();
        return;
    }
    if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
        warn!(
            subject = %inner.subject,
            %path,
            panic = %panic_message(payload.as_ref()),
            "form callback panicked"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
