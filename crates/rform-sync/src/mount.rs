#![forbid(unsafe_code)]

//! Mounted forms: render once per mount, tear everything down on unmount.
//!
//! A [`MountedForm`] owns a render closure. Each [`mount`](MountedForm::mount)
//! builds a fresh [`FormBuilder`], hands it to the closure together with a
//! [`CleanupScope`], and shows the result. Effects created inside the render
//! closure register their cleanups on the scope; [`unmount`](MountedForm::unmount)
//! closes the form and runs them all. The close button unmounts too.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rform_reactive::CleanupScope;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{FormError, Result};
use crate::form::FormBuilder;
use crate::session::SessionState;
use crate::surface::{Subject, Surface};

type RenderFn = Box<dyn Fn(&FormBuilder, &CleanupScope)>;

struct MountInner {
    subject: Subject,
    surface: Rc<dyn Surface>,
    config: SyncConfig,
    title: String,
    render: RenderFn,
    current: RefCell<Option<FormBuilder>>,
    scope: CleanupScope,
}

impl MountInner {
    fn unmount(&self) -> usize {
        let form = self.current.borrow_mut().take();
        if let Some(form) = &form {
            form.close();
        }
        let cleaned = self.scope.run_all();
        if form.is_some() {
            debug!(subject = %self.subject, cleaned, "form unmounted");
        }
        cleaned
    }
}

/// A form re-rendered from scratch on every mount.
///
/// ```
/// use std::rc::Rc;
/// use rform_reactive::use_effect;
/// use rform_sync::{MemorySurface, MountedForm, Subject};
///
/// let surface = MemorySurface::new();
/// let subject = Subject::new("steve");
/// let mounted = MountedForm::new(subject, Rc::new(surface), "Counter", |form, scope| {
///     let count = form.bind_header("Count: 0");
///     let label = count.clone();
///     scope.register(use_effect(move || { let _ = label.get(); None }, &[&count]));
/// });
/// mounted.mount().unwrap();
/// assert!(mounted.is_mounted());
/// mounted.unmount();
/// ```
#[derive(Clone)]
pub struct MountedForm {
    inner: Rc<MountInner>,
}

impl MountedForm {
    pub fn new(
        subject: Subject,
        surface: Rc<dyn Surface>,
        title: impl Into<String>,
        render: impl Fn(&FormBuilder, &CleanupScope) + 'static,
    ) -> Self {
        Self::with_config(subject, surface, SyncConfig::default(), title, render)
    }

    pub fn with_config(
        subject: Subject,
        surface: Rc<dyn Surface>,
        config: SyncConfig,
        title: impl Into<String>,
        render: impl Fn(&FormBuilder, &CleanupScope) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(MountInner {
                subject,
                surface,
                config,
                title: title.into(),
                render: Box::new(render),
                current: RefCell::new(None),
                scope: CleanupScope::new(),
            }),
        }
    }

    /// Render a fresh form and show it with a close button that unmounts.
    ///
    /// # Errors
    ///
    /// [`FormError::InvalidState`] if already mounted, or the error from
    /// `show`. On error nothing stays mounted and registered cleanups run.
    pub fn mount(&self) -> Result<FormBuilder> {
        let inner = &self.inner;
        if inner.current.borrow().is_some() {
            return Err(FormError::InvalidState {
                expected: SessionState::Idle,
                actual: SessionState::Shown,
            });
        }
        let form = FormBuilder::with_config(
            inner.subject.clone(),
            Rc::clone(&inner.surface),
            inner.config.clone(),
        );
        (inner.render)(&form, &inner.scope);

        let weak: Weak<MountInner> = Rc::downgrade(inner);
        let shown = form.show(
            inner.title.as_str(),
            true,
            Some(Box::new(move |_: &Subject| {
                if let Some(inner) = weak.upgrade() {
                    inner.unmount();
                }
            })),
        );
        if let Err(err) = shown {
            inner.scope.run_all();
            return Err(err);
        }
        *inner.current.borrow_mut() = Some(form.clone());
        debug!(subject = %inner.subject, elements = form.len(), "form mounted");
        Ok(form)
    }

    /// Close the form and run every registered cleanup. Returns the number
    /// of cleanups run. Does nothing when not mounted.
    pub fn unmount(&self) -> usize {
        self.inner.unmount()
    }

    /// Unmount, then mount a freshly rendered form.
    pub fn remount(&self) -> Result<FormBuilder> {
        self.unmount();
        self.mount()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.current.borrow().is_some()
    }

    /// The currently mounted form.
    #[must_use]
    pub fn form(&self) -> Option<FormBuilder> {
        self.inner.current.borrow().clone()
    }

    /// Cleanups waiting for the next unmount.
    #[must_use]
    pub fn pending_cleanups(&self) -> usize {
        self.inner.scope.len()
    }
}

impl std::fmt::Debug for MountedForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedForm")
            .field("subject", &self.inner.subject)
            .field("title", &self.inner.title)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySurface;
    use rform_layout::FieldPath;
    use rform_reactive::{Observable, use_effect};
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn render_runs_once_per_mount() {
        let renders = Rc::new(Cell::new(0));
        let counter = Rc::clone(&renders);
        let mounted = MountedForm::new(
            Subject::new("sam"),
            Rc::new(MemorySurface::new()),
            "T",
            move |form, _| {
                counter.set(counter.get() + 1);
                form.add_header("hi");
            },
        );
        let form = mounted.mount().expect("mount");
        assert_eq!(form.len(), 1);
        assert!(mounted.mount().is_err());
        mounted.remount().expect("remount");
        assert_eq!(renders.get(), 2);
        assert!(!form.is_shown());
    }

    #[test]
    fn unmount_runs_effect_cleanups() {
        let source = Observable::new(0);
        let dep = source.clone();
        let mounted = MountedForm::new(
            Subject::new("sam"),
            Rc::new(MemorySurface::new()),
            "T",
            move |_, scope| {
                scope.register(use_effect(|| None, &[&dep]));
            },
        );
        mounted.mount().expect("mount");
        assert_eq!(source.subscriber_count(), 1);
        assert_eq!(mounted.pending_cleanups(), 1);

        assert_eq!(mounted.unmount(), 1);
        assert_eq!(source.subscriber_count(), 0);
        assert_eq!(mounted.unmount(), 0);
        assert!(!mounted.is_mounted());
    }

    #[test]
    fn close_button_unmounts() {
        let surface = MemorySurface::new();
        let cleaned = Rc::new(Cell::new(false));
        let flag = Rc::clone(&cleaned);
        let mounted = MountedForm::new(
            Subject::new("sam"),
            Rc::new(surface.clone()),
            "T",
            move |_, scope| {
                let flag = Rc::clone(&flag);
                scope.defer(move || flag.set(true));
            },
        );
        let form = mounted.mount().expect("mount");
        surface
            .push_remote(form.document_id(), FieldPath::CLOSE_TRIGGER, json!(1))
            .expect("writable");
        assert!(cleaned.get());
        assert!(!mounted.is_mounted());
        assert_eq!(surface.live_subscriptions(), 0);
    }
}
