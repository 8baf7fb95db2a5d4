#![forbid(unsafe_code)]

//! Fluent form builder and server-side field mutation.
//!
//! A [`FormBuilder`] owns one layout, one callback registry, and one session
//! for one subject. It is a cheap `Rc` handle: clones refer to the same form,
//! and every callback receives a clone so it can mutate or close the form it
//! belongs to.
//!
//! Elements are indexed in call order. The first `add_*` call creates index
//! 0, the next index 1, and so on; callers address elements by counting.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use rform_sync::{FormBuilder, MemorySurface, Subject};
//!
//! let surface = MemorySurface::new();
//! let form = FormBuilder::new(Subject::new("steve"), Rc::new(surface.clone()));
//! form.add_header("Audio")
//!     .add_toggle_with("Sound", true, |value, subject, _form| {
//!         println!("{subject} turned sound {}", value.truthy());
//!     })
//!     .add_slider("Volume", 50.0, 0.0, 100.0, 1.0);
//! form.show("Settings", true, None).unwrap();
//! form.set_slider_value(2, 80.0).unwrap();
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rform_layout::{
    CloseButton, DropdownItems, ElementDescriptor, ElementKind, FieldKey, FieldValue, LayoutModel,
    Property, form_document,
};
use rform_reactive::{Cleanup, Observable};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::{FormError, Result};
use crate::registry::{Callback, CallbackRegistry, CloseCallback};
use crate::session::{ActiveSubscriptions, SessionState};
use crate::surface::{DocumentId, Subject, Surface};

pub(crate) struct FormState {
    pub title: String,
    pub layout: LayoutModel,
    pub session: SessionState,
    pub show_close_button: bool,
}

impl FormState {
    pub fn require_shown(&self) -> Result<()> {
        if self.session.is_shown() {
            Ok(())
        } else {
            Err(FormError::InvalidState {
                expected: SessionState::Shown,
                actual: self.session,
            })
        }
    }
}

pub(crate) struct FormInner {
    pub subject: Subject,
    pub surface: Rc<dyn Surface>,
    pub config: SyncConfig,
    pub doc: DocumentId,
    pub state: RefCell<FormState>,
    pub registry: RefCell<CallbackRegistry>,
    pub subscriptions: RefCell<ActiveSubscriptions>,
    pub on_close: RefCell<Option<CloseCallback>>,
    /// Releases observable subscriptions made by `bind_*`.
    pub bindings: RefCell<Vec<Cleanup>>,
}

impl FormInner {
    /// The current document as JSON text.
    pub fn document_json(&self, state: &FormState) -> String {
        form_document(
            &state.title,
            &state.layout,
            &CloseButton::new(self.config.close_label.as_str(), state.show_close_button),
        )
        .to_string()
    }

    /// Push one value to the surface.
    pub fn push_path(&self, path: &str, value: &Value) -> Result<()> {
        self.surface.write_path(&self.doc, path, value)?;
        debug!(subject = %self.subject, path, %value, "path pushed");
        Ok(())
    }

    /// Store a value for a bound observable and push it while shown.
    /// Values equal to the stored one are not pushed again.
    fn sync_bound(&self, key: FieldKey, value: FieldValue) {
        let pushed = {
            let mut state = self.state.borrow_mut();
            if state.layout.read(key).is_some_and(|current| current == value) {
                return;
            }
            match state.layout.write(key, value) {
                Ok(stored) => state.session.is_shown().then_some(stored),
                Err(err) => {
                    warn!(path = %key, error = %err, "bound value rejected");
                    return;
                }
            }
        };
        if let Some(stored) = pushed {
            if let Err(err) = self.push_path(&key.to_string(), &stored.to_json()) {
                warn!(path = %key, error = %err, "bound value push failed");
            }
        }
    }
}

impl Drop for FormInner {
    fn drop(&mut self) {
        for cleanup in self.bindings.get_mut().drain(..) {
            cleanup.run();
        }
        let released = self.release_subscriptions();
        if released > 0 {
            debug!(subject = %self.subject, released, "form dropped with live subscriptions");
        }
    }
}

/// Builder and live handle for one remotely rendered form.
#[derive(Clone)]
pub struct FormBuilder {
    pub(crate) inner: Rc<FormInner>,
}

impl FormBuilder {
    /// A form for `subject` with the default [`SyncConfig`].
    #[must_use]
    pub fn new(subject: Subject, surface: Rc<dyn Surface>) -> Self {
        Self::with_config(subject, surface, SyncConfig::default())
    }

    #[must_use]
    pub fn with_config(subject: Subject, surface: Rc<dyn Surface>, config: SyncConfig) -> Self {
        let doc = DocumentId::new(
            subject.clone(),
            config.namespace.as_str(),
            config.schema.as_str(),
        );
        Self {
            inner: Rc::new(FormInner {
                subject,
                surface,
                config,
                doc,
                state: RefCell::new(FormState {
                    title: "Custom Form".to_string(),
                    layout: LayoutModel::new(),
                    session: SessionState::Idle,
                    show_close_button: true,
                }),
                registry: RefCell::new(CallbackRegistry::default()),
                subscriptions: RefCell::new(ActiveSubscriptions::default()),
                on_close: RefCell::new(None),
                bindings: RefCell::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<FormInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<FormInner> {
        Rc::downgrade(&self.inner)
    }

    // --- building ---------------------------------------------------------

    fn push(&self, descriptor: ElementDescriptor) -> usize {
        self.inner.state.borrow_mut().layout.push(descriptor)
    }

    /// Append `descriptor` and route remote edits of its input property to
    /// `callback`.
    fn push_with(&self, descriptor: ElementDescriptor, callback: Callback) -> usize {
        let kind = descriptor.kind();
        let index = self.push(descriptor);
        if let Some(property) = kind.input_property() {
            self.register(FieldKey::new(index, property), callback);
        }
        index
    }

    fn register(&self, key: FieldKey, callback: Callback) {
        let replaced = self.inner.registry.borrow_mut().register(key, callback);
        if self.is_shown() && !replaced {
            // Late registrations join the running session.
            if let Err(err) = crate::engine::wire(&self.inner, key.into()) {
                warn!(path = %key, error = %err, "late subscription failed");
            }
        }
    }

    pub fn add_header(&self, text: impl Into<String>) -> &Self {
        self.push(ElementDescriptor::header(text));
        self
    }

    pub fn add_spacer(&self) -> &Self {
        self.push(ElementDescriptor::spacer());
        self
    }

    pub fn add_divider(&self) -> &Self {
        self.push(ElementDescriptor::divider());
        self
    }

    pub fn add_text_field(&self, label: impl Into<String>, default: impl Into<String>) -> &Self {
        self.push(ElementDescriptor::text_field(label, default));
        self
    }

    pub fn add_text_field_with(
        &self,
        label: impl Into<String>,
        default: impl Into<String>,
        on_change: impl FnMut(FieldValue, &Subject, &FormBuilder) + 'static,
    ) -> &Self {
        self.push_with(
            ElementDescriptor::text_field(label, default),
            Callback::Value(Box::new(on_change)),
        );
        self
    }

    pub fn add_toggle(&self, label: impl Into<String>, default: bool) -> &Self {
        self.push(ElementDescriptor::toggle(label, default));
        self
    }

    pub fn add_toggle_with(
        &self,
        label: impl Into<String>,
        default: bool,
        on_change: impl FnMut(FieldValue, &Subject, &FormBuilder) + 'static,
    ) -> &Self {
        self.push_with(
            ElementDescriptor::toggle(label, default),
            Callback::Value(Box::new(on_change)),
        );
        self
    }

    pub fn add_slider(
        &self,
        label: impl Into<String>,
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    ) -> &Self {
        self.push(ElementDescriptor::slider(label, value, min, max, step));
        self
    }

    pub fn add_slider_with(
        &self,
        label: impl Into<String>,
        value: f64,
        min: f64,
        max: f64,
        step: f64,
        on_change: impl FnMut(FieldValue, &Subject, &FormBuilder) + 'static,
    ) -> &Self {
        self.push_with(
            ElementDescriptor::slider(label, value, min, max, step),
            Callback::Value(Box::new(on_change)),
        );
        self
    }

    pub fn add_dropdown(
        &self,
        label: impl Into<String>,
        items: DropdownItems,
        default: f64,
    ) -> &Self {
        self.push(ElementDescriptor::dropdown(label, items, default));
        self
    }

    pub fn add_dropdown_with(
        &self,
        label: impl Into<String>,
        items: DropdownItems,
        default: f64,
        on_change: impl FnMut(FieldValue, &Subject, &FormBuilder) + 'static,
    ) -> &Self {
        self.push_with(
            ElementDescriptor::dropdown(label, items, default),
            Callback::Value(Box::new(on_change)),
        );
        self
    }

    pub fn add_button(&self, label: impl Into<String>) -> &Self {
        self.push(ElementDescriptor::button(label));
        self
    }

    pub fn add_button_with(
        &self,
        label: impl Into<String>,
        on_click: impl FnMut(&Subject, &FormBuilder) + 'static,
    ) -> &Self {
        self.push_with(
            ElementDescriptor::button(label),
            Callback::Trigger(Box::new(on_click)),
        );
        self
    }

    /// The registry key of the input property of element `index`, provided
    /// the element takes input of the wanted flavor.
    fn input_key(&self, index: usize, trigger: bool) -> Result<FieldKey> {
        let kind = self.element_kind(index).ok_or(FormError::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        match kind.input_property() {
            Some(property) if property.is_trigger() == trigger => {
                Ok(FieldKey::new(index, property))
            }
            _ => Err(FormError::PropertyMismatch {
                index,
                kind,
                property: if trigger { Property::OnClick } else { Property::Value },
            }),
        }
    }

    /// Route remote edits of input element `index` to `on_change`. An
    /// earlier callback for the same element is replaced.
    pub fn on_change(
        &self,
        index: usize,
        on_change: impl FnMut(FieldValue, &Subject, &FormBuilder) + 'static,
    ) -> Result<()> {
        let key = self.input_key(index, false)?;
        self.register(key, Callback::Value(Box::new(on_change)));
        Ok(())
    }

    /// Route clicks of button `index` to `on_click`. An earlier callback for
    /// the same button is replaced.
    pub fn on_click(
        &self,
        index: usize,
        on_click: impl FnMut(&Subject, &FormBuilder) + 'static,
    ) -> Result<()> {
        let key = self.input_key(index, true)?;
        self.register(key, Callback::Trigger(Box::new(on_click)));
        Ok(())
    }

    // --- observable-bound fields -------------------------------------------

    /// Append `descriptor` and keep `property` in step with `observable` in
    /// both directions. Remote edits set the observable; `set` on the
    /// observable updates the descriptor and pushes the path while shown.
    fn bind<T: Clone + 'static>(
        &self,
        descriptor: ElementDescriptor,
        property: Property,
        observable: &Observable<T>,
        to_field: fn(&T) -> FieldValue,
        from_field: fn(FieldValue) -> T,
    ) {
        let kind = descriptor.kind();
        let key = FieldKey::new(self.push(descriptor), property);

        let weak = self.downgrade();
        let id = observable.subscribe(move |value| {
            if let Some(inner) = weak.upgrade() {
                inner.sync_bound(key, to_field(value));
            }
        });
        let bound = observable.clone();
        self.inner
            .bindings
            .borrow_mut()
            .push(Cleanup::new(move || {
                bound.unsubscribe(id);
            }));

        if kind.input_property() == Some(property) {
            // The descriptor already holds the edit coerced by its own tag.
            let target = observable.clone();
            self.register(
                key,
                Callback::Value(Box::new(move |_: FieldValue, _: &Subject, form: &FormBuilder| {
                    if let Some(stored) = form.value(key.element, key.property) {
                        target.set(from_field(stored));
                    }
                })),
            );
        }
    }

    /// Header whose text follows the returned observable.
    pub fn bind_header(&self, text: impl Into<String>) -> Observable<String> {
        let observable = Observable::new(text.into());
        self.bind(
            ElementDescriptor::header(observable.get()),
            Property::Text,
            &observable,
            |text| FieldValue::Text(text.clone()),
            |value| value.to_text(),
        );
        observable
    }

    pub fn bind_text_field(
        &self,
        label: impl Into<String>,
        default: impl Into<String>,
    ) -> Observable<String> {
        let observable = Observable::new(default.into());
        self.bind(
            ElementDescriptor::text_field(label, observable.get()),
            Property::Text,
            &observable,
            |text| FieldValue::Text(text.clone()),
            |value| value.to_text(),
        );
        observable
    }

    pub fn bind_toggle(&self, label: impl Into<String>, default: bool) -> Observable<bool> {
        let observable = Observable::new(default);
        self.bind(
            ElementDescriptor::toggle(label, default),
            Property::Toggled,
            &observable,
            |toggled| FieldValue::Bool(*toggled),
            |value| value.truthy(),
        );
        observable
    }

    pub fn bind_slider(
        &self,
        label: impl Into<String>,
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    ) -> Observable<f64> {
        let observable = Observable::new(value);
        self.bind(
            ElementDescriptor::slider(label, value, min, max, step),
            Property::Value,
            &observable,
            |n| FieldValue::Number(*n),
            |value| value.to_number(),
        );
        observable
    }

    pub fn bind_dropdown(
        &self,
        label: impl Into<String>,
        items: DropdownItems,
        default: f64,
    ) -> Observable<f64> {
        let observable = Observable::new(default);
        self.bind(
            ElementDescriptor::dropdown(label, items, default),
            Property::Value,
            &observable,
            |n| FieldValue::Number(*n),
            |value| value.to_number(),
        );
        observable
    }

    // --- mutation while shown ---------------------------------------------

    /// Coerce `value` by the property's type, store it, and push the single
    /// changed path.
    ///
    /// # Errors
    ///
    /// [`FormError::InvalidState`] unless shown,
    /// [`FormError::IndexOutOfRange`] for an index outside the layout,
    /// [`FormError::PropertyMismatch`] if the element lacks `property`.
    pub fn update_element(
        &self,
        index: usize,
        property: Property,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        let key = FieldKey::new(index, property);
        let stored = {
            let mut state = self.inner.state.borrow_mut();
            state.require_shown()?;
            state
                .layout
                .write(key, value.into())
                .map_err(|err| FormError::from_layout(index, err))?
        };
        self.inner.push_path(&key.to_string(), &stored.to_json())
    }

    /// [`update_element`](Self::update_element) addressed by wire property
    /// name, e.g. `"minValue"`.
    pub fn update_element_by_name(
        &self,
        index: usize,
        property: &str,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        self.inner.state.borrow().require_shown()?;
        let property = property
            .parse::<Property>()
            .map_err(|err| FormError::from_layout(index, err))?;
        self.update_element(index, property, value)
    }

    pub fn set_element_visible(&self, index: usize, visible: bool) -> Result<()> {
        self.update_element(index, Property::Visible, visible)
    }

    pub fn set_text_field_value(&self, index: usize, text: impl Into<String>) -> Result<()> {
        self.update_element(index, Property::Text, text.into())
    }

    pub fn set_toggle_value(&self, index: usize, toggled: bool) -> Result<()> {
        self.update_element(index, Property::Toggled, toggled)
    }

    pub fn set_slider_value(&self, index: usize, value: f64) -> Result<()> {
        self.update_element(index, Property::Value, value)
    }

    pub fn set_dropdown_value(&self, index: usize, value: f64) -> Result<()> {
        self.update_element(index, Property::Value, value)
    }

    /// Set a header's text or any other element's label.
    pub fn set_label_text(&self, index: usize, text: impl Into<String>) -> Result<()> {
        let property = match self.element_kind(index) {
            Some(ElementKind::Header) => Property::Text,
            _ => Property::Label,
        };
        self.update_element(index, property, text.into())
    }

    pub fn set_button_label(&self, index: usize, label: impl Into<String>) -> Result<()> {
        self.update_element(index, Property::Label, label.into())
    }

    // --- queries -----------------------------------------------------------

    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.inner.subject
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn document_id(&self) -> &DocumentId {
        &self.inner.doc
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().session
    }

    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.state().is_shown()
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.inner.state.borrow().title.clone()
    }

    /// Number of elements in the layout.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.borrow().layout.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the element at `index`.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<ElementDescriptor> {
        self.inner.state.borrow().layout.get(index).cloned()
    }

    #[must_use]
    pub fn element_kind(&self, index: usize) -> Option<ElementKind> {
        self.inner.state.borrow().layout.get(index).map(ElementDescriptor::kind)
    }

    /// Current value of one sub-field.
    #[must_use]
    pub fn value(&self, index: usize, property: Property) -> Option<FieldValue> {
        self.inner.state.borrow().layout.read(FieldKey::new(index, property))
    }

    /// Number of paths with a registered callback.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    /// Number of surface subscriptions held by the current session.
    #[must_use]
    pub fn active_subscription_count(&self) -> usize {
        self.inner.subscriptions.borrow().len()
    }

    /// The full document as it would be written by `show` or `rebuild`.
    #[must_use]
    pub fn document(&self) -> Value {
        let state = self.inner.state.borrow();
        form_document(
            &state.title,
            &state.layout,
            &CloseButton::new(self.inner.config.close_label.as_str(), state.show_close_button),
        )
    }

    /// Whether both handles refer to the same form.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for FormBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("FormBuilder")
            .field("subject", &self.inner.subject)
            .field("title", &state.title)
            .field("session", &state.session)
            .field("elements", &state.layout.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySurface;
    use rform_layout::DropdownItem;

    fn form() -> (FormBuilder, MemorySurface) {
        let surface = MemorySurface::new();
        let form = FormBuilder::new(Subject::new("steve"), Rc::new(surface.clone()));
        (form, surface)
    }

    #[test]
    fn indices_follow_call_order() {
        let (form, _) = form();
        form.add_header("Audio")
            .add_spacer()
            .add_toggle("Sound", false)
            .add_divider()
            .add_button("Apply");
        assert_eq!(form.len(), 5);
        assert_eq!(form.element_kind(2), Some(ElementKind::Toggle));
        assert_eq!(form.element_kind(4), Some(ElementKind::Button));
        assert_eq!(form.element_kind(5), None);
    }

    #[test]
    fn only_callbacks_are_registered() {
        let (form, _) = form();
        form.add_toggle("Plain", false)
            .add_toggle_with("Watched", false, |_, _, _| {})
            .add_button_with("Go", |_, _| {});
        assert_eq!(form.callback_count(), 2);
    }

    #[test]
    fn update_before_show_is_invalid_state() {
        let (form, surface) = form();
        form.add_toggle("Sound", false);
        assert_eq!(
            form.set_toggle_value(0, true),
            Err(FormError::InvalidState {
                expected: SessionState::Shown,
                actual: SessionState::Idle,
            })
        );
        assert_eq!(form.value(0, Property::Toggled), Some(FieldValue::Bool(false)));
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn update_by_name_rejects_unknown_property() {
        let (form, _) = form();
        form.add_slider("Volume", 1.0, 0.0, 2.0, 1.0);
        form.show("T", false, None).expect("show");
        assert_eq!(
            form.update_element_by_name(0, "colour", "red"),
            Err(FormError::UnknownProperty("colour".into()))
        );
        form.update_element_by_name(0, "maxValue", "10").expect("known property");
        assert_eq!(form.value(0, Property::MaxValue), Some(FieldValue::Number(10.0)));
    }

    #[test]
    fn property_mismatch_carries_index() {
        let (form, _) = form();
        form.add_divider().add_toggle("Sound", false);
        form.show("T", false, None).expect("show");
        assert_eq!(
            form.set_slider_value(1, 3.0),
            Err(FormError::PropertyMismatch {
                index: 1,
                kind: ElementKind::Toggle,
                property: Property::Value,
            })
        );
    }

    #[test]
    fn set_label_text_targets_header_text() {
        let (form, surface) = form();
        form.add_header("Old").add_toggle("Old", false);
        form.show("T", false, None).expect("show");
        form.set_label_text(0, "New header").expect("header");
        form.set_label_text(1, "New label").expect("toggle");
        let doc = form.document_id().clone();
        assert_eq!(
            surface.read_path(&doc, "layout[0].text"),
            Some(serde_json::json!("New header"))
        );
        assert_eq!(
            surface.read_path(&doc, "layout[1].label"),
            Some(serde_json::json!("New label"))
        );
    }

    #[test]
    fn bound_toggle_pushes_only_changes_while_shown() {
        let (form, surface) = form();
        let sound = form.bind_toggle("Sound", false);

        sound.set(true);
        assert_eq!(form.value(0, Property::Toggled), Some(FieldValue::Bool(true)));
        assert!(surface.ops().is_empty());

        form.show("T", false, None).expect("show");
        surface.clear_ops();
        sound.set(true);
        assert!(surface.ops().is_empty());
        sound.set(false);
        assert_eq!(surface.ops().len(), 1);
    }

    #[test]
    fn bound_dropdown_follows_remote_edits() {
        let (form, surface) = form();
        let items =
            DropdownItems::new([DropdownItem::new("a"), DropdownItem::new("b")]).expect("items");
        let choice = form.bind_dropdown("Pick", items, 0.0);
        form.show("T", false, None).expect("show");

        let doc = form.document_id().clone();
        surface
            .push_remote(&doc, "layout[0].value", serde_json::json!("1"))
            .expect("writable");
        assert_eq!(choice.get(), 1.0);
        assert_eq!(form.value(0, Property::Value), Some(FieldValue::Number(1.0)));
    }

    #[test]
    fn dropping_the_form_releases_bindings() {
        let (form, _) = form();
        let header = form.bind_header("Score: 0");
        assert_eq!(header.subscriber_count(), 1);
        drop(form);
        assert_eq!(header.subscriber_count(), 0);
        header.set("Score: 1".into());
    }
}
