#![forbid(unsafe_code)]

//! In-memory [`Surface`] for headless hosts and tests.
//!
//! [`MemorySurface`] keeps every document as parsed JSON, records each call
//! in an operation log, and lets the host simulate a remote client with
//! [`push_remote`](MemorySurface::push_remote). Nothing is asynchronous:
//! a push is applied and delivered before it returns.
//!
//! Server-side `write_path` calls are **not** echoed to subscribers.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::SurfaceError;
use crate::surface::{DocumentId, RemoteCallback, Subject, SubscriptionHandle, Surface};

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    WriteDocument { doc: DocumentId },
    WritePath { doc: DocumentId, path: String, value: Value },
    MarkWritable { doc: DocumentId, path: String, writable: bool },
    Subscribe { doc: DocumentId, path: String, handle: SubscriptionHandle },
    Unsubscribe { handle: SubscriptionHandle },
    Present { subject: Subject, screen_id: String },
    Dismiss { subject: Subject },
}

struct Subscription {
    doc: DocumentId,
    path: String,
    callback: Rc<RefCell<RemoteCallback>>,
}

#[derive(Default)]
struct MemoryInner {
    documents: HashMap<DocumentId, Value>,
    writable: HashSet<(DocumentId, String)>,
    subscriptions: BTreeMap<u64, Subscription>,
    presented: HashMap<Subject, String>,
    next_handle: u64,
    ops: Vec<SurfaceOp>,
}

/// Deterministic in-memory surface. Cloning yields a handle to the same
/// state.
#[derive(Clone, Default)]
pub struct MemorySurface {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemorySurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a remote edit: store `value` at `path` and deliver it to
    /// every subscriber of that path, in subscription order.
    ///
    /// Fails with [`SurfaceError::NotWritable`] unless the path was marked
    /// writable. Returns the number of subscribers invoked.
    pub fn push_remote(
        &self,
        doc: &DocumentId,
        path: &str,
        value: Value,
    ) -> Result<usize, SurfaceError> {
        let callbacks: Vec<Rc<RefCell<RemoteCallback>>> = {
            let mut inner = self.inner.borrow_mut();
            if !inner.writable.contains(&(doc.clone(), path.to_string())) {
                return Err(SurfaceError::NotWritable(path.to_string()));
            }
            if let Some(document) = inner.documents.get_mut(doc) {
                set_at_path(document, path, value.clone());
            }
            inner
                .subscriptions
                .values()
                .filter(|s| &s.doc == doc && s.path == path)
                .map(|s| Rc::clone(&s.callback))
                .collect()
        };
        let mut delivered = 0;
        for callback in callbacks {
            match callback.try_borrow_mut() {
                Ok(mut f) => {
                    f(&value);
                    delivered += 1;
                }
                Err(_) => trace!(path, "re-entrant delivery skipped"),
            }
        }
        Ok(delivered)
    }

    /// Current value at `path`, if the document exists and has it.
    #[must_use]
    pub fn read_path(&self, doc: &DocumentId, path: &str) -> Option<Value> {
        let inner = self.inner.borrow();
        let document = inner.documents.get(doc)?;
        get_at_path(document, path).cloned()
    }

    /// Full current document.
    #[must_use]
    pub fn document(&self, doc: &DocumentId) -> Option<Value> {
        self.inner.borrow().documents.get(doc).cloned()
    }

    #[must_use]
    pub fn is_writable(&self, doc: &DocumentId, path: &str) -> bool {
        self.inner
            .borrow()
            .writable
            .contains(&(doc.clone(), path.to_string()))
    }

    /// Screen currently presented to `subject`.
    #[must_use]
    pub fn presented_screen(&self, subject: &Subject) -> Option<String> {
        self.inner.borrow().presented.get(subject).cloned()
    }

    /// Number of live subscriptions across all documents.
    #[must_use]
    pub fn live_subscriptions(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    /// Drop every subscription without telling their owners, as a surface
    /// does when the client disconnects.
    pub fn invalidate_subscriptions(&self) {
        self.inner.borrow_mut().subscriptions.clear();
    }

    /// Recorded calls, oldest first.
    #[must_use]
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.inner.borrow().ops.clone()
    }

    /// Discard the operation log.
    pub fn clear_ops(&self) {
        self.inner.borrow_mut().ops.clear();
    }
}

impl Surface for MemorySurface {
    fn write_document(&self, doc: &DocumentId, json: &str) -> Result<(), SurfaceError> {
        let parsed: Value =
            serde_json::from_str(json).map_err(|e| SurfaceError::Rejected(e.to_string()))?;
        let mut inner = self.inner.borrow_mut();
        inner.documents.insert(doc.clone(), parsed);
        inner.ops.push(SurfaceOp::WriteDocument { doc: doc.clone() });
        Ok(())
    }

    fn write_path(&self, doc: &DocumentId, path: &str, value: &Value) -> Result<(), SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        let document = inner
            .documents
            .entry(doc.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        set_at_path(document, path, value.clone());
        inner.ops.push(SurfaceOp::WritePath {
            doc: doc.clone(),
            path: path.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn mark_writable(
        &self,
        doc: &DocumentId,
        path: &str,
        writable: bool,
    ) -> Result<(), SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        let key = (doc.clone(), path.to_string());
        if writable {
            inner.writable.insert(key);
        } else {
            inner.writable.remove(&key);
        }
        inner.ops.push(SurfaceOp::MarkWritable {
            doc: doc.clone(),
            path: path.to_string(),
            writable,
        });
        Ok(())
    }

    fn subscribe(
        &self,
        doc: &DocumentId,
        path: &str,
        callback: RemoteCallback,
    ) -> Result<SubscriptionHandle, SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        inner.next_handle += 1;
        let handle = SubscriptionHandle::new(inner.next_handle);
        inner.subscriptions.insert(
            handle.get(),
            Subscription {
                doc: doc.clone(),
                path: path.to_string(),
                callback: Rc::new(RefCell::new(callback)),
            },
        );
        inner.ops.push(SurfaceOp::Subscribe {
            doc: doc.clone(),
            path: path.to_string(),
            handle,
        });
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<(), SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        inner.ops.push(SurfaceOp::Unsubscribe { handle });
        inner
            .subscriptions
            .remove(&handle.get())
            .map(|_| ())
            .ok_or(SurfaceError::SubscriptionDisposed(handle))
    }

    fn present(&self, subject: &Subject, screen_id: &str) -> Result<(), SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        inner.presented.insert(subject.clone(), screen_id.to_string());
        inner.ops.push(SurfaceOp::Present {
            subject: subject.clone(),
            screen_id: screen_id.to_string(),
        });
        Ok(())
    }

    fn dismiss(&self, subject: &Subject) -> Result<(), SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        inner.presented.remove(subject);
        inner.ops.push(SurfaceOp::Dismiss {
            subject: subject.clone(),
        });
        Ok(())
    }
}

impl std::fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MemorySurface")
            .field("documents", &inner.documents.len())
            .field("subscriptions", &inner.subscriptions.len())
            .field("ops", &inner.ops.len())
            .finish()
    }
}

/// Split a dotted wire path into object keys: `layout[3].value` becomes
/// `["layout", "3", "value"]`.
fn path_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        match part.split_once('[') {
            Some((name, rest)) => {
                if !name.is_empty() {
                    segments.push(name.to_string());
                }
                segments.push(rest.trim_end_matches(']').to_string());
            }
            None => segments.push(part.to_string()),
        }
    }
    segments
}

fn get_at_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path_segments(path)
        .iter()
        .try_fold(document, |node, key| node.as_object()?.get(key))
}

fn set_at_path(document: &mut Value, path: &str, value: Value) {
    let segments = path_segments(path);
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut node = document;
    for key in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else { return };
        node = map
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn doc() -> DocumentId {
        DocumentId::new(Subject::new("steve"), "rform", "custom_form")
    }

    #[test]
    fn path_segments_split_indices() {
        assert_eq!(path_segments("layout[3].value"), vec!["layout", "3", "value"]);
        assert_eq!(path_segments("closeButton.onClick"), vec!["closeButton", "onClick"]);
        assert_eq!(path_segments("title"), vec!["title"]);
    }

    #[test]
    fn write_path_updates_nested_document() {
        let surface = MemorySurface::new();
        let doc = doc();
        surface
            .write_document(&doc, r#"{"layout":{"length":1,"0":{"value":1}}}"#)
            .expect("valid json");
        surface
            .write_path(&doc, "layout[0].value", &json!(5))
            .expect("write");
        assert_eq!(surface.read_path(&doc, "layout[0].value"), Some(json!(5)));
        assert_eq!(surface.read_path(&doc, "layout[0].missing"), None);
    }

    #[test]
    fn invalid_document_is_rejected() {
        let surface = MemorySurface::new();
        assert!(matches!(
            surface.write_document(&doc(), "{not json"),
            Err(SurfaceError::Rejected(_))
        ));
    }

    #[test]
    fn push_requires_writable_path() {
        let surface = MemorySurface::new();
        let doc = doc();
        assert_eq!(
            surface.push_remote(&doc, "title", json!("x")),
            Err(SurfaceError::NotWritable("title".into()))
        );
        surface.mark_writable(&doc, "title", true).expect("mark");
        assert_eq!(surface.push_remote(&doc, "title", json!("x")), Ok(0));
    }

    #[test]
    fn push_delivers_to_matching_subscribers_only() {
        let surface = MemorySurface::new();
        let doc = doc();
        let hits = Rc::new(Cell::new(0));
        for path in ["layout[0].value", "layout[1].value"] {
            let hits = Rc::clone(&hits);
            surface.mark_writable(&doc, path, true).expect("mark");
            surface
                .subscribe(&doc, path, Box::new(move |_: &Value| hits.set(hits.get() + 1)))
                .expect("subscribe");
        }
        assert_eq!(surface.push_remote(&doc, "layout[1].value", json!(1)), Ok(1));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unsubscribe_twice_reports_disposed() {
        let surface = MemorySurface::new();
        let handle = surface
            .subscribe(&doc(), "title", Box::new(|_: &Value| {}))
            .expect("subscribe");
        assert_eq!(surface.unsubscribe(handle), Ok(()));
        assert_eq!(
            surface.unsubscribe(handle),
            Err(SurfaceError::SubscriptionDisposed(handle))
        );
        assert_eq!(surface.live_subscriptions(), 0);
    }

    #[test]
    fn callback_may_unsubscribe_itself_during_delivery() {
        let surface = MemorySurface::new();
        let doc = doc();
        surface.mark_writable(&doc, "title", true).expect("mark");
        let own = Rc::new(Cell::new(None));
        let surface_clone = surface.clone();
        let own_clone = Rc::clone(&own);
        let handle = surface
            .subscribe(
                &doc,
                "title",
                Box::new(move |_: &Value| {
                    if let Some(h) = own_clone.get() {
                        surface_clone.unsubscribe(h).expect("first release");
                    }
                }),
            )
            .expect("subscribe");
        own.set(Some(handle));

        assert_eq!(surface.push_remote(&doc, "title", json!("a")), Ok(1));
        assert_eq!(surface.push_remote(&doc, "title", json!("b")), Ok(0));
    }
}
