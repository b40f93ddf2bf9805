//! In-memory document — a small element tree that implements the DOM
//! collaborator traits. Used by tests and by the CLI to replay events against
//! a fixture page without a browser.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trackthat_core::TrackResult;

use super::selector::{Matchable, Selector};
use super::{Element, ElementQuery, ElementSet, EventHandler};

pub type NodeId = usize;

/// Declarative description of an element subtree, deserializable from JSON
/// fixture files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSpec {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub props: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn prop(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    props: BTreeMap<String, serde_json::Value>,
    text: String,
    value: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

struct Listener {
    event_type: String,
    scope: Option<Selector>,
    handler: EventHandler,
}

#[derive(Default)]
struct DocInner {
    nodes: Vec<Node>,
    listeners: HashMap<NodeId, Vec<Listener>>,
}

impl DocInner {
    fn insert(&mut self, spec: NodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: spec.tag.to_ascii_lowercase(),
            attrs: spec.attrs,
            props: spec.props,
            text: spec.text,
            value: spec.value,
            parent,
            children: Vec::new(),
            attached: true,
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        for child in spec.children {
            self.insert(child, Some(id));
        }
        id
    }

    /// Attached nodes in document order.
    fn walk(&self, from: NodeId, out: &mut Vec<NodeId>) {
        out.push(from);
        for &child in &self.nodes[from].children {
            self.walk(child, out);
        }
    }

    fn text_content(&self, id: NodeId, out: &mut String) {
        out.push_str(&self.nodes[id].text);
        for &child in &self.nodes[id].children {
            self.text_content(child, out);
        }
    }

    /// `id` followed by each ancestor up to the root.
    fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.nodes[id].parent;
        while let Some(p) = current {
            path.push(p);
            current = self.nodes[p].parent;
        }
        path
    }

    fn mark_detached(&mut self, id: NodeId) {
        self.nodes[id].attached = false;
        let children = self.nodes[id].children.clone();
        for child in children {
            self.mark_detached(child);
        }
    }

    fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }
}

#[derive(Clone, Copy)]
struct NodeRef<'a> {
    doc: &'a DocInner,
    id: NodeId,
}

impl<'a> Matchable for NodeRef<'a> {
    fn tag_name(&self) -> &str {
        &self.doc.nodes[self.id].tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.doc.nodes[self.id].attrs.get(name).map(String::as_str)
    }

    fn parent_node(&self) -> Option<Self> {
        self.doc.nodes[self.id]
            .parent
            .map(|id| NodeRef { doc: self.doc, id })
    }
}

type Shared = Arc<Mutex<DocInner>>;

fn lock(doc: &Shared) -> MutexGuard<'_, DocInner> {
    doc.lock().expect("document mutex poisoned")
}

/// Converts a `data-*` attribute suffix to its dataset key: `foo-bar` is
/// `fooBar`.
fn dataset_key(suffix: &str) -> String {
    let mut key = String::with_capacity(suffix.len());
    let mut upper = false;
    for c in suffix.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            key.extend(c.to_uppercase());
            upper = false;
        } else {
            key.push(c);
        }
    }
    key
}

/// A shared in-memory document.
#[derive(Clone)]
pub struct MemoryDocument {
    inner: Shared,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Empty document with a `body` root.
    pub fn new() -> Self {
        Self::from_spec(NodeSpec::new("body"))
    }

    pub fn from_spec(root: NodeSpec) -> Self {
        let mut inner = DocInner::default();
        inner.insert(root, None);
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn from_json(json: &str) -> TrackResult<Self> {
        let spec: NodeSpec = serde_json::from_str(json)?;
        Ok(Self::from_spec(spec))
    }

    pub fn root(&self) -> NodeId {
        0
    }

    /// Append a subtree under `parent`, returning the new subtree root.
    pub fn append(&self, parent: NodeId, spec: NodeSpec) -> NodeId {
        lock(&self.inner).insert(spec, Some(parent))
    }

    pub fn element(&self, id: NodeId) -> MemoryElement {
        MemoryElement {
            doc: self.inner.clone(),
            id,
        }
    }

    /// All attached nodes matching `selector`, in document order. An invalid
    /// selector selects nothing.
    pub fn select(&self, selector: &str) -> MemorySelection {
        let ids = match Selector::parse(selector) {
            Ok(sel) => {
                let inner = lock(&self.inner);
                let mut all = Vec::new();
                inner.walk(self.root(), &mut all);
                all.retain(|&id| sel.matches(&inner.node_ref(id)));
                all
            }
            Err(e) => {
                warn!(selector, error = %e, "ignoring invalid selector");
                Vec::new()
            }
        };
        MemorySelection {
            doc: self.inner.clone(),
            ids,
        }
    }

    pub fn first(&self, selector: &str) -> Option<NodeId> {
        self.select(selector).ids().first().copied()
    }

    pub fn set_value(&self, id: NodeId, value: impl Into<String>) {
        lock(&self.inner).nodes[id].value = Some(value.into());
    }

    pub fn set_text(&self, id: NodeId, text: impl Into<String>) {
        lock(&self.inner).nodes[id].text = text.into();
    }

    pub fn set_attr(&self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        lock(&self.inner).nodes[id]
            .attrs
            .insert(name.into(), value.into());
    }

    pub fn set_prop(&self, id: NodeId, name: impl Into<String>, value: serde_json::Value) {
        lock(&self.inner).nodes[id].props.insert(name.into(), value);
    }

    /// Remove a subtree from the document. Its handles stay readable but are
    /// no longer bindable and no longer receive events.
    pub fn detach(&self, id: NodeId) {
        let mut inner = lock(&self.inner);
        if let Some(parent) = inner.nodes[id].parent.take() {
            inner.nodes[parent].children.retain(|&c| c != id);
        }
        inner.mark_detached(id);
    }

    /// Total number of registered listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.values().map(Vec::len).sum()
    }

    /// Fire `event_type` at `target` and let it bubble to the root. Returns
    /// the number of handler invocations.
    pub fn trigger(&self, target: NodeId, event_type: &str) -> usize {
        let calls: Vec<(EventHandler, NodeId)> = {
            let inner = lock(&self.inner);
            if !inner.nodes[target].attached {
                return 0;
            }
            let path = inner.path_to_root(target);
            let mut calls = Vec::new();
            for (depth, &node) in path.iter().enumerate() {
                let Some(listeners) = inner.listeners.get(&node) else {
                    continue;
                };
                for listener in listeners.iter().filter(|l| l.event_type == event_type) {
                    match listener.scope {
                        None => calls.push((listener.handler.clone(), node)),
                        Some(ref scope) => {
                            for &candidate in &path[..depth] {
                                if scope.matches(&inner.node_ref(candidate)) {
                                    calls.push((listener.handler.clone(), candidate));
                                }
                            }
                        }
                    }
                }
            }
            calls
        };

        debug!(node = target, event_type, handlers = calls.len(), "event triggered");
        for (handler, id) in &calls {
            handler(&self.element(*id));
        }
        calls.len()
    }
}

impl ElementQuery for MemoryDocument {
    fn query(&self, selector: &str) -> Arc<dyn ElementSet> {
        Arc::new(self.select(selector))
    }
}

/// Handle to one node of a [`MemoryDocument`].
#[derive(Clone)]
pub struct MemoryElement {
    doc: Shared,
    id: NodeId,
}

impl MemoryElement {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl Element for MemoryElement {
    fn value(&self) -> Option<String> {
        lock(&self.doc).nodes[self.id].value.clone()
    }

    fn text(&self) -> String {
        let mut out = String::new();
        lock(&self.doc).text_content(self.id, &mut out);
        out
    }

    fn attr(&self, name: &str) -> Option<String> {
        lock(&self.doc).nodes[self.id].attrs.get(name).cloned()
    }

    fn prop(&self, name: &str) -> Option<serde_json::Value> {
        lock(&self.doc).nodes[self.id].props.get(name).cloned()
    }

    fn data(&self, key: &str) -> Option<String> {
        let inner = lock(&self.doc);
        let found = inner.nodes[self.id]
            .attrs
            .iter()
            .filter_map(|(name, value)| name.strip_prefix("data-").map(|s| (s, value)))
            .find(|(suffix, _)| dataset_key(suffix) == key)
            .map(|(_, value)| value.clone());
        found
    }

    fn is_bindable(&self) -> bool {
        lock(&self.doc)
            .nodes
            .get(self.id)
            .is_some_and(|n| n.attached)
    }
}

/// A selection of nodes from a [`MemoryDocument`].
#[derive(Clone)]
pub struct MemorySelection {
    doc: Shared,
    ids: Vec<NodeId>,
}

impl MemorySelection {
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }
}

impl ElementSet for MemorySelection {
    fn len(&self) -> usize {
        self.ids.len()
    }

    fn on(&self, event_type: &str, scope: Option<&str>, handler: EventHandler) -> TrackResult<()> {
        let scope = scope.map(Selector::parse).transpose()?;
        let mut inner = lock(&self.doc);
        for &id in &self.ids {
            inner.listeners.entry(id).or_default().push(Listener {
                event_type: event_type.to_string(),
                scope: scope.clone(),
                handler: handler.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn nav_page() -> MemoryDocument {
        MemoryDocument::from_spec(
            NodeSpec::new("body").child(
                NodeSpec::new("ul")
                    .id("top_nav")
                    .child(
                        NodeSpec::new("li").child(
                            NodeSpec::new("a")
                                .attr("href", "/home")
                                .attr("data-nav-slot", "first")
                                .text("Home"),
                        ),
                    )
                    .child(
                        NodeSpec::new("li").child(
                            NodeSpec::new("a")
                                .attr("href", "/help")
                                .child(NodeSpec::new("span").text("He"))
                                .child(NodeSpec::new("em").text("lp")),
                        ),
                    ),
            ),
        )
    }

    #[test]
    fn test_select_document_order() {
        let doc = nav_page();
        let links = doc.select("#top_nav a");
        assert_eq!(links.len(), 2);
        assert!(doc.select("table").is_empty());
        assert!(doc.select("[[").is_empty());
    }

    #[test]
    fn test_element_reads() {
        let doc = nav_page();
        let ids = doc.select("a").ids().to_vec();
        let home = doc.element(ids[0]);
        let help = doc.element(ids[1]);

        assert_eq!(home.text(), "Home");
        assert_eq!(help.text(), "Help");
        assert_eq!(home.attr("href").as_deref(), Some("/home"));
        assert_eq!(home.attr("title"), None);
        assert_eq!(home.data("navSlot").as_deref(), Some("first"));
        assert_eq!(home.data("nav-slot"), None);
        assert_eq!(home.value(), None);
    }

    #[test]
    fn test_direct_and_delegated_listeners() {
        let doc = nav_page();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let nav = doc.select("#top_nav");
        let s = seen.clone();
        nav.on(
            "click",
            Some("a"),
            Arc::new(move |el: &dyn Element| {
                s.lock().unwrap().push(format!("delegated:{}", el.text()))
            }),
        )
        .unwrap();
        let s = seen.clone();
        nav.on(
            "click",
            None,
            Arc::new(move |el: &dyn Element| {
                s.lock().unwrap().push(format!("direct:{}", el.attr("id").unwrap_or_default()))
            }),
        )
        .unwrap();
        assert_eq!(doc.listener_count(), 2);

        let help_em = doc.first("em").unwrap();
        assert_eq!(doc.trigger(help_em, "click"), 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["delegated:Help".to_string(), "direct:top_nav".to_string()]
        );

        // Other event types are ignored.
        assert_eq!(doc.trigger(help_em, "change"), 0);
    }

    #[test]
    fn test_delegated_scope_excludes_root_and_outside() {
        let doc = nav_page();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        doc.select("#top_nav").on(
            "click",
            Some("ul"),
            Arc::new(move |_: &dyn Element| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        let link = doc.first("a").unwrap();
        assert_eq!(doc.trigger(link, "click"), 0);
        assert_eq!(doc.trigger(doc.root(), "click"), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unparseable_scope_registers_nothing() {
        let doc = nav_page();
        let result = doc
            .select("#top_nav")
            .on("click", Some("li > a"), Arc::new(|_: &dyn Element| {}));
        assert!(result.is_err());
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_handler_sees_current_state() {
        let doc = MemoryDocument::new();
        let select = doc.append(doc.root(), NodeSpec::new("select").value("name"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        doc.select("select").on(
            "change",
            None,
            Arc::new(move |el: &dyn Element| s.lock().unwrap().push(el.value())),
        )
        .unwrap();

        doc.trigger(select, "change");
        doc.set_value(select, "price");
        doc.trigger(select, "change");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("name".to_string()), Some("price".to_string())]
        );
    }

    #[test]
    fn test_detach() {
        let doc = nav_page();
        let link = doc.first("a").unwrap();
        let handle = doc.element(link);
        assert!(handle.is_bindable());

        doc.detach(link);
        assert!(!handle.is_bindable());
        assert_eq!(handle.text(), "Home");
        assert_eq!(doc.select("a").len(), 1);
        assert_eq!(doc.trigger(link, "click"), 0);
    }

    #[test]
    fn test_from_json() {
        let doc = MemoryDocument::from_json(
            r#"{"tag":"body","children":[
                {"tag":"input","attrs":{"id":"agree","type":"checkbox"},"props":{"checked":true}}
            ]}"#,
        )
        .unwrap();
        let input = doc.element(doc.first("#agree").unwrap());
        assert_eq!(input.prop("checked"), Some(serde_json::json!(true)));
        assert!(MemoryDocument::from_json("{").is_err());
    }

    #[test]
    fn test_dataset_key() {
        assert_eq!(dataset_key("label"), "label");
        assert_eq!(dataset_key("nav-slot"), "navSlot");
        assert_eq!(dataset_key("a-b-c"), "aBC");
    }
}
