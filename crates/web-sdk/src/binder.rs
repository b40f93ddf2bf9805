//! Binder — the public face of the tracker. Binds category definitions to
//! elements and offers the imperative `push_event` escape hatch.

use std::sync::Arc;

use tracing::{debug, info, warn};
use trackthat_core::{TrackError, TrackResult, TrackerConfig, TrackingBackend};

use crate::definition::{parse_definition, CategoryDefinitions, EventDefinition, RawDefinition};
use crate::dispatcher::{DispatchOutcome, Dispatcher, EventSource};
use crate::dom::{Element, ElementQuery};
use crate::surface::{DebugSurface, TracingSurface};

/// Counts from binding one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindSummary {
    /// Definitions that got a listener.
    pub bound: usize,
    /// Definitions with no elements to bind to.
    pub skipped: usize,
    /// Definitions that failed to parse or whose listener could not be
    /// registered.
    pub rejected: usize,
}

impl BindSummary {
    fn merge(&mut self, other: BindSummary) {
        self.bound += other.bound;
        self.skipped += other.skipped;
        self.rejected += other.rejected;
    }
}

/// Declarative event tracker.
///
/// ```ignore
/// let tracker = Tracker::new(TrackerConfig::default(), backend);
/// tracker.category("Home Page", [
///     RawDefinition::new("Sidebar", "Callout Click", doc.query("#sidebar_callout")),
///     RawDefinition::new("Sort Change", "val()", doc.query("#filters"))
///         .scope("select.sorter")
///         .event_type("change"),
///     RawDefinition::new("Top Nav Click", "attr:href", doc.query("#top_nav")).scope("a"),
/// ]);
/// ```
#[derive(Clone)]
pub struct Tracker {
    dispatcher: Arc<Dispatcher>,
}

impl Tracker {
    /// Tracker whose debug output goes through `tracing`.
    pub fn new(config: TrackerConfig, backend: Arc<dyn TrackingBackend>) -> Self {
        Self::with_surface(config, backend, Arc::new(TracingSurface))
    }

    pub fn with_surface(
        config: TrackerConfig,
        backend: Arc<dyn TrackingBackend>,
        surface: Arc<dyn DebugSurface>,
    ) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(config, backend, surface)),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        self.dispatcher.config()
    }

    /// Whether events would currently be emitted, to the backend or the
    /// debug surface.
    pub fn enabled(&self) -> bool {
        self.dispatcher.gate().is_enabled()
    }

    /// Bind every definition under `category`, in order. Nothing here fails:
    /// malformed definitions are logged and counted, definitions without
    /// elements are skipped.
    pub fn category<I>(&self, category: &str, definitions: I) -> BindSummary
    where
        I: IntoIterator<Item = RawDefinition>,
    {
        let mut summary = BindSummary::default();
        for (index, raw) in definitions.into_iter().enumerate() {
            match parse_definition(&raw, &self.config().default_event_type)
                .and_then(|definition| self.attach(category, definition))
            {
                Ok(true) => summary.bound += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    warn!(category, index, error = %e, "event definition rejected");
                    summary.rejected += 1;
                }
            }
        }
        info!(
            category,
            bound = summary.bound,
            skipped = summary.skipped,
            rejected = summary.rejected,
            "category bound"
        );
        summary
    }

    /// Bind a category block from a definition file, resolving element
    /// selectors through `query`.
    pub fn bind_definitions(&self, block: &CategoryDefinitions, query: &dyn ElementQuery) -> BindSummary {
        let mut raws = Vec::with_capacity(block.events.len());
        let mut summary = BindSummary::default();
        for (index, values) in block.events.iter().enumerate() {
            match RawDefinition::from_positional(values, query) {
                Ok(raw) => raws.push(raw),
                Err(e) => {
                    warn!(category = %block.category, index, error = %e, "event definition rejected");
                    summary.rejected += 1;
                }
            }
        }
        summary.merge(self.category(&block.category, raws));
        summary
    }

    /// Manually send an event for `element`. Prefer bound definitions; this
    /// exists for handlers that stop propagation before tracking sees them.
    pub fn push_event(&self, element: &dyn Element, source: EventSource) -> TrackResult<DispatchOutcome> {
        if !element.is_bindable() {
            warn!("push_event requires a live element handle");
            return Err(TrackError::InvalidCaller(
                "push_event requires a live element handle".into(),
            ));
        }
        self.dispatcher.dispatch(element, &source)
    }

    /// Register the definition's listener. `Ok(false)` when there is nothing
    /// to bind to.
    fn attach(&self, category: &str, definition: EventDefinition) -> TrackResult<bool> {
        let Some(elements) = definition.bindable_elements() else {
            debug!(category, action = %definition.action, "no elements, binding skipped");
            return Ok(false);
        };

        let source = EventSource::options(category, definition.action.clone(), definition.label.clone());
        let dispatcher = self.dispatcher.clone();
        elements.on(
            &definition.event_type,
            definition.scope.as_deref(),
            Arc::new(move |target: &dyn Element| {
                // Rejections are already logged by the dispatcher.
                let _ = dispatcher.dispatch(target, &source);
            }),
        )?;

        debug!(
            category,
            action = %definition.action,
            event_type = %definition.event_type,
            scope = ?definition.scope,
            elements = elements.len(),
            "listener bound"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{MemoryDocument, NodeSpec};
    use crate::surface::CaptureSurface;
    use trackthat_core::event_bus::{capture_backend, CaptureBackend};
    use trackthat_core::TrackedEvent;

    fn page() -> MemoryDocument {
        MemoryDocument::from_spec(
            NodeSpec::new("body")
                .child(NodeSpec::new("div").id("sidebar_callout").text("Read more"))
                .child(NodeSpec::new("div").id("banner").attr("data-campaign", "fall"))
                .child(
                    NodeSpec::new("div").id("filter_controls").child(
                        NodeSpec::new("select")
                            .class("sorter")
                            .attr("name", "sort")
                            .value("name"),
                    ),
                )
                .child(
                    NodeSpec::new("ul")
                        .id("top_nav")
                        .child(NodeSpec::new("li").child(NodeSpec::new("a").attr("href", "/home").text("HomePage")))
                        .child(NodeSpec::new("li").child(NodeSpec::new("a").attr("href", "/artists").text("Artists")))
                        .child(NodeSpec::new("li").child(NodeSpec::new("a").attr("href", "/help").text("Help"))),
                ),
        )
    }

    fn tracker(config: TrackerConfig) -> (Tracker, Arc<CaptureBackend>, Arc<CaptureSurface>) {
        let backend = capture_backend();
        let surface = Arc::new(CaptureSurface::new());
        let tracker = Tracker::with_surface(config, backend.clone(), surface.clone());
        (tracker, backend, surface)
    }

    #[test]
    fn test_category_binds_in_order() {
        let doc = page();
        let (tracker, backend, _) = tracker(TrackerConfig::default());

        let summary = tracker.category(
            "Home Page",
            [
                RawDefinition::new("Sidebar", "Callout Click", doc.query("#sidebar_callout")),
                RawDefinition::new("Sort Change", "val()", doc.query("#filter_controls"))
                    .scope("select.sorter")
                    .event_type("change"),
                RawDefinition::new("Banner Click", "", doc.query("#banner")),
            ],
        );
        assert_eq!(summary, BindSummary { bound: 3, skipped: 0, rejected: 0 });
        assert_eq!(doc.listener_count(), 3);

        doc.trigger(doc.first("#sidebar_callout").unwrap(), "click");
        let select = doc.first("select").unwrap();
        doc.set_value(select, "price");
        doc.trigger(select, "change");
        doc.trigger(select, "click");
        doc.trigger(doc.first("#banner").unwrap(), "click");

        assert_eq!(
            backend.events(),
            vec![
                TrackedEvent::new("Home Page", "Sidebar", "Callout Click"),
                TrackedEvent::new("Home Page", "Sort Change", "price"),
                TrackedEvent::new("Home Page", "Banner Click", ""),
            ]
        );
    }

    #[test]
    fn test_delegated_scope_uses_matched_element() {
        let doc = page();
        let (tracker, backend, _) = tracker(TrackerConfig::default());

        tracker.category(
            "Home Page",
            [RawDefinition::new("Top Nav Click", "attr:href", doc.query("#top_nav")).scope("a")],
        );

        // Links added after binding are still tracked.
        let li = doc.append(doc.first("#top_nav").unwrap(), NodeSpec::new("li"));
        let late = doc.append(li, NodeSpec::new("a").attr("href", "/late").text("Late"));

        let artists = doc.select("a").ids()[1];
        doc.trigger(artists, "click");
        doc.trigger(late, "click");
        doc.trigger(li, "click");

        assert_eq!(
            backend.events(),
            vec![
                TrackedEvent::new("Home Page", "Top Nav Click", "/artists"),
                TrackedEvent::new("Home Page", "Top Nav Click", "/late"),
            ]
        );
    }

    #[test]
    fn test_skips_and_rejects_without_failing() {
        let doc = page();
        let (tracker, _, _) = tracker(TrackerConfig::default());

        let summary = tracker.category(
            "Home Page",
            [
                RawDefinition::new("Missing", "", doc.query("#does_not_exist")),
                RawDefinition {
                    action: Some("No Elements".into()),
                    ..Default::default()
                },
                RawDefinition::new("", "x", doc.query("#banner")),
                RawDefinition::new("Bad", "prop:", doc.query("#banner")),
                RawDefinition::new("Good", "", doc.query("#banner")),
            ],
        );
        assert_eq!(summary, BindSummary { bound: 1, skipped: 2, rejected: 2 });
        assert_eq!(doc.listener_count(), 1);
    }

    #[test]
    fn test_unsupported_scope_is_rejected() {
        let doc = page();
        let (tracker, backend, _) = tracker(TrackerConfig::default());

        let summary = tracker.category(
            "Home Page",
            [
                RawDefinition::new("Top Nav Click", "text()", doc.query("#top_nav")).scope("li > a"),
                RawDefinition::new("Sidebar", "", doc.query("#sidebar_callout")),
            ],
        );
        assert_eq!(summary, BindSummary { bound: 1, skipped: 0, rejected: 1 });
        assert_eq!(summary.bound, doc.listener_count());

        doc.trigger(doc.first("a").unwrap(), "click");
        assert_eq!(backend.count(), 0);
    }

    #[test]
    fn test_binds_while_disabled_and_tracks_once_ready() {
        let doc = page();
        let (tracker, backend, _) = tracker(TrackerConfig::default());
        backend.set_ready(false);
        assert!(!tracker.enabled());

        tracker.category(
            "Home Page",
            [RawDefinition::new("Sidebar", "text()", doc.query("#sidebar_callout"))],
        );
        let callout = doc.first("#sidebar_callout").unwrap();
        doc.trigger(callout, "click");
        assert_eq!(backend.count(), 0);

        backend.set_ready(true);
        assert!(tracker.enabled());
        doc.trigger(callout, "click");
        assert_eq!(
            backend.events(),
            vec![TrackedEvent::new("Home Page", "Sidebar", "Read more")]
        );
    }

    #[test]
    fn test_listener_drops_blank_action() {
        let doc = page();
        let (tracker, backend, surface) = tracker(TrackerConfig::debug());

        tracker.category(
            "Home Page",
            [RawDefinition::new("data:missing", "", doc.query("#banner"))],
        );
        doc.trigger(doc.first("#banner").unwrap(), "click");
        assert_eq!(backend.count(), 0);
        assert!(surface.logs().is_empty());
    }

    #[test]
    fn test_push_event() {
        let doc = page();
        let (tracker, backend, _) = tracker(TrackerConfig::default());
        let banner = doc.element(doc.first("#banner").unwrap());

        let outcome = tracker
            .push_event(
                &banner,
                EventSource::parse("Homepage", "Banner", Some("data:campaign")).unwrap(),
            )
            .unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Sent(TrackedEvent::new("Homepage", "Banner", "fall"))
        );

        let derived = tracker
            .push_event(
                &banner,
                EventSource::derive(|_| TrackedEvent::new("C", "A", "L")),
            )
            .unwrap();
        assert_eq!(derived, DispatchOutcome::Sent(TrackedEvent::new("C", "A", "L")));
        assert_eq!(backend.count(), 2);
    }

    #[test]
    fn test_push_event_rejects_detached_element() {
        let doc = page();
        let (tracker, backend, _) = tracker(TrackerConfig::default());
        let id = doc.first("#banner").unwrap();
        let banner = doc.element(id);
        doc.detach(id);

        let result = tracker.push_event(
            &banner,
            EventSource::parse("Homepage", "Banner", None).unwrap(),
        );
        assert!(matches!(result, Err(TrackError::InvalidCaller(_))));
        assert_eq!(backend.count(), 0);
    }

    #[test]
    fn test_bind_definitions_from_file() {
        let doc = page();
        let (tracker, backend, _) = tracker(TrackerConfig::default());
        let blocks = crate::definition::load_definitions(
            r##"{"category":"Home Page","events":[
                ["Top Nav Click","text()","#top_nav","a"],
                ["Sort Change","val()","#filter_controls","select","change"],
                ["Broken","x"],
                ["Ghost","","#ghost"]
            ]}"##,
        )
        .unwrap();

        let summary = tracker.bind_definitions(&blocks[0], &doc);
        assert_eq!(summary, BindSummary { bound: 2, skipped: 1, rejected: 1 });

        doc.trigger(doc.select("a").ids()[2], "click");
        assert_eq!(
            backend.events(),
            vec![TrackedEvent::new("Home Page", "Top Nav Click", "Help")]
        );
    }

    #[test]
    fn test_selection_len_matches_listeners() {
        let doc = page();
        let (tracker, _, _) = tracker(TrackerConfig::default());
        let links = doc.query("#top_nav a");
        assert_eq!(links.len(), 3);

        tracker.category("Nav", [RawDefinition::new("Click", "text()", links)]);
        assert_eq!(doc.listener_count(), 3);
    }
}
