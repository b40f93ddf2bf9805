//! Declarative event tracking — bind (category, action, label) event
//! definitions to page elements and forward what users do to an analytics
//! backend.
//!
//! # Modules
//!
//! - [`option`] — Option grammar (`val()`, `text()`, `attr:`, `prop:`, `data:`)
//! - [`definition`] — Positional definition table and definition files
//! - [`gate`] — Activation gate (backend ready or debug mode)
//! - [`dispatcher`] — Resolves and emits a single event
//! - [`binder`] — [`Tracker`], the public entry point
//! - [`surface`] — Debug-mode output
//! - [`dom`] — DOM collaborator traits and an in-memory document
//! - [`adaptors`] — Backend adaptors (classic GA queue, GTM dataLayer)

pub mod adaptors;
pub mod binder;
pub mod definition;
pub mod dispatcher;
pub mod dom;
pub mod gate;
pub mod option;
pub mod surface;

pub use adaptors::ga::GaAdaptor;
pub use adaptors::gtm::GtmAdaptor;
pub use adaptors::{QueueBackend, WebAdaptor};
pub use binder::{BindSummary, Tracker};
pub use definition::{EventDefinition, RawDefinition};
pub use dispatcher::{DispatchOutcome, EventSource};
pub use option::OptionRule;
