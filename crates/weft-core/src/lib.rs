//! weft-core — the state side of the weft data-binding engine.
//!
//! Provides the path-addressed property store, the change observer that
//! batches one mutation turn into one change event, the synchronous event
//! bus, and the [`Entity`] that ties the three together for one controller.
//!
//! All state lives in `serde_json` values with `preserve_order` enabled, so
//! mapping nodes keep their insertion order.

pub mod entity;
pub mod events;
pub mod observer;
pub mod path;
pub mod store;

pub use entity::Entity;
pub use events::{BusEvent, EventBus, HandlerId};
pub use observer::{ChangeEvent, ChangeObserver};
pub use store::{is_truthy, value_text, PropertyStore, ValueKind};

/// Crate version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
