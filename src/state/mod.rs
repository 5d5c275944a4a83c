//! Layout state machine (pure).
//!
//! Every transition is a synchronous function of the committed snapshot,
//! the batch and the host's data source, testable without any UI.

pub mod attributes;
pub mod changes;
pub mod compensation;
pub mod controller;
mod diff;
pub(crate) mod frames;
pub mod provider;
pub mod snapshot;
pub mod tracker;
pub mod viewport;
pub(crate) mod visible_cache;

// Re-export for convenience
pub use attributes::{LayoutAttributes, Transition, TransitionAttributes};
pub use changes::StructuralChange;
pub use compensation::CompensationState;
pub use controller::StateController;
pub use provider::{ElementSpec, LayoutDataSource, SectionSpec, SectionedDataSource};
pub use snapshot::{ContentOffsetSnapshot, Edge};
pub use tracker::ChangeTracker;
pub use viewport::Viewport;
pub use visible_cache::ScanMode;
