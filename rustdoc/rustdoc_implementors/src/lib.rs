//! # `rustdoc_implementors`
//!
//! Tools to work with the index data that `rustdoc` writes next to the rendered
//! HTML pages:
//!
//! - `implementors/<path>/trait.<Name>.js`, one data loader per trait page,
//!   contributing the list of known implementors grouped by crate.
//! - `<crate>/sidebar-items.js`, the sidebar entries of each crate.
//!
//! The key piece is the [`PageController`]: it owns the [`Registry`] of
//! implementors for a trait page and decides when the batches contributed by
//! [`DataLoader`]s become visible. A data loader may run before or after the
//! controller is ready; batches that arrive early are parked and drained on
//! [`PageController::initialize`].
//!
//! ```rust
//! use rustdoc_implementors::{DataLoader, ImplementorBatch, ImplementorRecord, PageController};
//!
//! let mut batch = ImplementorBatch::new();
//! batch.insert("eyre", vec![ImplementorRecord::new("impl Drop for Report")]);
//!
//! let mut controller = PageController::default();
//! // The data loader runs first: the batch is parked.
//! DataLoader::new(batch).publish(&mut controller);
//! assert!(controller.registry().is_empty());
//!
//! // The controller becomes ready and drains the pending batch.
//! controller.initialize();
//! assert_eq!(controller.registry().get("eyre").unwrap().len(), 1);
//! ```
pub mod config;
pub mod controller;
pub mod literal;
mod loader;
mod registry;
pub mod sidebar;
pub mod site;
mod types;

pub use controller::{
    ImplementorContext, Initialization, PageController, PendingPolicy, Readiness, Registration,
};
pub use loader::DataLoader;
pub use registry::{MergeOutcome, Registry};
pub use types::{ImplementorBatch, ImplementorRecord};
