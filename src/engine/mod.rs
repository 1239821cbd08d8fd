//! Engine modules — the part that talks to capabilities.
//!
//! The engine sits between the canonical option trees produced by `logic` and
//! the delivery/handler capabilities. It resolves sources, sequences the
//! invocations and shapes the result for the reporting observer.

pub mod annotate;
pub mod dispatcher;
pub mod sources;

pub use annotate::annotate;
pub use dispatcher::{Bootstrap, DispatchPlan, Dispatched, contain_fault, plan};
pub use sources::{TempDirSlot, make_sources_map, resolve_sources};
