//! Bootstrap dispatch library
//!
//! Partitions one module invocation into file deliveries plus a single
//! passthrough module, runs them through caller-supplied capabilities, and
//! shapes the result so reports show the passthrough module.

pub mod capability;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod kv;
pub mod logic;
pub mod observer;
pub mod registry;
pub mod remote_files;
pub mod result;
pub mod types;

// Re-export main types for convenience
pub use capability::{
    Connection, DeliveryCapability, DeliveryRequest, FixedTempDir, InvocationContext,
    LocalConnection, ModuleCall, ModuleHandler, TempDirAllocator,
};
pub use config::BootstrapConfig;
pub use engine::{Bootstrap, DispatchPlan, Dispatched, annotate};
pub use error::BootstrapError;
pub use observer::InvocationObserver;
pub use registry::HandlerRegistry;
pub use remote_files::{KeepRemoteFilesGuard, RemoteFilesPolicy};
pub use result::{CLEANED_INVOCATION_KEY, CleanedInvocation, Invocation, ResultRecord};
pub use types::{DispatchStage, InvocationPath, OptionTree, PassthroughSpec, SourceSpec};
