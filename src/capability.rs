//! Capability contracts consumed by the dispatcher.
//!
//! The dispatcher never moves files or runs remote processes itself. Everything
//! that touches a remote host sits behind one of these traits: the connection,
//! the temporary-directory provisioner, the delivery module and the module
//! handlers (including the generic fallback executor).
//!
//! # Contract
//!
//! - Capabilities report module-level failure as a `ResultRecord` with
//!   `succeeded == false`.
//! - Capabilities MAY return `Err` (or panic). The dispatcher converts either
//!   into a failed record; nothing escapes to the caller.
//! - Implementations are shared across calls and threads, hence `Send + Sync`.

use crate::result::ResultRecord;
use crate::types::OptionTree;
use serde::Serialize;

/// An open connection to one remote target.
pub trait Connection: Send + Sync {
    /// Host name used in log events.
    fn host(&self) -> &str;
}

/// Provisions the shared remote working directory.
pub trait TempDirAllocator: Send + Sync {
    /// Create a fresh temporary directory on the target and return its path.
    fn allocate_temp_dir(&self, connection: &dyn Connection) -> anyhow::Result<String>;
}

/// Everything a capability may need to know about the current call.
#[derive(Clone, Copy)]
pub struct InvocationContext<'a> {
    pub connection: &'a dyn Connection,
    /// Shared remote temporary directory, if one exists yet
    pub tmp: Option<&'a str>,
    /// Caller-supplied extra context (variables), passed through untouched
    pub inject: &'a OptionTree,
    /// Whether remote temporary files must survive this invocation
    pub keep_remote_files: bool,
}

/// One file delivery, with its destination already resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRequest {
    pub src: String,
    /// Flat key=value form of the resolved entry
    pub args: String,
    /// Structured form of the resolved entry
    pub complex_args: OptionTree,
    /// The delivery must leave the remote temporary directory in place
    pub retain_temp_files: bool,
}

/// The file-copy operation.
pub trait DeliveryCapability: Send + Sync {
    fn deliver(
        &self,
        ctx: &InvocationContext<'_>,
        request: &DeliveryRequest,
    ) -> anyhow::Result<ResultRecord>;
}

/// A module invocation handed to a handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleCall {
    pub name: String,
    pub args: String,
    pub complex_args: Option<OptionTree>,
}

/// A specialized module handler or the generic fallback executor.
pub trait ModuleHandler: Send + Sync {
    fn invoke(&self, ctx: &InvocationContext<'_>, call: &ModuleCall)
    -> anyhow::Result<ResultRecord>;
}

/// Allocator that always hands out the same path. Used for planning runs where
/// no remote directory should actually be created.
#[derive(Debug, Clone)]
pub struct FixedTempDir(pub String);

impl TempDirAllocator for FixedTempDir {
    fn allocate_temp_dir(&self, _connection: &dyn Connection) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Connection stand-in for runs that never reach a capability.
#[derive(Debug, Clone)]
pub struct LocalConnection {
    pub host: String,
}

impl Connection for LocalConnection {
    fn host(&self) -> &str {
        &self.host
    }
}
