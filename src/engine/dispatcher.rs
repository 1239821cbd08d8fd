//! Dispatcher: deliver every source, then run the one passthrough module.
//!
//! # Stages
//!
//! | Stage                  | Work | Early exit |
//! |------------------------|------|------------|
//! | `Filtering`            | strip the omit sentinel from both inputs | bad flat quoting |
//! | `Merging`              | split each input, merge the passthrough halves | |
//! | `Partitioning`         | enforce a single passthrough module | >1 module |
//! | `ResolvingSources`     | key entries by `src`, resolve `dest` | missing `src` |
//! | `Delivering`           | one delivery per source, in order | first failure |
//! | `ResolvingPassthrough` | registry lookup or fallback | |
//! | `Invoking`             | run the module, contain faults | |
//! | `Done`                 | annotate the result | |
//!
//! Configuration mistakes come back as `Err`. Delivery failures and module
//! faults come back as a failed `ResultRecord` inside `Ok`.

use crate::capability::{
    Connection, DeliveryCapability, DeliveryRequest, InvocationContext, ModuleCall,
    TempDirAllocator,
};
use crate::config::BootstrapConfig;
use crate::engine::annotate::annotate;
use crate::engine::sources::{TempDirSlot, make_sources_map, resolve_sources};
use crate::error::{BootstrapError, Result};
use crate::kv::{self, RAW_PARAMS_KEY};
use crate::logic::{ensure_single_passthrough, merge_trees, partition_options, strip_omitted};
use crate::registry::HandlerRegistry;
use crate::remote_files::RemoteFilesPolicy;
use crate::result::ResultRecord;
use crate::types::{DispatchStage, OptionTree, PassthroughSpec, SourceSpec, parse_flag, scalar_text};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Passthrough option selecting the generic executor directly.
pub const SKIP_HANDLER_KEY: &str = "skip_handler";

/// Everything decided before any capability runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchPlan {
    /// Shared remote temp dir (caller-supplied or allocated while planning)
    pub tmp: Option<String>,
    /// Deliveries, in execution order
    pub sources: Vec<SourceSpec>,
    /// The module to run afterwards, if any
    pub passthrough: Option<PassthroughSpec>,
}

/// Outcome of `Bootstrap::run`: the annotated result and what it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub result: ResultRecord,
    pub module_name: String,
    pub module_args: String,
    pub complex_args: Option<OptionTree>,
}

/// The partition/merge/dispatch engine.
///
/// Holds no per-call state; one instance can serve many targets concurrently.
pub struct Bootstrap {
    config: BootstrapConfig,
    temp_dirs: Arc<dyn TempDirAllocator>,
    delivery: Arc<dyn DeliveryCapability>,
    handlers: HandlerRegistry,
}

impl Bootstrap {
    pub fn new(
        config: BootstrapConfig,
        temp_dirs: Arc<dyn TempDirAllocator>,
        delivery: Arc<dyn DeliveryCapability>,
        handlers: HandlerRegistry,
    ) -> Self {
        Self {
            config,
            temp_dirs,
            delivery,
            handlers,
        }
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Filter, merge and partition the two argument forms and resolve every
    /// source. Only the temp dir allocator may be called.
    pub fn plan(
        &self,
        connection: &dyn Connection,
        tmp: Option<String>,
        module_args: &str,
        complex_args: Option<&OptionTree>,
    ) -> Result<DispatchPlan> {
        plan(
            &self.config,
            self.temp_dirs.as_ref(),
            connection,
            tmp,
            module_args,
            complex_args,
        )
    }

    /// Run one bootstrap call against one target.
    ///
    /// `module_name`/`module_args` are the dispatcher's own invocation; they
    /// are reported only when there is no passthrough module.
    pub fn run(
        &self,
        connection: &dyn Connection,
        tmp: Option<String>,
        module_name: &str,
        module_args: &str,
        inject: &OptionTree,
        complex_args: Option<&OptionTree>,
    ) -> Result<Dispatched> {
        let Dispatched {
            result,
            module_name,
            module_args,
            complex_args,
        } = self.dispatch(connection, tmp, module_name, module_args, inject, complex_args)?;

        enter(DispatchStage::Done);
        let result = annotate(
            result,
            Some(&module_name),
            Some(&module_args),
            complex_args.as_ref(),
        );
        Ok(Dispatched {
            result,
            module_name,
            module_args,
            complex_args,
        })
    }

    fn dispatch(
        &self,
        connection: &dyn Connection,
        tmp: Option<String>,
        module_name: &str,
        module_args: &str,
        inject: &OptionTree,
        complex_args: Option<&OptionTree>,
    ) -> Result<Dispatched> {
        let plan = self.plan(connection, tmp, module_args, complex_args)?;
        let tmp = plan.tmp.as_deref();
        let mut policy = RemoteFilesPolicy::new(self.config.keep_remote_files);
        let mut changed = false;

        enter(DispatchStage::Delivering);
        for source in &plan.sources {
            let (result, request) = {
                let guard = policy.override_with(true);
                let complex = source.to_tree();
                let request = DeliveryRequest {
                    src: source.src.clone(),
                    args: kv::encode(&complex),
                    complex_args: complex,
                    retain_temp_files: guard.keep_remote_files(),
                };
                let ctx = InvocationContext {
                    connection,
                    tmp,
                    inject,
                    keep_remote_files: guard.keep_remote_files(),
                };
                info!(
                    host = connection.host(),
                    src = %source.src,
                    dest = source.dest.as_deref().unwrap_or_default(),
                    "delivering source"
                );
                let result = contain_fault(&self.config.delivery_module, || {
                    self.delivery.deliver(&ctx, &request)
                });
                (result, request)
            };

            if !result.is_successful() {
                warn!(src = %request.src, "delivery failed; skipping remaining work");
                return Ok(Dispatched {
                    result,
                    module_name: self.config.delivery_module.clone(),
                    module_args: request.args,
                    complex_args: Some(request.complex_args),
                });
            }
            changed |= result.changed();
        }

        let Some(passthrough) = plan.passthrough else {
            debug!(sources = plan.sources.len(), "no passthrough module");
            return Ok(Dispatched {
                result: ResultRecord::ok().with_field("changed", changed),
                module_name: module_name.to_string(),
                module_args: module_args.to_string(),
                complex_args: complex_args.cloned(),
            });
        };

        enter(DispatchStage::ResolvingPassthrough);
        let (path, handler) = self
            .handlers
            .resolve(&passthrough.name, passthrough.skip_handler);
        let call = ModuleCall {
            name: passthrough.name,
            args: passthrough.module_args,
            complex_args: passthrough.complex_args,
        };

        enter(DispatchStage::Invoking);
        info!(host = connection.host(), module = %call.name, path = %path, "invoking passthrough module");
        let ctx = InvocationContext {
            connection,
            tmp,
            inject,
            keep_remote_files: policy.keep_remote_files(),
        };
        let result = contain_fault(&call.name, || handler.invoke(&ctx, &call));

        Ok(Dispatched {
            result,
            module_name: call.name,
            module_args: call.args,
            complex_args: call.complex_args,
        })
    }
}

/// Planning half of a dispatch call, usable without any delivery or handler
/// capability.
pub fn plan(
    config: &BootstrapConfig,
    temp_dirs: &dyn TempDirAllocator,
    connection: &dyn Connection,
    tmp: Option<String>,
    module_args: &str,
    complex_args: Option<&OptionTree>,
) -> Result<DispatchPlan> {
    let omit = config.omit_token.as_str();
    let key = config.sources_key.as_str();

    enter(DispatchStage::Filtering);
    let complex = complex_args
        .map(|tree| strip_omitted(tree, omit))
        .unwrap_or_default();
    let mut flat = strip_omitted(&kv::decode(module_args)?, omit);
    if let Some(raw) = flat.remove(RAW_PARAMS_KEY) {
        warn!(ignored = %raw, "free-form arguments are not accepted here; ignoring");
    }

    enter(DispatchStage::Merging);
    let (sources_complex, passthrough_complex) = partition_options(&complex, key);
    let (sources_flat, passthrough_flat) = partition_options(&flat, key);
    let passthrough = merge_trees(&passthrough_complex, &passthrough_flat);

    enter(DispatchStage::Partitioning);
    ensure_single_passthrough(&passthrough)?;
    let passthrough = passthrough
        .into_iter()
        .next()
        .map(|(name, value)| passthrough_spec(name, value))
        .transpose()?;

    enter(DispatchStage::ResolvingSources);
    let sources = merge_trees(
        &strip_omitted(&make_sources_map(&sources_complex)?, omit),
        &strip_omitted(&make_sources_map(&sources_flat)?, omit),
    );
    let mut slot = TempDirSlot::new(tmp, temp_dirs, connection);
    let sources = resolve_sources(&sources, &mut slot)?;

    Ok(DispatchPlan {
        tmp: slot.into_inner(),
        sources,
        passthrough,
    })
}

fn enter(stage: DispatchStage) {
    debug!(stage = %stage, "dispatch stage");
}

/// Build the passthrough spec from its single merged entry.
fn passthrough_spec(name: String, value: Value) -> Result<PassthroughSpec> {
    match value {
        Value::Object(mut options) => {
            let skip_handler = match options.remove(SKIP_HANDLER_KEY) {
                None => false,
                Some(flag) => parse_flag(&flag).ok_or_else(|| {
                    BootstrapError::config(format!(
                        "{} for module {} must be a boolean, got {}",
                        SKIP_HANDLER_KEY, name, flag
                    ))
                })?,
            };
            Ok(PassthroughSpec {
                module_args: kv::encode(&options),
                complex_args: Some(options),
                name,
                skip_handler,
            })
        }
        Value::Array(_) => Err(BootstrapError::config(format!(
            "Arguments for module {} must be a string or a mapping",
            name
        ))),
        scalar => Ok(PassthroughSpec {
            module_args: scalar_text(&scalar).unwrap_or_default(),
            complex_args: None,
            name,
            skip_handler: false,
        }),
    }
}

/// Run `invoke`, turning an error or a panic into a failed record.
pub fn contain_fault<F>(module_name: &str, invoke: F) -> ResultRecord
where
    F: FnOnce() -> anyhow::Result<ResultRecord>,
{
    let fault = match panic::catch_unwind(AssertUnwindSafe(invoke)) {
        Ok(Ok(result)) => return result,
        Ok(Err(err)) => format!("{:#}", err),
        Err(payload) => panic_text(payload.as_ref()),
    };
    warn!(module = module_name, fault = %fault, "module invocation faulted");
    ResultRecord::failed(format!(
        "Encountered error in {} module: {}",
        module_name, fault
    ))
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "module panicked".to_string()
    }
}
