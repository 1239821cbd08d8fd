//! Source resolution: delivery entries → concrete (src, dest) specs.
//!
//! # Destination rules
//!
//! | `dest`            | Resolved to |
//! |-------------------|-------------|
//! | unset or empty    | the shared temp dir |
//! | relative (`foo`)  | temp dir joined with `foo` |
//! | absolute (`/etc`) | unchanged |
//!
//! The temp dir is allocated at most once per call, and never when the caller
//! already supplied one.

use crate::capability::{Connection, TempDirAllocator};
use crate::error::{BootstrapError, Result};
use crate::kv::{self, RAW_PARAMS_KEY};
use crate::types::{MISSING_SRC, OptionTree, PATH_ROOT, SourceSpec, scalar_text};
use serde_json::Value;
use tracing::debug;

/// Key a list of delivery entries by their `src`.
///
/// Accepted shapes:
/// - a sequence of entries, each a tree or a flat `key=value` string
/// - a single flat string or a single tree; either must carry `src`
///
/// An empty tree (the sources key was absent) yields no entries.
pub fn make_sources_map(sources: &Value) -> Result<OptionTree> {
    let mut map = OptionTree::new();
    match sources {
        Value::Null => {}
        Value::Object(tree) if tree.is_empty() => {}
        Value::Array(items) => {
            for item in items {
                insert_entry(&mut map, entry_tree(item)?)?;
            }
        }
        Value::String(_) | Value::Object(_) => insert_entry(&mut map, entry_tree(sources)?)?,
        Value::Bool(_) | Value::Number(_) => return Err(BootstrapError::config(MISSING_SRC)),
    }
    Ok(map)
}

fn entry_tree(item: &Value) -> Result<OptionTree> {
    match item {
        Value::Object(tree) => Ok(tree.clone()),
        Value::String(flat) => {
            let mut tree = kv::decode(flat)?;
            // Free-form words mean nothing to a delivery
            tree.remove(RAW_PARAMS_KEY);
            Ok(tree)
        }
        _ => Err(BootstrapError::config(MISSING_SRC)),
    }
}

fn insert_entry(map: &mut OptionTree, entry: OptionTree) -> Result<()> {
    let src = entry
        .get("src")
        .and_then(scalar_text)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BootstrapError::config(MISSING_SRC))?;
    map.insert(src, Value::Object(entry));
    Ok(())
}

/// Lazily allocated, memoized remote temporary directory for one call.
pub struct TempDirSlot<'a> {
    current: Option<String>,
    allocator: &'a dyn TempDirAllocator,
    connection: &'a dyn Connection,
    allocations: usize,
}

impl<'a> TempDirSlot<'a> {
    /// `current` is the directory the caller already shares, if any.
    pub fn new(
        current: Option<String>,
        allocator: &'a dyn TempDirAllocator,
        connection: &'a dyn Connection,
    ) -> Self {
        Self {
            current,
            allocator,
            connection,
            allocations: 0,
        }
    }

    /// Return the temp dir, allocating it on first use.
    pub fn get_or_allocate(&mut self) -> Result<&str> {
        if self.current.is_none() {
            let path = self
                .allocator
                .allocate_temp_dir(self.connection)
                .map_err(|e| BootstrapError::temp_dir(format!("{:#}", e)))?;
            debug!(host = self.connection.host(), tmp = %path, "allocated remote temp dir");
            self.allocations += 1;
            self.current = Some(path);
        }
        Ok(self.current.as_deref().unwrap_or_default())
    }

    /// Number of allocator calls made so far.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn into_inner(self) -> Option<String> {
        self.current
    }
}

/// Join a relative remote path onto `base`.
pub fn join_remote(base: &str, relative: &str) -> String {
    format!("{}{}{}", base.trim_end_matches(PATH_ROOT), PATH_ROOT, relative)
}

/// Apply the destination rules to one spec.
pub fn resolve_dest(spec: &mut SourceSpec, tmp: &mut TempDirSlot<'_>) -> Result<()> {
    let resolved = match spec.dest.as_deref() {
        None | Some("") => tmp.get_or_allocate()?.to_string(),
        Some(dest) if !dest.starts_with(PATH_ROOT) => join_remote(tmp.get_or_allocate()?, dest),
        Some(dest) => dest.to_string(),
    };
    spec.dest = Some(resolved);
    Ok(())
}

/// Turn the merged sources map into resolved specs, in map order.
pub fn resolve_sources(sources: &OptionTree, tmp: &mut TempDirSlot<'_>) -> Result<Vec<SourceSpec>> {
    let mut specs = Vec::with_capacity(sources.len());
    for entry in sources.values() {
        let tree = entry
            .as_object()
            .ok_or_else(|| BootstrapError::config(MISSING_SRC))?;
        let mut spec = SourceSpec::from_tree(tree)?;
        resolve_dest(&mut spec, tmp)?;
        specs.push(spec);
    }
    Ok(specs)
}
