//! Logic modules — pure transforms over `OptionTree`s.
//!
//! The logic layer turns the two raw argument representations into canonical
//! trees. Nothing here performs I/O or talks to a capability.
//!
//! # Modules
//!
//! - `filter` — recursive removal of omitted-value sentinels
//! - `merge` — deep merge with last-writer-wins on conflicts
//! - `partition` — split the sources subtree from the passthrough options

pub mod filter;
pub mod merge;
pub mod partition;

pub use filter::{filter_recursive, strip_omitted};
pub use merge::merge_trees;
pub use partition::{ensure_single_passthrough, partition_options};
