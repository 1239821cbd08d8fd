//! Result annotation for the reporting observer.
//!
//! The dispatcher runs under its own module name, but what the operator cares
//! about is the passthrough module. `annotate` records that module's identity
//! in the side-channel field; the observer later swaps it in for the
//! dispatcher's own invocation metadata.

use crate::result::{CleanedInvocation, ResultRecord};
use crate::types::OptionTree;

/// Attach `cleaned_invocation` built from the non-absent fields.
pub fn annotate(
    mut result: ResultRecord,
    module_name: Option<&str>,
    module_args: Option<&str>,
    module_complex_args: Option<&OptionTree>,
) -> ResultRecord {
    result.cleaned_invocation = Some(CleanedInvocation {
        module_name: module_name.map(str::to_string),
        module_args: module_args.map(str::to_string),
        module_complex_args: module_complex_args.cloned(),
    });
    result
}
