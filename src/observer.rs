//! Reporting-side cleanup of dispatcher results.
//!
//! Results produced by the dispatcher carry a `cleaned_invocation` side
//! channel. Before a result is displayed, the observer copies it over the
//! result's own `invocation` (filling gaps with defaults) and deletes the side
//! channel, so reports show the passthrough module instead of the dispatcher.

use crate::result::{Invocation, ResultRecord};
use tracing::debug;

/// Observer hooked into the ok/failed result callbacks.
#[derive(Debug, Clone, Default)]
pub struct InvocationObserver {
    defaults: Invocation,
}

impl InvocationObserver {
    /// Observer with the standard defaults: empty name, empty args, empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_ok(&self, host: &str, result: &mut ResultRecord) -> bool {
        self.on_any(host, result)
    }

    pub fn on_failed(&self, host: &str, result: &mut ResultRecord) -> bool {
        self.on_any(host, result)
    }

    fn on_any(&self, host: &str, result: &mut ResultRecord) -> bool {
        let cleaned = self.clean(result);
        if cleaned {
            debug!(host, "replaced invocation metadata from side channel");
        }
        cleaned
    }

    /// Consume the side channel. Returns false when there was none.
    pub fn clean(&self, result: &mut ResultRecord) -> bool {
        let Some(cleaned) = result.cleaned_invocation.take() else {
            return false;
        };

        let invocation = result.invocation.get_or_insert_with(Invocation::default);
        invocation.module_name = cleaned
            .module_name
            .unwrap_or_else(|| self.defaults.module_name.clone());
        invocation.module_args = cleaned
            .module_args
            .unwrap_or_else(|| self.defaults.module_args.clone());
        invocation.module_complex_args = cleaned
            .module_complex_args
            .unwrap_or_else(|| self.defaults.module_complex_args.clone());
        true
    }
}
