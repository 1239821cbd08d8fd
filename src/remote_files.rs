//! Call-scoped "keep remote files" policy.
//!
//! Delivery must leave the remote temporary directory in place, or the
//! passthrough module would find it deleted. The override is held by a guard
//! that borrows the per-call policy and restores the prior value on drop, so
//! it is undone on every exit path, unwinding included.

/// Whether remote temporary files survive a module invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteFilesPolicy {
    keep_remote_files: bool,
}

impl RemoteFilesPolicy {
    pub fn new(keep_remote_files: bool) -> Self {
        Self { keep_remote_files }
    }

    pub fn keep_remote_files(&self) -> bool {
        self.keep_remote_files
    }

    /// Force the policy to `value` until the returned guard is dropped.
    pub fn override_with(&mut self, value: bool) -> KeepRemoteFilesGuard<'_> {
        let stored = self.keep_remote_files;
        self.keep_remote_files = value;
        KeepRemoteFilesGuard {
            policy: self,
            stored,
        }
    }
}

/// Restores the overridden policy when dropped.
#[derive(Debug)]
pub struct KeepRemoteFilesGuard<'a> {
    policy: &'a mut RemoteFilesPolicy,
    stored: bool,
}

impl KeepRemoteFilesGuard<'_> {
    /// The value in force while the guard lives.
    pub fn keep_remote_files(&self) -> bool {
        self.policy.keep_remote_files
    }
}

impl Drop for KeepRemoteFilesGuard<'_> {
    fn drop(&mut self) {
        self.policy.keep_remote_files = self.stored;
    }
}
