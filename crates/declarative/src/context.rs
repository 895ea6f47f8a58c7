//! Progress and confirmation provider traits
//!
//! These traits allow the declarative crate to be driven from a terminal,
//! a test, or an unattended job without depending on a UI framework.

use crate::error::Result;
use crate::types::ApplyResult;

/// What the applier is about to do with a plan entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    Create,
    Update,
}

/// Progress callback for apply operations
pub trait ProgressCallback {
    /// Called once before the first entry, with the number of entries
    fn on_start(&mut self, total: usize);

    /// Called when starting to apply a single entry
    fn on_resource_start(&mut self, name: &str, action: ApplyAction);

    /// Called when an entry has been applied
    fn on_resource_complete(&mut self, name: &str, result: &ApplyResult);

    /// Called after the last entry, or after the entry that failed
    fn on_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&mut self, _total: usize) {}
    fn on_resource_start(&mut self, _name: &str, _action: ApplyAction) {}
    fn on_resource_complete(&mut self, _name: &str, _result: &ApplyResult) {}
    fn on_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
