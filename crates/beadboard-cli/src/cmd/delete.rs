//! `bb delete`: remove an issue from the tracker.
//!
//! Edges other issues hold to the deleted id are left in place; every
//! query treats them as dangling and ignores them.

use crate::output::{OutputMode, fail, render_success};
use beadboard_core::IssueTracker;
use clap::Args;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Issue id to delete.
    pub id: String,
}

pub fn run_delete(
    args: &DeleteArgs,
    tracker: &dyn IssueTracker,
    output: OutputMode,
) -> anyhow::Result<()> {
    tracker
        .delete_issue(&args.id)
        .map_err(|err| fail(output, err))?;
    render_success(output, &format!("Deleted {}", args.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use beadboard_core::store::MemoryStore;
    use beadboard_core::{CreateIssueInput, LocalTracker, TrackerError};

    #[test]
    fn delete_removes_issue() {
        let tracker = LocalTracker::new(MemoryStore::new());
        let issue = tracker
            .create_issue(&CreateIssueInput::titled("Scratch"))
            .unwrap();
        let args = DeleteArgs {
            id: issue.id.clone(),
        };
        run_delete(&args, &tracker, OutputMode::Json).unwrap();
        assert!(matches!(
            tracker.get_issue(&issue.id),
            Err(TrackerError::IssueNotFound(_))
        ));
        assert!(run_delete(&args, &tracker, OutputMode::Json).is_err());
    }
}
