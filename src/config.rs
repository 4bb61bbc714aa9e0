use crate::models::AccountId;
use std::time::Duration;

/// Engine tuning knobs. Defaults match what the CLI and server use; tests
/// shrink the committer count or the timeout where it matters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of committer actors; transfers shard across them by sender.
    pub committers: usize,
    /// Upper bound on a single commit round-trip. On expiry the caller gets
    /// a retryable failure and converges via the idempotency key.
    pub commit_timeout: Duration,
    /// Committer mailbox depth before submitters start backpressuring.
    pub mailbox_capacity: usize,
    /// The one account allowed to source initial-funds seeds.
    pub system_account: AccountId,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            committers: 16,
            commit_timeout: Duration::from_secs(5),
            mailbox_capacity: 1000,
            system_account: 0,
        }
    }
}
