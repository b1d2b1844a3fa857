use async_trait::async_trait;

use parley_protocol::MessageUpdate;

/// Out-of-band delivery of a messaging handler's real result.
///
/// The embedding service implements this against the platform's
/// message-update API and owns transport, timeout, and retry policy; the
/// core only supplies the payload.
#[async_trait]
pub trait FollowUp: Send + Sync {
    async fn update_message(&self, update: MessageUpdate) -> anyhow::Result<()>;
}

/// Drops updates on the floor, for deployments with no update API wired up
/// (the CLI simulation, tests).
pub struct DiscardFollowUp;

#[async_trait]
impl FollowUp for DiscardFollowUp {
    async fn update_message(&self, update: MessageUpdate) -> anyhow::Result<()> {
        tracing::debug!(channel = %update.channel, "discarding follow-up: no delivery configured");
        Ok(())
    }
}
