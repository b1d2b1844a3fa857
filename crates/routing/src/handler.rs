use std::collections::BTreeMap;

use async_trait::async_trait;

use parley_protocol::{Actor, Argument, CanonicalRequest, Conversation, HandlerReply};

/// Per-invocation context handed to a resolved handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerContext {
    pub actor: Actor,
    pub conversation: Conversation,
    pub arguments: BTreeMap<String, Argument>,
    /// Bot credential for platform API calls, when the payload carried one.
    pub token: Option<String>,
    pub team_id: Option<String>,
    pub channel: Option<String>,
}

impl HandlerContext {
    #[must_use]
    pub fn from_request(request: &CanonicalRequest) -> Self {
        Self {
            actor: request.actor.clone(),
            conversation: request.conversation.clone(),
            arguments: request.arguments.clone(),
            channel: request.conversation.id.clone(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn with_team_id(mut self, team_id: Option<String>) -> Self {
        self.team_id = team_id;
        self
    }
}

/// Externally supplied business logic for one routing key.
///
/// Exactly one completion per invocation: the future resolves once with
/// either a reply payload or an error, never both.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: HandlerContext) -> anyhow::Result<HandlerReply>;
}
