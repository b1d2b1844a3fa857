use std::sync::Arc;

use {
    serde_json::Value,
    tokio::task::JoinHandle,
    tracing::{error, info, warn},
};

use {
    parley_dedup::EventCache,
    parley_normalize::{
        has_assistant_inputs, normalize_cli, normalize_messaging, normalize_voice,
        value::string_field,
    },
    parley_protocol::{
        CanonicalRequest, HandlerReply, MessageUpdate, MessagingAck, VoiceEnvelope,
    },
    parley_routing::{self as routing, HandlerContext, Resolver},
};

use crate::{
    error::{Error, Result},
    follow_up::FollowUp,
    format,
};

/// Terminal state of one dispatched request. The non-`Dispatched` states
/// still produced a response envelope; they are outcomes, not crashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dispatched,
    RejectedDuplicate,
    NotFound,
    LoadError,
}

/// Immediate reply for a messaging payload, plus the background completion
/// when a handler run was actually started.
#[derive(Debug)]
pub struct MessagingDispatch {
    pub ack: MessagingAck,
    pub completion: Option<JoinHandle<Outcome>>,
}

impl MessagingDispatch {
    fn acked(ack: MessagingAck) -> Self {
        Self {
            ack,
            completion: None,
        }
    }
}

/// Composes normalizer, dedup cache, resolver, and formatter. Created once
/// at startup and shared by reference across all inbound calls; the dedup
/// window and resolution cache are its only mutable state.
pub struct Dispatcher {
    resolver: Arc<Resolver>,
    dedup: Arc<EventCache>,
    follow_up: Arc<dyn FollowUp>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(resolver: Arc<Resolver>, dedup: Arc<EventCache>, follow_up: Arc<dyn FollowUp>) -> Self {
        Self {
            resolver,
            dedup,
            follow_up,
        }
    }

    /// Route one voice-assistant turn, or its CLI simulation when the
    /// payload carries no assistant inputs, and wait for the formatted
    /// conversation envelope. Errors are recovered into the envelope's
    /// fixed error phrase; this never fails.
    pub async fn dispatch_turn(&self, payload: &Value, cli_intent: Option<&str>) -> VoiceEnvelope {
        let request = if has_assistant_inputs(payload) {
            normalize_voice(payload)
        } else {
            normalize_cli(cli_intent, payload)
        };
        info!(
            routing_key = %request.routing_key,
            source = %request.source,
            "dispatching conversation turn"
        );

        match self.run_turn(&request).await {
            Ok(reply) => format::voice_reply(&reply.as_text()),
            Err(e) => {
                warn!(routing_key = %request.routing_key, error = %e, "turn failed");
                format::voice_error(e)
            },
        }
    }

    async fn run_turn(&self, request: &CanonicalRequest) -> anyhow::Result<HandlerReply> {
        let handler = self.resolver.resolve(&request.routing_key)?;
        handler.handle(HandlerContext::from_request(request)).await
    }

    /// Route one messaging payload. The returned ack honors the platform's
    /// response-time budget: it is produced before any handler runs, and
    /// the handler's real result travels through the follow-up collaborator
    /// once the background completion finishes.
    pub fn dispatch_messaging(&self, payload: &Value) -> Result<MessagingDispatch> {
        // URL-verification handshake: echo and stop.
        if let Some(challenge) = string_field(payload, "challenge") {
            return Ok(MessagingDispatch::acked(MessagingAck::challenge(challenge)));
        }

        if let Some(ack) = guard_event(payload, &self.dedup) {
            return Ok(MessagingDispatch::acked(ack));
        }
        if let Some(ack) = guard_command(payload) {
            return Ok(MessagingDispatch::acked(ack));
        }

        let Some(request) = normalize_messaging(payload) else {
            return Err(Error::UnrecognizedPayload);
        };
        let Some(channel) = request.conversation.id.clone() else {
            return Err(Error::MissingChannel);
        };

        info!(
            routing_key = %request.routing_key,
            source = %request.source,
            channel,
            "dispatching messaging payload"
        );

        let ack = format::immediate_ack(request.source);
        let ctx = HandlerContext::from_request(&request)
            .with_token(payload_token(payload, &request))
            .with_team_id(payload_team_id(payload));
        let ts = payload_ts(payload);

        let resolver = Arc::clone(&self.resolver);
        let follow_up = Arc::clone(&self.follow_up);
        let routing_key = request.routing_key;
        let completion =
            tokio::spawn(
                async move { run_background(&resolver, &*follow_up, &routing_key, ctx, channel, ts).await },
            );

        Ok(MessagingDispatch {
            ack,
            completion: Some(completion),
        })
    }
}

/// Pre-dispatch admission checks for message events: slash commands leaking
/// in as plain messages are ignored, and the platform's retry redeliveries
/// are rejected inside the dedup window.
fn guard_event(payload: &Value, dedup: &EventCache) -> Option<MessagingAck> {
    let event = payload.get("event").filter(|v| !v.is_null())?;

    if string_field(event, "text").is_some_and(|text| text.starts_with('/')) {
        return Some(MessagingAck::soft_error(
            "Ignoring slash commands invoked as messages",
        ));
    }
    if !dedup.add(event) {
        info!("rejecting duplicate event");
        return Some(MessagingAck::soft_error("Event duplication limit reached"));
    }
    None
}

/// Commands must name themselves with a leading slash.
fn guard_command(payload: &Value) -> Option<MessagingAck> {
    let command = payload.get("command").filter(|v| !v.is_null())?;
    let raw = match command {
        Value::String(name) => Some(name.as_str()),
        _ => command.get("command").and_then(Value::as_str),
    };
    match raw {
        None | Some("") => Some(MessagingAck::soft_error("No command specified")),
        Some(name) if !name.starts_with('/') => {
            Some(MessagingAck::soft_error("Commands must start with /"))
        },
        Some(_) => None,
    }
}

async fn run_background(
    resolver: &Resolver,
    follow_up: &dyn FollowUp,
    routing_key: &str,
    ctx: HandlerContext,
    channel: String,
    ts: Option<String>,
) -> Outcome {
    let token = ctx.token.clone();
    let handler = match resolver.resolve(routing_key) {
        Ok(handler) => handler,
        Err(e) => {
            let outcome = match &e {
                routing::Error::NotFound { .. } => {
                    warn!(routing_key, "no handler for routing key");
                    Outcome::NotFound
                },
                routing::Error::LoadFailed { .. } => {
                    error!(routing_key, error = %e, "handler load failed");
                    Outcome::LoadError
                },
            };
            deliver(follow_up, token, channel, ts, HandlerReply::text(format::error_text(e))).await;
            return outcome;
        },
    };

    match handler.handle(ctx).await {
        Ok(reply) => deliver(follow_up, token, channel, ts, reply).await,
        Err(e) => {
            warn!(routing_key, error = %e, "handler execution failed");
            deliver(follow_up, token, channel, ts, HandlerReply::text(format::error_text(e))).await;
        },
    }
    Outcome::Dispatched
}

async fn deliver(
    follow_up: &dyn FollowUp,
    token: Option<String>,
    channel: String,
    ts: Option<String>,
    message: HandlerReply,
) {
    let update = MessageUpdate {
        token,
        channel,
        ts,
        message,
    };
    if let Err(e) = follow_up.update_message(update).await {
        warn!(error = %e, "follow-up delivery failed");
    }
}

fn payload_token(payload: &Value, request: &CanonicalRequest) -> Option<String> {
    string_field(payload, "token")
        .or_else(|| {
            // Interactive payloads carry the token inside the action object.
            payload
                .get("action")
                .and_then(|action| string_field(action, "token"))
        })
        .or_else(|| request.arguments.get("token").map(|a| a.value.clone()))
}

fn payload_team_id(payload: &Value) -> Option<String> {
    string_field(payload, "team_id").or_else(|| {
        payload
            .get("action")
            .and_then(|action| action.get("team"))
            .and_then(|team| string_field(team, "id"))
    })
}

/// Timestamp of the message a follow-up should replace.
fn payload_ts(payload: &Value) -> Option<String> {
    payload
        .get("event")
        .and_then(|event| string_field(event, "ts"))
        .or_else(|| {
            payload
                .get("action")
                .and_then(|action| string_field(action, "message_ts"))
        })
}
