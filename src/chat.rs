//! chat exchange controller: one user turn -> one backend call -> one reply.
//!
//! - the user message is appended synchronously in [`ChatController::begin_turn`].
//! - the network half lives in [`PendingTurn::run`], which reports through a
//!   single-slot inbox; [`ChatController::drain`] applies it on the owning
//!   thread. the browser shell spawns `run` without holding the controller.
//! - at most one turn is in flight; overlapping submissions are rejected.

use flume::{Receiver, Sender as InboxTx, TryRecvError};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::{ChatReply, ChatRequest, Transport, to_body};
use crate::config::{ClientConfig, Texts, fill};
use crate::error::ChatError;
use crate::session::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// css class the page styles bubbles with.
    pub fn css_class(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::User }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::Bot }
    }
}

/// append-only, page-scoped.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// what the chat page must be able to show.
pub trait ChatView {
    /// hide the login gate, show the chat container.
    fn reveal_chat(&mut self);
    fn append_message(&mut self, message: &Message);
    fn set_typing(&mut self, visible: bool);
    fn clear_input(&mut self);
    /// blocking notice (an alert in the browser).
    fn notify(&mut self, text: &str);
}

/// how a turn's round trip ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Reply(String),
    Server(Option<String>),
    Connectivity(String),
}

/// the network half of a turn. consumed by [`PendingTurn::run`].
#[derive(Debug)]
pub struct PendingTurn {
    url: String,
    body: Value,
    inbox: InboxTx<TurnOutcome>,
}

impl PendingTurn {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// issues exactly one request and reports its outcome; never retries.
    pub async fn run<T: Transport + ?Sized>(self, transport: &T) {
        let outcome = match transport.post_json(&self.url, &self.body).await {
            Ok(res) if res.is_success() => match res.decode::<ChatReply>() {
                Ok(reply) => TurnOutcome::Reply(reply.response),
                Err(err) => {
                    error!(target: "lenny_web", "chat reply did not decode: {}", err);
                    TurnOutcome::Connectivity(err.to_string())
                }
            },
            Ok(res) => {
                warn!(target: "lenny_web", "chat rejected: status={}", res.status);
                TurnOutcome::Server(res.error_message())
            }
            Err(err) => {
                error!(target: "lenny_web", "chat transport error: {}", err);
                TurnOutcome::Connectivity(err.to_string())
            }
        };
        push_inbox(&self.inbox, outcome);
    }
}

/// send to inbox (a dropped controller just discards the outcome)
fn push_inbox(tx: &InboxTx<TurnOutcome>, outcome: TurnOutcome) {
    if tx.try_send(outcome).is_err() {
        debug!(target: "lenny_web", "turn outcome discarded: controller gone");
    }
}

pub struct ChatController {
    transcript: Transcript,
    chat_url: String,
    texts: Texts,
    /// receiver of the in-flight turn, if any
    pending: Option<Receiver<TurnOutcome>>,
}

impl ChatController {
    pub fn new(chat_url: impl Into<String>, texts: Texts) -> Self {
        Self {
            transcript: Transcript::default(),
            chat_url: chat_url.into(),
            texts,
            pending: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.chat_url(), config.texts.clone())
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// appends a bot message outside of any turn (greetings).
    pub fn say(&mut self, view: &mut impl ChatView, text: impl Into<String>) {
        self.push(view, Message::bot(text));
    }

    /// synchronous half of a turn: validate, append the user message, show
    /// the typing indicator and hand back the request to run.
    pub fn begin_turn(
        &mut self,
        view: &mut impl ChatView,
        identity: Option<&Identity>,
        text: &str,
    ) -> Result<PendingTurn, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            debug!(target: "lenny_web", "empty chat submission ignored");
            return Err(ChatError::EmptyMessage);
        }
        let Some(identity) = identity else {
            warn!(target: "lenny_web", "chat submission without a session");
            view.notify(&self.texts.session_missing);
            return Err(ChatError::NoSession);
        };
        if self.pending.is_some() {
            debug!(target: "lenny_web", "chat submission ignored: turn in flight");
            return Err(ChatError::TurnInFlight);
        }

        self.push(view, Message::user(text));
        view.clear_input();
        view.set_typing(true);

        let (tx, rx) = flume::bounded(1);
        self.pending = Some(rx);
        info!(target: "lenny_web", "chat turn: id={} len={} turns={}",
            identity.id_number, text.len(), self.transcript.len());

        Ok(PendingTurn {
            url: self.chat_url.clone(),
            body: to_body(&ChatRequest {
                cedula: identity.id_number.clone(),
                message: text.to_string(),
            }),
            inbox: tx,
        })
    }

    /// applies a settled turn, if any. returns whether one settled.
    pub fn drain(&mut self, view: &mut impl ChatView) -> bool {
        let Some(rx) = self.pending.as_ref() else {
            return false;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            // the pending turn was dropped without running
            Err(TryRecvError::Disconnected) => TurnOutcome::Connectivity("turn abandoned".into()),
        };
        self.pending = None;
        view.set_typing(false);

        let text = match outcome {
            TurnOutcome::Reply(text) => text,
            TurnOutcome::Server(message) => {
                let error = message.unwrap_or_else(|| self.texts.chat_generic_error.clone());
                fill(&self.texts.chat_server_error, "error", &error)
            }
            TurnOutcome::Connectivity(_) => self.texts.chat_connectivity.clone(),
        };
        self.push(view, Message::bot(text));
        info!(target: "lenny_web", "chat turn settled: turns={}", self.transcript.len());
        true
    }

    /// begin, run and drain in one go, for callers that can await.
    pub async fn send_turn<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        view: &mut impl ChatView,
        identity: Option<&Identity>,
        text: &str,
    ) -> Result<(), ChatError> {
        let turn = self.begin_turn(view, identity, text)?;
        turn.run(transport).await;
        self.drain(view);
        Ok(())
    }

    fn push(&mut self, view: &mut impl ChatView, message: Message) {
        view.append_message(&message);
        self.transcript.push(message);
    }
}
