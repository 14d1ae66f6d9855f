//! Client-side chat widget: visibility, the text field, the transcript and
//! the single in-flight request.
//!
//! The widget is driven by the embedding UI. It does not render anything
//! itself; [`ChatWidget::view`] returns what should be on screen.

pub mod transport;

use serde_json::Value;

use crate::{
    message::{ChatRequest, Message},
    services::{reply::extract_reply, transcript::TranscriptStore},
};
use transport::{ChatTransport, TransportError};

/// Appended when the runner answered but the reply text could not be found.
pub const FALLBACK_REPLY: &str = "Sorry, I could not understand the response.";
/// Appended when the call itself failed.
pub const FAILURE_REPLY: &str = "Oops! Something went wrong.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Collapsed,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sending,
}

/// What happened to a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty input or a request already in flight; nothing changed.
    Rejected,
    /// The runner answered with reply text.
    Replied(String),
    /// The runner answered but the reply path was missing.
    Fallback,
    /// The call failed.
    Failed,
}

/// Render model for the embedding UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetView<'a> {
    pub visibility: Visibility,
    pub messages: &'a [Message],
    /// Show the "Typing..." placeholder below the last entry.
    pub typing: bool,
    pub input: &'a str,
    pub input_focused: bool,
    pub input_disabled: bool,
    /// Index of the entry the view is scrolled to; the typing placeholder
    /// counts as one entry past the transcript.
    pub scroll_to: Option<usize>,
}

pub struct ChatWidget<T, S> {
    transport: T,
    store: S,
    visibility: Visibility,
    request: RequestState,
    messages: Vec<Message>,
    input: String,
    input_focused: bool,
}

impl<T: ChatTransport, S: TranscriptStore> ChatWidget<T, S> {
    /// Mount the widget: load any saved transcript once. A missing or
    /// unreadable entry starts an empty transcript.
    pub fn mount(transport: T, store: S) -> Self {
        let messages = match store.load() {
            Ok(Some(messages)) => {
                tracing::debug!(count = messages.len(), "restored transcript");
                messages
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not restore transcript, starting empty");
                Vec::new()
            }
        };

        Self {
            transport,
            store,
            visibility: Visibility::Collapsed,
            request: RequestState::Idle,
            messages,
            input: String::new(),
            input_focused: false,
        }
    }

    pub fn open(&mut self) {
        self.visibility = Visibility::Open;
        self.input_focused = true;
    }

    pub fn close(&mut self) {
        self.visibility = Visibility::Collapsed;
        self.input_focused = false;
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn request_state(&self) -> RequestState {
        self.request
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Edits to the text field are ignored while a request is in flight.
    pub fn set_input(&mut self, text: impl Into<String>) {
        if self.request == RequestState::Idle {
            self.input = text.into();
        }
    }

    pub fn view(&self) -> WidgetView<'_> {
        let typing = self.request == RequestState::Sending;
        let entries = self.messages.len() + usize::from(typing);
        WidgetView {
            visibility: self.visibility,
            messages: &self.messages,
            typing,
            input: &self.input,
            input_focused: self.input_focused && self.visibility == Visibility::Open,
            input_disabled: typing,
            scroll_to: entries.checked_sub(1),
        }
    }

    /// Submit whatever is in the text field.
    pub async fn submit_input(&mut self) -> SubmitOutcome {
        let text = self.input.clone();
        self.submit(&text).await
    }

    /// Send `text` and wait for the reply.
    ///
    /// If the returned future is dropped before the reply arrives (a timeout,
    /// a `select!` branch losing), the send counts as failed: the failure
    /// entry is appended and the widget is back to `Idle`.
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let Some(request) = self.begin_submit(text) else {
            return SubmitOutcome::Rejected;
        };
        InFlight { widget: self, settled: false }.run(&request).await
    }

    /// Whether a submission of `text` would be accepted right now.
    pub fn can_submit(&self, text: &str) -> bool {
        !text.trim().is_empty() && self.request == RequestState::Idle
    }

    /// First half of [`submit`](Self::submit): guard, append the user entry,
    /// clear the field and enter `Sending`. Returns the request to send, or
    /// `None` when the submission is rejected.
    pub fn begin_submit(&mut self, text: &str) -> Option<ChatRequest> {
        if !self.can_submit(text) {
            return None;
        }
        let trimmed = text.trim();

        self.messages.push(Message::user(trimmed));
        self.input.clear();
        self.request = RequestState::Sending;
        self.persist();

        Some(ChatRequest::chat(trimmed))
    }

    /// Second half of [`submit`](Self::submit): turn the call result into a
    /// bot entry and go back to `Idle`. Does nothing unless a send is pending.
    pub fn finish_submit(&mut self, result: Result<Value, TransportError>) -> SubmitOutcome {
        if self.request != RequestState::Sending {
            return SubmitOutcome::Rejected;
        }

        let (text, outcome) = match result {
            Ok(response) => match extract_reply(&response) {
                Ok(reply) => (reply.clone(), SubmitOutcome::Replied(reply)),
                Err(e) => {
                    tracing::warn!(error = %e, "unexpected chat response shape");
                    (FALLBACK_REPLY.to_string(), SubmitOutcome::Fallback)
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                (FAILURE_REPLY.to_string(), SubmitOutcome::Failed)
            }
        };

        self.messages.push(Message::bot(text));
        self.request = RequestState::Idle;
        self.persist();
        outcome
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.messages) {
            tracing::warn!(error = %e, "could not persist transcript");
        }
    }
}

/// Settles the widget when a send is abandoned mid-flight.
struct InFlight<'a, T: ChatTransport, S: TranscriptStore> {
    widget: &'a mut ChatWidget<T, S>,
    settled: bool,
}

impl<T: ChatTransport, S: TranscriptStore> InFlight<'_, T, S> {
    async fn run(mut self, request: &ChatRequest) -> SubmitOutcome {
        let result = self.widget.transport.send(request).await;
        self.settled = true;
        self.widget.finish_submit(result)
    }
}

impl<T: ChatTransport, S: TranscriptStore> Drop for InFlight<'_, T, S> {
    fn drop(&mut self) {
        if !self.settled {
            self.widget.finish_submit(Err(TransportError::Abandoned));
        }
    }
}
