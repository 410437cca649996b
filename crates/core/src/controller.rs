mod builder;
mod state;
#[cfg(test)]
mod tests;

use std::fmt::{self, Debug, Display};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Local, TimeZone};

use crate::chat_client::{ChatClient, ChatError};
use crate::conversation::{Message, Sender};
use crate::export;
use crate::store::ConversationStore;
pub use builder::{ControllerBuilder, DEFAULT_GREETING};
use state::ControllerState;
pub use state::{ControllerStage, SubmitOutcome};

/// Owns the conversation and sequences turns between the user and the
/// assistant.
///
/// At most one reply is requested at a time. While it is pending, further
/// submissions are ignored, and every change of the message list is
/// written through to the [`ConversationStore`].
///
/// All methods take `&self`; the controller can be shared by the event
/// handlers of one widget. The internal lock is never held across an
/// `.await`.
pub struct ConversationController {
    chat_client: ChatClient,
    store: ConversationStore,
    system_prompt: String,
    greeting: String,
    on_error: Option<Box<dyn Fn(&ChatError) + Send + Sync>>,
    state: Mutex<ControllerState>,
}

impl ConversationController {
    /// Restores the stored conversation, or seeds the greeting if there is
    /// nothing usable in the store.
    ///
    /// Does nothing while a reply is pending.
    pub fn initialize(&self) {
        let snapshot = self.store.load();
        let restored = snapshot
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_else(|err| {
                warn!("discarding stored messages with bad timestamps: {err}");
                Vec::new()
            });

        let mut state = self.state();
        if state.stage != ControllerStage::Idle {
            debug!("a reply is still pending, keeping the current history");
            return;
        }
        state.error = None;
        if restored.is_empty() {
            state.reset_to_greeting(&self.greeting);
            self.store.save(&state.snapshot());
        } else {
            debug!("restored {} messages", restored.len());
            state.replace_messages(restored);
        }
    }

    /// Submits a user message and waits for the assistant's reply.
    ///
    /// Does nothing if `text` is blank or a reply is still pending.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned future abandons the pending reply. The user
    /// message stays in the history and the controller becomes idle again.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let content = text.trim();
        let (transcript, epoch, pending) = {
            let mut state = self.state();
            if content.is_empty() {
                trace!("ignoring empty submission");
                return SubmitOutcome::Ignored;
            }
            if state.stage != ControllerStage::Idle {
                debug!("a reply is still pending, ignoring submission");
                return SubmitOutcome::Ignored;
            }

            let kind = state.take_draft_kind(content);
            state.push_message(content, Sender::User, Some(kind));
            state.stage = ControllerStage::AwaitingReply;
            state.error = None;
            self.store.save(&state.snapshot());

            state.flight += 1;
            let pending = PendingReply {
                state: &self.state,
                flight: state.flight,
            };
            (state.transcript(&self.system_prompt), state.epoch, pending)
        };

        let result = self.chat_client.chat(transcript).await;

        let outcome = {
            let mut state = self.state();
            pending.finish(&mut state);
            match &result {
                _ if state.epoch != epoch => {
                    debug!("history was replaced, dropping the reply");
                    SubmitOutcome::Discarded
                }
                Ok(reply) => {
                    let msg = state.push_message(reply, Sender::Assistant, None);
                    self.store.save(&state.snapshot());
                    SubmitOutcome::Replied(msg)
                }
                Err(err) => {
                    let message = format!(
                        "Sorry, I encountered an error: {err}. \
                         Please try again or contact us directly."
                    );
                    state.error = Some(message.clone());
                    SubmitOutcome::Failed(message)
                }
            }
        };
        drop(pending);

        // The lock is released, so the callback may call back into us.
        if let (SubmitOutcome::Failed(_), Err(err), Some(on_error)) =
            (&outcome, &result, &self.on_error)
        {
            on_error(err);
        }
        outcome
    }

    /// Puts `prompt` into the input. This is not a submission, the caller
    /// still has to [`submit`](Self::submit) it.
    pub fn select_quick_reply(&self, prompt: &str) {
        let mut state = self.state();
        state.draft = prompt.to_owned();
        state.quick_reply = Some(prompt.to_owned());
    }

    /// Replaces the text in the input.
    pub fn set_draft(&self, text: &str) {
        self.state().draft = text.to_owned();
    }

    /// Returns the text in the input.
    pub fn draft(&self) -> String {
        self.state().draft.clone()
    }

    /// Drops the whole history and starts over with a fresh greeting.
    ///
    /// Asking the user for confirmation is up to the caller. A reply that
    /// is still pending will be dropped when it arrives.
    pub fn clear_history(&self) {
        self.store.clear();
        let mut state = self.state();
        state.reset_to_greeting(&self.greeting);
        state.error = None;
        self.store.save(&state.snapshot());
        debug!("history cleared");
    }

    /// Renders the history as plain text with timestamps in local time.
    #[inline]
    pub fn export_history(&self) -> String {
        self.export_history_in(&Local)
    }

    /// Renders the history as plain text with timestamps in `tz`.
    pub fn export_history_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        export::render_history(&self.state().messages, tz)
    }

    /// Renders the history for sharing, without timestamps.
    pub fn share_text(&self) -> String {
        export::render_share(&self.state().messages)
    }

    /// Returns a copy of the message list.
    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    /// Returns the current stage.
    pub fn stage(&self) -> ControllerStage {
        self.state().stage
    }

    /// Returns whether the assistant is composing a reply.
    #[inline]
    pub fn is_typing(&self) -> bool {
        self.stage() == ControllerStage::AwaitingReply
    }

    /// Returns the error left by the last failed reply, if any.
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for ConversationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("ConversationController")
            .field("messages", &state.messages.len())
            .field("stage", &state.stage)
            .field("error", &state.error)
            .finish_non_exhaustive()
    }
}

/// Owns one flight. Puts the controller back to idle when the flight
/// finishes or is abandoned, but only if no newer flight took over.
struct PendingReply<'a> {
    state: &'a Mutex<ControllerState>,
    flight: u64,
}

impl PendingReply<'_> {
    fn finish(&self, state: &mut ControllerState) {
        if state.flight == self.flight {
            state.stage = ControllerStage::Idle;
        }
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.flight == self.flight
            && state.stage == ControllerStage::AwaitingReply
        {
            debug!("pending reply abandoned");
            state.stage = ControllerStage::Idle;
        }
    }
}
