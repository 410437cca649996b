use chrono::{SubsecRound, Utc};
use vugasu_chat_model::ChatMessage;

use crate::conversation::{IdGenerator, Message, MessageKind, Sender};
use crate::store::{Snapshot, StoredMessage};

/// The stage of a [`super::ConversationController`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ControllerStage {
    /// No request is in flight, submissions are accepted.
    #[default]
    Idle,
    /// One reply is pending, submissions are ignored.
    AwaitingReply,
}

/// What happened to a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The text was empty or a reply was still pending. Nothing changed.
    Ignored,
    /// The assistant replied with this message.
    Replied(Message),
    /// The assistant could not reply. Carries the displayable error.
    Failed(String),
    /// The history was cleared while the reply was pending, the reply has
    /// been dropped.
    Discarded,
}

#[derive(Default)]
pub(super) struct ControllerState {
    pub messages: Vec<Message>,
    pub stage: ControllerStage,
    pub error: Option<String>,
    pub draft: String,
    /// The prompt of the quick reply that filled the draft, if any.
    pub quick_reply: Option<String>,
    /// Bumped every time the history is replaced, so a reply that was
    /// requested for an older history can be told apart.
    pub epoch: u64,
    /// Identifies the submission that owns the `AwaitingReply` stage.
    pub flight: u64,
    ids: IdGenerator,
}

impl ControllerState {
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        for msg in &messages {
            self.ids.observe(msg.id());
        }
        self.messages = messages;
        self.epoch += 1;
    }

    pub fn reset_to_greeting(&mut self, greeting: &str) {
        self.replace_messages(Vec::new());
        self.push_message(greeting, Sender::Assistant, None);
    }

    pub fn push_message(
        &mut self,
        content: &str,
        sender: Sender,
        kind: Option<MessageKind>,
    ) -> Message {
        // Stored timestamps keep milliseconds only.
        let now = Utc::now().trunc_subsecs(3);
        let msg = Message::new(self.ids.next(now), content, sender, now);
        let msg = match kind {
            Some(kind) => msg.with_kind(kind),
            None => msg,
        };
        self.messages.push(msg.clone());
        msg
    }

    /// Works out the kind of a submission and resets the draft.
    pub fn take_draft_kind(&mut self, content: &str) -> MessageKind {
        self.draft.clear();
        match self.quick_reply.take() {
            Some(prompt) if prompt.trim() == content => MessageKind::QuickReply,
            _ => MessageKind::Text,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.messages.iter().map(StoredMessage::from).collect()
    }

    pub fn transcript(&self, system_prompt: &str) -> Vec<ChatMessage> {
        let mut transcript = Vec::with_capacity(self.messages.len() + 1);
        transcript.push(ChatMessage::System(system_prompt.to_owned()));
        transcript.extend(self.messages.iter().map(Message::to_chat_message));
        transcript
    }
}
