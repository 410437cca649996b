use std::sync::Mutex;

use vugasu_chat_model::ChatProvider;

use super::ConversationController;
use super::state::ControllerState;
use crate::chat_client::{ChatClient, ChatError};
use crate::store::ConversationStore;

/// The greeting seeded into an empty conversation.
pub const DEFAULT_GREETING: &str =
    "Hello! I'm your Vugasu Kennels assistant. How can I help you today?";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// [`ConversationController`] builder.
pub struct ControllerBuilder {
    pub(crate) chat_client: ChatClient,
    pub(crate) store: Option<ConversationStore>,
    pub(crate) system_prompt: String,
    pub(crate) greeting: String,
    pub(crate) on_error: Option<Box<dyn Fn(&ChatError) + Send + Sync>>,
}

impl ControllerBuilder {
    /// Creates a new builder with the specified chat provider.
    #[inline]
    pub fn with_chat_provider<P: ChatProvider + 'static>(provider: P) -> Self {
        Self {
            chat_client: ChatClient::new(provider),
            store: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            greeting: DEFAULT_GREETING.to_owned(),
            on_error: None,
        }
    }

    /// Sets where the conversation is persisted. Without a store, the
    /// conversation lives in memory only.
    #[inline]
    pub fn with_store(mut self, store: ConversationStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the system instruction sent ahead of every transcript.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the greeting seeded into an empty conversation.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Attaches a callback to be invoked when the assistant fails to reply.
    #[inline]
    pub fn on_error(
        mut self,
        on_error: impl Fn(&ChatError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }

    /// Builds the controller and restores the stored conversation.
    pub fn build(self) -> ConversationController {
        let ControllerBuilder {
            chat_client,
            store,
            system_prompt,
            greeting,
            on_error,
        } = self;

        let controller = ConversationController {
            chat_client,
            store: store.unwrap_or_else(ConversationStore::in_memory),
            system_prompt,
            greeting,
            on_error,
            state: Mutex::new(ControllerState::default()),
        };
        controller.initialize();
        controller
    }
}
