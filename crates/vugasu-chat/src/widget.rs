use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use vugasu_chat_core::export::export_file_name;
use vugasu_chat_core::store::ConversationStore;
use vugasu_chat_core::{
    ChatError, ControllerBuilder, ConversationController, SubmitOutcome,
};
use vugasu_chat_model::ChatProvider;

use crate::quick_replies::{QUICK_REPLIES, QuickReply};

/// Phone number shown in the widget footer.
pub const CONTACT_PHONE: &str = "+1-555-123-4567";
/// E-mail address shown in the widget footer.
pub const CONTACT_EMAIL: &str = "contact@vugasu.com";

const SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// A widget builder.
///
/// See [`Widget`].
pub struct WidgetBuilder {
    controller_builder: ControllerBuilder,
}

impl WidgetBuilder {
    /// Creates a widget builder with a specified chat provider.
    pub fn with_chat_provider<P: ChatProvider + 'static>(provider: P) -> Self {
        let controller_builder = ControllerBuilder::with_chat_provider(provider)
            .with_system_prompt(SYSTEM_PROMPT);
        Self { controller_builder }
    }

    /// Sets where the conversation is persisted.
    #[inline]
    pub fn with_store(mut self, store: ConversationStore) -> Self {
        self.controller_builder = self.controller_builder.with_store(store);
        self
    }

    /// Overrides the greeting seeded into an empty conversation.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.controller_builder = self.controller_builder.with_greeting(greeting);
        self
    }

    /// Attaches a callback to be invoked when the assistant fails to reply.
    #[inline]
    pub fn on_error(
        mut self,
        on_error: impl Fn(&ChatError) + Send + Sync + 'static,
    ) -> Self {
        self.controller_builder = self.controller_builder.on_error(on_error);
        self
    }

    /// Builds a new widget. It starts closed, with quick replies shown.
    pub fn build(self) -> Widget {
        Widget {
            controller: self.controller_builder.build(),
            view: ViewState::default(),
        }
    }
}

/// How the widget is currently presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewState {
    /// Whether the chat window is open.
    pub open: bool,
    /// Whether the open window is collapsed to its header.
    pub minimized: bool,
    /// Whether new replies are announced.
    pub muted: bool,
    /// Whether the quick reply chips are shown.
    pub show_quick_replies: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            open: false,
            minimized: false,
            muted: false,
            show_quick_replies: true,
        }
    }
}

/// The chat widget, like a floating window that displays messages and has
/// an input box.
///
/// The widget holds the conversation controller and the presentation
/// state around it.
pub struct Widget {
    controller: ConversationController,
    view: ViewState,
}

impl Widget {
    /// Returns the underlying conversation.
    #[inline]
    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    /// Returns the presentation state.
    #[inline]
    pub fn view(&self) -> ViewState {
        self.view
    }

    /// Opens or closes the window.
    #[inline]
    pub fn toggle_open(&mut self) {
        self.view.open = !self.view.open;
    }

    /// Collapses or restores the window.
    #[inline]
    pub fn toggle_minimized(&mut self) {
        self.view.minimized = !self.view.minimized;
    }

    /// Mutes or unmutes reply notifications.
    #[inline]
    pub fn toggle_muted(&mut self) {
        self.view.muted = !self.view.muted;
    }

    /// Shows or hides the quick reply chips.
    #[inline]
    pub fn toggle_quick_replies(&mut self) {
        self.view.show_quick_replies = !self.view.show_quick_replies;
    }

    /// Returns the available quick replies.
    #[inline]
    pub fn quick_replies(&self) -> &'static [QuickReply] {
        &QUICK_REPLIES
    }

    /// Puts the quick reply at `index` into the input and hides the chips.
    pub fn choose_quick_reply(&mut self, index: usize) -> Option<&'static QuickReply> {
        let reply = QUICK_REPLIES.get(index)?;
        self.controller.select_quick_reply(reply.prompt);
        self.view.show_quick_replies = false;
        Some(reply)
    }

    /// Sends a message and waits for the reply.
    pub async fn send(&mut self, text: &str) -> SubmitOutcome {
        let outcome = self.controller.submit(text).await;
        if outcome != SubmitOutcome::Ignored {
            self.view.show_quick_replies = false;
        }
        outcome
    }

    /// Returns whether `outcome` should be announced to the user.
    #[inline]
    pub fn should_notify(&self, outcome: &SubmitOutcome) -> bool {
        !self.view.muted && matches!(outcome, SubmitOutcome::Replied(_))
    }

    /// Starts the conversation over. The caller is responsible for asking
    /// the user first.
    pub fn clear_history(&mut self) {
        self.controller.clear_history();
        self.view.show_quick_replies = true;
    }

    /// Writes the exported history into `dir`, named after `date`, and
    /// returns the path of the written file.
    pub fn export_to(&self, dir: &Path, date: NaiveDate) -> io::Result<PathBuf> {
        let path = dir.join(export_file_name(date));
        fs::write(&path, self.controller.export_history())?;
        debug!("exported history to {}", path.display());
        Ok(path)
    }

    /// Returns the text to hand over to a share target.
    #[inline]
    pub fn share_text(&self) -> String {
        self.controller.share_text()
    }
}
