//! Core logic of the assistant widget: conversation state, persistence,
//! and turn sequencing against a chat provider.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod chat_client;
mod controller;
pub mod conversation;
pub mod export;
pub mod store;

pub use chat_client::{ChatClient, ChatError};
pub use controller::{
    ControllerBuilder, ControllerStage, ConversationController,
    DEFAULT_GREETING, SubmitOutcome,
};
