//! A chat assistant widget for the Vugasu Kennels website.
//!
//! The crate includes a CLI tool for chatting in the terminal. And you can
//! also use it as a library to host the widget in your own front end.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

/// Canned suggestion chips shown below the conversation.
pub mod quick_replies;
mod widget;

pub use widget::{
    CONTACT_EMAIL, CONTACT_PHONE, ViewState, Widget, WidgetBuilder,
};

/// Re-exports of [`vugasu_chat_core`] crate.
pub mod core {
    pub use vugasu_chat_core::*;
}
