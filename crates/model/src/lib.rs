//! An abstraction layer for chat completion services.
//!
//! This crate establishes the protocol the assistant widget uses to talk
//! with a completion service, so that the conversation logic never depends
//! on a concrete vendor API.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
