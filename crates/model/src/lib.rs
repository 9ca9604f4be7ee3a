//! The transport contract between the squad and a hosted model.
//!
//! This crate establishes the protocol that the conversation core uses to
//! talk to a streaming LLM service, so that the core never depends on a
//! particular vendor API.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to. A provider receives
//! the full history of a chat session with every request, which keeps the
//! provider itself stateless. Session affinity is owned by the caller.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
