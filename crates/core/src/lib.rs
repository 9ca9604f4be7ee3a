//! Core logic of the squad: the persona catalog, reply segmentation,
//! artifact extraction, preview documents and the conversation controller.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod artifact;
pub mod catalog;
mod controller;
mod message;
mod model_client;
pub mod preview;
pub mod segment;
mod session;

pub use artifact::{Artifact, ArtifactKind};
pub use controller::{
    CONNECTION_ERROR_MESSAGE, Controller, ControllerBuilder, ControllerUpdate,
    SendError,
};
pub use message::{ChatStatus, Message, Role};
pub use preview::{PREVIEW_SANDBOX, build_preview_document};
pub use segment::{Segment, Speaker, segment};
