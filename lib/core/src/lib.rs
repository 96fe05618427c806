//! Core identifiers and error handling for the flowdeck workflow canvas.
//!
//! This crate provides the foundational types shared by the workflow
//! editing core and the collaborator adapters that surround it.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, WorkflowId, generated_id};
