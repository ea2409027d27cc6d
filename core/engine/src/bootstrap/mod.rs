//! The capture controller: construction, input handling and lifecycle.

pub mod builder;
pub mod core;
mod events;
mod handlers;
mod lifecycle;

pub use self::builder::CaptureControllerBuilder;
pub use self::core::{CaptureController, Command, Completion, DetectorOutput, Input};
