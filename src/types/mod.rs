//! Core types for threadrun.

pub mod assistant;
pub mod event;
pub mod run;
pub mod thread;

pub use assistant::*;
pub use event::{DeltaContent, MessageDelta, MessageDeltaBody, StreamEvent, TextDelta};
pub use run::*;
pub use thread::*;
