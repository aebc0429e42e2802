//! Run lifecycle orchestration.
//!
//! [`RunController::send`] is the per-turn entry point. It clears stale runs
//! with the [`CancellationCoordinator`], posts the user message, starts a run
//! and hands its events to the [`StreamProcessor`].

pub mod cancel;
pub mod controller;
pub mod stream;

pub use cancel::{CancelPolicy, CancellationCoordinator};
pub use controller::RunController;
pub use stream::StreamProcessor;

use futures::stream::BoxStream;

use crate::error::ThreadrunError;

/// Lazy, single-pass sequence of assistant text fragments.
pub type TextStream = BoxStream<'static, Result<String, ThreadrunError>>;
