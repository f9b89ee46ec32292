//! Permission gate and request dispatch
//!
//! This module accepts `downloadAudioFile` and `exists` requests from the web
//! layer, makes sure the microphone and storage-write permissions are held,
//! and then runs the file operation on a background executor.

mod action;
mod executor;
mod gate;

pub use action::{ActionKind, Request};
pub use executor::{BackgroundExecutor, BlockingPool, Job};
pub use gate::{Dispatcher, DispatcherConfig, Outcome, RequestHandle};
