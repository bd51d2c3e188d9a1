//! The `controller` module is the single entry point for selection changes.
//!
//! `SubscriptionController` owns the subscription set, the feed connection
//! and the feed buffer. Operator toggles and transport signals are applied
//! one at a time, and every visible change is announced as a
//! `ControllerEvent` for whatever presentation layer is listening.

pub mod engine;

pub use engine::{Command, ControllerEvent, SubscriptionController};
