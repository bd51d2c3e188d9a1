//! The `subscription` module holds the operator's topic selection.
//!
//! `SubscriptionSet` is the authoritative record of which topics are
//! selected. Its snapshots are what the feed connection serializes into the
//! stream filter, so iteration order is the order topics were selected in.

pub mod set;

pub use set::{SelectionChange, SubscriptionSet, Topic};
