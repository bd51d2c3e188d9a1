//! # PopFeed
//!
//! `popfeed` is a client for a publish/subscribe backend. An operator picks
//! a set of topics and watches a live, bounded, newest-first feed of the
//! messages published to them over a single Server-Sent Events stream. The
//! selection can change at any time; the stream is resynchronized so that
//! exactly one connection matching the selection is ever live.
//!
//! ## Core Modules
//!
//! - `catalog`: Fetches the topic directory and writes messages to the backend.
//! - `config`: Loads client configuration from files and environment variables.
//! - `controller`: Applies topic toggles and transport signals, one at a time.
//! - `feed`: The feed buffer, event decoding, the connection and its transports.
//! - `subscription`: The operator's ordered set of selected topics.
//! - `utils`: Shared error types and logging setup.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod feed;
pub mod subscription;
pub mod utils;
