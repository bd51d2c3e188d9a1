//! The `utils` module provides shared definitions used across the `popfeed`
//! client: the error taxonomy and logging setup.

pub mod error;
pub mod logging;
