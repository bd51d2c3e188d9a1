//! The `catalog` module covers the plain request/response calls against the
//! backend: listing the known topics and writing a message to a topic.

pub mod backend;
pub mod topics;
pub mod writer;

pub use backend::Backend;
pub use topics::TopicCatalog;
pub use writer::{MessageWriter, WriteResponse};
