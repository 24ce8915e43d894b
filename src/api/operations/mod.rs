//! CREST operations module
//!
//! Normalized operation input and its translation into HTTP request descriptors.

pub mod operation;
pub mod request;

pub use operation::{OperationInput, OperationKind};
pub use request::{RequestBuilder, RequestDescriptor};
