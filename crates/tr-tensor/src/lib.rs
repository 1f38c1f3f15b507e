//! `tr-tensor` - Blob storage and shapes for tensor-reorder.
//!
//! This crate provides:
//! - A 4-axis `Shape` (num, channels, height, width)
//! - A `Blob` holding values and gradients for any `Element` type
//! - A `BlobStore` that owns blobs and hands them out by `BlobId`
//! - Data type definitions (F16, F32, F64)

pub mod blob;
pub mod dtype;
pub mod error;
pub mod shape;
pub mod store;

// Re-export primary types at the crate root for convenience.
pub use blob::Blob;
pub use dtype::{DType, Element};
pub use error::{Result, TensorError};
pub use shape::Shape;
pub use store::{BlobId, BlobStore};
