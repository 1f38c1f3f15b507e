//! `tr-reorder` - Differentiable reorder layer for tensor-reorder.
//!
//! Two transforms are available, chosen by [`StorageOrder`]:
//! - [`ChannelGather`]: permutes the spatial plane of every channel through an
//!   [`IndexTable`] and interleaves channels into a `(N, C*H*W, 1, 1)` output
//! - [`PlanarTranspose`]: turns channel-innermost samples into
//!   channel-outermost ones for explicit `(channels, height, width)`
//!
//! Both run backward through the same index arithmetic. Running a gather and
//! then a transpose configured with the gather input's `(C, H, W)` yields the
//! input with each plane permuted by the table.
//!
//! Enable the `parallel` feature to process batch samples on the rayon pool.

pub mod error;
pub mod gather;
pub mod index_table;
mod kernel;
pub mod layer;
pub mod param;
pub mod transpose;

pub use error::{ReorderError, Result};
pub use gather::ChannelGather;
pub use index_table::IndexTable;
pub use layer::ReorderLayer;
pub use param::{ReorderParam, StorageOrder};
pub use transpose::{PlanarTranspose, PlaneDims};
