use std::fmt;

use crate::blob::Blob;
use crate::dtype::Element;
use crate::error::{Result, TensorError};

/// Handle to a blob owned by a [`BlobStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobId(usize);

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns every blob a graph works on and hands them out by handle.
///
/// Blobs are never removed, so a `BlobId` stays valid for the lifetime of
/// the store.
#[derive(Debug, Default)]
pub struct BlobStore<T: Element> {
    blobs: Vec<Blob<T>>,
}

impl<T: Element> BlobStore<T> {
    pub fn new() -> Self {
        BlobStore { blobs: Vec::new() }
    }

    /// Take ownership of a blob and return its handle.
    pub fn insert(&mut self, blob: Blob<T>) -> BlobId {
        self.blobs.push(blob);
        BlobId(self.blobs.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn get(&self, id: BlobId) -> Result<&Blob<T>> {
        self.blobs.get(id.0).ok_or(TensorError::UnknownBlob(id.0))
    }

    pub fn get_mut(&mut self, id: BlobId) -> Result<&mut Blob<T>> {
        self.blobs.get_mut(id.0).ok_or(TensorError::UnknownBlob(id.0))
    }

    /// Borrow `src` for reading and `dst` for writing at the same time.
    ///
    /// # Errors
    /// Returns [`TensorError::Aliased`] if both handles name the same blob,
    /// and [`TensorError::UnknownBlob`] for a handle this store never issued.
    pub fn pair_mut(&mut self, src: BlobId, dst: BlobId) -> Result<(&Blob<T>, &mut Blob<T>)> {
        if src == dst {
            return Err(TensorError::Aliased(src.0));
        }
        for id in [src, dst] {
            if id.0 >= self.blobs.len() {
                return Err(TensorError::UnknownBlob(id.0));
            }
        }
        if src.0 < dst.0 {
            let (head, tail) = self.blobs.split_at_mut(dst.0);
            Ok((&head[src.0], &mut tail[0]))
        } else {
            let (head, tail) = self.blobs.split_at_mut(src.0);
            Ok((&tail[0], &mut head[dst.0]))
        }
    }
}
