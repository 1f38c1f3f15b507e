use crate::dtype::{DType, Element};
use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// A 4-axis blob holding values and their gradients.
///
/// `data` and `diff` are contiguous, row-major and always `shape.count()`
/// elements long.
#[derive(Debug, Clone)]
pub struct Blob<T: Element> {
    data: Vec<T>,
    diff: Vec<T>,
    shape: Shape,
}

impl<T: Element> Blob<T> {
    /// Create a new blob from data and a shape. The gradient starts at zero.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.count()`.
    pub fn new(data: Vec<T>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.count(),
            "data length {} does not match shape {} (count={})",
            data.len(),
            shape,
            shape.count()
        );
        Blob {
            diff: vec![T::zero(); data.len()],
            data,
            shape,
        }
    }

    /// Create a zero-filled blob with the given shape.
    pub fn zeros(shape: Shape) -> Self {
        let n = shape.count();
        Blob {
            data: vec![T::zero(); n],
            diff: vec![T::zero(); n],
            shape,
        }
    }

    /// An empty `(0, 0, 0, 0)` blob, to be shaped later by a layer.
    pub fn empty() -> Self {
        Self::zeros(Shape::new(0, 0, 0, 0))
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn count(&self) -> usize {
        self.shape.count()
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Change the shape of the blob.
    ///
    /// Contents are kept when the element count is unchanged; otherwise both
    /// buffers are resized, zero-filling any new elements.
    pub fn reshape(&mut self, shape: Shape) {
        let n = shape.count();
        if n != self.data.len() {
            self.data.resize(n, T::zero());
            self.diff.resize(n, T::zero());
        }
        self.shape = shape;
    }

    /// Reinterpret the axes without touching the contents.
    ///
    /// # Errors
    /// Returns an error if the element count would change.
    pub fn view_as(&mut self, shape: Shape) -> Result<()> {
        if shape.count() != self.count() {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: shape.dims().to_vec(),
            });
        }
        self.shape = shape;
        Ok(())
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn diff(&self) -> &[T] {
        &self.diff
    }

    pub fn diff_mut(&mut self) -> &mut [T] {
        &mut self.diff
    }

    /// Copy the forward values into the gradient buffer.
    pub fn copy_data_to_diff(&mut self) {
        self.diff.copy_from_slice(&self.data);
    }

    /// Value at `(n, c, h, w)`.
    pub fn data_at(&self, n: usize, c: usize, h: usize, w: usize) -> T {
        self.data[self.shape.offset(n, c, h, w)]
    }

    /// Gradient at `(n, c, h, w)`.
    pub fn diff_at(&self, n: usize, c: usize, h: usize, w: usize) -> T {
        self.diff[self.shape.offset(n, c, h, w)]
    }
}
