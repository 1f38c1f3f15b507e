use std::fmt;

/// Number of logical axes a blob carries: num, channels, height, width.
pub const NUM_AXES: usize = 4;

/// A 4-axis blob shape `(num, channels, height, width)`.
///
/// Storage is row-major with `width` varying fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: [usize; NUM_AXES],
}

impl Shape {
    /// Create a new shape from the four axis sizes.
    pub fn new(num: usize, channels: usize, height: usize, width: usize) -> Self {
        Shape {
            dims: [num, channels, height, width],
        }
    }

    pub fn num(&self) -> usize {
        self.dims[0]
    }

    pub fn channels(&self) -> usize {
        self.dims[1]
    }

    pub fn height(&self) -> usize {
        self.dims[2]
    }

    pub fn width(&self) -> usize {
        self.dims[3]
    }

    /// Total number of elements (product of all axis sizes).
    pub fn count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Number of elements in one sample, `channels * height * width`.
    pub fn sample_count(&self) -> usize {
        self.dims[1..].iter().product()
    }

    /// Returns the axis sizes.
    pub fn dims(&self) -> &[usize; NUM_AXES] {
        &self.dims
    }

    /// Computes row-major contiguous strides for this shape.
    ///
    /// For a shape (n, c, h, w), the strides are [c*h*w, h*w, w, 1].
    pub fn strides(&self) -> [usize; NUM_AXES] {
        let mut strides = [1usize; NUM_AXES];
        for i in (0..NUM_AXES - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Linear offset of element `(n, c, h, w)`.
    ///
    /// # Panics
    /// Panics if any index is outside its axis.
    pub fn offset(&self, n: usize, c: usize, h: usize, w: usize) -> usize {
        let idx = [n, c, h, w];
        for (axis, (&i, &d)) in idx.iter().zip(self.dims.iter()).enumerate() {
            assert!(i < d, "index {} out of range for axis {} of {}", i, axis, self);
        }
        idx.iter().zip(self.strides()).map(|(&i, s)| i * s).sum()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.dims[0], self.dims[1], self.dims[2], self.dims[3]
        )
    }
}
