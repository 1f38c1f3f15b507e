use log::{debug, trace};
use tr_tensor::{Blob, Element, Shape};

use crate::error::{ReorderError, Result};
use crate::kernel::for_each_sample;
use crate::param::ReorderParam;

/// Explicit `(channels, height, width)` of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneDims {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl PlaneDims {
    pub fn sample_count(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// `channels * height * width`, or `None` if it does not fit in `usize`.
    pub fn checked_sample_count(&self) -> Option<usize> {
        self.channels
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(self.width))
    }

    /// Elements in `num` samples, or an overflow error.
    fn checked_count(&self, num: usize) -> Result<usize> {
        self.checked_sample_count()
            .and_then(|n| n.checked_mul(num))
            .ok_or_else(|| ReorderError::DimensionOverflow {
                dims: vec![num, self.channels, self.height, self.width],
            })
    }

    /// Offset of `(c, h, w)` in a sample stored channel-innermost.
    #[inline]
    pub fn interleaved(&self, c: usize, h: usize, w: usize) -> usize {
        (h * self.width + w) * self.channels + c
    }

    /// Offset of `(c, h, w)` in a sample stored channel-outermost.
    #[inline]
    pub fn planar(&self, c: usize, h: usize, w: usize) -> usize {
        (c * self.height + h) * self.width + w
    }
}

/// Converts interleaved samples (`h, w` outer, `c` innermost) into planar
/// ones (`c` outer) on forward, and back on backward.
///
/// The input's own axes are ignored apart from `num`; the configured
/// dimensions decide how each sample is read. The output keeps the input's
/// shape.
#[derive(Debug, Clone)]
pub struct PlanarTranspose {
    param: ReorderParam,
    dims: Option<PlaneDims>,
    num: usize,
}

impl PlanarTranspose {
    pub fn new(param: ReorderParam) -> Self {
        PlanarTranspose {
            param,
            dims: None,
            num: 0,
        }
    }

    pub fn param(&self) -> &ReorderParam {
        &self.param
    }

    /// Dimensions validated by the last successful setup.
    pub fn dims(&self) -> Option<PlaneDims> {
        self.dims
    }

    /// Check that `channels`, `height` and `width` are configured and that
    /// `num * channels * height * width` matches the input exactly.
    pub fn setup(&mut self, bottom: &Shape) -> Result<()> {
        self.dims = None;
        let dims = PlaneDims {
            channels: self.param.channels.ok_or(ReorderError::MissingParam("channels"))?,
            height: self.param.height.ok_or(ReorderError::MissingParam("height"))?,
            width: self.param.width.ok_or(ReorderError::MissingParam("width"))?,
        };
        let expected = dims.checked_count(bottom.num())?;
        if expected != bottom.count() {
            return Err(ReorderError::CountMismatch {
                expected,
                got: bottom.count(),
            });
        }
        debug!(
            "planar transpose set up for {}: {}x{}x{} per sample",
            bottom, dims.channels, dims.height, dims.width
        );
        self.num = bottom.num();
        self.dims = Some(dims);
        Ok(())
    }

    /// The output mirrors the input shape.
    pub fn output_shape(&self, bottom: &Shape) -> Result<Shape> {
        self.checked_dims(bottom)?;
        Ok(*bottom)
    }

    pub fn forward<T: Element>(&self, bottom: &Blob<T>, top: &mut Blob<T>) -> Result<()> {
        let dims = self.checked_dims(bottom.shape())?;
        trace!("planar transpose forward {} -> {}", bottom.shape(), top.shape());
        interleaved_to_planar(bottom.data(), top.data_mut(), dims)
    }

    pub fn backward<T: Element>(
        &self,
        top: &Blob<T>,
        propagate_down: bool,
        bottom: &mut Blob<T>,
    ) -> Result<()> {
        if !propagate_down {
            return Ok(());
        }
        let dims = self.checked_dims(bottom.shape())?;
        trace!("planar transpose backward {} -> {}", top.shape(), bottom.shape());
        planar_to_interleaved(top.diff(), bottom.diff_mut(), dims)
    }

    fn checked_dims(&self, bottom: &Shape) -> Result<PlaneDims> {
        let dims = self.dims.ok_or(ReorderError::NotSetUp)?;
        let expected = dims.checked_count(self.num)?;
        if bottom.num() != self.num || bottom.count() != expected {
            return Err(ReorderError::CountMismatch {
                expected,
                got: bottom.count(),
            });
        }
        Ok(dims)
    }
}

pub fn interleaved_to_planar<T: Element>(src: &[T], dst: &mut [T], dims: PlaneDims) -> Result<()> {
    for_each_sample(src, dst, dims.sample_count(), |s, d| {
        for c in 0..dims.channels {
            for h in 0..dims.height {
                for w in 0..dims.width {
                    d[dims.planar(c, h, w)] = s[dims.interleaved(c, h, w)];
                }
            }
        }
    })
}

pub fn planar_to_interleaved<T: Element>(src: &[T], dst: &mut [T], dims: PlaneDims) -> Result<()> {
    for_each_sample(src, dst, dims.sample_count(), |s, d| {
        for c in 0..dims.channels {
            for h in 0..dims.height {
                for w in 0..dims.width {
                    d[dims.interleaved(c, h, w)] = s[dims.planar(c, h, w)];
                }
            }
        }
    })
}
