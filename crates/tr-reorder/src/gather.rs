use log::{debug, trace};
use tr_tensor::{Blob, Element, Shape, TensorError};

use crate::error::{ReorderError, Result};
use crate::index_table::IndexTable;
use crate::kernel::for_each_sample;
use crate::param::ReorderParam;

/// Channel-replicated spatial gather.
///
/// Within each sample, output slot `i` of every channel `c` reads spatial
/// position `table[i]`; the output is written slot-major, channel-minor as a
/// `(num, channels * height * width, 1, 1)` blob.
///
/// # Gradient limitation
/// Backward assigns rather than accumulates. If the index table repeats a
/// position, that position's input gradient ends up holding the value from
/// the last slot that reads it; contributions are not summed. Use a
/// bijective table when gradients matter.
#[derive(Debug, Clone)]
pub struct ChannelGather {
    param: ReorderParam,
    table: Option<IndexTable>,
}

impl ChannelGather {
    pub fn new(param: ReorderParam) -> Self {
        ChannelGather { param, table: None }
    }

    pub fn param(&self) -> &ReorderParam {
        &self.param
    }

    /// The table built by the last successful [`setup`](Self::setup).
    pub fn table(&self) -> Option<&IndexTable> {
        self.table.as_ref()
    }

    /// Validate the parameter against the input's spatial plane and rebuild
    /// the index table.
    ///
    /// On failure the previous table is dropped, leaving the transform
    /// unusable until a setup succeeds.
    pub fn setup(&mut self, bottom: &Shape) -> Result<()> {
        self.table = None;
        let table = IndexTable::build(bottom.height(), bottom.width(), &self.param)?;
        debug!(
            "channel gather set up for {}: {} slots x {} channels",
            bottom,
            table.len(),
            bottom.channels()
        );
        self.table = Some(table);
        Ok(())
    }

    /// Shape of the output for `bottom`, `(num, channels * height * width, 1, 1)`.
    pub fn output_shape(&self, bottom: &Shape) -> Result<Shape> {
        self.checked_table(bottom)?;
        Ok(Shape::new(bottom.num(), bottom.sample_count(), 1, 1))
    }

    pub fn forward<T: Element>(&self, bottom: &Blob<T>, top: &mut Blob<T>) -> Result<()> {
        let table = self.checked_table(bottom.shape())?;
        trace!("channel gather forward {} -> {}", bottom.shape(), top.shape());
        gather_forward(bottom.data(), top.data_mut(), table, bottom.shape().channels())
    }

    /// Write `top`'s gradient back into `bottom`'s gradient.
    ///
    /// Does nothing when `propagate_down` is false. Positions of `bottom`
    /// that no slot reads are left untouched.
    pub fn backward<T: Element>(
        &self,
        top: &Blob<T>,
        propagate_down: bool,
        bottom: &mut Blob<T>,
    ) -> Result<()> {
        if !propagate_down {
            return Ok(());
        }
        let table = self.checked_table(bottom.shape())?;
        let channels = bottom.shape().channels();
        trace!("channel gather backward {} -> {}", top.shape(), bottom.shape());
        gather_backward(top.diff(), bottom.diff_mut(), table, channels)
    }

    fn checked_table(&self, bottom: &Shape) -> Result<&IndexTable> {
        let table = self.table.as_ref().ok_or(ReorderError::NotSetUp)?;
        if table.height() != bottom.height() || table.width() != bottom.width() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![table.height(), table.width()],
                got: vec![bottom.height(), bottom.width()],
            }
            .into());
        }
        Ok(table)
    }
}

/// `dst[n][channels * i + c] = src[n][c * plane + table[i]]` for every sample.
pub fn gather_forward<T: Element>(
    src: &[T],
    dst: &mut [T],
    table: &IndexTable,
    channels: usize,
) -> Result<()> {
    let plane = table.len();
    let positions = table.as_slice();
    for_each_sample(src, dst, channels * plane, |s, d| {
        for (i, &pos) in positions.iter().enumerate() {
            for c in 0..channels {
                d[channels * i + c] = s[c * plane + pos];
            }
        }
    })
}

/// Reverse of [`gather_forward`]: `src_diff[n][c * plane + table[i]] =
/// dst_diff[n][channels * i + c]`, visiting slots in table order.
pub fn gather_backward<T: Element>(
    dst_diff: &[T],
    src_diff: &mut [T],
    table: &IndexTable,
    channels: usize,
) -> Result<()> {
    let plane = table.len();
    let positions = table.as_slice();
    for_each_sample(dst_diff, src_diff, channels * plane, |d, s| {
        for (i, &pos) in positions.iter().enumerate() {
            for c in 0..channels {
                s[c * plane + pos] = d[channels * i + c];
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iota(shape: Shape) -> Blob<f32> {
        Blob::new((0..shape.count()).map(|i| i as f32).collect(), shape)
    }

    fn gather(positions: &[i64], bottom: &Shape) -> ChannelGather {
        let mut g = ChannelGather::new(ReorderParam::channel_only_positions(positions.to_vec()));
        g.setup(bottom).unwrap();
        g
    }

    #[test]
    fn test_output_shape() {
        let shape = Shape::new(2, 4, 2, 3);
        let g = gather(&[1, 2, 3, 4, 5, 0], &shape);
        assert_eq!(g.output_shape(&shape).unwrap(), Shape::new(2, 24, 1, 1));
    }

    #[test]
    fn test_forward_identity_interleaves_channels() {
        // 1 sample, 2 channels, 1x3 plane
        let shape = Shape::new(1, 2, 1, 3);
        let g = gather(&[0, 1, 2], &shape);
        let bottom = iota(shape);
        let mut top = Blob::zeros(g.output_shape(&shape).unwrap());
        g.forward(&bottom, &mut top).unwrap();
        assert_eq!(top.data(), &[0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_forward_permuted() {
        let shape = Shape::new(2, 2, 1, 3);
        let g = gather(&[2, 0, 1], &shape);
        let bottom = iota(shape);
        let mut top = Blob::zeros(g.output_shape(&shape).unwrap());
        g.forward(&bottom, &mut top).unwrap();
        assert_eq!(
            top.data(),
            &[2.0, 5.0, 0.0, 3.0, 1.0, 4.0, 8.0, 11.0, 6.0, 9.0, 7.0, 10.0]
        );
    }

    #[test]
    fn test_forward_duplicate_fans_out() {
        let shape = Shape::new(1, 1, 1, 3);
        let g = gather(&[1, 1, 0], &shape);
        let bottom = iota(shape);
        let mut top = Blob::zeros(g.output_shape(&shape).unwrap());
        g.forward(&bottom, &mut top).unwrap();
        assert_eq!(top.data(), &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_backward_bijective_is_adjoint() {
        let shape = Shape::new(3, 4, 2, 3);
        let g = gather(&[1, 2, 3, 4, 5, 0], &shape);
        let mut bottom = iota(shape);
        let mut top = Blob::zeros(g.output_shape(&shape).unwrap());
        g.forward(&bottom, &mut top).unwrap();
        top.copy_data_to_diff();
        g.backward(&top, true, &mut bottom).unwrap();
        assert_eq!(bottom.diff(), bottom.data());
    }

    #[test]
    fn test_backward_duplicate_last_slot_wins() {
        // slots 0 and 2 both read position 1
        let shape = Shape::new(1, 2, 1, 3);
        let g = gather(&[1, 0, 1], &shape);
        let mut bottom: Blob<f32> = Blob::zeros(shape);
        let mut top = Blob::zeros(g.output_shape(&shape).unwrap());
        top.diff_mut()
            .copy_from_slice(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        g.backward(&top, true, &mut bottom).unwrap();
        // channel 0: pos 1 <- slot 2 (50), pos 0 <- slot 1 (30), pos 2 untouched
        // channel 1: pos 1 <- slot 2 (60), pos 0 <- slot 1 (40)
        assert_eq!(bottom.diff(), &[30.0, 50.0, 0.0, 40.0, 60.0, 0.0]);
    }

    #[test]
    fn test_backward_without_propagation_is_noop() {
        let shape = Shape::new(1, 1, 1, 3);
        let g = gather(&[2, 1, 0], &shape);
        let mut bottom: Blob<f32> = Blob::zeros(shape);
        let mut top = Blob::zeros(g.output_shape(&shape).unwrap());
        top.diff_mut().copy_from_slice(&[1.0, 2.0, 3.0]);
        g.backward(&top, false, &mut bottom).unwrap();
        assert_eq!(bottom.diff(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_forward_before_setup() {
        let g = ChannelGather::new(ReorderParam::channel_only_positions(vec![0]));
        let bottom = iota(Shape::new(1, 1, 1, 1));
        let mut top = Blob::zeros(Shape::new(1, 1, 1, 1));
        assert!(matches!(
            g.forward(&bottom, &mut top),
            Err(ReorderError::NotSetUp)
        ));
    }

    #[test]
    fn test_failed_setup_drops_old_table() {
        let shape = Shape::new(1, 1, 1, 3);
        let mut g = gather(&[2, 1, 0], &shape);
        assert!(g.table().is_some());
        assert!(g.setup(&Shape::new(1, 1, 2, 3)).is_err());
        assert!(g.table().is_none());
    }

    #[test]
    fn test_plane_changed_since_setup() {
        let g = gather(&[2, 1, 0], &Shape::new(1, 1, 1, 3));
        let bottom = iota(Shape::new(1, 1, 3, 1));
        let mut top = Blob::zeros(Shape::new(1, 3, 1, 1));
        assert!(matches!(
            g.forward(&bottom, &mut top),
            Err(ReorderError::Tensor(TensorError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn test_forward_count_mismatch() {
        let shape = Shape::new(2, 1, 1, 3);
        let g = gather(&[2, 1, 0], &shape);
        let bottom = iota(shape);
        let mut top = Blob::zeros(Shape::new(1, 3, 1, 1));
        assert!(g.forward(&bottom, &mut top).is_err());
    }
}
