use log::debug;
use tr_tensor::{Blob, BlobId, BlobStore, Element, Shape, TensorError};

use crate::error::{ReorderError, Result};
use crate::gather::ChannelGather;
use crate::param::{ReorderParam, StorageOrder};
use crate::transpose::PlanarTranspose;

/// A reorder layer with one input (bottom) and one output (top) blob.
///
/// Lifecycle: [`create`](Self::create), then [`setup`](Self::setup) against
/// the input, then any number of [`forward`](Self::forward) and
/// [`backward`](Self::backward) calls. Call `setup` again whenever the input
/// shape changes.
#[derive(Debug, Clone)]
pub enum ReorderLayer {
    ChannelOnly(ChannelGather),
    ChannelHeightWidth(PlanarTranspose),
}

impl ReorderLayer {
    pub const TYPE_NAME: &'static str = "Reorder";

    /// Pick the transform named by `param.order`.
    pub fn create(param: ReorderParam) -> Self {
        match param.order {
            StorageOrder::ChannelOnly => ReorderLayer::ChannelOnly(ChannelGather::new(param)),
            StorageOrder::ChannelHeightWidth => {
                ReorderLayer::ChannelHeightWidth(PlanarTranspose::new(param))
            }
        }
    }

    /// Create from a raw order code and a parameter carrying the remaining
    /// fields. The code overrides `param.order`.
    pub fn from_code(code: i32, mut param: ReorderParam) -> Result<Self> {
        param.order = StorageOrder::try_from(code)?;
        Ok(Self::create(param))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::create(ReorderParam::from_json(json)?))
    }

    pub fn order(&self) -> StorageOrder {
        match self {
            ReorderLayer::ChannelOnly(_) => StorageOrder::ChannelOnly,
            ReorderLayer::ChannelHeightWidth(_) => StorageOrder::ChannelHeightWidth,
        }
    }

    pub fn param(&self) -> &ReorderParam {
        match self {
            ReorderLayer::ChannelOnly(g) => g.param(),
            ReorderLayer::ChannelHeightWidth(t) => t.param(),
        }
    }

    /// Validate the configuration against the input shape and build any
    /// per-setup state. Does not touch blobs.
    pub fn layer_setup(&mut self, bottom: &Shape) -> Result<()> {
        debug!("setting up {} layer ({}) for {}", Self::TYPE_NAME, self.order(), bottom);
        match self {
            ReorderLayer::ChannelOnly(g) => g.setup(bottom),
            ReorderLayer::ChannelHeightWidth(t) => t.setup(bottom),
        }
    }

    pub fn output_shape(&self, bottom: &Shape) -> Result<Shape> {
        match self {
            ReorderLayer::ChannelOnly(g) => g.output_shape(bottom),
            ReorderLayer::ChannelHeightWidth(t) => t.output_shape(bottom),
        }
    }

    /// [`layer_setup`](Self::layer_setup) followed by [`reshape`](Self::reshape).
    pub fn setup<T: Element>(
        &mut self,
        store: &mut BlobStore<T>,
        bottom: BlobId,
        top: BlobId,
    ) -> Result<()> {
        if bottom == top {
            return Err(ReorderError::InPlace);
        }
        let shape = *store.get(bottom)?.shape();
        self.layer_setup(&shape)?;
        self.reshape(store, bottom, top)
    }

    /// Shape `top` for the current input.
    pub fn reshape<T: Element>(
        &self,
        store: &mut BlobStore<T>,
        bottom: BlobId,
        top: BlobId,
    ) -> Result<()> {
        let (b, t) = pair_mut(store, bottom, top)?;
        let shape = self.output_shape(b.shape())?;
        t.reshape(shape);
        if t.count() != b.count() {
            return Err(ReorderError::CountMismatch {
                expected: b.count(),
                got: t.count(),
            });
        }
        Ok(())
    }

    /// Reorder `bottom`'s values into `top`.
    pub fn forward<T: Element>(
        &self,
        store: &mut BlobStore<T>,
        bottom: BlobId,
        top: BlobId,
    ) -> Result<()> {
        let (b, t) = pair_mut(store, bottom, top)?;
        self.forward_blobs(b, t)
    }

    /// Route `top`'s gradient into `bottom`'s gradient.
    ///
    /// `propagate_down` holds one flag per input; this layer has one input.
    /// For the channel-only variant the result is the exact adjoint only
    /// when the index table is a bijection, see [`ChannelGather`].
    pub fn backward<T: Element>(
        &self,
        store: &mut BlobStore<T>,
        top: BlobId,
        propagate_down: &[bool],
        bottom: BlobId,
    ) -> Result<()> {
        let propagate = match propagate_down {
            [flag] => *flag,
            _ => {
                return Err(ReorderError::PropagateFlags {
                    expected: 1,
                    got: propagate_down.len(),
                })
            }
        };
        if !propagate {
            return Ok(());
        }
        let (t, b) = pair_mut(store, top, bottom)?;
        self.backward_blobs(t, propagate, b)
    }

    /// Forward over blobs the caller already holds.
    pub fn forward_blobs<T: Element>(&self, bottom: &Blob<T>, top: &mut Blob<T>) -> Result<()> {
        match self {
            ReorderLayer::ChannelOnly(g) => g.forward(bottom, top),
            ReorderLayer::ChannelHeightWidth(t) => t.forward(bottom, top),
        }
    }

    /// Backward over blobs the caller already holds.
    pub fn backward_blobs<T: Element>(
        &self,
        top: &Blob<T>,
        propagate_down: bool,
        bottom: &mut Blob<T>,
    ) -> Result<()> {
        match self {
            ReorderLayer::ChannelOnly(g) => g.backward(top, propagate_down, bottom),
            ReorderLayer::ChannelHeightWidth(t) => t.backward(top, propagate_down, bottom),
        }
    }
}

fn pair_mut<T: Element>(
    store: &mut BlobStore<T>,
    src: BlobId,
    dst: BlobId,
) -> Result<(&Blob<T>, &mut Blob<T>)> {
    store.pair_mut(src, dst).map_err(|e| match e {
        TensorError::Aliased(_) => ReorderError::InPlace,
        other => other.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(shape: Shape) -> (BlobStore<f32>, BlobId, BlobId) {
        let mut store = BlobStore::new();
        let data = (0..shape.count()).map(|i| i as f32).collect();
        let bottom = store.insert(Blob::new(data, shape));
        let top = store.insert(Blob::empty());
        (store, bottom, top)
    }

    #[test]
    fn test_create_dispatches_on_order() {
        let layer = ReorderLayer::create(ReorderParam::channel_only_positions(vec![0]));
        assert!(matches!(layer, ReorderLayer::ChannelOnly(_)));
        let layer = ReorderLayer::create(ReorderParam::channel_height_width(1, 1, 1));
        assert!(matches!(layer, ReorderLayer::ChannelHeightWidth(_)));
        assert_eq!(layer.order(), StorageOrder::ChannelHeightWidth);
    }

    #[test]
    fn test_from_code_rejects_unknown() {
        let param = ReorderParam::channel_only_positions(vec![0]);
        assert!(matches!(
            ReorderLayer::from_code(2, param.clone()),
            Err(ReorderError::UnknownOrder(_))
        ));
        let layer = ReorderLayer::from_code(0, param).unwrap();
        assert_eq!(layer.order(), StorageOrder::ChannelHeightWidth);
    }

    #[test]
    fn test_setup_shapes_top() {
        let (mut store, bottom, top) = store_with(Shape::new(2, 4, 2, 3));
        let mut layer =
            ReorderLayer::create(ReorderParam::channel_only_positions(vec![1, 2, 3, 4, 5, 0]));
        layer.setup(&mut store, bottom, top).unwrap();
        assert_eq!(store.get(top).unwrap().shape(), &Shape::new(2, 24, 1, 1));
    }

    #[test]
    fn test_in_place_rejected() {
        let (mut store, bottom, _) = store_with(Shape::new(1, 2, 1, 3));
        let mut layer = ReorderLayer::create(ReorderParam::channel_only_positions(vec![0, 1, 2]));
        assert!(matches!(
            layer.setup(&mut store, bottom, bottom),
            Err(ReorderError::InPlace)
        ));

        let top = store.insert(Blob::empty());
        layer.setup(&mut store, bottom, top).unwrap();
        assert!(matches!(
            layer.forward(&mut store, bottom, bottom),
            Err(ReorderError::InPlace)
        ));
        assert!(matches!(
            layer.backward(&mut store, bottom, &[true], bottom),
            Err(ReorderError::InPlace)
        ));
    }

    #[test]
    fn test_forward_before_setup() {
        let (mut store, bottom, top) = store_with(Shape::new(1, 1, 1, 1));
        let layer = ReorderLayer::create(ReorderParam::channel_only_positions(vec![0]));
        assert!(matches!(
            layer.forward(&mut store, bottom, top),
            Err(ReorderError::NotSetUp)
        ));
    }

    #[test]
    fn test_backward_flag_count() {
        let (mut store, bottom, top) = store_with(Shape::new(1, 1, 1, 3));
        let mut layer = ReorderLayer::create(ReorderParam::channel_only_positions(vec![2, 1, 0]));
        layer.setup(&mut store, bottom, top).unwrap();
        assert!(matches!(
            layer.backward(&mut store, top, &[], bottom),
            Err(ReorderError::PropagateFlags { expected: 1, got: 0 })
        ));
        assert!(layer.backward(&mut store, top, &[true, false], bottom).is_err());
    }

    #[test]
    fn test_backward_flag_false_leaves_diff() {
        let (mut store, bottom, top) = store_with(Shape::new(1, 1, 1, 3));
        let mut layer = ReorderLayer::create(ReorderParam::channel_only_positions(vec![2, 1, 0]));
        layer.setup(&mut store, bottom, top).unwrap();
        layer.forward(&mut store, bottom, top).unwrap();
        store.get_mut(top).unwrap().copy_data_to_diff();
        layer.backward(&mut store, top, &[false], bottom).unwrap();
        assert_eq!(store.get(bottom).unwrap().diff(), &[0.0; 3]);
    }

    #[test]
    fn test_unknown_blob() {
        let (mut store, bottom, top) = store_with(Shape::new(1, 1, 1, 1));
        let mut other: BlobStore<f32> = BlobStore::new();
        other.insert(Blob::empty());
        let mut layer = ReorderLayer::create(ReorderParam::channel_only_positions(vec![0]));
        layer.setup(&mut store, bottom, top).unwrap();
        assert!(matches!(
            layer.forward(&mut other, bottom, top),
            Err(ReorderError::Tensor(TensorError::UnknownBlob(_)))
        ));
    }
}
