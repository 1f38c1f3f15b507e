// Per-sample driver shared by the reorder kernels.
//
// Every reorder touches one sample of `src` and the matching sample of `dst`
// only, so samples are split into disjoint chunks. With the `parallel`
// feature the chunks are handed to rayon.

use tr_tensor::{Element, TensorError};

use crate::error::Result;

/// Run `kernel(src_sample, dst_sample)` over every `sample_len` chunk.
///
/// # Errors
/// Returns an error if the buffers differ in length or do not hold a whole
/// number of samples.
pub(crate) fn for_each_sample<T, F>(src: &[T], dst: &mut [T], sample_len: usize, kernel: F) -> Result<()>
where
    T: Element,
    F: Fn(&[T], &mut [T]) + Send + Sync,
{
    if src.len() != dst.len() {
        return Err(TensorError::CountMismatch {
            expected: src.len(),
            got: dst.len(),
        }
        .into());
    }
    if sample_len == 0 {
        return if src.is_empty() {
            Ok(())
        } else {
            Err(TensorError::Other(format!(
                "cannot split {} elements into empty samples",
                src.len()
            ))
            .into())
        };
    }
    if src.len() % sample_len != 0 {
        return Err(TensorError::Other(format!(
            "buffer of {} elements is not a multiple of sample size {}",
            src.len(),
            sample_len
        ))
        .into());
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        dst.par_chunks_mut(sample_len)
            .zip(src.par_chunks(sample_len))
            .for_each(|(d, s)| kernel(s, d));
    }

    #[cfg(not(feature = "parallel"))]
    for (d, s) in dst.chunks_mut(sample_len).zip(src.chunks(sample_len)) {
        kernel(s, d);
    }

    Ok(())
}
