use log::warn;

use crate::error::{ReorderError, Result};
use crate::param::ReorderParam;

/// Output spatial slot to source spatial offset, for one `height x width`
/// plane.
///
/// Every entry is below `height * width` and the table has exactly
/// `height * width` entries. Entries are not required to be distinct; see
/// [`IndexTable::is_bijection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTable {
    entries: Box<[usize]>,
    height: usize,
    width: usize,
}

impl IndexTable {
    /// Build the table for a `height x width` plane from a channel-only
    /// parameter.
    ///
    /// Uses `position` when it is non-empty, otherwise the `row`/`col` lists.
    ///
    /// # Errors
    /// - [`ReorderError::ConflictingEncoding`] if positions and row/col are
    ///   both given
    /// - [`ReorderError::LengthMismatch`] if a list does not have
    ///   `height * width` entries
    /// - an out-of-range error naming the first offending slot
    pub fn build(height: usize, width: usize, param: &ReorderParam) -> Result<IndexTable> {
        let table = if !param.position.is_empty() {
            if !param.row.is_empty() || !param.col.is_empty() {
                return Err(ReorderError::ConflictingEncoding {
                    positions: param.position.len(),
                    rows: param.row.len(),
                    cols: param.col.len(),
                });
            }
            Self::from_positions(height, width, &param.position)?
        } else {
            Self::from_row_col(height, width, &param.row, &param.col)?
        };

        if !table.is_bijection() {
            warn!(
                "reorder index table over {}x{} plane repeats entries; \
                 backward keeps only the last gradient written to each position",
                height, width
            );
        }
        Ok(table)
    }

    /// Build from flat positions, each in `[0, height * width)`.
    pub fn from_positions(height: usize, width: usize, positions: &[i64]) -> Result<IndexTable> {
        let size = height * width;
        if positions.len() != size {
            return Err(ReorderError::LengthMismatch {
                what: "position",
                expected: size,
                got: positions.len(),
            });
        }

        let entries = positions
            .iter()
            .enumerate()
            .map(|(slot, &value)| {
                checked_index(value, size).ok_or(ReorderError::PositionOutOfRange {
                    slot,
                    value,
                    size,
                })
            })
            .collect::<Result<Box<[usize]>>>()?;

        Ok(IndexTable {
            entries,
            height,
            width,
        })
    }

    /// Build from paired coordinates, mapping `(row, col)` to `row * width + col`.
    pub fn from_row_col(height: usize, width: usize, rows: &[i64], cols: &[i64]) -> Result<IndexTable> {
        if rows.len() != cols.len() {
            return Err(ReorderError::LengthMismatch {
                what: "col",
                expected: rows.len(),
                got: cols.len(),
            });
        }
        let size = height * width;
        if rows.len() != size {
            return Err(ReorderError::LengthMismatch {
                what: "row",
                expected: size,
                got: rows.len(),
            });
        }

        let mut entries = Vec::with_capacity(size);
        for (slot, (&row, &col)) in rows.iter().zip(cols).enumerate() {
            let r = checked_index(row, height).ok_or(ReorderError::RowOutOfRange {
                slot,
                value: row,
                height,
            })?;
            let c = checked_index(col, width).ok_or(ReorderError::ColOutOfRange {
                slot,
                value: col,
                width,
            })?;
            entries.push(r * width + c);
        }

        Ok(IndexTable {
            entries: entries.into_boxed_slice(),
            height,
            width,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.entries
    }

    /// True when every position in the plane appears exactly once.
    ///
    /// Only then is the channel gather's backward pass an exact adjoint.
    pub fn is_bijection(&self) -> bool {
        let mut seen = vec![false; self.entries.len()];
        for &e in self.entries.iter() {
            if std::mem::replace(&mut seen[e], true) {
                return false;
            }
        }
        true
    }
}

fn checked_index(value: i64, bound: usize) -> Option<usize> {
    usize::try_from(value).ok().filter(|&v| v < bound)
}
