//! The indexable-dataset abstraction and the model-ready sample type.

use std::path::Path;

use gd_core::{FeatureMatrix, TimedRoute};

use crate::{DatasetError, DatasetResult};

/// A finite, randomly accessible collection of samples.
pub trait Dataset {
    type Item;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sample at `idx`, or [`DatasetError::IndexOutOfBounds`].
    fn get(&self, idx: usize) -> DatasetResult<Self::Item>;

    /// Every sample in index order.
    fn iter(&self) -> DatasetIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetIter { dataset: self, next: 0 }
    }
}

/// Iterator returned by [`Dataset::iter`].
pub struct DatasetIter<'a, D: Dataset> {
    dataset: &'a D,
    next: usize,
}

impl<D: Dataset> Iterator for DatasetIter<'_, D> {
    type Item = DatasetResult<D::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.dataset.len() {
            return None;
        }
        let item = self.dataset.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.dataset.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

/// One model-ready route sample.
///
/// All matrices share the same row count: the dataset's padded route length.
/// Padding rows are zero.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteSample {
    /// `rows × 7`, Monday first.
    pub day_of_week: FeatureMatrix,
    /// `rows × 96`.
    pub quarter_hour_of_day: FeatureMatrix,
    /// `rows × 12`.
    pub month: FeatureMatrix,
    pub route_with_timestamps: TimedRoute,
    /// `rows × 2`, radians.
    pub route_raw_padded: FeatureMatrix,
    /// `rows × 2`, scaled to `[0, 1]` where the dataset scales.
    pub route_scaled_padded: FeatureMatrix,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

#[inline]
pub(crate) fn check_index(index: usize, len: usize) -> DatasetResult<()> {
    if index >= len {
        return Err(DatasetError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

pub(crate) fn check_extension(path: &Path, expected: &'static str) -> DatasetResult<()> {
    if path.extension().and_then(|e| e.to_str()) != Some(expected) {
        return Err(DatasetError::WrongExtension { path: path.to_path_buf(), expected });
    }
    Ok(())
}
