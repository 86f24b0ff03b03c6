//! Dense row-major feature matrices.

use chrono::{DateTime, Utc};

use crate::time::{DAYS_PER_WEEK, MONTHS_PER_YEAR, QUARTER_HOURS_PER_DAY, TimeFeatures};
use crate::{GeoError, GeoResult};

/// A `rows × cols` matrix of `f64`, stored row-major.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl FeatureMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    /// A `n × 2` matrix from coordinate rows.
    pub fn from_rows(rows: &[[f64; 2]]) -> Self {
        Self {
            rows: rows.len(),
            cols: 2,
            data: rows.iter().flatten().copied().collect(),
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.offset(row, col).map(|i| self.data[i])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> GeoResult<()> {
        let i = self.checked_offset(row, col)?;
        self.data[i] = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        (row < self.rows).then(|| &self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Set `row` to the one-hot encoding of `class`.
    pub fn set_one_hot(&mut self, row: usize, class: usize) -> GeoResult<()> {
        let i = self.checked_offset(row, class)?;
        let start = row * self.cols;
        self.data[start..start + self.cols].fill(0.0);
        self.data[i] = 1.0;
        Ok(())
    }

    /// Append zero rows until the matrix has `target_rows` rows.
    pub fn pad_rows(&mut self, target_rows: usize) -> &mut Self {
        if target_rows > self.rows {
            self.data.resize(target_rows * self.cols, 0.0);
            self.rows = target_rows;
        }
        self
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }

    fn checked_offset(&self, row: usize, col: usize) -> GeoResult<usize> {
        if row >= self.rows {
            return Err(GeoError::IndexOutOfBounds { index: row, len: self.rows });
        }
        if col >= self.cols {
            return Err(GeoError::IndexOutOfBounds { index: col, len: self.cols });
        }
        Ok(row * self.cols + col)
    }
}

/// One-hot day-of-week (`rows × 7`), quarter-hour (`rows × 96`) and month
/// (`rows × 12`) matrices.  Rows past the end of `timestamps` stay zero;
/// timestamps past `rows` are ignored.
pub fn one_hot_time_features(
    timestamps: &[DateTime<Utc>],
    rows: usize,
) -> (FeatureMatrix, FeatureMatrix, FeatureMatrix) {
    let mut day = FeatureMatrix::zeros(rows, DAYS_PER_WEEK);
    let mut quarter = FeatureMatrix::zeros(rows, QUARTER_HOURS_PER_DAY);
    let mut month = FeatureMatrix::zeros(rows, MONTHS_PER_YEAR);

    for (row, ts) in timestamps.iter().take(rows).enumerate() {
        let f = TimeFeatures::from_datetime(ts);
        // Indices are in range by construction of `TimeFeatures`.
        let _ = day.set_one_hot(row, f.day_of_week as usize);
        let _ = quarter.set_one_hot(row, f.quarter_hour_of_day as usize);
        let _ = month.set_one_hot(row, f.month as usize);
    }
    (day, quarter, month)
}
