use num_traits::Float;

use crate::error::BlockError;

/// Row-major `rows × cols` container for the sequence being resampled.
///
/// Rows are time steps, columns are variables. A plain vector becomes a
/// single-column series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series<F> {
    data: Vec<F>,
    cols: usize,
}

impl<F> Series<F> {
    /// Create a single-column series from raw observations.
    pub fn new(data: Vec<F>) -> Self {
        let cols = usize::from(!data.is_empty());
        Self { data, cols }
    }

    /// Create a series from a flat row-major buffer with `cols` columns.
    pub fn from_row_major(data: Vec<F>, cols: usize) -> Result<Self, BlockError> {
        if cols == 0 || data.is_empty() {
            return Err(BlockError::EmptySeries);
        }
        if data.len() % cols != 0 {
            return Err(BlockError::LengthMismatch {
                field: "series",
                expected: (data.len() / cols + 1) * cols,
                got: data.len(),
            });
        }
        Ok(Self { data, cols })
    }

    /// Create a series from a list of equally sized rows.
    pub fn from_rows(rows: Vec<Vec<F>>) -> Result<Self, BlockError> {
        let cols = rows.first().map_or(0, Vec::len);
        if cols == 0 {
            return Err(BlockError::EmptySeries);
        }
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(BlockError::LengthMismatch {
                    field: "series row",
                    expected: cols,
                    got: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self { data, cols })
    }

    /// Number of rows (observations along the resampling axis).
    pub fn len(&self) -> usize {
        if self.cols == 0 { 0 } else { self.data.len() / self.cols }
    }

    /// Check if the series contains no observations
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.cols
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn row(&self, i: usize) -> &[F] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[F]> + '_ {
        self.data.chunks_exact(self.cols.max(1))
    }

    /// The flat row-major buffer.
    pub fn as_slice(&self) -> &[F] {
        &self.data
    }

    /// Consume the series and return its row-major buffer.
    pub fn into_inner(self) -> Vec<F> {
        self.data
    }
}

impl<F: Float> Series<F> {
    /// Gather `indices` into a new series, scaling row `k` by `scale[k]`.
    pub(crate) fn gather_scaled(&self, indices: &[usize], scale: &[f64]) -> Self {
        debug_assert_eq!(indices.len(), scale.len());
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for (&idx, &w) in indices.iter().zip(scale) {
            let w = F::from(w).unwrap_or_else(F::one);
            data.extend(self.row(idx).iter().map(|&x| x * w));
        }
        Self {
            data,
            cols: self.cols,
        }
    }

    /// Keep only the first `rows` rows.
    pub(crate) fn truncate(&mut self, rows: usize) {
        self.data.truncate(rows * self.cols);
    }

    /// Stack series vertically. All parts must share the same width.
    pub fn concat(parts: &[Series<F>]) -> Result<Self, BlockError> {
        let cols = parts.first().map_or(0, Series::width);
        if cols == 0 {
            return Err(BlockError::EmptySeries);
        }
        let total = parts.iter().map(|p| p.data.len()).sum();
        let mut data = Vec::with_capacity(total);
        for part in parts {
            if part.cols != cols {
                return Err(BlockError::LengthMismatch {
                    field: "series width",
                    expected: cols,
                    got: part.cols,
                });
            }
            data.extend_from_slice(&part.data);
        }
        Ok(Self { data, cols })
    }
}

impl<F> From<Vec<F>> for Series<F> {
    fn from(data: Vec<F>) -> Self {
        Self::new(data)
    }
}

impl<F> FromIterator<F> for Series<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Series::new(iter.into_iter().collect())
    }
}

impl<F> AsRef<[F]> for Series<F> {
    fn as_ref(&self) -> &[F] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_becomes_single_column() {
        let s: Series<f64> = (0..5).map(f64::from).collect();
        assert_eq!(s.len(), 5);
        assert_eq!(s.width(), 1);
        assert_eq!(s.row(3), &[3.0]);
    }

    #[test]
    fn empty_vector_has_no_rows() {
        let s = Series::<f64>::new(Vec::new());
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert_eq!(s.width(), 0);
    }

    #[test]
    fn rows_are_row_major() {
        let s = Series::from_rows(vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.width(), 2);
        assert_eq!(s.row(1), &[2.0, 20.0]);
        assert_eq!(s.rows().count(), 3);
        assert_eq!(s.as_slice(), &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = Series::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, BlockError::LengthMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn row_major_buffer_must_divide() {
        assert!(Series::from_row_major(vec![1.0_f32; 6], 3).is_ok());
        assert!(Series::from_row_major(vec![1.0_f32; 7], 3).is_err());
        assert_eq!(
            Series::from_row_major(Vec::<f32>::new(), 3).unwrap_err(),
            BlockError::EmptySeries
        );
    }

    #[test]
    fn gather_scaled_applies_row_weights() {
        let s = Series::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let g = s.gather_scaled(&[2, 0], &[0.5, 1.0]);
        assert_eq!(g.as_slice(), &[2.5, 3.0, 1.0, 2.0]);
    }

    #[test]
    fn concat_and_truncate() {
        let a: Series<f64> = vec![1.0, 2.0].into();
        let b: Series<f64> = vec![3.0, 4.0, 5.0].into();
        let mut c = Series::concat(&[a, b]).unwrap();
        assert_eq!(c.len(), 5);
        c.truncate(4);
        assert_eq!(c.into_inner(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn concat_rejects_mixed_widths() {
        let a: Series<f64> = vec![1.0].into();
        let b = Series::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        assert!(Series::concat(&[a, b]).is_err());
    }
}
