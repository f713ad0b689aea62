//! Dense square matrix shared by distances and pheromone trails.
//!
//! The matrix owns a flat row-major buffer; all access goes through
//! bounds-checked (row, col) accessors so a bad column index can never
//! silently alias into the next row.

/// Dense (size x size) matrix backed by a flat row-major buffer
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    data: Vec<f64>,
    size: usize,
}

impl SquareMatrix {
    /// Create a size x size matrix with every entry set to `value`
    pub fn filled(size: usize, value: f64) -> Self {
        SquareMatrix {
            data: vec![value; size * size],
            size,
        }
    }

    /// Create a size x size matrix of zeros
    pub fn zeros(size: usize) -> Self {
        Self::filled(size, 0.0)
    }

    /// Build a matrix from a row-major buffer of length size * size
    pub fn from_rows(size: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(SquareMatrix { data, size })
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.size && col < self.size,
            "matrix index ({}, {}) out of bounds for size {}",
            row,
            col,
            self.size
        );
        row * self.size + col
    }

    /// Get the entry at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[self.index(row, col)]
    }

    /// Set the entry at (row, col)
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let idx = self.index(row, col);
        self.data[idx] = value;
    }

    /// Add `delta` to the entry at (row, col)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, delta: f64) {
        let idx = self.index(row, col);
        self.data[idx] += delta;
    }

    /// Multiply every entry by `factor`
    pub fn scale_all(&mut self, factor: f64) {
        for entry in &mut self.data {
            *entry *= factor;
        }
    }

    /// Number of rows (= number of columns)
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Check that the matrix equals its transpose
    pub fn is_symmetric(&self) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if (self.get(i, j) - self.get(j, i)).abs() > f64::EPSILON {
                    return false;
                }
            }
        }
        true
    }

    /// Iterate over all entries in row-major order
    pub fn entries(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut m = SquareMatrix::zeros(3);
        m.set(1, 2, 4.5);
        assert_eq!(m.get(1, 2), 4.5);
        assert_eq!(m.get(2, 1), 0.0);
        assert_eq!(m.size(), 3);
    }

    #[test]
    fn test_filled_and_scale() {
        let mut m = SquareMatrix::filled(2, 1.0);
        m.scale_all(0.9);
        for entry in m.entries() {
            assert!((entry - 0.9).abs() < 1e-12);
        }
    }

    #[test]
    fn test_add() {
        let mut m = SquareMatrix::zeros(2);
        m.add(0, 1, 0.5);
        m.add(0, 1, 0.25);
        assert!((m.get(0, 1) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_symmetry() {
        let mut m = SquareMatrix::zeros(3);
        m.set(0, 1, 2.0);
        m.set(1, 0, 2.0);
        assert!(m.is_symmetric());
        m.set(0, 2, 7.0);
        assert!(!m.is_symmetric());
    }

    #[test]
    fn test_from_rows_rejects_bad_length() {
        assert!(SquareMatrix::from_rows(2, vec![0.0; 3]).is_none());
        assert!(SquareMatrix::from_rows(2, vec![0.0; 4]).is_some());
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_column() {
        let m = SquareMatrix::zeros(2);
        m.get(0, 2);
    }
}
