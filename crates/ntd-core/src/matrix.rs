//! Dense sample matrix: the one numeric container shared by records,
//! binned signals, and trial fields. Rows are samples (time), columns are
//! channels, stored row-major so one sample's channels are contiguous.

use crate::error::{NtdError, NtdResult};
use serde::{Deserialize, Serialize};

/// Row-major 2-D array of f64 samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a matrix from row-major data
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> NtdResult<Self> {
        if data.len() != rows * cols {
            return Err(NtdError::InvalidSignalData {
                reason: format!(
                    "Data length {} doesn't match {}x{} shape",
                    data.len(),
                    rows,
                    cols
                ),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Create a zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build a matrix from channel-major column vectors.
    /// All columns must have equal length.
    pub fn from_columns(columns: &[Vec<f64>]) -> NtdResult<Self> {
        let cols = columns.len();
        let rows = columns.first().map_or(0, |c| c.len());
        for (i, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(NtdError::InvalidSignalData {
                    reason: format!(
                        "Column {} has {} samples, expected {}",
                        i,
                        column.len(),
                        rows
                    ),
                });
            }
        }

        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for column in columns {
                data.push(column[row]);
            }
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Build a single-column matrix from one channel of samples
    pub fn from_column(column: Vec<f64>) -> Self {
        let rows = column.len();
        Matrix { rows, cols: 1, data: column }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Single element access
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// One row as a slice (a sample across all channels)
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row < self.rows {
            Some(&self.data[row * self.cols..(row + 1) * self.cols])
        } else {
            None
        }
    }

    /// Extract one channel as an owned vector
    pub fn column(&self, col: usize) -> NtdResult<Vec<f64>> {
        if col >= self.cols {
            return Err(NtdError::InvalidSignalData {
                reason: format!("Column index {} out of bounds (0-{})", col, self.cols),
            });
        }
        Ok((0..self.rows)
            .map(|row| self.data[row * self.cols + col])
            .collect())
    }

    /// All channels as separate vectors (channel-major view)
    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.cols)
            .map(|col| {
                (0..self.rows)
                    .map(|row| self.data[row * self.cols + col])
                    .collect()
            })
            .collect()
    }

    /// New matrix holding only the requested columns, in request order
    pub fn select_columns(&self, indices: &[usize]) -> NtdResult<Matrix> {
        for &idx in indices {
            if idx >= self.cols {
                return Err(NtdError::InvalidSignalData {
                    reason: format!("Column index {} out of bounds (0-{})", idx, self.cols),
                });
            }
        }

        let mut data = Vec::with_capacity(self.rows * indices.len());
        for row in 0..self.rows {
            for &idx in indices {
                data.push(self.data[row * self.cols + idx]);
            }
        }
        Ok(Matrix {
            rows: self.rows,
            cols: indices.len(),
            data,
        })
    }

    /// Append the columns of another matrix to the right of this one.
    /// Row counts must agree.
    pub fn append_columns(&mut self, other: &Matrix) -> NtdResult<()> {
        if self.cols == 0 && self.rows == 0 {
            *self = other.clone();
            return Ok(());
        }
        if other.rows != self.rows {
            return Err(NtdError::InvalidSignalData {
                reason: format!(
                    "Cannot append {} rows to a {}-row matrix",
                    other.rows, self.rows
                ),
            });
        }

        let new_cols = self.cols + other.cols;
        let mut data = Vec::with_capacity(self.rows * new_cols);
        for row in 0..self.rows {
            data.extend_from_slice(&self.data[row * self.cols..(row + 1) * self.cols]);
            data.extend_from_slice(&other.data[row * other.cols..(row + 1) * other.cols]);
        }
        self.cols = new_cols;
        self.data = data;
        Ok(())
    }

    /// Drop every row past `rows`. No-op if already at or below that count.
    pub fn truncate_rows(&mut self, rows: usize) {
        if rows < self.rows {
            self.data.truncate(rows * self.cols);
            self.rows = rows;
        }
    }
}
