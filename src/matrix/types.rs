//! Типы матриц и связанные структуры

use std::ops::Range;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::errors::MatrixError;

/// Тип матриц для вычислений
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatrixType {
    /// Матрицы заполненные 1 и 2
    OnesAndTwos,
    /// Матрицы заполненные 3 и 4
    ThreesAndFours,
    /// Случайные целые из `[-5, 4]`
    #[default]
    Random,
}

/// Плотная матрица 32-битных целых со знаком, хранение по строкам.
///
/// Элемент `(i, j)` лежит в `data[i * columns + j]`. Буфер всегда содержит
/// ровно `rows * columns` элементов.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    columns: usize,
    data: Vec<i32>,
}

impl Matrix {
    /// Нулевая матрица `rows x columns`
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            data: vec![0; rows * columns],
        }
    }

    /// Матрица, все элементы которой равны `value`
    pub fn filled(rows: usize, columns: usize, value: i32) -> Self {
        Self {
            rows,
            columns,
            data: vec![value; rows * columns],
        }
    }

    /// Оборачивает готовый буфер, хранящийся по строкам
    pub fn from_vec(rows: usize, columns: usize, data: Vec<i32>) -> Result<Self, MatrixError> {
        if data.len() != rows * columns {
            return Err(MatrixError::ShapeMismatch {
                rows,
                columns,
                actual: data.len(),
            });
        }
        Ok(Self { rows, columns, data })
    }

    /// Собирает матрицу из вложенных строк; длины всех строк должны совпадать
    pub fn from_rows<R: AsRef<[i32]>>(rows: &[R]) -> Result<Self, MatrixError> {
        let columns = rows.first().map_or(0, |r| r.as_ref().len());
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.as_ref().len() != columns) {
            return Err(MatrixError::RaggedRow {
                row,
                expected: columns,
                actual: r.as_ref().len(),
            });
        }
        let data: Vec<i32> = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        Self::from_vec(rows.len(), columns, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.data
    }

    pub fn get(&self, row: usize, column: usize) -> Option<i32> {
        if row < self.rows && column < self.columns {
            Some(self.data[row * self.columns + column])
        } else {
            None
        }
    }

    /// Непрерывный срез элементов строк `range`
    pub fn rows_slice(&self, range: Range<usize>) -> Result<&[i32], MatrixError> {
        let span = self.row_span(&range)?;
        Ok(&self.data[span])
    }

    /// Изменяемый вариант [`Matrix::rows_slice`]
    pub fn rows_slice_mut(&mut self, range: Range<usize>) -> Result<&mut [i32], MatrixError> {
        let span = self.row_span(&range)?;
        Ok(&mut self.data[span])
    }

    fn row_span(&self, range: &Range<usize>) -> Result<Range<usize>, MatrixError> {
        if range.start > range.end || range.end > self.rows {
            return Err(MatrixError::RowRangeOutOfBounds {
                start: range.start,
                end: range.end,
                rows: self.rows,
            });
        }
        Ok(range.start * self.columns..range.end * self.columns)
    }

    /// Двумерное представление буфера для вывода
    pub fn view(&self) -> Result<ArrayView2<'_, i32>, MatrixError> {
        ArrayView2::from_shape((self.rows, self.columns), &self.data).map_err(|_| {
            MatrixError::ShapeMismatch {
                rows: self.rows,
                columns: self.columns,
                actual: self.data.len(),
            }
        })
    }
}
