//! Операции над матрицами

use std::ops::Range;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use tracing::{debug, warn};

use super::types::{Matrix, MatrixType};

/// Наименьшее значение случайных операндов
pub const RANDOM_MIN: i32 = -5;
/// Наибольшее значение случайных операндов
pub const RANDOM_MAX: i32 = 4;

/// Заполняет новую матрицу `rows x columns` равномерно распределёнными целыми из `[RANDOM_MIN, RANDOM_MAX]`
pub fn random_matrix<R: Rng + ?Sized>(rows: usize, columns: usize, rng: &mut R) -> Matrix {
    let between = Uniform::new_inclusive(RANDOM_MIN, RANDOM_MAX);
    let mut m = Matrix::zeros(rows, columns);
    for value in m.as_mut_slice() {
        *value = between.sample(rng);
    }
    m
}

/// Инициализирует матрицы заданного типа и размера
pub fn initialize_matrices<R: Rng + ?Sized>(
    matrix_type: MatrixType,
    size: usize,
    rng: &mut R,
) -> (Matrix, Matrix) {
    match matrix_type {
        MatrixType::OnesAndTwos => (Matrix::filled(size, size, 1), Matrix::filled(size, size, 2)),
        MatrixType::ThreesAndFours => (Matrix::filled(size, size, 3), Matrix::filled(size, size, 4)),
        MatrixType::Random => {
            let a = random_matrix(size, size, rng);
            let b = random_matrix(size, size, rng);
            (a, b)
        }
    }
}

/// Итог сравнения собранного результата с эталоном
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub compared: usize,
    pub mismatches: usize,
    /// Строка, столбец, полученное, ожидаемое
    pub first_mismatch: Option<(usize, usize, i32, i32)>,
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        self.mismatches == 0
    }
}

/// Сравнивает `actual` с `expected` только в заданных диапазонах строк.
///
/// Строки вне `rows` не проверяются, так пропускаются нераспределённые строки остатка.
pub fn compare_results(actual: &Matrix, expected: &Matrix, rows: &[Range<usize>]) -> Comparison {
    let mut comparison = Comparison {
        compared: 0,
        mismatches: 0,
        first_mismatch: None,
    };

    if actual.rows() != expected.rows() || actual.columns() != expected.columns() {
        warn!(
            actual = ?(actual.rows(), actual.columns()),
            expected = ?(expected.rows(), expected.columns()),
            "result shape differs from reference"
        );
        comparison.mismatches = actual.rows() * actual.columns();
        return comparison;
    }

    let columns = actual.columns();
    for range in rows {
        for i in range.clone().filter(|&i| i < actual.rows()) {
            for j in 0..columns {
                let idx = i * columns + j;
                let (got, want) = (actual.as_slice()[idx], expected.as_slice()[idx]);
                comparison.compared += 1;
                if got != want {
                    comparison.mismatches += 1;
                    comparison.first_mismatch.get_or_insert((i, j, got, want));
                }
            }
        }
    }

    if comparison.is_match() {
        debug!(compared = comparison.compared, "result matches reference");
    } else {
        warn!(
            mismatches = comparison.mismatches,
            first = ?comparison.first_mismatch,
            "result differs from reference"
        );
    }
    comparison
}
