//! Ядра умножения для целочисленных блоков, хранящихся по строкам
//!
//! Вся арифметика 32-битная с переполнением по модулю 2^32. Сложение с
//! переполнением ассоциативно, поэтому любой порядок циклов ниже даёт
//! побитово одинаковый результат.

use super::types::Matrix;
use crate::errors::MatrixError;

/// Произведение блока `rows x inner` на блок `inner x columns`
pub fn multiply(left: &Matrix, right: &Matrix) -> Result<Matrix, MatrixError> {
    check_operands(left, right)?;
    let mut product = Matrix::zeros(left.rows(), right.columns());
    multiply_into(
        left.as_slice(),
        right.as_slice(),
        product.as_mut_slice(),
        left.rows(),
        left.columns(),
        right.columns(),
    );
    Ok(product)
}

/// Низкоуровневое ядро в порядке i-k-j: внутренний цикл идёт по `right` и `out` с шагом 1.
///
/// `out` перезаписывается, а не накапливается.
pub fn multiply_into(
    left: &[i32],
    right: &[i32],
    out: &mut [i32],
    rows: usize,
    inner: usize,
    columns: usize,
) {
    debug_assert_eq!(left.len(), rows * inner);
    debug_assert_eq!(right.len(), inner * columns);
    debug_assert_eq!(out.len(), rows * columns);

    out.fill(0);
    for i in 0..rows {
        let out_row = &mut out[i * columns..(i + 1) * columns];
        for k in 0..inner {
            let a = left[i * inner + k];
            let right_row = &right[k * columns..(k + 1) * columns];
            for (c, &b) in out_row.iter_mut().zip(right_row) {
                *c = c.wrapping_add(a.wrapping_mul(b));
            }
        }
    }
}

/// Последовательное умножение i-j-k, эталон для проверки
pub fn reference_multiply(left: &Matrix, right: &Matrix) -> Result<Matrix, MatrixError> {
    check_operands(left, right)?;
    let (rows, inner, columns) = (left.rows(), left.columns(), right.columns());
    let (a, b) = (left.as_slice(), right.as_slice());
    let mut c = vec![0i32; rows * columns];
    for i in 0..rows {
        for j in 0..columns {
            let mut sum = 0i32;
            for k in 0..inner {
                sum = sum.wrapping_add(a[i * inner + k].wrapping_mul(b[k * columns + j]));
            }
            c[i * columns + j] = sum;
        }
    }
    Matrix::from_vec(rows, columns, c)
}

fn check_operands(left: &Matrix, right: &Matrix) -> Result<(), MatrixError> {
    if left.columns() != right.rows() {
        return Err(MatrixError::IncompatibleOperands {
            left_rows: left.rows(),
            left_columns: left.columns(),
            right_rows: right.rows(),
            right_columns: right.columns(),
        });
    }
    Ok(())
}
