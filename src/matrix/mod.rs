//! Модуль для работы с матрицами
//!
//! Предоставляет:
//! - буфер целочисленной матрицы с хранением по строкам
//! - ядро умножения с переполнением
//! - генерацию операндов и сравнение результатов

mod types;
pub mod operations;
pub mod kernels;

pub use types::{Matrix, MatrixType};
pub use operations::{compare_results, initialize_matrices, random_matrix, Comparison};
pub use kernels::{multiply, multiply_into, reference_multiply};
