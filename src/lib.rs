//! Бенчмарк распределённого целочисленного умножения матриц по строкам
//!
//! Ранг 0 генерирует квадратные операнды, рассылает рабочим блоки строк `A`
//! вместе со всей матрицей `B`, собирает частичные произведения и выводит
//! время полного цикла для каждого размера матрицы.

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod flood;
pub mod matrix;
pub mod partition;
pub mod protocol;
pub mod report;
pub mod session;
pub mod transport;
pub mod utils;
pub mod worker;

// Реэкспорт основных типов для удобства
pub use config::{BenchConfig, ProtocolMode, Schedule, MATRIX_SIZES};
pub use errors::{BenchError, MatrixError, ProtocolError, TransportError};
pub use matrix::{Matrix, MatrixType};
pub use partition::{PartitionPlan, RemainderPolicy};
pub use report::RunResult;
pub use transport::{Delivery, LocalGroup, Tag, Transport};
