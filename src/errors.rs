use thiserror::Error;

use crate::transport::Tag;

/// Ошибки построения и умножения матриц
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// Длина буфера не равна `rows * columns`
    #[error("buffer of {actual} elements cannot hold a {rows}x{columns} matrix")]
    ShapeMismatch {
        rows: usize,
        columns: usize,
        actual: usize,
    },

    /// Строки разной длины
    #[error("row {row} has {actual} elements, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Внутренние размерности сомножителей не совпадают
    #[error("cannot multiply {left_rows}x{left_columns} by {right_rows}x{right_columns}")]
    IncompatibleOperands {
        left_rows: usize,
        left_columns: usize,
        right_rows: usize,
        right_columns: usize,
    },

    /// Диапазон строк выходит за последнюю строку
    #[error("row range {start}..{end} is outside a matrix with {rows} rows")]
    RowRangeOutOfBounds { start: usize, end: usize, rows: usize },
}

/// Ошибки транспорта сообщений
#[derive(Error, Debug)]
pub enum TransportError {
    /// Ранг не входит в группу процессов
    #[error("rank {rank} is outside a group of {size} processes")]
    PeerOutOfRange { rank: usize, size: usize },

    /// Собеседник отключился до завершения обмена
    #[error("peer {peer} disconnected")]
    Disconnected { peer: usize },

    /// Не удалось запустить среду группы процессов
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),
}

/// Расхождения координатора и рабочего в протоколе обмена
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Число целых в сообщении отличается от ожидаемого по плану
    #[error("{tag:?} message from rank {source_rank} had {actual} integers, expected {expected}")]
    UnexpectedLength {
        tag: Tag,
        source_rank: usize,
        expected: usize,
        actual: usize,
    },

    /// Не удалось разобрать сообщение рукопожатия
    #[error("malformed handshake: {0}")]
    MalformedHandshake(String),

    /// Координатор объявил число рабочих, не совпадающее с локальной группой
    #[error("coordinator announced {announced} workers but the group has {local}")]
    WorkerCountMismatch { announced: usize, local: usize },

    /// В группе только координатор
    #[error("need at least one worker, process group has {world_size} process(es)")]
    NoWorkers { world_size: usize },
}

/// Ошибка верхнего уровня для сеанса бенчмарка
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Собранное произведение расходится с последовательным эталоном
    #[error("{mismatches} element(s) of the {size}x{size} product differ from the reference")]
    VerificationFailed { size: usize, mismatches: usize },

    /// Поток ранга запаниковал в локальном сеансе
    #[error("rank {0} panicked")]
    RankPanicked(usize),
}

/// Псевдоним Result для операций бенчмарка
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MatrixError::IncompatibleOperands {
            left_rows: 2,
            left_columns: 3,
            right_rows: 4,
            right_columns: 2,
        };
        assert_eq!(err.to_string(), "cannot multiply 2x3 by 4x2");
    }

    #[test]
    fn test_protocol_error_conversion() {
        let err: BenchError = ProtocolError::NoWorkers { world_size: 1 }.into();
        assert!(err.to_string().starts_with("protocol error: need at least one worker"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: BenchError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }
}
