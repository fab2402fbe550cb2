//! Блокирующий обмен сообщениями точка-точка между рангами.
//!
//! Ранг 0 это координатор, остальные ранги рабочие. Сообщения это векторы
//! `i32`, сопоставляемые по `(source, tag)`; приём блокируется до прихода
//! подходящего сообщения, без таймаута.

pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi;

pub use local::{Delivery, LocalEndpoint, LocalGroup, Shutdown};
#[cfg(feature = "mpi")]
pub use self::mpi::MpiTransport;

use crate::errors::TransportError;

/// Ранг координатора в любой группе процессов
pub const COORDINATOR_RANK: usize = 0;

/// Виды сообщений между рангами
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// От координатора рабочему: блок строк или весь второй операнд
    Dispatch,
    /// От рабочего координатору: вычисленный блок строк
    Result,
    /// От координатора рабочему: расписание прогона
    Handshake,
    /// Сообщения демо обнаружения соседей
    Flood,
}

impl Tag {
    /// Числовой тег для передачи
    pub fn code(self) -> i32 {
        match self {
            Tag::Dispatch => 1,
            Tag::Result => 2,
            Tag::Handshake => 3,
            Tag::Flood => 4,
        }
    }
}

/// Конечная точка группы процессов
pub trait Transport {
    /// Ранг этой точки, с нуля
    fn rank(&self) -> usize;

    /// Число процессов в группе вместе с координатором
    fn size(&self) -> usize;

    /// Отправляет `data` рангу `dest`. Возвращается, когда транспорт принял сообщение.
    fn send(&self, dest: usize, tag: Tag, data: &[i32]) -> Result<(), TransportError>;

    /// Ждёт сообщение с тегом `tag` от `source`
    fn receive(&self, source: usize, tag: Tag) -> Result<Vec<i32>, TransportError>;

    /// Число рабочих в группе, то есть всех, кроме координатора
    fn worker_count(&self) -> usize {
        self.size().saturating_sub(1)
    }

    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR_RANK
    }
}
