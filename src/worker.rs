//! Сторона рабочего.
//!
//! Рабочий проходит ту же последовательность размеров, что и координатор. Для
//! каждого размера он принимает свой блок строк `A` и всю `B`, перемножает их
//! и отправляет частичное произведение рангу 0.

use tracing::debug;

use crate::config::{BenchConfig, ProtocolMode, Schedule};
use crate::errors::{ProtocolError, Result};
use crate::matrix::{multiply, Matrix};
use crate::partition::PartitionPlan;
use crate::protocol::{await_schedule, receive_exact};
use crate::transport::{Tag, Transport, COORDINATOR_RANK};

/// Итог работы рабочего за весь прогон
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub rank: usize,
    pub sizes_processed: usize,
    pub rows_computed: usize,
}

pub struct Worker<'t, T: Transport + ?Sized> {
    transport: &'t T,
    schedule: Schedule,
}

impl<'t, T: Transport + ?Sized> Worker<'t, T> {
    pub fn new(transport: &'t T, schedule: Schedule) -> Result<Self> {
        if schedule.worker_count == 0 {
            return Err(ProtocolError::NoWorkers {
                world_size: transport.size(),
            }
            .into());
        }
        Ok(Self { transport, schedule })
    }

    /// Приём, умножение, ответ для одного размера. Возвращает число вычисленных строк.
    pub fn process_size(&self, size: usize) -> Result<usize> {
        let plan = PartitionPlan::new(size, self.schedule.worker_count, self.schedule.remainder)?;
        let rows = plan.range(self.transport.rank()).len();

        let block = receive_exact(self.transport, COORDINATOR_RANK, Tag::Dispatch, rows * size)?;
        let operand = receive_exact(self.transport, COORDINATOR_RANK, Tag::Dispatch, size * size)?;

        let block = Matrix::from_vec(rows, size, block)?;
        let operand = Matrix::from_vec(size, size, operand)?;
        let product = multiply(&block, &operand)?;

        self.transport
            .send(COORDINATOR_RANK, Tag::Result, product.as_slice())?;
        debug!(rank = self.transport.rank(), size, rows, "block returned");
        Ok(rows)
    }

    pub fn run(&self) -> Result<WorkerSummary> {
        let mut summary = WorkerSummary {
            rank: self.transport.rank(),
            ..WorkerSummary::default()
        };
        for &size in &self.schedule.sizes {
            summary.rows_computed += self.process_size(size)?;
            summary.sizes_processed += 1;
        }
        Ok(summary)
    }
}

/// Точка входа рабочего: берёт расписание (локально или по рукопожатию) и выполняет его
pub fn run_worker_loop<T: Transport + ?Sized>(transport: &T, config: &BenchConfig) -> Result<WorkerSummary> {
    let schedule = match config.protocol {
        ProtocolMode::Implicit => config.schedule(transport.worker_count()),
        ProtocolMode::Handshake => await_schedule(transport)?,
    };
    Worker::new(transport, schedule)?.run()
}
