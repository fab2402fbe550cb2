//! Сторона координатора.
//!
//! Для каждого размера координатор генерирует оба операнда, отправляет каждому
//! рабочему его блок строк `A` и всю матрицу `B`, затем собирает частичные
//! произведения в порядке рангов. Следующий размер начинается только после
//! получения всех блоков текущего.
//!
//! Таймер запускается до выделения и заполнения операндов и останавливается
//! после приёма последнего блока. В замер входят генерация, рассылка, счёт
//! самого медленного рабочего и сбор.

use std::io::Write;

use ndarray::s;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{BenchConfig, ProtocolMode, Schedule};
use crate::errors::{BenchError, ProtocolError, Result};
use crate::matrix::{compare_results, initialize_matrices, reference_multiply, Matrix, MatrixType};
use crate::partition::PartitionPlan;
use crate::protocol::{announce_schedule, receive_exact};
use crate::report::{Reporter, RunResult};
use crate::transport::{Tag, Transport};
use crate::utils::{as_millis_f64, measure_time};

/// Всё, что получено за один цикл для одного размера
#[derive(Debug, Clone)]
pub struct RoundTrip {
    pub a: Matrix,
    pub b: Matrix,
    pub c: Matrix,
    pub plan: PartitionPlan,
    pub result: RunResult,
}

/// Ведёт рассылку и сбор с ранга 0
pub struct Coordinator<'t, T: Transport + ?Sized> {
    transport: &'t T,
    schedule: Schedule,
    operands: MatrixType,
}

impl<'t, T: Transport + ?Sized> Coordinator<'t, T> {
    /// Ошибка, если в группе нет рабочих
    pub fn new(transport: &'t T, schedule: Schedule, operands: MatrixType) -> Result<Self> {
        if schedule.worker_count == 0 {
            return Err(ProtocolError::NoWorkers {
                world_size: transport.size(),
            }
            .into());
        }
        Ok(Self {
            transport,
            schedule,
            operands,
        })
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Рассылает расписание рабочим; только в режиме рукопожатия
    pub fn announce(&self) -> Result<()> {
        announce_schedule(self.transport, &self.schedule)
    }

    /// Один размер: генерация, рассылка, сбор, замер
    pub fn round_trip<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Result<RoundTrip> {
        let plan = PartitionPlan::new(size, self.schedule.worker_count, self.schedule.remainder)?;
        debug!(
            size,
            rows_per_worker = plan.rows_per_worker(),
            uncovered = plan.uncovered().len(),
            "partition plan"
        );
        if !plan.uncovered().is_empty() {
            warn!(size, rows = ?plan.uncovered(), "rows not assigned to any worker stay zero");
        }

        let (outcome, elapsed) = measure_time(|| -> Result<(Matrix, Matrix, Matrix)> {
            let (a, b) = initialize_matrices(self.operands, size, rng);
            let mut c = Matrix::zeros(size, size);
            self.dispatch(&plan, &a, &b)?;
            self.collect(&plan, &mut c)?;
            Ok((a, b, c))
        });
        let (a, b, c) = outcome?;

        Ok(RoundTrip {
            a,
            b,
            c,
            plan,
            result: RunResult {
                worker_count: self.schedule.worker_count,
                matrix_size: size,
                elapsed_ms: as_millis_f64(elapsed),
            },
        })
    }

    fn dispatch(&self, plan: &PartitionPlan, a: &Matrix, b: &Matrix) -> Result<()> {
        for (rank, rows) in plan.ranges() {
            self.transport.send(rank, Tag::Dispatch, a.rows_slice(rows)?)?;
            self.transport.send(rank, Tag::Dispatch, b.as_slice())?;
        }
        Ok(())
    }

    fn collect(&self, plan: &PartitionPlan, c: &mut Matrix) -> Result<()> {
        let size = plan.size();
        for (rank, rows) in plan.ranges() {
            let block = receive_exact(self.transport, rank, Tag::Result, rows.len() * size)?;
            c.rows_slice_mut(rows)?.copy_from_slice(&block);
        }
        Ok(())
    }
}

/// Проходит все размеры расписания и выводит каждый по завершении
pub fn run_benchmark<T, R, W>(
    transport: &T,
    config: &BenchConfig,
    rng: &mut R,
    reporter: &mut Reporter<W>,
) -> Result<()>
where
    T: Transport + ?Sized,
    R: Rng + ?Sized,
    W: Write,
{
    let coordinator = Coordinator::new(transport, config.schedule(transport.worker_count()), config.operands)?;
    if config.protocol == ProtocolMode::Handshake {
        coordinator.announce()?;
    }

    // Ошибки проверки возвращаются после последнего размера: рабочие идут по
    // расписанию сами и не должны остаться в ожидании.
    let mut first_failure = None;
    for &size in &coordinator.schedule().sizes {
        reporter.start(size);
        let trip = coordinator.round_trip(size, rng)?;
        info!(size, elapsed_ms = trip.result.elapsed_ms, "size complete");

        if config.verify {
            if let Err(e) = verify(&trip) {
                warn!(size, error = %e, "verification failed");
                first_failure.get_or_insert(e);
            }
        }
        if config.preview {
            reporter.note(&preview(&trip.c)?)?;
        }
        reporter.record(trip.result)?;
    }
    first_failure.map_or(Ok(()), Err)
}

/// Сверяет покрытые строки произведения с последовательным эталоном
pub fn verify(trip: &RoundTrip) -> Result<()> {
    let (reference, elapsed) = measure_time(|| reference_multiply(&trip.a, &trip.b));
    let comparison = compare_results(&trip.c, &reference?, &[trip.plan.covered()]);
    debug!(
        size = trip.plan.size(),
        reference_ms = as_millis_f64(elapsed),
        "sequential reference computed"
    );
    if !comparison.is_match() {
        return Err(BenchError::VerificationFailed {
            size: trip.plan.size(),
            mismatches: comparison.mismatches,
        });
    }
    Ok(())
}

/// Левый верхний угол произведения, не больше 4x4
pub fn preview(c: &Matrix) -> Result<String> {
    let view = c.view()?;
    let corner = view.slice(s![..c.rows().min(4), ..c.columns().min(4)]);
    Ok(format!("C ({0}x{1}), top-left corner:\n{corner}", c.rows(), c.columns()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::RemainderPolicy;
    use crate::transport::{Delivery, LocalGroup};

    #[test]
    fn test_no_workers() {
        let group = LocalGroup::new(1, Delivery::Buffered);
        let schedule = BenchConfig::default().schedule(group[0].worker_count());
        assert!(matches!(
            Coordinator::new(&group[0], schedule, MatrixType::Random),
            Err(BenchError::Protocol(ProtocolError::NoWorkers { world_size: 1 }))
        ));
    }

    #[test]
    fn test_dispatch_sends_row_blocks_and_full_operand() {
        // Рабочих изображаем, читая их входящие напрямую
        let group = LocalGroup::new(3, Delivery::Buffered);
        let schedule = Schedule {
            sizes: vec![4],
            worker_count: 2,
            remainder: RemainderPolicy::Uncovered,
        };
        for (rank, value) in [(1, 10), (2, 20)] {
            group[rank].send(0, Tag::Result, &[value; 8]).unwrap();
        }

        let coordinator = Coordinator::new(&group[0], schedule, MatrixType::OnesAndTwos).unwrap();
        let mut rng = rand::thread_rng();
        let trip = coordinator.round_trip(4, &mut rng).unwrap();

        for rank in 1..=2 {
            assert_eq!(group[rank].receive(0, Tag::Dispatch).unwrap(), vec![1; 8]);
            assert_eq!(group[rank].receive(0, Tag::Dispatch).unwrap(), vec![2; 16]);
        }
        assert_eq!(trip.c.rows_slice(0..2).unwrap(), &[10; 8]);
        assert_eq!(trip.c.rows_slice(2..4).unwrap(), &[20; 8]);
        assert_eq!(trip.result.worker_count, 2);
        assert!(trip.result.elapsed_ms >= 0.0);
    }

    #[test]
    fn test_short_result_block_is_rejected() {
        let group = LocalGroup::new(2, Delivery::Buffered);
        let schedule = Schedule {
            sizes: vec![2],
            worker_count: 1,
            remainder: RemainderPolicy::Uncovered,
        };
        group[1].send(0, Tag::Result, &[1, 2, 3]).unwrap();
        let coordinator = Coordinator::new(&group[0], schedule, MatrixType::Random).unwrap();
        let err = coordinator.round_trip(2, &mut rand::thread_rng()).unwrap_err();
        assert!(matches!(
            err,
            BenchError::Protocol(ProtocolError::UnexpectedLength { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_preview_corner() {
        let c = Matrix::filled(6, 6, 3);
        let text = preview(&c).unwrap();
        assert!(text.starts_with("C (6x6)"));
        assert_eq!(text.matches('3').count(), 16);
    }
}
