//! Выбор роли и запуск группы процессов.
//!
//! Ранг 0 выполняет координатора, остальные ранги цикл рабочего. Локальный
//! сеанс запускает всю группу потоками текущего процесса.

use std::io::Write;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info};

use crate::config::BenchConfig;
use crate::coordinator::run_benchmark;
use crate::errors::{BenchError, ProtocolError, Result};
use crate::report::{write_json, Reporter, RunResult};
use crate::transport::{Delivery, LocalGroup, Transport};
use crate::worker::{run_worker_loop, WorkerSummary};

/// Роль координатора: выполняет бенчмарк и пишет строки отчёта в `out`
pub fn run_coordinator<T, W>(transport: &T, config: &BenchConfig, out: W) -> Result<(W, Vec<RunResult>)>
where
    T: Transport + ?Sized,
    W: Write,
{
    if transport.worker_count() == 0 {
        return Err(ProtocolError::NoWorkers {
            world_size: transport.size(),
        }
        .into());
    }

    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(
        seed,
        workers = transport.worker_count(),
        sizes = ?config.sizes,
        remainder = ?config.remainder,
        protocol = ?config.protocol,
        "starting benchmark"
    );
    let mut rng = StdRng::seed_from_u64(seed);

    let mut reporter = Reporter::new(out, config.sizes.len(), config.progress);
    run_benchmark(transport, config, &mut rng, &mut reporter)?;
    if config.summary {
        reporter.print_summary()?;
    }
    let (out, results) = reporter.finish();

    if let Some(path) = &config.json_output {
        write_json(&results, path)?;
        info!(path = %path.display(), "results written");
    }
    Ok((out, results))
}

/// Вся группа в одном процессе: `workers` рабочих потоков и координатор в
/// вызывающем потоке.
pub fn run_local<W: Write>(
    config: &BenchConfig,
    workers: usize,
    delivery: Delivery,
    out: W,
) -> Result<(W, Vec<RunResult>)> {
    if workers == 0 {
        return Err(ProtocolError::NoWorkers { world_size: 1 }.into());
    }

    let (mut endpoints, shutdown) = LocalGroup::with_shutdown(workers + 1, delivery);
    let coordinator = endpoints.remove(0);

    thread::scope(|scope| -> Result<(W, Vec<RunResult>)> {
        let handles = endpoints
            .into_iter()
            .map(|endpoint| {
                let rank = endpoint.rank();
                thread::Builder::new()
                    .name(format!("worker-{rank}"))
                    .spawn_scoped(scope, move || run_worker_loop(&endpoint, config))
                    .map(|handle| (rank, handle))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Рабочих, ждущих следующий размер, надо освободить до join
        let outcome = run_coordinator(&coordinator, config, out);
        if let Err(e) = &outcome {
            error!(error = %e, "coordinator failed, releasing workers");
            shutdown.trigger();
        }

        for (rank, handle) in handles {
            let finished: Result<WorkerSummary> = handle.join().map_err(|_| BenchError::RankPanicked(rank))?;
            match finished {
                Ok(summary) => info!(rank, rows = summary.rows_computed, "worker finished"),
                Err(e) if outcome.is_err() => debug!(rank, error = %e, "worker released"),
                Err(e) => return Err(e),
            }
        }
        outcome
    })
}
