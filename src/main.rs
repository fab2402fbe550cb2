//! Бенчмарк распределённого умножения матриц
//!
//! Без фичи `mpi` группа процессов моделируется потоками, по одному на ранг.
//! С ней запускать через `mpirun -n <workers + 1>`.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use distributed_matmul::{BenchConfig, Delivery, MatrixType, ProtocolMode, RemainderPolicy};

#[derive(Parser, Debug)]
#[command(name = "matrix_benchmark", about = "Row-partitioned distributed integer matrix multiplication benchmark")]
struct Cli {
    /// Файл конфигурации JSON; флаги ниже его переопределяют
    #[arg(long)]
    config: Option<PathBuf>,

    /// Число рабочих потоков в локальном прогоне (под MPI решает размер мира)
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Размеры матриц по порядку
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<usize>>,

    /// Зерно генератора операндов
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    remainder: Option<RemainderPolicy>,

    #[arg(long, value_enum)]
    protocol: Option<ProtocolMode>,

    #[arg(long, value_enum)]
    operands: Option<MatrixType>,

    /// Сверять каждое произведение с последовательным эталоном
    #[arg(long)]
    verify: bool,

    /// Печатать левый верхний угол каждого произведения
    #[arg(long)]
    preview: bool,

    /// Печатать сводную таблицу в конце
    #[arg(long)]
    summary: bool,

    /// Записать результаты в JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Показывать прогресс в stderr
    #[arg(long)]
    progress: bool,

    /// Каналы нулевой ёмкости в локальном прогоне: каждая отправка ждёт приёма
    #[arg(long)]
    rendezvous: bool,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Result<(BenchConfig, usize, Delivery)> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::from_json_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => BenchConfig::default(),
        };

        if let Some(sizes) = self.sizes {
            config.sizes = sizes;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(remainder) = self.remainder {
            config.remainder = remainder;
        }
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(operands) = self.operands {
            config.operands = operands;
        }
        if self.json.is_some() {
            config.json_output = self.json;
        }
        config.verify |= self.verify;
        config.preview |= self.preview;
        config.summary |= self.summary;
        config.progress |= self.progress;

        let delivery = if self.rendezvous {
            Delivery::Rendezvous
        } else {
            Delivery::Buffered
        };
        Ok((config, self.workers, delivery))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    distributed_matmul::utils::init_logging(&cli.log_level)?;
    let (config, workers, delivery) = cli.into_config()?;
    run(&config, workers, delivery)
}

#[cfg(not(feature = "mpi"))]
fn run(config: &BenchConfig, workers: usize, delivery: Delivery) -> Result<()> {
    use distributed_matmul::session::run_local;

    let (_out, results) =
        run_local(config, workers, delivery, io::stdout().lock()).context("Local benchmark run failed")?;
    tracing::debug!(sizes = results.len(), "local run complete");
    Ok(())
}

#[cfg(feature = "mpi")]
fn run(config: &BenchConfig, _workers: usize, _delivery: Delivery) -> Result<()> {
    use distributed_matmul::session::run_coordinator;
    use distributed_matmul::transport::MpiTransport;
    use distributed_matmul::worker::run_worker_loop;
    use distributed_matmul::Transport;

    let transport = MpiTransport::initialize().context("Failed to initialize MPI")?;
    if transport.is_coordinator() {
        let (_out, results) =
            run_coordinator(&transport, config, io::stdout().lock()).context("Coordinator failed")?;
        tracing::debug!(sizes = results.len(), "coordinator finished");
    } else {
        run_worker_loop(&transport, config)
            .with_context(|| format!("Worker {} failed", transport.rank()))?;
    }
    Ok(())
}
