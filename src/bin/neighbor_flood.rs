//! Демо обнаружения соседей: ранги передают свои номера в сторону ранга 0,
//! который печатает список всех услышанных рангов.
//!
//! Без фичи `mpi` ранги это потоки процесса. С ней запускать через
//! `mpirun -n <ranks>`.

use anyhow::Result;
use clap::Parser;
use distributed_matmul::flood::Topology;

#[derive(Parser, Debug)]
#[command(name = "neighbor_flood")]
struct Cli {
    /// Число рангов в локальном прогоне (под MPI решает размер мира)
    #[arg(long, default_value_t = 8)]
    ranks: usize,

    #[arg(long, value_enum, default_value_t = Topology::Grid)]
    topology: Topology,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn print_known(known: &[i32]) {
    let line: Vec<String> = known.iter().map(|r| r.to_string()).collect();
    println!("{}", line.join(" "));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    distributed_matmul::utils::init_logging(&cli.log_level)?;
    run(&cli)
}

#[cfg(not(feature = "mpi"))]
fn run(cli: &Cli) -> Result<()> {
    use anyhow::Context;
    use distributed_matmul::flood::discover;
    use distributed_matmul::{Delivery, LocalGroup, Transport};

    anyhow::ensure!(cli.ranks > 0, "need at least one rank");

    let lists = LocalGroup::run(cli.ranks, Delivery::Buffered, |endpoint| {
        discover(&endpoint, cli.topology).map(|known| (endpoint.rank(), known))
    })
    .context("Flood run failed")?;

    for outcome in lists {
        let (rank, known) = outcome?;
        if rank == 0 {
            print_known(&known);
        }
    }
    Ok(())
}

#[cfg(feature = "mpi")]
fn run(cli: &Cli) -> Result<()> {
    use anyhow::Context;
    use distributed_matmul::flood::discover;
    use distributed_matmul::transport::MpiTransport;
    use distributed_matmul::Transport;

    let transport = MpiTransport::initialize().context("Failed to initialize MPI")?;
    if cli.ranks != transport.size() {
        tracing::debug!(requested = cli.ranks, world = transport.size(), "--ranks ignored under MPI");
    }
    let known = discover(&transport, cli.topology)
        .with_context(|| format!("Flood failed on rank {}", transport.rank()))?;
    if transport.is_coordinator() {
        print_known(&known);
    }
    Ok(())
}
