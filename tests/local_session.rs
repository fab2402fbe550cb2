//! Сквозные прогоны бенчмарка на группах рангов внутри процесса

use distributed_matmul::config::{BenchConfig, ProtocolMode, Schedule};
use distributed_matmul::coordinator::{Coordinator, RoundTrip};
use distributed_matmul::matrix::reference_multiply;
use distributed_matmul::session::run_local;
use distributed_matmul::worker::Worker;
use distributed_matmul::{BenchError, Delivery, LocalGroup, MatrixType, RemainderPolicy, Transport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

/// Прогоняет размеры на `workers` рабочих потоках и возвращает циклы координатора
fn round_trips(sizes: &[usize], workers: usize, remainder: RemainderPolicy, seed: u64) -> Vec<RoundTrip> {
    let schedule = Schedule {
        sizes: sizes.to_vec(),
        worker_count: workers,
        remainder,
    };
    let mut per_rank = LocalGroup::run(workers + 1, Delivery::Buffered, |endpoint| {
        if endpoint.is_coordinator() {
            let coordinator = Coordinator::new(&endpoint, schedule.clone(), MatrixType::Random).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            sizes
                .iter()
                .map(|&size| coordinator.round_trip(size, &mut rng).unwrap())
                .collect()
        } else {
            Worker::new(&endpoint, schedule.clone()).unwrap().run().unwrap();
            Vec::new()
        }
    })
    .unwrap();
    per_rank.swap_remove(0)
}

#[test]
fn test_size_64_with_four_workers_matches_reference() {
    let trips = round_trips(&[64], 4, RemainderPolicy::Uncovered, 2024);
    let trip = &trips[0];

    assert_eq!(trip.plan.rows_per_worker(), 16);
    assert_eq!(trip.plan.range(1), 0..16);
    assert_eq!(trip.plan.range(4), 48..64);
    assert_eq!((trip.c.rows(), trip.c.columns()), (64, 64));
    assert_eq!(trip.c, reference_multiply(&trip.a, &trip.b).unwrap());
    assert_eq!(trip.result.worker_count, 4);
    assert_eq!(trip.result.matrix_size, 64);
    assert!(trip.result.elapsed_ms >= 0.0);
}

#[test]
fn test_evenly_divisible_configurations_are_exact() {
    for workers in [1, 2, 3, 8] {
        let sizes: Vec<usize> = [1, 2, 5].iter().map(|m| m * workers * 4).collect();
        for trip in round_trips(&sizes, workers, RemainderPolicy::Uncovered, workers as u64) {
            assert_eq!(trip.c, reference_multiply(&trip.a, &trip.b).unwrap());
        }
    }
}

#[test]
fn test_uncovered_remainder_row_stays_zero() {
    let trip = round_trips(&[65], 4, RemainderPolicy::Uncovered, 5).remove(0);
    let reference = reference_multiply(&trip.a, &trip.b).unwrap();

    assert_eq!(trip.plan.uncovered(), 64..65);
    assert_eq!(trip.c.rows_slice(0..64).unwrap(), reference.rows_slice(0..64).unwrap());
    assert!(trip.c.rows_slice(64..65).unwrap().iter().all(|&v| v == 0));
}

#[test]
fn test_spread_remainder_computes_every_row() {
    let trip = round_trips(&[65, 7], 4, RemainderPolicy::Spread, 5).remove(0);
    assert!(trip.plan.uncovered().is_empty());
    assert_eq!(trip.c, reference_multiply(&trip.a, &trip.b).unwrap());
}

#[test]
fn test_sizes_smaller_than_worker_count() {
    let trips = round_trips(&[3], 4, RemainderPolicy::Spread, 9);
    assert_eq!(trips[0].c, reference_multiply(&trips[0].a, &trips[0].b).unwrap());

    let trips = round_trips(&[3], 4, RemainderPolicy::Uncovered, 9);
    assert!(trips[0].c.as_slice().iter().all(|&v| v == 0));
}

#[test]
fn test_same_seed_same_operands() {
    let first = round_trips(&[16], 2, RemainderPolicy::Uncovered, 77).remove(0);
    let second = round_trips(&[16], 4, RemainderPolicy::Uncovered, 77).remove(0);
    assert_eq!(first.a, second.a);
    assert_eq!(first.b, second.b);
    assert_eq!(first.c, second.c);
}

fn small_config() -> BenchConfig {
    BenchConfig {
        sizes: vec![8, 16, 32],
        seed: Some(42),
        verify: true,
        ..BenchConfig::default()
    }
}

#[test]
fn test_run_local_reports_every_size_in_order() {
    let (out, results) = run_local(&small_config(), 4, Delivery::Buffered, Vec::new()).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    for (line, size) in lines.iter().zip([8, 16, 32]) {
        let prefix = format!("NumWorkerProcesses=4 MatrixSize={size} RunTime=");
        assert!(line.starts_with(&prefix), "unexpected line {line:?}");
        assert!(line.ends_with("ms"));
        let millis: f64 = line[prefix.len()..line.len() - 2].parse().unwrap();
        assert!(millis >= 0.0);
    }
    assert_eq!(results.iter().map(|r| r.matrix_size).collect::<Vec<_>>(), vec![8, 16, 32]);
    assert!(results.iter().all(|r| r.elapsed_ms >= 0.0));
}

#[test]
fn test_handshake_and_rendezvous() {
    let config = BenchConfig {
        protocol: ProtocolMode::Handshake,
        remainder: RemainderPolicy::Spread,
        sizes: vec![10, 13],
        ..small_config()
    };
    let (_, results) = run_local(&config, 3, Delivery::Rendezvous, Vec::new()).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.worker_count == 3));
}

#[test]
fn test_verify_accepts_uncovered_rows() {
    let config = BenchConfig {
        sizes: vec![65],
        ..small_config()
    };
    let (_, results) = run_local(&config, 4, Delivery::Buffered, Vec::new()).unwrap();
    assert_eq!(results[0].matrix_size, 65);
}

#[test]
fn test_preview_and_summary_output() {
    let config = BenchConfig {
        sizes: vec![4],
        operands: MatrixType::OnesAndTwos,
        preview: true,
        summary: true,
        ..small_config()
    };
    let (out, _) = run_local(&config, 2, Delivery::Buffered, Vec::new()).unwrap();
    let text = String::from_utf8(out).unwrap();
    // Единицы на двойки при внутренней размерности 4
    assert!(text.contains("[[8, 8, 8, 8]"));
    assert!(text.contains("NumWorkerProcesses=2 MatrixSize=4 RunTime="));
    assert!(text.contains("4x4"));
}

#[test]
fn test_run_local_without_workers_fails() {
    assert!(run_local(&small_config(), 0, Delivery::Buffered, Vec::new()).is_err());
}

/// Вывод, на котором падает любая запись, как stdout в закрытый канал
struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::ErrorKind::BrokenPipe.into())
    }
}

#[test]
fn test_failed_report_write_releases_workers() {
    for delivery in [Delivery::Buffered, Delivery::Rendezvous] {
        let config = BenchConfig {
            sizes: vec![8, 16, 32],
            seed: Some(1),
            ..BenchConfig::default()
        };
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            let outcome = run_local(&config, 2, delivery, ClosedPipe).map(|(_, results)| results.len());
            let _ = tx.send(outcome);
        });

        let outcome = rx
            .recv_timeout(Duration::from_secs(30))
            .expect("run_local must return after the coordinator fails");
        assert!(matches!(outcome, Err(BenchError::Io(_))), "unexpected outcome {outcome:?}");
    }
}
