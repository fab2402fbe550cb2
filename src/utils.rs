//! Вспомогательные функции и утилиты

use std::time::{Duration, Instant};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Измеряет время выполнения функции
pub fn measure_time<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();
    (result, duration)
}

/// Длительность в дробных миллисекундах с точностью до наносекунд
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_nanos() as f64 * 1e-6
}

/// Настраивает логирование в stderr; `RUST_LOG` переопределяет `level`.
///
/// Stdout остаётся для строк отчёта.
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_names(true),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
