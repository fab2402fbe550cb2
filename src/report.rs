//! Результаты прогонов по размерам и их вывод

use std::fs;
use std::io::Write;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use prettytable::{row, Table};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Замер одного размера матрицы; создаётся один раз и не меняется
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub worker_count: usize,
    pub matrix_size: usize,
    pub elapsed_ms: f64,
}

impl RunResult {
    /// Строка, которую ждут разборщики логов, например
    /// `NumWorkerProcesses=4 MatrixSize=64 RunTime=1.23457ms`
    pub fn report_line(&self) -> String {
        format!(
            "NumWorkerProcesses={} MatrixSize={} RunTime={}ms",
            self.worker_count,
            self.matrix_size,
            format_millis(self.elapsed_ms)
        )
    }
}

/// Форматирует как `%g`: шесть значащих цифр без хвостовых нулей, экспонента
/// при порядке после округления меньше -4 или больше 5.
pub fn format_millis(ms: f64) -> String {
    if ms == 0.0 || !ms.is_finite() {
        return format!("{ms}");
    }
    // Порядок берётся после округления до шести цифр: 999999.7 -> 1.00000e6
    let rounded = format!("{ms:.5e}");
    let Some((mantissa, exponent)) = rounded.split_once('e') else {
        return rounded;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return rounded;
    };

    if (-4..6).contains(&exponent) {
        let decimals = (5 - exponent) as usize;
        trim_fraction(&format!("{ms:.decimals$}")).to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Пишет строки отчёта по мере завершения размеров и хранит результаты
pub struct Reporter<W: Write> {
    out: W,
    results: Vec<RunResult>,
    progress: ProgressBar,
}

impl<W: Write> Reporter<W> {
    /// `total` это число размеров; полоса рисуется в stderr только при `show_progress`
    pub fn new(out: W, total: usize, show_progress: bool) -> Self {
        let progress = if show_progress {
            let pb = ProgressBar::new(total as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} sizes {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb
        } else {
            ProgressBar::hidden()
        };
        Self {
            out,
            results: Vec::with_capacity(total),
            progress,
        }
    }

    /// Отмечает `size` как текущий на полосе прогресса
    pub fn start(&self, size: usize) {
        self.progress.set_message(format!("{size}x{size}"));
    }

    pub fn record(&mut self, result: RunResult) -> Result<()> {
        let line = result.report_line();
        let out = &mut self.out;
        self.progress.suspend(|| {
            writeln!(out, "{line}")?;
            out.flush()
        })?;
        self.progress.inc(1);
        self.results.push(result);
        Ok(())
    }

    /// Пишет произвольный текст (например, угол матрицы) между строками отчёта
    pub fn note(&mut self, text: &str) -> Result<()> {
        let out = &mut self.out;
        self.progress.suspend(|| writeln!(out, "{text}"))?;
        Ok(())
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn print_summary(&mut self) -> Result<()> {
        summary_table(&self.results).print(&mut self.out)?;
        Ok(())
    }

    /// Убирает полосу прогресса и возвращает writer и результаты
    pub fn finish(self) -> (W, Vec<RunResult>) {
        self.progress.finish_and_clear();
        (self.out, self.results)
    }
}

pub fn summary_table(results: &[RunResult]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Workers", "Matrix size", "Run time (ms)", "MOps/s"]);
    for r in results {
        let ops = 2.0 * (r.matrix_size as f64).powi(3);
        let rate = if r.elapsed_ms > 0.0 {
            format!("{:.1}", ops / (r.elapsed_ms * 1e3))
        } else {
            "-".to_string()
        };
        table.add_row(row![
            r.worker_count,
            format!("{0}x{0}", r.matrix_size),
            format!("{:.3}", r.elapsed_ms),
            rate
        ]);
    }
    table
}

pub fn write_json(results: &[RunResult], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json)?;
    Ok(())
}
