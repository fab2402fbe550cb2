//! Конфигурация бенчмарка
//!
//! Значения по умолчанию повторяют классический прогон: размеры от 64 до 2048,
//! случайные операнды, без рукопожатия, строки остатка не распределяются.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::matrix::MatrixType;
use crate::partition::RemainderPolicy;

/// Размеры матриц по умолчанию, по порядку
pub const MATRIX_SIZES: [usize; 6] = [64, 128, 256, 512, 1024, 2048];

/// Как рабочие узнают расписание
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolMode {
    /// Обе стороны заранее настроены одинаково
    #[default]
    Implicit,
    /// Координатор рассылает расписание до первого размера
    Handshake,
}

/// Полная конфигурация бенчмарка, загружается из JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub sizes: Vec<usize>,
    /// Зерно операндов; если не задано, берётся случайное
    pub seed: Option<u64>,
    pub remainder: RemainderPolicy,
    pub protocol: ProtocolMode,
    pub operands: MatrixType,
    /// Сверять каждое собранное произведение с эталоном
    pub verify: bool,
    /// Печатать левый верхний угол каждого произведения
    pub preview: bool,
    /// Печатать сводную таблицу после последнего размера
    pub summary: bool,
    /// Записать все результаты в JSON по этому пути
    pub json_output: Option<PathBuf>,
    /// Рисовать полосу прогресса в stderr
    pub progress: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sizes: MATRIX_SIZES.to_vec(),
            seed: None,
            remainder: RemainderPolicy::default(),
            protocol: ProtocolMode::default(),
            operands: MatrixType::default(),
            verify: false,
            preview: false,
            summary: false,
            json_output: None,
            progress: false,
        }
    }
}

impl BenchConfig {
    /// Загружает конфигурацию из JSON; отсутствующие поля берутся по умолчанию
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Часть конфигурации, на которой обе стороны обмена обязаны сойтись
    pub fn schedule(&self, worker_count: usize) -> Schedule {
        Schedule {
            sizes: self.sizes.clone(),
            worker_count,
            remainder: self.remainder,
        }
    }
}

/// Размеры, число рабочих и политика остатка, общие для координатора и рабочих
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub sizes: Vec<usize>,
    pub worker_count: usize,
    pub remainder: RemainderPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.sizes, vec![64, 128, 256, 512, 1024, 2048]);
        assert_eq!(config.remainder, RemainderPolicy::Uncovered);
        assert_eq!(config.protocol, ProtocolMode::Implicit);
        assert_eq!(config.operands, MatrixType::Random);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: BenchConfig =
            serde_json::from_str(r#"{"sizes": [8, 16], "remainder": "spread", "seed": 3}"#).unwrap();
        assert_eq!(config.sizes, vec![8, 16]);
        assert_eq!(config.remainder, RemainderPolicy::Spread);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.protocol, ProtocolMode::Implicit);
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("bench-config-{}.json", std::process::id()));
        fs::write(&path, r#"{"protocol": "handshake", "operands": "ones_and_twos"}"#).unwrap();
        let config = BenchConfig::from_json_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.protocol, ProtocolMode::Handshake);
        assert_eq!(config.operands, MatrixType::OnesAndTwos);
    }

    #[test]
    fn test_schedule() {
        let schedule = BenchConfig::default().schedule(4);
        assert_eq!(schedule.worker_count, 4);
        assert_eq!(schedule.sizes.len(), 6);
    }
}
