//! Разбиение строк первого операнда между рабочими.
//!
//! Рабочие нумеруются `1..=worker_count`, как их ранги в группе процессов;
//! ранг 0 это координатор, строк у него нет.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Что делать с `size % worker_count` строками, оставшимися после деления
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Каждый рабочий получает `size / worker_count` строк; хвостовые строки
    /// не вычисляются и остаются нулевыми.
    #[default]
    Uncovered,
    /// Первые `size % worker_count` рабочих берут по одной лишней строке
    Spread,
}

impl RemainderPolicy {
    /// Код для передачи в рукопожатии
    pub fn code(self) -> i32 {
        match self {
            RemainderPolicy::Uncovered => 0,
            RemainderPolicy::Spread => 1,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(RemainderPolicy::Uncovered),
            1 => Some(RemainderPolicy::Spread),
            _ => None,
        }
    }
}

/// Диапазоны строк каждого рабочего для одного размера матрицы
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPlan {
    size: usize,
    worker_count: usize,
    policy: RemainderPolicy,
}

impl PartitionPlan {
    /// Ошибка, если рабочих нет
    pub fn new(size: usize, worker_count: usize, policy: RemainderPolicy) -> Result<Self, ProtocolError> {
        if worker_count == 0 {
            return Err(ProtocolError::NoWorkers { world_size: 1 });
        }
        Ok(Self {
            size,
            worker_count,
            policy,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn policy(&self) -> RemainderPolicy {
        self.policy
    }

    /// `floor(size / worker_count)`
    pub fn rows_per_worker(&self) -> usize {
        self.size / self.worker_count
    }

    pub fn remainder(&self) -> usize {
        self.size % self.worker_count
    }

    /// Строки рабочего `rank` (нумерация с 1). У рангов вне диапазона строк нет.
    pub fn range(&self, rank: usize) -> Range<usize> {
        if rank == 0 || rank > self.worker_count {
            return 0..0;
        }
        let base = self.rows_per_worker();
        let index = rank - 1;
        match self.policy {
            RemainderPolicy::Uncovered => index * base..(index + 1) * base,
            RemainderPolicy::Spread => {
                let extra = self.remainder();
                let start = index * base + index.min(extra);
                let len = base + usize::from(index < extra);
                start..start + len
            }
        }
    }

    /// Диапазоны рабочих `1..=worker_count` в порядке рангов
    pub fn ranges(&self) -> impl Iterator<Item = (usize, Range<usize>)> + '_ {
        (1..=self.worker_count).map(move |rank| (rank, self.range(rank)))
    }

    /// Строки, которые никто не вычисляет
    pub fn uncovered(&self) -> Range<usize> {
        match self.policy {
            RemainderPolicy::Uncovered => self.worker_count * self.rows_per_worker()..self.size,
            RemainderPolicy::Spread => self.size..self.size,
        }
    }

    /// Строки, которые вычисляет кто-то из рабочих
    pub fn covered(&self) -> Range<usize> {
        0..self.uncovered().start
    }
}
