//! Обнаружение соседей рассылкой списков рангов в сторону ранга 0.
//!
//! Ранги выстроены цепочкой или сеткой в две строки, где ранг `r` стоит над
//! рангом `r + size / 2`. Каждый ранг принимает частичные списки от правого и
//! нижнего соседей, добавляет себя и пересылает объединённый список левому и
//! верхнему. В итоге ранг 0 знает все ранги.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::protocol::receive_exact;
use crate::transport::{Tag, Transport};

/// Значение ячейки для ещё не встреченного ранга
pub const UNSEEN: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    Chain,
    #[default]
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub up: Option<usize>,
    pub down: Option<usize>,
}

/// Соседи `rank` в группе из `size`; всё вне `[0, size)` отсутствует
pub fn neighbors(topology: Topology, rank: usize, size: usize) -> Neighbors {
    let inside = |r: Option<usize>| r.filter(|&r| r < size);
    let (up, down) = match topology {
        Topology::Chain => (None, None),
        Topology::Grid => {
            let row = size / 2;
            if row == 0 {
                (None, None)
            } else {
                (inside(rank.checked_sub(row)), inside(rank.checked_add(row)))
            }
        }
    };
    Neighbors {
        left: inside(rank.checked_sub(1)),
        right: inside(rank.checked_add(1)),
        up,
        down,
    }
}

/// Заполняет пустые ячейки `into` значениями из `other`
pub fn combine(into: &mut [i32], other: &[i32]) {
    for (slot, &seen) in into.iter_mut().zip(other) {
        if *slot == UNSEEN {
            *slot = seen;
        }
    }
}

/// Один проход рассылки для этого ранга; возвращает переданный дальше список
pub fn discover<T: Transport + ?Sized>(transport: &T, topology: Topology) -> Result<Vec<i32>> {
    let (rank, size) = (transport.rank(), transport.size());
    let near = neighbors(topology, rank, size);

    let mut known = vec![UNSEEN; size];
    if let Some(right) = near.right {
        known = receive_exact(transport, right, Tag::Flood, size)?;
    }
    let from_below = match near.down {
        Some(down) => receive_exact(transport, down, Tag::Flood, size)?,
        None => vec![UNSEEN; size],
    };
    known[rank] = rank as i32;
    combine(&mut known, &from_below);

    for target in [near.left, near.up].into_iter().flatten() {
        transport.send(target, Tag::Flood, &known)?;
    }
    Ok(known)
}
