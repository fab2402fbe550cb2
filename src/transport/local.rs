//! Группа процессов внутри одного процесса: поток на ранг, между ними каналы crossbeam.
//!
//! У каждой конечной точки один входящий канал. Приём выборочный: сообщения,
//! не подходящие под запрошенные `(source, tag)`, откладываются в очередь и
//! отдаются в порядке прихода следующему подходящему приёму.
//!
//! Группу, созданную через [`LocalGroup::with_shutdown`], можно освободить
//! целиком: после срабатывания [`Shutdown`] любая заблокированная отправка или
//! приём возвращает [`TransportError::Disconnected`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::thread;

use crossbeam_channel::{self as cb};
use tracing::trace;

use super::{Tag, Transport};
use crate::errors::{BenchError, TransportError};

/// Как отправка передаёт сообщение получателю
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// Неограниченные очереди; отправка не блокируется
    #[default]
    Buffered,
    /// Очереди нулевой ёмкости; отправка ждёт, пока получатель заберёт сообщение
    Rendezvous,
}

struct Envelope {
    source: usize,
    tag: Tag,
    payload: Vec<i32>,
}

/// Конечная точка одного ранга в [`LocalGroup`]
pub struct LocalEndpoint {
    rank: usize,
    peers: Vec<cb::Sender<Envelope>>,
    inbox: cb::Receiver<Envelope>,
    saved: RefCell<VecDeque<Envelope>>,
    shutdown: cb::Receiver<()>,
}

impl fmt::Debug for LocalEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEndpoint")
            .field("rank", &self.rank)
            .field("size", &self.peers.len())
            .field("saved", &self.saved.borrow().len())
            .finish()
    }
}

impl Transport for LocalEndpoint {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&self, dest: usize, tag: Tag, data: &[i32]) -> Result<(), TransportError> {
        let peer = self.peers.get(dest).ok_or(TransportError::PeerOutOfRange {
            rank: dest,
            size: self.peers.len(),
        })?;
        trace!(from = self.rank, to = dest, ?tag, len = data.len(), "send");
        let envelope = Envelope {
            source: self.rank,
            tag,
            payload: data.to_vec(),
        };
        cb::select! {
            send(peer, envelope) -> sent => sent.map_err(|_| TransportError::Disconnected { peer: dest }),
            recv(self.shutdown) -> _ => Err(TransportError::Disconnected { peer: dest }),
        }
    }

    fn receive(&self, source: usize, tag: Tag) -> Result<Vec<i32>, TransportError> {
        if source >= self.peers.len() {
            return Err(TransportError::PeerOutOfRange {
                rank: source,
                size: self.peers.len(),
            });
        }

        {
            let mut saved = self.saved.borrow_mut();
            if let Some(pos) = saved.iter().position(|e| e.source == source && e.tag == tag) {
                if let Some(envelope) = saved.remove(pos) {
                    return Ok(envelope.payload);
                }
            }
        }

        loop {
            let envelope = cb::select! {
                recv(self.inbox) -> envelope => envelope.map_err(|_| TransportError::Disconnected { peer: source })?,
                recv(self.shutdown) -> _ => {
                    trace!(at = self.rank, from = source, ?tag, "receive released by shutdown");
                    return Err(TransportError::Disconnected { peer: source });
                }
            };
            if envelope.source == source && envelope.tag == tag {
                trace!(at = self.rank, from = source, ?tag, len = envelope.payload.len(), "receive");
                return Ok(envelope.payload);
            }
            self.saved.borrow_mut().push_back(envelope);
        }
    }
}

/// Освобождает все конечные точки группы при срабатывании или удалении
#[derive(Debug)]
pub struct Shutdown {
    _signal: cb::Sender<()>,
}

impl Shutdown {
    pub fn trigger(self) {
        drop(self._signal);
    }
}

/// Построитель полносвязной группы конечных точек в одном процессе
pub struct LocalGroup;

impl LocalGroup {
    /// Создаёт `size` связанных конечных точек, индекс равен рангу
    pub fn new(size: usize, delivery: Delivery) -> Vec<LocalEndpoint> {
        Self::connect(size, delivery, cb::never())
    }

    /// Как [`LocalGroup::new`], плюс ручка, разблокирующая всю группу
    pub fn with_shutdown(size: usize, delivery: Delivery) -> (Vec<LocalEndpoint>, Shutdown) {
        let (signal, shutdown) = cb::bounded(0);
        (Self::connect(size, delivery, shutdown), Shutdown { _signal: signal })
    }

    fn connect(size: usize, delivery: Delivery, shutdown: cb::Receiver<()>) -> Vec<LocalEndpoint> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size)
            .map(|_| match delivery {
                Delivery::Buffered => cb::unbounded(),
                Delivery::Rendezvous => cb::bounded(0),
            })
            .unzip();

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalEndpoint {
                rank,
                peers: senders.clone(),
                inbox,
                saved: RefCell::new(VecDeque::new()),
                shutdown: shutdown.clone(),
            })
            .collect()
    }

    /// Запускает `body` для каждого ранга в отдельном потоке и собирает
    /// результаты в порядке рангов.
    pub fn run<F, R>(size: usize, delivery: Delivery, body: F) -> Result<Vec<R>, BenchError>
    where
        F: Fn(LocalEndpoint) -> R + Sync,
        R: Send,
    {
        let endpoints = Self::new(size, delivery);
        let body = &body;
        thread::scope(|scope| -> Result<Vec<R>, BenchError> {
            let handles = endpoints
                .into_iter()
                .map(|endpoint| {
                    let rank = endpoint.rank;
                    thread::Builder::new()
                        .name(format!("rank-{rank}"))
                        .spawn_scoped(scope, move || body(endpoint))
                        .map(|handle| (rank, handle))
                })
                .collect::<Result<Vec<_>, _>>()?;

            handles
                .into_iter()
                .map(|(rank, handle)| handle.join().map_err(|_| BenchError::RankPanicked(rank)))
                .collect()
        })
    }
}
