//! Транспорт поверх MPI, включается фичей `mpi`.
//!
//! Запуск: `mpirun -n <workers + 1> matrix_benchmark`; размер группы берётся
//! из мирового коммуникатора MPI.

use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use super::{Tag, Transport};
use crate::errors::TransportError;

/// Конечная точка в `MPI_COMM_WORLD`
pub struct MpiTransport {
    // Удаляется раньше universe, который завершает MPI
    world: SimpleCommunicator,
    _universe: Universe,
}

impl MpiTransport {
    /// Инициализирует MPI. Ошибка, если MPI в этом процессе уже инициализирован.
    pub fn initialize() -> Result<Self, TransportError> {
        let universe = mpi::initialize()
            .ok_or_else(|| TransportError::Bootstrap("MPI already initialized".to_string()))?;
        let world = universe.world();
        Ok(Self {
            world,
            _universe: universe,
        })
    }

    fn check_peer(&self, rank: usize) -> Result<i32, TransportError> {
        if rank >= self.size() {
            return Err(TransportError::PeerOutOfRange {
                rank,
                size: self.size(),
            });
        }
        i32::try_from(rank).map_err(|_| TransportError::PeerOutOfRange {
            rank,
            size: self.size(),
        })
    }
}

impl Transport for MpiTransport {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send(&self, dest: usize, tag: Tag, data: &[i32]) -> Result<(), TransportError> {
        let dest = self.check_peer(dest)?;
        self.world.process_at_rank(dest).send_with_tag(data, tag.code());
        Ok(())
    }

    fn receive(&self, source: usize, tag: Tag) -> Result<Vec<i32>, TransportError> {
        let source = self.check_peer(source)?;
        let (data, _status) = self
            .world
            .process_at_rank(source)
            .receive_vec_with_tag::<i32>(tag.code());
        Ok(data)
    }
}
