//! Общие для координатора и рабочих функции протокола

use tracing::debug;

use crate::config::Schedule;
use crate::errors::{ProtocolError, Result};
use crate::partition::RemainderPolicy;
use crate::transport::{Tag, Transport, COORDINATOR_RANK};

/// Принимает сообщение и проверяет, что в нём ровно `expected` целых
pub fn receive_exact<T: Transport + ?Sized>(
    transport: &T,
    source: usize,
    tag: Tag,
    expected: usize,
) -> Result<Vec<i32>> {
    let data = transport.receive(source, tag)?;
    if data.len() != expected {
        return Err(ProtocolError::UnexpectedLength {
            tag,
            source_rank: source,
            expected,
            actual: data.len(),
        }
        .into());
    }
    Ok(data)
}

/// Содержимое рукопожатия: `[worker_count, remainder_code, n_sizes, sizes...]`
pub fn encode_schedule(schedule: &Schedule) -> Result<Vec<i32>> {
    let to_word = |value: usize, what: &str| {
        i32::try_from(value)
            .map_err(|_| ProtocolError::MalformedHandshake(format!("{what} {value} does not fit in i32")))
    };

    let mut words = Vec::with_capacity(3 + schedule.sizes.len());
    words.push(to_word(schedule.worker_count, "worker count")?);
    words.push(schedule.remainder.code());
    words.push(to_word(schedule.sizes.len(), "size count")?);
    for &size in &schedule.sizes {
        words.push(to_word(size, "matrix size")?);
    }
    Ok(words)
}

pub fn decode_schedule(words: &[i32]) -> std::result::Result<Schedule, ProtocolError> {
    let malformed = |reason: &str| ProtocolError::MalformedHandshake(reason.to_string());
    let to_usize = |word: i32, what: &str| {
        usize::try_from(word).map_err(|_| ProtocolError::MalformedHandshake(format!("negative {what}: {word}")))
    };

    let (header, rest) = match words {
        [a, b, c, rest @ ..] => ([*a, *b, *c], rest),
        _ => return Err(malformed("payload shorter than header")),
    };
    let worker_count = to_usize(header[0], "worker count")?;
    let remainder = RemainderPolicy::from_code(header[1])
        .ok_or_else(|| ProtocolError::MalformedHandshake(format!("unknown remainder policy {}", header[1])))?;
    let count = to_usize(header[2], "size count")?;
    if rest.len() != count {
        return Err(ProtocolError::MalformedHandshake(format!(
            "announced {count} sizes, payload holds {}",
            rest.len()
        )));
    }
    let sizes = rest
        .iter()
        .map(|&w| to_usize(w, "matrix size"))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Schedule {
        sizes,
        worker_count,
        remainder,
    })
}

/// Рукопожатие со стороны координатора: рассылает `schedule` всем рабочим
pub fn announce_schedule<T: Transport + ?Sized>(transport: &T, schedule: &Schedule) -> Result<()> {
    let words = encode_schedule(schedule)?;
    for worker in 1..=schedule.worker_count {
        transport.send(worker, Tag::Handshake, &words)?;
    }
    debug!(workers = schedule.worker_count, sizes = ?schedule.sizes, "schedule announced");
    Ok(())
}

/// Рукопожатие со стороны рабочего: ждёт расписание от координатора
pub fn await_schedule<T: Transport + ?Sized>(transport: &T) -> Result<Schedule> {
    let words = transport.receive(COORDINATOR_RANK, Tag::Handshake)?;
    let schedule = decode_schedule(&words)?;
    let local = transport.worker_count();
    if schedule.worker_count != local {
        return Err(ProtocolError::WorkerCountMismatch {
            announced: schedule.worker_count,
            local,
        }
        .into());
    }
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BenchError;
    use crate::transport::{Delivery, LocalGroup};

    fn schedule() -> Schedule {
        Schedule {
            sizes: vec![64, 128, 65],
            worker_count: 3,
            remainder: RemainderPolicy::Spread,
        }
    }

    #[test]
    fn test_schedule_wire_layout() {
        assert_eq!(encode_schedule(&schedule()).unwrap(), vec![3, 1, 3, 64, 128, 65]);
        assert_eq!(decode_schedule(&[3, 1, 3, 64, 128, 65]).unwrap(), schedule());
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(decode_schedule(&[1, 0]).is_err());
        assert!(decode_schedule(&[1, 9, 0]).is_err());
        assert!(decode_schedule(&[1, 0, 2, 64]).is_err());
        assert!(decode_schedule(&[1, 0, 1, -64]).is_err());
        assert!(decode_schedule(&[-1, 0, 0]).is_err());
    }

    #[test]
    fn test_receive_exact_length_check() {
        let group = LocalGroup::new(2, Delivery::Buffered);
        group[0].send(1, Tag::Dispatch, &[1, 2, 3]).unwrap();
        let err = receive_exact(&group[1], 0, Tag::Dispatch, 4).unwrap_err();
        assert!(matches!(
            err,
            BenchError::Protocol(ProtocolError::UnexpectedLength { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_handshake_worker_count_mismatch() {
        let group = LocalGroup::new(3, Delivery::Buffered);
        let announced = Schedule {
            worker_count: 2,
            ..schedule()
        };
        announce_schedule(&group[0], &announced).unwrap();
        assert_eq!(await_schedule(&group[1]).unwrap(), announced);

        group[0]
            .send(2, Tag::Handshake, &encode_schedule(&schedule()).unwrap())
            .unwrap();
        // Рабочий 2 сначала забирает корректное объявление, затем видит расхождение
        assert!(await_schedule(&group[2]).is_ok());
        assert!(matches!(
            await_schedule(&group[2]),
            Err(BenchError::Protocol(ProtocolError::WorkerCountMismatch { announced: 3, local: 2 }))
        ));
    }
}
