//! Demo: dua thread yang berbagi counter
//!
//! Thread A memiliki counter dan melakukan kerja lokal tiap iterasi.
//! Thread B mengirim perintah `Add`/`Sub` ke A. Tiga cara menghubungkan keduanya:
//! - `async`: satu pipe operasi, B tidak menunggu A
//! - `sync`: pipe operasi + pipe ack (kapasitas 1), B menunggu ack tiap iterasi
//! - `locked`: baseline, B mengubah counter A langsung di bawah Mutex
//!
//! Setiap mode pipe bisa dijalankan dengan blocking atau non-blocking pipe.
//! Non-blocking pipe memang diharapkan gagal di sini: B lebih cepat dari A.

mod affinity;
mod counter;
mod message;

pub use affinity::pin_current_thread;
pub use counter::{expected_total, Counter};
pub use message::{AckMessage, Op, OpMessage};

use std::fmt;
use std::io;
use std::str::FromStr;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PipeConfig;
use crate::core::WaitStrategy;
use crate::error::PipeError;
use crate::pipe::{BlockingPipe, NonBlockingPipe, Pipe};

const COUNTER_THREAD: &str = "counter-a";
const SENDER_THREAD: &str = "sender-b";

/// Kegagalan worker demo
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("cannot send operation at iteration {iteration}")]
    CannotSendOperation { iteration: u64 },

    #[error("cannot send ack at iteration {iteration}")]
    CannotSendAck { iteration: u64 },

    #[error("cannot receive ack at iteration {iteration}")]
    CannotReceiveAck { iteration: u64 },

    #[error("worker thread `{0}` panicked")]
    WorkerPanicked(&'static str),

    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] io::Error),

    #[error(transparent)]
    Pipe(#[from] PipeError),
}

/// Cara A dan B dihubungkan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Async,
    Sync,
    Locked,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown mode `{0}` (expected `async`, `sync` or `locked`)")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "async" => Ok(Self::Async),
            "sync" => Ok(Self::Sync),
            "locked" | "lock" => Ok(Self::Locked),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Async => f.write_str("async"),
            Self::Sync => f.write_str("sync"),
            Self::Locked => f.write_str("locked"),
        }
    }
}

/// Varian pipe yang dipakai
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeKind {
    Blocking,
    NonBlocking,
}

impl fmt::Display for PipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking => f.write_str("blocking"),
            Self::NonBlocking => f.write_str("non-blocking"),
        }
    }
}

/// Parameter satu run demo
#[derive(Debug, Clone, Copy)]
pub struct DemoConfig {
    pub iterations: u64,
    /// Kapasitas pipe operasi. Pipe ack selalu berkapasitas 1.
    pub capacity: usize,
    pub wait: WaitStrategy,
    /// Core untuk (A, B)
    pub pin: Option<(usize, usize)>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000_000,
            capacity: 1024,
            wait: WaitStrategy::BusySpin,
            pin: None,
        }
    }
}

/// Hasil satu run
#[derive(Debug)]
pub struct RunReport {
    /// Counter A saat A berhenti
    pub counter: Counter,
    pub elapsed: Duration,
    /// Kegagalan worker, kosong jika run lengkap
    pub failures: Vec<DemoError>,
}

impl RunReport {
    /// Semua pesan sampai dan tidak ada worker yang gagal
    pub fn is_complete(&self, iterations: u64) -> bool {
        self.failures.is_empty() && self.counter == expected_total(iterations)
    }
}

/// Jalankan satu kombinasi mode + varian pipe
pub fn run(mode: Mode, kind: PipeKind, config: &DemoConfig) -> Result<RunReport, DemoError> {
    info!(%mode, pipe = %kind, iterations = config.iterations, capacity = config.capacity, "starting run");

    let ops_config = PipeConfig::default()
        .with_capacity(config.capacity)
        .with_wait(config.wait);
    let ack_config = ops_config.with_capacity(1);

    let report = match (mode, kind) {
        (Mode::Locked, _) => run_locked(config.iterations, config.pin)?,
        (Mode::Async, PipeKind::Blocking) => {
            let ops = BlockingPipe::from_config(&ops_config, OpMessage::default)?;
            run_async(config.iterations, &ops, config.pin)?
        }
        (Mode::Async, PipeKind::NonBlocking) => {
            let ops = NonBlockingPipe::from_config(&ops_config, OpMessage::default)?;
            run_async(config.iterations, &ops, config.pin)?
        }
        (Mode::Sync, PipeKind::Blocking) => {
            let ops = BlockingPipe::from_config(&ops_config, OpMessage::default)?;
            let acks = BlockingPipe::from_config(&ack_config, AckMessage::default)?;
            run_sync(config.iterations, &ops, &acks, config.pin)?
        }
        (Mode::Sync, PipeKind::NonBlocking) => {
            let ops = NonBlockingPipe::from_config(&ops_config, OpMessage::default)?;
            let acks = NonBlockingPipe::from_config(&ack_config, AckMessage::default)?;
            run_sync(config.iterations, &ops, &acks, config.pin)?
        }
    };

    for failure in &report.failures {
        warn!(%mode, pipe = %kind, error = %failure, "worker stopped early");
    }
    info!(%mode, pipe = %kind, elapsed_ms = report.elapsed.as_millis() as u64, "run finished");

    Ok(report)
}

/// B mengirim operasi, A menerima paling banyak satu per iterasi
pub fn run_async<P>(
    iterations: u64,
    ops: &P,
    pin: Option<(usize, usize)>,
) -> Result<RunReport, DemoError>
where
    P: Pipe<OpMessage> + Sync,
{
    let start = Instant::now();

    thread::scope(|s| -> Result<RunReport, DemoError> {
        let a = spawn_worker(s, COUNTER_THREAD, pin.map(|p| p.0), move || {
            let mut counter = Counter::default();
            let mut to_receive = OpMessage::default();
            for i in 1..=iterations {
                counter.local_step(i);
                if ops.receive(&mut to_receive) {
                    counter.apply(&to_receive);
                }
            }
            counter
        })?;
        let b = spawn_worker(s, SENDER_THREAD, pin.map(|p| p.1), move || {
            for i in 1..=iterations {
                if !ops.dispatch(&OpMessage::for_iteration(i)) {
                    return Err(DemoError::CannotSendOperation { iteration: i });
                }
            }
            Ok(())
        })?;

        let counter = join(a, COUNTER_THREAD)?;
        let sent = join(b, SENDER_THREAD)?;

        Ok(RunReport {
            counter,
            elapsed: start.elapsed(),
            failures: sent.err().into_iter().collect(),
        })
    })
}

/// Seperti [`run_async`], tapi A mengirim ack tiap iterasi dan B menunggunya
pub fn run_sync<P, Q>(
    iterations: u64,
    ops: &P,
    acks: &Q,
    pin: Option<(usize, usize)>,
) -> Result<RunReport, DemoError>
where
    P: Pipe<OpMessage> + Sync,
    Q: Pipe<AckMessage> + Sync,
{
    let start = Instant::now();

    thread::scope(|s| -> Result<RunReport, DemoError> {
        let a = spawn_worker(s, COUNTER_THREAD, pin.map(|p| p.0), move || {
            let mut counter = Counter::default();
            let mut to_receive = OpMessage::default();
            let ack = AckMessage;
            for i in 1..=iterations {
                counter.local_step(i);
                if ops.receive(&mut to_receive) {
                    counter.apply(&to_receive);
                }
                if !acks.dispatch(&ack) {
                    return (counter, Err(DemoError::CannotSendAck { iteration: i }));
                }
            }
            (counter, Ok(()))
        })?;
        let b = spawn_worker(s, SENDER_THREAD, pin.map(|p| p.1), move || {
            let mut ack = AckMessage;
            for i in 1..=iterations {
                if !ops.dispatch(&OpMessage::for_iteration(i)) {
                    return Err(DemoError::CannotSendOperation { iteration: i });
                }
                if !acks.receive(&mut ack) {
                    return Err(DemoError::CannotReceiveAck { iteration: i });
                }
            }
            Ok(())
        })?;

        let (counter, acked) = join(a, COUNTER_THREAD)?;
        let sent = join(b, SENDER_THREAD)?;

        Ok(RunReport {
            counter,
            elapsed: start.elapsed(),
            failures: sent.err().into_iter().chain(acked.err()).collect(),
        })
    })
}

/// Baseline tanpa pipe: kedua thread mengunci counter yang sama
pub fn run_locked(iterations: u64, pin: Option<(usize, usize)>) -> Result<RunReport, DemoError> {
    let start = Instant::now();
    let shared = Mutex::new(Counter::default());

    thread::scope(|s| {
        let shared = &shared;
        let a = spawn_worker(s, COUNTER_THREAD, pin.map(|p| p.0), move || {
            for i in 1..=iterations {
                shared.lock().local_step(i);
            }
        })?;
        let b = spawn_worker(s, SENDER_THREAD, pin.map(|p| p.1), move || {
            for i in 1..=iterations {
                shared.lock().apply(&OpMessage::for_iteration(i));
            }
        })?;

        join(a, COUNTER_THREAD)?;
        join(b, SENDER_THREAD)?;
        Ok::<(), DemoError>(())
    })?;

    Ok(RunReport {
        counter: shared.into_inner(),
        elapsed: start.elapsed(),
        failures: Vec::new(),
    })
}

fn spawn_worker<'scope, 'env, F, R>(
    scope: &'scope Scope<'scope, 'env>,
    name: &'static str,
    core: Option<usize>,
    f: F,
) -> io::Result<ScopedJoinHandle<'scope, R>>
where
    F: FnOnce() -> R + Send + 'scope,
    R: Send + 'scope,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn_scoped(scope, move || {
            if let Some(core) = core {
                if let Err(e) = pin_current_thread(core) {
                    warn!(thread = name, core, error = %e, "cpu pinning failed");
                }
            }
            f()
        })
}

fn join<R>(handle: ScopedJoinHandle<'_, R>, name: &'static str) -> Result<R, DemoError> {
    handle.join().map_err(|_| DemoError::WorkerPanicked(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("async".parse::<Mode>().unwrap(), Mode::Async);
        assert_eq!("SYNC".parse::<Mode>().unwrap(), Mode::Sync);
        assert_eq!("lock".parse::<Mode>().unwrap(), Mode::Locked);
        assert_eq!(
            "pipe".parse::<Mode>(),
            Err(ParseModeError("pipe".to_string()))
        );
    }

    #[test]
    fn test_locked_baseline_is_exact() {
        let report = run_locked(1_000, None).unwrap();
        assert!(report.is_complete(1_000));
    }

    #[test]
    fn test_blocking_async_delivers_everything() {
        let config = DemoConfig {
            iterations: 5_000,
            capacity: 16,
            wait: WaitStrategy::Backoff,
            ..DemoConfig::default()
        };
        let report = run(Mode::Async, PipeKind::Blocking, &config).unwrap();
        assert!(report.is_complete(5_000), "{:?}", report);
    }

    #[test]
    fn test_blocking_sync_delivers_everything() {
        let config = DemoConfig {
            iterations: 2_000,
            capacity: 4,
            wait: WaitStrategy::Backoff,
            pin: None,
        };
        let report = run(Mode::Sync, PipeKind::Blocking, &config).unwrap();
        assert!(report.is_complete(2_000), "{:?}", report);
    }
}
