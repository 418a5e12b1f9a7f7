//! Strategi menunggu untuk blocking pipe
//!
//! Blocking di sini berarti busy-spin: thread tetap runnable dan tidak
//! pernah tidur di condvar. `Backoff` hanya melonggarkan spin (lalu yield)
//! supaya tidak memonopoli core saat counterpart lambat.

use std::fmt;
use std::str::FromStr;

use crossbeam_utils::Backoff;

use crate::error::ParseWaitStrategyError;

/// Cara thread menunggu slot/pesan tersedia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategy {
    /// Tight loop dengan `spin_loop` hint, tidak pernah yield
    #[default]
    BusySpin,
    /// Exponential spin via `crossbeam_utils::Backoff`, yield setelah backoff selesai
    Backoff,
}

impl WaitStrategy {
    /// Ulangi `attempt` sampai menghasilkan `Some`.
    ///
    /// Tidak ada timeout: jika counterpart tidak pernah maju, loop ini
    /// berputar selamanya.
    #[inline]
    pub fn spin_until<R>(self, mut attempt: impl FnMut() -> Option<R>) -> R {
        match self {
            Self::BusySpin => loop {
                if let Some(r) = attempt() {
                    return r;
                }
                std::hint::spin_loop();
            },
            Self::Backoff => {
                let backoff = Backoff::new();
                loop {
                    if let Some(r) = attempt() {
                        return r;
                    }
                    backoff.snooze();
                }
            }
        }
    }
}

impl fmt::Display for WaitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusySpin => f.write_str("busy-spin"),
            Self::Backoff => f.write_str("backoff"),
        }
    }
}

impl FromStr for WaitStrategy {
    type Err = ParseWaitStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spin" | "busy-spin" | "busyspin" => Ok(Self::BusySpin),
            "backoff" => Ok(Self::Backoff),
            _ => Err(ParseWaitStrategyError(s.to_string())),
        }
    }
}
