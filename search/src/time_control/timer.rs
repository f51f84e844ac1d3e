use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How the time for a move is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// No time limit, search until depth or stop
    None,
    /// Fixed time per move
    Exact,
    /// A number of moves in a base time
    Conventional,
    /// Base time plus an increment per move
    Incremental,
    /// All remaining moves in the base time
    SuddenDeath,
}

/// Wall-clock budget of one move decision, shared by the master and its slaves.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    mode: ClockMode,
    limit_ms: AtomicU64,
    hard_limit_ms: u64,
}

impl Timer {
    pub fn new(mode: ClockMode, limit_ms: u64, hard_limit_ms: u64) -> Self {
        Self {
            start: Instant::now(),
            mode,
            limit_ms: AtomicU64::new(limit_ms),
            hard_limit_ms: hard_limit_ms.max(limit_ms),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(ClockMode::None, 0, 0)
    }

    pub fn exact(time: Duration) -> Self {
        let ms = time.as_millis() as u64;
        Self::new(ClockMode::Exact, ms, ms)
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Current soft limit, `None` without a time limit.
    pub fn limit_ms(&self) -> Option<u64> {
        match self.mode {
            ClockMode::None => None,
            _ => Some(self.limit_ms.load(Ordering::Relaxed)),
        }
    }

    pub fn hard_limit_ms(&self) -> Option<u64> {
        match self.mode {
            ClockMode::None => None,
            _ => Some(self.hard_limit_ms),
        }
    }

    pub fn timeout(&self) -> bool {
        match self.limit_ms() {
            Some(limit) => self.elapsed_ms() >= limit,
            None => false,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.mode == ClockMode::Exact
    }

    /// Raise the soft limit by `ms`, capped at the hard limit. Fixed and
    /// unlimited clocks never grant more time.
    pub fn allocate_more_time(&self, ms: u64) -> bool {
        match self.mode {
            ClockMode::None | ClockMode::Exact => false,
            _ => {
                let limit = self.limit_ms.load(Ordering::Relaxed);
                let extended = limit.saturating_add(ms).min(self.hard_limit_ms);
                self.limit_ms.store(extended, Ordering::Relaxed);
                log::debug!("Time limit extended from {} to {} ms", limit, extended);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_never_times_out() {
        let timer = Timer::unlimited();
        assert!(!timer.timeout());
        assert_eq!(timer.limit_ms(), None);
        assert!(!timer.allocate_more_time(100));
    }

    #[test]
    fn test_zero_limit_times_out_immediately() {
        let timer = Timer::new(ClockMode::SuddenDeath, 0, 0);
        assert!(timer.timeout());
    }

    #[test]
    fn test_exact_refuses_extension() {
        let timer = Timer::exact(Duration::from_millis(500));
        assert!(timer.is_exact());
        assert!(!timer.allocate_more_time(100));
        assert_eq!(timer.limit_ms(), Some(500));
    }

    #[test]
    fn test_extension_capped_at_hard_limit() {
        let timer = Timer::new(ClockMode::Incremental, 1000, 1500);
        assert!(timer.allocate_more_time(300));
        assert_eq!(timer.limit_ms(), Some(1300));
        assert!(timer.allocate_more_time(300));
        assert_eq!(timer.limit_ms(), Some(1500));
    }
}
