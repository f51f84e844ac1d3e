use std::sync::Arc;

use super::timer::{ClockMode, Timer};

/// Kept in reserve on every allocation, for communication overhead.
const SAFETY_MARGIN_MS: i64 = 1000;
/// Moves assumed to remain in incremental games.
const INCREMENT_MOVES: i64 = 20;
/// Moves assumed to remain in sudden death games.
const SUDDEN_DEATH_MOVES: i64 = 40;

/// Game clock of the side the engine plays. Decides how long each move may
/// take and keeps the remaining time up to date between moves.
#[derive(Debug)]
pub struct Clock {
    mode: ClockMode,

    /// Moves per time control (conventional)
    moves: i64,
    base_ms: i64,
    increment_ms: i64,

    remaining_ms: i64,
    remaining_moves: i64,
    /// Time the outside world reported us as having less than we thought
    lost_ms: i64,
    /// How far the last move went past its limit
    over_ms: i64,

    limit_ms: i64,
    hard_limit_ms: i64,
    timer: Option<Arc<Timer>>,
}

impl Clock {
    /// Picks the mode from the time control: no moves and no increment is
    /// sudden death, no increment is conventional, otherwise incremental.
    pub fn new(moves: u32, base_ms: u64, increment_ms: u64) -> Self {
        let mode = if moves == 0 && increment_ms == 0 {
            ClockMode::SuddenDeath
        } else if increment_ms == 0 {
            ClockMode::Conventional
        } else {
            ClockMode::Incremental
        };
        Self::with_mode(mode, moves, base_ms, increment_ms)
    }

    /// No time limit.
    pub fn none() -> Self {
        Self::with_mode(ClockMode::None, 0, 0, 0)
    }

    /// Exactly `ms` per move.
    pub fn exact(ms: u64) -> Self {
        let mut clock = Self::with_mode(ClockMode::Exact, 0, ms, 0);
        clock.limit_ms = ms as i64;
        clock.hard_limit_ms = ms as i64;
        clock
    }

    fn with_mode(mode: ClockMode, moves: u32, base_ms: u64, increment_ms: u64) -> Self {
        Self {
            mode,
            moves: moves as i64,
            base_ms: base_ms as i64,
            increment_ms: increment_ms as i64,
            remaining_ms: base_ms as i64,
            remaining_moves: moves as i64,
            lost_ms: 0,
            over_ms: 0,
            limit_ms: 0,
            hard_limit_ms: 0,
            timer: None,
        }
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    pub fn remaining_moves(&self) -> i64 {
        self.remaining_moves
    }

    pub fn limit_ms(&self) -> i64 {
        self.limit_ms
    }

    pub fn hard_limit_ms(&self) -> i64 {
        self.hard_limit_ms
    }

    /// Compute the soft and hard limits for the next move.
    pub fn allocate_time(&mut self) {
        if matches!(self.mode, ClockMode::None | ClockMode::Exact) {
            return;
        }

        let remaining_safe = self.remaining_ms - 2 * self.lost_ms - SAFETY_MARGIN_MS;
        if remaining_safe <= 0 {
            self.limit_ms = 0;
            self.hard_limit_ms = 0;
            log::warn!("No time left to allocate ({} ms remaining)", self.remaining_ms);
            return;
        }

        let limit = match self.mode {
            ClockMode::Conventional => remaining_safe / self.remaining_moves.max(1),
            ClockMode::Incremental => remaining_safe / INCREMENT_MOVES + self.increment_ms,
            ClockMode::SuddenDeath => remaining_safe / SUDDEN_DEATH_MOVES,
            ClockMode::None | ClockMode::Exact => return,
        };

        // pay back what the last move overran
        self.limit_ms = if limit < 2 * self.over_ms {
            0
        } else {
            limit - 2 * self.over_ms
        };

        self.hard_limit_ms = 2 * self.limit_ms;
        if self.hard_limit_ms > remaining_safe {
            self.hard_limit_ms = remaining_safe;
            self.limit_ms = self.hard_limit_ms;
        }

        log::debug!(
            "Allocated {} ms (hard {} ms) from {} ms for {:?}",
            self.limit_ms,
            self.hard_limit_ms,
            self.remaining_ms,
            self.mode
        );
    }

    /// Allocate time for a move and start timing it.
    pub fn start(&mut self) -> Arc<Timer> {
        self.allocate_time();
        let timer = Arc::new(Timer::new(
            self.mode,
            self.limit_ms.max(0) as u64,
            self.hard_limit_ms.max(0) as u64,
        ));
        self.timer = Some(Arc::clone(&timer));
        timer
    }

    /// Stop timing the current move and charge it to the clock. Returns the
    /// time used in milliseconds.
    pub fn stop(&mut self) -> i64 {
        let Some(timer) = self.timer.take() else {
            return 0;
        };
        // the search may have extended the limit
        if let Some(limit) = timer.limit_ms() {
            self.limit_ms = limit as i64;
        }
        let elapsed = timer.elapsed_ms() as i64;
        self.charge(elapsed);
        elapsed
    }

    fn charge(&mut self, elapsed_ms: i64) {
        match self.mode {
            ClockMode::Conventional => {
                self.remaining_ms -= elapsed_ms;
                self.remaining_moves -= 1;
                if self.remaining_moves <= 0 {
                    self.remaining_ms += self.base_ms;
                    self.remaining_moves = self.moves;
                }
            }
            ClockMode::Incremental => {
                self.remaining_ms -= elapsed_ms;
                self.remaining_ms += self.increment_ms;
            }
            ClockMode::SuddenDeath => {
                self.remaining_ms -= elapsed_ms;
            }
            ClockMode::None | ClockMode::Exact => {}
        }

        if self.mode != ClockMode::None {
            self.over_ms = (elapsed_ms - self.limit_ms).max(0);
        }

        if self.mode == ClockMode::Exact && elapsed_ms * 10 > self.limit_ms * 11 {
            log::warn!(
                "Move took {} ms, more than 10% over the {} ms limit",
                elapsed_ms,
                self.limit_ms
            );
        }
    }

    /// Synchronize with the remaining time reported from outside.
    pub fn set_remaining_time(&mut self, ms: i64) {
        self.lost_ms = if ms < self.remaining_ms {
            self.remaining_ms - ms
        } else {
            0
        };
        self.remaining_ms = ms;
    }
}
