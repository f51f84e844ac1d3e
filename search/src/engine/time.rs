use std::sync::atomic::Ordering;

use utils::move_to_uci;

use crate::telemetry::{SearchReport, ThinkingReport};

use super::{Engine, SearchMode};

/// Nodes between time checks at the start of a search.
const INITIAL_CHECK_INTERVAL: u64 = 100;

/// When the next time check and the next thinking output are due.
#[derive(Debug, Clone, Copy)]
pub(super) struct TimeCheck {
    /// Nodes between checks, adapted to keep checks `min..max` ms apart
    pub interval: u64,
    pub next_check: u64,
    pub last_check_ms: u64,
    pub next_update_ms: u64,
}

impl Default for TimeCheck {
    fn default() -> Self {
        Self {
            interval: INITIAL_CHECK_INTERVAL,
            next_check: INITIAL_CHECK_INTERVAL,
            last_check_ms: 0,
            next_update_ms: 0,
        }
    }
}

impl TimeCheck {
    /// Plan the next check. With `adapt` the interval doubles when checks
    /// come faster than `min_ms` and halves when slower than `max_ms`; a zero
    /// `max_ms` checks every node.
    pub fn reschedule(&mut self, nodes: u64, elapsed_ms: u64, min_ms: u64, max_ms: u64, adapt: bool) {
        if adapt {
            let diff = elapsed_ms.saturating_sub(self.last_check_ms);
            if max_ms == 0 {
                self.interval = 1;
            } else if diff < min_ms {
                self.interval = self.interval.saturating_mul(2);
            } else if diff > max_ms && self.interval > 1 {
                self.interval /= 2;
            }
        }
        self.last_check_ms = elapsed_ms;
        self.next_check = nodes.saturating_add(self.interval);
    }
}

impl Engine {
    pub(super) fn reset_timecheck(&mut self) {
        self.timecheck = TimeCheck::default();
    }

    /// Periodic bookkeeping: detect time-outs, emit thinking output and
    /// extend the time of an almost finished iteration. `force_check` skips
    /// the node interval, `force_update` emits thinking output right away.
    pub(crate) fn check_time(&mut self, force_check: bool, force_update: bool) {
        let nodes = self.stats.nodes();
        if nodes < self.timecheck.next_check && !force_check {
            return;
        }

        if self.timer.timeout() {
            self.stop.store(true, Ordering::Relaxed);
        }

        let elapsed = self.timer.elapsed_ms();
        self.timecheck.reschedule(
            nodes,
            elapsed,
            self.config.timecheck_min_ms.value,
            self.config.timecheck_max_ms.value,
            !force_check,
        );

        if self.slave {
            return;
        }

        if elapsed >= self.timecheck.next_update_ms || force_update {
            self.timecheck.next_update_ms = elapsed + self.config.update_interval_ms.value;
            self.report_thinking(elapsed);
        }

        if self.mode == SearchMode::Move && !self.timer.is_exact() && self.config.extend_time.value {
            self.extend_time_iteration(elapsed);
        }
    }

    /// Once most root moves are done, ask for the time the rest is expected
    /// to need. A granted extension makes this iteration the last one.
    fn extend_time_iteration(&mut self, elapsed: u64) {
        let Some(root) = self.root else {
            return;
        };
        let Some(limit) = self.timer.limit_ms() else {
            return;
        };

        let done = self.arena[root].moves_done();
        let total = self.arena[root].move_count();
        if done == 0 || total == 0 {
            return;
        }
        if (100 * done / total) < self.config.extend_time_min_percent.value as usize {
            return;
        }

        let spent = elapsed.saturating_sub(self.iteration_start_ms) as f64;
        let per_move = spent / done as f64;
        let expect = per_move
            * (total - done) as f64
            * self.config.extend_time_expect_tenths.value as f64
            / 10.0;
        let remain = limit as f64 - elapsed as f64;

        if remain < expect && !self.stop_iteration {
            let extra = (expect - remain) * self.config.extend_time_extend_tenths.value as f64 / 10.0;
            if self.timer.allocate_more_time(extra as u64) {
                log::debug!(
                    "Extended time by {} ms to finish depth {} ({}/{} moves done)",
                    extra as u64,
                    self.root_depth,
                    done,
                    total
                );
                self.stop_iteration = true;
            }
        }
    }

    /// Whether the next iteration is expected to finish in the time left.
    pub(super) fn time_for_new_iteration(&self) -> bool {
        let Some(limit) = self.timer.limit_ms() else {
            return true;
        };
        let elapsed = self.timer.elapsed_ms();
        let last = elapsed.saturating_sub(self.iteration_start_ms) as f64;
        let expect = last * self.config.new_iteration_expect_tenths.value as f64 / 10.0;
        expect <= limit as f64 - elapsed as f64
    }

    fn report_thinking(&self, elapsed_ms: u64) {
        let Some(root) = self.root else {
            return;
        };
        let node = &self.arena[root];
        self.report(SearchReport::Thinking(ThinkingReport {
            depth: self.root_depth,
            elapsed_ms,
            limit_ms: self.timer.limit_ms(),
            nodes: self.stats.nodes(),
            max_ply: self.stats.max_ply,
            max_ply_quiesce: self.stats.max_ply_quiesce,
            moves_done: node.moves_done(),
            move_count: node.move_count(),
            current_move: node.current_move().map(|mv| move_to_uci(&node.board, mv)),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_checks_double_interval() {
        let mut check = TimeCheck::default();
        check.reschedule(100, 5, 20, 50, true);
        assert_eq!(check.interval, 200);
        assert_eq!(check.next_check, 300);
    }

    #[test]
    fn test_slow_checks_halve_interval() {
        let mut check = TimeCheck::default();
        check.reschedule(100, 80, 20, 50, true);
        assert_eq!(check.interval, 50);
        assert_eq!(check.last_check_ms, 80);

        // within the band nothing changes
        check.reschedule(150, 110, 20, 50, true);
        assert_eq!(check.interval, 50);
    }

    #[test]
    fn test_interval_never_below_one() {
        let mut check = TimeCheck {
            interval: 1,
            ..Default::default()
        };
        check.reschedule(10, 1000, 20, 50, true);
        assert_eq!(check.interval, 1);
    }

    #[test]
    fn test_zero_max_checks_every_node() {
        let mut check = TimeCheck::default();
        check.reschedule(100, 0, 20, 0, true);
        assert_eq!(check.interval, 1);
        assert_eq!(check.next_check, 101);
    }

    #[test]
    fn test_forced_checks_keep_interval() {
        let mut check = TimeCheck::default();
        check.reschedule(40, 1, 20, 50, false);
        assert_eq!(check.interval, INITIAL_CHECK_INTERVAL);
        assert_eq!(check.next_check, 140);
    }
}
