use std::fmt;

use evaluation::scores::{is_mate_score, mate_distance};

use crate::statistics::SearchStats;
use crate::transposition::TableStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Positive for mate-in-n, negative for mated-in-n
    Mate(i32),
}

impl Score {
    pub fn from_search(score: i32) -> Self {
        if is_mate_score(score) {
            let mate_in = (mate_distance(score) + 1) / 2;
            if score > 0 {
                Score::Mate(mate_in)
            } else {
                Score::Mate(-mate_in)
            }
        } else {
            Score::Centipawns(score)
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Centipawns(cp) => write!(f, "cp {}", cp),
            Score::Mate(n) => write!(f, "mate {}", n),
        }
    }
}

/// Why an iteration result is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationKind {
    /// A new best root move inside an unfinished iteration
    Intermediate,
    /// A finished iteration
    Depth,
    FailLow,
    FailHigh,
}

#[derive(Debug, Clone)]
pub struct ThinkingReport {
    pub depth: i32,
    pub elapsed_ms: u64,
    pub limit_ms: Option<u64>,
    pub nodes: u64,
    pub max_ply: usize,
    pub max_ply_quiesce: usize,
    pub moves_done: usize,
    pub move_count: usize,
    pub current_move: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IterationReport {
    pub kind: IterationKind,
    pub depth: i32,
    pub score: i32,
    pub elapsed_ms: u64,
    pub nodes: u64,
    pub max_ply: usize,
    pub max_ply_quiesce: usize,
    pub best_line: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StatisticsReport {
    pub depth: i32,
    pub elapsed_ms: u64,
    pub stats: SearchStats,
    pub table: Option<TableStats>,
}

/// Telemetry sent by the master engine while it searches.
#[derive(Debug, Clone)]
pub enum SearchReport {
    Thinking(ThinkingReport),
    Iteration(IterationReport),
    Statistics(StatisticsReport),
}

impl SearchReport {
    pub fn log(&self) {
        match self {
            SearchReport::Thinking(t) => log::debug!("{}", t),
            SearchReport::Iteration(i) => match i.kind {
                IterationKind::Depth => log::info!("{}", i),
                _ => log::debug!("{}", i),
            },
            SearchReport::Statistics(s) => {
                for line in s.lines() {
                    log::info!("{}", line);
                }
            }
        }
    }
}

fn nodes_per_second(nodes: u64, elapsed_ms: u64) -> u64 {
    nodes * 1000 / elapsed_ms.max(1)
}

impl fmt::Display for ThinkingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "depth {} seldepth {}/{} time {}",
            self.depth, self.max_ply, self.max_ply_quiesce, self.elapsed_ms
        )?;
        if let Some(limit) = self.limit_ms {
            write!(f, "/{}", limit)?;
        }
        write!(
            f,
            " nodes {} nps {} move {}/{}",
            self.nodes,
            nodes_per_second(self.nodes, self.elapsed_ms),
            self.moves_done + 1,
            self.move_count
        )?;
        if let Some(mv) = &self.current_move {
            write!(f, " {}", mv)?;
        }
        Ok(())
    }
}

impl fmt::Display for IterationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            IterationKind::Intermediate => "",
            IterationKind::Depth => ".",
            IterationKind::FailLow => " (fail low)",
            IterationKind::FailHigh => " (fail high)",
        };
        write!(
            f,
            "depth {}{} score {} seldepth {}/{} time {} nodes {} nps {} pv {}",
            self.depth,
            marker,
            Score::from_search(self.score),
            self.max_ply,
            self.max_ply_quiesce,
            self.elapsed_ms,
            self.nodes,
            nodes_per_second(self.nodes, self.elapsed_ms),
            self.best_line.join(" ")
        )
    }
}

impl StatisticsReport {
    pub fn lines(&self) -> Vec<String> {
        let s = &self.stats;
        let mut lines = vec![
            format!(
                "depth {} time {} nodes {} (full width {}, quiescence {}) nps {}",
                self.depth,
                self.elapsed_ms,
                s.nodes(),
                s.nodes_fullwidth,
                s.nodes_quiesce,
                nodes_per_second(s.nodes(), self.elapsed_ms)
            ),
            format!(
                "cuts: beta {} null {} futility {} extended futility {} razor {}",
                s.beta_cuts, s.null_cuts, s.fut_cuts, s.ext_fut_cuts, s.razor_cuts
            ),
            format!(
                "branching: full width {:.2} quiescence {:.2}",
                s.branching_factor(),
                s.branching_factor_quiesce()
            ),
            format!(
                "evaluations {} lazy {} cache {}/{}",
                s.eval.evaluations, s.eval.lazy, s.eval.cache_hits, s.eval.cache_probes
            ),
        ];
        if let Some(table) = &self.table {
            lines.push(format!(
                "hash: size {} probes {} hits {} collisions {} stores {}",
                table.size, table.probes, table.hits, table.collisions, table.stores
            ));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaluation::scores::{mated_in, INFTY};

    #[test]
    fn test_mate_scores() {
        // mate delivered on the first ply
        assert_eq!(Score::from_search(INFTY - 1), Score::Mate(1));
        // we move, they move, we mate
        assert_eq!(Score::from_search(INFTY - 3), Score::Mate(2));
        assert_eq!(Score::from_search(mated_in(2)), Score::Mate(-1));
    }

    #[test]
    fn test_centipawns() {
        assert_eq!(Score::from_search(35), Score::Centipawns(35));
        assert_eq!(Score::from_search(-120).to_string(), "cp -120");
    }

    #[test]
    fn test_iteration_line() {
        let report = IterationReport {
            kind: IterationKind::FailHigh,
            depth: 5,
            score: 40,
            elapsed_ms: 0,
            nodes: 1000,
            max_ply: 5,
            max_ply_quiesce: 9,
            best_line: vec!["e2e4".to_string(), "e7e5".to_string()],
        };
        let line = report.to_string();
        assert!(line.starts_with("depth 5 (fail high) score cp 40"));
        assert!(line.ends_with("pv e2e4 e7e5"));
    }
}
