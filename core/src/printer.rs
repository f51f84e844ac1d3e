use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use search::{IterationKind, IterationReport, Score, SearchReport, StatisticsReport};

/// Prints search telemetry as it arrives, on its own thread. The thread ends
/// when the search drops its sender.
pub struct ReportPrinter {
    handle: JoinHandle<Option<StatisticsReport>>,
}

impl ReportPrinter {
    pub fn spawn(rx: Receiver<SearchReport>) -> Self {
        let handle = thread::spawn(move || {
            let mut statistics = None;

            for report in rx {
                match report {
                    SearchReport::Iteration(iteration) => Self::print_iteration(&iteration),
                    SearchReport::Statistics(stats) => statistics = Some(stats),
                    // already in the debug log
                    SearchReport::Thinking(_) => {}
                }
            }

            statistics
        });

        Self { handle }
    }

    pub fn join(self) -> Option<StatisticsReport> {
        self.handle.join().unwrap_or_else(|_| {
            log::error!("Report printer thread panicked");
            None
        })
    }

    fn print_iteration(report: &IterationReport) {
        let bound = match report.kind {
            IterationKind::FailLow => " upperbound",
            IterationKind::FailHigh => " lowerbound",
            IterationKind::Depth | IterationKind::Intermediate => "",
        };
        println!(
            "info depth {} seldepth {} score {}{} nodes {} time {} pv {}",
            report.depth,
            report.max_ply.max(report.max_ply_quiesce),
            Score::from_search(report.score),
            bound,
            report.nodes,
            report.elapsed_ms,
            report.best_line.join(" ")
        );
    }
}
