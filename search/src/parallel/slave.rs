use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Receiver, Sender},
    Arc,
};
use std::thread::{self, JoinHandle};

use cozy_chess::Move;
use evaluation::{Evaluator, PieceValues};

use crate::{
    arena::{NodeArena, NodeId},
    engine::{Engine, SlaveTask, TaskResult},
    transposition::TranspositionTable,
    EngineConfig,
};

/// Commands sent from the master to a slave thread.
pub(crate) enum SlaveCommand {
    Search(Box<SlaveTask>),
    Configure(Box<EngineConfig>),
    SetTable(Option<Arc<TranspositionTable>>),
    SetEvalCache(usize),
    /// Forget tables and history between games
    Clear,
}

/// Sent on the shared ready channel when a slave finishes a task.
pub(crate) struct SlaveReport {
    pub id: usize,
    pub result: TaskResult,
}

/// A subtree the master handed to a slave and is waiting for.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Dispatch {
    pub mv: Move,
    /// The child node in the slave handle's dispatch arena
    pub child: NodeId,
    /// Master alpha when the move was sent
    pub alpha: i32,
    pub nullwin: bool,
    /// Window the slave searches with, from the child's perspective
    pub window: (i32, i32),
}

/// Owns the slave's engine on its thread. Loops on commands until the
/// command channel closes.
struct SlaveWorker {
    id: usize,
    engine: Engine,
    commands: Receiver<SlaveCommand>,
    ready: Sender<SlaveReport>,
}

impl SlaveWorker {
    fn run(mut self) {
        while let Ok(command) = self.commands.recv() {
            match command {
                SlaveCommand::Search(task) => {
                    let result = self.engine.search_task(*task);
                    let report = SlaveReport {
                        id: self.id,
                        result,
                    };
                    if self.ready.send(report).is_err() {
                        break;
                    }
                }
                SlaveCommand::Configure(config) => self.engine.configure(&config, false),
                SlaveCommand::SetTable(table) => self.engine.table = table,
                SlaveCommand::SetEvalCache(bytes) => self.engine.evaluator.set_cache_size(bytes),
                SlaveCommand::Clear => self.engine.clear_tables(),
            }
        }
        log::debug!("Slave {} exiting", self.id);
    }
}

/// The master's side of one slave thread.
pub(crate) struct SlaveHandle {
    pub id: usize,
    commands: Option<Sender<SlaveCommand>>,
    pub stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,

    /// Holds the dispatched child while the slave works on a copy of it
    pub arena: NodeArena,
    pub dispatch: Option<Dispatch>,
    pub busy: bool,
}

impl SlaveHandle {
    pub fn spawn(
        id: usize,
        config: &EngineConfig,
        evaluator: Box<dyn Evaluator>,
        values: PieceValues,
        ready: Sender<SlaveReport>,
    ) -> Self {
        let engine = Engine::new_slave(config, evaluator);
        let stop = engine.stop_flag();
        let (tx, rx) = mpsc::channel();

        let worker = SlaveWorker {
            id,
            engine,
            commands: rx,
            ready,
        };
        let thread = thread::spawn(move || worker.run());

        Self {
            id,
            commands: Some(tx),
            stop,
            thread: Some(thread),
            arena: NodeArena::new(1, values),
            dispatch: None,
            busy: false,
        }
    }

    /// Send a command. A slave that is gone is logged and otherwise ignored;
    /// tasks sent to it are never reported.
    pub fn send(&self, command: SlaveCommand) -> bool {
        let Some(commands) = &self.commands else {
            return false;
        };
        match commands.send(command) {
            Ok(()) => true,
            Err(_) => {
                log::error!("Slave {} is not running", self.id);
                false
            }
        }
    }

    pub fn interrupt(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Mark the slave idle and drop its dispatched child, if any.
    pub fn release(&mut self) {
        if let Some(dispatch) = self.dispatch.take() {
            self.arena.free(dispatch.child);
        }
        self.busy = false;
    }

    /// Close the command channel and wait for the thread to finish.
    pub fn shutdown(&mut self) {
        self.interrupt();
        self.commands.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Slave {} panicked", self.id);
            }
        }
    }
}
