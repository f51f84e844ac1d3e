//! Parallel search: a master engine that hands subtrees to slave engines,
//! each running on its own thread.

mod pool;
mod slave;

use std::sync::{atomic::Ordering, mpsc::Sender, Arc};

use cozy_chess::Board;
use evaluation::Evaluator;

use crate::{
    engine::Engine,
    interface::{SearchEngine, SearchOutcome, SearchRequest, StopHandle},
    telemetry::SearchReport,
    transposition::TranspositionTable,
    EngineConfig,
};

use pool::SlavePool;
use slave::SlaveCommand;

pub struct ParallelSearch {
    master: Engine,
    pool: SlavePool,
}

impl ParallelSearch {
    /// A master with `slaves` helper threads, at least one.
    pub fn new(config: &EngineConfig, evaluator: Box<dyn Evaluator>, slaves: usize) -> Self {
        // tables are sized below, once the split is known
        let mut unsized_config = config.clone();
        unsized_config.hash_size_mb.value = 0;
        unsized_config.eval_cache_mb.value = 0;

        let mut master = Engine::new(&unsized_config, evaluator);
        master.config = config.clone();

        let pool = SlavePool::new(slaves.max(1), config, &*master.evaluator, master.values);
        let mut instance = Self { master, pool };

        instance.configure_table(config.hash_bytes());
        instance.configure_eval_cache(config.eval_cache_bytes());
        log::info!("{} ready", instance.name());

        instance
    }

    pub fn slaves(&self) -> usize {
        self.pool.len()
    }

    /// Split `bytes` between the master table and the slave tables.
    fn split_tables(&mut self, bytes: usize) {
        let config = &self.master.config;
        if bytes == 0 {
            self.master.table = None;
            self.pool.broadcast(|| SlaveCommand::SetTable(None));
            return;
        }

        let master_bytes = bytes / (self.pool.len() + 1);
        self.master.table = Some(Arc::new(TranspositionTable::with_bytes(
            master_bytes,
            config.parallel_hash_pvtable.value,
        )));

        let with_pv = config.hash_pvtable.value;
        if config.parallel_shared_hash.value {
            let shared = Arc::new(TranspositionTable::with_bytes(bytes - master_bytes, with_pv));
            self.pool
                .broadcast(|| SlaveCommand::SetTable(Some(Arc::clone(&shared))));
        } else {
            self.pool.broadcast(|| {
                SlaveCommand::SetTable(Some(Arc::new(TranspositionTable::with_bytes(
                    master_bytes,
                    with_pv,
                ))))
            });
        }
    }

    /// Evaluation happens almost only on the slaves, so they share the
    /// whole cache budget.
    fn configure_eval_cache(&mut self, bytes: usize) {
        let per_slave = bytes / self.pool.len();
        self.master.evaluator.set_cache_size(0);
        self.pool
            .broadcast(|| SlaveCommand::SetEvalCache(per_slave));
    }
}

impl SearchEngine for ParallelSearch {
    fn name(&self) -> String {
        format!("{} with {} slaves", self.master.name(), self.pool.len())
    }

    fn start(&mut self, request: SearchRequest, sink: Option<Sender<SearchReport>>) -> SearchOutcome {
        self.master.stop.store(false, Ordering::Relaxed);
        for slave in self.pool.handles() {
            slave.stop.store(false, Ordering::Relaxed);
        }
        self.master.run(&mut self.pool, request, sink)
    }

    fn interrupt(&self) {
        self.stop_handle().stop();
    }

    fn stop_handle(&self) -> StopHandle {
        let mut flags = vec![self.master.stop_flag()];
        flags.extend(self.pool.handles().iter().map(|s| Arc::clone(&s.stop)));
        StopHandle::new(flags)
    }

    fn configure(&mut self, config: &EngineConfig) {
        let old = std::mem::replace(&mut self.master.config, config.clone());
        self.pool
            .broadcast(|| SlaveCommand::Configure(Box::new(config.clone())));

        if old.hash_size_mb.value != config.hash_size_mb.value
            || old.hash_pvtable.value != config.hash_pvtable.value
            || old.parallel_hash_pvtable.value != config.parallel_hash_pvtable.value
            || old.parallel_shared_hash.value != config.parallel_shared_hash.value
        {
            self.split_tables(config.hash_bytes());
        }
        if old.eval_cache_mb.value != config.eval_cache_mb.value {
            self.configure_eval_cache(config.eval_cache_bytes());
        }
    }

    fn configure_table(&mut self, bytes: usize) {
        self.split_tables(bytes);
    }

    fn clear_tables(&mut self) {
        self.master.clear_tables();
        self.pool.broadcast(|| SlaveCommand::Clear);
    }

    fn search(&mut self, board: &Board, history: &[u64], depth: i32, alpha: i32, beta: i32) -> i32 {
        self.master
            .search_position(&mut self.pool, board.clone(), history.to_vec(), depth, alpha, beta)
    }
}
