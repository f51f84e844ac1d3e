use evaluation::MaterialEvaluator;
use search::{Engine, EngineConfig, ParallelSearch, SearchEngine};

/// One thread searches on the caller's thread. With more, the caller's
/// thread is the parallel master and the rest become its slaves.
pub fn create_engine(config: &EngineConfig, threads: usize) -> Box<dyn SearchEngine> {
    let threads = if threads == 0 { num_cpus::get() } else { threads };
    let evaluator = Box::new(MaterialEvaluator::default());

    if threads <= 1 {
        Box::new(Engine::new(config, evaluator))
    } else {
        Box::new(ParallelSearch::new(config, evaluator, threads - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.hash_size_mb.value = 1;
        config
    }

    #[test]
    fn test_single_thread_is_sequential() {
        let engine = create_engine(&small_config(), 1);
        assert!(!engine.name().contains("slaves"));
    }

    #[test]
    fn test_threads_include_the_master() {
        let engine = create_engine(&small_config(), 3);
        assert!(engine.name().ends_with("with 2 slaves"));
    }
}
