use std::fmt::Display;
use std::str::FromStr;

/// Value domain of a named option.
#[derive(Debug, Clone)]
pub enum OptionKind {
    Spin { min: i64, max: i64 },
    Check,
}

impl OptionKind {
    pub fn validate(&self, value: &str) -> Result<(), String> {
        match self {
            OptionKind::Spin { min, max } => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|e| format!("Invalid integer: {}", e))?;
                if parsed < *min || parsed > *max {
                    return Err(format!("Value {} out of range [{}, {}]", parsed, min, max));
                }
                Ok(())
            }
            OptionKind::Check => match value {
                "true" | "false" => Ok(()),
                _ => Err("Boolean value must be 'true' or 'false'".to_string()),
            },
        }
    }

    pub fn describe<T: Display>(&self, name: &str, current_value: &T) -> String {
        match self {
            OptionKind::Spin { min, max } => format!(
                "{} (spin, {} .. {}) = {}",
                name, min, max, current_value
            ),
            OptionKind::Check => format!("{} (check) = {}", name, current_value),
        }
    }
}

macro_rules! define_config {
    ($(($field:ident: $type:ty, $name:expr, $kind:expr, $default:expr)),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub struct EngineConfig {
            $(pub $field: ConfigParam<$type>,)*
        }

        impl Default for EngineConfig {
            fn default() -> Self {
                Self {
                    $($field: ConfigParam {
                        value: $default,
                        name: $name,
                        kind: $kind,
                    },)*
                }
            }
        }

        impl EngineConfig {
            /// Set an option by name, validating range and type.
            pub fn update(&mut self, name: &str, value: &str) -> Result<(), String> {
                match name {
                    $($name => self.$field.update(value),)*
                    _ => Err(format!("Unknown parameter: {}", name)),
                }
            }

            /// One line per option with its domain and current value.
            pub fn describe(&self) -> Vec<String> {
                vec![$(self.$field.describe(),)*]
            }
        }
    };
}

define_config!(
    // Transposition table
    (hash_size_mb: usize, "Hash", OptionKind::Spin { min: 0, max: 4096 }, 16), // Total table memory, 0 disables tables
    (hash_pvtable: bool, "HashPvTable", OptionKind::Check, false), // Keep PV fragments next to table entries
    (eval_cache_mb: usize, "EvalCache", OptionKind::Spin { min: 0, max: 1024 }, 1),

    // Window handling
    (failsoft: bool, "FailSoft", OptionKind::Check, false), // Return true extremal scores instead of clamping to the window
    (pvs_mode: u8, "PvsMode", OptionKind::Spin { min: 0, max: 2 }, 1), // 0 = off, 1 = after first move, 2 = after alpha improved
    (aspiration_window: i32, "AspirationWindow", OptionKind::Spin { min: 1, max: 1000 }, 50), // Half width around the previous score

    // Null move pruning
    (null_move: bool, "NullMove", OptionKind::Check, true),
    (null_move_reduction: i32, "NullMoveReduction", OptionKind::Spin { min: 1, max: 4 }, 2), // R; the null search runs at depth - R - 1

    // Internal iterative deepening
    (iid: bool, "Iid", OptionKind::Check, true),
    (iid_min_depth: i32, "IidMinDepth", OptionKind::Spin { min: 2, max: 20 }, 3),
    (iid_reduction: i32, "IidReduction", OptionKind::Spin { min: 1, max: 10 }, 2),

    // Razoring
    (razoring: bool, "Razoring", OptionKind::Check, true),
    (razor_depth: i32, "RazorDepth", OptionKind::Spin { min: 1, max: 10 }, 3),
    (razor_margin: i32, "RazorMargin", OptionKind::Spin { min: 0, max: 5000 }, 900),

    // Futility pruning (depth 1) and extended futility pruning (depth 2)
    (futility: bool, "Futility", OptionKind::Check, true),
    (futility_margin: i32, "FutilityMargin", OptionKind::Spin { min: 0, max: 5000 }, 300),
    (ext_futility_margin: i32, "ExtFutilityMargin", OptionKind::Spin { min: 0, max: 5000 }, 500),

    // Time checks and thinking output
    (timecheck_min_ms: u64, "TimecheckMinMs", OptionKind::Spin { min: 0, max: 10000 }, 20), // Double the node interval below this
    (timecheck_max_ms: u64, "TimecheckMaxMs", OptionKind::Spin { min: 0, max: 10000 }, 50), // Halve the node interval above this, 0 checks every node
    (update_interval_ms: u64, "UpdateIntervalMs", OptionKind::Spin { min: 0, max: 600000 }, 5000),

    // Time extension when an iteration is nearly done
    (extend_time: bool, "ExtendTime", OptionKind::Check, true),
    (extend_time_min_percent: u32, "ExtendTimeMinPercent", OptionKind::Spin { min: 0, max: 100 }, 75), // Share of root moves done
    (extend_time_expect_tenths: u32, "ExtendTimeExpectTenths", OptionKind::Spin { min: 1, max: 100 }, 11), // Safety factor on the estimate
    (extend_time_extend_tenths: u32, "ExtendTimeExtendTenths", OptionKind::Spin { min: 1, max: 100 }, 10), // Safety factor on the extension

    // New iteration gate
    (new_iteration_check: bool, "NewIterationCheck", OptionKind::Check, true),
    (new_iteration_expect_tenths: u32, "NewIterationExpectTenths", OptionKind::Spin { min: 1, max: 100 }, 15), // Next iteration vs last one

    // Parallel search
    (parallel_min_depth: i32, "ParallelMinDepth", OptionKind::Spin { min: 1, max: 64 }, 6), // Below this a whole node goes to one slave
    (parallel_min_move_ratio: usize, "ParallelMinMoveRatio", OptionKind::Spin { min: 0, max: 64 }, 2), // Moves per slave needed to split
    (parallel_pvs_mode: u8, "ParallelPvsMode", OptionKind::Spin { min: 0, max: 2 }, 1),
    (parallel_hash_pvtable: bool, "ParallelHashPvTable", OptionKind::Check, false),
    (parallel_shared_hash: bool, "ParallelSharedHash", OptionKind::Check, false),
);

impl EngineConfig {
    pub fn hash_bytes(&self) -> usize {
        self.hash_size_mb.value.saturating_mul(1024 * 1024)
    }

    pub fn eval_cache_bytes(&self) -> usize {
        self.eval_cache_mb.value.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigParam<T> {
    pub value: T,
    pub name: &'static str,
    pub kind: OptionKind,
}

impl<T> ConfigParam<T>
where
    T: FromStr + Display + Clone,
    T::Err: Display,
{
    pub fn update(&mut self, value: &str) -> Result<(), String> {
        self.kind.validate(value)?;

        let new_value = value
            .parse::<T>()
            .map_err(|e| format!("Parse error: {}", e))?;

        self.value = new_value;
        Ok(())
    }

    pub fn describe(&self) -> String {
        self.kind.describe(self.name, &self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.aspiration_window.value, 50);
        assert_eq!(config.parallel_min_depth.value, 6);
        assert_eq!(config.parallel_min_move_ratio.value, 2);
        assert_eq!(config.pvs_mode.value, 1);
        assert!(!config.failsoft.value);
        assert_eq!(config.hash_bytes(), 16 * 1024 * 1024);
    }

    #[test]
    fn test_update_spin() {
        let mut config = EngineConfig::default();
        assert!(config.update("RazorMargin", "700").is_ok());
        assert_eq!(config.razor_margin.value, 700);
    }

    #[test]
    fn test_update_rejects_out_of_range() {
        let mut config = EngineConfig::default();
        let err = config.update("PvsMode", "3").unwrap_err();
        assert!(err.contains("out of range"));
        assert_eq!(config.pvs_mode.value, 1);
    }

    #[test]
    fn test_update_check() {
        let mut config = EngineConfig::default();
        assert!(config.update("FailSoft", "true").is_ok());
        assert!(config.failsoft.value);
        assert!(config.update("FailSoft", "yes").is_err());
    }

    #[test]
    fn test_unknown_option() {
        let mut config = EngineConfig::default();
        assert!(config.update("Bogus", "1").is_err());
    }

    #[test]
    fn test_describe_lists_every_option() {
        let config = EngineConfig::default();
        let lines = config.describe();
        assert!(lines.iter().any(|l| l == "Hash (spin, 0 .. 4096) = 16"));
        assert!(lines.iter().any(|l| l == "NullMove (check) = true"));
    }
}
