//! Default values shared by the configuration structs.

pub const DEFAULT_N_TREES:                usize = 100;
pub const DEFAULT_BUILDER_THREADS:        usize =   1;
pub const DEFAULT_VALIDATOR_THREADS:      usize =   2;
pub const DEFAULT_SAMPLE_RATIO:             f64 = 1.0;
pub const DEFAULT_SEED:                     u64 = 1234;

pub const DEFAULT_N_NODES:                usize =   2;
pub const DEFAULT_TREES_PER_NODE:         usize =  10;
pub const DEFAULT_VALIDATION_STRIDE:      usize =   3;
pub const DEFAULT_POLL_INTERVAL_MILLIS:     u64 = 1_000;
pub const DEFAULT_MONITOR_INTERVAL_MILLIS:  u64 = 1_000;
pub const DEFAULT_KEY_PREFIX:              &str = "RF_";

pub const DEFAULT_MAX_DEPTH:              usize =  16;
pub const DEFAULT_MIN_SPLIT:              usize =   2;

/// Suffix of the per-node result slot key.
pub const ERROR_SLOT_SUFFIX:               &str = "_error";

pub const PRINT_WIDTH:                    usize =   8;
