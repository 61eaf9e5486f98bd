// Noise-aware regression classification
//
// A fixed percentage threshold ("flag anything slower by 5%") produces a
// steady stream of false alarms on fast, jittery operations. Here the
// configured threshold is only the starting bar: each entity's bar is raised
// by its observed run-to-run variability (noise floor) and by the
// harness-reported error (uncertainty floor), and a change must additionally
// clear an absolute floor in nanoseconds.
//
// The classifier is a pure function of its inputs: same aggregated
// statistics and configuration, same results, in entity-id order.

mod config;
mod noise_filter;
mod statistics;
mod verdict;

pub use config::{
    ComparisonConfig, ConfigError, Direction, Preset, ENV_ABS_DELTA_NS_FLOOR, ENV_DELTA_MARGIN_PERCENT,
    ENV_ERROR_MULTIPLIER, ENV_NOISE_MULTIPLIER, ENV_THRESHOLD_PERCENT,
};
pub use noise_filter::{cv_percent, noise_floor, uncertainty_floor};
pub use statistics::median;
pub use verdict::{classify, compare, CompareError, ComparisonResult};
