use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// What happens when a record violates its expected shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrityMode {
    /// Exclude the offending record from every downstream aggregation and
    /// surface a count of skipped records.
    #[default]
    SkipAndCount,
    /// Abort the run on the first violation.
    Strict,
}

/// Cancellation-latency outlier exclusion, applied before averaging.
///
/// The source data carries implausibly large cancellation times, so the
/// exclusion rule is an explicit, inspectable option rather than a hardcoded
/// filter. Excluded values are treated as absent: the hour/assignment group
/// itself survives with a missing mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "value", rename_all = "kebab-case")]
pub enum OutlierPolicy {
    /// Keep every latency value.
    #[default]
    None,
    /// Drop latencies above an absolute threshold, in seconds.
    MaxSeconds(f64),
    /// Drop latencies more than this many sample standard deviations from
    /// the global latency mean. A no-op when the global standard deviation
    /// is unavailable or zero.
    StdDevsFromMean(f64),
}

impl OutlierPolicy {
    pub fn validate(&self) -> Result<()> {
        match self {
            OutlierPolicy::None => Ok(()),
            OutlierPolicy::MaxSeconds(threshold) => {
                if threshold.is_finite() && *threshold > 0.0 {
                    Ok(())
                } else {
                    Err(PipelineError::InvalidConfig(format!(
                        "outlier threshold must be a positive number of seconds, got {threshold}"
                    )))
                }
            }
            OutlierPolicy::StdDevsFromMean(devs) => {
                if devs.is_finite() && *devs > 0.0 {
                    Ok(())
                } else {
                    Err(PipelineError::InvalidConfig(format!(
                        "outlier standard-deviation multiplier must be positive, got {devs}"
                    )))
                }
            }
        }
    }
}

/// Configuration for one report run. Deserializable from TOML so callers can
/// keep the outlier rule next to the data instead of on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub integrity: IntegrityMode,
    pub outliers: OutlierPolicy,
    /// When set, every absent hour/category combination is reported
    /// explicitly: counts zero-filled, means marked missing.
    pub dense: bool,
}
