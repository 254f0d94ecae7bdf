//! Numeric warning/critical thresholds

use derive_more::Display;

use crate::Status;

/// Errors from building a threshold pair out of user input
#[derive(Debug, Display, PartialEq)]
pub enum ThresholdError {
    #[display(
        fmt = "warning value ({}) can not be greater than critical value ({})",
        warn,
        crit
    )]
    Inverted { warn: f64, crit: f64 },
    #[display(fmt = "both --warning and --critical must be given, or neither")]
    Partial,
    #[display(fmt = "thresholds must be numbers")]
    NotANumber,
}

impl std::error::Error for ThresholdError {}

/// A (warning, critical) pair, with `warn <= crit`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warn: f64,
    pub crit: f64,
}

impl Thresholds {
    pub fn new(warn: f64, crit: f64) -> Result<Thresholds, ThresholdError> {
        if warn.is_nan() || crit.is_nan() {
            return Err(ThresholdError::NotANumber);
        }
        if warn > crit {
            return Err(ThresholdError::Inverted { warn, crit });
        }
        Ok(Thresholds { warn, crit })
    }

    /// Build thresholds from optional command line values
    ///
    /// Either both are given or neither is, in which case each check falls
    /// back to its own defaults.
    pub fn from_args(
        warn: Option<f64>,
        crit: Option<f64>,
    ) -> Result<Option<Thresholds>, ThresholdError> {
        match (warn, crit) {
            (Some(warn), Some(crit)) => Thresholds::new(warn, crit).map(Some),
            (None, None) => Ok(None),
            _ => Err(ThresholdError::Partial),
        }
    }

    /// Classify a single measurement
    ///
    /// Below `warn` is ok, anything from `warn` to `crit` inclusive is a
    /// warning and above `crit` is critical. Only values that compare false
    /// to everything (NaN) end up unknown.
    pub fn classify(&self, value: f64) -> Status {
        if value < self.warn {
            Status::Ok
        } else if value >= self.warn && value <= self.crit {
            Status::Warning
        } else if value > self.crit {
            Status::Critical
        } else {
            Status::Unknown
        }
    }
}
