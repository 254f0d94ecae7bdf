//! rhv-plugins: Nagios/Shinken check plugins for Red Hat Virtualization
//!
//! Every check reads one or more values from an RHV manager, classifies them
//! against thresholds (or a fixed table of vendor statuses), prints a single
//! status message and exits with the status code that the monitoring
//! scheduler understands.
//!
//! The binaries are thin wrappers around this library:
//!
//! * `check-rhv` dispatches to one of the functions in [`checks`]
//! * `restart-service` is an event handler, see [`eventhandler`]
//!
//! See the [`scripts`] module for their command line usage.

use std::fmt;
use std::process;
use std::str::FromStr;

use structopt::clap::ErrorKind;
use structopt::StructOpt;

pub mod checks;
pub mod eventhandler;
pub mod logging;
pub mod probe;
pub mod report;
pub mod rhv;
pub mod scripts;
pub mod severity;
pub mod threshold;

/// Shinken/Nagios exit statuses
///
/// Variant order is alert precedence: critical > warning > unknown > ok, so
/// `max` over a set of statuses gives the one to report.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Ok,
    Unknown,
    Warning,
    Critical,
}

impl Status {
    /// The process exit code the scheduler expects for this status
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    pub fn str_values() -> [&'static str; 4] {
        ["ok", "warning", "critical", "unknown"]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, PartialEq)]
pub struct ParseStatusError(String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid state, expected one of: {}",
            self.0,
            Status::str_values().join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for Status {
    type Err = ParseStatusError;

    /// Case insensitive, the scheduler hands us `CRITICAL` while humans type
    /// `critical`
    fn from_str(s: &str) -> Result<Status, ParseStatusError> {
        match s.to_ascii_lowercase().as_ref() {
            "ok" => Ok(Status::Ok),
            "warning" | "warn" => Ok(Status::Warning),
            "critical" | "crit" => Ok(Status::Critical),
            "unknown" => Ok(Status::Unknown),
            _ => Err(ParseStatusError(s.to_owned())),
        }
    }
}

/// Parse the command line, exiting UNKNOWN on bad arguments
///
/// clap exits 1 on errors, which the scheduler would read as WARNING.
pub fn args_or_unknown<A: StructOpt>() -> A {
    A::from_iter_safe(std::env::args_os()).unwrap_or_else(|e| match e.kind {
        ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => {
            println!("{}", e.message);
            Status::Ok.exit()
        }
        _ => {
            println!("UNKNOWN: {}", e.message);
            Status::Unknown.exit()
        }
    })
}

#[cfg(test)]
mod test {
    use super::Status;

    #[test]
    fn exit_codes_match_the_scheduler_contract() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::Warning.code(), 1);
        assert_eq!(Status::Critical.code(), 2);
        assert_eq!(Status::Unknown.code(), 3);
    }

    #[test]
    fn max_is_most_severe() {
        use std::cmp::max;
        assert_eq!(max(Status::Unknown, Status::Warning), Status::Warning);
        assert_eq!(max(Status::Ok, Status::Unknown), Status::Unknown);
        assert_eq!(max(Status::Critical, Status::Warning), Status::Critical);
    }

    #[test]
    fn parses_scheduler_states() {
        assert_eq!("CRITICAL".parse(), Ok(Status::Critical));
        assert_eq!("warn".parse(), Ok(Status::Warning));
        assert_eq!("Ok".parse(), Ok(Status::Ok));
        assert!("PENDING".parse::<Status>().is_err());
    }
}
