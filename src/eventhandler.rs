//! Restart a service when its check goes critical
//!
//! Shinken calls event handlers on every state change and on every soft
//! retry. We only act once the failure is confirmed: either the state is
//! already hard, or this is the last soft attempt before it would become
//! hard and notify a human.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::str::FromStr;

use derive_more::From;
use tracing::{info, Span};

use crate::Status;

/// Whether a state has been confirmed by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateType {
    Soft,
    Hard,
}

impl FromStr for StateType {
    type Err = String;

    fn from_str(s: &str) -> Result<StateType, String> {
        match s.to_ascii_uppercase().as_ref() {
            "SOFT" => Ok(StateType::Soft),
            "HARD" => Ok(StateType::Hard),
            _ => Err(format!("'{}' is not a state type, expected SOFT or HARD", s)),
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StateType::Soft => f.write_str("SOFT"),
            StateType::Hard => f.write_str("HARD"),
        }
    }
}

/// Decide whether to restart
///
/// ```
/// use rhv_plugins::eventhandler::{should_restart, StateType};
/// use rhv_plugins::Status;
///
/// assert!(should_restart(Status::Critical, StateType::Hard, 1, 3));
/// assert!(should_restart(Status::Critical, StateType::Soft, 3, 3));
/// assert!(!should_restart(Status::Critical, StateType::Soft, 2, 3));
/// assert!(!should_restart(Status::Warning, StateType::Hard, 3, 3));
/// ```
pub fn should_restart(
    state: Status,
    state_type: StateType,
    attempt: u32,
    max_attempts: u32,
) -> bool {
    match (state, state_type) {
        (Status::Critical, StateType::Hard) => true,
        (Status::Critical, StateType::Soft) => attempt >= max_attempts,
        _ => false,
    }
}

#[derive(Debug, From)]
pub enum RestartError {
    /// The automation tool could not be started at all
    Spawn(io::Error),
    #[from(ignore)]
    Failed { status: ExitStatus, stderr: String },
}

impl fmt::Display for RestartError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RestartError::Spawn(e) => write!(f, "unable to run restart command: {}", e),
            RestartError::Failed { status, stderr } => {
                write!(f, "restart command failed ({}): {}", status, stderr.trim())
            }
        }
    }
}

impl std::error::Error for RestartError {}

/// A service restart through ansible's `service` module
#[derive(Debug, Clone)]
pub struct Restart {
    /// The ansible executable
    pub program: String,
    pub hostname: String,
    pub service: String,
    /// Where ansible's inventory and config live
    pub directory: PathBuf,
}

impl Restart {
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.hostname)
            .args(&["-m", "service", "-a"])
            .arg(format!("name={} state=restarted", self.service))
            .current_dir(&self.directory);
        cmd
    }

    /// Run the restart, returning what the tool printed
    pub fn run(&self, span: &Span) -> Result<String, RestartError> {
        info!(parent: span, host = %self.hostname, service = %self.service, "restarting service");
        let output = self.command().output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            return Err(RestartError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        info!(parent: span, "restart finished");
        Ok(stdout)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn restarts_on_hard_critical() {
        for attempt in 0..5 {
            assert!(should_restart(Status::Critical, StateType::Hard, attempt, 3));
        }
    }

    #[test]
    fn restarts_on_last_soft_critical() {
        assert!(should_restart(Status::Critical, StateType::Soft, 3, 3));
        assert!(should_restart(Status::Critical, StateType::Soft, 4, 3));
        assert!(!should_restart(Status::Critical, StateType::Soft, 2, 3));
        assert!(!should_restart(Status::Critical, StateType::Soft, 0, 3));
    }

    #[test]
    fn never_restarts_on_other_states() {
        for state in &[Status::Ok, Status::Warning, Status::Unknown] {
            for state_type in &[StateType::Soft, StateType::Hard] {
                for attempt in 0..5 {
                    assert!(!should_restart(*state, *state_type, attempt, 3));
                }
            }
        }
    }

    #[test]
    fn parses_state_types() {
        assert_eq!("HARD".parse(), Ok(StateType::Hard));
        assert_eq!("soft".parse(), Ok(StateType::Soft));
        assert!("FIRM".parse::<StateType>().is_err());
    }

    fn restart(program: &str) -> Restart {
        Restart {
            program: program.into(),
            hostname: "hv1.example.com".into(),
            service: "vdsmd".into(),
            directory: std::env::temp_dir(),
        }
    }

    #[test]
    fn builds_ansible_command() {
        let cmd = restart("ansible").command();
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "hv1.example.com",
                "-m",
                "service",
                "-a",
                "name=vdsmd state=restarted"
            ]
        );
        assert_eq!(cmd.get_program(), "ansible");
    }

    #[cfg(unix)]
    #[test]
    fn captures_output() {
        let out = restart("echo").run(&Span::none()).unwrap();
        assert_eq!(
            out,
            "hv1.example.com -m service -a name=vdsmd state=restarted\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_is_an_error() {
        match restart("false").run(&Span::none()) {
            Err(RestartError::Failed { status, .. }) => assert!(!status.success()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failure_carries_only_stderr() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let script = std::env::temp_dir().join(format!("fake-ansible-{}", std::process::id()));
        fs::write(&script, "#!/bin/sh\necho changed\necho 'host unreachable' >&2\nexit 4\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let result = restart(&script.to_string_lossy()).run(&Span::none());
        fs::remove_file(&script).unwrap();
        match result {
            Err(RestartError::Failed { status, stderr }) => {
                assert_eq!(status.code(), Some(4));
                assert_eq!(stderr, "host unreachable\n");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_tool_is_an_error() {
        match restart("/nonexistent/ansible").run(&Span::none()) {
            Err(RestartError::Spawn(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
