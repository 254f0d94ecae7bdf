//! Event handler to restart a service via ansible
//!
//! Requires ansible to be installed on the monitoring server.

use std::path::PathBuf;

use structopt::clap::AppSettings;
use structopt::StructOpt;
use tracing::{error, info, info_span};

use rhv_plugins::eventhandler::{should_restart, Restart, StateType};
use rhv_plugins::logging::{self, LogArgs};
use rhv_plugins::Status;

/// Restart a service via ansible once its check is confirmed critical.
///
/// Restarts if the state is CRITICAL and HARD, or CRITICAL and SOFT on the
/// last attempt before it would become HARD. Does nothing otherwise.
#[derive(StructOpt, Debug)]
#[structopt(
    name = "restart-service (part of rhv-plugins)",
    setting = AppSettings::ColoredHelp,
    after_help = "Example Shinken command definition:

    define command {
        command_name    restart-vdsmd
        command_line    $PLUGINSDIR$/restart-service -H $HOSTNAME$ -S vdsmd \\
                        -s $SERVICESTATE$ -t $SERVICESTATETYPE$ \\
                        -a $SERVICEATTEMPT$ -m $MAXSERVICEATTEMPTS$
    }"
)]
struct Args {
    #[structopt(short = "H", long = "hostname", help = "Hostname of client")]
    hostname: String,
    #[structopt(short = "S", long = "service", help = "Service desired for restart")]
    service: String,
    #[structopt(
        short = "s",
        long = "state",
        help = "State of the check (e.g. 'OK', 'WARNING', 'CRITICAL')"
    )]
    state: Status,
    #[structopt(
        short = "t",
        long = "type",
        help = "Type of the state ('HARD' or 'SOFT')"
    )]
    state_type: StateType,
    #[structopt(short = "a", long = "attempt", help = "Attempt number on the service check")]
    attempt: u32,
    #[structopt(
        short = "m",
        long = "max-attempts",
        default_value = "3",
        help = "Number of max attempts allowed on the service check"
    )]
    max_attempts: u32,
    #[structopt(
        short = "d",
        long = "directory",
        default_value = "/etc/shinken/ansible",
        parse(from_os_str),
        help = "Directory from which to run the command, usually where ansible config files reside."
    )]
    directory: PathBuf,
    #[structopt(long = "ansible", default_value = "ansible", help = "The ansible executable")]
    ansible: String,
    #[structopt(flatten)]
    log: LogArgs,
}

impl Args {
    fn restart(&self) -> Restart {
        Restart {
            program: self.ansible.clone(),
            hostname: self.hostname.clone(),
            service: self.service.clone(),
            directory: self.directory.clone(),
        }
    }
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args: Args = rhv_plugins::args_or_unknown();
    let status = {
        let _log = logging::init_or_stderr(&args.log, "restart-service.log");
        let span = info_span!(
            "restart-service",
            host = %args.hostname,
            service = %args.service,
            state = %args.state,
            state_type = %args.state_type,
            attempt = args.attempt,
        );
        if !should_restart(args.state, args.state_type, args.attempt, args.max_attempts) {
            info!(parent: &span, "nothing to do");
            Status::Ok
        } else {
            match args.restart().run(&span) {
                Ok(output) => {
                    print!("{}", output);
                    Status::Ok
                }
                Err(e) => {
                    error!(parent: &span, "{}", logging::error_chain(&e));
                    println!("UNKNOWN: {}", e);
                    Status::Unknown
                }
            }
        }
    };
    status.exit();
}
