//! Check a Red Hat Virtualization manager and the hosts it manages

use std::time::Duration;

use structopt::clap::AppSettings;
use structopt::StructOpt;
use tracing::{error, info, info_span, Span};

use rhv_plugins::checks::{self, CheckError, CheckRequest, Measurement, ProbeOptions};
use rhv_plugins::logging::{self, LogArgs};
use rhv_plugins::probe::{parse_services, Credentials, Services, SshConnector};
use rhv_plugins::report::Report;
use rhv_plugins::rhv::{Client, ClientOptions};

/// Check a Red Hat Virtualization manager and the hosts it manages
///
/// Runs one measurement against the RHV API, prints what it found and exits
/// 0, 1, 2 or 3 for ok, warning, critical or unknown.
#[derive(StructOpt, Debug)]
#[structopt(
    name = "check-rhv (part of rhv-plugins)",
    setting = AppSettings::ColoredHelp,
    after_help = "Measurements:

    vm_count                Number of VMs.                   [default: -w 20 -c 30]
    locked_disks_count      Number of locked disks.          [default: -w 5 -c 10]
    storage_domain_usage    Fraction of each storage domain
                            that is used. Image domains are
                            skipped.                         [default: -w 0.75 -c 0.9]
    storage_domain_status   External status of each storage domain.
    hosts_status            Status of each host.
    datacenter_status       Status of each data center.
    services_status         Status of systemd services on each host, over ssh.
                            Requires --services and --ssh-password.

    Warning and critical must be given together, or not at all. A value is a
    warning from the warning threshold up to and including the critical
    threshold, and critical above it.

Examples:

    check-rhv -R rhvm.example.com -u admin@internal -p secret -m vm_count -w 50 -c 80

    check-rhv -R rhvm.example.com -u admin@internal -p secret -m services_status \\
        --ssh-password hunter2 \\
        --services '{\"vdsmd\": \"Active: active (running)\", \"ovirt-ha-agent\": \"Active: active (running)\"}'"
)]
struct Args {
    #[structopt(
        short = "R",
        long = "rhv-manager-url",
        env = "RHV_MANAGER_URL",
        help = "Host name or url of the RHV manager"
    )]
    rhvm: String,
    #[structopt(
        short = "u",
        long = "user",
        env = "RHV_USER",
        help = "API user, e.g. admin@internal"
    )]
    user: String,
    #[structopt(
        short = "p",
        long = "password",
        env = "RHV_PASSWORD",
        hide_env_values = true,
        help = "API password"
    )]
    password: String,
    #[structopt(
        short = "m",
        long = "measurement",
        help = "Type of measurement to carry out, see below"
    )]
    measurement: Measurement,
    #[structopt(
        short = "w",
        long = "warning",
        help = "Warning value. Could be fraction or whole number."
    )]
    warning: Option<f64>,
    #[structopt(
        short = "c",
        long = "critical",
        help = "Critical value. Could be fraction or whole number."
    )]
    critical: Option<f64>,
    #[structopt(
        long = "services",
        parse(try_from_str = parse_services),
        help = "JSON object of service name to text expected in its `systemctl status`"
    )]
    services: Option<Services>,
    #[structopt(long = "ssh-user", default_value = "root", help = "User to ssh to hosts as")]
    ssh_user: String,
    #[structopt(
        long = "ssh-password",
        env = "RHV_SSH_PASSWORD",
        hide_env_values = true,
        help = "Password to ssh to hosts with"
    )]
    ssh_password: Option<String>,
    #[structopt(
        long = "subnet-prefix",
        default_value = "10.",
        help = "Only ssh to host addresses starting with this"
    )]
    subnet_prefix: String,
    #[structopt(
        long = "ssh-timeout",
        default_value = "60",
        help = "Seconds to wait for each ssh connection"
    )]
    ssh_timeout: u64,
    #[structopt(long = "insecure", help = "Don't verify the manager's TLS certificate")]
    insecure: bool,
    #[structopt(long = "timeout", default_value = "30", help = "Seconds to wait for the API")]
    timeout: u64,
    #[structopt(flatten)]
    log: LogArgs,
}

impl Args {
    fn request(&self) -> CheckRequest {
        CheckRequest {
            measurement: self.measurement,
            warning: self.warning,
            critical: self.critical,
        }
    }

    fn probe_options(&self) -> ProbeOptions<SshConnector> {
        ProbeOptions {
            connector: SshConnector {
                port: 22,
                timeout: Duration::from_secs(self.ssh_timeout),
            },
            credentials: self.ssh_password.as_ref().map(|password| Credentials {
                user: self.ssh_user.clone(),
                password: password.clone(),
            }),
            services: self.services.clone(),
            subnet_prefix: self.subnet_prefix.clone(),
        }
    }
}

fn check(args: &Args, span: &Span) -> Result<Report, CheckError> {
    let options = ClientOptions {
        insecure: args.insecure,
        timeout: Duration::from_secs(args.timeout),
    };
    checks::execute(
        &args.request(),
        || Client::new(&args.rhvm, &args.user, &args.password, &options),
        &args.probe_options(),
        span,
    )
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args: Args = rhv_plugins::args_or_unknown();
    // the log guard has to be dropped before exiting, or buffered lines are lost
    let status = {
        let _log = logging::init_or_stderr(&args.log, "check-rhv.log");
        let span = info_span!("check-rhv", measurement = %args.measurement, manager = %args.rhvm);
        let report = check(&args, &span).unwrap_or_else(|e| {
            error!(parent: &span, "check failed: {}", logging::error_chain(&e));
            e.into_report()
        });
        info!(parent: &span, status = %report.status, "{}", report.message);
        println!("{}", report.message);
        report.status
    };
    status.exit();
}

#[cfg(test)]
mod test {
    use structopt::StructOpt;

    use super::*;

    fn build_args(extra: &[&str]) -> Args {
        let mut argv = vec![
            "check-rhv",
            "-R",
            "rhvm.example.com",
            "-u",
            "admin@internal",
            "-p",
            "secret",
        ];
        argv.extend_from_slice(extra);
        Args::from_iter(argv.into_iter())
    }

    #[test]
    fn thresholds_are_optional() {
        let args = build_args(&["-m", "vm_count"]);
        assert_eq!(args.measurement, Measurement::VmCount);
        assert_eq!(args.warning, None);
        assert_eq!(args.critical, None);
        assert_eq!(args.ssh_user, "root");
        assert_eq!(args.subnet_prefix, "10.");
        assert!(!args.log.local);
    }

    #[test]
    fn parses_thresholds() {
        let args = build_args(&["-m", "storage_domain_usage", "-w", "0.8", "-c", "0.95"]);
        let request = args.request();
        assert_eq!(request.warning, Some(0.8));
        assert_eq!(request.critical, Some(0.95));
    }

    #[test]
    fn unknown_measurement_is_rejected() {
        let mut argv = vec!["check-rhv", "-R", "r", "-u", "u", "-p", "p"];
        argv.extend_from_slice(&["-m", "system_ping_vms"]);
        let err = Args::from_iter_safe(argv.into_iter()).err().unwrap();
        assert!(err.message.contains("measurement system_ping_vms not understood"));
    }

    #[test]
    fn parses_services() {
        let args = build_args(&[
            "-m",
            "services_status",
            "--ssh-password",
            "hunter2",
            "--services",
            r#"{"vdsmd": "Active: active (running)", "ovirt-ha-agent": "Active: active (running)"}"#,
            "--local",
        ]);
        let probe = args.probe_options();
        let services = probe.services.unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services["ovirt-ha-agent"], "Active: active (running)");
        let credentials = probe.credentials.unwrap();
        assert_eq!(credentials.user, "root");
        assert_eq!(credentials.password, "hunter2");
        assert!(args.log.local);
    }

    #[test]
    fn invalid_services_json_is_rejected() {
        let mut argv = vec!["check-rhv", "-R", "r", "-u", "u", "-p", "p", "-m", "services_status"];
        argv.extend_from_slice(&["--services", "vdsmd=running"]);
        assert!(Args::from_iter_safe(argv.into_iter()).is_err());
    }

    #[test]
    fn inverted_thresholds_are_unknown_before_connecting() {
        let args = build_args(&["-m", "vm_count", "-w", "0.9", "-c", "0.75"]);
        let report = check(&args, &Span::none()).unwrap_err().into_report();
        assert_eq!(report.status.code(), 3);
    }
}
