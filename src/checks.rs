//! The checks that `check-rhv` can run
//!
//! Every check reads what it needs from an [`Inventory`], classifies it and
//! returns a [`Report`]. Nothing in here prints or exits, that is left to the
//! binary.

use std::fmt;
use std::str::FromStr;

use derive_more::From;
use itertools::Itertools;
use tracing::{debug, info, Span};

use crate::probe::{self, Connector, Credentials, ProbeError, Services};
use crate::report::{Observations, Report};
use crate::rhv::{ApiError, Inventory};
use crate::severity::{self, SeverityTable};
use crate::threshold::{ThresholdError, Thresholds};
use crate::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurement {
    VmCount,
    StorageDomainStatus,
    StorageDomainUsage,
    LockedDisksCount,
    HostsStatus,
    DatacenterStatus,
    ServicesStatus,
}

impl Measurement {
    pub fn all() -> [Measurement; 7] {
        use self::Measurement::*;
        [
            VmCount,
            StorageDomainStatus,
            StorageDomainUsage,
            LockedDisksCount,
            HostsStatus,
            DatacenterStatus,
            ServicesStatus,
        ]
    }

    pub fn name(self) -> &'static str {
        use self::Measurement::*;
        match self {
            VmCount => "vm_count",
            StorageDomainStatus => "storage_domain_status",
            StorageDomainUsage => "storage_domain_usage",
            LockedDisksCount => "locked_disks_count",
            HostsStatus => "hosts_status",
            DatacenterStatus => "datacenter_status",
            ServicesStatus => "services_status",
        }
    }

    /// Thresholds used when none are given on the command line
    ///
    /// `None` for checks that classify with a status table instead.
    pub fn default_thresholds(self) -> Option<Thresholds> {
        use self::Measurement::*;
        match self {
            VmCount => Some(Thresholds {
                warn: 20.0,
                crit: 30.0,
            }),
            LockedDisksCount => Some(Thresholds {
                warn: 5.0,
                crit: 10.0,
            }),
            StorageDomainUsage => Some(Thresholds {
                warn: 0.75,
                crit: 0.9,
            }),
            StorageDomainStatus | HostsStatus | DatacenterStatus | ServicesStatus => None,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measurement {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Measurement, CheckError> {
        Measurement::all()
            .iter()
            .find(|m| m.name() == s)
            .cloned()
            .ok_or_else(|| CheckError::UnknownMeasurement(s.to_owned()))
    }
}

#[derive(Debug, From)]
pub enum CheckError {
    Api(ApiError),
    Probe(ProbeError),
    Threshold(ThresholdError),
    #[from(ignore)]
    UnknownMeasurement(String),
    /// A check was asked for without an option it can't run without
    #[from(ignore)]
    MissingOption {
        measurement: Measurement,
        option: &'static str,
    },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CheckError::Api(e) => write!(f, "{}", e),
            CheckError::Probe(e) => write!(f, "{}", e),
            CheckError::Threshold(e) => write!(f, "{}", e),
            CheckError::UnknownMeasurement(m) => write!(
                f,
                "measurement {} not understood, expected one of: {}",
                m,
                Measurement::all().iter().join(", ")
            ),
            CheckError::MissingOption {
                measurement,
                option,
            } => write!(f, "{} requires {}", measurement, option),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::Api(e) => Some(e),
            CheckError::Probe(e) => Some(e),
            CheckError::Threshold(e) => Some(e),
            _ => None,
        }
    }
}

impl CheckError {
    /// Any error means we don't know the state of the thing being checked
    pub fn into_report(self) -> Report {
        Report::new(Status::Unknown, format!("UNKNOWN: {}", self))
    }
}

/// What to run, as the user asked for it
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub measurement: Measurement,
    pub warning: Option<f64>,
    pub critical: Option<f64>,
}

/// Everything `services_status` needs beyond the inventory
pub struct ProbeOptions<C> {
    pub connector: C,
    pub credentials: Option<Credentials>,
    pub services: Option<Services>,
    pub subnet_prefix: String,
}

/// Validate the request, connect, and run the check
///
/// Thresholds are validated before `connect` is called, so a bad command
/// line never touches the manager.
pub fn execute<I, F, C>(
    request: &CheckRequest,
    connect: F,
    probe: &ProbeOptions<C>,
    span: &Span,
) -> Result<Report, CheckError>
where
    I: Inventory,
    F: FnOnce() -> Result<I, ApiError>,
    C: Connector,
{
    let thresholds = Thresholds::from_args(request.warning, request.critical)?;
    let inventory = connect()?;
    run(request.measurement, &inventory, thresholds, probe, span)
}

/// Run `measurement`, falling back to its default thresholds
pub fn run<C: Connector>(
    measurement: Measurement,
    inventory: &dyn Inventory,
    thresholds: Option<Thresholds>,
    probe: &ProbeOptions<C>,
    span: &Span,
) -> Result<Report, CheckError> {
    use self::Measurement::*;
    let thresholds = thresholds.or_else(|| measurement.default_thresholds());
    debug!(parent: span, ?thresholds, "running check");
    // the table-driven checks ignore thresholds entirely
    let numeric = || thresholds.ok_or(ThresholdError::Partial);
    match measurement {
        VmCount => vm_count(inventory, numeric()?, span),
        LockedDisksCount => locked_disks_count(inventory, numeric()?, span),
        StorageDomainUsage => storage_domain_usage(inventory, numeric()?, span),
        StorageDomainStatus => storage_domain_status(inventory, span),
        HostsStatus => hosts_status(inventory, span),
        DatacenterStatus => datacenter_status(inventory, span),
        ServicesStatus => services_status(inventory, probe, span),
    }
}

fn count_report(what: &str, count: usize, thresholds: Thresholds) -> Report {
    let status = thresholds.classify(count as f64);
    let message = match status {
        Status::Ok => format!(
            "OK: {0} count is less than {1}. {0} count = {2}",
            what, thresholds.warn, count
        ),
        Status::Warning => format!(
            "WARNING: {0} count is between {1} and {2}. {0} count = {3}",
            what, thresholds.warn, thresholds.crit, count
        ),
        Status::Critical => format!(
            "CRITICAL: {0} count is greater than {1}. {0} count = {2}",
            what, thresholds.crit, count
        ),
        Status::Unknown => format!("UNKNOWN: {} count is unknown", what),
    };
    Report::new(status, message)
}

pub fn vm_count(
    inventory: &dyn Inventory,
    thresholds: Thresholds,
    span: &Span,
) -> Result<Report, CheckError> {
    let count = inventory.list_vms()?.len();
    info!(parent: span, count, "counted vms");
    Ok(count_report("VM", count, thresholds))
}

pub fn locked_disks_count(
    inventory: &dyn Inventory,
    thresholds: Thresholds,
    span: &Span,
) -> Result<Report, CheckError> {
    let count = inventory.list_disks(Some("locked"))?.len();
    info!(parent: span, count, "counted locked disks");
    Ok(count_report("locked_disks", count, thresholds))
}

/// A used/total ratio, printed as a percentage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Usage(pub f64);

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_nan() {
            f.write_str("no space reported")
        } else {
            write!(f, "{:.1}%", self.0 * 100.0)
        }
    }
}

pub fn storage_domain_usage(
    inventory: &dyn Inventory,
    thresholds: Thresholds,
    span: &Span,
) -> Result<Report, CheckError> {
    let mut observations = Observations::new("storage_domain");
    for domain in inventory.list_storage_domains()? {
        if domain.is_image() {
            info!(parent: span, "Skipping {} as it is of type image", domain.name);
            continue;
        }
        let usage = domain.usage();
        let status = thresholds.classify(usage);
        debug!(parent: span, domain = %domain.name, usage, %status, "classified");
        observations.push(domain.name, Usage(usage), status);
    }
    Ok(observations.into_report())
}

/// Classify every `(name, vendor status)` pair with `table`
fn table_report<I>(table: &SeverityTable, resources: I, span: &Span) -> Report
where
    I: IntoIterator<Item = (String, Option<String>)>,
{
    let mut observations = Observations::new(table.kind);
    for (name, value) in resources {
        let value = value.unwrap_or_else(|| "unreported".to_owned());
        let status = table.lookup(&value);
        debug!(parent: span, kind = table.kind, %name, %value, %status, "classified");
        observations.push(name, value, status);
    }
    info!(parent: span, kind = table.kind, count = observations.len(), "checked statuses");
    observations.into_report()
}

pub fn storage_domain_status(inventory: &dyn Inventory, span: &Span) -> Result<Report, CheckError> {
    let domains = inventory.list_storage_domains()?;
    Ok(table_report(
        &severity::STORAGE_DOMAIN,
        domains.into_iter().map(|d| (d.name, d.external_status)),
        span,
    ))
}

pub fn hosts_status(inventory: &dyn Inventory, span: &Span) -> Result<Report, CheckError> {
    let hosts = inventory.list_hosts()?;
    Ok(table_report(
        &severity::HOST,
        hosts.into_iter().map(|h| (h.name, h.status)),
        span,
    ))
}

pub fn datacenter_status(inventory: &dyn Inventory, span: &Span) -> Result<Report, CheckError> {
    let data_centers = inventory.list_data_centers()?;
    Ok(table_report(
        &severity::DATA_CENTER,
        data_centers.into_iter().map(|dc| (dc.name, dc.status)),
        span,
    ))
}

pub fn services_status<C: Connector>(
    inventory: &dyn Inventory,
    options: &ProbeOptions<C>,
    span: &Span,
) -> Result<Report, CheckError> {
    let missing = |option| CheckError::MissingOption {
        measurement: Measurement::ServicesStatus,
        option,
    };
    let services = options.services.as_ref().ok_or_else(|| missing("--services"))?;
    let credentials = options
        .credentials
        .as_ref()
        .ok_or_else(|| missing("--ssh-password"))?;
    let status = probe::probe_hosts(
        inventory,
        &options.connector,
        credentials,
        services,
        &options.subnet_prefix,
        span,
    )?;

    let hosts = status.hosts().join(", ");
    if status.all_ok() {
        Ok(Report::new(
            Status::Ok,
            format!(
                "OK: all services ({}) are in the expected state on all host(s): {}",
                services.keys().join(", "),
                if hosts.is_empty() { "(none)" } else { hosts.as_str() }
            ),
        ))
    } else {
        Ok(Report::new(
            Status::Critical,
            format!(
                "CRITICAL: the following service(s) are not in the expected state: {}\n\
                 Expected: {}",
                status
                    .failures()
                    .iter()
                    .map(|(host, service)| format!("{}: {}", host, service))
                    .join(", "),
                services
                    .iter()
                    .map(|(service, expected)| format!("{} ({})", service, expected))
                    .join(", ")
            ),
        ))
    }
}
