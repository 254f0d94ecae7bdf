//! Check the state of systemd services on RHV hosts over ssh
//!
//! Hosts usually have several NICs, some of them on networks the monitoring
//! server can't reach (storage, migration, VM networks), and some of them
//! reported more than once. Only addresses on the management subnet are
//! tried, one at a time, until one of them accepts the connection.

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::io::{self, Read};
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::time::Duration;

use derive_more::From;
use regex::Regex;
use ssh2::Session;
use tracing::{debug, info, warn, Span};

use crate::rhv::{ApiError, HostNic, Inventory};

/// Service name -> text that must appear in `systemctl status <service>`
pub type Services = BTreeMap<String, String>;

/// Parse services from the command line
///
/// ```
/// let services = rhv_plugins::probe::parse_services(
///     r#"{"vdsmd": "Active: active (running)"}"#,
/// ).unwrap();
/// assert_eq!(services["vdsmd"], "Active: active (running)");
/// ```
pub fn parse_services(raw: &str) -> Result<Services, serde_json::Error> {
    serde_json::from_str(raw)
}

#[derive(Debug, From)]
pub enum ProbeError {
    Io(io::Error),
    Ssh(ssh2::Error),
    Api(ApiError),
    Pattern(regex::Error),
    /// None of the host's candidate addresses accepted a connection
    #[from(ignore)]
    Unreachable {
        host: String,
        last_error: Option<String>,
    },
    #[from(ignore)]
    InvalidAddress(String),
    #[from(ignore)]
    InvalidService(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProbeError::Io(e) => write!(f, "{}", e),
            ProbeError::Ssh(e) => write!(f, "ssh error: {}", e),
            ProbeError::Api(e) => write!(f, "{}", e),
            ProbeError::Pattern(e) => write!(f, "{}", e),
            ProbeError::Unreachable { host, last_error } => {
                write!(f, "timed out connecting to {}: no reachable address", host)?;
                if let Some(e) = last_error {
                    write!(f, " (last error: {})", e)?;
                }
                Ok(())
            }
            ProbeError::InvalidAddress(a) => write!(f, "'{}' is not an ip address", a),
            ProbeError::InvalidService(s) => write!(f, "'{}' is not a valid service name", s),
        }
    }
}

impl std::error::Error for ProbeError {}

pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<hidden>")
            .finish()
    }
}

/// An open remote shell
///
/// Implementations close their connection when dropped.
pub trait RemoteShell {
    /// Run `command` and return everything it wrote to stdout
    fn exec(&mut self, command: &str) -> Result<String, ProbeError>;
}

/// Something that can open a `RemoteShell` to an address
pub trait Connector {
    type Shell: RemoteShell;

    fn connect(&self, address: &str, credentials: &Credentials) -> Result<Self::Shell, ProbeError>;
}

/// Opens password-authenticated ssh sessions
#[derive(Debug, Clone)]
pub struct SshConnector {
    pub port: u16,
    pub timeout: Duration,
}

impl Default for SshConnector {
    fn default() -> SshConnector {
        SshConnector {
            port: 22,
            timeout: Duration::from_secs(60),
        }
    }
}

impl Connector for SshConnector {
    type Shell = SshShell;

    fn connect(&self, address: &str, credentials: &Credentials) -> Result<SshShell, ProbeError> {
        let ip: IpAddr = address
            .parse()
            .map_err(|_| ProbeError::InvalidAddress(address.to_owned()))?;
        let tcp = TcpStream::connect_timeout(&SocketAddr::new(ip, self.port), self.timeout)?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(timeout_millis(self.timeout));
        session.handshake()?;
        let shell = SshShell { session };
        shell
            .session
            .userauth_password(&credentials.user, &credentials.password)?;
        Ok(shell)
    }
}

/// libssh2 takes its timeout as a `u32` of milliseconds
fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

pub struct SshShell {
    session: Session,
}

impl RemoteShell for SshShell {
    fn exec(&mut self, command: &str) -> Result<String, ProbeError> {
        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;
        let mut output = String::new();
        channel.read_to_string(&mut output)?;
        channel.wait_close()?;
        Ok(output)
    }
}

impl Drop for SshShell {
    fn drop(&mut self) {
        if let Err(e) = self.session.disconnect(None, "status probe finished", None) {
            debug!("error closing ssh session: {}", e);
        }
    }
}

/// The addresses of `nics` that are on the management subnet
pub fn candidate_addresses<'a>(nics: &'a [HostNic], subnet_prefix: &str) -> Vec<&'a str> {
    nics.iter()
        .filter_map(HostNic::address)
        .filter(|addr| addr.starts_with(subnet_prefix))
        .collect()
}

/// Try every address in order, returning the first shell that opens
pub fn connect_any<C: Connector>(
    connector: &C,
    host: &str,
    addresses: &[&str],
    credentials: &Credentials,
    span: &Span,
) -> Result<C::Shell, ProbeError> {
    let mut last_error = None;
    for address in addresses {
        match connector.connect(address, credentials) {
            Ok(shell) => {
                debug!(parent: span, host, address, "connected");
                return Ok(shell);
            }
            Err(e) => {
                warn!(parent: span, host, address, "unable to connect: {}", e);
                last_error = Some(e.to_string());
            }
        }
    }
    Err(ProbeError::Unreachable {
        host: host.to_owned(),
        last_error,
    })
}

/// Run `systemctl status` for every service and compare it to the expectation
pub fn probe_services<S: RemoteShell>(
    shell: &mut S,
    services: &Services,
) -> Result<BTreeMap<String, bool>, ProbeError> {
    let valid_name = Regex::new(r"^[A-Za-z0-9@._:-]+$")?;
    let mut result = BTreeMap::new();
    for (service, expected) in services {
        if !valid_name.is_match(service) {
            return Err(ProbeError::InvalidService(service.clone()));
        }
        let output = shell.exec(&format!("systemctl status {}", service))?;
        result.insert(service.clone(), output.contains(expected.as_str()));
    }
    Ok(result)
}

/// host -> service -> whether the service looked as expected
#[derive(Debug, Default, PartialEq)]
pub struct ServicesStatus(BTreeMap<String, BTreeMap<String, bool>>);

impl ServicesStatus {
    pub fn insert(&mut self, host: String, services: BTreeMap<String, bool>) {
        self.0.insert(host, services);
    }

    pub fn host_ok(&self, host: &str) -> bool {
        self.0
            .get(host)
            .map_or(false, |services| services.values().all(|ok| *ok))
    }

    pub fn all_ok(&self) -> bool {
        self.0.keys().all(|host| self.host_ok(host))
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(host, service)` for every service that did not match
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .flat_map(|(host, services)| {
                services
                    .iter()
                    .filter(|(_, ok)| !**ok)
                    .map(move |(service, _)| (host.as_str(), service.as_str()))
            })
            .collect()
    }
}

/// Probe `services` on every host the manager knows about
///
/// A host that can't be reached fails the whole probe.
pub fn probe_hosts<C: Connector>(
    inventory: &dyn Inventory,
    connector: &C,
    credentials: &Credentials,
    services: &Services,
    subnet_prefix: &str,
    span: &Span,
) -> Result<ServicesStatus, ProbeError> {
    let mut status = ServicesStatus::default();
    for host in inventory.list_hosts()? {
        let nics = inventory.list_host_nics(&host)?;
        let addresses = candidate_addresses(&nics, subnet_prefix);
        debug!(parent: span, host = %host.name, ?addresses, "candidate addresses");
        let mut shell = connect_any(connector, &host.name, &addresses, credentials, span)?;
        let host_status = probe_services(&mut shell, services)?;
        drop(shell);
        info!(parent: span, host = %host.name, ?host_status, "probed services");
        status.insert(host.name, host_status);
    }
    Ok(status)
}
