//! Talk to an RHV manager
//!
//! [`Inventory`] is everything the checks need to read from the manager.
//! [`Client`] implements it on top of the REST API at
//! `https://<manager>/ovirt-engine/api/`.

use std::fmt;
use std::time::Duration;

use derive_more::From;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

mod types;

pub use self::types::{DataCenter, Disk, Host, HostNic, Ip, StorageDomain, Vm};
use self::types::{DataCenters, Disks, HostNics, Hosts, StorageDomains, Vms};

/// Read access to the collections of an RHV manager
pub trait Inventory {
    fn list_vms(&self) -> Result<Vec<Vm>, ApiError>;
    /// Disks, optionally only those in the given status (e.g. `locked`)
    fn list_disks(&self, status: Option<&str>) -> Result<Vec<Disk>, ApiError>;
    fn list_storage_domains(&self) -> Result<Vec<StorageDomain>, ApiError>;
    fn list_hosts(&self) -> Result<Vec<Host>, ApiError>;
    fn list_host_nics(&self, host: &Host) -> Result<Vec<HostNic>, ApiError>;
    fn list_data_centers(&self) -> Result<Vec<DataCenter>, ApiError>;
}

#[derive(Debug, From)]
pub enum ApiError {
    Http(reqwest::Error),
    InvalidUrl(url::ParseError),
    #[from(ignore)]
    Status { status: StatusCode, url: Url },
    #[from(ignore)]
    Json { url: Url, error: serde_json::Error },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "error talking to the RHV manager: {}", e),
            ApiError::InvalidUrl(e) => write!(f, "invalid RHV manager url: {}", e),
            ApiError::Status { status, url } => {
                write!(f, "RHV manager returned {} for {}", status, url)
            }
            ApiError::Json { url, error } => {
                write!(f, "RHV manager returned invalid json for {}: {}", url, error)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Http(e) => Some(e),
            ApiError::InvalidUrl(e) => Some(e),
            ApiError::Json { error, .. } => Some(error),
            ApiError::Status { .. } => None,
        }
    }
}

/// The API root for a manager given either as a bare host name or as a url
///
/// ```
/// let url = rhv_plugins::rhv::api_url("rhvm.example.com").unwrap();
/// assert_eq!(url.as_str(), "https://rhvm.example.com/ovirt-engine/api/");
/// ```
pub fn api_url(manager: &str) -> Result<Url, ApiError> {
    let mut url = if manager.contains("://") {
        Url::parse(manager)?
    } else {
        Url::parse(&format!("https://{}", manager.trim_end_matches('/')))?
    };
    if !url.path().trim_end_matches('/').ends_with("/ovirt-engine/api") {
        let path = format!("{}/ovirt-engine/api", url.path().trim_end_matches('/'));
        url.set_path(&path);
    }
    // join() drops the last segment unless the base ends in a slash
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Accept self-signed certificates
    pub insecure: bool,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> ClientOptions {
        ClientOptions {
            insecure: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A blocking client for the RHV REST API
pub struct Client {
    http: HttpClient,
    base: Url,
    user: String,
    password: String,
}

impl Client {
    pub fn new(
        manager: &str,
        user: &str,
        password: &str,
        options: &ClientOptions,
    ) -> Result<Client, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("Version", HeaderValue::from_static("4"));
        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure)
            .build()?;
        Ok(Client {
            http,
            base: api_url(manager)?,
            user: user.to_owned(),
            password: password.to_owned(),
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        let mut url = self.base.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        debug!(url = %url, "querying RHV manager");
        let response = self
            .http
            .get(url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status, url });
        }
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|error| ApiError::Json { url, error })
    }
}

impl Inventory for Client {
    fn list_vms(&self) -> Result<Vec<Vm>, ApiError> {
        Ok(self.get::<Vms>("vms", &[])?.vm)
    }

    fn list_disks(&self, status: Option<&str>) -> Result<Vec<Disk>, ApiError> {
        let search = status.map(|s| format!("status={}", s));
        let query: Vec<(&str, &str)> = search.iter().map(|s| ("search", s.as_str())).collect();
        Ok(self.get::<Disks>("disks", &query)?.disk)
    }

    fn list_storage_domains(&self) -> Result<Vec<StorageDomain>, ApiError> {
        Ok(self.get::<StorageDomains>("storagedomains", &[])?.storage_domain)
    }

    fn list_hosts(&self) -> Result<Vec<Host>, ApiError> {
        Ok(self.get::<Hosts>("hosts", &[])?.host)
    }

    fn list_host_nics(&self, host: &Host) -> Result<Vec<HostNic>, ApiError> {
        let path = format!("hosts/{}/nics", host.id);
        Ok(self.get::<HostNics>(&path, &[])?.host_nic)
    }

    fn list_data_centers(&self) -> Result<Vec<DataCenter>, ApiError> {
        Ok(self.get::<DataCenters>("datacenters", &[])?.data_center)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn api_url_from_host_name() {
        assert_eq!(
            api_url("rhvm.example.com").unwrap().as_str(),
            "https://rhvm.example.com/ovirt-engine/api/"
        );
    }

    #[test]
    fn api_url_keeps_scheme_and_port() {
        assert_eq!(
            api_url("http://rhvm.example.com:8080").unwrap().as_str(),
            "http://rhvm.example.com:8080/ovirt-engine/api/"
        );
    }

    #[test]
    fn api_url_accepts_full_api_path() {
        assert_eq!(
            api_url("https://rhvm.example.com/ovirt-engine/api").unwrap().as_str(),
            "https://rhvm.example.com/ovirt-engine/api/"
        );
        assert_eq!(
            api_url("https://rhvm.example.com/ovirt-engine/api/").unwrap().as_str(),
            "https://rhvm.example.com/ovirt-engine/api/"
        );
    }

    #[test]
    fn api_url_joins_collections() {
        let base = api_url("rhvm").unwrap();
        assert_eq!(
            base.join("hosts/123/nics").unwrap().as_str(),
            "https://rhvm/ovirt-engine/api/hosts/123/nics"
        );
    }

    #[test]
    fn api_url_rejects_garbage() {
        match api_url("https://") {
            Err(ApiError::InvalidUrl(_)) => {}
            other => panic!("expected an invalid url, got {:?}", other),
        }
    }
}
