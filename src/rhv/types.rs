//! The parts of the RHV API object model that the checks look at
//!
//! The API wraps every collection in an object keyed by the singular type
//! name (`{"vm": [...]}`) and leaves the key out entirely when the collection
//! is empty. Large numbers are sent as JSON strings.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Vm {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Disk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct StorageDomain {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// `data`, `iso`, `export`, `image`, ...
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub external_status: Option<String>,
    /// Bytes used
    #[serde(default, deserialize_with = "string_or_number")]
    pub used: Option<u64>,
    /// Bytes free
    #[serde(default, deserialize_with = "string_or_number")]
    pub available: Option<u64>,
}

impl StorageDomain {
    pub fn is_image(&self) -> bool {
        self.kind
            .as_ref()
            .map_or(false, |k| k.eq_ignore_ascii_case("image"))
    }

    /// Fraction of the domain that is used
    ///
    /// NaN unless RHV reports both used and available space, and some of it
    /// exists.
    pub fn usage(&self) -> f64 {
        match (self.used, self.available) {
            (Some(used), Some(available)) => used as f64 / (used as f64 + available as f64),
            _ => std::f64::NAN,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Host {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct HostNic {
    #[serde(default)]
    pub name: String,
    pub ip: Option<Ip>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Ip {
    pub address: Option<String>,
    pub version: Option<String>,
}

impl HostNic {
    pub fn address(&self) -> Option<&str> {
        self.ip.as_ref().and_then(|ip| ip.address.as_deref())
    }
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct DataCenter {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Vms {
    #[serde(default)]
    pub vm: Vec<Vm>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Disks {
    #[serde(default)]
    pub disk: Vec<Disk>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StorageDomains {
    #[serde(default)]
    pub storage_domain: Vec<StorageDomain>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Hosts {
    #[serde(default)]
    pub host: Vec<Host>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HostNics {
    #[serde(default)]
    pub host_nic: Vec<HostNic>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DataCenters {
    #[serde(default)]
    pub data_center: Vec<DataCenter>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_collections_have_no_key() {
        let vms: Vms = serde_json::from_str("{}").unwrap();
        assert!(vms.vm.is_empty());
    }

    #[test]
    fn storage_domains_deserialize() {
        let raw = r#"{
            "storage_domain": [
                {
                    "name": "hosted_storage",
                    "id": "4a6a1b3c",
                    "type": "data",
                    "external_status": "ok",
                    "used": "107374182400",
                    "available": "322122547200",
                    "committed": "85899345920"
                },
                {
                    "name": "ovirt-image-repository",
                    "id": "072fbaa1",
                    "type": "image",
                    "external_status": "ok"
                }
            ]
        }"#;
        let domains: StorageDomains = serde_json::from_str(raw).unwrap();
        assert_eq!(domains.storage_domain.len(), 2);
        let data = &domains.storage_domain[0];
        assert_eq!(data.used, Some(107_374_182_400));
        assert_eq!(data.available, Some(322_122_547_200));
        assert!(!data.is_image());
        assert_eq!(data.usage(), 0.25);
        assert!(domains.storage_domain[1].is_image());
        assert_eq!(domains.storage_domain[1].used, None);
    }

    #[test]
    fn usage_without_space_is_nan() {
        let domain = StorageDomain {
            id: String::new(),
            name: "empty".into(),
            kind: Some("data".into()),
            external_status: None,
            used: Some(0),
            available: Some(0),
        };
        assert!(domain.usage().is_nan());
    }

    #[test]
    fn usage_with_missing_space_is_nan() {
        let only_available: StorageDomain =
            serde_json::from_str(r#"{"name": "d", "type": "data", "available": "1000"}"#).unwrap();
        assert_eq!(only_available.used, None);
        assert!(only_available.usage().is_nan());

        let only_used: StorageDomain =
            serde_json::from_str(r#"{"name": "d", "type": "data", "used": "1000"}"#).unwrap();
        assert!(only_used.usage().is_nan());
    }

    #[test]
    fn numbers_may_be_numbers() {
        let domain: StorageDomain =
            serde_json::from_str(r#"{"name": "d", "used": 1, "available": 3}"#).unwrap();
        assert_eq!(domain.usage(), 0.25);
    }

    #[test]
    fn host_nics_deserialize() {
        let raw = r#"{
            "host_nic": [
                {"name": "ovirtmgmt", "ip": {"address": "10.8.1.17", "version": "v4"}},
                {"name": "eth1", "ip": {"address": "192.168.122.4", "version": "v4"}},
                {"name": "eth2"}
            ]
        }"#;
        let nics: HostNics = serde_json::from_str(raw).unwrap();
        let addrs: Vec<_> = nics.host_nic.iter().map(HostNic::address).collect();
        assert_eq!(addrs, [Some("10.8.1.17"), Some("192.168.122.4"), None]);
    }
}
