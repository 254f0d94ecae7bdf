//! Map vendor status values onto check statuses
//!
//! RHV reports the health of storage domains, hosts and data centers as an
//! enumeration of strings. Each resource kind gets a static table saying which
//! of those values are fine, which deserve a warning and which are critical.
//! Anything not in the table (including values added by newer RHV versions)
//! is unknown.

use crate::Status;

/// A static vendor-status to `Status` lookup for one resource kind
#[derive(Debug)]
pub struct SeverityTable {
    /// Human name of the resource, used in check output
    pub kind: &'static str,
    entries: &'static [(&'static str, Status)],
}

impl SeverityTable {
    pub fn lookup(&self, value: &str) -> Status {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(value))
            .map_or(Status::Unknown, |&(_, status)| status)
    }
}

/// `external_status` of a storage domain
pub static STORAGE_DOMAIN: SeverityTable = SeverityTable {
    kind: "storage_domain",
    entries: &[
        ("ok", Status::Ok),
        ("warning", Status::Warning),
        ("error", Status::Critical),
        ("failure", Status::Critical),
    ],
};

/// `status` of a hypervisor host
pub static HOST: SeverityTable = SeverityTable {
    kind: "host",
    entries: &[
        ("up", Status::Ok),
        ("maintenance", Status::Warning),
        ("unassigned", Status::Warning),
        ("reboot", Status::Warning),
        ("connecting", Status::Warning),
        ("initializing", Status::Warning),
        ("error", Status::Critical),
        ("down", Status::Critical),
        ("non_operational", Status::Critical),
        ("non_responsive", Status::Critical),
    ],
};

/// `status` of a data center
pub static DATA_CENTER: SeverityTable = SeverityTable {
    kind: "datacenter",
    entries: &[
        ("up", Status::Ok),
        ("maintenance", Status::Warning),
        ("uninitialized", Status::Warning),
        ("problematic", Status::Critical),
        ("not_operational", Status::Critical),
    ],
};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn storage_domain_table() {
        assert_eq!(STORAGE_DOMAIN.lookup("ok"), Status::Ok);
        assert_eq!(STORAGE_DOMAIN.lookup("warning"), Status::Warning);
        assert_eq!(STORAGE_DOMAIN.lookup("failure"), Status::Critical);
        assert_eq!(STORAGE_DOMAIN.lookup("error"), Status::Critical);
        assert_eq!(STORAGE_DOMAIN.lookup("info"), Status::Unknown);
    }

    #[test]
    fn host_table() {
        assert_eq!(HOST.lookup("up"), Status::Ok);
        for s in &["maintenance", "unassigned", "reboot", "connecting", "initializing"] {
            assert_eq!(HOST.lookup(s), Status::Warning, "{}", s);
        }
        for s in &["error", "down", "non_operational", "non_responsive"] {
            assert_eq!(HOST.lookup(s), Status::Critical, "{}", s);
        }
        assert_eq!(HOST.lookup("kdumping"), Status::Unknown);
        assert_eq!(HOST.lookup("install_failed"), Status::Unknown);
    }

    #[test]
    fn data_center_table() {
        assert_eq!(DATA_CENTER.lookup("up"), Status::Ok);
        assert_eq!(DATA_CENTER.lookup("uninitialized"), Status::Warning);
        assert_eq!(DATA_CENTER.lookup("not_operational"), Status::Critical);
        assert_eq!(DATA_CENTER.lookup("contend"), Status::Unknown);
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(HOST.lookup("NON_RESPONSIVE"), Status::Critical);
    }
}
