//! Collect observations, aggregate them into one status and describe it

use std::fmt;

use itertools::Itertools;

use crate::Status;

/// The result of a check: what to print, and what to exit with
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub status: Status,
    pub message: String,
}

impl Report {
    pub fn new<S: Into<String>>(status: Status, message: S) -> Report {
        Report {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One resource and what we saw of it
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<V> {
    pub name: String,
    pub value: V,
    pub status: Status,
}

impl<V: fmt::Display> fmt::Display for Observation<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.value)
    }
}

/// All the observations of one kind of resource, in the order RHV listed them
#[derive(Debug)]
pub struct Observations<V> {
    kind: &'static str,
    items: Vec<Observation<V>>,
}

impl<V: fmt::Display> Observations<V> {
    pub fn new(kind: &'static str) -> Observations<V> {
        Observations {
            kind,
            items: Vec::new(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, name: S, value: V, status: Status) {
        self.items.push(Observation {
            name: name.into(),
            value,
            status,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The most severe status of any member
    ///
    /// Critical beats warning beats unknown beats ok. An empty collection is
    /// ok.
    pub fn overall(&self) -> Status {
        self.items
            .iter()
            .map(|o| o.status)
            .max()
            .unwrap_or(Status::Ok)
    }

    fn describe(&self, status: Option<Status>) -> String {
        let joined = self
            .items
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .join(", ");
        if joined.is_empty() {
            "(none)".to_owned()
        } else {
            joined
        }
    }

    pub fn into_report(self) -> Report {
        let status = self.overall();
        let kind = self.kind;
        let message = match status {
            Status::Critical => format!(
                "CRITICAL: the following {}(s) definitely have an issue: {}\n\
                 Status of all {}(s): {}",
                kind,
                self.describe(Some(Status::Critical)),
                kind,
                self.describe(None)
            ),
            Status::Warning => format!(
                "WARNING: the following {}(s) may have an issue: {}\n\
                 Status of all {}(s): {}",
                kind,
                self.describe(Some(Status::Warning)),
                kind,
                self.describe(None)
            ),
            Status::Unknown => format!(
                "UNKNOWN: the following {}(s) are in an unknown state: {}\n\
                 Status of all {}(s): {}",
                kind,
                self.describe(Some(Status::Unknown)),
                kind,
                self.describe(None)
            ),
            Status::Ok => format!(
                "OK: all {}(s) are in the OK state: {}",
                kind,
                self.describe(None)
            ),
        };
        Report { status, message }
    }
}
