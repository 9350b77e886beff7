//! Origin tracking for transferable files
//!
//! Every staged file carries exactly one origin: either a source account or
//! the static bucket of pre-existing files. The registry is built during the
//! download phase and only read afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Identity of a Tenable account, taken from its access key
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountIdentity(String);

impl AccountIdentity {
    pub fn new(access_key: impl Into<String>) -> Self {
        AccountIdentity(access_key.into())
    }

    /// Short, log-safe form of the key
    pub fn fingerprint(&self) -> String {
        let tail: String = self
            .0
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}

// Access keys are credentials; never print them whole
impl fmt::Debug for AccountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountIdentity({})", self.fingerprint())
    }
}

impl fmt::Display for AccountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account {}", self.fingerprint())
    }
}

/// Where a transferable file came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    /// Pre-existing file from a configured directory: never deleted,
    /// never subject to loop-back suppression
    Static,
    /// Downloaded from the account with this identity during this run
    Account(AccountIdentity),
}

impl Origin {
    pub fn is_static(&self) -> bool {
        matches!(self, Origin::Static)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Static => f.write_str("static files"),
            Origin::Account(identity) => identity.fmt(f),
        }
    }
}

/// A destination must never receive files its own account produced.
pub fn is_loopback(origin: &Origin, destination: &AccountIdentity) -> bool {
    matches!(origin, Origin::Account(identity) if identity == destination)
}

/// Mapping from origin to the files it produced in this run
#[derive(Debug, Default, Clone)]
pub struct OriginRegistry {
    entries: BTreeMap<Origin, Vec<PathBuf>>,
}

impl OriginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append files under `origin`; an origin seen twice accumulates
    pub fn register(&mut self, origin: Origin, files: impl IntoIterator<Item = PathBuf>) {
        let list = self.entries.entry(origin).or_default();
        for file in files {
            if !list.contains(&file) {
                list.push(file);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Origin, &[PathBuf])> {
        self.entries
            .iter()
            .map(|(origin, files)| (origin, files.as_slice()))
    }

    pub fn files_for(&self, origin: &Origin) -> &[PathBuf] {
        self.entries
            .get(origin)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn total_files(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_files() == 0
    }

    /// Files downloaded this run; these are the ones cleanup deletes
    pub fn downloaded_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries
            .iter()
            .filter(|(origin, _)| !origin.is_static())
            .flat_map(|(_, files)| files.iter())
    }

    pub fn static_files(&self) -> &[PathBuf] {
        self.files_for(&Origin::Static)
    }
}
