// ── Domain model ──
//
// Validated, immutable types produced by the registry. Nothing here is
// constructed from unchecked input outside of `registry`.

use indexmap::IndexMap;
use strum::{Display, EnumString, IntoStaticStr};

use crate::command::AllowedCommand;

/// Supported device kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    /// Digital virtual input.
    Dvi,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Prefix of the Miniserver endpoint name (`VI3` for virtual input 3).
    pub fn path_prefix(self) -> &'static str {
        match self {
            Self::Dvi => "VI",
        }
    }
}

/// One controllable Miniserver endpoint with its access policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub name: String,
    pub category: Category,
    pub id: u32,
    pub allowed: Vec<AllowedCommand>,
    pub credentials: Vec<String>,
}

impl Control {
    /// Whether the credential `name` may operate this control.
    pub fn accepts_credential(&self, name: &str) -> bool {
        self.credentials.iter().any(|c| c == name)
    }

    /// Whether a raw request-time command is allowed, honouring `<all>`.
    pub fn allows_command(&self, requested: &str) -> bool {
        self.allowed.iter().any(|cmd| cmd.permits(requested))
    }
}

/// Credential name → secret, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialTable {
    entries: IndexMap<String, String>,
}

impl CredentialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, secret: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), secret.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn secret(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Reverse lookup of the credential name owning `secret`.
    ///
    /// Linear scan: tables hold tens of entries, so no reverse index is kept.
    pub fn name_for_secret(&self, secret: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, s)| s.as_str() == secret)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for CredentialTable {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, secret) in iter {
            table.insert(name, secret);
        }
        table
    }
}
