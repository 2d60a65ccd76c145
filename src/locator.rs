//! Package identifiers (`owner/repo`).

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A parsed `owner/repo` pair. Both halves are non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    owner: String,
    name: String,
}

impl PackageId {
    /// Parse an identifier string.
    ///
    /// The input must contain exactly one `/`; `"foo"` and `"a/b/c"` are both
    /// rejected rather than guessed at.
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split('/').collect();
        if parts.len() != 2 {
            return Err(Error::InvalidFormat {
                input: input.to_string(),
                reason: "expected exactly one '/'",
            });
        }

        let owner = parts[0].trim();
        let name = parts[1].trim();
        if owner.is_empty() || name.is_empty() {
            return Err(Error::InvalidFormat {
                input: input.to_string(),
                reason: "owner and repository name cannot be empty",
            });
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Manifest key, `owner/name`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Single path segment used for the install directory, `owner-name`.
    pub fn namespace(&self) -> String {
        format!("{}-{}", self.owner, self.name)
    }
}

impl FromStr for PackageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
