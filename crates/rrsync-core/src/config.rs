//! Configuration types for record reconciliation
//!
//! A [`RecordConfig`] is the declared resource: the desired record plus the
//! settings needed to reach and authenticate against its nameserver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether the declared record should exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// The record set must contain exactly the declared data
    #[default]
    Present,
    /// Every value at the name/type must be withdrawn
    Absent,
}

/// Declared DNS resource record
#[derive(Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Owner name (e.g., "www.example.com"); a trailing dot is optional
    #[serde(rename = "record")]
    pub name: String,

    /// Record type mnemonic (A, TXT, DS, SOA, ...)
    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: String,

    /// Record class
    #[serde(default = "default_rrclass")]
    pub rrclass: String,

    /// TTL for added records
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Desired canonical rdata values
    #[serde(default)]
    pub data: BTreeSet<String>,

    /// Presence of the record
    #[serde(default)]
    pub ensure: Ensure,

    /// Nameserver and authentication settings
    #[serde(flatten)]
    pub target: TargetConfig,
}

/// Where and how to query and update a record
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Authoritative server to query and update
    pub server: String,

    /// Zone override for updates
    #[serde(default)]
    pub zone: Option<String>,

    /// Answer section selector for the lookup, without the leading `+`
    /// (`answer`, `authority`, ...)
    #[serde(default = "default_query_section")]
    pub query_section: String,

    /// TSIG key name
    #[serde(default)]
    pub keyname: Option<String>,

    /// Path to a TSIG key file
    #[serde(default)]
    pub keyfile: Option<String>,

    /// TSIG algorithm
    #[serde(default = "default_hmac")]
    pub hmac: String,

    /// TSIG shared secret
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub secret: Option<String>,

    /// Refuse to run without authentication material
    #[serde(default)]
    pub require_auth: bool,
}

// Custom Debug implementations that hide the TSIG secret
impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("server", &self.server)
            .field("zone", &self.zone)
            .field("query_section", &self.query_section)
            .field("keyname", &self.keyname)
            .field("keyfile", &self.keyfile)
            .field("hmac", &self.hmac)
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .field("require_auth", &self.require_auth)
            .finish()
    }
}

impl std::fmt::Debug for RecordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordConfig")
            .field("name", &self.name)
            .field("record_type", &self.record_type)
            .field("rrclass", &self.rrclass)
            .field("ttl", &self.ttl)
            .field("data", &self.data)
            .field("ensure", &self.ensure)
            .field("target", &self.target)
            .finish()
    }
}

impl TargetConfig {
    /// Create target settings for an unauthenticated server
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            zone: None,
            query_section: default_query_section(),
            keyname: None,
            keyfile: None,
            hmac: default_hmac(),
            secret: None,
            require_auth: false,
        }
    }

    /// Validate the target settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.server.trim().is_empty() {
            return Err(crate::Error::config("server cannot be empty"));
        }

        if self.query_section.trim().is_empty() {
            return Err(crate::Error::config("query_section cannot be empty"));
        }

        if let Some(zone) = &self.zone
            && zone.trim().is_empty()
        {
            return Err(crate::Error::config("zone cannot be empty when set"));
        }

        single_token("server", &self.server)?;
        single_token("query_section", &self.query_section)?;
        single_token("hmac", &self.hmac)?;
        if let Some(zone) = &self.zone {
            single_token("zone", zone)?;
        }
        if let Some(keyname) = &self.keyname {
            single_token("keyname", keyname)?;
        }

        if self.secret.is_some() && self.keyfile.is_some() {
            return Err(crate::Error::config(
                "secret and keyfile are mutually exclusive",
            ));
        }

        if self.secret.is_some() {
            if self.keyname.as_deref().is_none_or(|k| k.trim().is_empty()) {
                return Err(crate::Error::config("secret requires keyname"));
            }
            if self.hmac.trim().is_empty() {
                return Err(crate::Error::config("secret requires hmac"));
            }
        }

        if self.require_auth && self.secret.is_none() && self.keyfile.is_none() {
            return Err(crate::Error::config(
                "authentication required but neither secret nor keyfile is set",
            ));
        }

        Ok(())
    }
}

impl RecordConfig {
    /// Create a new present record with no data
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            rrclass: default_rrclass(),
            ttl: default_ttl(),
            data: BTreeSet::new(),
            ensure: Ensure::Present,
            target: TargetConfig::new(server),
        }
    }

    /// Set the desired data values
    pub fn with_data<I, S>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data = data.into_iter().map(Into::into).collect();
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the presence of the record
    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    /// Set the zone override
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.target.zone = Some(zone.into());
        self
    }

    /// Authenticate with an inline TSIG key
    pub fn with_tsig(
        mut self,
        hmac: impl Into<String>,
        keyname: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.target.hmac = hmac.into();
        self.target.keyname = Some(keyname.into());
        self.target.secret = Some(secret.into());
        self
    }

    /// Authenticate with a TSIG key file
    pub fn with_keyfile(mut self, keyfile: impl Into<String>) -> Self {
        self.target.keyfile = Some(keyfile.into());
        self
    }

    /// Owner name in fully-qualified form (single trailing dot)
    pub fn fqdn(&self) -> String {
        fully_qualified(&self.name)
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().trim_end_matches('.').is_empty() {
            return Err(crate::Error::config("record name cannot be empty"));
        }

        if self.record_type.trim().is_empty() {
            return Err(crate::Error::config("record type cannot be empty"));
        }

        if self.rrclass.trim().is_empty() {
            return Err(crate::Error::config("record class cannot be empty"));
        }

        single_token("record name", &self.name)?;
        single_token("record type", &self.record_type)?;
        single_token("record class", &self.rrclass)?;

        if let Some(value) = self.data.iter().find(|v| v.contains('\n')) {
            return Err(crate::Error::config(format!(
                "data value for {} contains a newline: {:?}",
                self.name, value
            )));
        }

        self.target.validate()
    }
}

// Values written into the transaction text or tool arguments must not split lines or fields
fn single_token(field: &str, value: &str) -> Result<(), crate::Error> {
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(crate::Error::config(format!(
            "{} contains whitespace: {:?}",
            field, value
        )));
    }
    Ok(())
}

/// Append the root label to a name unless it is already present
pub fn fully_qualified(name: &str) -> String {
    format!("{}.", name.trim_end_matches('.'))
}

/// Paths of the external tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    /// Lookup tool
    #[serde(default = "default_dig")]
    pub dig: String,

    /// Update tool
    #[serde(default = "default_nsupdate")]
    pub nsupdate: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            dig: default_dig(),
            nsupdate: default_nsupdate(),
        }
    }
}

/// Reconciler settings that are not part of the declared record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcilerOptions {
    /// External tool paths
    #[serde(default)]
    pub tools: ToolPaths,

    /// Log transactions instead of sending them
    #[serde(default)]
    pub dry_run: bool,
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_rrclass() -> String {
    "IN".to_string()
}

fn default_ttl() -> u32 {
    3600
}

fn default_query_section() -> String {
    "answer".to_string()
}

fn default_hmac() -> String {
    "hmac-sha256".to_string()
}

fn default_dig() -> String {
    "dig".to_string()
}

fn default_nsupdate() -> String {
    "nsupdate".to_string()
}
