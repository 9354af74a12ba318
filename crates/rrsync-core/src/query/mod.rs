//! Authoritative lookup of the current record set
//!
//! The query client asks the target server directly (no recursion, no search
//! list) for the records at one name and decodes each answer line through the
//! [`codec`](crate::codec).
//!
//! ## Flow
//!
//! ```text
//! dig @server +noall +nosearch +norecurse +<section> <name> <type> -c <class> [auth]
//!        │
//!        ▼
//! name  ttl  class  type  rdata...      (one line per record)
//!        │
//!        ▼  decode(type-of-line, rdata), keep lines matching <name> and <type>
//! Vec<ResourceRecord>
//! ```

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::auth::AuthMode;
use crate::codec;
use crate::config::RecordConfig;
use crate::error::{Error, Result};
use crate::runner::masked_command_line;
use crate::traits::CommandRunner;

/// One published record, with rdata in canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Owner name as reported (fully-qualified)
    pub name: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record class
    pub class: String,
    /// Record type mnemonic
    pub record_type: String,
    /// Canonical rdata
    pub rdata: String,
}

/// Issues lookups against the authoritative server
pub struct QueryClient {
    dig: String,
    runner: Arc<dyn CommandRunner>,
}

impl QueryClient {
    /// Create a query client using the given lookup tool
    pub fn new(dig: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            dig: dig.into(),
            runner,
        }
    }

    /// Arguments for the lookup of `record`
    pub fn args(record: &RecordConfig) -> Vec<String> {
        let target = &record.target;
        let mut args = vec![
            format!("@{}", target.server),
            "+noall".to_string(),
            "+nosearch".to_string(),
            "+norecurse".to_string(),
            format!("+{}", target.query_section),
            record.name.clone(),
            record.record_type.clone(),
            "-c".to_string(),
            record.rrclass.clone(),
        ];
        args.extend(AuthMode::from_target(target).args());
        args
    }

    /// Fetch the records currently published at the record's name
    ///
    /// Any failure of the lookup is fatal; there is no fallback to stale data.
    pub async fn query(&self, record: &RecordConfig) -> Result<Vec<ResourceRecord>> {
        let args = Self::args(record);
        let command = masked_command_line(&self.dig, &args);
        debug!(%command, "Querying current record set");

        let output = self
            .runner
            .run(&self.dig, &args)
            .await
            .map_err(|e| Error::query(&command, e.to_string()))?;

        if !output.success() {
            return Err(Error::query(&command, output.failure_message()));
        }

        let records = parse_answer(&output.stdout, &record.fqdn(), &record.record_type);
        debug!(
            name = %record.fqdn(),
            count = records.len(),
            "Parsed current record set"
        );
        Ok(records)
    }
}

/// Parse lookup output, keeping only `record_type` records owned by `fqdn`
///
/// Answers of other types at the name (a CNAME when asking for A, say) are
/// dropped after decoding.
pub fn parse_answer(stdout: &str, fqdn: &str, record_type: &str) -> Vec<ResourceRecord> {
    stdout
        .lines()
        .filter_map(parse_line)
        .filter(|record| record.name.eq_ignore_ascii_case(fqdn))
        .filter(|record| {
            let matches = record.record_type.eq_ignore_ascii_case(record_type);
            if !matches {
                debug!(
                    name = %record.name,
                    found = %record.record_type,
                    wanted = record_type,
                    "Ignoring answer of another type"
                );
            }
            matches
        })
        .collect()
}

/// Parse one `name ttl class type rdata` line
///
/// The rdata is the remainder of the line so embedded whitespace survives.
fn parse_line(line: &str) -> Option<ResourceRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.trim_start().starts_with(';') {
        return None;
    }

    let mut rest = line;
    let mut fields = Vec::with_capacity(4);
    for _ in 0..4 {
        rest = rest.trim_start();
        let Some(end) = rest.find(char::is_whitespace) else {
            warn!(line, "Skipping answer line without rdata");
            return None;
        };
        fields.push(&rest[..end]);
        rest = &rest[end..];
    }
    let raw = rest.trim_start();
    if raw.is_empty() {
        warn!(line, "Skipping answer line without rdata");
        return None;
    }

    let ttl = match fields[1].parse::<u32>() {
        Ok(ttl) => ttl,
        Err(_) => {
            warn!(line, "Skipping answer line with invalid TTL");
            return None;
        }
    };

    let record_type = fields[3].to_string();
    Some(ResourceRecord {
        name: fields[0].to_string(),
        ttl,
        class: fields[2].to_string(),
        rdata: codec::decode(&record_type, raw),
        record_type,
    })
}

/// Query result memoized for one reconciliation pass
///
/// Created empty at the start of a pass and dropped with it; a new pass
/// always re-queries.
#[derive(Debug, Default)]
pub struct QueryCache {
    records: OnceCell<Vec<ResourceRecord>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached records, running the query on first use
    pub async fn get_or_query(
        &self,
        client: &QueryClient,
        record: &RecordConfig,
    ) -> Result<&[ResourceRecord]> {
        let records = self
            .records
            .get_or_try_init(|| client.query(record))
            .await?;
        Ok(records.as_slice())
    }
}
