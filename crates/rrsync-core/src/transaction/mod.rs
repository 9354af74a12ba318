//! Update transaction rendering
//!
//! A transaction is the text handed to the update tool:
//!
//! ```text
//! server <server>
//! [zone <zone>]
//! update add <name>. <ttl> <class> <type> <rdata>
//! update delete <name>. <ttl> <class> <type> <rdata>
//! send
//! ```
//!
//! Authentication never appears in the text; see [`crate::sender`].

use std::fmt;

use crate::codec;
use crate::config::{RecordConfig, fully_qualified};

/// Directive of one update line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Add,
    Delete,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directive of a transaction
///
/// `ttl` is meaningful only for adds, but is rendered for deletes as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOperation {
    pub kind: OperationKind,
    pub name: String,
    pub ttl: u32,
    pub class: String,
    pub record_type: String,
    /// Canonical rdata; encoded when rendered
    pub rdata: String,
}

impl fmt::Display for UpdateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "update {} {} {} {} {} {}",
            self.kind,
            fully_qualified(&self.name),
            self.ttl,
            self.class,
            self.record_type,
            codec::encode(&self.record_type, &self.rdata)
        )
    }
}

/// An ordered batch of operations applied atomically by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub server: String,
    pub zone: Option<String>,
    pub operations: Vec<UpdateOperation>,
}

impl Transaction {
    /// Start a transaction for the record's target with no operations
    pub fn for_record(record: &RecordConfig) -> Self {
        Self {
            server: record.target.server.clone(),
            zone: record.target.zone.clone(),
            operations: Vec::new(),
        }
    }

    /// Append operations in order
    pub fn with_operations(
        mut self,
        operations: impl IntoIterator<Item = UpdateOperation>,
    ) -> Self {
        self.operations.extend(operations);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Render the transaction text, ending with the commit marker
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "server {}", self.server)?;
        if let Some(zone) = &self.zone {
            writeln!(f, "zone {}", zone)?;
        }
        for op in &self.operations {
            writeln!(f, "{}", op)?;
        }
        writeln!(f, "send")
    }
}
