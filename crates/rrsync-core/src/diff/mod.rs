//! Add/delete computation
//!
//! Compares the desired values against the queried records by canonical
//! rdata and produces the ordered operations that converge the server.
//!
//! ## Ordering
//!
//! 1. TTL refresh pairs (delete old TTL, add new TTL) for values kept on both sides
//! 2. Adds of new values
//! 3. Deletes of withdrawn values
//!
//! Adds precede deletes so a still-desired name never goes briefly empty.
//! The server applies the whole transaction atomically, so a refresh pair
//! is never observable either.

use std::collections::BTreeSet;

use crate::config::Ensure;
use crate::query::ResourceRecord;
use crate::transaction::{OperationKind, UpdateOperation};

/// Record types of which a name holds exactly one instance
///
/// Adding a value of these types supersedes the previous one on the server.
pub const SINGLETON_TYPES: &[&str] = &["SOA"];

pub fn is_singleton(record_type: &str) -> bool {
    SINGLETON_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(record_type))
}

/// The target state one diff is computed against
#[derive(Debug, Clone, Copy)]
pub struct Desired<'a> {
    /// Fully-qualified owner name
    pub name: &'a str,
    pub record_type: &'a str,
    pub class: &'a str,
    pub ttl: u32,
    pub data: &'a BTreeSet<String>,
    pub ensure: Ensure,
}

/// Ordered operations produced by one diff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    operations: Vec<UpdateOperation>,
}

impl ChangeSet {
    /// All operations in transaction order
    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    /// Rdata of every add, in order
    pub fn adds(&self) -> Vec<&str> {
        self.rdata_of(OperationKind::Add)
    }

    /// Rdata of every delete, in order
    pub fn deletes(&self) -> Vec<&str> {
        self.rdata_of(OperationKind::Delete)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Keep only the adds (initial creation)
    pub fn adds_only(self) -> Self {
        self.filtered(OperationKind::Add)
    }

    /// Keep only the deletes
    pub fn deletes_only(self) -> Self {
        self.filtered(OperationKind::Delete)
    }

    fn filtered(self, kind: OperationKind) -> Self {
        Self {
            operations: self
                .operations
                .into_iter()
                .filter(|op| op.kind == kind)
                .collect(),
        }
    }

    fn rdata_of(&self, kind: OperationKind) -> Vec<&str> {
        self.operations
            .iter()
            .filter(|op| op.kind == kind)
            .map(|op| op.rdata.as_str())
            .collect()
    }
}

/// Compute the operations that converge `current` to `desired`
pub fn compute(desired: &Desired<'_>, current: &[ResourceRecord]) -> ChangeSet {
    let mut builder = Builder::new(desired);

    match desired.ensure {
        Ensure::Absent => {
            for record in current {
                builder.delete(record);
            }
        }
        Ensure::Present if desired.data.is_empty() => {}
        Ensure::Present if is_singleton(desired.record_type) => {
            for value in desired.data {
                let up_to_date = current
                    .iter()
                    .any(|r| &r.rdata == value && r.ttl == desired.ttl);
                if !up_to_date {
                    builder.add(value);
                }
            }
        }
        Ensure::Present => {
            for record in current {
                if desired.data.contains(&record.rdata) && record.ttl != desired.ttl {
                    builder.refresh(record);
                }
            }
            for value in desired.data {
                if !current.iter().any(|r| &r.rdata == value) {
                    builder.add(value);
                }
            }
            for record in current {
                if !desired.data.contains(&record.rdata) {
                    builder.delete(record);
                }
            }
        }
    }

    builder.finish()
}

struct Builder<'a> {
    desired: &'a Desired<'a>,
    operations: Vec<UpdateOperation>,
    seen_deletes: BTreeSet<String>,
}

impl<'a> Builder<'a> {
    fn new(desired: &'a Desired<'a>) -> Self {
        Self {
            desired,
            operations: Vec::new(),
            seen_deletes: BTreeSet::new(),
        }
    }

    fn operation(&self, kind: OperationKind, ttl: u32, rdata: &str) -> UpdateOperation {
        UpdateOperation {
            kind,
            name: self.desired.name.to_string(),
            ttl,
            class: self.desired.class.to_string(),
            record_type: self.desired.record_type.to_string(),
            rdata: rdata.to_string(),
        }
    }

    fn add(&mut self, value: &str) {
        let op = self.operation(OperationKind::Add, self.desired.ttl, value);
        self.operations.push(op);
    }

    fn delete(&mut self, record: &ResourceRecord) -> bool {
        // the server may report the same value twice (e.g. multiple answers)
        if !self.seen_deletes.insert(record.rdata.clone()) {
            return false;
        }
        let op = self.operation(OperationKind::Delete, record.ttl, &record.rdata);
        self.operations.push(op);
        true
    }

    fn refresh(&mut self, record: &ResourceRecord) {
        if self.delete(record) {
            self.add(&record.rdata);
        }
    }

    fn finish(self) -> ChangeSet {
        ChangeSet {
            operations: self.operations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rr(ttl: u32, rdata: &str) -> ResourceRecord {
        ResourceRecord {
            name: "www.example.com.".to_string(),
            ttl,
            class: "IN".to_string(),
            record_type: "A".to_string(),
            rdata: rdata.to_string(),
        }
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn desired<'a>(
        record_type: &'a str,
        data: &'a BTreeSet<String>,
        ensure: Ensure,
    ) -> Desired<'a> {
        Desired {
            name: "www.example.com.",
            record_type,
            class: "IN",
            ttl: 300,
            data,
            ensure,
        }
    }

    #[test]
    fn test_disjoint_sets() {
        let data = set(&["v2", "v3"]);
        let changes = compute(
            &desired("A", &data, Ensure::Present),
            &[rr(300, "v1"), rr(300, "v0")],
        );
        assert_eq!(changes.adds(), vec!["v2", "v3"]);
        assert_eq!(changes.deletes(), vec!["v1", "v0"]);
    }

    #[test]
    fn test_adds_precede_deletes() {
        let data = set(&["v2"]);
        let changes = compute(&desired("A", &data, Ensure::Present), &[rr(300, "v1")]);
        let kinds: Vec<_> = changes.operations().iter().map(|op| op.kind).collect();
        assert_eq!(kinds, vec![OperationKind::Add, OperationKind::Delete]);
    }

    #[test]
    fn test_absent_deletes_everything() {
        let data = set(&["v1", "v9"]);
        let changes = compute(
            &desired("A", &data, Ensure::Absent),
            &[rr(300, "v1"), rr(300, "v2")],
        );
        assert!(changes.adds().is_empty());
        assert_eq!(changes.deletes(), vec!["v1", "v2"]);
    }

    #[test]
    fn test_soa_is_replaced_without_delete() {
        let data = set(&["ns1. admin. 2 3600 600 86400 300"]);
        let changes = compute(
            &desired("SOA", &data, Ensure::Present),
            &[rr(300, "ns1. admin. 1 3600 600 86400 300")],
        );
        assert!(changes.deletes().is_empty());
        assert_eq!(changes.adds(), vec!["ns1. admin. 2 3600 600 86400 300"]);
    }

    #[test]
    fn test_soa_unchanged() {
        let data = set(&["ns1. admin. 1 3600 600 86400 300"]);
        let changes = compute(
            &desired("SOA", &data, Ensure::Present),
            &[rr(300, "ns1. admin. 1 3600 600 86400 300")],
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn test_in_sync_is_empty() {
        let data = set(&["v1", "v2"]);
        let changes = compute(
            &desired("A", &data, Ensure::Present),
            &[rr(300, "v2"), rr(300, "v1")],
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn test_empty_desired_data_is_noop() {
        let data = BTreeSet::new();
        let changes = compute(&desired("A", &data, Ensure::Present), &[rr(300, "v1")]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_ttl_change_refreshes_value() {
        let data = set(&["v1"]);
        let changes = compute(&desired("A", &data, Ensure::Present), &[rr(60, "v1")]);
        let ops = changes.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!((ops[0].kind, ops[0].ttl), (OperationKind::Delete, 60));
        assert_eq!((ops[1].kind, ops[1].ttl), (OperationKind::Add, 300));
        assert_eq!(ops[1].rdata, "v1");
    }

    #[test]
    fn test_deletes_carry_server_ttl() {
        let data = set(&["v2"]);
        let changes = compute(&desired("A", &data, Ensure::Present), &[rr(86400, "v1")]);
        let delete = &changes.operations()[1];
        assert_eq!(delete.ttl, 86400);
    }

    #[test]
    fn test_duplicate_current_values_deleted_once() {
        let data = BTreeSet::new();
        let changes = compute(
            &desired("A", &data, Ensure::Absent),
            &[rr(300, "v1"), rr(300, "v1")],
        );
        assert_eq!(changes.deletes(), vec!["v1"]);
    }

    #[test]
    fn test_duplicate_stale_value_refreshed_once() {
        let data = set(&["v1"]);
        let changes = compute(
            &desired("A", &data, Ensure::Present),
            &[rr(60, "v1"), rr(60, "v1")],
        );
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.adds(), vec!["v1"]);
    }

    #[test]
    fn test_adds_only_and_deletes_only() {
        let data = set(&["v2"]);
        let changes = compute(&desired("A", &data, Ensure::Present), &[rr(300, "v1")]);
        assert_eq!(changes.clone().adds_only().deletes(), Vec::<&str>::new());
        assert_eq!(changes.deletes_only().adds(), Vec::<&str>::new());
    }
}
