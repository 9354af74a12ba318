//! Test doubles and common utilities for contract tests
//!
//! [`FakeNameserver`] stands in for both external tools: it answers lookups
//! from an in-memory record list and applies update transactions to it, so
//! tests can run full reconciliation passes without a real server.

#![allow(dead_code)]

use async_trait::async_trait;
use rrsync_core::error::Result;
use rrsync_core::traits::{CommandOutput, CommandRunner};
use rrsync_core::{RecordConfig, ReconcilerOptions, Reconciler};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// One record as the fake server stores it (rdata in wire form)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub name: String,
    pub ttl: u32,
    pub class: String,
    pub record_type: String,
    pub wire: String,
}

/// One invocation of the update tool
#[derive(Debug, Clone)]
pub struct UpdateCall {
    pub args: Vec<String>,
    pub payload: String,
    pub scratch_path: String,
}

/// In-memory nameserver reachable through `dig` and `nsupdate`
#[derive(Default)]
pub struct FakeNameserver {
    records: Mutex<Vec<StoredRecord>>,
    lookups: Mutex<Vec<Vec<String>>>,
    updates: Mutex<Vec<UpdateCall>>,
    lookup_count: AtomicUsize,
    fail_lookups: AtomicBool,
    fail_updates: AtomicBool,
}

impl FakeNameserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Publish a record; `wire` is the rdata exactly as a lookup would print it
    pub fn publish(&self, name: &str, ttl: u32, record_type: &str, wire: &str) {
        self.records.lock().unwrap().push(StoredRecord {
            name: fqdn(name),
            ttl,
            class: "IN".to_string(),
            record_type: record_type.to_string(),
            wire: wire.to_string(),
        });
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Wire values published at name/type, sorted
    pub fn values(&self, name: &str, record_type: &str) -> Vec<String> {
        let name = fqdn(name);
        let mut values: Vec<String> = self
            .records()
            .into_iter()
            .filter(|r| r.name == name && r.record_type.eq_ignore_ascii_case(record_type))
            .map(|r| r.wire)
            .collect();
        values.sort();
        values
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> Vec<Vec<String>> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }

    pub fn last_payload(&self) -> Option<String> {
        self.updates().last().map(|u| u.payload.clone())
    }

    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    fn lookup(&self, args: &[String]) -> CommandOutput {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.lookups.lock().unwrap().push(args.to_vec());

        if self.fail_lookups.load(Ordering::SeqCst) {
            return CommandOutput::failed(9, ";; connection timed out; no servers could be reached");
        }

        // @server +noall +nosearch +norecurse +section name type -c class [auth]
        let name = fqdn(&args[5]);
        let record_type = &args[6];
        let stdout: String = self
            .records()
            .into_iter()
            .filter(|r| r.name == name && r.record_type.eq_ignore_ascii_case(record_type))
            .map(|r| format!("{}\t{}\t{}\t{}\t{}\n", r.name, r.ttl, r.class, r.record_type, r.wire))
            .collect();
        CommandOutput::ok(stdout)
    }

    fn update(&self, args: &[String]) -> CommandOutput {
        let scratch_path = args.last().cloned().unwrap_or_default();
        let payload = std::fs::read_to_string(&scratch_path).unwrap_or_default();
        self.updates.lock().unwrap().push(UpdateCall {
            args: args.to_vec(),
            payload: payload.clone(),
            scratch_path,
        });

        if self.fail_updates.load(Ordering::SeqCst) {
            return CommandOutput::failed(2, "update failed: REFUSED");
        }

        if !payload.ends_with("send\n") {
            return CommandOutput::failed(1, "incomplete transaction");
        }

        let mut records = self.records.lock().unwrap();
        for line in payload.lines() {
            if let Some((kind, record)) = parse_update_line(line) {
                apply(&mut records, kind, record);
            }
        }
        CommandOutput::ok("")
    }
}

#[async_trait]
impl CommandRunner for FakeNameserver {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        match program {
            "dig" => Ok(self.lookup(args)),
            "nsupdate" => Ok(self.update(args)),
            other => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such program: {}", other),
            )
            .into()),
        }
    }
}

fn fqdn(name: &str) -> String {
    format!("{}.", name.trim_end_matches('.'))
}

/// `update add|delete name ttl class type rdata...`
fn parse_update_line(line: &str) -> Option<(String, StoredRecord)> {
    let mut rest = line;
    let mut fields = Vec::new();
    for _ in 0..6 {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = &rest[end..];
    }
    if fields[0] != "update" {
        return None;
    }
    Some((
        fields[1].to_string(),
        StoredRecord {
            name: fields[2].to_string(),
            ttl: fields[3].parse().ok()?,
            class: fields[4].to_string(),
            record_type: fields[5].to_string(),
            wire: rest.trim().to_string(),
        },
    ))
}

fn apply(records: &mut Vec<StoredRecord>, kind: String, record: StoredRecord) {
    let same_set = |r: &StoredRecord| {
        r.name == record.name && r.class == record.class && r.record_type == record.record_type
    };
    match kind.as_str() {
        "add" if record.record_type == "SOA" => {
            records.retain(|r| !same_set(r));
            records.push(record);
        }
        "add" => {
            if let Some(existing) = records
                .iter_mut()
                .find(|r| same_set(r) && r.wire == record.wire)
            {
                existing.ttl = record.ttl;
            } else {
                records.push(record);
            }
        }
        "delete" => records.retain(|r| !(same_set(r) && r.wire == record.wire)),
        _ => {}
    }
}

/// Build a reconciler wired to the fake server
pub fn reconciler(record: RecordConfig, server: &Arc<FakeNameserver>) -> Reconciler {
    Reconciler::new(
        record,
        &ReconcilerOptions::default(),
        Arc::clone(server) as Arc<dyn CommandRunner>,
    )
    .expect("reconciler construction succeeds")
}

/// Update lines of a payload, in order
pub fn update_lines(payload: &str) -> Vec<String> {
    payload
        .lines()
        .filter(|l| l.starts_with("update "))
        .map(str::to_string)
        .collect()
}
