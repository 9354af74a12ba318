//! Record reconciler
//!
//! The Reconciler is responsible for:
//! - Querying the authoritative server for the current record set
//! - Diffing it against the declared record
//! - Building one update transaction per pass
//! - Handing the transaction to the sender
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   current    ┌──────────────┐  ChangeSet  ┌──────────────┐
//! │ QueryClient  │ ───────────▶ │    diff      │ ──────────▶ │ Transaction  │
//! │ (+ cache)    │              │              │             │  (render)    │
//! └──────────────┘              └──────────────┘             └──────────────┘
//!                                                                    │
//!                                                                    ▼
//!                                                           ┌──────────────────┐
//!                                                           │TransactionSender │
//!                                                           └──────────────────┘
//! ```
//!
//! ## Passes
//!
//! Every call to [`Reconciler::reconcile`] or [`Reconciler::begin`] opens a
//! fresh [`ReconcilePass`]. The query result is cached inside the pass only;
//! nothing survives from one pass to the next.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::AuthMode;
use crate::config::{Ensure, RecordConfig, ReconcilerOptions};
use crate::diff::{self, ChangeSet, Desired};
use crate::error::Result;
use crate::query::{QueryCache, QueryClient, ResourceRecord};
use crate::sender::{Delivery, TransactionSender};
use crate::traits::CommandRunner;
use crate::transaction::Transaction;

/// Steps of one top-level reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Querying,
    Diffing,
    Building,
    Sending,
    Committed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Querying => "querying",
            Phase::Diffing => "diffing",
            Phase::Building => "building",
            Phase::Sending => "sending",
            Phase::Committed => "committed",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a top-level reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The server already matches; nothing was sent
    InSync,
    /// The transaction was committed
    Committed {
        changes: ChangeSet,
        transaction: Transaction,
    },
    /// Dry-run mode: the transaction was only logged
    DryRun {
        changes: ChangeSet,
        transaction: Transaction,
    },
}

impl ReconcileOutcome {
    /// Operations computed for this pass (empty when in sync)
    pub fn changes(&self) -> Option<&ChangeSet> {
        match self {
            ReconcileOutcome::InSync => None,
            ReconcileOutcome::Committed { changes, .. }
            | ReconcileOutcome::DryRun { changes, .. } => Some(changes),
        }
    }
}

/// Property changes requested during a pass, applied by [`ReconcilePass::flush`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChanges {
    pub ttl: Option<u32>,
    pub data: Option<BTreeSet<String>>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.ttl.is_none() && self.data.is_none()
    }
}

/// Reconciles one declared record against its authoritative server
pub struct Reconciler {
    record: RecordConfig,
    auth: AuthMode,
    client: QueryClient,
    sender: TransactionSender,
}

impl Reconciler {
    /// Create a reconciler, validating the record configuration
    ///
    /// Configuration errors are reported here, before anything is queried.
    pub fn new(
        record: RecordConfig,
        options: &ReconcilerOptions,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        record.validate()?;

        let auth = AuthMode::from_target(&record.target);
        let client = QueryClient::new(options.tools.dig.clone(), Arc::clone(&runner));
        let sender =
            TransactionSender::new(options.tools.nsupdate.clone(), runner, options.dry_run);

        Ok(Self {
            record,
            auth,
            client,
            sender,
        })
    }

    /// Open a new pass with an empty query cache
    pub fn begin(&self) -> ReconcilePass<'_> {
        ReconcilePass {
            reconciler: self,
            cache: QueryCache::new(),
            pending: PendingChanges::default(),
        }
    }

    /// Converge the server to the declared record in one pass
    pub async fn reconcile(&self) -> Result<ReconcileOutcome> {
        self.log_phase(Phase::Idle);
        let pass = self.begin();
        let result = pass.converge().await;
        let phase = if result.is_ok() {
            Phase::Committed
        } else {
            Phase::Failed
        };
        debug!(record = %self.record.fqdn(), %phase, "Reconciliation finished");
        result
    }

    fn desired<'a>(&'a self, ttl: u32, data: &'a BTreeSet<String>) -> Desired<'a> {
        Desired {
            name: &self.record.name,
            record_type: &self.record.record_type,
            class: &self.record.rrclass,
            ttl,
            data,
            ensure: self.record.ensure,
        }
    }

    async fn send(&self, changes: ChangeSet) -> Result<ReconcileOutcome> {
        if changes.is_empty() {
            debug!(record = %self.record.fqdn(), "No operations to send");
            return Ok(ReconcileOutcome::InSync);
        }
        let transaction = Transaction::for_record(&self.record)
            .with_operations(changes.operations().to_vec());
        self.log_phase(Phase::Sending);
        match self.sender.send(&transaction, &self.auth).await? {
            Delivery::Sent => Ok(ReconcileOutcome::Committed {
                changes,
                transaction,
            }),
            Delivery::DryRun => Ok(ReconcileOutcome::DryRun {
                changes,
                transaction,
            }),
        }
    }

    fn log_phase(&self, phase: Phase) {
        debug!(
            record = %self.record.fqdn(),
            record_type = %self.record.record_type,
            %phase,
            "Reconciliation phase"
        );
    }
}

/// One reconciliation pass: a query cache plus pending property changes
///
/// Mirrors the lifecycle a configuration-management provider drives:
/// `exists` / `create` / `destroy`, property getters and setters, `flush`.
pub struct ReconcilePass<'a> {
    reconciler: &'a Reconciler,
    cache: QueryCache,
    pending: PendingChanges,
}

impl<'a> ReconcilePass<'a> {
    /// Records currently published at the name (queried once per pass)
    pub async fn current(&self) -> Result<&[ResourceRecord]> {
        let r = self.reconciler;
        self.cache.get_or_query(&r.client, &r.record).await
    }

    /// Whether any record is published at the name
    pub async fn exists(&self) -> Result<bool> {
        Ok(!self.current().await?.is_empty())
    }

    /// TTL reported for the first current record
    pub async fn ttl(&self) -> Result<Option<u32>> {
        Ok(self.current().await?.first().map(|r| r.ttl))
    }

    /// Current canonical values, sorted
    pub async fn data(&self) -> Result<Vec<String>> {
        let mut data: Vec<String> = self.current().await?.iter().map(|r| r.rdata.clone()).collect();
        data.sort();
        Ok(data)
    }

    pub fn set_ttl(&mut self, ttl: u32) {
        self.pending.ttl = Some(ttl);
    }

    pub fn set_data<I, S>(&mut self, data: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending.data = Some(data.into_iter().map(Into::into).collect());
    }

    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    /// Send the adds needed to bring the record into existence
    ///
    /// Reports [`ReconcileOutcome::InSync`] without sending when nothing is missing.
    pub async fn create(&self) -> Result<ReconcileOutcome> {
        let changes = self.changes().await?.adds_only();
        self.reconciler.send(changes).await
    }

    /// Send deletes for every value currently published
    pub async fn destroy(&self) -> Result<ReconcileOutcome> {
        let r = self.reconciler;
        let data = BTreeSet::new();
        let mut desired = r.desired(r.record.ttl, &data);
        desired.ensure = Ensure::Absent;
        let changes = diff::compute(&desired, self.current().await?);
        r.send(changes).await
    }

    /// Apply pending property changes in one transaction (adds, then deletes)
    ///
    /// Does nothing when no property was changed during this pass.
    pub async fn flush(&self) -> Result<Option<ReconcileOutcome>> {
        if self.pending.is_empty() {
            debug!(record = %self.reconciler.record.fqdn(), "Nothing pending, skipping flush");
            return Ok(None);
        }
        let changes = self.changes().await?;
        self.reconciler.send(changes).await.map(Some)
    }

    /// Diff the desired state (pending values over declared ones) against the server
    pub async fn changes(&self) -> Result<ChangeSet> {
        let r = self.reconciler;
        let ttl = self.pending.ttl.unwrap_or(r.record.ttl);
        let data = self.pending.data.as_ref().unwrap_or(&r.record.data);
        let current = self.current().await?;
        Ok(diff::compute(&r.desired(ttl, data), current))
    }

    async fn converge(&self) -> Result<ReconcileOutcome> {
        let r = self.reconciler;

        r.log_phase(Phase::Querying);
        self.current().await?;

        r.log_phase(Phase::Diffing);
        let changes = self.changes().await?;
        if changes.is_empty() {
            debug!(record = %r.record.fqdn(), "Record set already converged");
            return Ok(ReconcileOutcome::InSync);
        }

        r.log_phase(Phase::Building);
        info!(
            record = %r.record.fqdn(),
            record_type = %r.record.record_type,
            adds = changes.adds().len(),
            deletes = changes.deletes().len(),
            "Record set differs from declared state"
        );
        r.send(changes).await
    }
}
