// # rrsync-core
//
// Core library for reconciling declared DNS resource records against an
// authoritative nameserver with dynamic updates (RFC 2136).
//
// ## Architecture Overview
//
// - **codec**: Type-aware canonicalization of rdata (quoting, escaping, spacing)
// - **QueryClient**: Non-recursive lookup of the current record set
// - **diff**: Computes the ordered add/delete operations for convergence
// - **Transaction**: Renders operations into an update transaction
// - **TransactionSender**: Hands a transaction to the update tool
// - **Reconciler**: Orchestrates query → diff → build → send for one record
// - **CommandRunner**: Injected capability for running the external tools
//
// ## Design Principles
//
// 1. **Minimal change**: Only the values that differ are added or deleted
// 2. **Add before delete**: A still-desired name never goes briefly empty
// 3. **One transaction per pass**: Applied atomically by the server
// 4. **No hidden state**: Query results are cached for one pass only
// 5. **No retry**: Failures are reported to the caller as-is

pub mod auth;
pub mod codec;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod query;
pub mod runner;
pub mod sender;
pub mod traits;
pub mod transaction;

// Re-export core types for convenience
pub use auth::AuthMode;
pub use config::{Ensure, RecordConfig, ReconcilerOptions, TargetConfig, ToolPaths};
pub use diff::ChangeSet;
pub use engine::{PendingChanges, ReconcileOutcome, ReconcilePass, Reconciler};
pub use error::{Error, Result};
pub use query::{QueryCache, QueryClient, ResourceRecord};
pub use runner::ProcessRunner;
pub use sender::{Delivery, TransactionSender};
pub use traits::{CommandOutput, CommandRunner};
pub use transaction::{OperationKind, Transaction, UpdateOperation};
