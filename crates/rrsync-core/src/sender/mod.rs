//! Delivery of transactions to the update tool
//!
//! The rendered transaction is written to a scratch file and handed to the
//! update tool together with the selected [`AuthMode`]. The scratch file is a
//! [`tempfile::NamedTempFile`], removed when it goes out of scope on every
//! exit path.
//!
//! # Dry-Run Mode
//!
//! When `dry_run` is set the sender logs the payload it would have sent and
//! returns [`Delivery::DryRun`] without touching the server.

use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::AuthMode;
use crate::error::{Error, Result};
use crate::runner::masked_command_line;
use crate::traits::CommandRunner;
use crate::transaction::Transaction;

/// What happened to a transaction handed to the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The update tool accepted the transaction
    Sent,
    /// Dry-run mode: nothing was sent
    DryRun,
}

/// Hands transactions to the update tool
pub struct TransactionSender {
    nsupdate: String,
    runner: Arc<dyn CommandRunner>,
    dry_run: bool,
}

impl TransactionSender {
    pub fn new(nsupdate: impl Into<String>, runner: Arc<dyn CommandRunner>, dry_run: bool) -> Self {
        Self {
            nsupdate: nsupdate.into(),
            runner,
            dry_run,
        }
    }

    /// Send one transaction
    ///
    /// A failure carries both the tool's error and the attempted payload.
    /// Nothing is retried.
    pub async fn send(&self, transaction: &Transaction, auth: &AuthMode) -> Result<Delivery> {
        if transaction.is_empty() {
            return Err(Error::invalid_input(format!(
                "transaction for {} has no operations",
                transaction.server
            )));
        }
        let payload = transaction.render();

        if self.dry_run {
            info!(
                server = %transaction.server,
                operations = transaction.operations.len(),
                "[DRY-RUN] Would send transaction:\n{}",
                payload
            );
            return Ok(Delivery::DryRun);
        }

        let mut file = tempfile::Builder::new()
            .prefix(&format!("rrsync-nsupdate-{}-", sanitize(&transaction.server)))
            .tempfile()?;
        file.write_all(payload.as_bytes())?;
        file.flush()?;

        let mut args = auth.args();
        args.push(file.path().to_string_lossy().into_owned());

        debug!(
            path = %file.path().display(),
            auth = auth.label(),
            "Wrote transaction:\n{}",
            payload
        );

        let result = self.runner.run(&self.nsupdate, &args).await;
        // scratch file is removed here on success and failure alike
        drop(file);

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                warn!("Error running {}: {}", self.nsupdate, e);
                warn!("Transaction contents:\n{}", payload);
                return Err(Error::transaction(e.to_string(), payload));
            }
        };

        if !output.success() {
            let message = format!(
                "{} failed with {}",
                masked_command_line(&self.nsupdate, &auth.args()),
                output.failure_message()
            );
            warn!("Error running update: {}", message);
            warn!("Transaction contents:\n{}", payload);
            return Err(Error::transaction(message, payload));
        }

        info!(
            server = %transaction.server,
            operations = transaction.operations.len(),
            "Transaction committed"
        );
        Ok(Delivery::Sent)
    }
}

/// Keep server names safe for use in a file name prefix
fn sanitize(server: &str) -> String {
    server
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
