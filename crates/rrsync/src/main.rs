// # rrsync - DNS record reconciler
//
// This is a THIN integration layer: all reconciliation logic lives in
// rrsync-core. The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Loading the declared records
// 3. Initializing logging and the runtime
// 4. Reconciling each record in turn and reporting the result
//
// ## Configuration
//
// - `RRSYNC_RECORDS`: Path to a JSON array of record declarations (required)
// - `RRSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `RRSYNC_DRY_RUN`: Log transactions instead of sending them (1/true)
// - `RRSYNC_DIG`: Lookup tool (default: dig)
// - `RRSYNC_NSUPDATE`: Update tool (default: nsupdate)
//
// ## Example
//
// ```bash
// cat > /etc/rrsync/records.json <<'JSON'
// [
//   {
//     "record": "www.example.com",
//     "type": "A",
//     "ttl": 300,
//     "data": ["192.0.2.10", "192.0.2.11"],
//     "server": "ns1.example.com",
//     "zone": "example.com",
//     "keyfile": "/etc/bind/update.key"
//   }
// ]
// JSON
//
// export RRSYNC_RECORDS=/etc/rrsync/records.json
// rrsync
// ```

use anyhow::{Context, Result};
use rrsync_core::{
    CommandRunner, ProcessRunner, ReconcileOutcome, RecordConfig, ReconcilerOptions, Reconciler,
    ToolPaths,
};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum RrsyncExitCode {
    /// Every record converged
    Converged = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// At least one record failed to reconcile
    ReconcileFailed = 2,
}

impl From<RrsyncExitCode> for ExitCode {
    fn from(code: RrsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    records_path: String,
    log_level: String,
    dry_run: bool,
    tools: ToolPaths,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let defaults = ToolPaths::default();
        Ok(Self {
            records_path: env::var("RRSYNC_RECORDS").context(
                "RRSYNC_RECORDS is required. \
                Set it via: export RRSYNC_RECORDS=/etc/rrsync/records.json",
            )?,
            log_level: env::var("RRSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dry_run: env::var("RRSYNC_DRY_RUN")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            tools: ToolPaths {
                dig: env::var("RRSYNC_DIG").unwrap_or(defaults.dig),
                nsupdate: env::var("RRSYNC_NSUPDATE").unwrap_or(defaults.nsupdate),
            },
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.records_path.trim().is_empty() {
            anyhow::bail!("RRSYNC_RECORDS cannot be empty");
        }

        if self.tools.dig.trim().is_empty() || self.tools.nsupdate.trim().is_empty() {
            anyhow::bail!("RRSYNC_DIG and RRSYNC_NSUPDATE cannot be empty when set");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "RRSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Read and validate the declared records
    fn load_records(&self) -> Result<Vec<RecordConfig>> {
        let text = std::fs::read_to_string(&self.records_path)
            .with_context(|| format!("Failed to read records file {}", self.records_path))?;
        let records: Vec<RecordConfig> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse records file {}", self.records_path))?;

        if records.is_empty() {
            anyhow::bail!("{} declares no records", self.records_path);
        }

        for record in &records {
            record.validate().with_context(|| {
                format!("Invalid record {} ({})", record.name, record.record_type)
            })?;
        }

        Ok(records)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return RrsyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return RrsyncExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RrsyncExitCode::ConfigError.into();
    }

    let records = match config.load_records() {
        Ok(records) => records,
        Err(e) => {
            error!("{:#}", e);
            return RrsyncExitCode::ConfigError.into();
        }
    };

    info!(
        "Loaded {} record(s) from {}{}",
        records.len(),
        config.records_path,
        if config.dry_run { " [DRY-RUN]" } else { "" }
    );

    // One reconciliation at a time; a single-threaded runtime is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RrsyncExitCode::ConfigError.into();
        }
    };

    let options = ReconcilerOptions {
        tools: config.tools.clone(),
        dry_run: config.dry_run,
    };

    rt.block_on(reconcile_all(records, options)).into()
}

/// Reconcile every record, continuing past failures
async fn reconcile_all(records: Vec<RecordConfig>, options: ReconcilerOptions) -> RrsyncExitCode {
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new());
    let mut failures = 0usize;

    for record in records {
        let label = format!("{} {} {}", record.fqdn(), record.rrclass, record.record_type);

        let reconciler = match Reconciler::new(record, &options, Arc::clone(&runner)) {
            Ok(reconciler) => reconciler,
            Err(e) => {
                error!("{}: {}", label, e);
                failures += 1;
                continue;
            }
        };

        match reconciler.reconcile().await {
            Ok(ReconcileOutcome::InSync) => info!("{}: in sync", label),
            Ok(ReconcileOutcome::Committed { changes, .. }) => info!(
                "{}: committed {} add(s), {} delete(s)",
                label,
                changes.adds().len(),
                changes.deletes().len()
            ),
            Ok(ReconcileOutcome::DryRun { changes, .. }) => info!(
                "{}: [DRY-RUN] {} add(s), {} delete(s) pending",
                label,
                changes.adds().len(),
                changes.deletes().len()
            ),
            Err(e) => {
                error!("{}: {}", label, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        error!("{} record(s) failed to reconcile", failures);
        RrsyncExitCode::ReconcileFailed
    } else {
        RrsyncExitCode::Converged
    }
}
