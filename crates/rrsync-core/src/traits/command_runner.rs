// # Command Runner Trait
//
// Defines the interface for running the external DNS tools.
//
// ## Implementations
//
// - `ProcessRunner`: spawns real processes via `tokio::process`
// - Test doubles: scripted runners and fake nameservers in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use rrsync_core::CommandRunner;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let runner = /* CommandRunner implementation */;
//
//     let output = runner
//         .run("dig", &["@ns1.example.com".to_string(), "example.com".to_string()])
//         .await?;
//
//     if output.success() {
//         println!("{}", output.stdout);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Captured result of one external command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit status (`None` if terminated by a signal)
    pub status: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit status and stderr
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status zero
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Human-readable failure description for error messages
    pub fn failure_message(&self) -> String {
        let status = match self.status {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        if detail.is_empty() {
            status
        } else {
            format!("{}: {}", status, detail)
        }
    }
}

/// Trait for running external commands
///
/// The query client and the transaction sender receive a runner instead of
/// resolving tool paths themselves, so tests can substitute a fake transport.
///
/// # Contract
///
/// - A non-zero exit is reported as `Ok(CommandOutput)` with that status;
///   callers decide what failure means.
/// - `Err` is reserved for failing to run the program at all.
/// - Runners must not retry.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and wait for it to finish
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, crate::Error>;
}
