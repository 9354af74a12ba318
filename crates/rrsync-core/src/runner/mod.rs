//! Process-backed [`CommandRunner`]
//!
//! Spawns the external tools with `tokio::process`, capturing stdout and
//! stderr. Timeouts are left to the tools themselves (`dig +time`, `nsupdate -t`).

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::Result;
use crate::traits::{CommandOutput, CommandRunner};

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(program, "Spawning command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Render a command line for logs with any inline TSIG secret masked
pub fn masked_command_line(program: &str, args: &[String]) -> String {
    let mut parts = vec![program.to_string()];
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            parts.push(mask_tsig(arg));
            mask_next = false;
        } else {
            mask_next = arg == "-y";
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

/// `algo:name:secret` -> `algo:name:<REDACTED>`
fn mask_tsig(param: &str) -> String {
    match param.rsplit_once(':') {
        Some((prefix, _)) => format!("{}:<REDACTED>", prefix),
        None => "<REDACTED>".to_string(),
    }
}
