// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-isolated plugins.
//!
//! [`ProcessLoader`] spawns a plugin's entry file as a child process with
//! stdin and stdout piped, asks it to describe itself, and wraps it in a
//! [`ProcessPlugin`]. Hooks are forwarded as single JSONL exchanges. The
//! child is killed when the plugin is dropped.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use atlas_core::{
    AtlasError, Capabilities, Capability, ExternalPlugin, HealthReport, HealthStatus,
    PluginConfig, PluginManifest, PluginModuleLoader, SinkPlugin, SourcePlugin, WorkflowPlugin,
};

use crate::protocol::{DescribeReply, HookReply, HostMessage};

/// Tracing target for plugin process operations.
const PROCESS_TARGET: &str = "atlas_plugin::process";

/// Loads plugins by running their entry file as a child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLoader;

#[async_trait]
impl PluginModuleLoader for ProcessLoader {
    async fn load(
        &self,
        manifest: &PluginManifest,
        plugin_dir: &Path,
    ) -> Result<Box<dyn ExternalPlugin>, AtlasError> {
        let plugin = ProcessPlugin::spawn(manifest, plugin_dir).await?;
        Ok(Box::new(plugin))
    }
}

/// Builds the command for an entry file, choosing an interpreter by extension.
fn command_for(entry: &Path) -> Command {
    let interpreter = match entry.extension().and_then(|ext| ext.to_str()) {
        Some("js" | "mjs" | "cjs") => Some("node"),
        Some("py") => Some("python3"),
        Some("sh") => Some("sh"),
        _ => None,
    };
    match interpreter {
        Some(program) => {
            let mut command = Command::new(program);
            command.arg(entry);
            command
        }
        None => Command::new(entry),
    }
}

fn process_error(
    plugin: &str,
    message: impl Into<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
) -> AtlasError {
    AtlasError::Process {
        plugin: plugin.to_string(),
        message: message.into(),
        source,
    }
}

fn protocol_error(
    plugin: &str,
    message: impl Into<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
) -> AtlasError {
    AtlasError::Protocol {
        plugin: plugin.to_string(),
        message: message.into(),
        source,
    }
}

/// Request/reply pipe to a running plugin.
struct Channel {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl Channel {
    async fn exchange<T: DeserializeOwned>(
        &mut self,
        plugin: &str,
        message: &HostMessage,
    ) -> Result<T, AtlasError> {
        let mut line = serde_json::to_string(message)
            .map_err(|e| protocol_error(plugin, "failed to encode message", Some(Box::new(e))))?;
        line.push('\n');

        debug!(target: PROCESS_TARGET, plugin_id = plugin, bytes = line.len(), "writing to plugin stdin");
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| process_error(plugin, "failed to write to plugin stdin", Some(Box::new(e))))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| process_error(plugin, "failed to flush plugin stdin", Some(Box::new(e))))?;

        let reply = self
            .stdout
            .next_line()
            .await
            .map_err(|e| process_error(plugin, "failed to read plugin stdout", Some(Box::new(e))))?
            .ok_or_else(|| protocol_error(plugin, "plugin closed stdout before replying", None))?;

        serde_json::from_str(&reply).map_err(|e| {
            protocol_error(
                plugin,
                format!("invalid reply line: {reply}"),
                Some(Box::new(e)),
            )
        })
    }
}

/// Forwards the plugin's stderr into the log until the pipe closes.
async fn forward_stderr(plugin: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: PROCESS_TARGET, plugin_id = %plugin, "{line}");
    }
}

/// A plugin running as a child process.
pub struct ProcessPlugin {
    manifest: PluginManifest,
    capabilities: Capabilities,
    sources: Vec<SourcePlugin>,
    workflows: Vec<WorkflowPlugin>,
    sinks: Vec<SinkPlugin>,
    channel: Mutex<Channel>,
    child: Mutex<Child>,
}

impl ProcessPlugin {
    /// Spawns the entry file and performs the describe exchange.
    ///
    /// `manifest` is used when the plugin does not describe its own.
    pub async fn spawn(manifest: &PluginManifest, plugin_dir: &Path) -> Result<Self, AtlasError> {
        let id = manifest.id.as_str();
        let entry = plugin_dir.join(&manifest.entry);

        let mut command = command_for(&entry);
        command
            .current_dir(plugin_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            target: PROCESS_TARGET,
            plugin_id = id,
            entry = %entry.display(),
            "spawning plugin process"
        );

        let mut child = command.spawn().map_err(|e| {
            process_error(
                id,
                format!("failed to spawn {}", entry.display()),
                Some(Box::new(e)),
            )
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| process_error(id, "failed to capture stdin", None))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| process_error(id, "failed to capture stdout", None))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(id.to_string(), stderr));
        }

        let mut channel = Channel {
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };
        let reply: DescribeReply = channel.exchange(id, &HostMessage::Describe).await?;

        let DescribeReply {
            manifest: declared,
            capabilities,
            sources,
            workflows,
            sinks,
        } = reply;

        Ok(Self {
            manifest: declared.unwrap_or_else(|| manifest.clone()),
            capabilities,
            sources,
            workflows,
            sinks,
            channel: Mutex::new(channel),
            child: Mutex::new(child),
        })
    }

    async fn call(&self, hook: Capability, message: HostMessage) -> Result<HookReply, AtlasError> {
        let reply: HookReply = self
            .channel
            .lock()
            .await
            .exchange(&self.manifest.id, &message)
            .await?;

        if reply.ok {
            Ok(reply)
        } else {
            Err(AtlasError::Hook {
                plugin: self.manifest.id.clone(),
                hook,
                message: reply
                    .error
                    .unwrap_or_else(|| format!("{hook} hook reported failure")),
                details: reply.details,
            })
        }
    }

    /// Kills the child if it is still running.
    async fn stop(&self) {
        let mut child = self.child.lock().await;
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(target: PROCESS_TARGET, plugin_id = %self.manifest.id, %status, "plugin process exited");
            }
            _ => {
                if let Err(e) = child.kill().await {
                    warn!(
                        target: PROCESS_TARGET,
                        plugin_id = %self.manifest.id,
                        error = %e,
                        "failed to kill plugin process"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl ExternalPlugin for ProcessPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn sources(&self) -> &[SourcePlugin] {
        &self.sources
    }

    fn workflows(&self) -> &[WorkflowPlugin] {
        &self.workflows
    }

    fn sinks(&self) -> &[SinkPlugin] {
        &self.sinks
    }

    async fn initialize(&self, config: &PluginConfig) -> Result<(), AtlasError> {
        self.call(
            Capability::Initialize,
            HostMessage::Initialize {
                config: config.clone(),
            },
        )
        .await
        .map(|_| ())
    }

    async fn shutdown(&self) -> Result<(), AtlasError> {
        let result = self.call(Capability::Shutdown, HostMessage::Shutdown).await;
        // The plugin has acknowledged (or failed) shutdown; it gets no more messages.
        self.stop().await;
        result.map(|_| ())
    }

    async fn health(&self) -> Result<HealthReport, AtlasError> {
        let reply = self.call(Capability::Health, HostMessage::Health).await?;
        Ok(HealthReport {
            status: reply.status.unwrap_or(HealthStatus::Healthy),
            details: reply.details,
        })
    }
}
