//! HAProxy runtime API adapter.
//!
//! # Responsibilities
//! - Discover admin sockets (one per HAProxy process) in a directory
//! - Read backend snapshots with `show stat`
//! - Change server weights with `set weight` on every process
//!
//! Each socket exchange is one command per connection, bounded by the
//! configured timeout.

use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::config::BalancerConfig;
use crate::load_balancer::stats::{merge_processes, parse_stats};
use crate::load_balancer::{BackendGroup, BalancerAdapter, BalancerError, BalancerResult, Weight};

/// Balancer adapter speaking HAProxy's runtime API.
#[derive(Debug, Clone)]
pub struct HaproxyAdmin {
    socket_dir: PathBuf,
    timeout: Duration,
}

impl HaproxyAdmin {
    pub fn new(config: &BalancerConfig) -> Self {
        Self {
            socket_dir: PathBuf::from(&config.socket_dir),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Admin sockets in the socket directory, sorted by path.
    pub async fn sockets(&self) -> BalancerResult<Vec<PathBuf>> {
        let dir_name = self.socket_dir.display().to_string();
        let mut entries = tokio::fs::read_dir(&self.socket_dir)
            .await
            .map_err(|source| BalancerError::Io { socket: dir_name.clone(), source })?;

        let mut sockets = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => return Err(BalancerError::Io { socket: dir_name, source }),
            };
            match entry.file_type().await {
                Ok(kind) if kind.is_socket() => sockets.push(entry.path()),
                Ok(_) => {}
                Err(e) => tracing::debug!(path = ?entry.path(), error = %e, "Skipping unreadable entry"),
            }
        }

        if sockets.is_empty() {
            return Err(BalancerError::NoSockets(dir_name));
        }
        sockets.sort();
        Ok(sockets)
    }

    /// Send one command and return the full reply.
    pub async fn command(&self, socket: &Path, command: &str) -> BalancerResult<String> {
        let name = socket.display().to_string();
        let io_err = |source: std::io::Error| BalancerError::Io { socket: name.clone(), source };

        let exchange = async {
            let mut stream = UnixStream::connect(socket).await.map_err(io_err)?;
            stream.write_all(format!("{}\n", command).as_bytes()).await.map_err(io_err)?;
            let mut reply = String::new();
            stream.read_to_string(&mut reply).await.map_err(io_err)?;
            Ok::<_, BalancerError>(reply)
        };

        match timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(BalancerError::Timeout(name.clone())),
        }
    }
}

#[async_trait]
impl BalancerAdapter for HaproxyAdmin {
    async fn groups(&self) -> BalancerResult<Vec<BackendGroup>> {
        let mut per_process = Vec::new();
        for socket in self.sockets().await? {
            let reply = self.command(&socket, "show stat").await?;
            per_process.push(parse_stats(&reply)?);
        }
        Ok(merge_processes(per_process))
    }

    async fn set_weight(&self, backend: &str, server: &str, weight: Weight) -> BalancerResult<()> {
        let command = format!("set weight {}/{} {}", backend, server, weight);
        for socket in self.sockets().await? {
            let reply = self.command(&socket, &command).await?;
            let reply = reply.trim();
            if !reply.is_empty() {
                return Err(BalancerError::Command { command, reply: reply.to_string() });
            }
        }
        tracing::debug!(backend = %backend, server = %server, weight = weight.get(), "Server weight set");
        Ok(())
    }
}
