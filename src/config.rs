//! Node configuration: command-line flags, environment variables and
//! self-address discovery.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::Parser;

use crate::membership::types::Role;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Hierarchical replicated key-value node", long_about = None)]
pub struct NodeArgs {
    /// Run as the root of the tree (the node that owns writes).
    #[arg(long, alias = "parent")]
    pub root: bool,

    /// Address (`host:port`) of the parent node. Required for a child.
    #[arg(long, alias = "parentNode", env = "PARENT_NODE")]
    pub parent_node: Option<String>,

    /// Comma-separated list of child addresses, for a root.
    #[arg(long, alias = "childNodes", value_delimiter = ',')]
    pub child_nodes: Vec<String>,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Interface to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind_ip: IpAddr,

    /// Externally reachable address of this node. Discovered when unset.
    #[arg(long, env = "SELF_ADDRESS")]
    pub self_address: Option<String>,

    /// Timeout of a single replication push, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub replication_timeout_ms: u64,

    /// Delivery attempts per child and mutation (1 = no retry).
    #[arg(long, default_value_t = 1)]
    pub replication_attempts: usize,

    /// Timeout of each join request (register, snapshot), in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub join_timeout_ms: u64,
}

/// Validated configuration a node is constructed from.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub role: Role,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub self_address: Option<String>,
    pub bind_addr: SocketAddr,
    pub replication_timeout: Duration,
    pub replication_attempts: usize,
    pub join_timeout: Duration,
}

impl NodeArgs {
    pub fn into_config(self) -> Result<NodeConfig> {
        let role = if self.root { Role::Root } else { Role::Child };
        let parent = self.parent_node.filter(|p| !p.is_empty());
        let children: Vec<String> = self
            .child_nodes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        match role {
            Role::Child => {
                ensure!(parent.is_some(), "parent node address is not set");
                if !children.is_empty() {
                    tracing::warn!("Ignoring --child-nodes on a child node");
                }
            }
            Role::Root => {
                if let Some(parent) = &parent {
                    tracing::warn!("Ignoring parent node {} on the root node", parent);
                }
            }
        }

        let self_address = match self.self_address.filter(|a| !a.is_empty()) {
            Some(address) => address,
            None => discover_self_address(self.port).context("failed to get self address")?,
        };

        Ok(NodeConfig {
            role,
            parent: if role.is_root() { None } else { parent },
            children: if role.is_root() { children } else { Vec::new() },
            self_address: Some(self_address),
            bind_addr: SocketAddr::new(self.bind_ip, self.port),
            replication_timeout: Duration::from_millis(self.replication_timeout_ms),
            replication_attempts: self.replication_attempts.max(1),
            join_timeout: Duration::from_millis(self.join_timeout_ms),
        })
    }
}

/// Pairs the first non-loopback IPv4 address of this host's network
/// interfaces with `port`.
pub fn discover_self_address(port: u16) -> Result<String> {
    let interfaces = if_addrs::get_if_addrs().context("failed to list network interfaces")?;
    let ip = select_self_ip(interfaces.iter().map(|iface| iface.ip()))
        .ok_or_else(|| anyhow::anyhow!("could not determine self IP address"))?;

    Ok(format!("{}:{}", ip, port))
}

/// First usable IPv4 address in interface order. Loopback, unspecified and
/// IPv6 addresses are skipped.
pub fn select_self_ip(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
        _ => None,
    })
}
