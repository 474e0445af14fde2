use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::node::protocol::{
    ENDPOINT_DELETE, ENDPOINT_REPLICATE, REPLICATION_HEADER, ReplicateRequest,
};

pub const DEFAULT_REPLICATION_TIMEOUT: Duration = Duration::from_secs(2);

/// A single mutation pushed from a root to its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Set { key: String, value: String },
    Delete { key: String },
}

impl Mutation {
    pub fn key(&self) -> &str {
        match self {
            Mutation::Set { key, .. } | Mutation::Delete { key } => key,
        }
    }
}

/// Outcome of one delivery to one child.
///
/// Only produced when a report channel is attached; the root's request path
/// never waits for these.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub target: String,
    pub op_id: String,
    pub mutation: Mutation,
    pub result: Result<(), String>,
}

/// Bounded retry for transport failures.
///
/// The default is a single attempt: a lost push stays lost until the child's
/// next snapshot pull.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            initial_backoff: Duration::from_millis(150),
            max_backoff: Duration::from_millis(1200),
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(attempts: usize) -> Self {
        Self {
            attempts: attempts.max(1),
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry` (0-based), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Fire-and-forget push of mutations to children.
///
/// Every call to [`Replicator::fan_out`] spawns one independent task per target
/// and returns immediately. Failures are logged and, if a report channel is
/// attached, reported; they never reach the caller.
#[derive(Debug, Clone)]
pub struct Replicator {
    http_client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
    reports: Option<mpsc::UnboundedSender<DeliveryReport>>,
}

impl Default for Replicator {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICATION_TIMEOUT)
    }
}

impl Replicator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            timeout,
            retry: RetryPolicy::default(),
            reports: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<DeliveryReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn fan_out_set(&self, targets: Vec<String>, key: String, value: String) -> usize {
        self.fan_out(targets, Mutation::Set { key, value })
    }

    pub fn fan_out_delete(&self, targets: Vec<String>, key: String) -> usize {
        self.fan_out(targets, Mutation::Delete { key })
    }

    /// Spawns one delivery task per target and returns how many were spawned.
    pub fn fan_out(&self, targets: Vec<String>, mutation: Mutation) -> usize {
        if targets.is_empty() {
            return 0;
        }

        let op_id = Uuid::new_v4().to_string();
        tracing::debug!(
            "Fan-out {} of key '{}' to {} children",
            op_id,
            mutation.key(),
            targets.len()
        );

        let count = targets.len();
        for target in targets {
            let replicator = self.clone();
            let mutation = mutation.clone();
            let op_id = op_id.clone();
            tokio::spawn(async move {
                let result = replicator.deliver(&target, &op_id, &mutation).await;
                if let Err(e) = &result {
                    tracing::warn!(
                        "Replication of key '{}' to {} failed: {}",
                        mutation.key(),
                        target,
                        e
                    );
                }
                if let Some(reports) = &replicator.reports {
                    let _ = reports.send(DeliveryReport {
                        target,
                        op_id,
                        mutation,
                        result: result.map_err(|e| e.to_string()),
                    });
                }
            });
        }

        count
    }

    async fn deliver(&self, target: &str, op_id: &str, mutation: &Mutation) -> Result<()> {
        let mut retry = 0u32;

        loop {
            match self.send_once(target, op_id, mutation).await {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(anyhow::anyhow!("child answered {}", response.status()));
                    }
                    return Ok(());
                }
                Err(e) => {
                    if retry as usize + 1 >= self.retry.attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    let delay = self.retry.backoff(retry) + Duration::from_millis(jitter);
                    tracing::debug!("Retrying delivery to {} in {:?}", target, delay);
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }

    async fn send_once(
        &self,
        target: &str,
        op_id: &str,
        mutation: &Mutation,
    ) -> reqwest::Result<reqwest::Response> {
        match mutation {
            Mutation::Set { key, value } => {
                let payload = ReplicateRequest {
                    key: Some(key.clone()),
                    value: Some(value.clone()),
                    op_id: Some(op_id.to_string()),
                };
                self.http_client
                    .post(format!("http://{}{}", target, ENDPOINT_REPLICATE))
                    .json(&payload)
                    .timeout(self.timeout)
                    .send()
                    .await
            }
            Mutation::Delete { key } => {
                self.http_client
                    .delete(format!("http://{}{}", target, ENDPOINT_DELETE))
                    .query(&[("key", key.as_str())])
                    .header(REPLICATION_HEADER, "true")
                    .timeout(self.timeout)
                    .send()
                    .await
            }
        }
    }
}
