//! Replication Module Tests
//!
//! Validates the fan-out wire format (set via `/replicate`, delete via a marked
//! `/delete`), per-child failure isolation and the optional retry policy.

#[cfg(test)]
mod tests {
    use crate::node::protocol::{KeyQuery, REPLICATION_HEADER, ReplicateRequest};
    use crate::replication::fanout::{DeliveryReport, Mutation, Replicator, RetryPolicy};
    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::{delete, post},
    };
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq)]
    enum Received {
        Set { key: String, value: String },
        Delete { key: String, marked: bool },
    }

    async fn spawn_server(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn unreachable_addr() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    /// A child that records every replication request it receives.
    async fn recording_child() -> (SocketAddr, Arc<Mutex<Vec<Received>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set_log = log.clone();
        let delete_log = log.clone();

        let app = Router::new()
            .route(
                "/replicate",
                post(move |Json(req): Json<ReplicateRequest>| {
                    let log = set_log.clone();
                    async move {
                        log.lock().unwrap().push(Received::Set {
                            key: req.key.unwrap_or_default(),
                            value: req.value.unwrap_or_default(),
                        });
                        StatusCode::OK
                    }
                }),
            )
            .route(
                "/delete",
                delete(move |headers: HeaderMap, Query(query): Query<KeyQuery>| {
                    let log = delete_log.clone();
                    async move {
                        let marked = headers
                            .get(REPLICATION_HEADER)
                            .map(|v| v == "true")
                            .unwrap_or(false);
                        log.lock().unwrap().push(Received::Delete {
                            key: query.key.unwrap_or_default(),
                            marked,
                        });
                        StatusCode::OK
                    }
                }),
            );

        (spawn_server(app).await, log)
    }

    fn replicator_with_reports() -> (Replicator, mpsc::UnboundedReceiver<DeliveryReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let replicator = Replicator::new(Duration::from_secs(1)).with_reports(tx);
        (replicator, rx)
    }

    async fn collect(rx: &mut mpsc::UnboundedReceiver<DeliveryReport>, n: usize) -> Vec<DeliveryReport> {
        let mut reports = Vec::new();
        for _ in 0..n {
            let report = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("delivery report timed out")
                .expect("report channel closed");
            reports.push(report);
        }
        reports
    }

    // ============================================================
    // WIRE FORMAT
    // ============================================================

    #[tokio::test]
    async fn test_fan_out_set_reaches_every_child() {
        let (c1, log1) = recording_child().await;
        let (c2, log2) = recording_child().await;
        let (replicator, mut rx) = replicator_with_reports();

        let spawned = replicator.fan_out_set(
            vec![c1.to_string(), c2.to_string()],
            "name".to_string(),
            "alice".to_string(),
        );
        assert_eq!(spawned, 2);

        let reports = collect(&mut rx, 2).await;
        assert!(reports.iter().all(|r| r.result.is_ok()));
        assert_eq!(reports[0].op_id, reports[1].op_id, "One op id per fan-out");

        let expected = Received::Set {
            key: "name".to_string(),
            value: "alice".to_string(),
        };
        assert_eq!(*log1.lock().unwrap(), vec![expected.clone()]);
        assert_eq!(*log2.lock().unwrap(), vec![expected]);
    }

    #[tokio::test]
    async fn test_fan_out_delete_carries_replication_marker() {
        let (child, log) = recording_child().await;
        let (replicator, mut rx) = replicator_with_reports();

        replicator.fan_out_delete(vec![child.to_string()], "a key&more".to_string());
        collect(&mut rx, 1).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![Received::Delete {
                key: "a key&more".to_string(),
                marked: true,
            }],
            "Key must survive query encoding and the delete must be marked"
        );
    }

    #[tokio::test]
    async fn test_fan_out_with_no_children_spawns_nothing() {
        let (replicator, mut rx) = replicator_with_reports();

        let spawned = replicator.fan_out(
            vec![],
            Mutation::Delete {
                key: "k".to_string(),
            },
        );

        assert_eq!(spawned, 0);
        assert!(rx.try_recv().is_err());
    }

    // ============================================================
    // FAILURE ISOLATION
    // ============================================================

    #[tokio::test]
    async fn test_failed_child_does_not_affect_others() {
        let (good, log) = recording_child().await;
        let bad = unreachable_addr().await;
        let (replicator, mut rx) = replicator_with_reports();

        replicator.fan_out_set(
            vec![bad.to_string(), good.to_string()],
            "k".to_string(),
            "v".to_string(),
        );

        let reports = collect(&mut rx, 2).await;
        let bad_report = reports.iter().find(|r| r.target == bad.to_string()).unwrap();
        let good_report = reports.iter().find(|r| r.target == good.to_string()).unwrap();

        assert!(bad_report.result.is_err());
        assert!(good_report.result.is_ok());
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejecting_child_is_reported_as_failure() {
        let app = Router::new().route(
            "/replicate",
            post(|| async { StatusCode::BAD_REQUEST }),
        );
        let child = spawn_server(app).await;
        let (replicator, mut rx) = replicator_with_reports();

        replicator.fan_out_set(vec![child.to_string()], "k".to_string(), "v".to_string());

        let reports = collect(&mut rx, 1).await;
        assert!(reports[0].result.is_err());
    }

    #[tokio::test]
    async fn test_fan_out_returns_before_delivery() {
        let app = Router::new().route(
            "/replicate",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                StatusCode::OK
            }),
        );
        let child = spawn_server(app).await;
        let (replicator, mut rx) = replicator_with_reports();

        let started = std::time::Instant::now();
        replicator.fan_out_set(vec![child.to_string()], "k".to_string(), "v".to_string());
        assert!(
            started.elapsed() < Duration::from_millis(100),
            "Fan-out must not wait for the child"
        );

        let reports = collect(&mut rx, 1).await;
        assert!(reports[0].result.is_ok());
    }

    // ============================================================
    // RETRY POLICY
    // ============================================================

    #[test]
    fn test_default_policy_is_single_attempt() {
        assert_eq!(RetryPolicy::default().attempts, 1);
        assert_eq!(RetryPolicy::with_attempts(0).attempts, 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::with_attempts(5);

        assert_eq!(policy.backoff(0), Duration::from_millis(150));
        assert_eq!(policy.backoff(1), Duration::from_millis(300));
        assert_eq!(policy.backoff(2), Duration::from_millis(600));
        assert_eq!(policy.backoff(3), Duration::from_millis(1200));
        assert_eq!(policy.backoff(10), Duration::from_millis(1200));
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_attempts() {
        let bad = unreachable_addr().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let replicator = Replicator::new(Duration::from_millis(200))
            .with_retry(RetryPolicy {
                attempts: 3,
                initial_backoff: Duration::from_millis(10),
                max_backoff: Duration::from_millis(20),
            })
            .with_reports(tx);

        replicator.fan_out_delete(vec![bad.to_string()], "k".to_string());

        let reports = collect(&mut rx, 1).await;
        assert!(reports[0].result.is_err());
        assert_eq!(reports[0].mutation.key(), "k");
    }
}
