use anyhow::Context;
use clap::Parser;
use hierarchical_kv::config::NodeArgs;
use hierarchical_kv::membership::types::Role;
use hierarchical_kv::node::handlers::router;
use hierarchical_kv::node::service::Node;
use std::sync::Arc;

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = NodeArgs::parse().into_config()?;
    let node = Arc::new(Node::from_config(&config));

    // Bind before joining so pushes from the new parent queue up instead of
    // being refused while the snapshot is pulled.
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    if config.role == Role::Child {
        let entries = node
            .join_parent()
            .await
            .context("failed to join parent node at startup")?;
        tracing::info!("Initial sync complete: {} entries", entries);
    }

    tracing::info!(
        "Node running on {} (role: {}, self: {}, parent: {}, children: {:?})",
        config.bind_addr,
        config.role,
        config.self_address.as_deref().unwrap_or("<unknown>"),
        node.topology().parent().await.as_deref().unwrap_or("<none>"),
        node.topology().children().await
    );

    axum::serve(listener, router(node)).await?;

    Ok(())
}
