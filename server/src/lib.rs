pub mod api;
pub mod cli;
pub mod client;
pub mod error;
pub mod intake;

pub use api::{build_app, AppState, StatusKind, StatusReport};
pub use client::{ClientError, ExplainerClient};

/// Default log directives for the binary
pub const DEFAULT_LOG_DIRECTIVES: &[&str] = &["slide_explainer=info", "explainer_core=info"];

/// Initialize tracing/logging with the given directives
pub fn init_logging(directives: &[&str]) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in directives {
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive {directive:?}: {e}"),
        }
    }
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;
    Ok(())
}
