use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use amap::AmapClient;
use interpreter::LlmInterpreter;
use orchestrator_core::ports::{InterpreterPort, MapPort};
use orchestrator_core::OrchestratorCore;
use route_agent::{app, config::Config, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG")
                .unwrap_or_else(|_| "route_agent=info,orchestrator_core=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let interpreter = LlmInterpreter::from_env()?;
    let maps = AmapClient::from_env()?;
    info!(model = %interpreter.model(), amap = %maps.base_url(), transit_city = %config.transit_city, "collaborators configured");

    let state = AppState::new(OrchestratorCore::with_config(interpreter, maps, config.core()));
    spawn_sweeper(state.core.clone(), config.session_idle, config.session_sweep);

    let addr = config.addr();
    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Periodically drop sessions nobody has touched within `idle`.
fn spawn_sweeper<I, M>(core: Arc<OrchestratorCore<I, M>>, idle: Duration, every: Duration)
where
    I: InterpreterPort + 'static,
    M: MapPort + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = core.sessions().evict_idle(idle).await;
            if evicted > 0 {
                info!(evicted, "idle sessions evicted");
            } else {
                debug!("session sweep found nothing idle");
            }
        }
    });
}
