use std::{env, net::SocketAddr, sync::Arc};

use streak_tracker::engine::StreakEngine;
use streak_tracker::notify::LogNotifier;
use streak_tracker::scheduler::spawn_daily_rollover;
use streak_tracker::sync::{spawn_push_worker, HttpRemoteStore, RemoteStore, SyncHandle};
use streak_tracker::{resolve_data_path, router, AppState, StreakStore};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let data_path = resolve_data_path()?;
    if let Some(parent) = data_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let store = StreakStore::load(data_path).await;

    let remote = env::var("SYNC_BASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(|url| Arc::new(HttpRemoteStore::new(url)) as Arc<dyn RemoteStore>);

    let sync = match &remote {
        Some(remote) => {
            let (handle, _worker) = spawn_push_worker(store.clone(), remote.clone());
            handle
        }
        None => SyncHandle::detached(),
    };

    let engine = Arc::new(StreakEngine::new(
        store,
        Arc::new(LogNotifier),
        remote,
        sync,
    ));
    spawn_daily_rollover(engine.clone());

    let app = router(AppState { engine });

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
