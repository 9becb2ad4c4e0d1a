use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tracing::{info, warn};

use mcvisor::{api, wait_for_shutdown_signal, Registry};

const MANAGER_FILE: &str = "manager.json";
const API_PORT: u16 = 8000;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let registry = Registry::load(MANAGER_FILE)
        .await
        .expect("load server list");
    registry.save().await.expect("persist server list");
    registry.start_all().await;

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), API_PORT);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind status api");
    info!(%addr, "status api listening");

    axum::serve(listener, api::router(registry.clone()))
        .with_graceful_shutdown(async {
            let _ = wait_for_shutdown_signal().await;
        })
        .await
        .expect("serve status api");

    info!("shutdown requested, sweeping servers");
    registry.stop_all().await;
    if let Err(e) = registry.wait_stopped(SHUTDOWN_GRACE).await {
        warn!(error = %e, "some servers did not stop in time");
    }
    let _ = registry.save().await;
}
