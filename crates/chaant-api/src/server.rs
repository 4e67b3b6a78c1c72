//! Control plane server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use chaant_config::ServerConfig;

use crate::http::routes::create_router;
use crate::hub::AgentHub;

pub struct ApiServer {
    config: ServerConfig,
    hub: Arc<AgentHub>,
}

impl ApiServer {
    pub fn new(config: ServerConfig, hub: Arc<AgentHub>) -> Self {
        Self { config, hub }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Serve until `shutdown` resolves, then dispose every agent.
    pub async fn run(
        &self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let app = create_router(self.hub.clone());

        let addr: SocketAddr = self.addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Server listening at {}", addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        self.hub.shutdown().await;
        Ok(())
    }
}
