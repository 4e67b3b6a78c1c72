//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpEvent, CdpRequest, CdpResponse, PageInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;
type EventRoutes = Arc<RwLock<HashMap<String, broadcast::Sender<CdpEvent>>>>;

const CALL_TIMEOUT: Duration = Duration::from_secs(30);
const EVENT_BUFFER: usize = 256;

/// The WebSocket connection shared by the client and all its page sessions.
pub(crate) struct Transport {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Pending,
    routes: EventRoutes,
}

impl Transport {
    /// Send a CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    /// Live event feed for `session_id`, `None` once the session is gone.
    pub(crate) fn subscribe(&self, session_id: &str) -> Option<broadcast::Receiver<CdpEvent>> {
        self.routes.read().get(session_id).map(|tx| tx.subscribe())
    }

    fn open_route(&self, session_id: &str) {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        self.routes.write().insert(session_id.to_string(), tx);
    }

    pub(crate) fn close_route(&self, session_id: &str) {
        self.routes.write().remove(session_id);
    }
}

/// CDP client for one browser.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    transport: Arc<Transport>,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at `endpoint` (e.g. `http://localhost:9222`).
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;
        debug!("Connected to browser: {}", version.browser);

        let (ws_stream, _) = tokio_tungstenite::connect_async(&version.web_socket_debugger_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;
        let (ws_sink, ws_source) = ws_stream.split();

        let transport = Arc::new(Transport {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            routes: Arc::new(RwLock::new(HashMap::new())),
        });

        let recv_task = {
            let pending = transport.pending.clone();
            let routes = transport.routes.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, &pending, &routes).await;
                // Dropping the routes closes every session's event feed.
                routes.write().clear();
                pending.lock().clear();
            })
        };

        debug!("CDP client connected to {}", version.web_socket_debugger_url);
        Ok(Self {
            http_endpoint,
            transport,
            _recv_task: recv_task,
        })
    }

    async fn receive_loop(mut ws_source: WsSource, pending: &Pending, routes: &EventRoutes) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => Self::dispatch(resp, pending, routes),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    fn dispatch(resp: CdpResponse, pending: &Pending, routes: &EventRoutes) {
        if let Some(id) = resp.id {
            if let Some(tx) = pending.lock().remove(&id) {
                let result = match resp.error {
                    Some(error) => Err(CdpError::Protocol {
                        code: error.code,
                        message: error.message,
                    }),
                    None => Ok(resp.result.unwrap_or(Value::Null)),
                };
                let _ = tx.send(result);
            }
        } else if let Some(method) = resp.method {
            let session_id = resp.session_id.unwrap_or_default();
            if let Some(tx) = routes.read().get(&session_id) {
                let _ = tx.send(CdpEvent {
                    method,
                    params: resp.params.unwrap_or(Value::Null),
                });
            }
        }
    }

    /// Browser-level CDP command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.call(method, params, None).await
    }

    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.http_endpoint);
        let pages: Vec<PageInfo> = reqwest::get(&url).await?.json().await?;
        Ok(pages)
    }

    /// Open a new tab and attach to it.
    pub async fn new_page(&self, url: Option<&str>) -> Result<PageSession, CdpError> {
        // Chrome requires PUT for /json/new
        let create_url = match url {
            Some(u) => format!("{}/json/new?{}", self.http_endpoint, u),
            None => format!("{}/json/new", self.http_endpoint),
        };
        let page_info: PageInfo = reqwest::Client::new()
            .put(&create_url)
            .send()
            .await?
            .json()
            .await?;
        debug!("Created new page: {} - {}", page_info.id, page_info.url);

        self.attach_page(&page_info.id).await
    }

    /// Attach to an existing tab.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        self.transport.open_route(&session_id);
        let session = PageSession::new(target_id.to_string(), session_id, self.transport.clone());
        session.enable_domains().await?;
        Ok(session)
    }

    pub async fn close_page(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.closeTarget", Some(json!({"targetId": target_id})))
            .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
        self.transport.routes.write().clear();
    }
}
