//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC calls to the command handlers. A connection
//! that calls `subscribe_events` turns into a one-way notification stream.

use std::path::PathBuf;
use std::sync::Arc;

use anchorview_oracle::OracleError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::events::EventFilter;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    pub id: serde_json::Value,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    fn with_detail(code: i32, message: &str, detail: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self::with_detail(-32602, "INVALID_PARAMS", detail)
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self::with_detail(-32603, "INTERNAL_ERROR", detail)
    }

    /// Caller could not be authenticated (-32020).
    pub fn unauthorized(detail: &str) -> Self {
        Self::with_detail(-32020, "UNAUTHORIZED", detail)
    }
}

impl From<OracleError> for RpcError {
    fn from(err: OracleError) -> Self {
        let (code, message) = match &err {
            OracleError::InvalidConfig(_) => (-32010, "INVALID_CONFIG"),
            OracleError::Conflict(_) => (-32011, "CONFLICT"),
            OracleError::NotFound(_) => (-32012, "NOT_FOUND"),
            OracleError::InvalidPriceSource { .. } => (-32013, "INVALID_PRICE_SOURCE"),
            OracleError::ArithmeticOverflow(_) => (-32014, "ARITHMETIC_OVERFLOW"),
            OracleError::ImpossibleTime { .. } => (-32015, "IMPOSSIBLE_TIME"),
            OracleError::Unauthorized(_) => (-32020, "UNAUTHORIZED"),
            OracleError::StaleOrMissing(_) => (-32030, "PRICE_MISSING"),
            OracleError::Stale { .. } => (-32031, "PRICE_STALE"),
            OracleError::Market(_) => (-32040, "MARKET_ERROR"),
            OracleError::Report(_) => (-32050, "INVALID_REPORT"),
        };
        Self::with_detail(code, message, &err.to_string())
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let request = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => request,
            Err(_) => {
                let response = RpcResponse::error(serde_json::Value::Null, RpcError::parse_error());
                write_line(&mut writer, &response).await?;
                continue;
            }
        };

        if request.method == "subscribe_events" && request.jsonrpc == "2.0" {
            return stream_events(&state, request, writer).await;
        }

        let response = dispatch_request(state.clone(), request).await;
        write_line(&mut writer, &response).await?;
    }

    Ok(())
}

async fn write_line<T: Serialize>(writer: &mut OwnedWriteHalf, message: &T) -> anyhow::Result<()> {
    let mut json = serde_json::to_string(message)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Acknowledge a subscription, then forward matching events until the
/// client goes away or the bus closes.
async fn stream_events(
    state: &DaemonState,
    request: RpcRequest,
    mut writer: OwnedWriteHalf,
) -> anyhow::Result<()> {
    let filter = if request.params.is_null() {
        EventFilter::default()
    } else {
        match serde_json::from_value::<EventFilter>(request.params) {
            Ok(filter) => filter,
            Err(e) => {
                let err = RpcError::invalid_params(&format!("bad event filter: {e}"));
                write_line(&mut writer, &RpcResponse::error(request.id, err)).await?;
                return Ok(());
            }
        }
    };

    let mut rx = state.event_bus.subscribe();
    let ack = serde_json::json!({
        "subscribed": true,
        "sequence": state.event_bus.sequence(),
    });
    write_line(&mut writer, &RpcResponse::success(request.id, ack)).await?;

    loop {
        match rx.recv().await {
            Ok(event) => {
                if !filter.matches(&event) {
                    continue;
                }
                let notification = serde_json::json!({
                    "jsonrpc": "2.0",
                    "method": "event",
                    "params": event,
                });
                write_line(&mut writer, &notification).await?;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event subscriber lagging");
            }
            Err(RecvError::Closed) => break,
        }
    }
    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }
    let method = request.method.as_str();

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Prices
        "post_prices" => commands::prices::post_prices(&state, &request.params).await,
        "invalidate_reporter" => {
            commands::prices::invalidate_reporter(&state, &request.params).await
        }
        "refresh_twap_prices" => {
            commands::prices::refresh_twap_prices(&state, &request.params).await
        }
        "get_price" => commands::prices::get_price(&state, &request.params).await,
        "get_underlying_price" => {
            commands::prices::get_underlying_price(&state, &request.params).await
        }

        // Administration
        "register_configs" => commands::admin::register_configs(&state, &request.params).await,
        "change_admin" => commands::admin::change_admin(&state, &request.params).await,
        "get_token_config" => commands::admin::get_token_config(&state, &request.params).await,
        "get_oracle_status" => commands::admin::get_oracle_status(&state).await,

        // Markets
        "submit_market_snapshot" => {
            commands::market::submit_market_snapshot(&state, &request.params).await
        }
        "get_anchor_window" => commands::market::get_anchor_window(&state, &request.params).await,

        "shutdown" => {
            info!("Shutdown requested over RPC");
            let _ = state.shutdown_tx.send(());
            Ok(serde_json::json!({"stopping": true}))
        }

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
