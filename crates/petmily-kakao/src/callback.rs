//! Local HTTP callback server for the provider authorization flow.

use crate::query::parse_query;
use crate::{BridgeError, BridgeResult};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// Default callback port.
pub const DEFAULT_CALLBACK_PORT: u16 = 8791;

/// Default callback wait timeout in seconds.
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 180;

/// Parameters delivered by the provider redirect.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    /// Provider access token (fragment-relayed by the provider page)
    pub access_token: Option<String>,
    /// Provider refresh token, when issued
    pub refresh_token: Option<String>,
    /// Echoed state parameter
    pub state: Option<String>,
    /// Provider error code (user cancelled, consent denied, ...)
    pub error: Option<String>,
}

/// Callback server that listens for the provider authorization redirect.
pub struct CallbackServer {
    port: u16,
    timeout_secs: u64,
}

impl CallbackServer {
    /// Create a new callback server.
    pub fn new(port: u16, timeout_secs: u64) -> Self {
        Self { port, timeout_secs }
    }

    /// Create with default settings.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CALLBACK_PORT, DEFAULT_CALLBACK_TIMEOUT_SECS)
    }

    /// Get the redirect URL for this server.
    pub fn callback_url(&self) -> String {
        format!("http://localhost:{}/callback", self.port)
    }

    /// Start the server and wait for the authorization redirect.
    ///
    /// Binds a loopback listener, waits for one callback request (or the
    /// timeout), and shuts down. The caller is responsible for opening
    /// the browser to the authorization URL.
    pub async fn wait_for_callback(&self) -> BridgeResult<CallbackParams> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            BridgeError::Provider(format!("Failed to bind to {}: {}", addr, e))
        })?;

        info!(port = self.port, "Authorization callback server listening");

        let (tx, rx) = oneshot::channel::<CallbackParams>();
        let tx = Arc::new(tokio::sync::Mutex::new(Some(tx)));

        let server_handle = tokio::spawn({
            let tx = tx.clone();
            async move {
                loop {
                    match listener.accept().await {
                        Ok((mut socket, _)) => {
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(&mut socket, tx).await {
                                    error!("Error handling callback connection: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                            break;
                        }
                    }
                }
            }
        });

        let timeout = tokio::time::Duration::from_secs(self.timeout_secs);
        let result = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(params)) => Ok(params),
            Ok(Err(_)) => Err(BridgeError::Provider(
                "Internal error: callback channel closed".to_string(),
            )),
            Err(_) => Err(BridgeError::Timeout),
        };

        server_handle.abort();

        result
    }
}

/// Handle an incoming HTTP connection.
async fn handle_connection(
    socket: &mut tokio::net::TcpStream,
    tx: Arc<tokio::sync::Mutex<Option<oneshot::Sender<CallbackParams>>>>,
) -> BridgeResult<()> {
    let (reader, mut writer) = socket.split();
    let mut reader = BufReader::new(reader);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    debug!(request = %request_line.trim(), "Received callback request");

    // Parse the request line: GET /callback?... HTTP/1.1
    if !request_line.starts_with("GET ") {
        send_response(&mut writer, 405, "Method Not Allowed", "Method Not Allowed").await?;
        return Ok(());
    }

    let path_end = request_line.find(" HTTP/").unwrap_or(request_line.len());
    let path = &request_line[4..path_end];

    if !path.starts_with("/callback") {
        send_response(&mut writer, 404, "Not Found", "Not Found").await?;
        return Ok(());
    }

    let query = match path.find('?') {
        Some(idx) => &path[idx + 1..],
        None => "",
    };
    let raw = parse_query(query);

    let params = CallbackParams {
        access_token: raw.get("access_token").cloned(),
        refresh_token: raw.get("refresh_token").cloned(),
        state: raw.get("state").cloned(),
        error: raw.get("error").cloned(),
    };

    if let Some(err) = &params.error {
        send_response(&mut writer, 200, "OK", &error_page(err)).await?;
    } else if params.access_token.is_some() {
        send_response(&mut writer, 200, "OK", &success_page()).await?;
    } else {
        send_response(&mut writer, 200, "OK", &error_page("Missing required parameters")).await?;
    }

    if let Some(tx) = tx.lock().await.take() {
        let _ = tx.send(params);
    }

    Ok(())
}

/// Send an HTTP response.
async fn send_response(
    writer: &mut tokio::net::tcp::WriteHalf<'_>,
    status_code: u16,
    status_text: &str,
    body: &str,
) -> BridgeResult<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_code,
        status_text,
        body.len(),
        body
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Generate success page HTML.
fn success_page() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Petmily - Login Successful</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px; background: #fff8f0;">
<div style="max-width: 400px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
<h1 style="color: #f59e0b; margin-bottom: 20px;">Kakao Login Successful!</h1>
<p style="color: #666;">You can close this window and return to Petmily.</p>
</div>
<script>setTimeout(() => window.close(), 2000);</script>
</body>
</html>"#
        .to_string()
}

/// Generate error page HTML.
fn error_page(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Petmily - Login Failed</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px; background: #fff8f0;">
<div style="max-width: 400px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
<h1 style="color: #ef4444; margin-bottom: 20px;">Kakao Login Failed</h1>
<p style="color: #666;">Error: {}</p>
<p style="color: #888; font-size: 14px;">You can close this window and try again.</p>
</div>
</body>
</html>"#,
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_url() {
        let server = CallbackServer::new(8791, 180);
        assert_eq!(server.callback_url(), "http://localhost:8791/callback");
    }

    #[test]
    fn test_callback_url_with_different_ports() {
        let server = CallbackServer::with_defaults();
        assert_eq!(
            server.callback_url(),
            format!("http://localhost:{}/callback", DEFAULT_CALLBACK_PORT)
        );

        let server = CallbackServer::new(3000, 60);
        assert_eq!(server.callback_url(), "http://localhost:3000/callback");
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_CALLBACK_PORT, 8791);
        assert_eq!(DEFAULT_CALLBACK_TIMEOUT_SECS, 180);
    }

    #[test]
    fn test_success_and_error_pages_render() {
        assert!(success_page().contains("Login Successful"));
        let page = error_page("access_denied");
        assert!(page.contains("access_denied"));
    }
}
