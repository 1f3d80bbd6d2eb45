//! HTTP + websocket client for a Gotify server.
//!
//! REST calls (`/application`, `/health`) go through reqwest; the live stream
//! (`/stream`) is a websocket opened with tokio-tungstenite. Both send the
//! client token in the `X-Gotify-Key` header.

use std::time::Duration;

use {
    async_trait::async_trait,
    futures::{StreamExt, stream},
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    tokio_tungstenite::{
        connect_async,
        tungstenite::{Message, client::IntoClientRequest, http::HeaderValue},
    },
    tracing::{debug, info, warn},
    url::Url,
};

use crate::{
    error::{Context, Error, Result},
    source::{EventStream, NotificationSource},
    types::{Application, Health, NotificationEvent},
};

const GOTIFY_KEY_HEADER: &str = "X-Gotify-Key";
const REST_TIMEOUT: Duration = Duration::from_secs(30);
/// Gotify pings stream clients every 45 s, so a healthy socket is never
/// silent for this long.
const STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Client bound to one Gotify server and client token.
pub struct GotifyClient {
    http: Client,
    /// Server base URL, always ending in `/` so relative joins keep any path prefix.
    base: Url,
    token: Secret<String>,
    idle_timeout: Duration,
}

impl std::fmt::Debug for GotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GotifyClient")
            .field("base", &self.base.as_str())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl GotifyClient {
    pub fn new(server: &str, token: Secret<String>) -> Result<Self> {
        let mut base = Url::parse(server.trim())?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::UnsupportedScheme(base.scheme().to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        HeaderValue::from_str(token.expose_secret()).map_err(|_| Error::InvalidToken)?;

        let http = Client::builder()
            .timeout(REST_TIMEOUT)
            .build()
            .context("failed to build HTTP client for gotify")?;

        Ok(Self {
            http,
            base,
            token,
            idle_timeout: STREAM_IDLE_TIMEOUT,
        })
    }

    /// Fail the stream when no frame (pings included) arrives for `timeout`.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// Websocket URL of the message stream (`ws://` or `wss://`).
    pub fn stream_url(&self) -> Result<Url> {
        let mut url = self.endpoint("stream")?;
        let scheme = if url.scheme() == "https" {
            "wss"
        } else {
            "ws"
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::UnsupportedScheme(scheme.to_string()))?;
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let resp = self
            .http
            .get(url)
            .header(GOTIFY_KEY_HEADER, self.token.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    /// `GET /health`. Does not need a valid token.
    pub async fn health(&self) -> Result<Health> {
        self.get_json("health").await
    }
}

#[async_trait]
impl NotificationSource for GotifyClient {
    async fn fetch_applications(&self) -> Result<Vec<Application>> {
        let apps: Vec<Application> = self.get_json("application").await?;
        debug!(count = apps.len(), "fetched gotify applications");
        Ok(apps)
    }

    async fn open_stream(&self) -> Result<EventStream> {
        let url = self.stream_url()?;
        let mut request = url.as_str().into_client_request()?;
        let key = HeaderValue::from_str(self.token.expose_secret()).map_err(|_| Error::InvalidToken)?;
        request.headers_mut().insert(GOTIFY_KEY_HEADER, key);

        let (ws, _response) = connect_async(request).await?;
        info!(url = %url, "gotify stream connected");

        let idle = self.idle_timeout;
        let frames = stream::unfold(Some(ws), move |ws| async move {
            let mut ws = ws?;
            match tokio::time::timeout(idle, ws.next()).await {
                Ok(Some(frame)) => Some((frame.map_err(Error::WebSocket), Some(ws))),
                Ok(None) => None,
                Err(_) => Some((Err(Error::IdleTimeout(idle)), None)),
            }
        });

        let events = frames.filter_map(|frame| async move {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<NotificationEvent>(text.as_str()) {
                        Ok(event) => Some(Ok(event)),
                        Err(e) => {
                            warn!(error = %e, "skipping malformed gotify frame");
                            None
                        },
                    }
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "gotify stream closed by server");
                    None
                },
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        });
        Ok(events.boxed())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        futures::SinkExt,
        std::sync::{Arc, Mutex},
        tokio::net::TcpListener,
        tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response},
    };

    fn client(server: &str) -> GotifyClient {
        GotifyClient::new(server, Secret::new("tok".into())).unwrap()
    }

    #[test]
    fn stream_url_keeps_prefix_and_switches_scheme() {
        let c = client("https://push.example.com/gotify");
        assert_eq!(
            c.stream_url().unwrap().as_str(),
            "wss://push.example.com/gotify/stream"
        );
        let c = client("http://localhost:8080/");
        assert_eq!(c.stream_url().unwrap().as_str(), "ws://localhost:8080/stream");
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(
            GotifyClient::new("not a url", Secret::new("t".into())),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            GotifyClient::new("ftp://host", Secret::new("t".into())),
            Err(Error::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn rejects_token_with_newline() {
        assert!(matches!(
            GotifyClient::new("http://host", Secret::new("a\nb".into())),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn debug_hides_token() {
        let printed = format!("{:?}", client("http://host"));
        assert!(!printed.contains("tok"));
    }

    // ── HTTP integration tests (with mockito) ──────────────────────────

    #[tokio::test]
    async fn fetch_applications_sends_key_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/application")
            .match_header("x-gotify-key", "tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!([
                    {"id": 1, "name": "Server", "token": "A1", "internal": false},
                    {"id": 2, "token": "A2"}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let apps = client(&server.url()).fetch_applications().await.unwrap();

        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].display_name(), Some("Server"));
        assert_eq!(apps[1].name, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_applications_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/application")
            .with_status(401)
            .with_body(r#"{"error":"Unauthorized"}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .fetch_applications()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Status { status: 401, .. }));
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn health_probe() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"health":"green","database":"green"}"#)
            .create_async()
            .await;

        let health = client(&server.url()).health().await.unwrap();
        assert!(health.is_green());
    }

    // ── Websocket stream tests (local tungstenite server) ──────────────

    async fn ws_server(
        frames: Vec<&'static str>,
        close_cleanly: bool,
    ) -> (String, Arc<Mutex<Option<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen_key = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&seen_key);

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let callback = move |req: &Request, resp: Response| -> std::result::Result<Response, ErrorResponse> {
                let key = req
                    .headers()
                    .get(GOTIFY_KEY_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                *seen.lock().unwrap() = key;
                Ok(resp)
            };
            let mut ws = tokio_tungstenite::accept_hdr_async(tcp, callback)
                .await
                .unwrap();
            for frame in frames {
                ws.send(Message::Text(frame.into())).await.unwrap();
            }
            if close_cleanly {
                ws.close(None).await.unwrap();
                while ws.next().await.is_some() {}
            }
        });

        (format!("http://{addr}"), seen_key)
    }

    #[tokio::test]
    async fn stream_yields_events_and_skips_garbage() {
        let (url, seen_key) = ws_server(
            vec![
                r#"{"id":1,"appid":1,"title":"Down","message":"disk full"}"#,
                "not json",
                r#"{"id":2,"appid":2,"title":"Up","message":"ok"}"#,
            ],
            true,
        )
        .await;

        let stream = client(&url).open_stream().await.unwrap();
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 2);
        let first = items[0].as_ref().unwrap();
        assert_eq!(first.appid, 1);
        assert_eq!(first.message, "disk full");
        assert_eq!(items[1].as_ref().unwrap().title, "Up");
        assert_eq!(seen_key.lock().unwrap().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn stream_reports_abrupt_disconnect() {
        let (url, _) = ws_server(vec![r#"{"appid":1,"message":"m"}"#], false).await;

        let stream = client(&url).open_stream().await.unwrap();
        let items: Vec<_> = stream.take(2).collect().await;

        assert!(items[0].is_ok());
        assert!(items.last().unwrap().is_err());
    }

    /// Accepts one client, sends a ping every `ping_every` for `pings`
    /// rounds, then one event, then holds the socket open without traffic.
    async fn quiet_ws_server(pings: usize, ping_every: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            for _ in 0..pings {
                tokio::time::sleep(ping_every).await;
                ws.send(Message::Ping(Vec::<u8>::new().into())).await.unwrap();
            }
            ws.send(Message::Text(r#"{"appid":1,"message":"m"}"#.into()))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(ws);
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn silent_socket_fails_after_idle_timeout() {
        let url = quiet_ws_server(0, Duration::ZERO).await;
        let client = client(&url).with_idle_timeout(Duration::from_millis(300));

        let mut stream = client.open_stream().await.unwrap();

        assert!(stream.next().await.unwrap().is_ok());
        assert!(matches!(
            stream.next().await,
            Some(Err(Error::IdleTimeout(_)))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn pings_keep_quiet_stream_alive() {
        // Four pings 150 ms apart: longer than the timeout in total, but
        // never silent for a whole timeout.
        let url = quiet_ws_server(4, Duration::from_millis(150)).await;
        let client = client(&url).with_idle_timeout(Duration::from_millis(400));

        let mut stream = client.open_stream().await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.message, "m");
    }

    #[tokio::test]
    async fn open_stream_fails_when_nothing_listens() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client(&format!("http://{addr}")).open_stream().await;
        assert!(matches!(result, Err(Error::WebSocket(_))));
    }
}
