//! A language-server session that answers "which classes have a canonical
//! form" for one document at a time.

use crate::convert::{PublishDiagnosticsParams, ServerDiagnostic};
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::{
    decode, encode, error_codes, methods, FrameDecoder, Message, MessageKind, RequestId,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Bound on every request and on each wait for pushed diagnostics.
    pub timeout: Duration,
    /// Overrides the language id derived from the file extension.
    pub language_id: Option<String>,
    /// Returned for every item of a `workspace/configuration` request.
    pub settings: Value,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: "tailwindcss-language-server".to_string(),
            args: vec!["--stdio".to_string()],
            timeout: Duration::from_millis(1000),
            language_id: None,
            settings: json!({}),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Stopped,
    Starting,
    Initialized,
    Ready,
}

type PendingRequests = HashMap<i64, oneshot::Sender<BridgeResult<Value>>>;
type Subscribers = HashMap<String, oneshot::Sender<Vec<ServerDiagnostic>>>;

/// State shared with the reader task.
struct Shared {
    state: Mutex<BridgeState>,
    pending: Mutex<PendingRequests>,
    subscribers: Mutex<Subscribers>,
    settings: Value,
}

impl Shared {
    async fn set_state(&self, state: BridgeState) {
        *self.state.lock().await = state;
    }

    /// Forget everything in flight. Dropped senders wake their waiters.
    async fn reset(&self) {
        self.set_state(BridgeState::Stopped).await;
        self.pending.lock().await.clear();
        self.subscribers.lock().await.clear();
    }
}

/// Connection to one diagnostics server process.
pub struct DiagnosticsBridge {
    config: BridgeConfig,
    shared: Arc<Shared>,
    outgoing: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    child: Mutex<Option<Child>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    startup: Mutex<()>,
    next_id: AtomicI64,
}

impl DiagnosticsBridge {
    pub fn new(config: BridgeConfig) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(BridgeState::Stopped),
            pending: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(HashMap::new()),
            settings: config.settings.clone(),
        });
        Self {
            config,
            shared,
            outgoing: Mutex::new(None),
            child: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            startup: Mutex::new(()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub async fn state(&self) -> BridgeState {
        *self.shared.state.lock().await
    }

    /// Spawn the configured server and run the handshake.
    #[instrument(skip(self), fields(command = %self.config.command))]
    pub async fn start(&self) -> BridgeResult<()> {
        self.shutdown().await;

        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                command: self.config.command.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.start_kill();
            return Err(BridgeError::Closed);
        };
        *self.child.lock().await = Some(child);

        self.connect(stdout, stdin).await
    }

    /// Run the session over an already established transport.
    pub async fn connect<R, W>(&self, reader: R, writer: W) -> BridgeResult<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.shared.set_state(BridgeState::Starting).await;

        let (outgoing, incoming) = mpsc::channel::<Vec<u8>>(64);
        let writer_task = tokio::spawn(write_loop(writer, incoming));
        let reader_task = tokio::spawn(read_loop(reader, Arc::clone(&self.shared), outgoing.clone()));
        *self.outgoing.lock().await = Some(outgoing);
        self.tasks.lock().await.extend([writer_task, reader_task]);

        if let Err(error) = self.handshake().await {
            warn!(%error, "Diagnostics server handshake failed");
            self.shutdown().await;
            return Err(error);
        }
        Ok(())
    }

    async fn handshake(&self) -> BridgeResult<()> {
        let params = json!({
            "processId": std::process::id(),
            "rootUri": Value::Null,
            "capabilities": {
                "textDocument": { "publishDiagnostics": { "relatedInformation": false } },
                "workspace": { "configuration": true }
            },
            "clientInfo": { "name": env!("CARGO_PKG_NAME"), "version": env!("CARGO_PKG_VERSION") }
        });
        self.request(methods::INITIALIZE, params).await?;
        self.shared.set_state(BridgeState::Initialized).await;

        // Ready before the notification goes out, so a server that exits
        // right after it is observed as stopped.
        self.shared.set_state(BridgeState::Ready).await;
        self.notify(methods::INITIALIZED, json!({})).await?;
        info!("Diagnostics bridge ready");
        Ok(())
    }

    /// Start the server unless a session is already ready.
    pub async fn ensure_started(&self) -> BridgeResult<()> {
        self.ensure_started_with(|| self.start()).await
    }

    /// Run `start` unless a session is already ready. Concurrent callers
    /// wait for the first one's startup instead of starting their own.
    pub async fn ensure_started_with<F, Fut>(&self, start: F) -> BridgeResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = BridgeResult<()>>,
    {
        if self.state().await == BridgeState::Ready {
            return Ok(());
        }

        let _startup = self.startup.lock().await;
        if self.state().await == BridgeState::Ready {
            debug!("Diagnostics bridge started by a concurrent caller");
            return Ok(());
        }
        start().await
    }

    pub async fn request(&self, method: &str, params: Value) -> BridgeResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = oneshot::channel();
        self.shared.pending.lock().await.insert(id, sender);

        if let Err(error) = self
            .send(&Message::request(RequestId::Number(id), method, params))
            .await
        {
            self.shared.pending.lock().await.remove(&id);
            return Err(error);
        }

        match tokio::time::timeout(self.config.timeout, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BridgeError::Closed),
            Err(_) => {
                self.shared.pending.lock().await.remove(&id);
                Err(BridgeError::Timeout {
                    method: method.to_string(),
                    millis: self.config.timeout.as_millis(),
                })
            }
        }
    }

    pub async fn notify(&self, method: &str, params: Value) -> BridgeResult<()> {
        self.send(&Message::notification(method, params)).await
    }

    async fn send(&self, message: &Message) -> BridgeResult<()> {
        let frame = encode(message)?;
        let outgoing = self.outgoing.lock().await.clone().ok_or(BridgeError::Closed)?;
        outgoing.send(frame).await.map_err(|_| BridgeError::Closed)
    }

    /// Open `text` as a document, wait for the diagnostics the server
    /// pushes for it, then close it. No push within the timeout yields an
    /// empty list.
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub async fn diagnostics(
        &self,
        uri: &str,
        language_id: &str,
        text: &str,
    ) -> BridgeResult<Vec<ServerDiagnostic>> {
        if self.state().await != BridgeState::Ready {
            return Err(BridgeError::NotReady);
        }

        let (sender, receiver) = oneshot::channel();
        self.shared
            .subscribers
            .lock()
            .await
            .insert(uri.to_string(), sender);

        let opened = self
            .notify(
                methods::DID_OPEN,
                json!({
                    "textDocument": { "uri": uri, "languageId": language_id, "version": 1, "text": text }
                }),
            )
            .await;
        if let Err(error) = opened {
            self.shared.subscribers.lock().await.remove(uri);
            return Err(error);
        }

        let diagnostics = tokio::select! {
            pushed = receiver => pushed.unwrap_or_default(),
            _ = tokio::time::sleep(self.config.timeout) => {
                debug!(uri, "No diagnostics pushed before the timeout");
                self.shared.subscribers.lock().await.remove(uri);
                Vec::new()
            }
        };

        if let Err(error) = self
            .notify(methods::DID_CLOSE, json!({ "textDocument": { "uri": uri } }))
            .await
        {
            debug!(%error, "Could not close document");
        }

        debug!(count = diagnostics.len(), "Received diagnostics");
        Ok(diagnostics)
    }

    /// Stop the server and drop everything in flight.
    pub async fn shutdown(&self) {
        *self.outgoing.lock().await = None;
        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(error) = child.kill().await {
                debug!(%error, "Diagnostics server already exited");
            }
        }
        self.shared.reset().await;
    }
}

async fn write_loop<W: AsyncWrite + Unpin>(mut writer: W, mut incoming: mpsc::Receiver<Vec<u8>>) {
    while let Some(frame) = incoming.recv().await {
        if let Err(error) = writer.write_all(&frame).await {
            debug!(%error, "Write to diagnostics server failed");
            break;
        }
        if writer.flush().await.is_err() {
            break;
        }
    }
}

async fn read_loop<R: AsyncRead + Unpin>(
    mut reader: R,
    shared: Arc<Shared>,
    outgoing: mpsc::Sender<Vec<u8>>,
) {
    let mut decoder = FrameDecoder::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) => {
                debug!(%error, "Read from diagnostics server failed");
                break;
            }
        };
        decoder.push(&chunk[..read]);

        while let Some(frame) = decoder.next_frame() {
            match decode(&frame) {
                Ok(message) => dispatch(&shared, &outgoing, message).await,
                Err(error) => warn!(%error, "Ignoring undecodable message"),
            }
        }
    }

    info!("Diagnostics server closed the connection");
    shared.reset().await;
}

async fn dispatch(shared: &Shared, outgoing: &mpsc::Sender<Vec<u8>>, message: Message) {
    match message.kind() {
        MessageKind::Response => {
            let Some(RequestId::Number(id)) = message.id else {
                trace!(id = ?message.id, "Response with foreign id");
                return;
            };
            let Some(sender) = shared.pending.lock().await.remove(&id) else {
                trace!(id, "Response for a request no longer pending");
                return;
            };
            let result = match message.error {
                Some(error) => Err(BridgeError::Server {
                    code: error.code,
                    message: error.message,
                }),
                None => Ok(message.result.unwrap_or(Value::Null)),
            };
            let _ = sender.send(result);
        }
        MessageKind::Notification if message.method.as_deref() == Some(methods::PUBLISH_DIAGNOSTICS) => {
            let params = message.params.unwrap_or(Value::Null);
            match serde_json::from_value::<PublishDiagnosticsParams>(params) {
                Ok(published) => {
                    if let Some(sender) = shared.subscribers.lock().await.remove(&published.uri) {
                        let _ = sender.send(published.diagnostics);
                    }
                }
                Err(error) => warn!(%error, "Malformed publishDiagnostics"),
            }
        }
        MessageKind::Request => {
            let (Some(id), Some(method)) = (message.id, message.method) else {
                return;
            };
            let reply = match method.as_str() {
                methods::WORKSPACE_CONFIGURATION => {
                    let items = message
                        .params
                        .as_ref()
                        .and_then(|params| params.get("items"))
                        .and_then(Value::as_array)
                        .map_or(1, Vec::len);
                    Message::response(id, Value::Array(vec![shared.settings.clone(); items]))
                }
                "client/registerCapability" | "window/workDoneProgress/create" => {
                    Message::response(id, Value::Null)
                }
                _ => Message::error_response(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Unsupported method '{method}'"),
                ),
            };
            match encode(&reply) {
                Ok(frame) => {
                    let _ = outgoing.send(frame).await;
                }
                Err(error) => warn!(%error, "Could not encode reply"),
            }
        }
        MessageKind::Notification | MessageKind::Invalid => {
            trace!(method = ?message.method, "Ignoring message");
        }
    }
}
