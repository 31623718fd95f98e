//! Firebase Realtime Database REST 实现
//!
//! - 读：`GET {base}/{path}.json`
//! - 写：`PUT {base}/{path}.json`
//! - 变更：`GET {base}/.json` + `Accept: text/event-stream`，
//!   解析 `put` / `patch` 事件中的 `path` 转成 [`TreeChange`]

use crate::error::StorageError;
use crate::realtime::{RealtimeTree, TREE_CHANGE_CAPACITY, TreeChange, normalize_path};
use crate::validation::ensure_path;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RECONNECT_MIN: Duration = Duration::from_secs(1);
const RECONNECT_MAX: Duration = Duration::from_secs(30);

/// Firebase 实时库连接信息
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// 形如 `https://<project>.firebaseio.com`
    pub base_url: String,
    /// `auth` 查询参数（数据库密钥或 ID Token）
    pub auth: Option<String>,
}

/// Firebase 实时树
pub struct FirebaseRealtimeTree {
    client: reqwest::Client,
    config: FirebaseConfig,
    changes: broadcast::Sender<TreeChange>,
}

impl FirebaseRealtimeTree {
    pub fn connect(config: FirebaseConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .user_agent("park-api/0.1.0")
            .build()?;
        let (changes, _) = broadcast::channel(TREE_CHANGE_CAPACITY);
        Ok(Self {
            client,
            config: FirebaseConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                auth: config.auth,
            },
            changes,
        })
    }

    fn url(&self, path: &str) -> String {
        node_url(&self.config.base_url, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.auth.as_deref() {
            Some(auth) => builder.query(&[("auth", auth)]),
            None => builder,
        }
    }

    /// 启动事件流订阅，断线后按退避重连；丢弃句柄不会停止任务，需显式 `abort`。
    pub fn spawn_event_stream(&self) -> JoinHandle<()> {
        let client = self.client.clone();
        let url = self.url("");
        let auth = self.config.auth.clone();
        let changes = self.changes.clone();
        tokio::spawn(async move {
            let mut backoff = RECONNECT_MIN;
            loop {
                match read_event_stream(&client, &url, auth.as_deref(), &changes).await {
                    Ok(()) => {
                        debug!(target: "park.storage", "rtdb_stream_closed");
                        backoff = RECONNECT_MIN;
                    }
                    Err(err) => {
                        warn!(
                            target: "park.storage",
                            error = %err,
                            retry_in_ms = backoff.as_millis() as u64,
                            "rtdb_stream_failed"
                        );
                    }
                }
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(RECONNECT_MAX);
            }
        })
    }
}

fn node_url(base_url: &str, path: &str) -> String {
    let path = normalize_path(path);
    if path.is_empty() {
        format!("{base_url}/.json")
    } else {
        format!("{base_url}/{path}.json")
    }
}

async fn read_event_stream(
    client: &reqwest::Client,
    url: &str,
    auth: Option<&str>,
    changes: &broadcast::Sender<TreeChange>,
) -> Result<(), StorageError> {
    let mut builder = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream");
    if let Some(auth) = auth {
        builder = builder.query(&[("auth", auth)]);
    }
    let mut response = builder.send().await?.error_for_status()?;
    let mut parser = EventStreamParser::default();
    while let Some(chunk) = response.chunk().await? {
        for event in parser.feed(&chunk) {
            match event.name.as_str() {
                "put" | "patch" => {
                    if let Some(path) = change_path(&event.data) {
                        let _ = changes.send(TreeChange::new(&path));
                    }
                }
                "keep-alive" => {}
                "cancel" | "auth_revoked" => {
                    return Err(StorageError::new(format!("stream {}", event.name)));
                }
                other => debug!(target: "park.storage", event = other, "rtdb_stream_event_ignored"),
            }
        }
    }
    Ok(())
}

#[derive(Deserialize)]
struct EventPayload {
    path: String,
}

fn change_path(data: &str) -> Option<String> {
    serde_json::from_str::<EventPayload>(data)
        .ok()
        .map(|payload| payload.path)
}

/// 一条 SSE 事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StreamEvent {
    pub name: String,
    pub data: String,
}

/// 增量解析 `text/event-stream`：按空行切分事件，只认 `event:` 与 `data:`。
///
/// 按字节缓冲，整行到齐后再做 UTF-8 解码，多字节字符可跨块。
#[derive(Debug, Default)]
pub(crate) struct EventStreamParser {
    buffer: Vec<u8>,
    name: Option<String>,
    data: Vec<String>,
}

impl EventStreamParser {
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                if let Some(name) = self.name.take() {
                    events.push(StreamEvent {
                        name,
                        data: self.data.join("\n"),
                    });
                }
                self.data.clear();
            } else if let Some(value) = line.strip_prefix("event:") {
                self.name = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.trim_start().to_string());
            }
        }
        events
    }
}

#[async_trait::async_trait]
impl RealtimeTree for FirebaseRealtimeTree {
    async fn get(&self, path: &str) -> Result<Option<Value>, StorageError> {
        ensure_path(path)?;
        let response = self
            .request(self.client.get(self.url(path)).timeout(REQUEST_TIMEOUT))
            .send()
            .await?
            .error_for_status()?;
        let value: Value = response.json().await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StorageError> {
        ensure_path(path)?;
        self.request(
            self.client
                .put(self.url(path))
                .timeout(REQUEST_TIMEOUT)
                .json(&value),
        )
        .send()
        .await?
        .error_for_status()?;
        // 本地写入也通知订阅方，不依赖事件流回显
        let _ = self.changes.send(TreeChange::new(path));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TreeChange> {
        self.changes.subscribe()
    }
}
