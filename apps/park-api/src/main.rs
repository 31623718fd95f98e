//! park-api 入口：加载配置、初始化日志、组装存储并启动 HTTP 服务。

use park_api::{AppState, Stores, build_app};
use park_auth::IdTokenVerifier;
use park_config::{AppConfig, AuthKeyConfig};
use park_projection::LivenessPolicy;
use park_storage::{
    FirebaseConfig, FirebaseRealtimeTree, FirestoreConfig, FirestoreDocuments, InMemoryRealtimeTree,
    RealtimeTree,
};
use park_telemetry::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const JWKS_TIMEOUT: Duration = Duration::from_secs(10);

async fn fetch_jwks(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    client
        .get(url)
        .timeout(JWKS_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

/// 定期刷新密钥集合；失败时保留旧密钥
fn spawn_jwks_refresh(
    client: reqwest::Client,
    url: String,
    verifier: Arc<IdTokenVerifier>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // 第一次 tick 立即返回，启动时已拉取过
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let refreshed = match fetch_jwks(&client, &url).await {
                Ok(body) => verifier.replace_jwks(&body).map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            };
            match refreshed {
                Ok(keys) => info!(target: "park.api", keys, "jwks_refreshed"),
                Err(error) => warn!(target: "park.api", %error, "jwks_refresh_failed"),
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // RS256 / JWKS 的受众已由配置层保证存在
    let audience = config.auth_audience.clone().unwrap_or_default();
    let verifier = match &config.auth_key {
        AuthKeyConfig::Hs256 { secret } => Arc::new(IdTokenVerifier::hs256(
            secret,
            config.auth_audience.as_deref(),
        )),
        AuthKeyConfig::Rs256 { public_key_pem } => {
            Arc::new(IdTokenVerifier::rs256_pem(public_key_pem, &audience)?)
        }
        AuthKeyConfig::Jwks { url } => {
            let client = reqwest::Client::builder()
                .user_agent("park-api/0.1.0")
                .build()?;
            let body = fetch_jwks(&client, url).await?;
            let verifier = Arc::new(IdTokenVerifier::rs256_jwks(&body, &audience)?);
            let _refresh = spawn_jwks_refresh(
                client,
                url.clone(),
                verifier.clone(),
                Duration::from_secs(config.auth_jwks_refresh_seconds),
            );
            info!(target: "park.api", jwks = %url, "auth_jwks_loaded");
            verifier
        }
    };

    // 实时树：配置了 RTDB 地址时走 Firebase，否则用内存树
    let tree: Arc<dyn RealtimeTree> = match &config.rtdb_url {
        Some(base_url) => {
            let firebase = FirebaseRealtimeTree::connect(FirebaseConfig {
                base_url: base_url.clone(),
                auth: config.rtdb_auth.clone(),
            })?;
            if config.rtdb_stream {
                // 事件流任务随进程存活
                let _stream = firebase.spawn_event_stream();
            }
            info!(target: "park.api", rtdb = %base_url, "realtime_tree_firebase");
            Arc::new(firebase)
        }
        None => {
            warn!(target: "park.api", "realtime_tree_in_memory");
            Arc::new(InMemoryRealtimeTree::new())
        }
    };

    // 文档存储：配置了 Firestore 项目时走 REST，否则用内存存储
    let stores = match &config.firestore {
        Some(settings) => {
            let documents = FirestoreDocuments::connect(FirestoreConfig {
                project: settings.project.clone(),
                auth: settings.auth.clone(),
                base_url: settings.base_url.clone(),
            })?;
            info!(target: "park.api", project = %settings.project, "document_stores_firestore");
            Stores::firestore(documents)
        }
        None => {
            warn!(target: "park.api", "document_stores_in_memory");
            Stores::in_memory()
        }
    };
    let liveness = LivenessPolicy::from_seconds(config.liveness_threshold_seconds);
    let state = AppState::new(verifier, tree, stores, liveness);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "park.api", addr = %config.http_addr, "http_listening");
    axum::serve(listener, app).await?;
    Ok(())
}
