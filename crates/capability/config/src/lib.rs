//! 应用运行配置加载。

use std::env;

/// 在线判定默认阈值（秒）。
pub const DEFAULT_LIVENESS_THRESHOLD_SECONDS: u64 = 15;

/// JWKS 默认刷新间隔（秒）。
pub const DEFAULT_JWKS_REFRESH_SECONDS: u64 = 3600;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// ID Token 校验密钥。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthKeyConfig {
    /// HS256 共享密钥
    Hs256 { secret: String },
    /// RS256 公钥（PEM）
    Rs256 { public_key_pem: String },
    /// RS256 密钥集合（JWKS 地址），按 `kid` 选择并定期刷新
    Jwks { url: String },
}

impl AuthKeyConfig {
    /// 公钥类密钥必须配合受众校验。
    pub fn requires_audience(&self) -> bool {
        !matches!(self, AuthKeyConfig::Hs256 { .. })
    }
}

/// Firestore 文档存储连接信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreSettings {
    pub project: String,
    /// Bearer token；本地模拟器可不设
    pub auth: Option<String>,
    /// 覆盖默认的 `https://firestore.googleapis.com`
    pub base_url: Option<String>,
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    /// 未设置时使用内存实时树
    pub rtdb_url: Option<String>,
    pub rtdb_auth: Option<String>,
    pub rtdb_stream: bool,
    /// 未设置时使用内存文档存储
    pub firestore: Option<FirestoreSettings>,
    pub auth_key: AuthKeyConfig,
    pub auth_audience: Option<String>,
    pub auth_jwks_refresh_seconds: u64,
    pub liveness_threshold_seconds: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_addr = lookup("PARK_HTTP_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let rtdb_url = read_optional(&lookup, "PARK_RTDB_URL");
        let rtdb_auth = read_optional(&lookup, "PARK_RTDB_AUTH");
        let rtdb_stream = read_bool_with_default(&lookup, "PARK_RTDB_STREAM", true)?;
        let firestore =
            read_optional(&lookup, "PARK_FIRESTORE_PROJECT").map(|project| FirestoreSettings {
                project,
                auth: read_optional(&lookup, "PARK_FIRESTORE_AUTH"),
                base_url: read_optional(&lookup, "PARK_FIRESTORE_URL"),
            });
        let auth_key = read_auth_key(&lookup)?;
        let auth_audience = read_optional(&lookup, "PARK_AUTH_AUDIENCE");
        if auth_audience.is_none() && auth_key.requires_audience() {
            return Err(ConfigError::Missing("PARK_AUTH_AUDIENCE".to_string()));
        }
        let auth_jwks_refresh_seconds = read_u64_with_default(
            &lookup,
            "PARK_AUTH_JWKS_REFRESH_SECONDS",
            DEFAULT_JWKS_REFRESH_SECONDS,
        )?;
        if auth_jwks_refresh_seconds == 0 {
            return Err(ConfigError::Invalid(
                "PARK_AUTH_JWKS_REFRESH_SECONDS".to_string(),
                "0".to_string(),
            ));
        }
        let liveness_threshold_seconds = read_u64_with_default(
            &lookup,
            "PARK_LIVENESS_THRESHOLD_SECONDS",
            DEFAULT_LIVENESS_THRESHOLD_SECONDS,
        )?;
        if liveness_threshold_seconds == 0 {
            return Err(ConfigError::Invalid(
                "PARK_LIVENESS_THRESHOLD_SECONDS".to_string(),
                "0".to_string(),
            ));
        }

        Ok(Self {
            http_addr,
            rtdb_url,
            rtdb_auth,
            rtdb_stream,
            firestore,
            auth_key,
            auth_audience,
            auth_jwks_refresh_seconds,
            liveness_threshold_seconds,
        })
    }
}

/// 优先级：JWKS 地址、RS256 公钥、共享密钥；都没有时报缺失。
fn read_auth_key<F>(lookup: &F) -> Result<AuthKeyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = read_optional(lookup, "PARK_AUTH_JWKS_URL") {
        return Ok(AuthKeyConfig::Jwks { url });
    }
    if let Some(pem) = read_optional(lookup, "PARK_AUTH_PUBLIC_KEY_PEM") {
        // 单行环境变量里的换行以字面 `\n` 表示
        return Ok(AuthKeyConfig::Rs256 {
            public_key_pem: pem.replace("\\n", "\n"),
        });
    }
    if let Some(secret) = read_optional(lookup, "PARK_AUTH_SECRET") {
        return Ok(AuthKeyConfig::Hs256 { secret });
    }
    Err(ConfigError::Missing(
        "PARK_AUTH_JWKS_URL, PARK_AUTH_PUBLIC_KEY_PEM or PARK_AUTH_SECRET".to_string(),
    ))
}

fn read_u64_with_default<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match read_optional(lookup, key) {
        Some(value) => value,
        None => return Ok(default),
    };
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match read_optional(lookup, key) {
        Some(value) => value,
        None => return Ok(default),
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}
