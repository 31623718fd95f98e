use crate::AuthError;
use domain::StaffContext;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;

/// Firebase ID Token 的签发方前缀，后接项目 ID。
pub const SECURE_TOKEN_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

#[derive(Debug, Deserialize)]
/// ID Token 中用到的 claims。
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    staff: bool,
    #[serde(default)]
    admin: bool,
}

/// 校验密钥：单个密钥，或按 `kid` 选择的密钥集合。
enum VerifyKeys {
    Single(DecodingKey),
    ByKid(RwLock<HashMap<String, DecodingKey>>),
}

/// ID Token 校验器。
///
/// 配置了受众时同时要求 `iss` 为 `https://securetoken.google.com/<受众>`。
pub struct IdTokenVerifier {
    keys: VerifyKeys,
    validation: Validation,
}

impl IdTokenVerifier {
    /// HS256 共享密钥。
    pub fn hs256(secret: &str, audience: Option<&str>) -> Self {
        Self::new(
            VerifyKeys::Single(DecodingKey::from_secret(secret.as_bytes())),
            Algorithm::HS256,
            audience,
        )
    }

    /// RS256 公钥（PEM），受众必填。
    pub fn rs256_pem(public_key_pem: &str, audience: &str) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|err| AuthError::Key(err.to_string()))?;
        Ok(Self::new(
            VerifyKeys::Single(key),
            Algorithm::RS256,
            Some(audience),
        ))
    }

    /// RS256 密钥集合（JWKS JSON），按 token 头部的 `kid` 选择公钥。
    pub fn rs256_jwks(jwks_json: &str, audience: &str) -> Result<Self, AuthError> {
        let keys = parse_jwks(jwks_json)?;
        Ok(Self::new(
            VerifyKeys::ByKid(RwLock::new(keys)),
            Algorithm::RS256,
            Some(audience),
        ))
    }

    fn new(keys: VerifyKeys, algorithm: Algorithm, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        match audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                validation.set_issuer(&[format!("{SECURE_TOKEN_ISSUER_PREFIX}{audience}")]);
                validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
            }
            None => validation.validate_aud = false,
        }
        Self { keys, validation }
    }

    /// 替换密钥集合，返回新集合中的密钥数。单密钥校验器不支持替换。
    pub fn replace_jwks(&self, jwks_json: &str) -> Result<usize, AuthError> {
        let VerifyKeys::ByKid(current) = &self.keys else {
            return Err(AuthError::Key("verifier has no key set".to_string()));
        };
        let keys = parse_jwks(jwks_json)?;
        let count = keys.len();
        let mut guard = current
            .write()
            .map_err(|_| AuthError::Key("key set lock poisoned".to_string()))?;
        *guard = keys;
        Ok(count)
    }

    /// 校验 token 并构造值班人员上下文。
    pub fn verify(&self, token: &str) -> Result<StaffContext, AuthError> {
        let claims = match &self.keys {
            VerifyKeys::Single(key) => decode_claims(token, key, &self.validation)?,
            VerifyKeys::ByKid(keys) => {
                let header = jsonwebtoken::decode_header(token).map_err(map_jwt_error)?;
                let kid = header.kid.ok_or(AuthError::TokenInvalid)?;
                let keys = keys.read().map_err(|_| AuthError::TokenInvalid)?;
                let key = keys.get(&kid).ok_or(AuthError::TokenInvalid)?;
                decode_claims(token, key, &self.validation)?
            }
        };
        if claims.sub.trim().is_empty() {
            return Err(AuthError::TokenInvalid);
        }
        if !claims.staff {
            return Err(AuthError::NotStaff);
        }
        let email = claims
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or(AuthError::TokenInvalid)?;
        Ok(StaffContext::new(claims.sub, email, claims.admin))
    }
}

fn decode_claims(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
) -> Result<Claims, AuthError> {
    jsonwebtoken::decode::<Claims>(token, key, validation)
        .map(|data| data.claims)
        .map_err(map_jwt_error)
}

/// 解析 JWKS；没有 `kid` 的密钥无法被选中，直接跳过。
fn parse_jwks(jwks_json: &str) -> Result<HashMap<String, DecodingKey>, AuthError> {
    let set: JwkSet =
        serde_json::from_str(jwks_json).map_err(|err| AuthError::Key(err.to_string()))?;
    let mut keys = HashMap::new();
    for jwk in &set.keys {
        let Some(kid) = jwk.common.key_id.clone() else {
            continue;
        };
        let key = DecodingKey::from_jwk(jwk).map_err(|err| AuthError::Key(err.to_string()))?;
        keys.insert(kid, key);
    }
    if keys.is_empty() {
        return Err(AuthError::Key("key set is empty".to_string()));
    }
    Ok(keys)
}

/// 将 jwt 库错误映射为业务错误。
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    }
}
