/*
 * Responsibility
 * - 環境変数の読み込み (JWT_TOKENVAR, JWT_SECRET, CORS 許可、HTTP 制限など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - Gate 用の設定 (GateConfig) は明示的に組み立てて注入する。リクエスト処理中に env を読まない
 */
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use std::{env, fmt};

use jsonwebtoken::Algorithm;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Key family of a signing algorithm. A single verification key can only serve one family,
/// so the allowlist must not mix them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    pub fn of(alg: Algorithm) -> Self {
        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Self::Hmac,
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => Self::Rsa,
            Algorithm::ES256 | Algorithm::ES384 => Self::Ec,
            Algorithm::EdDSA => Self::Ed,
        }
    }
}

/// Parse a comma-separated algorithm allowlist (`"HS256,HS512"`).
///
/// - Empty entries are ignored, but the resulting list must not be empty.
/// - Every algorithm must belong to the same [`KeyFamily`].
/// - `none` is not an [`Algorithm`] and therefore can never be allowed.
pub fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        // `EdDSA` is the only mixed-case name
        let alg = if name.eq_ignore_ascii_case("eddsa") {
            Algorithm::EdDSA
        } else {
            Algorithm::from_str(&name.to_ascii_uppercase())
                .map_err(|_| ConfigError::Invalid("JWT_ALGORITHMS"))?
        };
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }

    let Some(first) = algorithms.first() else {
        return Err(ConfigError::Invalid("JWT_ALGORITHMS"));
    };
    let family = KeyFamily::of(*first);
    if algorithms.iter().any(|a| KeyFamily::of(*a) != family) {
        return Err(ConfigError::Invalid("JWT_ALGORITHMS"));
    }

    Ok(algorithms)
}

/// Gate configuration: supplied once at startup and immutable afterwards.
#[derive(Clone)]
pub struct GateConfig {
    /// Header / body / cookie field that carries the token (ex: `x-access-token`).
    pub token_field_name: String,
    /// HMAC secret, or PEM public key for the asymmetric families.
    pub verification_key: String,
    pub algorithms: Vec<Algorithm>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
    pub reject_delay: Duration,
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("GateConfig")
            .field("token_field_name", &self.token_field_name)
            .field("algorithms", &self.algorithms)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("reject_delay", &self.reject_delay)
            .finish()
    }
}

impl GateConfig {
    /// HS256 gate with no iss/aud checks and no leeway. Tests and embedders start here.
    pub fn new(token_field_name: impl Into<String>, verification_key: impl Into<String>) -> Self {
        Self {
            token_field_name: token_field_name.into(),
            verification_key: verification_key.into(),
            algorithms: vec![Algorithm::HS256],
            issuer: None,
            audience: None,
            leeway_seconds: 0,
            reject_delay: Duration::ZERO,
        }
    }

    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_leeway(mut self, leeway_seconds: u64) -> Self {
        self.leeway_seconds = leeway_seconds;
        self
    }

    pub fn with_reject_delay(mut self, delay: Duration) -> Self {
        self.reject_delay = delay;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let token_field_name = env::var("JWT_TOKENVAR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_TOKENVAR"))?;

        // The field is also looked up as an HTTP header name (case-insensitive there,
        // exact match for body and cookie keys).
        axum::http::HeaderName::from_str(&token_field_name)
            .map_err(|_| ConfigError::Invalid("JWT_TOKENVAR"))?;

        let verification_key = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?
            .replace("\\n", "\n");

        let algorithms =
            parse_algorithms(&env::var("JWT_ALGORITHMS").unwrap_or_else(|_| "HS256".to_string()))?;

        let issuer = env::var("JWT_ISSUER").ok().filter(|s| !s.trim().is_empty());
        let audience = env::var("JWT_AUDIENCE").ok().filter(|s| !s.trim().is_empty());

        let leeway_seconds = parse_or_default("JWT_LEEWAY_SECONDS", 0)?;
        let reject_delay = Duration::from_millis(parse_or_default("JWT_REJECT_DELAY_MS", 0)?);

        Ok(Self {
            token_field_name,
            verification_key,
            algorithms,
            issuer,
            audience,
            leeway_seconds,
            reject_delay,
        })
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub body_limit_bytes: usize,
    pub request_timeout: Duration,

    pub locale_file: Option<PathBuf>,

    pub gate: GateConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_or_default("PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let body_limit_bytes = parse_or_default("HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let request_timeout = Duration::from_secs(parse_or_default("HTTP_TIMEOUT_SECONDS", 30)?);

        let locale_file = env::var("LOCALE_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let gate = GateConfig::from_env()?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            body_limit_bytes,
            request_timeout,
            locale_file,
            gate,
        })
    }
}

// Unset → default, set but unparsable → startup failure.
fn parse_or_default<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        _ => Ok(default),
    }
}
