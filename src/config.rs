use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub frontend_dir: String,
    pub cors_origin: String,
    pub domain_suffix: String,
    pub kaiten_scheme: String,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();
        Ok(Self {
            port: match std::env::var("PORT") {
                Ok(v) => v
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid PORT {v:?}: {e}"))?,
                Err(_) => defaults.port,
            },
            frontend_dir: std::env::var("FRONTEND_DIR").unwrap_or(defaults.frontend_dir),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            domain_suffix: std::env::var("KAITEN_DOMAIN_SUFFIX")
                .unwrap_or(defaults.domain_suffix),
            kaiten_scheme: std::env::var("KAITEN_SCHEME").unwrap_or(defaults.kaiten_scheme),
            http_timeout_secs: match std::env::var("HTTP_TIMEOUT_SECS") {
                Ok(v) => v
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid HTTP_TIMEOUT_SECS {v:?}: {e}"))?,
                Err(_) => defaults.http_timeout_secs,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 21549,
            frontend_dir: "static".into(),
            cors_origin: "http://localhost:21549,http://127.0.0.1:21549".into(),
            domain_suffix: ".kaiten.ru".into(),
            kaiten_scheme: "https".into(),
            http_timeout_secs: 60,
        }
    }
}
