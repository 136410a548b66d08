use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_INDEX: &str = "photos";
pub const DEFAULT_LOCALE_ID: &str = "en_US";
pub const DEFAULT_SEARCH_SERVICE: &str = "es";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub region: String,
    pub opensearch_url: String,
    pub opensearch_index: String,
    pub search_service: String,
    pub bot_id: String,
    pub bot_alias_id: String,
    pub locale_id: String,
    /// Fixed NLU session; `None` gives every query its own session.
    pub lex_session_id: Option<String>,
    pub s3_url: String,
    pub rekognition_url: String,
    pub lex_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Label-based photo indexing and natural-language search")]
pub struct Args {
    /// Host to bind to (overrides PHOTO_SEARCH_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PHOTO_SEARCH_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Signing region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Search cluster endpoint; a bare host gets `https://` (overrides OPENSEARCH_URL)
    #[arg(long)]
    pub opensearch_url: Option<String>,

    /// Index holding photo documents (overrides OPENSEARCH_INDEX)
    #[arg(long)]
    pub opensearch_index: Option<String>,

    /// Signing service name of the search cluster (overrides OPENSEARCH_SERVICE)
    #[arg(long)]
    pub search_service: Option<String>,

    /// NLU bot identifier (overrides BOT_ID)
    #[arg(long)]
    pub bot_id: Option<String>,

    /// NLU bot alias identifier (overrides BOT_ALIAS_ID)
    #[arg(long)]
    pub bot_alias_id: Option<String>,

    /// NLU locale (overrides LEX_LOCALE_ID)
    #[arg(long)]
    pub locale_id: Option<String>,

    /// Pin every query to one NLU session (overrides LEX_SESSION_ID)
    #[arg(long)]
    pub lex_session_id: Option<String>,

    /// Object storage base URL (overrides S3_URL)
    #[arg(long)]
    pub s3_url: Option<String>,

    /// Label detection endpoint (overrides REKOGNITION_URL)
    #[arg(long)]
    pub rekognition_url: Option<String>,

    /// NLU runtime endpoint (overrides LEX_URL)
    #[arg(long)]
    pub lex_url: Option<String>,
}

impl AppConfig {
    /// Parse CLI args and the process environment into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge `args` over values looked up by `env`, then over defaults.
    pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let env_port = match lookup("PHOTO_SEARCH_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PHOTO_SEARCH_PORT value `{}`", value))?,
            None => 3000,
        };

        let region = args
            .region
            .or_else(|| lookup("AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.into());

        let opensearch_url = args
            .opensearch_url
            .or_else(|| lookup("OPENSEARCH_URL"))
            .context("OPENSEARCH_URL is required")?;
        let bot_id = args
            .bot_id
            .or_else(|| lookup("BOT_ID"))
            .context("BOT_ID is required")?;
        let bot_alias_id = args
            .bot_alias_id
            .or_else(|| lookup("BOT_ALIAS_ID"))
            .context("BOT_ALIAS_ID is required")?;

        let s3_url = args
            .s3_url
            .or_else(|| lookup("S3_URL"))
            .unwrap_or_else(|| format!("https://s3.{region}.amazonaws.com"));
        let rekognition_url = args
            .rekognition_url
            .or_else(|| lookup("REKOGNITION_URL"))
            .unwrap_or_else(|| format!("https://rekognition.{region}.amazonaws.com"));
        let lex_url = args
            .lex_url
            .or_else(|| lookup("LEX_URL"))
            .unwrap_or_else(|| format!("https://runtime-v2-lex.{region}.amazonaws.com"));

        let cfg = Self {
            host: args
                .host
                .or_else(|| lookup("PHOTO_SEARCH_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            opensearch_url: with_scheme(&opensearch_url),
            opensearch_index: args
                .opensearch_index
                .or_else(|| lookup("OPENSEARCH_INDEX"))
                .unwrap_or_else(|| DEFAULT_INDEX.into()),
            search_service: args
                .search_service
                .or_else(|| lookup("OPENSEARCH_SERVICE"))
                .unwrap_or_else(|| DEFAULT_SEARCH_SERVICE.into()),
            bot_id,
            bot_alias_id,
            locale_id: args
                .locale_id
                .or_else(|| lookup("LEX_LOCALE_ID"))
                .unwrap_or_else(|| DEFAULT_LOCALE_ID.into()),
            lex_session_id: args
                .lex_session_id
                .or_else(|| lookup("LEX_SESSION_ID")),
            s3_url: with_scheme(&s3_url),
            rekognition_url: with_scheme(&rekognition_url),
            lex_url: with_scheme(&lex_url),
            region,
        };

        if cfg.opensearch_index.contains('/') {
            bail!("OPENSEARCH_INDEX `{}` must not contain `/`", cfg.opensearch_index);
        }

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Endpoints may be configured as bare hosts; those are reached over HTTPS.
fn with_scheme(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}
