use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use url::Url;

pub const DEFAULT_DATABASE: &str = "nubo_recent";
pub const DEFAULT_MONGO_HOST: &str = "mongo:27017";
pub const FALLBACK_MONGO_URI: &str = "mongodb://localhost:27017";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub collection_suffix: String,
    pub connect_timeout: Duration,
    pub seed_placeholders: bool,
    pub stale_after_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = match env::var("MONGO_URI").ok().filter(|v| !v.trim().is_empty()) {
            Some(uri) => uri,
            None => match (env::var("MONGO_ROOT_USER"), env::var("MONGO_ROOT_PASSWORD")) {
                (Ok(user), Ok(password)) => {
                    let host =
                        env::var("MONGO_HOST").unwrap_or_else(|_| DEFAULT_MONGO_HOST.to_string());
                    build_database_url(&user, &password, &host)
                }
                _ => {
                    tracing::warn!(
                        fallback = FALLBACK_MONGO_URI,
                        "MONGO_URI and MONGO_ROOT_USER/MONGO_ROOT_PASSWORD unset; using fallback"
                    );
                    FALLBACK_MONGO_URI.to_string()
                }
            },
        };
        let database_name =
            env::var("MONGO_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let collection_suffix = env::var("MONGO_COLLECTION_SUFFIX").unwrap_or_default();
        let connect_timeout_secs: u64 = env::var("MONGO_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("MONGO_CONNECT_TIMEOUT_SECS must be a positive integer")?;
        let seed_placeholders = env::var("SCHEMA_SEED_PLACEHOLDERS")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);
        let stale_after_days = env::var("STALE_AFTER_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("STALE_AFTER_DAYS must be an integer")?;

        Ok(Self {
            database_url,
            database_name,
            collection_suffix,
            connect_timeout: Duration::from_secs(connect_timeout_secs.max(1)),
            seed_placeholders,
            stale_after_days,
        })
    }

    pub fn redacted_database_url(&self) -> String {
        redact_database_url(&self.database_url)
    }
}

fn build_database_url(user: &str, password: &str, host: &str) -> String {
    format!(
        "mongodb://{}:{}@{}",
        utf8_percent_encode(user, NON_ALPHANUMERIC),
        utf8_percent_encode(password, NON_ALPHANUMERIC),
        host
    )
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}

fn redact_database_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("*****"));
            }
            parsed.to_string()
        }
        Err(_) => redact_seed_list(raw).unwrap_or_else(|| "***".to_string()),
    }
}

/// Masks the password of a `mongodb://user:pass@h1:27017,h2:27017/...` seed list,
/// which `Url` rejects because of the comma separated hosts.
fn redact_seed_list(raw: &str) -> Option<String> {
    let (scheme, rest) = raw.split_once("://")?;
    if scheme != "mongodb" && scheme != "mongodb+srv" {
        return None;
    }
    let authority_end = rest.find(|c| c == '/' || c == '?').unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    let Some((userinfo, hosts)) = authority.rsplit_once('@') else {
        return Some(raw.to_string());
    };
    let userinfo = match userinfo.split_once(':') {
        Some((user, _)) => format!("{user}:*****"),
        None => userinfo.to_string(),
    };
    Some(format!("{scheme}://{userinfo}@{hosts}{tail}"))
}
