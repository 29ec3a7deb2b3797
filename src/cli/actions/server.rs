use crate::{
    accounts::{AccountStore, MemoryAccountStore, PostgresAccountStore},
    api,
    cli::telemetry,
    directory::DirectoryClient,
    federation::FederationClient,
    flow::ChallengeFlow,
};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<SecretString>,
    pub directory_endpoint: Url,
    pub federation_endpoint: Url,
    pub identity_pool_id: String,
    pub request_timeout: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if a client cannot be built, the database is unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let directory = DirectoryClient::new(args.directory_endpoint.clone(), args.request_timeout)?;
    let federation = FederationClient::new(
        args.federation_endpoint.clone(),
        args.identity_pool_id.clone(),
        args.request_timeout,
    )?;

    let accounts: Arc<dyn AccountStore> = if let Some(dsn) = &args.dsn {
        Arc::new(PostgresAccountStore::connect(dsn.expose_secret()).await?)
    } else {
        warn!("No --dsn given, accounts are kept in memory");
        Arc::new(MemoryAccountStore::new())
    };

    let flow = ChallengeFlow::new(Arc::new(directory), Arc::new(federation), accounts);

    let result = api::new(args.port, Arc::new(flow)).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        (
            "dsn",
            args.dsn.as_ref().map_or_else(
                || "none (memory)".to_string(),
                |dsn| redact_dsn(dsn.expose_secret()),
            ),
        ),
        ("directory_endpoint", args.directory_endpoint.to_string()),
        ("federation_endpoint", args.federation_endpoint.to_string()),
        ("identity_pool_id", args.identity_pool_id.clone()),
        (
            "request_timeout",
            format!("{}s", args.request_timeout.as_secs()),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_dsn_hides_password() {
        assert_eq!(
            redact_dsn("postgres://authflow:hunter2@db:5432/authflow"),
            "postgres://authflow:REDACTED@db:5432/authflow"
        );
        assert_eq!(
            redact_dsn("postgres://authflow@db/authflow"),
            "postgres://authflow@db/authflow"
        );
        assert_eq!(redact_dsn("not a dsn"), "invalid-dsn");
    }

    #[test]
    fn short_commit_truncates() {
        assert_eq!(short_commit("0123456789abcdef"), "0123456");
        assert_eq!(short_commit("abc"), "abc");
    }

    #[test]
    fn debug_does_not_leak_dsn() {
        let args = Args {
            port: 8080,
            dsn: Some(SecretString::from(
                "postgres://authflow:hunter2@db/authflow".to_string(),
            )),
            directory_endpoint: Url::parse("http://directory:4000").unwrap(),
            federation_endpoint: Url::parse("http://federation:4001").unwrap(),
            identity_pool_id: "eu-west-1:pool".to_string(),
            request_timeout: Duration::from_secs(10),
        };

        assert!(!format!("{args:?}").contains("hunter2"));
    }
}
