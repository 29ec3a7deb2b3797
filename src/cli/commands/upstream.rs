use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;
use url::Url;

pub const ARG_DIRECTORY_ENDPOINT: &str = "directory-endpoint";
pub const ARG_FEDERATION_ENDPOINT: &str = "federation-endpoint";
pub const ARG_IDENTITY_POOL_ID: &str = "identity-pool-id";
pub const ARG_REQUEST_TIMEOUT_SECONDS: &str = "request-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub directory_endpoint: Url,
    pub federation_endpoint: Url,
    pub identity_pool_id: String,
    pub request_timeout: Duration,
}

impl Options {
    /// Parse upstream service arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing or an endpoint is not a URL.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let required = |id: &str| -> anyhow::Result<String> {
            match matches.get_one::<String>(id) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => anyhow::bail!("missing required argument: --{id}"),
            }
        };

        let directory_endpoint = Url::parse(&required(ARG_DIRECTORY_ENDPOINT)?)
            .with_context(|| format!("invalid --{ARG_DIRECTORY_ENDPOINT}"))?;
        let federation_endpoint = Url::parse(&required(ARG_FEDERATION_ENDPOINT)?)
            .with_context(|| format!("invalid --{ARG_FEDERATION_ENDPOINT}"))?;
        let identity_pool_id = required(ARG_IDENTITY_POOL_ID)?;

        let request_timeout = Duration::from_secs(
            matches
                .get_one::<u64>(ARG_REQUEST_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(10),
        );

        Ok(Self {
            directory_endpoint,
            federation_endpoint,
            identity_pool_id,
            request_timeout,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DIRECTORY_ENDPOINT)
                .long(ARG_DIRECTORY_ENDPOINT)
                .help("User directory admin API endpoint")
                .long_help(
                    "User directory admin API endpoint. Requests are plain JSON 1.1 calls, so this is usually a local signing proxy in front of the identity provider.",
                )
                .env("AUTHFLOW_DIRECTORY_ENDPOINT"),
        )
        .arg(
            Arg::new(ARG_FEDERATION_ENDPOINT)
                .long(ARG_FEDERATION_ENDPOINT)
                .help("Identity federation API endpoint")
                .env("AUTHFLOW_FEDERATION_ENDPOINT"),
        )
        .arg(
            Arg::new(ARG_IDENTITY_POOL_ID)
                .long(ARG_IDENTITY_POOL_ID)
                .help("Identity pool used to resolve federated identity ids")
                .env("AUTHFLOW_IDENTITY_POOL_ID"),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT_SECONDS)
                .long(ARG_REQUEST_TIMEOUT_SECONDS)
                .help("Timeout for directory and federation calls, in seconds")
                .default_value("10")
                .env("AUTHFLOW_REQUEST_TIMEOUT_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
