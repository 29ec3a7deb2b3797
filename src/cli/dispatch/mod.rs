//! Map parsed CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::upstream;
use anyhow::Result;
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .filter(|dsn| !dsn.trim().is_empty())
        .map(SecretString::from);

    let upstream = upstream::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        directory_endpoint: upstream.directory_endpoint,
        federation_endpoint: upstream.federation_endpoint,
        identity_pool_id: upstream.identity_pool_id,
        request_timeout: upstream.request_timeout,
    }))
}
