//! # Authflow (custom challenge authentication)
//!
//! `authflow` answers the three custom-auth triggers of a managed user pool:
//! define, create and verify the auth challenge.
//!
//! ## Challenges
//!
//! Every sign-in gets a single custom challenge. Users in the
//! `FORCE_CHANGE_PASSWORD` status receive a `ForceChangePassword` challenge
//! whose answer carries both the current and the new password; everybody else
//! gets `BasicAuth`.
//!
//! ## Verification
//!
//! Answers are checked against the directory admin API (`ADMIN_NO_SRP_AUTH`).
//! The resulting id token is exchanged for a federated identity id, which is
//! linked to a local account. Blacklisted accounts are denied even with a
//! correct password.
//!
//! ## Errors
//!
//! Denials reach the end user with a short message. Every other failure is
//! reported as `Internal Server Error` and only detailed in the logs.

pub mod accounts;
pub mod api;
pub mod cli;
pub mod directory;
pub mod federation;
pub mod flow;
pub mod rpc;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
