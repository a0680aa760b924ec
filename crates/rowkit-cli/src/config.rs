//! Credential and client configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use rowkit_core::{AuthMode, Credential, RawCredential};
use rowkit_http::{ApiClient, ClientOptions, TokenPolicy};

use crate::cli::ConnectionArgs;

/// Credential file in the platform config directory, if one can be located.
fn default_credentials_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rowkit").map(|dirs| dirs.config_dir().join("credentials.json"))
}

/// Read a credential file. A missing default file is not an error.
fn load_credentials_file(explicit: Option<&Path>) -> Result<Option<RawCredential>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_credentials_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        },
    };

    debug!(path = %path.display(), "Reading credential file");
    let json = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read credential file {}", path.display()))?;
    let raw = serde_json::from_str(&json).context("Invalid credential file")?;
    Ok(Some(raw))
}

/// Read the credential file and merge flags and environment over it.
pub fn resolve_raw_credential(args: &ConnectionArgs) -> Result<RawCredential> {
    let file = load_credentials_file(args.credentials.as_deref())?;
    Ok(merge_credential(args, file))
}

/// Flags win over file values field by field.
fn merge_credential(args: &ConnectionArgs, file: Option<RawCredential>) -> RawCredential {
    let has_file = file.is_some();
    let mut raw = file.unwrap_or_default();

    if args.host.is_some() {
        raw.host = args.host.clone();
    }
    if args.token.is_some() {
        raw.token = args.token.clone();
    }
    if args.username.is_some() {
        raw.username = args.username.clone();
    }
    if args.password.is_some() {
        raw.password = args.password.clone();
    }

    raw.auth_mode = match args.auth_mode {
        Some(mode) => mode,
        None if has_file => raw.auth_mode,
        // With nothing else to go on, a lone token selects token mode.
        None if raw.token.is_some() && raw.username.is_none() => AuthMode::Token,
        None => AuthMode::UsernamePassword,
    };

    raw
}

pub fn resolve_credential(args: &ConnectionArgs) -> Result<Credential> {
    let raw = resolve_raw_credential(args)?;
    Credential::from_raw(raw).context("Invalid credentials")
}

pub fn client_options(args: &ConnectionArgs) -> ClientOptions {
    ClientOptions {
        timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
        token_policy: if args.cache_token {
            TokenPolicy::cached()
        } else {
            TokenPolicy::PerRequest
        },
    }
}

/// Build the API client for this invocation.
pub fn build_client(args: &ConnectionArgs) -> Result<ApiClient> {
    let credential = resolve_credential(args)?;
    debug!(?credential, "Resolved credential");
    Ok(ApiClient::with_options(credential, client_options(args)))
}
