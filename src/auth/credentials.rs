//! Credential supply: config-file storage with interactive prompting.
//!
//! Credentials live in a small `key = "value"` config file. Values missing
//! from the file are prompted for on stdin and written back, so the second
//! run is non-interactive. The loaded pair is cached in memory for the run.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info};

/// Username/password pair supplied once per run.
///
/// Deliberately has no `Debug`-exposed password and is never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Errors from loading or storing credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reading or writing the config file failed.
    #[error("IO error accessing credential file {path}: {source}")]
    Io {
        /// The config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A config line was not `key = value`.
    #[error("invalid syntax in {path} on line {line}: expected key = value")]
    Syntax {
        /// The config file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
    },

    /// Prompting produced an empty value.
    #[error("{field} must not be empty")]
    EmptyValue {
        /// Which field was empty.
        field: &'static str,
    },
}

/// Supplies the credential pair for the run.
pub trait CredentialProvider: Send + Sync {
    /// Returns the credentials, prompting or loading as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when storage access or prompting fails.
    fn credentials(&self) -> Result<Credentials, CredentialError>;
}

/// [`CredentialProvider`] backed by a key=value config file plus stdin prompts.
pub struct FileCredentialProvider {
    path: PathBuf,
    cached: Mutex<Option<Credentials>>,
}

impl FileCredentialProvider {
    /// Creates a provider for the given config path. Nothing is read until
    /// [`CredentialProvider::credentials`] is called.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    fn load(&self) -> Result<Credentials, CredentialError> {
        let (mut username, mut password) = if self.path.exists() {
            parse_credential_file(&self.path)?
        } else {
            debug!(path = %self.path.display(), "credential file absent; will create");
            (None, None)
        };

        let mut prompted = false;
        if username.as_deref().is_none_or(str::is_empty) {
            username = Some(prompt("Enter your username: ", "username")?);
            prompted = true;
        }
        if password.as_deref().is_none_or(str::is_empty) {
            password = Some(prompt("Enter your password: ", "password")?);
            prompted = true;
        }

        // Both are Some past this point.
        let credentials = Credentials {
            username: username.unwrap_or_default(),
            password: password.unwrap_or_default(),
        };

        if prompted {
            write_credential_file(&self.path, &credentials)?;
            info!(path = %self.path.display(), "credentials stored; edit this file to change them");
        }

        Ok(credentials)
    }
}

impl CredentialProvider for FileCredentialProvider {
    fn credentials(&self) -> Result<Credentials, CredentialError> {
        if let Ok(guard) = self.cached.lock()
            && let Some(cached) = guard.as_ref()
        {
            return Ok(cached.clone());
        }

        let loaded = self.load()?;
        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some(loaded.clone());
        }
        Ok(loaded)
    }
}

fn parse_credential_file(path: &Path) -> Result<(Option<String>, Option<String>), CredentialError> {
    let raw = fs::read_to_string(path).map_err(|source| CredentialError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut username = None;
    let mut password = None;

    for (index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            return Err(CredentialError::Syntax {
                path: path.to_path_buf(),
                line: index + 1,
            });
        };

        let value = parse_string_literal(raw_value.trim());
        match raw_key.trim() {
            "username" => username = Some(value),
            "password" => password = Some(value),
            // Unknown keys are preserved semantics-free; ignore them.
            _ => {}
        }
    }

    Ok((username, password))
}

fn write_credential_file(path: &Path, credentials: &Credentials) -> Result<(), CredentialError> {
    let io_err = |source| CredentialError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let contents = format!(
        "username = \"{}\"\npassword = \"{}\"\n",
        credentials.username, credentials.password
    );
    fs::write(path, contents).map_err(io_err)
}

/// Strips a `#` comment unless it sits inside a quoted value.
fn strip_inline_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..index],
            _ => {}
        }
    }
    line
}

/// Accepts `"quoted"` or bare values.
fn parse_string_literal(value: &str) -> String {
    let trimmed = value.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

fn prompt(message: &str, field: &'static str) -> Result<String, CredentialError> {
    print!("{message}");
    let flush_err = |source| CredentialError::Io {
        path: PathBuf::from("<stdin>"),
        source,
    };
    io::stdout().flush().map_err(flush_err)?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).map_err(flush_err)?;

    let value = line.trim().to_string();
    if value.is_empty() {
        return Err(CredentialError::EmptyValue { field });
    }
    Ok(value)
}
