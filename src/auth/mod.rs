//! Login handshake and credential management.
//!
//! Authentication is a precondition for every other request in a run: the
//! listing pages and the quick-view lookup both require the member cookies
//! the login handshake leaves in the session's jar.

mod credentials;

pub use credentials::{CredentialError, CredentialProvider, Credentials, FileCredentialProvider};

use thiserror::Error;
use tracing::{debug, info};

use crate::parser::PageParser;
use crate::session::{HttpSession, SessionError};

/// Errors from the login handshake. All of them abort the run.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login page did not contain the anti-forgery nonce.
    #[error("login page had no login nonce; site markup may have changed")]
    MissingNonce,

    /// The post-login page did not look logged in.
    #[error("login rejected for user {username}")]
    LoginRejected {
        /// The username that failed to log in.
        username: String,
    },

    /// Reading a login response body failed.
    #[error("failed to read login response body: {0}")]
    Body(#[source] reqwest::Error),

    /// Transport failure during the handshake.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Performs the nonce-protected login handshake against the site.
///
/// Success detection is a substring heuristic (the username appearing in the
/// post-login body); the site offers no structured login status. The heuristic
/// is confined to this type so a structured check can replace it without
/// touching the crawler.
#[derive(Debug, Clone)]
pub struct Authenticator {
    login_url: String,
}

impl Authenticator {
    /// Creates an authenticator for the site at `base_url`
    /// (e.g. `https://artvee.com`).
    #[must_use]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            login_url: format!("{}/login", base_url.as_ref().trim_end_matches('/')),
        }
    }

    /// Runs the login handshake on `session`, leaving auth cookies in its jar.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] on any handshake failure; callers must abort the
    /// run, no automatic retry is attempted.
    pub async fn authenticate(
        &self,
        session: &HttpSession,
        parser: &dyn PageParser,
        credentials: &Credentials,
    ) -> Result<(), AuthError> {
        debug!(url = %self.login_url, "fetching login page");
        let login_page = session.get(&self.login_url).await?;
        let login_html = login_page.text().await.map_err(AuthError::Body)?;

        let nonce = parser
            .login_nonce(&login_html)
            .ok_or(AuthError::MissingNonce)?;

        let form = [
            ("log", credentials.username.as_str()),
            ("pwd", credentials.password.as_str()),
            ("ihcaction", "login"),
            ("ihc_login_nonce", nonce.as_str()),
        ];
        let response = session.post_form(&self.login_url, &form).await?;
        let body = response.text().await.map_err(AuthError::Body)?;

        if body.contains(&credentials.username) {
            info!(username = %credentials.username, "logged in");
            Ok(())
        } else {
            Err(AuthError::LoginRejected {
                username: credentials.username.clone(),
            })
        }
    }
}
