//! One-shot message submission.

use std::fmt;

use mailmerge_mime::Address;
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::server::Server;
use crate::stream::SmtpStream;

/// How the session is encrypted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Security {
    /// Plain connection, upgraded with STARTTLS when the server offers it.
    #[default]
    StartTls,
    /// TLS from the first byte, usually port 465.
    ImplicitTls,
}

/// Username and password for PLAIN authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings for submitting messages to one server.
///
/// Each [`Submission::send`] call runs a whole session: connect, EHLO,
/// STARTTLS if offered, AUTH if credentials are set, one transaction, QUIT.
#[derive(Debug, Clone)]
pub struct Submission {
    server: Server,
    security: Security,
    credentials: Option<Credentials>,
    hello_name: String,
}

impl Submission {
    /// Creates a submission to `server` without credentials.
    #[must_use]
    pub fn new(server: Server) -> Self {
        Self {
            server,
            security: Security::default(),
            credentials: None,
            hello_name: "localhost".to_string(),
        }
    }

    /// Sets how the session is encrypted.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Authenticates with PLAIN using these credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Sets the name sent with EHLO (default `localhost`).
    #[must_use]
    pub fn hello_name(mut self, name: impl Into<String>) -> Self {
        self.hello_name = name.into();
        self
    }

    /// Returns the server address.
    #[must_use]
    pub const fn server(&self) -> &Server {
        &self.server
    }

    /// Submits one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails, credentials would travel
    /// unencrypted to a remote host, or the server rejects any step.
    pub async fn send(&self, from: &Address, to: &[Address], message: &[u8]) -> Result<()> {
        let stream = match self.security {
            Security::StartTls => SmtpStream::connect(&self.server).await?,
            Security::ImplicitTls => SmtpStream::connect_tls(&self.server).await?,
        };
        let mut client = Client::from_stream(stream)
            .await?
            .ehlo(&self.hello_name)
            .await?;

        if !client.is_encrypted() && client.capabilities().supports_starttls() {
            client = client.starttls(&self.server.host, &self.hello_name).await?;
        }
        if let Some(credentials) = &self.credentials {
            self.check_auth_allowed(client.is_encrypted())?;
            client = client
                .auth_plain(&credentials.username, &credentials.password)
                .await?;
        }

        client.send(from, to, message).await?;
        debug!(
            server = %self.server,
            encrypted = client.is_encrypted(),
            recipients = to.len(),
            "Submitted message"
        );
        client.quit().await
    }

    fn check_auth_allowed(&self, encrypted: bool) -> Result<()> {
        if encrypted || self.server.is_local() {
            Ok(())
        } else {
            Err(Error::InsecureAuth(self.server.host.clone()))
        }
    }
}
