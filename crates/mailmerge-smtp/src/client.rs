//! Type-state SMTP client.
//!
//! ```text
//! Client<Greeted> ── ehlo() ──→ Client<Ready> ── starttls() / auth_plain() / send() ──→ Client<Ready>
//! ```

use std::marker::PhantomData;

use base64::Engine;
use mailmerge_mime::Address;
use tracing::trace;

use crate::capability::Capabilities;
use crate::command::{Command, frame_data};
use crate::error::{Error, Result};
use crate::reply::{Reply, ReplyCode, is_last_line};
use crate::stream::SmtpStream;

/// Type-state marker: server greeting received.
#[derive(Debug)]
pub struct Greeted;

/// Type-state marker: EHLO accepted, transactions allowed.
#[derive(Debug)]
pub struct Ready;

/// SMTP client.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    capabilities: Capabilities,
    _state: PhantomData<State>,
}

impl Client<Greeted> {
    /// Reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is missing or not 220.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(greeting.into_error());
        }
        Ok(Self {
            stream,
            capabilities: Capabilities::default(),
            _state: PhantomData,
        })
    }

    /// Sends EHLO and records the server's extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if EHLO is rejected.
    pub async fn ehlo(mut self, hostname: &str) -> Result<Client<Ready>> {
        self.hello(hostname).await?;
        Ok(Client {
            stream: self.stream,
            capabilities: self.capabilities,
            _state: PhantomData,
        })
    }
}

impl Client<Ready> {
    /// Upgrades to TLS with STARTTLS and repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not offered or the upgrade fails.
    pub async fn starttls(mut self, server_host: &str, hostname: &str) -> Result<Self> {
        if !self.capabilities.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }
        self.command(Command::StartTls).await?;
        self.stream = self.stream.upgrade(server_host).await?;
        self.hello(hostname).await?;
        Ok(self)
    }

    /// Authenticates with the PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if AUTH is not offered or the credentials are
    /// rejected.
    pub async fn auth_plain(mut self, username: &str, password: &str) -> Result<Self> {
        if !self.capabilities.supports_auth() {
            return Err(Error::NotSupported("AUTH".into()));
        }
        let response = base64::engine::general_purpose::STANDARD
            .encode(format!("\0{username}\0{password}"));
        self.command(Command::AuthPlain { response }).await?;
        Ok(self)
    }

    /// Runs one mail transaction.
    ///
    /// `message` is the RFC 5322 wire form; it is dot-stuffed and
    /// terminated here.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is over the advertised size limit or
    /// the server rejects the sender, a recipient or the message.
    pub async fn send(&mut self, from: &Address, to: &[Address], message: &[u8]) -> Result<()> {
        let limit = self.capabilities.max_size().filter(|&limit| limit > 0);
        if let Some(limit) = limit.filter(|&limit| message.len() > limit) {
            return Err(Error::MessageTooLarge {
                size: message.len(),
                limit,
            });
        }

        self.command(Command::MailFrom {
            from: from.clone(),
            size: limit.map(|_| message.len()),
        })
        .await?;
        for recipient in to {
            self.command(Command::RcptTo {
                to: recipient.clone(),
            })
            .await?;
        }

        let reply = self.exchange(&Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(reply.into_error());
        }
        self.stream.write_all(&frame_data(message)).await?;
        let reply = read_reply(&mut self.stream).await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }
        Ok(())
    }
}

impl<S> Client<S> {
    /// Returns what the server offered in its last EHLO reply.
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns true once the session is encrypted.
    pub const fn is_encrypted(&self) -> bool {
        self.stream.is_tls()
    }

    /// Sends QUIT and closes the session.
    ///
    /// # Errors
    ///
    /// Returns an error if QUIT is rejected.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.exchange(&Command::Quit).await?;
        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(reply.into_error());
        }
        Ok(())
    }

    async fn hello(&mut self, hostname: &str) -> Result<()> {
        let reply = self
            .command(Command::Ehlo {
                hostname: hostname.to_string(),
            })
            .await?;
        self.capabilities = Capabilities::from_ehlo(&reply.lines);
        Ok(())
    }

    /// Sends `cmd` and requires a 2xx reply.
    async fn command(&mut self, cmd: Command) -> Result<Reply> {
        let reply = self.exchange(&cmd).await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }
        Ok(reply)
    }

    async fn exchange(&mut self, cmd: &Command) -> Result<Reply> {
        trace!(command = cmd.verb(), "C:");
        self.stream.write_all(&cmd.serialize()).await?;
        let reply = read_reply(&mut self.stream).await?;
        trace!(code = %reply.code, "S:");
        Ok(reply)
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        let last = is_last_line(&line);
        lines.push(line);
        if last {
            break;
        }
    }
    Reply::parse(&lines)
}
