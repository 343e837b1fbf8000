//! Plain and TLS transport for a session.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::error::{Error, Result};
use crate::server::Server;

/// Connection to a submission server.
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS connection.
    Tls(Box<BufReader<TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Opens a plain TCP connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(server: &Server) -> Result<Self> {
        let tcp = TcpStream::connect((server.host.as_str(), server.port)).await?;
        Ok(Self::Tcp(BufReader::new(tcp)))
    }

    /// Opens a connection that starts with a TLS handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or handshake fails.
    pub async fn connect_tls(server: &Server) -> Result<Self> {
        let tcp = TcpStream::connect((server.host.as_str(), server.port)).await?;
        handshake(tcp, &server.host).await
    }

    /// Returns true once the connection is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads one line without its line ending.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the server closed the
    /// connection.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
        };
        if n == 0 {
            return Err(Error::Protocol("Connection closed by server".into()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes and flushes `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Upgrades a plain connection to TLS after STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is already encrypted or the
    /// handshake fails.
    pub async fn upgrade(self, host: &str) -> Result<Self> {
        match self {
            Self::Tcp(reader) => handshake(reader.into_inner(), host).await,
            Self::Tls(_) => Err(Error::Protocol("Connection already uses TLS".into())),
        }
    }
}

async fn handshake(tcp: TcpStream, host: &str) -> Result<SmtpStream> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| Error::InvalidServer(host.to_string()))?;
    let tls = connector().connect(server_name, tcp).await?;
    Ok(SmtpStream::Tls(Box::new(BufReader::new(tls))))
}

/// Creates a TLS connector trusting the bundled web PKI roots.
fn connector() -> TlsConnector {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}
