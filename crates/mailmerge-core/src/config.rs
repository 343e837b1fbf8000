//! Merge configuration.
//!
//! A JSON file can hold everything the command line accepts. Command line
//! values are layered on top by the binary.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use mailmerge_smtp::{Security, Server, Submission};
use mailmerge_tabular::DEFAULT_LOOKAHEAD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::merge::{ErrorPolicy, MergeJob};
use crate::overrides::NamedValues;
use crate::template::MessageTemplate;
use crate::transport::{DirectoryTransport, MboxTransport, SmtpTransport, Transport};

/// Where merged messages go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Output {
    /// One `.eml` file per row in a directory.
    Directory {
        /// Output directory.
        path: PathBuf,
    },
    /// A single mbox file.
    Mbox {
        /// Output file, truncated if it exists.
        path: PathBuf,
    },
    /// An mbox stream on standard output.
    #[default]
    Stdout,
    /// Submission to an SMTP server.
    Smtp {
        /// `host` or `host:port`; the port defaults to 25.
        server: String,
        /// PLAIN authentication username; no AUTH when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        /// PLAIN authentication password.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        /// Start with TLS instead of upgrading with STARTTLS.
        #[serde(default)]
        implicit_tls: bool,
    },
}

impl Output {
    /// Opens the transport for this output.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created, or the
    /// SMTP server address is invalid.
    pub fn open(&self) -> Result<Box<dyn Transport>> {
        let transport: Box<dyn Transport> = match self {
            Self::Directory { path } => Box::new(DirectoryTransport::create(path)?),
            Self::Mbox { path } => {
                Box::new(MboxTransport::new(BufWriter::new(File::create(path)?)))
            }
            Self::Stdout => Box::new(MboxTransport::new(std::io::stdout().lock())),
            Self::Smtp { .. } => Box::new(SmtpTransport::new(self.submission()?)?),
        };
        Ok(transport)
    }

    /// Builds the SMTP submission settings for an [`Output::Smtp`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for any other output, or the address error
    /// if the server is not `host` or `host:port`.
    pub fn submission(&self) -> Result<Submission> {
        let Self::Smtp {
            server,
            username,
            password,
            implicit_tls,
        } = self
        else {
            return Err(Error::Config("output is not SMTP".to_string()));
        };

        let security = if *implicit_tls {
            Security::ImplicitTls
        } else {
            Security::StartTls
        };
        let mut submission = Submission::new(Server::parse(server)?).security(security);
        if let Some(username) = username {
            submission = submission.credentials(username, password.as_deref().unwrap_or_default());
        }
        Ok(submission)
    }
}

/// Settings for one merge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Comma or tab separated input, one row per message.
    pub tabular_file: Option<PathBuf>,
    /// Message template (headers, blank line, body).
    pub template_file: Option<PathBuf>,
    /// Delivery destination.
    pub output: Output,
    /// Values that override same-named input columns.
    pub overrides: NamedValues,
    /// Rows parsed ahead during dialect detection.
    pub lookahead: usize,
    /// Per-row error policy.
    pub policy: ErrorPolicy,
    /// Maximum number of rows to merge.
    pub limit: Option<usize>,
    /// Render without delivering.
    pub dry_run: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            tabular_file: None,
            template_file: None,
            output: Output::default(),
            overrides: NamedValues::new(),
            lookahead: DEFAULT_LOOKAHEAD,
            policy: ErrorPolicy::default(),
            limit: None,
            dry_run: false,
        }
    }
}

impl MergeConfig {
    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Returns the input path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no input file is set.
    pub fn tabular_path(&self) -> Result<&Path> {
        self.tabular_file
            .as_deref()
            .ok_or_else(|| Error::Config("no tabular file given".to_string()))
    }

    /// Loads the template and builds the job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no template is set, or the template
    /// load error.
    pub fn job(&self) -> Result<MergeJob> {
        let path = self
            .template_file
            .as_deref()
            .ok_or_else(|| Error::Config("no template file given".to_string()))?;

        Ok(MergeJob::new(MessageTemplate::load(path)?)
            .overrides(self.overrides.clone())
            .policy(self.policy)
            .limit(self.limit)
            .dry_run(self.dry_run)
            .lookahead(self.lookahead))
    }
}
