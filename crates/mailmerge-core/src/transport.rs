//! Delivery of rendered messages.
//!
//! Messages go to a submission server, one session per message, or to local
//! files for review or hand-off.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use mailmerge_mime::{Address, Message};
use mailmerge_smtp::Submission;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::error::Result;

/// Destination for merged messages.
pub trait Transport {
    /// Delivers the message rendered from data row `row` (1-based).
    ///
    /// # Errors
    ///
    /// Returns an error if the message is not deliverable or the
    /// destination fails.
    fn deliver(&mut self, row: usize, message: &Message) -> Result<()>;

    /// Flushes anything buffered once the run is over.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each message to its own `.eml` file.
#[derive(Debug, Clone)]
pub struct DirectoryTransport {
    dir: PathBuf,
}

impl DirectoryTransport {
    /// Creates the transport, creating `dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the file path used for data row `row`.
    #[must_use]
    pub fn path_for(&self, row: usize) -> PathBuf {
        self.dir.join(format!("{row:04}.eml"))
    }

    /// Returns the output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Transport for DirectoryTransport {
    fn deliver(&mut self, row: usize, message: &Message) -> Result<()> {
        message.envelope_recipients()?;
        let path = self.path_for(row);
        fs::write(&path, message.to_bytes()?)?;
        debug!(path = %path.display(), "Wrote message");
        Ok(())
    }
}

/// Appends messages to an mbox stream (mboxrd quoting).
#[derive(Debug)]
pub struct MboxTransport<W: Write> {
    out: W,
}

impl<W: Write> MboxTransport<W> {
    /// Creates the transport over `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the transport, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Transport for MboxTransport<W> {
    fn deliver(&mut self, row: usize, message: &Message) -> Result<()> {
        message.envelope_recipients()?;
        let sender = message.sender()?;
        let wire = String::from_utf8_lossy(&message.to_bytes()?).into_owned();

        writeln!(
            self.out,
            "From {} {}",
            sender.address,
            Utc::now().format("%a %b %e %H:%M:%S %Y")
        )?;
        for line in wire.lines() {
            if is_from_line(line) {
                self.out.write_all(b">")?;
            }
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out)?;

        debug!(row, "Appended message to mbox");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Submits each message to an SMTP server.
///
/// Every message gets its own session, driven to completion on a private
/// single-threaded runtime.
#[derive(Debug)]
pub struct SmtpTransport {
    runtime: Runtime,
    submission: Submission,
}

impl SmtpTransport {
    /// Creates the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be started.
    pub fn new(submission: Submission) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            submission,
        })
    }

    /// Returns the submission settings.
    #[must_use]
    pub const fn submission(&self) -> &Submission {
        &self.submission
    }
}

impl Transport for SmtpTransport {
    fn deliver(&mut self, row: usize, message: &Message) -> Result<()> {
        let recipients: Vec<Address> = message
            .envelope_recipients()?
            .into_iter()
            .map(|mailbox| mailbox.address)
            .collect();
        let sender = message.sender()?;
        let wire = message.to_bytes()?;

        self.runtime
            .block_on(self.submission.send(&sender.address, &recipients, &wire))?;
        debug!(row, server = %self.submission.server(), "Submitted message");
        Ok(())
    }
}

/// Matches `From ` preceded by any number of `>`.
fn is_from_line(line: &str) -> bool {
    line.trim_start_matches('>').starts_with("From ")
}
