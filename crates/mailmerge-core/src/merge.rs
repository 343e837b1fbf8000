//! The merge loop: rows in, messages out.

use std::io::{Read, Seek};

use mailmerge_tabular::{DEFAULT_LOOKAHEAD, Dialect, TabularReader};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::overrides::{NamedValues, combine};
use crate::template::MessageTemplate;
use crate::transport::Transport;

/// What to do when a row fails to render or deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Stop at the first failed row.
    #[default]
    StopOnError,
    /// Log the failure and move on to the next row.
    Continue,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Detected input dialect.
    pub dialect: Dialect,
    /// Data rows read.
    pub rows: usize,
    /// Messages handed to the transport (or rendered, on a dry run).
    pub delivered: usize,
    /// Rows that failed under [`ErrorPolicy::Continue`].
    pub failed: usize,
}

/// A configured merge run.
#[derive(Debug, Clone)]
pub struct MergeJob {
    template: MessageTemplate,
    overrides: NamedValues,
    policy: ErrorPolicy,
    limit: Option<usize>,
    dry_run: bool,
    lookahead: usize,
}

impl MergeJob {
    /// Creates a job with no overrides that stops on the first error.
    #[must_use]
    pub fn new(template: MessageTemplate) -> Self {
        Self {
            template,
            overrides: NamedValues::new(),
            policy: ErrorPolicy::default(),
            limit: None,
            dry_run: false,
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }

    /// Sets the values that override input columns.
    #[must_use]
    pub fn overrides(mut self, overrides: NamedValues) -> Self {
        self.overrides = overrides;
        self
    }

    /// Sets the per-row error policy.
    #[must_use]
    pub const fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stops after `limit` data rows.
    #[must_use]
    pub const fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Renders and validates every message without delivering.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets how many rows are parsed ahead during dialect detection.
    #[must_use]
    pub const fn lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Runs the merge over `source`.
    ///
    /// Template fields are checked against the input columns and overrides
    /// before any message is delivered.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, the template needs a
    /// field nothing provides, or a row fails under
    /// [`ErrorPolicy::StopOnError`].
    pub fn run<R: Read + Seek>(
        &self,
        source: R,
        transport: &mut dyn Transport,
    ) -> Result<MergeReport> {
        let mut reader = TabularReader::with_lookahead(source, self.lookahead)?;
        info!(
            dialect = %reader.dialect(),
            columns = reader.header().len(),
            "Detected input format"
        );
        self.check_fields(reader.header())?;

        let mut report = MergeReport {
            dialect: reader.dialect(),
            rows: 0,
            delivered: 0,
            failed: 0,
        };

        while self.limit.is_none_or(|limit| report.rows < limit) {
            let Some(record) = reader.read()? else {
                break;
            };
            report.rows += 1;
            let row = report.rows;

            match self.merge_row(row, &record, transport) {
                Ok(()) => report.delivered += 1,
                Err(err) => match self.policy {
                    ErrorPolicy::StopOnError => {
                        return Err(Error::Row {
                            row,
                            source: Box::new(err),
                        });
                    }
                    ErrorPolicy::Continue => {
                        warn!(row, error = %err, "Skipping row");
                        report.failed += 1;
                    }
                },
            }
        }

        transport.finish()?;
        info!(
            rows = report.rows,
            delivered = report.delivered,
            failed = report.failed,
            dry_run = self.dry_run,
            "Merge finished"
        );
        Ok(report)
    }

    fn check_fields(&self, header: &[String]) -> Result<()> {
        let unknown: Vec<String> = self
            .template
            .fields()
            .into_iter()
            .filter(|field| {
                !self.overrides.contains_key(field) && !header.iter().any(|h| h == field)
            })
            .map(str::to_string)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(Error::UnknownFields(unknown))
        }
    }

    fn merge_row(
        &self,
        row: usize,
        record: &mailmerge_tabular::Record,
        transport: &mut dyn Transport,
    ) -> Result<()> {
        let context = combine(record, &self.overrides);
        let message = self.template.render(&context)?;
        let recipients = message.envelope_recipients()?;

        if self.dry_run {
            message.to_bytes()?;
            debug!(row, recipients = recipients.len(), "Rendered message (dry run)");
            return Ok(());
        }

        transport.deliver(row, &message)?;
        debug!(row, recipients = recipients.len(), "Delivered message");
        Ok(())
    }
}
