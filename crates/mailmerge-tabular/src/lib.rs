//! # mailmerge-tabular
//!
//! Tabular input for mail merge: dialect detection and a streaming,
//! header-keyed record reader.
//!
//! ## Features
//!
//! - **Dialect detection**: comma or tab, decided by parsing the input both
//!   ways and comparing the outcomes
//! - **Bounded look-ahead**: only the first rows are parsed eagerly
//! - **Streaming**: remaining rows are parsed on demand, one per call
//! - **Strict quoting**: open quoted fields and stray quotes are errors
//!   rather than data
//! - **Typed errors**: empty input, field count mismatches, and other parse
//!   failures are distinct variants
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::fs::File;
//! use mailmerge_tabular::TabularReader;
//!
//! let mut reader = TabularReader::new(File::open("recipients.tsv")?)?;
//! println!("dialect: {}", reader.dialect());
//!
//! while let Some(record) = reader.read()? {
//!     println!("{}", record["email"]);
//! }
//! ```
//!
//! ### Probing Without Reading
//!
//! ```ignore
//! use std::io::Cursor;
//! use mailmerge_tabular::{probe, Dialect, DEFAULT_LOOKAHEAD};
//!
//! let mut source = Cursor::new("name\temail\nAnn\tann@example.com\n");
//! let probe = probe(&mut source, DEFAULT_LOOKAHEAD)?;
//! assert_eq!(probe.dialect(), Dialect::Tab);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod dialect;
mod error;
mod probe;
mod quote;
mod reader;
mod rows;

pub use dialect::Dialect;
pub use error::{Error, ErrorKind, Result};
pub use probe::{DEFAULT_LOOKAHEAD, Probe, probe};
pub use reader::{Record, TabularReader};
