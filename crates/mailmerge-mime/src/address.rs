//! Email address types.

use crate::error::{Error, Result};
use std::fmt;

/// Bare email address (`local@domain`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates an email address (basic validation).
    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
            return Err(Error::InvalidAddress(format!(
                "Address contains invalid characters: {addr}"
            )));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("Address must contain @: {addr}")));
        };

        if domain.contains('@') {
            return Err(Error::InvalidAddress(format!(
                "Address must have exactly one @: {addr}"
            )));
        }

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "Local and domain parts cannot be empty: {addr}"
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: Address,
}

impl Mailbox {
    /// Creates a new mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: None,
            address: Address::new(address)?,
        })
    }

    /// Creates a new mailbox with a display name and address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: Some(name.into()),
            address: Address::new(address)?,
        })
    }

    /// Parses `user@example.com` or `Display Name <user@example.com>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address part is invalid or the angle
    /// brackets are unbalanced.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();

        let Some(open) = text.rfind('<') else {
            return Self::new(text);
        };
        let Some(inner) = text[open + 1..].strip_suffix('>') else {
            return Err(Error::InvalidAddress(format!("Unbalanced angle brackets: {text}")));
        };

        let name = text[..open].trim().trim_matches('"').trim();
        if name.is_empty() {
            Self::new(inner.trim())
        } else {
            Self::with_name(name, inner.trim())
        }
    }

    /// Parses a comma separated list of mailboxes.
    ///
    /// Commas inside double quotes or angle brackets do not split. Empty
    /// entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is invalid.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        let mut mailboxes = Vec::new();
        let mut in_quotes = false;
        let mut in_angle = false;
        let mut start = 0;

        for (idx, ch) in text.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                '<' if !in_quotes => in_angle = true,
                '>' if !in_quotes => in_angle = false,
                ',' if !in_quotes && !in_angle => {
                    push_entry(&text[start..idx], &mut mailboxes)?;
                    start = idx + 1;
                }
                _ => {}
            }
        }
        push_entry(&text[start..], &mut mailboxes)?;

        Ok(mailboxes)
    }
}

fn push_entry(entry: &str, mailboxes: &mut Vec<Mailbox>) -> Result<()> {
    if !entry.trim().is_empty() {
        mailboxes.push(Mailbox::parse(entry)?);
    }
    Ok(())
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if name.contains([',', '"', '<', '>', '@', ';', ':']) => {
                write!(f, "\"{}\" <{}>", name.replace('"', "\\\""), self.address)
            }
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}
