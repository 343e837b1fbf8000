//! Extensions advertised in the EHLO reply.

/// One EHLO extension line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// STARTTLS
    StartTls,
    /// AUTH with the advertised mechanism names, upper-cased.
    Auth(Vec<String>),
    /// SIZE with the optional limit in bytes.
    Size(Option<usize>),
    /// Anything else, kept verbatim.
    Other(String),
}

impl Extension {
    /// Parses one extension line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let keyword = words.next().unwrap_or_default().to_ascii_uppercase();

        match keyword.as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(words.map(str::to_ascii_uppercase).collect()),
            "SIZE" => Self::Size(words.next().and_then(|size| size.parse().ok())),
            _ => Self::Other(line.to_string()),
        }
    }
}

/// What the server offered after EHLO.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Server name from the first EHLO line.
    pub hostname: String,
    /// Advertised extensions, in order.
    pub extensions: Vec<Extension>,
}

impl Capabilities {
    /// Builds capabilities from the EHLO reply lines.
    #[must_use]
    pub fn from_ehlo(lines: &[String]) -> Self {
        let hostname = lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or_default()
            .to_string();
        let extensions = lines.iter().skip(1).map(|line| Extension::parse(line)).collect();
        Self {
            hostname,
            extensions,
        }
    }

    /// Checks if STARTTLS is offered.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.extensions.contains(&Extension::StartTls)
    }

    /// Checks if AUTH is offered at all.
    #[must_use]
    pub fn supports_auth(&self) -> bool {
        self.extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Auth(_)))
    }

    /// Returns the advertised message size limit, if any.
    #[must_use]
    pub fn max_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }
}
