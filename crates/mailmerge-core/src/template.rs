//! Message templates.
//!
//! A template file holds a header section and a body section separated by
//! the first blank line. Both sections may reference values with
//! `{{.name}}` (or `{{ name }}`); every reference must resolve when a row
//! is rendered.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use mailmerge_mime::{Headers, Message};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// Compiled text with field placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Compiles `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] for an unterminated `{{` or a placeholder
    /// that is not a single field name.
    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = text;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let line = line_of(text, text.len() - rest.len() + open);

            let Some(close) = after.find("}}") else {
                return Err(Error::Template {
                    line,
                    message: "unterminated {{".to_string(),
                });
            };

            let inner = after[..close].trim();
            let name = inner.strip_prefix('.').unwrap_or(inner);
            if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == '{' || c == '}') {
                return Err(Error::Template {
                    line,
                    message: format!("invalid placeholder {{{{{}}}}}", &after[..close]),
                });
            }
            segments.push(Segment::Field(name.to_string()));
            rest = &after[close + 2..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Returns the distinct field names referenced, sorted.
    #[must_use]
    pub fn fields(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Field(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitutes every placeholder from `context`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingValue`] for the first name with no value.
    pub fn render(&self, context: &HashMap<String, String>) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = context
                        .get(name)
                        .ok_or_else(|| Error::MissingValue(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Header and body templates for one outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    headers: Template,
    body: Template,
}

impl MessageTemplate {
    /// Reads and compiles a template file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not compile.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Compiles template text.
    ///
    /// Lines before the first whitespace-only line form the header section;
    /// the separator line itself is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if either section does not compile.
    pub fn parse(text: &str) -> Result<Self> {
        let mut header_lines = Vec::new();
        let mut body_lines = Vec::new();
        let mut in_body = false;

        for line in text.lines() {
            if in_body {
                body_lines.push(line);
            } else if line.trim().is_empty() {
                in_body = true;
            } else {
                header_lines.push(line);
            }
        }

        let header_count = header_lines.len() + 1;
        let body = Template::parse(&body_lines.join("\n")).map_err(|err| match err {
            Error::Template { line, message } => Error::Template {
                line: line + header_count,
                message,
            },
            other => other,
        })?;

        Ok(Self {
            headers: Template::parse(&header_lines.join("\n"))?,
            body,
        })
    }

    /// Returns the distinct field names referenced by either section.
    #[must_use]
    pub fn fields(&self) -> BTreeSet<&str> {
        let mut fields = self.headers.fields();
        fields.extend(self.body.fields());
        fields
    }

    /// Renders one message.
    ///
    /// # Errors
    ///
    /// Returns an error if a field has no value or the rendered header
    /// section is not valid header text.
    pub fn render(&self, context: &HashMap<String, String>) -> Result<Message> {
        let headers = Headers::parse(&self.headers.render(context)?)?;
        let body = self.body.render(context)?;
        Ok(Message::new(headers, body))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_template_render() {
        let template = Template::parse("Dear {{.name}}, see you in {{ city }}.").unwrap();
        let out = template
            .render(&context(&[("name", "Ann"), ("city", "Oslo")]))
            .unwrap();
        assert_eq!(out, "Dear Ann, see you in Oslo.");
    }

    #[test]
    fn test_template_fields() {
        let template = Template::parse("{{.b}} {{.a}} {{.b}}").unwrap();
        assert_eq!(template.fields().into_iter().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_template_missing_value() {
        let template = Template::parse("Hi {{.name}}").unwrap();
        let err = template.render(&HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::MissingValue(ref name) if name == "name"));
    }

    #[test]
    fn test_template_unterminated() {
        let err = Template::parse("line one\nHi {{.name").unwrap_err();
        assert!(matches!(err, Error::Template { line: 2, .. }));
    }

    #[test]
    fn test_template_invalid_placeholder() {
        assert!(Template::parse("{{}}").is_err());
        assert!(Template::parse("{{ if .x }}").is_err());
    }

    #[test]
    fn test_template_no_placeholders() {
        let template = Template::parse("plain text").unwrap();
        assert!(template.fields().is_empty());
        assert_eq!(template.render(&HashMap::new()).unwrap(), "plain text");
    }

    #[test]
    fn test_message_template_split() {
        let template = MessageTemplate::parse(
            "From: {{.sender}}\nTo: {{.email}}\nSubject: Hello\n   \nHi {{.name}},\n\nbye\n",
        )
        .unwrap();

        let message = template
            .render(&context(&[
                ("sender", "me@example.com"),
                ("email", "ann@example.com"),
                ("name", "Ann"),
            ]))
            .unwrap();

        assert_eq!(message.headers.get("To"), Some("ann@example.com"));
        assert_eq!(message.subject(), Some("Hello"));
        assert_eq!(message.body, "Hi Ann,\n\nbye");
    }

    #[test]
    fn test_message_template_fields() {
        let template = MessageTemplate::parse("To: {{.email}}\n\n{{.name}}").unwrap();
        assert_eq!(
            template.fields().into_iter().collect::<Vec<_>>(),
            ["email", "name"]
        );
    }

    #[test]
    fn test_message_template_body_error_line() {
        let err = MessageTemplate::parse("To: x@example.com\n\nok\n{{.broken").unwrap_err();
        assert!(matches!(err, Error::Template { line: 4, .. }));
    }

    #[test]
    fn test_render_rejects_bad_header_value() {
        let template = MessageTemplate::parse("{{.header}}\n\nbody").unwrap();
        let err = template
            .render(&context(&[("header", "no colon here")]))
            .unwrap_err();
        assert!(matches!(err, Error::Mime(_)));
    }
}
