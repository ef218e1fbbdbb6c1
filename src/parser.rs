//! Event payload decoding
//!
//! A payload carries one notification between the last start marker and the
//! last terminal marker:
//!
//! ```text
//! ...telalert|f1|f2|f3|f4|f5|f6|f7|INCIDENT||AA||IM1001||C:\out\ACME\20240102030405.temp||
//! body line 1
//! body line 2
//! $end
//! ```
//!
//! The character right after the start marker is the separator for that
//! message. Eight separators are skipped to reach the header line, whose
//! `||`-delimited tokens are ticket source, attachment flag, ticket number and
//! destination path. Everything after the header line is the body.

use crate::types::{MalformedReason, ParsedNotification, Rejection};

/// Token closing the message; the last occurrence wins
pub const TERMINAL_MARKER: &str = "$end";

/// Token opening the message; the last occurrence before the terminal marker wins
pub const START_MARKER: &str = "telalert";

/// Delimiter between header tokens
pub const HEADER_DELIMITER: &str = "||";

/// Attachment flag value meaning attachments are available
pub const ATTACHMENTS_FLAG: &str = "AA";

/// Ticket source content the upstream system emits when arguments were missing
pub const INCOMPLETE_SENTINEL: &str = "Thismessagedidnotprovideenougharguments";

/// Separators between the start marker and the header line
const HEADER_SEPARATOR_COUNT: usize = 8;

/// Decodes event payloads and classifies them for one customer tool
#[derive(Clone, Debug)]
pub struct MessageParser {
    customer_tool: String,
}

impl MessageParser {
    /// Create a parser accepting notifications whose destination contains `customer_tool`
    pub fn new(customer_tool: impl Into<String>) -> Self {
        Self {
            customer_tool: customer_tool.into(),
        }
    }

    /// Decode and classify a payload.
    ///
    /// Returns the notification only when it is well formed, addressed to this
    /// customer tool and complete.
    pub fn parse(&self, payload: &str) -> Result<ParsedNotification, Rejection> {
        let notification = decode(payload).map_err(Rejection::Malformed)?;

        if !notification
            .destination_path
            .contains(self.customer_tool.as_str())
        {
            return Err(Rejection::Ignored);
        }
        if notification.ticket_source.contains(INCOMPLETE_SENTINEL) {
            return Err(Rejection::Incomplete);
        }

        Ok(notification)
    }
}

/// Decode a payload into a notification without classifying it
pub fn decode(payload: &str) -> Result<ParsedNotification, MalformedReason> {
    let end = payload
        .rfind(TERMINAL_MARKER)
        .ok_or(MalformedReason::MissingTerminalMarker)?;
    let message = &payload[..end];

    let start = message
        .rfind(START_MARKER)
        .ok_or(MalformedReason::MissingStartMarker)?;
    let after_marker = &message[start + START_MARKER.len()..];

    let separator = after_marker
        .chars()
        .next()
        .ok_or(MalformedReason::MissingSeparator)?;
    let rest = skip_separators(after_marker, separator, HEADER_SEPARATOR_COUNT)
        .ok_or(MalformedReason::TooFewSeparators)?;

    let (header, body) = split_first_line(rest);
    let fields = parse_header(header)?;

    Ok(ParsedNotification {
        ticket_source: fields.ticket_source,
        ticket_number: fields.ticket_number,
        with_attachments: fields.with_attachments,
        file_name: file_name_of(&fields.destination_path).to_string(),
        destination_path: fields.destination_path,
        body: normalize_line_endings(body),
    })
}

struct HeaderFields {
    ticket_source: String,
    with_attachments: bool,
    ticket_number: String,
    destination_path: String,
}

/// Split the header line into its four positional tokens. Extra tokens are ignored.
fn parse_header(header: &str) -> Result<HeaderFields, MalformedReason> {
    let mut tokens = header.split(HEADER_DELIMITER);
    let (Some(source), Some(flag), Some(number), Some(path)) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(MalformedReason::TooFewHeaderTokens);
    };

    Ok(HeaderFields {
        ticket_source: strip_non_word(source),
        with_attachments: flag == ATTACHMENTS_FLAG,
        ticket_number: number.to_string(),
        destination_path: path.to_string(),
    })
}

/// Return the text after the `count`-th occurrence of `separator`
fn skip_separators(text: &str, separator: char, count: usize) -> Option<&str> {
    let mut rest = text;
    for _ in 0..count {
        let pos = rest.find(separator)?;
        rest = &rest[pos + separator.len_utf8()..];
    }
    Some(rest)
}

/// Split off the first line. The line break is consumed; a lone `\r`, `\n`
/// or a `\r\n` pair all end the line.
fn split_first_line(text: &str) -> (&str, &str) {
    match text.find(['\r', '\n']) {
        Some(pos) => {
            let line = &text[..pos];
            let after = &text[pos..];
            let rest = after
                .strip_prefix("\r\n")
                .or_else(|| after.strip_prefix('\r'))
                .or_else(|| after.strip_prefix('\n'))
                .unwrap_or(after);
            (line, rest)
        }
        None => (text, ""),
    }
}

/// Rewrite every line break (`\r\n`, `\r`, `\n`) as `\r\n`
fn normalize_line_endings(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 32);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\r\n");
            }
            '\n' => out.push_str("\r\n"),
            other => out.push(other),
        }
    }
    out
}

/// Keep only word characters (`[A-Za-z0-9_]`)
fn strip_non_word(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Final segment of a Windows or Unix style path
pub fn file_name_of(path: &str) -> &str {
    match path.rfind(['\\', '/']) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}
