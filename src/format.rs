//! Text transforms applied to the message before protocol encoding.
//!
//! Each stage is a pure `&str -> String` function. [`pipeline`] fixes the
//! order; every stage runs exactly once per message.

use std::io::Read;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::MessageFormat;
use crate::error::Result;

/// Markup that replaces each line feed in HTML messages.
pub const LINE_BREAK: &str = "<br />";

/// Attribute openings whose URL values must not be linkified again.
const ATTRIBUTE_PREFIXES: [&str; 4] = ["href=\"", "href='", " src=\"", " src='"];

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?|ftp|mailto)://[^ \n]*").expect("URL pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NewlinesToBreaks,
    Linkify,
}

impl Stage {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Stage::NewlinesToBreaks => newlines_to_breaks(text),
            Stage::Linkify => linkify(text),
        }
    }
}

/// Stages for a message format, in application order.
pub fn pipeline(format: MessageFormat) -> Vec<Stage> {
    match format {
        MessageFormat::Html => vec![Stage::NewlinesToBreaks, Stage::Linkify],
        MessageFormat::Text => vec![Stage::Linkify],
    }
}

/// Run the full pipeline for `format` over `text`.
pub fn transform(text: &str, format: MessageFormat) -> String {
    pipeline(format)
        .iter()
        .fold(text.to_string(), |acc, stage| stage.apply(&acc))
}

pub fn newlines_to_breaks(text: &str) -> String {
    text.replace('\n', LINE_BREAK)
}

/// Wrap bare URLs in anchors, leaving URLs that already sit inside an
/// `href`/`src` attribute untouched.
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some(m) = URL_RE.find_at(text, pos) {
        let before = &text[..m.start()];
        if ATTRIBUTE_PREFIXES.iter().any(|p| before.ends_with(p)) {
            // Schemes are ASCII, so one byte ahead is still a char boundary.
            pos = m.start() + 1;
            continue;
        }

        out.push_str(&text[copied..m.start()]);
        out.push_str("<a href=\"");
        out.push_str(m.as_str());
        out.push_str("\">");
        out.push_str(m.as_str());
        out.push_str("</a>");
        copied = m.end();
        pos = m.end();
    }

    out.push_str(&text[copied..]);
    out
}

/// Explicit input when given, otherwise everything `reader` yields.
/// Bytes that are not valid UTF-8 become U+FFFD instead of failing the read.
pub fn read_input<R: Read>(explicit: Option<&str>, mut reader: R) -> Result<String> {
    match explicit {
        Some(text) => Ok(text.to_string()),
        None => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            match String::from_utf8(buf) {
                Ok(text) => Ok(text),
                Err(err) => {
                    debug!("Input is not valid UTF-8, replacing invalid bytes");
                    Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
                }
            }
        }
    }
}
