//! `.eml` uploads: sender, recipient, subject and a readable body.
//!
//! MIME structure, transfer encodings and charsets are handled by
//! `mail-parser`. HTML-only bodies are flattened to plain text here.

use std::sync::LazyLock;

use mail_parser::{Address, MessageParser, PartType};
use regex::Regex;

use super::IngestionError;

static HTML_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("static style pattern"));
static HTML_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("static script pattern"));
static HTML_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</p>|</div>|</li>|</tr>").expect("static break pattern")
});
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static tag pattern"));
static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\f\v]+").expect("static whitespace pattern"));

/// The parts of an e-mail worth showing to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ParsedEmail {
    /// `From:`, `To:`, `Subject:` lines and the body, blank-line separated, empties skipped.
    pub fn to_document_text(&self) -> String {
        let from = (!self.from.is_empty()).then(|| format!("From: {}", self.from));
        let to = (!self.to.is_empty()).then(|| format!("To: {}", self.to));
        let subject = (!self.subject.is_empty()).then(|| format!("Subject: {}", self.subject));
        let body = (!self.body.is_empty()).then(|| self.body.clone());

        [from, to, subject, body]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub fn parse_email(bytes: &[u8]) -> Result<ParsedEmail, IngestionError> {
    let message = MessageParser::default()
        .parse(bytes)
        .ok_or_else(|| IngestionError::Extraction("not a readable e-mail".into()))?;

    let from = message.from().map(format_address).unwrap_or_default();
    let to = message.to().map(format_address).unwrap_or_default();
    let subject = message.subject().map(str::trim).unwrap_or_default().to_string();
    if from.is_empty() && to.is_empty() && subject.is_empty() {
        return Err(IngestionError::Extraction("no e-mail headers found".into()));
    }

    // First text part wins; an empty plain part falls back to the HTML alternative.
    let body = match message.text_part(0).map(|part| &part.body) {
        Some(PartType::Text(text)) => normalize_newlines(text),
        Some(PartType::Html(markup)) => html_to_text(markup),
        _ => String::new(),
    };
    let body = if body.is_empty() {
        message
            .body_html(0)
            .map(|markup| html_to_text(&markup))
            .unwrap_or_default()
    } else {
        body
    };

    tracing::debug!(body_len = body.len(), "E-mail parsed");

    Ok(ParsedEmail {
        from,
        to,
        subject,
        body,
    })
}

/// `Name <address>` per mailbox, comma separated. Groups are flattened.
fn format_address(address: &Address<'_>) -> String {
    let mailboxes: Vec<_> = match address {
        Address::List(list) => list.iter().collect(),
        Address::Group(groups) => groups.iter().flat_map(|g| g.addresses.iter()).collect(),
    };
    mailboxes
        .into_iter()
        .filter_map(|mailbox| {
            let name = mailbox.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
            let addr = mailbox.address.as_deref().map(str::trim).filter(|a| !a.is_empty());
            match (name, addr) {
                (Some(name), Some(addr)) => Some(format!("{name} <{addr}>")),
                (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
                (None, None) => None,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

/// Flatten HTML into readable lines: drop style/script, break on block ends, strip tags.
pub fn html_to_text(html: &str) -> String {
    let text = HTML_STYLE.replace_all(html, "");
    let text = HTML_SCRIPT.replace_all(&text, "");
    let text = HTML_BREAK.replace_all(&text, "\n");
    let text = HTML_TAG.replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    text.lines()
        .map(|line| INLINE_SPACE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
