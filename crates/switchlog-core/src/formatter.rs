//! Message templates with named placeholders.
//!
//! Backends that only understand positional formatting still receive messages
//! written with named placeholders. Rendering happens in two passes:
//!
//! 1. Every distinct non-numeric `{name}` is rewritten to `{index}`, where `index`
//!    is the order in which the name was first seen. `{0}`-style placeholders and
//!    `{{escaped}}` spans are left alone.
//! 2. The rewritten template is rendered positionally against the arguments.
//!
//! The names collected in pass 1 are returned alongside the text so adapters
//! with structured-property support can attach `name = value` pairs.

use std::fmt::{Display, Write as _};
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{FormatError, FormatErrorKind};

/// Widest alignment a placeholder may request, in either direction.
pub const MAX_ALIGNMENT: u32 = 1_000_000;

static NAMED_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{@?([^\d{][^ }]*)\}").expect("placeholder pattern is valid")
});

/// Output of [`format_structured`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormattedMessage {
    /// Rendered message text.
    pub text: String,
    /// Distinct placeholder names in first-seen order.
    pub placeholders: Vec<String>,
}

impl FormattedMessage {
    /// Pair placeholder names with rendered argument values.
    ///
    /// Truncates to the shorter of the two sequences.
    pub fn properties(&self, args: &[&dyn Display]) -> Vec<(String, String)> {
        self.placeholders
            .iter()
            .zip(args)
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect()
    }
}

/// Render `template` against positional `args`.
///
/// With no arguments the template is returned untouched, braces included.
pub fn format_structured(
    template: &str,
    args: &[&dyn Display],
) -> Result<FormattedMessage, FormatError> {
    if args.is_empty() {
        return Ok(FormattedMessage {
            text: template.to_owned(),
            placeholders: Vec::new(),
        });
    }

    let (positional, placeholders) = rewrite_named(template);
    let text =
        render_positional(&positional, args).map_err(|kind| FormatError::new(template, kind))?;
    Ok(FormattedMessage { text, placeholders })
}

/// Rewrite named placeholders to positional ones.
fn rewrite_named(template: &str) -> (String, Vec<String>) {
    let mut rewritten = String::with_capacity(template.len());
    let mut names: Vec<String> = Vec::new();
    let mut copied_up_to = 0;

    let mut search_from = 0;

    while let Some(caps) = NAMED_PLACEHOLDER.captures_at(template, search_from) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        // A span opened right after `{` is escaped; a placeholder may still start inside it.
        if whole.start() > 0 && template.as_bytes()[whole.start() - 1] == b'{' {
            search_from = whole.start() + 1;
            continue;
        }
        search_from = whole.end();

        let (name, suffix) = split_suffix(body.as_str());
        if name.trim().parse::<i64>().is_ok() {
            continue;
        }

        let index = names.iter().position(|n| n == name).unwrap_or_else(|| {
            names.push(name.to_owned());
            names.len() - 1
        });

        rewritten.push_str(&template[copied_up_to..whole.start()]);
        let _ = write!(rewritten, "{{{index}{suffix}}}");
        copied_up_to = whole.end();
    }

    rewritten.push_str(&template[copied_up_to..]);
    (rewritten, names)
}

/// Split `name,alignment:format` into the name and the kept suffix.
fn split_suffix(body: &str) -> (&str, &str) {
    match body.find([',', ':']) {
        Some(at) if at > 0 => body.split_at(at),
        _ => (body, ""),
    }
}

/// Positional rendering: `{{`/`}}` escapes and `{index[,alignment][:format]}`.
fn render_positional(template: &str, args: &[&dyn Display]) -> Result<String, FormatErrorKind> {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                out.push_str(&template[literal_start..=i]);
                i += 2;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                out.push_str(&template[literal_start..=i]);
                i += 2;
                literal_start = i;
            }
            b'{' => {
                out.push_str(&template[literal_start..i]);
                let close = template[i + 1..]
                    .find('}')
                    .map(|offset| i + 1 + offset)
                    .ok_or(FormatErrorKind::UnclosedPlaceholder { position: i })?;
                let body = &template[i + 1..close];
                render_argument(&mut out, body, args)?;
                i = close + 1;
                literal_start = i;
            }
            b'}' => return Err(FormatErrorKind::UnexpectedClosingBrace { position: i }),
            _ => i += 1,
        }
    }

    out.push_str(&template[literal_start..]);
    Ok(out)
}

fn render_argument(
    out: &mut String,
    body: &str,
    args: &[&dyn Display],
) -> Result<(), FormatErrorKind> {
    let invalid = || FormatErrorKind::InvalidPlaceholder {
        placeholder: body.to_owned(),
    };

    // The format component is accepted for compatibility; values render via Display.
    let head = body.split_once(':').map_or(body, |(head, _format)| head);
    let (index, alignment) = match head.split_once(',') {
        Some((index, alignment)) => (index, Some(alignment)),
        None => (head, None),
    };

    let index: usize = index.trim_end().parse().map_err(|_| invalid())?;
    let alignment: i32 = match alignment {
        Some(a) => a.trim().parse().map_err(|_| invalid())?,
        None => 0,
    };
    if alignment.unsigned_abs() > MAX_ALIGNMENT {
        return Err(FormatErrorKind::AlignmentOutOfRange { alignment });
    }
    let value = args.get(index).ok_or(FormatErrorKind::MissingArgument {
        index,
        supplied: args.len(),
    })?;

    // Padded by hand: `fmt` widths are capped well below MAX_ALIGNMENT.
    let text = value.to_string();
    let padding = (alignment.unsigned_abs() as usize).saturating_sub(text.chars().count());
    if alignment < 0 {
        out.push_str(&text);
        out.extend(std::iter::repeat_n(' ', padding));
    } else {
        out.extend(std::iter::repeat_n(' ', padding));
        out.push_str(&text);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
