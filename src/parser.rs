use thiserror::Error;

use crate::config::{Framework, WorkflowDraft};
use crate::validate::{self, ValidationReport};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in completion")]
    NoJsonFound,
    #[error("malformed JSON in completion: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationReport),
}

/// Extract the first JSON object from the completion, decode it (repairing
/// common malformations once if the strict decode fails), and validate it
/// against the configuration model for the given framework.
pub fn parse(completion: &str, framework: Framework) -> Result<WorkflowDraft, ParseError> {
    let candidate = extract_json_object(completion).ok_or(ParseError::NoJsonFound)?;

    let draft = match serde_json::from_str::<WorkflowDraft>(&candidate.text) {
        Ok(draft) => draft,
        Err(strict_err) => {
            tracing::debug!("strict decode failed ({strict_err}); retrying after repair");
            serde_json::from_str::<WorkflowDraft>(&repair(&candidate))?
        }
    };

    validate::validate(&draft, framework)?;
    Ok(draft)
}

struct Candidate {
    text: String,
    unclosed_braces: usize,
    in_string: bool,
}

// The first balanced JSON object in the text, string-aware so braces inside
// literals do not count. A truncated object is returned with the number of
// braces left open for the repair pass to complete.
fn extract_json_object(text: &str) -> Option<Candidate> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + i + ch.len_utf8();
                    return Some(Candidate {
                        text: text[start..end].to_owned(),
                        unclosed_braces: 0,
                        in_string: false,
                    });
                }
            }
            _ => {}
        }
    }

    Some(Candidate {
        text: text[start..].trim_end().to_owned(),
        unclosed_braces: depth,
        in_string,
    })
}

// Bounded best-effort fixups for the malformations providers actually emit.
// Anything these cannot fix surfaces as MalformedJson rather than guessing.
fn repair(candidate: &Candidate) -> String {
    let mut text = candidate.text.clone();

    // Models that quote with ' generally do so everywhere; swapping is only
    // safe when the candidate contains no double quote at all.
    if !text.contains('"') {
        text = text.replace('\'', "\"");
    }

    if candidate.in_string {
        text.push('"');
    }
    for _ in 0..candidate.unclosed_braces {
        text.push('}');
    }

    strip_trailing_commas(&text)
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }
        if ch == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == '}' || chars[j] == ']') {
                continue;
            }
        }
        if ch == '"' {
            in_string = true;
        }
        out.push(ch);
    }
    out
}
