//! Command template expansion
//!
//! Turns the configured template into the argument vector handed to the
//! process runner. `{input}` is the only substitution token.

use std::path::Path;

use crate::config::ExecMode;
use crate::error::{Result, SidecarError};

pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Build the argv for `template` with `{input}` replaced by `input`.
///
/// In `Argv` mode the template is split into words first and the path is
/// substituted inside each word, so it always stays a single argument and is
/// never interpreted by a shell.
pub fn build_argv(template: &str, input: &Path, mode: ExecMode, shell: &str) -> Result<Vec<String>> {
    let input = input.to_string_lossy();
    match mode {
        ExecMode::Shell => Ok(vec![
            shell.to_string(),
            "-c".to_string(),
            template.replace(INPUT_PLACEHOLDER, &input),
        ]),
        ExecMode::Argv => {
            let words = split_words(template)?;
            if words.is_empty() {
                return Err(SidecarError::InvalidTemplate {
                    reason: "template is blank".to_string(),
                });
            }
            Ok(words
                .into_iter()
                .map(|w| w.replace(INPUT_PLACEHOLDER, &input))
                .collect())
        }
    }
}

/// Split a command line into words with POSIX-like quoting.
///
/// Single quotes are literal, double quotes honour `\"`, `\\` and `\$`, a
/// backslash outside quotes escapes the next character.
pub fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(unbalanced('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\' | '$' | '`')) => current.push(ch),
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err(unbalanced('"')),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(unbalanced('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(ch) => current.push(ch),
                    None => {
                        return Err(SidecarError::InvalidTemplate {
                            reason: "trailing backslash".to_string(),
                        })
                    }
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn unbalanced(quote: char) -> SidecarError {
    SidecarError::InvalidTemplate {
        reason: format!("unbalanced {quote} quote"),
    }
}
