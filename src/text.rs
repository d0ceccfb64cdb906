use regex::Regex;

use crate::errors::*;

/// Splits strings on any of several separators.
#[derive(Debug, Clone)]
pub enum SuperSplitter {
    Whitespace,
    Single(String),
    Any(Regex),
}

impl SuperSplitter {
    /// No separator splits on runs of whitespace, one separator splits on it and several
    /// separators split on whichever occurs.
    pub fn new<S: AsRef<str>>(separators: &[S]) -> Result<Self> {
        match separators {
            [] => Ok(SuperSplitter::Whitespace),
            [sep] if !sep.as_ref().is_empty() => Ok(SuperSplitter::Single(sep.as_ref().to_owned())),
            seps => {
                if seps.iter().any(|s| s.as_ref().is_empty()) {
                    return Err(Error::Parse {
                        string: String::new(),
                        reason: "separators cannot be empty",
                    });
                }

                let pattern = seps
                    .iter()
                    .map(|s| regex::escape(s.as_ref()))
                    .collect::<Vec<_>>()
                    .join("|");
                let regex = Regex::new(&pattern).map_err(|e| Error::InvalidRegex {
                    pattern,
                    context: "combining separators",
                    source: e,
                })?;
                Ok(SuperSplitter::Any(regex))
            }
        }
    }

    pub fn split<'s>(&self, s: &'s str) -> Vec<&'s str> {
        match self {
            SuperSplitter::Whitespace => s.split_whitespace().collect(),
            SuperSplitter::Single(sep) => s.split(sep.as_str()).collect(),
            SuperSplitter::Any(regex) => regex.split(s).collect(),
        }
    }
}

/// Split a string on any of the separators. See [`SuperSplitter::new`].
pub fn supersplit<'a, S: AsRef<str>>(s: &'a str, separators: &[S]) -> Result<Vec<&'a str>> {
    Ok(SuperSplitter::new(separators)?.split(s))
}

/// Join the whitespace-separated words of `s` with `replace`, dropping blanks at both ends.
pub fn rm_blank(s: &str, replace: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(replace)
}

/// Cut a line to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_owned(),
    }
}
