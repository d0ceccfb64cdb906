pub mod decompose;
pub use decompose::*;

pub mod recompose;

pub mod standard;
pub use standard::*;

use rustc_hash::FxHashSet;
use serde::Deserialize;

use std::fmt;

use crate::errors::*;
use crate::fields::FieldKey;

/// One element of a template as written by a user, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawToken {
    Index(i64),
    Text(String),
}

impl From<i32> for RawToken {
    fn from(i: i32) -> Self {
        RawToken::Index(i as i64)
    }
}

impl From<usize> for RawToken {
    fn from(i: usize) -> Self {
        RawToken::Index(i as i64)
    }
}

impl From<&str> for RawToken {
    fn from(s: &str) -> Self {
        RawToken::Text(s.to_owned())
    }
}

impl From<String> for RawToken {
    fn from(s: String) -> Self {
        RawToken::Text(s)
    }
}

impl fmt::Display for RawToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RawToken::Index(i) => write!(f, "{}", i),
            RawToken::Text(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Separator(String),
    Field(FieldKey),
}

impl Token {
    /// Classify a raw token.
    ///
    /// Strings wrapped in a brace pair are named fields, other strings are separators and
    /// integers are positional fields.
    pub fn classify(raw: &RawToken) -> std::result::Result<Self, String> {
        match raw {
            RawToken::Index(i) => usize::try_from(*i)
                .map(|i| Token::Field(FieldKey::Index(i)))
                .map_err(|_| format!("positional field {} is negative", i)),
            RawToken::Text(s) if s.is_empty() => Err("a separator is empty".to_owned()),
            RawToken::Text(s) if s.len() >= 2 && s.starts_with('{') && s.ends_with('}') => {
                let name = &s[1..s.len() - 1];
                if name.is_empty() {
                    Err("a field name between braces is empty".to_owned())
                } else {
                    Ok(Token::Field(FieldKey::Name(name.to_owned())))
                }
            }
            RawToken::Text(s) => Ok(Token::Separator(s.clone())),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Separator(s) => write!(f, "{:?}", s),
            Token::Field(FieldKey::Index(i)) => write!(f, "{}", i),
            Token::Field(FieldKey::Name(n)) => write!(f, "{{{}}}", n),
        }
    }
}

/// Ordered sequence of separators and field references describing the layout of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    tokens: Vec<Token>,
}

impl Template {
    /// Build a template from raw tokens, classifying each token once.
    pub fn new<T: Into<RawToken>>(raw: impl IntoIterator<Item = T>) -> Result<Self> {
        let raw = raw.into_iter().map(Into::into).collect::<Vec<RawToken>>();

        let tokens = raw
            .iter()
            .map(|r| {
                Token::classify(r).map_err(|reason| Error::Template {
                    template: raw_list(&raw),
                    reason,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_tokens(tokens)
    }

    /// Build a template from already classified tokens.
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(Error::Template {
                template: "[]".to_owned(),
                reason: "a template needs at least one token".to_owned(),
            });
        }

        let mut seen = FxHashSet::default();

        for token in &tokens {
            match token {
                Token::Separator(s) if s.is_empty() => {
                    return Err(Error::Template {
                        template: token_list(&tokens),
                        reason: "a separator is empty".to_owned(),
                    });
                }
                Token::Field(key) if !seen.insert(key) => {
                    return Err(Error::DuplicateKey {
                        key: key.clone(),
                        template: token_list(&tokens),
                    });
                }
                _ => (),
            }
        }

        Ok(Self { tokens })
    }

    /// Parse a compact template string like `"{0}\t{1}|{name}"`.
    ///
    /// `{digits}` is a positional field, `{other}` is a named field and everything else is a
    /// separator. `\t`, `\n`, `\r` are escapes and a backslash makes any other character
    /// literal.
    pub fn parse_format(expr: &str) -> Result<Self> {
        let err = |reason: &str| Error::Template {
            template: format!("{:?}", expr),
            reason: reason.to_owned(),
        };

        let mut res = Vec::new();
        let mut curr = String::new();
        let mut escape = false;
        let mut in_field = false;

        for c in expr.chars() {
            if escape {
                curr.push(match c {
                    't' => '\t',
                    'n' => '\n',
                    'r' => '\r',
                    c => c,
                });
                escape = false;
                continue;
            }

            match c {
                '\\' => escape = true,
                '{' => {
                    if in_field {
                        return Err(err("unexpected '{' inside a field"));
                    }
                    if !curr.is_empty() {
                        res.push(Token::Separator(std::mem::take(&mut curr)));
                    }
                    in_field = true;
                }
                '}' => {
                    if !in_field {
                        return Err(err("unexpected '}' outside a field"));
                    }
                    if curr.is_empty() {
                        return Err(err("a field name between braces is empty"));
                    }
                    if curr.bytes().all(|b| b.is_ascii_digit()) {
                        let i = curr
                            .parse::<usize>()
                            .map_err(|_| err("positional field is too large"))?;
                        res.push(Token::Field(FieldKey::Index(i)));
                    } else {
                        res.push(Token::Field(FieldKey::Name(curr.clone())));
                    }
                    curr.clear();
                    in_field = false;
                }
                ' ' | '\t' | '\n' | '\r' if in_field => (),
                _ => curr.push(c),
            }
        }

        if in_field {
            return Err(err("unclosed '{'"));
        }
        if escape {
            return Err(err("dangling '\\' at the end"));
        }
        if !curr.is_empty() {
            res.push(Token::Separator(curr));
        }

        Template::from_tokens(res)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Field keys referenced by the template, in order.
    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Field(k) => Some(k),
            Token::Separator(_) => None,
        })
    }

    /// Header line describing the template: separators verbatim and fields by their bare key.
    pub fn header_line(&self) -> String {
        self.tokens
            .iter()
            .map(|t| match t {
                Token::Separator(s) => s.clone(),
                Token::Field(k) => k.label(),
            })
            .collect()
    }

    /// Column names of the fields, in order.
    pub fn column_names(&self) -> Vec<String> {
        self.keys().map(FieldKey::label).collect()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (i, t) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "]")
    }
}

fn raw_list(raw: &[RawToken]) -> String {
    let items = raw.iter().map(|r| r.to_string()).collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

fn token_list(tokens: &[Token]) -> String {
    let items = tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

/// Create a template from integers (positional fields), `"{name}"` strings (named fields)
/// and other strings (separators).
#[macro_export]
macro_rules! template {
    ($($t:expr),+ $(,)?) => {
        {
            $crate::template::Template::new(vec![$($crate::template::RawToken::from($t)),+])
                .unwrap_or_else(|e| {
                    panic!(
                        "Error constructing template:\n{e}\non line {} column {} in file {}",
                        line!(),
                        column!(),
                        file!()
                    )
                })
        }
    };
}
