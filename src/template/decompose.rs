use memchr::memmem;

use crate::errors::*;
use crate::fields::{FieldKey, FieldMap};
use crate::template::{Template, Token};

/// A field followed by the separator that ends it, or by the end of the line.
#[derive(Debug, Clone)]
struct Step {
    key: FieldKey,
    sep: Option<memmem::Finder<'static>>,
}

/// Template compiled for splitting lines into fields.
#[derive(Debug, Clone)]
pub struct Decomposer {
    template: Template,
    leading: Option<memmem::Finder<'static>>,
    steps: Vec<Step>,
}

impl Decomposer {
    const NAME: &'static str = "decomposing lines";

    /// Compile a template for decomposition.
    ///
    /// A separator at the start of the template is consumed before the first field. After that,
    /// fields and separators must alternate: two adjacent fields or two adjacent separators make
    /// the assignment of text to fields ambiguous and are rejected here instead of on every line.
    pub fn new(template: Template) -> Result<Self> {
        let err = |reason: String| Error::Template {
            template: template.to_string(),
            reason: format!("{} when {}", reason, Self::NAME),
        };

        let mut tokens = template.tokens().iter().peekable();
        let leading = match tokens.peek() {
            Some(Token::Separator(s)) => {
                let finder = memmem::Finder::new(s.as_bytes()).into_owned();
                tokens.next();
                Some(finder)
            }
            _ => None,
        };

        let mut pending: Option<&FieldKey> = None;
        let mut steps = Vec::new();

        for token in tokens {
            match token {
                Token::Field(key) => {
                    if let Some(prev) = pending {
                        return Err(err(format!(
                            "the {} directly follows the {} with no separator between them",
                            key, prev
                        )));
                    }
                    pending = Some(key);
                }
                Token::Separator(sep) => {
                    let Some(key) = pending.take() else {
                        return Err(err(format!("the separator {:?} has no field before it", sep)));
                    };
                    steps.push(Step {
                        key: key.clone(),
                        sep: Some(memmem::Finder::new(sep.as_bytes()).into_owned()),
                    });
                }
            }
        }

        if let Some(key) = pending {
            steps.push(Step {
                key: key.clone(),
                sep: None,
            });
        }

        if steps.is_empty() {
            return Err(err("the template has no fields".to_owned()));
        }

        Ok(Self {
            template,
            leading,
            steps,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Split a line into its fields.
    ///
    /// One trailing line terminator is ignored. Each separator splits the remaining text at its
    /// first occurrence; a separator that does not occur binds all the remaining text to its
    /// field. A blank line yields an empty field map.
    pub fn decompose(&self, line: &str) -> FieldMap {
        let line = strip_terminator(line);

        if line.trim().is_empty() {
            return FieldMap::new();
        }

        let mut rest = line;
        if let Some(leading) = &self.leading {
            rest = partition(leading, rest).1;
        }

        let mut fields = FieldMap::with_capacity(self.steps.len());

        for step in &self.steps {
            match &step.sep {
                Some(sep) => {
                    let (val, after) = partition(sep, rest);
                    fields.push(step.key.clone(), val);
                    rest = after;
                }
                None => {
                    fields.push(step.key.clone(), rest);
                    rest = "";
                }
            }
        }

        fields
    }
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Split at the first occurrence of the separator, dropping it. Without a match, everything
/// is before the separator.
fn partition<'a>(sep: &memmem::Finder, s: &'a str) -> (&'a str, &'a str) {
    match sep.find(s.as_bytes()) {
        // a match of a valid UTF-8 needle always lands on char boundaries
        Some(i) => (&s[..i], &s[i + sep.needle().len()..]),
        None => (s, ""),
    }
}
