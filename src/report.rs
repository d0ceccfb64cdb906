//! Rendering of key/value collections as markdown tables and indented text reports.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    pub key_label: String,
    pub value_label: String,
    /// One row of keys and one row of values instead of one row per pair.
    pub transpose: bool,
    pub sort_by_key: bool,
    pub sort_by_value: bool,
    pub max_items: Option<usize>,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            key_label: String::new(),
            value_label: String::new(),
            transpose: false,
            sort_by_key: false,
            sort_by_value: true,
            max_items: None,
        }
    }
}

/// Render key/value pairs as a markdown table.
///
/// Sorting by key and by value are both descending; when both are requested the value sort
/// runs last. Past `max_items` pairs the table ends with a `...` entry.
pub fn markdown_table<K, V>(
    items: impl IntoIterator<Item = (K, V)>,
    options: &MarkdownOptions,
) -> String
where
    K: fmt::Display + PartialOrd,
    V: fmt::Display + PartialOrd,
{
    let mut items = items.into_iter().collect::<Vec<_>>();

    if options.sort_by_key {
        items.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        items.reverse();
    }
    if options.sort_by_value {
        items.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        items.reverse();
    }

    let mut rows = items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<Vec<_>>();
    if let Some(max) = options.max_items {
        if rows.len() > max {
            rows.truncate(max);
            rows.push(("...".to_owned(), "...".to_owned()));
        }
    }

    let mut res = String::new();

    if options.transpose {
        res.push_str(&format!("|{}|", options.key_label));
        for (k, _) in &rows {
            res.push_str(&format!("{}|", k));
        }
        res.push_str("\n|:---|");
        for _ in &rows {
            res.push_str(":---|");
        }
        res.push_str(&format!("\n|{}|", options.value_label));
        for (_, v) in &rows {
            res.push_str(&format!("{}|", v));
        }
        res.push('\n');
    } else {
        res.push_str(&format!(
            "|{}|{}|\n|:---|:---|\n",
            options.key_label, options.value_label
        ));
        for (k, v) in &rows {
            res.push_str(&format!("|{}|{}|\n", k, v));
        }
    }

    res
}

/// Leaf value of a text report.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Tree of named entries rendered by [`text_report`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportNode {
    Leaf(Value),
    Branch(Vec<(String, ReportNode)>),
}

impl ReportNode {
    pub fn branch<K: Into<String>>(children: impl IntoIterator<Item = (K, ReportNode)>) -> Self {
        ReportNode::Branch(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn leaf(value: impl Into<Value>) -> Self {
        ReportNode::Leaf(value.into())
    }

    fn number(&self) -> Option<f64> {
        match self {
            ReportNode::Leaf(v) => v.as_f64(),
            ReportNode::Branch(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub tab: String,
    pub sep: String,
    pub sort: bool,
    pub max_items: Option<usize>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            tab: "\t".to_owned(),
            sep: ":".to_owned(),
            sort: true,
            max_items: None,
        }
    }
}

/// Render the children of `root` as an indented report, one entry per line.
///
/// With sorting on, a level whose values are all numbers is sorted by value (descending) and
/// capped at `max_items`, any other level is sorted by name.
pub fn text_report(root: &ReportNode, options: &ReportOptions) -> String {
    let mut res = String::new();
    match root {
        ReportNode::Branch(children) => report_rec(children, options, 0, &mut res),
        ReportNode::Leaf(v) => {
            res.push_str(&v.to_string());
            res.push('\n');
        }
    }
    res
}

fn report_rec(
    children: &[(String, ReportNode)],
    options: &ReportOptions,
    depth: usize,
    res: &mut String,
) {
    let mut entries = children.iter().collect::<Vec<_>>();
    let mut truncated = false;

    if options.sort {
        if entries.iter().all(|(_, n)| n.number().is_some()) {
            entries.sort_by(|a, b| {
                a.1.number()
                    .partial_cmp(&b.1.number())
                    .unwrap_or(Ordering::Equal)
            });
            entries.reverse();

            if let Some(max) = options.max_items {
                if entries.len() > max {
                    entries.truncate(max);
                    truncated = true;
                }
            }
        } else {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }
    }

    let indent = options.tab.repeat(depth);

    for (name, node) in entries {
        match node {
            ReportNode::Leaf(v) => {
                res.push_str(&format!("{}{}{}{}\n", indent, name, options.sep, v));
            }
            ReportNode::Branch(grandchildren) => {
                res.push_str(&format!("{}{}\n", indent, name));
                report_rec(grandchildren, options, depth + 1, res);
            }
        }
    }

    if truncated {
        res.push_str(&format!("{}...{}...\n", indent, options.sep));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_table_sorted_by_value() {
        let table = markdown_table(
            vec![("chr1", 3), ("chr2", 10), ("chrX", 1)],
            &MarkdownOptions {
                key_label: "chrom".to_owned(),
                value_label: "count".to_owned(),
                ..Default::default()
            },
        );
        assert_eq!(
            table,
            "|chrom|count|\n|:---|:---|\n|chr2|10|\n|chr1|3|\n|chrX|1|\n"
        );
    }

    #[test]
    fn transposed_and_capped() {
        let table = markdown_table(
            vec![("a", 1), ("b", 5), ("c", 3)],
            &MarkdownOptions {
                key_label: "0".to_owned(),
                value_label: "Count".to_owned(),
                transpose: true,
                max_items: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(table, "|0|b|c|...|\n|:---|:---|:---|:---|\n|Count|5|3|...|\n");
    }

    #[test]
    fn unsorted_keeps_order() {
        let table = markdown_table(
            vec![("z", 1), ("a", 2)],
            &MarkdownOptions {
                sort_by_value: false,
                ..Default::default()
            },
        );
        assert_eq!(table, "|||\n|:---|:---|\n|z|1|\n|a|2|\n");
    }

    #[test]
    fn sort_by_key_descending() {
        let table = markdown_table(
            vec![("a", 1), ("c", 1), ("b", 1)],
            &MarkdownOptions {
                sort_by_key: true,
                sort_by_value: false,
                ..Default::default()
            },
        );
        assert_eq!(table, "|||\n|:---|:---|\n|c|1|\n|b|1|\n|a|1|\n");
    }

    #[test]
    fn nested_report() {
        let root = ReportNode::branch([
            (
                "col0",
                ReportNode::branch([
                    ("chr1", ReportNode::leaf(2usize)),
                    ("chr2", ReportNode::leaf(7usize)),
                    ("chr3", ReportNode::leaf(1usize)),
                ]),
            ),
            ("a_name", ReportNode::leaf("sample")),
        ]);

        let report = text_report(
            &root,
            &ReportOptions {
                max_items: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(
            report,
            "a_name:sample\ncol0\n\tchr2:7\n\tchr1:2\n\t...:...\n"
        );
    }

    #[test]
    fn unsorted_report() {
        let root = ReportNode::branch([
            ("b", ReportNode::leaf(1i64)),
            ("a", ReportNode::leaf(2i64)),
        ]);
        let report = text_report(
            &root,
            &ReportOptions {
                sort: false,
                sep: "\t".to_owned(),
                ..Default::default()
            },
        );
        assert_eq!(report, "b\t1\na\t2\n");
    }
}
