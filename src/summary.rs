//! Per-column value counts of delimited files.

use rustc_hash::{FxHashMap, FxHashSet};

use std::io::BufRead;

use crate::errors::*;
use crate::io::{open_reader, Origin};
use crate::report::{markdown_table, text_report, MarkdownOptions, ReportNode, ReportOptions};
use crate::text::SuperSplitter;

/// Occurrence counts that remember the order in which values were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    counts: Vec<(String, usize)>,
    index: FxHashMap<String, usize>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: &str) {
        match self.index.get(value) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(value.to_owned(), self.counts.len());
                self.counts.push((value.to_owned(), 1));
            }
        }
    }

    pub fn get(&self, value: &str) -> usize {
        self.index.get(value).map_or(0, |&i| self.counts[i].1)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Values with their counts in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(v, c)| (v.as_str(), *c))
    }

    /// Values with their counts, most frequent first, ties in first-seen order.
    pub fn sorted(&self) -> Vec<(String, usize)> {
        let mut res = self.counts.clone();
        res.sort_by(|a, b| b.1.cmp(&a.1));
        res
    }
}

#[derive(Debug, Clone)]
pub struct ColsumOptions {
    /// Columns to tally; all columns of the first data line when `None`.
    pub columns: Option<Vec<usize>>,
    pub separators: Vec<String>,
    /// Use the first data line as column labels.
    pub header: bool,
    pub comment_marker: Option<String>,
}

impl Default for ColsumOptions {
    fn default() -> Self {
        Self {
            columns: None,
            separators: vec!["\t".to_owned()],
            header: false,
            comment_marker: None,
        }
    }
}

/// Tallies of the selected columns of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub columns: Vec<ColumnTally>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTally {
    pub column: usize,
    pub label: String,
    pub tally: Tally,
}

impl ColumnSummary {
    /// One transposed markdown table per column, most frequent values first.
    pub fn to_markdown(&self, max_items: Option<usize>) -> String {
        self.columns
            .iter()
            .map(|c| {
                let options = MarkdownOptions {
                    key_label: c.label.clone(),
                    value_label: "Count".to_owned(),
                    transpose: true,
                    max_items,
                    ..Default::default()
                };
                format!("{}\n", markdown_table(c.tally.iter(), &options))
            })
            .collect()
    }

    /// Indented report with one section per column.
    pub fn to_report(&self, max_items: Option<usize>) -> String {
        let root = ReportNode::Branch(
            self.columns
                .iter()
                .map(|c| {
                    let counts = c
                        .tally
                        .iter()
                        .map(|(v, n)| (v.to_owned(), ReportNode::leaf(n)))
                        .collect();
                    (c.label.clone(), ReportNode::Branch(counts))
                })
                .collect(),
        );

        text_report(
            &root,
            &ReportOptions {
                sep: "\t".to_owned(),
                max_items,
                ..Default::default()
            },
        )
    }
}

/// Count the values of the selected columns, stripped of surrounding whitespace.
pub fn colsum(file: impl AsRef<str>, options: &ColsumOptions) -> Result<ColumnSummary> {
    const NAME: &str = "summarizing columns";

    let file = file.as_ref();
    let splitter = SuperSplitter::new(&options.separators)?;
    let origin = Origin::File(file.to_owned());

    let mut labels: Option<Vec<String>> = None;
    let mut columns: Option<Vec<ColumnTally>> = None;

    for_each_data_line(file, options.comment_marker.as_deref(), |line_idx, line| {
        let split = splitter.split(line);

        if options.header && labels.is_none() {
            labels = Some(split.iter().map(|s| s.trim().to_owned()).collect());
            return Ok(());
        }

        let tallies = columns.get_or_insert_with(|| {
            let selected = options
                .columns
                .clone()
                .unwrap_or_else(|| (0..split.len()).collect());
            selected
                .into_iter()
                .map(|column| ColumnTally {
                    column,
                    label: labels
                        .as_ref()
                        .and_then(|l| l.get(column).cloned())
                        .unwrap_or_else(|| column.to_string()),
                    tally: Tally::new(),
                })
                .collect()
        });

        for t in tallies.iter_mut() {
            let value = split.get(t.column).ok_or_else(|| Error::ColumnOutOfRange {
                origin: origin.clone(),
                line: line_idx + 1,
                column: t.column,
                context: NAME,
            })?;
            t.tally.add(value.trim());
        }

        Ok(())
    })?;

    Ok(ColumnSummary {
        columns: columns.unwrap_or_default(),
    })
}

#[derive(Debug, Clone)]
pub struct UniqOptions {
    /// Keep only lines whose column values are in these sets.
    pub select: FxHashMap<usize, FxHashSet<String>>,
    /// Drop lines whose column values are in these sets.
    pub drop: FxHashMap<usize, FxHashSet<String>>,
    pub comment_marker: Option<String>,
    pub separators: Vec<String>,
}

impl Default for UniqOptions {
    fn default() -> Self {
        Self {
            select: FxHashMap::default(),
            drop: FxHashMap::default(),
            comment_marker: Some("#".to_owned()),
            separators: vec!["\t".to_owned()],
        }
    }
}

/// Count the unique values of one column, most frequent first.
pub fn count_uniq(
    file: impl AsRef<str>,
    column: usize,
    options: &UniqOptions,
) -> Result<Vec<(String, usize)>> {
    const NAME: &str = "counting unique values";

    let file = file.as_ref();
    let splitter = SuperSplitter::new(&options.separators)?;
    let origin = Origin::File(file.to_owned());
    let mut tally = Tally::new();

    for_each_data_line(file, options.comment_marker.as_deref(), |line_idx, line| {
        let split = splitter.split(line);
        let get = |c: usize| {
            split.get(c).copied().ok_or_else(|| Error::ColumnOutOfRange {
                origin: origin.clone(),
                line: line_idx + 1,
                column: c,
                context: NAME,
            })
        };

        for (&c, values) in &options.select {
            if !values.contains(get(c)?) {
                return Ok(());
            }
        }
        for (&c, values) in &options.drop {
            if values.contains(get(c)?) {
                return Ok(());
            }
        }

        tally.add(get(column)?);
        Ok(())
    })?;

    Ok(tally.sorted())
}

/// Call `func` with the 0-based line index and the text of every non-comment line.
fn for_each_data_line<F>(file: &str, comment_marker: Option<&str>, mut func: F) -> Result<()>
where
    F: FnMut(usize, &str) -> Result<()>,
{
    let mut reader = open_reader(file)?;
    let mut buf = String::new();
    let mut idx = 0;

    loop {
        buf.clear();
        let n = reader.read_line(&mut buf).map_err(|e| Error::StreamIo {
            origin: Origin::File(file.to_owned()),
            source: e,
        })?;
        if n == 0 {
            break;
        }

        let line = buf.trim_end_matches(['\n', '\r']);
        if !comment_marker.map_or(false, |m| line.starts_with(m)) {
            func(idx, line)?;
        }
        idx += 1;
    }

    Ok(())
}
