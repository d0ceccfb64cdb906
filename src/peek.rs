//! Quick looks into text files, gzipped or not.

use log::warn;
use memchr::memchr_iter;

use std::collections::VecDeque;
use std::io::{BufRead, Read};

use crate::errors::*;
use crate::io::{open_reader, Origin};
use crate::text::truncate_chars;

const COUNT_BUF_SIZE: usize = 1024 * 1024;

/// Rendering of the lines shown by [`head`], [`tail`], [`line_range`] and [`cat`].
#[derive(Debug, Clone)]
pub struct PeekOptions {
    /// Prefix each line with its 0-based index and a tab.
    pub line_numbering: bool,
    pub max_chars: usize,
    /// Lines starting with this marker are skipped by [`head`].
    pub skip_comments: Option<String>,
}

impl Default for PeekOptions {
    fn default() -> Self {
        Self {
            line_numbering: false,
            max_chars: 150,
            skip_comments: None,
        }
    }
}

impl PeekOptions {
    fn render(&self, idx: usize, line: &str) -> String {
        let line = line.trim();
        let line = if self.line_numbering {
            format!("{}\t{}", idx, line)
        } else {
            line.to_owned()
        };
        truncate_chars(&line, self.max_chars)
    }
}

/// Iterate over the lines of a file with their 0-based index, terminators removed.
fn for_each_line<F>(file: &str, mut func: F) -> Result<()>
where
    F: FnMut(usize, &str) -> bool,
{
    let mut reader = open_reader(file)?;
    let mut buf = Vec::new();
    let mut idx = 0;

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).map_err(|e| Error::StreamIo {
            origin: Origin::File(file.to_owned()),
            source: e,
        })?;
        if n == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if !func(idx, line) {
            break;
        }
        idx += 1;
    }

    Ok(())
}

/// The first `n` lines of a file.
pub fn head(file: impl AsRef<str>, n: usize, options: &PeekOptions) -> Result<Vec<String>> {
    let file = file.as_ref();
    let mut res = Vec::with_capacity(n);

    if n == 0 {
        return Ok(res);
    }

    for_each_line(file, |idx, line| {
        let is_comment = options
            .skip_comments
            .as_deref()
            .map_or(false, |m| line.starts_with(m));
        if !is_comment {
            res.push(options.render(idx, line));
        }
        res.len() < n
    })?;

    if res.len() < n {
        warn!("Only {} lines in {}", res.len(), file);
    }

    Ok(res)
}

/// The last `n` lines of a file, read in one pass.
pub fn tail(file: impl AsRef<str>, n: usize, options: &PeekOptions) -> Result<Vec<String>> {
    let file = file.as_ref();
    let mut last = VecDeque::with_capacity(n + 1);
    let mut total = 0;

    for_each_line(file, |idx, line| {
        total += 1;
        if n > 0 {
            if last.len() == n {
                last.pop_front();
            }
            last.push_back(options.render(idx, line));
        }
        true
    })?;

    if total <= n {
        warn!("Only {} lines in {}", total, file);
    }

    Ok(last.into())
}

/// Lines whose 0-based index falls in any of the inclusive ranges.
///
/// Each run of skipped lines appears once as `...`. Without ranges, the first three and the
/// last three lines are shown.
pub fn line_range(
    file: impl AsRef<str>,
    ranges: &[(usize, usize)],
    options: &PeekOptions,
) -> Result<Vec<String>> {
    let file = file.as_ref();

    let default_ranges;
    let ranges = if ranges.is_empty() {
        let n = count_lines(file)?;
        default_ranges = [(0, 2), (n.saturating_sub(3), n.saturating_sub(1))];
        &default_ranges[..]
    } else {
        ranges
    };

    let mut res = Vec::new();
    let mut in_gap = false;

    for_each_line(file, |idx, line| {
        if ranges.iter().any(|&(start, end)| start <= idx && idx <= end) {
            res.push(options.render(idx, line));
            in_gap = false;
        } else if !in_gap {
            res.push("...".to_owned());
            in_gap = true;
        }
        true
    })?;

    Ok(res)
}

/// The whole file if it has at most `max_lines` lines, else its first and last `max_lines / 2`.
pub fn cat(file: impl AsRef<str>, max_lines: usize, options: &PeekOptions) -> Result<Vec<String>> {
    let file = file.as_ref();
    let n = count_lines(file)?;

    if n == 0 {
        return Ok(Vec::new());
    }

    let ranges = if n <= max_lines {
        vec![(0, n - 1)]
    } else {
        let half = max_lines / 2;
        if half == 0 {
            return Ok(vec!["...".to_owned()]);
        }
        vec![(0, half - 1), (n - half, n - 1)]
    };

    line_range(file, &ranges, options)
}

/// Number of `\n` characters in a file.
pub fn count_lines(file: impl AsRef<str>) -> Result<usize> {
    let file = file.as_ref();
    let mut reader = open_reader(file)?;
    let mut buf = vec![0u8; COUNT_BUF_SIZE];
    let mut lines = 0;

    loop {
        let n = reader.read(&mut buf).map_err(|e| Error::StreamIo {
            origin: Origin::File(file.to_owned()),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        lines += memchr_iter(b'\n', &buf[..n]).count();
    }

    Ok(lines)
}

/// Number of lines, not counting the ones starting with `comment_marker` if given.
pub fn count_records(file: impl AsRef<str>, comment_marker: Option<&str>) -> Result<usize> {
    let mut lines = 0;
    for_each_line(file.as_ref(), |_, line| {
        if !comment_marker.map_or(false, |m| line.starts_with(m)) {
            lines += 1;
        }
        true
    })?;
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_lines(dir: &tempfile::TempDir, name: &str, n: usize) -> String {
        let path = dir.path().join(name);
        let text = (0..n).map(|i| format!("line{}\n", i)).collect::<String>();
        std::fs::write(&path, text).unwrap();
        path.to_str().unwrap().to_owned()
    }

    #[test]
    fn head_and_tail() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_lines(&dir, "f.txt", 20);

        let opts = PeekOptions::default();
        assert_eq!(head(&file, 2, &opts).unwrap(), vec!["line0", "line1"]);
        assert_eq!(tail(&file, 2, &opts).unwrap(), vec!["line18", "line19"]);
        assert_eq!(tail(&file, 30, &opts).unwrap().len(), 20);
        assert!(tail(&file, 0, &opts).unwrap().is_empty());

        let numbered = PeekOptions {
            line_numbering: true,
            ..Default::default()
        };
        assert_eq!(tail(&file, 1, &numbered).unwrap(), vec!["19\tline19"]);
    }

    #[test]
    fn head_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.txt");
        std::fs::write(&path, "#h1\n#h2\nrow1\nrow2\n").unwrap();

        let opts = PeekOptions {
            skip_comments: Some("#".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            head(path.to_str().unwrap(), 5, &opts).unwrap(),
            vec!["row1", "row2"]
        );
    }

    #[test]
    fn ranges_with_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_lines(&dir, "f.txt", 10);
        let opts = PeekOptions::default();

        assert_eq!(
            line_range(&file, &[(1, 2), (5, 5)], &opts).unwrap(),
            vec!["...", "line1", "line2", "...", "line5", "..."]
        );
        assert_eq!(
            line_range(&file, &[], &opts).unwrap(),
            vec!["line0", "line1", "line2", "...", "line7", "line8", "line9"]
        );
    }

    #[test]
    fn cat_caps_long_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_lines(&dir, "f.txt", 10);
        let opts = PeekOptions::default();

        assert_eq!(cat(&file, 20, &opts).unwrap().len(), 10);
        assert_eq!(
            cat(&file, 4, &opts).unwrap(),
            vec!["line0", "line1", "...", "line8", "line9"]
        );
    }

    #[test]
    fn long_lines_are_cut() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        std::fs::write(&path, format!("{}\n", "A".repeat(200))).unwrap();

        let lines = head(path.to_str().unwrap(), 1, &PeekOptions::default()).unwrap();
        assert_eq!(lines[0], format!("{}...", "A".repeat(150)));
    }

    #[test]
    fn counting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.txt");
        std::fs::write(&path, "#h\na\nb\n#c\nd").unwrap();
        let file = path.to_str().unwrap();

        assert_eq!(count_lines(file).unwrap(), 4);
        assert_eq!(count_records(file, None).unwrap(), 5);
        assert_eq!(count_records(file, Some("#")).unwrap(), 3);
    }
}
