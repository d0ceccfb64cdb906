use log::{debug, info, warn};

use std::fmt;
use std::io::{BufRead, Write};

use crate::clean::CleanConfig;
use crate::errors::*;
use crate::fields::FieldMap;
use crate::io::{create_writer, open_reader, Origin};
use crate::template::{Decomposer, StandardTemplate, Template};

/// Outcome counts of a reformatting run.
///
/// `total` counts every non-comment line, which ends up in exactly one of the other buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub succeeded: usize,
    pub filtered_out: usize,
    pub failed: usize,
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} Lines processed\t{} Lines pass\t{} Lines filtered out\t{} Lines fail",
            self.total, self.succeeded, self.filtered_out, self.failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Comment lines at the top of the input.
    HeaderPassthrough,
    Reading,
    Done,
}

/// Rewrites delimited lines from one template layout to another.
///
/// Each line is decomposed with the initial template, cleaned and filtered, then recomposed
/// with the final template. Lines starting with the comment marker are copied to the output
/// while they form the header at the top of the input (if the original header is kept), and
/// dropped afterwards.
#[derive(Debug, Clone)]
pub struct Reformatter {
    decomposer: Decomposer,
    final_template: Template,
    clean: CleanConfig,
    standard: Option<StandardTemplate>,
    header: Option<String>,
    keep_original_header: bool,
    header_from_final_template: bool,
    comment_marker: Option<String>,
}

impl Reformatter {
    const NAME: &'static str = "reformatting lines";

    /// Reformatter that keeps the layout of `init_template` unless a final template is set.
    pub fn new(init_template: Template) -> Result<Self> {
        Ok(Self {
            final_template: init_template.clone(),
            decomposer: Decomposer::new(init_template)?,
            clean: CleanConfig::new(),
            standard: None,
            header: None,
            keep_original_header: true,
            header_from_final_template: false,
            comment_marker: Some("#".to_owned()),
        })
    }

    /// Reformatter for a known annotation format, keeping only its feature type.
    pub fn from_standard(standard: StandardTemplate) -> Result<Self> {
        info!(
            "Using the {} template, features other than {} are filtered out",
            standard,
            standard.feature_type()
        );
        let mut res = Self::new(standard.init_template())?;
        res.standard = Some(standard);
        res.clean = CleanConfig::new().require(standard.predicate());
        Ok(res)
    }

    pub fn with_final_template(mut self, template: Template) -> Self {
        self.final_template = template;
        self
    }

    /// Set the cleaning configuration. The predicate of a standard template runs after the
    /// predicates of `clean`.
    pub fn clean(mut self, mut clean: CleanConfig) -> Self {
        if let Some(standard) = self.standard {
            clean.predicates.push(standard.predicate());
        }
        self.clean = clean;
        self
    }

    /// Text written at the very start of the output.
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn keep_original_header(mut self, keep: bool) -> Self {
        self.keep_original_header = keep;
        self
    }

    /// Write a header line naming the fields of the final template.
    pub fn header_from_final_template(mut self, enable: bool) -> Self {
        self.header_from_final_template = enable;
        self
    }

    /// `None` treats every line as data.
    pub fn comment_marker(mut self, marker: Option<String>) -> Self {
        self.comment_marker = marker.filter(|m| !m.is_empty());
        self
    }

    pub fn init_template(&self) -> &Template {
        self.decomposer.template()
    }

    pub fn final_template(&self) -> &Template {
        &self.final_template
    }

    pub fn clean_config(&self) -> &CleanConfig {
        &self.clean
    }

    /// Column names of the rows returned by [`run_collect`](Self::run_collect).
    pub fn columns(&self) -> Vec<String> {
        self.final_template.column_names()
    }

    /// Reformat all lines of `reader`, writing them to `writer` if given.
    pub fn run<R: BufRead>(&self, reader: R, writer: Option<&mut dyn Write>) -> Result<Counts> {
        self.run_with_origin(reader, &Origin::Stream, writer, &Origin::Stream)
    }

    /// Reformat a file into another file. Gzip is handled on both sides based on the names.
    pub fn run_files(&self, input: impl AsRef<str>, output: Option<&str>) -> Result<Counts> {
        let input = input.as_ref();
        let reader = open_reader(input)?;
        let in_origin = Origin::File(input.to_owned());

        match output {
            Some(output) => {
                let mut writer = create_writer(output)?;
                let counts = self.run_with_origin(
                    reader,
                    &in_origin,
                    Some(&mut writer),
                    &Origin::File(output.to_owned()),
                )?;
                writer.finish().map_err(|e| Error::FileIo {
                    file: output.to_owned(),
                    source: e,
                })?;
                Ok(counts)
            }
            None => self.run_with_origin(reader, &in_origin, None, &Origin::Stream),
        }
    }

    /// Reformat all lines of `reader` into rows of final template field values.
    pub fn run_collect<R: BufRead>(&self, reader: R) -> Result<(Vec<Vec<String>>, Counts)> {
        let mut rows = Vec::new();
        let counts = self.process(
            reader,
            &Origin::Stream,
            |_| Ok(()),
            |fields| {
                rows.push(self.final_template.recompose_values(fields)?);
                Ok(())
            },
        )?;
        Ok((rows, counts))
    }

    fn run_with_origin<R: BufRead>(
        &self,
        reader: R,
        in_origin: &Origin,
        writer: Option<&mut dyn Write>,
        out_origin: &Origin,
    ) -> Result<Counts> {
        debug!("Initial template: {}", self.init_template());
        debug!("Final template: {}", self.final_template);

        let Some(writer) = writer else {
            let counts = self.process(
                reader,
                in_origin,
                |_| Ok(()),
                |fields| self.final_template.recompose(fields).map(|_| ()),
            )?;
            info!("{}", counts);
            return Ok(counts);
        };

        let write_err = |e| Error::StreamIo {
            origin: out_origin.clone(),
            source: e,
        };

        if let Some(header) = &self.header {
            writer.write_all(header.as_bytes()).map_err(write_err)?;
            if !header.ends_with('\n') {
                writer.write_all(b"\n").map_err(write_err)?;
            }
        }
        if self.header_from_final_template {
            writeln!(writer, "{}", self.final_template.header_line()).map_err(write_err)?;
        }

        // both closures need the writer, one at a time
        let writer = std::cell::RefCell::new(writer);
        let counts = self.process(
            reader,
            in_origin,
            |line| writer.borrow_mut().write_all(line).map_err(write_err),
            |fields| {
                let line = self.final_template.recompose(fields)?;
                writer
                    .borrow_mut()
                    .write_all(line.as_bytes())
                    .map_err(write_err)
            },
        )?;
        writer.into_inner().flush().map_err(write_err)?;

        info!("{}", counts);
        Ok(counts)
    }

    fn process<R, H, F>(
        &self,
        mut reader: R,
        origin: &Origin,
        mut on_header: H,
        mut on_fields: F,
    ) -> Result<Counts>
    where
        R: BufRead,
        H: FnMut(&[u8]) -> Result<()>,
        F: FnMut(&FieldMap) -> Result<()>,
    {
        let mut counts = Counts::default();
        let mut state = State::HeaderPassthrough;
        let mut buf = Vec::new();
        let mut line_idx = 0;

        while state != State::Done {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf).map_err(|e| Error::StreamIo {
                origin: origin.clone(),
                source: e,
            })?;
            if n == 0 {
                state = State::Done;
                continue;
            }
            line_idx += 1;

            let is_comment = self
                .comment_marker
                .as_ref()
                .map_or(false, |m| buf.starts_with(m.as_bytes()));
            if is_comment {
                if state == State::HeaderPassthrough && self.keep_original_header {
                    on_header(&buf)?;
                } else {
                    debug!("Dropping comment line {} in {}", line_idx, origin);
                }
                continue;
            }

            state = State::Reading;
            counts.total += 1;

            let Ok(line) = std::str::from_utf8(&buf) else {
                warn!("Line {} in {} is not valid UTF-8 when {}", line_idx, origin, Self::NAME);
                counts.failed += 1;
                continue;
            };

            let fields = self.decomposer.decompose(line);
            if fields.is_empty() {
                debug!("Decomposing line {} in {} resulted in no fields", line_idx, origin);
                counts.failed += 1;
                continue;
            }

            let Some(fields) = self.clean.clean(fields) else {
                counts.filtered_out += 1;
                continue;
            };

            on_fields(&fields)?;
            counts.succeeded += 1;
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::Predicate;
    use crate::fields::FieldKey;
    use crate::template;

    const BED: &str = "#track name=m5C\n\
chr1\t631539\t631540\tSquires|id1\t0\t+\n\
chr2\t631541\t631542\tLi|id2\t0\t-\n\
\n\
chr4\t10\t20\tSquires|id3\t0\t+\n\
#late comment\n\
chr3\t5\t6\tLi|id4\t0\t+\n";

    fn bed_reformatter() -> Reformatter {
        Reformatter::new(template![0, "\t", 1, "\t", 2, "\t", 3, "|", 4, "\t", 5, "\t", 6])
            .unwrap()
            .with_final_template(template![0, "\t", 1, "\t", 2, "\tm5C|-|HeLa|22344696\t-\t", 6])
    }

    fn run_to_string(r: &Reformatter, input: &str) -> Result<(String, Counts)> {
        let mut out = Vec::new();
        let counts = r.run(input.as_bytes(), Some(&mut out))?;
        Ok((String::from_utf8(out).unwrap(), counts))
    }

    #[test]
    fn reformat_bed_lines() {
        let r = bed_reformatter().clean(CleanConfig::new().filter_out(0usize, ["chr2", "chr4"]));
        let (out, counts) = run_to_string(&r, BED).unwrap();

        assert_eq!(
            out,
            "#track name=m5C\n\
chr1\t631539\t631540\tm5C|-|HeLa|22344696\t-\t+\n\
chr3\t5\t6\tm5C|-|HeLa|22344696\t-\t+\n"
        );
        assert_eq!(
            counts,
            Counts {
                total: 5,
                succeeded: 2,
                filtered_out: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn drop_original_header_and_write_new_ones() {
        let r = bed_reformatter()
            .keep_original_header(false)
            .header("# converted")
            .header_from_final_template(true);
        let (out, counts) = run_to_string(&r, BED).unwrap();

        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "# converted");
        assert_eq!(lines[1], "0\t1\t2\tm5C|-|HeLa|22344696\t-\t6");
        assert_eq!(lines[2], "chr1\t631539\t631540\tm5C|-|HeLa|22344696\t-\t+");
        assert_eq!(lines.len(), 2 + 4);
        assert_eq!(counts.succeeded, 4);
    }

    #[test]
    fn blank_line_fails_without_output() {
        let r = bed_reformatter();
        let (out, counts) = run_to_string(&r, "\n").unwrap();
        assert_eq!(out, "");
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.total, 1);
    }

    #[test]
    fn invalid_utf8_fails_the_line() {
        let r = Reformatter::new(template![0, "\t", 1]).unwrap();
        let input = b"a\tb\n\xff\xfe\tc\nd\te\n";
        let mut out = Vec::new();
        let counts = r.run(&input[..], Some(&mut out)).unwrap();
        assert_eq!(out, b"a\tb\nd\te\n");
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.succeeded, 2);
    }

    #[test]
    fn missing_field_aborts_the_run() {
        let r = Reformatter::new(template![0, "\t", 1])
            .unwrap()
            .with_final_template(template![0, "\t", "{missing}"]);
        let mut out = Vec::new();
        let res = r.run("#h\na\tb\nc\td\n".as_bytes(), Some(&mut out));

        assert!(matches!(res, Err(Error::MissingField { .. })));
        assert_eq!(out, b"#h\n");
    }

    #[test]
    fn named_fields_with_cleaning() {
        let r = Reformatter::new(template!["{chrom}", "\t", "{start}", "\t", "{name}"])
            .unwrap()
            .with_final_template(template!["{name}", "@", "{chrom}", ":", "{start}"])
            .clean(
                CleanConfig::new()
                    .replace_internal_space("_")
                    .replace_null("*")
                    .substitute("chrom", "chr1", "1"),
            );
        let (out, _) = run_to_string(&r, "chr1\t 100 \tmy gene\nchr2\t\tx\n").unwrap();
        assert_eq!(out, "my_gene@1:100\nx@chr2:*\n");
    }

    #[test]
    fn comment_marker_can_be_disabled() {
        let r = Reformatter::new(template![0, ",", 1])
            .unwrap()
            .comment_marker(None);
        let (out, counts) = run_to_string(&r, "#a,b\nc,d\n").unwrap();
        assert_eq!(out, "#a,b\nc,d\n");
        assert_eq!(counts.total, 2);
    }

    #[test]
    fn standard_template_keeps_its_predicate() {
        let r = Reformatter::from_standard(StandardTemplate::Gff3EnsGene)
            .unwrap()
            .with_final_template(template!["{gene_name}", "\t", "{gene_type}"])
            .clean(CleanConfig::new().require(Predicate::Equals {
                key: FieldKey::name("seqid"),
                value: "chr1".to_owned(),
            }));
        assert_eq!(r.clean_config().predicates.len(), 2);

        let input = "##gff-version 3\n\
chr1\tHAVANA\tgene\t11869\t14409\t.\t+\t.\tID=ENSG1;gene_id=ENSG1;gene_type=lncRNA;\
gene_status=KNOWN;gene_name=DDX11L1;level=2;havana_gene=OTTHUMG1\n\
chr1\tHAVANA\ttranscript\t11869\t14409\t.\t+\t.\tID=ENST1;Parent=ENSG1\n\
chr2\tHAVANA\tgene\t1\t2\t.\t+\t.\tID=ENSG2;gene_id=ENSG2;gene_type=protein_coding;\
gene_status=KNOWN;gene_name=X;level=2;havana_gene=OTTHUMG2\n";
        let (out, counts) = run_to_string(&r, input).unwrap();

        assert_eq!(out, "##gff-version 3\nDDX11L1\tlncRNA\n");
        assert_eq!(counts.filtered_out, 2);
    }

    #[test]
    fn collect_rows() {
        let r = Reformatter::new(template!["{chrom}", "\t", "{pos}"])
            .unwrap()
            .with_final_template(template!["{pos}", ":", "{chrom}"]);
        let (rows, counts) = r.run_collect("chr1\t5\nchr2\t9\n".as_bytes()).unwrap();

        assert_eq!(r.columns(), vec!["pos", "chrom"]);
        assert_eq!(rows, vec![vec!["5", "chr1"], vec!["9", "chr2"]]);
        assert_eq!(counts.succeeded, 2);
    }

    #[test]
    fn final_template_defaults_to_init_template() {
        let r = Reformatter::new(template!["{chrom}", "\t", "{pos}"]).unwrap();
        assert_eq!(r.final_template(), r.init_template());

        let r = r.with_final_template(template!["{pos}", ":", "{chrom}"]);
        assert_eq!(r.final_template().column_names(), vec!["pos", "chrom"]);
        assert_eq!(r.init_template().column_names(), vec!["chrom", "pos"]);
    }

    #[test]
    fn counts_without_output() {
        let r = bed_reformatter();
        let counts = r.run(BED.as_bytes(), None).unwrap();
        assert_eq!(counts.total, 5);
        assert_eq!(counts.succeeded, 4);
        assert_eq!(
            counts.to_string(),
            "5 Lines processed\t4 Lines pass\t0 Lines filtered out\t1 Lines fail"
        );
    }
}
