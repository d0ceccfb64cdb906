//! retable - reformat and inspect delimited text files
//!
//! # Usage
//!
//! ```bash
//! # Reformat a BED file with a YAML job description
//! retable reformat input.bed.gz -o output.bed --config job.yaml
//!
//! # Pull gene names out of a GTF file
//! retable reformat genes.gtf --standard gtf_ens_gene --final "{gene_id}\t{gene_name}"
//!
//! # Look into files
//! retable head input.bed -n 5
//! retable colsum input.bed -c 0 -c 5
//! ```

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use log::*;
use rustc_hash::{FxHashMap, FxHashSet};

use std::io::{self, Write};

use retable::config::ReformatConfig;
use retable::peek::{self, PeekOptions};
use retable::reformat::Counts;
use retable::summary::{colsum, count_uniq, ColsumOptions, UniqOptions};
use retable::{io as rio, report};

#[derive(Parser)]
#[command(author, version, about)]
/// Reformat and inspect delimited text files
struct Cli {
    /// More logging (debug level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Less logging (warnings and errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite lines from one template layout to another
    Reformat(ReformatArgs),
    /// Show the first lines of a file
    Head(HeadArgs),
    /// Show the last lines of a file
    Tail(TailArgs),
    /// Show ranges of lines of a file
    Range(RangeArgs),
    /// Show a file, or its start and end if it is long
    Cat(CatArgs),
    /// Count the lines of a file
    Count(CountArgs),
    /// Count the values of columns
    Colsum(ColsumArgs),
    /// Count the unique values of one column
    Uniq(UniqArgs),
    /// Compress a file
    Gzip(GzipArgs),
    /// Decompress a file
    Gunzip(GzipArgs),
}

#[derive(Args)]
struct ReformatArgs {
    /// Input file, gzipped if the name ends with gz
    input: String,
    /// Output file, gzipped if the name ends with .gz. Only counts lines if omitted
    #[arg(short, long)]
    output: Option<String>,
    /// YAML job description. The other options override it
    #[arg(long)]
    config: Option<String>,
    /// Initial template, for example "{0}\t{1}|{name}"
    #[arg(long = "init")]
    init_format: Option<String>,
    /// Final template, same syntax as --init
    #[arg(long = "final")]
    final_format: Option<String>,
    /// Predefined initial template
    #[arg(long = "standard")]
    standard_template: Option<String>,
    /// Text written at the start of the output
    #[arg(long)]
    header: Option<String>,
    /// Drop the comment lines at the top of the input
    #[arg(long)]
    no_original_header: bool,
    /// Write a header line naming the fields of the final template
    #[arg(long)]
    header_from_final: bool,
    /// Replacement for spaces inside values
    #[arg(long)]
    replace_space: Option<String>,
    /// Replacement for empty values
    #[arg(long)]
    replace_null: Option<String>,
    /// Keep spaces and empty values as they are
    #[arg(long, conflicts_with_all = ["replace_space", "replace_null"])]
    no_replacements: bool,
    /// Marker of comment lines
    #[arg(long)]
    comment_marker: Option<String>,
}

#[derive(Args)]
struct PeekArgs {
    /// Prefix lines with their 0-based index
    #[arg(long)]
    numbering: bool,
    /// Cut lines longer than this
    #[arg(long, default_value_t = 150)]
    max_chars: usize,
}

impl PeekArgs {
    fn options(&self, skip_comments: Option<String>) -> PeekOptions {
        PeekOptions {
            line_numbering: self.numbering,
            max_chars: self.max_chars,
            skip_comments,
        }
    }
}

#[derive(Args)]
struct HeadArgs {
    file: String,
    #[arg(short, default_value_t = 10)]
    n: usize,
    /// Skip lines starting with this marker
    #[arg(long)]
    skip_comments: Option<String>,
    #[command(flatten)]
    peek: PeekArgs,
}

#[derive(Args)]
struct TailArgs {
    file: String,
    #[arg(short, default_value_t = 10)]
    n: usize,
    #[command(flatten)]
    peek: PeekArgs,
}

#[derive(Args)]
struct RangeArgs {
    file: String,
    /// Inclusive 0-based range of lines, for example 10-20. First and last lines if omitted
    #[arg(short, long = "range", value_parser = parse_range)]
    ranges: Vec<(usize, usize)>,
    #[command(flatten)]
    peek: PeekArgs,
}

#[derive(Args)]
struct CatArgs {
    file: String,
    #[arg(long, default_value_t = 100)]
    max_lines: usize,
    #[command(flatten)]
    peek: PeekArgs,
}

#[derive(Args)]
struct CountArgs {
    file: String,
    /// Do not count lines starting with this marker
    #[arg(long)]
    comment_marker: Option<String>,
}

#[derive(Args)]
struct ColsumArgs {
    file: String,
    /// Column to count, all columns if omitted
    #[arg(short, long = "column")]
    columns: Vec<usize>,
    /// Column separator, can be given several times
    #[arg(short, long = "separator", default_value = "\t")]
    separators: Vec<String>,
    /// Use the first data line as column labels
    #[arg(long)]
    header: bool,
    /// Skip lines starting with this marker
    #[arg(long)]
    comment_marker: Option<String>,
    /// Show at most this many values per column
    #[arg(long)]
    max_items: Option<usize>,
    /// Indented text instead of markdown tables
    #[arg(long)]
    report: bool,
}

#[derive(Args)]
struct UniqArgs {
    file: String,
    /// Column to count
    #[arg(short, long)]
    column: usize,
    /// Keep only lines where COLUMN=VALUE, can be given several times
    #[arg(long, value_parser = parse_column_value)]
    select: Vec<(usize, String)>,
    /// Drop lines where COLUMN=VALUE, can be given several times
    #[arg(long, value_parser = parse_column_value)]
    drop: Vec<(usize, String)>,
    #[arg(short, long = "separator", default_value = "\t")]
    separators: Vec<String>,
    #[arg(long, default_value = "#")]
    comment_marker: String,
    /// Show at most this many values
    #[arg(long)]
    max_items: Option<usize>,
}

#[derive(Args)]
struct GzipArgs {
    input: String,
    #[arg(short, long)]
    output: Option<String>,
}

fn parse_range(s: &str) -> std::result::Result<(usize, usize), String> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| format!("expected START-END, got \"{}\"", s))?;
    let start = start.trim().parse::<usize>().map_err(|e| e.to_string())?;
    let end = end.trim().parse::<usize>().map_err(|e| e.to_string())?;
    if start > end {
        return Err(format!("range start {} is after its end {}", start, end));
    }
    Ok((start, end))
}

fn parse_column_value(s: &str) -> std::result::Result<(usize, String), String> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got \"{}\"", s))?;
    let column = column.trim().parse::<usize>().map_err(|e| e.to_string())?;
    Ok((column, value.to_owned()))
}

fn column_sets(pairs: Vec<(usize, String)>) -> FxHashMap<usize, FxHashSet<String>> {
    let mut res = FxHashMap::<usize, FxHashSet<String>>::default();
    for (column, value) in pairs {
        res.entry(column).or_default().insert(value);
    }
    res
}

fn print_lines<W: Write>(out: &mut W, lines: Vec<String>) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn print_counts(counts: &Counts) {
    eprintln!(
        "{} Lines processed\t{} Lines pass\t{} Lines filtered out\t{} Lines fail",
        counts.total.to_string().bold(),
        counts.succeeded.to_string().green(),
        counts.filtered_out.to_string().yellow(),
        counts.failed.to_string().red()
    );
}

fn run_reformat(args: ReformatArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(file) => ReformatConfig::from_file(file)?,
        None => ReformatConfig::default(),
    };

    if args.init_format.is_some() || args.standard_template.is_some() {
        config.init_template = None;
        config.init_format = args.init_format;
        config.standard_template = args.standard_template;
    }
    if args.final_format.is_some() {
        config.final_template = None;
        config.final_format = args.final_format;
    }
    if args.header.is_some() {
        config.header = args.header;
    }
    if args.no_original_header {
        config.keep_original_header = false;
    }
    if args.header_from_final {
        config.header_from_final_template = true;
    }
    if args.no_replacements {
        config.replace_internal_space = None;
        config.replace_null = None;
    }
    if args.replace_space.is_some() {
        config.replace_internal_space = args.replace_space;
    }
    if args.replace_null.is_some() {
        config.replace_null = args.replace_null;
    }
    if let Some(marker) = args.comment_marker {
        config.comment_marker = Some(marker);
    }

    let reformatter = config.build().context("Invalid reformatting job")?;
    info!("Reformatting {}", args.input);
    let counts = reformatter.run_files(&args.input, args.output.as_deref())?;
    print_counts(&counts);
    Ok(())
}

fn run_colsum<W: Write>(args: ColsumArgs, out: &mut W) -> Result<()> {
    let options = ColsumOptions {
        columns: if args.columns.is_empty() {
            None
        } else {
            Some(args.columns)
        },
        separators: args.separators,
        header: args.header,
        comment_marker: args.comment_marker,
    };
    let summary = colsum(&args.file, &options)?;

    let text = if args.report {
        summary.to_report(args.max_items)
    } else {
        summary.to_markdown(args.max_items)
    };
    out.write_all(text.as_bytes())?;
    Ok(())
}

fn run_uniq<W: Write>(args: UniqArgs, out: &mut W) -> Result<()> {
    let options = UniqOptions {
        select: column_sets(args.select),
        drop: column_sets(args.drop),
        comment_marker: Some(args.comment_marker).filter(|m| !m.is_empty()),
        separators: args.separators,
    };
    let counts = count_uniq(&args.file, args.column, &options)?;

    let table = report::markdown_table(
        counts,
        &report::MarkdownOptions {
            key_label: args.column.to_string(),
            value_label: "Count".to_owned(),
            sort_by_value: false,
            max_items: args.max_items,
            ..Default::default()
        },
    );
    out.write_all(table.as_bytes())?;
    Ok(())
}

impl Command {
    fn run<W: Write>(self, out: &mut W) -> Result<()> {
        match self {
            Command::Reformat(args) => run_reformat(args)?,
            Command::Head(args) => {
                let options = args.peek.options(args.skip_comments);
                print_lines(out, peek::head(&args.file, args.n, &options)?)?;
            }
            Command::Tail(args) => {
                let lines = peek::tail(&args.file, args.n, &args.peek.options(None))?;
                print_lines(out, lines)?;
            }
            Command::Range(args) => {
                let lines = peek::line_range(&args.file, &args.ranges, &args.peek.options(None))?;
                print_lines(out, lines)?;
            }
            Command::Cat(args) => {
                let lines = peek::cat(&args.file, args.max_lines, &args.peek.options(None))?;
                print_lines(out, lines)?;
            }
            Command::Count(args) => {
                let n = match args.comment_marker.as_deref() {
                    Some(marker) => peek::count_records(&args.file, Some(marker))?,
                    None => peek::count_lines(&args.file)?,
                };
                writeln!(out, "{}", n)?;
            }
            Command::Colsum(args) => run_colsum(args, out)?,
            Command::Uniq(args) => run_uniq(args, out)?,
            Command::Gzip(args) => {
                let path = rio::gzip_file(&args.input, args.output.as_deref())?;
                info!("Compressed {} into {}", args.input, path);
            }
            Command::Gunzip(args) => {
                if !retable::path::is_gzipped(&args.input) {
                    bail!("{} does not look gzipped", args.input);
                }
                let path = rio::gunzip_file(&args.input, args.output.as_deref())?;
                info!("Decompressed {} into {}", args.input, path);
            }
        }
        out.flush()?;
        Ok(())
    }
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::BrokenPipe)
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let stdout = io::stdout();
    if let Err(err) = cli.command.run(&mut stdout.lock()) {
        if is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{:#}", err);
        std::process::exit(1);
    }
}
