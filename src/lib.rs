//! Rust library for reformatting delimited text files.
//!
//! # Overview
//! retable rewrites the lines of tab-separated and similar bioinformatics files (BED, GFF3, GTF,
//! ...) from one layout into another, described by *templates*.
//!
//! This is useful for:
//! * Converting annotation files between tools that expect different columns
//! * Pulling attributes out of GFF3/GTF attribute strings into plain columns
//! * Cleaning up values (blank fields, embedded spaces, renamed chromosomes)
//! * Having a quick look at large, possibly gzipped, text files
//!
//! ## Templates
//! A template is a list of tokens. Integers and `{name}` strings are *fields*, any other string
//! is a *separator* that is matched literally:
//! ```
//! use retable::*;
//!
//! let init = template![0, "\t", 1, "\t", 2, "\t", 3, "|", 4, "\t", 5, "\t", 6];
//! let final_template = template![0, "\t", 1, "\t", 2, "\tm5C|-|HeLa|22344696\t-\t", 6];
//! ```
//! Templates can also be written in a compact form, `Template::parse_format("{0}\t{1}:{name}")`.
//!
//! Reading a line with a template *decomposes* it into a [`FieldMap`]:
//! ```
//! # use retable::*;
//! let d = Decomposer::new(template![0, "\t", 1, "|", 2]).unwrap();
//! let fields = d.decompose("chr1\tSquires|id1\n");
//! assert_eq!(fields.get(&FieldKey::Index(2)), Some("id1"));
//! ```
//! and writing fields with a template *recomposes* a line. A field used by the final template
//! that the initial template does not provide is an error.
//!
//! ## Cleaning
//! Between the two steps, a [`CleanConfig`] strips values, replaces blanks and spaces, rejects
//! lines based on filter tables and predicates, and substitutes values.
//!
//! ## Reformatting files
//! [`Reformatter`] puts it all together for whole files or streams and reports [`Counts`] of the
//! lines that passed, were filtered out, or failed. A [`ReformatConfig`] describes the same job in
//! YAML. The [`StandardTemplate`]s cover Ensembl GFF3 and GTF gene and transcript lines.
//!
//! ## Peeking and summaries
//! See [`peek`] for `head`/`tail`-like views into files and [`summary`] for per-column value
//! counts, rendered with [`report`].

pub mod clean;
pub mod config;
pub mod errors;
pub mod fields;
pub mod io;
pub mod path;
pub mod peek;
pub mod reformat;
pub mod report;
pub mod summary;
pub mod template;
pub mod text;

// commonly used functions and types

pub use crate::clean::*;
pub use crate::config::*;
pub use crate::fields::*;
pub use crate::reformat::*;
pub use crate::template::*;
