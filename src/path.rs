//! String-based helpers for file paths, in the `/`-separated form used by pipelines.

/// Archive extensions that are reported together with the extension before them.
pub const COMPRESSED_EXTENSIONS: [&str; 5] = ["gz", "tgz", "zip", "xz", "bz2"];

/// Whether the path names a gzip file, judged by a case-insensitive `gz` ending.
pub fn is_gzipped(path: &str) -> bool {
    path.len() >= 2
        && path.is_char_boundary(path.len() - 2)
        && path[path.len() - 2..].eq_ignore_ascii_case("gz")
}

/// Whether the dot-separated component at `pos` is one of `exts` (case-insensitive).
///
/// `pos` counts from the end when negative (`-1` is the last extension) and from the start
/// otherwise.
pub fn has_extension(path: &str, exts: &[&str], pos: isize) -> bool {
    let parts = path.split('.').collect::<Vec<_>>();
    let idx = if pos < 0 {
        parts.len().checked_sub(pos.unsigned_abs())
    } else {
        Some(pos as usize)
    };

    idx.and_then(|i| parts.get(i))
        .map_or(false, |p| exts.iter().any(|e| e.eq_ignore_ascii_case(p)))
}

/// Name of the file without its directory and without any extension.
pub fn file_basename(path: &str) -> &str {
    let name = file_name(path);
    name.split('.').next().unwrap_or(name)
}

/// Lowercase extension of the file, with a leading dot, including the extension under a
/// compression suffix (`.fa.gz`). Empty without extension.
pub fn extensions(path: &str) -> String {
    extensions_list(path)
        .iter()
        .map(|e| format!(".{}", e))
        .collect()
}

/// Like [`extensions`], as a list of lowercase components without dots.
pub fn extensions_list(path: &str) -> Vec<String> {
    let parts = file_name(path).split('.').collect::<Vec<_>>();

    match parts.len() {
        1 => Vec::new(),
        n if n > 2 && is_compressed(parts[n - 1]) => {
            vec![parts[n - 2].to_lowercase(), parts[n - 1].to_lowercase()]
        }
        n => vec![parts[n - 1].to_lowercase()],
    }
}

fn is_compressed(ext: &str) -> bool {
    COMPRESSED_EXTENSIONS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(ext))
}

/// Name of the file with its extensions but without its directory.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Name of the directory containing the file.
pub fn dir_name(path: &str) -> &str {
    let dir = dir_path(path);
    dir.rsplit_once('/').map_or(dir, |(_, name)| name)
}

/// Path of the directory containing the file, empty for a bare file name.
pub fn dir_path(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_detection() {
        assert!(is_gzipped("reads.fastq.gz"));
        assert!(is_gzipped("ANNOT.GTF.GZ"));
        assert!(is_gzipped("archive.tgz"));
        assert!(!is_gzipped("reads.fastq"));
        assert!(!is_gzipped("g"));
    }

    #[test]
    fn extension_at_position() {
        assert!(has_extension("dir/genome.fa.gz", &["gz"], -1));
        assert!(has_extension("dir/genome.fa.gz", &["fa", "fasta"], -2));
        assert!(!has_extension("dir/genome.fa.gz", &["fa"], -1));
        assert!(!has_extension("genome", &["fa"], -2));
        assert!(has_extension("genome.FA", &["fa"], 1));
    }

    #[test]
    fn names_and_dirs() {
        let p = "/data/run1/sample.R1.fastq.gz";
        assert_eq!(file_name(p), "sample.R1.fastq.gz");
        assert_eq!(file_basename(p), "sample");
        assert_eq!(dir_path(p), "/data/run1");
        assert_eq!(dir_name(p), "run1");
        assert_eq!(dir_path("sample.txt"), "");
        assert_eq!(dir_name("sample.txt"), "");
    }

    #[test]
    fn compound_extensions() {
        assert_eq!(extensions("a/b/Genome.FA.GZ"), ".fa.gz");
        assert_eq!(extensions_list("a/b/Genome.FA.GZ"), vec!["fa", "gz"]);
        assert_eq!(extensions("table.tsv"), ".tsv");
        assert_eq!(extensions("reads.gz"), ".gz");
        assert_eq!(extensions("README"), "");
        assert!(extensions_list("README").is_empty());
    }
}
