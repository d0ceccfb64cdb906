use flate2::{read::MultiGzDecoder, write::GzEncoder, Compression};
use log::info;

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::errors::*;
use crate::path::is_gzipped;

/// Where lines come from, for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    File(String),
    Stream,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Origin::File(file) => write!(f, "file \"{}\"", file),
            Origin::Stream => write!(f, "input stream"),
        }
    }
}

/// Open a file for buffered reading, decompressing it if the name ends with `gz`.
pub fn open_reader(file: impl AsRef<str>) -> Result<Box<dyn BufRead>> {
    let file = file.as_ref();
    let f = File::open(file).map_err(|e| Error::FileIo {
        file: file.to_owned(),
        source: e,
    })?;

    if is_gzipped(file) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

/// Buffered output file, gzip-compressed or plain.
///
/// Call [`finish`](OutputFile::finish) once done writing: it writes the gzip trailer and reports
/// any error doing so.
pub enum OutputFile {
    Plain(BufWriter<File>),
    Gzip(BufWriter<GzEncoder<File>>),
}

impl OutputFile {
    pub fn finish(self) -> std::io::Result<()> {
        match self {
            OutputFile::Plain(mut w) => w.flush(),
            OutputFile::Gzip(w) => {
                let encoder = w.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?;
                Ok(())
            }
        }
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            OutputFile::Plain(w) => w.write(buf),
            OutputFile::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            OutputFile::Plain(w) => w.flush(),
            OutputFile::Gzip(w) => w.flush(),
        }
    }
}

/// Create a file for buffered writing, compressing it if the name ends with `.gz`.
///
/// Missing parent directories are created.
pub fn create_writer(file: impl AsRef<str>) -> Result<OutputFile> {
    let file = file.as_ref();
    let io_err = |e| Error::FileIo {
        file: file.to_owned(),
        source: e,
    };

    if let Some(parent) = Path::new(file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let f = File::create(file).map_err(io_err)?;

    if file.ends_with(".gz") {
        let encoder = GzEncoder::new(f, Compression::default());
        Ok(OutputFile::Gzip(BufWriter::new(encoder)))
    } else {
        Ok(OutputFile::Plain(BufWriter::new(f)))
    }
}

/// Compress a file with gzip and return the path of the compressed file.
///
/// The output defaults to the input path with `.gz` appended. A partial output is removed if
/// compression fails.
pub fn gzip_file(input: impl AsRef<str>, output: Option<&str>) -> Result<String> {
    let input = input.as_ref();
    let output = output.map_or_else(|| format!("{}.gz", input), str::to_owned);

    info!("Compressing {}", input);
    convert(input, &output, |reader, writer| {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        std::io::copy(reader, &mut encoder)?;
        encoder.finish()?.flush()
    })?;

    Ok(output)
}

/// Decompress a gzip file and return the path of the decompressed file.
///
/// The output defaults to the input path without its `.gz` suffix. A partial output is removed
/// if decompression fails.
pub fn gunzip_file(input: impl AsRef<str>, output: Option<&str>) -> Result<String> {
    let input = input.as_ref();
    let output = match output {
        Some(o) => o.to_owned(),
        None => input
            .strip_suffix(".gz")
            .filter(|o| !o.is_empty())
            .ok_or_else(|| Error::Parse {
                string: input.to_owned(),
                reason: "cannot derive an output name from a file without a .gz extension",
            })?
            .to_owned(),
    };

    info!("Uncompressing {}", input);
    convert(input, &output, |reader, mut writer| {
        let mut decoder = MultiGzDecoder::new(reader);
        std::io::copy(&mut decoder, &mut writer)?;
        writer.flush()
    })?;

    Ok(output)
}

fn convert<F>(input: &str, output: &str, func: F) -> Result<()>
where
    F: FnOnce(&mut dyn Read, BufWriter<File>) -> std::io::Result<()>,
{
    let mut reader = File::open(input).map_err(|e| Error::FileIo {
        file: input.to_owned(),
        source: e,
    })?;
    let writer = BufWriter::new(File::create(output).map_err(|e| Error::FileIo {
        file: output.to_owned(),
        source: e,
    })?);

    func(&mut reader, writer).map_err(|e| {
        let _ = std::fs::remove_file(output);
        Error::FileIo {
            file: input.to_owned(),
            source: e,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("reads.tsv");
        let plain = plain.to_str().unwrap();
        std::fs::write(plain, "a\tb\nc\td\n").unwrap();

        let gz = gzip_file(plain, None).unwrap();
        assert_eq!(gz, format!("{}.gz", plain));

        let mut text = String::new();
        open_reader(&gz).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "a\tb\nc\td\n");

        let back = dir.path().join("back.tsv");
        let back = gunzip_file(&gz, back.to_str()).unwrap();
        assert_eq!(std::fs::read_to_string(back).unwrap(), "a\tb\nc\td\n");
    }

    #[test]
    fn gunzip_needs_an_output_name() {
        assert!(gunzip_file("reads.tsv", None).is_err());
    }

    #[test]
    fn gunzip_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.gz");
        std::fs::write(&bad, "not gzip data").unwrap();
        let out = dir.path().join("bad");

        assert!(gunzip_file(bad.to_str().unwrap(), None).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn writer_creates_parents_and_compresses() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out.txt.gz");
        let out = out.to_str().unwrap();

        let mut w = create_writer(out).unwrap();
        w.write_all(b"hello\n").unwrap();
        w.finish().unwrap();

        let mut text = String::new();
        open_reader(out).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello\n");
    }

    #[test]
    fn finish_writes_the_gzip_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.tsv.gz");
        let out = out.to_str().unwrap();

        let mut w = create_writer(out).unwrap();
        w.write_all(b"a\tb\n").unwrap();
        w.finish().unwrap();

        // the trailer ends with the uncompressed size, little endian
        let bytes = std::fs::read(out).unwrap();
        assert_eq!(&bytes[..2], &[0x1fu8, 0x8b]);
        assert_eq!(bytes[bytes.len() - 4..], 4u32.to_le_bytes());
    }

    #[test]
    fn plain_writer_is_flushed_by_finish() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.tsv");
        let out = out.to_str().unwrap();

        let mut w = create_writer(out).unwrap();
        w.write_all(b"a\tb\n").unwrap();
        w.finish().unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "a\tb\n");
    }

    #[test]
    fn missing_file_names_the_file() {
        match open_reader("/nonexistent/input.tsv") {
            Err(Error::FileIo { file, .. }) => assert_eq!(file, "/nonexistent/input.tsv"),
            _ => panic!("expected a file error"),
        }
    }
}
