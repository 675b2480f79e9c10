//! Compressed I/O handling for sequence and table files.
//!
//! Inputs may be plain or compressed (gzip, bzip2, xz, zstd) and are detected
//! automatically; `-` reads from stdin.

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

/// Opens a file with automatic compression detection.
///
/// # Examples
/// ```no_run
/// use algpred::io::open_maybe_compressed;
/// use std::io::BufRead;
///
/// let reader = open_maybe_compressed("proteins.fasta.gz")?;
/// for line in reader.lines() {
///     let _line = line?;
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open_maybe_compressed<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    // niffler autodetects gzip/bzip2/xz/zstd/uncompressed
    let (reader, _format) = niffler::get_reader(Box::new(file))?;
    Ok(Box::new(BufReader::new(reader)))
}

/// Creates a buffered reader from stdin for pipeline processing.
pub fn stdin_reader() -> Box<dyn BufRead> {
    Box::new(BufReader::new(io::stdin()))
}

/// Determines the appropriate reader for a given path or stdin (`-`).
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path_str = path.as_ref().to_string_lossy();
    if path_str == "-" {
        Ok(stdin_reader())
    } else {
        open_maybe_compressed(path)
    }
}

/// Reads the whole input (file or stdin) into memory.
///
/// Sequence inputs are small compared to the candidate sets derived from
/// them, and format detection needs to look ahead to the first non-blank line.
pub fn read_input<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let mut reader = open_input(path)?;
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Creates a buffered writer, truncating any existing file.
pub fn create_output<P: AsRef<Path>>(path: P) -> Result<Box<dyn Write>> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}
