//! Sequence input: format detection, normalization and alphabet validation.
//!
//! Validation never touches the filesystem. Rejected records come back as a
//! [`Rejection`] report alongside the accepted sequences, and the caller
//! decides where to log them.

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::errors::{PipelineError, PipelineResult};

/// Marker written for sequences that are empty after normalization
pub const EMPTY_MARKER: &str = "<empty>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    Fasta,
    PlainText,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Fasta => write!(f, "FASTA"),
            InputFormat::PlainText => write!(f, "plain text"),
        }
    }
}

/// An unvalidated `(id, sequence)` pair as read from the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub id: String,
    pub sequence: String,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self { id: id.into(), sequence: sequence.into() }
    }
}

/// A validated sequence: non-empty, upper case, every residue in the alphabet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    id: String,
    residues: String,
}

impl Sequence {
    /// Normalize and validate a raw sequence against `alphabet`
    pub fn new(
        id: impl Into<String>,
        raw: &str,
        alphabet: &Alphabet,
    ) -> Result<Self, RejectionReason> {
        let residues = normalize(raw);
        if residues.is_empty() {
            return Err(RejectionReason::Empty);
        }
        let invalid = alphabet.invalid_residues(&residues);
        if !invalid.is_empty() {
            return Err(RejectionReason::InvalidResidues(invalid));
        }
        Ok(Self { id: id.into(), residues })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn residues(&self) -> &str {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Sorted, de-duplicated characters outside the alphabet
    InvalidResidues(Vec<char>),
    Empty,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::InvalidResidues(chars) => {
                let joined: Vec<String> = chars.iter().map(|c| c.to_string()).collect();
                write!(f, "{}", joined.join(", "))
            }
            RejectionReason::Empty => write!(f, "{}", EMPTY_MARKER),
        }
    }
}

/// A record excluded from downstream processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub id: String,
    pub reason: RejectionReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.reason)
    }
}

/// Parsed and validated input
#[derive(Debug, Clone)]
pub struct SequenceStore {
    format: InputFormat,
    sequences: Vec<Sequence>,
    rejections: Vec<Rejection>,
}

impl SequenceStore {
    /// Parse raw input bytes and validate every record
    pub fn from_bytes(input: &[u8], alphabet: &Alphabet) -> Self {
        let text = String::from_utf8_lossy(input);
        let format = detect_format(&text);
        let records = parse_records(&text, format);
        let (sequences, rejections) = validate(records, alphabet);
        Self { format, sequences, rejections }
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    /// Records read in total, accepted or not
    pub fn total(&self) -> usize {
        self.sequences.len() + self.rejections.len()
    }

    /// Fails when no sequence survived validation
    pub fn ensure_valid(&self) -> PipelineResult<&[Sequence]> {
        if self.sequences.is_empty() {
            Err(PipelineError::NoValidSequences)
        } else {
            Ok(&self.sequences)
        }
    }
}

/// FASTA if the first non-blank line starts with `>`, plain text otherwise
pub fn detect_format(text: &str) -> InputFormat {
    match text.lines().find(|line| !line.trim().is_empty()) {
        Some(line) if line.starts_with('>') => InputFormat::Fasta,
        _ => InputFormat::PlainText,
    }
}

/// Split input into records without validating them
pub fn parse_records(text: &str, format: InputFormat) -> Vec<RawRecord> {
    match format {
        InputFormat::Fasta => parse_fasta(text),
        InputFormat::PlainText => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, line)| RawRecord::new(format!("seq{}", i + 1), line))
            .collect(),
    }
}

/// Multi-line FASTA parser.
///
/// The id is the first whitespace-delimited token after `>`. Sequence lines
/// are trimmed and concatenated until the next header; lines before the first
/// header are ignored.
pub fn parse_fasta(text: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut current: Option<RawRecord> = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.take() {
                records.push(record);
            }
            let id = header.split_whitespace().next().unwrap_or("");
            current = Some(RawRecord::new(id, String::new()));
        } else if let Some(record) = current.as_mut() {
            record.sequence.push_str(line);
        }
    }

    if let Some(record) = current {
        records.push(record);
    }
    records
}

/// Upper-case and drop all whitespace
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_uppercase).collect()
}

/// Split records into accepted sequences and a rejection report, keeping input order
pub fn validate(
    records: Vec<RawRecord>,
    alphabet: &Alphabet,
) -> (Vec<Sequence>, Vec<Rejection>) {
    let mut sequences = Vec::with_capacity(records.len());
    let mut rejections = Vec::new();

    for record in records {
        match Sequence::new(record.id.clone(), &record.sequence, alphabet) {
            Ok(sequence) => sequences.push(sequence),
            Err(reason) => rejections.push(Rejection { id: record.id, reason }),
        }
    }

    (sequences, rejections)
}

/// Write `(id, sequence)` pairs as single-line FASTA records
pub fn write_fasta<'a, W, I>(writer: &mut W, records: I) -> std::io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (id, sequence) in records {
        writeln!(writer, ">{}\n{}", id, sequence)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_fixtures::{TEST_FASTA_CONTENT, TEST_PLAIN_CONTENT};

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(TEST_FASTA_CONTENT), InputFormat::Fasta);
        assert_eq!(detect_format("\n\n  \n>x\nAC"), InputFormat::Fasta);
        assert_eq!(detect_format(TEST_PLAIN_CONTENT), InputFormat::PlainText);
        assert_eq!(detect_format(""), InputFormat::PlainText);
    }

    #[test]
    fn test_parse_multiline_fasta() {
        let records = parse_fasta(">first desc here\nACD\n  EFG  \n>second\nKL\n\nMN\n");
        assert_eq!(
            records,
            vec![RawRecord::new("first", "ACDEFG"), RawRecord::new("second", "KLMN")]
        );
    }

    #[test]
    fn test_parse_fasta_ignores_leading_sequence_lines() {
        let records = parse_fasta("ACDE\n>only\nGH\n");
        assert_eq!(records, vec![RawRecord::new("only", "GH")]);
    }

    #[test]
    fn test_parse_plain_text_auto_ids() {
        let records = parse_records("ACDE\n\n  GHIK \nLMNP\n", InputFormat::PlainText);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["seq1", "seq2", "seq3"]);
        assert_eq!(records[1].sequence, "GHIK");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("ac de\tf\r"), "ACDEF");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_lowercase_is_accepted() {
        let alphabet = Alphabet::standard();
        let sequence = Sequence::new("low", "acdefghikl", &alphabet).unwrap();
        assert_eq!(sequence.residues(), "ACDEFGHIKL");
    }

    #[test]
    fn test_digits_are_rejected_and_reported() {
        let alphabet = Alphabet::standard();
        let reason = Sequence::new("dig", "AC1D9E1", &alphabet).unwrap_err();
        assert_eq!(reason, RejectionReason::InvalidResidues(vec!['1', '9']));
        assert_eq!(reason.to_string(), "1, 9");
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let alphabet = Alphabet::standard();
        let store = SequenceStore::from_bytes(b">a\n\n>b\nAC\n", &alphabet);

        assert_eq!(store.sequences().len(), 1);
        assert_eq!(store.sequences()[0].id(), "b");
        assert_eq!(store.rejections().len(), 1);
        assert_eq!(store.rejections()[0].reason, RejectionReason::Empty);
        assert_eq!(store.rejections()[0].to_string(), "a: <empty>");
        assert_eq!(store.total(), 2);
    }

    #[test]
    fn test_no_valid_sequences_is_fatal() {
        let alphabet = Alphabet::standard();
        let store = SequenceStore::from_bytes(b">x\nAC#\n>y\n123\n", &alphabet);
        assert!(matches!(store.ensure_valid(), Err(PipelineError::NoValidSequences)));
    }

    #[test]
    fn test_fasta_roundtrip() {
        let alphabet = Alphabet::standard();
        let pairs = vec![("alpha", "ACDEFGHIKLMNPQRSTVWY"), ("beta", "W"), ("gamma", "KKLL")];

        let mut buf = Vec::new();
        write_fasta(&mut buf, pairs.iter().copied()).unwrap();
        let store = SequenceStore::from_bytes(&buf, &alphabet);

        let parsed: Vec<(&str, &str)> =
            store.sequences().iter().map(|s| (s.id(), s.residues())).collect();
        assert_eq!(parsed, pairs);
        assert!(store.rejections().is_empty());
    }
}
