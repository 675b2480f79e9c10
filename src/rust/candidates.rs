//! Candidate generation for the three job modes.
//!
//! Every generator keeps input order: candidates of the first sequence come
//! first, and within a sequence they follow position order.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::errors::{PipelineError, PipelineResult};
use crate::sequence::Sequence;
use crate::types::{StepSize, WindowLength};

/// Provenance of a candidate sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    /// The input sequence as-is (prediction mode)
    Whole,
    /// A sub-peptide; `start` and `end` are 1-based inclusive
    Window { start: usize, end: usize },
    /// The unmodified parent in design mode
    Original,
    /// A single substitution at 1-based `position`
    Mutant { position: usize, original: char, substitute: char },
}

impl CandidateKind {
    /// Mutant identifier used in design output: `original` or `mut<pos><orig>><new>`
    pub fn mutant_id(&self) -> Option<String> {
        match self {
            CandidateKind::Original => Some("original".to_string()),
            CandidateKind::Mutant { position, original, substitute } => {
                Some(format!("mut{}{}>{}", position, original, substitute))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub parent_id: String,
    pub sequence: String,
    pub kind: CandidateKind,
}

impl Candidate {
    /// Record label used in intermediate FASTA files
    pub fn label(&self) -> String {
        match &self.kind {
            CandidateKind::Whole => self.parent_id.clone(),
            CandidateKind::Window { start, end } => {
                format!("{}_{}_{}", self.parent_id, start, end)
            }
            CandidateKind::Original | CandidateKind::Mutant { .. } => {
                // mutant_id is always Some for these kinds
                format!("{}_{}", self.parent_id, self.kind.mutant_id().unwrap_or_default())
            }
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.label(), self.sequence)
    }
}

/// One candidate per sequence, unchanged
pub fn whole_sequences(sequences: &[Sequence]) -> Vec<Candidate> {
    sequences
        .iter()
        .map(|s| Candidate {
            parent_id: s.id().to_string(),
            sequence: s.residues().to_string(),
            kind: CandidateKind::Whole,
        })
        .collect()
}

/// Windows of one sequence at offsets `0, step, 2*step, ...` while the window fits
pub fn windows_of(sequence: &Sequence, length: WindowLength, step: StepSize) -> Vec<Candidate> {
    let residues = sequence.residues();
    let (w, s) = (length.get(), step.get());
    if residues.len() < w {
        return Vec::new();
    }

    (0..=residues.len() - w)
        .step_by(s)
        .map(|i| Candidate {
            parent_id: sequence.id().to_string(),
            sequence: residues[i..i + w].to_string(),
            kind: CandidateKind::Window { start: i + 1, end: i + w },
        })
        .collect()
}

/// Sliding-window scan over every sequence.
///
/// A sequence shorter than the window yields nothing; the run fails when no
/// sequence yields a window.
pub fn sliding_windows(
    sequences: &[Sequence],
    length: WindowLength,
    step: StepSize,
) -> PipelineResult<Vec<Candidate>> {
    let windows: Vec<Candidate> =
        sequences.iter().flat_map(|s| windows_of(s, length, step)).collect();
    if windows.is_empty() {
        return Err(PipelineError::NoWindowsGenerated(length.get()));
    }
    Ok(windows)
}

/// Number of windows `sliding_windows` produces for a sequence of `len` residues
pub fn expected_window_count(len: usize, length: WindowLength, step: StepSize) -> usize {
    if len < length.get() {
        0
    } else {
        (len - length.get()) / step.get() + 1
    }
}

/// The original followed by every single-residue substitution of one sequence.
///
/// Substitutes come in alphabet order and skip the residue already present,
/// giving `1 + (alphabet size - 1) * len` candidates.
pub fn mutants_of(sequence: &Sequence, alphabet: &Alphabet) -> Vec<Candidate> {
    let residues = sequence.residues();
    let parent_id = sequence.id();
    let mut candidates =
        Vec::with_capacity(1 + residues.len() * alphabet.len().saturating_sub(1));

    candidates.push(Candidate {
        parent_id: parent_id.to_string(),
        sequence: residues.to_string(),
        kind: CandidateKind::Original,
    });

    let mut buffer = residues.as_bytes().to_vec();
    for (i, original) in residues.char_indices() {
        for &substitute in alphabet.residues() {
            if substitute == original {
                continue;
            }
            // validated sequences are ASCII, one byte per residue
            buffer[i] = substitute as u8;
            candidates.push(Candidate {
                parent_id: parent_id.to_string(),
                sequence: String::from_utf8_lossy(&buffer).into_owned(),
                kind: CandidateKind::Mutant { position: i + 1, original, substitute },
            });
        }
        buffer[i] = original as u8;
    }

    candidates
}

/// Exhaustive point-mutation enumeration; each sequence is enumerated in parallel
pub fn point_mutants(sequences: &[Sequence], alphabet: &Alphabet) -> Vec<Candidate> {
    sequences.par_iter().map(|s| mutants_of(s, alphabet)).collect::<Vec<_>>().concat()
}
