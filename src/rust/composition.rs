//! Dipeptide composition (DPC) features.
//!
//! Column order is alphabet order on the first residue, then alphabet order
//! on the second (`AA, AC, ..., AY, CA, ..., YY`). A classifier consumes the
//! matrix positionally, so this layout has to match the layout the model was
//! trained on.

use std::io::Write;

use rayon::prelude::*;

use crate::alphabet::Alphabet;
use crate::errors::PipelineResult;

/// Prefix of every feature column name
pub const FEATURE_PREFIX: &str = "DPC1_";

/// Normalized dipeptide frequencies for one sequence
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Encodes sequences into dipeptide composition vectors
#[derive(Debug, Clone)]
pub struct DipeptideEncoder<'a> {
    alphabet: &'a Alphabet,
}

impl<'a> DipeptideEncoder<'a> {
    pub fn new(alphabet: &'a Alphabet) -> Self {
        Self { alphabet }
    }

    pub fn alphabet(&self) -> &Alphabet {
        self.alphabet
    }

    /// Number of feature columns
    pub fn dimension(&self) -> usize {
        self.alphabet.pair_count()
    }

    /// Column names in encoding order, e.g. `DPC1_AC`
    pub fn feature_names(&self) -> Vec<String> {
        let residues = self.alphabet.residues();
        residues
            .iter()
            .flat_map(|a| residues.iter().map(move |b| format!("{}{}{}", FEATURE_PREFIX, a, b)))
            .collect()
    }

    /// Column index of the dipeptide `(first, second)`
    pub fn pair_index(&self, first: char, second: char) -> Option<usize> {
        let a = self.alphabet.index_of(first)?;
        let b = self.alphabet.index_of(second)?;
        Some(a * self.alphabet.len() + b)
    }

    /// Dipeptide frequencies of `sequence`.
    ///
    /// Counts every adjacent pair and divides by `len - 1`. Sequences shorter
    /// than two residues give the all-zero vector. Pairs containing a residue
    /// outside the alphabet are not counted but still contribute to the
    /// denominator; validated sequences never contain one.
    pub fn encode(&self, sequence: &str) -> FeatureVector {
        let mut values = vec![0.0; self.dimension()];
        let bytes = sequence.as_bytes();
        let total = bytes.len().saturating_sub(1);
        if total == 0 {
            return FeatureVector { values };
        }

        let width = self.alphabet.len();
        for pair in bytes.windows(2) {
            if let (Some(a), Some(b)) =
                (self.alphabet.index_of_byte(pair[0]), self.alphabet.index_of_byte(pair[1]))
            {
                values[a * width + b] += 1.0;
            }
        }

        let denominator = total as f64;
        for value in values.iter_mut() {
            *value /= denominator;
        }
        FeatureVector { values }
    }

    /// Encode a batch in parallel; rows keep the input order
    pub fn encode_batch<S>(&self, sequences: &[S]) -> FeatureMatrix
    where
        S: AsRef<str> + Sync,
    {
        let dimension = self.dimension();
        let rows: Vec<Vec<f64>> =
            sequences.par_iter().map(|s| self.encode(s.as_ref()).into_values()).collect();

        let mut data = Vec::with_capacity(rows.len() * dimension);
        for row in rows {
            data.extend(row);
        }
        FeatureMatrix { columns: self.feature_names(), rows: sequences.len(), data }
    }
}

/// Row-major feature matrix with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let width = self.n_cols();
        &self.data[index * width..(index + 1) * width]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // chunks_exact panics on a zero width
        self.data.chunks_exact(self.n_cols().max(1))
    }

    /// Write the matrix as CSV: one header row of column names, one row per candidate
    pub fn write_csv<W: Write>(&self, writer: W) -> PipelineResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in self.iter_rows() {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
