//! Final result tables, one row per candidate in generation order.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::candidates::CandidateKind;
use crate::config::JobMode;
use crate::errors::{PipelineError, PipelineResult};
use crate::scorer::{Prediction, ScoredResult};

/// Prediction-mode row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    #[serde(rename = "Sequence_ID")]
    pub sequence_id: String,
    #[serde(rename = "Probability")]
    pub probability: f64,
    #[serde(rename = "Status")]
    pub status: Prediction,
}

/// Scan-mode row; `start` and `end` are 1-based inclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRow {
    #[serde(rename = "ParentSeq")]
    pub parent_seq: String,
    #[serde(rename = "Start")]
    pub start: usize,
    #[serde(rename = "End")]
    pub end: usize,
    #[serde(rename = "Peptide")]
    pub peptide: String,
    #[serde(rename = "Score")]
    pub score: f64,
    #[serde(rename = "Prediction")]
    pub prediction: Prediction,
}

/// Design-mode row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRow {
    #[serde(rename = "SeqID")]
    pub seq_id: String,
    #[serde(rename = "MutantID")]
    pub mutant_id: String,
    #[serde(rename = "Sequence")]
    pub sequence: String,
    #[serde(rename = "Score")]
    pub score: f64,
    #[serde(rename = "Prediction")]
    pub prediction: Prediction,
}

pub const PREDICTION_HEADERS: [&str; 3] = ["Sequence_ID", "Probability", "Status"];
pub const SCAN_HEADERS: [&str; 6] = ["ParentSeq", "Start", "End", "Peptide", "Score", "Prediction"];
pub const DESIGN_HEADERS: [&str; 5] = ["SeqID", "MutantID", "Sequence", "Score", "Prediction"];

#[derive(Debug, Clone, PartialEq)]
pub enum ResultTable {
    Prediction(Vec<PredictionRow>),
    Scan(Vec<ScanRow>),
    Design(Vec<DesignRow>),
}

fn unexpected_kind(mode: JobMode, kind: &CandidateKind) -> PipelineError {
    PipelineError::ValidationError {
        message: format!("{:?} candidate cannot appear in {} output", kind, mode),
    }
}

impl ResultTable {
    /// Join candidate provenance with scores for the given job mode
    pub fn assemble(mode: JobMode, results: &[ScoredResult]) -> PipelineResult<Self> {
        match mode {
            JobMode::Predict => results
                .iter()
                .map(|r| match &r.candidate.kind {
                    CandidateKind::Whole => Ok(PredictionRow {
                        sequence_id: r.candidate.parent_id.clone(),
                        probability: r.probability,
                        status: r.prediction,
                    }),
                    other => Err(unexpected_kind(mode, other)),
                })
                .collect::<PipelineResult<Vec<_>>>()
                .map(ResultTable::Prediction),
            JobMode::Scan => results
                .iter()
                .map(|r| match &r.candidate.kind {
                    CandidateKind::Window { start, end } => Ok(ScanRow {
                        parent_seq: r.candidate.parent_id.clone(),
                        start: *start,
                        end: *end,
                        peptide: r.candidate.sequence.clone(),
                        score: r.probability,
                        prediction: r.prediction,
                    }),
                    other => Err(unexpected_kind(mode, other)),
                })
                .collect::<PipelineResult<Vec<_>>>()
                .map(ResultTable::Scan),
            JobMode::Design => results
                .iter()
                .map(|r| {
                    let mutant_id = r
                        .candidate
                        .kind
                        .mutant_id()
                        .ok_or_else(|| unexpected_kind(mode, &r.candidate.kind))?;
                    Ok(DesignRow {
                        seq_id: r.candidate.parent_id.clone(),
                        mutant_id,
                        sequence: r.candidate.sequence.clone(),
                        score: r.probability,
                        prediction: r.prediction,
                    })
                })
                .collect::<PipelineResult<Vec<_>>>()
                .map(ResultTable::Design),
        }
    }

    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            ResultTable::Prediction(_) => &PREDICTION_HEADERS,
            ResultTable::Scan(_) => &SCAN_HEADERS,
            ResultTable::Design(_) => &DESIGN_HEADERS,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResultTable::Prediction(rows) => rows.len(),
            ResultTable::Scan(rows) => rows.len(),
            ResultTable::Design(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the table as CSV; the header row is written even for an empty table
    pub fn write_csv<W: Write>(&self, writer: W) -> PipelineResult<()> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(self.headers())?;
        match self {
            ResultTable::Prediction(rows) => {
                for row in rows {
                    csv_writer.serialize(row)?;
                }
            }
            ResultTable::Scan(rows) => {
                for row in rows {
                    csv_writer.serialize(row)?;
                }
            }
            ResultTable::Design(rows) => {
                for row in rows {
                    csv_writer.serialize(row)?;
                }
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::Candidate;

    fn scored(parent: &str, sequence: &str, kind: CandidateKind, probability: f64) -> ScoredResult {
        ScoredResult {
            candidate: Candidate {
                parent_id: parent.to_string(),
                sequence: sequence.to_string(),
                kind,
            },
            probability,
            prediction: if probability >= 0.5 {
                Prediction::Allergen
            } else {
                Prediction::NonAllergen
            },
        }
    }

    fn to_csv(table: &ResultTable) -> String {
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_prediction_table() {
        let results = vec![
            scored("s1", "ACDE", CandidateKind::Whole, 0.75),
            scored("s2", "KLMN", CandidateKind::Whole, 0.25),
        ];
        let table = ResultTable::assemble(JobMode::Predict, &results).unwrap();
        assert_eq!(
            to_csv(&table),
            "Sequence_ID,Probability,Status\ns1,0.75,Allergen\ns2,0.25,Non-Allergen\n"
        );
    }

    #[test]
    fn test_scan_table() {
        let results = vec![
            scored("A", "ACDEF", CandidateKind::Window { start: 1, end: 5 }, 0.5),
            scored("A", "GHIKL", CandidateKind::Window { start: 6, end: 10 }, 0.125),
        ];
        let table = ResultTable::assemble(JobMode::Scan, &results).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            to_csv(&table),
            "ParentSeq,Start,End,Peptide,Score,Prediction\n\
             A,1,5,ACDEF,0.5,Allergen\n\
             A,6,10,GHIKL,0.125,Non-Allergen\n"
        );
    }

    #[test]
    fn test_design_table() {
        let results = vec![
            scored("B", "AC", CandidateKind::Original, 0.5),
            scored(
                "B",
                "CC",
                CandidateKind::Mutant { position: 1, original: 'A', substitute: 'C' },
                0.0,
            ),
        ];
        let table = ResultTable::assemble(JobMode::Design, &results).unwrap();
        assert_eq!(
            to_csv(&table),
            "SeqID,MutantID,Sequence,Score,Prediction\n\
             B,original,AC,0.5,Allergen\n\
             B,mut1A>C,CC,0.0,Non-Allergen\n"
        );
    }

    #[test]
    fn test_empty_table_has_header() {
        let table = ResultTable::assemble(JobMode::Scan, &[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(to_csv(&table), "ParentSeq,Start,End,Peptide,Score,Prediction\n");
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let results = vec![scored("s1", "ACDE", CandidateKind::Whole, 0.75)];
        assert!(ResultTable::assemble(JobMode::Design, &results).is_err());
        assert!(ResultTable::assemble(JobMode::Scan, &results).is_err());
    }
}
