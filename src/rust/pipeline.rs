//! End-to-end run: validate input, generate candidates, score, write tables.
//!
//! Nothing is written to the result or intermediate paths until scoring has
//! succeeded, so a fatal error leaves no partial output behind. The audit log
//! is the only file touched before that point.

use std::io::Write;
use std::time::Instant;

use log::{info, warn};

use crate::alphabet::Alphabet;
use crate::audit::AuditLog;
use crate::candidates::{point_mutants, sliding_windows, whole_sequences, Candidate};
use crate::composition::DipeptideEncoder;
use crate::config::{JobMode, PipelineConfig};
use crate::errors::{PipelineError, PipelineResult, PipelineResultExt};
use crate::io::{create_output, read_input};
use crate::metrics::{PerformanceTimer, RunMetrics};
use crate::model::{Classifier, ModelArtifact};
use crate::results::ResultTable;
use crate::scorer::{ScoredBatch, Scorer};
use crate::sequence::{write_fasta, Sequence, SequenceStore};

/// Everything a run produced, before it is written anywhere
#[derive(Debug)]
pub struct RunOutput {
    pub store: SequenceStore,
    pub batch: ScoredBatch,
    pub table: ResultTable,
}

/// Pick the generator for `config.job` and build the candidate set
pub fn generate_candidates(
    config: &PipelineConfig,
    sequences: &[Sequence],
    alphabet: &Alphabet,
) -> PipelineResult<Vec<Candidate>> {
    match config.job {
        JobMode::Predict => Ok(whole_sequences(sequences)),
        JobMode::Scan => {
            let length = config.window.ok_or(PipelineError::MissingWindowLength)?;
            sliding_windows(sequences, length, config.step)
        }
        JobMode::Design => Ok(point_mutants(sequences, alphabet)),
    }
}

/// Run the pipeline on in-memory input with a caller-supplied classifier.
///
/// Rejected records are handed to `audit` when one is given.
pub fn run_in_memory(
    config: &PipelineConfig,
    input: &[u8],
    classifier: &dyn Classifier,
    audit: Option<&AuditLog>,
) -> PipelineResult<RunOutput> {
    let alphabet = Alphabet::standard();

    let store = SequenceStore::from_bytes(input, &alphabet);
    info!("Input detected as {}", store.format());

    if !store.rejections().is_empty() {
        warn!("Removed {} sequences:", store.rejections().len());
        for rejection in store.rejections() {
            warn!("  {}", rejection);
        }
        if let Some(audit) = audit {
            audit.record_rejections(store.rejections())?;
        }
    }

    let sequences = store.ensure_valid()?;
    info!("{} valid sequences", sequences.len());

    let timer = PerformanceTimer::start("Candidate generation");
    let candidates = generate_candidates(config, sequences, &alphabet)?;
    timer.finish_and_log();
    info!("Generated {} candidates in {} mode", candidates.len(), config.job);

    let scorer = Scorer::new(DipeptideEncoder::new(&alphabet), classifier, config.threshold);
    let timer = PerformanceTimer::start("Scoring");
    let batch = scorer.score(candidates)?;
    timer.finish_and_log();

    let table = ResultTable::assemble(config.job, &batch.results)?;
    Ok(RunOutput { store, batch, table })
}

/// Write the cleaned FASTA, candidate FASTA and feature CSV
pub fn write_intermediates(config: &PipelineConfig, output: &RunOutput) -> PipelineResult<()> {
    let cleaned = config.cleaned_fasta_path();
    let mut writer = create_output(&cleaned)?;
    write_fasta(&mut writer, output.store.sequences().iter().map(|s| (s.id(), s.residues())))?;
    info!(
        "Cleaned FASTA saved: {} ({} valid sequences)",
        cleaned.display(),
        output.store.sequences().len()
    );

    if let Some(path) = config.candidates_fasta_path() {
        let labels: Vec<String> =
            output.batch.results.iter().map(|r| r.candidate.label()).collect();
        let mut writer = create_output(&path)?;
        write_fasta(
            &mut writer,
            labels
                .iter()
                .zip(&output.batch.results)
                .map(|(label, r)| (label.as_str(), r.candidate.sequence.as_str())),
        )?;
        info!("Candidate FASTA saved: {}", path.display());
    }

    let features = config.features_csv_path();
    output
        .batch
        .features
        .write_csv(create_output(&features)?)
        .with_context(|| format!("writing features to {}", features.display()))?;
    info!(
        "DPC features saved: {} ({} rows)",
        features.display(),
        output.batch.features.n_rows()
    );
    Ok(())
}

/// Full run from the configured input file and model artifact
pub fn run(config: &PipelineConfig) -> PipelineResult<RunMetrics> {
    let start = Instant::now();
    config.validate()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_thread_count())
        .build()
        .map_err(|e| PipelineError::ConfigurationError {
            field: "num_threads".to_string(),
            message: e.to_string(),
        })?;

    let audit = AuditLog::create(config.audit_log_path())?;
    let input = read_input(&config.input)?;

    let model_path = config.model_path();
    info!("Loading model: {}", model_path.display());
    let model = crate::time_operation!("Model loading", { ModelArtifact::load(&model_path)? });

    let output = pool.install(|| run_in_memory(config, &input, &model, Some(&audit)))?;

    if config.write_intermediates {
        write_intermediates(config, &output)?;
    }

    let output_path = config.output_path();
    let mut writer = create_output(&output_path)?;
    output.table.write_csv(&mut writer)?;
    writer.flush()?;
    info!("Results saved: {} ({} rows)", output_path.display(), output.table.len());

    let metrics = RunMetrics {
        sequences_read: output.store.total(),
        sequences_kept: output.store.sequences().len(),
        sequences_rejected: output.store.rejections().len(),
        candidates: output.batch.results.len(),
        allergens: output.batch.positives(),
        elapsed: start.elapsed(),
    };
    metrics.log_summary();
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::FeatureMatrix;
    use crate::tests::test_fixtures::TEST_FASTA_CONTENT;

    /// Probability = fraction of the first column (DPC1_AA) clamped into [0, 1]
    struct FirstColumn;

    impl Classifier for FirstColumn {
        fn predict_proba(&self, features: &FeatureMatrix) -> PipelineResult<Vec<f64>> {
            Ok(features.iter_rows().map(|row| row[0].clamp(0.0, 1.0)).collect())
        }
    }

    #[test]
    fn test_predict_mode() {
        let config = PipelineConfig::new("in.fa", JobMode::Predict);
        let output =
            run_in_memory(&config, b">a\nAAAA\n>b\nACAC\n>bad\nAC1\n", &FirstColumn, None).unwrap();

        assert_eq!(output.store.rejections().len(), 1);
        match output.table {
            ResultTable::Prediction(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].sequence_id, "a");
                assert_eq!(rows[0].probability, 1.0);
                assert_eq!(rows[1].status.to_string(), "Non-Allergen");
            }
            other => panic!("unexpected table {:?}", other),
        }
    }

    #[test]
    fn test_scan_mode_end_to_end() {
        let config = PipelineConfig::builder("in.fa", JobMode::Scan)
            .window_length(Some(5))
            .step(5)
            .build()
            .unwrap();
        let output = run_in_memory(&config, b">A\nACDEFGHIKL\n", &FirstColumn, None).unwrap();

        match output.table {
            ResultTable::Scan(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!((rows[0].start, rows[0].end, rows[0].peptide.as_str()), (1, 5, "ACDEF"));
                assert_eq!((rows[1].start, rows[1].end, rows[1].peptide.as_str()), (6, 10, "GHIKL"));
            }
            other => panic!("unexpected table {:?}", other),
        }
    }

    #[test]
    fn test_scan_mode_without_windows() {
        let config = PipelineConfig::builder("in.fa", JobMode::Scan)
            .window_length(Some(50))
            .build()
            .unwrap();
        let result = run_in_memory(&config, TEST_FASTA_CONTENT.as_bytes(), &FirstColumn, None);
        assert!(matches!(result, Err(PipelineError::NoWindowsGenerated(50))));
    }

    #[test]
    fn test_design_mode_row_count() {
        let config = PipelineConfig::new("in.fa", JobMode::Design);
        let output = run_in_memory(&config, b">B\nAC\n", &FirstColumn, None).unwrap();
        assert_eq!(output.table.len(), 1 + 19 * 2);
        assert_eq!(output.batch.features.n_rows(), 39);
    }

    #[test]
    fn test_no_valid_sequences() {
        let config = PipelineConfig::new("in.fa", JobMode::Predict);
        let result = run_in_memory(&config, b"123\n$$$\n", &FirstColumn, None);
        assert!(matches!(result, Err(PipelineError::NoValidSequences)));
    }
}
