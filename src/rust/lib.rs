//! Allergen prediction for proteins and peptides.
//!
//! Sequences are validated, expanded into candidates (whole sequences,
//! sliding windows or single-residue mutants), encoded as dipeptide
//! composition vectors and scored by a pre-trained [`model::Classifier`].

pub mod alphabet;
pub mod audit;
pub mod candidates;
pub mod composition;
pub mod config;
pub mod errors;
pub mod io;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod results;
pub mod scorer;
pub mod sequence;
pub mod types;

#[cfg(test)]
mod tests;

pub use crate::alphabet::Alphabet;
pub use crate::composition::DipeptideEncoder;
pub use crate::config::{JobMode, PipelineConfig};
pub use crate::errors::{PipelineError, PipelineResult};
pub use crate::model::{Classifier, ModelArtifact};
pub use crate::pipeline::run;

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;

    use crate::alphabet::Alphabet;
    use crate::candidates::{mutants_of, windows_of};
    use crate::composition::DipeptideEncoder;
    use crate::sequence::Sequence;
    use crate::types::{StepSize, WindowLength};

    fn to_py_err<E: std::fmt::Display>(e: E) -> PyErr {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
    }

    fn validated(id: &str, sequence: &str, alphabet: &Alphabet) -> PyResult<Sequence> {
        Sequence::new(id, sequence, alphabet)
            .map_err(|reason| to_py_err(format!("invalid sequence {}: {}", id, reason)))
    }

    /// DPC column names in encoding order
    #[pyfunction]
    fn dpc_feature_names() -> Vec<String> {
        let alphabet = Alphabet::standard();
        DipeptideEncoder::new(&alphabet).feature_names()
    }

    /// Dipeptide composition of one sequence
    #[pyfunction]
    fn dipeptide_composition(sequence: &str) -> PyResult<Vec<f64>> {
        let alphabet = Alphabet::standard();
        let sequence = validated("sequence", sequence, &alphabet)?;
        Ok(DipeptideEncoder::new(&alphabet).encode(sequence.residues()).into_values())
    }

    /// `(label, start, end, peptide)` for every window of a sequence
    #[pyfunction]
    #[pyo3(signature = (id, sequence, length, step=1))]
    fn sliding_windows(
        id: &str,
        sequence: &str,
        length: usize,
        step: usize,
    ) -> PyResult<Vec<(String, usize, usize, String)>> {
        let alphabet = Alphabet::standard();
        let sequence = validated(id, sequence, &alphabet)?;
        let length = WindowLength::new(length).map_err(to_py_err)?;
        let step = StepSize::new(step).map_err(to_py_err)?;
        Ok(windows_of(&sequence, length, step)
            .into_iter()
            .filter_map(|c| match c.kind {
                crate::candidates::CandidateKind::Window { start, end } => {
                    Some((c.label(), start, end, c.sequence))
                }
                _ => None,
            })
            .collect())
    }

    /// `(mutant id, sequence)` for the original and every point mutant
    #[pyfunction]
    fn point_mutants(id: &str, sequence: &str) -> PyResult<Vec<(String, String)>> {
        let alphabet = Alphabet::standard();
        let sequence = validated(id, sequence, &alphabet)?;
        Ok(mutants_of(&sequence, &alphabet)
            .into_iter()
            .map(|c| (c.kind.mutant_id().unwrap_or_default(), c.sequence))
            .collect())
    }

    #[pymodule]
    fn algpred(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(dpc_feature_names, m)?)?;
        m.add_function(wrap_pyfunction!(dipeptide_composition, m)?)?;
        m.add_function(wrap_pyfunction!(sliding_windows, m)?)?;
        m.add_function(wrap_pyfunction!(point_mutants, m)?)?;
        Ok(())
    }
}
