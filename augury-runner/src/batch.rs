//! Batch compute — many identities against one definition, in parallel.
//!
//! Input CSV: `subject,birth_date,name,locale` (name and locale may be empty).
//! Output CSV: one row per selected item,
//! `subject,birth_date,category,item_id,value,text`.
//!
//! Work is spread over rayon's pool; results keep input order and are
//! identical to a sequential run. The first failing row (by position) wins.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use augury_core::compute::{compute, fallback_locale, ComputeError, ComputeResult};
use augury_core::config::EngineConfig;
use augury_core::definition::ContentDefinition;
use augury_core::identity::{Identity, IdentityInput, InputError};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {source}")]
    Input {
        row: usize,
        #[source]
        source: InputError,
    },

    #[error("row {row}: {source}")]
    Compute {
        row: usize,
        #[source]
        source: ComputeError,
    },

    #[error("failed to flush output: {0}")]
    Flush(#[source] io::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    subject: String,
    birth_date: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

impl From<InputRow> for IdentityInput {
    fn from(row: InputRow) -> Self {
        IdentityInput {
            subject: row.subject,
            birth_date: row.birth_date,
            name: row.name.filter(|n| !n.trim().is_empty()),
            locale: row.locale.filter(|l| !l.trim().is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    subject: &'a str,
    birth_date: &'a str,
    category: &'a str,
    item_id: &'a str,
    value: u8,
    text: &'a str,
}

/// Totals for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub identities: usize,
    pub items: usize,
}

/// Parse identities from CSV with a header row.
pub fn read_identities<R: io::Read>(reader: R) -> Result<Vec<IdentityInput>, BatchError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize::<InputRow>()
        .map(|row| row.map(IdentityInput::from).map_err(BatchError::from))
        .collect()
}

fn compute_one(
    row: usize,
    input: &IdentityInput,
    definition: &ContentDefinition,
    config: &EngineConfig,
) -> Result<ComputeResult, BatchError> {
    let identity = Identity::from_input(input, fallback_locale(definition, config))
        .map_err(|source| BatchError::Input { row, source })?;
    compute(&identity, definition, config).map_err(|source| BatchError::Compute { row, source })
}

/// Compute every identity. Output order matches input order.
pub fn compute_batch(
    inputs: &[IdentityInput],
    definition: &ContentDefinition,
    config: &EngineConfig,
) -> Result<Vec<ComputeResult>, BatchError> {
    let outcomes: Vec<Result<ComputeResult, BatchError>> = inputs
        .par_iter()
        .enumerate()
        .map(|(i, input)| compute_one(i + 1, input, definition, config))
        .collect();
    outcomes.into_iter().collect()
}

/// Write the flat item table. Returns the number of rows written.
pub fn write_rows<W: io::Write>(
    writer: W,
    inputs: &[IdentityInput],
    results: &[ComputeResult],
) -> Result<usize, BatchError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for (input, result) in inputs.iter().zip(results) {
        for category in &result.categories {
            for item in &category.items {
                wtr.serialize(OutputRow {
                    subject: input.subject.trim(),
                    birth_date: input.birth_date.trim(),
                    category: &category.key,
                    item_id: &item.id,
                    value: item.value,
                    text: &item.text,
                })?;
                rows += 1;
            }
        }
    }
    wtr.flush().map_err(BatchError::Flush)?;
    Ok(rows)
}

/// Read `input`, compute against `definition`, write `output`.
pub fn run_batch(
    input: &Path,
    output: &Path,
    definition: &ContentDefinition,
    config: &EngineConfig,
) -> Result<BatchSummary, BatchError> {
    let file = std::fs::File::open(input).map_err(|source| BatchError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let inputs = read_identities(io::BufReader::new(file))?;
    let results = compute_batch(&inputs, definition, config)?;

    let out = std::fs::File::create(output).map_err(|source| BatchError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    let items = write_rows(io::BufWriter::new(out), &inputs, &results)?;

    info!(
        slug = %definition.slug,
        identities = inputs.len(),
        items,
        output = %output.display(),
        "batch complete"
    );
    Ok(BatchSummary {
        identities: inputs.len(),
        items,
    })
}
