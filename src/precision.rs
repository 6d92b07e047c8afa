use serde::{Deserialize, Serialize};

use crate::error::SplitError;
use crate::model::Model;

/// One decimal literal correction: the exact digit sequence a lossy text
/// round-trip produced, and the full-precision sequence it stands for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixup {
    pub source: String,
    pub corrected: String,
}

/// Corrections applied to quantization fields after a lossy text round-trip.
///
/// The table is configuration, not inference: only values whose shortest
/// decimal rendering matches a `source` entry exactly are touched, so digit
/// sequences that merely resemble a truncated constant are left alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixupTable {
    entries: Vec<Fixup>,
}

impl FixupTable {
    pub fn new(entries: Vec<Fixup>) -> Result<Self, SplitError> {
        let table = FixupTable { entries };
        table.check()?;
        Ok(table)
    }

    /// The truncated power-of-two reciprocal scale seen in practice: 1/256
    /// printed with seven significant digits.
    pub fn pow2_reciprocal_defaults() -> Self {
        FixupTable {
            entries: vec![Fixup {
                source: "0.0039062".to_string(),
                corrected: "0.00390625".to_string(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self) -> Result<(), SplitError> {
        for entry in &self.entries {
            if entry.source == entry.corrected {
                return Err(SplitError::invalid_fixup(format!(
                    "entry `{}` maps to itself",
                    entry.source
                )));
            }
            let value: f64 = entry.corrected.parse().map_err(|_| {
                SplitError::invalid_fixup(format!(
                    "corrected literal `{}` is not a decimal number",
                    entry.corrected
                ))
            })?;
            if format_literal(value) != entry.corrected {
                return Err(SplitError::invalid_fixup(format!(
                    "corrected literal `{}` does not round-trip through its binary representation",
                    entry.corrected
                )));
            }
            if f64::from(value as f32) != value {
                return Err(SplitError::invalid_fixup(format!(
                    "corrected literal `{}` is not exactly representable as a 32-bit float",
                    entry.corrected
                )));
            }
            if self.entries.iter().any(|other| other.source == entry.corrected) {
                return Err(SplitError::invalid_fixup(format!(
                    "corrected literal `{}` collides with a source entry, so the table would not be idempotent",
                    entry.corrected
                )));
            }
        }
        Ok(())
    }

    /// Rewrites matching `scale`/`min`/`max` values in every quantization
    /// descriptor of `model`, returning the number of corrections made.
    /// Running it again on the result is a no-op.
    pub fn apply(&self, model: &mut Model) -> Result<usize, SplitError> {
        self.check()?;
        if self.entries.is_empty() {
            return Ok(0);
        }

        let mut corrected = 0;
        for subgraph in &mut model.subgraphs {
            for tensor in &mut subgraph.tensors {
                let Some(quantization) = tensor.quantization.as_mut() else {
                    continue;
                };
                let values = quantization
                    .scale
                    .iter_mut()
                    .chain(quantization.min.iter_mut())
                    .chain(quantization.max.iter_mut());
                for value in values {
                    corrected += self.fix_value(value);
                }
            }
        }
        Ok(corrected)
    }

    fn fix_value(&self, value: &mut f64) -> usize {
        let rendered = format_literal(*value);
        for entry in &self.entries {
            if rendered == entry.source {
                if let Ok(parsed) = entry.corrected.parse::<f64>() {
                    *value = parsed;
                    return 1;
                }
            }
        }
        0
    }
}

/// Shortest decimal rendering that round-trips, matching what the JSON
/// serializer emits for the value.
fn format_literal(value: f64) -> String {
    format!("{}", value)
}
