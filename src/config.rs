use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SplitError;
use crate::model::{Quantization, TensorType};
use crate::precision::FixupTable;

/// Everything the splitter needs to know about where and how to cut.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Index of the tensor whose value crosses the device boundary.
    pub cut_tensor: i32,
    /// Operators `[0, operator_split)` stay local; `[operator_split, n)`
    /// go remote.
    pub operator_split: usize,
    /// Opcode index (into the model's operator code table) used for the
    /// connector operator inserted on each side of the cut.
    pub connector_opcode: u32,
    /// The synthetic tensor carrying the activation across the boundary.
    pub boundary: BoundaryTensorSpec,
    /// Decimal literal corrections applied to quantization metadata before
    /// the text form is re-encoded.
    #[serde(default)]
    pub fixups: FixupTable,
}

impl SplitConfig {
    pub fn from_json_str(text: &str) -> Result<Self, SplitError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SplitError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Shape, element type, and quantization of the boundary tensor. Both output
/// graphs receive an identical copy; only its index differs per graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryTensorSpec {
    pub name: String,
    pub shape: Vec<i32>,
    #[serde(rename = "type", default)]
    pub element_type: TensorType,
    #[serde(default)]
    pub quantization: Quantization,
}
