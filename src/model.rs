use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SplitError;

/// Element type of a tensor. Discriminants and serialized names follow the
/// schema's `TensorType` enum as it appears in the codec's text form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TensorType {
    #[default]
    Float32 = 0,
    Float16 = 1,
    Int32 = 2,
    Uint8 = 3,
    Int64 = 4,
    String = 5,
    Bool = 6,
    Int16 = 7,
    Complex64 = 8,
    Int8 = 9,
    Float64 = 10,
    Complex128 = 11,
    Uint64 = 12,
    Resource = 13,
    Variant = 14,
    Uint32 = 15,
    Uint16 = 16,
    Int4 = 17,
    Bfloat16 = 18,
}

/// Per-tensor scale/zero-point descriptors. `scale`, `min`, and `max` are
/// kept as f64 so the digit sequences produced by the text codec survive a
/// round-trip unchanged unless the precision fixup pass rewrites them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantization {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub min: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub max: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zero_point: Vec<i64>,
    #[serde(default = "default_details_type")]
    pub details_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub quantized_dimension: u32,
}

impl Default for Quantization {
    fn default() -> Self {
        Quantization {
            min: Vec::new(),
            max: Vec::new(),
            scale: Vec::new(),
            zero_point: Vec::new(),
            details_type: default_details_type(),
            details: None,
            quantized_dimension: 0,
        }
    }
}

/// Raw storage backing a tensor. Empty for runtime-computed tensors,
/// populated with constant data for weights.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Buffer {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u8>,
}

impl Buffer {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shape: Vec<i32>,
    #[serde(rename = "type", default)]
    pub element_type: TensorType,
    #[serde(default)]
    pub buffer: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<Quantization>,
    #[serde(default)]
    pub is_variable: bool,
    #[serde(default)]
    pub has_rank: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_signature: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparsity: Option<serde_json::Value>,
}

/// One computation node. Input/output entries index into the owning
/// subgraph's tensor sequence; `-1` marks an omitted optional input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    #[serde(default)]
    pub opcode_index: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<i32>,
    #[serde(default = "default_options_type")]
    pub builtin_options_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_options: Option<serde_json::Value>,
    #[serde(default = "default_custom_options_format")]
    pub custom_options_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_options: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutating_variable_inputs: Option<Vec<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediates: Option<Vec<i32>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperatorCode {
    #[serde(default)]
    pub deprecated_builtin_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_code: Option<String>,
    #[serde(default = "default_opcode_version")]
    pub version: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<String>,
}

impl Default for OperatorCode {
    fn default() -> Self {
        OperatorCode {
            deprecated_builtin_code: 0,
            builtin_code: None,
            version: default_opcode_version(),
            custom_code: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub buffer: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubGraph {
    #[serde(default)]
    pub tensors: Vec<Tensor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<i32>,
    #[serde(default)]
    pub operators: Vec<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SubGraph {
    /// Constant-time lookup by positional index.
    pub fn tensor(&self, index: i32) -> Option<&Tensor> {
        usize::try_from(index).ok().and_then(|i| self.tensors.get(i))
    }

    /// Appends a tensor and returns its index. Existing indices are never
    /// renumbered.
    pub fn push_tensor(&mut self, tensor: Tensor) -> i32 {
        self.tensors.push(tensor);
        (self.tensors.len() - 1) as i32
    }

    fn validate(
        &self,
        subgraph_index: usize,
        opcode_count: usize,
        buffers: &[Buffer],
    ) -> Result<(), SplitError> {
        let tensor_count = self.tensors.len();

        for (index, tensor) in self.tensors.iter().enumerate() {
            if tensor.buffer as usize >= buffers.len() {
                return Err(SplitError::parse(format!(
                    "tensor {index} in subgraph {subgraph_index} references buffer {} but the model has {} buffers",
                    tensor.buffer,
                    buffers.len()
                )));
            }
        }

        let in_range = |value: i32| (value as usize) < tensor_count && value >= 0;
        for &input in &self.inputs {
            if !in_range(input) {
                return Err(SplitError::parse(format!(
                    "subgraph {subgraph_index} input {input} is out of range ({tensor_count} tensors)"
                )));
            }
        }
        for &output in &self.outputs {
            if !in_range(output) {
                return Err(SplitError::parse(format!(
                    "subgraph {subgraph_index} output {output} is out of range ({tensor_count} tensors)"
                )));
            }
        }

        // Operator inputs must be graph inputs, constants, variables, or
        // outputs of an earlier operator.
        let mut available = vec![false; tensor_count];
        for &input in &self.inputs {
            available[input as usize] = true;
        }
        for (index, tensor) in self.tensors.iter().enumerate() {
            if tensor.is_variable || !buffers[tensor.buffer as usize].is_empty() {
                available[index] = true;
            }
        }

        for (op_index, op) in self.operators.iter().enumerate() {
            if op.opcode_index as usize >= opcode_count {
                return Err(SplitError::parse(format!(
                    "operator {op_index} in subgraph {subgraph_index} references opcode {} but the model declares {opcode_count} operator codes",
                    op.opcode_index
                )));
            }
            for &input in &op.inputs {
                if input == -1 {
                    continue;
                }
                if !in_range(input) {
                    return Err(SplitError::parse(format!(
                        "operator {op_index} in subgraph {subgraph_index} input {input} is out of range ({tensor_count} tensors)"
                    )));
                }
                if !available[input as usize] {
                    return Err(SplitError::parse(format!(
                        "operator {op_index} in subgraph {subgraph_index} consumes tensor {input} before it is produced"
                    )));
                }
            }
            for &output in &op.outputs {
                if !in_range(output) {
                    return Err(SplitError::parse(format!(
                        "operator {op_index} in subgraph {subgraph_index} output {output} is out of range ({tensor_count} tensors)"
                    )));
                }
                available[output as usize] = true;
            }
        }

        Ok(())
    }
}

/// One model in the codec's text form: operator codes, buffers, and one or
/// more subgraphs. Buffers are model-level and shared across subgraphs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default = "default_model_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operator_codes: Vec<OperatorCode>,
    #[serde(default)]
    pub subgraphs: Vec<SubGraph>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub buffers: Vec<Buffer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_buffer: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<Metadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature_defs: Vec<serde_json::Value>,
}

impl Default for Model {
    fn default() -> Self {
        Model {
            version: default_model_version(),
            operator_codes: Vec::new(),
            subgraphs: Vec::new(),
            description: String::new(),
            buffers: Vec::new(),
            metadata_buffer: Vec::new(),
            metadata: Vec::new(),
            signature_defs: Vec::new(),
        }
    }
}

impl Model {
    /// Parses the codec's JSON text form and validates index consistency.
    pub fn from_json_str(text: &str) -> Result<Self, SplitError> {
        let model: Model = serde_json::from_str(text)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SplitError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes back to the text form handed to the external codec for
    /// binary encoding.
    pub fn to_json_string(&self) -> Result<String, SplitError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn primary_subgraph(&self) -> Result<&SubGraph, SplitError> {
        self.subgraphs
            .first()
            .ok_or_else(|| SplitError::parse("model has no subgraphs"))
    }

    pub fn primary_subgraph_mut(&mut self) -> Result<&mut SubGraph, SplitError> {
        self.subgraphs
            .first_mut()
            .ok_or_else(|| SplitError::parse("model has no subgraphs"))
    }

    /// Appends a buffer and returns its index. Existing indices are never
    /// renumbered.
    pub fn push_buffer(&mut self, buffer: Buffer) -> u32 {
        self.buffers.push(buffer);
        (self.buffers.len() - 1) as u32
    }

    /// Checks that every index referenced by an operator, input/output list,
    /// or metadata entry resolves within its sequence, and that operators
    /// appear in producer-before-consumer order.
    pub fn validate(&self) -> Result<(), SplitError> {
        let opcode_count = self.operator_codes.len();
        for (subgraph_index, subgraph) in self.subgraphs.iter().enumerate() {
            subgraph.validate(subgraph_index, opcode_count, &self.buffers)?;
        }
        for entry in &self.metadata {
            if entry.buffer as usize >= self.buffers.len() {
                return Err(SplitError::parse(format!(
                    "metadata `{}` references buffer {} but the model has {} buffers",
                    entry.name,
                    entry.buffer,
                    self.buffers.len()
                )));
            }
        }
        Ok(())
    }
}

fn default_model_version() -> u32 {
    3
}

fn default_opcode_version() -> i32 {
    1
}

fn default_details_type() -> String {
    "NONE".to_string()
}

fn default_options_type() -> String {
    "NONE".to_string()
}

fn default_custom_options_format() -> String {
    "FLEXBUFFERS".to_string()
}
