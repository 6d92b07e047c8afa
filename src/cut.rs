use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::model::Model;

/// Cut parameters checked against a concrete model.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedCut {
    pub cut_tensor: i32,
    pub split_at: usize,
    pub connector_opcode: u32,
}

/// Validates the cut configuration against `model` and produces the
/// descriptor consumed by the partitioner.
pub fn resolve_cut(model: &Model, config: &SplitConfig) -> Result<ResolvedCut, SplitError> {
    let subgraph = model.primary_subgraph()?;
    let tensor_count = subgraph.tensors.len();
    let op_count = subgraph.operators.len();

    if config.cut_tensor < 0 || config.cut_tensor as usize >= tensor_count {
        return Err(SplitError::invalid_cut(format!(
            "cut tensor index {} is out of range (graph has {tensor_count} tensors)",
            config.cut_tensor
        )));
    }
    if config.operator_split > op_count {
        return Err(SplitError::invalid_cut(format!(
            "operator split position {} is out of range (graph has {op_count} operators)",
            config.operator_split
        )));
    }
    if config.connector_opcode as usize >= model.operator_codes.len() {
        return Err(SplitError::invalid_cut(format!(
            "connector opcode index {} is out of range (model declares {} operator codes)",
            config.connector_opcode,
            model.operator_codes.len()
        )));
    }

    let spec = &config.boundary;
    if spec.shape.is_empty() || spec.shape.iter().any(|&dim| dim <= 0) {
        return Err(SplitError::invalid_cut(format!(
            "boundary tensor shape {:?} must be non-empty with positive dimensions",
            spec.shape
        )));
    }

    // A per-axis descriptor must agree with the shape it describes.
    let quant = &spec.quantization;
    if quant.scale.len() > 1 {
        let axis = quant.quantized_dimension as usize;
        if axis >= spec.shape.len() {
            return Err(SplitError::invalid_cut(format!(
                "quantized dimension {axis} exceeds boundary tensor rank {}",
                spec.shape.len()
            )));
        }
        if spec.shape[axis] as usize != quant.scale.len() {
            return Err(SplitError::invalid_cut(format!(
                "per-axis quantization carries {} scales but boundary dimension {axis} has size {}",
                quant.scale.len(),
                spec.shape[axis]
            )));
        }
    }
    if quant.zero_point.len() > 1 && quant.zero_point.len() != quant.scale.len() {
        return Err(SplitError::invalid_cut(format!(
            "quantization carries {} zero points but {} scales",
            quant.zero_point.len(),
            quant.scale.len()
        )));
    }

    Ok(ResolvedCut {
        cut_tensor: config.cut_tensor,
        split_at: config.operator_split,
        connector_opcode: config.connector_opcode,
    })
}
