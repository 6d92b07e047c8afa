use crate::config::BoundaryTensorSpec;
use crate::error::SplitError;
use crate::model::{Buffer, Model, Tensor};

/// Indices of the synthetic tensor/buffer pair appended to one output graph.
/// Indices are graph-local: the two outputs may disagree here even though
/// the tensor contents are identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryAttachment {
    pub tensor: i32,
    pub buffer: u32,
}

/// Appends one empty buffer and the synthetic boundary tensor to `model`'s
/// primary subgraph. Appending keeps every pre-existing index valid.
pub fn attach_boundary(
    model: &mut Model,
    spec: &BoundaryTensorSpec,
) -> Result<BoundaryAttachment, SplitError> {
    let buffer = model.push_buffer(Buffer::default());
    let subgraph = model.primary_subgraph_mut()?;
    let tensor = subgraph.push_tensor(Tensor {
        shape: spec.shape.clone(),
        element_type: spec.element_type,
        buffer,
        name: Some(spec.name.clone()),
        quantization: Some(spec.quantization.clone()),
        is_variable: false,
        has_rank: false,
        shape_signature: None,
        sparsity: None,
    });
    Ok(BoundaryAttachment { tensor, buffer })
}
