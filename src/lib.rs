mod boundary;
mod config;
mod cut;
mod error;
mod fingerprint;
mod model;
mod precision;
mod split;

pub use boundary::{attach_boundary, BoundaryAttachment};
pub use config::{BoundaryTensorSpec, SplitConfig};
pub use cut::{resolve_cut, ResolvedCut};
pub use error::SplitError;
pub use fingerprint::Fingerprint;
pub use model::{
    Buffer, Metadata, Model, Operator, OperatorCode, Quantization, SubGraph, Tensor, TensorType,
};
pub use precision::{Fixup, FixupTable};
pub use split::{
    split_from_json_file, split_from_json_str, split_model, BoundaryReport, SplitOutcome,
};
