use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::boundary::{attach_boundary, BoundaryAttachment};
use crate::config::SplitConfig;
use crate::cut::{resolve_cut, ResolvedCut};
use crate::error::SplitError;
use crate::fingerprint::Fingerprint;
use crate::model::{Model, Operator, SubGraph};

/// The two self-consistent halves of a split graph, plus the boundary
/// bookkeeping their consumers need to stitch them back together.
#[derive(Clone, Debug)]
pub struct SplitOutcome {
    pub local: Model,
    pub remote: Model,
    pub boundary: BoundaryReport,
}

#[derive(Clone, Copy, Debug)]
pub struct BoundaryReport {
    /// Original tensor whose value crosses the boundary.
    pub cut_tensor: i32,
    pub local: BoundaryAttachment,
    pub remote: BoundaryAttachment,
    /// Hash of the synthetic tensor description, identical on both sides.
    pub fingerprint: Fingerprint,
}

pub fn split_from_json_file<P: AsRef<Path>>(
    path: P,
    config: &SplitConfig,
) -> Result<SplitOutcome, SplitError> {
    let text = fs::read_to_string(path)?;
    split_from_json_str(&text, config)
}

pub fn split_from_json_str(
    text: &str,
    config: &SplitConfig,
) -> Result<SplitOutcome, SplitError> {
    let model = Model::from_json_str(text)?;
    split_model(&model, config)
}

/// Splits `model` into a local graph (original inputs → cut tensor) and a
/// remote graph (cut tensor → original outputs). `model` is not modified;
/// each half owns its own appended boundary entities.
pub fn split_model(model: &Model, config: &SplitConfig) -> Result<SplitOutcome, SplitError> {
    // Callers may hand a hand-built model that never went through load.
    model.validate()?;
    let cut = resolve_cut(model, config)?;
    ensure_single_edge_cut(model.primary_subgraph()?, &cut)?;

    log::debug!(
        "splitting {} operators at position {} around tensor {}",
        model.primary_subgraph()?.operators.len(),
        cut.split_at,
        cut.cut_tensor
    );

    let (mut local, local_attachment) = build_local(model, config, &cut)?;
    let (mut remote, remote_attachment) = build_remote(model, config, &cut)?;

    let corrected = config.fixups.apply(&mut local)? + config.fixups.apply(&mut remote)?;
    if corrected > 0 {
        log::debug!("corrected {corrected} quantization literals");
    }

    local.validate()?;
    remote.validate()?;

    Ok(SplitOutcome {
        local,
        remote,
        boundary: BoundaryReport {
            cut_tensor: cut.cut_tensor,
            local: local_attachment,
            remote: remote_attachment,
            fingerprint: Fingerprint::of_boundary_spec(&config.boundary),
        },
    })
}

fn build_local(
    model: &Model,
    config: &SplitConfig,
    cut: &ResolvedCut,
) -> Result<(Model, BoundaryAttachment), SplitError> {
    let mut local = model.clone();
    let attachment = attach_boundary(&mut local, &config.boundary)?;
    let subgraph = local.primary_subgraph_mut()?;

    subgraph.operators.truncate(cut.split_at);
    // The connector consumes the cut value the retained operators produce,
    // so it must come after all of them.
    subgraph.operators.push(connector(
        cut.connector_opcode,
        cut.cut_tensor,
        attachment.tensor,
    ));
    subgraph.outputs = vec![attachment.tensor];

    Ok((local, attachment))
}

fn build_remote(
    model: &Model,
    config: &SplitConfig,
    cut: &ResolvedCut,
) -> Result<(Model, BoundaryAttachment), SplitError> {
    let mut remote = model.clone();
    let attachment = attach_boundary(&mut remote, &config.boundary)?;
    let subgraph = remote.primary_subgraph_mut()?;

    subgraph.operators = subgraph.operators.split_off(cut.split_at);
    // The connector produces the cut value the retained operators consume,
    // so it must come before all of them.
    subgraph.operators.insert(
        0,
        connector(cut.connector_opcode, attachment.tensor, cut.cut_tensor),
    );
    subgraph.inputs = vec![attachment.tensor];

    Ok((remote, attachment))
}

/// Identity/handoff operator inserted at the cut edge: no builtin options,
/// raw-flexible-buffer custom options format.
fn connector(opcode_index: u32, input: i32, output: i32) -> Operator {
    Operator {
        opcode_index,
        inputs: vec![input],
        outputs: vec![output],
        builtin_options_type: "NONE".to_string(),
        builtin_options: None,
        custom_options_format: "FLEXBUFFERS".to_string(),
        custom_options: None,
        mutating_variable_inputs: None,
        intermediates: None,
    }
}

/// Verifies the chosen cut is a genuine single-edge boundary: the only value
/// crossing between the partitions is the cut tensor. Constants and variables
/// do not cross because both halves retain the full tensor and buffer
/// sequences.
fn ensure_single_edge_cut(subgraph: &SubGraph, cut: &ResolvedCut) -> Result<(), SplitError> {
    let mut producer: Vec<Option<usize>> = vec![None; subgraph.tensors.len()];
    for (op_index, op) in subgraph.operators.iter().enumerate() {
        for &output in &op.outputs {
            producer[output as usize] = Some(op_index);
        }
    }
    let graph_inputs: HashSet<i32> = subgraph.inputs.iter().copied().collect();

    match producer[cut.cut_tensor as usize] {
        Some(op_index) if op_index >= cut.split_at => {
            return Err(SplitError::partition(format!(
                "cut tensor {} is produced by operator {op_index}, which falls in the remote partition",
                cut.cut_tensor
            )));
        }
        None if !graph_inputs.contains(&cut.cut_tensor) => {
            return Err(SplitError::partition(format!(
                "cut tensor {} has no producer and is not a graph input",
                cut.cut_tensor
            )));
        }
        _ => {}
    }

    for (op_index, op) in subgraph.operators.iter().enumerate().skip(cut.split_at) {
        for &input in &op.inputs {
            if input == -1 || input == cut.cut_tensor {
                continue;
            }
            if let Some(producer_index) = producer[input as usize] {
                if producer_index < cut.split_at {
                    return Err(SplitError::partition(format!(
                        "operator {op_index} consumes tensor {input} produced by local operator {producer_index}; only the cut tensor may cross the boundary"
                    )));
                }
            } else if graph_inputs.contains(&input) {
                return Err(SplitError::partition(format!(
                    "operator {op_index} consumes graph input {input}, which is only fed on the local side"
                )));
            }
        }
    }

    for &output in &subgraph.outputs {
        if output == cut.cut_tensor {
            continue;
        }
        match producer[output as usize] {
            Some(op_index) if op_index >= cut.split_at => {}
            Some(op_index) => {
                return Err(SplitError::partition(format!(
                    "graph output {output} is produced by local operator {op_index} and would be stranded"
                )));
            }
            None => {
                return Err(SplitError::partition(format!(
                    "graph output {output} is not produced by any remote operator"
                )));
            }
        }
    }

    Ok(())
}
