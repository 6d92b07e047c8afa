use litecut::{Buffer, Model, Operator, SplitError, SubGraph, Tensor, TensorType};

const CODEC_TEXT_FORM: &str = r#"{
  "version": 3,
  "operator_codes": [
    { "deprecated_builtin_code": 3, "version": 2, "builtin_code": "CONV_2D" },
    { "deprecated_builtin_code": 32, "builtin_code": "CUSTOM", "custom_code": "HandoffBuffer" }
  ],
  "subgraphs": [
    {
      "tensors": [
        {
          "shape": [1, 4, 4, 1],
          "type": "FLOAT32",
          "buffer": 0,
          "name": "input",
          "quantization": { "details_type": "NONE", "quantized_dimension": 0 },
          "is_variable": false,
          "has_rank": false
        },
        {
          "shape": [8],
          "type": "UINT8",
          "buffer": 1,
          "name": "conv_weight",
          "quantization": {
            "scale": [0.0039062],
            "zero_point": [128],
            "details_type": "NONE",
            "quantized_dimension": 0
          }
        },
        { "shape": [1, 4, 4, 8], "type": "FLOAT32", "buffer": 0, "name": "conv_out" }
      ],
      "inputs": [0],
      "outputs": [2],
      "operators": [
        {
          "opcode_index": 0,
          "inputs": [0, 1],
          "outputs": [2],
          "builtin_options_type": "Conv2DOptions",
          "builtin_options": { "padding": "SAME" },
          "custom_options_format": "FLEXBUFFERS"
        }
      ],
      "name": "main"
    }
  ],
  "description": "TOCO Converted.",
  "buffers": [ {}, { "data": [1, 2, 3, 4, 5, 6, 7, 8] } ]
}"#;

fn minimal_tensor(name: &str, buffer: u32) -> Tensor {
    Tensor {
        shape: vec![1],
        element_type: TensorType::Float32,
        buffer,
        name: Some(name.to_string()),
        quantization: None,
        is_variable: false,
        has_rank: false,
        shape_signature: None,
        sparsity: None,
    }
}

fn minimal_op(inputs: &[i32], outputs: &[i32]) -> Operator {
    Operator {
        opcode_index: 0,
        inputs: inputs.to_vec(),
        outputs: outputs.to_vec(),
        builtin_options_type: "NONE".to_string(),
        builtin_options: None,
        custom_options_format: "FLEXBUFFERS".to_string(),
        custom_options: None,
        mutating_variable_inputs: None,
        intermediates: None,
    }
}

fn minimal_model(subgraph: SubGraph) -> Model {
    Model {
        operator_codes: vec![litecut::OperatorCode::default()],
        subgraphs: vec![subgraph],
        buffers: vec![Buffer::default()],
        ..Model::default()
    }
}

#[test]
fn parses_codec_text_form() {
    let model = Model::from_json_str(CODEC_TEXT_FORM).expect("parse succeeds");

    assert_eq!(model.version, 3);
    assert_eq!(model.description, "TOCO Converted.");
    assert_eq!(model.operator_codes.len(), 2);
    assert_eq!(model.operator_codes[0].builtin_code.as_deref(), Some("CONV_2D"));
    assert_eq!(model.operator_codes[0].version, 2);
    assert_eq!(
        model.operator_codes[1].custom_code.as_deref(),
        Some("HandoffBuffer")
    );
    // Omitted version falls back to the schema default.
    assert_eq!(model.operator_codes[1].version, 1);

    let subgraph = model.primary_subgraph().expect("subgraph");
    assert_eq!(subgraph.name.as_deref(), Some("main"));
    assert_eq!(subgraph.tensors.len(), 3);
    assert_eq!(subgraph.tensors[0].element_type, TensorType::Float32);
    assert_eq!(subgraph.tensors[1].element_type, TensorType::Uint8);

    let quant = subgraph.tensors[1].quantization.as_ref().expect("quantization");
    assert_eq!(quant.scale, vec![0.0039062]);
    assert_eq!(quant.zero_point, vec![128]);
    assert_eq!(quant.details_type, "NONE");

    assert_eq!(subgraph.operators[0].builtin_options_type, "Conv2DOptions");
    assert_eq!(model.buffers.len(), 2);
    assert!(model.buffers[0].is_empty());
    assert_eq!(model.buffers[1].data, vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn round_trips_through_text_form() {
    let model = Model::from_json_str(CODEC_TEXT_FORM).expect("parse succeeds");
    let text = model.to_json_string().expect("serialize succeeds");
    let reparsed = Model::from_json_str(&text).expect("reparse succeeds");
    assert_eq!(model, reparsed);
}

#[test]
fn quantization_digits_survive_round_trip() {
    let model = Model::from_json_str(CODEC_TEXT_FORM).expect("parse succeeds");
    let text = model.to_json_string().expect("serialize succeeds");
    assert!(
        text.contains("0.0039062"),
        "source digit sequence must survive untouched until the fixup pass"
    );
}

#[test]
fn constant_time_lookup_by_index() {
    let model = Model::from_json_str(CODEC_TEXT_FORM).expect("parse succeeds");
    let subgraph = model.primary_subgraph().expect("subgraph");
    assert_eq!(subgraph.tensor(1).and_then(|t| t.name.as_deref()), Some("conv_weight"));
    assert!(subgraph.tensor(3).is_none());
    assert!(subgraph.tensor(-1).is_none());
}

#[test]
fn append_helpers_return_new_indices() {
    let mut model = Model::from_json_str(CODEC_TEXT_FORM).expect("parse succeeds");
    assert_eq!(model.push_buffer(Buffer::default()), 2);
    let subgraph = model.primary_subgraph_mut().expect("subgraph");
    assert_eq!(subgraph.push_tensor(minimal_tensor("extra", 2)), 3);
    model.validate().expect("still well-formed");
}

#[test]
fn rejects_out_of_range_operator_output() {
    let model = minimal_model(SubGraph {
        tensors: vec![minimal_tensor("input", 0), minimal_tensor("out", 0)],
        inputs: vec![0],
        outputs: vec![1],
        operators: vec![minimal_op(&[0], &[99])],
        name: None,
    });
    let err = model.validate().expect_err("must fail");
    assert!(matches!(err, SplitError::Parse(_)), "got {err}");
}

#[test]
fn rejects_out_of_range_buffer_reference() {
    let model = minimal_model(SubGraph {
        tensors: vec![minimal_tensor("input", 7)],
        inputs: vec![0],
        outputs: vec![0],
        operators: Vec::new(),
        name: None,
    });
    let err = model.validate().expect_err("must fail");
    assert!(matches!(err, SplitError::Parse(_)), "got {err}");
}

#[test]
fn rejects_out_of_range_subgraph_input() {
    let model = minimal_model(SubGraph {
        tensors: vec![minimal_tensor("input", 0)],
        inputs: vec![5],
        outputs: vec![0],
        operators: Vec::new(),
        name: None,
    });
    let err = model.validate().expect_err("must fail");
    assert!(matches!(err, SplitError::Parse(_)), "got {err}");
}

#[test]
fn rejects_out_of_range_opcode_index() {
    let model = minimal_model(SubGraph {
        tensors: vec![minimal_tensor("input", 0), minimal_tensor("out", 0)],
        inputs: vec![0],
        outputs: vec![1],
        operators: vec![Operator {
            opcode_index: 4,
            ..minimal_op(&[0], &[1])
        }],
        name: None,
    });
    let err = model.validate().expect_err("must fail");
    assert!(matches!(err, SplitError::Parse(_)), "got {err}");
}

#[test]
fn rejects_consumption_before_production() {
    let model = minimal_model(SubGraph {
        tensors: vec![
            minimal_tensor("input", 0),
            minimal_tensor("a", 0),
            minimal_tensor("b", 0),
        ],
        inputs: vec![0],
        outputs: vec![2],
        // The first operator reads tensor 2, which only the second produces.
        operators: vec![minimal_op(&[2], &[1]), minimal_op(&[1], &[2])],
        name: None,
    });
    let err = model.validate().expect_err("must fail");
    assert!(matches!(err, SplitError::Parse(_)), "got {err}");
}

#[test]
fn allows_optional_input_sentinel() {
    let model = minimal_model(SubGraph {
        tensors: vec![minimal_tensor("input", 0), minimal_tensor("out", 0)],
        inputs: vec![0],
        outputs: vec![1],
        operators: vec![minimal_op(&[0, -1], &[1])],
        name: None,
    });
    model.validate().expect("sentinel input is legal");
}

#[test]
fn rejects_malformed_json() {
    let err = Model::from_json_str("{ not json").expect_err("must fail");
    assert!(matches!(err, SplitError::Json(_)), "got {err}");
}

#[test]
fn primary_subgraph_missing_is_a_parse_error() {
    let err = Model::default().primary_subgraph().expect_err("must fail");
    assert!(matches!(err, SplitError::Parse(_)), "got {err}");
}
