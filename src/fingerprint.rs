use std::fmt::{self, Write};

use blake3::Hasher;

use crate::config::BoundaryTensorSpec;

/// Content hash of a boundary tensor description.
///
/// The two halves of a split travel to separate consumers; a matching
/// fingerprint confirms both artifacts were produced from the same cut.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of_boundary_spec(spec: &BoundaryTensorSpec) -> Self {
        let mut builder = FingerprintBuilder::new(b"boundary_tensor");
        builder.update_str(&spec.name);

        builder.update_u64(spec.shape.len() as u64);
        for dim in &spec.shape {
            builder.update_i64(i64::from(*dim));
        }
        builder.update_u64(spec.element_type as u64);

        let quant = &spec.quantization;
        builder.update_u64(quant.scale.len() as u64);
        for value in &quant.scale {
            builder.update_f64(*value);
        }
        builder.update_u64(quant.zero_point.len() as u64);
        for value in &quant.zero_point {
            builder.update_i64(*value);
        }
        builder.update_u64(quant.min.len() as u64);
        for value in &quant.min {
            builder.update_f64(*value);
        }
        builder.update_u64(quant.max.len() as u64);
        for value in &quant.max {
            builder.update_f64(*value);
        }
        builder.update_str(&quant.details_type);
        builder.update_u64(u64::from(quant.quantized_dimension));

        builder.finish()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut buf = String::with_capacity(64);
        for byte in self.0 {
            buf.write_fmt(format_args!("{:02x}", byte)).unwrap();
        }
        buf
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

struct FingerprintBuilder {
    hasher: Hasher,
}

impl FingerprintBuilder {
    fn new(tag: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(tag);
        FingerprintBuilder { hasher }
    }

    fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    fn update_str(&mut self, value: &str) {
        self.update_bytes(value.as_bytes());
    }

    fn update_u64(&mut self, value: u64) {
        self.update_bytes(&value.to_le_bytes());
    }

    fn update_i64(&mut self, value: i64) {
        self.update_u64(value as u64);
    }

    fn update_f64(&mut self, value: f64) {
        self.update_bytes(&value.to_le_bytes());
    }

    fn finish(self) -> Fingerprint {
        Fingerprint(self.hasher.finalize().into())
    }
}
