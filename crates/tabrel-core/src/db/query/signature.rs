//! Query signatures discriminate cache entries produced by structurally
//! different filtered or sorted views of the same grouped relation.
#![expect(clippy::cast_possible_truncation)]

use crate::{db::query::SelectQuery, value::Value};
use sha2::{Digest, Sha256};
use std::fmt;

///
/// QuerySignature
///
/// SHA-256 over the rendered SQL text and its bound parameters.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct QuerySignature([u8; 32]);

impl QuerySignature {
    #[must_use]
    pub fn of(query: &SelectQuery) -> Self {
        Self::from_parts(&query.build_select_query(), &query.parameters())
    }

    #[must_use]
    pub fn from_parts(sql: &str, params: &[Value]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"qsig:v1");
        write_str(&mut hasher, sql);
        write_u32(&mut hasher, params.len() as u32);
        for value in params {
            write_value(&mut hasher, value);
        }

        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);

        Self(out)
    }
}

// Short hex prefix, enough for log lines.
impl fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

fn write_u32(hasher: &mut Sha256, x: u32) {
    hasher.update(x.to_be_bytes());
}

fn write_str(hasher: &mut Sha256, s: &str) {
    write_u32(hasher, s.len() as u32);
    hasher.update(s.as_bytes());
}

fn write_value(hasher: &mut Sha256, value: &Value) {
    hasher.update([value.canonical_tag().to_u8()]);

    match value {
        Value::Null => {}
        Value::Bool(v) => hasher.update([u8::from(*v)]),
        Value::Int(v) => hasher.update(i128::from(*v).to_be_bytes()),
        Value::Uint(v) => hasher.update(i128::from(*v).to_be_bytes()),
        Value::Float(v) => hasher.update(v.to_bits().to_be_bytes()),
        Value::Text(v) => write_str(hasher, v),
        Value::Blob(v) => {
            write_u32(hasher, v.len() as u32);
            hasher.update(v);
        }
    }
}
