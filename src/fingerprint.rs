//! SHA-256 fingerprints of feature lists and computed values.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{DfsError, DfsResult};
use crate::feature::Feature;

const SEP: &[u8] = b"\0";

/// Hex digest of a value's JSON form.
///
/// Used for [`FeatureMatrix::fingerprint`](crate::compute::FeatureMatrix::fingerprint),
/// where the serialized columns carry names, types and tagged values.
pub fn json_fingerprint<T: Serialize>(value: &T) -> DfsResult<String> {
    let json = serde_json::to_vec(value).map_err(|e| DfsError::DataShape(e.to_string()))?;
    Ok(hex_digest([json.as_slice()]))
}

/// Hash of the canonical names of a feature list, in order.
pub fn feature_fingerprint(features: &[Feature]) -> String {
    hex_digest(
        features
            .iter()
            .flat_map(|f| [f.entity().as_bytes(), SEP, f.name().as_bytes(), SEP]),
    )
}

fn hex_digest<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    format!("{:x}", hasher.finalize())
}
