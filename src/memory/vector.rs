//! Embedding serialization and distance math.
//!
//! Vectors are persisted as packed little-endian `f32` blobs, the layout
//! sqlite-vec reads natively. Nothing outside the storage backends depends on
//! this encoding.

/// Encode an embedding as a packed little-endian `f32` blob.
pub fn to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Decode a blob produced by [`to_bytes`]. Returns `None` if the length is
/// not a multiple of four.
pub fn from_bytes(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

/// Cosine distance (`1 - cosine similarity`): `0.0` for identical direction,
/// up to `2.0` for opposite vectors.
///
/// Returns `None` when either vector has zero magnitude or the lengths
/// differ, matching sqlite-vec returning NULL for an undefined distance.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    let distance = 1.0 - dot / (norm_a.sqrt() * norm_b.sqrt());
    distance.is_finite().then_some(distance)
}

/// L2-normalize a vector. Returns a zero vector if the input norm is zero.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_layout_is_little_endian_f32() {
        let bytes = to_bytes(&[1.0, -2.5]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
        assert_eq!(from_bytes(&bytes), Some(vec![1.0, -2.5]));
    }

    #[test]
    fn truncated_blob_is_rejected() {
        assert_eq!(from_bytes(&[0, 0, 128]), None);
        assert_eq!(from_bytes(&[]), Some(vec![]));
    }

    #[test]
    fn cosine_distance_bounds() {
        let a = [1.0, 0.0];
        assert!(cosine_distance(&a, &[2.0, 0.0]).unwrap().abs() < 1e-9);
        assert!((cosine_distance(&a, &[0.0, 1.0]).unwrap() - 1.0).abs() < 1e-9);
        assert!((cosine_distance(&a, &[-1.0, 0.0]).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn undefined_distances_are_none() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), None);
    }

    #[test]
    fn test_l2_normalize() {
        let normalized = l2_normalize(&[3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
        assert_eq!(l2_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
