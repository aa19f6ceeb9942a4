//! Embedding storage and brute-force nearest-neighbour ranking.
//!
//! Vectors are stored as little-endian `f32` BLOBs.

/// Encode a vector for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB written by [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity; 0.0 for empty, mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

/// Rank candidates by similarity to `query`, best first, keeping at most
/// `limit`. Candidates of a different dimension are skipped.
pub fn rank<I>(query: &[f32], candidates: I, limit: usize) -> Vec<(String, f32)>
where
    I: IntoIterator<Item = (String, Vec<f32>)>,
{
    let mut scored: Vec<(String, f32)> = candidates
        .into_iter()
        .filter(|(_, v)| v.len() == query.len())
        .map(|(id, v)| {
            let score = cosine_similarity(query, &v);
            (id, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_layout() {
        let blob = vec_to_blob(&[1.0, -0.5]);
        assert_eq!(blob.len(), 8);
        assert_eq!(&blob[..4], &1.0f32.to_le_bytes());
        assert_eq!(blob_to_vec(&blob), vec![1.0, -0.5]);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_orders_and_limits() {
        let candidates = vec![
            ("east".to_string(), vec![1.0, 0.0]),
            ("north".to_string(), vec![0.0, 1.0]),
            ("north-east".to_string(), vec![1.0, 1.0]),
            ("wrong-dim".to_string(), vec![1.0, 0.0, 0.0]),
        ];

        let ranked = rank(&[0.1, 1.0], candidates, 2);

        let ids: Vec<_> = ranked.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["north", "north-east"]);
    }
}
