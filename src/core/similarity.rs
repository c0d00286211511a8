use crate::error::MatchError;

/// Cosine similarity of two equal-length vectors, in [-1, 1]
///
/// Accumulates in f64. A zero-norm vector has no direction, so its
/// similarity to anything is 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, MatchError> {
    if a.len() != b.len() {
        return Err(MatchError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Ok(0.0);
    }

    Ok((dot / denominator).clamp(-1.0, 1.0))
}

/// Map a similarity in [-1, 1] onto an integer score in [0, 100]
#[inline]
pub fn to_score(similarity: f64) -> u8 {
    let scaled = ((similarity + 1.0) / 2.0) * 100.0;
    if scaled.is_nan() {
        return 50;
    }
    scaled.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = [0.3, -0.2, 0.9, 0.1];
        let s = cosine_similarity(&v, &v).unwrap();
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_opposite_vectors() {
        let v = [0.3f32, -0.2, 0.9];
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        let s = cosine_similarity(&v, &neg).unwrap();
        assert!((s + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_vectors_score_fifty() {
        let s = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(s, 0.0);
        assert_eq!(to_score(s), 50);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, MatchError::DimensionMismatch { left: 2, right: 3 }));
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_score_endpoints() {
        assert_eq!(to_score(-1.0), 0);
        assert_eq!(to_score(0.0), 50);
        assert_eq!(to_score(1.0), 100);
    }

    #[test]
    fn test_score_monotonic() {
        let mut previous = 0u8;
        for i in -100..=100 {
            let score = to_score(i as f64 / 100.0);
            assert!(score >= previous);
            previous = score;
        }
    }
}
