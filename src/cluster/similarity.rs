//! Row similarity from shared and unique variable counts.
//!
//! For rows `r1`, `r2` with variable sets `V1`, `V2`:
//!
//! ```text
//! a = |V1 ∩ V2|      (shared)
//! b = |V2 \ V1|      (unique to r2)
//! c = |V1 \ V2|      (unique to r1)
//! ```
//!
//! | Measure | Similarity |
//! |---------|-----------|
//! | Intersection | a |
//! | Jaccard | a / (a + b + c) |
//! | Cosine | a / √((a + b)(a + c)) |
//! | Simpson | a / min(a + b, a + c) |
//! | Johnson | (a / (a + b) + a / (a + c)) / 2 |
//!
//! Distances are `1 - similarity`, except Intersection which uses
//! `1 / (1 + a)`. Zero denominators give similarity `0`.

/// Set-overlap measure between two rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimilarityMeasure {
    /// Count of shared variables.
    Intersection,
    /// Shared over union.
    #[default]
    Jaccard,
    /// Shared over the geometric mean of row sizes.
    Cosine,
    /// Shared over the smaller row size.
    Simpson,
    /// Mean of the shared fraction of each row.
    Johnson,
}

impl SimilarityMeasure {
    /// Every measure, in declaration order.
    pub const ALL: [SimilarityMeasure; 5] = [
        SimilarityMeasure::Intersection,
        SimilarityMeasure::Jaccard,
        SimilarityMeasure::Cosine,
        SimilarityMeasure::Simpson,
        SimilarityMeasure::Johnson,
    ];
}

/// Orientation of edge weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightType {
    /// Larger is more alike.
    Similarity,
    /// Smaller is more alike.
    #[default]
    Distance,
}

impl WeightType {
    /// Whether weight `w` is at least as close as threshold `eps`.
    #[inline]
    pub fn passes(self, w: f64, eps: f64) -> bool {
        match self {
            WeightType::Similarity => w >= eps,
            WeightType::Distance => w <= eps,
        }
    }
}

/// Score two rows from their shared count `a` and unique counts `b`, `c`.
///
/// With `itself` set, returns the identity value of the measure (`1.0`
/// similarity, or `a` for Intersection; `0.0` distance).
pub fn calculate_similarity(
    a: usize,
    b: usize,
    c: usize,
    measure: SimilarityMeasure,
    weight_type: WeightType,
    itself: bool,
) -> f64 {
    if itself {
        return match (weight_type, measure) {
            (WeightType::Distance, _) => 0.0,
            (WeightType::Similarity, SimilarityMeasure::Intersection) => a as f64,
            (WeightType::Similarity, _) => 1.0,
        };
    }

    let (a, b, c) = (a as f64, b as f64, c as f64);
    let sim = match measure {
        SimilarityMeasure::Intersection => a,
        SimilarityMeasure::Jaccard => ratio(a, a + b + c),
        SimilarityMeasure::Cosine => ratio(a, ((a + b) * (a + c)).sqrt()),
        SimilarityMeasure::Simpson => ratio(a, (a + b).min(a + c)),
        SimilarityMeasure::Johnson => (ratio(a, a + b) + ratio(a, a + c)) / 2.0,
    };

    match (weight_type, measure) {
        (WeightType::Similarity, _) => sim,
        (WeightType::Distance, SimilarityMeasure::Intersection) => 1.0 / (1.0 + sim),
        (WeightType::Distance, _) => 1.0 - sim,
    }
}

#[inline]
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_known_values() {
        // |V1| = 3, |V2| = 4, shared = 2
        let (a, b, c) = (2, 2, 1);
        let sim = |m| calculate_similarity(a, b, c, m, WeightType::Similarity, false);

        assert!((sim(SimilarityMeasure::Intersection) - 2.0).abs() < EPS);
        assert!((sim(SimilarityMeasure::Jaccard) - 0.4).abs() < EPS);
        assert!((sim(SimilarityMeasure::Cosine) - 2.0 / 12f64.sqrt()).abs() < EPS);
        assert!((sim(SimilarityMeasure::Simpson) - 2.0 / 3.0).abs() < EPS);
        assert!((sim(SimilarityMeasure::Johnson) - (0.5 + 2.0 / 3.0) / 2.0).abs() < EPS);
    }

    #[test]
    fn test_distance_orientation() {
        let d = calculate_similarity(
            1,
            1,
            1,
            SimilarityMeasure::Jaccard,
            WeightType::Distance,
            false,
        );
        assert!((d - 2.0 / 3.0).abs() < EPS);

        let d = calculate_similarity(
            3,
            0,
            0,
            SimilarityMeasure::Intersection,
            WeightType::Distance,
            false,
        );
        assert!((d - 0.25).abs() < EPS);
    }

    #[test]
    fn test_empty_rows_policy() {
        for m in SimilarityMeasure::ALL {
            let s = calculate_similarity(0, 0, 0, m, WeightType::Similarity, false);
            assert_eq!(s, 0.0, "{m:?}");
            let d = calculate_similarity(0, 0, 0, m, WeightType::Distance, false);
            assert!(d.is_finite(), "{m:?}");
        }
    }

    #[test]
    fn test_itself_identity() {
        for m in SimilarityMeasure::ALL {
            assert_eq!(
                calculate_similarity(0, 0, 0, m, WeightType::Distance, true),
                0.0
            );
        }
        assert_eq!(
            calculate_similarity(0, 0, 0, SimilarityMeasure::Cosine, WeightType::Similarity, true),
            1.0
        );
    }

    #[test]
    fn test_passes() {
        assert!(WeightType::Distance.passes(0.2, 0.3));
        assert!(!WeightType::Distance.passes(0.4, 0.3));
        assert!(WeightType::Similarity.passes(0.4, 0.3));
        assert!(WeightType::Similarity.passes(0.3, 0.3));
    }

    proptest! {
        #[test]
        fn itself_yields_maximum(a in 0usize..50) {
            for m in SimilarityMeasure::ALL {
                let top = calculate_similarity(a, a, 0, m, WeightType::Similarity, true);
                prop_assert!(top.is_finite());
                match m {
                    SimilarityMeasure::Intersection => prop_assert_eq!(top, a as f64),
                    _ => prop_assert_eq!(top, 1.0),
                }
            }
        }

        #[test]
        fn normalized_measures_stay_in_unit_interval(
            a in 0usize..30, b in 0usize..30, c in 0usize..30,
        ) {
            for m in SimilarityMeasure::ALL {
                let s = calculate_similarity(a, b, c, m, WeightType::Similarity, false);
                let d = calculate_similarity(a, b, c, m, WeightType::Distance, false);
                prop_assert!(s.is_finite() && d.is_finite());
                prop_assert!(s >= 0.0);
                prop_assert!(d >= 0.0 && d <= 1.0 + 1e-12);
                if m != SimilarityMeasure::Intersection {
                    prop_assert!(s <= 1.0 + 1e-12);
                }
            }
        }
    }
}
