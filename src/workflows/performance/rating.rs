use serde::Serialize;

use super::domain::{KraId, KraWeightage, ReviewEntry};

/// Raised when a rated KRA has no configured weightage. Silently skipping
/// the KRA would under-weight the composite, so the lookup fails loudly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("no weightage configured for KRA {}", kra_id.0)]
    MissingWeightage { kra_id: KraId },
}

/// One KRA's contribution to the composite score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KraScore {
    pub kra_id: KraId,
    pub kra_name: String,
    pub weightage: u16,
    pub weighted_rating: f64,
}

/// Weighted composite rating with its per-KRA audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub final_score: f64,
    pub breakdown: Vec<KraScore>,
}

impl RatingSummary {
    pub fn empty() -> Self {
        Self {
            final_score: 0.0,
            breakdown: Vec::new(),
        }
    }
}

/// Combine per-competency ratings into one weighted composite.
///
/// Ratings are grouped by KRA and averaged (a KRA rated through several
/// KPIs contributes one mean), then each mean is scaled by the KRA's
/// weightage percentage and rounded to two decimal places, ties to even.
/// The final score is the plain sum of the rounded contributions. The
/// breakdown follows the order of `weightages`.
pub fn weighted_score(
    entries: &[ReviewEntry],
    weightages: &[KraWeightage],
) -> Result<RatingSummary, RatingError> {
    if entries.is_empty() {
        return Ok(RatingSummary::empty());
    }

    for entry in entries {
        if !weightages.iter().any(|w| w.kra_id == entry.kra_id) {
            return Err(RatingError::MissingWeightage {
                kra_id: entry.kra_id.clone(),
            });
        }
    }

    let mut breakdown = Vec::new();
    let mut final_score = 0.0;

    for weightage in weightages {
        let ratings: Vec<f64> = entries
            .iter()
            .filter(|entry| entry.kra_id == weightage.kra_id)
            .map(|entry| f64::from(entry.rating))
            .collect();

        if ratings.is_empty() {
            continue;
        }

        let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
        // mean * weightage / 100 to two decimals equals (mean * weightage)
        // rounded to an integer, ties to even, divided by 100.
        let weighted_rating = (mean * f64::from(weightage.weightage)).round_ties_even() / 100.0;

        final_score += weighted_rating;
        breakdown.push(KraScore {
            kra_id: weightage.kra_id.clone(),
            kra_name: weightage.kra_name.clone(),
            weightage: weightage.weightage,
            weighted_rating,
        });
    }

    Ok(RatingSummary {
        final_score,
        breakdown,
    })
}
