//! AHP-style priority scoring.
//!
//! A task is rated on three criteria (urgency, grade weight and difficulty),
//! each on a 1-5 scale. The score is the weighted average of the ratings
//! scaled to [0, 1], using weights normalized by their sum, rounded to two
//! decimals.

use std::ops::RangeInclusive;

use thiserror::Error;

pub const RATING_RANGE: RangeInclusive<u8> = 1..=5;

const RATING_SCALE: f64 = 5.0;

/// Relative importance of each criterion. The raw values do not need to sum
/// to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub urgency: f64,
    pub grade: f64,
    pub difficulty: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            urgency: 0.4,
            grade: 0.35,
            difficulty: 0.25,
        }
    }
}

impl Weights {
    pub fn total(&self) -> f64 {
        self.urgency + self.grade + self.difficulty
    }

    /// Weights divided by their sum.
    pub fn normalized(&self) -> Result<Weights, ScoreError> {
        let all_valid = [self.urgency, self.grade, self.difficulty]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0);
        let total = self.total();
        if !all_valid || !total.is_finite() || total <= 0.0 {
            return Err(ScoreError::InvalidWeights {
                urgency: self.urgency,
                grade: self.grade,
                difficulty: self.difficulty,
            });
        }

        Ok(Weights {
            urgency: self.urgency / total,
            grade: self.grade / total,
            difficulty: self.difficulty / total,
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error(
        "Invalid priority weights (urgency {urgency}, grade {grade}, difficulty {difficulty}): weights must be non-negative and add up to more than zero"
    )]
    InvalidWeights {
        urgency: f64,
        grade: f64,
        difficulty: f64,
    },

    #[error("{criterion} rating {value} is outside the 1-5 scale")]
    RatingOutOfRange { criterion: &'static str, value: u8 },
}

pub fn validate_rating(criterion: &'static str, value: u8) -> Result<u8, ScoreError> {
    if RATING_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(ScoreError::RatingOutOfRange { criterion, value })
    }
}

/// Computes the priority score of a task from its three ratings.
///
/// Fails with [`ScoreError::InvalidWeights`] when the weights cannot be
/// normalized (a negative or non-finite weight, or a total of zero) instead
/// of dividing by zero.
pub fn compute_priority_score(
    urgency: u8,
    grade: u8,
    difficulty: u8,
    weights: &Weights,
) -> Result<f64, ScoreError> {
    let urgency = validate_rating("Urgency", urgency)?;
    let grade = validate_rating("Grade weight", grade)?;
    let difficulty = validate_rating("Difficulty", difficulty)?;
    weights.normalized()?;

    // score * 100 = 100 * sum(rating * weight) / (5 * total). Dividing once
    // keeps exact inputs exact, so a true half-hundredth lands on .5.
    let weighted = f64::from(urgency) * weights.urgency
        + f64::from(grade) * weights.grade
        + f64::from(difficulty) * weights.difficulty;
    let hundredths = weighted * (100.0 / RATING_SCALE) / weights.total();

    Ok(round_half_up(hundredths) / 100.0)
}

/// Rounds half away from zero. The relative nudge absorbs the drift of
/// inexact weights such as 0.35, which can leave a half just below .5.
fn round_half_up(value: f64) -> f64 {
    (value * (1.0 + 1e-12)).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equal() -> Weights {
        Weights {
            urgency: 1.0,
            grade: 1.0,
            difficulty: 1.0,
        }
    }

    #[test]
    fn test_maximum_ratings_score_one() {
        assert_eq!(compute_priority_score(5, 5, 5, &equal()).unwrap(), 1.0);
    }

    #[test]
    fn test_minimum_ratings_score_a_fifth() {
        assert_eq!(compute_priority_score(1, 1, 1, &equal()).unwrap(), 0.2);
    }

    #[test]
    fn test_midpoint_ratings_with_default_weights() {
        let weights = Weights {
            urgency: 0.4,
            grade: 0.35,
            difficulty: 0.25,
        };
        assert_eq!(compute_priority_score(3, 3, 3, &weights).unwrap(), 0.6);
        assert_eq!(weights, Weights::default());
    }

    #[test]
    fn test_weighted_mix() {
        let weights = Weights {
            urgency: 0.5,
            grade: 0.3,
            difficulty: 0.2,
        };
        // 0.8 * 0.5 + 0.4 * 0.3 + 1.0 * 0.2
        assert_eq!(compute_priority_score(4, 2, 5, &weights).unwrap(), 0.72);
    }

    #[test]
    fn test_weights_need_not_sum_to_one() {
        let percentages = Weights {
            urgency: 40.0,
            grade: 35.0,
            difficulty: 25.0,
        };
        assert_eq!(
            compute_priority_score(4, 2, 5, &percentages).unwrap(),
            compute_priority_score(4, 2, 5, &Weights::default()).unwrap()
        );
    }

    #[test]
    fn test_scaling_weights_does_not_change_the_score() {
        let base = Weights {
            urgency: 0.7,
            grade: 0.2,
            difficulty: 1.3,
        };
        for factor in [2.0, 4.0, 0.5] {
            let scaled = Weights {
                urgency: base.urgency * factor,
                grade: base.grade * factor,
                difficulty: base.difficulty * factor,
            };
            for u in RATING_RANGE {
                for g in RATING_RANGE {
                    for d in RATING_RANGE {
                        assert_eq!(
                            compute_priority_score(u, g, d, &base).unwrap(),
                            compute_priority_score(u, g, d, &scaled).unwrap(),
                            "ratings ({u}, {g}, {d}) scaled by {factor}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_scores_stay_within_bounds_with_two_decimals() {
        let weight_sets = [
            equal(),
            Weights::default(),
            Weights {
                urgency: 3.0,
                grade: 0.0,
                difficulty: 0.5,
            },
            Weights {
                urgency: 0.001,
                grade: 900.0,
                difficulty: 12.5,
            },
        ];
        for weights in &weight_sets {
            for u in RATING_RANGE {
                for g in RATING_RANGE {
                    for d in RATING_RANGE {
                        let score = compute_priority_score(u, g, d, weights).unwrap();
                        assert!((0.2..=1.0).contains(&score), "score {score} out of range");
                        let hundredths = score * 100.0;
                        assert!((hundredths - hundredths.round()).abs() < 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_exact_half_hundredths_round_up() {
        let weights = Weights {
            urgency: 3.0,
            grade: 3.0,
            difficulty: 2.0,
        };
        // (3 * 2 + 3 * 3 + 2 * 4) / 40 = 0.575
        assert_eq!(compute_priority_score(2, 3, 4, &weights).unwrap(), 0.58);
        assert_eq!(compute_priority_score(3, 2, 4, &weights).unwrap(), 0.58);

        // Exact score is 2.5 * (3u + 3g + 2d) hundredths
        for u in RATING_RANGE {
            for g in RATING_RANGE {
                for d in RATING_RANGE {
                    let numerator = 3 * u32::from(u) + 3 * u32::from(g) + 2 * u32::from(d);
                    let expected = f64::from((5 * numerator + 1) / 2) / 100.0;
                    assert_eq!(
                        compute_priority_score(u, g, d, &weights).unwrap(),
                        expected,
                        "ratings ({u}, {g}, {d})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_single_weight_uses_only_that_criterion() {
        let urgency_only = Weights {
            urgency: 2.0,
            grade: 0.0,
            difficulty: 0.0,
        };
        assert_eq!(compute_priority_score(2, 5, 5, &urgency_only).unwrap(), 0.4);
    }

    #[test]
    fn test_zero_total_weight_is_rejected() {
        let zero = Weights {
            urgency: 0.0,
            grade: 0.0,
            difficulty: 0.0,
        };
        assert!(matches!(
            compute_priority_score(3, 3, 3, &zero),
            Err(ScoreError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn test_negative_or_non_finite_weights_are_rejected() {
        let canceling = Weights {
            urgency: 1.0,
            grade: -1.0,
            difficulty: 0.5,
        };
        assert!(matches!(
            compute_priority_score(3, 3, 3, &canceling),
            Err(ScoreError::InvalidWeights { .. })
        ));

        let not_a_number = Weights {
            urgency: f64::NAN,
            ..Weights::default()
        };
        assert!(matches!(
            compute_priority_score(3, 3, 3, &not_a_number),
            Err(ScoreError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn test_ratings_outside_scale_are_rejected() {
        assert_eq!(
            compute_priority_score(0, 3, 3, &equal()),
            Err(ScoreError::RatingOutOfRange {
                criterion: "Urgency",
                value: 0
            })
        );
        assert_eq!(
            compute_priority_score(3, 3, 6, &equal()),
            Err(ScoreError::RatingOutOfRange {
                criterion: "Difficulty",
                value: 6
            })
        );
    }
}
