//! Hybrid focus score.
//!
//! A raw focused/total ratio over-rewards long unbroken but low-quality
//! sessions. The hybrid score blends three signals: the focus ratio, a
//! stability term that penalizes frequent context switching, and a penalty
//! term that weighs long distraction episodes over brief glances away.

const WEIGHT_FOCUS_RATIO: f64 = 0.7;
const WEIGHT_STABILITY: f64 = 0.2;
const WEIGHT_PENALTY: f64 = 0.1;

/// Severity tiers for a single distraction episode.
/// Under 5s is a glance, under 15s a short distraction, anything longer
/// counts in full.
fn episode_penalty(duration_secs: u32) -> f64 {
    if duration_secs < 5 {
        0.25
    } else if duration_secs < 15 {
        0.5
    } else {
        1.0
    }
}

/// Compute the hybrid focus score, 0-100, rounded to 2 decimal places.
///
/// `total_secs == 0` (no tracked time at all) scores a perfect 100.
pub fn compute_focus_score(
    focused_secs: f64,
    total_secs: f64,
    num_distractions: usize,
    distraction_durations: &[u32],
) -> f64 {
    if total_secs == 0.0 {
        return 100.0;
    }

    let distraction_penalty: f64 = distraction_durations
        .iter()
        .map(|&d| episode_penalty(d))
        .sum();

    let focus_ratio = focused_secs / total_secs;
    // Distraction episodes per minute of tracked time.
    let stability = 1.0 - (num_distractions as f64 / (total_secs / 60.0).max(1.0));
    let penalty_factor =
        1.0 - (distraction_penalty / (distraction_durations.len() as f64).max(1.0));

    let score = WEIGHT_FOCUS_RATIO * focus_ratio
        + WEIGHT_STABILITY * stability.max(0.0)
        + WEIGHT_PENALTY * penalty_factor;

    let score = score.clamp(0.0, 1.0) * 100.0;
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_history_is_perfect() {
        assert_eq!(compute_focus_score(0.0, 0.0, 0, &[]), 100.0);
    }

    #[test]
    fn worked_example() {
        // 540s focused out of 600s, two episodes of 3s and 10s:
        // 0.7*0.9 + 0.2*0.8 + 0.1*0.625 = 0.8525
        let score = compute_focus_score(540.0, 600.0, 2, &[3, 10]);
        assert_eq!(score, 85.25);
    }

    #[test]
    fn uninterrupted_session() {
        // No episodes: stability 1.0, penalty factor 1.0.
        let score = compute_focus_score(600.0, 600.0, 0, &[]);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn long_episodes_hurt_more_than_glances() {
        let glances = compute_focus_score(540.0, 600.0, 2, &[2, 3]);
        let stares = compute_focus_score(540.0, 600.0, 2, &[30, 30]);
        assert!(glances > stares);
    }

    #[test]
    fn heavy_distraction_clamps_at_zero() {
        let score = compute_focus_score(0.0, 60.0, 40, &[60; 40]);
        assert_eq!(score, 0.0);
    }

    proptest! {
        #[test]
        fn score_is_always_in_bounds(
            focused in 0u32..100_000,
            distracted in 0u32..100_000,
            durations in proptest::collection::vec(0u32..10_000, 0..200),
        ) {
            let total = (focused + distracted) as f64;
            let score = compute_focus_score(
                focused as f64,
                total,
                durations.len(),
                &durations,
            );
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}
