//! Additive suspicion scoring.
//!
//! Each rule is an independent threshold check with an explicit weight.
//! Rules stack: a head turned past both turn thresholds earns both weights.
//! The verdict keeps the individual hits so every score can be explained.

use crate::config::ConfigError;
use crate::core::overlay::Point;
use crate::core::signals::SignalReading;
use serde::{Deserialize, Serialize};

/// Thresholds and weights of the scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub turn_threshold: f64,
    pub turn_strong_threshold: f64,
    pub down_threshold: f64,
    pub down_strong_threshold: f64,
    /// Normalized volume above which the room counts as noisy
    pub audio_threshold: f64,

    pub turn_weight: u32,
    pub turn_strong_weight: u32,
    pub down_weight: u32,
    pub down_strong_weight: u32,
    pub audio_weight: u32,
    pub gesture_weight: u32,

    /// Score at which a subject is flagged suspicious
    pub suspicious_score: u32,
    /// Score at which an evidence clip is requested
    pub evidence_score: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            turn_threshold: 0.20,
            turn_strong_threshold: 0.30,
            down_threshold: 0.15,
            down_strong_threshold: 0.25,
            audio_threshold: 0.18,
            turn_weight: 1,
            turn_strong_weight: 1,
            down_weight: 1,
            down_strong_weight: 1,
            audio_weight: 1,
            gesture_weight: 2,
            suspicious_score: 2,
            evidence_score: 3,
        }
    }
}

impl ScoringRules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("turn_threshold", self.turn_threshold),
            ("turn_strong_threshold", self.turn_strong_threshold),
            ("down_threshold", self.down_threshold),
            ("down_strong_threshold", self.down_strong_threshold),
            ("audio_threshold", self.audio_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(ConfigError::InvalidThreshold(format!(
                    "{name} must be finite"
                )));
            }
        }
        if self.turn_strong_threshold < self.turn_threshold {
            return Err(ConfigError::InvalidThreshold(
                "turn_strong_threshold is below turn_threshold".to_string(),
            ));
        }
        if self.down_strong_threshold < self.down_threshold {
            return Err(ConfigError::InvalidThreshold(
                "down_strong_threshold is below down_threshold".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.audio_threshold) {
            return Err(ConfigError::InvalidThreshold(
                "audio_threshold must be within [0, 1]".to_string(),
            ));
        }
        if self.suspicious_score == 0 {
            return Err(ConfigError::InvalidThreshold(
                "suspicious_score must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which rules fired for a reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHits {
    pub head_turn: bool,
    pub head_turn_strong: bool,
    pub head_down: bool,
    pub head_down_strong: bool,
    pub audio: bool,
    pub gesture: bool,
}

/// The scorer's decision for one subject in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuspicionVerdict {
    pub subject_index: usize,
    pub score: u32,
    pub suspicious: bool,
    /// Whether the score is high enough to request an evidence clip
    pub evidence: bool,
    /// Nose position
    pub position: Point,
    pub shoulder_width: f64,
    pub hits: RuleHits,
    pub reading: SignalReading,
}

/// Applies [`ScoringRules`] to signal readings.
#[derive(Debug, Clone, Default)]
pub struct SuspicionScorer {
    rules: ScoringRules,
}

impl SuspicionScorer {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Evaluate every rule in order.
    pub fn evaluate(&self, reading: &SignalReading) -> RuleHits {
        let r = &self.rules;
        RuleHits {
            head_turn: reading.head_turn_ratio > r.turn_threshold,
            head_turn_strong: reading.head_turn_ratio > r.turn_strong_threshold,
            head_down: reading.head_down_ratio > r.down_threshold,
            head_down_strong: reading.head_down_ratio > r.down_strong_threshold,
            audio: reading.audio_level > r.audio_threshold,
            gesture: reading.gesture_suspicious,
        }
    }

    /// Sum of the weights of the rules that fired.
    pub fn score(&self, hits: &RuleHits) -> u32 {
        let r = &self.rules;
        [
            (hits.head_turn, r.turn_weight),
            (hits.head_turn_strong, r.turn_strong_weight),
            (hits.head_down, r.down_weight),
            (hits.head_down_strong, r.down_strong_weight),
            (hits.audio, r.audio_weight),
            (hits.gesture, r.gesture_weight),
        ]
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, weight)| weight)
        .sum()
    }

    /// Score one subject and build its verdict.
    pub fn verdict(
        &self,
        subject_index: usize,
        reading: SignalReading,
        position: Point,
        shoulder_width: f64,
    ) -> SuspicionVerdict {
        let hits = self.evaluate(&reading);
        let score = self.score(&hits);

        SuspicionVerdict {
            subject_index,
            score,
            suspicious: score >= self.rules.suspicious_score,
            evidence: score >= self.rules.evidence_score,
            position,
            shoulder_width,
            hits,
            reading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reading(turn: f64, down: f64, gesture: bool, audio: f64) -> SignalReading {
        SignalReading {
            head_turn_ratio: turn,
            head_down_ratio: down,
            gesture_suspicious: gesture,
            audio_level: audio,
        }
    }

    fn score_of(reading: SignalReading) -> SuspicionVerdict {
        SuspicionScorer::default().verdict(0, reading, Point::default(), 100.0)
    }

    #[test]
    fn test_quiet_subject_scores_zero() {
        let verdict = score_of(reading(0.20, 0.15, false, 0.18));
        assert_eq!(verdict.score, 0);
        assert!(!verdict.suspicious);
        assert_eq!(verdict.hits, RuleHits::default());
    }

    #[test]
    fn test_stacked_thresholds_add_two() {
        assert_eq!(score_of(reading(0.25, 0.0, false, 0.0)).score, 1);
        assert_eq!(score_of(reading(0.35, 0.0, false, 0.0)).score, 2);
        assert_eq!(score_of(reading(0.0, 0.20, false, 0.0)).score, 1);
        assert_eq!(score_of(reading(0.0, 0.30, false, 0.0)).score, 2);
    }

    #[test]
    fn test_gesture_alone_is_suspicious() {
        let verdict = score_of(reading(0.0, 0.0, true, 0.0));
        assert_eq!(verdict.score, 2);
        assert!(verdict.suspicious);
        assert!(!verdict.evidence);
    }

    #[test]
    fn test_audio_adds_one() {
        let verdict = score_of(reading(0.25, 0.0, false, 0.5));
        assert_eq!(verdict.score, 2);
        assert!(verdict.hits.audio);
    }

    #[test]
    fn test_evidence_threshold() {
        let verdict = score_of(reading(0.35, 0.20, false, 0.0));
        assert_eq!(verdict.score, 3);
        assert!(verdict.evidence);

        let verdict = score_of(reading(0.35, 0.30, true, 0.9));
        assert_eq!(verdict.score, 7);
    }

    #[test]
    fn test_custom_weights() {
        let rules = ScoringRules {
            gesture_weight: 5,
            suspicious_score: 4,
            ..Default::default()
        };
        let scorer = SuspicionScorer::new(rules);
        let verdict = scorer.verdict(3, reading(0.0, 0.0, true, 0.0), Point::new(1.0, 2.0), 1.0);
        assert_eq!(verdict.score, 5);
        assert!(verdict.suspicious);
        assert_eq!(verdict.subject_index, 3);
        assert_eq!(verdict.position, Point::new(1.0, 2.0));
    }

    #[test]
    fn test_rule_validation() {
        assert!(ScoringRules::default().validate().is_ok());

        let inverted = ScoringRules {
            turn_strong_threshold: 0.1,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let nan = ScoringRules {
            down_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_score_monotone_in_turn(a in -1.0f64..2.0, b in -1.0f64..2.0, down in -1.0f64..1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let low = score_of(reading(lo, down, false, 0.0)).score;
            let high = score_of(reading(hi, down, false, 0.0)).score;
            prop_assert!(low <= high);
        }

        #[test]
        fn prop_score_monotone_in_down(a in -1.0f64..2.0, b in -1.0f64..2.0, turn in 0.0f64..1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let low = score_of(reading(turn, lo, false, 0.0)).score;
            let high = score_of(reading(turn, hi, false, 0.0)).score;
            prop_assert!(low <= high);
        }

        #[test]
        fn prop_crossing_both_turn_thresholds_adds_two(down in -1.0f64..1.0, gesture: bool, audio in 0.0f64..1.0) {
            let below = score_of(reading(0.20, down, gesture, audio)).score;
            let above = score_of(reading(0.31, down, gesture, audio)).score;
            prop_assert_eq!(above, below + 2);
        }

        #[test]
        fn prop_suspicious_iff_score_at_least_two(turn in 0.0f64..1.0, down in -0.5f64..0.5, gesture: bool, audio in 0.0f64..1.0) {
            let verdict = score_of(reading(turn, down, gesture, audio));
            prop_assert_eq!(verdict.suspicious, verdict.score >= 2);
        }
    }
}
