use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

pub const COMMENTS_MAX_LEN: usize = 500;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressValidationError {
    #[error("accuracy must be a number between 0 and 100, got {0}")]
    AccuracyOutOfRange(f64),

    #[error("score must be a finite number")]
    NonFiniteScore,

    #[error("level must be at least 1")]
    InvalidLevel,

    #[error("comments are too long: {len} chars")]
    CommentsTooLong { len: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Caller-supplied progress input, before validation.
///
/// Turn it into a [`ProgressEntry`] with [`ProgressDraft::validate`]; a draft
/// that fails validation never reaches a history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressDraft {
    pub completed_exercises: u32,
    pub accuracy: f64,
    pub score: f64,
    pub level: u32,
    pub comments: String,
}

impl ProgressDraft {
    /// Validate the draft and stamp it with its submission time.
    ///
    /// Accuracy must be finite and within `[0, 100]`, the level at least 1,
    /// and comments at most `COMMENTS_MAX_LEN` chars after trimming. The
    /// score only has to be finite; negative scores are accepted (see
    /// [`crate::analytics::AnalyticsSummary::best_score`]).
    ///
    /// # Errors
    ///
    /// Returns `ProgressValidationError` describing the first violated rule.
    pub fn validate(self, recorded_at: DateTime<Utc>) -> Result<ProgressEntry, ProgressValidationError> {
        if !self.accuracy.is_finite() || !(0.0..=100.0).contains(&self.accuracy) {
            return Err(ProgressValidationError::AccuracyOutOfRange(self.accuracy));
        }
        if !self.score.is_finite() {
            return Err(ProgressValidationError::NonFiniteScore);
        }
        if self.level == 0 {
            return Err(ProgressValidationError::InvalidLevel);
        }
        let comments = self.comments.trim().to_owned();
        let len = comments.chars().count();
        if len > COMMENTS_MAX_LEN {
            return Err(ProgressValidationError::CommentsTooLong { len });
        }

        Ok(ProgressEntry {
            completed_exercises: self.completed_exercises,
            accuracy: self.accuracy,
            score: self.score,
            level: self.level,
            comments,
            recorded_at,
        })
    }
}

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

/// One immutable record of a completed exercise session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEntry {
    completed_exercises: u32,
    accuracy: f64,
    score: f64,
    level: u32,
    comments: String,
    recorded_at: DateTime<Utc>,
}

impl ProgressEntry {
    /// Rehydrate an entry from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressValidationError` if the stored values no longer pass
    /// validation.
    pub fn from_persisted(
        completed_exercises: u32,
        accuracy: f64,
        score: f64,
        level: u32,
        comments: String,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, ProgressValidationError> {
        ProgressDraft {
            completed_exercises,
            accuracy,
            score,
            level,
            comments,
        }
        .validate(recorded_at)
    }

    // Accessors
    #[must_use]
    pub fn completed_exercises(&self) -> u32 {
        self.completed_exercises
    }

    /// Accuracy in percent, within `[0, 100]`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(accuracy: f64) -> ProgressDraft {
        ProgressDraft {
            completed_exercises: 12,
            accuracy,
            score: 340.0,
            level: 2,
            comments: "  two rounds of drills  ".into(),
        }
    }

    #[test]
    fn validate_happy_path_trims_comments() {
        let entry = draft(87.5).validate(fixed_now()).unwrap();
        assert_eq!(entry.completed_exercises(), 12);
        assert_eq!(entry.accuracy(), 87.5);
        assert_eq!(entry.comments(), "two rounds of drills");
        assert_eq!(entry.recorded_at(), fixed_now());
    }

    #[test]
    fn validate_rejects_accuracy_out_of_range() {
        let err = draft(100.1).validate(fixed_now()).unwrap_err();
        assert!(matches!(err, ProgressValidationError::AccuracyOutOfRange(_)));

        let err = draft(-0.5).validate(fixed_now()).unwrap_err();
        assert!(matches!(err, ProgressValidationError::AccuracyOutOfRange(_)));

        let err = draft(f64::NAN).validate(fixed_now()).unwrap_err();
        assert!(matches!(err, ProgressValidationError::AccuracyOutOfRange(_)));
    }

    #[test]
    fn validate_rejects_non_finite_score() {
        let mut d = draft(50.0);
        d.score = f64::INFINITY;
        let err = d.validate(fixed_now()).unwrap_err();
        assert_eq!(err, ProgressValidationError::NonFiniteScore);
    }

    #[test]
    fn validate_accepts_negative_score() {
        let mut d = draft(50.0);
        d.score = -10.0;
        let entry = d.validate(fixed_now()).unwrap();
        assert_eq!(entry.score(), -10.0);
    }

    #[test]
    fn validate_rejects_zero_level() {
        let mut d = draft(50.0);
        d.level = 0;
        let err = d.validate(fixed_now()).unwrap_err();
        assert_eq!(err, ProgressValidationError::InvalidLevel);
    }

    #[test]
    fn validate_rejects_oversized_comments() {
        let mut d = draft(50.0);
        d.comments = "x".repeat(COMMENTS_MAX_LEN + 1);
        let err = d.validate(fixed_now()).unwrap_err();
        assert!(matches!(err, ProgressValidationError::CommentsTooLong { .. }));
    }

    #[test]
    fn persisted_roundtrip() {
        let entry = draft(100.0).validate(fixed_now()).unwrap();
        let back = ProgressEntry::from_persisted(
            entry.completed_exercises(),
            entry.accuracy(),
            entry.score(),
            entry.level(),
            entry.comments().to_owned(),
            entry.recorded_at(),
        )
        .unwrap();
        assert_eq!(entry, back);
    }
}
