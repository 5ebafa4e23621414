use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// JSON envelope returned by every API endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn fail_with_error(message: impl Into<String>, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::fail(message)
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResult {
    pub predicted_class: String,
    pub confidence: f32,
    pub raw_predictions: Vec<f32>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeedbackCounters {
    pub likes: u64,
    pub dislikes: u64,
}

impl FeedbackCounters {
    pub fn new(likes: u64, dislikes: u64) -> Self {
        Self { likes, dislikes }
    }

    /// Returns the tally with the counter matching `vote` incremented, or
    /// `None` if that counter is already at `u64::MAX`.
    pub fn apply(self, vote: Vote) -> Option<Self> {
        match vote {
            Vote::Like => Some(Self {
                likes: self.likes.checked_add(1)?,
                ..self
            }),
            Vote::Dislike => Some(Self {
                dislikes: self.dislikes.checked_add(1)?,
                ..self
            }),
        }
    }
}

/// A single like/dislike submission. Displays as the label written to the
/// feedback log.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Vote {
    Dislike,
    Like,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "invalid vote value {:?}, expected \"0\" or \"1\"", _0)]
pub struct InvalidVote(pub String);

impl std::error::Error for InvalidVote {}

impl FromStr for Vote {
    type Err = InvalidVote;

    /// Parses the form encoding: `"1"` is a like, `"0"` a dislike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Vote::Like),
            "0" => Ok(Vote::Dislike),
            other => Err(InvalidVote(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn vote_parses_only_form_flags() {
        assert_eq!("1".parse::<Vote>(), Ok(Vote::Like));
        assert_eq!("0".parse::<Vote>(), Ok(Vote::Dislike));
        for bad in ["", "2", "Like", " 1", "01", "-0"] {
            assert!(bad.parse::<Vote>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn vote_labels_match_log_format() {
        let labels: Vec<String> = Vote::iter().map(|v| v.to_string()).collect();
        assert_eq!(labels, vec!["Dislike", "Like"]);
    }

    #[test]
    fn apply_increments_only_matching_counter() {
        let counters = FeedbackCounters::new(3, 2);
        assert_eq!(counters.apply(Vote::Like), Some(FeedbackCounters::new(4, 2)));
        assert_eq!(counters.apply(Vote::Dislike), Some(FeedbackCounters::new(3, 3)));
    }

    #[test]
    fn apply_refuses_to_wrap_a_full_counter() {
        let counters = FeedbackCounters::new(u64::MAX, 0);
        assert_eq!(counters.apply(Vote::Like), None);
        assert_eq!(
            counters.apply(Vote::Dislike),
            Some(FeedbackCounters::new(u64::MAX, 1))
        );
    }

    #[test]
    fn failure_envelope_has_null_data_and_optional_error() {
        let plain = serde_json::to_value(ApiResponse::<()>::fail("nope")).unwrap();
        assert_eq!(
            plain,
            serde_json::json!({"success": false, "message": "nope", "data": null})
        );

        let detailed =
            serde_json::to_value(ApiResponse::<()>::fail_with_error("nope", "boom")).unwrap();
        assert_eq!(detailed["error"], "boom");
    }
}
