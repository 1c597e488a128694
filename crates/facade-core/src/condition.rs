//! Facade status and condition bookkeeping
//!
//! Conditions are keyed by type: there is at most one record per
//! [`ConditionType`]. Setting an existing type updates it in place and only
//! moves `lastTransitionTime` when the tri-state status actually changes, so a
//! steady-state reconciliation produces a status equal to the one it read.

use chrono::{DateTime, SubsecRound, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};
use serde::{Deserialize, Serialize};

/// Observed state of a Facade
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacadeStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Kinds of conditions a Facade reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionType {
    /// The generated resource type is installed
    Ready,
    /// The last reconcile attempt failed
    Error,
    /// The Facade spec did not pass validation
    ValidationFailed,
    /// Reconciliation is waiting on something external
    Waiting,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Error => "Error",
            Self::ValidationFailed => "ValidationFailed",
            Self::Waiting => "Waiting",
        }
    }
}

impl std::fmt::Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition to record on a status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionUpdate {
    pub type_: ConditionType,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    pub observed_generation: Option<i64>,
}

impl ConditionUpdate {
    pub fn new(type_: ConditionType, status: ConditionStatus, reason: impl Into<String>) -> Self {
        Self {
            type_,
            status,
            reason: reason.into(),
            message: String::new(),
            observed_generation: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn observed_generation(mut self, generation: Option<i64>) -> Self {
        self.observed_generation = generation;
        self
    }
}

impl FacadeStatus {
    /// Record a condition, stamping transitions with the current time
    pub fn set_condition(&mut self, update: ConditionUpdate) {
        self.set_condition_at(update, Utc::now());
    }

    /// Record a condition using `now` as the transition time
    ///
    /// Timestamps are truncated to whole seconds, the precision the API
    /// server persists.
    pub fn set_condition_at(&mut self, update: ConditionUpdate, now: DateTime<Utc>) {
        let now = Time(now.trunc_subsecs(0));
        let type_ = update.type_.as_str();

        match self.conditions.iter_mut().find(|c| c.type_ == type_) {
            Some(existing) => {
                if existing.status != update.status.as_str() {
                    existing.status = update.status.as_str().to_string();
                    existing.last_transition_time = now;
                }
                existing.reason = update.reason;
                existing.message = update.message;
                existing.observed_generation = update.observed_generation;
            }
            None => self.conditions.push(Condition {
                type_: type_.to_string(),
                status: update.status.as_str().to_string(),
                reason: update.reason,
                message: update.message,
                observed_generation: update.observed_generation,
                last_transition_time: now,
            }),
        }
    }

    /// Remove the condition of the given type; returns whether one was removed
    pub fn clear_condition(&mut self, type_: ConditionType) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| c.type_ != type_.as_str());
        self.conditions.len() != before
    }

    pub fn find_condition(&self, type_: ConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_.as_str())
    }

    /// Check whether the condition of the given type is present with status True
    pub fn is_condition_true(&self, type_: ConditionType) -> bool {
        self.find_condition(type_)
            .is_some_and(|c| c.status == ConditionStatus::True.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn error(message: &str) -> ConditionUpdate {
        ConditionUpdate::new(ConditionType::Error, ConditionStatus::True, "CreateFacadeCRDFailed")
            .message(message)
    }

    #[test]
    fn test_set_condition_adds_new_type() {
        let mut status = FacadeStatus::default();
        status.set_condition_at(error("boom"), at(100));

        let cond = status.find_condition(ConditionType::Error).unwrap();
        assert_eq!(cond.status, "True");
        assert_eq!(cond.reason, "CreateFacadeCRDFailed");
        assert_eq!(cond.message, "boom");
        assert_eq!(cond.last_transition_time, Time(at(100)));
    }

    #[test]
    fn test_set_condition_twice_keeps_single_entry_with_latest_message() {
        let mut status = FacadeStatus::default();
        status.set_condition_at(error("first"), at(100));
        status.set_condition_at(error("second"), at(200));

        assert_eq!(status.conditions.len(), 1);
        let cond = status.find_condition(ConditionType::Error).unwrap();
        assert_eq!(cond.message, "second");
        // Status unchanged, so no transition
        assert_eq!(cond.last_transition_time, Time(at(100)));
    }

    #[test]
    fn test_set_condition_status_change_moves_transition_time() {
        let mut status = FacadeStatus::default();
        let ready = |s| ConditionUpdate::new(ConditionType::Ready, s, "FacadeCRDInstalled");

        status.set_condition_at(ready(ConditionStatus::False), at(100));
        status.set_condition_at(ready(ConditionStatus::True), at(200));

        let cond = status.find_condition(ConditionType::Ready).unwrap();
        assert_eq!(cond.status, "True");
        assert_eq!(cond.last_transition_time, Time(at(200)));
        assert!(status.is_condition_true(ConditionType::Ready));
    }

    #[test]
    fn test_set_condition_truncates_subseconds() {
        let mut status = FacadeStatus::default();
        let now = Utc.timestamp_opt(100, 123_456_789).unwrap();
        status.set_condition_at(error("x"), now);

        assert_eq!(status.conditions[0].last_transition_time, Time(at(100)));
    }

    #[test]
    fn test_clear_condition() {
        let mut status = FacadeStatus::default();
        status.set_condition_at(error("x"), at(1));
        status.set_condition_at(
            ConditionUpdate::new(ConditionType::Ready, ConditionStatus::False, "Pending"),
            at(1),
        );

        assert!(status.clear_condition(ConditionType::Error));
        assert!(!status.clear_condition(ConditionType::Error));
        assert!(status.find_condition(ConditionType::Error).is_none());
        assert_eq!(status.conditions.len(), 1);
    }

    #[test]
    fn test_observed_generation_is_recorded() {
        let mut status = FacadeStatus::default();
        status.set_condition_at(error("x").observed_generation(Some(4)), at(1));

        assert_eq!(status.conditions[0].observed_generation, Some(4));
    }

    #[test]
    fn test_status_roundtrip_is_structurally_equal() {
        let mut status = FacadeStatus::default();
        status.set_condition_at(error("boom").observed_generation(Some(2)), at(1_700_000_000));

        let json = serde_json::to_string(&status).unwrap();
        let back: FacadeStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn test_empty_status_serializes_without_conditions() {
        let json = serde_json::to_value(FacadeStatus::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
