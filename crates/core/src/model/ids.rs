use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a stored study plan.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(Uuid);

impl PlanId {
    /// Creates a fresh random `PlanId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }

    /// Key under which the full plan blob is stored.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("plan-{}", self.0)
    }
}

impl fmt::Debug for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlanId({})", self.0)
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing an ID from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for PlanId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(PlanId)
            .map_err(|_| ParseIdError {
                kind: "PlanId".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_id_round_trips_through_display() {
        let id = PlanId::generate();
        let parsed: PlanId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn plan_id_from_str_invalid() {
        assert!("not-a-uuid".parse::<PlanId>().is_err());
    }

    #[test]
    fn storage_key_is_prefixed() {
        let id = PlanId::from_uuid(Uuid::nil());
        assert_eq!(
            id.storage_key(),
            "plan-00000000-0000-0000-0000-000000000000"
        );
    }
}
