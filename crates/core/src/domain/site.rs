use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainId(pub String);

/// A domain a user has connected for visibility tracking. Every metric and
/// search row is scoped to one of these; ownership checks hang off `user_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedDomain {
    pub id: DomainId,
    pub user_id: UserId,
    pub hostname: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{DomainId, TrackedDomain, UserId};

    #[test]
    fn tracked_domain_serializes_with_camel_case_keys() {
        let domain = TrackedDomain {
            id: DomainId("dom-1".to_string()),
            user_id: UserId("user-1".to_string()),
            hostname: "example.com".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&domain).expect("serialize");
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["hostname"], "example.com");
    }
}
