use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};

/// Mailchimp's problem document, returned as the body of error responses.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MailchimpError {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: Option<String>,
    pub instance: Option<String>,
}

impl MailchimpError {
    /// Fallback for error responses whose body is not a parsable problem
    /// document (empty bodies, HTML error pages from proxies, etc.).
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self {
            title: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            status: status.as_u16(),
            ..Default::default()
        }
    }
}

impl Display for MailchimpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(
            format!(
                "{} ({}): {}",
                self.title,
                self.status,
                self.detail.clone().unwrap_or_default()
            )
            .as_str(),
        )
    }
}

/// PUT body for the idempotent member upsert.
///
/// `FNAME`/`LNAME` merge fields are only serialized when they were actually
/// provided; an empty `merge_fields` map is dropped from the body entirely.
#[derive(Debug, Clone, Serialize)]
pub struct MemberUpsert {
    pub email_address: String,
    pub status_if_new: String,
    pub status: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub merge_fields: BTreeMap<String, String>,
}

impl MemberUpsert {
    pub fn subscribed(email: &str, name: Option<&str>, surname: Option<&str>) -> Self {
        let mut merge_fields = BTreeMap::new();
        if let Some(name) = name {
            merge_fields.insert("FNAME".to_string(), name.to_string());
        }
        if let Some(surname) = surname {
            merge_fields.insert("LNAME".to_string(), surname.to_string());
        }
        Self {
            email_address: email.to_string(),
            status_if_new: "subscribed".to_string(),
            status: "subscribed".to_string(),
            merge_fields,
        }
    }
}

/// Typed outcome of a single dispatched request.
///
/// Only the three "expected" client-error codes (400, 404, 422) end up as
/// [`ApiResponse::ClientError`]; every other non-success status is a hard
/// error and never reaches this type.
#[derive(Debug, Clone)]
pub enum ApiResponse {
    /// 200/201 with a JSON body (an empty body parses to an empty object).
    Body(serde_json::Value),
    /// 204, success without a body.
    NoContent,
    /// 400, 404 or 422 with Mailchimp's problem document.
    ClientError(MailchimpError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_body_with_both_names() {
        let body = MemberUpsert::subscribed("jan@example.com", Some("Jan"), Some("Novak"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "subscribed");
        assert_eq!(json["status_if_new"], "subscribed");
        assert_eq!(json["merge_fields"]["FNAME"], "Jan");
        assert_eq!(json["merge_fields"]["LNAME"], "Novak");
    }

    #[test]
    fn upsert_body_without_names_omits_merge_fields() {
        let body = MemberUpsert::subscribed("jan@example.com", None, None);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("merge_fields").is_none());
    }

    #[test]
    fn upsert_body_with_only_surname() {
        let body = MemberUpsert::subscribed("jan@example.com", None, Some("Novak"));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["merge_fields"].get("FNAME").is_none());
        assert_eq!(json["merge_fields"]["LNAME"], "Novak");
    }

    #[test]
    fn error_from_status_uses_canonical_reason() {
        let err = MailchimpError::from_status(reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(err.status, 502);
        assert_eq!(err.title, "Bad Gateway");
    }
}
