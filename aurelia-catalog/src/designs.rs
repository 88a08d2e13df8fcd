use aurelia_shared::pii::Masked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Custom design request lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DesignStatus {
    Submitted,
    Reviewing,
    Quoted,
    Accepted,
    Declined,
}

impl DesignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignStatus::Submitted => "SUBMITTED",
            DesignStatus::Reviewing => "REVIEWING",
            DesignStatus::Quoted => "QUOTED",
            DesignStatus::Accepted => "ACCEPTED",
            DesignStatus::Declined => "DECLINED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUBMITTED" => Some(DesignStatus::Submitted),
            "REVIEWING" => Some(DesignStatus::Reviewing),
            "QUOTED" => Some(DesignStatus::Quoted),
            "ACCEPTED" => Some(DesignStatus::Accepted),
            "DECLINED" => Some(DesignStatus::Declined),
            _ => None,
        }
    }

    /// Reviewing/quoting move forward; customers accept or decline a quote.
    pub fn can_transition_to(&self, target: DesignStatus) -> bool {
        matches!(
            (self, target),
            (DesignStatus::Submitted, DesignStatus::Reviewing)
                | (DesignStatus::Submitted, DesignStatus::Declined)
                | (DesignStatus::Reviewing, DesignStatus::Quoted)
                | (DesignStatus::Reviewing, DesignStatus::Declined)
                | (DesignStatus::Quoted, DesignStatus::Accepted)
                | (DesignStatus::Quoted, DesignStatus::Declined)
        )
    }
}

/// Intake record for a bespoke piece. Contact fields are masked so request logging
/// never leaks customer PII.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomDesignRequest {
    pub id: Uuid,
    pub customer_name: String,
    pub email: Masked<String>,
    pub phone: Option<Masked<String>>,
    pub description: String,
    pub reference_image_urls: Vec<String>,
    pub budget_min_paise: Option<i64>,
    pub budget_max_paise: Option<i64>,
    pub status: DesignStatus,
    pub quoted_amount_paise: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentAuthor {
    Customer,
    Admin,
}

/// Threaded conversation on a design request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignComment {
    pub id: Uuid,
    pub request_id: Uuid,
    pub author: CommentAuthor,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Build the `wa.me` deep link customers use to continue a design conversation on
/// WhatsApp. The prefilled text references the request so the workshop can match it.
pub fn whatsapp_link(business_number: &str, request: &CustomDesignRequest) -> String {
    let digits: String = business_number.chars().filter(|c| c.is_ascii_digit()).collect();
    let text = format!(
        "Hello! I'd like to discuss my custom design request {} ({}).",
        request.id,
        &request.description.chars().take(60).collect::<String>()
    );
    format!("https://wa.me/{}?text={}", digits, urlencode(&text))
}

/// Minimal percent-encoding for the query component of the deep link.
fn urlencode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CustomDesignRequest {
        CustomDesignRequest {
            id: Uuid::new_v4(),
            customer_name: "Priya".to_string(),
            email: Masked("priya@example.com".to_string()),
            phone: None,
            description: "Heirloom-style kundan choker".to_string(),
            reference_image_urls: vec![],
            budget_min_paise: Some(10_000_000),
            budget_max_paise: Some(20_000_000),
            status: DesignStatus::Submitted,
            quoted_amount_paise: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn status_transitions() {
        assert!(DesignStatus::Submitted.can_transition_to(DesignStatus::Reviewing));
        assert!(DesignStatus::Reviewing.can_transition_to(DesignStatus::Quoted));
        assert!(DesignStatus::Quoted.can_transition_to(DesignStatus::Accepted));
        // No skipping review, no resurrecting declined requests.
        assert!(!DesignStatus::Submitted.can_transition_to(DesignStatus::Quoted));
        assert!(!DesignStatus::Declined.can_transition_to(DesignStatus::Reviewing));
        assert!(!DesignStatus::Accepted.can_transition_to(DesignStatus::Declined));
    }

    #[test]
    fn whatsapp_link_strips_formatting_and_encodes_text() {
        let req = request();
        let link = whatsapp_link("+91 98765-43210", &req);
        assert!(link.starts_with("https://wa.me/919876543210?text="));
        assert!(link.contains("%20"));
        assert!(!link.contains(' '));
    }

    #[test]
    fn debug_output_masks_contact_details() {
        let req = request();
        let debug = format!("{:?}", req);
        assert!(!debug.contains("priya@example.com"));
    }
}
