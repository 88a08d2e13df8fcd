use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::openai::{strip_code_fence, ContentError, OpenAiClient};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestimonialSource {
    Customer,
    Generated,
}

impl TestimonialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestimonialSource::Customer => "CUSTOMER",
            TestimonialSource::Generated => "GENERATED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CUSTOMER" => Some(TestimonialSource::Customer),
            "GENERATED" => Some(TestimonialSource::Generated),
            _ => None,
        }
    }
}

/// A storefront testimonial. Generated ones start unapproved and only reach the
/// public listing after an admin signs them off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: Uuid,
    pub author_name: String,
    pub body: String,
    pub rating: i16,
    pub source: TestimonialSource,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

const SYSTEM_PROMPT: &str = "You draft placeholder testimonials for a jewelry \
storefront while real reviews accumulate. Respond with a single JSON object: \
{\"author\": string, \"body\": string, \"rating\": integer 4-5}. The body is 25-50 \
words, first person, about craftsmanship or a custom order experience. No markdown.";

#[derive(Debug, Deserialize, PartialEq)]
pub struct GeneratedTestimonial {
    pub author: String,
    pub body: String,
    pub rating: i16,
}

/// Parse the model's JSON reply, tolerating a stray code fence.
pub fn parse_generated(raw: &str) -> Result<GeneratedTestimonial, ContentError> {
    let cleaned = strip_code_fence(raw);
    let parsed: GeneratedTestimonial = serde_json::from_str(cleaned)
        .map_err(|e| ContentError::MalformedResponse(e.to_string()))?;

    if parsed.rating < 1 || parsed.rating > 5 {
        return Err(ContentError::MalformedResponse(format!(
            "rating {} out of range",
            parsed.rating
        )));
    }
    Ok(parsed)
}

/// Ask the model for one draft testimonial. The optional theme steers the subject
/// ("custom bridal order", "repair service", ...).
pub async fn generate_testimonial(
    client: &OpenAiClient,
    theme: Option<&str>,
) -> Result<Testimonial, ContentError> {
    let user = match theme {
        Some(theme) => format!("Theme: {}", theme),
        None => "Theme: overall experience".to_string(),
    };

    let raw = client.chat(SYSTEM_PROMPT, &user).await?;
    let generated = parse_generated(&raw)?;

    Ok(Testimonial {
        id: Uuid::new_v4(),
        author_name: generated.author,
        body: generated.body,
        rating: generated.rating,
        source: TestimonialSource::Generated,
        is_approved: false,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let parsed = parse_generated(
            r#"{"author": "Anika S.", "body": "The ring exceeded every expectation.", "rating": 5}"#,
        )
        .unwrap();
        assert_eq!(parsed.author, "Anika S.");
        assert_eq!(parsed.rating, 5);
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"author\": \"R. Mehta\", \"body\": \"Lovely work.\", \"rating\": 4}\n```";
        let parsed = parse_generated(raw).unwrap();
        assert_eq!(parsed.author, "R. Mehta");
    }

    #[test]
    fn rejects_out_of_range_rating() {
        let raw = r#"{"author": "X", "body": "Y", "rating": 9}"#;
        assert!(matches!(
            parse_generated(raw),
            Err(ContentError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_non_json_reply() {
        assert!(parse_generated("Five stars, would buy again!").is_err());
    }
}
