//! Phase 4 post text: prompt assembly and strict parsing of the model output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::calendar::CalendarPost;
use super::{BrandIdentity, Platform, Theme};
use crate::{Error, Result};

pub const SYSTEM_PROMPT: &str = "You are a social media copywriter. \
Write on-brand posts that follow every guardrail. \
Respond with a single JSON object and nothing else.";

/// Post text for one calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPost {
    pub date: String,
    pub platform: Platform,
    pub text: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<String>,
}

fn or_unspecified(value: &str) -> &str {
    if value.trim().is_empty() {
        "(not specified)"
    } else {
        value.trim()
    }
}

/// User prompt describing the brand and every scheduled post.
pub fn build_prompt(identity: &BrandIdentity, themes: &[Theme], calendar: &[CalendarPost]) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("Brand: {}\n", identity.brand_name));
    prompt.push_str(&format!("Industry: {}\n", or_unspecified(&identity.industry)));
    prompt.push_str(&format!("Audience: {}\n", or_unspecified(&identity.audience)));
    prompt.push_str(&format!("Voice: {}\n", or_unspecified(&identity.voice)));

    if !identity.guardrails.is_empty() {
        prompt.push_str("Guardrails:\n");
        for guardrail in &identity.guardrails {
            prompt.push_str(&format!("- {}\n", guardrail));
        }
    }

    prompt.push_str("Themes:\n");
    for theme in themes {
        if theme.description.is_empty() {
            prompt.push_str(&format!("- {}\n", theme.name));
        } else {
            prompt.push_str(&format!("- {}: {}\n", theme.name, theme.description));
        }
    }

    prompt.push_str("Calendar (date | platform | intent | format | theme):\n");
    for post in calendar {
        let theme = post
            .theme_id
            .as_deref()
            .and_then(|id| themes.iter().find(|t| t.id == id))
            .map(|t| t.name.as_str())
            .unwrap_or("any");
        prompt.push_str(&format!(
            "- {} | {} | {} | {} | {}\n",
            post.date,
            post.platform.as_str(),
            post.intent.as_str(),
            post.format.as_str(),
            theme
        ));
    }

    prompt.push_str(
        "\nWrite one post for every calendar entry. Respond with JSON shaped exactly like \
{\"posts\": [{\"date\": \"YYYY-MM-DD\", \"platform\": \"instagram\", \"text\": \"...\", \
\"hashtags\": [\"...\"], \"cta\": \"...\"}]}.",
    );
    prompt
}

fn missing(field: String) -> Error {
    Error::ModelOutputMissingFields(field)
}

fn required_str<'a>(post: &'a Value, index: usize, field: &str) -> Result<&'a str> {
    post.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing(format!("posts[{}].{}", index, field)))
}

/// Parse the raw completion. Anything but strict JSON is `MODEL_OUTPUT_NOT_JSON`;
/// JSON without a non-empty `posts` list or a post without `date`, `platform`
/// or `text` is `MODEL_OUTPUT_MISSING_FIELDS`.
pub fn parse_posts(raw: &str) -> Result<Vec<GeneratedPost>> {
    let value: Value = serde_json::from_str(raw).map_err(|_| Error::ModelOutputNotJson)?;

    let posts = value
        .get("posts")
        .and_then(Value::as_array)
        .filter(|posts| !posts.is_empty())
        .ok_or_else(|| missing("posts".to_string()))?;

    posts
        .iter()
        .enumerate()
        .map(|(index, post)| -> Result<GeneratedPost> {
            let date = required_str(post, index, "date")?;
            let platform_raw = required_str(post, index, "platform")?;
            let platform: Platform =
                serde_json::from_value(Value::String(platform_raw.to_ascii_lowercase()))
                    .map_err(|_| missing(format!("posts[{}].platform", index)))?;
            let text = required_str(post, index, "text")?;

            let hashtags: Vec<String> = post
                .get("hashtags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect()
                })
                .unwrap_or_default();

            let cta = post
                .get("cta")
                .and_then(Value::as_str)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());

            Ok(GeneratedPost {
                date: date.to_string(),
                platform,
                text: text.to_string(),
                hashtags,
                cta,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::calendar::generate_calendar;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_valid_output() {
        let raw = r##"{"posts": [
            {"date": "2026-10-19", "platform": "Instagram", "text": "Fresh roast day.", "hashtags": ["#coffee", ""], "cta": "Shop now"},
            {"date": "2026-10-21", "platform": "x", "text": "Why grind size matters"}
        ]}"##;

        let posts = parse_posts(raw).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].platform, Platform::Instagram);
        assert_eq!(posts[0].hashtags, vec!["#coffee"]);
        assert_eq!(posts[0].cta.as_deref(), Some("Shop now"));
        assert!(posts[1].hashtags.is_empty());
        assert_eq!(posts[1].cta, None);
    }

    #[test]
    fn test_non_json_output_is_not_repaired() {
        for raw in [
            "Sure! Here are your posts.",
            "```json\n{\"posts\": []}\n```",
            "{\"posts\": [",
            "",
        ] {
            let err = parse_posts(raw).unwrap_err();
            assert_eq!(err.to_string(), "MODEL_OUTPUT_NOT_JSON", "input {:?}", raw);
        }
    }

    #[test]
    fn test_missing_fields_are_named() {
        let err = parse_posts(r#"{"items": []}"#).unwrap_err();
        assert_eq!(err.to_string(), "MODEL_OUTPUT_MISSING_FIELDS: posts");

        let err = parse_posts(r#"{"posts": []}"#).unwrap_err();
        assert!(matches!(err, Error::ModelOutputMissingFields(_)));

        let err = parse_posts(r#"{"posts": [{"date": "2026-10-19", "platform": "x", "text": " "}]}"#).unwrap_err();
        assert_eq!(err.to_string(), "MODEL_OUTPUT_MISSING_FIELDS: posts[0].text");

        let err = parse_posts(r#"{"posts": [{"date": "2026-10-19", "platform": "myspace", "text": "hi"}]}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "MODEL_OUTPUT_MISSING_FIELDS: posts[0].platform");
    }

    #[test]
    fn test_prompt_mentions_brand_guardrails_and_every_entry() {
        let identity = BrandIdentity {
            brand_name: "Acme Coffee".to_string(),
            industry: String::new(),
            audience: "Home baristas".to_string(),
            voice: "Warm".to_string(),
            guardrails: vec!["Never mention competitors".to_string()],
            platforms: vec![Platform::Instagram],
            completed: true,
        };
        let themes = vec![Theme {
            id: "t1".to_string(),
            name: "Origins".to_string(),
            description: "Where beans come from".to_string(),
        }];
        let start = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let calendar = generate_calendar(start, &identity.platforms, &themes);

        let prompt = build_prompt(&identity, &themes, &calendar);
        assert!(prompt.contains("Brand: Acme Coffee"));
        assert!(prompt.contains("Industry: (not specified)"));
        assert!(prompt.contains("- Never mention competitors"));
        assert!(prompt.contains("- Origins: Where beans come from"));
        assert!(prompt.contains("- 2026-10-19 | instagram | educate | reel | Origins"));
        assert_eq!(prompt.matches(" | instagram | ").count(), 7);
        assert!(prompt.contains("\"posts\""));
    }
}
