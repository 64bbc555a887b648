//! Social media module: a linear four-phase workflow stored per website.
//!
//! Phase 1 captures the brand identity, phase 2 the content themes, phase 3
//! the 14-day calendar and phase 4 the generated post text. Each phase
//! requires the previous one to be completed; there is no branching and no
//! way back other than overwriting a phase.

pub mod calendar;
pub mod editor;
pub mod generate;

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::openai::OpenAiClient;
use crate::store::{get_as, paths, DocumentStore};
use crate::{Error, Result};
use calendar::{generate_calendar, validate_calendar, CalendarPost};
use generate::{build_prompt, parse_posts, GeneratedPost, SYSTEM_PROMPT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Linkedin,
    X,
    Facebook,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Linkedin => "linkedin",
            Platform::X => "x",
            Platform::Facebook => "facebook",
        }
    }
}

/// Phase 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BrandIdentity {
    #[validate(length(min = 1, max = 120))]
    pub brand_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub audience: String,
    /// Tone of voice, free text
    #[serde(default)]
    pub voice: String,
    /// Things the copy must or must not do
    #[serde(default)]
    pub guardrails: Vec<String>,
    #[validate(length(min = 1, message = "at least one platform is required"))]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Theme as submitted; ids are assigned on save when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeInput {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Phase 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemesPhase {
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub completed: bool,
}

/// Phase 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarPhase {
    pub start_date: NaiveDate,
    pub calendar: Vec<CalendarPost>,
    #[serde(default)]
    pub completed: bool,
}

/// Phase 4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPhase {
    pub posts: Vec<GeneratedPost>,
    pub model: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

/// Document at `users/{uid}/websites/{websiteId}/modules/social`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialState {
    pub phase1: Option<BrandIdentity>,
    pub phase2: Option<ThemesPhase>,
    pub phase3: Option<CalendarPhase>,
    pub phase4: Option<GeneratedPhase>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SocialState {
    pub fn completed_phase1(&self) -> Result<&BrandIdentity> {
        self.phase1.as_ref().filter(|p| p.completed).ok_or(Error::PhaseGate(1))
    }

    pub fn completed_phase2(&self) -> Result<&ThemesPhase> {
        self.phase2.as_ref().filter(|p| p.completed).ok_or(Error::PhaseGate(2))
    }

    pub fn completed_phase3(&self) -> Result<&CalendarPhase> {
        self.phase3.as_ref().filter(|p| p.completed).ok_or(Error::PhaseGate(3))
    }
}

/// Calendar submitted by the editor; replaces the stored one wholesale.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCalendarRequest {
    pub start_date: NaiveDate,
    pub calendar: Vec<CalendarPost>,
}

/// Stored or freshly generated calendar for the editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDraft {
    pub start_date: NaiveDate,
    pub calendar: Vec<CalendarPost>,
    pub completed: bool,
    /// False when the calendar was generated for this response and not yet saved
    pub saved: bool,
}

/// Current state; an empty state when nothing was saved yet.
pub async fn load_state<S: DocumentStore>(store: &S, uid: &str, website_id: &str) -> Result<SocialState> {
    Ok(get_as(store, &paths::social_state(uid, website_id)?)
        .await?
        .unwrap_or_default())
}

async fn write_phase<S: DocumentStore, T: Serialize>(
    store: &S,
    uid: &str,
    website_id: &str,
    phase: &str,
    value: &T,
    now: DateTime<Utc>,
) -> Result<()> {
    let patch = json!({
        phase: value,
        "updatedAt": now,
    });
    store.merge(&paths::social_state(uid, website_id)?, &patch).await?;
    info!(uid, website_id, phase, "Saved social phase");
    Ok(())
}

pub async fn save_brand_identity<S: DocumentStore>(
    store: &S,
    uid: &str,
    website_id: &str,
    mut identity: BrandIdentity,
    now: DateTime<Utc>,
) -> Result<BrandIdentity> {
    identity.brand_name = identity.brand_name.trim().to_string();
    identity.guardrails = identity
        .guardrails
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect();
    let mut seen = HashSet::new();
    identity.platforms.retain(|p| seen.insert(*p));
    identity.validate()?;
    identity.completed = true;

    write_phase(store, uid, website_id, "phase1", &identity, now).await?;
    Ok(identity)
}

pub async fn save_themes<S: DocumentStore>(
    store: &S,
    uid: &str,
    website_id: &str,
    themes: Vec<ThemeInput>,
    now: DateTime<Utc>,
) -> Result<ThemesPhase> {
    let state = load_state(store, uid, website_id).await?;
    state.completed_phase1()?;

    let themes: Vec<Theme> = themes
        .into_iter()
        .filter(|t| !t.name.trim().is_empty())
        .map(|t| Theme {
            id: t
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: t.name.trim().to_string(),
            description: t.description.trim().to_string(),
        })
        .collect();

    if themes.is_empty() {
        return Err(Error::Validation("At least one theme is required".to_string()));
    }

    let phase = ThemesPhase {
        themes,
        completed: true,
    };
    write_phase(store, uid, website_id, "phase2", &phase, now).await?;
    Ok(phase)
}

/// Calendar for the editor: the stored one, or a generated draft starting `today`.
pub async fn calendar_draft<S: DocumentStore>(
    store: &S,
    uid: &str,
    website_id: &str,
    today: NaiveDate,
) -> Result<CalendarDraft> {
    let state = load_state(store, uid, website_id).await?;
    let themes = state.completed_phase2()?;
    let identity = state.completed_phase1()?;

    if let Some(phase) = state.phase3.as_ref().filter(|p| !p.calendar.is_empty()) {
        return Ok(CalendarDraft {
            start_date: phase.start_date,
            calendar: phase.calendar.clone(),
            completed: phase.completed,
            saved: true,
        });
    }

    Ok(CalendarDraft {
        start_date: today,
        calendar: generate_calendar(today, &identity.platforms, &themes.themes),
        completed: false,
        saved: false,
    })
}

/// Full overwrite of the calendar. The completion flag is left as it was.
pub async fn save_calendar<S: DocumentStore>(
    store: &S,
    uid: &str,
    website_id: &str,
    request: SaveCalendarRequest,
    now: DateTime<Utc>,
) -> Result<CalendarPhase> {
    let state = load_state(store, uid, website_id).await?;
    let themes = state.completed_phase2()?;
    let identity = state.completed_phase1()?;

    validate_calendar(
        request.start_date,
        &request.calendar,
        &identity.platforms,
        &themes.themes,
    )?;

    let phase = CalendarPhase {
        start_date: request.start_date,
        calendar: request.calendar,
        completed: state.phase3.as_ref().is_some_and(|p| p.completed),
    };
    write_phase(store, uid, website_id, "phase3", &phase, now).await?;
    Ok(phase)
}

pub async fn complete_calendar<S: DocumentStore>(
    store: &S,
    uid: &str,
    website_id: &str,
    now: DateTime<Utc>,
) -> Result<CalendarPhase> {
    let state = load_state(store, uid, website_id).await?;
    state.completed_phase2()?;

    let mut phase = state
        .phase3
        .filter(|p| !p.calendar.is_empty())
        .ok_or_else(|| Error::Validation("Save a calendar before completing phase 3".to_string()))?;
    phase.completed = true;

    write_phase(store, uid, website_id, "phase3", &phase, now).await?;
    Ok(phase)
}

/// Generate post text for every calendar entry and store it as phase 4.
///
/// The model's output is used only if it is strict JSON with every required
/// field; nothing is retried or repaired.
pub async fn generate_posts<S: DocumentStore>(
    store: &S,
    openai: &OpenAiClient,
    uid: &str,
    website_id: &str,
    now: DateTime<Utc>,
) -> Result<GeneratedPhase> {
    let state = load_state(store, uid, website_id).await?;
    let calendar = state.completed_phase3()?;
    let themes = state.completed_phase2()?;
    let identity = state.completed_phase1()?;

    let prompt = build_prompt(identity, &themes.themes, &calendar.calendar);
    let raw = openai.complete_json(SYSTEM_PROMPT, &prompt).await?;
    let posts = parse_posts(&raw)?;

    let phase = GeneratedPhase {
        posts,
        model: openai.model().to_string(),
        generated_at: now,
        completed: true,
    };
    write_phase(store, uid, website_id, "phase4", &phase, now).await?;
    Ok(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn identity() -> BrandIdentity {
        BrandIdentity {
            brand_name: " Acme Coffee ".to_string(),
            industry: "Coffee roasting".to_string(),
            audience: "Home baristas".to_string(),
            voice: "Warm, nerdy".to_string(),
            guardrails: vec!["No discounts".to_string(), "  ".to_string()],
            platforms: vec![Platform::Instagram, Platform::Linkedin],
            completed: false,
        }
    }

    fn theme(name: &str) -> ThemeInput {
        ThemeInput {
            id: None,
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_phase1_marks_completed_and_cleans_input() {
        let store = MemoryStore::new();
        let saved = save_brand_identity(&store, "u1", "w1", identity(), now()).await.unwrap();
        assert!(saved.completed);
        assert_eq!(saved.brand_name, "Acme Coffee");
        assert_eq!(saved.guardrails, vec!["No discounts"]);

        let state = load_state(&store, "u1", "w1").await.unwrap();
        assert_eq!(state.phase1, Some(saved));
        assert_eq!(state.updated_at, Some(now()));
    }

    #[tokio::test]
    async fn test_phase1_requires_platform() {
        let store = MemoryStore::new();
        let mut input = identity();
        input.platforms.clear();
        let err = save_brand_identity(&store, "u1", "w1", input, now()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_phase_gates_are_linear() {
        let store = MemoryStore::new();

        let err = save_themes(&store, "u1", "w1", vec![theme("Origins")], now()).await.unwrap_err();
        assert_eq!(err.to_string(), "PHASE1_NOT_COMPLETED");

        save_brand_identity(&store, "u1", "w1", identity(), now()).await.unwrap();
        let err = calendar_draft(&store, "u1", "w1", today()).await.unwrap_err();
        assert_eq!(err.to_string(), "PHASE2_NOT_COMPLETED");

        let request = SaveCalendarRequest {
            start_date: today(),
            calendar: vec![],
        };
        let err = save_calendar(&store, "u1", "w1", request, now()).await.unwrap_err();
        assert_eq!(err.to_string(), "PHASE2_NOT_COMPLETED");
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_calendar_draft_then_save_and_complete() {
        let store = MemoryStore::new();
        save_brand_identity(&store, "u1", "w1", identity(), now()).await.unwrap();
        let themes = save_themes(&store, "u1", "w1", vec![theme("Origins"), theme(" ")], now())
            .await
            .unwrap();
        assert_eq!(themes.themes.len(), 1);

        let draft = calendar_draft(&store, "u1", "w1", today()).await.unwrap();
        assert!(!draft.saved);
        assert_eq!(draft.calendar.len(), 14);
        assert_eq!(draft.calendar[0].theme_id.as_deref(), Some(themes.themes[0].id.as_str()));

        let err = complete_calendar(&store, "u1", "w1", now()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let mut calendar = draft.calendar.clone();
        calendar.pop();
        let saved = save_calendar(
            &store,
            "u1",
            "w1",
            SaveCalendarRequest { start_date: draft.start_date, calendar },
            now(),
        )
        .await
        .unwrap();
        assert!(!saved.completed);

        let completed = complete_calendar(&store, "u1", "w1", now()).await.unwrap();
        assert!(completed.completed);
        assert_eq!(completed.calendar.len(), 13);

        let draft = calendar_draft(&store, "u1", "w1", today()).await.unwrap();
        assert!(draft.saved);
        assert!(draft.completed);
        assert_eq!(draft.calendar.len(), 13);

        // Editing after completion keeps the phase completed.
        let resaved = save_calendar(
            &store,
            "u1",
            "w1",
            SaveCalendarRequest { start_date: draft.start_date, calendar: draft.calendar },
            now(),
        )
        .await
        .unwrap();
        assert!(resaved.completed);
    }

    #[tokio::test]
    async fn test_saving_one_phase_keeps_the_others() {
        let store = MemoryStore::new();
        save_brand_identity(&store, "u1", "w1", identity(), now()).await.unwrap();
        save_themes(&store, "u1", "w1", vec![theme("Origins")], now()).await.unwrap();
        let mut changed = identity();
        changed.voice = "Dry".to_string();
        save_brand_identity(&store, "u1", "w1", changed, now()).await.unwrap();

        let state = load_state(&store, "u1", "w1").await.unwrap();
        assert_eq!(state.phase1.unwrap().voice, "Dry");
        assert!(state.phase2.unwrap().completed);
    }
}
