//! Content calendar: the 14-day posting schedule of phase 3.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Platform, Theme};
use crate::{Error, Result};

/// Length of the scheduling window in days.
pub const CALENDAR_DAYS: i64 = 14;
/// Entries generated per platform.
pub const POSTS_PER_PLATFORM: usize = 7;

/// What a post is meant to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Educate,
    Engage,
    Promote,
    Inspire,
}

impl Intent {
    /// Generation cycles through intents in this order.
    pub const CYCLE: [Intent; 4] = [Intent::Educate, Intent::Engage, Intent::Promote, Intent::Inspire];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Educate => "educate",
            Intent::Engage => "engage",
            Intent::Promote => "promote",
            Intent::Inspire => "inspire",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostFormat {
    Reel,
    Carousel,
    Static,
    Story,
    Text,
    Image,
    Poll,
    Thread,
    Video,
    Link,
}

impl PostFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            PostFormat::Reel => "reel",
            PostFormat::Carousel => "carousel",
            PostFormat::Static => "static",
            PostFormat::Story => "story",
            PostFormat::Text => "text",
            PostFormat::Image => "image",
            PostFormat::Poll => "poll",
            PostFormat::Thread => "thread",
            PostFormat::Video => "video",
            PostFormat::Link => "link",
        }
    }
}

impl Platform {
    /// Formats the platform supports, in generation order.
    pub fn formats(self) -> &'static [PostFormat] {
        use PostFormat::*;
        match self {
            Platform::Instagram => &[Reel, Carousel, Static, Story],
            Platform::Linkedin => &[Text, Carousel, Image, Poll],
            Platform::X => &[Text, Thread, Image, Poll],
            Platform::Facebook => &[Image, Video, Text, Link],
        }
    }
}

/// One scheduled post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarPost {
    pub id: String,
    pub date: NaiveDate,
    pub platform: Platform,
    pub intent: Intent,
    pub format: PostFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
}

/// Initial schedule: seven posts per platform on every other day of the window.
///
/// Entry `i` of each platform takes the `i`-th intent, format and theme,
/// wrapping around each list. The result is ordered by date, then by the
/// order platforms were given in.
pub fn generate_calendar(start: NaiveDate, platforms: &[Platform], themes: &[Theme]) -> Vec<CalendarPost> {
    let mut posts = Vec::with_capacity(platforms.len() * POSTS_PER_PLATFORM);

    for i in 0..POSTS_PER_PLATFORM {
        let date = start + Duration::days(2 * i as i64);
        for platform in platforms {
            let formats = platform.formats();
            posts.push(CalendarPost {
                id: format!("{}-{}", platform.as_str(), i + 1),
                date,
                platform: *platform,
                intent: Intent::CYCLE[i % Intent::CYCLE.len()],
                format: formats[i % formats.len()],
                theme_id: (!themes.is_empty()).then(|| themes[i % themes.len()].id.clone()),
            });
        }
    }

    posts
}

/// Last day inside the window starting at `start`.
pub fn window_end(start: NaiveDate) -> NaiveDate {
    start + Duration::days(CALENDAR_DAYS - 1)
}

/// Check an edited calendar before it is stored.
pub fn validate_calendar(
    start: NaiveDate,
    posts: &[CalendarPost],
    platforms: &[Platform],
    themes: &[Theme],
) -> Result<()> {
    let end = window_end(start);
    let theme_ids: HashSet<&str> = themes.iter().map(|t| t.id.as_str()).collect();

    for (index, post) in posts.iter().enumerate() {
        if post.date < start || post.date > end {
            return Err(Error::Validation(format!(
                "calendar[{}]: date {} is outside {} to {}",
                index, post.date, start, end
            )));
        }
        if !platforms.contains(&post.platform) {
            return Err(Error::Validation(format!(
                "calendar[{}]: platform {} is not enabled",
                index,
                post.platform.as_str()
            )));
        }
        check_format(post.platform, post.format)
            .map_err(|e| Error::Validation(format!("calendar[{}]: {}", index, e)))?;
        if let Some(theme_id) = &post.theme_id {
            if !theme_ids.contains(theme_id.as_str()) {
                return Err(Error::Validation(format!(
                    "calendar[{}]: unknown theme {}",
                    index, theme_id
                )));
            }
        }
    }

    Ok(())
}

pub fn check_format(platform: Platform, format: PostFormat) -> Result<()> {
    if platform.formats().contains(&format) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "format {} is not available on {}",
            format.as_str(),
            platform.as_str()
        )))
    }
}
