//! Calendar editing session with debounced persistence.
//!
//! Edits apply to the in-memory calendar immediately. Every edit schedules a
//! full overwrite of the stored calendar, collapsed by a 400 ms debounce so a
//! burst of edits produces one write. Two sessions editing the same calendar
//! overwrite each other; the last save wins. Edits that would leave the
//! calendar invalid for the enabled platforms and known themes are rejected
//! without touching it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};

use super::calendar::{validate_calendar, CalendarPost, Intent, PostFormat};
use super::{save_calendar, Platform, SaveCalendarRequest, Theme};
use crate::debounce::Debouncer;
use crate::store::DocumentStore;
use crate::{Error, Result};

/// Quiet period between the last edit and the save.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(400);

/// Destination for full calendar overwrites.
pub trait CalendarSink: Send + Sync + 'static {
    fn save(&self, posts: Vec<CalendarPost>) -> impl Future<Output = Result<()>> + Send;
}

/// Writes the calendar into the website's social state.
pub struct StoreCalendarSink<S> {
    store: Arc<S>,
    uid: String,
    website_id: String,
    start_date: NaiveDate,
}

impl<S: DocumentStore + 'static> StoreCalendarSink<S> {
    pub fn new(store: Arc<S>, uid: impl Into<String>, website_id: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            store,
            uid: uid.into(),
            website_id: website_id.into(),
            start_date,
        }
    }
}

impl<S: DocumentStore + 'static> CalendarSink for StoreCalendarSink<S> {
    async fn save(&self, posts: Vec<CalendarPost>) -> Result<()> {
        let request = SaveCalendarRequest {
            start_date: self.start_date,
            calendar: posts,
        };
        save_calendar(self.store.as_ref(), &self.uid, &self.website_id, request, Utc::now()).await?;
        Ok(())
    }
}

/// Changes to one entry; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub date: Option<NaiveDate>,
    pub intent: Option<Intent>,
    pub format: Option<PostFormat>,
    /// `Some(None)` clears the theme
    pub theme_id: Option<Option<String>>,
}

pub struct CalendarEditor {
    start_date: NaiveDate,
    posts: Vec<CalendarPost>,
    platforms: Vec<Platform>,
    themes: Vec<Theme>,
    saver: Debouncer<Vec<CalendarPost>>,
}

impl CalendarEditor {
    /// Start a session on `posts`, checking edits against the enabled
    /// `platforms` and known `themes`. Must be called inside a Tokio runtime.
    pub fn new<K: CalendarSink>(
        start_date: NaiveDate,
        posts: Vec<CalendarPost>,
        platforms: Vec<Platform>,
        themes: Vec<Theme>,
        sink: K,
    ) -> Self {
        Self::with_delay(start_date, posts, platforms, themes, sink, SAVE_DEBOUNCE)
    }

    pub fn with_delay<K: CalendarSink>(
        start_date: NaiveDate,
        posts: Vec<CalendarPost>,
        platforms: Vec<Platform>,
        themes: Vec<Theme>,
        sink: K,
        delay: Duration,
    ) -> Self {
        let sink = Arc::new(sink);
        let saver = Debouncer::new(delay, move |posts: Vec<CalendarPost>| {
            let sink = Arc::clone(&sink);
            async move { sink.save(posts).await }
        });
        Self {
            start_date,
            posts,
            platforms,
            themes,
            saver,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn posts(&self) -> &[CalendarPost] {
        &self.posts
    }

    pub fn update(&mut self, index: usize, patch: PostPatch) -> Result<&CalendarPost> {
        let mut post = self.post(index)?.clone();
        if let Some(date) = patch.date {
            post.date = date;
        }
        if let Some(intent) = patch.intent {
            post.intent = intent;
        }
        if let Some(format) = patch.format {
            post.format = format;
        }
        if let Some(theme_id) = patch.theme_id {
            post.theme_id = theme_id;
        }

        let mut candidate = self.posts.clone();
        candidate[index] = post;
        self.commit(candidate)?;
        Ok(&self.posts[index])
    }

    /// Move an entry to another day.
    pub fn reschedule(&mut self, index: usize, date: NaiveDate) -> Result<&CalendarPost> {
        self.update(
            index,
            PostPatch {
                date: Some(date),
                ..PostPatch::default()
            },
        )
    }

    /// Append an entry for `platform` on `date`, using the next intent in the
    /// cycle and the platform's first format.
    pub fn add(&mut self, platform: Platform, date: NaiveDate) -> Result<&CalendarPost> {
        let existing = self.posts.iter().filter(|p| p.platform == platform).count();
        let prefix = format!("{}-", platform.as_str());
        let next = self
            .posts
            .iter()
            .filter_map(|p| p.id.strip_prefix(&prefix))
            .filter_map(|n| n.parse::<usize>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let mut candidate = self.posts.clone();
        candidate.push(CalendarPost {
            id: format!("{}{}", prefix, next),
            date,
            platform,
            intent: Intent::CYCLE[existing % Intent::CYCLE.len()],
            format: platform.formats()[0],
            theme_id: None,
        });
        self.commit(candidate)?;

        let last = self.posts.len() - 1;
        Ok(&self.posts[last])
    }

    pub fn remove(&mut self, index: usize) -> Result<CalendarPost> {
        self.post(index)?;
        let removed = self.posts.remove(index);
        self.saver.push(self.posts.clone());
        Ok(removed)
    }

    /// Save now instead of waiting out the debounce.
    pub async fn flush(&self) -> Result<()> {
        self.saver.flush().await
    }

    fn post(&self, index: usize) -> Result<&CalendarPost> {
        self.posts.get(index).ok_or_else(|| {
            Error::Validation(format!("No calendar entry at index {} (have {})", index, self.posts.len()))
        })
    }

    /// Replace the calendar with `candidate` if it is valid and schedule a save.
    fn commit(&mut self, candidate: Vec<CalendarPost>) -> Result<()> {
        validate_calendar(self.start_date, &candidate, &self.platforms, &self.themes)?;
        self.saver.push(candidate.clone());
        self.posts = candidate;
        Ok(())
    }
}
