use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::{Segment, SegmentId, Story, StoryId};
use tracing::warn;

pub mod error;
pub mod http;

pub use error::ClientError;
pub use http::HttpStoryService;

/// The remote authority for stories and segments.
#[async_trait]
pub trait StoryService: Send + Sync {
    async fn list_stories(&self) -> Result<Vec<Story>, ClientError>;
    async fn create_story(&self, title: &str) -> Result<Story, ClientError>;
    async fn delete_story(&self, story_id: StoryId) -> Result<(), ClientError>;
    async fn list_segments(&self, story_id: StoryId) -> Result<Vec<Segment>, ClientError>;
    async fn create_segment(&self, story_id: StoryId, text: &str)
        -> Result<SegmentId, ClientError>;
    async fn delete_segment(
        &self,
        story_id: StoryId,
        segment_id: SegmentId,
    ) -> Result<(), ClientError>;
}

/// Per-entry record handed to the presentation surface. Each entry carries
/// everything a renderer or handler needs, so nothing is shared through
/// captured mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryEntry {
    pub id: StoryId,
    pub title: String,
    pub selected: bool,
}

/// Presentation surface consumed by the controller. Methods take `&self`;
/// implementations use interior mutability where they keep render state.
pub trait StoryView: Send + Sync {
    fn render_story_list(&self, entries: &[StoryEntry]);
    fn show_story_list_empty(&self);
    fn show_story_list_error(&self, message: &str);
    fn render_segments(&self, title: &str, segments: &[Segment]);
    fn show_segment_error(&self, message: &str);
    fn show_no_selection(&self);
    fn set_compose_enabled(&self, enabled: bool);
    fn clear_segment_input(&self);
    fn clear_title_input(&self);
}

/// Notification surface. Async rather than blocking so a front-end can back
/// it with a dialog, a prompt line, or a test script.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
    async fn alert(&self, message: &str);
}

/// The controller's record of which story, if any, is currently displayed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    None,
    Selected { story_id: StoryId, title: String },
}

impl Selection {
    pub fn story_id(&self) -> Option<StoryId> {
        match self {
            Selection::None => None,
            Selection::Selected { story_id, .. } => Some(*story_id),
        }
    }
}

/// View-state controller: owns the selection and keeps the story list, the
/// selected story, and the segment panel consistent as service calls
/// complete.
///
/// Every operation takes `&mut self`, so two operations can never overlap on
/// one controller instance; a request runs to completion before the next
/// user intent is dispatched. No timeouts and no cancellation: the
/// controller waits for the service's answer or error.
pub struct StoryController {
    service: Arc<dyn StoryService>,
    view: Arc<dyn StoryView>,
    notifier: Arc<dyn Notifier>,
    selection: Selection,
    stories: Vec<Story>,
}

impl StoryController {
    pub fn new(
        service: Arc<dyn StoryService>,
        view: Arc<dyn StoryView>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            service,
            view,
            notifier,
            selection: Selection::None,
            stories: Vec::new(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Stories from the most recent successful list fetch, newest first.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub async fn init(&mut self) {
        self.clear_selection();
        self.refresh_stories().await;
    }

    /// Fetches the story list and re-renders it. An empty list or a failed
    /// fetch forces the selection back to none.
    pub async fn refresh_stories(&mut self) {
        match self.service.list_stories().await {
            Ok(stories) if stories.is_empty() => {
                self.stories = stories;
                self.clear_selection();
                self.view.show_story_list_empty();
            }
            Ok(stories) => {
                self.stories = stories;
                self.render_story_list();
            }
            Err(err) => {
                warn!(%err, "story list fetch failed");
                self.view.show_story_list_error(&err.to_string());
                self.clear_selection();
            }
        }
    }

    /// Switches the selection and loads the story's segments. A failed
    /// segment fetch shows an inline panel error and leaves the selection in
    /// place.
    pub async fn select_story(&mut self, story_id: StoryId, title: &str) {
        self.selection = Selection::Selected {
            story_id,
            title: title.to_string(),
        };
        self.view.clear_segment_input();
        self.view.set_compose_enabled(true);
        self.render_story_list();
        self.fetch_segments(story_id, title).await;
    }

    pub async fn create_story(&mut self, title: &str) {
        let title = match require_non_empty(title, "Please enter a title for the new story.") {
            Ok(title) => title.to_string(),
            Err(err) => {
                self.notifier.alert(&err.to_string()).await;
                return;
            }
        };

        match self.service.create_story(&title).await {
            Ok(story) => {
                self.view.clear_title_input();
                self.refresh_stories().await;
                self.select_story(story.id, &story.title).await;
            }
            Err(err) => {
                warn!(%err, "story creation failed");
                self.notifier
                    .alert(&format!("Failed to create story: {err}"))
                    .await;
            }
        }
    }

    /// Appends a segment to the selected story, then re-fetches the segment
    /// list. With no selection this is rejected locally and issues no
    /// request.
    pub async fn add_segment(&mut self, text: &str) {
        let Selection::Selected { story_id, title } = self.selection.clone() else {
            self.notifier.alert("Please select a story first!").await;
            return;
        };

        let text = match require_non_empty(text, "Please enter some text for your story segment.")
        {
            Ok(text) => text.to_string(),
            Err(err) => {
                self.notifier.alert(&err.to_string()).await;
                return;
            }
        };

        match self.service.create_segment(story_id, &text).await {
            Ok(_) => {
                self.view.clear_segment_input();
                self.fetch_segments(story_id, &title).await;
            }
            Err(err) => {
                warn!(%err, %story_id, "segment creation failed");
                self.notifier
                    .alert(&format!("Failed to add segment: {err}"))
                    .await;
            }
        }
    }

    /// Deletes a story after confirmation. Only deleting the currently
    /// selected story clears the selection; deleting any other story leaves
    /// it untouched.
    pub async fn delete_story(&mut self, story_id: StoryId) {
        let confirmed = self
            .notifier
            .confirm("Are you sure you want to delete this story and all its segments?")
            .await;
        if !confirmed {
            return;
        }

        match self.service.delete_story(story_id).await {
            Ok(()) => {
                self.notifier.alert("Story deleted.").await;
                if self.selection.story_id() == Some(story_id) {
                    self.clear_selection();
                }
                self.refresh_stories().await;
            }
            Err(err) => {
                warn!(%err, %story_id, "story deletion failed");
                self.notifier
                    .alert(&format!("Failed to delete story: {err}"))
                    .await;
            }
        }
    }

    /// Deletes a segment of the selected story after confirmation, then
    /// re-fetches the segment list. Ignored with no selection.
    pub async fn delete_segment(&mut self, segment_id: SegmentId) {
        let Selection::Selected { story_id, title } = self.selection.clone() else {
            return;
        };

        let confirmed = self
            .notifier
            .confirm("Are you sure you want to delete this segment?")
            .await;
        if !confirmed {
            return;
        }

        match self.service.delete_segment(story_id, segment_id).await {
            Ok(()) => {
                self.notifier.alert("Segment deleted.").await;
                self.fetch_segments(story_id, &title).await;
            }
            Err(err) => {
                warn!(%err, %story_id, %segment_id, "segment deletion failed");
                self.notifier
                    .alert(&format!("Failed to delete segment: {err}"))
                    .await;
            }
        }
    }

    async fn fetch_segments(&mut self, story_id: StoryId, title: &str) {
        match self.service.list_segments(story_id).await {
            Ok(segments) => self.view.render_segments(title, &segments),
            Err(err) => {
                warn!(%err, %story_id, "segment list fetch failed");
                self.view.show_segment_error(&err.to_string());
            }
        }
    }

    fn clear_selection(&mut self) {
        self.selection = Selection::None;
        self.view.show_no_selection();
        self.view.set_compose_enabled(false);
        self.render_story_list();
    }

    fn render_story_list(&self) {
        let selected = self.selection.story_id();
        let entries: Vec<StoryEntry> = self
            .stories
            .iter()
            .map(|story| StoryEntry {
                id: story.id,
                title: story.title.clone(),
                selected: selected == Some(story.id),
            })
            .collect();
        self.view.render_story_list(&entries);
    }
}

fn require_non_empty<'a>(input: &'a str, message: &str) -> Result<&'a str, ClientError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation(message.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
