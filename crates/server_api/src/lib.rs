use shared::{
    domain::{Segment, SegmentId, Story, StoryId},
    error::{ApiError, ErrorCode},
};
use storage::Storage;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_stories(ctx: &ApiContext) -> Result<Vec<Story>, ApiError> {
    ctx.storage.list_stories().await.map_err(internal)
}

pub async fn create_story(ctx: &ApiContext, title: &str) -> Result<Story, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "missing or empty title field",
        ));
    }
    ctx.storage.create_story(title).await.map_err(internal)
}

pub async fn delete_story(ctx: &ApiContext, story_id: StoryId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_story(story_id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, "story not found"));
    }
    Ok(())
}

pub async fn list_segments(ctx: &ApiContext, story_id: StoryId) -> Result<Vec<Segment>, ApiError> {
    ensure_story_exists(ctx, story_id).await?;
    ctx.storage.list_segments(story_id).await.map_err(internal)
}

pub async fn create_segment(
    ctx: &ApiContext,
    story_id: StoryId,
    text: &str,
) -> Result<SegmentId, ApiError> {
    ensure_story_exists(ctx, story_id).await?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "missing or empty text field for segment",
        ));
    }
    ctx.storage
        .insert_segment(story_id, text)
        .await
        .map_err(internal)
}

pub async fn delete_segment(
    ctx: &ApiContext,
    story_id: StoryId,
    segment_id: SegmentId,
) -> Result<(), ApiError> {
    let deleted = ctx
        .storage
        .delete_segment(story_id, segment_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, "segment not found"));
    }
    Ok(())
}

async fn ensure_story_exists(ctx: &ApiContext, story_id: StoryId) -> Result<(), ApiError> {
    let exists = ctx.storage.story_exists(story_id).await.map_err(internal)?;
    if !exists {
        return Err(ApiError::new(ErrorCode::NotFound, "story not found"));
    }
    Ok(())
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        ApiContext { storage }
    }

    #[tokio::test]
    async fn create_story_trims_title() {
        let ctx = setup().await;
        let story = create_story(&ctx, "  Tale  ").await.expect("create");
        assert_eq!(story.title, "Tale");
    }

    #[tokio::test]
    async fn whitespace_title_is_rejected() {
        let ctx = setup().await;
        let err = create_story(&ctx, "   ").await.expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn segments_for_unknown_story_report_not_found() {
        let ctx = setup().await;
        let err = list_segments(&ctx, StoryId(99))
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn segment_append_round_trip() {
        let ctx = setup().await;
        let story = create_story(&ctx, "Tale").await.expect("create");
        let segment_id = create_segment(&ctx, story.id, "Once").await.expect("append");

        let segments = list_segments(&ctx, story.id).await.expect("list");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].id, segment_id);
        assert_eq!(segments[0].text, "Once");
    }

    #[tokio::test]
    async fn empty_segment_text_is_rejected() {
        let ctx = setup().await;
        let story = create_story(&ctx, "Tale").await.expect("create");
        let err = create_segment(&ctx, story.id, " \n ")
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn delete_story_then_segments_are_gone() {
        let ctx = setup().await;
        let story = create_story(&ctx, "Tale").await.expect("create");
        create_segment(&ctx, story.id, "Once").await.expect("append");

        delete_story(&ctx, story.id).await.expect("delete");
        let err = list_segments(&ctx, story.id)
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn delete_unknown_segment_reports_not_found() {
        let ctx = setup().await;
        let story = create_story(&ctx, "Tale").await.expect("create");
        let err = delete_segment(&ctx, story.id, SegmentId(5))
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
