use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{
        CreateSegmentRequest, CreateSegmentResponse, CreateStoryRequest, Segment, SegmentId,
        Story, StoryId,
    },
    error::ApiError,
};
use url::Url;

use crate::{ClientError, StoryService};

/// Repository service client speaking the StoryWeaver REST contract.
#[derive(Debug)]
pub struct HttpStoryService {
    http: Client,
    server_url: String,
}

impl HttpStoryService {
    pub fn new(server_url: impl Into<String>) -> Result<Self, ClientError> {
        let server_url = server_url.into();
        Url::parse(&server_url)
            .map_err(|err| ClientError::Transport(format!("invalid server url: {err}")))?;
        Ok(Self {
            http: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Maps a non-success response to `ClientError::Service`, extracting the
/// message from the error envelope when the body carries one.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ApiError>().await {
        Ok(body) => body.message,
        Err(_) => format!("request failed with status {status}"),
    };
    Err(ClientError::Service {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl StoryService for HttpStoryService {
    async fn list_stories(&self) -> Result<Vec<Story>, ClientError> {
        let response = self
            .http
            .get(format!("{}/stories", self.server_url))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn create_story(&self, title: &str) -> Result<Story, ClientError> {
        let response = self
            .http
            .post(format!("{}/stories", self.server_url))
            .json(&CreateStoryRequest {
                title: title.to_string(),
            })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete_story(&self, story_id: StoryId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(format!("{}/stories/{story_id}", self.server_url))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn list_segments(&self, story_id: StoryId) -> Result<Vec<Segment>, ClientError> {
        let response = self
            .http
            .get(format!("{}/stories/{story_id}/segments", self.server_url))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn create_segment(
        &self,
        story_id: StoryId,
        text: &str,
    ) -> Result<SegmentId, ClientError> {
        let response = self
            .http
            .post(format!("{}/stories/{story_id}/segments", self.server_url))
            .json(&CreateSegmentRequest {
                text: text.to_string(),
            })
            .send()
            .await?;
        let body: CreateSegmentResponse = check(response).await?.json().await?;
        Ok(body.segment_id)
    }

    async fn delete_segment(
        &self,
        story_id: StoryId,
        segment_id: SegmentId,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(format!(
                "{}/stories/{story_id}/segments/{segment_id}",
                self.server_url
            ))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
