use super::client::GameClient;
use super::envelope::{
    AnnouncementResponse, BackgroundsResponse, CarouselResponse, CarouselSlide, Enveloped,
};
use super::Transport;
use crate::static_data;

/// Reads announcements, carousel slides and backgrounds from the remote static-data API.
#[derive(Clone, Debug)]
pub struct RemoteApi {
    transport: Transport,
    local: GameClient,
}

impl RemoteApi {
    pub fn new(base_url: impl Into<String>, local: GameClient) -> Self {
        Self {
            transport: Transport::new(base_url, None),
            local,
        }
    }

    /// Falls back to the local backend's `/api/announcement` when the remote call fails.
    pub async fn announcement(&self) -> AnnouncementResponse {
        match self
            .transport
            .get::<AnnouncementResponse>("/api/announcement", &[])
            .await
        {
            Ok(response) if response.is_ok() => response,
            Ok(response) => {
                tracing::warn!(
                    message = ?response.envelope.message,
                    "remote announcement rejected, using local backend"
                );
                self.local.announcement().await
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote announcement unavailable, using local backend");
                self.local.announcement().await
            }
        }
    }

    /// Falls back to the embedded slide catalog.
    pub async fn carousel(&self) -> Vec<CarouselSlide> {
        match self
            .transport
            .get::<CarouselResponse>("/api/carousel", &[])
            .await
        {
            Ok(response) if response.is_ok() && !response.slides.is_empty() => response.slides,
            Ok(_) => static_data::carousel_slides(),
            Err(err) => {
                tracing::warn!(error = %err, "remote carousel unavailable, using embedded slides");
                static_data::carousel_slides()
            }
        }
    }

    pub async fn backgrounds(&self, default_only: bool) -> BackgroundsResponse {
        let query: &[(&str, &str)] = if default_only {
            &[("default", "true")]
        } else {
            &[]
        };
        match self.transport.get("/api/backgrounds", query).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch backgrounds");
                BackgroundsResponse::from_error(&err)
            }
        }
    }
}
