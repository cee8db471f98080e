use std::future::Future;

use serde_json::{Map, Value};

use super::envelope::{
    AnnouncementResponse, BasicResponse, CheckResponse, Enveloped, ProgressResponse, StageResponse,
};
use super::Transport;

/// The game-state requests the workflow depends on.
///
/// Implementations never fail outright: transport problems come back as error envelopes.
pub trait GameBackend: Send + Sync {
    fn check(&self) -> impl Future<Output = CheckResponse> + Send;
    fn clone_game(&self) -> impl Future<Output = StageResponse> + Send;
    fn update_game(&self) -> impl Future<Output = StageResponse> + Send;
    fn launch(&self) -> impl Future<Output = StageResponse> + Send;
    fn progress(&self) -> impl Future<Output = ProgressResponse> + Send;
}

/// Client for the local launcher backend.
#[derive(Clone, Debug)]
pub struct GameClient {
    transport: Transport,
}

impl GameClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            transport: Transport::new(base_url, Some(token.into())),
        }
    }

    async fn post<T: Enveloped>(&self, path: &str, body: Map<String, Value>) -> T {
        match self.transport.post(path, body).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "backend request failed");
                T::from_error(&err)
            }
        }
    }

    async fn get<T: Enveloped>(&self, path: &str) -> T {
        match self.transport.get(path, &[]).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "backend request failed");
                T::from_error(&err)
            }
        }
    }

    pub async fn init(&self) -> BasicResponse {
        self.post("/init", Map::new()).await
    }

    pub async fn open_url(&self, url: &str) -> BasicResponse {
        let mut body = Map::new();
        body.insert("url".to_owned(), Value::from(url));
        self.post("/open-url", body).await
    }

    pub async fn announcement(&self) -> AnnouncementResponse {
        self.get("/api/announcement").await
    }

    pub async fn minimize_window(&self) -> BasicResponse {
        self.post("/api/window/minimize", Map::new()).await
    }

    pub async fn close_window(&self) -> BasicResponse {
        self.post("/api/window/close", Map::new()).await
    }
}

impl GameBackend for GameClient {
    async fn check(&self) -> CheckResponse {
        self.post("/game/check", Map::new()).await
    }

    async fn clone_game(&self) -> StageResponse {
        self.post("/game/clone", Map::new()).await
    }

    async fn update_game(&self) -> StageResponse {
        self.post("/game/update", Map::new()).await
    }

    async fn launch(&self) -> StageResponse {
        self.post("/game/launch", Map::new()).await
    }

    async fn progress(&self) -> ProgressResponse {
        self.get("/game/progress").await
    }
}
