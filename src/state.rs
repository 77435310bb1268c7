//! Shared application state

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::generation::GenerationProvider;
use crate::core::personality::PersonalityStore;
use crate::core::recognition::{RecognitionGateway, RecognitionProvider};
use crate::core::session::SessionStore;
use crate::handlers::stream::StreamSessionController;
use crate::notify::NotificationSink;

/// State shared across all request handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub controller: Arc<StreamSessionController>,
}

impl AppState {
    /// Wire the session stack around the given provider bindings.
    pub fn new(
        config: ServerConfig,
        recognition_provider: Arc<dyn RecognitionProvider>,
        generation_provider: Arc<dyn GenerationProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Arc<Self> {
        let recognition = Arc::new(RecognitionGateway::new(
            recognition_provider,
            config.recognition.clone(),
        ));
        let store = Arc::new(SessionStore::new(
            Arc::clone(&recognition),
            config.stream.clone(),
            config.vad.clone(),
        ));
        let personalities = Arc::new(PersonalityStore::builtin(
            &config.stream.default_personality,
        ));
        let controller = Arc::new(StreamSessionController::new(
            store,
            recognition,
            generation_provider,
            personalities,
            sink,
            config.stream.clone(),
        ));

        Arc::new(Self { config, controller })
    }
}
