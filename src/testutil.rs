//! Shared fixtures for engine and API tests.

use async_trait::async_trait;
use minder_core::{
    config::{EngineConfig, StoreConfig},
    error::MinderError,
    message::GenRequest,
    traits::{Channel, Provider},
};
use minder_store::Store;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::engine::Engine;

/// Generator stub: replies `gen:<kind>` or fails on demand.
pub struct MockProvider {
    pub fail: bool,
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenRequest) -> Result<String, MinderError> {
        if self.fail {
            return Err(MinderError::Provider("mock generator down".to_string()));
        }
        Ok(format!("gen:{}", request.kind.as_str()))
    }

    async fn is_available(&self) -> bool {
        !self.fail
    }
}

/// Channel stub recording every (chat_id, text) pair, or failing every send.
pub struct MockChannel {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub fail: bool,
}

impl MockChannel {
    pub fn new() -> (Self, Arc<Mutex<Vec<(String, String)>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                sent: Arc::clone(&sent),
                fail: false,
            },
            sent,
        )
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<(), MinderError> {
        if self.fail {
            return Err(MinderError::Channel("mock channel down".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Engine over a store in a temp directory. Keep the `TempDir` alive for the
/// duration of the test.
pub async fn test_engine(
    config: EngineConfig,
    provider_fails: bool,
) -> (Engine, Arc<Mutex<Vec<(String, String)>>>, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.db").to_string_lossy().into_owned();
    let store = Store::new(&StoreConfig { db_path }).await.unwrap();

    let (channel, sent) = MockChannel::new();
    let engine = Engine::new(
        store,
        Arc::new(MockProvider {
            fail: provider_fails,
        }),
        Arc::new(channel),
        config,
    );
    (engine, sent, dir)
}

/// Like [`test_engine`], but every channel send fails.
pub async fn test_engine_channel_down(config: EngineConfig) -> (Engine, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.db").to_string_lossy().into_owned();
    let store = Store::new(&StoreConfig { db_path }).await.unwrap();

    let (mut channel, _sent) = MockChannel::new();
    channel.fail = true;
    let engine = Engine::new(
        store,
        Arc::new(MockProvider { fail: false }),
        Arc::new(channel),
        config,
    );
    (engine, dir)
}
