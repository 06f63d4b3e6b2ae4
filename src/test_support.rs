// Test support utilities for both unit and integration tests

use crate::http::{Fetcher, ImportCause};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// How the mock answers one URL
#[derive(Debug, Clone)]
pub enum MockRoute {
    Text(String),
    /// Answer after a delay
    Delayed(Duration, String),
    /// Fail with a network error carrying this message
    Fail(String),
    /// Never answer; only cancellation ends the call
    Hang,
}

/// Mock fetcher for testing
///
/// Serves canned bodies per exact URL instead of hitting the network.
/// Unrouted URLs fail with a network error. Every requested URL is recorded.
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, MockRoute>>,
    requested: Mutex<Vec<String>>,
}

impl MockFetcher {
    #[allow(unused)] // Used in tests
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: impl Into<String>, route: MockRoute) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.into(), route);
        self
    }

    pub fn text(&self, url: impl Into<String>, body: impl Into<String>) -> &Self {
        self.route(url, MockRoute::Text(body.into()))
    }

    /// How many times `url` was requested
    pub fn request_count(&self, url: &str) -> usize {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|u| *u == url)
            .count()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.requested.lock().unwrap().iter().any(|u| u == url)
    }
}

#[async_trait::async_trait]
impl Fetcher for MockFetcher {
    async fn get_text(&self, url: &str) -> Result<String, ImportCause> {
        self.requested.lock().unwrap().push(url.to_string());
        let route = self.routes.lock().unwrap().get(url).cloned();

        match route {
            Some(MockRoute::Text(body)) => Ok(body),
            Some(MockRoute::Delayed(delay, body)) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Some(MockRoute::Fail(message)) => Err(ImportCause::Network(message)),
            Some(MockRoute::Hang) => std::future::pending().await,
            None => Err(ImportCause::Network(format!("No mock route for {}", url))),
        }
    }
}
