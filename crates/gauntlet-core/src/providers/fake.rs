use super::{Provider, Request, Response};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted in-memory provider for tests and offline runs. Queued turns are
/// returned in order; once the queue is empty every call returns the fixed
/// fallback text.
#[derive(Debug)]
pub struct FakeProvider {
    turns: Mutex<VecDeque<Response>>,
    fallback: String,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            turns: Mutex::new(VecDeque::new()),
            fallback: "ok".to_string(),
        }
    }

    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    pub fn with_turn(self, turn: Response) -> Self {
        self.turns.lock().unwrap().push_back(turn);
        self
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn complete(&self, _req: &Request) -> anyhow::Result<Response> {
        let next = self.turns.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| Response::text(self.fallback.clone(), 0, 0)))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
