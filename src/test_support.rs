// src/test_support.rs
use crate::errors::TimeMachineError;
use crate::models::{EmbeddedImage, EraStyle};
use crate::services::gemini_service::Transformer;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn png_bytes() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01".to_vec()
}

/// Scripted stand-in for the remote model. Replies are served in the order
/// they were pushed; a gated mock holds every call until [`release`] is hit.
///
/// [`release`]: MockTransformer::release
#[derive(Default)]
pub struct MockTransformer {
    replies: Mutex<VecDeque<Result<EmbeddedImage, TimeMachineError>>>,
    seen: Mutex<Vec<(EmbeddedImage, String)>>,
    calls: AtomicUsize,
    gate: Option<Notify>,
}

impl MockTransformer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Notify::new()),
            ..Self::default()
        })
    }

    pub fn push_ok(&self, image: EmbeddedImage) {
        self.replies.lock().unwrap().push_back(Ok(image));
    }

    pub fn push_err(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(TimeMachineError::TransformationFailed(message.to_string())));
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Source images and prompts received so far.
    pub fn seen(&self) -> Vec<(EmbeddedImage, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transformer for MockTransformer {
    async fn transform(
        &self,
        source: &EmbeddedImage,
        era: &EraStyle,
    ) -> Result<EmbeddedImage, TimeMachineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((source.clone(), era.prompt.to_string()));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(TimeMachineError::TransformationFailed(
                "no reply scripted".to_string(),
            ))
        })
    }
}
