// src/services/session.rs
//! The interactive session: current source picture, selected era, latest
//! result, error slot, history and the in-flight guard.
//!
//! Every transition runs under one lock acquisition and publishes a fresh
//! [`SessionSnapshot`] on a watch channel. The lock is never held across the
//! remote call, so the busy flag is the only thing standing between two
//! concurrent transformations; it is checked and set in the same critical
//! section that reads the source image.

use crate::eras;
use crate::errors::TimeMachineError;
use crate::loading::loading_message;
use crate::models::{
    DownloadPayload, EmbeddedImage, EraId, EraStyle, HistoryEntry, SessionSnapshot,
    TransformedImage,
};
use crate::services::gemini_service::Transformer;
use crate::services::history::History;
use crate::services::image_codec::ImageCodec;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::watch;
use uuid::Uuid;

pub const UNREADABLE_FILE_MESSAGE: &str = "Failed to load image. Please try another one.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred during transformation.";
pub const INTERRUPTED_MESSAGE: &str = "The transformation was interrupted before it finished.";

#[derive(Debug)]
struct SessionState {
    source: Option<EmbeddedImage>,
    transformed: Option<TransformedImage>,
    selected_era: &'static EraStyle,
    busy_since: Option<Instant>,
    error: Option<String>,
    history: History,
    version: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            source: None,
            transformed: None,
            selected_era: eras::default_era(),
            busy_since: None,
            error: None,
            history: History::new(),
            version: 0,
        }
    }

    fn is_busy(&self) -> bool {
        self.busy_since.is_some()
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: self.version,
            source_image: self.source.clone(),
            transformed_image: self.transformed.clone(),
            selected_era: *self.selected_era,
            busy: self.is_busy(),
            loading_message: self.busy_since.map(|since| loading_message(since.elapsed())),
            error: self.error.clone(),
            history: self.history.iter().cloned().collect(),
            can_reset: self.source.is_some() && !self.is_busy(),
            action_label: if self.transformed.is_some() {
                "Re-Travel Era"
            } else {
                "Start Time Warp"
            },
        }
    }
}

/// How a [`Session::start_transform`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// No source image; nothing happened.
    NoSource,
    /// Another transformation is in flight; nothing happened.
    AlreadyBusy,
    Completed(HistoryEntry),
    Failed(String),
}

pub struct Session {
    transformer: Arc<dyn Transformer>,
    codec: ImageCodec,
    state: Mutex<SessionState>,
    updates: watch::Sender<SessionSnapshot>,
}

impl Session {
    pub fn new(transformer: Arc<dyn Transformer>) -> Self {
        let state = SessionState::new();
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            transformer,
            codec: ImageCodec::new(),
            state: Mutex::new(state),
            updates,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &mut SessionState) {
        state.version += 1;
        self.updates.send_replace(state.snapshot());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Receives a snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn select_file(
        &self,
        data: &[u8],
        declared_media_type: Option<&str>,
    ) -> Result<(), TimeMachineError> {
        // Encoding can take a while for large pictures; keep it outside the lock.
        let image = match self.codec.encode(data, declared_media_type) {
            Ok(image) => image,
            Err(e) => return Err(self.reject_file(e)),
        };

        let mut state = self.lock();
        if state.is_busy() {
            return Err(TimeMachineError::SessionBusy);
        }
        debug!("Source image selected ({}, {} bytes)", image.media_type, data.len());
        state.source = Some(image);
        state.transformed = None;
        state.error = None;
        self.publish(&mut state);
        Ok(())
    }

    /// Records a file that could not become a source image. Only the error
    /// slot changes; while busy nothing changes and `SessionBusy` comes back.
    pub fn reject_file(&self, error: TimeMachineError) -> TimeMachineError {
        let mut state = self.lock();
        if state.is_busy() {
            return TimeMachineError::SessionBusy;
        }
        warn!("Could not load selected file: {}", error);
        state.error = Some(UNREADABLE_FILE_MESSAGE.to_string());
        self.publish(&mut state);
        error
    }

    pub fn select_era(&self, era: EraId) {
        let mut state = self.lock();
        state.selected_era = eras::era(era);
        debug!("Era selected: {}", era);
        self.publish(&mut state);
    }

    pub async fn start_transform(&self) -> TransformOutcome {
        let (source, era) = {
            let mut state = self.lock();
            let Some(source) = state.source.clone() else {
                return TransformOutcome::NoSource;
            };
            if state.is_busy() {
                return TransformOutcome::AlreadyBusy;
            }
            state.busy_since = Some(Instant::now());
            state.error = None;
            self.publish(&mut state);
            (source, state.selected_era)
        };

        let guard = BusyGuard::new(self);
        info!("Starting {} transformation", era.id);
        let result = self.transformer.transform(&source, era).await;

        match result {
            Ok(image) => {
                let timestamp = chrono::Utc::now().timestamp_millis();
                let entry = guard.settle(|state| {
                    state.transformed = Some(TransformedImage {
                        era: era.id,
                        image: image.clone(),
                    });
                    state.history.record(era.id, image, timestamp)
                });
                info!("{} transformation complete", era.id);
                TransformOutcome::Completed(entry)
            }
            Err(e) => {
                let mut message = e.to_string();
                if message.trim().is_empty() {
                    message = UNEXPECTED_ERROR_MESSAGE.to_string();
                }
                warn!("{} transformation failed: {}", era.id, message);
                let reported = message.clone();
                guard.settle(move |state| state.error = Some(reported));
                TransformOutcome::Failed(message)
            }
        }
    }

    pub fn reset(&self) -> Result<(), TimeMachineError> {
        let mut state = self.lock();
        if state.is_busy() {
            return Err(TimeMachineError::SessionBusy);
        }
        state.source = None;
        state.transformed = None;
        state.error = None;
        debug!("Session reset");
        self.publish(&mut state);
        Ok(())
    }

    pub fn download_result(&self) -> Result<DownloadPayload, TimeMachineError> {
        let transformed = self
            .lock()
            .transformed
            .clone()
            .ok_or_else(|| TimeMachineError::NothingToDownload("no transformed image yet".into()))?;
        self.codec.download_payload(&transformed.image, transformed.era)
    }

    pub fn download_history(&self, id: &Uuid) -> Result<DownloadPayload, TimeMachineError> {
        let entry = self
            .lock()
            .history
            .get(id)
            .cloned()
            .ok_or_else(|| TimeMachineError::NothingToDownload(format!("history entry {}", id)))?;
        self.codec.download_payload(&entry.image_url, entry.era)
    }

    /// Applies the outcome of the in-flight call and clears the busy flag.
    fn finish<R>(&self, apply: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.lock();
        let out = apply(&mut *state);
        state.busy_since = None;
        self.publish(&mut state);
        out
    }
}

/// Clears the busy flag if the in-flight call never reports back, either
/// because its future was dropped or because the transformer panicked.
struct BusyGuard<'a> {
    session: &'a Session,
    armed: bool,
}

impl<'a> BusyGuard<'a> {
    fn new(session: &'a Session) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    fn settle<R>(mut self, apply: impl FnOnce(&mut SessionState) -> R) -> R {
        self.armed = false;
        self.session.finish(apply)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Transformation abandoned while in flight");
            self.session
                .finish(|state| state.error = Some(INTERRUPTED_MESSAGE.to_string()));
        }
    }
}
