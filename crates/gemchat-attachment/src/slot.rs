//! The single pending-attachment slot

use crate::error::Result;
use crate::intake::{SelectedFile, validate_with_limit};
use gemchat_core::UploadedImage;
use gemchat_core::config::DEFAULT_MAX_ATTACHMENT_BYTES;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Marks one selection; only the newest ticket may fill the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTicket(u64);

#[derive(Default)]
struct SlotState {
    current: Option<UploadedImage>,
    latest: u64,
}

/// Holds at most one validated image until the next send.
///
/// Selecting a new file supersedes any selection still encoding; the older
/// result is dropped when it arrives.
pub struct AttachmentSlot {
    state: Mutex<SlotState>,
    max_bytes: u64,
}

impl Default for AttachmentSlot {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTACHMENT_BYTES)
    }
}

impl AttachmentSlot {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            state: Mutex::new(SlotState::default()),
            max_bytes,
        }
    }

    /// Validate `file` and, unless superseded meanwhile, make it the current image.
    ///
    /// `Ok(None)` means a newer selection won. On error the current image is kept.
    pub async fn select(&self, file: SelectedFile) -> Result<Option<UploadedImage>> {
        let ticket = self.begin();
        let result = validate_with_limit(file, self.max_bytes).await;
        self.finish(ticket, result)
    }

    /// Start a selection, superseding any in flight
    pub fn begin(&self) -> SelectionTicket {
        let mut state = self.lock();
        state.latest += 1;
        SelectionTicket(state.latest)
    }

    /// Apply the result of a selection started with [`AttachmentSlot::begin`]
    pub fn finish(
        &self,
        ticket: SelectionTicket,
        result: Result<UploadedImage>,
    ) -> Result<Option<UploadedImage>> {
        let mut state = self.lock();
        if ticket.0 != state.latest {
            tracing::debug!(ticket = ticket.0, latest = state.latest, "Dropping superseded attachment");
            return Ok(None);
        }

        let image = result?;
        state.current = Some(image.clone());
        Ok(Some(image))
    }

    /// Consume the current image for a send
    pub fn take(&self) -> Option<UploadedImage> {
        self.lock().current.take()
    }

    /// Discard the current image and any selection still in flight
    pub fn remove(&self) -> bool {
        let mut state = self.lock();
        state.latest += 1;
        state.current.take().is_some()
    }

    pub fn current(&self) -> Option<UploadedImage> {
        self.lock().current.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttachmentError;

    fn png(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/png", vec![1, 2, 3])
    }

    fn image(name: &str) -> UploadedImage {
        UploadedImage {
            mime_type: "image/png".to_string(),
            data: "AQID".to_string(),
            preview_url: format!("local-preview://test/{}", name),
        }
    }

    #[tokio::test]
    async fn test_select_then_take() {
        let slot = AttachmentSlot::default();
        let selected = slot.select(png("a.png")).await.unwrap().unwrap();

        assert_eq!(slot.current(), Some(selected.clone()));
        assert_eq!(slot.take(), Some(selected));
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_superseded_result_is_dropped() {
        let slot = AttachmentSlot::default();
        let first = slot.begin();
        let second = slot.begin();

        assert!(slot.finish(second, Ok(image("second"))).unwrap().is_some());
        assert!(slot.finish(first, Ok(image("first"))).unwrap().is_none());
        assert_eq!(slot.current(), Some(image("second")));
    }

    #[test]
    fn test_superseded_error_is_dropped() {
        let slot = AttachmentSlot::default();
        let first = slot.begin();
        let _second = slot.begin();

        let result = slot.finish(first, Err(AttachmentError::UnsupportedType("text/plain".into())));
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_failed_selection_keeps_current() {
        let slot = AttachmentSlot::default();
        let kept = slot.select(png("keep.png")).await.unwrap().unwrap();

        let rejected = SelectedFile::new("notes.txt", "text/plain", b"hi".to_vec());
        assert!(matches!(
            slot.select(rejected).await,
            Err(AttachmentError::UnsupportedType(_))
        ));
        assert_eq!(slot.current(), Some(kept));
    }

    #[test]
    fn test_remove_cancels_in_flight() {
        let slot = AttachmentSlot::default();
        let pending = slot.begin();

        assert!(!slot.remove());
        assert!(slot.finish(pending, Ok(image("late"))).unwrap().is_none());
        assert!(slot.current().is_none());
    }
}
