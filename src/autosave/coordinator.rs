// Debounced auto-save of field values with optimistic apply and rollback

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::autosave::save_state::EditableValue;
use crate::core::{FieldId, VideoId};
use crate::error::{AppError, AppResult};
use crate::fields::FieldValue;
use crate::videos::{BatchUpdateResponse, FieldUpdateErrorKind, FieldValueUpdate};

/// Destination of debounced saves
#[async_trait]
pub trait ValueSink: Send + Sync + 'static {
    async fn save_values(
        &self,
        video_id: VideoId,
        updates: Vec<FieldValueUpdate>,
    ) -> AppResult<BatchUpdateResponse>;
}

type SlotKey = (VideoId, FieldId);

struct Slot {
    value: EditableValue,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every cancel; a timer that woke for an older generation
    /// must not dispatch
    timer_gen: u64,
    /// Distinguishes a re-tracked slot from the one a save started on
    epoch: u64,
}

impl Slot {
    fn cancel_timer(&mut self) {
        self.timer_gen += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Inner<S> {
    sink: Arc<S>,
    debounce: Duration,
    slots: Mutex<HashMap<SlotKey, Slot>>,
    next_epoch: Mutex<u64>,
}

/// Per-(video, field) debounce and save tracking.
///
/// Each edit restarts the field's timer; when it expires the latest value
/// goes out as a single batch update. At most one save per field is in
/// flight. Torn-down slots have their timers aborted and any late result
/// dropped.
pub struct AutoSaveCoordinator<S: ValueSink> {
    inner: Arc<Inner<S>>,
}

impl<S: ValueSink> Clone for AutoSaveCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ValueSink> AutoSaveCoordinator<S> {
    pub fn new(sink: Arc<S>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink,
                debounce,
                slots: Mutex::new(HashMap::new()),
                next_epoch: Mutex::new(0),
            }),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }

    /// Start tracking a field with its server-confirmed value.
    /// An already tracked slot is left untouched.
    pub fn track(&self, video_id: VideoId, field_id: FieldId, confirmed: Option<FieldValue>) {
        let epoch = self.inner.bump_epoch();
        self.inner
            .slots()
            .entry((video_id, field_id))
            .or_insert_with(|| Slot {
                value: EditableValue::new(confirmed),
                timer: None,
                timer_gen: 0,
                epoch,
            });
    }

    /// Apply an edit locally and (re)start the debounce window
    pub fn edit(
        &self,
        video_id: VideoId,
        field_id: FieldId,
        value: Option<FieldValue>,
    ) -> AppResult<()> {
        let key = (video_id, field_id);
        let mut slots = self.inner.slots();
        let slot = slots.get_mut(&key).ok_or_else(|| {
            AppError::NotFound(format!("Field {} is not open for video {}", field_id, video_id))
        })?;

        slot.value.edit(value);
        slot.cancel_timer();

        let inner = Arc::clone(&self.inner);
        let debounce = self.inner.debounce;
        let generation = slot.timer_gen;
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            inner.timer_fired(key, generation);
        }));
        debug!("Debounce restarted for field {} on video {}", field_id, video_id);
        Ok(())
    }

    /// Dispatch a pending edit now instead of waiting for the timer
    pub fn flush(&self, video_id: VideoId, field_id: FieldId) {
        let key = (video_id, field_id);
        let mut slots = self.inner.slots();
        if let Some(slot) = slots.get_mut(&key) {
            slot.cancel_timer();
            Inner::dispatch(&self.inner, key, slot);
        }
    }

    /// Re-send a value whose last save failed in transport
    pub fn retry(&self, video_id: VideoId, field_id: FieldId) -> bool {
        let key = (video_id, field_id);
        let mut slots = self.inner.slots();
        match slots.get_mut(&key) {
            Some(slot) => {
                if !slot.value.retry() {
                    return false;
                }
                slot.cancel_timer();
                Inner::dispatch(&self.inner, key, slot);
                true
            }
            None => false,
        }
    }

    /// Tear down one editor slot. Its pending timer never fires.
    pub fn cancel(&self, video_id: VideoId, field_id: FieldId) -> bool {
        match self.inner.slots().remove(&(video_id, field_id)) {
            Some(mut slot) => {
                slot.cancel_timer();
                true
            }
            None => false,
        }
    }

    /// Tear down every slot of a video
    pub fn close_video(&self, video_id: VideoId) -> usize {
        let mut slots = self.inner.slots();
        let keys: Vec<SlotKey> = slots.keys().filter(|(v, _)| *v == video_id).copied().collect();
        for key in &keys {
            if let Some(mut slot) = slots.remove(key) {
                slot.cancel_timer();
            }
        }
        keys.len()
    }

    pub fn shutdown(&self) {
        let mut slots = self.inner.slots();
        let count = slots.len();
        for (_, mut slot) in slots.drain() {
            slot.cancel_timer();
        }
        info!("Auto-save coordinator shut down, {} slots dropped", count);
    }

    pub fn snapshot(&self, video_id: VideoId, field_id: FieldId) -> Option<EditableValue> {
        self.inner
            .slots()
            .get(&(video_id, field_id))
            .map(|slot| slot.value.clone())
    }

    pub fn has_pending_timer(&self, video_id: VideoId, field_id: FieldId) -> bool {
        self.inner
            .slots()
            .get(&(video_id, field_id))
            .is_some_and(|slot| slot.timer.as_ref().is_some_and(|t| !t.is_finished()))
    }
}

impl<S: ValueSink> Inner<S> {
    fn slots(&self) -> MutexGuard<'_, HashMap<SlotKey, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bump_epoch(&self) -> u64 {
        let mut next = self.next_epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *next += 1;
        *next
    }

    fn timer_fired(self: &Arc<Self>, key: SlotKey, generation: u64) {
        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(&key) {
            // Restarted or cancelled while this timer waited for the lock
            if slot.timer_gen != generation {
                return;
            }
            // This task is the slot's timer; dropping the handle detaches it
            slot.timer = None;
            Self::dispatch(self, key, slot);
        }
    }

    /// Start a save for the slot if it has one to send. The request runs on
    /// its own task so aborting a timer never cuts a save in half.
    fn dispatch(this: &Arc<Self>, key: SlotKey, slot: &mut Slot) {
        let Some(payload) = slot.value.begin_save() else {
            return;
        };
        let (video_id, field_id) = key;
        let epoch = slot.epoch;
        let inner = Arc::clone(this);
        debug!("Saving field {} on video {}", field_id, video_id);

        tokio::spawn(async move {
            let update = FieldValueUpdate {
                field_id,
                value: payload.map(|v| v.to_json()).unwrap_or(serde_json::Value::Null),
            };
            let result = inner.sink.save_values(video_id, vec![update]).await;
            inner.settle(key, epoch, result);
        });
    }

    fn settle(self: &Arc<Self>, key: SlotKey, epoch: u64, result: AppResult<BatchUpdateResponse>) {
        let (video_id, field_id) = key;
        let mut slots = self.slots();
        let slot = match slots.get_mut(&key) {
            Some(slot) if slot.epoch == epoch => slot,
            _ => {
                debug!("Dropping save result for closed field {} on video {}", field_id, video_id);
                return;
            }
        };

        match result {
            Ok(response) => {
                if let Some(error) = response.error_for(field_id) {
                    warn!("Save of field {} rejected: {}", field_id, error.message);
                    if error.kind == FieldUpdateErrorKind::Storage {
                        slot.value.complete_unavailable(error.message.clone());
                    } else {
                        slot.value.complete_err(error.message.clone());
                    }
                } else if let Some(updated) = response.updated_for(field_id) {
                    slot.value.complete_ok(updated.value.clone());
                } else {
                    warn!("Save of field {} was not acknowledged", field_id);
                    slot.value.complete_err("save was not acknowledged");
                }
            }
            Err(e) if e.is_retryable() => {
                warn!("Save of field {} failed in transport: {}", field_id, e);
                slot.value.complete_unavailable(e.to_string());
            }
            Err(e) => {
                warn!("Save of field {} failed: {}", field_id, e);
                slot.value.complete_err(e.to_string());
            }
        }

        // An edit that arrived mid-save and whose timer already expired
        if slot.value.needs_dispatch() && slot.timer.is_none() {
            Self::dispatch(self, key, slot);
        }
    }
}
