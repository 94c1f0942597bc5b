//! Per-webhook event batching.
//!
//! Events for a batching webhook are queued until either `max_batch_size` is
//! reached or `max_wait_time` has passed since the first queued event. The
//! queued events are then delivered together as one synthetic event built by
//! [`batch_event`].
//!
//! Every flush bumps the queue's generation. A timer only flushes if the
//! generation it was started with is still current, so an event is never
//! delivered twice or dropped when a size flush races a timer.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;

use super::types::WebhookEvent;
use crate::config::{BatchDeliveryOptions, WebhookId};

/// Event type of a batched delivery.
pub const BATCH_EVENT_TYPE: &str = "batch";

#[derive(Debug, Default)]
struct BatchQueue {
    events: Vec<WebhookEvent>,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

impl BatchQueue {
    fn flush(&mut self) -> Vec<WebhookEvent> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation = self.generation.wrapping_add(1);
        std::mem::take(&mut self.events)
    }
}

/// Buffers events per webhook until a batch is ready.
#[derive(Debug)]
pub struct BatchAccumulator {
    options: BatchDeliveryOptions,
    queues: Mutex<HashMap<WebhookId, BatchQueue>>,
}

impl BatchAccumulator {
    /// Creates an accumulator with the given limits.
    #[must_use]
    pub fn new(options: BatchDeliveryOptions) -> Self {
        Self {
            options,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the batching limits.
    #[must_use]
    pub const fn options(&self) -> &BatchDeliveryOptions {
        &self.options
    }

    /// Queues an event.
    ///
    /// Returns the full batch if this event filled it. Otherwise, if no timer
    /// is running for the webhook, `start_timer` is called with the current
    /// generation and must return the spawned timer task.
    pub fn accept<F>(&self, webhook_id: WebhookId, event: WebhookEvent, start_timer: F) -> Option<Vec<WebhookEvent>>
    where
        F: FnOnce(u64) -> JoinHandle<()>,
    {
        let mut queues = self.queues.lock();
        let queue = queues.entry(webhook_id).or_default();
        queue.events.push(event);

        if queue.events.len() >= self.options.max_batch_size {
            return Some(queue.flush());
        }
        if queue.timer.is_none() {
            queue.timer = Some(start_timer(queue.generation));
        }
        None
    }

    /// Takes the queued events on behalf of the timer started at `generation`.
    ///
    /// Returns `None` if a flush has happened since the timer started.
    pub fn take_expired(&self, webhook_id: WebhookId, generation: u64) -> Option<Vec<WebhookEvent>> {
        let mut queues = self.queues.lock();
        let queue = queues.get_mut(&webhook_id)?;
        if queue.generation != generation {
            return None;
        }
        // The calling task is the timer; drop its handle rather than abort it.
        queue.timer = None;
        queue.generation = queue.generation.wrapping_add(1);
        let events = std::mem::take(&mut queue.events);
        (!events.is_empty()).then_some(events)
    }

    /// Takes the queued events for a webhook now, cancelling its timer.
    pub fn take(&self, webhook_id: WebhookId) -> Vec<WebhookEvent> {
        self.queues
            .lock()
            .get_mut(&webhook_id)
            .map(BatchQueue::flush)
            .unwrap_or_default()
    }

    /// Returns the number of queued events for a webhook.
    #[must_use]
    pub fn pending(&self, webhook_id: WebhookId) -> usize {
        self.queues
            .lock()
            .get(&webhook_id)
            .map_or(0, |queue| queue.events.len())
    }

    /// Forgets a webhook, cancelling its timer and returning queued events.
    pub fn remove(&self, webhook_id: WebhookId) -> Vec<WebhookEvent> {
        self.queues
            .lock()
            .remove(&webhook_id)
            .map(|mut queue| queue.flush())
            .unwrap_or_default()
    }

    /// Takes every non-empty queue, cancelling all timers.
    pub fn drain_all(&self) -> Vec<(WebhookId, Vec<WebhookEvent>)> {
        self.queues
            .lock()
            .iter_mut()
            .map(|(id, queue)| (*id, queue.flush()))
            .filter(|(_, events)| !events.is_empty())
            .collect()
    }
}

/// Builds the synthetic event that carries a batch.
///
/// The payload is `{"events": [...]}` with each event in its wire form, and
/// the metadata holds `batch_size` and the list of `event_types`.
#[must_use]
pub fn batch_event(events: &[WebhookEvent]) -> WebhookEvent {
    let wire: Vec<Value> = events.iter().map(WebhookEvent::to_wire).collect();
    let event_types: Vec<&str> = events.iter().map(WebhookEvent::event_type).collect();

    let mut metadata = Map::new();
    metadata.insert("batch_size".to_string(), json!(events.len()));
    metadata.insert("event_types".to_string(), json!(event_types));

    WebhookEvent::new(BATCH_EVENT_TYPE, json!({ "events": wire })).with_metadata(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn accumulator(size: usize) -> BatchAccumulator {
        BatchAccumulator::new(BatchDeliveryOptions::new(size, Duration::from_secs(60)))
    }

    fn event(n: u64) -> WebhookEvent {
        WebhookEvent::new(format!("order.{n}"), json!({ "n": n }))
    }

    fn idle_timer(_generation: u64) -> JoinHandle<()> {
        tokio::spawn(std::future::pending())
    }

    #[tokio::test]
    async fn test_flushes_at_max_size() {
        let batches = accumulator(3);
        let id = WebhookId::generate();

        assert!(batches.accept(id, event(1), idle_timer).is_none());
        assert!(batches.accept(id, event(2), idle_timer).is_none());
        assert_eq!(batches.pending(id), 2);

        let flushed = batches.accept(id, event(3), idle_timer).unwrap();
        assert_eq!(flushed.len(), 3);
        assert_eq!(batches.pending(id), 0);
    }

    #[tokio::test]
    async fn test_timer_started_once_per_batch() {
        let batches = accumulator(10);
        let id = WebhookId::generate();
        let mut started = Vec::new();

        for n in 0..3 {
            batches.accept(id, event(n), |generation| {
                started.push(generation);
                idle_timer(generation)
            });
        }
        assert_eq!(started, vec![0]);
    }

    #[tokio::test]
    async fn test_stale_timer_does_not_flush() {
        let batches = accumulator(10);
        let id = WebhookId::generate();

        batches.accept(id, event(1), idle_timer);
        assert_eq!(batches.take(id).len(), 1);

        batches.accept(id, event(2), idle_timer);
        // Timer from generation 0 fires late.
        assert!(batches.take_expired(id, 0).is_none());
        assert_eq!(batches.pending(id), 1);

        let expired = batches.take_expired(id, 1).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(batches.pending(id), 0);
    }

    #[tokio::test]
    async fn test_remove_and_drain_all() {
        let batches = accumulator(10);
        let a = WebhookId::generate();
        let b = WebhookId::generate();
        batches.accept(a, event(1), idle_timer);
        batches.accept(b, event(2), idle_timer);
        batches.accept(b, event(3), idle_timer);

        assert_eq!(batches.remove(a).len(), 1);
        assert_eq!(batches.pending(a), 0);

        let drained = batches.drain_all();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, b);
        assert_eq!(drained[0].1.len(), 2);
        assert!(batches.drain_all().is_empty());
    }

    #[test]
    fn test_batch_event_shape() {
        let events = vec![event(1), event(2)];
        let batch = batch_event(&events);

        assert_eq!(batch.event_type(), BATCH_EVENT_TYPE);
        let wire = batch.payload()["events"].as_array().unwrap();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0]["type"], "order.1");
        assert_eq!(wire[1]["data"]["n"], 2);

        let metadata = batch.metadata().unwrap();
        assert_eq!(metadata["batch_size"], 2);
        assert_eq!(metadata["event_types"], json!(["order.1", "order.2"]));
    }
}
