//! Notification subscribers and the fan-out set.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Notification;

/// A subscriber could not take a notification.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Delivery failed: {0}")]
    Rejected(String),
}

/// A named receiver of change notifications.
pub trait Subscriber: Send + Sync {
    /// Identity used for registration and removal. Names need not be unique.
    fn name(&self) -> &str;

    /// Handle one notification.
    fn receive(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Registration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Subscriber name cannot be empty")]
    EmptyIdentity,

    #[error("Subscriber not found: {0}")]
    NotFound(String),
}

/// Ordered set of subscribers behind a single lock.
///
/// Registration, removal and delivery all take the same mutex, so a
/// subscriber is never called after `remove` has returned.
#[derive(Default)]
pub struct SubscriberSet {
    subscribers: Mutex<Vec<Arc<dyn Subscriber>>>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    // Deliveries run under `catch_unwind`, so a poisoned lock still holds a
    // consistent list.
    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn Subscriber>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a subscriber. Duplicate names are kept.
    pub fn add(&self, subscriber: Arc<dyn Subscriber>) -> Result<(), SubscriptionError> {
        if subscriber.name().is_empty() {
            return Err(SubscriptionError::EmptyIdentity);
        }
        self.lock().push(subscriber);
        Ok(())
    }

    /// Remove the first subscriber registered under `name`.
    pub fn remove_by_name(&self, name: &str) -> Result<(), SubscriptionError> {
        let mut subscribers = self.lock();
        let idx = subscribers
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| SubscriptionError::NotFound(name.to_string()))?;
        subscribers.remove(idx);
        Ok(())
    }

    pub fn remove(&self, subscriber: &dyn Subscriber) -> Result<(), SubscriptionError> {
        self.remove_by_name(subscriber.name())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|s| s.name().to_string()).collect()
    }

    /// Deliver to every subscriber in registration order.
    ///
    /// Failures are logged and skipped. Returns how many deliveries succeeded.
    pub fn broadcast(&self, notification: &Notification) -> usize {
        let subscribers = self.lock();
        let mut delivered = 0;

        for subscriber in subscribers.iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.receive(notification)));
            match outcome {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!(
                    subscriber = %subscriber.name(),
                    error = %e,
                    "Notification delivery failed"
                ),
                Err(_) => warn!(
                    subscriber = %subscriber.name(),
                    "Subscriber panicked during notification delivery"
                ),
            }
        }

        debug!(
            subscribers = subscribers.len(),
            delivered,
            message = %notification.message,
            "Broadcast notification"
        );
        delivered
    }
}

/// In-process sink that keeps every notification it receives.
#[derive(Debug)]
pub struct RecordingSubscriber {
    name: String,
    received: Mutex<Vec<Notification>>,
}

impl RecordingSubscriber {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Notifications received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Subscriber for RecordingSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}

/// Writes each notification as one line of JSON.
pub struct JsonLinesSubscriber<W> {
    name: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSubscriber<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect a buffer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Subscriber for JsonLinesSubscriber<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let line = notification.to_json()?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| DeliveryError::Rejected("writer lock poisoned".into()))?;
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}
