//! DispatchOutboundHandler - Fans pending bus events out to subscribers.
//!
//! One pass takes a batch of pending events and POSTs each one to every
//! active subscriber in turn. Every attempt is logged as a delivery row and
//! feeds the subscriber's health counters. An event is marked dispatched after
//! its fan-out whatever the individual outcomes; failed deliveries carry a
//! `next_retry_at` marker and are not retried here.
//!
//! Fetching and marking are not done under a claim, so two concurrent passes
//! can both deliver the same event.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::outbound::{
    DeliveryEnvelope, EventBusEntry, OutboundDelivery, OutboundSubscription, SignedDelivery,
};
use crate::ports::{
    DeliveryLog, EventBusRepository, OutboundSubscriptionRepository, WebhookSender,
};

/// Tuning of a dispatch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub batch_size: u32,
    pub retry_delay: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            retry_delay: Duration::from_secs(300),
        }
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Events marked dispatched.
    pub processed: usize,
    /// Delivery attempts made.
    pub deliveries: usize,
    /// Attempts that did not get a 2xx.
    pub failed_deliveries: usize,
}

pub struct DispatchOutboundHandler {
    bus: Arc<dyn EventBusRepository>,
    subscriptions: Arc<dyn OutboundSubscriptionRepository>,
    deliveries: Arc<dyn DeliveryLog>,
    sender: Arc<dyn WebhookSender>,
    options: DispatchOptions,
}

impl DispatchOutboundHandler {
    pub fn new(
        bus: Arc<dyn EventBusRepository>,
        subscriptions: Arc<dyn OutboundSubscriptionRepository>,
        deliveries: Arc<dyn DeliveryLog>,
        sender: Arc<dyn WebhookSender>,
        options: DispatchOptions,
    ) -> Self {
        Self {
            bus,
            subscriptions,
            deliveries,
            sender,
            options,
        }
    }

    /// Runs one pass. Fails only when events or subscribers cannot be loaded.
    pub async fn dispatch_once(&self) -> Result<DispatchReport, DomainError> {
        let events = self.bus.fetch_pending(self.options.batch_size).await?;
        if events.is_empty() {
            return Ok(DispatchReport::default());
        }

        let subscribers = self.subscriptions.list_active().await?;
        if subscribers.is_empty() {
            tracing::debug!(pending = events.len(), "No active subscribers, events left pending");
            return Ok(DispatchReport::default());
        }

        let mut report = DispatchReport::default();
        for event in &events {
            self.fan_out(event, &subscribers, &mut report).await;

            match self.bus.mark_dispatched(&event.id, Timestamp::now()).await {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    tracing::error!(event_id = %event.id, error = %e, "Failed to mark event dispatched")
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            deliveries = report.deliveries,
            failed = report.failed_deliveries,
            "Outbound dispatch pass complete"
        );
        Ok(report)
    }

    async fn fan_out(
        &self,
        event: &EventBusEntry,
        subscribers: &[OutboundSubscription],
        report: &mut DispatchReport,
    ) {
        let body = match DeliveryEnvelope::from_entry(event, Timestamp::now()).to_bytes() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(event_id = %event.id, error = %e, "Cannot build delivery envelope");
                return;
            }
        };

        for subscriber in subscribers {
            let delivery = SignedDelivery::new(body.clone(), subscriber.signing_secret());
            let delivered = self.deliver(event, subscriber, &delivery).await;

            report.deliveries += 1;
            if !delivered {
                report.failed_deliveries += 1;
            }
        }
    }

    /// Sends one delivery and records it. Returns whether it got a 2xx.
    async fn deliver(
        &self,
        event: &EventBusEntry,
        subscriber: &OutboundSubscription,
        delivery: &SignedDelivery,
    ) -> bool {
        let outcome = self.sender.send(&subscriber.target_url, delivery).await;
        let now = Timestamp::now();
        let next_retry_at = now.plus_secs(self.options.retry_delay.as_secs() as i64);

        let record = match &outcome {
            Ok(response) if response.is_success() => OutboundDelivery::delivered(
                event.id,
                subscriber.id,
                i32::from(response.status),
                &response.body,
            ),
            Ok(response) => OutboundDelivery::failed(
                event.id,
                subscriber.id,
                Some(i32::from(response.status)),
                &response.body,
                next_retry_at,
            ),
            Err(e) => {
                OutboundDelivery::failed(event.id, subscriber.id, None, &e.to_string(), next_retry_at)
            }
        };
        let delivered = record.is_delivered();

        if let Err(e) = self.deliveries.record(&record).await {
            tracing::error!(event_id = %event.id, subscriber_id = %subscriber.id, error = %e, "Failed to record delivery");
        }

        let counters = if delivered {
            self.subscriptions.record_success(&subscriber.id, now).await
        } else {
            tracing::warn!(
                event_id = %event.id,
                subscriber = %subscriber.name,
                status = ?record.response_code,
                "Outbound delivery failed"
            );
            self.subscriptions.record_failure(&subscriber.id).await
        };
        if let Err(e) = counters {
            tracing::error!(subscriber_id = %subscriber.id, error = %e, "Failed to update subscriber counters");
        }

        delivered
    }
}

/// Runs dispatch passes on an interval until shutdown.
pub struct OutboundDispatchLoop {
    handler: Arc<DispatchOutboundHandler>,
    poll_interval: Duration,
}

impl OutboundDispatchLoop {
    pub fn new(handler: Arc<DispatchOutboundHandler>, poll_interval: Duration) -> Self {
        Self {
            handler,
            poll_interval,
        }
    }

    /// Loops until `shutdown` turns true or its sender is dropped. A failed
    /// pass is logged and the loop carries on.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.poll_interval.as_secs(), "Outbound dispatch loop started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = self.handler.dispatch_once().await {
                        tracing::error!(error = %e, "Outbound dispatch pass failed");
                    }
                }
            }
        }
        tracing::info!("Outbound dispatch loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryDeliveryLog, InMemoryEventBus, InMemoryOutboundSubscriptions};
    use crate::domain::outbound::{BusEventStatus, DeliveryStatus, MAX_RESPONSE_BODY_CHARS};
    use crate::ports::{SendError, SenderResponse};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Scripted sender
    // ════════════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct ScriptedSender {
        replies: HashMap<String, Result<SenderResponse, SendError>>,
        sent: Mutex<Vec<(String, SignedDelivery)>>,
    }

    impl ScriptedSender {
        fn reply(mut self, url: &str, reply: Result<SenderResponse, SendError>) -> Self {
            self.replies.insert(url.to_string(), reply);
            self
        }

        fn sent(&self) -> Vec<(String, SignedDelivery)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookSender for ScriptedSender {
        async fn send(&self, url: &str, delivery: &SignedDelivery) -> Result<SenderResponse, SendError> {
            self.sent.lock().unwrap().push((url.to_string(), delivery.clone()));
            self.replies.get(url).cloned().unwrap_or(Ok(SenderResponse {
                status: 200,
                body: "ok".into(),
            }))
        }
    }

    struct Fixture {
        bus: Arc<InMemoryEventBus>,
        subs: Arc<InMemoryOutboundSubscriptions>,
        log: Arc<InMemoryDeliveryLog>,
        sender: Arc<ScriptedSender>,
        handler: DispatchOutboundHandler,
    }

    fn fixture(sender: ScriptedSender) -> Fixture {
        let bus = Arc::new(InMemoryEventBus::new());
        let subs = Arc::new(InMemoryOutboundSubscriptions::new());
        let log = Arc::new(InMemoryDeliveryLog::new());
        let sender = Arc::new(sender);
        let handler = DispatchOutboundHandler::new(
            bus.clone(),
            subs.clone(),
            log.clone(),
            sender.clone(),
            DispatchOptions::default(),
        );
        Fixture {
            bus,
            subs,
            log,
            sender,
            handler,
        }
    }

    fn event() -> EventBusEntry {
        EventBusEntry::pending("payment_succeeded", None, None, json!({"plan": "vip"}))
    }

    fn ok(status: u16) -> Result<SenderResponse, SendError> {
        Ok(SenderResponse {
            status,
            body: "resp".into(),
        })
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Fan-out
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn one_failing_subscriber_does_not_affect_the_other() {
        let f = fixture(
            ScriptedSender::default()
                .reply("https://a.test/hook", ok(200))
                .reply("https://b.test/hook", ok(500)),
        );
        let a = OutboundSubscription::new("a", "https://a.test/hook", None).unwrap();
        let b = OutboundSubscription::new("b", "https://b.test/hook", None).unwrap();
        f.subs.insert(a.clone()).await;
        f.subs.insert(b.clone()).await;
        let e = event();
        f.bus.push(e.clone()).await;

        let report = f.handler.dispatch_once().await.unwrap();

        assert_eq!(
            report,
            DispatchReport {
                processed: 1,
                deliveries: 2,
                failed_deliveries: 1
            }
        );

        let log = f.log.all().await;
        let for_a = log.iter().find(|d| d.target_id == a.id).unwrap();
        let for_b = log.iter().find(|d| d.target_id == b.id).unwrap();
        assert_eq!(for_a.status, DeliveryStatus::Delivered);
        assert_eq!(for_b.status, DeliveryStatus::Failed);
        assert_eq!(for_b.response_code, Some(500));

        assert_eq!(f.subs.get(&a.id).await.unwrap().failures_count, 0);
        assert!(f.subs.get(&a.id).await.unwrap().last_delivery_at.is_some());
        assert_eq!(f.subs.get(&b.id).await.unwrap().failures_count, 1);

        assert_eq!(f.bus.get(&e.id).await.unwrap().status, BusEventStatus::Dispatched);
    }

    #[tokio::test]
    async fn failed_delivery_is_marked_for_retry_after_delay() {
        let f = fixture(ScriptedSender::default().reply("https://a.test/hook", Err(SendError::Timeout)));
        f.subs
            .insert(OutboundSubscription::new("a", "https://a.test/hook", None).unwrap())
            .await;
        f.bus.push(event()).await;

        let before = Timestamp::now();
        f.handler.dispatch_once().await.unwrap();

        let delivery = &f.log.all().await[0];
        assert_eq!(delivery.status, DeliveryStatus::Failed);
        assert_eq!(delivery.response_code, None);
        let retry_at = delivery.next_retry_at.unwrap();
        let delay = retry_at.duration_since(&before);
        assert!(delay.num_seconds() >= 299 && delay.num_seconds() <= 301);
    }

    #[tokio::test]
    async fn failures_accumulate_and_success_resets() {
        let f = fixture(ScriptedSender::default().reply("https://a.test/hook", ok(503)));
        let sub = OutboundSubscription::new("a", "https://a.test/hook", None).unwrap();
        f.subs.insert(sub.clone()).await;
        f.bus.push(event()).await;
        f.bus.push(event()).await;

        f.handler.dispatch_once().await.unwrap();
        assert_eq!(f.subs.get(&sub.id).await.unwrap().failures_count, 2);

        let f2 = DispatchOutboundHandler::new(
            f.bus.clone(),
            f.subs.clone(),
            f.log.clone(),
            Arc::new(ScriptedSender::default()),
            DispatchOptions::default(),
        );
        f.bus.push(event()).await;
        f2.dispatch_once().await.unwrap();
        assert_eq!(f.subs.get(&sub.id).await.unwrap().failures_count, 0);
    }

    #[tokio::test]
    async fn signed_subscribers_get_a_signature() {
        let f = fixture(ScriptedSender::default());
        f.subs
            .insert(
                OutboundSubscription::new(
                    "signed",
                    "https://s.test/hook",
                    Some(SecretString::new("k".into())),
                )
                .unwrap(),
            )
            .await;
        f.subs
            .insert(OutboundSubscription::new("plain", "https://p.test/hook", None).unwrap())
            .await;
        f.bus.push(event()).await;

        f.handler.dispatch_once().await.unwrap();

        let sent = f.sender.sent();
        let signed = sent.iter().find(|(url, _)| url == "https://s.test/hook").unwrap();
        let plain = sent.iter().find(|(url, _)| url == "https://p.test/hook").unwrap();
        let expected = crate::domain::webhook::signature::signature_header_value(b"k", &signed.1.body);
        assert_eq!(signed.1.signature.as_deref(), Some(expected.as_str()));
        assert!(plain.1.signature.is_none());
    }

    #[tokio::test]
    async fn envelope_carries_event_fields() {
        let f = fixture(ScriptedSender::default());
        f.subs
            .insert(OutboundSubscription::new("a", "https://a.test/hook", None).unwrap())
            .await;
        let e = event();
        f.bus.push(e.clone()).await;

        f.handler.dispatch_once().await.unwrap();

        let (_, delivery) = &f.sender.sent()[0];
        let body: serde_json::Value = serde_json::from_slice(&delivery.body).unwrap();
        assert_eq!(body["event_id"], e.id.to_string());
        assert_eq!(body["event_type"], "payment_succeeded");
        assert_eq!(body["data"]["plan"], "vip");
        assert!(body["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn long_response_bodies_are_truncated() {
        let long = "x".repeat(MAX_RESPONSE_BODY_CHARS + 500);
        let f = fixture(ScriptedSender::default().reply(
            "https://a.test/hook",
            Ok(SenderResponse {
                status: 400,
                body: long,
            }),
        ));
        f.subs
            .insert(OutboundSubscription::new("a", "https://a.test/hook", None).unwrap())
            .await;
        f.bus.push(event()).await;

        f.handler.dispatch_once().await.unwrap();

        let body = f.log.all().await[0].response_body.clone().unwrap();
        assert_eq!(body.chars().count(), MAX_RESPONSE_BODY_CHARS);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Batch boundaries
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn without_subscribers_events_stay_pending() {
        let f = fixture(ScriptedSender::default());
        let e = event();
        f.bus.push(e.clone()).await;

        let report = f.handler.dispatch_once().await.unwrap();

        assert_eq!(report.processed, 0);
        assert!(f.bus.get(&e.id).await.unwrap().is_pending());
        assert!(f.sender.sent().is_empty());
    }

    #[tokio::test]
    async fn batch_size_bounds_a_pass() {
        let f = fixture(ScriptedSender::default());
        f.subs
            .insert(OutboundSubscription::new("a", "https://a.test/hook", None).unwrap())
            .await;
        for _ in 0..12 {
            f.bus.push(event()).await;
        }

        assert_eq!(f.handler.dispatch_once().await.unwrap().processed, 10);
        assert_eq!(f.handler.dispatch_once().await.unwrap().processed, 2);
        assert_eq!(f.handler.dispatch_once().await.unwrap().processed, 0);
    }

    #[tokio::test]
    async fn inactive_subscribers_are_skipped() {
        let f = fixture(ScriptedSender::default());
        let sub = OutboundSubscription::new("a", "https://a.test/hook", None).unwrap();
        f.subs.insert(sub.clone()).await;
        f.subs.deactivate(&sub.id).await.unwrap();
        f.bus.push(event()).await;

        let report = f.handler.dispatch_once().await.unwrap();
        assert_eq!(report.deliveries, 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Loop
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn loop_dispatches_and_stops_on_shutdown() {
        let f = fixture(ScriptedSender::default());
        f.subs
            .insert(OutboundSubscription::new("a", "https://a.test/hook", None).unwrap())
            .await;
        let e = event();
        f.bus.push(e.clone()).await;

        let bus = f.bus.clone();
        let dispatch_loop = OutboundDispatchLoop::new(Arc::new(f.handler), Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(async move { dispatch_loop.run(rx).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();

        assert!(!bus.get(&e.id).await.unwrap().is_pending());
    }
}
