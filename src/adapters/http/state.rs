//! Shared application state for the HTTP surface.
//!
//! Handlers are built once from the port implementations and shared behind
//! `Arc`s; the state itself is cheap to clone per request.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::cache::CachedRoleLookup;
use crate::adapters::realtime::ChangeFeed;
use crate::application::handlers::admin::{
    CreateCheckoutLinkHandler, ProcessAutoStatusHandler, ProcessReferralHandler,
    RunSystemCleanupHandler,
};
use crate::application::handlers::chat::{
    ModerateChatHandler, ResolveChatRestrictionHandler, RestrictionWatchers,
};
use crate::application::handlers::outbound::{
    DispatchOptions, DispatchOutboundHandler, ManageSubscriptionsHandler,
};
use crate::application::handlers::tracking::ForwardConversionHandler;
use crate::application::handlers::webhook::{ManageWebhookEndpointsHandler, ReceiveWebhookHandler};
use crate::ports::{
    AutoStatusScheduler, CanonicalEventProcessor, ChatModeration, ChatRestrictionReader,
    CheckoutLinks, ConversionsApi, DeliveryLog, EventBusRepository,
    OutboundSubscriptionRepository, ReferralProcessor, RoleLookup, SessionValidator,
    SystemCleanup, TrackingConfigReader, TrackingEventLog, WebhookEndpointRepository,
    WebhookEventStore, WebhookSender,
};

/// Every port the service talks to.
///
/// `roles` should already be the cached lookup when `role_cache` is set.
pub struct AppPorts {
    pub session_validator: Arc<dyn SessionValidator>,
    pub roles: Arc<dyn RoleLookup>,
    pub role_cache: Option<Arc<CachedRoleLookup>>,

    pub webhook_endpoints: Arc<dyn WebhookEndpointRepository>,
    pub webhook_events: Arc<dyn WebhookEventStore>,
    pub canonical_processor: Arc<dyn CanonicalEventProcessor>,

    pub event_bus: Arc<dyn EventBusRepository>,
    pub outbound_subscriptions: Arc<dyn OutboundSubscriptionRepository>,
    pub deliveries: Arc<dyn DeliveryLog>,
    pub webhook_sender: Arc<dyn WebhookSender>,

    pub tracking_configs: Arc<dyn TrackingConfigReader>,
    pub tracking_events: Arc<dyn TrackingEventLog>,
    pub conversions_api: Arc<dyn ConversionsApi>,

    pub chat_reader: Arc<dyn ChatRestrictionReader>,
    pub chat_moderation: Arc<dyn ChatModeration>,
    pub change_feed: Arc<ChangeFeed>,

    pub cleanup: Arc<dyn SystemCleanup>,
    pub referrals: Arc<dyn ReferralProcessor>,
    pub checkout_links: Arc<dyn CheckoutLinks>,
    pub auto_status: Arc<dyn AutoStatusScheduler>,
}

/// Tunables that shape handler behavior.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub dispatch: DispatchOptions,
    pub chat_debounce: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            dispatch: DispatchOptions::default(),
            chat_debounce: Duration::from_millis(300),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session_validator: Arc<dyn SessionValidator>,
    pub roles: Arc<dyn RoleLookup>,

    pub receive_webhook: Arc<ReceiveWebhookHandler>,
    pub webhook_endpoints: Arc<ManageWebhookEndpointsHandler>,

    pub dispatch: Arc<DispatchOutboundHandler>,
    pub subscriptions: Arc<ManageSubscriptionsHandler>,

    pub forward_conversion: Arc<ForwardConversionHandler>,

    pub chat_restrictions: Arc<ResolveChatRestrictionHandler>,
    pub restriction_watchers: RestrictionWatchers,
    pub moderation: Arc<ModerateChatHandler>,

    pub cleanup: Arc<RunSystemCleanupHandler>,
    pub referrals: Arc<ProcessReferralHandler>,
    pub checkout: Arc<CreateCheckoutLinkHandler>,
    pub auto_status: Arc<ProcessAutoStatusHandler>,
}

impl AppState {
    pub fn new(ports: AppPorts, options: AppOptions) -> Self {
        let chat_restrictions = Arc::new(ResolveChatRestrictionHandler::new(
            ports.roles.clone(),
            ports.chat_reader.clone(),
        ));
        let mut restriction_watchers = RestrictionWatchers::new(
            chat_restrictions.clone(),
            ports.change_feed.clone(),
            options.chat_debounce,
        );
        if let Some(cache) = ports.role_cache.clone() {
            restriction_watchers = restriction_watchers.with_role_cache(cache);
        }

        Self {
            session_validator: ports.session_validator,
            roles: ports.roles.clone(),
            receive_webhook: Arc::new(ReceiveWebhookHandler::new(
                ports.webhook_endpoints.clone(),
                ports.webhook_events,
                ports.canonical_processor,
            )),
            webhook_endpoints: Arc::new(ManageWebhookEndpointsHandler::new(
                ports.webhook_endpoints,
            )),
            dispatch: Arc::new(DispatchOutboundHandler::new(
                ports.event_bus,
                ports.outbound_subscriptions.clone(),
                ports.deliveries,
                ports.webhook_sender,
                options.dispatch,
            )),
            subscriptions: Arc::new(ManageSubscriptionsHandler::new(
                ports.outbound_subscriptions,
            )),
            forward_conversion: Arc::new(ForwardConversionHandler::new(
                ports.tracking_configs,
                ports.tracking_events,
                ports.conversions_api,
            )),
            chat_restrictions,
            restriction_watchers,
            moderation: Arc::new(ModerateChatHandler::new(ports.roles, ports.chat_moderation)),
            cleanup: Arc::new(RunSystemCleanupHandler::new(ports.cleanup)),
            referrals: Arc::new(ProcessReferralHandler::new(ports.referrals)),
            checkout: Arc::new(CreateCheckoutLinkHandler::new(ports.checkout_links)),
            auto_status: Arc::new(ProcessAutoStatusHandler::new(ports.auto_status)),
        }
    }
}
