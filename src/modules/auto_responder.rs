//! Pattern-based chat replies.
//!
//! The first rule whose regex matches a chat line wins; the reply
//! `@<speaker> <response>` goes out after a random delay so the exchange
//! reads naturally. Pending replies are dropped when the unit is disabled.

use crate::config::AutoResponderConfig;
use crate::context::BotHandle;
use crate::error::{DispatchError, HookError};
use crate::events::{EventHandler, SubscriptionId};
use crate::registry::{Unit, UnitContext};
use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use yunshen_link::Event;
use yunshen_link::event::CHAT;

pub struct AutoResponder {
    config: AutoResponderConfig,
    rules: Arc<Vec<(Regex, String)>>,
    subscription: Option<SubscriptionId>,
    pending: CancellationToken,
}

impl AutoResponder {
    pub const NAME: &'static str = "AutoResponder";

    pub fn new(config: AutoResponderConfig) -> Self {
        Self {
            config,
            rules: Arc::new(Vec::new()),
            subscription: None,
            pending: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl Unit for AutoResponder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Replies to chat lines matching configured patterns"
    }

    async fn init(&mut self, _ctx: &UnitContext) -> Result<(), HookError> {
        let rules = self
            .config
            .replies
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.response.clone()))
                    .map_err(|e| HookError::failed(format!("bad pattern '{}': {e}", rule.pattern)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(rules = rules.len(), "auto-responder initialised");
        self.rules = Arc::new(rules);
        Ok(())
    }

    async fn on_enable(&mut self, ctx: &UnitContext) -> Result<(), HookError> {
        self.pending = CancellationToken::new();
        let min = self.config.min_delay_ms;
        let handler = Responder {
            rules: Arc::clone(&self.rules),
            delay_ms: (min, self.config.max_delay_ms.max(min)),
            pending: self.pending.clone(),
        };
        self.subscription = Some(ctx.dispatcher.subscribe(CHAT, Arc::new(handler)));
        Ok(())
    }

    async fn on_disable(&mut self, ctx: &UnitContext) -> Result<(), HookError> {
        self.pending.cancel();
        if let Some(id) = self.subscription.take() {
            ctx.dispatcher.unsubscribe(id);
        }
        Ok(())
    }
}

struct Responder {
    rules: Arc<Vec<(Regex, String)>>,
    delay_ms: (u64, u64),
    pending: CancellationToken,
}

impl Responder {
    fn reply_for(&self, text: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, response)| response.as_str())
    }
}

#[async_trait]
impl EventHandler for Responder {
    fn name(&self) -> &str {
        "auto-responder"
    }

    async fn execute(&self, bot: &BotHandle, event: &Event) -> Result<(), DispatchError> {
        let speaker = event.arg_str(0).ok_or(DispatchError::BadArgument(0))?;
        let text = event.arg_str(1).ok_or(DispatchError::BadArgument(1))?;
        if bot.is_self(speaker) {
            return Ok(());
        }
        let Some(response) = self.reply_for(text) else {
            return Ok(());
        };

        let reply = format!("@{speaker} {response}");
        let delay = Duration::from_millis(rand::thread_rng().gen_range(self.delay_ms.0..=self.delay_ms.1));
        debug!(speaker = %speaker, delay_ms = delay.as_millis() as u64, "auto-reply scheduled");

        let bot = bot.clone();
        let cancelled = self.pending.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Err(e) = bot.chat(&reply).await {
                        warn!(error = %e, "auto-reply not sent");
                    }
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ReplyRule};
    use crate::registry::Registry;
    use crate::registry::tests::unit_context;
    use yunshen_link::Connector;
    use yunshen_link::memory::MemoryConnector;

    fn rules(pairs: &[(&str, &str)]) -> AutoResponderConfig {
        AutoResponderConfig {
            replies: pairs
                .iter()
                .map(|(p, r)| ReplyRule {
                    pattern: p.to_string(),
                    response: r.to_string(),
                })
                .collect(),
            min_delay_ms: 1000,
            max_delay_ms: 3000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_match_replies_after_delay() {
        let connector = MemoryConnector::new();
        let link = connector.connect(&Config::default().connect_options()).await.unwrap();
        let mut server = connector.next_server().await.unwrap();
        let mut ctx = unit_context().await;
        ctx.bot = BotHandle::new(link.connection);

        let registry = Registry::plugins(ctx.clone(), Default::default());
        registry.register(Box::new(AutoResponder::new(rules(&[
            ("(?i)hello", "Hi there!"),
            ("(?i)hello|bye", "never used"),
        ]))));
        assert_eq!(registry.enable(AutoResponder::NAME).await, Ok(true));

        let started = tokio::time::Instant::now();
        ctx.dispatcher
            .dispatch(&ctx.bot, &Event::chat("Alice", "HELLO bot"))
            .await;
        ctx.dispatcher
            .dispatch(&ctx.bot, &Event::chat("bot", "hello myself"))
            .await;

        assert_eq!(server.next_chat().await.as_deref(), Some("@Alice Hi there!"));
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(1000) && waited <= Duration::from_millis(3000));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(server.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_cancels_pending_reply() {
        let connector = MemoryConnector::new();
        let link = connector.connect(&Config::default().connect_options()).await.unwrap();
        let mut server = connector.next_server().await.unwrap();
        let mut ctx = unit_context().await;
        ctx.bot = BotHandle::new(link.connection);

        let registry = Registry::plugins(ctx.clone(), Default::default());
        registry.register(Box::new(AutoResponder::new(rules(&[("thanks", "You're welcome!")]))));
        registry.enable(AutoResponder::NAME).await.unwrap();

        ctx.dispatcher
            .dispatch(&ctx.bot, &Event::chat("Alice", "thanks"))
            .await;
        registry.disable(AutoResponder::NAME).await.unwrap();
        assert_eq!(ctx.dispatcher.handler_count(CHAT), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(server.drain().is_empty());
    }

    #[tokio::test]
    async fn test_bad_pattern_fails_init() {
        let registry = Registry::plugins(unit_context().await, Default::default());
        registry.register(Box::new(AutoResponder::new(rules(&[("(oops", "x")]))));
        assert_eq!(registry.enable(AutoResponder::NAME).await, Ok(false));
        assert_eq!(registry.is_enabled(AutoResponder::NAME), Some(false));
    }
}
