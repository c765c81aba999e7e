use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use engine_link::{EngineInbox, EngineLink};
use event_channel::{ChannelSet, EventChannel, Notification, Stamp, Subscription};
use log::{debug, error, trace, warn};
use msg_abi::{MsgKind, Payload, RawEvent, StatusCode};
use parking_lot::Mutex;
use proxy_mirror::{EngineQuery, Mirrors};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::inspector::BridgeVM;
use crate::stats::{DispatchCounters, DispatchStats};
use crate::status::StatusSurface;

/// Shared handle to one bridge session. Clones refer to the same channels,
/// mirrors and status surface.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

/// Non-owning handle for subscribers that dispatch back into the bridge.
/// Holding a full [`Bridge`] inside a subscriber keeps the session alive.
#[derive(Clone)]
pub struct WeakBridge {
    inner: Weak<Inner>,
}

struct Inner {
    config: BridgeConfig,
    channels: ChannelSet,
    mirrors: Mirrors,
    status: StatusSurface,
    stats: DispatchStats,
    queue: Mutex<VecDeque<RawEvent>>,
    draining: AtomicBool,
    link: EngineLink,
    inbox: EngineInbox,
}

#[derive(Default)]
pub struct BridgeBuilder {
    engine: Option<Arc<dyn EngineQuery>>,
    config: Option<BridgeConfig>,
}

impl BridgeBuilder {
    pub fn engine(mut self, engine: Arc<dyn EngineQuery>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> BridgeResult<Bridge> {
        let engine = self.engine.ok_or(BridgeError::MissingEngine)?;
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(Bridge::assemble(engine, config))
    }
}

impl Bridge {
    /// Starts a builder; an engine is required.
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    /// Bridge with default configuration.
    pub fn new(engine: Arc<dyn EngineQuery>) -> Self {
        Self::assemble(engine, BridgeConfig::default())
    }

    fn assemble(engine: Arc<dyn EngineQuery>, config: BridgeConfig) -> Self {
        let (link, inbox) = engine_link::link();
        debug!(
            "bridge up: {} channels, pump budget {}",
            MsgKind::COUNT,
            config.pump_budget
        );
        Self {
            inner: Arc::new(Inner {
                config,
                channels: ChannelSet::new(),
                mirrors: Mirrors::new(engine),
                status: StatusSurface::new(),
                stats: DispatchStats::default(),
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                link,
                inbox,
            }),
        }
    }

    /// Non-owning handle for use inside subscribers.
    pub fn downgrade(&self) -> WeakBridge {
        WeakBridge {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// All event channels, one per kind.
    pub fn channels(&self) -> &ChannelSet {
        &self.inner.channels
    }

    /// Channel for `kind`.
    pub fn channel(&self, kind: MsgKind) -> &EventChannel {
        self.inner.channels.channel(kind)
    }

    /// Current count of `kind`'s channel.
    pub fn stamp(&self, kind: MsgKind) -> Stamp {
        self.inner.channels.stamp(kind)
    }

    /// Attaches `observer` to `kind`'s channel. It is called once right away
    /// with the current stamp, then on every later occurrence until the
    /// returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, kind: MsgKind, observer: F) -> Subscription
    where
        F: Fn(&Notification<'_>) + Send + Sync + 'static,
    {
        self.inner.channels.subscribe(kind, observer)
    }

    /// Engine state mirrors.
    pub fn mirrors(&self) -> &Mirrors {
        &self.inner.mirrors
    }

    /// Last error reported by the router.
    pub fn status(&self) -> &StatusSurface {
        &self.inner.status
    }

    /// Snapshot of the dispatch counters.
    pub fn stats(&self) -> DispatchCounters {
        self.inner.stats.snapshot()
    }

    /// View-model for debug front-ends.
    pub fn inspect(&self) -> BridgeVM {
        BridgeVM::capture(self)
    }

    /// Sender for engine code running on its own thread. Posted events are
    /// dispatched by [`Bridge::pump`] on the presentation side.
    pub fn link(&self) -> EngineLink {
        self.inner.link.clone()
    }

    /// Events posted through the link and not yet pumped.
    pub fn pending(&self) -> usize {
        self.inner.inbox.pending()
    }

    /// Dispatches up to the configured budget of posted events.
    pub fn pump(&self) -> usize {
        self.pump_budget(self.inner.config.pump_budget)
    }

    /// Dispatches up to `max` posted events; returns how many ran.
    pub fn pump_budget(&self, max: usize) -> usize {
        let events = self.inner.inbox.drain(max);
        let count = events.len();
        for event in events {
            self.dispatch(event);
        }
        if count > 0 {
            trace!("pumped {count} events, {} left", self.inner.inbox.pending());
        }
        count
    }

    /// The engine's callback entry point: tag plus four data words. Unused
    /// words are zero.
    pub fn on_event(&self, kind: i64, d1: i64, d2: i64, d3: i64, d4: i64) {
        self.dispatch(RawEvent::from_callback(kind, [d1, d2, d3, d4]));
    }

    /// Routes one raw event.
    ///
    /// If a dispatch is already running (a subscriber dispatching from its
    /// callback, or another thread) the event is queued and delivered after
    /// every event ahead of it has finished notifying. Returns once the
    /// queue is empty or another caller has taken over draining.
    pub fn dispatch(&self, raw: RawEvent) {
        let depth = {
            let mut queue = self.inner.queue.lock();
            queue.push_back(raw);
            queue.len()
        };
        self.inner.stats.observe_depth(depth);

        loop {
            if self
                .inner
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                self.inner.stats.record_queued_behind();
                return;
            }
            {
                let _guard = DrainGuard(&self.inner.draining);
                while let Some(event) = self.pop() {
                    self.process(event);
                }
            }
            // Another thread may have queued between the last pop and the
            // release without winning the flag.
            if self.inner.queue.lock().is_empty() {
                return;
            }
        }
    }

    fn pop(&self) -> Option<RawEvent> {
        self.inner.queue.lock().pop_front()
    }

    fn process(&self, raw: RawEvent) {
        let inner = &*self.inner;
        let kind = match MsgKind::from_raw(raw.id) {
            Ok(kind) => kind,
            Err(err) => {
                inner.stats.record_unknown();
                warn!("dropping event: {err}");
                if inner.config.report_unknown {
                    inner
                        .status
                        .report_unless_fatal(StatusCode::UnknownKind, err.to_string());
                }
                return;
            }
        };

        let value = match kind.shape().extract(kind, &raw) {
            Ok(value) => value,
            Err(err) => {
                inner.stats.record_malformed();
                warn!("{err}");
                if inner.config.report_malformed && !kind.is_fatal() {
                    inner
                        .status
                        .report_unless_fatal(StatusCode::MalformedArgs, err.to_string());
                }
                None
            }
        };

        if kind.is_fatal() {
            inner.stats.record_fatal();
            let engine_code = value.as_ref().map(Payload::primary);
            let message = fatal_message(kind, engine_code);
            error!("{message}");
            inner.status.report_fatal(engine_code, message);
        }

        self.refresh_mirrors(kind);

        let stamp = inner.channels.channel(kind).fire(value);
        inner.stats.record_dispatched();
        debug!("{kind} -> {stamp}");
    }

    fn refresh_mirrors(&self, kind: MsgKind) {
        let inner = &*self.inner;
        for mirror in inner.mirrors.affected_by(kind) {
            mirror.invalidate();
            if !inner.config.eager_refresh {
                continue;
            }
            if let Err(err) = mirror.refresh_now() {
                warn!("eager refresh after {kind} failed: {err}");
            }
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.inner.config)
            .field("mirrors", &self.inner.mirrors)
            .field("status", &self.inner.status.current())
            .field("queued", &self.inner.queue.lock().len())
            .finish()
    }
}

impl WeakBridge {
    pub fn upgrade(&self) -> Option<Bridge> {
        self.inner.upgrade().map(|inner| Bridge { inner })
    }

    /// Dispatches if the session is still alive; returns whether it was.
    pub fn dispatch(&self, raw: RawEvent) -> bool {
        match self.upgrade() {
            Some(bridge) => {
                bridge.dispatch(raw);
                true
            }
            None => false,
        }
    }
}

struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn fatal_message(kind: MsgKind, engine_code: Option<i64>) -> String {
    match (kind, engine_code) {
        (MsgKind::CpuHalt, _) => "CPU halted".to_owned(),
        (_, Some(code)) => format!("engine aborted with code {code}"),
        (_, None) => "engine aborted".to_owned(),
    }
}
