//! Input hub: owns the register, the priority gate and the listener bus, and
//! runs one decode/match/emit/dispatch cycle per input chunk.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use crate::config::{EnvConfig, DEFAULT_MOUNT_ACK_TICKS};
use crate::core::binding::KeyBindingSet;
use crate::core::error::{EngineError, EngineResult};
use crate::core::register::{DecodeOutcome, Keypress, Register};
use crate::platform::input_stream::InputStream;
use crate::runtime::priority::{Priority, PriorityGate};

/// Identity of one attached consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(u64);

impl ConsumerId {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

pub type KeypressHandler = Box<dyn FnMut(&Keypress)>;

/// Focus predicate supplied by the presentation tree.
pub trait FocusProbe {
    fn is_focused(&self) -> bool;
}

impl<F: Fn() -> bool> FocusProbe for F {
    fn is_focused(&self) -> bool {
        self()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFocused;

impl FocusProbe for AlwaysFocused {
    fn is_focused(&self) -> bool {
        true
    }
}

/// Shared page/item focus cells. A consumer is focused only when both are.
#[derive(Debug, Clone)]
pub struct FocusFlags {
    page: Rc<Cell<bool>>,
    item: Rc<Cell<bool>>,
}

impl Default for FocusFlags {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl FocusFlags {
    pub fn new(page: bool, item: bool) -> Self {
        Self {
            page: Rc::new(Cell::new(page)),
            item: Rc::new(Cell::new(item)),
        }
    }

    pub fn set_page(&self, focused: bool) {
        self.page.set(focused);
    }

    pub fn set_item(&self, focused: bool) {
        self.item.set(focused);
    }
}

impl FocusProbe for FocusFlags {
    fn is_focused(&self) -> bool {
        self.page.get() && self.item.get()
    }
}

/// Everything a consumer declares when it attaches.
pub struct ConsumerSpec {
    bindings: KeyBindingSet,
    priority: Priority,
    focus: Box<dyn FocusProbe>,
    listeners: Vec<(String, KeypressHandler)>,
}

impl ConsumerSpec {
    pub fn new(bindings: KeyBindingSet) -> Self {
        Self {
            bindings,
            priority: Priority::Default,
            focus: Box::new(AlwaysFocused),
            listeners: Vec::new(),
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn focus(mut self, focus: impl FocusProbe + 'static) -> Self {
        self.focus = Box::new(focus);
        self
    }

    pub fn on(mut self, command: impl Into<String>, handler: impl FnMut(&Keypress) + 'static) -> Self {
        self.listeners.push((command.into(), Box::new(handler)));
        self
    }
}

struct Consumer {
    bindings: KeyBindingSet,
    priority: Priority,
    focus: Box<dyn FocusProbe>,
    mounted: bool,
    unacked_ticks: u32,
}

/// Command-keyed handlers. Registering again for the same consumer and
/// command replaces the earlier handler.
#[derive(Default)]
struct ListenerBus {
    handlers: HashMap<String, Vec<(ConsumerId, KeypressHandler)>>,
}

impl ListenerBus {
    fn set(&mut self, id: ConsumerId, command: String, handler: KeypressHandler) {
        let slots = self.handlers.entry(command).or_default();
        match slots.iter_mut().find(|(owner, _)| *owner == id) {
            Some(slot) => slot.1 = handler,
            None => slots.push((id, handler)),
        }
    }

    fn remove(&mut self, id: ConsumerId, command: &str) {
        if let Some(slots) = self.handlers.get_mut(command) {
            slots.retain(|(owner, _)| *owner != id);
            if slots.is_empty() {
                self.handlers.remove(command);
            }
        }
    }

    fn remove_consumer(&mut self, id: ConsumerId) {
        self.handlers.retain(|_, slots| {
            slots.retain(|(owner, _)| *owner != id);
            !slots.is_empty()
        });
    }

    fn dispatch(&mut self, keypress: &Keypress, subscribed: &HashSet<ConsumerId>) -> usize {
        let Some(slots) = self.handlers.get_mut(&keypress.command) else {
            return 0;
        };
        let mut delivered = 0;
        for (owner, handler) in slots.iter_mut() {
            if subscribed.contains(owner) {
                handler(keypress);
                delivered += 1;
            }
        }
        delivered
    }

    fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubOptions {
    /// Ticks a new consumer has to acknowledge mounting.
    pub mount_ack_ticks: u32,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            mount_ack_ticks: DEFAULT_MOUNT_ACK_TICKS,
        }
    }
}

impl From<&EnvConfig> for HubOptions {
    fn from(config: &EnvConfig) -> Self {
        Self {
            mount_ack_ticks: config.mount_ack_ticks.max(1),
        }
    }
}

/// What one chunk did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Interrupted,
    Unmatched,
    Matched { command: String, delivered: usize },
}

impl CycleOutcome {
    pub fn command(&self) -> Option<&str> {
        match self {
            CycleOutcome::Matched { command, .. } => Some(command),
            _ => None,
        }
    }
}

pub struct InputHub<S: InputStream> {
    stream: S,
    register: Register,
    gate: PriorityGate,
    bus: ListenerBus,
    consumers: BTreeMap<ConsumerId, Consumer>,
    next_id: u64,
    options: HubOptions,
    listen_warned: bool,
    on_interrupt: Box<dyn FnMut()>,
}

#[cfg(unix)]
impl InputHub<crate::platform::process_input::ProcessInput> {
    /// Hub over process stdin, configured from the environment.
    pub fn from_env() -> Self {
        let config = EnvConfig::from_env();
        let stream = crate::platform::process_input::ProcessInput::new(&config);
        Self::new(stream, HubOptions::from(&config))
    }
}

impl<S: InputStream> InputHub<S> {
    pub fn new(stream: S, options: HubOptions) -> Self {
        Self {
            stream,
            register: Register::new(),
            gate: PriorityGate::new(),
            bus: ListenerBus::default(),
            consumers: BTreeMap::new(),
            next_id: 1,
            options,
            listen_warned: false,
            on_interrupt: Box::new(|| {
                std::process::exit(130);
            }),
        }
    }

    /// Replace what happens after an interrupt has released every listener.
    /// The default terminates the process.
    pub fn set_interrupt_handler(&mut self, handler: impl FnMut() + 'static) {
        self.on_interrupt = Box::new(handler);
    }

    /// Subscribe a consumer and make sure the stream is flowing.
    pub fn attach(&mut self, spec: ConsumerSpec) -> ConsumerId {
        let id = ConsumerId(self.next_id);
        self.next_id += 1;
        self.install(id, spec);
        tracing::debug!(consumer = id.raw(), "consumer attached");
        self.listen();
        id
    }

    /// Re-activate an existing identity, releasing its prior subscription first.
    pub fn reattach(&mut self, id: ConsumerId, spec: ConsumerSpec) -> EngineResult<()> {
        if !self.consumers.contains_key(&id) {
            return Err(EngineError::UnknownConsumer(id.raw()));
        }
        self.release(id);
        self.install(id, spec);
        self.listen();
        Ok(())
    }

    /// Unsubscribe a consumer. The stream is paused once nobody is left.
    pub fn detach(&mut self, id: ConsumerId) -> EngineResult<()> {
        if self.release(id).is_none() {
            return Err(EngineError::UnknownConsumer(id.raw()));
        }
        tracing::debug!(consumer = id.raw(), "consumer detached");
        if self.consumers.is_empty() {
            self.stream.pause();
        }
        Ok(())
    }

    pub fn on(
        &mut self,
        id: ConsumerId,
        command: impl Into<String>,
        handler: impl FnMut(&Keypress) + 'static,
    ) -> EngineResult<()> {
        self.consumer_mut(id)?;
        self.bus.set(id, command.into(), Box::new(handler));
        Ok(())
    }

    pub fn off(&mut self, id: ConsumerId, command: &str) -> EngineResult<()> {
        self.consumer_mut(id)?;
        self.bus.remove(id, command);
        Ok(())
    }

    pub fn set_priority(&mut self, id: ConsumerId, priority: Priority) -> EngineResult<()> {
        let consumer = self.consumer_mut(id)?;
        consumer.priority = priority;
        let focused = consumer.focus.is_focused();
        if focused {
            self.gate.update_priority(id, priority);
        }
        Ok(())
    }

    pub fn set_bindings(&mut self, id: ConsumerId, bindings: KeyBindingSet) -> EngineResult<()> {
        self.consumer_mut(id)?.bindings = bindings;
        Ok(())
    }

    pub fn acknowledge_mount(&mut self, id: ConsumerId) -> EngineResult<()> {
        let consumer = self.consumer_mut(id)?;
        consumer.mounted = true;
        consumer.unacked_ticks = 0;
        self.listen();
        Ok(())
    }

    /// Advance the liveness clock and return the consumers whose mount
    /// window ran out on this tick. Stale consumers stay attached; only the
    /// stream is released, and only when no acknowledged consumer is left.
    /// A later `acknowledge_mount` resumes listening.
    pub fn tick(&mut self) -> Vec<ConsumerId> {
        let window = self.options.mount_ack_ticks;
        let mut expired = Vec::new();
        for (id, consumer) in self.consumers.iter_mut() {
            if consumer.mounted || consumer.unacked_ticks >= window {
                continue;
            }
            consumer.unacked_ticks += 1;
            if consumer.unacked_ticks == window {
                tracing::warn!(consumer = id.raw(), "consumer never acknowledged mount");
                expired.push(*id);
            }
        }

        if !expired.is_empty()
            && self.stream.is_active()
            && !self.consumers.values().any(|consumer| consumer.mounted)
        {
            tracing::warn!("no live consumer left; pausing input stream");
            self.stream.pause();
        }
        expired
    }

    /// Activate the stream. Idempotent; a failure is logged once and the hub
    /// carries on without input.
    pub fn listen(&mut self) {
        if self.stream.is_active() {
            return;
        }
        if let Err(err) = self.stream.resume() {
            if !self.listen_warned {
                self.listen_warned = true;
                tracing::warn!(error = %err, "failed to start input stream");
            }
        }
    }

    pub fn is_listening(&self) -> bool {
        self.stream.is_active()
    }

    /// Run one full cycle for `chunk`.
    pub fn handle_chunk(&mut self, chunk: &str) -> CycleOutcome {
        if self.register.decode(chunk) == DecodeOutcome::Interrupt {
            self.interrupt();
            return CycleOutcome::Interrupted;
        }

        let subscribed = self.subscribed();
        let mut keypress = None;
        for (id, consumer) in &self.consumers {
            if !subscribed.contains(id) {
                continue;
            }
            let Some(command) = self.register.match_config(&consumer.bindings) else {
                continue;
            };
            let command = command.to_string();
            if let Some(event) = self.register.emit(&command, chunk) {
                keypress = Some(event);
            }
        }

        let Some(keypress) = keypress else {
            return CycleOutcome::Unmatched;
        };
        let delivered = self.bus.dispatch(&keypress, &subscribed);
        tracing::debug!(command = %keypress.command, delivered, "keypress dispatched");
        CycleOutcome::Matched {
            command: keypress.command,
            delivered,
        }
    }

    /// Drain every chunk the stream has ready.
    pub fn pump(&mut self) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::new();
        while let Some(chunk) = self.stream.try_next_chunk() {
            let outcome = self.handle_chunk(&chunk);
            let interrupted = outcome == CycleOutcome::Interrupted;
            outcomes.push(outcome);
            if interrupted {
                break;
            }
        }
        outcomes
    }

    /// Wait up to `timeout` for input, then drain what is ready.
    pub fn pump_for(&mut self, timeout: Duration) -> Vec<CycleOutcome> {
        let Some(first) = self.stream.next_chunk_timeout(timeout) else {
            return Vec::new();
        };
        let outcome = self.handle_chunk(&first);
        if outcome == CycleOutcome::Interrupted {
            return vec![outcome];
        }
        let mut outcomes = vec![outcome];
        outcomes.extend(self.pump());
        outcomes
    }

    /// Drop every consumer and listener and start from a fresh register.
    pub fn reset(&mut self) {
        self.consumers.clear();
        self.bus.clear();
        self.gate.clear();
        self.register.reset();
        self.listen_warned = false;
        self.stream.pause();
    }

    pub fn register(&self) -> &Register {
        &self.register
    }

    pub fn gate(&self) -> &PriorityGate {
        &self.gate
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn options(&self) -> HubOptions {
        self.options
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }

    pub fn contains(&self, id: ConsumerId) -> bool {
        self.consumers.contains_key(&id)
    }

    pub fn priority_of(&self, id: ConsumerId) -> Option<Priority> {
        self.consumers.get(&id).map(|consumer| consumer.priority)
    }

    fn consumer_mut(&mut self, id: ConsumerId) -> EngineResult<&mut Consumer> {
        self.consumers
            .get_mut(&id)
            .ok_or(EngineError::UnknownConsumer(id.raw()))
    }

    fn install(&mut self, id: ConsumerId, spec: ConsumerSpec) {
        let ConsumerSpec {
            bindings,
            priority,
            focus,
            listeners,
        } = spec;
        if focus.is_focused() {
            self.gate.update_priority(id, priority);
        }
        for (command, handler) in listeners {
            self.bus.set(id, command, handler);
        }
        self.consumers.insert(
            id,
            Consumer {
                bindings,
                priority,
                focus,
                mounted: false,
                unacked_ticks: 0,
            },
        );
    }

    fn release(&mut self, id: ConsumerId) -> Option<Consumer> {
        self.bus.remove_consumer(id);
        self.gate.remove_hook(id);
        self.consumers.remove(&id)
    }

    /// Bring gate slots in line with current focus, then collect the
    /// consumers allowed to take part in this cycle.
    fn subscribed(&mut self) -> HashSet<ConsumerId> {
        let mut focused = Vec::new();
        for (id, consumer) in &self.consumers {
            if consumer.focus.is_focused() {
                self.gate.update_priority(*id, consumer.priority);
                focused.push((*id, consumer.priority));
            } else {
                self.gate.remove_hook(*id);
            }
        }
        focused
            .into_iter()
            .filter(|(id, priority)| self.gate.can_process(*id, *priority))
            .map(|(id, _)| id)
            .collect()
    }

    fn interrupt(&mut self) {
        tracing::warn!(
            consumers = self.consumers.len(),
            "interrupt received; releasing listeners"
        );
        self.consumers.clear();
        self.bus.clear();
        self.gate.clear();
        self.stream.pause();
        (self.on_interrupt)();
    }
}
