//! Shared fixtures for the integration tests: a recording host and helpers.

#![allow(dead_code)]

use parking_lot::Mutex;
use satchel::{
    ContainerId, ExceptionHandler, InlineExecutor, InterfaceHost, InterfacesConfig, InterfacesListener,
    InterfacesScope, ItemStack, PlayerId, PrimaryThread, SlotTarget,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct HostState {
    slots: HashMap<(PlayerId, SlotTarget), ItemStack>,
    titles: HashMap<ContainerId, String>,
    foreground: HashMap<PlayerId, ContainerId>,
    messages: Vec<(PlayerId, String)>,
    disconnects: Vec<(PlayerId, String)>,
    offline: HashSet<PlayerId>,
}

/// In-memory host that records every call.
#[derive(Default)]
pub struct MockHost {
    state: Mutex<HostState>,
    next_container: AtomicU64,
    shutting_down: AtomicBool,
    /// Sleep applied to every slot read, in milliseconds.
    read_delay_ms: AtomicU64,
    writes: AtomicUsize,
    containers_created: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_read_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap();
        self.read_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn set_offline(&self, player: PlayerId) {
        self.state.lock().offline.insert(player);
    }

    /// Item currently in a slot of the player's foreground container.
    pub fn top_item(&self, player: PlayerId, index: usize) -> Option<ItemStack> {
        let state = self.state.lock();
        let container = *state.foreground.get(&player)?;
        state
            .slots
            .get(&(player, SlotTarget::Container { container, index }))
            .cloned()
    }

    /// Item in a slot of the player's own inventory.
    pub fn player_item(&self, player: PlayerId, index: usize) -> Option<ItemStack> {
        self.state.lock().slots.get(&(player, SlotTarget::Player(index))).cloned()
    }

    /// Places an item as if the player had put it there.
    pub fn put_player_item(&self, player: PlayerId, index: usize, item: ItemStack) {
        self.state.lock().slots.insert((player, SlotTarget::Player(index)), item);
    }

    pub fn foreground(&self, player: PlayerId) -> Option<ContainerId> {
        self.state.lock().foreground.get(&player).copied()
    }

    pub fn title_of(&self, container: ContainerId) -> Option<String> {
        self.state.lock().titles.get(&container).cloned()
    }

    pub fn messages(&self, player: PlayerId) -> Vec<String> {
        self.state
            .lock()
            .messages
            .iter()
            .filter(|(to, _)| *to == player)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn disconnects(&self) -> Vec<(PlayerId, String)> {
        self.state.lock().disconnects.clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn containers_created(&self) -> usize {
        self.containers_created.load(Ordering::SeqCst)
    }
}

impl InterfaceHost for MockHost {
    fn is_online(&self, player: PlayerId) -> bool {
        !self.state.lock().offline.contains(&player)
    }

    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    fn create_container(&self, _player: PlayerId, title: &str, _rows: usize) -> ContainerId {
        let container = ContainerId(self.next_container.fetch_add(1, Ordering::SeqCst) + 1);
        self.containers_created.fetch_add(1, Ordering::SeqCst);
        self.state.lock().titles.insert(container, title.to_owned());
        container
    }

    fn item(&self, player: PlayerId, slot: SlotTarget) -> Option<ItemStack> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        self.state.lock().slots.get(&(player, slot)).cloned()
    }

    fn set_item(&self, player: PlayerId, slot: SlotTarget, item: Option<ItemStack>) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        match item {
            Some(item) => {
                state.slots.insert((player, slot), item);
            }
            None => {
                state.slots.remove(&(player, slot));
            }
        }
    }

    fn foreground_container(&self, player: PlayerId) -> Option<ContainerId> {
        self.foreground(player)
    }

    fn show_container(&self, player: PlayerId, container: ContainerId) {
        self.state.lock().foreground.insert(player, container);
    }

    fn close_container(&self, player: PlayerId) {
        self.state.lock().foreground.remove(&player);
    }

    fn send_message(&self, player: PlayerId, message: &str) {
        self.state.lock().messages.push((player, message.to_owned()));
    }

    fn disconnect(&self, player: PlayerId, message: &str) {
        let mut state = self.state.lock();
        state.disconnects.push((player, message.to_owned()));
        state.offline.insert(player);
    }
}

/// Config with no click throttle and short bounds.
pub fn test_config() -> InterfacesConfig {
    InterfacesConfig {
        click_throttle_ms: 0,
        render_timeout_ms: 2_000,
        transform_timeout_ms: 2_000,
        max_click_wait_ms: 2_000,
        query_timeout_ms: 2_000,
        ..InterfacesConfig::default()
    }
}

/// Installs a listener on the current runtime with an inline primary executor.
pub fn install(config: InterfacesConfig) -> (Arc<MockHost>, InterfacesListener) {
    let host = MockHost::new();
    let adapter: Arc<dyn InterfaceHost> = host.clone();
    let scope = InterfacesScope::from_handle(tokio::runtime::Handle::current(), Arc::new(InlineExecutor));
    let listener = InterfacesListener::install(adapter, scope, config).unwrap();
    (host, listener)
}

/// Installs a listener whose container writes hop onto a dedicated primary thread.
pub fn install_threaded(
    config: InterfacesConfig,
    exceptions: Arc<dyn ExceptionHandler>,
) -> (Arc<MockHost>, InterfacesListener) {
    let host = MockHost::new();
    let adapter: Arc<dyn InterfaceHost> = host.clone();
    let primary = PrimaryThread::spawn("test-primary").unwrap();
    let scope = InterfacesScope::from_handle(tokio::runtime::Handle::current(), Arc::new(primary));
    let listener = InterfacesListener::install_with(adapter, scope, config, exceptions).unwrap();
    (host, listener)
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub fn item(material: &str) -> ItemStack {
    ItemStack::new(material)
}
