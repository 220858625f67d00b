//! Integration tests for render coalescing, inheritance, persistence and decoration.

mod common;

use common::{eventually, install, install_threaded, item, test_config};
use parking_lot::Mutex;
use satchel::transform::TransformFuture;
use satchel::{
    DefaultExceptionHandler, Element, ExceptionContext, ExceptionHandler, ExceptionResolution, Interface,
    InterfaceProperty, InterfaceView, InterfacesConfig, InterfacesError, InterfacesOperation, InterfacesResult,
    ItemStack, LazyProperty, Pane, PlayerId, Transform, ViewShape,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PLAYER: PlayerId = PlayerId(2);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_renders_coalesce_into_one_extra_pass() {
    let (host, listener) = install(test_config());
    let interface = Interface::builder(ViewShape::Chest { rows: 1 })
        .with_paint(&[], |pane, _| {
            pane.set_at(0, 0, Element::item(item("stone")));
            Ok(())
        })
        .build()
        .unwrap();
    let view = listener.open(PLAYER, &interface).await;
    assert_eq!(view.render_passes(), 1);

    // Every slot read now takes 20ms, so one pass takes well over 100ms.
    host.set_read_delay(Duration::from_millis(20));
    let first = {
        let view = Arc::clone(&view);
        tokio::spawn(async move { view.render().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    for _ in 0..5 {
        view.render().await;
    }
    first.await.unwrap();
    host.set_read_delay(Duration::ZERO);

    assert_eq!(view.render_passes(), 3);
}

#[tokio::test]
async fn test_burst_of_changes_converges_on_last_value() {
    let (host, listener) = install(test_config());
    let counter = InterfaceProperty::new(1_u32);
    let shown = counter.clone();
    let interface = Interface::builder(ViewShape::Chest { rows: 1 })
        .with_paint(&[counter.trigger()], move |pane, _| {
            pane.set_at(0, 0, Element::item(item("gold").with_amount(shown.get())));
            Ok(())
        })
        .build()
        .unwrap();
    let view = listener.open(PLAYER, &interface).await;

    for amount in 2..=20 {
        counter.set(amount);
    }

    assert!(eventually(|| host.top_item(PLAYER, 0) == Some(item("gold").with_amount(20))).await);
    assert!(view.render_passes() < 20);
}

#[tokio::test]
async fn test_later_transform_wins_on_overlap() {
    let (host, listener) = install(test_config());
    let interface = Interface::builder(ViewShape::Chest { rows: 1 })
        .with_paint(&[], |pane, _| {
            pane.fill(&Element::item(item("glass")));
            Ok(())
        })
        .with_paint(&[], |pane, _| {
            pane.set_at(0, 3, Element::item(item("diamond")));
            Ok(())
        })
        .build()
        .unwrap();
    listener.open(PLAYER, &interface).await;

    assert_eq!(host.top_item(PLAYER, 3), Some(item("diamond")));
    assert_eq!(host.top_item(PLAYER, 2), Some(item("glass")));
}

#[tokio::test]
async fn test_player_view_inherits_untouched_slots() {
    let (host, listener) = install(test_config());
    host.put_player_item(PLAYER, 20, item("apple"));
    let interface = Interface::builder(ViewShape::Player)
        .inherit_existing_items(true)
        .with_paint(&[], |pane, _| {
            let mut player = pane.player().unwrap();
            player.hotbar(0, Element::item(item("compass")));
            player.helmet(Element::item(item("pumpkin")));
            Ok(())
        })
        .build()
        .unwrap();
    let view = listener.open(PLAYER, &interface).await;

    assert_eq!(host.player_item(PLAYER, 0), Some(item("compass")));
    assert_eq!(host.player_item(PLAYER, 39), Some(item("pumpkin")));
    assert_eq!(host.player_item(PLAYER, 20), Some(item("apple")));
    assert!(view.owned_items().contains(&item("compass")));
    assert!(!view.owned_items().contains(&item("apple")));
}

#[tokio::test]
async fn test_persisted_items_survive_rerender() {
    let (host, listener) = install(test_config());
    let toggle = InterfaceProperty::new(false);
    let shown = toggle.clone();
    let interface = Interface::builder(ViewShape::Player)
        .persist_items(true)
        .with_paint(&[toggle.trigger()], move |pane, _| {
            let material = if shown.get() { "lime_dye" } else { "gray_dye" };
            pane.player().unwrap().hotbar(8, Element::item(item(material)));
            Ok(())
        })
        .build()
        .unwrap();
    let view = listener.open(PLAYER, &interface).await;
    assert_eq!(host.player_item(PLAYER, 8), Some(item("gray_dye")));

    host.put_player_item(PLAYER, 12, item("bread"));
    toggle.set(true);

    assert!(eventually(|| host.player_item(PLAYER, 8) == Some(item("lime_dye"))).await);
    assert_eq!(host.player_item(PLAYER, 12), Some(item("bread")));
    assert!(view.is_open());
}

#[tokio::test]
async fn test_element_over_persisted_item_replaces_it() {
    let (host, listener) = install(test_config());
    let toggle = InterfaceProperty::new(false);
    let shown = toggle.clone();
    let interface = Interface::builder(ViewShape::Player)
        .persist_items(true)
        .with_paint(&[toggle.trigger()], move |pane, _| {
            if shown.get() {
                pane.player().unwrap().storage(0, 3, Element::item(item("map")));
            }
            Ok(())
        })
        .build()
        .unwrap();
    let view = listener.open(PLAYER, &interface).await;

    host.put_player_item(PLAYER, 12, item("bread"));
    toggle.set(true);
    assert!(eventually(|| host.player_item(PLAYER, 12) == Some(item("map"))).await);

    let passes = view.render_passes();
    toggle.set(false);
    assert!(eventually(|| view.render_passes() > passes).await);
    assert_eq!(host.player_item(PLAYER, 12), None);
}

#[tokio::test]
async fn test_decorator_applies_and_failures_fall_back() {
    let (host, listener) = install(test_config());
    let interface = Interface::builder(ViewShape::Chest { rows: 1 })
        .decorator(|player: PlayerId, stack: ItemStack| -> InterfacesResult<ItemStack> {
            if stack.material == "barrier" {
                return Err(InterfacesError::Decoration("no barriers".into()));
            }
            Ok(stack.with_name(format!("for {player}")))
        })
        .with_paint(&[], |pane, _| {
            pane.set_at(0, 0, Element::item(item("emerald")));
            pane.set_at(0, 1, Element::item(item("barrier")));
            Ok(())
        })
        .build()
        .unwrap();
    let view = listener.open(PLAYER, &interface).await;

    assert_eq!(host.top_item(PLAYER, 0), Some(item("emerald").with_name("for player#2")));
    assert_eq!(host.top_item(PLAYER, 1), Some(item("barrier")));
    assert!(view.is_open());
}

#[tokio::test]
async fn test_failing_transform_closes_view() {
    let (host, listener) = install(test_config());
    let interface = Interface::builder(ViewShape::Chest { rows: 1 })
        .with_paint(&[], |_, _| Err(InterfacesError::transform("broken", "always fails")))
        .build()
        .unwrap();
    let view = listener.open(PLAYER, &interface).await;

    assert!(!view.is_open());
    assert_eq!(host.foreground(PLAYER), None);
}

struct Stalled;

impl Transform for Stalled {
    fn apply<'a>(&'a self, _pane: &'a mut Pane, _view: &'a Arc<InterfaceView>) -> TransformFuture<'a> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
    }
}

#[tokio::test]
async fn test_slow_transform_times_out() {
    let config = InterfacesConfig {
        transform_timeout_ms: 30,
        ..test_config()
    };
    let (_host, listener) = install(config);
    let interface = Interface::builder(ViewShape::Chest { rows: 1 })
        .with_transform(Stalled)
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let view = listener.open(PLAYER, &interface).await;
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!view.is_open());
}

struct Balance {
    balance: LazyProperty<u32>,
}

impl Transform for Balance {
    fn apply<'a>(&'a self, pane: &'a mut Pane, _view: &'a Arc<InterfaceView>) -> TransformFuture<'a> {
        Box::pin(async move {
            let coins = self.balance.get().await?;
            pane.set_at(0, 4, Element::item(item("gold_nugget").with_amount(coins)));
            Ok(())
        })
    }

    fn triggers(&self) -> Vec<satchel::Trigger> {
        vec![self.balance.trigger().clone()]
    }
}

#[tokio::test]
async fn test_background_transform_with_lazy_property() {
    let (host, listener) = install(test_config());
    let backing = Arc::new(AtomicU32::new(3));
    let source = Arc::clone(&backing);
    let balance = LazyProperty::with_debounce(Duration::ZERO, move || {
        let coins = source.load(Ordering::SeqCst);
        async move { InterfacesResult::Ok(coins) }
    });
    let interface = Interface::builder(ViewShape::Chest { rows: 1 })
        .with_background_transform(&[], Balance { balance: balance.clone() })
        .build()
        .unwrap();
    let view = listener.open(PLAYER, &interface).await;
    assert!(eventually(|| host.top_item(PLAYER, 4) == Some(item("gold_nugget").with_amount(3))).await);

    backing.store(8, Ordering::SeqCst);
    assert_eq!(balance.reevaluate().await.unwrap(), 8);
    assert!(eventually(|| host.top_item(PLAYER, 4) == Some(item("gold_nugget").with_amount(8))).await);
    assert!(view.is_open());
}

#[tokio::test]
async fn test_failed_property_load_closes_view() {
    let (_host, listener) = install(test_config());
    let balance: LazyProperty<u32> =
        LazyProperty::new(|| async { Err(InterfacesError::PropertyLoad("bank offline".into())) });
    let interface = Interface::builder(ViewShape::Chest { rows: 1 })
        .with_transform(Balance { balance })
        .build()
        .unwrap();
    let view = listener.open(PLAYER, &interface).await;

    assert!(!view.is_open());
}

fn gold_row(counter: &InterfaceProperty<u32>) -> Arc<Interface> {
    let shown = counter.clone();
    Interface::builder(ViewShape::Chest { rows: 1 })
        .with_paint(&[counter.trigger()], move |pane, _| {
            pane.fill(&Element::item(item("gold").with_amount(shown.get())));
            Ok(())
        })
        .build()
        .unwrap()
}

fn slow_render_config() -> InterfacesConfig {
    InterfacesConfig {
        render_timeout_ms: 100,
        ..test_config()
    }
}

/// Ignores every failure, remembering the operations that timed out.
#[derive(Default)]
struct TimeoutRecorder {
    timed_out: Mutex<Vec<InterfacesOperation>>,
}

impl TimeoutRecorder {
    fn timed_out(&self) -> Vec<InterfacesOperation> {
        self.timed_out.lock().clone()
    }
}

impl ExceptionHandler for TimeoutRecorder {
    fn handle(&self, error: &InterfacesError, context: &ExceptionContext) -> ExceptionResolution {
        if matches!(error, InterfacesError::Timeout { .. }) {
            self.timed_out.lock().push(context.operation);
        }
        ExceptionResolution::Ignore
    }
}

#[tokio::test]
async fn test_render_timeout_on_primary_thread_closes_view() {
    let (host, listener) = install_threaded(slow_render_config(), Arc::new(DefaultExceptionHandler::default()));
    let counter = InterfaceProperty::new(1_u32);
    let view = listener.open(PLAYER, &gold_row(&counter)).await;
    assert_eq!(host.top_item(PLAYER, 0), Some(item("gold")));

    // Nine slot reads at 40ms each outlast the 100ms render bound.
    host.set_read_delay(Duration::from_millis(40));
    counter.set(2);

    assert!(eventually(|| !view.is_open()).await);
    assert!(listener.open_view(PLAYER).is_none());
    host.set_read_delay(Duration::ZERO);
    assert!(eventually(|| host.foreground(PLAYER).is_none()).await);
}

#[tokio::test]
async fn test_ignored_render_timeout_is_reconciled_by_next_pass() {
    let policy = Arc::new(TimeoutRecorder::default());
    let handler: Arc<dyn ExceptionHandler> = policy.clone();
    let (host, listener) = install_threaded(slow_render_config(), handler);
    let counter = InterfaceProperty::new(1_u32);
    let view = listener.open(PLAYER, &gold_row(&counter)).await;
    let passes = view.render_passes();

    host.set_read_delay(Duration::from_millis(40));
    counter.set(2);
    assert!(eventually(|| !policy.timed_out().is_empty()).await);
    assert!(view.is_open());
    assert_eq!(view.render_passes(), passes);

    host.set_read_delay(Duration::ZERO);
    counter.set(3);
    let expected = Some(item("gold").with_amount(3));
    assert!(eventually(|| (0..9).all(|slot| host.top_item(PLAYER, slot) == expected)).await);
    assert!(view.render_passes() > passes);
    assert!(policy.timed_out().iter().all(|operation| *operation == InterfacesOperation::Rendering));
}
