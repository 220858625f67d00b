//! Integration tests for opening, re-rendering and closing views.

mod common;

use common::{eventually, install, item, test_config};
use parking_lot::Mutex;
use satchel::{
    CloseReason, Element, Interface, InterfaceProperty, InterfacesError, InterfacesListener, InterfacesScope,
    InlineExecutor, PlayerId, ViewShape,
};
use std::sync::Arc;

const PLAYER: PlayerId = PlayerId(1);

fn counter_menu(counter: &InterfaceProperty<u32>) -> Arc<Interface> {
    let shown = counter.clone();
    Interface::builder(ViewShape::Chest { rows: 1 })
        .title("Counter")
        .with_paint(&[counter.trigger()], move |pane, _| {
            pane.set_at(0, 4, Element::item(item("paper").with_amount(shown.get())));
            Ok(())
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_open_renders_and_shows_container() {
    let (host, listener) = install(test_config());
    let counter = InterfaceProperty::new(1);
    let view = listener.open(PLAYER, &counter_menu(&counter)).await;

    assert!(view.is_open());
    assert_eq!(view.render_passes(), 1);
    assert_eq!(host.foreground(PLAYER), view.container());
    assert_eq!(host.top_item(PLAYER, 4), Some(item("paper").with_amount(1)));
    assert_eq!(host.top_item(PLAYER, 0), None);
    assert_eq!(host.title_of(view.container().unwrap()).as_deref(), Some("Counter"));
}

#[tokio::test]
async fn test_property_change_rerenders() {
    let (host, listener) = install(test_config());
    let counter = InterfaceProperty::new(1);
    let view = listener.open(PLAYER, &counter_menu(&counter)).await;

    assert!(counter.set(7));
    assert!(eventually(|| host.top_item(PLAYER, 4) == Some(item("paper").with_amount(7))).await);
    assert!(view.render_passes() >= 2);

    // Equal writes fire nothing.
    assert!(!counter.set(7));
}

#[tokio::test]
async fn test_reopen_does_not_duplicate_container() {
    let (host, listener) = install(test_config());
    let counter = InterfaceProperty::new(1);
    let view = listener.open(PLAYER, &counter_menu(&counter)).await;
    let container = view.container();

    view.open().await;
    view.open().await;

    assert_eq!(host.containers_created(), 1);
    assert_eq!(view.container(), container);
    assert_eq!(host.foreground(PLAYER), container);
}

#[tokio::test]
async fn test_close_hides_container_and_runs_handler() {
    let (host, listener) = install(test_config());
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&reasons);
    let interface = Interface::builder(ViewShape::Chest { rows: 2 })
        .on_any_close(move |_, reason| seen.lock().push(reason))
        .build()
        .unwrap();

    let view = listener.open(PLAYER, &interface).await;
    let container = view.container().unwrap();
    view.close(CloseReason::Plugin);

    assert!(!view.is_open());
    assert_eq!(host.foreground(PLAYER), None);
    assert!(listener.open_view(PLAYER).is_none());

    // Duplicate close events from the host are ignored.
    listener.on_container_close(PLAYER, container, CloseReason::Player);
    view.mark_closed(CloseReason::Player);
    assert_eq!(*reasons.lock(), vec![CloseReason::Plugin]);
}

#[tokio::test]
async fn test_closed_view_skips_property_updates_until_reopened() {
    let (host, listener) = install(test_config());
    let counter = InterfaceProperty::new(1);
    let view = listener.open(PLAYER, &counter_menu(&counter)).await;
    let passes = view.render_passes();

    view.close(CloseReason::Player);
    counter.set(2);
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
    assert_eq!(view.render_passes(), passes);

    view.open().await;
    assert_eq!(host.top_item(PLAYER, 4), Some(item("paper").with_amount(2)));
}

#[tokio::test]
async fn test_set_title_creates_new_container() {
    let (host, listener) = install(test_config());
    let counter = InterfaceProperty::new(1);
    let view = listener.open(PLAYER, &counter_menu(&counter)).await;
    let first = view.container().unwrap();

    view.set_title("Renamed");
    assert!(eventually(|| view.container() != Some(first)).await);
    let second = view.container().unwrap();

    assert!(eventually(|| host.foreground(PLAYER) == Some(second)).await);
    assert_eq!(host.title_of(second).as_deref(), Some("Renamed"));
    assert_eq!(view.title(), "Renamed");
    assert_eq!(host.top_item(PLAYER, 4), Some(item("paper").with_amount(1)));
}

#[tokio::test]
async fn test_child_back_reopens_parent() {
    let (host, listener) = install(test_config());
    let parent_menu = Interface::builder(ViewShape::Chest { rows: 1 })
        .title("Parent")
        .build()
        .unwrap();
    let child_menu = Interface::builder(ViewShape::Chest { rows: 3 })
        .title("Child")
        .build()
        .unwrap();

    let parent = listener.open(PLAYER, &parent_menu).await;
    let child = listener.open_child(&parent, &child_menu).await;

    assert!(!parent.is_open());
    assert!(parent.is_tree_opened());
    assert_eq!(host.foreground(PLAYER), child.container());

    child.back().await;
    assert!(parent.is_open());
    assert!(!child.is_open());
    assert_eq!(host.foreground(PLAYER), parent.container());
    assert!(Arc::ptr_eq(&listener.open_view(PLAYER).unwrap(), &parent));
}

#[tokio::test]
async fn test_back_without_parent_closes() {
    let (host, listener) = install(test_config());
    let menu = Interface::builder(ViewShape::Chest { rows: 1 }).build().unwrap();

    let view = listener.open(PLAYER, &menu).await;
    view.back().await;

    assert!(!view.is_open());
    assert_eq!(host.foreground(PLAYER), None);
}

#[tokio::test]
async fn test_quit_releases_player() {
    let (_host, listener) = install(test_config());
    let counter = InterfaceProperty::new(1);
    let view = listener.open(PLAYER, &counter_menu(&counter)).await;

    listener.on_quit(PLAYER);
    assert!(!view.is_open());
    assert!(listener.open_view(PLAYER).is_none());
    assert!(listener.context().scope().task_labels(PLAYER).is_empty());
}

#[tokio::test]
async fn test_view_is_released_after_close() {
    let (_host, listener) = install(test_config());
    let counter = InterfaceProperty::new(1);
    let view = listener.open(PLAYER, &counter_menu(&counter)).await;
    view.close(CloseReason::Player);

    let weak = Arc::downgrade(&view);
    drop(view);
    assert!(eventually(|| weak.strong_count() == 0).await);
    assert_eq!(counter.trigger().listener_count(), 0);
}

#[tokio::test]
async fn test_second_install_rejected() {
    let (host, listener) = install(test_config());
    let adapter: Arc<dyn satchel::InterfaceHost> = host.clone();
    let scope = InterfacesScope::from_handle(tokio::runtime::Handle::current(), Arc::new(InlineExecutor));

    let second = InterfacesListener::install(adapter, scope, test_config());
    assert!(matches!(second, Err(InterfacesError::AlreadyInstalled)));

    drop(listener);
    let adapter: Arc<dyn satchel::InterfaceHost> = host.clone();
    let scope = InterfacesScope::from_handle(tokio::runtime::Handle::current(), Arc::new(InlineExecutor));
    assert!(InterfacesListener::install(adapter, scope, test_config()).is_ok());
}
