//! BDD step definitions for notification polling feature

use cucumber::{given, then, when};

use opstatus::notifications::NotificationId;

use crate::support::notifications;
use crate::world::OpStatusWorld;

#[given(expr = "the backend holds {int} notifications of which {int} are unread")]
fn backend_holds(world: &mut OpStatusWorld, total: usize, unread: usize) {
    world.api().set_notifications(notifications(total, unread));
}

#[given("the notification list has been fetched")]
async fn list_fetched(world: &mut OpStatusWorld) {
    world.poller().fetch_list().await;
}

#[when("the notification poller fetches")]
async fn poller_fetches(world: &mut OpStatusWorld) {
    world.poller().fetch_list().await;
}

#[when(expr = "notification {string} is acknowledged")]
async fn acknowledge_one(world: &mut OpStatusWorld, id: String) {
    world.poller().acknowledge(&NotificationId::new(id)).await;
}

#[when("all notifications are acknowledged")]
async fn acknowledge_all(world: &mut OpStatusWorld) {
    world.poller().acknowledge_all().await;
}

#[then(expr = "the poller should hold {int} notifications")]
fn poller_holds(world: &mut OpStatusWorld, count: usize) {
    assert_eq!(world.poller().current().items().len(), count);
}

#[then(expr = "the unread count should be {int}")]
fn unread_count(world: &mut OpStatusWorld, count: usize) {
    assert_eq!(world.poller().unread_count(), count);
}

#[then(expr = "the display should show {int} notifications")]
fn display_shows(world: &mut OpStatusWorld, count: usize) {
    assert_eq!(world.poller().view().items.len(), count);
}

#[then(expr = "the display should offer {string}")]
fn display_offers(world: &mut OpStatusWorld, label: String) {
    assert_eq!(world.poller().view().more_label(), Some(label));
}

#[then("the display should not offer more")]
fn display_no_more(world: &mut OpStatusWorld) {
    assert_eq!(world.poller().view().more_label(), None);
}

#[then(expr = "notification {string} should be read")]
fn notification_read(world: &mut OpStatusWorld, id: String) {
    let list = world.poller().current();
    let n = list
        .items()
        .iter()
        .find(|n| n.id.as_str() == id)
        .unwrap_or_else(|| panic!("notification {} not in list", id));
    assert!(n.is_read);
}

#[then(expr = "the backend should have received {int} mark-read calls")]
fn mark_read_calls(world: &mut OpStatusWorld, count: usize) {
    assert_eq!(world.api().mark_read_calls(), count);
}
