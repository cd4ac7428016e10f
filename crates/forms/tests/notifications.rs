mod common;

use common::*;
use forms::notify;
use platform::MemoryStorage;

fn page_with_notice() -> (forms::Page, forms::NotificationId) {
    let mut page = open(&MemoryStorage::new(), HOME);
    let anchor = by_id(&page, "contacts");
    let id = notify::show(&mut page, anchor, vec!["Перший".into(), "Другий".into()]).unwrap();
    (page, id)
}

fn released(page: &forms::Page) -> bool {
    page.listeners_labelled("notify.close") == 0
        && page.listeners_labelled("notify.outside") == 0
        && page.window().timers().is_empty()
}

#[test]
fn renders_an_alert_at_the_end_of_body() {
    let (page, id) = page_with_notice();
    let doc = page.document();
    let n = page.notifications().get(id).unwrap();

    assert_eq!(doc.parent(n.root), Some(doc.body()));
    assert_eq!(doc.children(doc.body()).last(), Some(&n.root));
    assert!(doc.has_class(n.root, "form-alert"));
    assert_eq!(doc.attr(n.root, "role"), Some("alert"));
    assert_eq!(doc.attr(n.root, "aria-live"), Some("polite"));
    assert_eq!(doc.attr(n.close_button, "aria-label"), Some("Закрити повідомлення"));
    assert_eq!(doc.text_content(n.root), "ПершийДругий×");
    assert_eq!(n.text(), "Перший\nДругий");
    assert!(!n.is_armed());
}

#[test]
fn dismisses_itself_after_the_timeout() {
    let (mut page, id) = page_with_notice();
    page.advance(4_999);
    assert!(page.notifications().get(id).is_some());
    page.advance(1);
    assert!(page.notifications().is_empty());
    assert!(released(&page));
}

#[test]
fn close_button_dismisses() {
    let (mut page, id) = page_with_notice();
    let root = page.notifications().get(id).unwrap().root;
    assert!(page.close_notification());
    assert!(page.notifications().is_empty());
    assert!(!page.document().is_connected(root));
    assert!(released(&page));
}

#[test]
fn outside_click_only_counts_once_armed() {
    let (mut page, id) = page_with_notice();
    let heading = by_id(&page, "contacts");

    // same tick as the click that opened it
    page.click(heading);
    assert!(page.notifications().get(id).is_some());

    page.advance(0);
    assert!(page.notifications().get(id).unwrap().is_armed());
    assert_eq!(page.listeners_labelled("notify.outside"), 1);

    let inside = page.document().children(page.notifications().get(id).unwrap().root)[0];
    page.click(inside);
    assert!(page.notifications().get(id).is_some());

    page.click(heading);
    assert!(page.notifications().is_empty());
    assert!(released(&page));
}

#[test]
fn dismissing_twice_is_harmless() {
    let (mut page, id) = page_with_notice();
    page.advance(0);
    assert!(notify::dismiss(&mut page, id));
    assert!(!notify::dismiss(&mut page, id));
    assert!(released(&page));

    // the cancelled auto-dismiss never fires
    page.advance(10_000);
    assert_eq!(page.notifications().shown_total(), 1);
}

#[test]
fn notifications_are_independent() {
    let (mut page, first) = page_with_notice();
    page.advance(3_000);
    let body = page.document().body();
    let second = notify::show(&mut page, body, vec!["Ще одне".into()]).unwrap();

    page.advance(2_000);
    assert!(page.notifications().get(first).is_none());
    assert!(page.notifications().get(second).is_some());
    page.advance(3_000);
    assert!(page.notifications().is_empty());
    assert!(released(&page));
}

#[test]
fn timeout_comes_from_config() {
    let config = forms::FormsConfig::from_toml_str(
        r#"
        [notifications]
        timeout-ms = 100
        "#,
    )
    .unwrap();
    let mut page = open_with(Box::new(MemoryStorage::new()), HOME, config);
    let body = page.document().body();
    notify::show(&mut page, body, vec!["x".into()]).unwrap();
    page.advance(100);
    assert!(page.notifications().is_empty());
}
