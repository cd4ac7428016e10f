//! Transient alert boxes.
//!
//! Each notification owns an auto-dismiss timer, a close-button route and,
//! once armed, a document-wide outside-click route. [`dismiss`] releases all
//! of them together and is a no-op the second time.

use crate::page::Page;
use bus::Matcher;
use core_types::{EventKind, ListenerId, Phase, TimerId};
use dom::{DomError, Node, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotificationId(u64);

/// Payload of the page's timer queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTask {
    DismissNotification(NotificationId),
    /// Deferred so the click that caused the notification cannot dismiss it.
    ArmOutsideClick(NotificationId),
}

#[derive(Debug)]
pub struct Notification {
    pub id: NotificationId,
    pub lines: Vec<String>,
    pub root: NodeId,
    pub anchor: NodeId,
    pub close_button: NodeId,
    timeout: TimerId,
    arm: Option<TimerId>,
    close_route: ListenerId,
    outside_route: Option<ListenerId>,
}

impl Notification {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_armed(&self) -> bool {
        self.outside_route.is_some()
    }
}

#[derive(Debug, Default)]
pub struct Notifications {
    next_id: u64,
    live: Vec<Notification>,
    shown: usize,
}

impl Notifications {
    pub fn live(&self) -> &[Notification] {
        &self.live
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.live.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Notifications shown since the page opened, dismissed ones included.
    pub fn shown_total(&self) -> usize {
        self.shown
    }

    pub fn texts(&self) -> Vec<String> {
        self.live.iter().map(Notification::text).collect()
    }

    fn get_mut(&mut self, id: NotificationId) -> Option<&mut Notification> {
        self.live.iter_mut().find(|n| n.id == id)
    }
}

/// Appends an alert to `body` (never inside `anchor`) showing `lines`.
pub fn show(page: &mut Page, anchor: NodeId, lines: Vec<String>) -> Result<NotificationId, DomError> {
    let cfg = page.controller.config().notifications.clone();

    let mut text = Node::element("span").class("form-alert__text");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            text = text.child(Node::element("br"));
        }
        text = text.child(Node::text(line.as_str()));
    }
    let alert = Node::element("div")
        .class("form-alert")
        .attr("role", "alert")
        .attr("aria-live", "polite")
        .child(text);
    let close = Node::element("button")
        .class("form-alert__close")
        .attr("type", "button")
        .attr("aria-label", cfg.close_label.as_str())
        .child(Node::text(cfg.close_text.as_str()));

    let doc = &mut page.window.document;
    let body = doc.body();
    let root = doc.append_tree(body, alert)?;
    let close_button = doc.append_tree(root, close)?;

    page.notifications.next_id += 1;
    let id = NotificationId(page.notifications.next_id);

    let timeout = page
        .window
        .set_timeout(cfg.timeout_ms, TimerTask::DismissNotification(id));
    let arm = page.window.set_timeout(0, TimerTask::ArmOutsideClick(id));
    let close_route = page.bus.on(
        EventKind::Click,
        Phase::Bubble,
        Matcher::Within(close_button),
        "notify.close",
        move |page, ev| {
            ev.stop_propagation();
            dismiss(page, id);
        },
    );

    log::info!(target: "forms.notify", "showing {id:?} for {anchor:?}: {}", lines.join(" / "));
    page.notifications.shown += 1;
    page.notifications.live.push(Notification {
        id,
        lines,
        root,
        anchor,
        close_button,
        timeout,
        arm: Some(arm),
        close_route,
        outside_route: None,
    });
    Ok(id)
}

/// Removes the notification and releases its timer and listeners. Returns
/// `false` if it was already gone.
pub fn dismiss(page: &mut Page, id: NotificationId) -> bool {
    let Some(index) = page.notifications.live.iter().position(|n| n.id == id) else {
        return false;
    };
    let n = page.notifications.live.remove(index);

    page.window.clear_timeout(n.timeout);
    if let Some(arm) = n.arm {
        page.window.clear_timeout(arm);
    }
    page.bus.remove(n.close_route);
    if let Some(route) = n.outside_route {
        page.bus.remove(route);
    }
    if let Err(err) = page.window.document.remove(n.root) {
        log::warn!(target: "forms.notify", "detaching {id:?}: {err}");
    }
    log::debug!(target: "forms.notify", "dismissed {id:?}");
    true
}

pub(crate) fn run_timer(page: &mut Page, task: TimerTask) {
    match task {
        TimerTask::DismissNotification(id) => {
            dismiss(page, id);
        }
        TimerTask::ArmOutsideClick(id) => arm_outside_click(page, id),
    }
}

fn arm_outside_click(page: &mut Page, id: NotificationId) {
    let Some(n) = page.notifications.get(id) else {
        return;
    };
    if n.is_armed() {
        return;
    }
    let route = page.bus.on(
        EventKind::Click,
        Phase::Bubble,
        Matcher::Anywhere,
        "notify.outside",
        move |page, ev| {
            let inside = page
                .notifications
                .get(id)
                .is_some_and(|n| page.window.document.contains(n.root, ev.target));
            if !inside {
                dismiss(page, id);
            }
        },
    );
    if let Some(n) = page.notifications.get_mut(id) {
        n.arm = None;
        n.outside_route = Some(route);
    }
}
