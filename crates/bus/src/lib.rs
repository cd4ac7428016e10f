//! Document event bus.
//!
//! Listeners are routes: an event kind, a phase, a [`Matcher`] deciding which
//! targets the route sees, and a handler. Dispatch order is fixed:
//! capture routes in registration order, then bubble routes from the deepest
//! anchor outwards (document-level routes last), registration order breaking
//! ties.

use core_types::{EventKind, ListenerId, Phase};
use dom::{Document, NodeId, Selector};
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
    /// Node the current route matched: the selector hit for delegated routes,
    /// the listening node otherwise.
    pub current_target: Option<NodeId>,
    /// Raised by the engine itself rather than by user interaction.
    pub synthetic: bool,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            current_target: None,
            synthetic: false,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn synthetic(kind: EventKind, target: NodeId) -> Self {
        Self {
            synthetic: true,
            ..Self::new(kind, target)
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[derive(Clone, Debug)]
pub enum Matcher {
    /// Delegated: the target or its nearest ancestor matching the selector.
    Closest(Selector),
    /// Listener on `node`: targets inside it (inclusive).
    Within(NodeId),
    /// Every event of the kind, anywhere in the document.
    Anywhere,
}

impl Matcher {
    fn resolve(&self, doc: &Document, target: NodeId) -> Option<NodeId> {
        match self {
            Matcher::Closest(selector) => doc.closest(target, selector),
            Matcher::Within(node) => doc.contains(*node, target).then_some(*node),
            Matcher::Anywhere => Some(doc.root()),
        }
    }

    /// Node the route is conceptually attached to; delegated routes live on the
    /// document.
    fn anchor(&self, doc: &Document) -> NodeId {
        match self {
            Matcher::Within(node) => *node,
            Matcher::Closest(_) | Matcher::Anywhere => doc.root(),
        }
    }
}

pub type Handler<C> = Rc<dyn Fn(&mut C, &mut Event)>;

struct Route<C> {
    id: ListenerId,
    kind: EventKind,
    phase: Phase,
    matcher: Matcher,
    label: &'static str,
    handler: Handler<C>,
}

pub struct Dispatcher<C> {
    routes: Vec<Route<C>>,
    next_id: ListenerId,
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.routes
                    .iter()
                    .map(|r| (r.id, r.kind.as_str(), r.phase, r.label)),
            )
            .finish()
    }
}

impl<C> Dispatcher<C> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            next_id: 1,
        }
    }

    pub fn on(
        &mut self,
        kind: EventKind,
        phase: Phase,
        matcher: Matcher,
        label: &'static str,
        handler: impl Fn(&mut C, &mut Event) + 'static,
    ) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.routes.push(Route {
            id,
            kind,
            phase,
            matcher,
            label,
            handler: Rc::new(handler),
        });
        id
    }

    /// Returns `false` when the route was already removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| r.id != id);
        before != self.routes.len()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.routes.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn count_labelled(&self, label: &str) -> usize {
        self.routes.iter().filter(|r| r.label == label).count()
    }

    /// Resolves which routes see `event`, in invocation order.
    fn plan(&self, doc: &Document, event: &Event) -> Vec<(ListenerId, NodeId, Handler<C>)> {
        let depth = |node: NodeId| {
            let mut d = 0usize;
            let mut cursor = doc.parent(node);
            while let Some(p) = cursor {
                d += 1;
                cursor = doc.parent(p);
            }
            d
        };

        let mut capture = Vec::new();
        let mut bubble = Vec::new();
        for (order, route) in self.routes.iter().enumerate() {
            if route.kind != event.kind {
                continue;
            }
            let Some(current) = route.matcher.resolve(doc, event.target) else {
                continue;
            };
            let entry = (route.id, current, Rc::clone(&route.handler));
            match route.phase {
                Phase::Capture => capture.push(entry),
                Phase::Bubble => {
                    let anchor = route.matcher.anchor(doc);
                    // Non-bubbling events only reach bubble listeners on the target itself.
                    if !event.kind.bubbles() && anchor != event.target {
                        continue;
                    }
                    bubble.push((depth(anchor), order, entry));
                }
            }
        }
        bubble.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        capture
            .into_iter()
            .chain(bubble.into_iter().map(|(_, _, entry)| entry))
            .collect()
    }
}

/// Anything that owns a document and the dispatcher routing its events.
pub trait DispatchHost: Sized {
    fn document(&self) -> &Document;
    fn dispatcher(&self) -> &Dispatcher<Self>;
}

/// Runs `event` through the host's routes. Returns `false` if a handler
/// prevented the default action.
pub fn dispatch<C: DispatchHost>(host: &mut C, event: &mut Event) -> bool {
    if !host.document().is_connected(event.target) {
        log::trace!(target: "bus", "dropping {} on detached {:?}", event.kind.as_str(), event.target);
        return true;
    }

    let plan = host.dispatcher().plan(host.document(), event);
    for (id, current, handler) in plan {
        if event.propagation_stopped() {
            break;
        }
        // A previous handler may have removed this route.
        if !host.dispatcher().contains(id) {
            continue;
        }
        event.current_target = Some(current);
        handler(host, event);
    }
    event.current_target = None;
    !event.default_prevented()
}
