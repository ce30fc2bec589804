use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::{debug, trace, warn};
use measure_time::debug_time;

use crate::element::{Capabilities, Element, ElementWeak};
use crate::error::MeshResult;

thread_local! {
    static UPDATE_MANAGER: RefCell<UpdateManager> = RefCell::new(UpdateManager::new());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateRequest {
    pub resolve: bool,
    pub layout: bool,
    pub inner: bool,
}

impl UpdateRequest {
    pub fn merge(&mut self, other: UpdateRequest) {
        self.resolve |= other.resolve;
        self.layout |= other.layout;
        self.inner |= other.inner;
    }
}

const MIN_PRUNE_THRESHOLD: usize = 64;

/// Pending pass requests, keyed by element id.
pub struct UpdateManager {
    requests: HashMap<u32, (ElementWeak, UpdateRequest)>,
    prune_threshold: usize,
}

impl Default for UpdateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateManager {
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
            prune_threshold: MIN_PRUNE_THRESHOLD,
        }
    }

    pub fn request(&mut self, element: &Element, request: UpdateRequest) {
        match self.requests.entry(element.get_id()) {
            Entry::Occupied(mut e) => e.get_mut().1.merge(request),
            Entry::Vacant(e) => {
                e.insert((element.as_weak(), request));
            }
        }
        if self.requests.len() >= self.prune_threshold {
            self.prune();
        }
    }

    /// True if a request for a live element is waiting.
    pub fn has_pending(&self) -> bool {
        self.requests.values().any(|(weak, _)| weak.upgrade().is_ok())
    }

    /// Drops requests of elements that no longer exist.
    fn prune(&mut self) {
        self.requests.retain(|_, (weak, _)| weak.upgrade().is_ok());
        self.prune_threshold = (self.requests.len() * 2).max(MIN_PRUNE_THRESHOLD);
        trace!("pruned update requests, {} left", self.requests.len());
    }

    /// Drains the queue, moving every request up to its layout root. Roots
    /// come back in creation order.
    fn take_roots(&mut self) -> Vec<(Element, UpdateRequest)> {
        let mut roots: HashMap<u32, (Element, UpdateRequest)> = HashMap::new();
        for (_, (weak, request)) in self.requests.drain() {
            let element = match weak.upgrade() {
                Ok(e) => e,
                Err(_) => continue,
            };
            let root = find_layout_root(element);
            match roots.entry(root.get_id()) {
                Entry::Occupied(mut e) => e.get_mut().1.merge(request),
                Entry::Vacant(e) => {
                    e.insert((root, request));
                }
            }
        }
        self.prune_threshold = MIN_PRUNE_THRESHOLD;
        let mut roots: Vec<(u32, (Element, UpdateRequest))> = roots.into_iter().collect();
        roots.sort_by_key(|(id, _)| *id);
        roots.into_iter().map(|(_, root)| root).collect()
    }
}

/// Top-most node reachable through an unbroken chain of layout parents.
fn find_layout_root(element: Element) -> Element {
    let mut root = element;
    while let Some(parent) = root.get_parent() {
        if !parent.capabilities().contains(Capabilities::UPDATE_LAYOUT) {
            break;
        }
        root = parent;
    }
    root
}

pub fn request_update(element: &Element, resolve: bool, layout: bool, inner: bool) {
    UPDATE_MANAGER.with_borrow_mut(|m| m.request(element, UpdateRequest { resolve, layout, inner }));
}

pub fn has_pending_updates() -> bool {
    UPDATE_MANAGER.with_borrow(|m| m.has_pending())
}

/// Runs the requested passes on every affected layout root.
///
/// Resolution runs first; once it completes the subtree is laid out and then
/// repainted. A root whose resolution is rejected keeps its previous layout.
/// The first rejection is returned after every root was processed.
pub async fn update() -> MeshResult<()> {
    let roots = UPDATE_MANAGER.with_borrow_mut(|m| m.take_roots());
    if roots.is_empty() {
        return Ok(());
    }
    debug!("updating {} layout roots", roots.len());
    let mut first_error = None;
    let mut resolved = Vec::with_capacity(roots.len());
    for (mut root, request) in roots {
        if request.resolve {
            if let Err(e) = root.parse_params().await {
                warn!("parameters of element {} rejected: {}", root.get_id(), e);
                first_error.get_or_insert(e);
                continue;
            }
        }
        resolved.push((root, request));
    }
    {
        debug_time!("layout");
        for (root, request) in resolved.iter_mut() {
            if request.resolve || request.layout {
                root.update_layout();
            }
        }
    }
    {
        debug_time!("inner");
        for (root, request) in resolved.iter_mut() {
            if request.resolve || request.layout || request.inner {
                root.update_inner();
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
