use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;
use futures_util::future::{ready, FutureExt, LocalBoxFuture};
use meshui_macros::mrc_object;

use crate as meshui;
use crate::base::Vec3;
use crate::box_model::{BoxComponent, BoxOptions};
use crate::diagnostic::DiagnosticSink;
use crate::error::{MeshError, MeshResult};
use crate::frame::Geometry;
use crate::material::Material;
use crate::mrc::Mrc;
use crate::update_manager;

pub mod block;
pub mod container;
pub mod inline_box;
pub mod mesh;

thread_local! {
    pub static NEXT_ELEMENT_ID: Cell<u32> = Cell::new(1);
}

/// Completion of the parameter resolution pass. `Ok` resolves, `Err` rejects.
pub type ParamsFuture = LocalBoxFuture<'static, MeshResult<()>>;

bitflags! {
    /// Passes and markers a node takes part in. Parents query these before
    /// calling into a child; an absent flag means the child opts out.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const PARSE_PARAMS = 1;
        const UPDATE_LAYOUT = 1 << 1;
        const UPDATE_INNER = 1 << 2;
        const INLINE = 1 << 3;
    }
}

impl Element {
    pub fn create<T: ElementBackend + 'static, F: FnOnce(ElementWeak) -> T>(backend: F) -> Self {
        let handle = Mrc::new(ElementData::new(EmptyElementBackend {}));
        let mut ele = Self { handle };
        let weak = ele.as_weak();
        ele.backend = Box::new(backend(weak));
        ele
    }

    pub fn get_id(&self) -> u32 {
        self.id
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn get_type(&self) -> &str {
        self.backend.get_name()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    pub fn is_inline(&self) -> bool {
        self.capabilities().contains(Capabilities::INLINE)
    }

    pub fn add_child(&mut self, mut child: Element) -> MeshResult<()> {
        if child.get_parent().is_some() {
            return Err(MeshError::AlreadyAttached(child.id));
        }
        child.parent = Some(self.as_weak());
        self.children.push(child);
        Ok(())
    }

    /// Detaches `child`, handing back the strong reference this node held.
    pub fn remove_child(&mut self, child: &Element) -> Option<Element> {
        let position = self.children.iter().position(|c| c == child)?;
        let mut removed = self.children.remove(position);
        removed.parent = None;
        Some(removed)
    }

    pub fn get_children(&self) -> Vec<Element> {
        self.children.clone()
    }

    pub fn get_parent(&self) -> Option<Element> {
        self.parent.as_ref()?.upgrade().ok()
    }

    /// Number of layout nodes between this one and its layout root. A plain
    /// scene node ends the chain.
    pub fn get_parents_number(&self) -> i32 {
        let mut count = 0;
        let mut parent = self.get_parent();
        while let Some(p) = parent {
            if !p.capabilities().contains(Capabilities::UPDATE_LAYOUT) {
                break;
            }
            count += 1;
            parent = p.get_parent();
        }
        count
    }

    /// Visits this node and then every descendant, depth-first.
    pub fn traverse<F: FnMut(&mut Element)>(&mut self, callback: &mut F) {
        callback(self);
        for mut child in self.get_children() {
            child.traverse(callback);
        }
    }

    /// Recursively detaches every descendant of this node, leaving it empty.
    pub fn deep_delete(&mut self) {
        for mut child in std::mem::take(&mut self.children) {
            child.deep_delete();
            child.parent = None;
        }
    }

    pub fn box_component(&self) -> Option<&BoxComponent> {
        self.backend.box_component()
    }

    pub fn content_container(&self) -> Option<Element> {
        self.backend.content_container()
    }

    pub fn material(&self) -> Option<Material> {
        self.backend.material().cloned()
    }

    pub fn set_material(&mut self, material: Material) {
        self.backend.set_material(material);
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.backend.geometry()
    }

    /// Merges `options` into the box parameters and schedules the passes.
    /// The repaint pass is always requested.
    pub fn set(&mut self, options: BoxOptions, resolve: bool, layout: bool) {
        if let Some(bc) = self.backend.box_component_mut() {
            bc.merge(options);
        }
        update_manager::request_update(self, resolve, layout, true);
    }

    pub fn set_diagnostic_sink(&mut self, sink: Rc<dyn DiagnosticSink>) {
        if let Some(bc) = self.backend.box_component_mut() {
            bc.set_diagnostic_sink(sink);
        }
    }

    pub fn parse_params(&mut self) -> ParamsFuture {
        if !self.capabilities().contains(Capabilities::PARSE_PARAMS) {
            return ready(Ok(())).boxed_local();
        }
        self.backend.parse_params()
    }

    pub fn update_layout(&mut self) {
        if self.capabilities().contains(Capabilities::UPDATE_LAYOUT) {
            self.backend.update_layout();
        }
    }

    pub fn update_inner(&mut self) {
        if self.capabilities().contains(Capabilities::UPDATE_INNER) {
            self.backend.update_inner();
        }
    }
}

#[mrc_object]
pub struct Element {
    id: u32,
    name: String,
    backend: Box<dyn ElementBackend>,
    parent: Option<ElementWeak>,
    children: Vec<Element>,
    pub position: Vec3,
    pub render_order: i32,
}

impl ElementData {
    pub fn new<T: ElementBackend + 'static>(backend: T) -> Self {
        let id = NEXT_ELEMENT_ID.get();
        NEXT_ELEMENT_ID.set(id + 1);
        Self {
            id,
            name: String::new(),
            backend: Box::new(backend),
            parent: None,
            children: Vec::new(),
            position: Vec3::default(),
            render_order: 0,
        }
    }
}

pub struct EmptyElementBackend {}

impl ElementBackend for EmptyElementBackend {
    fn get_name(&self) -> &str {
        "Empty"
    }
}

/// Kind-specific behavior of a scene node. Every method has an opt-out
/// default so plain scene content only needs a name.
pub trait ElementBackend {
    fn get_name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    fn box_component(&self) -> Option<&BoxComponent> {
        None
    }

    fn box_component_mut(&mut self) -> Option<&mut BoxComponent> {
        None
    }

    fn content_container(&self) -> Option<Element> {
        None
    }

    fn material(&self) -> Option<&Material> {
        None
    }

    fn set_material(&mut self, material: Material) {
        let _ = material;
    }

    fn geometry(&self) -> Option<&Geometry> {
        None
    }

    fn parse_params(&mut self) -> ParamsFuture {
        ready(Ok(())).boxed_local()
    }

    fn update_layout(&mut self) {}

    fn update_inner(&mut self) {}
}
