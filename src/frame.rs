use std::rc::Rc;

use log::{error, trace};

use crate::base::Size;
use crate::element::container::Container;
use crate::element::mesh::Mesh;
use crate::element::{Element, ElementWeak};
use crate::material::Material;

pub const FRAME_CONTAINER_NAME: &str = "meshui-frame-container";
pub const FRAME_NAME: &str = "meshui-frame";

/// Triangle list in the xy plane, centered on the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl Geometry {
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self {
            positions: vec![
                [-hw, -hh, 0.0],
                [hw, -hh, 0.0],
                [hw, hh, 0.0],
                [-hw, hh, 0.0],
            ],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn size(&self) -> Size {
        if self.positions.is_empty() {
            return Size::default();
        }
        let mut min = (f32::MAX, f32::MAX);
        let mut max = (f32::MIN, f32::MIN);
        for p in &self.positions {
            min = (min.0.min(p[0]), min.1.min(p[1]));
            max = (max.0.max(p[0]), max.1.max(p[1]));
        }
        Size::new(max.0 - min.0, max.1 - min.1)
    }
}

/// Builds the background depiction of a box.
pub trait DepictionFactory {
    fn build_frame(&self, width: f32, height: f32, material: &Material) -> Element;
}

pub struct FrameFactory;

impl DepictionFactory for FrameFactory {
    fn build_frame(&self, width: f32, height: f32, material: &Material) -> Element {
        Mesh::create(FRAME_NAME, Geometry::plane(width, height), material.clone())
    }
}

/// The child slot of a box that holds nothing but its generated depiction.
pub struct FrameContainer {
    container: Element,
    factory: Rc<dyn DepictionFactory>,
}

impl FrameContainer {
    /// Creates the slot and attaches it under `owner`.
    pub fn new(owner: &ElementWeak, factory: Rc<dyn DepictionFactory>) -> Self {
        let container = Container::create(FRAME_CONTAINER_NAME);
        if let Ok(mut owner) = owner.upgrade() {
            if let Err(e) = owner.add_child(container.clone()) {
                error!("failed to attach frame container: {}", e);
            }
        }
        Self { container, factory }
    }

    pub fn element(&self) -> Element {
        self.container.clone()
    }

    /// Drops the previous depiction and attaches a new one.
    pub fn rebuild(&mut self, width: f32, height: f32, material: &Material, render_order: i32) {
        self.container.deep_delete();
        let mut frame = self.factory.build_frame(width, height, material);
        frame.render_order = render_order;
        trace!("frame {} built: {}x{}, render order {}", frame.get_id(), width, height, render_order);
        if let Err(e) = self.container.add_child(frame) {
            error!("failed to attach frame: {}", e);
        }
    }

    /// Replaces the material of every depiction element that has one.
    pub fn rematerialize(&mut self, material: &Material) {
        self.container.traverse(&mut |e: &mut Element| {
            if e.material().is_some() {
                e.set_material(material.clone());
            }
        });
    }
}
