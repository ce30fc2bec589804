use crate::element::{Element, ElementBackend};
use crate::frame::Geometry;
use crate::material::Material;

/// Renderable leaf: a piece of geometry drawn with a material.
pub struct Mesh {
    geometry: Geometry,
    material: Material,
}

impl Mesh {
    pub fn create(name: &str, geometry: Geometry, material: Material) -> Element {
        let mut element = Element::create(|_| Mesh { geometry, material });
        element.set_name(name);
        element
    }
}

impl ElementBackend for Mesh {
    fn get_name(&self) -> &str {
        "Mesh"
    }

    fn material(&self) -> Option<&Material> {
        Some(&self.material)
    }

    fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    fn geometry(&self) -> Option<&Geometry> {
        Some(&self.geometry)
    }
}
