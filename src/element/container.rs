use crate::element::{Element, ElementBackend};

/// Opaque scene node. Holds user content or generated geometry and never
/// takes part in any pass.
pub struct Container {}

impl Container {
    pub fn create(name: &str) -> Element {
        let mut element = Element::create(|_| Container {});
        element.set_name(name);
        element
    }
}

impl ElementBackend for Container {
    fn get_name(&self) -> &str {
        "Container"
    }
}
