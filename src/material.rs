use crate::color::Color;

/// Surface description shared by depiction meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
}

impl Material {
    pub fn new(color: Color, opacity: f32) -> Self {
        Self { color, opacity }
    }
}
