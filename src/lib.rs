//! Retained-mode layout for 3D user interfaces.
//!
//! A scene is a tree of [`Element`]s. Layout nodes ([`Block`], [`InlineBox`])
//! resolve their parameters, compute the positions of their children and
//! draw a background frame. Passes are scheduled through [`update_manager`].

use env_logger::Env;

pub mod base;
pub mod box_model;
pub mod color;
pub mod diagnostic;
pub mod element;
pub mod error;
pub mod frame;
pub mod macro_mod;
pub mod material;
pub mod mrc;
pub mod update_manager;

pub use box_model::BoxOptions;
pub use element::block::Block;
pub use element::container::Container;
pub use element::inline_box::InlineBox;
pub use element::{Capabilities, Element, ElementBackend, ElementWeak};
pub use error::{MeshError, MeshResult};

pub fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
}
