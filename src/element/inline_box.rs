use std::rc::Rc;

use futures_util::future::{ready, FutureExt};
use log::trace;

use crate::box_model::{BoxComponent, BoxOptions};
use crate::diagnostic::Diagnostic;
use crate::element::{Capabilities, Element, ElementBackend, ElementWeak, ParamsFuture};
use crate::error::MeshError;
use crate::frame::{DepictionFactory, FrameContainer, FrameFactory};
use crate::ok_or_return;

/// Fixed-size box taking part in the inline flow of its parent.
pub struct InlineBox {
    element: ElementWeak,
    box_component: BoxComponent,
    frame_container: FrameContainer,
}

impl InlineBox {
    pub fn create(options: BoxOptions) -> Element {
        Self::create_with_factory(options, Rc::new(FrameFactory))
    }

    pub fn create_with_factory(options: BoxOptions, factory: Rc<dyn DepictionFactory>) -> Element {
        let mut element = Element::create(|weak| InlineBox {
            box_component: BoxComponent::new(weak.clone()),
            frame_container: FrameContainer::new(&weak, factory),
            element: weak,
        });
        element.set(options, true, true);
        element
    }
}

impl ElementBackend for InlineBox {
    fn get_name(&self) -> &str {
        "InlineBox"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::INLINE
            | Capabilities::PARSE_PARAMS
            | Capabilities::UPDATE_LAYOUT
            | Capabilities::UPDATE_INNER
    }

    fn box_component(&self) -> Option<&BoxComponent> {
        Some(&self.box_component)
    }

    fn box_component_mut(&mut self) -> Option<&mut BoxComponent> {
        Some(&mut self.box_component)
    }

    fn content_container(&self) -> Option<Element> {
        Some(self.frame_container.element())
    }

    fn parse_params(&mut self) -> ParamsFuture {
        let options = self.box_component.options();
        let result = match (options.width, options.height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Ok(()),
            (width, height) => Err(MeshError::InvalidParameter(format!(
                "inline box {} needs a positive size, got {:?}x{:?}",
                self.element.upgrade().map(|e| e.get_id()).unwrap_or_default(),
                width,
                height
            ))),
        };
        ready(result).boxed_local()
    }

    fn update_layout(&mut self) {
        let element = ok_or_return!(self.element.upgrade());
        let bc = &self.box_component;
        let (width, height) = match (bc.get_width(), bc.get_height()) {
            (Some(w), Some(h)) => (w, h),
            (width, height) => {
                bc.report(Diagnostic::MissingDimension {
                    element_id: element.get_id(),
                    width,
                    height,
                });
                return;
            }
        };
        bc.set_pos_from_parent_records();
        let material = bc.get_background_material();
        let render_order = element.get_parents_number();
        self.frame_container.rebuild(width, height, &material, render_order);
        trace!("inline box {} placed at {}", element.get_id(), element.position);
    }

    fn update_inner(&mut self) {
        let mut element = ok_or_return!(self.element.upgrade());
        element.position.z = self.box_component.get_offset();
        let material = self.box_component.get_background_material();
        self.frame_container.rematerialize(&material);
    }
}
