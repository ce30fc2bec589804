use std::rc::Rc;

use futures_util::future::{ready, try_join_all, FutureExt};
use log::debug;

use crate::box_model::{BoxComponent, BoxOptions};
use crate::diagnostic::Diagnostic;
use crate::element::{Capabilities, Element, ElementBackend, ElementWeak, ParamsFuture};
use crate::frame::{DepictionFactory, FrameContainer, FrameFactory};
use crate::ok_or_return;

/// Layout node arranging its children in block or inline flow and drawing
/// a background frame behind them.
pub struct Block {
    element: ElementWeak,
    box_component: BoxComponent,
    frame_container: FrameContainer,
}

impl Block {
    pub fn create(options: BoxOptions) -> Element {
        Self::create_with_factory(options, Rc::new(FrameFactory))
    }

    pub fn create_with_factory(options: BoxOptions, factory: Rc<dyn DepictionFactory>) -> Element {
        let mut element = Element::create(|weak| Block::new(weak, factory));
        element.set(options, true, true);
        element
    }

    fn new(element: ElementWeak, factory: Rc<dyn DepictionFactory>) -> Self {
        let frame_container = FrameContainer::new(&element, factory);
        Self {
            box_component: BoxComponent::new(element.clone()),
            element,
            frame_container,
        }
    }
}

impl ElementBackend for Block {
    fn get_name(&self) -> &str {
        "Block"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PARSE_PARAMS | Capabilities::UPDATE_LAYOUT | Capabilities::UPDATE_INNER
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
        let element = match self.element.upgrade() {
            Ok(e) => e,
            Err(e) => return ready(Err(e.into())).boxed_local(),
        };
        let pending: Vec<ParamsFuture> = element
            .get_children()
            .iter_mut()
            .filter(|c| c.capabilities().contains(Capabilities::PARSE_PARAMS))
            .map(|c| c.parse_params())
            .collect();
        async move { try_join_all(pending).await.map(|_| ()) }.boxed_local()
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

        let children = element.get_children();
        if children.iter().any(|c| c.is_inline()) {
            self.box_component.compute_inlines_position();
        } else {
            self.box_component.compute_children_position();
        }

        let material = self.box_component.get_background_material();
        let render_order = element.get_parents_number();
        self.frame_container.rebuild(width, height, &material, render_order);
        debug!(
            "block {} laid out: {}x{} at {}, render order {}",
            element.get_id(),
            width,
            height,
            element.position,
            render_order
        );

        for mut child in children {
            if child.capabilities().contains(Capabilities::UPDATE_LAYOUT) {
                child.update_layout();
            }
        }
    }

    fn update_inner(&mut self) {
        let mut element = ok_or_return!(self.element.upgrade());
        element.position.z = self.box_component.get_offset();
        let material = self.box_component.get_background_material();
        self.frame_container.rematerialize(&material);
        for mut child in element.get_children() {
            if child.capabilities().contains(Capabilities::UPDATE_INNER) {
                child.update_inner();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use futures_util::future::FutureExt;
    use tokio::sync::oneshot;

    use crate::base::{Size, Vec2};
    use crate::box_model::{BoxOptions, ContentDirection, JustifyContent, DEFAULT_OFFSET};
    use crate::color::Color;
    use crate::diagnostic::{Diagnostic, RecordingSink};
    use crate::element::block::Block;
    use crate::element::container::Container;
    use crate::element::inline_box::InlineBox;
    use crate::element::{Capabilities, Element, ElementBackend, ParamsFuture};
    use crate::error::{MeshError, MeshResult};
    use crate::frame::{DepictionFactory, FrameFactory};
    use crate::material::Material;
    use crate::tree;

    struct DeferredBackend {
        receiver: Option<oneshot::Receiver<MeshResult<()>>>,
    }

    impl ElementBackend for DeferredBackend {
        fn get_name(&self) -> &str {
            "Deferred"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::PARSE_PARAMS
        }

        fn parse_params(&mut self) -> ParamsFuture {
            let receiver = self.receiver.take();
            async move {
                match receiver {
                    Some(r) => r.await.unwrap_or(Err(MeshError::InvalidState)),
                    None => Ok(()),
                }
            }
            .boxed_local()
        }
    }

    fn deferred() -> (Element, oneshot::Sender<MeshResult<()>>) {
        let (sender, receiver) = oneshot::channel();
        let element = Element::create(|_| DeferredBackend { receiver: Some(receiver) });
        (element, sender)
    }

    #[derive(Default)]
    struct CountingFactory {
        built: Cell<u32>,
    }

    impl DepictionFactory for CountingFactory {
        fn build_frame(&self, width: f32, height: f32, material: &Material) -> Element {
            self.built.set(self.built.get() + 1);
            FrameFactory.build_frame(width, height, material)
        }
    }

    fn frames_of(element: &Element) -> Vec<Element> {
        element
            .content_container()
            .map(|c| c.get_children())
            .unwrap_or_default()
    }

    fn pos(element: &Element) -> Vec2 {
        element.position.xy()
    }

    #[test]
    fn test_join_waits_for_every_child() {
        let (first, first_sender) = deferred();
        let (second, second_sender) = deferred();
        let inner = tree!(Block::create(BoxOptions::sized(1.0, 1.0)), [second]).unwrap();
        let mut root = tree!(Block::create(BoxOptions::sized(2.0, 2.0)), [first, inner]).unwrap();

        let mut future = root.parse_params();
        assert!((&mut future).now_or_never().is_none());
        first_sender.send(Ok(())).unwrap();
        assert!((&mut future).now_or_never().is_none());
        second_sender.send(Ok(())).unwrap();
        assert_eq!(Some(Ok(())), future.now_or_never());
    }

    #[test]
    fn test_join_with_immediate_and_delayed_children() {
        let (delayed, sender) = deferred();
        let mut root = tree!(
            Block::create(BoxOptions::sized(4.0, 4.0)),
            [
                InlineBox::create(BoxOptions::sized(1.0, 1.0)),
                delayed,
                Block::create(BoxOptions::sized(1.0, 1.0))
            ]
        )
        .unwrap();
        let mut future = root.parse_params();
        assert!((&mut future).now_or_never().is_none());
        sender.send(Ok(())).unwrap();
        assert_eq!(Some(Ok(())), future.now_or_never());
    }

    #[test]
    fn test_join_without_participants_is_immediate() {
        let mut root = Block::create(BoxOptions::sized(1.0, 1.0));
        assert_eq!(Some(Ok(())), root.parse_params().now_or_never());
    }

    #[test]
    fn test_join_waits_for_every_child_in_reverse_order() {
        let (a, a_sender) = deferred();
        let (b, b_sender) = deferred();
        let (c, c_sender) = deferred();
        let mut root = tree!(Block::create(BoxOptions::sized(2.0, 2.0)), [a, b, c]).unwrap();

        let mut future = root.parse_params();
        c_sender.send(Ok(())).unwrap();
        assert!((&mut future).now_or_never().is_none());
        b_sender.send(Ok(())).unwrap();
        assert!((&mut future).now_or_never().is_none());
        a_sender.send(Ok(())).unwrap();
        assert_eq!(Some(Ok(())), future.now_or_never());
    }

    #[test]
    fn test_child_rejection_is_forwarded() {
        let (child, sender) = deferred();
        let mut root = tree!(Block::create(BoxOptions::sized(1.0, 1.0)), [child]).unwrap();
        let future = root.parse_params();
        let error = MeshError::InvalidParameter("font missing".to_string());
        sender.send(Err(error.clone())).unwrap();
        assert_eq!(Some(Err(error)), future.now_or_never());
    }

    #[test]
    fn test_grandchild_rejection_reaches_root() {
        let (grandchild, sender) = deferred();
        let (sibling, sibling_sender) = deferred();
        let middle = tree!(Block::create(BoxOptions::sized(1.0, 1.0)), [grandchild]).unwrap();
        let mut root = tree!(Block::create(BoxOptions::sized(2.0, 2.0)), [middle, sibling]).unwrap();

        let mut future = root.parse_params();
        assert!((&mut future).now_or_never().is_none());
        let error = MeshError::InvalidParameter("texture missing".to_string());
        sender.send(Err(error.clone())).unwrap();
        assert_eq!(Some(Err(error)), future.now_or_never());
        drop(sibling_sender);
    }

    #[test]
    fn test_block_flow_positions() {
        let a = Block::create(BoxOptions::sized(4.0, 2.0));
        let b = Block::create(BoxOptions::sized(4.0, 2.0));
        let mut root = tree!(
            Block::create(BoxOptions { padding: Some(1.0), ..BoxOptions::sized(10.0, 10.0) }),
            [a.clone(), b.clone()]
        )
        .unwrap();
        root.update_layout();
        assert_eq!(Vec2::new(0.0, 3.0), pos(&a));
        assert_eq!(Vec2::new(0.0, 1.0), pos(&b));
    }

    #[test]
    fn test_row_flow_positions() {
        let a = Block::create(BoxOptions { margin: Some(1.0), ..BoxOptions::sized(2.0, 2.0) });
        let b = Block::create(BoxOptions::sized(2.0, 2.0));
        let mut root = tree!(
            Block::create(BoxOptions {
                content_direction: Some(ContentDirection::Row),
                ..BoxOptions::sized(10.0, 6.0)
            }),
            [a.clone(), b.clone()]
        )
        .unwrap();
        root.update_layout();
        assert_eq!(Vec2::new(-3.0, 0.0), pos(&a));
        assert_eq!(Vec2::new(0.0, 0.0), pos(&b));
    }

    #[test]
    fn test_inline_flow_wraps() {
        let items: Vec<Element> = (0..3).map(|_| InlineBox::create(BoxOptions::sized(4.0, 1.0))).collect();
        let mut root = Block::create(BoxOptions::sized(10.0, 10.0));
        for item in &items {
            root.add_child(item.clone()).unwrap();
        }
        root.update_layout();
        assert_eq!(Vec2::new(-3.0, 4.5), pos(&items[0]));
        assert_eq!(Vec2::new(1.0, 4.5), pos(&items[1]));
        assert_eq!(Vec2::new(-3.0, 3.5), pos(&items[2]));
    }

    #[test]
    fn test_arrangement_is_decided_per_node() {
        let inline = InlineBox::create(BoxOptions::sized(2.0, 1.0));
        let nested_child = Block::create(BoxOptions::sized(2.0, 2.0));
        let nested = tree!(Block::create(BoxOptions::sized(4.0, 4.0)), [nested_child.clone()]).unwrap();
        let mut root = tree!(
            Block::create(BoxOptions::sized(10.0, 10.0)),
            [inline.clone(), nested.clone()]
        )
        .unwrap();
        root.update_layout();
        assert_eq!(Vec2::new(-4.0, 4.5), pos(&inline));
        // non-inline children of an inline parent get no record
        assert_eq!(Vec2::new(0.0, 0.0), pos(&nested));
        assert_eq!(Vec2::new(0.0, 1.0), pos(&nested_child));
    }

    #[test]
    fn test_layout_is_idempotent() {
        let factory = Rc::new(CountingFactory::default());
        let child = Block::create_with_factory(BoxOptions::sized(1.0, 1.0), factory.clone());
        let mut root = tree!(
            Block::create_with_factory(BoxOptions::sized(4.0, 4.0), factory.clone()),
            [child.clone()]
        )
        .unwrap();
        root.update_layout();
        let first = pos(&child);
        root.update_layout();
        assert_eq!(first, pos(&child));
        assert_eq!(1, frames_of(&root).len());
        assert_eq!(1, frames_of(&child).len());
        assert_eq!(4, factory.built.get());
    }

    #[test]
    fn test_missing_dimension_aborts_subtree() {
        let sink = Rc::new(RecordingSink::new());
        let grandchild = Block::create(BoxOptions::sized(1.0, 1.0));
        let mut root = tree!(
            Block::create(BoxOptions { width: Some(0.0), height: Some(1.0), ..Default::default() }),
            [grandchild.clone()]
        )
        .unwrap();
        root.set_diagnostic_sink(sink.clone());
        root.update_layout();
        assert_eq!(
            vec![Diagnostic::MissingDimension {
                element_id: root.get_id(),
                width: None,
                height: Some(1.0),
            }],
            sink.records()
        );
        assert!(frames_of(&root).is_empty());
        assert!(frames_of(&grandchild).is_empty());
    }

    #[test]
    fn test_missing_dimension_reaches_ancestor_sink() {
        let sink = Rc::new(RecordingSink::new());
        let child = Block::create(BoxOptions::default());
        let mut root = tree!(Block::create(BoxOptions::sized(4.0, 4.0)), [child.clone()]).unwrap();
        root.set_diagnostic_sink(sink.clone());
        root.update_layout();
        let records = sink.take();
        assert_eq!(1, records.len());
        assert_eq!(
            Diagnostic::MissingDimension { element_id: child.get_id(), width: None, height: None },
            records[0]
        );
        assert_eq!(1, frames_of(&root).len());
    }

    #[test]
    fn test_size_fits_children() {
        let mut root = tree!(
            Block::create(BoxOptions { padding: Some(0.5), ..Default::default() }),
            [
                Block::create(BoxOptions::sized(2.0, 1.0)),
                Block::create(BoxOptions { margin: Some(0.5), ..BoxOptions::sized(1.0, 1.0) })
            ]
        )
        .unwrap();
        root.update_layout();
        let frames = frames_of(&root);
        assert_eq!(1, frames.len());
        assert_eq!(Some(Size::new(3.0, 4.0)), frames[0].geometry().map(|g| g.size()));
    }

    #[test]
    fn test_render_order_follows_depth() {
        let grandchild = Block::create(BoxOptions::sized(1.0, 1.0));
        let child = tree!(Block::create(BoxOptions::sized(2.0, 2.0)), [grandchild.clone()]).unwrap();
        let mut root = tree!(Block::create(BoxOptions::sized(4.0, 4.0)), [child.clone()]).unwrap();
        root.update_layout();
        assert_eq!(0, frames_of(&root)[0].render_order);
        assert_eq!(1, frames_of(&child)[0].render_order);
        assert_eq!(2, frames_of(&grandchild)[0].render_order);
    }

    #[test]
    fn test_update_inner_repaints_without_reflow() {
        let child = Block::create(BoxOptions::sized(1.0, 1.0));
        let mut root = tree!(
            Block::create(BoxOptions { justify_content: Some(JustifyContent::End), ..BoxOptions::sized(4.0, 4.0) }),
            [child.clone()]
        )
        .unwrap();
        root.update_layout();
        let frame = frames_of(&root)[0].clone();
        let child_frame = frames_of(&child)[0].clone();
        let child_pos = pos(&child);
        assert_eq!(Vec2::new(0.0, -1.5), child_pos);

        let red = Color::from_rgb(255, 0, 0);
        let repaint = BoxOptions {
            background_color: Some(red),
            background_opacity: Some(0.3),
            ..Default::default()
        };
        root.set(repaint, false, false);
        root.update_inner();
        let frames = frames_of(&root);
        assert_eq!(1, frames.len());
        assert!(frames[0] == frame);
        assert!(frames_of(&child)[0] == child_frame);
        assert_eq!(Some(Material::new(red, 0.3)), frames[0].material());
        assert_eq!(child_pos, pos(&child));
        assert_eq!(DEFAULT_OFFSET, root.position.z);
    }

    #[test]
    fn test_height_fits_wrapped_inline_lines() {
        let items: Vec<Element> = (0..3).map(|_| InlineBox::create(BoxOptions::sized(4.0, 1.0))).collect();
        let mut root = Block::create(BoxOptions { width: Some(5.0), ..Default::default() });
        for item in &items {
            root.add_child(item.clone()).unwrap();
        }
        root.update_layout();
        let frames = frames_of(&root);
        assert_eq!(Some(Size::new(5.0, 3.0)), frames[0].geometry().map(|g| g.size()));
        assert_eq!(Vec2::new(-0.5, 1.0), pos(&items[0]));
        assert_eq!(Vec2::new(-0.5, 0.0), pos(&items[1]));
        assert_eq!(Vec2::new(-0.5, -1.0), pos(&items[2]));
    }

    #[test]
    fn test_plain_parent_ends_layout_chain() {
        let mut inner = Block::create(BoxOptions::sized(1.0, 1.0));
        let scene = tree!(Container::create("scene"), [inner.clone()]).unwrap();
        let _outer = tree!(
            Block::create(BoxOptions { offset: Some(0.05), ..BoxOptions::sized(4.0, 4.0) }),
            [scene]
        )
        .unwrap();
        assert_eq!(0, inner.get_parents_number());
        inner.update_layout();
        inner.update_inner();
        assert_eq!(0, frames_of(&inner)[0].render_order);
        assert_eq!(DEFAULT_OFFSET, inner.position.z);
    }

    #[test]
    fn test_offset_is_inherited() {
        let child = Block::create(BoxOptions::sized(1.0, 1.0));
        let mut root = tree!(
            Block::create(BoxOptions { offset: Some(0.05), ..BoxOptions::sized(2.0, 2.0) }),
            [child.clone()]
        )
        .unwrap();
        root.update_inner();
        assert_eq!(0.05, child.position.z);
    }
}
