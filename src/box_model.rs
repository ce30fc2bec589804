use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Error;
use serde::Deserialize;

use crate::base::{Size, Vec2};
use crate::color::Color;
use crate::diagnostic::{Diagnostic, DiagnosticSink, LogSink};
use crate::element::{Capabilities, Element, ElementWeak};
use crate::material::Material;
use crate::{ok_or_return, some_or_continue, some_or_return};

pub const DEFAULT_OFFSET: f32 = 0.01;
pub const DEFAULT_BACKGROUND_OPACITY: f32 = 0.8;
pub const DEFAULT_BACKGROUND_COLOR: Color = Color::from_rgb(0x22, 0x22, 0x22);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentDirection {
    #[default]
    Column,
    Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JustifyContent {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignItems {
    Start,
    #[default]
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Parameters of a box. Every field is optional; `set` only overwrites the
/// fields that are present.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxOptions {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub padding: Option<f32>,
    pub margin: Option<f32>,
    pub content_direction: Option<ContentDirection>,
    pub justify_content: Option<JustifyContent>,
    pub align_items: Option<AlignItems>,
    pub text_align: Option<TextAlign>,
    pub background_color: Option<Color>,
    pub background_opacity: Option<f32>,
    pub offset: Option<f32>,
}

macro_rules! merge_fields {
    ($target: expr, $source: expr, $($field: ident),*) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field;
            }
        )*
    };
}

impl BoxOptions {
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn merge(&mut self, other: BoxOptions) {
        merge_fields!(
            self, other,
            width, height, padding, margin,
            content_direction, justify_content, align_items, text_align,
            background_color, background_opacity, offset
        );
    }
}

/// Outer measurements of a child taking part in an arrangement.
#[derive(Debug, Clone, Copy)]
struct ChildBox {
    id: u32,
    size: Size,
    margin: f32,
}

impl ChildBox {
    fn outer_width(&self) -> f32 {
        self.size.width + self.margin * 2.0
    }

    fn outer_height(&self) -> f32 {
        self.size.height + self.margin * 2.0
    }
}

struct Line {
    items: Vec<ChildBox>,
    width: f32,
    height: f32,
}

/// Splits `items` into lines no wider than `max_width`. An item wider than
/// the limit still gets a line of its own.
fn break_lines(items: Vec<ChildBox>, max_width: f32) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    for item in items {
        let wrap = match lines.last() {
            Some(line) => !line.items.is_empty() && line.width + item.outer_width() > max_width,
            None => true,
        };
        if wrap {
            lines.push(Line { items: Vec::new(), width: 0.0, height: 0.0 });
        }
        let line = some_or_continue!(lines.last_mut());
        line.width += item.outer_width();
        line.height = line.height.max(item.outer_height());
        line.items.push(item);
    }
    lines
}

/// Sizing, positioning and styling of a layout node.
///
/// Children never read each other: a parent computes one position record per
/// child and every child applies its own record in its layout pass.
pub struct BoxComponent {
    element: ElementWeak,
    options: BoxOptions,
    children_pos: HashMap<u32, Vec2>,
    diagnostics: Option<Rc<dyn DiagnosticSink>>,
}

impl BoxComponent {
    pub fn new(element: ElementWeak) -> Self {
        Self {
            element,
            options: BoxOptions::default(),
            children_pos: HashMap::new(),
            diagnostics: None,
        }
    }

    pub fn options(&self) -> &BoxOptions {
        &self.options
    }

    pub fn merge(&mut self, options: BoxOptions) {
        self.options.merge(options);
    }

    pub fn set_diagnostic_sink(&mut self, sink: Rc<dyn DiagnosticSink>) {
        self.diagnostics = Some(sink);
    }

    /// Sends `diagnostic` to the nearest sink set on this node or an ancestor.
    pub fn report(&self, diagnostic: Diagnostic) {
        match self.inherited(|bc| bc.diagnostics.clone()) {
            Some(sink) => sink.report(diagnostic),
            None => LogSink.report(diagnostic),
        }
    }

    pub fn get_width(&self) -> Option<f32> {
        match self.options.width {
            Some(w) => Some(w),
            None => self.fit_content().map(|s| s.width),
        }
        .filter(|w| *w > 0.0)
    }

    pub fn get_height(&self) -> Option<f32> {
        match self.options.height {
            Some(h) => Some(h),
            None => self.fit_content().map(|s| s.height),
        }
        .filter(|h| *h > 0.0)
    }

    pub fn get_padding(&self) -> f32 {
        self.options.padding.unwrap_or(0.0)
    }

    pub fn get_margin(&self) -> f32 {
        self.options.margin.unwrap_or(0.0)
    }

    pub fn get_inner_width(&self) -> Option<f32> {
        Some(self.get_width()? - self.get_padding() * 2.0)
    }

    pub fn get_inner_height(&self) -> Option<f32> {
        Some(self.get_height()? - self.get_padding() * 2.0)
    }

    /// Depth coordinate relative to the parent.
    pub fn get_offset(&self) -> f32 {
        self.inherited(|bc| bc.options.offset).unwrap_or(DEFAULT_OFFSET)
    }

    pub fn get_background_material(&self) -> Material {
        let color = self.options.background_color.unwrap_or(DEFAULT_BACKGROUND_COLOR);
        let opacity = self
            .inherited(|bc| bc.options.background_opacity)
            .unwrap_or(DEFAULT_BACKGROUND_OPACITY);
        Material::new(color, opacity)
    }

    pub fn child_position(&self, child_id: u32) -> Option<Vec2> {
        self.children_pos.get(&child_id).copied()
    }

    /// Moves the owning node to the position its parent recorded for it.
    /// Nodes without a parent record keep their position.
    pub fn set_pos_from_parent_records(&self) {
        let mut element = ok_or_return!(self.element.upgrade());
        let parent = some_or_return!(element.get_parent());
        let id = element.get_id();
        let record = some_or_return!(parent.box_component().and_then(|bc| bc.child_position(id)));
        element.position.x = record.x;
        element.position.y = record.y;
    }

    /// Block flow: children are stacked along the content direction.
    pub fn compute_children_position(&mut self) {
        self.children_pos.clear();
        let inner = some_or_return!(self.inner_size());
        let items = self.child_boxes(false);
        let direction = self.options.content_direction.unwrap_or_default();
        let justify = self.options.justify_content.unwrap_or_default();
        let align = self.options.align_items.unwrap_or_default();

        let (main_inner, cross_inner) = match direction {
            ContentDirection::Column => (inner.height, inner.width),
            ContentDirection::Row => (inner.width, inner.height),
        };
        let main_outer = |c: &ChildBox| match direction {
            ContentDirection::Column => c.outer_height(),
            ContentDirection::Row => c.outer_width(),
        };
        let total: f32 = items.iter().map(|c| main_outer(c)).sum();
        let (mut cursor, gap) = match justify {
            JustifyContent::Start => (0.0, 0.0),
            JustifyContent::Center => ((main_inner - total) / 2.0, 0.0),
            JustifyContent::End => (main_inner - total, 0.0),
            JustifyContent::SpaceBetween if items.len() > 1 => {
                (0.0, ((main_inner - total) / (items.len() - 1) as f32).max(0.0))
            }
            JustifyContent::SpaceBetween => (0.0, 0.0),
        };

        for item in &items {
            let main_size = main_outer(item);
            // distance from the start edge to the child's center
            let main_center = cursor + main_size / 2.0;
            cursor += main_size + gap;
            let cross_size = match direction {
                ContentDirection::Column => item.outer_width(),
                ContentDirection::Row => item.outer_height(),
            };
            let cross_center = match align {
                AlignItems::Start => cross_size / 2.0,
                AlignItems::Center => cross_inner / 2.0,
                AlignItems::End => cross_inner - cross_size / 2.0,
            };
            // start edges are the top (column) and the left (row) of the inner box
            let pos = match direction {
                ContentDirection::Column => Vec2::new(
                    cross_center - inner.width / 2.0,
                    inner.height / 2.0 - main_center,
                ),
                ContentDirection::Row => Vec2::new(
                    main_center - inner.width / 2.0,
                    inner.height / 2.0 - cross_center,
                ),
            };
            self.children_pos.insert(item.id, pos);
        }
    }

    /// Inline flow: inline children run left to right and wrap on overflow.
    pub fn compute_inlines_position(&mut self) {
        self.children_pos.clear();
        let inner = some_or_return!(self.inner_size());
        let text_align = self.options.text_align.unwrap_or_default();

        let lines = break_lines(self.child_boxes(true), inner.width);

        let mut top = inner.height / 2.0;
        for line in &lines {
            let mut x = match text_align {
                TextAlign::Left => -inner.width / 2.0,
                TextAlign::Center => -line.width / 2.0,
                TextAlign::Right => inner.width / 2.0 - line.width,
            };
            let y = top - line.height / 2.0;
            for item in &line.items {
                self.children_pos.insert(item.id, Vec2::new(x + item.outer_width() / 2.0, y));
                x += item.outer_width();
            }
            top -= line.height;
        }
    }

    fn inner_size(&self) -> Option<Size> {
        Some(Size::new(self.get_inner_width()?, self.get_inner_height()?))
    }

    /// Children with a box, filtered on the inline marker.
    fn child_boxes(&self, inline: bool) -> Vec<ChildBox> {
        let element = ok_or_return!(self.element.upgrade(), Vec::new());
        element
            .get_children()
            .iter()
            .filter(|c| c.is_inline() == inline)
            .filter_map(|c| {
                let bc = c.box_component()?;
                Some(ChildBox {
                    id: c.get_id(),
                    size: Size::new(bc.get_width().unwrap_or(0.0), bc.get_height().unwrap_or(0.0)),
                    margin: bc.get_margin(),
                })
            })
            .collect()
    }

    /// Size wrapping the children in the arrangement they would get.
    fn fit_content(&self) -> Option<Size> {
        let element = ok_or_return!(self.element.upgrade(), None);
        let inline = element.get_children().iter().any(|c| c.is_inline());
        let items = self.child_boxes(inline);
        if items.is_empty() {
            return None;
        }
        let (width, height) = if inline {
            // an explicit width wraps the lines the same way the inline flow does
            let max_width = self
                .options
                .width
                .filter(|w| *w > 0.0)
                .map(|w| w - self.get_padding() * 2.0)
                .unwrap_or(f32::INFINITY);
            let lines = break_lines(items, max_width);
            (
                lines.iter().map(|l| l.width).fold(0.0, f32::max),
                lines.iter().map(|l| l.height).sum::<f32>(),
            )
        } else if self.options.content_direction.unwrap_or_default() == ContentDirection::Row {
            (
                items.iter().map(ChildBox::outer_width).sum::<f32>(),
                items.iter().map(ChildBox::outer_height).fold(0.0, f32::max),
            )
        } else {
            (
                items.iter().map(ChildBox::outer_width).fold(0.0, f32::max),
                items.iter().map(ChildBox::outer_height).sum::<f32>(),
            )
        };
        let padding = self.get_padding() * 2.0;
        Some(Size::new(width + padding, height + padding))
    }

    /// First value found on this box or on an ancestor up to the layout root.
    fn inherited<R, F: Fn(&BoxComponent) -> Option<R>>(&self, getter: F) -> Option<R> {
        if let Some(v) = getter(self) {
            return Some(v);
        }
        let element = self.element.upgrade().ok()?;
        let mut parent: Option<Element> = element.get_parent();
        while let Some(p) = parent {
            if !p.capabilities().contains(Capabilities::UPDATE_LAYOUT) {
                break;
            }
            if let Some(v) = p.box_component().and_then(&getter) {
                return Some(v);
            }
            parent = p.get_parent();
        }
        None
    }
}
