use anyhow::Error;
use log::info;
use meshui::update_manager;
use meshui::{tree, Block, BoxOptions, Element, InlineBox};

const PANEL: &str = r##"{
    "width": 1.2,
    "padding": 0.05,
    "justifyContent": "center",
    "backgroundColor": "#1b1f2a",
    "backgroundOpacity": 0.9
}"##;

fn print_tree(element: &Element, depth: usize) {
    info!(
        "{}{} #{} {} render order {}",
        "  ".repeat(depth),
        element.get_type(),
        element.get_id(),
        element.position,
        element.render_order
    );
    for child in element.get_children() {
        print_tree(&child, depth + 1);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    meshui::init_logger();

    let title = Block::create(BoxOptions { margin: Some(0.02), ..BoxOptions::sized(1.0, 0.2) });
    let icons = (0..5).map(|_| InlineBox::create(BoxOptions { margin: Some(0.01), ..BoxOptions::sized(0.3, 0.1) }));
    let mut toolbar = Block::create(BoxOptions { text_align: Some(meshui::box_model::TextAlign::Center), ..BoxOptions::sized(1.0, 0.3) });
    for icon in icons {
        toolbar.add_child(icon)?;
    }
    let panel_options = BoxOptions::from_json(PANEL)?;
    let panel = tree!(Block::create(panel_options), [title, toolbar])?;

    update_manager::update().await?;
    print_tree(&panel, 0);
    Ok(())
}
