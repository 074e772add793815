//! Conversion between the persisted [`PaneLayout`] and iced's pane grid.

use iced::widget::pane_grid::{self, Configuration, Node};
use reinventprose_core::{Axis, LayoutNode, PaneKind, PaneLayout};

pub fn grid_state(layout: &PaneLayout) -> pane_grid::State<PaneKind> {
    pane_grid::State::with_configuration(configuration(&layout.root))
}

fn configuration(node: &LayoutNode) -> Configuration<PaneKind> {
    match node {
        LayoutNode::Pane(kind) => Configuration::Pane(*kind),
        LayoutNode::Split { axis, ratio, a, b } => Configuration::Split {
            axis: match axis {
                Axis::Horizontal => pane_grid::Axis::Horizontal,
                Axis::Vertical => pane_grid::Axis::Vertical,
            },
            ratio: *ratio,
            a: Box::new(configuration(a)),
            b: Box::new(configuration(b)),
        },
    }
}

/// Reads the current arrangement back out of the grid, after the user has
/// dragged or resized panes.
pub fn capture(state: &pane_grid::State<PaneKind>, hidden: &[PaneKind]) -> Option<PaneLayout> {
    let root = layout_node(state, state.layout())?;
    Some(
        PaneLayout {
            root,
            hidden: hidden.to_vec(),
        }
        .validate(),
    )
}

fn layout_node(state: &pane_grid::State<PaneKind>, node: &Node) -> Option<LayoutNode> {
    match node {
        Node::Pane(pane) => state.get(*pane).copied().map(LayoutNode::Pane),
        Node::Split { axis, ratio, a, b, .. } => {
            let axis = match axis {
                pane_grid::Axis::Horizontal => Axis::Horizontal,
                pane_grid::Axis::Vertical => Axis::Vertical,
            };
            Some(LayoutNode::split(
                axis,
                *ratio,
                layout_node(state, a)?,
                layout_node(state, b)?,
            ))
        }
    }
}
