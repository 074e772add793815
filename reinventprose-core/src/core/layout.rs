//! The user's arrangement of dockable panes, persisted between sessions.
//!
//! A layout is a binary tree of splits with a pane at every leaf. Hidden
//! panes are remembered so the View menu can bring them back.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

const MIN_RATIO: f32 = 0.1;
const MAX_RATIO: f32 = 0.9;

/// Every pane the book view can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaneKind {
    Library,
    BookDetails,
    ChapterList,
    Editor,
    AbstractIdea,
    ConcreteIdeas,
}

impl PaneKind {
    pub const ALL: [PaneKind; 6] = [
        Self::Library,
        Self::BookDetails,
        Self::ChapterList,
        Self::Editor,
        Self::AbstractIdea,
        Self::ConcreteIdeas,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Library => "Library",
            Self::BookDetails => "Book Details",
            Self::ChapterList => "Chapters",
            Self::Editor => "Chapter Content",
            Self::AbstractIdea => "Abstract Idea",
            Self::ConcreteIdeas => "Concrete Ideas",
        }
    }
}

/// Direction of the line dividing a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis {
    /// `a` above `b`.
    Horizontal,
    /// `a` left of `b`.
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutNode {
    Split {
        axis: Axis,
        /// Share of the space given to `a`.
        ratio: f32,
        a: Box<LayoutNode>,
        b: Box<LayoutNode>,
    },
    Pane(PaneKind),
}

impl LayoutNode {
    pub fn split(axis: Axis, ratio: f32, a: LayoutNode, b: LayoutNode) -> Self {
        Self::Split {
            axis,
            ratio,
            a: Box::new(a),
            b: Box::new(b),
        }
    }

    /// Panes in left-to-right, top-to-bottom order.
    pub fn panes(&self) -> Vec<PaneKind> {
        let mut out = Vec::new();
        self.collect_panes(&mut out);
        out
    }

    fn collect_panes(&self, out: &mut Vec<PaneKind>) {
        match self {
            Self::Pane(kind) => out.push(*kind),
            Self::Split { a, b, .. } => {
                a.collect_panes(out);
                b.collect_panes(out);
            }
        }
    }

    pub fn contains(&self, kind: PaneKind) -> bool {
        match self {
            Self::Pane(k) => *k == kind,
            Self::Split { a, b, .. } => a.contains(kind) || b.contains(kind),
        }
    }

    /// Returns the tree without `kind`; a split left with one child collapses
    /// into that child. `None` when nothing remains.
    fn remove(self, kind: PaneKind) -> Option<Self> {
        match self {
            Self::Pane(k) if k == kind => None,
            pane @ Self::Pane(_) => Some(pane),
            Self::Split { axis, ratio, a, b } => match (a.remove(kind), b.remove(kind)) {
                (Some(a), Some(b)) => Some(Self::split(axis, ratio, a, b)),
                (Some(only), None) | (None, Some(only)) => Some(only),
                (None, None) => None,
            },
        }
    }

    /// Clamps ratios and drops every pane already in `seen`.
    fn sanitize(self, seen: &mut Vec<PaneKind>) -> Option<Self> {
        match self {
            Self::Pane(kind) if seen.contains(&kind) => None,
            Self::Pane(kind) => {
                seen.push(kind);
                Some(Self::Pane(kind))
            }
            Self::Split { axis, ratio, a, b } => {
                let ratio = if ratio.is_finite() {
                    ratio.clamp(MIN_RATIO, MAX_RATIO)
                } else {
                    0.5
                };
                match (a.sanitize(seen), b.sanitize(seen)) {
                    (Some(a), Some(b)) => Some(Self::split(axis, ratio, a, b)),
                    (Some(only), None) | (None, Some(only)) => Some(only),
                    (None, None) => None,
                }
            }
        }
    }
}

/// The persisted arrangement of the book view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneLayout {
    pub root: LayoutNode,
    #[serde(default)]
    pub hidden: Vec<PaneKind>,
}

impl Default for PaneLayout {
    /// Chapters on the left, editor in the middle with the abstract idea
    /// beneath it, book details and concrete ideas on the right.
    fn default() -> Self {
        use LayoutNode::Pane;
        let centre = LayoutNode::split(
            Axis::Horizontal,
            0.7,
            Pane(PaneKind::Editor),
            Pane(PaneKind::AbstractIdea),
        );
        let right = LayoutNode::split(
            Axis::Horizontal,
            0.5,
            Pane(PaneKind::BookDetails),
            Pane(PaneKind::ConcreteIdeas),
        );
        let root = LayoutNode::split(
            Axis::Vertical,
            0.2,
            Pane(PaneKind::ChapterList),
            LayoutNode::split(Axis::Vertical, 0.7, centre, right),
        );
        Self {
            root,
            hidden: vec![PaneKind::Library],
        }
    }
}

impl PaneLayout {
    /// Reads a layout saved by [`PaneLayout::save`].
    ///
    /// A missing, unreadable or corrupt file yields the default layout; the
    /// problem is logged and never reported to the caller.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("could not read layout {}: {e}", path.display());
                }
                return Self::default();
            }
        };
        match serde_json::from_str::<PaneLayout>(&text) {
            Ok(layout) => layout.validate(),
            Err(e) => {
                log::warn!("ignoring corrupt layout {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn is_visible(&self, kind: PaneKind) -> bool {
        self.root.contains(kind)
    }

    /// Hides `kind`. The last visible pane cannot be hidden.
    pub fn without(self, kind: PaneKind) -> Self {
        if !self.root.contains(kind) {
            return self;
        }
        let Self { root, mut hidden } = self;
        match root.clone().remove(kind) {
            Some(root) => {
                if !hidden.contains(&kind) {
                    hidden.push(kind);
                }
                Self { root, hidden }
            }
            None => Self { root, hidden },
        }
    }

    /// Shows `kind` again by splitting the root, giving it a quarter of the
    /// space on the right.
    pub fn with(self, kind: PaneKind) -> Self {
        let Self { root, mut hidden } = self;
        hidden.retain(|k| *k != kind);
        if root.contains(kind) {
            return Self { root, hidden };
        }
        Self {
            root: LayoutNode::split(Axis::Vertical, 0.75, root, LayoutNode::Pane(kind)),
            hidden,
        }
    }

    /// Toggles the visibility of `kind`.
    pub fn toggled(self, kind: PaneKind) -> Self {
        if self.is_visible(kind) {
            self.without(kind)
        } else {
            self.with(kind)
        }
    }

    /// Repairs a layout read from disk: ratios are clamped to
    /// `[0.1, 0.9]`, duplicate panes are dropped, and the hidden list only
    /// keeps panes that are really absent from the tree.
    pub fn validate(self) -> Self {
        let mut seen = Vec::new();
        let Some(root) = self.root.sanitize(&mut seen) else {
            return Self::default();
        };
        let mut hidden = Vec::new();
        for kind in self.hidden {
            if !seen.contains(&kind) && !hidden.contains(&kind) {
                hidden.push(kind);
            }
        }
        Self { root, hidden }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use LayoutNode::Pane;

    #[test]
    fn test_default_layout_shows_book_panes() {
        let layout = PaneLayout::default();
        assert_eq!(
            layout.root.panes(),
            vec![
                PaneKind::ChapterList,
                PaneKind::Editor,
                PaneKind::AbstractIdea,
                PaneKind::BookDetails,
                PaneKind::ConcreteIdeas,
            ]
        );
        assert_eq!(layout.hidden, vec![PaneKind::Library]);
        assert_eq!(layout.clone().validate(), layout);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("layout.json");
        let layout = PaneLayout::default().without(PaneKind::ConcreteIdeas);
        layout.save(&path).unwrap();
        assert_eq!(PaneLayout::load(&path), layout);
    }

    #[test]
    fn test_missing_or_corrupt_file_gives_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");
        assert_eq!(PaneLayout::load(&path), PaneLayout::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(PaneLayout::load(&path), PaneLayout::default());
    }

    #[test]
    fn test_without_collapses_split() {
        let layout = PaneLayout::default().without(PaneKind::AbstractIdea);
        assert!(!layout.is_visible(PaneKind::AbstractIdea));
        assert!(layout.hidden.contains(&PaneKind::AbstractIdea));
        match &layout.root {
            LayoutNode::Split { b, .. } => match b.as_ref() {
                LayoutNode::Split { a, .. } => assert_eq!(**a, Pane(PaneKind::Editor)),
                other => panic!("unexpected node {other:?}"),
            },
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_last_pane_cannot_be_hidden() {
        let layout = PaneLayout {
            root: Pane(PaneKind::Editor),
            hidden: vec![],
        };
        let after = layout.clone().without(PaneKind::Editor);
        assert_eq!(after, layout);
    }

    #[test]
    fn test_with_restores_hidden_pane() {
        let layout = PaneLayout::default()
            .without(PaneKind::BookDetails)
            .with(PaneKind::BookDetails);
        assert!(layout.is_visible(PaneKind::BookDetails));
        assert!(!layout.hidden.contains(&PaneKind::BookDetails));

        let again = layout.clone().with(PaneKind::BookDetails);
        assert_eq!(again.root.panes().len(), layout.root.panes().len());
    }

    #[test]
    fn test_toggled() {
        let layout = PaneLayout::default().toggled(PaneKind::Library);
        assert!(layout.is_visible(PaneKind::Library));
        let layout = layout.toggled(PaneKind::Library);
        assert!(!layout.is_visible(PaneKind::Library));
    }

    #[test]
    fn test_validate_clamps_and_dedupes() {
        let layout = PaneLayout {
            root: LayoutNode::split(
                Axis::Vertical,
                1.7,
                Pane(PaneKind::Editor),
                LayoutNode::split(
                    Axis::Horizontal,
                    f32::NAN,
                    Pane(PaneKind::Editor),
                    Pane(PaneKind::ChapterList),
                ),
            ),
            hidden: vec![PaneKind::Editor, PaneKind::Library, PaneKind::Library],
        }
        .validate();

        assert_eq!(
            layout.root,
            LayoutNode::split(
                Axis::Vertical,
                0.9,
                Pane(PaneKind::Editor),
                Pane(PaneKind::ChapterList),
            )
        );
        assert_eq!(layout.hidden, vec![PaneKind::Library]);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&PaneLayout {
            root: Pane(PaneKind::ChapterList),
            hidden: vec![],
        })
        .unwrap();
        assert_eq!(json, r#"{"root":{"pane":"chapterList"},"hidden":[]}"#);
    }
}
