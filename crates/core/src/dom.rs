//! Render targets for the page controllers.
//!
//! [`StreamSink`] is the narrow set of document mutations the loading page needs. The
//! in-memory [`Document`] implements it and records every mutation as a [`DomEvent`], which
//! is what tests assert against. Methods take `&self` so the main stream and the status
//! region can share one sink from concurrently polled futures; implementations never hold
//! a lock across an await point.

use crate::markup::{escape_html, Element};
use std::sync::Mutex;

/// Handle to a node created through a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Which visual the loading page shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VideoState {
    #[default]
    Unset,
    Playing(String),
    Placeholder,
}

/// Mutations a loading page can make.
pub trait StreamSink: Send + Sync {
    /// Appends an element to the stream container, after every earlier node.
    fn append(&self, element: Element) -> NodeId;
    /// Creates the status region, outside the stream container.
    fn create_status(&self, element: Element) -> NodeId;
    /// Appends one character of plain text to a node.
    fn push_char(&self, node: NodeId, ch: char);
    /// Removes all content of a node.
    fn clear(&self, node: NodeId);
    /// Replaces a node's content with final markup.
    fn set_markup(&self, node: NodeId, markup: &str, text: &str);
    /// Recolours a node's border.
    fn set_border(&self, node: NodeId, color: &str);
    /// Sets the loading visual.
    fn set_video(&self, state: VideoState);
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    Appended { node: NodeId, html: String },
    StatusCreated { node: NodeId, html: String },
    Char { node: NodeId, ch: char },
    Cleared { node: NodeId },
    Markup { node: NodeId, markup: String },
    Border { node: NodeId, color: String },
    Video(VideoState),
}

#[derive(Debug, Clone)]
struct Node {
    element: Element,
    border: Option<String>,
}

#[derive(Debug, Default)]
struct DocumentState {
    nodes: Vec<Node>,
    container: Vec<NodeId>,
    status: Option<NodeId>,
    video: VideoState,
    events: Vec<DomEvent>,
}

/// In-memory document recording every mutation.
#[derive(Debug, Default)]
pub struct Document {
    state: Mutex<DocumentState>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut DocumentState) -> R) -> R {
        // A poisoned lock only means a panicking test thread; the data is still usable.
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }

    /// Outer HTML of the stream container's children, in order.
    pub fn container_html(&self) -> Vec<String> {
        self.with_state(|s| {
            s.container
                .iter()
                .map(|id| s.nodes[id.0].element.to_html())
                .collect()
        })
    }

    /// Plain text of the stream container's children, in order.
    pub fn container_text(&self) -> Vec<String> {
        self.with_state(|s| {
            s.container
                .iter()
                .map(|id| s.nodes[id.0].element.text.clone())
                .collect()
        })
    }

    /// The status region's current element and border.
    pub fn status(&self) -> Option<(Element, Option<String>)> {
        self.with_state(|s| {
            s.status
                .map(|id| (s.nodes[id.0].element.clone(), s.nodes[id.0].border.clone()))
        })
    }

    pub fn video(&self) -> VideoState {
        self.with_state(|s| s.video.clone())
    }

    pub fn events(&self) -> Vec<DomEvent> {
        self.with_state(|s| s.events.clone())
    }

    /// Number of single-character reveals recorded.
    pub fn char_events(&self) -> usize {
        self.with_state(|s| {
            s.events
                .iter()
                .filter(|e| matches!(e, DomEvent::Char { .. }))
                .count()
        })
    }
}

impl StreamSink for Document {
    fn append(&self, element: Element) -> NodeId {
        self.with_state(|s| {
            let id = NodeId(s.nodes.len());
            s.events.push(DomEvent::Appended {
                node: id,
                html: element.to_html(),
            });
            s.nodes.push(Node {
                element,
                border: None,
            });
            s.container.push(id);
            id
        })
    }

    fn create_status(&self, element: Element) -> NodeId {
        self.with_state(|s| {
            let id = NodeId(s.nodes.len());
            s.events.push(DomEvent::StatusCreated {
                node: id,
                html: element.to_html(),
            });
            s.nodes.push(Node {
                element,
                border: None,
            });
            s.status = Some(id);
            id
        })
    }

    fn push_char(&self, node: NodeId, ch: char) {
        self.with_state(|s| {
            if let Some(n) = s.nodes.get_mut(node.0) {
                n.element.text.push(ch);
                n.element.markup = escape_html(&n.element.text);
                s.events.push(DomEvent::Char { node, ch });
            }
        })
    }

    fn clear(&self, node: NodeId) {
        self.with_state(|s| {
            if let Some(n) = s.nodes.get_mut(node.0) {
                n.element.text.clear();
                n.element.markup.clear();
                s.events.push(DomEvent::Cleared { node });
            }
        })
    }

    fn set_markup(&self, node: NodeId, markup: &str, text: &str) {
        self.with_state(|s| {
            if let Some(n) = s.nodes.get_mut(node.0) {
                n.element.markup = markup.to_string();
                n.element.text = text.to_string();
                s.events.push(DomEvent::Markup {
                    node,
                    markup: markup.to_string(),
                });
            }
        })
    }

    fn set_border(&self, node: NodeId, color: &str) {
        self.with_state(|s| {
            if let Some(n) = s.nodes.get_mut(node.0) {
                n.border = Some(color.to_string());
                s.events.push(DomEvent::Border {
                    node,
                    color: color.to_string(),
                });
            }
        })
    }

    fn set_video(&self, state: VideoState) {
        self.with_state(|s| {
            s.video = state.clone();
            s.events.push(DomEvent::Video(state));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_char_keeps_text_escaped() {
        let doc = Document::new();
        let id = doc.append(Element::new("p", None));
        for ch in "<b>".chars() {
            doc.push_char(id, ch);
        }
        assert_eq!(doc.container_html(), vec!["<p>&lt;b&gt;</p>".to_string()]);
        assert_eq!(doc.char_events(), 3);
    }

    #[test]
    fn test_append_preserves_order() {
        let doc = Document::new();
        doc.append(Element::new("h2", None).with_text("one"));
        doc.append(Element::new("h3", None).with_text("two"));
        assert_eq!(doc.container_text(), vec!["one", "two"]);
    }

    #[test]
    fn test_status_region_is_outside_container() {
        let doc = Document::new();
        let id = doc.create_status(Element::new("div", None).with_text("waiting"));
        doc.set_border(id, "#dc2626");

        assert!(doc.container_html().is_empty());
        let (element, border) = doc.status().unwrap();
        assert_eq!(element.text, "waiting");
        assert_eq!(border.as_deref(), Some("#dc2626"));
    }
}
