//! A [`StreamSink`] that types the loading narrative into a terminal.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Mutex;

use veritas_core::{Element, NodeId, StreamSink, VideoState};

struct TerminalState<W> {
    out: W,
    next: usize,
    status: Option<NodeId>,
    /// Plain text shown so far, per node.
    shown: HashMap<NodeId, String>,
}

/// Writes stream mutations as plain text.
///
/// Terminals cannot rewrite earlier lines, so every node starts on a fresh line and final
/// markup is only printed when it differs from what was typed. Status text is buffered and
/// printed whole, since it is typed concurrently with the main stream.
pub struct TerminalSink<W: Write + Send> {
    state: Mutex<TerminalState<W>>,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Mutex::new(TerminalState {
                out,
                next: 0,
                status: None,
                shown: HashMap::new(),
            }),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut TerminalState<W>) -> R) -> Option<R> {
        match self.state.lock() {
            Ok(mut state) => Some(f(&mut state)),
            Err(_) => {
                tracing::warn!("terminal sink lock poisoned");
                None
            }
        }
    }

    /// Returns the writer, ending any unfinished line.
    pub fn finish(self) -> Option<W> {
        let mut state = self.state.into_inner().ok()?;
        state.emit("\n");
        Some(state.out)
    }
}

impl<W: Write + Send> TerminalState<W> {
    /// Writes and flushes `text`. A failed write loses that text only; typing carries on.
    fn emit(&mut self, text: &str) {
        let written = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::warn!("terminal write failed: {}", e);
        }
    }

    fn open_node(&mut self, text: &str) -> NodeId {
        let node = NodeId(self.next);
        self.next += 1;
        self.emit(&format!("\n{}", text));
        self.shown.insert(node, text.to_string());
        node
    }
}

impl<W: Write + Send> StreamSink for TerminalSink<W> {
    fn append(&self, element: Element) -> NodeId {
        self.with_state(|s| s.open_node(&element.text))
            .unwrap_or(NodeId(usize::MAX))
    }

    fn create_status(&self, element: Element) -> NodeId {
        self.with_state(|s| {
            let node = s.open_node(&element.text);
            s.status = Some(node);
            node
        })
        .unwrap_or(NodeId(usize::MAX))
    }

    fn push_char(&self, node: NodeId, ch: char) {
        self.with_state(|s| {
            if let Some(shown) = s.shown.get_mut(&node) {
                shown.push(ch);
                if s.status != Some(node) {
                    s.emit(ch.encode_utf8(&mut [0; 4]));
                }
            }
        });
    }

    fn clear(&self, node: NodeId) {
        self.with_state(|s| {
            if let Some(shown) = s.shown.get_mut(&node) {
                shown.clear();
            }
        });
    }

    fn set_markup(&self, node: NodeId, _markup: &str, text: &str) {
        self.with_state(|s| {
            let typed_in_place = s.status != Some(node)
                && s.shown.get(&node).map(String::as_str) == Some(text);
            if !typed_in_place {
                s.emit(&format!("\n{}", text));
            }
            s.shown.insert(node, text.to_string());
        });
    }

    fn set_border(&self, node: NodeId, color: &str) {
        tracing::debug!("node {:?} border {}", node, color);
    }

    fn set_video(&self, state: VideoState) {
        self.with_state(|s| {
            let line = match state {
                VideoState::Playing(name) => format!("▶ {}", name),
                VideoState::Placeholder => "▶ Video placeholder".to_string(),
                VideoState::Unset => return,
            };
            s.emit(&line);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(sink: TerminalSink<Vec<u8>>) -> String {
        String::from_utf8(sink.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_typed_node_is_printed_once() {
        let sink = TerminalSink::new(Vec::new());
        let node = sink.append(Element::new("p", None));
        for ch in "hello".chars() {
            sink.push_char(node, ch);
        }
        sink.set_markup(node, "hello", "hello");
        assert_eq!(output(sink), "\nhello\n");
    }

    #[test]
    fn test_block_and_changed_markup() {
        let sink = TerminalSink::new(Vec::new());
        sink.append(Element::new("p", None).with_text("block"));
        let node = sink.append(Element::new("p", None));
        sink.push_char(node, 'a');
        sink.set_markup(node, "<strong>ab</strong>", "ab");
        assert_eq!(output(sink), "\nblock\na\nab\n");
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_writes_keep_node_bookkeeping() {
        let sink = TerminalSink::new(Closed);
        let first = sink.append(Element::new("p", None).with_text("a"));
        let second = sink.append(Element::new("p", None));
        assert_eq!(first, NodeId(0));
        assert_eq!(second, NodeId(1));

        sink.push_char(second, 'b');
        sink.set_markup(second, "b", "b");
        sink.set_video(VideoState::Placeholder);
        assert!(sink.finish().is_some());
    }

    #[test]
    fn test_status_text_is_buffered() {
        let sink = TerminalSink::new(Vec::new());
        sink.set_video(VideoState::Placeholder);
        let status = sink.create_status(Element::new("div", None).with_text("Analyzing"));
        sink.clear(status);
        for ch in "Done".chars() {
            sink.push_char(status, ch);
        }
        sink.set_markup(status, "<em>Done</em>", "Done");
        assert_eq!(output(sink), "▶ Video placeholder\nAnalyzing\nDone\n");
    }
}
