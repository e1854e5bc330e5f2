//! Typewriter rendering of an analysis entry.
//!
//! An [`AnalysisEntry`] is first planned into an ordered list of [`StreamStep`]s, then
//! played into a [`StreamSink`]:
//!
//! - a **typed** step is appended empty, revealed one character at a time as plain text,
//!   then replaced with its final markup, so no intermediate state ever contains a partial
//!   tag;
//! - a **block** step (separators, analysis boxes) is appended whole.
//!
//! Each step is followed by a fixed pause. With reduced motion every step is appended with
//! its final markup and nothing sleeps.
//!
//! The closing remark is either folded into the stream as a last typed step
//! ([`ClosingRemark::Inline`]) or revealed in a separate status region on its own timer
//! ([`StreamRenderer::reveal_status`]).

use crate::analysis::{AnalysisEntry, ResultItem};
use crate::config::{ClosingRemark, MotionPreference, StreamTiming};
use crate::constants::{
    SEPARATOR, STATUS_BOX_ACTIVE_BORDER, STATUS_BOX_IDLE_BORDER, STATUS_BOX_INITIAL_TEXT,
};
use crate::dom::{NodeId, StreamSink};
use crate::markup::{escape_html, Element};
use std::time::Duration;

/// One unit of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStep {
    Typed(Element),
    Block(Element),
}

impl StreamStep {
    pub fn element(&self) -> &Element {
        match self {
            StreamStep::Typed(el) | StreamStep::Block(el) => el,
        }
    }
}

/// Plans the steps for an entry, in document order.
pub fn plan(entry: &AnalysisEntry, closing: ClosingRemark) -> Vec<StreamStep> {
    let mut steps = vec![
        StreamStep::Typed(Element::new("h2", Some("section-heading")).with_text(&entry.heading)),
        StreamStep::Typed(
            Element::new("h3", Some("section-subheading")).with_text(&entry.subheading),
        ),
        StreamStep::Typed(Element::new("p", Some("summary-bold")).with_markup(
            format!("<strong>{}</strong>", escape_html(&entry.summary_bold)),
            entry.summary_bold.clone(),
        )),
        StreamStep::Block(separator()),
    ];

    for item in &entry.results {
        steps.extend(result_steps(item));
    }

    if closing == ClosingRemark::Inline {
        if let Some(remark) = entry.closing_remark() {
            steps.push(StreamStep::Typed(closing_remark_element(remark)));
        }
    }

    steps
}

fn result_steps(item: &ResultItem) -> Vec<StreamStep> {
    let url = escape_html(&item.url_label);
    vec![
        StreamStep::Typed(Element::new("p", Some("result-title")).with_markup(
            format!("<strong>{}.</strong> {}", item.n, escape_html(&item.title)),
            format!("{}. {}", item.n, item.title),
        )),
        StreamStep::Typed(Element::new("p", Some("result-link")).with_markup(
            format!(
                "🔗 <a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                url, url
            ),
            format!("🔗 {}", item.url_label),
        )),
        StreamStep::Typed(Element::new("p", Some("result-analyzing")).with_text(&item.analyzing)),
        StreamStep::Block(analysis_box(&item.analysis)),
        StreamStep::Block(separator()),
    ]
}

fn separator() -> Element {
    Element::new("pre", Some("separator")).with_text(SEPARATOR)
}

fn analysis_box(lines: &[String]) -> Element {
    let mut markup = String::from("<p>🤖 <strong>Analysis</strong></p><ul class=\"analysis-list\">");
    let mut text = String::from("🤖 Analysis");
    for line in lines {
        markup.push_str(&format!("<li>{}</li>", escape_html(line)));
        text.push_str(&format!("\n  • {}", line));
    }
    markup.push_str("</ul>");
    Element::new("div", Some("analysis-box")).with_markup(markup, text)
}

fn closing_remark_element(remark: &str) -> Element {
    Element::new("p", Some("footer-italics"))
        .with_markup(format!("<em>{}</em>", escape_html(remark)), remark.to_string())
}

/// The status region as created before streaming starts.
pub fn status_box() -> Element {
    Element::new("div", Some("status-box"))
        .with_id("footerItalicsBox")
        .with_text(STATUS_BOX_INITIAL_TEXT)
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Plays planned steps into a sink.
#[derive(Debug, Clone)]
pub struct StreamRenderer {
    timing: StreamTiming,
    motion: MotionPreference,
}

impl StreamRenderer {
    pub fn new(timing: StreamTiming, motion: MotionPreference) -> Self {
        Self { timing, motion }
    }

    pub fn timing(&self) -> &StreamTiming {
        &self.timing
    }

    /// Reveals one element and finalizes its markup.
    pub async fn type_element<S>(&self, sink: &S, element: &Element) -> NodeId
    where
        S: StreamSink + ?Sized,
    {
        if self.motion.is_reduced() {
            return sink.append(element.clone());
        }

        let node = sink.append(element.emptied());
        for ch in element.text.chars() {
            sink.push_char(node, ch);
            pause(self.timing.per_char()).await;
        }
        sink.set_markup(node, &element.markup, &element.text);
        node
    }

    /// Plays one step followed by the unit pause.
    pub async fn play<S>(&self, sink: &S, step: &StreamStep) -> NodeId
    where
        S: StreamSink + ?Sized,
    {
        let node = match step {
            StreamStep::Typed(element) => self.type_element(sink, element).await,
            StreamStep::Block(element) => sink.append(element.clone()),
        };
        if !self.motion.is_reduced() {
            pause(self.timing.unit_pause()).await;
        }
        node
    }

    /// Streams a whole entry into the sink's container.
    ///
    /// With the inline strategy the closing remark is the last step; with the status-box
    /// strategy it is left to [`StreamRenderer::reveal_status`].
    pub async fn render<S>(&self, entry: &AnalysisEntry, sink: &S)
    where
        S: StreamSink + ?Sized,
    {
        let steps = plan(entry, self.timing.closing_remark);
        tracing::debug!("streaming {} steps for {:?}", steps.len(), entry.subheading);
        for step in &steps {
            self.play(sink, step).await;
        }
    }

    /// Creates the status region in its idle state.
    pub fn create_status<S>(&self, sink: &S) -> NodeId
    where
        S: StreamSink + ?Sized,
    {
        let node = sink.create_status(status_box());
        sink.set_border(node, STATUS_BOX_IDLE_BORDER);
        node
    }

    /// Waits for the status delay, then reveals the closing remark in the status region.
    ///
    /// This runs on its own schedule and does not wait for the main stream.
    pub async fn reveal_status<S>(&self, sink: &S, node: NodeId, remark: &str)
    where
        S: StreamSink + ?Sized,
    {
        pause(self.timing.status_delay()).await;

        sink.set_border(node, STATUS_BOX_ACTIVE_BORDER);
        sink.clear(node);

        let markup = format!("<em>{}</em>", escape_html(remark));
        if !self.motion.is_reduced() {
            for ch in remark.chars() {
                sink.push_char(node, ch);
                pause(self.timing.per_char()).await;
            }
        }
        sink.set_markup(node, &markup, remark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisMap;
    use crate::constants::DEFAULT_ADDRESS;
    use crate::dom::{DomEvent, Document};
    use tokio::time::Instant;

    fn sample_entry() -> AnalysisEntry {
        AnalysisEntry {
            heading: "Head".into(),
            subheading: "Sub".into(),
            summary_bold: "Bold <3".into(),
            results: vec![ResultItem {
                n: 1,
                title: "Title".into(),
                url_label: "https://x.test/?a=1&b=2".into(),
                analyzing: "Looking".into(),
                analysis: vec!["first".into(), "second".into()],
            }],
            footer_italics: Some("Done.".into()),
        }
    }

    fn typed_chars(steps: &[StreamStep]) -> usize {
        steps
            .iter()
            .filter_map(|s| match s {
                StreamStep::Typed(el) => Some(el.text.chars().count()),
                StreamStep::Block(_) => None,
            })
            .sum()
    }

    #[test]
    fn test_plan_order() {
        let steps = plan(&sample_entry(), ClosingRemark::StatusBox);
        let classes: Vec<_> = steps.iter().map(|s| s.element().class.unwrap()).collect();
        assert_eq!(
            classes,
            vec![
                "section-heading",
                "section-subheading",
                "summary-bold",
                "separator",
                "result-title",
                "result-link",
                "result-analyzing",
                "analysis-box",
                "separator",
            ]
        );
    }

    #[test]
    fn test_plan_inline_appends_closing_remark() {
        let steps = plan(&sample_entry(), ClosingRemark::Inline);
        let last = steps.last().unwrap().element();
        assert_eq!(last.class, Some("footer-italics"));
        assert_eq!(last.markup, "<em>Done.</em>");
    }

    #[test]
    fn test_plan_escapes_entry_text() {
        let steps = plan(&sample_entry(), ClosingRemark::StatusBox);
        assert_eq!(steps[2].element().markup, "<strong>Bold &lt;3</strong>");
        assert!(steps[5].element().markup.contains("href=\"https://x.test/?a=1&amp;b=2\""));
        assert_eq!(steps[4].element().text, "1. Title");
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_reveals_characters_then_markup() {
        let doc = Document::new();
        let renderer = StreamRenderer::new(StreamTiming::default(), MotionPreference::Full);
        let entry = sample_entry();

        renderer.render(&entry, &doc).await;

        let steps = plan(&entry, ClosingRemark::StatusBox);
        assert_eq!(doc.char_events(), typed_chars(&steps));

        let expected: Vec<_> = steps.iter().map(|s| s.element().to_html()).collect();
        assert_eq!(doc.container_html(), expected);

        // Every typed node starts empty and only receives markup after its characters.
        let events = doc.events();
        let first_markup = events
            .iter()
            .position(|e| matches!(e, DomEvent::Markup { node, .. } if node.0 == 0))
            .unwrap();
        assert!(matches!(&events[0], DomEvent::Appended { html, .. } if html == "<h2 class=\"section-heading\"></h2>"));
        assert!(events[1..first_markup]
            .iter()
            .all(|e| matches!(e, DomEvent::Char { node, .. } if node.0 == 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_timing_is_sequential() {
        let doc = Document::new();
        let timing = StreamTiming::default();
        let renderer = StreamRenderer::new(timing.clone(), MotionPreference::Full);
        let entry = sample_entry();
        let steps = plan(&entry, ClosingRemark::StatusBox);

        let start = Instant::now();
        renderer.render(&entry, &doc).await;

        let expected = timing.per_char() * typed_chars(&steps) as u32
            + timing.unit_pause() * steps.len() as u32;
        assert_eq!(start.elapsed(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reduced_motion_has_no_incremental_states() {
        let doc = Document::new();
        let renderer = StreamRenderer::new(StreamTiming::default(), MotionPreference::Reduced);
        let map = AnalysisMap::embedded().unwrap();
        let entry = &map.get(DEFAULT_ADDRESS).unwrap().unwrap();

        let start = Instant::now();
        renderer.render(entry, &doc).await;

        assert_eq!(doc.char_events(), 0);
        assert!(doc
            .events()
            .iter()
            .all(|e| matches!(e, DomEvent::Appended { .. })));
        let expected: Vec<_> = plan(entry, ClosingRemark::StatusBox)
            .iter()
            .map(|s| s.element().to_html())
            .collect();
        assert_eq!(doc.container_html(), expected);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_status_after_delay() {
        let doc = Document::new();
        let timing = StreamTiming::default();
        let renderer = StreamRenderer::new(timing.clone(), MotionPreference::Full);

        let node = renderer.create_status(&doc);
        let (initial, border) = doc.status().unwrap();
        assert_eq!(initial.text, STATUS_BOX_INITIAL_TEXT);
        assert_eq!(border.as_deref(), Some(STATUS_BOX_IDLE_BORDER));

        let start = Instant::now();
        renderer.reveal_status(&doc, node, "All clear.").await;

        assert_eq!(
            start.elapsed(),
            timing.status_delay() + timing.per_char() * "All clear.".len() as u32
        );
        let (element, border) = doc.status().unwrap();
        assert_eq!(element.markup, "<em>All clear.</em>");
        assert_eq!(border.as_deref(), Some(STATUS_BOX_ACTIVE_BORDER));
        assert!(doc.container_html().is_empty());
    }
}
