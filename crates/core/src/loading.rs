//! Loading-page controller.
//!
//! The page locates the analysis payload handed over in the session store, picks the
//! entry for the current address and streams it, then navigates to the results page. Every
//! failure along the way ends in a fallback view that offers a manual link onward; the
//! page never fails outright.
//!
//! ```text
//! Init -> LocateData -> Parse -> Lookup -> Stream -> Redirect
//!            \            \        \
//!             +------------+--------+----> Fallback
//! ```

use crate::analysis::{AnalysisEntry, AnalysisMap, DEFAULT_ANALYSIS_JSON};
use crate::config::{ClosingRemark, CoreConfig};
use crate::constants::{ADDRESS_KEY, ANALYSIS_JSON_KEY, DEFAULT_ADDRESS, FALLBACK_HEADING, LOADING_VIDEO};
use crate::dom::{NodeId, StreamSink, VideoState};
use crate::markup::Element;
use crate::navigation::Page;
use crate::storage::SharedStore;
use crate::stream::{StreamRenderer, StreamStep};
use crate::{VeritasError, VeritasResult};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Tells the page whether a static asset can be served.
pub trait AssetProbe: Send + Sync {
    fn exists(&self, name: &str) -> bool;
}

/// Looks assets up in a directory. With no directory every asset is missing.
#[derive(Debug, Clone, Default)]
pub struct DirAssetProbe {
    dir: Option<PathBuf>,
}

impl DirAssetProbe {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl AssetProbe for DirAssetProbe {
    fn exists(&self, name: &str) -> bool {
        self.dir
            .as_ref()
            .map(|dir| dir.join(name).is_file())
            .unwrap_or(false)
    }
}

/// Where the page is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadingState {
    Init,
    LocateData,
    Parse,
    Lookup,
    Stream,
    Redirect,
    Fallback,
}

/// Why the page fell back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    /// No payload was handed over and none is embedded.
    NoData,
    InvalidJson,
    /// Neither the address nor the default address has an entry.
    NoMatch(Option<String>),
    Unexpected,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoData => f.write_str("No data file provided."),
            FallbackReason::InvalidJson => f.write_str("Text file is not valid JSON."),
            FallbackReason::NoMatch(address) => write!(
                f,
                "No matching entry for \"{}\".",
                address.as_deref().unwrap_or("Unknown Address")
            ),
            FallbackReason::Unexpected => f.write_str("An error occurred while loading data."),
        }
    }
}

/// How a page run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadingOutcome {
    /// Streaming finished and the page moved on.
    Redirect(Page),
    /// The fallback view is showing; the user continues by hand.
    Fallback(FallbackReason),
}

/// One visit to the loading page.
pub struct LoadingPage {
    session: SharedStore,
    assets: Arc<dyn AssetProbe>,
    renderer: StreamRenderer,
    closing: ClosingRemark,
    default_payload: Option<String>,
    state: LoadingState,
}

impl LoadingPage {
    pub fn new(config: &CoreConfig, session: SharedStore, assets: Arc<dyn AssetProbe>) -> Self {
        Self {
            session,
            assets,
            renderer: StreamRenderer::new(config.stream.clone(), config.motion),
            closing: config.stream.closing_remark,
            default_payload: Some(DEFAULT_ANALYSIS_JSON.to_string()),
            state: LoadingState::Init,
        }
    }

    /// Replaces the payload used when the session holds none.
    pub fn with_default_payload(mut self, payload: Option<String>) -> Self {
        self.default_payload = payload;
        self
    }

    pub fn state(&self) -> LoadingState {
        self.state
    }

    fn transition(&mut self, next: LoadingState) {
        tracing::debug!("loading page {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Runs the page to completion against `sink`.
    pub async fn run<S>(&mut self, sink: &S) -> LoadingOutcome
    where
        S: StreamSink + ?Sized,
    {
        self.attach_video(sink);
        let status = (self.closing == ClosingRemark::StatusBox)
            .then(|| self.renderer.create_status(sink));

        let entry = match self.prepare() {
            Ok(entry) => entry,
            Err(reason) => return self.fallback(sink, reason).await,
        };

        self.transition(LoadingState::Stream);
        self.stream(sink, &entry, status).await;

        self.transition(LoadingState::Redirect);
        tracing::info!("analysis streamed, navigating to {}", Page::Results);
        LoadingOutcome::Redirect(Page::Results)
    }

    fn attach_video<S>(&self, sink: &S)
    where
        S: StreamSink + ?Sized,
    {
        if self.assets.exists(LOADING_VIDEO) {
            sink.set_video(VideoState::Playing(LOADING_VIDEO.to_string()));
        } else {
            tracing::warn!("{} not found, showing placeholder", LOADING_VIDEO);
            sink.set_video(VideoState::Placeholder);
        }
    }

    /// Steps LocateData through Lookup.
    fn prepare(&mut self) -> Result<AnalysisEntry, FallbackReason> {
        self.transition(LoadingState::LocateData);
        let (address, payload) = self.locate().map_err(|e| {
            tracing::warn!("failed to read session store: {}", e);
            FallbackReason::Unexpected
        })?;
        let payload = payload.ok_or(FallbackReason::NoData)?;

        self.transition(LoadingState::Parse);
        let map = AnalysisMap::parse(&payload).map_err(|e| {
            tracing::warn!("{}", e);
            FallbackReason::InvalidJson
        })?;

        self.transition(LoadingState::Lookup);
        let key = address.clone().unwrap_or_default();
        match map.lookup(&key) {
            Ok(entry) => Ok(entry),
            Err(VeritasError::MissingAnalysisEntry(_)) => Err(FallbackReason::NoMatch(address)),
            Err(e) => {
                tracing::warn!("{}", e);
                Err(FallbackReason::Unexpected)
            }
        }
    }

    /// Reads the address and payload, applying the embedded defaults.
    fn locate(&self) -> VeritasResult<(Option<String>, Option<String>)> {
        let address = self
            .session
            .get(ADDRESS_KEY)?
            .filter(|a| !a.is_empty());
        let payload = self
            .session
            .get(ANALYSIS_JSON_KEY)?
            .filter(|p| !p.is_empty());

        match payload {
            Some(payload) => Ok((address, Some(payload))),
            None => {
                tracing::info!("no analysis payload in session, using embedded data");
                let address = address.or_else(|| {
                    self.default_payload
                        .as_ref()
                        .map(|_| DEFAULT_ADDRESS.to_string())
                });
                Ok((address, self.default_payload.clone()))
            }
        }
    }

    /// Streams the entry while the status region runs on its own timer, then waits out the
    /// redirect delay. Unfinished status work is dropped on return.
    async fn stream<S>(&self, sink: &S, entry: &AnalysisEntry, status: Option<NodeId>)
    where
        S: StreamSink + ?Sized,
    {
        let redirect_delay = self.renderer.timing().redirect_delay();
        let main = async {
            self.renderer.render(entry, sink).await;
            tokio::time::sleep(redirect_delay).await;
        };

        let (node, remark) = match (status, entry.closing_remark()) {
            (Some(node), Some(remark)) => (node, remark),
            _ => return main.await,
        };

        let reveal = self.renderer.reveal_status(sink, node, remark);
        tokio::pin!(main);
        tokio::pin!(reveal);
        let mut revealed = false;
        loop {
            tokio::select! {
                _ = &mut main => break,
                _ = &mut reveal, if !revealed => revealed = true,
            }
        }
        if !revealed {
            tracing::debug!("status region still pending at redirect, dropping it");
        }
    }

    async fn fallback<S>(&mut self, sink: &S, reason: FallbackReason) -> LoadingOutcome
    where
        S: StreamSink + ?Sized,
    {
        self.transition(LoadingState::Fallback);
        tracing::warn!("loading page fallback: {}", reason);

        let message = reason.to_string();
        let steps = [
            StreamStep::Typed(Element::new("h2", Some("section-heading")).with_text(FALLBACK_HEADING)),
            StreamStep::Typed(Element::new("h3", Some("section-subheading")).with_text(&message)),
            StreamStep::Block(Element::new("p", Some("fallback-link")).with_markup(
                format!("<a href=\"{}\">Continue to results →</a>", Page::Results),
                "Continue to results →".to_string(),
            )),
        ];
        for step in &steps {
            self.renderer.play(sink, step).await;
        }

        LoadingOutcome::Fallback(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MotionPreference, StreamTiming};
    use crate::constants::{STATUS_BOX_ACTIVE_BORDER, STATUS_BOX_INITIAL_TEXT};
    use crate::dom::Document;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::stream::plan;

    struct Assets(bool);

    impl AssetProbe for Assets {
        fn exists(&self, _name: &str) -> bool {
            self.0
        }
    }

    fn page_with(config: &CoreConfig, session: SharedStore) -> LoadingPage {
        LoadingPage::new(config, session, Arc::new(Assets(false)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_session_streams_default_entry() {
        let config = CoreConfig::default();
        let doc = Document::new();
        let mut page = page_with(&config, MemoryStore::shared());

        let outcome = page.run(&doc).await;

        assert_eq!(outcome, LoadingOutcome::Redirect(Page::Results));
        assert_eq!(page.state(), LoadingState::Redirect);
        assert_eq!(doc.video(), VideoState::Placeholder);

        let map = AnalysisMap::embedded().unwrap();
        let entry = &map.get(DEFAULT_ADDRESS).unwrap().unwrap();
        let expected: Vec<_> = plan(entry, ClosingRemark::StatusBox)
            .iter()
            .map(|s| s.element().to_html())
            .collect();
        assert_eq!(doc.container_html(), expected);

        // The stream plus the redirect delay outlasts the status delay.
        let (status, border) = doc.status().unwrap();
        assert_eq!(status.markup, format!("<em>{}</em>", entry.closing_remark().unwrap()));
        assert_eq!(border.as_deref(), Some(STATUS_BOX_ACTIVE_BORDER));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_address_selects_entry() {
        let config = CoreConfig::default();
        let session = MemoryStore::shared();
        session
            .set(ADDRESS_KEY, "1550 Mathilda Ave, Sunnyvale, CA 94089")
            .unwrap();
        let doc = Document::new();
        let mut page = LoadingPage::new(&config, session, Arc::new(Assets(true)));

        page.run(&doc).await;

        assert_eq!(doc.video(), VideoState::Playing(LOADING_VIDEO.to_string()));
        assert_eq!(doc.container_text()[1], "1550 Mathilda Ave, Sunnyvale, CA 94089");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_json_falls_back() {
        let config = CoreConfig::default();
        let session = MemoryStore::shared();
        session.set(ANALYSIS_JSON_KEY, "{oops").unwrap();
        let doc = Document::new();
        let mut page = page_with(&config, session);

        let outcome = page.run(&doc).await;

        assert_eq!(outcome, LoadingOutcome::Fallback(FallbackReason::InvalidJson));
        assert_eq!(page.state(), LoadingState::Fallback);
        assert_eq!(
            doc.container_text(),
            vec![
                FALLBACK_HEADING,
                "Text file is not valid JSON.",
                "Continue to results →"
            ]
        );
        assert!(doc.container_html()[2].contains("href=\"results.html\""));
        // No closing remark was ever revealed.
        assert_eq!(doc.status().unwrap().0.text, STATUS_BOX_INITIAL_TEXT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_entry_echoes_address() {
        let config = CoreConfig::default();
        let session = MemoryStore::shared();
        session.set(ANALYSIS_JSON_KEY, "{}").unwrap();
        session.set(ADDRESS_KEY, "742 Evergreen Terrace").unwrap();
        let doc = Document::new();

        let outcome = page_with(&config, session).run(&doc).await;

        assert_eq!(
            doc.container_text()[1],
            "No matching entry for \"742 Evergreen Terrace\"."
        );
        assert!(matches!(outcome, LoadingOutcome::Fallback(FallbackReason::NoMatch(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_entry_without_address() {
        let config = CoreConfig::default();
        let session = MemoryStore::shared();
        session.set(ANALYSIS_JSON_KEY, "{}").unwrap();
        let doc = Document::new();

        page_with(&config, session).run(&doc).await;

        assert_eq!(
            doc.container_text()[1],
            "No matching entry for \"Unknown Address\"."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_of_wrong_shape_is_no_match() {
        let config = CoreConfig::default().instant();
        let session = MemoryStore::shared();
        session.set(ANALYSIS_JSON_KEY, "[]").unwrap();
        session.set(ADDRESS_KEY, "1 Good St").unwrap();
        let doc = Document::new();

        let outcome = page_with(&config, session).run(&doc).await;

        assert_eq!(
            outcome,
            LoadingOutcome::Fallback(FallbackReason::NoMatch(Some("1 Good St".into())))
        );
        assert_eq!(doc.container_text()[1], "No matching entry for \"1 Good St\".");
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_neighbour_entry_still_streams_match() {
        let config = CoreConfig::default().instant();
        let session = MemoryStore::shared();
        session
            .set(
                ANALYSIS_JSON_KEY,
                r#"{"1 Good St": {"heading": "Good heading", "subheading": "1 Good St",
                    "summary_bold": "Fine", "results": []},
                    "2 Other St": {"heading": "only"}}"#,
            )
            .unwrap();
        session.set(ADDRESS_KEY, "1 Good St").unwrap();
        let doc = Document::new();

        let outcome = page_with(&config, session).run(&doc).await;

        assert_eq!(outcome, LoadingOutcome::Redirect(Page::Results));
        assert_eq!(doc.container_text()[0], "Good heading");
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_matching_entry_is_unexpected() {
        let config = CoreConfig::default().instant();
        let session = MemoryStore::shared();
        session
            .set(ANALYSIS_JSON_KEY, r#"{"2 Other St": {"heading": "only"}}"#)
            .unwrap();
        session.set(ADDRESS_KEY, "2 Other St").unwrap();
        let doc = Document::new();

        let outcome = page_with(&config, session).run(&doc).await;

        assert_eq!(outcome, LoadingOutcome::Fallback(FallbackReason::Unexpected));
        assert_eq!(doc.container_text()[1], "An error occurred while loading data.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_payload_anywhere() {
        let config = CoreConfig::default();
        let doc = Document::new();
        let mut page = page_with(&config, MemoryStore::shared()).with_default_payload(None);

        let outcome = page.run(&doc).await;

        assert_eq!(outcome, LoadingOutcome::Fallback(FallbackReason::NoData));
        assert_eq!(doc.container_text()[1], "No data file provided.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_redirect_drops_pending_status_work() {
        let mut config = CoreConfig::default();
        config.stream = StreamTiming {
            status_delay_ms: 600_000,
            redirect_delay_ms: 0,
            ..StreamTiming::default()
        };
        let doc = Document::new();

        let outcome = page_with(&config, MemoryStore::shared()).run(&doc).await;

        assert_eq!(outcome, LoadingOutcome::Redirect(Page::Results));
        assert_eq!(doc.status().unwrap().0.text, STATUS_BOX_INITIAL_TEXT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inline_remark_has_no_status_region() {
        let mut config = CoreConfig::default();
        config.stream.closing_remark = ClosingRemark::Inline;
        config.motion = MotionPreference::Reduced;
        let doc = Document::new();

        page_with(&config, MemoryStore::shared()).run(&doc).await;

        assert!(doc.status().is_none());
        assert_eq!(doc.char_events(), 0);
        let last = doc.container_html().pop().unwrap();
        assert!(last.starts_with("<p class=\"footer-italics\"><em>"));
    }
}
