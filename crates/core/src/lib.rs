//! # Veritas Core
//!
//! Page controllers of the Veritas rental-scam check.
//!
//! The flow is three pages that share no runtime state:
//! - **Form** ([`form`]): intake form, attachment handling, draft autosave, submission
//! - **Loading** ([`loading`], [`stream`]): streams a canned analysis narrative, then moves on
//! - **Results** ([`results`]): resolves the address, obtains a verdict and renders it
//!
//! Pages hand data to each other only through navigation ([`Page`]) and two key/value
//! stores ([`storage`]). Controllers draw into a [`StreamSink`]; the in-memory
//! [`Document`] records every mutation for tests, and binaries provide their own sinks.
//!
//! **No transport concerns**: the HTTP service and the terminal front end live in
//! `api-rest` and `cli`.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod dom;
pub mod error;
pub mod form;
pub mod loading;
pub mod markup;
pub mod navigation;
pub mod remote;
pub mod results;
pub mod storage;
pub mod stream;

pub use analysis::{AnalysisEntry, AnalysisMap, ResultItem};
pub use config::{ClosingRemark, CoreConfig, FormTiming, MotionPreference, StreamTiming};
pub use dom::{Document, DomEvent, NodeId, StreamSink, VideoState};
pub use error::{VeritasError, VeritasResult};
pub use form::{FormEvent, FormSession, SubmissionClient, SubmitResult};
pub use loading::{AssetProbe, DirAssetProbe, LoadingOutcome, LoadingPage, LoadingState};
pub use markup::Element;
pub use navigation::Page;
pub use remote::{HttpSubmissionClient, HttpVerdictSource};
pub use results::{
    compute_likelihood, mock_verdict, Likelihood, MockVerdictSource, ResultVerdict, ResultsPage,
    ResultsStatus, ResultsView, VerdictSource,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SharedStore};
pub use stream::StreamRenderer;
