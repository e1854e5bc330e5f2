//! Constants used throughout the Veritas core crate.
//!
//! Storage keys, page names and canned strings live here so the three page controllers
//! and the REST surface agree on them.

/// Session-scoped key holding the address of the report in flight.
pub const ADDRESS_KEY: &str = "veritas_address";

/// Session-scoped key holding the serialized analysis mapping.
pub const ANALYSIS_JSON_KEY: &str = "veritas_text_json";

/// Durable key holding the serialized draft.
pub const DRAFT_KEY: &str = "veritas-draft";

/// Address used when none was handed over, and as the second lookup attempt.
pub const DEFAULT_ADDRESS: &str = "88 King Street, Unit 116, San Francisco 94107";

/// Video shown on the loading page.
pub const LOADING_VIDEO: &str = "BrowserUseCountySearchCropped.mp4";

/// Heading of every loading-page fallback.
pub const FALLBACK_HEADING: &str = "🔎 Searching Public Web Records";

/// Initial text of the loading-page status region.
pub const STATUS_BOX_INITIAL_TEXT: &str = "🔎Analyzing Data Records..";

/// Status region border before and after the closing remark arrives.
pub const STATUS_BOX_IDLE_BORDER: &str = "#4b5563";
pub const STATUS_BOX_ACTIVE_BORDER: &str = "#dc2626";

/// Separator block inserted between stream sections.
pub const SEPARATOR: &str = "------------------------------------------------------------";

/// Version reported in submission metadata.
pub const CLIENT_VERSION: &str = "web-1.0.0";

/// Default location of the file-backed stores used by the binaries.
pub const DEFAULT_STATE_DIR: &str = ".veritas";

/// File names of the stores inside the state directory.
pub const SESSION_STORE_FILENAME: &str = "session.json";
pub const LOCAL_STORE_FILENAME: &str = "local.json";
