use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veritas_core::config::resolve_state_dir;
use veritas_core::constants::{ANALYSIS_JSON_KEY, LOCAL_STORE_FILENAME, SESSION_STORE_FILENAME};
use veritas_core::form::{
    clear_draft, load_draft, DraftFileMeta, FieldId, FieldValue, MockSubmissionClient,
};
use veritas_core::{
    CoreConfig, DirAssetProbe, FileStore, FormEvent, FormSession, HttpSubmissionClient,
    HttpVerdictSource, KeyValueStore, LoadingOutcome, LoadingPage, MockVerdictSource,
    MotionPreference, ResultsPage, ResultsStatus, SharedStore, SubmissionClient, SubmitResult,
    VerdictSource,
};
use veritas_files::{format_file_size, IncomingFile};

mod report;
mod terminal;

use report::render_view;
use terminal::TerminalSink;

#[derive(Parser)]
#[command(name = "veritas")]
#[command(about = "Check a rental listing for signs of a scam")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in the report form and submit it
    Submit {
        /// House address
        #[arg(long)]
        address: Option<String>,
        /// Landlord name
        #[arg(long)]
        landlord: Option<String>,
        /// Listing URL
        #[arg(long)]
        listing_url: Option<String>,
        /// Other details (up to 10,000 characters)
        #[arg(long)]
        details: Option<String>,
        /// Agree to the Privacy Policy
        #[arg(long)]
        agree: bool,
        /// Attach a file (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// Continue through the loading and results pages
        #[arg(long)]
        follow: bool,
    },
    /// Stream the analysis for the submitted address
    Loading {
        /// JSON analysis file to hand to the page
        #[arg(long)]
        analysis: Option<PathBuf>,
        /// Continue to the results page
        #[arg(long)]
        follow: bool,
    },
    /// Show the verdict for an address
    Results {
        /// Address to look up (defaults to the submitted address)
        #[arg(long)]
        address: Option<String>,
    },
    /// Inspect or discard the saved draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
    /// Forget the draft and everything handed between pages
    Reset,
}

#[derive(Subcommand)]
enum DraftAction {
    /// Print the saved draft
    Show,
    /// Delete the saved draft
    Clear,
}

/// Stores and capabilities shared by every command.
struct App {
    cfg: CoreConfig,
    local: SharedStore,
    session: SharedStore,
    api_url: Option<String>,
    asset_dir: Option<PathBuf>,
}

impl App {
    fn from_env() -> anyhow::Result<Self> {
        let config_path = std::env::var("VERITAS_CONFIG").ok().map(PathBuf::from);
        let mut cfg = CoreConfig::load(config_path.as_deref())?;
        if let Ok(flag) = std::env::var("VERITAS_REDUCED_MOTION") {
            cfg.motion = MotionPreference::from_flag(Some(&flag));
        }

        let state_dir =
            resolve_state_dir(std::env::var("VERITAS_STATE_DIR").ok().map(PathBuf::from));
        let local: SharedStore =
            Arc::new(FileStore::open(state_dir.join(LOCAL_STORE_FILENAME))?);
        let session: SharedStore =
            Arc::new(FileStore::open(state_dir.join(SESSION_STORE_FILENAME))?);

        Ok(Self {
            cfg,
            local,
            session,
            api_url: std::env::var("VERITAS_API_URL").ok().filter(|u| !u.is_empty()),
            asset_dir: std::env::var("VERITAS_ASSET_DIR").ok().map(PathBuf::from),
        })
    }

    fn submission_client(&self) -> anyhow::Result<Arc<dyn SubmissionClient>> {
        Ok(match &self.api_url {
            Some(url) => Arc::new(HttpSubmissionClient::new(url)?),
            None => Arc::new(MockSubmissionClient::new(self.cfg.form.submit_delay())),
        })
    }

    fn verdict_source(&self) -> anyhow::Result<Arc<dyn VerdictSource>> {
        Ok(match &self.api_url {
            Some(url) => Arc::new(HttpVerdictSource::new(url)?),
            None => Arc::new(MockVerdictSource::new(self.cfg.results_delay())),
        })
    }

    async fn submit(&self, fields: Vec<FormEvent>, files: Vec<PathBuf>) -> anyhow::Result<()> {
        let mut form = FormSession::open(
            &self.cfg,
            self.local.clone(),
            self.session.clone(),
            self.submission_client()?,
        );
        for event in fields {
            form.dispatch(event);
        }

        let mut batch = Vec::with_capacity(files.len());
        for path in &files {
            let file = IncomingFile::from_path(path)
                .with_context(|| format!("cannot attach {}", path.display()))?;
            batch.push(file);
        }
        if !batch.is_empty() {
            form.dispatch(FormEvent::FilesSelected(batch));
        }
        if let Some(message) = form.file_error().map(str::to_string) {
            form.on_unload();
            bail!("{}", message);
        }
        form.generate_previews().await;
        for file in form.files() {
            println!("Attached {} ({})", file.name, format_file_size(file.size));
        }
        let attached: Vec<&str> = form.files().iter().map(|f| f.name.as_str()).collect();
        for meta in unattached(form.restored_files(), &attached) {
            println!(
                "Draft listed {} ({}); attach it again with --file to include it",
                meta.name,
                format_file_size(meta.size)
            );
        }

        let result = form
            .submit_with_progress(|file| {
                if file.progress == 100 {
                    println!("Uploaded {}", file.name);
                }
            })
            .await;

        match result {
            SubmitResult::Submitted { receipt, next } => {
                clear_draft(self.local.as_ref())?;
                println!(
                    "Submission {} {} (estimated wait {}s)",
                    receipt.submission_id, receipt.status, receipt.estimated_wait_sec
                );
                println!("Next: {}", next);
                Ok(())
            }
            SubmitResult::Blocked(problems) => {
                form.on_unload();
                for (field, message) in &problems {
                    eprintln!("{}: {}", field.label(), message);
                }
                bail!("please correct the fields above")
            }
            SubmitResult::Failed(banner) => {
                form.on_unload();
                bail!("{} (error id {})", banner.message, banner.error_id)
            }
        }
    }

    async fn loading(&self, analysis: Option<PathBuf>) -> anyhow::Result<bool> {
        if let Some(path) = analysis {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            self.session.set(ANALYSIS_JSON_KEY, &json)?;
        }

        let assets = Arc::new(DirAssetProbe::new(self.asset_dir.clone()));
        let mut page = LoadingPage::new(&self.cfg, self.session.clone(), assets);
        let sink = TerminalSink::stdout();
        let outcome = page.run(&sink).await;
        sink.finish();

        Ok(match outcome {
            LoadingOutcome::Redirect(next) => {
                println!("Next: {}", next);
                true
            }
            LoadingOutcome::Fallback(reason) => {
                tracing::info!("loading page fell back: {}", reason);
                false
            }
        })
    }

    async fn results(&self, address: Option<&str>) -> anyhow::Result<()> {
        let mut page = ResultsPage::new(self.verdict_source()?, self.session.clone());
        match page.load(address).await {
            ResultsStatus::Ready(view) => {
                print!("{}", render_view(view));
                Ok(())
            }
            _ => bail!("Unable to load results. Please retry."),
        }
    }

    fn show_draft(&self) -> anyhow::Result<()> {
        match load_draft(self.local.as_ref(), Utc::now(), self.cfg.form.draft_max_age())? {
            Some(draft) => println!("{}", serde_json::to_string_pretty(&draft)?),
            None => println!("No saved draft."),
        }
        Ok(())
    }
}

/// Draft attachments whose content was not supplied again.
fn unattached<'a>(restored: &'a [DraftFileMeta], attached: &[&str]) -> Vec<&'a DraftFileMeta> {
    restored
        .iter()
        .filter(|meta| !attached.contains(&meta.name.as_str()))
        .collect()
}

/// Form events for the values given on the command line.
fn field_events(
    address: Option<String>,
    landlord: Option<String>,
    listing_url: Option<String>,
    details: Option<String>,
    agree: bool,
) -> Vec<FormEvent> {
    let mut events: Vec<FormEvent> = [
        (FieldId::HouseAddress, address),
        (FieldId::LandlordName, landlord),
        (FieldId::ListingUrl, listing_url),
        (FieldId::OtherDetails, details),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| FormEvent::Input(field, FieldValue::Text(v))))
    .collect();
    if agree {
        events.push(FormEvent::Change(
            FieldId::PrivacyConsent,
            FieldValue::Checked(true),
        ));
    }
    events
}

/// Main entry point for the Veritas command line
///
/// Walks the form, loading and results pages in a terminal. Pages hand data to each other
/// through file-backed stores in the state directory, so each command can run on its own.
///
/// # Environment Variables
/// - `VERITAS_STATE_DIR`: Directory of the local and session stores (default: ".veritas")
/// - `VERITAS_CONFIG`: Optional YAML file overriding timings and attachment limits
/// - `VERITAS_API_URL`: Base URL of a Veritas REST API; without it submissions and verdicts are simulated
/// - `VERITAS_ASSET_DIR`: Directory holding the loading video
/// - `VERITAS_REDUCED_MOTION`: Set to `1` to skip the typewriter effect
///
/// # Errors
/// Returns an error if:
/// - the configuration or a store cannot be read,
/// - an attachment cannot be read or is refused,
/// - the submission is blocked or refused, or
/// - the results cannot be loaded.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("veritas_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let app = App::from_env()?;

    match cli.command {
        Commands::Submit {
            address,
            landlord,
            listing_url,
            details,
            agree,
            files,
            follow,
        } => {
            let events = field_events(address, landlord, listing_url, details, agree);
            app.submit(events, files).await?;
            if follow && app.loading(None).await? {
                app.results(None).await?;
            }
        }
        Commands::Loading { analysis, follow } => {
            if app.loading(analysis).await? && follow {
                app.results(None).await?;
            }
        }
        Commands::Results { address } => app.results(address.as_deref()).await?,
        Commands::Draft { action } => match action {
            DraftAction::Show => app.show_draft()?,
            DraftAction::Clear => {
                clear_draft(app.local.as_ref())?;
                println!("Draft cleared.");
            }
        },
        Commands::Reset => {
            clear_draft(app.local.as_ref())?;
            app.session.clear()?;
            println!("Draft and session cleared.");
        }
    }

    Ok(())
}
