//! Results-page controller.
//!
//! Resolves which address the visitor asked about, obtains a [`ResultVerdict`] from a
//! [`VerdictSource`] and turns it into a [`ResultsView`]: a title, a likelihood figure and
//! three independently rendered list widgets.

use crate::constants::ADDRESS_KEY;
use crate::markup::escape_html;
use crate::navigation::Page;
use crate::storage::{KeyValueStore, SharedStore};
use crate::VeritasResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

/// Whether a reason speaks for or against the listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    Good,
    Bad,
}

impl Serialize for Polarity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Polarity::Good => "good",
            Polarity::Bad => "bad",
        })
    }
}

/// Anything other than `"good"` reads as a warning.
impl<'de> Deserialize<'de> for Polarity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some("good") => Polarity::Good,
            _ => Polarity::Bad,
        })
    }
}

/// A risk assessment for one address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResultVerdict {
    #[serde(default)]
    pub address: String,
    /// `false` when the analysis could not reach a conclusion.
    #[serde(rename = "clear_outcome", default = "conclusive_by_default")]
    pub conclusive: bool,
    /// Raw likelihood in `[0, 1]`; anything non-numeric reads as NaN.
    #[serde(
        rename = "scam_likelihood",
        default = "not_a_number",
        deserialize_with = "lenient_number"
    )]
    pub likelihood: f64,
    #[serde(default, deserialize_with = "lenient_list")]
    #[schema(value_type = Vec<Vec<String>>)]
    pub reasons: Vec<(Polarity, String)>,
    /// `(label, value)` pairs.
    #[serde(rename = "analyzed_data", default, deserialize_with = "lenient_list")]
    #[schema(value_type = Vec<Vec<String>>)]
    pub insights: Vec<(String, String)>,
    #[serde(rename = "additional_questions", default, deserialize_with = "lenient_list")]
    pub questions: Vec<String>,
}

fn conclusive_by_default() -> bool {
    true
}

fn not_a_number() -> f64 {
    f64::NAN
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

/// Non-array values read as an empty list.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => {
            serde_json::from_value(Value::Array(items)).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

/// The figure shown in the likelihood box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Likelihood {
    Percent(u8),
    Inconclusive,
}

impl Likelihood {
    pub fn display(self) -> String {
        match self {
            Likelihood::Percent(p) => format!("{}%", p),
            Likelihood::Inconclusive => "Inconclusive".to_string(),
        }
    }

    /// Colour band of the likelihood box.
    pub fn class(self) -> &'static str {
        match self {
            Likelihood::Percent(p) if p > 50 => "likelihood--high",
            Likelihood::Percent(_) => "likelihood--low",
            Likelihood::Inconclusive => "likelihood--inconclusive",
        }
    }
}

/// Normalizes a raw likelihood: clamped to `[0, 1]` and scaled to a rounded percentage.
pub fn compute_likelihood(conclusive: bool, n: f64) -> Likelihood {
    if !conclusive || !n.is_finite() {
        return Likelihood::Inconclusive;
    }
    Likelihood::Percent((n.clamp(0.0, 1.0) * 100.0).round() as u8)
}

/// Address the page reports on: the query parameter, then the session hand-off.
pub fn resolve_address(query: Option<&str>, session: &dyn KeyValueStore) -> String {
    if let Some(address) = query.filter(|q| !q.is_empty()) {
        return address.to_string();
    }
    match session.get(ADDRESS_KEY) {
        Ok(address) => address.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("failed to read session address: {}", e);
            String::new()
        }
    }
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

fn reasons(items: &[(Polarity, &str)]) -> Vec<(Polarity, String)> {
    items.iter().map(|(p, t)| (*p, t.to_string())).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Canned verdict chosen by case-insensitive substring match on the address.
pub fn mock_verdict(address: &str) -> ResultVerdict {
    use Polarity::{Bad, Good};

    let lower = address.to_lowercase();
    if lower.contains("mathilda") {
        ResultVerdict {
            address: address.to_string(),
            conclusive: true,
            likelihood: 0.85,
            reasons: reasons(&[
                (Bad, "Landlord requesting wire transfer before viewing property"),
                (Bad, "Price significantly below market rate for the area"),
                (Bad, "Landlord claims to be out of country"),
                (Bad, "Pressure to send money quickly"),
                (Good, "Property photos appear to be legitimate"),
            ]),
            insights: pairs(&[
                ("Rental Price", "$1,200/month (65% below market average)"),
                ("Market Average", "$3,400/month for similar properties"),
                ("Landlord Contact", "Email only, no phone verification"),
                ("Property History", "Recently listed on multiple platforms"),
                ("Payment Method", "Wire transfer requested (high risk)"),
            ]),
            questions: strings(&[
                "Have you been able to verify the landlord's identity through official channels?",
                "Can you schedule an in-person viewing of the property?",
                "Has the landlord provided verifiable references or credentials?",
                "Are there any official property management companies associated with this listing?",
            ]),
        }
    } else if lower.contains("king st") {
        ResultVerdict {
            address: address.to_string(),
            conclusive: true,
            likelihood: 0.15,
            reasons: reasons(&[
                (Good, "Landlord provided verifiable contact information"),
                (Good, "Property price is within market range"),
                (Good, "In-person viewing scheduled and confirmed"),
                (Bad, "Limited online presence for the property"),
            ]),
            insights: pairs(&[
                ("Rental Price", "$2,800/month (within market range)"),
                ("Market Average", "$3,200/month for similar properties"),
                ("Landlord Contact", "Phone and email verified"),
                ("Property History", "Listed by established real estate agency"),
                ("Payment Method", "Standard lease agreement and deposit"),
            ]),
            questions: strings(&[
                "Have you completed the background check process?",
                "Are all lease terms clearly documented?",
                "Have you verified the property management company's credentials?",
            ]),
        }
    } else {
        ResultVerdict {
            address: address.to_string(),
            conclusive: false,
            likelihood: 0.5,
            reasons: reasons(&[
                (Bad, "Limited information available for analysis"),
                (Good, "No obvious red flags detected"),
            ]),
            insights: pairs(&[
                ("Information Available", "Insufficient data for complete analysis"),
                ("Recommendation", "Gather more information before proceeding"),
            ]),
            questions: strings(&[
                "Can you provide more details about the landlord?",
                "What payment methods are being requested?",
                "Have you been able to view the property in person?",
                "Are there any unusual requests or pressure tactics?",
            ]),
        }
    }
}

/// Produces verdicts for addresses.
#[async_trait]
pub trait VerdictSource: Send + Sync {
    async fn fetch(&self, address: &str) -> VeritasResult<ResultVerdict>;
}

/// Canned verdicts after a fixed delay.
#[derive(Clone, Debug)]
pub struct MockVerdictSource {
    delay: Duration,
}

impl MockVerdictSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl VerdictSource for MockVerdictSource {
    async fn fetch(&self, address: &str) -> VeritasResult<ResultVerdict> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(mock_verdict(address))
    }
}

/// One rendered list entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItem {
    pub markup: String,
    pub text: String,
}

/// A list and its empty placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListWidget {
    pub list_id: &'static str,
    pub empty_id: &'static str,
    pub empty_text: &'static str,
    pub items: Vec<ListItem>,
}

impl ListWidget {
    fn build(
        list_id: &'static str,
        empty_id: &'static str,
        empty_text: &'static str,
        items: Vec<ListItem>,
    ) -> Self {
        Self {
            list_id,
            empty_id,
            empty_text,
            items,
        }
    }

    pub fn shows_placeholder(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_html(&self) -> String {
        let mut out = format!("<ul id=\"{}\">", self.list_id);
        for item in &self.items {
            out.push_str(&format!("<li>{}</li>", item.markup));
        }
        out.push_str("</ul>");
        let hidden = if self.shows_placeholder() { "" } else { " hidden" };
        out.push_str(&format!(
            "<p id=\"{}\"{}>{}</p>",
            self.empty_id, hidden, self.empty_text
        ));
        out
    }
}

/// Everything the results card shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsView {
    pub title: String,
    pub likelihood: Likelihood,
    pub reasons: ListWidget,
    pub insights: ListWidget,
    pub questions: ListWidget,
}

impl ResultsView {
    /// Builds the view; `resolved` is the address the page asked about.
    pub fn render(verdict: &ResultVerdict, resolved: &str) -> Self {
        let shown = [verdict.address.as_str(), resolved]
            .into_iter()
            .find(|a| !a.is_empty())
            .unwrap_or("Unknown Address");

        let reasons = verdict
            .reasons
            .iter()
            .map(|(polarity, text)| {
                let (class, icon) = match polarity {
                    Polarity::Good => ("reason--good", "✅"),
                    Polarity::Bad => ("reason--bad", "⚠️"),
                };
                ListItem {
                    markup: format!("<span class=\"{}\">{}</span> {}", class, icon, escape_html(text)),
                    text: format!("{} {}", icon, text),
                }
            })
            .collect();

        let insights = verdict
            .insights
            .iter()
            .map(|(label, value)| ListItem {
                markup: format!(
                    "<strong>{}</strong>: {}",
                    escape_html(label),
                    escape_html(value)
                ),
                text: format!("{}: {}", label, value),
            })
            .collect();

        let questions = verdict
            .questions
            .iter()
            .map(|q| ListItem {
                markup: escape_html(q),
                text: q.clone(),
            })
            .collect();

        Self {
            title: format!("Results for {}", shown),
            likelihood: compute_likelihood(verdict.conclusive, verdict.likelihood),
            reasons: ListWidget::build(
                "reasons-list",
                "reasons-empty",
                "No reasons were identified.",
                reasons,
            ),
            insights: ListWidget::build(
                "insights-list",
                "insights-empty",
                "No data was analyzed.",
                insights,
            ),
            questions: ListWidget::build(
                "questions-list",
                "questions-empty",
                "No further questions.",
                questions,
            ),
        }
    }
}

/// What the status region shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultsStatus {
    Loading,
    Ready(ResultsView),
    Error,
}

impl ResultsStatus {
    pub fn status_html(&self) -> String {
        match self {
            ResultsStatus::Loading => concat!(
                "<div class=\"status-card\"><div class=\"status-header\">",
                "<h4>Loading results…</h4>",
                "<span class=\"status-spinner\" aria-hidden=\"true\"></span></div>",
                "<div class=\"status-content\"><p>Fetching analysis…</p></div></div>"
            )
            .to_string(),
            ResultsStatus::Ready(_) => String::new(),
            ResultsStatus::Error => format!(
                concat!(
                    "<div class=\"error-alert\"><div class=\"alert-content\">",
                    "<h4>Unable to load results</h4><p>Please retry.</p>",
                    "<button class=\"retry-btn\">Retry</button>",
                    "<a class=\"btn\" href=\"{}\">Restart</a></div></div>"
                ),
                Page::Index
            ),
        }
    }
}

/// One visit to the results page.
pub struct ResultsPage {
    source: Arc<dyn VerdictSource>,
    session: SharedStore,
    status: ResultsStatus,
}

impl ResultsPage {
    pub fn new(source: Arc<dyn VerdictSource>, session: SharedStore) -> Self {
        Self {
            source,
            session,
            status: ResultsStatus::Loading,
        }
    }

    pub fn status(&self) -> &ResultsStatus {
        &self.status
    }

    /// Loads and renders the verdict. Running it again is the retry action.
    pub async fn load(&mut self, query: Option<&str>) -> &ResultsStatus {
        self.status = ResultsStatus::Loading;
        let address = resolve_address(query, self.session.as_ref());
        tracing::info!("loading results for {:?}", address);

        self.status = match self.source.fetch(&address).await {
            Ok(verdict) => ResultsStatus::Ready(ResultsView::render(&verdict, &address)),
            Err(e) => {
                tracing::warn!("failed to load results: {}", e);
                ResultsStatus::Error
            }
        };
        &self.status
    }
}
