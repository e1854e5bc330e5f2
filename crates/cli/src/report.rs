//! Plain-text rendering of the results card.

use veritas_core::results::ListWidget;
use veritas_core::ResultsView;

fn push_list(out: &mut String, heading: &str, list: &ListWidget) {
    out.push_str(&format!("\n{}\n", heading));
    if list.shows_placeholder() {
        out.push_str(&format!("  {}\n", list.empty_text));
    }
    for item in &list.items {
        out.push_str(&format!("  - {}\n", item.text));
    }
}

pub fn render_view(view: &ResultsView) -> String {
    let mut out = format!("{}\n", view.title);
    out.push_str(&format!("Scam likelihood: {}\n", view.likelihood.display()));
    push_list(&mut out, "Reasons", &view.reasons);
    push_list(&mut out, "Analyzed data", &view.insights);
    push_list(&mut out, "Questions to ask", &view.questions);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritas_core::results::Polarity;
    use veritas_core::ResultVerdict;

    #[test]
    fn test_render_view() {
        let verdict = ResultVerdict {
            address: "1 Main St".into(),
            conclusive: true,
            likelihood: 0.42,
            reasons: vec![(Polarity::Good, "Verified owner".into())],
            insights: vec![],
            questions: vec!["Can you visit?".into()],
        };
        let text = render_view(&ResultsView::render(&verdict, "1 Main St"));
        assert_eq!(
            text,
            "Results for 1 Main St\n\
             Scam likelihood: 42%\n\
             \nReasons\n  - ✅ Verified owner\n\
             \nAnalyzed data\n  No data was analyzed.\n\
             \nQuestions to ask\n  - Can you visit?\n"
        );
    }
}
