//! HTML fragments produced by the page controllers.
//!
//! Every piece of user- or data-supplied text passes through [`escape_html`] before it is
//! placed inside markup. An [`Element`] carries both its final markup and a plain-text
//! rendition, so a sink can show either form.

/// Escapes `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// A block-level element with its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub class: Option<&'static str>,
    pub id: Option<&'static str>,
    /// Inner markup.
    pub markup: String,
    /// Plain-text rendition of `markup`.
    pub text: String,
}

impl Element {
    /// An empty element.
    pub fn new(tag: &'static str, class: Option<&'static str>) -> Self {
        Self {
            tag,
            class,
            id: None,
            markup: String::new(),
            text: String::new(),
        }
    }

    pub fn with_id(mut self, id: &'static str) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets content from plain text; the markup is its escaped form.
    pub fn with_text(mut self, text: &str) -> Self {
        self.markup = escape_html(text);
        self.text = text.to_string();
        self
    }

    /// Sets content from pre-built markup and its plain-text rendition.
    pub fn with_markup(mut self, markup: String, text: String) -> Self {
        self.markup = markup;
        self.text = text;
        self
    }

    /// Same element without content, as appended before a reveal.
    pub fn emptied(&self) -> Self {
        Self {
            markup: String::new(),
            text: String::new(),
            ..self.clone()
        }
    }

    /// Outer HTML.
    pub fn to_html(&self) -> String {
        let mut out = format!("<{}", self.tag);
        if let Some(id) = self.id {
            out.push_str(&format!(" id=\"{}\"", id));
        }
        if let Some(class) = self.class {
            out.push_str(&format!(" class=\"{}\"", class));
        }
        out.push('>');
        out.push_str(&self.markup);
        out.push_str(&format!("</{}>", self.tag));
        out
    }
}
