//! The three pages of the flow and how they are addressed.

use std::fmt;

/// A navigation target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Page {
    /// The intake form.
    Index,
    /// The streamed analysis.
    Loading,
    /// The verdict.
    Results,
}

impl Page {
    pub fn file_name(self) -> &'static str {
        match self {
            Page::Index => "index.html",
            Page::Loading => "loading.html",
            Page::Results => "results.html",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        match name.trim_start_matches('/') {
            "index.html" | "" => Some(Page::Index),
            "loading.html" => Some(Page::Loading),
            "results.html" => Some(Page::Results),
            _ => None,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        for page in [Page::Index, Page::Loading, Page::Results] {
            assert_eq!(Page::from_file_name(page.file_name()), Some(page));
        }
        assert_eq!(Page::from_file_name("/"), Some(Page::Index));
        assert_eq!(Page::from_file_name("about.html"), None);
        assert_eq!(Page::Results.to_string(), "results.html");
    }
}
