use std::cmp::Ordering;

use url::form_urlencoded;

use crate::model::tab::{HistoryItem, Tab};

// ---------------------------------------------------------------------------
// Tab filter
// ---------------------------------------------------------------------------

/// Case-insensitive substring match against title or URL.
/// An empty (or all-whitespace) query matches everything.
pub fn matches_filter(tab: &Tab, query: &str) -> bool {
    let q = query.trim();
    if q.is_empty() {
        return true;
    }
    let q = q.to_lowercase();
    tab.title.to_lowercase().contains(&q) || tab.url.to_lowercase().contains(&q)
}

// ---------------------------------------------------------------------------
// History search
// ---------------------------------------------------------------------------

/// Narrow raw history results for the navigation box.
///
/// Keeps entries whose URL contains `text` (case-insensitive), most recent
/// visit first, capped at `max_results`.
pub fn rank_history(items: Vec<HistoryItem>, text: &str, max_results: usize) -> Vec<HistoryItem> {
    let needle = text.trim().to_lowercase();
    let mut hits: Vec<HistoryItem> = items
        .into_iter()
        .filter(|item| needle.is_empty() || item.url.to_lowercase().contains(&needle))
        .collect();
    hits.sort_by(|a, b| {
        b.last_visit_time
            .partial_cmp(&a.last_visit_time)
            .unwrap_or(Ordering::Equal)
    });
    hits.truncate(max_results);
    hits
}

/// Build a web search URL from a template containing `%s`.
/// Templates without a placeholder get the query appended.
pub fn web_search_url(template: &str, query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
    if template.contains("%s") {
        template.replace("%s", &encoded)
    } else {
        format!("{}{}", template, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(title: &str, url: &str) -> Tab {
        Tab {
            id: 1,
            window_id: 1,
            index: 0,
            url: url.into(),
            title: title.into(),
            favicon_url: None,
            pinned: false,
            active: false,
        }
    }

    fn visit(url: &str, at: f64) -> HistoryItem {
        HistoryItem {
            url: url.into(),
            title: String::new(),
            last_visit_time: at,
        }
    }

    #[test]
    fn filter_matches_title_or_url_ignoring_case() {
        let t = tab("GitHub", "https://github.com/x");
        assert!(matches_filter(&t, "git"));
        assert!(matches_filter(&t, "GITHUB.COM"));
        assert!(matches_filter(&t, ""));
        assert!(matches_filter(&t, "   "));
        assert!(!matches_filter(&tab("Other", "https://y.com"), "git"));
    }

    #[test]
    fn history_ranked_by_recency_and_capped() {
        let items = vec![
            visit("https://docs.rs/serde", 10.0),
            visit("https://crates.io/serde", 30.0),
            visit("https://example.com", 50.0),
            visit("https://serde.rs", 20.0),
        ];
        let ranked = rank_history(items, "SERDE", 2);
        let urls: Vec<&str> = ranked.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://crates.io/serde", "https://serde.rs"]);
    }

    #[test]
    fn history_title_does_not_match() {
        let mut item = visit("https://example.com", 1.0);
        item.title = "rust".into();
        assert!(rank_history(vec![item], "rust", 5).is_empty());
    }

    #[test]
    fn search_url_encodes_query() {
        assert_eq!(
            web_search_url("https://www.google.com/search?q=%s", " rust traits & generics "),
            "https://www.google.com/search?q=rust+traits+%26+generics"
        );
        assert_eq!(
            web_search_url("https://duckduckgo.com/html/?q=", "a b"),
            "https://duckduckgo.com/html/?q=a+b"
        );
    }
}
