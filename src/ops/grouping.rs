use indexmap::IndexMap;
use url::{Host, Url};

use crate::model::tab::Tab;

/// Key used for tabs whose URL cannot be classified.
pub const OTHER_KEY: &str = "other";

/// Browser-internal schemes that group by scheme name instead of host.
pub const INTERNAL_SCHEMES: &[&str] = &[
    "about",
    "brave",
    "chrome",
    "chrome-extension",
    "chrome-search",
    "chrome-untrusted",
    "devtools",
    "edge",
    "moz-extension",
    "opera",
    "view-source",
];

/// The origin signature of a tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Internal scheme, or a URL without a host (e.g. `file:`)
    Scheme(String),
    /// Host-based key: `localhost`, an IPv4 literal, or the last two labels
    Host(String),
    Other,
}

impl Origin {
    pub fn key(&self) -> &str {
        match self {
            Origin::Scheme(s) | Origin::Host(s) => s,
            Origin::Other => OTHER_KEY,
        }
    }

    /// Group heading shown to the user
    pub fn title(&self) -> String {
        match self {
            Origin::Scheme(s) => format!("{}://", s),
            Origin::Host(h) => h.clone(),
            Origin::Other => "Other".to_string(),
        }
    }
}

/// Classifies URLs into origin groups.
///
/// The host rule is a naive eTLD+1 approximation: it keeps the last two labels
/// without consulting a public-suffix list, so `foo.co.uk` groups as `co.uk`.
#[derive(Debug, Clone)]
pub struct OriginGrouper {
    internal_schemes: Vec<String>,
}

impl Default for OriginGrouper {
    fn default() -> Self {
        OriginGrouper::new(&[])
    }
}

impl OriginGrouper {
    pub fn new(extra_schemes: &[String]) -> Self {
        let mut internal_schemes: Vec<String> =
            INTERNAL_SCHEMES.iter().map(|s| s.to_string()).collect();
        for scheme in extra_schemes {
            let scheme = scheme.trim().trim_end_matches("://").to_ascii_lowercase();
            if !scheme.is_empty() && !internal_schemes.contains(&scheme) {
                internal_schemes.push(scheme);
            }
        }
        OriginGrouper { internal_schemes }
    }

    pub fn classify(&self, raw_url: &str) -> Origin {
        let Ok(url) = Url::parse(raw_url) else {
            return Origin::Other;
        };
        let scheme = url.scheme();
        if self.internal_schemes.iter().any(|s| s == scheme) {
            return Origin::Scheme(scheme.to_string());
        }

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => {
                return if scheme.is_empty() {
                    Origin::Other
                } else {
                    Origin::Scheme(scheme.to_string())
                };
            }
        };

        let host = host.trim_end_matches('.');
        if host == "localhost" || matches!(url.host(), Some(Host::Ipv4(_))) {
            return Origin::Host(host.to_string());
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() >= 2 {
            Origin::Host(labels[labels.len() - 2..].join("."))
        } else {
            Origin::Host(host.to_string())
        }
    }

    /// Group key for a tab. Total: unparsable URLs map to `"other"`.
    pub fn group_key(&self, tab: &Tab) -> String {
        self.classify(&tab.url).key().to_string()
    }
}

/// A group of tabs sharing an origin, before view decoration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGroup<'a> {
    pub key: String,
    pub title: String,
    pub first_index: usize,
    pub tabs: Vec<&'a Tab>,
}

/// Group tabs by origin.
///
/// Members are ordered by tab index; groups by their lowest member index, so
/// group order follows the leftmost tab of each group in the tab strip.
pub fn group_tabs<'a>(grouper: &OriginGrouper, tabs: &[&'a Tab]) -> Vec<TabGroup<'a>> {
    let mut sorted: Vec<&'a Tab> = tabs.to_vec();
    sorted.sort_by_key(|t| (t.index, t.id));

    // Insertion order of the map is the first-member order
    let mut groups: IndexMap<String, TabGroup<'a>> = IndexMap::new();
    for tab in sorted {
        let origin = grouper.classify(&tab.url);
        groups
            .entry(origin.key().to_string())
            .or_insert_with(|| TabGroup {
                key: origin.key().to_string(),
                title: origin.title(),
                first_index: tab.index,
                tabs: Vec::new(),
            })
            .tabs
            .push(tab);
    }
    groups.into_values().collect()
}

/// Favicon for a tab, falling back to `<origin>/favicon.ico`.
pub fn favicon_url(tab: &Tab) -> String {
    if let Some(icon) = tab.favicon_url.as_deref().filter(|s| !s.is_empty()) {
        return icon.to_string();
    }
    match Url::parse(&tab.url) {
        Ok(url) if url.origin().is_tuple() => {
            format!("{}/favicon.ico", url.origin().ascii_serialization())
        }
        _ => String::new(),
    }
}
