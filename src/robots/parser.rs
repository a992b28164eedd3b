//! Robots.txt parser implementation
//!
//! Groups `Disallow` prefixes by user-agent token. `Allow`, `Crawl-delay` and
//! `Sitemap` lines are recognised and skipped.

use std::collections::{BTreeSet, HashMap};
use url::Url;

/// Agent token used for rules that precede any `User-agent` line
pub const WILDCARD_AGENT: &str = "*";

/// Only used to borrow `Url`'s path serialization
const PATH_BASE: &str = "http://robots.invalid/";

/// Parsed robots.txt rules
///
/// Immutable after construction and safe to share between workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsPolicy {
    /// Disallowed path prefixes per user-agent token
    rules: HashMap<String, BTreeSet<String>>,
}

impl RobotsPolicy {
    /// Parses robots.txt content
    ///
    /// Lines are processed top to bottom. A `User-agent` line closes the
    /// current group and opens a new one; `Disallow` lines add a prefix to the
    /// open group. Rules from repeated groups for the same agent are merged.
    ///
    /// # Example
    ///
    /// ```
    /// use tidewalk::robots::RobotsPolicy;
    ///
    /// let robots = RobotsPolicy::from_content("User-agent: *\nDisallow: /private");
    /// assert!(!robots.is_allowed("https://example.com/private/x", "*"));
    /// assert!(robots.is_allowed("https://example.com/public", "*"));
    /// ```
    pub fn from_content(content: &str) -> Self {
        let mut rules: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut current_agent = WILDCARD_AGENT.to_string();
        let mut disallowed = BTreeSet::new();

        for line in content.lines() {
            let trimmed = strip_comment(line).trim();

            // Skip comments and empty lines
            if trimmed.is_empty() {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    flush(&mut rules, &current_agent, std::mem::take(&mut disallowed));
                    current_agent = value.to_string();
                }
                "disallow" => {
                    // An empty Disallow means "nothing is disallowed"
                    if !value.is_empty() {
                        disallowed.insert(encode_path(value));
                    }
                }
                _ => {}
            }
        }

        flush(&mut rules, &current_agent, disallowed);

        Self { rules }
    }

    /// Disallowed prefixes recorded for exactly `agent`, if any
    pub fn rules_for(&self, agent: &str) -> Option<&BTreeSet<String>> {
        self.rules.get(agent)
    }

    /// Agent tokens that have a rule group
    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Checks if a URL is allowed for the given agent token
    ///
    /// The lookup is exact: there is no fallback from a named agent to `*`.
    /// With no rules for the agent everything is allowed; otherwise any
    /// matching prefix disallows.
    ///
    /// `url` may be an absolute URL or a bare path.
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        let Some(disallowed) = self.rules.get(agent) else {
            return true;
        };

        let path = request_path(url);
        !disallowed.iter().any(|rule| rule_matches(rule, &path))
    }
}

fn flush(rules: &mut HashMap<String, BTreeSet<String>>, agent: &str, group: BTreeSet<String>) {
    rules.entry(agent.to_string()).or_default().extend(group);
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before)
}

/// Path component of an absolute URL, or the input itself when it is a path
fn request_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => encode_path(url.split(['?', '#']).next().unwrap_or_default()),
    }
}

/// Percent-encodes `raw` the way `Url` serializes a path
///
/// Rules and bare paths both go through here, so a rule written with raw
/// UTF-8 compares equal to the encoded path of a parsed URL. Existing
/// escapes, `*` and `$` are left alone.
fn encode_path(raw: &str) -> String {
    match Url::parse(PATH_BASE) {
        Ok(mut base) => {
            base.set_path(raw);
            base.path().to_string()
        }
        Err(_) => raw.to_string(),
    }
}

/// Anchored match of a robots rule against a path
///
/// Plain rules are prefixes. `*` matches any run of characters and a
/// trailing `$` anchors the end of the path.
fn rule_matches(rule: &str, path: &str) -> bool {
    let (pattern, anchored) = match rule.strip_suffix('$') {
        Some(p) => (p, true),
        None => (rule, false),
    };

    if !pattern.contains('*') {
        return if anchored {
            path == pattern
        } else {
            path.starts_with(pattern)
        };
    }

    let mut pieces = pattern.split('*');
    let first = pieces.next().unwrap_or_default();
    let Some(mut rest) = path.strip_prefix(first) else {
        return false;
    };

    let pieces: Vec<&str> = pieces.collect();
    for (i, piece) in pieces.iter().enumerate() {
        let last = i + 1 == pieces.len();
        if last && anchored {
            return rest.ends_with(piece);
        }
        match rest.find(piece) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }

    !anchored || rest.is_empty()
}
