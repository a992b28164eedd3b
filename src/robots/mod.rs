//! Robots.txt handling module
//!
//! Parsing lives in [`RobotsPolicy`]; [`PolicyHandle`] records whether a
//! policy was loaded for the crawl, so a failed robots fetch is an explicit
//! state rather than a missing value.

mod parser;

pub use parser::{RobotsPolicy, WILDCARD_AGENT};

/// The robots policy installed for a crawl
#[derive(Debug, Clone, Default)]
pub enum PolicyHandle {
    /// No robots fetch has been attempted
    #[default]
    Absent,

    /// robots.txt was fetched and parsed
    Loaded(RobotsPolicy),

    /// robots.txt could not be fetched; everything is allowed
    Disabled {
        /// Why the policy was disabled
        reason: String,
    },
}

impl PolicyHandle {
    /// Checks if `url` may be fetched by `agent`
    ///
    /// Only a loaded policy can deny; the other states fail open.
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        match self {
            Self::Loaded(policy) => policy.is_allowed(url, agent),
            Self::Absent | Self::Disabled { .. } => true,
        }
    }

    /// Returns true if a parsed policy is installed
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}
