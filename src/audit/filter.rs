use crate::audit::Error;
use regex::RegexSet;

/// Decides which request paths are worth an audit entry.
///
/// Static assets are skipped by default: anything below `/_framework`, `/lib`, `/css` or
/// `/js`, and source maps.
#[derive(Clone, Debug)]
pub struct AuditFilter {
    enabled: bool,
    excluded_paths: RegexSet,
}

impl AuditFilter {
    pub const DEFAULT_EXCLUDED_PATHS: [&'static str; 2] =
        [r"^/(_framework|lib|css|js)(/|$)", r"\.map$"];

    pub fn new<I, S>(enabled: bool, excluded_paths: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            enabled,
            excluded_paths: RegexSet::new(excluded_paths)?,
        })
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            excluded_paths: RegexSet::empty(),
        }
    }

    pub fn should_audit(&self, path: &str) -> bool {
        self.enabled && !self.excluded_paths.is_match(path)
    }
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            enabled: true,
            excluded_paths: RegexSet::new(Self::DEFAULT_EXCLUDED_PATHS)
                .unwrap_or_else(|_| RegexSet::empty()),
        }
    }
}
