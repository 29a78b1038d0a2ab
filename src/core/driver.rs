//! Build profile selection.

use std::fmt;

/// Build profile, chosen once per builder.
///
/// Release output is minified and fingerprinted for long-lived caching;
/// development output keeps stable names so a running dev server can
/// reload without rewriting URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Release,
    Development,
}

impl Profile {
    /// Resolve a profile from an environment name.
    ///
    /// Anything starting with `prod` (`prod`, `production`) is a release
    /// build; every other name is a development build.
    pub fn from_env_name(name: &str) -> Self {
        if name.starts_with("prod") {
            Self::Release
        } else {
            Self::Development
        }
    }

    #[inline]
    pub const fn is_release(self) -> bool {
        matches!(self, Self::Release)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Release => "release",
            Self::Development => "development",
        })
    }
}
