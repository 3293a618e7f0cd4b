//! Target platform facts and the releases the deploy procedure supports.

use serde::Serialize;

use crate::domain::error::PlatformError;

pub const SUPPORTED_DISTRIBUTION: &str = "Ubuntu";

/// Ubuntu release codenames, oldest first.
pub const SUPPORTED_RELEASES: &[&str] = &["precise", "trusty", "xenial"];

/// A supported Ubuntu release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Release {
    Precise,
    Trusty,
    Xenial,
}

impl Release {
    #[must_use]
    pub fn codename(self) -> &'static str {
        match self {
            Self::Precise => "precise",
            Self::Trusty => "trusty",
            Self::Xenial => "xenial",
        }
    }

    /// PostgreSQL major version shipped with the release.
    #[must_use]
    pub fn postgres_version(self) -> &'static str {
        match self {
            Self::Precise => "9.1",
            Self::Trusty => "9.3",
            Self::Xenial => "9.5",
        }
    }

    #[must_use]
    pub fn java_package(self) -> &'static str {
        match self {
            Self::Xenial => "default-jre",
            Self::Precise | Self::Trusty => "openjdk-6-jre",
        }
    }

    /// Precise predates python3 virtualenvs.
    #[must_use]
    pub fn has_python3(self) -> bool {
        self != Self::Precise
    }
}

/// Identify a supported release from raw `lsb_release` output.
///
/// # Errors
///
/// `UnsupportedDistribution` if `distribution` is not Ubuntu,
/// `UnsupportedRelease` if `codename` is not a supported release.
pub fn detect(distribution: &str, codename: &str) -> Result<Release, PlatformError> {
    let distribution = distribution.trim();
    if distribution != SUPPORTED_DISTRIBUTION {
        return Err(PlatformError::UnsupportedDistribution(distribution.to_string()));
    }
    match codename.trim() {
        "precise" => Ok(Release::Precise),
        "trusty" => Ok(Release::Trusty),
        "xenial" => Ok(Release::Xenial),
        other => Err(PlatformError::UnsupportedRelease(other.to_string())),
    }
}
