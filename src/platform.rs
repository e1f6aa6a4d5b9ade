use std::fmt;

use crate::error::EnvironmentError;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Apple macOS.
    MacOs,
    /// Any Linux distribution.
    Linux,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::UnsupportedOs`] on anything other than
    /// macOS or Linux.
    pub fn detect() -> Result<Self, EnvironmentError> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map a toolchain OS identifier (`std::env::consts::OS`) to a platform.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::UnsupportedOs`] for unknown identifiers.
    pub fn from_os_name(name: &str) -> Result<Self, EnvironmentError> {
        let os = match name {
            "macos" => Os::MacOs,
            "linux" => Os::Linux,
            other => {
                return Err(EnvironmentError::UnsupportedOs {
                    os: other.to_string(),
                });
            }
        };
        Ok(Self { os })
    }

    /// Create a platform with an explicit OS.
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Whether this is macOS.
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.os == Os::MacOs
    }

    /// Whether this is Linux.
    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_os_name_macos() {
        let p = Platform::from_os_name("macos").unwrap();
        assert!(p.is_macos());
        assert!(!p.is_linux());
    }

    #[test]
    fn from_os_name_linux() {
        let p = Platform::from_os_name("linux").unwrap();
        assert!(p.is_linux());
        assert!(!p.is_macos());
    }

    #[test]
    fn from_os_name_rejects_windows() {
        let err = Platform::from_os_name("windows").unwrap_err();
        assert!(matches!(err, EnvironmentError::UnsupportedOs { ref os } if os == "windows"));
    }

    #[test]
    fn from_os_name_rejects_bsd() {
        assert!(Platform::from_os_name("freebsd").is_err());
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn detect_succeeds_on_supported_hosts() {
        assert!(Platform::detect().is_ok());
    }

    #[test]
    fn os_display() {
        assert_eq!(Os::MacOs.to_string(), "macos");
        assert_eq!(Os::Linux.to_string(), "linux");
    }
}
