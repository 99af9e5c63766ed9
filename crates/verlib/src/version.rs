//! Four-component build version of the target binary.
//!
//! Version library files carry the build version they describe, and the
//! version is also embedded in the file name (`version-1_5_97_0.bin`), which
//! is how alias files locate the file they redirect to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator used when a version is embedded in a file name
pub const TAG_SEPARATOR: &str = "_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileVersion(pub [i32; 4]);

impl FileVersion {
    pub const fn new(major: i32, minor: i32, build: i32, revision: i32) -> Self {
        Self([major, minor, build, revision])
    }

    pub fn components(&self) -> [i32; 4] {
        self.0
    }

    /// The version as it appears in a library file name, e.g. `1_5_97_0`
    pub fn tag(&self) -> String {
        self.0
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(TAG_SEPARATOR)
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl FromStr for FileVersion {
    type Err = Error;

    /// Accepts `1.5.97.0` as well as the file-name form `1_5_97_0`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(['.', '_']).collect();
        if parts.len() != 4 {
            return Err(Error::InvalidVersion(format!(
                "'{}' must have four components",
                s
            )));
        }

        let mut components = [0i32; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part.trim().parse().map_err(|e| {
                Error::InvalidVersion(format!("component '{}' of '{}': {}", part, s, e))
            })?;
        }

        Ok(Self(components))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_joins_with_underscore() {
        assert_eq!(FileVersion::new(1, 5, 97, 0).tag(), "1_5_97_0");
    }

    #[test]
    fn test_display_uses_dots() {
        assert_eq!(FileVersion::new(1, 6, 1170, 0).to_string(), "1.6.1170.0");
    }

    #[test]
    fn test_parse_both_forms() {
        let dotted: FileVersion = "1.5.97.0".parse().unwrap();
        let tagged: FileVersion = "1_5_97_0".parse().unwrap();
        assert_eq!(dotted, tagged);
        assert_eq!(dotted.components(), [1, 5, 97, 0]);
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        assert!("1.5.97".parse::<FileVersion>().is_err());
        assert!("1.5.x.0".parse::<FileVersion>().is_err());
    }

    #[test]
    fn test_parse_error_names_the_version() {
        let err = "1.5.x.0".parse::<FileVersion>().unwrap_err();
        assert!(matches!(err, Error::InvalidVersion(_)));
        let message = err.to_string();
        assert!(message.starts_with("Invalid build version"));
        assert!(message.contains("1.5.x.0"));
        assert!(!message.contains("library"));

        let err = "1.5".parse::<FileVersion>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid build version: '1.5' must have four components");
    }
}
