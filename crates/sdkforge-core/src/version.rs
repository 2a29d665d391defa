//! SDK version encoding and tool-version parsing.
//!
//! The platform manifest has a single signed 32-bit slot for an SDK's version
//! (`android:versionMajor` on `<sdk-library>`), so the SDK major and minor
//! versions are packed into one composite value:
//!
//! ```text
//! composite = major * MINOR_SPAN + minor
//! ```
//!
//! `MINOR_SPAN` reserves four decimal digits for the minor version. With the
//! bounds below the largest composite is `999_999_999`, well inside `i32`.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

/// Decimal span reserved for the minor version inside a composite version.
pub const MINOR_SPAN: i32 = 10_000;

/// Largest accepted SDK major version (inclusive).
pub const VERSION_MAJOR_MAX_VALUE: i32 = 99_999;

/// Largest accepted SDK minor version (inclusive).
pub const VERSION_MINOR_MAX_VALUE: i32 = MINOR_SPAN - 1;

/// Largest composite value produced by [`encode_sdk_major_and_minor_version`].
pub const COMPOSITE_MAX_VALUE: i32 = VERSION_MAJOR_MAX_VALUE * MINOR_SPAN + VERSION_MINOR_MAX_VALUE;

pub fn is_valid_major(major: i32) -> bool {
    (0..=VERSION_MAJOR_MAX_VALUE).contains(&major)
}

pub fn is_valid_minor(minor: i32) -> bool {
    (0..=VERSION_MINOR_MAX_VALUE).contains(&minor)
}

/// Encode an SDK major/minor pair into the composite manifest value.
///
/// For instance, version 2.3.x encodes to `20003`.
///
/// # Panics
///
/// Panics when either component is outside its bounds. Callers validate
/// bundle versions before any encoding happens, so reaching this with
/// out-of-range input is a bug rather than bad user input.
pub fn encode_sdk_major_and_minor_version(major: i32, minor: i32) -> i32 {
    assert!(
        is_valid_major(major),
        "SDK major version {major} outside [0, {VERSION_MAJOR_MAX_VALUE}]"
    );
    assert!(
        is_valid_minor(minor),
        "SDK minor version {minor} outside [0, {VERSION_MINOR_MAX_VALUE}]"
    );
    major * MINOR_SPAN + minor
}

/// Decode a composite manifest value back into `(major, minor)`.
///
/// Returns `None` for values no valid pair encodes to.
pub fn decode_sdk_major_and_minor_version(composite: i32) -> Option<(i32, i32)> {
    if !(0..=COMPOSITE_MAX_VALUE).contains(&composite) {
        return None;
    }
    Some((composite / MINOR_SPAN, composite % MINOR_SPAN))
}

lazy_static! {
    static ref TOOL_VERSION: Regex =
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z][0-9A-Za-z.]*))?$").unwrap();
}

/// Semantic version of the tool that produced a bundle (e.g. `1.9.1` or
/// `1.10.0-alpha01`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolVersion {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub qualifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tool version: '{0}'")]
pub struct ParseToolVersionError(pub String);

impl ToolVersion {
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: None,
        }
    }
}

impl FromStr for ToolVersion {
    type Err = ParseToolVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = TOOL_VERSION
            .captures(s)
            .ok_or_else(|| ParseToolVersionError(s.to_string()))?;
        let component = |i: usize| -> Result<u32, ParseToolVersionError> {
            caps[i]
                .parse::<u32>()
                .map_err(|_| ParseToolVersionError(s.to_string()))
        };
        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            micro: component(3)?,
            qualifier: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if let Some(q) = &self.qualifier {
            write!(f, "-{q}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_regression_anchor() {
        assert_eq!(encode_sdk_major_and_minor_version(2, 3), 20003);
        assert_eq!(encode_sdk_major_and_minor_version(15, 0), 150000);
        assert_eq!(encode_sdk_major_and_minor_version(0, 0), 0);
    }

    #[test]
    fn composite_max_fits_manifest_field() {
        assert_eq!(
            encode_sdk_major_and_minor_version(VERSION_MAJOR_MAX_VALUE, VERSION_MINOR_MAX_VALUE),
            COMPOSITE_MAX_VALUE
        );
        assert!(COMPOSITE_MAX_VALUE < i32::MAX);
        assert!(VERSION_MINOR_MAX_VALUE < MINOR_SPAN);
    }

    #[test]
    fn decodes_composite() {
        assert_eq!(decode_sdk_major_and_minor_version(20003), Some((2, 3)));
        assert_eq!(decode_sdk_major_and_minor_version(9_999), Some((0, 9_999)));
        assert_eq!(decode_sdk_major_and_minor_version(-1), None);
        assert_eq!(decode_sdk_major_and_minor_version(COMPOSITE_MAX_VALUE + 1), None);
    }

    #[test]
    #[should_panic(expected = "SDK major version")]
    fn encode_rejects_major_out_of_bounds() {
        encode_sdk_major_and_minor_version(VERSION_MAJOR_MAX_VALUE + 1, 0);
    }

    #[test]
    #[should_panic(expected = "SDK minor version")]
    fn encode_rejects_negative_minor() {
        encode_sdk_major_and_minor_version(1, -1);
    }

    #[test]
    fn parses_tool_versions() {
        let v: ToolVersion = "1.9.1".parse().unwrap();
        assert_eq!(v, ToolVersion::new(1, 9, 1));
        assert_eq!(v.qualifier, None);

        let pre: ToolVersion = "1.10.0-alpha01".parse().unwrap();
        assert_eq!(pre.qualifier.as_deref(), Some("alpha01"));
        assert_eq!(pre.to_string(), "1.10.0-alpha01");

        assert!("invalidVersion".parse::<ToolVersion>().is_err());
        assert!("1.9".parse::<ToolVersion>().is_err());
        assert!("1.9.x".parse::<ToolVersion>().is_err());
        assert!("".parse::<ToolVersion>().is_err());
    }
}
