//! # calver
//!
//! A library for parsing, formatting and bumping calendar versions.
//!
//! A *layout* such as `YY.0M.MICRO` describes how a version string is made of calendar fields
//! (year, month, week, day), version fields (major, minor, micro, modifier) and literal
//! separators. With a layout, version strings can be parsed, rendered back, and bumped to the
//! next version for a given point in time.
//!
//! ## Examples
//!
//! Get the next version of a project released monthly:
//!
//! ```
//! use calver::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! let now = Utc.with_ymd_and_hms(2023, 5, 20, 0, 0, 0).unwrap();
//! let template = Version::new("YY.0M.MICRO", &now).unwrap();
//!
//! // a release earlier this month: bump the micro version
//! let current = template.parse("23.05.1").unwrap();
//! assert_eq!("23.05.2", current.next(&now).unwrap().to_string());
//!
//! // the last release was last month: start the month over
//! let current = template.parse("23.04.7").unwrap();
//! assert_eq!("23.05.0", current.next(&now).unwrap().to_string());
//! ```
//!
//! Pick the latest of several versions, then bump it:
//!
//! ```
//! use calver::prelude::*;
//! use chrono::Utc;
//!
//! let template = Version::new("YYYY.0M.MICRO-MODIFIER", &Utc::now())
//!     .unwrap()
//!     .with_trim_suffix(true);
//! let mut versions: Versions = ["2023.05.1", "2023.05.2-rc1", "2023.04.9"]
//!     .into_iter()
//!     .filter_map(|value| template.parse(value).ok())
//!     .collect();
//!
//! let latest = versions.latest().unwrap();
//! assert_eq!("2023.05.2-rc1", latest.to_string());
//! assert_eq!("2023.05.3", latest.bump_micro().unwrap().with_modifier("").unwrap().to_string());
//! ```
//!
//! ## Layout symbols
//!
//! | Symbol | Example | Parses |
//! |---|---|---|
//! | `YYYY` | `2006` | exactly 4 digits |
//! | `YY` | `6` | 1–2 digits, no leading zero |
//! | `0Y` | `06` | exactly 2 digits |
//! | `MM` | `1` | 1–2 digits, no leading zero |
//! | `0M` | `01` | exactly 2 digits |
//! | `WW` | `1` | 1–2 digits, no leading zero (ISO 8601 week) |
//! | `0W` | `01` | exactly 2 digits (ISO 8601 week) |
//! | `DD` | `1` | 1–2 digits, no leading zero |
//! | `0D` | `01` | exactly 2 digits |
//! | `MAJOR` | `1` | 1 or more digits |
//! | `MINOR` | `2` | 1 or more digits |
//! | `MICRO` | `3` | 1 or more digits |
//! | `MODIFIER` | `-dev` | everything left |
//!
//! Any other text in a layout is a literal separator. Each kind of calendar field (year, month,
//! week, day) and each version field may appear at most once.
//!
//! ### Greedy fields
//!
//! `MAJOR`, `MINOR` and `MICRO` take every leading digit. Two of them with no separator in
//! between (`MAJORMINOR`) can't be told apart: the first takes all the digits. Use a separator,
//! or a fixed-width calendar field, between them.
//!
//! ## Prelude
//!
//! calver provides a prelude module for convenience:
//!
//! ```
//! use calver::prelude::*;
//! ```
#![warn(missing_docs)]

mod error;
mod layout;
mod token;
mod version;
mod versions;

use chrono::{DateTime, Utc};

pub use crate::error::{CompositeError, LayoutError, ParseError, VersionError};
pub use crate::layout::Layout;
pub use crate::token::{CalendarField, Token, VersionField};
pub use crate::version::{Level, Version};
pub use crate::versions::Versions;

/// Parses `value` with the layout `layout_str` in one step. The result is in UTC.
///
/// ```
/// let version = calver::parse("YYYY.0M.0D", "2023.05.20").unwrap();
/// assert_eq!("2023-05-20", version.timestamp().format("%Y-%m-%d").to_string());
/// ```
///
/// # Errors
///
/// - Returns a [`CompositeError::Layout`] if the layout can't be compiled.
/// - Returns a [`CompositeError::Version`] if the version doesn't match the layout.
pub fn parse(layout_str: &str, value: &str) -> Result<Version, CompositeError> {
    // parsing replaces the template's time, so any instant will do
    let template = Version::new(layout_str, &DateTime::<Utc>::default())?;
    Ok(template.parse(value)?)
}

/// A convenience module appropriate for glob imports (`use calver::prelude::*;`).
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::CompositeError;
    #[doc(no_inline)]
    pub use crate::Layout;
    #[doc(no_inline)]
    pub use crate::LayoutError;
    #[doc(no_inline)]
    pub use crate::Level;
    #[doc(no_inline)]
    pub use crate::ParseError;
    #[doc(no_inline)]
    pub use crate::Version;
    #[doc(no_inline)]
    pub use crate::VersionError;
    #[doc(no_inline)]
    pub use crate::Versions;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_one_shot() {
        let version = parse("MAJOR.MINOR.MICRO", "1.2.3").unwrap();
        assert_eq!("1.2.3", version.to_string());
    }

    #[test]
    fn test_parse_one_shot_layout_error() {
        assert!(matches!(
            parse("YYYY.YY", "2023.23"),
            Err(CompositeError::Layout(LayoutError::DuplicateField { .. }))
        ));
    }

    #[test]
    fn test_parse_one_shot_version_error() {
        assert!(matches!(
            parse("YYYY", "23"),
            Err(CompositeError::Version(VersionError::Parse { .. }))
        ));
    }
}
