use chrono::{DateTime, FixedOffset};

/// Errors that can occur when compiling a layout string into a [`Layout`](crate::Layout).
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout requests more than one symbol for a field that may appear at most once. For
    /// example, `YYYY.YY` names the year twice.
    #[error("Layout should contain at most one `{field}` symbol, but found both `{first}` and `{second}`")]
    DuplicateField {
        /// The kind of field that was repeated, e.g. `year` or `micro`.
        field: &'static str,
        /// The first symbol found for the field.
        first: &'static str,
        /// The second symbol found for the field.
        second: &'static str,
    },
}

/// A failure to consume a version string against a single layout token.
///
/// These are always reported wrapped inside a [`VersionError::Parse`], which adds the full
/// version string and layout for context.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The pattern expected by `token` was not found at the start of `remaining`.
    #[error("could not get the value of token `{token}` from `{remaining}`")]
    TokenMismatch {
        /// The layout symbol of the token, or the separator text.
        token: String,
        /// The part of the version string that was left when the token failed.
        remaining: String,
    },

    /// Every token of the layout was consumed, but some of the version string was not.
    #[error("there is trailing input that could not be parsed: `{remaining}`")]
    TrailingInput {
        /// The unparsed end of the version string.
        remaining: String,
    },

    /// A run of digits was matched for `token` but is too large to hold.
    #[error("value `{digits}` for token `{token}` is out of range")]
    ValueOutOfRange {
        /// The layout symbol of the field, e.g. `MAJOR`.
        token: &'static str,
        /// The digits that were matched.
        digits: String,
    },

    /// The parsed year, month and day don't name a real date, such as February 30th.
    #[error("year ({year}), month ({month}) and day ({day}) do not form a valid date")]
    InvalidDate {
        /// The parsed (or default) year.
        year: i32,
        /// The parsed (or default) month.
        month: u32,
        /// The parsed (or default) day of the month.
        day: u32,
    },

    /// The parsed ISO week can't be resolved to a date chrono can represent.
    #[error("week {week} of year {year} is out of the supported date range")]
    InvalidWeek {
        /// The parsed (or default) year.
        year: i32,
        /// The parsed ISO week.
        week: u32,
    },
}

/// Errors that can occur when parsing, bumping or selecting versions.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    /// A version string could not be parsed with a layout.
    #[error("failed to parse `{value}` using layout `{layout}`: {source}")]
    Parse {
        /// The version string that was given.
        value: String,
        /// The layout string it was parsed with.
        layout: String,
        /// The token-level failure.
        source: ParseError,
    },

    /// A bump or modifier operation targets a field that is not in the layout.
    #[error("no `{field}` in the layout `{layout}`")]
    FieldNotInLayout {
        /// The layout symbol of the missing field, e.g. `MODIFIER`.
        field: &'static str,
        /// The layout string.
        layout: String,
    },

    /// [`Version::next`](crate::Version::next) was given a time before the version's own.
    #[error("`{now}` is older than the current setting (`{current}`)")]
    TimeRegression {
        /// The time that was given.
        now: DateTime<FixedOffset>,
        /// The version's own time.
        current: DateTime<FixedOffset>,
    },

    /// [`Version::next`](crate::Version::next) needed to bump a number, but the layout has none.
    #[error("failed to bump up version: no `MAJOR`, `MINOR` or `MICRO` in the layout `{layout}`")]
    NoBumpableField {
        /// The layout string.
        layout: String,
    },

    /// [`Versions::latest`](crate::Versions::latest) was called on an empty collection.
    #[error("no versions")]
    NoVersions,
}

/// An error from either compiling a layout or working with a version, for the convenience
/// functions that do both.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CompositeError {
    /// See [`LayoutError`].
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// See [`VersionError`].
    #[error(transparent)]
    Version(#[from] VersionError),
}
