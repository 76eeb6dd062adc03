use crate::{
    error::{LayoutError, ParseError, VersionError},
    layout::Layout,
    token::{CalendarField, CalendarKind, Token, VersionField},
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Weekday};
use core::fmt::{self, Display};
use std::borrow::Cow;
use tracing::debug;

const PARSED_DEFAULT_YEAR: i32 = 2000;
const PARSED_DEFAULT_MONTH: u32 = 1;
const PARSED_DEFAULT_DAY: u32 = 1;

/// A numeric level of a version that can be bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// The `MAJOR` field.
    Major,
    /// The `MINOR` field.
    Minor,
    /// The `MICRO` field.
    Micro,
}

impl Level {
    fn field(&self) -> VersionField {
        match self {
            Level::Major => VersionField::Major,
            Level::Minor => VersionField::Minor,
            Level::Micro => VersionField::Micro,
        }
    }
}

/// A Version is one concrete version laid out by a [`Layout`]: the `MAJOR`, `MINOR` and `MICRO`
/// numbers, a `MODIFIER`, and a point in time from which calendar fields are rendered.
///
/// Versions are immutable. Every method that changes something returns a new `Version` and
/// leaves the original untouched. All versions derived from the same origin share its compiled
/// layout.
///
/// # Examples
///
/// ```
/// use calver::Version;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2023, 5, 10, 12, 0, 0).unwrap();
/// let template = Version::new("YY.0M.MICRO", &now).unwrap();
///
/// let current = template.parse("23.05.3").unwrap();
/// assert_eq!("23.05.3", current.to_string());
///
/// // same month: the micro version is bumped
/// let next = current.next(&now).unwrap();
/// assert_eq!("23.05.4", next.to_string());
///
/// // new month: calendar fields come first, so the micro version starts over
/// let later = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
/// assert_eq!("23.06.0", current.next(&later).unwrap().to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    major: u64,
    minor: u64,
    micro: u64,
    modifier: String,
    ts: DateTime<FixedOffset>,
    tz: FixedOffset,
    layout: Layout,
    trim_suffix: bool,
}

fn fixed<Tz: TimeZone>(time: &DateTime<Tz>) -> DateTime<FixedOffset> {
    time.with_timezone(&time.offset().fix())
}

impl Version {
    /// Compiles `layout_str` and returns a version at `now`, with all version fields zero/empty.
    /// The version's timezone is the one of `now`.
    ///
    /// # Errors
    ///
    /// - Returns a [`LayoutError`] if the layout can't be compiled.
    pub fn new<Tz: TimeZone>(layout_str: &str, now: &DateTime<Tz>) -> Result<Self, LayoutError> {
        Ok(Self::with_layout(Layout::parse(layout_str)?, now))
    }

    /// Like [`Version::new`], but with an already compiled [`Layout`].
    pub fn with_layout<Tz: TimeZone>(layout: Layout, now: &DateTime<Tz>) -> Self {
        let ts = fixed(now);
        Self {
            major: 0,
            minor: 0,
            micro: 0,
            modifier: String::new(),
            tz: *ts.offset(),
            ts,
            layout,
            trim_suffix: false,
        }
    }

    /// Returns a copy of this version whose calendar fields are rendered in timezone `tz`.
    /// Parsed versions are placed at midnight in this timezone.
    ///
    /// The timezone is a fixed UTC offset. A zone with daylight saving time, such as
    /// [`chrono::Local`], has to be resolved to its offset at the time of interest first:
    ///
    /// ```
    /// use calver::Version;
    /// use chrono::{Local, Offset, TimeZone, Utc};
    ///
    /// let version = Version::new("YYYY.0M.0D", &Utc::now()).unwrap();
    /// let offset = Local.offset_from_utc_datetime(&version.timestamp().naive_utc()).fix();
    /// assert_eq!(offset, version.with_timezone(offset).timezone());
    /// ```
    pub fn with_timezone(&self, tz: FixedOffset) -> Self {
        Self {
            tz,
            ..self.clone()
        }
    }

    /// Returns a copy of this version that trims its trailing zero or empty version fields (and
    /// the separators between them) when formatted, and accepts versions with those fields omitted
    /// when parsing.
    ///
    /// ```
    /// use calver::Version;
    /// use chrono::Utc;
    ///
    /// let template = Version::new("YY.0M.MICRO-MODIFIER", &Utc::now())
    ///     .unwrap()
    ///     .with_trim_suffix(true);
    /// assert_eq!("23.05", template.parse("23.05.0").unwrap().to_string());
    /// assert_eq!("23.05-dev", template.parse("23.05.0-dev").unwrap().to_string());
    /// assert_eq!("23.05-dev", template.parse("23.05-dev").unwrap().to_string());
    /// ```
    pub fn with_trim_suffix(&self, enable: bool) -> Self {
        Self {
            trim_suffix: enable,
            ..self.clone()
        }
    }

    /// The `MAJOR` value.
    pub fn major(&self) -> u64 {
        self.major
    }

    /// The `MINOR` value.
    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// The `MICRO` value.
    pub fn micro(&self) -> u64 {
        self.micro
    }

    /// The `MODIFIER` text.
    pub fn modifier(&self) -> &str {
        &self.modifier
    }

    /// The point in time that calendar fields are rendered from.
    pub fn timestamp(&self) -> &DateTime<FixedOffset> {
        &self.ts
    }

    /// The timezone that calendar fields are rendered in.
    pub fn timezone(&self) -> FixedOffset {
        self.tz
    }

    /// Whether trailing zero or empty fields are trimmed.
    pub fn trim_suffix(&self) -> bool {
        self.trim_suffix
    }

    /// The compiled layout of this version.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The layout of this version as a string.
    pub fn layout_text(&self) -> String {
        self.layout.to_string()
    }

    /// Parses `value` with this version's layout and returns it as a new version. The timezone
    /// and trim setting are carried over from this version.
    ///
    /// Calendar fields absent from the layout default to January 1st, 2000, and the time of day
    /// is always midnight. If the layout has a week field, the date is the Monday of that ISO
    /// week, whatever month and day were parsed. A week past the last ISO week of the year, such
    /// as week 53 of 2021 rendered on January 1st, counts on into the following year.
    ///
    /// # Errors
    ///
    /// - Returns a [`VersionError::Parse`] if `value` doesn't match the layout.
    pub fn parse(&self, value: &str) -> Result<Self, VersionError> {
        let parsed = self
            .parse_tokens(value)
            .map_err(|source| VersionError::Parse {
                value: value.to_owned(),
                layout: self.layout.to_string(),
                source,
            })?;
        debug!(value, version = %parsed, "parsed version");
        Ok(parsed)
    }

    fn parse_tokens(&self, value: &str) -> Result<Self, ParseError> {
        let (base, suffix) = if self.trim_suffix {
            self.layout.split_suffix()
        } else {
            (self.layout.tokens(), &[][..])
        };
        // with a suffix to fall back on, base version fields and separators may be skipped
        let lenient = !suffix.is_empty();

        let mut fields = ParsedFields::default();
        let mut remaining = value;
        for token in base {
            match token {
                Token::Calendar(field) => {
                    let (digits, rest) = field.consume(remaining)?;
                    fields.set_calendar(*field, digits)?;
                    remaining = rest;
                }
                // the rest was trimmed: version fields keep their default
                _ if remaining.is_empty() && self.trim_suffix => {}
                _ => match token.consume(remaining) {
                    Ok((matched, rest)) => {
                        if let Token::Version(field) = token {
                            fields.set_version(*field, matched)?;
                        }
                        remaining = rest;
                    }
                    Err(_) if lenient => {}
                    Err(err) => return Err(err),
                },
            }
        }

        for token in suffix {
            if remaining.is_empty() {
                break;
            }
            let (matched, rest) = token.consume(remaining)?;
            if let Token::Version(field) = token {
                fields.set_version(*field, matched)?;
            }
            remaining = rest;
        }

        if !remaining.is_empty() {
            return Err(ParseError::TrailingInput {
                remaining: remaining.to_owned(),
            });
        }

        Ok(Self {
            ts: fields.timestamp(self.tz)?,
            major: fields.major,
            minor: fields.minor,
            micro: fields.micro,
            modifier: fields.modifier,
            tz: self.tz,
            layout: self.layout.clone(),
            trim_suffix: self.trim_suffix,
        })
    }

    /// Returns the next version at time `now`.
    ///
    /// - If a calendar field renders differently at `now`, the calendar fields are updated and
    ///   the modifier is cleared. When the layout starts with a calendar field, `MAJOR`, `MINOR`
    ///   and `MICRO` are also reset to zero.
    /// - Otherwise, if a modifier is set, it is cleared and nothing else changes.
    /// - Otherwise, the first of `MICRO`, `MINOR` or `MAJOR` present in the layout is bumped.
    ///
    /// # Errors
    ///
    /// - Returns a [`VersionError::TimeRegression`] if `now` is before this version's time.
    /// - Returns a [`VersionError::NoBumpableField`] if a number needs to be bumped but the layout
    ///   has none.
    pub fn next<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Self, VersionError> {
        let now = fixed(now);
        if now < self.ts {
            return Err(VersionError::TimeRegression {
                now,
                current: self.ts,
            });
        }

        let mut next = Self {
            ts: now,
            ..self.clone()
        };

        if next.to_string() != self.to_string() {
            if self.layout.starts_with_calendar() {
                next.major = 0;
                next.minor = 0;
                next.micro = 0;
            }
            next.modifier.clear();
            debug!(version = %next, "calendar changed");
            return Ok(next);
        }

        if !next.modifier.is_empty() {
            next.modifier.clear();
            debug!(version = %next, "modifier cleared");
            return Ok(next);
        }

        let level = [Level::Micro, Level::Minor, Level::Major]
            .into_iter()
            .find(|level| self.layout.contains(level.field()))
            .ok_or_else(|| VersionError::NoBumpableField {
                layout: self.layout.to_string(),
            })?;
        next.bump(level)
    }

    /// Returns a copy of this version with `level` incremented by one. Other fields, including
    /// lesser levels, are unchanged.
    ///
    /// # Errors
    ///
    /// - Returns a [`VersionError::FieldNotInLayout`] if `level` is not in the layout.
    pub fn bump(&self, level: Level) -> Result<Self, VersionError> {
        self.require(level.field())?;
        let mut next = self.clone();
        let value = match level {
            Level::Major => &mut next.major,
            Level::Minor => &mut next.minor,
            Level::Micro => &mut next.micro,
        };
        *value = value.saturating_add(1);
        Ok(next)
    }

    /// Shorthand for [`Version::bump`] with [`Level::Major`].
    pub fn bump_major(&self) -> Result<Self, VersionError> {
        self.bump(Level::Major)
    }

    /// Shorthand for [`Version::bump`] with [`Level::Minor`].
    pub fn bump_minor(&self) -> Result<Self, VersionError> {
        self.bump(Level::Minor)
    }

    /// Shorthand for [`Version::bump`] with [`Level::Micro`].
    pub fn bump_micro(&self) -> Result<Self, VersionError> {
        self.bump(Level::Micro)
    }

    /// Returns a copy of this version with its modifier replaced by `modifier`.
    ///
    /// # Errors
    ///
    /// - Returns a [`VersionError::FieldNotInLayout`] if the layout has no `MODIFIER`.
    pub fn with_modifier(&self, modifier: impl Into<String>) -> Result<Self, VersionError> {
        self.require(VersionField::Modifier)?;
        Ok(Self {
            modifier: modifier.into(),
            ..self.clone()
        })
    }

    fn require(&self, field: VersionField) -> Result<(), VersionError> {
        if self.layout.contains(field) {
            Ok(())
        } else {
            Err(VersionError::FieldNotInLayout {
                field: field.symbol(),
                layout: self.layout.to_string(),
            })
        }
    }

    /// Renders one token, or returns `None` if it's trimmed. `trimmable` is cleared by the first
    /// token that renders something significant.
    fn render_token<'a, Tz: TimeZone>(
        &self,
        token: &'a Token,
        local: &DateTime<Tz>,
        trimmable: &mut bool,
    ) -> Option<Cow<'a, str>> {
        match token {
            Token::Calendar(field) => {
                *trimmable = false;
                Some(Cow::Owned(field.render(local)))
            }
            Token::Version(field) => {
                let value = field.render(self.major, self.minor, self.micro, &self.modifier);
                if *trimmable && (value == "0" || value.is_empty()) {
                    None
                } else {
                    *trimmable = false;
                    Some(Cow::Owned(value))
                }
            }
            Token::Separator(text) if !*trimmable => Some(Cow::Borrowed(text.as_str())),
            Token::Separator(_) => None,
        }
    }
}

impl Display for Version {
    /// Renders the version string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = self.ts.with_timezone(&self.tz);
        let (base, suffix) = self.layout.split_suffix();

        // render right to left: the suffix run first, then the base with its own trim state
        let mut pieces = Vec::with_capacity(self.layout.tokens().len());
        for part in [suffix, base] {
            let mut trimmable = self.trim_suffix;
            pieces.extend(
                part.iter()
                    .rev()
                    .filter_map(|token| self.render_token(token, &local, &mut trimmable)),
            );
        }

        for piece in pieces.iter().rev() {
            f.write_str(piece)?;
        }
        Ok(())
    }
}

/// Values collected while walking a layout over a version string.
struct ParsedFields {
    year: i32,
    month: u32,
    week: u32,
    day: u32,
    major: u64,
    minor: u64,
    micro: u64,
    modifier: String,
}

impl Default for ParsedFields {
    fn default() -> Self {
        Self {
            year: PARSED_DEFAULT_YEAR,
            month: PARSED_DEFAULT_MONTH,
            week: 0,
            day: PARSED_DEFAULT_DAY,
            major: 0,
            minor: 0,
            micro: 0,
            modifier: String::new(),
        }
    }
}

impl ParsedFields {
    fn set_calendar(&mut self, field: CalendarField, digits: &str) -> Result<(), ParseError> {
        // calendar fields are at most 4 digits
        let value: u32 = digits.parse().map_err(|_| ParseError::ValueOutOfRange {
            token: field.symbol(),
            digits: digits.to_owned(),
        })?;
        match field.kind() {
            CalendarKind::Year => {
                self.year = match field {
                    CalendarField::FullYear => value as i32,
                    _ => value as i32 + PARSED_DEFAULT_YEAR,
                }
            }
            CalendarKind::Month => self.month = value,
            CalendarKind::Week => self.week = value,
            CalendarKind::Day => self.day = value,
        }
        Ok(())
    }

    fn set_version(&mut self, field: VersionField, text: &str) -> Result<(), ParseError> {
        let slot = match field {
            VersionField::Major => &mut self.major,
            VersionField::Minor => &mut self.minor,
            VersionField::Micro => &mut self.micro,
            VersionField::Modifier => {
                self.modifier = text.to_owned();
                return Ok(());
            }
        };
        *slot = text.parse().map_err(|_| ParseError::ValueOutOfRange {
            token: field.symbol(),
            digits: text.to_owned(),
        })?;
        Ok(())
    }

    fn timestamp(&self, tz: FixedOffset) -> Result<DateTime<FixedOffset>, ParseError> {
        let invalid_date = || ParseError::InvalidDate {
            year: self.year,
            month: self.month,
            day: self.day,
        };
        let date = if self.week > 0 {
            // weeks past the last one of the year roll over into the next
            NaiveDate::from_isoywd_opt(self.year, 1, Weekday::Mon)
                .and_then(|monday| {
                    monday.checked_add_signed(Duration::weeks(i64::from(self.week) - 1))
                })
                .ok_or(ParseError::InvalidWeek {
                    year: self.year,
                    week: self.week,
                })?
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(invalid_date)?
        };
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid_date)?;
        tz.from_local_datetime(&midnight)
            .single()
            .ok_or_else(invalid_date)
    }
}
