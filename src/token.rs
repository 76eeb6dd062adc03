use crate::error::ParseError;
use chrono::Datelike;
use core::fmt::{self, Display};

/// The kind of calendar value a [`CalendarField`] selects. A layout may name each kind at most
/// once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CalendarKind {
    Year,
    Month,
    Week,
    Day,
}

impl CalendarKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            CalendarKind::Year => "year",
            CalendarKind::Month => "month",
            CalendarKind::Week => "week",
            CalendarKind::Day => "day",
        }
    }
}

/// How many digits a calendar field occupies in a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Width {
    /// One or two digits, no leading zero.
    Unpadded,
    /// Exactly this many digits.
    Fixed(usize),
}

/// A field whose value is derived from a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarField {
    /// `YYYY`: full year, e.g. `2006`.
    FullYear,
    /// `YY`: year without century and without padding, e.g. `6`, `16`.
    ShortYear,
    /// `0Y`: year without century, zero-padded, e.g. `06`, `16`.
    ZeroPaddedYear,
    /// `MM`: month, `1`–`12`.
    ShortMonth,
    /// `0M`: zero-padded month, `01`–`12`.
    ZeroPaddedMonth,
    /// `WW`: ISO 8601 week of the year, `1`–`53`.
    ShortWeek,
    /// `0W`: zero-padded ISO 8601 week of the year, `01`–`53`.
    ZeroPaddedWeek,
    /// `DD`: day of the month, `1`–`31`.
    ShortDay,
    /// `0D`: zero-padded day of the month, `01`–`31`.
    ZeroPaddedDay,
}

impl CalendarField {
    /// The literal form of this field in a layout string.
    pub fn symbol(&self) -> &'static str {
        use CalendarField::*;
        match self {
            FullYear => "YYYY",
            ShortYear => "YY",
            ZeroPaddedYear => "0Y",
            ShortMonth => "MM",
            ZeroPaddedMonth => "0M",
            ShortWeek => "WW",
            ZeroPaddedWeek => "0W",
            ShortDay => "DD",
            ZeroPaddedDay => "0D",
        }
    }

    pub(crate) fn kind(&self) -> CalendarKind {
        use CalendarField::*;
        match self {
            FullYear | ShortYear | ZeroPaddedYear => CalendarKind::Year,
            ShortMonth | ZeroPaddedMonth => CalendarKind::Month,
            ShortWeek | ZeroPaddedWeek => CalendarKind::Week,
            ShortDay | ZeroPaddedDay => CalendarKind::Day,
        }
    }

    fn width(&self) -> Width {
        // two-character symbols that don't start with `0` are the unpadded ones
        let symbol = self.symbol();
        if symbol.len() == 2 && !symbol.starts_with('0') {
            Width::Unpadded
        } else {
            Width::Fixed(symbol.len())
        }
    }

    /// Renders this field's value for `date`.
    pub fn render(&self, date: &impl Datelike) -> String {
        use CalendarField::*;
        match self {
            FullYear => format!("{:04}", date.year()),
            ShortYear => date.year().rem_euclid(100).to_string(),
            ZeroPaddedYear => format!("{:02}", date.year().rem_euclid(100)),
            ShortMonth => date.month().to_string(),
            ZeroPaddedMonth => format!("{:02}", date.month()),
            ShortWeek => date.iso_week().week().to_string(),
            ZeroPaddedWeek => format!("{:02}", date.iso_week().week()),
            ShortDay => date.day().to_string(),
            ZeroPaddedDay => format!("{:02}", date.day()),
        }
    }

    /// Splits the digits of this field off the front of `input`, returning `(digits, rest)`.
    pub(crate) fn consume<'a>(&self, input: &'a str) -> Result<(&'a str, &'a str), ParseError> {
        let len = match self.width() {
            Width::Unpadded => match input.as_bytes().first() {
                Some(b'1'..=b'9') => leading_digits(input, 2),
                _ => 0,
            },
            Width::Fixed(width) => {
                let len = leading_digits(input, width);
                if len == width {
                    len
                } else {
                    0
                }
            }
        };
        if len == 0 {
            return Err(mismatch(self.symbol(), input));
        }
        Ok(input.split_at(len))
    }
}

/// A field whose value is part of the version itself rather than the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionField {
    /// `MAJOR`
    Major,
    /// `MINOR`
    Minor,
    /// `MICRO`
    Micro,
    /// `MODIFIER`: free text, such as `-dev`. Always consumes the rest of a version string.
    Modifier,
}

impl VersionField {
    /// The literal form of this field in a layout string.
    pub fn symbol(&self) -> &'static str {
        match self {
            VersionField::Major => "MAJOR",
            VersionField::Minor => "MINOR",
            VersionField::Micro => "MICRO",
            VersionField::Modifier => "MODIFIER",
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            VersionField::Major => "major",
            VersionField::Minor => "minor",
            VersionField::Micro => "micro",
            VersionField::Modifier => "modifier",
        }
    }

    /// Renders this field's value out of the given version values.
    pub fn render(&self, major: u64, minor: u64, micro: u64, modifier: &str) -> String {
        match self {
            VersionField::Major => major.to_string(),
            VersionField::Minor => minor.to_string(),
            VersionField::Micro => micro.to_string(),
            VersionField::Modifier => modifier.to_owned(),
        }
    }

    /// Splits this field's text off the front of `input`, returning `(text, rest)`.
    ///
    /// Numeric fields are greedy: they take every leading digit, so two numeric fields with no
    /// separator between them can't both be parsed.
    pub(crate) fn consume<'a>(&self, input: &'a str) -> Result<(&'a str, &'a str), ParseError> {
        if *self == VersionField::Modifier {
            return Ok((input, ""));
        }
        match leading_digits(input, usize::MAX) {
            0 => Err(mismatch(self.symbol(), input)),
            len => Ok(input.split_at(len)),
        }
    }
}

/// One unit of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A field rendered from the date.
    Calendar(CalendarField),
    /// A field rendered from the version values.
    Version(VersionField),
    /// Literal text that must match exactly.
    Separator(String),
}

impl Token {
    /// The text of this token in a layout string.
    pub fn symbol(&self) -> &str {
        match self {
            Token::Calendar(field) => field.symbol(),
            Token::Version(field) => field.symbol(),
            Token::Separator(text) => text,
        }
    }

    /// Splits the part of `input` that this token matches off its front, returning
    /// `(matched, rest)`.
    pub(crate) fn consume<'a>(&self, input: &'a str) -> Result<(&'a str, &'a str), ParseError> {
        match self {
            Token::Calendar(field) => field.consume(input),
            Token::Version(field) => field.consume(input),
            Token::Separator(text) => match input.strip_prefix(text.as_str()) {
                Some(rest) => Ok((&input[..text.len()], rest)),
                None => Err(mismatch(text, input)),
            },
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Every symbol the tokenizer recognizes. Anything else in a layout is a separator.
pub(crate) static BUILTINS: [Token; 13] = [
    Token::Calendar(CalendarField::FullYear),
    Token::Calendar(CalendarField::ShortYear),
    Token::Calendar(CalendarField::ZeroPaddedYear),
    Token::Calendar(CalendarField::ShortMonth),
    Token::Calendar(CalendarField::ZeroPaddedMonth),
    Token::Calendar(CalendarField::ShortWeek),
    Token::Calendar(CalendarField::ZeroPaddedWeek),
    Token::Calendar(CalendarField::ShortDay),
    Token::Calendar(CalendarField::ZeroPaddedDay),
    Token::Version(VersionField::Major),
    Token::Version(VersionField::Minor),
    Token::Version(VersionField::Micro),
    Token::Version(VersionField::Modifier),
];

/// Number of ASCII digits at the start of `input`, up to `max`.
fn leading_digits(input: &str, max: usize) -> usize {
    input
        .bytes()
        .take(max)
        .take_while(u8::is_ascii_digit)
        .count()
}

fn mismatch(token: &str, remaining: &str) -> ParseError {
    ParseError::TokenMismatch {
        token: token.to_owned(),
        remaining: remaining.to_owned(),
    }
}
