use crate::{
    error::LayoutError,
    token::{Token, VersionField, BUILTINS},
};
use core::{
    fmt::{self, Display},
    str::FromStr,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// A Layout describes the structure of a version: an ordered sequence of calendar fields, version
/// fields and literal separators.
///
/// A layout is compiled once and is immutable afterwards. Cloning it is cheap, as every clone
/// shares the same token sequence.
///
/// # Symbols
///
/// | Symbol | Example | Description |
/// |---|---|---|
/// | `YYYY` | `2006` | Full year |
/// | `YY` | `6` | Year without century |
/// | `0Y` | `06` | Zero-padded year without century |
/// | `MM` | `1` | Month |
/// | `0M` | `01` | Zero-padded month |
/// | `WW` | `1` | ISO 8601 week |
/// | `0W` | `01` | Zero-padded ISO 8601 week |
/// | `DD` | `1` | Day of the month |
/// | `0D` | `01` | Zero-padded day of the month |
/// | `MAJOR` | `1` | Major version |
/// | `MINOR` | `2` | Minor version |
/// | `MICRO` | `3` | Micro version |
/// | `MODIFIER` | `-dev` | Free text; takes the rest of the version string when parsing |
///
/// Any other text is a literal separator.
///
/// # Example
///
/// ```
/// use calver::Layout;
///
/// let layout = Layout::parse("YYYY.0M.MICRO").unwrap();
/// assert_eq!("YYYY.0M.MICRO", layout.to_string());
/// assert_eq!(5, layout.tokens().len());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    tokens: Arc<[Token]>,
}

impl Layout {
    /// Compiles a layout string.
    ///
    /// # Errors
    ///
    /// - Returns [`LayoutError::DuplicateField`] if a field kind is named more than once, like two
    ///   years (`YYYY.YY`) or two micros (`MICRO.MICRO`).
    pub fn parse(layout_str: &str) -> Result<Self, LayoutError> {
        let tokens = tokenize(layout_str);
        check_unique(&tokens)?;
        debug!(layout = layout_str, tokens = tokens.len(), "compiled layout");
        Ok(Self {
            tokens: tokens.into(),
        })
    }

    /// The compiled tokens, in layout order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Returns true if the layout contains the version field `field`.
    pub fn contains(&self, field: VersionField) -> bool {
        self.tokens
            .iter()
            .any(|token| matches!(token, Token::Version(f) if *f == field))
    }

    /// Returns true if the first token of the layout is a calendar field.
    pub fn starts_with_calendar(&self) -> bool {
        matches!(self.tokens.first(), Some(Token::Calendar(_)))
    }

    /// Splits the tokens into a base and a trailing suffix run. The suffix is the longest run of
    /// separators and `MODIFIER` at the end of the layout; these are the tokens that may be
    /// elided entirely when trimming.
    pub(crate) fn split_suffix(&self) -> (&[Token], &[Token]) {
        let base_len = self
            .tokens
            .iter()
            .rposition(|token| {
                !matches!(
                    token,
                    Token::Separator(_) | Token::Version(VersionField::Modifier)
                )
            })
            .map_or(0, |index| index + 1);
        self.tokens.split_at(base_len)
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Layout {
    /// Display a layout as its layout string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in self.tokens.iter() {
            f.write_str(token.symbol())?;
        }
        Ok(())
    }
}

/// The builtin whose symbol is exactly `text`, if any.
fn builtin(text: &str) -> Option<&'static Token> {
    if text.is_empty() {
        return None;
    }
    BUILTINS.iter().find(|token| token.symbol() == text)
}

/// Splits a layout string into tokens with a greedy longest match over the builtin symbols.
///
/// A window of characters `[pos, idx]` grows one character at a time until it can't be the
/// prefix of any builtin. If the window minus its last character was a builtin, that builtin is
/// emitted and the scan steps back one character, so the current character starts the next
/// window. This is the only place the scan moves backwards.
fn tokenize(layout_str: &str) -> Vec<Token> {
    // byte offset of every char, plus the end, so windows can be sliced by char index
    let bounds: Vec<usize> = layout_str
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(layout_str.len()))
        .collect();
    let size = bounds.len() - 1;

    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut idx = 0;
    while idx < size {
        let window = &layout_str[bounds[pos]..bounds[idx + 1]];
        let shorter = &layout_str[bounds[pos]..bounds[idx]];
        let prefix_matches = BUILTINS
            .iter()
            .filter(|token| token.symbol().starts_with(window))
            .count();
        let exact = builtin(window);
        let prev_exact = builtin(shorter);
        let at_end = idx + 1 == size;

        match (prefix_matches, exact, prev_exact) {
            (1, Some(token), _) => {
                trace!(symbol = token.symbol(), "unique builtin");
                tokens.push(token.clone());
                pos = idx + 1;
            }
            (0, _, Some(token)) => {
                trace!(symbol = token.symbol(), "builtin, stepping back");
                tokens.push(token.clone());
                pos = idx;
                continue;
            }
            (0, _, None) => {
                trace!(separator = window, "separator");
                tokens.push(Token::Separator(window.to_owned()));
                pos = idx + 1;
            }
            (_, Some(token), _) if at_end => {
                tokens.push(token.clone());
            }
            (_, None, Some(token)) if at_end => {
                tokens.push(token.clone());
                pos = idx;
                continue;
            }
            (_, None, None) if at_end => {
                tokens.push(Token::Separator(window.to_owned()));
            }
            // still the prefix of several builtins: keep growing the window
            _ => {}
        }
        idx += 1;
    }
    tokens
}

/// The field kind and symbol of a token that may appear at most once in a layout.
fn unique_field(token: &Token) -> Option<(&'static str, &'static str)> {
    match token {
        Token::Calendar(field) => Some((field.kind().name(), field.symbol())),
        Token::Version(field) => Some((field.name(), field.symbol())),
        Token::Separator(_) => None,
    }
}

/// Checks that each calendar kind and each version field appears at most once.
fn check_unique(tokens: &[Token]) -> Result<(), LayoutError> {
    let mut seen: Vec<(&'static str, &'static str)> = Vec::with_capacity(tokens.len());
    for (field, second) in tokens.iter().filter_map(unique_field) {
        if let Some(&(_, first)) = seen.iter().find(|(seen_field, _)| *seen_field == field) {
            return Err(LayoutError::DuplicateField {
                field,
                first,
                second,
            });
        }
        seen.push((field, second));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{CalendarField::*, VersionField::*};
    use itertools::Itertools;
    use rstest::*;

    fn sep(text: &str) -> Token {
        Token::Separator(text.to_owned())
    }

    fn cal(field: crate::token::CalendarField) -> Token {
        Token::Calendar(field)
    }

    fn ver(field: VersionField) -> Token {
        Token::Version(field)
    }

    #[rstest]
    #[case("YY", vec![cal(ShortYear)])]
    #[case("YYYY", vec![cal(FullYear)])]
    #[case("vYY", vec![sep("v"), cal(ShortYear)])]
    #[case("YYv", vec![cal(ShortYear), sep("v")])]
    #[case("YY.0D", vec![cal(ShortYear), sep("."), cal(ZeroPaddedDay)])]
    #[case("YY0D", vec![cal(ShortYear), cal(ZeroPaddedDay)])]
    #[case(
        "YY.0D.MICRO",
        vec![cal(ShortYear), sep("."), cal(ZeroPaddedDay), sep("."), ver(Micro)]
    )]
    #[case(
        "YYYY.0M.MICRO",
        vec![cal(FullYear), sep("."), cal(ZeroPaddedMonth), sep("."), ver(Micro)]
    )]
    #[case("YYY", vec![cal(ShortYear), sep("Y")])]
    #[case("MMDD", vec![cal(ShortMonth), cal(ShortDay)])]
    #[case(
        "MAJOR.MINOR.MICROMODIFIER",
        vec![ver(Major), sep("."), ver(Minor), sep("."), ver(Micro), ver(Modifier)]
    )]
    #[case("M", vec![sep("M")])]
    #[case("MI", vec![sep("MI")])]
    #[case("..", vec![sep("."), sep(".")])]
    #[case("", vec![])]
    #[case("ü0W", vec![sep("ü"), cal(ZeroPaddedWeek)])]
    fn test_tokenize(#[case] layout_str: &str, #[case] expected: Vec<Token>) {
        let layout = Layout::parse(layout_str).unwrap();
        assert_eq!(expected, layout.tokens());
    }

    #[rstest]
    #[case("YYYY.YY.MICRO", "year", "YYYY", "YY")]
    #[case("0Y.YYYY", "year", "0Y", "YYYY")]
    #[case("YYYY.MM.0M", "month", "MM", "0M")]
    #[case("YYYY.WW.0W", "week", "WW", "0W")]
    #[case("YYYY.DD.DD", "day", "DD", "DD")]
    #[case("MAJOR.MAJOR", "major", "MAJOR", "MAJOR")]
    #[case("MINOR.MINOR", "minor", "MINOR", "MINOR")]
    #[case("YY.MICRO.MICRO", "micro", "MICRO", "MICRO")]
    #[case("MODIFIER-MODIFIER", "modifier", "MODIFIER", "MODIFIER")]
    fn test_duplicate_field(
        #[case] layout_str: &str,
        #[case] field: &'static str,
        #[case] first: &'static str,
        #[case] second: &'static str,
    ) {
        assert_eq!(
            Err(LayoutError::DuplicateField {
                field,
                first,
                second
            }),
            Layout::parse(layout_str)
        );
    }

    #[test]
    fn test_distinct_fields_ok() {
        let layouts = [
            "MAJOR.MINOR.MICRO",
            "YYYY.0M.0D",
            "YY.0W.MICRO-MODIFIER",
            "YYYY.0M.0W.0D",
        ];
        for layout_str in layouts {
            assert!(Layout::parse(layout_str).is_ok());
        }
    }

    /// Every character of a layout ends up in exactly one token, so joining the symbols gives the
    /// layout string back.
    #[test]
    fn test_symbols_rejoin() {
        let parts = ["YYYY", "YY", "0M", "W", "D", ".", "-", "MICRO", "MA", "0", "x"];
        for combo in parts.iter().combinations_with_replacement(3) {
            for perm in combo.into_iter().permutations(3) {
                let layout_str: String = perm.into_iter().copied().collect();
                let tokens = tokenize(&layout_str);
                let rejoined: String = tokens.iter().map(Token::symbol).collect();
                assert_eq!(layout_str, rejoined);
            }
        }
    }

    #[test]
    fn test_display_round_trip() {
        let layout_str = "v0Y.0M.0D-MAJOR.MINOR+MODIFIER";
        let layout: Layout = layout_str.parse().unwrap();
        assert_eq!(layout_str, layout.to_string());
    }

    #[test]
    fn test_contains() {
        let layout = Layout::parse("YY.0M.MICRO").unwrap();
        assert!(layout.contains(Micro));
        assert!(!layout.contains(Major));
        assert!(!layout.contains(Modifier));
    }

    #[rstest]
    #[case("YYYY.MICRO", true)]
    #[case("MICRO.YYYY", false)]
    #[case("v0Y.0M", false)]
    #[case("", false)]
    fn test_starts_with_calendar(#[case] layout_str: &str, #[case] expected: bool) {
        let layout = Layout::parse(layout_str).unwrap();
        assert_eq!(expected, layout.starts_with_calendar());
    }

    #[rstest]
    #[case("YY.0M.MICRO-MODIFIER", "YY.0M.MICRO", "-MODIFIER")]
    #[case("YY.0M.MICROMODIFIER", "YY.0M.MICRO", "MODIFIER")]
    #[case("YY.0M.MICRO", "YY.0M.MICRO", "")]
    #[case("YY.0M-MODIFIER", "YY.0M", "-MODIFIER")]
    #[case("MODIFIER", "", "MODIFIER")]
    fn test_split_suffix(#[case] layout_str: &str, #[case] base: &str, #[case] suffix: &str) {
        let layout = Layout::parse(layout_str).unwrap();
        let (actual_base, actual_suffix) = layout.split_suffix();
        let join = |tokens: &[Token]| tokens.iter().map(Token::symbol).collect::<String>();
        assert_eq!(base, join(actual_base));
        assert_eq!(suffix, join(actual_suffix));
    }

    #[test]
    fn test_clone_shares_tokens() {
        let layout = Layout::parse("YYYY.MICRO").unwrap();
        let clone = layout.clone();
        assert!(Arc::ptr_eq(&layout.tokens, &clone.tokens));
    }
}
