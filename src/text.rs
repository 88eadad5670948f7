//! Offset bookkeeping and a small delimiter-aware scanner shared by the rules.
//!
//! The scanner is not a tokenizer: it only knows enough about the language to
//! skip `//` and `/* */` comments and `'`, `"` and `` ` `` string literals, so
//! that brackets and identifiers inside them are not mistaken for code.

use std::collections::HashMap;
use std::ops::Range;

/// 1-based line of `offset`: the number of `\n` strictly before it, plus one.
pub fn line_number(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

/// 1-based column of `offset`, counted in characters from the start of its line.
pub fn column_number(text: &str, offset: usize) -> usize {
    let (start, _) = line_bounds(text, offset);
    text.get(start..offset)
        .map_or(1, |prefix| prefix.chars().count() + 1)
}

/// Byte range `(start, end)` of the line containing `offset`, without the `\n`.
pub fn line_bounds(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let bytes = text.as_bytes();
    let start = bytes[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |p| p + 1);
    let end = bytes[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(text.len(), |p| offset + p);
    (start, end)
}

/// The first line after the one containing `offset` that is not blank.
pub fn next_non_blank_line(text: &str, offset: usize) -> Option<&str> {
    let (_, end) = line_bounds(text, offset);
    text.get(end..)?
        .lines()
        .skip(1)
        .map(str::trim)
        .find(|l| !l.is_empty())
}

pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// True when `word` occurs in `haystack` delimited by non-identifier bytes.
pub fn contains_word(haystack: &str, word: &str) -> bool {
    let bytes = haystack.as_bytes();
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(word) {
        let start = from + pos;
        let end = start + word.len();
        let before_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            return true;
        }
        from = start + 1;
        while !haystack.is_char_boundary(from) {
            from += 1;
        }
    }
    false
}

/// What the scanner considers a stretch of text to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Code,
    Comment,
    /// A string or template literal, delimiters included.
    Literal,
    /// A literal with no closing delimiter before end of line (or end of text
    /// for template literals).
    UnterminatedLiteral,
}

/// Split `text` into consecutive regions, calling `on` for each in order.
///
/// Quote and apostrophe strings end at a newline; template literals may span
/// lines.
pub fn regions(text: &str, mut on: impl FnMut(Range<usize>, Region)) {
    let bytes = text.as_bytes();
    let mut code_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let (end, region) = match b {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = text[i..].find('\n').map_or(bytes.len(), |p| i + p);
                (end, Region::Comment)
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = text[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |p| i + 2 + p + 2);
                (end, Region::Comment)
            }
            b'"' | b'\'' | b'`' => {
                let mut j = i + 1;
                let mut closed = false;
                while j < bytes.len() {
                    match bytes[j] {
                        b'\\' => j += 2,
                        b'\n' if b != b'`' => break,
                        c if c == b => {
                            closed = true;
                            j += 1;
                            break;
                        }
                        _ => j += 1,
                    }
                }
                let region = if closed {
                    Region::Literal
                } else {
                    Region::UnterminatedLiteral
                };
                (j.min(bytes.len()), region)
            }
            _ => {
                i += 1;
                continue;
            }
        };

        if code_start < i {
            on(code_start..i, Region::Code);
        }
        on(i..end, region);
        i = end;
        code_start = end;
    }

    if code_start < bytes.len() {
        on(code_start..bytes.len(), Region::Code);
    }
}

/// Walk `text`, calling `visit` with every byte offset that lies outside
/// comments and string literals.
///
/// Returns the offset of the first string literal left unterminated.
pub fn walk_code(text: &str, mut visit: impl FnMut(usize, u8)) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut unterminated = None;
    regions(text, |range, region| match region {
        Region::Code => {
            for i in range {
                visit(i, bytes[i]);
            }
        }
        Region::UnterminatedLiteral => {
            if unterminated.is_none() {
                unterminated = Some(range.start);
            }
        }
        Region::Comment | Region::Literal => {}
    });
    unterminated
}

/// Outermost unmatched openers and the first unterminated string of a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub unclosed_brace: Option<usize>,
    pub unclosed_paren: Option<usize>,
    pub unclosed_string: Option<usize>,
}

/// Scan `text` for unbalanced `{`/`(` and unterminated strings.
///
/// Braces and parentheses are tracked independently; a stray closer with no
/// opener is ignored.
pub fn balance(text: &str) -> Balance {
    let mut braces: Vec<usize> = Vec::new();
    let mut parens: Vec<usize> = Vec::new();

    let unclosed_string = walk_code(text, |i, b| match b {
        b'{' => braces.push(i),
        b'}' => {
            braces.pop();
        }
        b'(' => parens.push(i),
        b')' => {
            parens.pop();
        }
        _ => {}
    });

    Balance {
        unclosed_brace: braces.first().copied(),
        unclosed_paren: parens.first().copied(),
        unclosed_string,
    }
}

/// Region layout of a text, computed once and queried by offset.
#[derive(Debug, Clone)]
pub struct CodeMap {
    regions: Vec<(Range<usize>, Region)>,
    closers: HashMap<usize, usize>,
    balance: Balance,
}

impl CodeMap {
    pub fn new(text: &str) -> Self {
        let mut layout = Vec::new();
        regions(text, |range, region| layout.push((range, region)));
        let closers = pair_brackets(text.as_bytes(), &layout);
        Self {
            regions: layout,
            closers,
            balance: balance(text),
        }
    }

    /// Offset of the delimiter closing the `{`, `(` or `[` at `open`, if any.
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        self.closers.get(&open).copied()
    }

    /// The regions overlapping `span`, clipped to it.
    pub fn regions_within(
        &self,
        span: Range<usize>,
    ) -> impl Iterator<Item = (Range<usize>, Region)> + '_ {
        let Range { start, end } = span;
        let first = self.regions.partition_point(|(r, _)| r.end <= start);
        self.regions[first..]
            .iter()
            .take_while(move |(r, _)| r.start < end)
            .map(move |(r, region)| (r.start.max(start)..r.end.min(end), *region))
    }

    /// The region containing the byte at `offset`.
    pub fn region_at(&self, offset: usize) -> Option<(Range<usize>, Region)> {
        let i = self.regions.partition_point(|(r, _)| r.end <= offset);
        self.regions
            .get(i)
            .filter(|(r, _)| r.contains(&offset))
            .cloned()
    }

    /// True when `offset` is code rather than part of a comment or string literal.
    pub fn in_code(&self, offset: usize) -> bool {
        matches!(self.region_at(offset), Some((_, Region::Code)))
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }
}

/// Pair every opener in code regions with its closer. Each bracket kind is
/// tracked on its own stack; a stray closer is ignored.
fn pair_brackets(bytes: &[u8], layout: &[(Range<usize>, Region)]) -> HashMap<usize, usize> {
    let mut closers = HashMap::new();
    let mut stacks: [Vec<usize>; 3] = Default::default();
    for (range, region) in layout {
        if *region != Region::Code {
            continue;
        }
        for i in range.clone() {
            let (kind, opens) = match bytes[i] {
                b'{' => (0, true),
                b'}' => (0, false),
                b'(' => (1, true),
                b')' => (1, false),
                b'[' => (2, true),
                b']' => (2, false),
                _ => continue,
            };
            if opens {
                stacks[kind].push(i);
            } else if let Some(open) = stacks[kind].pop() {
                closers.insert(open, i);
            }
        }
    }
    closers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_numbers_count_preceding_newlines() {
        let text = "a\nb\n\nc";
        assert_eq!(line_number(text, 0), 1);
        assert_eq!(line_number(text, 2), 2);
        assert_eq!(line_number(text, 5), 4);
        // offset sitting on a newline belongs to the line it terminates
        assert_eq!(line_number(text, 1), 1);
    }

    #[test]
    fn column_counts_chars_not_bytes() {
        let text = "x\n\u{e9}\u{e9}y";
        let y = text.find('y').unwrap();
        assert_eq!(column_number(text, y), 3);
        assert_eq!(column_number(text, 0), 1);
    }

    #[test]
    fn line_bounds_exclude_newline() {
        let text = "first\nsecond\nthird";
        let (s, e) = line_bounds(text, 8);
        assert_eq!(&text[s..e], "second");
        let (s, e) = line_bounds(text, text.len());
        assert_eq!(&text[s..e], "third");
    }

    #[test]
    fn next_non_blank_skips_empty_lines() {
        let text = "a = 1\n\n   \n  .then()\n";
        assert_eq!(next_non_blank_line(text, 0), Some(".then()"));
        assert_eq!(next_non_blank_line("only", 0), None);
    }

    #[test]
    fn contains_word_respects_identifier_edges() {
        assert!(contains_word("if (x) return y;", "return"));
        assert!(!contains_word("const returned = 1;", "return"));
        assert!(!contains_word("$return()", "return"));
        assert!(contains_word("return", "return"));
    }

    #[test]
    fn balance_of_clean_text_is_empty() {
        let b = balance("function f(a) { if (a) { return '}'; } }");
        assert_eq!(b, Balance::default());
    }

    #[test]
    fn balance_reports_outermost_unclosed_brace() {
        let text = "function f() {\n  if (x) {\n    y();\n";
        let b = balance(text);
        assert_eq!(b.unclosed_brace, Some(text.find('{').unwrap()));
        assert_eq!(b.unclosed_paren, None);
    }

    #[test]
    fn balance_ignores_comments_and_strings() {
        let text = "// (\n/* { */\nconst s = \"(\";\nconst t = `{\n`;";
        assert_eq!(balance(text), Balance::default());
    }

    #[test]
    fn unterminated_quote_string_stops_at_newline() {
        let text = "const a = 'oops;\nfoo();";
        let b = balance(text);
        assert_eq!(b.unclosed_string, Some(text.find('\'').unwrap()));
        assert_eq!(b.unclosed_paren, None);
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let b = balance(r#"const a = "say \"hi\"";"#);
        assert_eq!(b.unclosed_string, None);
    }

    #[test]
    fn matching_close_finds_partner() {
        let text = "f(a, g(b), \")\", [x]) { y }";
        let map = CodeMap::new(text);
        assert_eq!(map.matching_close(1), Some(text.find(") {").unwrap()));
        assert_eq!(map.matching_close(6), Some(8));
        assert_eq!(map.matching_close(text.find('[').unwrap()), Some(text.find(']').unwrap()));
        assert_eq!(map.matching_close(text.len() - 5), Some(text.len() - 1));
        assert_eq!(CodeMap::new("f(a").matching_close(1), None);
        assert_eq!(CodeMap::new("abc").matching_close(1), None);
    }

    #[test]
    fn regions_within_clips_to_span() {
        let text = "a('x') // c";
        let map = CodeMap::new(text);
        let seen: Vec<_> = map
            .regions_within(1..9)
            .map(|(range, region)| (&text[range], region))
            .collect();
        assert_eq!(
            seen,
            [
                ("(", Region::Code),
                ("'x'", Region::Literal),
                (") ", Region::Code),
                ("//", Region::Comment),
            ]
        );
    }

    #[test]
    fn regions_cover_text_in_order() {
        let text = "a = 'x'; // c\n`t`";
        let mut seen = Vec::new();
        regions(text, |range, region| seen.push((&text[range], region)));
        assert_eq!(
            seen,
            [
                ("a = ", Region::Code),
                ("'x'", Region::Literal),
                ("; ", Region::Code),
                ("// c", Region::Comment),
                ("\n", Region::Code),
                ("`t`", Region::Literal),
            ]
        );
    }

    #[test]
    fn region_at_reports_unterminated_literal() {
        let text = "x = \"abc\ny";
        let map = CodeMap::new(text);
        let (range, region) = map.region_at(6).unwrap();
        assert_eq!(region, Region::UnterminatedLiteral);
        assert_eq!(&text[range], "\"abc");
        assert_eq!(map.region_at(text.len() - 1).map(|r| r.1), Some(Region::Code));
        assert_eq!(map.region_at(text.len()), None);
    }

    #[test]
    fn in_code_distinguishes_strings_and_comments() {
        let text = "foo(); // bar()\n\"baz()\"";
        let map = CodeMap::new(text);
        assert!(map.in_code(0));
        assert!(map.in_code(text.find('\n').unwrap()));
        assert!(!map.in_code(text.find("bar").unwrap()));
        assert!(!map.in_code(text.find("baz").unwrap()));
        assert!(!map.in_code(text.len()));
    }
}
