//! Tokenizer for TeX math markup.
//!
//! Whitespace and `%` comments are dropped. Every token keeps its byte offset
//! so raw arguments (`\text{...}`, `\begin{...}`) can be sliced back out of
//! the source.

use texspeak_core::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A single non-digit character: letter, operator, fence, punctuation.
    Char(char),
    /// A run of decimal digits, optionally with one decimal point.
    Number(String),
    /// `\name` or a control symbol such as `\,` or `\{`.
    Command(String),
    Open,
    Close,
    Sup,
    Sub,
    Amp,
    Prime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let kind = match c {
            c if c.is_whitespace() => continue,
            '%' => {
                while let Some((_, c)) = chars.peek() {
                    if *c == '\n' {
                        break;
                    }
                    chars.next();
                }
                continue;
            }
            '{' => TokenKind::Open,
            '}' => TokenKind::Close,
            '^' => TokenKind::Sup,
            '_' => TokenKind::Sub,
            '&' => TokenKind::Amp,
            '\'' => TokenKind::Prime,
            '\\' => {
                let mut name = String::new();
                while let Some((_, c)) = chars.peek() {
                    if c.is_ascii_alphabetic() {
                        name.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    match chars.next() {
                        Some((_, c)) => name.push(c),
                        None => {
                            return Err(ParseError::Misplaced {
                                token: "\\".to_string(),
                                offset,
                            })
                        }
                    }
                }
                TokenKind::Command(name)
            }
            '0'..='9' => {
                let mut digits = String::from(c);
                let mut seen_point = false;
                while let Some((_, next)) = chars.peek().copied() {
                    if next.is_ascii_digit() {
                        digits.push(next);
                        chars.next();
                    } else if next == '.' && !seen_point && followed_by_digit(src, offset, &digits) {
                        seen_point = true;
                        digits.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                TokenKind::Number(digits)
            }
            '#' | '$' => {
                return Err(ParseError::Misplaced {
                    token: c.to_string(),
                    offset,
                })
            }
            other => TokenKind::Char(other),
        };
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

/// True when the character after the `.` that follows `digits` is a digit.
fn followed_by_digit(src: &str, start: usize, digits: &str) -> bool {
    src[start + digits.len()..]
        .chars()
        .nth(1)
        .is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn splits_commands_and_numbers() {
        assert_eq!(
            kinds(r"\frac{12}{3.5}"),
            vec![
                TokenKind::Command("frac".into()),
                TokenKind::Open,
                TokenKind::Number("12".into()),
                TokenKind::Close,
                TokenKind::Open,
                TokenKind::Number("3.5".into()),
                TokenKind::Close,
            ]
        );
    }

    #[test]
    fn trailing_point_is_not_part_of_number() {
        assert_eq!(
            kinds("2."),
            vec![TokenKind::Number("2".into()), TokenKind::Char('.')]
        );
    }

    #[test]
    fn control_symbols_and_comments() {
        assert_eq!(
            kinds("a\\,b % ignored\n c"),
            vec![
                TokenKind::Char('a'),
                TokenKind::Command(",".into()),
                TokenKind::Char('b'),
                TokenKind::Char('c'),
            ]
        );
    }

    #[test]
    fn dollar_is_rejected() {
        assert!(matches!(
            tokenize("$x$"),
            Err(ParseError::Misplaced { offset: 0, .. })
        ));
    }
}
