//! Byte stream → token stream.
//!
//! Recognition is a fixed priority order: whitespace, line comments, string
//! literals, numeric literals, identifiers/keywords, two-character
//! operators (including the `/n` newline-escape sentinel), then
//! single-character operators and punctuation. See SPEC_FULL.md §4.1.

mod cursor;
mod token;

pub use cursor::Cursor;
pub use token::{Token, TokenKind, keyword_kind};

use crate::error::{LexError, Line};

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    while !cursor.is_at_end() {
        let line = Line(cursor.line());
        let c = cursor.peek();

        if c.is_ascii_whitespace() {
            cursor.advance();
            continue;
        }

        if c == b'/' && cursor.peek_at(1) == b'/' {
            while !cursor.is_at_end() && cursor.peek() != b'\n' {
                cursor.advance();
            }
            continue;
        }

        if c == b'"' {
            tokens.push(lex_string(&mut cursor, line)?);
            continue;
        }

        if c.is_ascii_digit() {
            tokens.push(lex_number(&mut cursor, line));
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            tokens.push(lex_word(&mut cursor, line));
            continue;
        }

        if let Some(tok) = lex_operator(&mut cursor, line)? {
            tokens.push(tok);
            continue;
        }

        cursor.advance();
        return Err(LexError::UnexpectedByte {
            byte: c as char,
            line,
        });
    }

    tokens.push(Token::new(TokenKind::Eof, Line(cursor.line())));
    Ok(tokens)
}

fn lex_string(cursor: &mut Cursor<'_>, line: Line) -> Result<Token, LexError> {
    cursor.advance(); // opening quote
    let mut out = String::new();
    loop {
        if cursor.is_at_end() {
            return Err(LexError::UnterminatedString { line });
        }
        let c = cursor.peek();
        if c == b'"' {
            cursor.advance();
            break;
        }
        if c == b'\\' {
            cursor.advance();
            if cursor.is_at_end() {
                return Err(LexError::UnterminatedString { line });
            }
            let esc = cursor.advance();
            out.push(match esc {
                b'n' => '\n',
                b't' => '\t',
                b'\\' => '\\',
                b'"' => '"',
                other => other as char,
            });
            continue;
        }
        out.push(cursor.advance() as char);
    }
    Ok(Token::new(TokenKind::String(out), line))
}

fn lex_number(cursor: &mut Cursor<'_>, line: Line) -> Token {
    let start = cursor.pos();
    let mut is_decimal = false;
    while !cursor.is_at_end() {
        let c = cursor.peek();
        if c.is_ascii_digit() {
            cursor.advance();
        } else if c == b'.' {
            if cursor.peek_at(1) == b'.' {
                break; // range operator, stop before it
            }
            if is_decimal {
                break; // only one dot
            }
            is_decimal = true;
            cursor.advance();
        } else {
            break;
        }
    }
    let text = std::str::from_utf8(cursor.slice_from(start)).expect("ascii digits and '.'");
    if is_decimal {
        Token::new(TokenKind::Decimal(text.parse().unwrap_or(0.0)), line)
    } else {
        Token::new(TokenKind::Number(text.parse().unwrap_or(0)), line)
    }
}

fn lex_word(cursor: &mut Cursor<'_>, line: Line) -> Token {
    let start = cursor.pos();
    while !cursor.is_at_end() {
        let c = cursor.peek();
        if c.is_ascii_alphanumeric() || c == b'_' {
            cursor.advance();
        } else {
            break;
        }
    }
    let word = std::str::from_utf8(cursor.slice_from(start)).expect("ascii identifier");
    match word {
        "true" => Token::new(TokenKind::Number(1), line),
        "false" => Token::new(TokenKind::Number(0), line),
        _ => match keyword_kind(word) {
            Some(kind) => Token::new(kind, line),
            None => Token::new(TokenKind::Ident(word.to_string()), line),
        },
    }
}

fn lex_operator(cursor: &mut Cursor<'_>, line: Line) -> Result<Option<Token>, LexError> {
    let c = cursor.peek();
    let two = |cursor: &Cursor<'_>| cursor.peek_at(1);

    let kind = match c {
        b'=' if two(cursor) == b'=' => {
            cursor.advance();
            cursor.advance();
            TokenKind::EqEq
        }
        b'=' if two(cursor) == b'>' => {
            cursor.advance();
            cursor.advance();
            TokenKind::FatArrow
        }
        b'!' if two(cursor) == b'=' => {
            cursor.advance();
            cursor.advance();
            TokenKind::NotEq
        }
        b'<' if two(cursor) == b'=' => {
            cursor.advance();
            cursor.advance();
            TokenKind::LtEq
        }
        b'>' if two(cursor) == b'=' => {
            cursor.advance();
            cursor.advance();
            TokenKind::GtEq
        }
        b'.' if two(cursor) == b'.' => {
            cursor.advance();
            cursor.advance();
            TokenKind::DotDot
        }
        b'&' if two(cursor) == b'&' => {
            cursor.advance();
            cursor.advance();
            TokenKind::AndAnd
        }
        b'&' => return Err(LexError::DanglingAmpersand { line }),
        b'|' if two(cursor) == b'|' => {
            cursor.advance();
            cursor.advance();
            TokenKind::OrOr
        }
        b'|' => return Err(LexError::DanglingPipe { line }),
        b'/' if two(cursor) == b'n' => {
            cursor.advance();
            cursor.advance();
            TokenKind::NewlineEscape
        }
        b'/' => {
            cursor.advance();
            TokenKind::Slash
        }
        b'(' => {
            cursor.advance();
            TokenKind::LParen
        }
        b')' => {
            cursor.advance();
            TokenKind::RParen
        }
        b'{' => {
            cursor.advance();
            TokenKind::LBrace
        }
        b'}' => {
            cursor.advance();
            TokenKind::RBrace
        }
        b'[' => {
            cursor.advance();
            TokenKind::LBracket
        }
        b']' => {
            cursor.advance();
            TokenKind::RBracket
        }
        b',' => {
            cursor.advance();
            TokenKind::Comma
        }
        b';' => {
            cursor.advance();
            TokenKind::Semicolon
        }
        b'+' => {
            cursor.advance();
            TokenKind::Plus
        }
        b'-' => {
            cursor.advance();
            TokenKind::Minus
        }
        b'*' => {
            cursor.advance();
            TokenKind::Star
        }
        b'%' => {
            cursor.advance();
            TokenKind::Percent
        }
        b'<' => {
            cursor.advance();
            TokenKind::Lt
        }
        b'>' => {
            cursor.advance();
            TokenKind::Gt
        }
        b'=' => {
            cursor.advance();
            TokenKind::Eq
        }
        b'.' => {
            cursor.advance();
            TokenKind::Dot
        }
        b'!' => {
            cursor.advance();
            TokenKind::Bang
        }
        _ => return Ok(None),
    };
    Ok(Some(Token::new(kind, line)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn integer_and_decimal_literals_round_trip() {
        assert_eq!(kinds("42"), vec![TokenKind::Number(42), TokenKind::Eof]);
        assert_eq!(
            kinds("3.5"),
            vec![TokenKind::Decimal(3.5), TokenKind::Eof]
        );
    }

    #[test]
    fn range_operator_stops_number_scanning() {
        assert_eq!(
            kinds("1..10"),
            vec![
                TokenKind::Number(1),
                TokenKind::DotDot,
                TokenKind::Number(10),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escape_fidelity() {
        let toks = kinds(r#""a\nb\tc\\d\"e""#);
        assert_eq!(
            toks,
            vec![
                TokenKind::String("a\nb\tc\\d\"e".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unknown_escape_passes_through_literal_character() {
        let toks = kinds(r#""\q""#);
        assert_eq!(toks, vec![TokenKind::String("q".to_string()), TokenKind::Eof]);
    }

    #[test]
    fn true_false_become_integer_literals() {
        assert_eq!(
            kinds("true false"),
            vec![TokenKind::Number(1), TokenKind::Number(0), TokenKind::Eof]
        );
    }

    #[test]
    fn newline_escape_distinct_from_division() {
        assert_eq!(kinds("/n"), vec![TokenKind::NewlineEscape, TokenKind::Eof]);
        assert_eq!(
            kinds("a / b"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Slash,
                TokenKind::Ident("b".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn keywords_map_to_dedicated_variants() {
        assert_eq!(
            kinds("var struct match"),
            vec![TokenKind::Var, TokenKind::Struct, TokenKind::Match, TokenKind::Eof]
        );
    }

    #[test]
    fn dangling_ampersand_is_an_error() {
        assert!(matches!(tokenize("a & b"), Err(LexError::DanglingAmpersand { .. })));
    }

    #[test]
    fn line_comment_consumes_to_end_of_line() {
        assert_eq!(
            kinds("1 // two\n2"),
            vec![TokenKind::Number(1), TokenKind::Number(2), TokenKind::Eof]
        );
    }

    #[test]
    fn line_numbers_advance_on_newline() {
        let toks = tokenize("1\n2\n3").unwrap();
        let lines: Vec<u32> = toks.iter().map(|t| t.line.0).collect();
        assert_eq!(lines, vec![1, 2, 3, 3]);
    }
}
