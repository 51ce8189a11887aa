use crate::language::{
    span::Span,
    token::{Token, TokenKind},
};
use nom::{
    IResult, Parser as NomParser,
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit1},
    combinator::{map, recognize, value},
    multi::many0_count,
    sequence::{delimited, pair},
};

/// Splits `source` into tokens. Never fails: characters that start no token
/// come back as [`TokenKind::Illegal`] and are reported by the parser.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut remaining = source;

    loop {
        let trimmed = remaining.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let offset = source.len() - trimmed.len();
        match lex_token(trimmed) {
            Ok((rest, kind)) => {
                let consumed = trimmed.len() - rest.len();
                tokens.push(Token {
                    kind,
                    span: Span::new(offset, offset + consumed),
                });
                remaining = rest;
            }
            // `anychar` only rejects empty input, which was handled above.
            Err(_) => break,
        }
    }

    tokens
}

fn lex_token(input: &str) -> IResult<&str, TokenKind> {
    alt((
        lex_operator,
        lex_delimiter,
        lex_string,
        lex_integer,
        lex_word,
        lex_illegal,
    ))
    .parse(input)
}

fn lex_operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::EqEq, tag("==")),
        value(TokenKind::BangEq, tag("!=")),
        value(TokenKind::Assign, tag("=")),
        value(TokenKind::Bang, tag("!")),
        value(TokenKind::Plus, tag("+")),
        value(TokenKind::Minus, tag("-")),
        value(TokenKind::Star, tag("*")),
        value(TokenKind::Slash, tag("/")),
        value(TokenKind::Lt, tag("<")),
        value(TokenKind::Gt, tag(">")),
    ))
    .parse(input)
}

fn lex_delimiter(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Comma, tag(",")),
        value(TokenKind::Semi, tag(";")),
        value(TokenKind::LParen, tag("(")),
        value(TokenKind::RParen, tag(")")),
        value(TokenKind::LBrace, tag("{")),
        value(TokenKind::RBrace, tag("}")),
        value(TokenKind::LBracket, tag("[")),
        value(TokenKind::RBracket, tag("]")),
    ))
    .parse(input)
}

fn lex_string(input: &str) -> IResult<&str, TokenKind> {
    map(
        delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
        |text: &str| TokenKind::String(text.to_string()),
    )
    .parse(input)
}

fn lex_integer(input: &str) -> IResult<&str, TokenKind> {
    map(digit1, |digits: &str| TokenKind::Integer(digits.to_string())).parse(input)
}

fn lex_word(input: &str) -> IResult<&str, TokenKind> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        |word: &str| {
            TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Identifier(word.to_string()))
        },
    )
    .parse(input)
}

fn lex_illegal(input: &str) -> IResult<&str, TokenKind> {
    map(anychar, TokenKind::Illegal).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn lexes_let_statement_with_spans() {
        let tokens = tokenize("let five = 5;");
        let spans: Vec<_> = tokens.iter().map(|t| (t.span.start, t.span.end)).collect();
        assert_eq!(spans, vec![(0, 3), (4, 8), (9, 10), (11, 12), (12, 13)]);
        assert_eq!(
            kinds("let five = 5;"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier("five".into()),
                TokenKind::Assign,
                TokenKind::Integer("5".into()),
                TokenKind::Semi,
            ]
        );
    }

    #[test]
    fn two_character_operators_win_over_prefixes() {
        assert_eq!(
            kinds("a == b != !c = d"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::EqEq,
                TokenKind::Identifier("b".into()),
                TokenKind::BangEq,
                TokenKind::Bang,
                TokenKind::Identifier("c".into()),
                TokenKind::Assign,
                TokenKind::Identifier("d".into()),
            ]
        );
    }

    #[test]
    fn keywords_strings_and_brackets() {
        assert_eq!(
            kinds("fn(x_1) { if (true) { return \"hi there\" } else { [false] } }"),
            vec![
                TokenKind::Fn,
                TokenKind::LParen,
                TokenKind::Identifier("x_1".into()),
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::If,
                TokenKind::LParen,
                TokenKind::True,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::String("hi there".into()),
                TokenKind::RBrace,
                TokenKind::Else,
                TokenKind::LBrace,
                TokenKind::LBracket,
                TokenKind::False,
                TokenKind::RBracket,
                TokenKind::RBrace,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn identifiers_may_start_with_a_keyword() {
        assert_eq!(
            kinds("letter fnord"),
            vec![
                TokenKind::Identifier("letter".into()),
                TokenKind::Identifier("fnord".into()),
            ]
        );
    }

    #[test]
    fn unknown_characters_and_open_strings_become_illegal() {
        assert_eq!(
            kinds("1 @ \"open"),
            vec![
                TokenKind::Integer("1".into()),
                TokenKind::Illegal('@'),
                TokenKind::Illegal('"'),
                TokenKind::Identifier("open".into()),
            ]
        );
    }
}
