pub mod error;
pub mod token;

use error::LexerError;
use nom::Parser;
use nom::bytes::complete::take_till;
use nom::character::complete::{digit0, digit1, one_of};
use nom::combinator::opt;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while_m_n},
    character::complete::{alpha1, alphanumeric1, char, none_of},
    combinator::{map, map_opt, map_res, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};
use nom_locate::position;
use smol_str::SmolStr;
use token::{Token, TokenKind};

use crate::range::{Columns, Position, Range, Span};

macro_rules! define_token_parser {
    ($name:ident, $tag:expr, $kind:expr) => {
        fn $name(input: Span) -> IResult<Span, Token> {
            map(tag($tag), |span: Span| Token {
                range: offsets(span),
                kind: $kind,
            })
            .parse(input)
        }
    };
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Keep `#` comments in the token stream instead of dropping them.
    pub include_comments: bool,
}

pub struct Lexer {
    options: Options,
}

impl Lexer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexerError> {
        match tokens(Span::new(input)) {
            Ok((span, tokens)) if span.fragment().is_empty() => {
                let eof = Token {
                    range: offsets(span),
                    kind: TokenKind::Eof,
                };
                let mut tokens = self.join_lines(tokens, eof);
                resolve_columns(input, &mut tokens);
                Ok(tokens)
            }
            Ok((span, _)) => Err(Self::unexpected(span)),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(Self::unexpected(e.input)),
            Err(nom::Err::Incomplete(_)) => Err(LexerError::UnexpectedEOFDetected(Range::default())),
        }
    }

    /// Drops newlines inside brackets (implicit line joining) and collapses runs of newlines.
    fn join_lines(&self, tokens: Vec<Token>, eof: Token) -> Vec<Token> {
        let mut depth = 0usize;
        let mut joined: Vec<Token> = Vec::with_capacity(tokens.len() + 1);

        for token in tokens {
            match &token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Comment(_) if !self.options.include_comments => continue,
                TokenKind::NewLine if depth > 0 => continue,
                TokenKind::NewLine
                    if matches!(joined.last().map(|t| &t.kind), Some(TokenKind::NewLine)) =>
                {
                    continue;
                }
                _ => {}
            }
            joined.push(token);
        }

        joined.push(eof);
        joined
    }

    fn unexpected(span: Span) -> LexerError {
        let start: Position = span.into();
        let range = Range {
            start,
            end: Position::new(start.line, start.column + 1),
        };

        match span.fragment().chars().next() {
            Some('"') | Some('\'') => LexerError::UnterminatedString(range),
            Some(c) if c.is_ascii_digit() => {
                let digits: String = span.fragment().chars().take_while(|c| c.is_ascii_digit()).collect();
                LexerError::InvalidNumber(digits, range)
            }
            Some(c) => LexerError::UnexpectedCharacter(c, range),
            None => LexerError::UnexpectedEOFDetected(range),
        }
    }
}

/// Range of `span` holding byte offsets in place of columns, until [`resolve_columns`] runs.
fn offsets(span: Span) -> Range {
    let start = span.location_offset();
    Range {
        start: Position::new(span.location_line(), start),
        end: Position::new(span.location_line(), start + span.fragment().len()),
    }
}

fn resolve_columns(input: &str, tokens: &mut [Token]) {
    let mut columns = Columns::new(input);

    for token in tokens {
        let (start, end) = (token.range.start.column, token.range.end.column);
        token.range.start.column = columns.column(start);
        token.range.end.column =
            token.range.start.column + input.get(start..end).map_or(0, |s| s.chars().count());
    }
}

fn blank(input: Span) -> IResult<Span, Span> {
    recognize(many0(alt((
        value((), one_of(" \t\r\x0c")),
        value((), pair(char('\\'), char('\n'))),
        value((), pair(char('\\'), tag("\r\n"))),
    ))))
    .parse(input)
}

fn comment(input: Span) -> IResult<Span, Token> {
    map(preceded(char('#'), take_till(|c| c == '\n')), |span: Span| Token {
        range: offsets(span),
        kind: TokenKind::Comment(span.fragment().trim_end_matches('\r').to_string()),
    })
    .parse(input)
}

fn unicode(input: Span) -> IResult<Span, char> {
    map_opt(
        map_res(
            alt((
                preceded(char('u'), take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit())),
                preceded(char('x'), take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit())),
            )),
            |span: Span| u32::from_str_radix(span.fragment(), 16),
        ),
        char::from_u32,
    )
    .parse(input)
}

define_token_parser!(newline, "\n", TokenKind::NewLine);
define_token_parser!(comma, ",", TokenKind::Comma);
define_token_parser!(colon, ":", TokenKind::Colon);
define_token_parser!(dot, ".", TokenKind::Dot);
define_token_parser!(l_paren, "(", TokenKind::LParen);
define_token_parser!(r_paren, ")", TokenKind::RParen);
define_token_parser!(l_bracket, "[", TokenKind::LBracket);
define_token_parser!(r_bracket, "]", TokenKind::RBracket);
define_token_parser!(l_brace, "{", TokenKind::LBrace);
define_token_parser!(r_brace, "}", TokenKind::RBrace);
define_token_parser!(double_star, "**", TokenKind::DoubleStar);
define_token_parser!(star, "*", TokenKind::Star);
define_token_parser!(double_slash, "//", TokenKind::DoubleSlash);
define_token_parser!(slash, "/", TokenKind::Slash);
define_token_parser!(percent, "%", TokenKind::Percent);
define_token_parser!(plus, "+", TokenKind::Plus);
define_token_parser!(minus, "-", TokenKind::Minus);
define_token_parser!(eq_eq, "==", TokenKind::EqEq);
define_token_parser!(ne_eq, "!=", TokenKind::NeEq);
define_token_parser!(lte, "<=", TokenKind::Lte);
define_token_parser!(lt, "<", TokenKind::Lt);
define_token_parser!(gte, ">=", TokenKind::Gte);
define_token_parser!(gt, ">", TokenKind::Gt);
define_token_parser!(empty_double_string, "\"\"", TokenKind::StringLiteral(String::new()));
define_token_parser!(empty_single_string, "''", TokenKind::StringLiteral(String::new()));

fn punctuations(input: Span) -> IResult<Span, Token> {
    alt((
        l_paren, r_paren, l_bracket, r_bracket, l_brace, r_brace, comma, colon,
    ))
    .parse(input)
}

fn operators(input: Span) -> IResult<Span, Token> {
    alt((
        double_star,
        star,
        double_slash,
        slash,
        percent,
        plus,
        minus,
        eq_eq,
        ne_eq,
        lte,
        lt,
        gte,
        gt,
    ))
    .parse(input)
}

fn exponent(input: Span) -> IResult<Span, Span> {
    recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)
}

fn float_literal(input: Span) -> IResult<Span, Token> {
    map_res(
        alt((
            recognize((digit1, char('.'), digit0, opt(exponent))),
            recognize((char('.'), digit1, opt(exponent))),
            recognize((digit1, exponent)),
        )),
        |span: Span| {
            span.fragment().parse::<f64>().map(|n| Token {
                range: offsets(span),
                kind: TokenKind::FloatLiteral(n),
            })
        },
    )
    .parse(input)
}

fn int_literal(input: Span) -> IResult<Span, Token> {
    map_res(digit1, |span: Span| {
        span.fragment().parse::<i64>().map(|n| Token {
            range: offsets(span),
            kind: TokenKind::IntLiteral(n),
        })
    })
    .parse(input)
}

fn quoted<'a>(quote: char, normal: &'static str) -> impl Parser<Span<'a>, Output = String, Error = nom::error::Error<Span<'a>>> {
    delimited(
        char(quote),
        escaped_transform(
            none_of(normal),
            '\\',
            alt((
                value('\\', char('\\')),
                value('\'', char('\'')),
                value('\"', char('\"')),
                value('\r', char('r')),
                value('\n', char('n')),
                value('\t', char('t')),
                value('\0', char('0')),
                unicode,
            )),
        ),
        char(quote),
    )
}

fn string_literal(input: Span) -> IResult<Span, Token> {
    let (span, start) = position(input)?;
    let (span, s) = alt((quoted('"', "\"\\\n"), quoted('\'', "'\\\n"))).parse(span)?;
    let (span, end) = position(span)?;

    Ok((
        span,
        Token {
            range: Range {
                start: Position::new(start.location_line(), start.location_offset()),
                end: Position::new(start.location_line(), end.location_offset()),
            },
            kind: TokenKind::StringLiteral(s),
        },
    ))
}

fn literals(input: Span) -> IResult<Span, Token> {
    alt((
        float_literal,
        int_literal,
        empty_double_string,
        empty_single_string,
        string_literal,
    ))
    .parse(input)
}

fn ident(input: Span) -> IResult<Span, Token> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |span: Span| {
            let kind = match *span.fragment() {
                "and" => TokenKind::And,
                "else" => TokenKind::Else,
                "False" => TokenKind::False,
                "for" => TokenKind::For,
                "if" => TokenKind::If,
                "in" => TokenKind::In,
                "is" => TokenKind::Is,
                "lambda" => TokenKind::Lambda,
                "None" => TokenKind::None,
                "not" => TokenKind::Not,
                "or" => TokenKind::Or,
                "True" => TokenKind::True,
                fragment => TokenKind::Ident(SmolStr::new(fragment)),
            };
            Token {
                range: offsets(span),
                kind,
            }
        },
    )
    .parse(input)
}

fn token(input: Span) -> IResult<Span, Token> {
    alt((newline, comment, literals, punctuations, operators, dot, ident)).parse(input)
}

fn tokens(input: Span) -> IResult<Span, Vec<Token>> {
    terminated(many0(preceded(blank, token)), blank).parse(input)
}
