use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_until, take_while},
    character::complete::{
        alpha1, alphanumeric0, alphanumeric1, anychar, char, digit0, digit1, hex_digit1,
        multispace1, none_of,
    },
    combinator::{cut, map, map_res, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use super::error::{Location, ParseError, ParseResult};

type LexResult<'a, T> = IResult<&'a str, T>;

#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    Syntax,
    Package,
    Import,
    Option,
    Message,
    Enum,
    Service,
    Extend,
    Oneof,
    Repeated,
    Optional,
    Required,
    Reserved,
    Extensions,
    Identifier(&'a str),
    StringLiteral(&'a str),
    IntLiteral(i64),
    FloatLiteral(f64),
    Equals,
    Semicolon,
    Comma,
    Dot,
    Colon,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    LessThan,
    GreaterThan,
}

impl<'a> Token<'a> {
    /// Source text of a keyword token, `None` for everything else.
    pub fn keyword(&self) -> Option<&'static str> {
        let text = match self {
            Token::Syntax => "syntax",
            Token::Package => "package",
            Token::Import => "import",
            Token::Option => "option",
            Token::Message => "message",
            Token::Enum => "enum",
            Token::Service => "service",
            Token::Extend => "extend",
            Token::Oneof => "oneof",
            Token::Repeated => "repeated",
            Token::Optional => "optional",
            Token::Required => "required",
            Token::Reserved => "reserved",
            Token::Extensions => "extensions",
            _ => return None,
        };
        Some(text)
    }

    /// The token read as a plain word. Keywords count as words so that
    /// `string message = 1;` still names its field `message`.
    pub fn as_word(&self) -> Option<&'a str> {
        match self {
            Token::Identifier(word) => Some(*word),
            other => other.keyword(),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.keyword() {
            return write!(f, "'{}'", keyword);
        }
        match self {
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::StringLiteral(text) => write!(f, "string \"{}\"", text),
            Token::IntLiteral(number) => write!(f, "integer {}", number),
            Token::FloatLiteral(number) => write!(f, "float {}", number),
            Token::Equals => f.write_str("'='"),
            Token::Semicolon => f.write_str("';'"),
            Token::Comma => f.write_str("','"),
            Token::Dot => f.write_str("'.'"),
            Token::Colon => f.write_str("':'"),
            Token::OpenBrace => f.write_str("'{'"),
            Token::CloseBrace => f.write_str("'}'"),
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
            Token::OpenBracket => f.write_str("'['"),
            Token::CloseBracket => f.write_str("']'"),
            Token::LessThan => f.write_str("'<'"),
            Token::GreaterThan => f.write_str("'>'"),
            _ => unreachable!("keywords are formatted above"),
        }
    }
}

/// A token together with the position of its first character
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithLocation<'a> {
    pub token: Token<'a>,
    pub location: Location,
}

impl<'a> TokenWithLocation<'a> {
    pub fn new(token: Token<'a>, location: Location) -> Self {
        TokenWithLocation { token, location }
    }

    /// Returns the token unchanged if it is `expected`, an error otherwise.
    pub fn expect(self, expected: Token<'a>) -> ParseResult<Self> {
        if self.token == expected {
            Ok(self)
        } else {
            Err(ParseError::UnexpectedToken(
                format!("Expected {}, found {}", expected, self.token),
                self.location,
            ))
        }
    }
}

fn keyword_or_identifier(word: &str) -> Token<'_> {
    match word {
        "syntax" => Token::Syntax,
        "package" => Token::Package,
        "import" => Token::Import,
        "option" => Token::Option,
        "message" => Token::Message,
        "enum" => Token::Enum,
        "service" => Token::Service,
        "extend" => Token::Extend,
        "oneof" => Token::Oneof,
        "repeated" => Token::Repeated,
        "optional" => Token::Optional,
        "required" => Token::Required,
        "reserved" => Token::Reserved,
        "extensions" => Token::Extensions,
        _ => Token::Identifier(word),
    }
}

fn parse_word(input: &str) -> LexResult<'_, Token<'_>> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        keyword_or_identifier,
    )(input)
}

/// Body of a quoted literal, escapes kept as written. `escaped` rejects an
/// empty body, hence the `opt`.
fn double_quoted(input: &str) -> LexResult<'_, &str> {
    delimited(
        char('"'),
        map(opt(escaped(none_of("\\\""), '\\', anychar)), Option::unwrap_or_default),
        char('"'),
    )(input)
}

fn single_quoted(input: &str) -> LexResult<'_, &str> {
    delimited(
        char('\''),
        map(opt(escaped(none_of("\\'"), '\\', anychar)), Option::unwrap_or_default),
        char('\''),
    )(input)
}

fn parse_string_literal(input: &str) -> LexResult<'_, Token<'_>> {
    map(alt((double_quoted, single_quoted)), Token::StringLiteral)(input)
}

fn parse_hex_literal(input: &str) -> LexResult<'_, Token<'_>> {
    preceded(
        alt((tag("0x"), tag("0X"))),
        cut(map_res(hex_digit1, |digits: &str| {
            i64::from_str_radix(digits, 16).map(Token::IntLiteral)
        })),
    )(input)
}

fn parse_float_literal(input: &str) -> LexResult<'_, Token<'_>> {
    map_res(
        recognize(tuple((opt(char('-')), digit1, char('.'), digit0))),
        |s: &str| s.parse::<f64>().map(Token::FloatLiteral),
    )(input)
}

fn parse_int_literal(input: &str) -> LexResult<'_, Token<'_>> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i64>().map(Token::IntLiteral)
    })(input)
}

fn parse_symbol(input: &str) -> LexResult<'_, Token<'_>> {
    alt((
        value(Token::Equals, char('=')),
        value(Token::Semicolon, char(';')),
        value(Token::Comma, char(',')),
        value(Token::Dot, char('.')),
        value(Token::Colon, char(':')),
        value(Token::OpenBrace, char('{')),
        value(Token::CloseBrace, char('}')),
        value(Token::OpenParen, char('(')),
        value(Token::CloseParen, char(')')),
        value(Token::OpenBracket, char('[')),
        value(Token::CloseBracket, char(']')),
        value(Token::LessThan, char('<')),
        value(Token::GreaterThan, char('>')),
    ))(input)
}

fn parse_token(input: &str) -> LexResult<'_, Token<'_>> {
    alt((
        parse_word,
        parse_string_literal,
        parse_hex_literal,
        parse_float_literal,
        parse_int_literal,
        parse_symbol,
    ))(input)
}

fn line_comment(input: &str) -> LexResult<'_, ()> {
    value((), pair(tag("//"), take_while(|c| c != '\n')))(input)
}

fn block_comment(input: &str) -> LexResult<'_, ()> {
    value((), delimited(tag("/*"), take_until("*/"), tag("*/")))(input)
}

/// Whitespace and comments between tokens
fn trivia(input: &str) -> LexResult<'_, ()> {
    value(
        (),
        many0(alt((value((), multispace1), line_comment, block_comment))),
    )(input)
}

/// Text of an integer literal that failed to convert, hex or decimal
fn integer_text(input: &str) -> LexResult<'_, &str> {
    alt((
        recognize(pair(alt((tag("0x"), tag("0X"))), alphanumeric0)),
        recognize(pair(opt(char('-')), digit1)),
    ))(input)
}

fn lexer_error(rest: &str, location: Location) -> ParseError {
    if let Ok((_, text)) = integer_text(rest) {
        return ParseError::InvalidNumber(
            format!("integer literal {} is not a valid 64-bit integer", text),
            location,
        );
    }

    let found = rest.chars().next().unwrap_or_default();
    let message = if found == '"' || found == '\'' {
        "unterminated string literal".to_string()
    } else {
        format!("unexpected character {:?}", found)
    };
    ParseError::LexerError(message, location)
}

/// The part of `rest` that a parser consumed to leave `remaining`
fn consumed<'a>(rest: &'a str, remaining: &str) -> &'a str {
    &rest[..rest.len() - remaining.len()]
}

/// Splits schema text into located tokens, dropping whitespace and comments.
pub fn tokenize(input: &str) -> ParseResult<Vec<TokenWithLocation<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = input;
    let mut location = Location::new(1, 1);

    loop {
        if let Ok((remaining, ())) = trivia(rest) {
            location.advance(consumed(rest, remaining));
            rest = remaining;
        }
        if rest.is_empty() {
            break;
        }

        if rest.starts_with("/*") {
            return Err(ParseError::LexerError(
                "unterminated block comment".to_string(),
                location,
            ));
        }

        match parse_token(rest) {
            Ok((remaining, token)) => {
                tokens.push(TokenWithLocation::new(token, location));
                location.advance(consumed(rest, remaining));
                rest = remaining;
            }
            Err(_) => return Err(lexer_error(rest, location)),
        }
    }

    Ok(tokens)
}
