//! Parser module for the Protobuf to Django generator
//!
//! This module contains the lexer, AST definitions, and parsing logic
//! for the subset of Protobuf the generator understands: top-level
//! `message` blocks made of scalar or message-typed fields. Other
//! top-level statements (`syntax`, `package`, `import`, `option`) and
//! definitions (`enum`, `service`, `extend`) are read past.

pub mod ast;
pub mod error;
mod lexer;


use ast::{SchemaField, SchemaFile, SchemaMessage};
pub use error::{Location, ParseError, ParseResult};
pub use lexer::{tokenize, Token, TokenWithLocation};

use log::{debug, trace, warn};
use std::collections::HashSet;
use std::iter::Peekable;

/// Located tokens plus the position just past the last character of input,
/// which is where running out of tokens is reported.
struct TokenStream<'a> {
    tokens: Peekable<std::vec::IntoIter<TokenWithLocation<'a>>>,
    end: Location,
}

impl<'a> TokenStream<'a> {
    fn new(tokens: Vec<TokenWithLocation<'a>>, end: Location) -> Self {
        TokenStream {
            tokens: tokens.into_iter().peekable(),
            end,
        }
    }

    fn peek(&mut self) -> Option<&TokenWithLocation<'a>> {
        self.tokens.peek()
    }

    fn peek_is(&mut self, expected: &Token<'a>) -> bool {
        matches!(self.tokens.peek(), Some(t) if &t.token == expected)
    }

    fn next_token(&mut self) -> ParseResult<TokenWithLocation<'a>> {
        self.tokens
            .next()
            .ok_or(ParseError::UnexpectedEndOfInput(self.end))
    }

    fn expect(&mut self, expected: Token<'a>) -> ParseResult<TokenWithLocation<'a>> {
        self.next_token()?.expect(expected)
    }

    /// Consumes the next token only if it is `expected`.
    fn next_if(&mut self, expected: &Token<'a>) -> bool {
        if self.peek_is(expected) {
            self.tokens.next();
            true
        } else {
            false
        }
    }
}

/// Parse schema text into its message definitions
///
/// The text is tokenized first, then parsed by recursive descent. Message
/// blocks come back in the order they appear; each message keeps its fields
/// in declaration order.
///
/// # Arguments
///
/// * `input` - A string slice containing the Protobuf schema
///
/// # Returns
///
/// * `Result<SchemaFile, ParseError>` - The parsed schema, or a ParseError
///   pointing at the line and column where parsing stopped
pub fn parse_schema(input: &str) -> ParseResult<SchemaFile> {
    let tokens = tokenize(input)?;

    for (index, token_with_location) in tokens.iter().enumerate() {
        trace!(
            "Token {}: {:?} at {}",
            index,
            token_with_location.token,
            token_with_location.location
        );
    }

    let mut tokens = TokenStream::new(tokens, Location::of_suffix(input, ""));
    parse_tokenized_input(&mut tokens)
}

fn parse_tokenized_input(tokens: &mut TokenStream<'_>) -> ParseResult<SchemaFile> {
    let mut schema = SchemaFile::new();
    let mut seen = HashSet::new();

    while let Some(current) = tokens.peek().cloned() {
        match current.token {
            Token::Syntax => schema.syntax = Some(parse_syntax(tokens)?),
            Token::Package => schema.package = Some(parse_package(tokens)?),
            // `edition` lexes as an identifier
            Token::Import | Token::Option | Token::Identifier("edition") => {
                debug!("Skipping {} statement at {}", current.token, current.location);
                skip_statement(tokens)?;
            }
            Token::Enum | Token::Service | Token::Extend => skip_definition(tokens)?,
            Token::Message => {
                let message = parse_message(tokens)?;
                if !seen.insert(message.name.clone()) {
                    warn!(
                        "Message '{}' at {} is defined more than once",
                        message.name, message.location
                    );
                }
                schema.messages.push(message);
            }
            Token::Semicolon => {
                tokens.next_token()?;
            }
            other => {
                return Err(ParseError::UnexpectedToken(
                    format!("Expected a top-level definition, found {}", other),
                    current.location,
                ));
            }
        }
    }

    debug!("Parsed {} message(s)", schema.messages.len());
    Ok(schema)
}

/// Parses `syntax = "proto3";` and returns the quoted value.
fn parse_syntax(tokens: &mut TokenStream<'_>) -> ParseResult<String> {
    tokens.expect(Token::Syntax)?;
    tokens.expect(Token::Equals)?;

    let version_token = tokens.next_token()?;
    let version = match version_token.token {
        Token::StringLiteral(version) => version.to_string(),
        other => {
            return Err(ParseError::UnexpectedToken(
                format!("Expected syntax version string, found {}", other),
                version_token.location,
            ))
        }
    };

    tokens.expect(Token::Semicolon)?;
    debug!("Found syntax {}", version);
    Ok(version)
}

fn parse_package(tokens: &mut TokenStream<'_>) -> ParseResult<String> {
    tokens.expect(Token::Package)?;
    let package = parse_dotted_name(tokens, "package name")?;
    tokens.expect(Token::Semicolon)?;
    debug!("Found package {}", package);
    Ok(package)
}

/// Parses a message definition from the token stream.
///
/// Only fields are kept. `option`, `reserved` and `extensions` statements
/// are skipped; nested definitions are rejected.
fn parse_message(tokens: &mut TokenStream<'_>) -> ParseResult<SchemaMessage> {
    tokens.expect(Token::Message)?;

    let name_token = tokens.next_token()?;
    let name = match name_token.token {
        Token::Identifier(name) => name.to_string(),
        other => {
            return Err(ParseError::UnexpectedToken(
                format!("Expected message name, found {}", other),
                name_token.location,
            ));
        }
    };

    tokens.expect(Token::OpenBrace)?;

    let mut message = SchemaMessage::new(name, name_token.location);

    loop {
        let current = match tokens.peek().cloned() {
            Some(current) => current,
            None => return Err(ParseError::UnexpectedEndOfInput(tokens.end)),
        };

        match current.token {
            Token::CloseBrace => {
                tokens.next_token()?;
                debug!(
                    "Parsed message {} with {} field(s)",
                    message.name,
                    message.fields.len()
                );
                return Ok(message);
            }
            Token::Semicolon => {
                tokens.next_token()?;
            }
            Token::Option | Token::Reserved | Token::Extensions => skip_statement(tokens)?,
            Token::Message | Token::Enum | Token::Oneof | Token::Extend => {
                return Err(ParseError::Unsupported(
                    format!(
                        "nested {} definition inside message '{}'",
                        current.token, message.name
                    ),
                    current.location,
                ));
            }
            _ => {
                let field = parse_field(tokens)?;
                message.fields.push(field);
            }
        }
    }
}

/// Parses `[label] <type> <name> = <number> [options];`
///
/// The trailing semicolon is optional and the field number is checked
/// but not kept.
fn parse_field(tokens: &mut TokenStream<'_>) -> ParseResult<SchemaField> {
    let label = tokens.peek().map(|t| t.token.clone());
    let repeated = match label {
        Some(Token::Repeated) => {
            tokens.next_token()?;
            true
        }
        Some(Token::Optional) | Some(Token::Required) => {
            tokens.next_token()?;
            false
        }
        _ => false,
    };

    let end = tokens.end;
    let type_location = tokens.peek().map_or(end, |t| t.location);
    let field_type = parse_dotted_name(tokens, "field type")?;
    if field_type == "map" && tokens.peek_is(&Token::LessThan) {
        return Err(ParseError::Unsupported(
            "map fields".to_string(),
            type_location,
        ));
    }

    let name_token = tokens.next_token()?;
    let name = name_token
        .token
        .as_word()
        .ok_or_else(|| {
            ParseError::UnexpectedToken(
                format!("Expected field name, found {}", name_token.token),
                name_token.location,
            )
        })?
        .to_string();

    tokens.expect(Token::Equals)?;

    let number_token = tokens.next_token()?;
    match number_token.token {
        Token::IntLiteral(number) if number < 0 => {
            return Err(ParseError::InvalidNumber(
                format!("field '{}' has negative number {}", name, number),
                number_token.location,
            ));
        }
        Token::IntLiteral(_) => {}
        other => {
            return Err(ParseError::UnexpectedToken(
                format!("Expected field number, found {}", other),
                number_token.location,
            ));
        }
    }

    if tokens.peek_is(&Token::OpenBracket) {
        skip_bracketed(tokens)?;
    }
    tokens.next_if(&Token::Semicolon);

    debug!("Parsed field {} {} (repeated: {})", field_type, name, repeated);
    Ok(SchemaField::new(name, field_type, repeated))
}

/// Parses `a.b.c` or `.a.b.c`. Keywords are accepted as name parts.
fn parse_dotted_name(tokens: &mut TokenStream<'_>, what: &str) -> ParseResult<String> {
    let mut name = String::new();
    if tokens.next_if(&Token::Dot) {
        name.push('.');
    }

    loop {
        let part = tokens.next_token()?;
        match part.token.as_word() {
            Some(word) => name.push_str(word),
            None => {
                return Err(ParseError::UnexpectedToken(
                    format!("Expected {}, found {}", what, part.token),
                    part.location,
                ))
            }
        }

        if !tokens.next_if(&Token::Dot) {
            break;
        }
        name.push('.');
    }

    Ok(name)
}

/// Consumes tokens up to and including the `;` that ends the current
/// statement. Braces inside the statement (aggregate option values)
/// are skipped as a whole.
fn skip_statement(tokens: &mut TokenStream<'_>) -> ParseResult<()> {
    let mut depth = 0usize;
    loop {
        let token = tokens.next_token()?;
        match token.token {
            Token::OpenBrace => depth += 1,
            Token::CloseBrace if depth == 0 => {
                return Err(ParseError::UnexpectedToken(
                    "Expected ';', found '}'".to_string(),
                    token.location,
                ))
            }
            Token::CloseBrace => depth -= 1,
            Token::Semicolon if depth == 0 => return Ok(()),
            _ => {}
        }
    }
}

/// Consumes `keyword Name ... { ... }` with balanced braces.
fn skip_definition(tokens: &mut TokenStream<'_>) -> ParseResult<()> {
    let keyword = tokens.next_token()?;
    debug!("Skipping {} definition at {}", keyword.token, keyword.location);

    loop {
        let token = tokens.next_token()?;
        match token.token {
            Token::OpenBrace => break,
            Token::Semicolon | Token::CloseBrace => {
                return Err(ParseError::UnexpectedToken(
                    format!("Expected '{{', found {}", token.token),
                    token.location,
                ))
            }
            _ => {}
        }
    }

    let mut depth = 1usize;
    while depth > 0 {
        match tokens.next_token()?.token {
            Token::OpenBrace => depth += 1,
            Token::CloseBrace => depth -= 1,
            _ => {}
        }
    }
    Ok(())
}

/// Consumes a `[ ... ]` field option list.
fn skip_bracketed(tokens: &mut TokenStream<'_>) -> ParseResult<()> {
    tokens.expect(Token::OpenBracket)?;
    let mut depth = 1usize;
    while depth > 0 {
        match tokens.next_token()?.token {
            Token::OpenBracket => depth += 1,
            Token::CloseBracket => depth -= 1,
            _ => {}
        }
    }
    Ok(())
}
