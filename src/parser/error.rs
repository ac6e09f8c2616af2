use std::error::Error;
use std::fmt;

/// A 1-based position in the schema source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Location { line, column }
    }

    /// Computes the location of `rest` inside `source`.
    ///
    /// `rest` must be a suffix of `source`, which is what nom hands back
    /// as the remaining input.
    pub fn of_suffix(source: &str, rest: &str) -> Self {
        let offset = source.len() - rest.len();
        let consumed = &source[..offset];
        let line = consumed.matches('\n').count() + 1;
        let column = match consumed.rfind('\n') {
            Some(newline) => consumed[newline + 1..].chars().count() + 1,
            None => consumed.chars().count() + 1,
        };
        Location { line, column }
    }

    /// Moves past `text`, which must start at this location.
    pub fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Represents all possible errors that can occur during parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Error occurred during lexical analysis
    LexerError(String, Location),
    /// Unexpected token encountered
    UnexpectedToken(String, Location),
    /// Unexpected end of input
    UnexpectedEndOfInput(Location),
    /// Valid protobuf the generator does not handle (nested messages, maps, ...)
    Unsupported(String, Location),
    /// Integer literal that does not fit the target type
    InvalidNumber(String, Location),
}

impl ParseError {
    pub fn location(&self) -> Location {
        match self {
            ParseError::LexerError(_, loc) => *loc,
            ParseError::UnexpectedToken(_, loc) => *loc,
            ParseError::UnexpectedEndOfInput(loc) => *loc,
            ParseError::Unsupported(_, loc) => *loc,
            ParseError::InvalidNumber(_, loc) => *loc,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ParseError::LexerError(msg, _) => format!("Lexer error: {}", msg),
            ParseError::UnexpectedToken(token, _) => format!("Unexpected token: {}", token),
            ParseError::UnexpectedEndOfInput(_) => "Unexpected end of input".to_string(),
            ParseError::Unsupported(msg, _) => format!("Unsupported: {}", msg),
            ParseError::InvalidNumber(msg, _) => format!("Invalid number: {}", msg),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = self.location();
        write!(
            f,
            "Error at line {}, column {}: {}",
            loc.line,
            loc.column,
            self.message()
        )
    }
}

impl Error for ParseError {}

/// A Result type specialized for parser operations
pub type ParseResult<T> = Result<T, ParseError>;
