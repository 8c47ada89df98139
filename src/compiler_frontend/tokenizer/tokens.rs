use crate::compiler_frontend::string_interning::{StringId, StringTable};
use crate::token_log;
use serde::Serialize;
use std::iter::Peekable;
use std::str::Chars;

/// Zero based line and column of a character in the shader source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub struct CharPosition {
    pub line_number: i32,
    pub char_column: i32,
}

/// Span of source text. `end_pos` is exclusive.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct TextLocation {
    pub start_pos: CharPosition,
    pub end_pos: CharPosition,
}

impl TextLocation {
    pub fn new(start: CharPosition, end: CharPosition) -> Self {
        Self {
            start_pos: start,
            end_pos: end,
        }
    }

    pub fn new_just_line(line: i32) -> Self {
        Self {
            start_pos: CharPosition {
                line_number: line,
                char_column: 0,
            },
            end_pos: CharPosition {
                line_number: line,
                char_column: 120, // Arbitrary number
            },
        }
    }

    /// Span covering both locations.
    pub fn to(&self, other: &TextLocation) -> TextLocation {
        TextLocation {
            start_pos: self.start_pos,
            end_pos: other.end_pos,
        }
    }

    /// One based line number, the form a debugger shows.
    pub fn line(&self) -> u32 {
        (self.start_pos.line_number.max(0) + 1) as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: TextLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: TextLocation) -> Self {
        Self { kind, location }
    }
}

#[derive(Clone, Debug)]
pub struct ShaderTokens {
    pub tokens: Vec<Token>,
    pub index: usize,
}

impl ShaderTokens {
    /// `tokens` must end with an Eof token.
    pub fn new(tokens: Vec<Token>) -> ShaderTokens {
        ShaderTokens { tokens, index: 0 }
    }

    pub fn current_token_kind(&self) -> &TokenKind {
        &self.tokens[self.index].kind
    }

    pub fn peek_next_token(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index + 1).map(|token| &token.kind)
    }

    pub fn current_location(&self) -> TextLocation {
        self.tokens[self.index].location.clone()
    }

    pub fn previous_location(&self) -> TextLocation {
        match self.index {
            0 => self.current_location(),
            index => self.tokens[index - 1].location.clone(),
        }
    }

    pub fn advance(&mut self) {
        match self.current_token_kind() {
            // Can't advance past End of File
            TokenKind::Eof => {
                token_log!(Red "Parser tried to advance past EOF");
            }

            _ => {
                self.index += 1;
            }
        }
    }

    /// Consumes the current token if it matches.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.current_token_kind() == kind {
            self.advance();
            return true;
        }

        false
    }
}

pub struct TokenStream<'a> {
    pub chars: Peekable<Chars<'a>>,
    pub position: CharPosition,
    pub start_position: CharPosition,
}

impl<'a> TokenStream<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            chars: source_code.chars().peekable(),
            position: CharPosition::default(),
            start_position: CharPosition::default(),
        }
    }

    pub fn next(&mut self) -> Option<char> {
        let c = self.chars.next()?;

        if c == '\n' {
            self.position.line_number += 1;
            self.position.char_column = 0;
        } else {
            self.position.char_column += 1;
        }

        Some(c)
    }

    pub fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Consumes the next char if it is `expected`.
    pub fn next_if_eq(&mut self, expected: char) -> bool {
        if self.peek() == Some(&expected) {
            self.next();
            return true;
        }

        false
    }

    pub fn new_location(&mut self) -> TextLocation {
        let start_pos = self.start_position;
        self.update_start_position();
        TextLocation::new(start_pos, self.position)
    }

    pub fn update_start_position(&mut self) {
        self.start_position = self.position;
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum TokenKind {
    Eof,

    /// Variable, function and type names
    Symbol(StringId),

    // Values
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),

    // Declarations
    Struct,
    CBuffer,
    Precision,
    PrecisionQualifier,
    Layout,

    // Storage and parameter qualifiers
    Const,
    Uniform,
    In,
    Out,
    InOut,
    Attribute,
    Varying,
    Static,
    GroupShared,

    // Control Flow
    If,
    Else,
    For,
    While,
    Do,
    Return,
    Break,
    Continue,
    Discard,

    // Scopes and grouping
    OpenParenthesis,  // (
    CloseParenthesis, // )
    OpenCurly,        // {
    CloseCurly,       // }
    OpenBracket,      // [
    CloseBracket,     // ]

    // Basic Grammar
    Semicolon,
    Comma,
    Dot,
    Colon,
    QuestionMark,

    // Assignment
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    ModulusAssign,

    // Mathematical Operators
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    Increment,
    Decrement,

    // Logical Operators
    Not,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl TokenKind {
    pub fn get_name(&self, string_table: &StringTable) -> String {
        match self {
            TokenKind::Symbol(name) => string_table.resolve(*name).to_string(),
            _ => String::new(),
        }
    }

    pub fn is_storage_qualifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Const
                | TokenKind::Uniform
                | TokenKind::In
                | TokenKind::Out
                | TokenKind::InOut
                | TokenKind::Attribute
                | TokenKind::Varying
                | TokenKind::Static
                | TokenKind::GroupShared
        )
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::AddAssign
                | TokenKind::SubtractAssign
                | TokenKind::MultiplyAssign
                | TokenKind::DivideAssign
                | TokenKind::ModulusAssign
        )
    }

    /// How the token reads in source, for error messages.
    pub fn describe(&self, string_table: &StringTable) -> String {
        let text = match self {
            TokenKind::Eof => "end of file",
            TokenKind::Symbol(id) => return format!("'{}'", string_table.resolve(*id)),
            TokenKind::IntLiteral(value) => return format!("'{value}'"),
            TokenKind::FloatLiteral(value) => return format!("'{value}'"),
            TokenKind::BoolLiteral(value) => return format!("'{value}'"),
            TokenKind::Struct => "'struct'",
            TokenKind::CBuffer => "'cbuffer'",
            TokenKind::Precision => "'precision'",
            TokenKind::PrecisionQualifier => "a precision qualifier",
            TokenKind::Layout => "'layout'",
            TokenKind::Const => "'const'",
            TokenKind::Uniform => "'uniform'",
            TokenKind::In => "'in'",
            TokenKind::Out => "'out'",
            TokenKind::InOut => "'inout'",
            TokenKind::Attribute => "'attribute'",
            TokenKind::Varying => "'varying'",
            TokenKind::Static => "'static'",
            TokenKind::GroupShared => "'groupshared'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::For => "'for'",
            TokenKind::While => "'while'",
            TokenKind::Do => "'do'",
            TokenKind::Return => "'return'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Discard => "'discard'",
            TokenKind::OpenParenthesis => "'('",
            TokenKind::CloseParenthesis => "')'",
            TokenKind::OpenCurly => "'{'",
            TokenKind::CloseCurly => "'}'",
            TokenKind::OpenBracket => "'['",
            TokenKind::CloseBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::QuestionMark => "'?'",
            TokenKind::Assign => "'='",
            TokenKind::AddAssign => "'+='",
            TokenKind::SubtractAssign => "'-='",
            TokenKind::MultiplyAssign => "'*='",
            TokenKind::DivideAssign => "'/='",
            TokenKind::ModulusAssign => "'%='",
            TokenKind::Add => "'+'",
            TokenKind::Subtract => "'-'",
            TokenKind::Multiply => "'*'",
            TokenKind::Divide => "'/'",
            TokenKind::Modulus => "'%'",
            TokenKind::Increment => "'++'",
            TokenKind::Decrement => "'--'",
            TokenKind::Not => "'!'",
            TokenKind::Equal => "'=='",
            TokenKind::NotEqual => "'!='",
            TokenKind::LessThan => "'<'",
            TokenKind::LessThanOrEqual => "'<='",
            TokenKind::GreaterThan => "'>'",
            TokenKind::GreaterThanOrEqual => "'>='",
            TokenKind::And => "'&&'",
            TokenKind::Or => "'||'",
        };

        text.to_string()
    }
}
