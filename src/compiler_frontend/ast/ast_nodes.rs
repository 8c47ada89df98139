//! Untyped syntax tree straight out of the parser.
//!
//! Names stay interned. Type names are not resolved yet, that happens during lowering
//! once the struct registry exists.

use crate::compiler_frontend::string_interning::StringId;
use crate::compiler_frontend::symbols::{LayoutEntry, ParameterQualifier, StorageQualifier};
use crate::compiler_frontend::tokenizer::tokens::TextLocation;

#[derive(Debug, Clone, Default)]
pub struct ShaderAst {
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Struct(StructDeclaration),
    Variables(VariableDeclaration),
    CBuffer(CBufferDeclaration),
    Function(FunctionDeclaration),
}

#[derive(Debug, Clone)]
pub struct TypeName {
    pub name: StringId,
    pub location: TextLocation,
}

/// One name in a declaration list: `a[4] : TEXCOORD0 = ...`
#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: StringId,
    pub array_length: Option<u32>,
    pub semantic: Option<StringId>,
    pub initializer: Option<Expression>,
    pub location: TextLocation,
}

/// `layout(...) uniform vec3 a, b[2];` or a local `const int x = 1;`
#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub storage: Option<StorageQualifier>,
    pub layout: Vec<LayoutEntry>,
    pub type_name: TypeName,
    pub declarators: Vec<Declarator>,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct StructDeclaration {
    pub name: StringId,
    pub members: Vec<MemberDeclaration>,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct MemberDeclaration {
    pub type_name: TypeName,
    pub declarator: Declarator,
}

/// HLSL constant buffer. Its members become uniform globals.
#[derive(Debug, Clone)]
pub struct CBufferDeclaration {
    pub name: StringId,
    pub register: Option<StringId>,
    pub members: Vec<MemberDeclaration>,
}

#[derive(Debug, Clone)]
pub struct ParameterDeclaration {
    pub qualifier: ParameterQualifier,
    pub is_const: bool,
    pub type_name: TypeName,

    // Prototypes may leave parameters unnamed
    pub name: Option<StringId>,
    pub array_length: Option<u32>,
    pub semantic: Option<StringId>,
    pub location: TextLocation,
}

/// A prototype when `body` is None.
#[derive(Debug, Clone)]
pub struct FunctionDeclaration {
    pub return_type: TypeName,
    pub name: StringId,
    pub parameters: Vec<ParameterDeclaration>,
    pub return_semantic: Option<StringId>,
    pub body: Option<Block>,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Block(Block),
    Declaration(VariableDeclaration),
    Expression(Expression),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        step: Option<Expression>,
        body: Box<Statement>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expression,
    },
    Return(Option<Expression>),
    Break,
    Continue,
    Discard,
    Empty,
}

#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub location: TextLocation,
}

impl Expression {
    pub fn new(kind: ExpressionKind, location: TextLocation) -> Self {
        Expression { kind, location }
    }
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    Identifier(StringId),

    /// Function call, intrinsic or constructor. Which one is decided while lowering.
    Call {
        callee: StringId,
        arguments: Vec<Expression>,
    },

    /// Struct member or swizzle
    Member {
        base: Box<Expression>,
        member: StringId,
    },
    Index {
        base: Box<Expression>,
        index: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Assign {
        operator: Option<BinaryOperator>,
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Ternary {
        condition: Box<Expression>,
        then_value: Box<Expression>,
        else_value: Box<Expression>,
    },
    Step {
        operator: StepOperator,
        operand: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl BinaryOperator {
    /// Binding power for precedence climbing. Higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Equal | BinaryOperator::NotEqual => 3,
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => 4,
            BinaryOperator::Add | BinaryOperator::Subtract => 5,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulus => 6,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulus => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOperator {
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}
