//! Typed, resolved tree the bytecode emitter walks.
//!
//! Every name is resolved to a slot or registry index and every expression carries its
//! type, so the emitter never needs to look anything up.

use crate::compiler_frontend::ast::ast_nodes::{BinaryOperator, StepOperator, UnaryOperator};
use crate::compiler_frontend::builtins::Intrinsic;
use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::symbols::{Function, Structure, Variable};
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use std::fmt;

/// Slot of a parameter or local inside a function frame. Parameters come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalSlot(pub u32);

/// Index into the unit's global space. Stage builtins come first, then user globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalId(pub u32);

/// Index into the function registry, the `Call` operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

#[derive(Debug, Clone, Default)]
pub struct HirModule {
    pub builtins: Vec<Variable>,
    pub globals: Vec<HirGlobal>,
    pub structures: Vec<Structure>,
    pub functions: Vec<HirFunction>,
}

impl HirModule {
    pub fn global_id(&self, user_index: usize) -> GlobalId {
        GlobalId((self.builtins.len() + user_index) as u32)
    }
}

#[derive(Debug, Clone)]
pub struct HirGlobal {
    pub variable: Variable,
    pub initializer: Option<HirExpression>,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct HirFunction {
    pub signature: Function,

    /// Body local names in declaration order. Slot is `parameters.len() + index`.
    pub locals: Vec<String>,

    /// None while only a prototype has been seen
    pub body: Option<Vec<HirStatement>>,

    /// Falls off the end without returning a value
    pub missing_return: bool,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct HirStatement {
    pub kind: HirStatementKind,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub enum HirStatementKind {
    /// Evaluated for side effects, any value is dropped
    Expression(HirExpression),

    /// Locals without an initializer start as the zero value of their type
    Declare {
        slot: LocalSlot,
        data_type: DataType,
        initializer: Option<HirExpression>,
    },

    If {
        condition: HirExpression,
        then_branch: Vec<HirStatement>,
        else_branch: Vec<HirStatement>,
    },

    /// `for` and `while` check the condition first, `do` checks it after the body.
    /// `continue` jumps to the step.
    Loop {
        condition: Option<HirExpression>,
        step: Option<HirExpression>,
        body: Vec<HirStatement>,
        check_first: bool,
    },

    Return(Option<HirExpression>),
    Break,
    Continue,
    Discard,
    Block(Vec<HirStatement>),
}

#[derive(Debug, Clone)]
pub struct HirExpression {
    pub kind: HirExpressionKind,
    pub data_type: DataType,
    pub location: TextLocation,
}

impl HirExpression {
    pub fn new(kind: HirExpressionKind, data_type: DataType, location: TextLocation) -> Self {
        HirExpression {
            kind,
            data_type,
            location,
        }
    }
}

#[derive(Debug, Clone)]
pub enum HirExpressionKind {
    Int(i32),
    Float(f32),
    Bool(bool),

    Local(LocalSlot),
    Global(GlobalId),

    Member {
        base: Box<HirExpression>,
        index: u32,
    },
    Swizzle {
        base: Box<HirExpression>,
        components: Vec<u8>,
    },
    Index {
        base: Box<HirExpression>,
        index: Box<HirExpression>,
    },

    Unary {
        operator: UnaryOperator,
        operand: Box<HirExpression>,
    },

    /// `&&` and `||` short circuit
    Binary {
        operator: BinaryOperator,
        left: Box<HirExpression>,
        right: Box<HirExpression>,
    },

    Ternary {
        condition: Box<HirExpression>,
        then_value: Box<HirExpression>,
        else_value: Box<HirExpression>,
    },

    /// Leaves the assigned value on the stack
    Assign {
        target: HirPlace,
        operator: Option<BinaryOperator>,
        value: Box<HirExpression>,
    },

    Step {
        operator: StepOperator,
        target: HirPlace,
    },

    Call {
        function: FunctionId,
        arguments: Vec<HirArgument>,
    },

    Intrinsic {
        intrinsic: Intrinsic,
        arguments: Vec<HirExpression>,
    },

    /// Builds a value of the expression's type. One argument of another type is a conversion.
    Construct { arguments: Vec<HirExpression> },
}

#[derive(Debug, Clone)]
pub enum HirArgument {
    Value(HirExpression),

    /// `out` and `inout` parameters
    Reference(HirPlace),
}

/// An assignable location: a variable plus a chain of member, swizzle and index steps.
#[derive(Debug, Clone)]
pub struct HirPlace {
    pub root: PlaceRoot,
    pub projections: Vec<Projection>,
    pub data_type: DataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceRoot {
    Local(LocalSlot),
    Global(GlobalId),
}

#[derive(Debug, Clone)]
pub enum Projection {
    Member(u32),
    Swizzle(Vec<u8>),
    Index(HirExpression),
}

impl fmt::Display for HirPlace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            PlaceRoot::Local(slot) => write!(f, "local{}", slot.0)?,
            PlaceRoot::Global(id) => write!(f, "global{}", id.0)?,
        }

        for projection in &self.projections {
            match projection {
                Projection::Member(index) => write!(f, ".{index}")?,
                Projection::Swizzle(components) => {
                    f.write_str(".")?;
                    for component in components {
                        f.write_str(["x", "y", "z", "w"][*component as usize % 4])?;
                    }
                }
                Projection::Index(_) => f.write_str("[..]")?,
            }
        }

        Ok(())
    }
}
