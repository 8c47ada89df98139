//! The stack machine instruction set and its binary encoding.
//!
//! Every instruction is a one byte opcode followed by its operands.
//! Indices and counts are LEB128, jump targets are fixed width little endian `u32`
//! so they can be patched in place once the target is known.
//! Floats are stored as their IEEE 754 bits, little endian.

use crate::compiler_frontend::builtins::Intrinsic;
use crate::compiler_frontend::datatypes::{DataType, ScalarKind};
use std::fmt;
use wasm_encoder::Encode;

/// Width of a patchable jump operand.
pub const JUMP_OPERAND_SIZE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,
    Line = 0x01,

    PushInt = 0x10,
    PushFloat = 0x11,
    PushBool = 0x12,
    Pop = 0x13,
    Dup = 0x14,

    GetLocal = 0x20,
    SetLocal = 0x21,
    GetGlobal = 0x22,
    SetGlobal = 0x23,

    RefLocal = 0x28,
    RefGlobal = 0x29,
    RefMember = 0x2A,
    RefSwizzle = 0x2B,
    RefIndex = 0x2C,
    Load = 0x2D,
    Store = 0x2E,

    GetMember = 0x30,
    Swizzle = 0x31,
    Index = 0x32,
    Construct = 0x33,

    Add = 0x40,
    Sub = 0x41,
    Mul = 0x42,
    Div = 0x43,
    Mod = 0x44,
    Neg = 0x45,
    Not = 0x46,
    Eq = 0x47,
    Ne = 0x48,
    Lt = 0x49,
    Gt = 0x4A,
    Le = 0x4B,
    Ge = 0x4C,

    PreInc = 0x50,
    PreDec = 0x51,
    PostInc = 0x52,
    PostDec = 0x53,

    Jump = 0x60,
    JumpIfFalse = 0x61,
    JumpIfTrue = 0x62,
    Call = 0x63,
    CallBuiltin = 0x64,
    Return = 0x65,
    ReturnValue = 0x66,
    Discard = 0x67,
}

const ALL_OPCODES: [Opcode; 47] = [
    Opcode::Nop,
    Opcode::Line,
    Opcode::PushInt,
    Opcode::PushFloat,
    Opcode::PushBool,
    Opcode::Pop,
    Opcode::Dup,
    Opcode::GetLocal,
    Opcode::SetLocal,
    Opcode::GetGlobal,
    Opcode::SetGlobal,
    Opcode::RefLocal,
    Opcode::RefGlobal,
    Opcode::RefMember,
    Opcode::RefSwizzle,
    Opcode::RefIndex,
    Opcode::Load,
    Opcode::Store,
    Opcode::GetMember,
    Opcode::Swizzle,
    Opcode::Index,
    Opcode::Construct,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Neg,
    Opcode::Not,
    Opcode::Eq,
    Opcode::Ne,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Le,
    Opcode::Ge,
    Opcode::PreInc,
    Opcode::PreDec,
    Opcode::PostInc,
    Opcode::PostDec,
    Opcode::Jump,
    Opcode::JumpIfFalse,
    Opcode::JumpIfTrue,
    Opcode::Call,
    Opcode::CallBuiltin,
    Opcode::Return,
    Opcode::ReturnValue,
    Opcode::Discard,
];

impl Opcode {
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .copied()
            .find(|opcode| *opcode as u8 == byte)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Line => "line",
            Opcode::PushInt => "push.i",
            Opcode::PushFloat => "push.f",
            Opcode::PushBool => "push.b",
            Opcode::Pop => "pop",
            Opcode::Dup => "dup",
            Opcode::GetLocal => "get.local",
            Opcode::SetLocal => "set.local",
            Opcode::GetGlobal => "get.global",
            Opcode::SetGlobal => "set.global",
            Opcode::RefLocal => "ref.local",
            Opcode::RefGlobal => "ref.global",
            Opcode::RefMember => "ref.member",
            Opcode::RefSwizzle => "ref.swizzle",
            Opcode::RefIndex => "ref.index",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::GetMember => "get.member",
            Opcode::Swizzle => "swizzle",
            Opcode::Index => "index",
            Opcode::Construct => "construct",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::Neg => "neg",
            Opcode::Not => "not",
            Opcode::Eq => "eq",
            Opcode::Ne => "ne",
            Opcode::Lt => "lt",
            Opcode::Gt => "gt",
            Opcode::Le => "le",
            Opcode::Ge => "ge",
            Opcode::PreInc => "inc.pre",
            Opcode::PreDec => "dec.pre",
            Opcode::PostInc => "inc.post",
            Opcode::PostDec => "dec.post",
            Opcode::Jump => "jump",
            Opcode::JumpIfFalse => "jump.false",
            Opcode::JumpIfTrue => "jump.true",
            Opcode::Call => "call",
            Opcode::CallBuiltin => "call.builtin",
            Opcode::Return => "return",
            Opcode::ReturnValue => "return.value",
            Opcode::Discard => "discard",
        }
    }
}

/// Type operand of `Construct`. Structs are referenced by registry index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeCode {
    Void,
    Scalar(ScalarKind),
    Vector(ScalarKind, u8),
    Matrix { columns: u8, rows: u8 },
    Sampler2D,
    Struct(u32),
    Array(Box<TypeCode>, u32),
}

pub(crate) const SCALAR_BOOL: u8 = 0;
pub(crate) const SCALAR_INT: u8 = 1;
pub(crate) const SCALAR_FLOAT: u8 = 2;

pub(crate) const TYPE_VOID: u8 = 0;
pub(crate) const TYPE_SCALAR: u8 = 1;
pub(crate) const TYPE_VECTOR: u8 = 2;
pub(crate) const TYPE_MATRIX: u8 = 3;
pub(crate) const TYPE_SAMPLER: u8 = 4;
pub(crate) const TYPE_STRUCT: u8 = 5;
pub(crate) const TYPE_ARRAY: u8 = 6;

pub(crate) fn scalar_code(kind: ScalarKind) -> u8 {
    match kind {
        ScalarKind::Bool => SCALAR_BOOL,
        ScalarKind::Int => SCALAR_INT,
        ScalarKind::Float => SCALAR_FLOAT,
    }
}

pub(crate) fn scalar_from_code(code: u8) -> Option<ScalarKind> {
    match code {
        SCALAR_BOOL => Some(ScalarKind::Bool),
        SCALAR_INT => Some(ScalarKind::Int),
        SCALAR_FLOAT => Some(ScalarKind::Float),
        _ => None,
    }
}

impl TypeCode {
    /// `struct_index` maps a struct name to its registry index.
    pub fn from_data_type(
        data_type: &DataType,
        struct_index: &impl Fn(&str) -> Option<u32>,
    ) -> Option<TypeCode> {
        let code = match data_type {
            DataType::Void => TypeCode::Void,
            DataType::Scalar(kind) => TypeCode::Scalar(*kind),
            DataType::Vector(kind, size) => TypeCode::Vector(*kind, *size),
            DataType::Matrix { columns, rows } => TypeCode::Matrix {
                columns: *columns,
                rows: *rows,
            },
            DataType::Sampler2D => TypeCode::Sampler2D,
            DataType::Struct(name) => TypeCode::Struct(struct_index(name)?),
            DataType::Array(element, length) => TypeCode::Array(
                Box::new(TypeCode::from_data_type(element, struct_index)?),
                *length,
            ),
        };

        Some(code)
    }
}

impl Encode for TypeCode {
    fn encode(&self, sink: &mut Vec<u8>) {
        match self {
            TypeCode::Void => sink.push(TYPE_VOID),
            TypeCode::Scalar(kind) => {
                sink.push(TYPE_SCALAR);
                sink.push(scalar_code(*kind));
            }
            TypeCode::Vector(kind, size) => {
                sink.push(TYPE_VECTOR);
                sink.push(scalar_code(*kind));
                sink.push(*size);
            }
            TypeCode::Matrix { columns, rows } => {
                sink.push(TYPE_MATRIX);
                sink.push(*columns);
                sink.push(*rows);
            }
            TypeCode::Sampler2D => sink.push(TYPE_SAMPLER),
            TypeCode::Struct(index) => {
                sink.push(TYPE_STRUCT);
                index.encode(sink);
            }
            TypeCode::Array(element, length) => {
                sink.push(TYPE_ARRAY);
                length.encode(sink);
                element.encode(sink);
            }
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeCode::Void => f.write_str("void"),
            TypeCode::Scalar(kind) => f.write_str(kind.name()),
            TypeCode::Vector(kind, size) => write!(f, "{}{size}", kind.name()),
            TypeCode::Matrix { columns, rows } => write!(f, "float{columns}x{rows}"),
            TypeCode::Sampler2D => f.write_str("sampler2D"),
            TypeCode::Struct(index) => write!(f, "struct#{index}"),
            TypeCode::Array(element, length) => write!(f, "{element}[{length}]"),
        }
    }
}

/// One decoded instruction.
/// `Construct` with no arguments pushes the zero value of its type,
/// with one argument of a different type it converts.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Nop,
    Line(u32),

    PushInt(i32),
    PushFloat(f32),
    PushBool(bool),
    Pop,
    Dup,

    GetLocal(u32),
    SetLocal(u32),
    GetGlobal(u32),
    SetGlobal(u32),

    RefLocal(u32),
    RefGlobal(u32),
    RefMember(u32),
    RefSwizzle(Vec<u8>),
    RefIndex,
    Load,
    /// Pops a value and a reference, writes through the reference and pushes the value back.
    Store,

    GetMember(u32),
    Swizzle(Vec<u8>),
    Index,
    Construct(TypeCode, u32),

    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Not,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    /// Step operators take a reference and push the new or old value.
    PreInc,
    PreDec,
    PostInc,
    PostDec,

    Jump(u32),
    JumpIfFalse(u32),
    JumpIfTrue(u32),
    Call { function: u32, argument_count: u32 },
    CallBuiltin { intrinsic: u32, argument_count: u32 },
    Return,
    ReturnValue,
    Discard,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::Line(_) => Opcode::Line,
            Instruction::PushInt(_) => Opcode::PushInt,
            Instruction::PushFloat(_) => Opcode::PushFloat,
            Instruction::PushBool(_) => Opcode::PushBool,
            Instruction::Pop => Opcode::Pop,
            Instruction::Dup => Opcode::Dup,
            Instruction::GetLocal(_) => Opcode::GetLocal,
            Instruction::SetLocal(_) => Opcode::SetLocal,
            Instruction::GetGlobal(_) => Opcode::GetGlobal,
            Instruction::SetGlobal(_) => Opcode::SetGlobal,
            Instruction::RefLocal(_) => Opcode::RefLocal,
            Instruction::RefGlobal(_) => Opcode::RefGlobal,
            Instruction::RefMember(_) => Opcode::RefMember,
            Instruction::RefSwizzle(_) => Opcode::RefSwizzle,
            Instruction::RefIndex => Opcode::RefIndex,
            Instruction::Load => Opcode::Load,
            Instruction::Store => Opcode::Store,
            Instruction::GetMember(_) => Opcode::GetMember,
            Instruction::Swizzle(_) => Opcode::Swizzle,
            Instruction::Index => Opcode::Index,
            Instruction::Construct(..) => Opcode::Construct,
            Instruction::Add => Opcode::Add,
            Instruction::Sub => Opcode::Sub,
            Instruction::Mul => Opcode::Mul,
            Instruction::Div => Opcode::Div,
            Instruction::Mod => Opcode::Mod,
            Instruction::Neg => Opcode::Neg,
            Instruction::Not => Opcode::Not,
            Instruction::Eq => Opcode::Eq,
            Instruction::Ne => Opcode::Ne,
            Instruction::Lt => Opcode::Lt,
            Instruction::Gt => Opcode::Gt,
            Instruction::Le => Opcode::Le,
            Instruction::Ge => Opcode::Ge,
            Instruction::PreInc => Opcode::PreInc,
            Instruction::PreDec => Opcode::PreDec,
            Instruction::PostInc => Opcode::PostInc,
            Instruction::PostDec => Opcode::PostDec,
            Instruction::Jump(_) => Opcode::Jump,
            Instruction::JumpIfFalse(_) => Opcode::JumpIfFalse,
            Instruction::JumpIfTrue(_) => Opcode::JumpIfTrue,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::CallBuiltin { .. } => Opcode::CallBuiltin,
            Instruction::Return => Opcode::Return,
            Instruction::ReturnValue => Opcode::ReturnValue,
            Instruction::Discard => Opcode::Discard,
        }
    }

    /// Target of a jump instruction.
    pub fn jump_target(&self) -> Option<u32> {
        match self {
            Instruction::Jump(target)
            | Instruction::JumpIfFalse(target)
            | Instruction::JumpIfTrue(target) => Some(*target),
            _ => None,
        }
    }
}

fn encode_components(components: &[u8], sink: &mut Vec<u8>) {
    sink.push(components.len() as u8);
    sink.extend_from_slice(components);
}

impl Encode for Instruction {
    fn encode(&self, sink: &mut Vec<u8>) {
        sink.push(self.opcode() as u8);

        match self {
            Instruction::Line(value)
            | Instruction::GetLocal(value)
            | Instruction::SetLocal(value)
            | Instruction::GetGlobal(value)
            | Instruction::SetGlobal(value)
            | Instruction::RefLocal(value)
            | Instruction::RefGlobal(value)
            | Instruction::RefMember(value)
            | Instruction::GetMember(value) => value.encode(sink),

            Instruction::PushInt(value) => value.encode(sink),
            Instruction::PushFloat(value) => sink.extend_from_slice(&value.to_bits().to_le_bytes()),
            Instruction::PushBool(value) => sink.push(u8::from(*value)),

            Instruction::RefSwizzle(components) | Instruction::Swizzle(components) => {
                encode_components(components, sink)
            }

            Instruction::Construct(type_code, argument_count) => {
                type_code.encode(sink);
                argument_count.encode(sink);
            }

            Instruction::Jump(target)
            | Instruction::JumpIfFalse(target)
            | Instruction::JumpIfTrue(target) => sink.extend_from_slice(&target.to_le_bytes()),

            Instruction::Call {
                function: index,
                argument_count,
            }
            | Instruction::CallBuiltin {
                intrinsic: index,
                argument_count,
            } => {
                index.encode(sink);
                argument_count.encode(sink);
            }

            _ => {}
        }
    }
}

fn write_components(f: &mut fmt::Formatter<'_>, components: &[u8]) -> fmt::Result {
    const LETTERS: [char; 4] = ['x', 'y', 'z', 'w'];
    f.write_str(".")?;
    for component in components {
        let letter = LETTERS.get(*component as usize).copied().unwrap_or('?');
        write!(f, "{letter}")?;
    }
    Ok(())
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode().mnemonic())?;

        match self {
            Instruction::Line(value)
            | Instruction::GetLocal(value)
            | Instruction::SetLocal(value)
            | Instruction::GetGlobal(value)
            | Instruction::SetGlobal(value)
            | Instruction::RefLocal(value)
            | Instruction::RefGlobal(value)
            | Instruction::RefMember(value)
            | Instruction::GetMember(value) => write!(f, " {value}"),

            Instruction::PushInt(value) => write!(f, " {value}"),
            Instruction::PushFloat(value) => write!(f, " {value:?}"),
            Instruction::PushBool(value) => write!(f, " {value}"),

            Instruction::RefSwizzle(components) | Instruction::Swizzle(components) => {
                f.write_str(" ")?;
                write_components(f, components)
            }

            Instruction::Construct(type_code, argument_count) => {
                write!(f, " {type_code} {argument_count}")
            }

            Instruction::Jump(target)
            | Instruction::JumpIfFalse(target)
            | Instruction::JumpIfTrue(target) => write!(f, " @{target}"),

            Instruction::Call {
                function,
                argument_count,
            } => write!(f, " fn#{function} {argument_count}"),
            Instruction::CallBuiltin {
                intrinsic,
                argument_count,
            } => match Intrinsic::from_id(*intrinsic) {
                Some(known) => write!(f, " {} {argument_count}", known.name()),
                None => write!(f, " builtin#{intrinsic} {argument_count}"),
            },

            _ => Ok(()),
        }
    }
}
