//! Decodes bytecode back into instructions, for listings, debugger front ends and tests.

use crate::backends::bytecode::instructions::{
    Instruction, Opcode, TYPE_ARRAY, TYPE_MATRIX, TYPE_SAMPLER, TYPE_SCALAR, TYPE_STRUCT,
    TYPE_VECTOR, TYPE_VOID, TypeCode, scalar_from_code,
};
use std::fmt;
use wasmparser::{BinaryReader, BinaryReaderError};

/// Malformed bytecode, with the offset the problem was found at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BytecodeError {
    pub offset: usize,
    pub message: String,
}

impl BytecodeError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        BytecodeError {
            offset,
            message: message.into(),
        }
    }
}

impl From<BinaryReaderError> for BytecodeError {
    fn from(error: BinaryReaderError) -> Self {
        BytecodeError::new(error.offset(), error.message())
    }
}

impl fmt::Display for BytecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid bytecode at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for BytecodeError {}

pub struct BytecodeReader<'a> {
    reader: BinaryReader<'a>,
}

impl<'a> BytecodeReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BytecodeReader {
            reader: BinaryReader::new(bytes, 0),
        }
    }

    pub fn position(&self) -> usize {
        self.reader.original_position()
    }

    pub fn is_at_end(&self) -> bool {
        self.reader.eof()
    }

    /// Next instruction and the offset it starts at, None at the end of the code.
    pub fn read(&mut self) -> Result<Option<(usize, Instruction)>, BytecodeError> {
        if self.reader.eof() {
            return Ok(None);
        }

        let offset = self.position();
        let byte = self.reader.read_u8()?;
        let Some(opcode) = Opcode::from_byte(byte) else {
            return Err(BytecodeError::new(
                offset,
                format!("unknown opcode 0x{byte:02X}"),
            ));
        };

        let instruction = match opcode {
            Opcode::Nop => Instruction::Nop,
            Opcode::Line => Instruction::Line(self.reader.read_var_u32()?),

            Opcode::PushInt => Instruction::PushInt(self.reader.read_var_i32()?),
            Opcode::PushFloat => Instruction::PushFloat(f32::from_bits(self.reader.read_u32()?)),
            Opcode::PushBool => match self.reader.read_u8()? {
                0 => Instruction::PushBool(false),
                1 => Instruction::PushBool(true),
                other => {
                    return Err(BytecodeError::new(
                        offset,
                        format!("bool operand must be 0 or 1, found {other}"),
                    ));
                }
            },
            Opcode::Pop => Instruction::Pop,
            Opcode::Dup => Instruction::Dup,

            Opcode::GetLocal => Instruction::GetLocal(self.reader.read_var_u32()?),
            Opcode::SetLocal => Instruction::SetLocal(self.reader.read_var_u32()?),
            Opcode::GetGlobal => Instruction::GetGlobal(self.reader.read_var_u32()?),
            Opcode::SetGlobal => Instruction::SetGlobal(self.reader.read_var_u32()?),

            Opcode::RefLocal => Instruction::RefLocal(self.reader.read_var_u32()?),
            Opcode::RefGlobal => Instruction::RefGlobal(self.reader.read_var_u32()?),
            Opcode::RefMember => Instruction::RefMember(self.reader.read_var_u32()?),
            Opcode::RefSwizzle => Instruction::RefSwizzle(self.read_components(offset)?),
            Opcode::RefIndex => Instruction::RefIndex,
            Opcode::Load => Instruction::Load,
            Opcode::Store => Instruction::Store,

            Opcode::GetMember => Instruction::GetMember(self.reader.read_var_u32()?),
            Opcode::Swizzle => Instruction::Swizzle(self.read_components(offset)?),
            Opcode::Index => Instruction::Index,
            Opcode::Construct => {
                let type_code = self.read_type_code(offset)?;
                Instruction::Construct(type_code, self.reader.read_var_u32()?)
            }

            Opcode::Add => Instruction::Add,
            Opcode::Sub => Instruction::Sub,
            Opcode::Mul => Instruction::Mul,
            Opcode::Div => Instruction::Div,
            Opcode::Mod => Instruction::Mod,
            Opcode::Neg => Instruction::Neg,
            Opcode::Not => Instruction::Not,
            Opcode::Eq => Instruction::Eq,
            Opcode::Ne => Instruction::Ne,
            Opcode::Lt => Instruction::Lt,
            Opcode::Gt => Instruction::Gt,
            Opcode::Le => Instruction::Le,
            Opcode::Ge => Instruction::Ge,

            Opcode::PreInc => Instruction::PreInc,
            Opcode::PreDec => Instruction::PreDec,
            Opcode::PostInc => Instruction::PostInc,
            Opcode::PostDec => Instruction::PostDec,

            Opcode::Jump => Instruction::Jump(self.reader.read_u32()?),
            Opcode::JumpIfFalse => Instruction::JumpIfFalse(self.reader.read_u32()?),
            Opcode::JumpIfTrue => Instruction::JumpIfTrue(self.reader.read_u32()?),
            Opcode::Call => Instruction::Call {
                function: self.reader.read_var_u32()?,
                argument_count: self.reader.read_var_u32()?,
            },
            Opcode::CallBuiltin => Instruction::CallBuiltin {
                intrinsic: self.reader.read_var_u32()?,
                argument_count: self.reader.read_var_u32()?,
            },
            Opcode::Return => Instruction::Return,
            Opcode::ReturnValue => Instruction::ReturnValue,
            Opcode::Discard => Instruction::Discard,
        };

        Ok(Some((offset, instruction)))
    }

    fn read_components(&mut self, offset: usize) -> Result<Vec<u8>, BytecodeError> {
        let count = self.reader.read_u8()?;
        if count == 0 || count > 4 {
            return Err(BytecodeError::new(
                offset,
                format!("swizzle must have 1 to 4 components, found {count}"),
            ));
        }

        let mut components = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let component = self.reader.read_u8()?;
            if component > 3 {
                return Err(BytecodeError::new(
                    offset,
                    format!("swizzle component {component} is out of range"),
                ));
            }
            components.push(component);
        }

        Ok(components)
    }

    fn read_scalar(&mut self, offset: usize) -> Result<crate::compiler_frontend::datatypes::ScalarKind, BytecodeError> {
        let code = self.reader.read_u8()?;
        scalar_from_code(code)
            .ok_or_else(|| BytecodeError::new(offset, format!("unknown scalar code {code}")))
    }

    fn read_type_code(&mut self, offset: usize) -> Result<TypeCode, BytecodeError> {
        let tag = self.reader.read_u8()?;

        let type_code = match tag {
            TYPE_VOID => TypeCode::Void,
            TYPE_SCALAR => TypeCode::Scalar(self.read_scalar(offset)?),
            TYPE_VECTOR => {
                let kind = self.read_scalar(offset)?;
                TypeCode::Vector(kind, self.reader.read_u8()?)
            }
            TYPE_MATRIX => {
                let columns = self.reader.read_u8()?;
                TypeCode::Matrix {
                    columns,
                    rows: self.reader.read_u8()?,
                }
            }
            TYPE_SAMPLER => TypeCode::Sampler2D,
            TYPE_STRUCT => TypeCode::Struct(self.reader.read_var_u32()?),
            TYPE_ARRAY => {
                let length = self.reader.read_var_u32()?;
                TypeCode::Array(Box::new(self.read_type_code(offset)?), length)
            }
            other => {
                return Err(BytecodeError::new(
                    offset,
                    format!("unknown type code {other}"),
                ));
            }
        };

        Ok(type_code)
    }
}

/// A decoded instruction and where it starts.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingEntry {
    pub offset: usize,
    pub instruction: Instruction,
}

/// Decoded code, printable as one instruction per line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    pub entries: Vec<ListingEntry>,
}

impl Listing {
    /// True if `offset` is the start of an instruction.
    pub fn is_instruction_start(&self, offset: usize) -> bool {
        self.entries
            .binary_search_by_key(&offset, |entry| entry.offset)
            .is_ok()
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{:>6}  {}", entry.offset, entry.instruction)?;
        }
        Ok(())
    }
}

/// Decodes a whole code buffer. Jump targets are checked against instruction starts.
pub fn disassemble(bytes: &[u8]) -> Result<Listing, BytecodeError> {
    let mut reader = BytecodeReader::new(bytes);
    let mut entries = Vec::new();

    while let Some((offset, instruction)) = reader.read()? {
        entries.push(ListingEntry {
            offset,
            instruction,
        });
    }

    let listing = Listing { entries };

    for entry in &listing.entries {
        if let Some(target) = entry.instruction.jump_target() {
            let target = target as usize;
            // A jump to the very end is how a function with nothing after it exits a loop
            if target != bytes.len() && !listing.is_instruction_start(target) {
                return Err(BytecodeError::new(
                    entry.offset,
                    format!("jump target {target} is not the start of an instruction"),
                ));
            }
        }
    }

    Ok(listing)
}
