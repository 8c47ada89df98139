use crate::backends::bytecode::instructions::{Instruction, JUMP_OPERAND_SIZE, Opcode};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::settings::BYTECODE_INITIAL_CAPACITY;
use crate::{codegen_log, return_compiler_error};
use wasm_encoder::Encode;

/// Growable instruction buffer.
///
/// Instructions are appended in order. Jumps whose target isn't known yet are
/// written with a placeholder and patched once the target is reached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BytecodeGenerator {
    bytes: Vec<u8>,
}

/// Operand position of a jump waiting for its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct PendingJump(usize);

impl BytecodeGenerator {
    pub fn new() -> Self {
        BytecodeGenerator {
            bytes: Vec::with_capacity(BYTECODE_INITIAL_CAPACITY),
        }
    }

    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Offset the next instruction will be written at.
    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn emit(&mut self, instruction: Instruction) {
        codegen_log!(format!("{:>6}  {instruction}", self.bytes.len()));
        instruction.encode(&mut self.bytes);
    }

    /// Writes a jump to a target that comes later in the code.
    pub fn emit_forward_jump(&mut self, opcode: Opcode) -> Result<PendingJump, CompilerError> {
        if !matches!(
            opcode,
            Opcode::Jump | Opcode::JumpIfFalse | Opcode::JumpIfTrue
        ) {
            return_compiler_error!("{} is not a jump", opcode.mnemonic());
        }

        self.bytes.push(opcode as u8);
        let operand = self.bytes.len();
        self.bytes.extend_from_slice(&[0; JUMP_OPERAND_SIZE]);
        Ok(PendingJump(operand))
    }

    /// Points a pending jump at the current position.
    pub fn patch_to_here(&mut self, jump: PendingJump) -> Result<(), CompilerError> {
        let target = self.position();
        self.patch(jump, target)
    }

    pub fn patch(&mut self, jump: PendingJump, target: usize) -> Result<(), CompilerError> {
        let Ok(target) = u32::try_from(target) else {
            return_compiler_error!("Jump target {} doesn't fit the operand", target);
        };

        match self.bytes.get_mut(jump.0..jump.0 + JUMP_OPERAND_SIZE) {
            Some(operand) => {
                operand.copy_from_slice(&target.to_le_bytes());
                Ok(())
            }
            None => return_compiler_error!("Jump operand at {} is outside the code", jump.0),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
