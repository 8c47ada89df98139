//! Translates GLSL and HLSL shaders into stack machine bytecode plus the symbol
//! metadata a bytecode debugger needs to make sense of it.
//!
//! ```no_run
//! use shader_translator::{GlslTranslator, ShaderStage, Translator};
//!
//! let mut translator = GlslTranslator::new();
//! translator
//!     .parse_main(ShaderStage::Pixel, "void main() { gl_FragColor = vec4(1.0); }")
//!     .expect("shader should translate");
//!
//! assert!(!translator.bytecode().is_empty());
//! ```

pub mod settings;

pub(crate) mod compiler_frontend;

pub(crate) mod backends {
    pub(crate) mod bytecode;
}

pub mod translator;

pub use backends::bytecode::generator::{BytecodeGenerator, PendingJump};
pub use backends::bytecode::instructions::{Instruction, Opcode, TypeCode};
pub use backends::bytecode::reader::{
    BytecodeError, BytecodeReader, Listing, ListingEntry, disassemble,
};
pub use compiler_frontend::compiler_errors::{
    CompilerError, CompilerMessages, ErrorMetaDataKey, ErrorType,
};
pub use compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
pub use compiler_frontend::datatypes::{DataType, ScalarKind};
pub use compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
pub use compiler_frontend::display_messages::print_compiler_messages;
pub use compiler_frontend::symbols::{
    BufferBinding, Function, LayoutEntry, Parameter, ParameterQualifier, StorageQualifier,
    StructMember, Structure, Variable,
};
pub use compiler_frontend::tokenizer::tokens::{CharPosition, TextLocation};
pub use settings::{DEFAULT_ENTRY_POINT, TranslatorConfig};
pub use translator::{
    GlslTranslator, HlslTranslator, TranslatedShader, TranslationJob, TranslationOutcome,
    TranslationUnit, Translator, TranslatorCore, translate_batch, translator_for,
};
