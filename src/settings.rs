use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorType};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_ENTRY_POINT: &str = "main";

/// Name the global initialiser routine is reported under in listings.
pub const GLOBAL_INIT_LABEL: &str = "<global init>";

// This is a guess about how much should be initially allocated for the token and node vecs.
// Rough heuristics from small shaders, not measured carefully.
pub const SRC_TO_TOKEN_RATIO: usize = 4; // About 1/4 of shader source characters become tokens
pub const TOKEN_TO_DECLARATION_RATIO: usize = 20;
pub const MINIMUM_STRING_TABLE_CAPACITY: usize = 64;
pub const BYTECODE_INITIAL_CAPACITY: usize = 256;

/// Deepest nesting of expressions and statements the parser accepts.
/// Lowering and emission recurse over the same tree, so this bounds their stack use too.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Options shared by every dialect translator.
///
/// Can be built in code, or loaded from TOML:
/// ```toml
/// emit_line_markers = true
/// implicit_int_to_float = true
/// warnings_enabled = false
/// max_errors = 10
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    /// Emit a `Line` instruction before every statement so a debugger can step by source line.
    pub emit_line_markers: bool,

    /// Allow `int` values where `float` is expected (constructors, arithmetic, arguments).
    pub implicit_int_to_float: bool,

    pub warnings_enabled: bool,

    /// Lowering stops collecting errors past this many.
    pub max_errors: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            emit_line_markers: true,
            implicit_int_to_float: true,
            warnings_enabled: true,
            max_errors: 20,
        }
    }
}

impl TranslatorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, CompilerError> {
        match toml::from_str::<TranslatorConfig>(source) {
            Ok(config) if config.max_errors == 0 => Err(CompilerError::new(
                "max_errors must be at least 1",
                Default::default(),
                ErrorType::Config,
            )),
            Ok(config) => Ok(config),
            Err(error) => Err(CompilerError::new(
                format!("Malformed translator config: {}", error.message()),
                Default::default(),
                ErrorType::Config,
            )),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let source = fs::read_to_string(path).map_err(|error| {
            CompilerError::new(
                format!("Can't read config file {}: {error}", path.display()),
                Default::default(),
                ErrorType::Config,
            )
        })?;

        Self::from_toml_str(&source)
    }
}
