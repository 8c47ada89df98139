use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompilerWarning {
    pub msg: String,
    pub location: TextLocation,
    pub warning_kind: WarningKind,
}

impl CompilerWarning {
    pub fn new(msg: impl Into<String>, location: TextLocation, warning_kind: WarningKind) -> Self {
        CompilerWarning {
            msg: msg.into(),
            location,
            warning_kind,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum WarningKind {
    UnusedVariable,
    MissingReturn,
    ShadowedGlobal,
    IgnoredDirective,
}

pub fn warning_kind_to_str(kind: WarningKind) -> &'static str {
    match kind {
        WarningKind::UnusedVariable => "Unused variable",
        WarningKind::MissingReturn => "Missing return",
        WarningKind::ShadowedGlobal => "Shadowed global",
        WarningKind::IgnoredDirective => "Ignored directive",
    }
}
