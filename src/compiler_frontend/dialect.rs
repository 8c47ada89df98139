use crate::compiler_frontend::datatypes::{DataType, ScalarKind};
use crate::compiler_frontend::tokenizer::tokens::TokenKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage a shader is written for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
    Compute,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Pixel => "pixel",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// The shading language a translator front end accepts.
///
/// Both dialects go through the same tokenizer, parser and lowering.
/// Everything that differs between them is answered here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadingLanguage {
    Glsl,
    Hlsl,
}

impl fmt::Display for ShadingLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadingLanguage::Glsl => f.write_str("GLSL"),
            ShadingLanguage::Hlsl => f.write_str("HLSL"),
        }
    }
}

impl ShadingLanguage {
    pub fn supported_stages(self) -> &'static [ShaderStage] {
        match self {
            ShadingLanguage::Glsl => &[
                ShaderStage::Vertex,
                ShaderStage::Pixel,
                ShaderStage::Geometry,
                ShaderStage::Compute,
            ],
            ShadingLanguage::Hlsl => &[ShaderStage::Vertex, ShaderStage::Pixel, ShaderStage::Compute],
        }
    }

    pub fn supports_stage(self, stage: ShaderStage) -> bool {
        self.supported_stages().contains(&stage)
    }

    /// Reserved words of the dialect. Type names are not keywords, they're resolved as symbols.
    pub fn keyword(self, word: &str) -> Option<TokenKind> {
        let common = match word {
            "struct" => Some(TokenKind::Struct),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "for" => Some(TokenKind::For),
            "while" => Some(TokenKind::While),
            "do" => Some(TokenKind::Do),
            "return" => Some(TokenKind::Return),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "discard" => Some(TokenKind::Discard),
            "const" => Some(TokenKind::Const),
            "uniform" => Some(TokenKind::Uniform),
            "in" => Some(TokenKind::In),
            "out" => Some(TokenKind::Out),
            "inout" => Some(TokenKind::InOut),
            "true" => Some(TokenKind::BoolLiteral(true)),
            "false" => Some(TokenKind::BoolLiteral(false)),
            _ => None,
        };

        if common.is_some() {
            return common;
        }

        match self {
            ShadingLanguage::Glsl => match word {
                "attribute" => Some(TokenKind::Attribute),
                "varying" => Some(TokenKind::Varying),
                "layout" => Some(TokenKind::Layout),
                "precision" => Some(TokenKind::Precision),
                "lowp" | "mediump" | "highp" => Some(TokenKind::PrecisionQualifier),
                _ => None,
            },
            ShadingLanguage::Hlsl => match word {
                "static" => Some(TokenKind::Static),
                "groupshared" => Some(TokenKind::GroupShared),
                "cbuffer" => Some(TokenKind::CBuffer),
                _ => None,
            },
        }
    }

    /// Resolves a built in type name (`vec3`, `float4x4`, ...).
    pub fn builtin_type(self, name: &str) -> Option<DataType> {
        match name {
            "void" => return Some(DataType::Void),
            "bool" => return Some(DataType::Scalar(ScalarKind::Bool)),
            "int" => return Some(DataType::Scalar(ScalarKind::Int)),
            "float" => return Some(DataType::Scalar(ScalarKind::Float)),
            "sampler2D" => return Some(DataType::Sampler2D),
            _ => {}
        }

        match self {
            ShadingLanguage::Glsl => glsl_builtin_type(name),
            ShadingLanguage::Hlsl => hlsl_builtin_type(name),
        }
    }

    /// Spelling of a type in this dialect.
    pub fn type_name(self, data_type: &DataType) -> String {
        match (self, data_type) {
            (ShadingLanguage::Glsl, _) => data_type.to_string(),
            (ShadingLanguage::Hlsl, DataType::Vector(kind, size)) => {
                format!("{}{size}", kind.name())
            }
            (ShadingLanguage::Hlsl, DataType::Matrix { columns, rows }) => {
                format!("float{rows}x{columns}")
            }
            (ShadingLanguage::Hlsl, DataType::Array(element, length)) => {
                format!("{}[{length}]", self.type_name(element))
            }
            (ShadingLanguage::Hlsl, _) => data_type.to_string(),
        }
    }

    /// HLSL attaches `: SEMANTIC` annotations to declarations.
    pub fn has_semantics(self) -> bool {
        self == ShadingLanguage::Hlsl
    }

    /// Component index for a swizzle letter.
    pub fn swizzle_component(self, letter: char) -> Option<(u8, SwizzleSet)> {
        let found = match letter {
            'x' => (0, SwizzleSet::Position),
            'y' => (1, SwizzleSet::Position),
            'z' => (2, SwizzleSet::Position),
            'w' => (3, SwizzleSet::Position),
            'r' => (0, SwizzleSet::Colour),
            'g' => (1, SwizzleSet::Colour),
            'b' => (2, SwizzleSet::Colour),
            'a' => (3, SwizzleSet::Colour),
            's' if self == ShadingLanguage::Glsl => (0, SwizzleSet::Texture),
            't' if self == ShadingLanguage::Glsl => (1, SwizzleSet::Texture),
            'p' if self == ShadingLanguage::Glsl => (2, SwizzleSet::Texture),
            'q' if self == ShadingLanguage::Glsl => (3, SwizzleSet::Texture),
            _ => return None,
        };

        Some(found)
    }
}

/// Swizzle letters can't mix sets: `.xg` is invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwizzleSet {
    Position,
    Colour,
    Texture,
}

fn glsl_builtin_type(name: &str) -> Option<DataType> {
    let (prefix, rest) = if let Some(rest) = name.strip_prefix("ivec") {
        (Some(ScalarKind::Int), rest)
    } else if let Some(rest) = name.strip_prefix("bvec") {
        (Some(ScalarKind::Bool), rest)
    } else if let Some(rest) = name.strip_prefix("vec") {
        (Some(ScalarKind::Float), rest)
    } else if let Some(rest) = name.strip_prefix("mat") {
        (None, rest)
    } else {
        return None;
    };

    match prefix {
        Some(kind) => parse_dimension(rest).map(|size| DataType::Vector(kind, size)),

        // mat3 is mat3x3, matCxR is C columns by R rows
        None => match rest.split_once('x') {
            Some((columns, rows)) => Some(DataType::Matrix {
                columns: parse_dimension(columns)?,
                rows: parse_dimension(rows)?,
            }),
            None => parse_dimension(rest).map(|size| DataType::Matrix {
                columns: size,
                rows: size,
            }),
        },
    }
}

fn hlsl_builtin_type(name: &str) -> Option<DataType> {
    if name == "half" {
        return Some(DataType::Scalar(ScalarKind::Float));
    }

    let (kind, rest) = if let Some(rest) = name.strip_prefix("float") {
        (ScalarKind::Float, rest)
    } else if let Some(rest) = name.strip_prefix("half") {
        (ScalarKind::Float, rest)
    } else if let Some(rest) = name.strip_prefix("int") {
        (ScalarKind::Int, rest)
    } else if let Some(rest) = name.strip_prefix("bool") {
        (ScalarKind::Bool, rest)
    } else {
        return None;
    };

    match rest.split_once('x') {
        // floatRxC is R rows by C columns
        Some((rows, columns)) if kind == ScalarKind::Float => Some(DataType::Matrix {
            columns: parse_dimension(columns)?,
            rows: parse_dimension(rows)?,
        }),
        Some(_) => None,
        None => parse_dimension(rest).map(|size| DataType::Vector(kind, size)),
    }
}

fn parse_dimension(text: &str) -> Option<u8> {
    match text {
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}
