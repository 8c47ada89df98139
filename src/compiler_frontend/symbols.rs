//! Symbol metadata recorded for the debugger.
//!
//! These are the entries of the global, structure and function registries of a
//! translation unit. They are created while lowering and never change afterwards.

use crate::compiler_frontend::datatypes::DataType;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum StorageQualifier {
    Const,
    Uniform,
    In,
    Out,
    Attribute,
    Varying,
    Static,
    GroupShared,
}

impl fmt::Display for StorageQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageQualifier::Const => "const",
            StorageQualifier::Uniform => "uniform",
            StorageQualifier::In => "in",
            StorageQualifier::Out => "out",
            StorageQualifier::Attribute => "attribute",
            StorageQualifier::Varying => "varying",
            StorageQualifier::Static => "static",
            StorageQualifier::GroupShared => "groupshared",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub enum ParameterQualifier {
    #[default]
    In,
    Out,
    InOut,
}

impl ParameterQualifier {
    /// Out and inout arguments are passed by reference and must be assignable.
    pub fn by_reference(self) -> bool {
        !matches!(self, ParameterQualifier::In)
    }
}

/// `layout(location = 0)` style entries on a GLSL declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LayoutEntry {
    pub name: String,
    pub value: Option<i64>,
}

/// HLSL constant buffer a uniform was declared in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BufferBinding {
    pub name: String,
    /// Slot from `register(b0)`, if one was given
    pub register: Option<String>,
}

/// A global variable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub data_type: DataType,
    pub storage: Option<StorageQualifier>,
    pub semantic: Option<String>,
    pub layout: Vec<LayoutEntry>,
    pub buffer: Option<BufferBinding>,
}

impl Variable {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Variable {
            name: name.into(),
            data_type,
            storage: None,
            semantic: None,
            layout: Vec::new(),
            buffer: None,
        }
    }

    pub fn with_storage(mut self, storage: StorageQualifier) -> Self {
        self.storage = Some(storage);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StructMember {
    pub name: String,
    pub data_type: DataType,
    pub semantic: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Structure {
    pub name: String,
    pub members: Vec<StructMember>,
}

impl Structure {
    /// Index and definition of a member, the index is the `GetMember` operand.
    pub fn member(&self, name: &str) -> Option<(u32, &StructMember)> {
        self.members
            .iter()
            .enumerate()
            .find(|(_, member)| member.name == name)
            .map(|(index, member)| (index as u32, member))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
    pub qualifier: ParameterQualifier,
    pub semantic: Option<String>,
}

/// A function signature and where its code starts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    pub return_type: DataType,
    pub parameters: Vec<Parameter>,
    pub return_semantic: Option<String>,

    /// Byte offset of the first instruction of the body.
    pub address: usize,
}

impl Function {
    /// Same name, return type and parameter types and qualifiers.
    /// A prototype and its definition must agree on this.
    pub fn same_signature(&self, other: &Function) -> bool {
        self.name == other.name
            && self.return_type == other.return_type
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.data_type == b.data_type && a.qualifier == b.qualifier)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            if parameter.qualifier != ParameterQualifier::In {
                let qualifier = match parameter.qualifier {
                    ParameterQualifier::Out => "out ",
                    _ => "inout ",
                };
                f.write_str(qualifier)?;
            }
            write!(f, "{} {}", parameter.data_type, parameter.name)?;
        }
        f.write_str(")")
    }
}
