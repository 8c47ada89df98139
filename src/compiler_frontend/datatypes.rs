use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
        }
    }
}

/// A type as the translator sees it.
/// Matrices are always float, `columns` x `rows` whatever the dialect spelling.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Void,
    Scalar(ScalarKind),
    Vector(ScalarKind, u8),
    Matrix { columns: u8, rows: u8 },
    Sampler2D,
    Struct(String),
    Array(Box<DataType>, u32),
}

impl DataType {
    pub const BOOL: DataType = DataType::Scalar(ScalarKind::Bool);
    pub const INT: DataType = DataType::Scalar(ScalarKind::Int);
    pub const FLOAT: DataType = DataType::Scalar(ScalarKind::Float);

    pub fn float_vector(size: u8) -> DataType {
        match size {
            1 => DataType::FLOAT,
            size => DataType::Vector(ScalarKind::Float, size),
        }
    }

    /// Scalar or vector with `size` components of `kind`.
    pub fn with_components(kind: ScalarKind, size: u8) -> DataType {
        match size {
            1 => DataType::Scalar(kind),
            size => DataType::Vector(kind, size),
        }
    }

    /// Component kind of scalars, vectors and matrices.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            DataType::Scalar(kind) | DataType::Vector(kind, _) => Some(*kind),
            DataType::Matrix { .. } => Some(ScalarKind::Float),
            _ => None,
        }
    }

    /// Number of scalar components, for constructor argument counting.
    pub fn component_count(&self) -> Option<u32> {
        match self {
            DataType::Scalar(_) => Some(1),
            DataType::Vector(_, size) => Some(*size as u32),
            DataType::Matrix { columns, rows } => Some(*columns as u32 * *rows as u32),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, DataType::Void)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, DataType::Scalar(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, DataType::Scalar(ScalarKind::Bool))
    }

    /// int or float based scalar, vector or matrix.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.scalar_kind(),
            Some(ScalarKind::Int) | Some(ScalarKind::Float)
        )
    }

    pub fn is_int_based(&self) -> bool {
        matches!(self, DataType::Scalar(ScalarKind::Int) | DataType::Vector(ScalarKind::Int, _))
    }

    /// float scalar or float vector, the `genType` of the intrinsic signatures.
    pub fn is_float_scalar_or_vector(&self) -> bool {
        matches!(
            self,
            DataType::Scalar(ScalarKind::Float) | DataType::Vector(ScalarKind::Float, _)
        )
    }

    /// Scalars, vectors and matrices can be built by a constructor call.
    pub fn is_constructible_builtin(&self) -> bool {
        matches!(
            self,
            DataType::Scalar(_) | DataType::Vector(..) | DataType::Matrix { .. }
        )
    }

    /// Same shape with float components, used for int to float promotion.
    pub fn to_float_based(&self) -> DataType {
        match self {
            DataType::Scalar(ScalarKind::Int) => DataType::FLOAT,
            DataType::Vector(ScalarKind::Int, size) => DataType::Vector(ScalarKind::Float, *size),
            other => other.clone(),
        }
    }

    /// True when a value of type `self` can be used where `target` is expected,
    /// possibly after an implicit int to float promotion.
    pub fn converts_to(&self, target: &DataType, allow_int_to_float: bool) -> bool {
        self == target
            || (allow_int_to_float && self.is_int_based() && &self.to_float_based() == target)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Void => f.write_str("void"),
            DataType::Scalar(kind) => f.write_str(kind.name()),
            DataType::Vector(ScalarKind::Float, size) => write!(f, "vec{size}"),
            DataType::Vector(ScalarKind::Int, size) => write!(f, "ivec{size}"),
            DataType::Vector(ScalarKind::Bool, size) => write!(f, "bvec{size}"),
            DataType::Matrix { columns, rows } if columns == rows => write!(f, "mat{columns}"),
            DataType::Matrix { columns, rows } => write!(f, "mat{columns}x{rows}"),
            DataType::Sampler2D => f.write_str("sampler2D"),
            DataType::Struct(name) => f.write_str(name),
            DataType::Array(element, length) => write!(f, "{element}[{length}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_vectors_promote_to_float_vectors() {
        let ivec3 = DataType::Vector(ScalarKind::Int, 3);
        let vec3 = DataType::Vector(ScalarKind::Float, 3);

        assert!(ivec3.converts_to(&vec3, true));
        assert!(!ivec3.converts_to(&vec3, false));
        assert!(!vec3.converts_to(&ivec3, true));
        assert!(!DataType::BOOL.converts_to(&DataType::FLOAT, true));
    }

    #[test]
    fn component_counts() {
        assert_eq!(DataType::FLOAT.component_count(), Some(1));
        assert_eq!(DataType::float_vector(4).component_count(), Some(4));
        assert_eq!(
            DataType::Matrix { columns: 3, rows: 2 }.component_count(),
            Some(6)
        );
        assert_eq!(DataType::Struct("Light".into()).component_count(), None);
    }

    #[test]
    fn display_uses_glsl_spelling() {
        assert_eq!(DataType::Matrix { columns: 4, rows: 4 }.to_string(), "mat4");
        assert_eq!(DataType::Matrix { columns: 2, rows: 3 }.to_string(), "mat2x3");
        assert_eq!(
            DataType::Array(Box::new(DataType::float_vector(2)), 8).to_string(),
            "vec2[8]"
        );
    }
}
