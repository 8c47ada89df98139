//! Intrinsic functions and stage provided variables of each dialect.

use crate::compiler_frontend::datatypes::{DataType, ScalarKind};
use crate::compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
use crate::compiler_frontend::symbols::{StorageQualifier, Variable};
use serde::Serialize;

/// Built in functions. The discriminant is the `CallBuiltin` operand,
/// so new variants only go at the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Intrinsic {
    Radians,
    Degrees,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Pow,
    Exp,
    Log,
    Exp2,
    Log2,
    Sqrt,
    InverseSqrt,
    Abs,
    Sign,
    Floor,
    Ceil,
    Fract,
    Mod,
    Min,
    Max,
    Clamp,
    Saturate,
    Mix,
    Step,
    Smoothstep,
    Length,
    Distance,
    Dot,
    Cross,
    Normalize,
    Reflect,
    Refract,
    Texture,
    MatrixMultiply,
    EmitVertex,
    EndPrimitive,
}

/// How the argument types of an intrinsic relate to each other and the result.
/// `T` is a float scalar or float vector (genType).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntrinsicShape {
    /// T -> T
    Unary,
    /// (T, T) -> T
    Binary,
    /// (T, T or float) -> T
    BinaryScalarRight,
    /// (T, T or float, T or float) -> T
    Clamp,
    /// (T, T, T or float) -> T
    Mix,
    /// (T or float, T) -> T
    Step,
    /// (T or float, T or float, T) -> T
    Smoothstep,
    /// T -> float
    Length,
    /// (T, T) -> float
    Dot,
    /// (vec3, vec3) -> vec3
    Cross,
    /// (T, T, float) -> T
    Refract,
    /// (sampler2D, vec2) -> vec4
    Texture,
    /// Typed like the `*` operator
    MatrixMultiply,
    /// () -> void
    Void,
}

const ALL_INTRINSICS: [Intrinsic; 40] = [
    Intrinsic::Radians,
    Intrinsic::Degrees,
    Intrinsic::Sin,
    Intrinsic::Cos,
    Intrinsic::Tan,
    Intrinsic::Asin,
    Intrinsic::Acos,
    Intrinsic::Atan,
    Intrinsic::Atan2,
    Intrinsic::Pow,
    Intrinsic::Exp,
    Intrinsic::Log,
    Intrinsic::Exp2,
    Intrinsic::Log2,
    Intrinsic::Sqrt,
    Intrinsic::InverseSqrt,
    Intrinsic::Abs,
    Intrinsic::Sign,
    Intrinsic::Floor,
    Intrinsic::Ceil,
    Intrinsic::Fract,
    Intrinsic::Mod,
    Intrinsic::Min,
    Intrinsic::Max,
    Intrinsic::Clamp,
    Intrinsic::Saturate,
    Intrinsic::Mix,
    Intrinsic::Step,
    Intrinsic::Smoothstep,
    Intrinsic::Length,
    Intrinsic::Distance,
    Intrinsic::Dot,
    Intrinsic::Cross,
    Intrinsic::Normalize,
    Intrinsic::Reflect,
    Intrinsic::Refract,
    Intrinsic::Texture,
    Intrinsic::MatrixMultiply,
    Intrinsic::EmitVertex,
    Intrinsic::EndPrimitive,
];

impl Intrinsic {
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Intrinsic> {
        ALL_INTRINSICS.get(id as usize).copied()
    }

    /// Finds the intrinsic a call refers to.
    /// `argument_count` picks between GLSL's one and two argument `atan`.
    pub fn lookup(language: ShadingLanguage, name: &str, argument_count: usize) -> Option<Intrinsic> {
        let common = match name {
            "radians" => Some(Intrinsic::Radians),
            "degrees" => Some(Intrinsic::Degrees),
            "sin" => Some(Intrinsic::Sin),
            "cos" => Some(Intrinsic::Cos),
            "tan" => Some(Intrinsic::Tan),
            "asin" => Some(Intrinsic::Asin),
            "acos" => Some(Intrinsic::Acos),
            "pow" => Some(Intrinsic::Pow),
            "exp" => Some(Intrinsic::Exp),
            "log" => Some(Intrinsic::Log),
            "exp2" => Some(Intrinsic::Exp2),
            "log2" => Some(Intrinsic::Log2),
            "sqrt" => Some(Intrinsic::Sqrt),
            "abs" => Some(Intrinsic::Abs),
            "sign" => Some(Intrinsic::Sign),
            "floor" => Some(Intrinsic::Floor),
            "ceil" => Some(Intrinsic::Ceil),
            "min" => Some(Intrinsic::Min),
            "max" => Some(Intrinsic::Max),
            "clamp" => Some(Intrinsic::Clamp),
            "step" => Some(Intrinsic::Step),
            "smoothstep" => Some(Intrinsic::Smoothstep),
            "length" => Some(Intrinsic::Length),
            "distance" => Some(Intrinsic::Distance),
            "dot" => Some(Intrinsic::Dot),
            "cross" => Some(Intrinsic::Cross),
            "normalize" => Some(Intrinsic::Normalize),
            "reflect" => Some(Intrinsic::Reflect),
            "refract" => Some(Intrinsic::Refract),
            _ => None,
        };

        if common.is_some() {
            return common;
        }

        match language {
            ShadingLanguage::Glsl => match name {
                "atan" if argument_count == 2 => Some(Intrinsic::Atan2),
                "atan" => Some(Intrinsic::Atan),
                "inversesqrt" => Some(Intrinsic::InverseSqrt),
                "fract" => Some(Intrinsic::Fract),
                "mod" => Some(Intrinsic::Mod),
                "mix" => Some(Intrinsic::Mix),
                "texture" | "texture2D" => Some(Intrinsic::Texture),
                "EmitVertex" => Some(Intrinsic::EmitVertex),
                "EndPrimitive" => Some(Intrinsic::EndPrimitive),
                _ => None,
            },
            ShadingLanguage::Hlsl => match name {
                "atan" => Some(Intrinsic::Atan),
                "atan2" => Some(Intrinsic::Atan2),
                "rsqrt" => Some(Intrinsic::InverseSqrt),
                "frac" => Some(Intrinsic::Fract),
                "fmod" => Some(Intrinsic::Mod),
                "lerp" => Some(Intrinsic::Mix),
                "saturate" => Some(Intrinsic::Saturate),
                "tex2D" => Some(Intrinsic::Texture),
                "mul" => Some(Intrinsic::MatrixMultiply),
                _ => None,
            },
        }
    }

    pub fn shape(self) -> IntrinsicShape {
        match self {
            Intrinsic::Radians
            | Intrinsic::Degrees
            | Intrinsic::Sin
            | Intrinsic::Cos
            | Intrinsic::Tan
            | Intrinsic::Asin
            | Intrinsic::Acos
            | Intrinsic::Atan
            | Intrinsic::Exp
            | Intrinsic::Log
            | Intrinsic::Exp2
            | Intrinsic::Log2
            | Intrinsic::Sqrt
            | Intrinsic::InverseSqrt
            | Intrinsic::Abs
            | Intrinsic::Sign
            | Intrinsic::Floor
            | Intrinsic::Ceil
            | Intrinsic::Fract
            | Intrinsic::Saturate
            | Intrinsic::Normalize => IntrinsicShape::Unary,

            Intrinsic::Atan2 | Intrinsic::Pow | Intrinsic::Reflect => IntrinsicShape::Binary,
            Intrinsic::Mod | Intrinsic::Min | Intrinsic::Max => IntrinsicShape::BinaryScalarRight,
            Intrinsic::Clamp => IntrinsicShape::Clamp,
            Intrinsic::Mix => IntrinsicShape::Mix,
            Intrinsic::Step => IntrinsicShape::Step,
            Intrinsic::Smoothstep => IntrinsicShape::Smoothstep,
            Intrinsic::Length => IntrinsicShape::Length,
            Intrinsic::Distance | Intrinsic::Dot => IntrinsicShape::Dot,
            Intrinsic::Cross => IntrinsicShape::Cross,
            Intrinsic::Refract => IntrinsicShape::Refract,
            Intrinsic::Texture => IntrinsicShape::Texture,
            Intrinsic::MatrixMultiply => IntrinsicShape::MatrixMultiply,
            Intrinsic::EmitVertex | Intrinsic::EndPrimitive => IntrinsicShape::Void,
        }
    }

    pub fn argument_count(self) -> usize {
        match self.shape() {
            IntrinsicShape::Void => 0,
            IntrinsicShape::Unary | IntrinsicShape::Length => 1,
            IntrinsicShape::Binary
            | IntrinsicShape::BinaryScalarRight
            | IntrinsicShape::Step
            | IntrinsicShape::Dot
            | IntrinsicShape::Cross
            | IntrinsicShape::Texture
            | IntrinsicShape::MatrixMultiply => 2,
            IntrinsicShape::Clamp
            | IntrinsicShape::Mix
            | IntrinsicShape::Smoothstep
            | IntrinsicShape::Refract => 3,
        }
    }

    /// Stage the intrinsic is restricted to, if any.
    pub fn required_stage(self) -> Option<ShaderStage> {
        match self {
            Intrinsic::EmitVertex | Intrinsic::EndPrimitive => Some(ShaderStage::Geometry),
            _ => None,
        }
    }

    /// Lowercase name used in listings.
    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Radians => "radians",
            Intrinsic::Degrees => "degrees",
            Intrinsic::Sin => "sin",
            Intrinsic::Cos => "cos",
            Intrinsic::Tan => "tan",
            Intrinsic::Asin => "asin",
            Intrinsic::Acos => "acos",
            Intrinsic::Atan => "atan",
            Intrinsic::Atan2 => "atan2",
            Intrinsic::Pow => "pow",
            Intrinsic::Exp => "exp",
            Intrinsic::Log => "log",
            Intrinsic::Exp2 => "exp2",
            Intrinsic::Log2 => "log2",
            Intrinsic::Sqrt => "sqrt",
            Intrinsic::InverseSqrt => "inversesqrt",
            Intrinsic::Abs => "abs",
            Intrinsic::Sign => "sign",
            Intrinsic::Floor => "floor",
            Intrinsic::Ceil => "ceil",
            Intrinsic::Fract => "fract",
            Intrinsic::Mod => "mod",
            Intrinsic::Min => "min",
            Intrinsic::Max => "max",
            Intrinsic::Clamp => "clamp",
            Intrinsic::Saturate => "saturate",
            Intrinsic::Mix => "mix",
            Intrinsic::Step => "step",
            Intrinsic::Smoothstep => "smoothstep",
            Intrinsic::Length => "length",
            Intrinsic::Distance => "distance",
            Intrinsic::Dot => "dot",
            Intrinsic::Cross => "cross",
            Intrinsic::Normalize => "normalize",
            Intrinsic::Reflect => "reflect",
            Intrinsic::Refract => "refract",
            Intrinsic::Texture => "texture",
            Intrinsic::MatrixMultiply => "mul",
            Intrinsic::EmitVertex => "EmitVertex",
            Intrinsic::EndPrimitive => "EndPrimitive",
        }
    }
}

/// Variables the pipeline provides to a stage. They occupy the first global slots.
pub fn stage_variables(language: ShadingLanguage, stage: ShaderStage) -> Vec<Variable> {
    // HLSL passes system values through semantics instead
    if language == ShadingLanguage::Hlsl {
        return Vec::new();
    }

    let input = |name: &str, data_type: DataType| {
        Variable::new(name, data_type).with_storage(StorageQualifier::In)
    };
    let output = |name: &str, data_type: DataType| {
        Variable::new(name, data_type).with_storage(StorageQualifier::Out)
    };
    let ivec3 = DataType::Vector(ScalarKind::Int, 3);

    match stage {
        ShaderStage::Vertex => vec![
            output("gl_Position", DataType::float_vector(4)),
            output("gl_PointSize", DataType::FLOAT),
            input("gl_VertexID", DataType::INT),
            input("gl_InstanceID", DataType::INT),
        ],
        ShaderStage::Pixel => vec![
            input("gl_FragCoord", DataType::float_vector(4)),
            input("gl_FrontFacing", DataType::BOOL),
            input("gl_PointCoord", DataType::float_vector(2)),
            output("gl_FragColor", DataType::float_vector(4)),
            output("gl_FragDepth", DataType::FLOAT),
        ],
        ShaderStage::Geometry => vec![
            input("gl_PrimitiveIDIn", DataType::INT),
            output("gl_Position", DataType::float_vector(4)),
            output("gl_Layer", DataType::INT),
        ],
        ShaderStage::Compute => vec![
            input("gl_GlobalInvocationID", ivec3.clone()),
            input("gl_LocalInvocationID", ivec3.clone()),
            input("gl_WorkGroupID", ivec3),
            input("gl_LocalInvocationIndex", DataType::INT),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_the_table() {
        for intrinsic in ALL_INTRINSICS {
            assert_eq!(Intrinsic::from_id(intrinsic.id()), Some(intrinsic));
        }
        assert_eq!(Intrinsic::from_id(ALL_INTRINSICS.len() as u32), None);
    }

    #[test]
    fn dialect_names_map_to_the_same_intrinsic() {
        assert_eq!(
            Intrinsic::lookup(ShadingLanguage::Glsl, "mix", 3),
            Intrinsic::lookup(ShadingLanguage::Hlsl, "lerp", 3)
        );
        assert_eq!(
            Intrinsic::lookup(ShadingLanguage::Glsl, "fract", 1),
            Some(Intrinsic::Fract)
        );
        assert_eq!(Intrinsic::lookup(ShadingLanguage::Hlsl, "fract", 1), None);
        assert_eq!(Intrinsic::lookup(ShadingLanguage::Glsl, "lerp", 3), None);
    }

    #[test]
    fn glsl_atan_arity_picks_the_variant() {
        assert_eq!(Intrinsic::lookup(ShadingLanguage::Glsl, "atan", 1), Some(Intrinsic::Atan));
        assert_eq!(Intrinsic::lookup(ShadingLanguage::Glsl, "atan", 2), Some(Intrinsic::Atan2));
    }

    #[test]
    fn pixel_stage_provides_frag_color() {
        let variables = stage_variables(ShadingLanguage::Glsl, ShaderStage::Pixel);
        assert!(variables.iter().any(|v| v.name == "gl_FragColor"));
        assert!(!variables.iter().any(|v| v.name == "gl_Position"));
        assert!(stage_variables(ShadingLanguage::Hlsl, ShaderStage::Pixel).is_empty());
    }
}
