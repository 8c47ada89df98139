use crate::compiler_frontend::dialect::ShadingLanguage;
use crate::settings::TranslatorConfig;
use crate::translator::{Translator, TranslatorCore};

/// Translator for GLSL. Accepts `#version`, `layout(...)` qualifiers and `precision` statements.
#[derive(Debug, Default)]
pub struct GlslTranslator {
    core: TranslatorCore,
}

impl GlslTranslator {
    pub fn new() -> Self {
        Self::with_config(TranslatorConfig::default())
    }

    pub fn with_config(config: TranslatorConfig) -> Self {
        GlslTranslator {
            core: TranslatorCore::new(config),
        }
    }
}

impl Translator for GlslTranslator {
    fn language(&self) -> ShadingLanguage {
        ShadingLanguage::Glsl
    }

    fn core(&self) -> &TranslatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TranslatorCore {
        &mut self.core
    }
}
