use crate::compiler_frontend::dialect::ShadingLanguage;
use crate::settings::TranslatorConfig;
use crate::translator::{Translator, TranslatorCore};

/// Translator for HLSL. Semantics are kept on the registry entries,
/// `cbuffer` members become ordinary uniform globals.
#[derive(Debug, Default)]
pub struct HlslTranslator {
    core: TranslatorCore,
}

impl HlslTranslator {
    pub fn new() -> Self {
        Self::with_config(TranslatorConfig::default())
    }

    pub fn with_config(config: TranslatorConfig) -> Self {
        HlslTranslator {
            core: TranslatorCore::new(config),
        }
    }
}

impl Translator for HlslTranslator {
    fn language(&self) -> ShadingLanguage {
        ShadingLanguage::Hlsl
    }

    fn core(&self) -> &TranslatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TranslatorCore {
        &mut self.core
    }
}
