//! Translates many independent shaders at once.
//! Each job gets its own translator, nothing is shared between threads but the config.

use crate::compiler_frontend::compiler_errors::CompilerMessages;
use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::dialect::{ShaderStage, ShadingLanguage};
use crate::settings::{DEFAULT_ENTRY_POINT, TranslatorConfig};
use crate::timer_log;
use crate::translator::{TranslationUnit, translator_for};
use rayon::prelude::*;
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct TranslationJob {
    /// Reported back with the outcome, usually a file name
    pub name: String,
    pub language: ShadingLanguage,
    pub stage: ShaderStage,
    pub source: String,
    pub entry_point: String,
}

impl TranslationJob {
    pub fn new(
        name: impl Into<String>,
        language: ShadingLanguage,
        stage: ShaderStage,
        source: impl Into<String>,
    ) -> Self {
        TranslationJob {
            name: name.into(),
            language,
            stage,
            source: source.into(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
        }
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }
}

#[derive(Clone, Debug)]
pub struct TranslatedShader {
    pub bytecode: Vec<u8>,
    pub unit: TranslationUnit,
    pub warnings: Vec<CompilerWarning>,
}

#[derive(Clone, Debug)]
pub struct TranslationOutcome {
    pub name: String,
    pub result: Result<TranslatedShader, CompilerMessages>,
}

/// Outcomes come back in job order.
pub fn translate_batch(jobs: &[TranslationJob], config: &TranslatorConfig) -> Vec<TranslationOutcome> {
    let time = Instant::now();

    let outcomes = jobs
        .par_iter()
        .map(|job| {
            let mut translator = translator_for(job.language, config.clone());
            let result = translator
                .parse(job.stage, &job.source, &job.entry_point)
                .map(|_| TranslatedShader {
                    bytecode: translator.bytecode(),
                    unit: translator.translation_unit().clone(),
                    warnings: translator.warnings().to_vec(),
                });

            TranslationOutcome {
                name: job.name.clone(),
                result,
            }
        })
        .collect();

    timer_log!(time, "Batch translated in: ");
    outcomes
}
