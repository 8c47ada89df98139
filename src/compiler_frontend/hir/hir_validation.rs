//! Checks that need the whole unit: prototypes that are never defined and recursion.
//! Shader dialects have no call stack to recurse on, so any cycle in the call graph is an error.

use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorMetaDataKey, ErrorType};
use crate::compiler_frontend::hir::hir_builder::HirBuilder;
use crate::compiler_frontend::hir::hir_nodes::FunctionId;
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::hir_log;

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

impl<'a> HirBuilder<'a> {
    pub(crate) fn validate_module(&mut self) {
        for function in &self.module.functions {
            if function.body.is_none() {
                let error = CompilerError::new(
                    format!(
                        "Function '{}' is declared but never defined",
                        function.signature
                    ),
                    function.location.clone(),
                    ErrorType::UnresolvedSymbol,
                )
                .with_metadata(ErrorMetaDataKey::VariableName, function.signature.name.clone());
                self.errors.push(error);
            }
        }

        if let Some(error) = self.find_recursion() {
            self.errors.push(error);
        }

        hir_log!(format!(
            "[HIR] validated {} functions",
            self.module.functions.len()
        ));
    }

    /// Depth first search over the call graph, reporting the first back edge found.
    fn find_recursion(&self) -> Option<CompilerError> {
        let mut states = vec![VisitState::Unvisited; self.call_graph.len()];

        for start in 0..self.call_graph.len() {
            if states[start] != VisitState::Unvisited {
                continue;
            }

            // (function, next edge to follow)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            states[start] = VisitState::InProgress;

            while let Some((function, edge)) = stack.last_mut() {
                let function = *function;
                let Some((callee, location)) = self.call_graph[function].get(*edge) else {
                    states[function] = VisitState::Done;
                    stack.pop();
                    continue;
                };
                *edge += 1;

                let callee_index = callee.0 as usize;
                match states.get(callee_index) {
                    Some(VisitState::InProgress) => {
                        return Some(self.recursion_error(function, *callee, location.clone()));
                    }
                    Some(VisitState::Unvisited) => {
                        states[callee_index] = VisitState::InProgress;
                        stack.push((callee_index, 0));
                    }
                    _ => {}
                }
            }
        }

        None
    }

    fn recursion_error(
        &self,
        caller: usize,
        callee: FunctionId,
        location: TextLocation,
    ) -> CompilerError {
        let caller_name = &self.module.functions[caller].signature.name;
        let callee_name = &self.module.functions[callee.0 as usize].signature.name;

        let msg = if caller == callee.0 as usize {
            format!("Function '{caller_name}' calls itself, recursion is not supported")
        } else {
            format!(
                "Call from '{caller_name}' to '{callee_name}' creates a cycle, recursion is not supported"
            )
        };

        CompilerError::new(msg, location, ErrorType::Rule)
            .with_metadata(ErrorMetaDataKey::VariableName, callee_name.clone())
            .with_metadata(ErrorMetaDataKey::CompilationStage, "HIR Validation")
    }
}
