pub(crate) mod hir_builder;
pub(crate) mod hir_nodes;

mod hir_expression;
mod hir_statement;
mod hir_validation;

#[cfg(test)]
mod tests;
