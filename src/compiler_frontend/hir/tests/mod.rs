mod hir_lowering_tests;
mod hir_test_support;
mod hir_validation_tests;
