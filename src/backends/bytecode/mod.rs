pub(crate) mod emit;
pub mod generator;
pub mod instructions;
pub mod reader;

#[cfg(test)]
mod tests;
