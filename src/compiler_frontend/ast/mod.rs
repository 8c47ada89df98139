pub(crate) mod ast;
pub(crate) mod ast_nodes;
pub(crate) mod parse_expression;
pub(crate) mod statements {
    pub(crate) mod declarations;
    pub(crate) mod functions;
    pub(crate) mod statements;
    pub(crate) mod structs;
}
