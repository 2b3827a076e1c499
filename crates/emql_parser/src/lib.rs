//! EMQL parser. Lexes and parses event monitoring queries into a
//! [`SelectStatement`](statement::SelectStatement).
pub mod ast;
pub mod errors;
pub mod keywords;
pub mod parser;
pub mod statement;
pub mod tokens;
