//! EMQL evaluation. Walks parsed statements against an [`Env`](env::Env)
//! supplying attribute values and builtin functions.
pub mod env;
pub mod errors;
pub mod evaluator;
pub mod scalar;
