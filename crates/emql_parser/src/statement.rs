use std::collections::HashMap;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::ast::{Attribute, Expr, Predicate};

/// A parsed `SELECT` statement.
///
/// Immutable after construction; the statement owns its node graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    /// Expressions produced per row, in query order. Never empty.
    pub selected: Vec<Expr>,
    /// Alias name to the aliased expression. Values are structurally equal
    /// to entries of `selected`.
    pub aliases: HashMap<String, Expr>,
    pub from: FromClause,
    pub where_clause: Option<Predicate>,
    /// Starting block number.
    pub since: Option<i64>,
    /// Ending block number.
    pub until: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub group_by: Option<GroupByClause>,
}

/// The contract the query watches, by address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromClause {
    pub address: BigInt,
}

/// The `group by` clause: an optional blocks window, an optional
/// transactions window, and any number of attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupByClause {
    pub blocks_count: Option<i64>,
    pub transactions_count: Option<i64>,
    pub attributes: Vec<Attribute>,
}
