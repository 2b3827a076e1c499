use num_traits::Zero;

use emql_parser::ast::{
    ArithOperator, CompareOperator, Expr, Literal, LogicalOperator, Predicate, UnaryOperator,
};

use crate::env::Env;
use crate::errors::{ExecutionError, Result};
use crate::scalar::Value;

/// Evaluate an expression against the environment.
///
/// Children are evaluated left to right; the first error stops the walk.
pub fn eval_expr(expr: &Expr, env: &dyn Env) -> Result<Value> {
    match expr {
        Expr::Literal(lit) => Ok(literal_value(lit)),
        Expr::Attribute(attr) => env.lookup(&attr.parts),
        Expr::Function(call) => {
            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(eval_expr(arg, env)?);
            }
            env.execute_function(&call.name, &args)
        }
        Expr::Unary { op, expr } => apply_unary(*op, eval_expr(expr, env)?),
        Expr::Binary { left, op, right } => {
            let left = eval_expr(left, env)?;
            let right = eval_expr(right, env)?;
            apply_arith(*op, left, right)
        }
    }
}

/// Evaluate a predicate against the environment.
///
/// `and`/`or` are strict: both operands are evaluated.
pub fn eval_predicate(pred: &Predicate, env: &dyn Env) -> Result<bool> {
    match pred {
        Predicate::Literal(b) => Ok(*b),
        Predicate::Compare { left, op, right } => {
            let left = eval_expr(left, env)?;
            let right = eval_expr(right, env)?;
            apply_compare(*op, &left, &right)
        }
        Predicate::Logical { left, op, right } => {
            let left = eval_predicate(left, env)?;
            let right = eval_predicate(right, env)?;
            Ok(match op {
                LogicalOperator::And => left && right,
                LogicalOperator::Or => left || right,
            })
        }
        Predicate::Not(pred) => Ok(!eval_predicate(pred, env)?),
        Predicate::In { needle, haystack } => {
            let needle = eval_expr(needle, env)?;
            for elem in haystack {
                // Elements keep evaluating in order; a match returns before
                // later elements run.
                let elem = eval_expr(elem, env)?;
                if elem == needle {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Predicate::Is { expr, class } => {
            let value = eval_expr(expr, env)?;
            env.is_member(&value, class)
        }
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Int(i) => Value::Int(i.clone()),
        Literal::Str(s) => Value::Str(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
    }
}

fn apply_unary(op: UnaryOperator, value: Value) -> Result<Value> {
    let value = value.try_into_int()?;
    Ok(Value::Int(match op {
        UnaryOperator::Plus => value,
        UnaryOperator::Minus => -value,
    }))
}

fn apply_arith(op: ArithOperator, left: Value, right: Value) -> Result<Value> {
    let left = left.try_into_int()?;
    let right = right.try_into_int()?;

    let result = match op {
        ArithOperator::Add => left + right,
        ArithOperator::Sub => left - right,
        ArithOperator::Mul => left * right,
        // Division truncates toward zero, modulus follows the dividend
        // sign.
        ArithOperator::Div => {
            if right.is_zero() {
                return Err(ExecutionError::DivisionByZero);
            }
            left / right
        }
        ArithOperator::Mod => {
            if right.is_zero() {
                return Err(ExecutionError::DivisionByZero);
            }
            left % right
        }
    };
    Ok(Value::Int(result))
}

fn apply_compare(op: CompareOperator, left: &Value, right: &Value) -> Result<bool> {
    let left = left.try_as_int()?;
    let right = right.try_as_int()?;

    Ok(match op {
        CompareOperator::Gt => left > right,
        CompareOperator::GtEq => left >= right,
        CompareOperator::Lt => left < right,
        CompareOperator::LtEq => left <= right,
        CompareOperator::Eq => left == right,
        CompareOperator::Neq => left != right,
    })
}
