use std::error::Error;

use clap::{Parser, Subcommand};
use num_bigint::BigInt;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::FmtSubscriber;

use emql_execution::env::{BuiltinFunction, Env, StaticEnv};
use emql_execution::errors::ExecutionError;
use emql_execution::evaluator::{eval_expr, eval_predicate};
use emql_execution::scalar::Value;
use emql_parser::parser;
use emql_parser::tokens::Lexer;

#[derive(Parser)]
#[clap(name = "emql")]
struct Arguments {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream for a query, one token per line.
    Tokenize { query: String },
    /// Parse a query and print the resulting statement.
    Parse { query: String },
    /// Parse a query and evaluate it against attribute bindings.
    Eval {
        query: String,
        /// Attribute binding, `attr=value`. The value may be a decimal or
        /// 0x-hex integer, true/false, or anything else for a string.
        #[clap(long = "bind")]
        bindings: Vec<String>,
    },
}

/// Simple binary for inspecting and dry-running queries.
fn main() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::ERROR.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    if let Err(err) = inner(Arguments::parse()) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn inner(args: Arguments) -> Result<(), Box<dyn Error>> {
    match args.command {
        Command::Tokenize { query } => {
            for token in Lexer::new(&query).tokenize()? {
                println!("{token}");
            }
        }
        Command::Parse { query } => {
            let stmt = parser::parse(&query)?;
            println!("{stmt:#?}");
        }
        Command::Eval { query, bindings } => {
            let stmt = parser::parse(&query)?;
            let env = build_env(&bindings)?;

            if let Some(pred) = &stmt.where_clause {
                println!("where {pred} => {}", eval_predicate(pred, &env)?);
            }
            for expr in &stmt.selected {
                println!("{expr} => {}", eval_expr(expr, &env)?);
            }
        }
    }
    Ok(())
}

/// Environment for dry runs: the given attribute bindings plus a handful
/// of single-event builtins.
fn build_env(bindings: &[String]) -> Result<StaticEnv, Box<dyn Error>> {
    let mut env = StaticEnv::new();

    for binding in bindings {
        let (attr, value) = binding
            .split_once('=')
            .ok_or_else(|| format!("invalid binding '{binding}', expected attr=value"))?;
        env.bind(attr, parse_binding_value(value));
    }

    // Over a single event, an aggregate degenerates to its argument.
    env.register_function("sum", Box::new(|_, args| single_int(args).map(Value::Int)));
    env.register_function("count", Box::new(|_, _| Ok(Value::from(1))));
    env.register_function("min", fold_ints(|acc, x| if x < acc { x } else { acc }));
    env.register_function("max", fold_ints(|acc, x| if x > acc { x } else { acc }));
    env.register_function(
        "len",
        Box::new(|_, args| match args {
            [Value::Str(s)] => Ok(Value::from(s.len() as i64)),
            _ => Err(ExecutionError::function("len takes a single string")),
        }),
    );

    Ok(env)
}

fn single_int(args: &[Value]) -> Result<BigInt, ExecutionError> {
    match args {
        [value] => Ok(value.try_as_int()?.clone()),
        _ => Err(ExecutionError::function("expected a single argument")),
    }
}

fn fold_ints(pick: fn(BigInt, BigInt) -> BigInt) -> BuiltinFunction {
    Box::new(move |_env: &dyn Env, args: &[Value]| {
        let mut ints = args.iter().map(|v| v.try_as_int().cloned());
        let mut acc = ints
            .next()
            .ok_or_else(|| ExecutionError::function("expected at least one argument"))??;
        for int in ints {
            acc = pick(acc, int?);
        }
        Ok(Value::Int(acc))
    })
}

fn parse_binding_value(raw: &str) -> Value {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if let Some(int) = BigInt::parse_bytes(hex.as_bytes(), 16) {
            return Value::Int(int);
        }
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    match raw {
        "true" => Value::from(true),
        "false" => Value::from(false),
        _ => Value::from(raw),
    }
}
