use emql_parser::ast::{
    ArithOperator, Attribute, CompareOperator, Expr, LogicalOperator, Predicate,
};
use emql_parser::errors::ParseError;
use emql_parser::parser::parse;
use num_bigint::BigInt;

fn attr(parts: &[&str]) -> Expr {
    Expr::attribute(parts.iter().copied()).unwrap()
}

fn sum_msg_value() -> Expr {
    Expr::function("sum", vec![attr(&["msg", "value"])])
}

#[test]
fn basic_select() {
    let stmt = parse("select sum(msg.value) / 10 as sum, count(tx) from 0x1234abcd").unwrap();

    assert_eq!(stmt.selected.len(), 2);
    assert_eq!(stmt.aliases.len(), 1);

    let first = Expr::binary(sum_msg_value(), ArithOperator::Div, Expr::int(10));
    assert_eq!(first, stmt.selected[0]);
    assert_eq!(first, stmt.aliases["sum"]);

    let second = Expr::function("count", vec![attr(&["tx"])]);
    assert_eq!(second, stmt.selected[1]);

    assert_eq!(BigInt::from(0x1234abcd_i64), stmt.from.address);
    assert_eq!(stmt.where_clause, None);
    assert_eq!(stmt.group_by, None);
}

#[test]
fn select_with_where() {
    let stmt = parse(
        "select tx.hash from 0x1234abcd \
         where SUM(msg.value) > 10 AND not (msg.sender is not address OR msg.sender = 0x54321 OR \
         msg.sender in (0x123, 0x432))",
    )
    .unwrap();

    let msg_sender = attr(&["msg", "sender"]);
    let expected = Predicate::logical(
        Predicate::compare(sum_msg_value(), CompareOperator::Gt, Expr::int(10)),
        LogicalOperator::And,
        Predicate::negate(Predicate::logical(
            Predicate::logical(
                Predicate::negate(Predicate::is(msg_sender.clone(), "address")),
                LogicalOperator::Or,
                Predicate::compare(msg_sender.clone(), CompareOperator::Eq, Expr::int(0x54321)),
            ),
            LogicalOperator::Or,
            Predicate::in_list(msg_sender, vec![Expr::int(0x123), Expr::int(0x432)]).unwrap(),
        )),
    );

    assert_eq!(Some(expected), stmt.where_clause);
}

#[test]
fn select_with_group_by() {
    let stmt =
        parse("select SUM(msg.value) from 0x1234abcd group by blocks(3), transactions(4), msg.sender")
            .unwrap();

    assert_eq!(stmt.where_clause, None);
    let group_by = stmt.group_by.unwrap();
    assert_eq!(group_by.blocks_count, Some(3));
    assert_eq!(group_by.transactions_count, Some(4));
    assert_eq!(
        group_by.attributes,
        vec![Attribute::try_new(["msg", "sender"]).unwrap()]
    );
}

#[test]
fn select_with_every_clause() {
    let stmt = parse(
        "select SUM(msg.value) from 0x1234abcd where msg.sender is not address \
         since 1000 until 1500 limit 5 offset 2 \
         group by blocks(3), transactions(4), msg.sender",
    )
    .unwrap();

    assert!(stmt.where_clause.is_some());
    assert_eq!(stmt.since, Some(1000));
    assert_eq!(stmt.until, Some(1500));
    assert_eq!(stmt.limit, Some(5));
    assert_eq!(stmt.offset, Some(2));
    assert!(stmt.group_by.is_some());
}

#[test]
fn function_names_fold_to_lower_case() {
    let upper = parse("select SUM(msg.value) from 0x1").unwrap();
    let lower = parse("select sum(msg.value) from 0x1").unwrap();
    assert_eq!(upper.selected, lower.selected);
}

#[test]
fn keywords_accept_mixed_case() {
    let stmt = parse("SELECT msg.value FROM 0x12 WHERE msg.value > 1 Group By msg.sender").unwrap();
    assert!(stmt.where_clause.is_some());
    assert!(stmt.group_by.is_some());
}

#[test]
fn from_requires_hex_address() {
    parse("select 1 from 1234").unwrap_err();
    parse("select 1 from abc").unwrap_err();
    parse("select 1").unwrap_err();
}

#[test]
fn clause_order_is_fixed() {
    parse("select 1 from 0x1 since 10 where msg.value > 1").unwrap_err();
    parse("select 1 from 0x1 until 20 since 10").unwrap_err();
    parse("select 1 from 0x1 offset 2 limit 5").unwrap_err();
    parse("select 1 from 0x1 group by msg.sender limit 5").unwrap_err();
}

#[test]
fn duplicate_group_windows_are_rejected() {
    let err = parse("select 1 from 0x1 group by blocks(1), blocks(2)").unwrap_err();
    assert_eq!(err, ParseError::DuplicateGroupElement("blocks"));

    let err = parse("select 1 from 0x1 group by transactions(1), msg.sender, transactions(2)")
        .unwrap_err();
    assert_eq!(err, ParseError::DuplicateGroupElement("transactions"));
}

#[test]
fn empty_in_list_is_rejected() {
    let err = parse("select 1 from 0x1 where msg.sender in ()").unwrap_err();
    assert_eq!(err, ParseError::EmptyExpressionList);
}

#[test]
fn aliases_must_be_identifiers() {
    parse("select 1 as ok_name from 0x1").unwrap();
    parse("select 1 as 2fast from 0x1").unwrap_err();
}

#[test]
fn trailing_tokens_are_rejected() {
    parse("select 1 from 0x1 extra").unwrap_err();
    parse("select 1 from 0x1 )").unwrap_err();
}
