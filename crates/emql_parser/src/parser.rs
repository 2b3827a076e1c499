use std::collections::HashMap;

use num_bigint::BigInt;
use tracing::trace;

use crate::ast::{
    is_valid_identifier, ArithOperator, Attribute, CompareOperator, Expr, Literal,
    LogicalOperator, Predicate, UnaryOperator,
};
use crate::errors::{ParseError, Result};
use crate::keywords::Keyword;
use crate::statement::{FromClause, GroupByClause, SelectStatement};
use crate::tokens::{Lexer, Token};

/// Parse a query into a select statement.
pub fn parse(query: &str) -> Result<SelectStatement> {
    trace!(%query, "parsing emql statement");
    Parser::new(Lexer::new(query))?.parse_select()
}

/// Recursive-descent parser over a streaming lexer.
///
/// Holds a fixed two-slot lookahead buffer, refilled eagerly; every
/// decision in the grammar needs at most `peek_nth(1)`.
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: [Option<Token>; 2],
}

impl<'a> Parser<'a> {
    /// Create a parser, priming the lookahead buffer from the lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let lookahead = [lexer.next_token()?, lexer.next_token()?];
        Ok(Parser { lexer, lookahead })
    }

    /// Parse a full select statement, erroring on any trailing tokens.
    ///
    /// Optional clauses are fixed in the order `where`, `since`, `until`,
    /// `limit`, `offset`, `group by`.
    pub fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_keyword(Keyword::SELECT)?;
        let (selected, aliases) = self.parse_select_list()?;

        self.expect_keyword(Keyword::FROM)?;
        let from = FromClause {
            address: self.parse_hex_address()?,
        };

        let where_clause = match self.parse_keyword(Keyword::WHERE)? {
            true => Some(self.parse_or_condition()?),
            false => None,
        };
        let since = match self.parse_keyword(Keyword::SINCE)? {
            true => Some(self.parse_i64()?),
            false => None,
        };
        let until = match self.parse_keyword(Keyword::UNTIL)? {
            true => Some(self.parse_i64()?),
            false => None,
        };
        // `limit` and `offset` are contextual: they are not reserved words
        // and only have meaning in clause position.
        let limit = match self.parse_context_word("limit")? {
            true => Some(self.parse_i64()?),
            false => None,
        };
        let offset = match self.parse_context_word("offset")? {
            true => Some(self.parse_i64()?),
            false => None,
        };
        let group_by = match self.consume_token(&Token::GroupBy)? {
            true => Some(self.parse_group_by()?),
            false => None,
        };

        if let Some(tok) = self.peek() {
            return Err(ParseError::unexpected("end of statement", tok));
        }

        Ok(SelectStatement {
            selected,
            aliases,
            from,
            where_clause,
            since,
            until,
            limit,
            offset,
            group_by,
        })
    }

    fn parse_select_list(&mut self) -> Result<(Vec<Expr>, HashMap<String, Expr>)> {
        let mut selected = Vec::new();
        let mut aliases = HashMap::new();

        loop {
            let expr = self.parse_expression()?;
            if self.parse_keyword(Keyword::AS)? {
                let alias = self.expect_identifier()?;
                aliases.insert(alias, expr.clone());
            }
            selected.push(expr);

            if !self.consume_token(&Token::Comma)? {
                break;
            }
        }

        Ok((selected, aliases))
    }

    fn parse_group_by(&mut self) -> Result<GroupByClause> {
        let mut group_by = GroupByClause::default();

        loop {
            match self.peek() {
                Some(Token::Word(w)) if w.keyword == Some(Keyword::BLOCKS) => {
                    self.advance()?;
                    let count = self.parse_parenthesized_i64()?;
                    if group_by.blocks_count.is_some() {
                        return Err(ParseError::DuplicateGroupElement("blocks"));
                    }
                    group_by.blocks_count = Some(count);
                }
                Some(Token::Word(w)) if w.keyword == Some(Keyword::TRANSACTIONS) => {
                    self.advance()?;
                    let count = self.parse_parenthesized_i64()?;
                    if group_by.transactions_count.is_some() {
                        return Err(ParseError::DuplicateGroupElement("transactions"));
                    }
                    group_by.transactions_count = Some(count);
                }
                Some(Token::Word(_)) => {
                    group_by.attributes.push(self.parse_attribute()?);
                }
                _ => return Err(self.error_expected("group by element")),
            }

            if !self.consume_token(&Token::Comma)? {
                break;
            }
        }

        Ok(group_by)
    }

    /// Parse `or_cond := and_cond ("or" and_cond)*`.
    pub(crate) fn parse_or_condition(&mut self) -> Result<Predicate> {
        let mut pred = self.parse_and_condition()?;
        while self.parse_keyword(Keyword::OR)? {
            let right = self.parse_and_condition()?;
            pred = Predicate::logical(pred, LogicalOperator::Or, right);
        }
        Ok(pred)
    }

    fn parse_and_condition(&mut self) -> Result<Predicate> {
        let mut pred = self.parse_negation()?;
        while self.parse_keyword(Keyword::AND)? {
            let right = self.parse_negation()?;
            pred = Predicate::logical(pred, LogicalOperator::And, right);
        }
        Ok(pred)
    }

    fn parse_negation(&mut self) -> Result<Predicate> {
        // `not` binds looser than comparisons but tighter than `and`.
        if self.parse_keyword(Keyword::NOT)? {
            return Ok(Predicate::negate(self.parse_negation()?));
        }
        self.parse_simple_predicate()
    }

    fn parse_simple_predicate(&mut self) -> Result<Predicate> {
        // A leading parenthesis opens a nested condition.
        if self.consume_token(&Token::LeftParen)? {
            let pred = self.parse_or_condition()?;
            self.expect_token(&Token::RightParen)?;
            return Ok(pred);
        }

        let expr = self.parse_expression()?;

        match self.peek() {
            Some(Token::Word(w)) if w.keyword == Some(Keyword::IN) => {
                self.advance()?;
                let haystack = self.parse_expr_list()?;
                Predicate::in_list(expr, haystack)
            }
            Some(Token::Word(w)) if w.keyword == Some(Keyword::NOT) => {
                // Only `not in` is valid after an expression.
                match self.peek_nth(1) {
                    Some(Token::Word(w)) if w.keyword == Some(Keyword::IN) => {}
                    _ => return Err(self.error_expected("in")),
                }
                self.advance()?;
                self.advance()?;
                let haystack = self.parse_expr_list()?;
                Ok(Predicate::negate(Predicate::in_list(expr, haystack)?))
            }
            Some(Token::Word(w)) if w.keyword == Some(Keyword::IS) => {
                self.advance()?;
                let negated = self.parse_keyword(Keyword::NOT)?;
                let class = self.expect_identifier()?;
                let pred = Predicate::is(expr, class);
                Ok(match negated {
                    true => Predicate::negate(pred),
                    false => pred,
                })
            }
            Some(tok) => match compare_operator(tok) {
                Some(op) => {
                    self.advance()?;
                    let right = self.parse_expression()?;
                    Ok(Predicate::compare(expr, op, right))
                }
                None => Err(self.error_expected("comparison operator, in or is")),
            },
            None => Err(self.error_expected("comparison operator, in or is")),
        }
    }

    /// Parse `expression := term (("+"|"-") term)*`, left-associative.
    pub(crate) fn parse_expression(&mut self) -> Result<Expr> {
        let mut expr = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOperator::Add,
                Some(Token::Minus) => ArithOperator::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_term()?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Mul) => ArithOperator::Mul,
                Some(Token::Div) => ArithOperator::Div,
                Some(Token::Mod) => ArithOperator::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(Token::Plus) => UnaryOperator::Plus,
            Some(Token::Minus) => UnaryOperator::Minus,
            _ => return self.parse_factor(),
        };
        self.advance()?;
        Ok(Expr::unary(op, self.parse_unary()?))
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::QuotedString(_)) => {
                let raw = match self.advance()? {
                    Some(Token::QuotedString(raw)) => raw,
                    _ => unreachable!("peeked quoted string"),
                };
                Ok(Expr::Literal(Literal::Str(unescape_string(&raw))))
            }
            Some(Token::Number(_)) => {
                let raw = match self.advance()? {
                    Some(Token::Number(raw)) => raw,
                    _ => unreachable!("peeked number"),
                };
                Ok(Expr::Literal(Literal::Int(parse_bigint(&raw)?)))
            }
            Some(Token::LeftParen) => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect_token(&Token::RightParen)?;
                Ok(expr)
            }
            Some(Token::Word(_)) => {
                // A word followed by '(' is a function call, anything else
                // starts an attribute.
                if matches!(self.peek_nth(1), Some(Token::LeftParen)) {
                    let name = match self.advance()? {
                        Some(Token::Word(w)) => w.value,
                        _ => unreachable!("peeked word"),
                    };
                    let args = self.parse_expr_list()?;
                    Ok(Expr::function(name, args))
                } else {
                    Ok(Expr::Attribute(self.parse_attribute()?))
                }
            }
            _ => Err(self.error_expected("expression")),
        }
    }

    fn parse_attribute(&mut self) -> Result<Attribute> {
        let mut parts = vec![self.expect_identifier()?];
        while matches!(self.peek(), Some(Token::Period)) {
            self.advance()?;
            parts.push(self.expect_identifier()?);
        }
        Attribute::try_new(parts)
    }

    /// Parse a parenthesized, comma-separated list of one or more
    /// expressions.
    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        self.expect_token(&Token::LeftParen)?;
        if matches!(self.peek(), Some(Token::RightParen)) {
            return Err(ParseError::EmptyExpressionList);
        }

        let mut exprs = vec![self.parse_expression()?];
        while self.consume_token(&Token::Comma)? {
            exprs.push(self.parse_expression()?);
        }
        self.expect_token(&Token::RightParen)?;

        Ok(exprs)
    }

    /// Parse a '0x'-prefixed hex literal into an address.
    fn parse_hex_address(&mut self) -> Result<BigInt> {
        match self.advance()? {
            Some(Token::Number(s)) if s.starts_with("0x") || s.starts_with("0X") => {
                parse_bigint(&s)
            }
            Some(other) => Err(ParseError::unexpected("hex address", other)),
            None => Err(ParseError::unexpected_end("hex address")),
        }
    }

    fn parse_parenthesized_i64(&mut self) -> Result<i64> {
        self.expect_token(&Token::LeftParen)?;
        let value = self.parse_i64()?;
        self.expect_token(&Token::RightParen)?;
        Ok(value)
    }

    fn parse_i64(&mut self) -> Result<i64> {
        match self.advance()? {
            Some(Token::Number(s)) => s
                .parse::<i64>()
                .map_err(|_| ParseError::InvalidNumber(s.clone())),
            Some(other) => Err(ParseError::unexpected("integer literal", other)),
            None => Err(ParseError::unexpected_end("integer literal")),
        }
    }

    /// Consume the next token as an identifier, erroring if it isn't a
    /// valid one.
    fn expect_identifier(&mut self) -> Result<String> {
        match self.advance()? {
            Some(Token::Word(w)) if is_valid_identifier(&w.value) => Ok(w.value),
            Some(other) => Err(ParseError::InvalidIdentifier(other.to_string())),
            None => Err(ParseError::unexpected_end("identifier")),
        }
    }

    /// Consume the current keyword if it matches expected, returning
    /// whether it did.
    fn parse_keyword(&mut self, keyword: Keyword) -> Result<bool> {
        match self.peek() {
            Some(Token::Word(w)) if w.keyword == Some(keyword) => {
                self.advance()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Consume the current keyword if it matches expected, otherwise
    /// return an error.
    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if !self.parse_keyword(keyword)? {
            return Err(self.error_expected(&format!("{keyword:?}").to_ascii_lowercase()));
        }
        Ok(())
    }

    /// Consume a non-reserved word matched case-insensitively (`limit`,
    /// `offset`), returning whether it was there.
    fn parse_context_word(&mut self, word: &str) -> Result<bool> {
        match self.peek() {
            Some(Token::Word(w)) if w.keyword.is_none() && w.value.eq_ignore_ascii_case(word) => {
                self.advance()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Consume the next token if it matches expected.
    fn consume_token(&mut self, expected: &Token) -> Result<bool> {
        match self.peek() {
            Some(tok) if tok == expected => {
                self.advance()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Consume the next token if it matches expected, otherwise return an
    /// error.
    fn expect_token(&mut self, expected: &Token) -> Result<()> {
        if !self.consume_token(expected)? {
            return Err(self.error_expected(&expected.to_string()));
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.lookahead[0].as_ref()
    }

    /// Get the nth lookahead token. Only the two buffered slots exist.
    fn peek_nth(&self, n: usize) -> Option<&Token> {
        debug_assert!(n < 2, "lookahead is limited to two tokens");
        self.lookahead[n].as_ref()
    }

    /// Pop the current token and refill the buffer from the lexer.
    fn advance(&mut self) -> Result<Option<Token>> {
        let tok = self.lookahead[0].take();
        self.lookahead[0] = self.lookahead[1].take();
        self.lookahead[1] = self.lexer.next_token()?;
        Ok(tok)
    }

    fn error_expected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError::unexpected(expected, tok),
            None => ParseError::unexpected_end(expected),
        }
    }
}

fn compare_operator(tok: &Token) -> Option<CompareOperator> {
    Some(match tok {
        Token::Gt => CompareOperator::Gt,
        Token::GtEq => CompareOperator::GtEq,
        Token::Lt => CompareOperator::Lt,
        Token::LtEq => CompareOperator::LtEq,
        Token::Eq => CompareOperator::Eq,
        Token::Neq => CompareOperator::Neq,
        _ => None?,
    })
}

/// Parse a decimal or '0x'-prefixed hex spelling into a big integer.
fn parse_bigint(s: &str) -> Result<BigInt> {
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    if digits.is_empty() {
        return Err(ParseError::InvalidNumber(s.to_string()));
    }
    BigInt::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| ParseError::InvalidNumber(s.to_string()))
}

/// Unescape a string literal's interior with the usual C-style rules.
fn unescape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c) => out.push(c),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(input: &str) -> Parser<'_> {
        Parser::new(Lexer::new(input)).unwrap()
    }

    fn attr(parts: &[&str]) -> Expr {
        Expr::attribute(parts.iter().copied()).unwrap()
    }

    fn sum_msg_value() -> Expr {
        Expr::function("sum", vec![attr(&["msg", "value"])])
    }

    #[test]
    fn parse_factor_cases() {
        let tests: &[(&str, Expr)] = &[
            ("1", Expr::int(1)),
            ("0x1", Expr::int(1)),
            ("\"string\"", Expr::string("string")),
            ("simple_attr", attr(&["simple_attr"])),
            ("msg.value", attr(&["msg", "value"])),
            ("op.call.arg.value", attr(&["op", "call", "arg", "value"])),
            ("SUM(msg.value)", sum_msg_value()),
            ("(1)", Expr::int(1)),
        ];
        for (input, expected) in tests {
            let got = parser(input).parse_factor().unwrap();
            assert_eq!(expected, &got, "{input}");
        }
    }

    #[test]
    fn parse_unary_cases() {
        use UnaryOperator::{Minus, Plus};
        let tests: &[(&str, Expr)] = &[
            ("1", Expr::int(1)),
            ("-1", Expr::unary(Minus, Expr::int(1))),
            ("-msg.value", Expr::unary(Minus, attr(&["msg", "value"]))),
            ("+SUM(msg.value)", Expr::unary(Plus, sum_msg_value())),
            // `--` would start a comment, so nested unaries need spacing.
            ("- -1", Expr::unary(Minus, Expr::unary(Minus, Expr::int(1)))),
        ];
        for (input, expected) in tests {
            let got = parser(input).parse_unary().unwrap();
            assert_eq!(expected, &got, "{input}");
        }
    }

    #[test]
    fn parse_term_cases() {
        use ArithOperator::{Div, Mul};
        let count_tx = Expr::function("count", vec![attr(&["tx"])]);
        let tests: &[(&str, Expr)] = &[
            (
                "1 * 10",
                Expr::binary(Expr::int(1), Mul, Expr::int(10)),
            ),
            (
                "msg.value / 10",
                Expr::binary(attr(&["msg", "value"]), Div, Expr::int(10)),
            ),
            (
                "-SUM(msg.value) * 10 / COUNT(tx)",
                Expr::binary(
                    Expr::binary(
                        Expr::unary(UnaryOperator::Minus, sum_msg_value()),
                        Mul,
                        Expr::int(10),
                    ),
                    Div,
                    count_tx.clone(),
                ),
            ),
        ];
        for (input, expected) in tests {
            let got = parser(input).parse_term().unwrap();
            assert_eq!(expected, &got, "{input}");
        }
    }

    #[test]
    fn parse_expression_cases() {
        use ArithOperator::{Add, Div, Mul, Sub};
        let count_tx = Expr::function("count", vec![attr(&["tx"])]);
        let tests: &[(&str, Expr)] = &[
            (
                "1 + 10",
                Expr::binary(Expr::int(1), Add, Expr::int(10)),
            ),
            (
                "msg.value + 1 / 10",
                Expr::binary(
                    attr(&["msg", "value"]),
                    Add,
                    Expr::binary(Expr::int(1), Div, Expr::int(10)),
                ),
            ),
            (
                "1 + -SUM(msg.value) * 10 / COUNT(tx) - 10",
                Expr::binary(
                    Expr::binary(
                        Expr::int(1),
                        Add,
                        Expr::binary(
                            Expr::binary(
                                Expr::unary(UnaryOperator::Minus, sum_msg_value()),
                                Mul,
                                Expr::int(10),
                            ),
                            Div,
                            count_tx.clone(),
                        ),
                    ),
                    Sub,
                    Expr::int(10),
                ),
            ),
        ];
        for (input, expected) in tests {
            let got = parser(input).parse_expression().unwrap();
            assert_eq!(expected, &got, "{input}");
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        use ArithOperator::{Add, Mul};
        let got = parser("1 + 2 * 3").parse_expression().unwrap();
        let expected = Expr::binary(
            Expr::int(1),
            Add,
            Expr::binary(Expr::int(2), Mul, Expr::int(3)),
        );
        assert_eq!(expected, got);

        // Unary minus binds tighter still.
        let got = parser("-a * b").parse_expression().unwrap();
        let expected = Expr::binary(
            Expr::unary(UnaryOperator::Minus, attr(&["a"])),
            Mul,
            attr(&["b"]),
        );
        assert_eq!(expected, got);
    }

    #[test]
    fn subtraction_is_left_associative() {
        use ArithOperator::Sub;
        let got = parser("1 - 2 - 3").parse_expression().unwrap();
        let expected = Expr::binary(
            Expr::binary(Expr::int(1), Sub, Expr::int(2)),
            Sub,
            Expr::int(3),
        );
        assert_eq!(expected, got);
    }

    #[test]
    fn or_binds_looser_than_and() {
        // a = 1 or b = 2 and c = 3  =>  (or (= a 1) (and (= b 2) (= c 3)))
        let got = parser("a = 1 or b = 2 and c = 3").parse_or_condition().unwrap();
        let eq = |name: &str, value: i64| {
            Predicate::compare(attr(&[name]), CompareOperator::Eq, Expr::int(value))
        };
        let expected = Predicate::logical(
            eq("a", 1),
            LogicalOperator::Or,
            Predicate::logical(eq("b", 2), LogicalOperator::And, eq("c", 3)),
        );
        assert_eq!(expected, got);
    }

    #[test]
    fn not_in_and_is_not() {
        let got = parser("msg.sender not in (1, 2)").parse_or_condition().unwrap();
        let expected = Predicate::negate(
            Predicate::in_list(
                attr(&["msg", "sender"]),
                vec![Expr::int(1), Expr::int(2)],
            )
            .unwrap(),
        );
        assert_eq!(expected, got);

        let got = parser("msg.sender is not ADDRESS").parse_or_condition().unwrap();
        let expected =
            Predicate::negate(Predicate::is(attr(&["msg", "sender"]), "address"));
        assert_eq!(expected, got);

        let got = parser("msg.sender is null").parse_or_condition().unwrap();
        assert_eq!(Predicate::is(attr(&["msg", "sender"]), "null"), got);
    }

    #[test]
    fn in_list_must_not_be_empty() {
        let err = parser("msg.sender in ()").parse_or_condition().unwrap_err();
        assert_eq!(err, ParseError::EmptyExpressionList);
    }

    #[test]
    fn not_must_be_followed_by_in() {
        parser("msg.sender not 1").parse_or_condition().unwrap_err();
    }

    #[test]
    fn string_literals_unescape() {
        let got = parser(r#""ab\"cd\n""#).parse_factor().unwrap();
        assert_eq!(Expr::string("ab\"cd\n"), got);
    }

    #[test]
    fn invalid_numbers() {
        parser("1abc").parse_factor().unwrap_err();
        parser("0x").parse_factor().unwrap_err();
        parser("0xzz").parse_factor().unwrap_err();
    }
}
