use emql_parser::errors::ParseError;
use emql_parser::tokens::{Lexer, Token};

fn rendered(query: &str) -> Vec<String> {
    Lexer::new(query)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.to_string())
        .collect()
}

#[test]
fn tokenize_full_query() {
    let query = "select   sum(msg.value)\tFROM 0xabcdef  -- comment\n\
                 \tWHERE   msg.value  >= 5 -- other\n\
                 \tand msg.sig = \"ab\\\"cd\"\n\
                 \tgroup by BLOCKS(3)";

    let expected = vec![
        "select", "sum", "(", "msg", ".", "value", ")", "from", "0xabcdef", "where", "msg", ".",
        "value", ">=", "5", "and", "msg", ".", "sig", "=", "\"ab\\\"cd\"", "group by", "blocks",
        "(", "3", ")",
    ];
    assert_eq!(expected, rendered(query));
}

#[test]
fn keywords_are_case_insensitive() {
    assert_eq!(rendered("SELECT"), ["select"]);
    assert_eq!(rendered("Select"), ["select"]);
    assert_eq!(rendered("select"), ["select"]);
    // Non-keyword identifiers keep their case.
    assert_eq!(rendered("someAttr"), ["someAttr"]);
    assert_eq!(rendered("0xABCDEF"), ["0xABCDEF"]);
}

#[test]
fn group_by_always_fuses() {
    assert_eq!(rendered("group by"), ["group by"]);
    assert_eq!(rendered("group      by"), ["group by"]);
    assert_eq!(rendered("group\n\tby"), ["group by"]);
    assert_eq!(rendered("GROUP By"), ["group by"]);
}

#[test]
fn line_comments_are_dropped() {
    assert_eq!(
        rendered("select -- everything here goes\nvalue"),
        ["select", "value"]
    );
    assert_eq!(rendered("-- only a comment"), Vec::<String>::new());
}

#[test]
fn strings_preserve_backslashes() {
    let toks = Lexer::new(r#""with \\ and \" inside""#).tokenize().unwrap();
    assert_eq!(
        toks,
        vec![Token::QuotedString(r#"with \\ and \" inside"#.to_string())]
    );
}

#[test]
fn unterminated_string_is_an_error() {
    let err = Lexer::new("select \"oops").tokenize().unwrap_err();
    assert!(matches!(err, ParseError::UnterminatedString(_)));
}

#[test]
fn stream_is_finite() {
    let mut lexer = Lexer::new("select a.b from 0x1 where a > 2");
    let mut count = 0;
    while lexer.next_token().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 10);
    // Once done, stays done.
    assert_eq!(lexer.next_token().unwrap(), None);
}
