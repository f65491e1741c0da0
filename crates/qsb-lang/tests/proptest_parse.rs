//! Property-based tests for the Q# parser.
//!
//! Generated programs and expressions from a small grammar must always parse,
//! and the parser must never panic on arbitrary input.

use proptest::prelude::*;
use qsb_lang::ast::{Expr, Stmt};
use qsb_lang::{parse, parse_expression};

/// Random well-formed integer expressions.
fn arb_int_expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0_i64..1000).prop_map(|v| v.to_string()),
        "[a-z][a-z0-9]{0,4}".prop_filter("keyword", |s| !is_keyword(s)),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), binary_op(), inner.clone()).prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("-{e}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("F({a}, {b})")),
            (inner.clone(), inner).prop_map(|(c, e)| format!("{c} == 0 ? {e} | 1")),
        ]
    })
}

fn binary_op() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "+", "-", "*", "/", "%", "^", "<", ">=", "==", "!=", "|||", "&&&", "^^^", "<<<", ">>>",
    ])
}

fn is_keyword(s: &str) -> bool {
    matches!(
        s,
        "and" | "or" | "not" | "if" | "in" | "is" | "for" | "let" | "set" | "use" | "body"
            | "elif" | "else" | "fail" | "open" | "true" | "false" | "apply" | "until"
            | "while" | "fixup" | "borrow" | "repeat" | "return" | "within" | "import"
            | "export" | "adjoint" | "mutable"
    )
}

proptest! {
    #[test]
    fn generated_expressions_parse(expr in arb_int_expr()) {
        prop_assert!(parse_expression(&expr).is_ok(), "failed to parse: {}", expr);
    }

    #[test]
    fn let_bindings_keep_statement_count(values in prop::collection::vec(arb_int_expr(), 1..8)) {
        let body: String = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("let v{i} = {v};\n"))
            .collect();
        let source = format!("operation Main() : Unit {{\n{body}}}");

        let program = parse(&source).unwrap();
        let stmts = &program.callables[0].body.stmts;
        prop_assert_eq!(stmts.len(), values.len());
        let all_let = stmts.iter().all(|s| matches!(s, Stmt::Let { .. }));
        prop_assert!(all_let);
    }

    #[test]
    fn arbitrary_input_never_panics(input in "\\PC{0,64}") {
        let _ = parse(&input);
        let _ = parse_expression(&input);
    }

    #[test]
    fn qubit_register_sizes(n in 1_i64..64) {
        let source = format!("operation Main() : Unit {{ use qs = Qubit[{n}]; ResetAll(qs); }}");
        let program = parse(&source).unwrap();
        prop_assert_eq!(program.callables[0].body.stmts.len(), 2);
    }
}

#[test]
fn interpolated_message_parses() {
    let expr = parse_expression(r#"Message($"Result: {r}")"#).unwrap();
    assert!(matches!(expr, Expr::Call { .. }));
}
