//! Rendering through the public API only.

use pgchain::prelude::*;
use pgchain::{Missing, count_markers, escape_args};

#[test]
fn full_select_reads_in_fixed_order() {
    let q = ExpressionChain::new()
        .limit(100)
        .and_where("orders.total > ?", args![50_i64])
        .join("customers ON customers.id = orders.customer_id AND customers.country = ?", args!["AR"])
        .order_by("orders.created_at DESC")
        .select(["orders.id", "customers.name"])
        .offset(10)
        .and_where("orders.status = ?", args!["paid"])
        .table("orders")
        .render()
        .unwrap();

    assert_eq!(
        q.sql(),
        "SELECT orders.id, customers.name FROM orders \
         JOIN customers ON customers.id = orders.customer_id AND customers.country = $1 \
         WHERE orders.total > $2 AND orders.status = $3 \
         ORDER BY orders.created_at DESC LIMIT 100 OFFSET 10"
    );
    assert_eq!(format!("{:?}", q.params()), r#"["AR", 50, "paid"]"#);
}

#[test]
fn placeholder_count_matches_arguments() {
    let q = ExpressionChain::new()
        .select(["id"])
        .table("t")
        .join("u ON u.t_id = t.id AND u.a = ? AND u.b = ?", args![1_i32, 2_i32])
        .and_where("t.c IN (?, ?, ?)", args![3_i32, 4_i32, 5_i32])
        .render()
        .unwrap();

    let placeholders = (1..=10)
        .filter(|n| q.sql().contains(&format!("${n}")))
        .count();
    assert_eq!(placeholders, q.params().len());
    assert_eq!(q.params().len(), 5);
    assert_eq!(q.params_ref().len(), 5);
}

#[test]
fn insert_contract() {
    let q = ExpressionChain::new()
        .table("t")
        .insert([("b", Param::new(2_i32)), ("a", Param::new(1_i32))])
        .render()
        .unwrap();
    assert_eq!(q.sql(), "INSERT INTO $1 (a, b) VALUES ($2, $3)");
    assert_eq!(format!("{:?}", q.params()), r#"["t", 1, 2]"#);
}

#[test]
fn incomplete_chains_report_what_is_missing() {
    let err = ExpressionChain::new().render().unwrap_err();
    assert!(matches!(err, ChainError::Incomplete(Missing::Operation)));
    assert_eq!(err.to_string(), "Incomplete chain: no operation set");

    let err = ExpressionChain::new().delete(["x"]).render().unwrap_err();
    assert_eq!(err.to_string(), "Incomplete chain: no table set");
}

#[test]
fn standalone_escaping() {
    assert_eq!(count_markers("a = ? AND b ?? 'k'"), 1);

    let q = escape_args("UPDATE t SET a = ? WHERE id = ?", args!["x", 9_i64]).unwrap();
    assert_eq!(q.sql(), "UPDATE t SET a = $1 WHERE id = $2");

    let err = escape_args("SELECT ?", args![]).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"Argument mismatch in "SELECT ?": 1 placeholder(s), 0 argument(s)"#
    );
}

#[test]
fn owned_and_shared_chains_agree() {
    let owned = ExpressionChain::new()
        .select(["id"])
        .table("users")
        .and_where("age > ?", args![18_i32])
        .group_by("id")
        .tag("adults");

    let shared = SharedChain::from(owned.clone());
    let a = owned.render().unwrap();
    let b = shared.render().unwrap();

    assert_eq!(a.sql(), b.sql());
    assert_eq!(a.sql(), "SELECT id FROM users WHERE age > $1 GROUP BY id");
    assert_eq!(b.tag_name(), Some("adults"));
}
