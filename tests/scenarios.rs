use std::thread;

use predicate_filter::{
    lower, translate, CompareOp, ConstantRef, FieldRef, PredicateNode, Record, TranslateError,
    ValueExpr,
};
use uuid::Uuid;

fn closure(record: Record) -> ConstantRef {
    ConstantRef::new(record)
}

#[test]
fn test_flattened_or_group_under_and() {
    let env = closure(Record::new("closure"));
    let filter = lower(
        r#"|p| p.Name == "Some name" && (p.Description == "dsafsdfsdfs" || p.Age == 6 || p.Id == Uuid::nil())"#,
        &env,
    )
    .unwrap();

    assert_eq!(
        translate(&filter).unwrap(),
        r#"Name = "Some name" AND Description = "dsafsdfsdfs" OR Age = 6 OR (Id.Equals(Guid("00000000-0000-0000-0000-000000000000")))"#
    );
}

#[test]
fn test_captured_user_members() {
    let user = Record::new("User")
        .with("Name", "Namee")
        .with("Age", 33)
        .with("Description", "Description");
    let env = closure(Record::new("closure").with("user", user));
    let filter = lower(
        "|p| p.Name == user.Name && p.Age == user.Age || p.Description == user.Description",
        &env,
    )
    .unwrap();

    assert_eq!(
        translate(&filter).unwrap(),
        r#"Name = "Namee" AND Age = 33 OR Description = "Description""#
    );
}

#[test]
fn test_two_hop_unique_id() {
    let id = Uuid::parse_str("f47ac10b-58cc-4372-a567-0e02b2c3d479").unwrap();
    let env = closure(Record::new("closure").with("first_user", Record::new("User").with("Id", id)));
    let filter = lower("|p| p.Id == first_user.Id", &env).unwrap();

    assert_eq!(
        translate(&filter).unwrap(),
        r#"(Id.Equals(Guid("f47ac10b-58cc-4372-a567-0e02b2c3d479")))"#
    );
}

#[test]
fn test_modulus_comparison_is_rejected() {
    let env = closure(Record::new("closure"));
    let filter = lower(r#"|p| p.Name == "a" && p.Age % 2"#, &env).unwrap();

    assert_eq!(
        translate(&filter),
        Err(TranslateError::UnsupportedOperator("Modulo".to_string()))
    );
}

#[test]
fn test_float_operand_is_rejected() {
    let env = closure(Record::new("closure").with("ratio", 0.5));
    let filter = lower("|p| p.Score >= ratio", &env).unwrap();

    assert_eq!(
        translate(&filter),
        Err(TranslateError::UnsupportedValueType("f64".to_string()))
    );
}

#[test]
fn test_missing_capture_is_a_resolution_error() {
    let env = closure(Record::new("closure"));
    let filter = lower("|p| p.Age == user.Age", &env).unwrap();

    assert_eq!(
        translate(&filter),
        Err(TranslateError::ValueResolutionError("closure.user.Age".to_string()))
    );
}

#[test]
fn test_deep_nesting_concatenates_left_to_right() {
    let leaf = |field: &str, n: i64| {
        PredicateNode::comparison(CompareOp::Equal, FieldRef::new("p", field), ValueExpr::literal(n))
    };
    let tree = PredicateNode::or(
        PredicateNode::and(leaf("A", 1), PredicateNode::or(leaf("B", 2), leaf("C", 3))),
        PredicateNode::and(PredicateNode::and(leaf("D", 4), leaf("E", 5)), leaf("F", 6)),
    );

    assert_eq!(
        translate(&tree).unwrap(),
        "A = 1 AND B = 2 OR C = 3 OR D = 4 AND E = 5 AND F = 6"
    );
}

#[test]
fn test_independent_trees_built_twice_match() {
    let build = || {
        let env = closure(Record::new("closure").with("name", "Namee"));
        lower(r#"|p| p.Name == name || p.Age > 3"#, &env).unwrap()
    };
    assert_eq!(translate(&build()).unwrap(), translate(&build()).unwrap());
}

#[test]
fn test_concurrent_translations_are_isolated() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let env = closure(Record::new("closure").with("n", i as i64));
                let filter = lower(
                    &format!(r#"|p| p.Name == "user {}" && p.Age == n"#, i),
                    &env,
                )
                .unwrap();
                let expected = format!(r#"Name = "user {}" AND Age = {}"#, i, i);
                for _ in 0..200 {
                    assert_eq!(translate(&filter).unwrap(), expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
