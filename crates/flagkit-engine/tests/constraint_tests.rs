//! End-to-end constraint validation through the strategy create/update paths

use flagkit_engine::EngineError;
use flagkit_test_utils::{feature_input, in_constraint, restricted_field, setup, test_user};
use flagkit_types::{Constraint, Operator, StrategyCreate, StrategyUpdate};

fn single(operator: Operator, value: &str) -> Constraint {
    Constraint {
        context_name: "appVersion".into(),
        operator,
        value: Some(value.into()),
        values: None,
        case_insensitive: false,
        inverted: false,
    }
}

#[tokio::test]
async fn illegal_values_name_the_offenders() {
    let (backend, engine) = setup();
    let user = test_user();
    backend.add_context_field(restricted_field("userId", &["a"]));
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let mut input = StrategyCreate::of_type("default");
    input.constraints = vec![in_constraint("userId", &["a", "b"])];
    let result = engine
        .create_strategy_unprotected("default", "f1", "production", input, &user)
        .await;
    match result {
        Err(EngineError::BadData(message)) => {
            assert!(message.contains("b"), "offender named: {message}");
            assert!(message.contains("userId"));
        }
        other => panic!("expected BadData, got {other:?}"),
    }
}

#[tokio::test]
async fn undeclared_context_fields_are_unrestricted() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    // No context field named "companyId" is declared anywhere.
    let mut input = StrategyCreate::of_type("default");
    input.constraints = vec![in_constraint("companyId", &["acme"])];
    let strategy = engine
        .create_strategy_unprotected("default", "f1", "production", input, &user)
        .await
        .unwrap();
    assert_eq!(strategy.constraints.len(), 1);
}

#[tokio::test]
async fn malformed_operator_values_block_the_update() {
    let (backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    let strategy = engine
        .create_strategy_unprotected(
            "default",
            "f1",
            "production",
            StrategyCreate::of_type("default"),
            &user,
        )
        .await
        .unwrap();

    for bad in [
        single(Operator::NumGte, "not-a-number"),
        single(Operator::SemverEq, "1.2"),
        single(Operator::DateAfter, "tomorrow"),
    ] {
        let update = StrategyUpdate {
            constraints: Some(vec![bad]),
            ..StrategyUpdate::default()
        };
        let result = engine
            .update_strategy_unprotected("default", "f1", "production", strategy.id, update, &user)
            .await;
        assert!(matches!(result, Err(EngineError::BadData(_))));
    }
    assert!(
        backend.stored_strategy(strategy.id).unwrap().constraints.is_empty(),
        "rejected constraints never land"
    );
}

#[tokio::test]
async fn well_formed_operator_values_pass() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let mut input = StrategyCreate::of_type("default");
    input.constraints = vec![
        single(Operator::NumGte, "42.5"),
        single(Operator::SemverGt, "1.2.3"),
        single(Operator::DateBefore, "2026-01-01T00:00:00Z"),
    ];
    engine
        .create_strategy_unprotected("default", "f1", "production", input, &user)
        .await
        .unwrap();
}
