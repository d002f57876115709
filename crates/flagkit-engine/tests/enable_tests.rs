//! Environment activation tests - default strategy synthesis, auto-disable

use flagkit_engine::{EngineError, FLEXIBLE_ROLLOUT};
use flagkit_test_utils::{feature_input, setup, test_user};
use flagkit_types::{EventType, StrategyCreate, StrategyUpdate};

#[tokio::test]
async fn enabling_with_no_strategies_synthesizes_a_rollout() {
    let (backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let enabled = engine
        .update_enabled_unprotected("default", "f1", "production", true, false, &user)
        .await
        .unwrap();
    assert!(enabled);
    assert!(backend.binding("f1", "production").unwrap().enabled);

    let strategies = engine
        .get_strategies("default", "f1", "production")
        .await
        .unwrap();
    assert_eq!(strategies.len(), 1);
    let synthesized = &strategies[0];
    assert_eq!(synthesized.strategy_name, FLEXIBLE_ROLLOUT);
    assert_eq!(
        synthesized.parameters.get("rollout").map(String::as_str),
        Some("100")
    );
    assert_eq!(
        synthesized.parameters.get("groupId").map(String::as_str),
        Some("f1")
    );

    let types: Vec<EventType> = backend.events().iter().map(|e| e.event_type).collect();
    assert!(types.contains(&EventType::FeatureStrategyAdd));
    assert!(types.contains(&EventType::FeatureEnvironmentEnabled));
}

#[tokio::test]
async fn project_default_strategy_wins_over_the_fallback() {
    let (backend, engine) = setup();
    let user = test_user();
    backend.set_default_strategy(
        "default",
        "production",
        StrategyCreate::of_type("userWithId"),
    );
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    engine
        .update_enabled_unprotected("default", "f1", "production", true, false, &user)
        .await
        .unwrap();
    let strategies = engine
        .get_strategies("default", "f1", "production")
        .await
        .unwrap();
    assert_eq!(strategies[0].strategy_name, "userWithId");
}

#[tokio::test]
async fn enabling_with_only_disabled_strategies_adds_a_fresh_one() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    let mut input = StrategyCreate::of_type("default");
    input.disabled = true;
    engine
        .create_strategy_unprotected("default", "f1", "production", input, &user)
        .await
        .unwrap();

    engine
        .update_enabled_unprotected("default", "f1", "production", true, false, &user)
        .await
        .unwrap();
    let strategies = engine
        .get_strategies("default", "f1", "production")
        .await
        .unwrap();
    assert_eq!(strategies.len(), 2, "a fresh strategy is added");
    assert!(strategies.iter().any(|s| !s.disabled));
}

#[tokio::test]
async fn activate_disabled_strategies_reuses_the_existing_ones() {
    let (backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    let mut input = StrategyCreate::of_type("default");
    input.disabled = true;
    let strategy = engine
        .create_strategy_unprotected("default", "f1", "production", input, &user)
        .await
        .unwrap();

    engine
        .update_enabled_unprotected("default", "f1", "production", true, true, &user)
        .await
        .unwrap();
    let strategies = engine
        .get_strategies("default", "f1", "production")
        .await
        .unwrap();
    assert_eq!(strategies.len(), 1, "no new strategy is synthesized");
    assert!(!backend.stored_strategy(strategy.id).unwrap().disabled);
}

#[tokio::test]
async fn enabling_with_a_live_strategy_touches_nothing() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    engine
        .create_strategy_unprotected(
            "default",
            "f1",
            "production",
            StrategyCreate::of_type("default"),
            &user,
        )
        .await
        .unwrap();

    engine
        .update_enabled_unprotected("default", "f1", "production", true, false, &user)
        .await
        .unwrap();
    let strategies = engine
        .get_strategies("default", "f1", "production")
        .await
        .unwrap();
    assert_eq!(strategies.len(), 1);
}

#[tokio::test]
async fn disabling_never_touches_strategies() {
    let (backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    engine
        .update_enabled_unprotected("default", "f1", "production", true, false, &user)
        .await
        .unwrap();

    engine
        .update_enabled_unprotected("default", "f1", "production", false, false, &user)
        .await
        .unwrap();
    assert!(!backend.binding("f1", "production").unwrap().enabled);
    let strategies = engine
        .get_strategies("default", "f1", "production")
        .await
        .unwrap();
    assert_eq!(strategies.len(), 1, "strategies survive a disable");

    let last = backend.events().into_iter().next_back().unwrap();
    assert_eq!(last.event_type, EventType::FeatureEnvironmentDisabled);
}

#[tokio::test]
async fn unknown_environment_is_not_found() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let result = engine
        .update_enabled_unprotected("default", "f1", "staging", true, false, &user)
        .await;
    assert!(matches!(
        result,
        Err(EngineError::NotFound {
            kind: "environment",
            ..
        })
    ));
}

#[tokio::test]
async fn archived_features_cannot_be_toggled() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    engine
        .archive_feature_unprotected("default", "f1", &user)
        .await
        .unwrap();

    let result = engine
        .update_enabled_unprotected("default", "f1", "production", true, false, &user)
        .await;
    assert!(matches!(result, Err(EngineError::ArchivedFeature(_))));
}

#[tokio::test]
async fn deleting_the_last_strategy_auto_disables() {
    let (backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    engine
        .update_enabled_unprotected("default", "f1", "production", true, false, &user)
        .await
        .unwrap();
    let strategies = engine
        .get_strategies("default", "f1", "production")
        .await
        .unwrap();

    engine
        .delete_strategy_unprotected("default", "f1", "production", strategies[0].id, &user)
        .await
        .unwrap();
    assert!(
        !backend.binding("f1", "production").unwrap().enabled,
        "removing the last strategy disables the environment"
    );
}

#[tokio::test]
async fn disabling_every_strategy_auto_disables() {
    let (backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    engine
        .update_enabled_unprotected("default", "f1", "production", true, false, &user)
        .await
        .unwrap();
    let strategies = engine
        .get_strategies("default", "f1", "production")
        .await
        .unwrap();

    let update = StrategyUpdate {
        disabled: Some(true),
        ..StrategyUpdate::default()
    };
    engine
        .update_strategy_unprotected(
            "default",
            "f1",
            "production",
            strategies[0].id,
            update,
            &user,
        )
        .await
        .unwrap();
    assert!(
        !backend.binding("f1", "production").unwrap().enabled,
        "an environment with only disabled strategies cannot stay enabled"
    );
}
