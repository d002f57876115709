//! Strategy lifecycle tests - creation defaults, quotas, identity rules

use flagkit_engine::{EngineError, SortOrderUpdate};
use flagkit_test_utils::{feature_input, setup, test_user};
use flagkit_types::{
    EventType, ResourceLimits, Segment, StrategyCreate, StrategyUpdate, Variant, WEIGHT_TOTAL,
};
use uuid::Uuid;

#[tokio::test]
async fn flexible_rollout_gets_parameter_defaults() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let strategy = engine
        .create_strategy_unprotected(
            "default",
            "f1",
            "default",
            StrategyCreate::of_type("flexibleRollout"),
            &user,
        )
        .await
        .unwrap();

    assert_eq!(
        strategy.parameters.get("rollout").map(String::as_str),
        Some("100")
    );
    let stickiness = strategy.parameters.get("stickiness").unwrap();
    assert!(!stickiness.is_empty(), "stickiness must get a default");
    assert_eq!(
        strategy.parameters.get("groupId").map(String::as_str),
        Some("f1")
    );
}

#[tokio::test]
async fn caller_parameters_are_not_overwritten() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let mut input = StrategyCreate::of_type("flexibleRollout");
    input
        .parameters
        .insert("rollout".to_string(), "25".to_string());

    let strategy = engine
        .create_strategy_unprotected("default", "f1", "production", input, &user)
        .await
        .unwrap();
    assert_eq!(
        strategy.parameters.get("rollout").map(String::as_str),
        Some("25")
    );
}

#[tokio::test]
async fn third_strategy_over_limit_is_rejected() {
    let (backend, engine) = setup();
    let user = test_user();
    backend.set_limits(ResourceLimits {
        feature_environment_strategies: 2,
        ..ResourceLimits::default()
    });
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    for _ in 0..2 {
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
    }

    let result = engine
        .create_strategy_unprotected(
            "default",
            "f1",
            "production",
            StrategyCreate::of_type("default"),
            &user,
        )
        .await;
    assert!(
        matches!(
            result,
            Err(EngineError::LimitExceeded {
                resource: "strategy",
                limit: 2
            })
        ),
        "third strategy must trip the per-environment quota"
    );
}

#[tokio::test]
async fn unknown_strategy_type_is_not_found() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let result = engine
        .create_strategy_unprotected(
            "default",
            "f1",
            "production",
            StrategyCreate::of_type("gradualRolloutUserId"),
            &user,
        )
        .await;
    assert!(matches!(
        result,
        Err(EngineError::NotFound {
            kind: "strategy type",
            ..
        })
    ));
}

#[tokio::test]
async fn unconnected_environment_becomes_bad_data() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    // "staging" was never added as an environment, so the store raises the
    // environment foreign key; the engine must translate it.
    let result = engine
        .create_strategy_unprotected(
            "default",
            "f1",
            "staging",
            StrategyCreate::of_type("default"),
            &user,
        )
        .await;
    match result {
        Err(EngineError::BadData(message)) => {
            assert!(message.contains("staging"), "message names the environment");
            assert!(message.contains("not connected"));
        }
        other => panic!("expected BadData, got {other:?}"),
    }
}

#[tokio::test]
async fn growing_constraints_past_quota_fails_but_shrinking_passes() {
    let (backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let mut input = StrategyCreate::of_type("default");
    input.constraints = vec![
        flagkit_test_utils::in_constraint("userId", &["a"]),
        flagkit_test_utils::in_constraint("userId", &["b"]),
        flagkit_test_utils::in_constraint("userId", &["c"]),
    ];
    let strategy = engine
        .create_strategy_unprotected("default", "f1", "production", input, &user)
        .await
        .unwrap();

    backend.set_limits(ResourceLimits {
        constraints: 2,
        ..ResourceLimits::default()
    });

    // Stored list is already over the new quota; reducing must still work.
    let shrink = StrategyUpdate {
        constraints: Some(vec![
            flagkit_test_utils::in_constraint("userId", &["a"]),
            flagkit_test_utils::in_constraint("userId", &["b"]),
        ]),
        ..StrategyUpdate::default()
    };
    engine
        .update_strategy_unprotected("default", "f1", "production", strategy.id, shrink, &user)
        .await
        .unwrap();

    // Growing from 2 back to 3 must fail.
    let grow = StrategyUpdate {
        constraints: Some(vec![
            flagkit_test_utils::in_constraint("userId", &["a"]),
            flagkit_test_utils::in_constraint("userId", &["b"]),
            flagkit_test_utils::in_constraint("userId", &["c"]),
        ]),
        ..StrategyUpdate::default()
    };
    let result = engine
        .update_strategy_unprotected("default", "f1", "production", strategy.id, grow, &user)
        .await;
    assert!(matches!(
        result,
        Err(EngineError::LimitExceeded {
            resource: "constraint",
            limit: 2
        })
    ));
}

#[tokio::test]
async fn strategy_identity_is_immutable() {
    let (backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    engine
        .create_feature("default", feature_input("f2"), &user)
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

    // Addressing the strategy through the wrong feature is "not found" and
    // writes nothing.
    let update = StrategyUpdate {
        disabled: Some(true),
        ..StrategyUpdate::default()
    };
    let result = engine
        .update_strategy_unprotected("default", "f2", "production", strategy.id, update, &user)
        .await;
    assert!(matches!(result, Err(EngineError::NotFound { .. })));
    assert!(
        !backend.stored_strategy(strategy.id).unwrap().disabled,
        "failed update must not write"
    );
}

#[tokio::test]
async fn updates_renormalize_variants_even_when_untouched() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();
    let mut input = StrategyCreate::of_type("default");
    input.variants = vec![Variant::variable("a"), Variant::fixed("b", 200)];
    let strategy = engine
        .create_strategy_unprotected("default", "f1", "production", input, &user)
        .await
        .unwrap();

    // A title-only update still passes the merged list through the fixer.
    let update = StrategyUpdate {
        title: Some("renamed".into()),
        ..StrategyUpdate::default()
    };
    let updated = engine
        .update_strategy_unprotected("default", "f1", "production", strategy.id, update, &user)
        .await
        .unwrap();

    let total: u32 = updated.variants.iter().map(|v| u32::from(v.weight)).sum();
    assert_eq!(total, u32::from(WEIGHT_TOTAL));
    let variable = updated.variants.iter().find(|v| v.name == "a").unwrap();
    assert_eq!(variable.weight, 800);
    assert_eq!(updated.title.as_deref(), Some("renamed"));
}

#[tokio::test]
async fn delete_strategy_is_idempotent() {
    let (backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let before = backend.events().len();
    engine
        .delete_strategy_unprotected("default", "f1", "production", Uuid::new_v4(), &user)
        .await
        .unwrap();
    assert_eq!(
        backend.events().len(),
        before,
        "deleting an absent strategy emits nothing"
    );
}

#[tokio::test]
async fn update_pairs_pre_and_post_snapshots() {
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

    let update = StrategyUpdate {
        disabled: Some(true),
        ..StrategyUpdate::default()
    };
    engine
        .update_strategy_unprotected("default", "f1", "production", strategy.id, update, &user)
        .await
        .unwrap();

    let event = backend
        .events()
        .into_iter()
        .rfind(|e| e.event_type == EventType::FeatureStrategyUpdate)
        .expect("update event stored");
    let pre = event.pre_data.expect("pre snapshot");
    let post = event.post_data.expect("post snapshot");
    assert_eq!(pre["disabled"], false);
    assert_eq!(post["disabled"], true);
    assert!(
        pre.get("featureName").is_none(),
        "snapshots use the public projection"
    );
}

#[tokio::test]
async fn segment_from_another_project_is_rejected() {
    let (backend, engine) = setup();
    let user = test_user();
    backend.add_segment(Segment {
        id: 7,
        name: "beta-testers".into(),
        project: Some("other".into()),
    });
    backend.add_segment(Segment {
        id: 8,
        name: "all-users".into(),
        project: None,
    });
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let mut scoped = StrategyCreate::of_type("default");
    scoped.segments = vec![7];
    let result = engine
        .create_strategy_unprotected("default", "f1", "production", scoped, &user)
        .await;
    assert!(matches!(result, Err(EngineError::InvalidOperation(_))));

    let mut global = StrategyCreate::of_type("default");
    global.segments = vec![8];
    let strategy = engine
        .create_strategy_unprotected("default", "f1", "production", global, &user)
        .await
        .unwrap();
    assert_eq!(backend.segments_for(strategy.id), vec![8]);
}

#[tokio::test]
async fn unknown_segment_is_not_found() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let mut input = StrategyCreate::of_type("default");
    input.segments = vec![42];
    let result = engine
        .create_strategy_unprotected("default", "f1", "production", input, &user)
        .await;
    assert!(matches!(
        result,
        Err(EngineError::NotFound {
            kind: "segment",
            ..
        })
    ));
}

#[tokio::test]
async fn sort_orders_reorder_listing() {
    let (_backend, engine) = setup();
    let user = test_user();
    engine
        .create_feature("default", feature_input("f1"), &user)
        .await
        .unwrap();

    let first = engine
        .create_strategy_unprotected(
            "default",
            "f1",
            "production",
            StrategyCreate::of_type("default"),
            &user,
        )
        .await
        .unwrap();
    let second = engine
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
        .set_strategy_sort_orders(
            "default",
            "f1",
            "production",
            &[
                SortOrderUpdate {
                    id: second.id,
                    sort_order: 0,
                },
                SortOrderUpdate {
                    id: first.id,
                    sort_order: 1,
                },
            ],
            &user,
        )
        .await
        .unwrap();

    let listed = engine
        .get_strategies("default", "f1", "production")
        .await
        .unwrap();
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}
