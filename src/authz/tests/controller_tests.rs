//! Access controller integration tests
//!
//! Covers fail-fast validation order, empty-request pass-through, wildcard and
//! enumerated grants, and resolve-and-attach into the request scope.

use async_trait::async_trait;
use ims_authz::{
    cache::{CacheStoreRef, MemoryCacheStore},
    client::{ScopeClient, StaticScopeClient},
    engine::{AccessController, AccessControlled, RequestScope},
    error::{AccessError, RuleError, ScopeClientError},
    rules::{Condition, ConditionEvaluator, Rule, RuleEvaluator, RuleGroup, RuleName},
    scope::TenantScopeCache,
    types::{CallerIdentity, ResolvedIds, ResourceKind},
};
use mockall::{mock, Sequence};
use std::collections::HashMap;
use std::sync::Arc;

mock! {
    pub ScopeSource {}

    #[async_trait]
    impl ScopeClient for ScopeSource {
        async fn tenant_resource_ids(
            &self,
            tenant_id: &str,
        ) -> Result<Vec<String>, ScopeClientError>;
    }
}

mock! {
    pub Evaluator {}

    impl RuleEvaluator for Evaluator {
        fn rule_valid(
            &self,
            group: &RuleGroup,
            attributes: &HashMap<String, String>,
            names: &[RuleName],
        ) -> Result<bool, RuleError>;
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn hub_rule(condition: Condition) -> CallerIdentity {
    CallerIdentity::new(
        "u1",
        "t1",
        RuleGroup::new(vec![Rule::new(RuleName::UserHub, vec![condition])]),
    )
}

fn seller_and_hub_rules(hubs: Condition, sellers: Condition) -> CallerIdentity {
    CallerIdentity::new(
        "u1",
        "t1",
        RuleGroup::new(vec![
            Rule::new(RuleName::UserHub, vec![hubs]),
            Rule::new(RuleName::Seller, vec![sellers]),
        ]),
    )
}

/// Controller over static tenant tables and the condition evaluator
fn controller(
    hubs: &[&str],
    sellers: &[&str],
) -> (AccessController, StaticScopeClient, StaticScopeClient) {
    let store: CacheStoreRef = Arc::new(MemoryCacheStore::new());
    let hub_client = StaticScopeClient::new().with_tenant("t1", hubs.iter().copied());
    let seller_client = StaticScopeClient::new().with_tenant("t1", sellers.iter().copied());

    let ctrl = AccessController::new(
        Arc::new(TenantScopeCache::new(
            ResourceKind::Hub,
            store.clone(),
            Arc::new(hub_client.clone()),
        )),
        Arc::new(TenantScopeCache::new(
            ResourceKind::Seller,
            store,
            Arc::new(seller_client.clone()),
        )),
        Arc::new(ConditionEvaluator::new()),
    );
    (ctrl, hub_client, seller_client)
}

/// Controller whose hub scope and evaluator are mocks
fn mocked_controller(hub_source: MockScopeSource, evaluator: MockEvaluator) -> AccessController {
    let store: CacheStoreRef = Arc::new(MemoryCacheStore::new());
    AccessController::new(
        Arc::new(TenantScopeCache::new(ResourceKind::Hub, store.clone(), Arc::new(hub_source))),
        Arc::new(TenantScopeCache::new(
            ResourceKind::Seller,
            store,
            Arc::new(StaticScopeClient::new()),
        )),
        Arc::new(evaluator),
    )
}

// ============================================================================
// Validate
// ============================================================================

#[tokio::test]
async fn test_enumerated_grant() {
    let (ctrl, _, _) = controller(&["h1", "h2"], &[]);
    let user = hub_rule(Condition::equals(["h1"]));

    assert!(ctrl.validate_hub_ids(&user, "t1", &ids(&["h1"])).await.unwrap());
    assert!(!ctrl.validate_hub_ids(&user, "t1", &ids(&["h2"])).await.unwrap());
    assert!(!ctrl.validate_hub_ids(&user, "t1", &ids(&["h1", "h3"])).await.unwrap());
}

#[tokio::test]
async fn test_wildcard_grant() {
    let (ctrl, _, _) = controller(&["h1", "h2"], &[]);
    let user = hub_rule(Condition::all());

    assert!(ctrl.validate_hub_ids(&user, "t1", &ids(&["h2"])).await.unwrap());
    assert!(ctrl.validate_hub_ids(&user, "t1", &ids(&["h1", "h2"])).await.unwrap());
}

#[tokio::test]
async fn test_wildcard_does_not_cover_foreign_ids() {
    let (ctrl, _, _) = controller(&["h1"], &[]);
    let user = hub_rule(Condition::all());

    assert!(!ctrl.validate_hub_ids(&user, "t1", &ids(&["other-tenant-hub"])).await.unwrap());
}

#[tokio::test]
async fn test_empty_tenant_scope_denies() {
    let (ctrl, _, _) = controller(&[], &[]);
    let user = hub_rule(Condition::all());

    assert!(!ctrl.validate_hub_ids(&user, "t1", &ids(&["h1"])).await.unwrap());
}

#[tokio::test]
async fn test_empty_request_touches_nothing() {
    let mut source = MockScopeSource::new();
    source.expect_tenant_resource_ids().times(0);
    let mut evaluator = MockEvaluator::new();
    evaluator.expect_rule_valid().times(0);

    let ctrl = mocked_controller(source, evaluator);
    let user = hub_rule(Condition::equals(["h1"]));

    assert!(ctrl.validate_hub_ids(&user, "t1", &[]).await.unwrap());
    assert!(ctrl.validate_hub_ids(&user, "", &[]).await.unwrap());
}

#[tokio::test]
async fn test_absent_id_stops_before_evaluator() {
    let mut source = MockScopeSource::new();
    source
        .expect_tenant_resource_ids()
        .times(1)
        .returning(|_| Ok(vec!["h1".to_string(), "h2".to_string()]));

    let mut evaluator = MockEvaluator::new();
    evaluator
        .expect_rule_valid()
        .withf(|_, attributes, _| attributes.get("hub_id").map(String::as_str) == Some("h1"))
        .times(1)
        .returning(|_, _, _| Ok(true));

    let ctrl = mocked_controller(source, evaluator);
    let user = hub_rule(Condition::all());

    // h9 is absent: h2 is never evaluated
    let permitted = ctrl
        .validate_hub_ids(&user, "t1", &ids(&["h1", "h9", "h2"]))
        .await
        .unwrap();
    assert!(!permitted);
}

#[tokio::test]
async fn test_evaluator_denial_stops_iteration() {
    let mut source = MockScopeSource::new();
    source
        .expect_tenant_resource_ids()
        .returning(|_| Ok(vec!["h1".to_string(), "h2".to_string(), "h3".to_string()]));

    let mut seq = Sequence::new();
    let mut evaluator = MockEvaluator::new();
    evaluator
        .expect_rule_valid()
        .withf(|_, attributes, names| {
            attributes.get("hub_id").map(String::as_str) == Some("h1")
                && names.len() == 1
                && names[0] == RuleName::UserHub
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(true));
    evaluator
        .expect_rule_valid()
        .withf(|_, attributes, _| attributes.get("hub_id").map(String::as_str) == Some("h2"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(false));

    let ctrl = mocked_controller(source, evaluator);
    let user = hub_rule(Condition::all());

    let permitted = ctrl
        .validate_hub_ids(&user, "t1", &ids(&["h1", "h2", "h3"]))
        .await
        .unwrap();
    assert!(!permitted);
}

#[tokio::test]
async fn test_evaluator_error_short_circuits() {
    let mut source = MockScopeSource::new();
    source
        .expect_tenant_resource_ids()
        .returning(|_| Ok(vec!["h1".to_string(), "h2".to_string()]));

    let mut evaluator = MockEvaluator::new();
    evaluator
        .expect_rule_valid()
        .times(1)
        .returning(|_, _, _| Err(RuleError::RuleNotFound(RuleName::UserHub)));

    let ctrl = mocked_controller(source, evaluator);
    let user = hub_rule(Condition::all());

    let err = ctrl
        .validate_hub_ids(&user, "t1", &ids(&["h1", "h2"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Rule(RuleError::RuleNotFound(RuleName::UserHub))));
    assert!(err.is_precondition());
}

#[tokio::test]
async fn test_scope_client_error_propagates() {
    let mut source = MockScopeSource::new();
    source
        .expect_tenant_resource_ids()
        .returning(|_| Err(ScopeClientError::unavailable("connection reset")));

    let mut evaluator = MockEvaluator::new();
    evaluator.expect_rule_valid().times(0);

    let ctrl = mocked_controller(source, evaluator);
    let user = hub_rule(Condition::all());

    let err = ctrl
        .validate_hub_ids(&user, "t1", &ids(&["h1"]))
        .await
        .unwrap_err();
    assert!(err.is_downstream());
}

#[tokio::test]
async fn test_tenant_scope_fetched_once_across_checks() {
    let (ctrl, hub_client, _) = controller(&["h1", "h2"], &[]);
    let user = hub_rule(Condition::all());

    for _ in 0..5 {
        assert!(ctrl.validate_hub_ids(&user, "t1", &ids(&["h2"])).await.unwrap());
    }
    assert_eq!(hub_client.calls(), 1);
}

#[tokio::test]
async fn test_seller_ids_use_seller_scope_and_rule() {
    let (ctrl, hub_client, seller_client) = controller(&["h1"], &["s1", "s2"]);
    let user = seller_and_hub_rules(Condition::all(), Condition::equals(["s2"]));

    assert!(ctrl.validate_seller_ids(&user, "t1", &ids(&["s2"])).await.unwrap());
    assert!(!ctrl.validate_seller_ids(&user, "t1", &ids(&["s1"])).await.unwrap());
    assert!(!ctrl.validate_seller_ids(&user, "t1", &ids(&["h1"])).await.unwrap());

    assert_eq!(hub_client.calls(), 0);
    assert_eq!(seller_client.calls(), 1);
}

// ============================================================================
// Validate and set
// ============================================================================

#[tokio::test]
async fn test_empty_request_with_wildcard_attaches_unrestricted() {
    let (ctrl, hub_client, _) = controller(&["h1", "h2"], &[]);
    let user = hub_rule(Condition::all());
    let mut scope = RequestScope::new();

    assert!(ctrl
        .validate_and_set_hub_ids(&user, "t1", &[], &mut scope)
        .await
        .unwrap());

    assert_eq!(scope.get(ResourceKind::Hub), Some(&ResolvedIds::Unrestricted));
    assert!(scope.filter(ResourceKind::Hub).is_none());
    assert!(scope.query_params().is_empty());
    assert_eq!(hub_client.calls(), 0);
}

#[tokio::test]
async fn test_empty_request_with_enumerated_rule_attaches_rule_values() {
    let (ctrl, _, _) = controller(&["h1", "h2"], &[]);
    let user = CallerIdentity::new(
        "u1",
        "t1",
        RuleGroup::new(vec![Rule::new(
            RuleName::UserHub,
            vec![Condition::equals(["h1"]), Condition::equals(["h4"])],
        )]),
    );
    let mut scope = RequestScope::new();

    ctrl.validate_and_set_hub_ids(&user, "t1", &[], &mut scope)
        .await
        .unwrap();

    assert_eq!(
        scope.get(ResourceKind::Hub),
        Some(&ResolvedIds::enumerated(["h1", "h4"]))
    );
}

#[tokio::test]
async fn test_requested_ids_intersect_with_grant() {
    let (ctrl, _, _) = controller(&[], &["s1", "s2", "s3"]);
    let user = seller_and_hub_rules(Condition::all(), Condition::equals(["s1", "s2", "s3"]));
    let mut scope = RequestScope::new();

    assert!(ctrl
        .validate_and_set_seller_ids(&user, "t1", &ids(&["s3", "s1"]), &mut scope)
        .await
        .unwrap());

    assert_eq!(
        scope.get(ResourceKind::Seller),
        Some(&ResolvedIds::enumerated(["s1", "s3"]))
    );
}

#[tokio::test]
async fn test_requested_ids_kept_under_wildcard_grant() {
    let (ctrl, _, _) = controller(&["h1", "h2"], &[]);
    let user = hub_rule(Condition::all());
    let mut scope = RequestScope::new();

    ctrl.validate_and_set_hub_ids(&user, "t1", &ids(&["h2"]), &mut scope)
        .await
        .unwrap();

    assert_eq!(scope.query_params()["hub_ids"], vec!["h2"]);
}

#[tokio::test]
async fn test_denied_request_attaches_nothing() {
    let (ctrl, _, _) = controller(&["h1", "h2"], &[]);
    let user = hub_rule(Condition::equals(["h1"]));
    let mut scope = RequestScope::new();

    assert!(!ctrl
        .validate_and_set_hub_ids(&user, "t1", &ids(&["h2"]), &mut scope)
        .await
        .unwrap());
    assert!(scope.is_empty());
}

#[tokio::test]
async fn test_missing_rule_is_hard_error_not_grant() {
    let (ctrl, _, _) = controller(&["h1"], &["s1"]);
    let user = hub_rule(Condition::all());
    let mut scope = RequestScope::new();

    let err = ctrl
        .validate_and_set_seller_ids(&user, "t1", &[], &mut scope)
        .await
        .unwrap_err();

    assert!(matches!(err, AccessError::Rule(RuleError::RuleNotFound(RuleName::Seller))));
    assert!(scope.is_empty());
}

// ============================================================================
// Payload validation
// ============================================================================

struct TransferOrder {
    hubs: Vec<String>,
    sellers: Vec<String>,
}

impl AccessControlled for TransferOrder {
    fn hub_ids(&self) -> Vec<String> {
        self.hubs.clone()
    }

    fn seller_ids(&self) -> Vec<String> {
        self.sellers.clone()
    }
}

#[tokio::test]
async fn test_validate_payload_requires_both() {
    let (ctrl, _, _) = controller(&["h1"], &["s1"]);
    let user = seller_and_hub_rules(Condition::all(), Condition::all());

    let ok = TransferOrder { hubs: ids(&["h1", "h1"]), sellers: ids(&["s1"]) };
    assert!(ctrl.validate_payload(&user, "t1", &ok).await.unwrap());

    let bad_seller = TransferOrder { hubs: ids(&["h1"]), sellers: ids(&["s9"]) };
    assert!(!ctrl.validate_payload(&user, "t1", &bad_seller).await.unwrap());
}

#[tokio::test]
async fn test_validate_payload_checks_sellers_after_hub_denial() {
    let (ctrl, _, seller_client) = controller(&["h1"], &["s1"]);
    let user = seller_and_hub_rules(Condition::all(), Condition::all());

    let bad_hub = TransferOrder { hubs: ids(&["h9"]), sellers: ids(&["s1"]) };
    assert!(!ctrl.validate_payload(&user, "t1", &bad_hub).await.unwrap());
    assert_eq!(seller_client.calls(), 1);
}
