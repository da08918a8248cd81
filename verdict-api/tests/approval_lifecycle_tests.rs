//! Approval Queue Lifecycle Tests
//!
//! Exercises the approval routes end to end over the in-memory backend:
//! decisions are final, per-status counts stay consistent with the stored
//! records, and approve-with-execute either lands in `executed` or `failed`.

use axum::extract::{Path, Query, State};
use axum::Json;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::sync::Arc;
use uuid::Uuid;
use verdict_api::{
    routes::approval::{
        self, approve_approval, create_approval, deny_approval, get_approval, list_approvals,
        ListApprovalsQuery,
    },
    types::{ApproveRequest, CreateApprovalRequest, DenyRequest},
    ws::WsState,
    ApprovalService, ErrorCode,
};
use verdict_core::{ActionType, ApprovalStatus, EntityKind, EntityRef, RiskLevel};
use verdict_storage::{ApprovalStore, EntityStore, InMemoryStore};
use verdict_test_utils::{generators, FailingEntityStore};

// ============================================================================
// TEST SUPPORT
// ============================================================================

fn routes_state(
    store: Arc<InMemoryStore>,
    entities: Arc<dyn EntityStore>,
) -> Arc<approval::ApprovalRoutesState> {
    let ws = Arc::new(WsState::new(128));
    Arc::new(approval::ApprovalRoutesState {
        service: ApprovalService::new(store, entities, ws),
        default_limit: 50,
    })
}

fn seed_issue(store: &InMemoryStore) -> Uuid {
    let id = Uuid::now_v7();
    store
        .put_entity(
            &EntityRef::new(EntityKind::Issue, id),
            serde_json::json!({"title": "Seeded issue", "status": "open"}),
        )
        .expect("seed entity");
    id
}

fn close_issue_request(entity_id: Uuid) -> CreateApprovalRequest {
    CreateApprovalRequest {
        action_type: ActionType::CloseIssue,
        description: "Close resolved issue".to_string(),
        params: serde_json::json!({}),
        entity_type: EntityKind::Issue,
        entity_id,
        entity_title: None,
        risk_level: RiskLevel::Medium,
        ai_reasoning: None,
        requested_by: "triage-agent".to_string(),
        requested_of: None,
    }
}

// ============================================================================
// SCENARIO TESTS
// ============================================================================

#[tokio::test]
async fn test_approve_with_execute_lands_in_executed() {
    let store = Arc::new(InMemoryStore::new());
    let state = routes_state(store.clone(), store.clone());
    let entity_id = seed_issue(&store);

    let (_, Json(created)) = create_approval(
        State(state.clone()),
        Json(close_issue_request(entity_id)),
    )
    .await
    .expect("create");
    assert_eq!(created.status, ApprovalStatus::Pending);

    let Json(executed) = approve_approval(
        State(state.clone()),
        Path(created.id),
        Json(ApproveRequest {
            approved_by: "alice".to_string(),
            execute_immediately: true,
        }),
    )
    .await
    .expect("approve");

    assert_eq!(executed.status, ApprovalStatus::Executed);
    assert_eq!(executed.decided_by.as_deref(), Some("alice"));
    assert!(executed.decided_at.is_some());
    assert!(executed.executed_at.is_some());

    let entity = store
        .get_entity(&EntityRef::new(EntityKind::Issue, entity_id))
        .expect("lock")
        .expect("entity");
    assert_eq!(entity["status"], "closed");
}

#[tokio::test]
async fn test_denied_approval_cannot_be_approved() {
    let store = Arc::new(InMemoryStore::new());
    let state = routes_state(store.clone(), store.clone());
    let entity_id = seed_issue(&store);

    let (_, Json(created)) = create_approval(
        State(state.clone()),
        Json(close_issue_request(entity_id)),
    )
    .await
    .expect("create");

    deny_approval(
        State(state.clone()),
        Path(created.id),
        Json(DenyRequest {
            denied_by: "bob".to_string(),
            denial_reason: "Issue is still reproducible".to_string(),
        }),
    )
    .await
    .expect("deny");

    let err = approve_approval(
        State(state.clone()),
        Path(created.id),
        Json(ApproveRequest {
            approved_by: "alice".to_string(),
            execute_immediately: false,
        }),
    )
    .await
    .expect_err("second decision must fail");
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);

    let Json(stored) = get_approval(State(state), Path(created.id))
        .await
        .expect("get");
    assert_eq!(stored.status, ApprovalStatus::Denied);
    assert_eq!(stored.decided_by.as_deref(), Some("bob"));
    assert_eq!(
        stored.denial_reason.as_deref(),
        Some("Issue is still reproducible")
    );
}

#[tokio::test]
async fn test_downstream_failure_lands_in_failed_with_502() {
    let store = Arc::new(InMemoryStore::new());
    let entities: Arc<dyn EntityStore> =
        Arc::new(FailingEntityStore::new("entity service timed out"));
    let state = routes_state(store.clone(), entities);

    let (_, Json(created)) = create_approval(
        State(state.clone()),
        Json(close_issue_request(Uuid::now_v7())),
    )
    .await
    .expect("create");

    let err = approve_approval(
        State(state.clone()),
        Path(created.id),
        Json(ApproveRequest {
            approved_by: "alice".to_string(),
            execute_immediately: true,
        }),
    )
    .await
    .expect_err("execution must fail");
    assert_eq!(err.code, ErrorCode::ExecutionFailed);
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_GATEWAY);

    // The decision survives; only the execution outcome is a failure.
    let Json(stored) = get_approval(State(state), Path(created.id))
        .await
        .expect("get");
    assert_eq!(stored.status, ApprovalStatus::Failed);
    assert_eq!(stored.decided_by.as_deref(), Some("alice"));
    assert!(stored
        .failure_reason
        .as_deref()
        .is_some_and(|r| r.contains("entity service timed out")));
}

#[tokio::test]
async fn test_unknown_approval_is_404() {
    let store = Arc::new(InMemoryStore::new());
    let state = routes_state(store.clone(), store);

    let err = get_approval(State(state), Path(verdict_core::ApprovalId::now_v7()))
        .await
        .expect_err("must be missing");
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

#[derive(Debug, Clone)]
enum Decision {
    Approve,
    Deny,
}

fn decision_strategy() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Approve), Just(Decision::Deny)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Once an approval is decided, every later decision fails and the
    /// record is left exactly as the first decision wrote it.
    #[test]
    fn prop_first_decision_is_final(
        first in decision_strategy(),
        second in decision_strategy(),
    ) {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))?;
        rt.block_on(async {
            let store = Arc::new(InMemoryStore::new());
            let state = routes_state(store.clone(), store.clone());
            let entity_id = seed_issue(&store);

            let (_, Json(created)) = create_approval(
                State(state.clone()),
                Json(close_issue_request(entity_id)),
            )
            .await
            .expect("create");

            let decide = |decision: Decision| {
                let state = state.clone();
                let id = created.id;
                async move {
                    match decision {
                        Decision::Approve => approve_approval(
                            State(state),
                            Path(id),
                            Json(ApproveRequest {
                                approved_by: "alice".to_string(),
                                execute_immediately: false,
                            }),
                        )
                        .await
                        .map(|Json(r)| r),
                        Decision::Deny => deny_approval(
                            State(state),
                            Path(id),
                            Json(DenyRequest {
                                denied_by: "bob".to_string(),
                                denial_reason: "overruled".to_string(),
                            }),
                        )
                        .await
                        .map(|Json(r)| r),
                    }
                }
            };

            let decided = decide(first.clone()).await.expect("first decision");
            let err = decide(second).await.expect_err("second decision must fail");
            prop_assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);

            let Json(stored) = get_approval(State(state), Path(created.id))
                .await
                .expect("get");
            prop_assert_eq!(stored.status, decided.status);
            prop_assert_eq!(stored.decided_by, decided.decided_by);
            Ok(())
        })?;
    }

    /// The list endpoint's per-status counts always tally the stored
    /// records and sum to the total, whatever filter is applied.
    #[test]
    fn prop_list_counts_are_consistent(
        approvals in proptest::collection::vec(generators::arb_pending_approval(), 0..20),
        statuses in proptest::collection::vec(generators::arb_approval_status(), 0..20),
        filter in proptest::option::of(generators::arb_approval_status()),
    ) {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))?;
        rt.block_on(async {
            let store = Arc::new(InMemoryStore::new());
            let state = routes_state(store.clone(), store.clone());

            let mut expected = [0u64; 5];
            for (approval, status) in approvals.into_iter().zip(statuses) {
                let mut approval = approval;
                approval.status = status;
                store.insert_approval(&approval).await.expect("insert");
                match status {
                    ApprovalStatus::Pending => expected[0] += 1,
                    ApprovalStatus::Approved => expected[1] += 1,
                    ApprovalStatus::Denied => expected[2] += 1,
                    ApprovalStatus::Executed => expected[3] += 1,
                    ApprovalStatus::Failed => expected[4] += 1,
                }
            }

            let Json(response) = list_approvals(
                State(state),
                Query(ListApprovalsQuery {
                    status: filter,
                    limit: None,
                }),
            )
            .await
            .expect("list");

            prop_assert_eq!(response.pending_count, expected[0]);
            prop_assert_eq!(response.approved_count, expected[1]);
            prop_assert_eq!(response.denied_count, expected[2]);
            prop_assert_eq!(response.executed_count, expected[3]);
            prop_assert_eq!(response.failed_count, expected[4]);
            prop_assert_eq!(response.total, expected.iter().sum::<u64>());

            // The filtered list only carries the requested status.
            if let Some(filter) = filter {
                prop_assert!(response.approvals.iter().all(|a| a.status == filter));
            }
            Ok(())
        })?;
    }
}
