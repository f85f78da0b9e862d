//! Workflow tests against the scenario-driven mock client.

use std::sync::Arc;
use std::time::Duration;

use bw_core::{
    Applied, CompletionAction, CompletionWorkflow, Error, FinalAcceptance, Role, SideEffect,
    WorkflowConfig,
};
use bw_rest_api_contract::*;
use bw_rest_client_mock::{MockClient, RecordedCall};
use bw_test_scenarios::{Endpoint, Scenario};

async fn open_with(
    scenario: Scenario,
    role: Role,
    config: WorkflowConfig,
) -> (Arc<MockClient>, CompletionWorkflow<MockClient>) {
    let client = Arc::new(MockClient::from_scenario(scenario));
    let workflow = CompletionWorkflow::open(client.clone(), MilestoneId(7), role, config)
        .await
        .unwrap();
    (client, workflow)
}

async fn open(scenario: Scenario, role: Role) -> (Arc<MockClient>, CompletionWorkflow<MockClient>) {
    open_with(scenario, role, WorkflowConfig::default()).await
}

fn new_defect(title: &str) -> NewDefect {
    NewDefect {
        title: title.into(),
        description: format!("{title} im Bad"),
        severity: DefectSeverity::Major,
        location: None,
        room: Some("Bad".into()),
        photos: Vec::new(),
    }
}

#[tokio::test]
async fn test_request_completion_survives_notification_failure() {
    let scenario = Scenario::trade_at(CompletionStatus::InProgress).failing(Endpoint::CreateNotification);
    let (client, workflow) = open(scenario, Role::ServiceProvider).await;

    let outcome = workflow.request_completion("Done").await.unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.from, CompletionStatus::InProgress);
    assert_eq!(outcome.to, CompletionStatus::CompletionRequested);
    assert_eq!(workflow.status(), CompletionStatus::CompletionRequested);
    assert_eq!(client.milestone().completion_status, CompletionStatus::CompletionRequested);
    assert_eq!(client.call_count(Endpoint::CreateNotification), 1);
    assert!(outcome.side_effects[0].is_failed());
    assert_eq!(outcome.side_effects[1], SideEffect::Sent);

    match &client.calls_to(Endpoint::RequestCompletion)[0] {
        RecordedCall::RequestCompletion(id, request) => {
            assert_eq!(*id, MilestoneId(7));
            assert_eq!(request.message, "Done");
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_tracking_task_only_on_first_request() {
    let (client, workflow) = open(Scenario::trade_at(CompletionStatus::InProgress), Role::ServiceProvider).await;
    workflow.request_completion("Fertig").await.unwrap();
    assert_eq!(client.call_count(Endpoint::CreateTask), 1);

    let (client, workflow) = open(Scenario::trade_at(CompletionStatus::UnderReview), Role::ServiceProvider).await;
    let outcome = workflow.request_completion("Nachgebessert").await.unwrap();
    assert_eq!(outcome.to, CompletionStatus::CompletionRequested);
    assert_eq!(client.call_count(Endpoint::CreateTask), 0);
    assert_eq!(client.call_count(Endpoint::CreateNotification), 1);
}

#[tokio::test]
async fn test_accept_completion() {
    let (client, workflow) = open(
        Scenario::trade_at(CompletionStatus::CompletionRequested),
        Role::ProjectOwner,
    )
    .await;

    let outcome = workflow.respond_to_completion(true, None, None).await.unwrap();

    assert_eq!(outcome.to, CompletionStatus::Completed);
    assert_eq!(workflow.status(), CompletionStatus::Completed);
    match &client.calls_to(Endpoint::RespondToCompletion)[0] {
        RecordedCall::RespondToCompletion(_, request) => {
            assert!(request.accepted);
            assert_eq!(request.message, "Gewerk abgenommen.");
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_reject_completion() {
    let (client, workflow) = open(
        Scenario::trade_at(CompletionStatus::CompletionRequested),
        Role::ProjectOwner,
    )
    .await;
    let deadline = chrono::NaiveDate::from_ymd_opt(2026, 11, 30);

    let outcome = workflow
        .respond_to_completion(false, Some("Fix tiles"), deadline)
        .await
        .unwrap();

    assert_eq!(outcome.to, CompletionStatus::UnderReview);
    assert_eq!(client.milestone().completion_status, CompletionStatus::UnderReview);
    match &client.calls_to(Endpoint::RespondToCompletion)[0] {
        RecordedCall::RespondToCompletion(_, request) => {
            assert!(!request.accepted);
            assert_eq!(request.message, "Fix tiles");
            assert_eq!(request.revision_deadline, deadline);
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_submit_resolution_persists_only_toggled_defects() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletedWithDefects)
        .with_acceptance(5)
        .with_defect(1, "Riss in Fliese", false)
        .with_defect(2, "Fuge offen", false);
    let (client, workflow) = open(scenario, Role::ServiceProvider).await;
    assert_eq!(workflow.defects().await.len(), 2);

    assert!(workflow.toggle_defect(DefectId(2)).await.unwrap());
    let outcome = workflow
        .submit_resolution("Mängel behoben", "Fuge neu verfugt")
        .await
        .unwrap();

    assert_eq!(outcome.to, CompletionStatus::DefectsResolved);
    let report = outcome.report.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.persisted, vec![DefectId(2)]);

    assert_eq!(
        client.calls_to(Endpoint::UpdateDefect),
        vec![RecordedCall::UpdateDefect(
            DefectId(2),
            DefectResolutionUpdate {
                resolved: true,
                resolution_notes: "Fuge neu verfugt".into(),
            }
        )]
    );
    let server_defects = client.defects();
    assert!(!server_defects[0].resolved);
    assert!(server_defects[1].resolved);
    assert!(matches!(
        &client.calls_to(Endpoint::SubmitResolution)[0],
        RecordedCall::SubmitResolution(AcceptanceId(5), _)
    ));
    assert_eq!(workflow.status(), CompletionStatus::DefectsResolved);
}

#[tokio::test]
async fn test_repeated_resolution_report_converges() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletedWithDefects)
        .with_acceptance(5)
        .with_defect(1, "Riss", false);
    let (client, workflow) = open(scenario, Role::ServiceProvider).await;
    workflow.toggle_defect(DefectId(1)).await.unwrap();

    workflow.submit_resolution("Behoben", "").await.unwrap();
    let again = workflow.submit_resolution("Behoben", "").await.unwrap();

    assert!(!again.changed);
    assert_eq!(again.to, CompletionStatus::DefectsResolved);
    assert_eq!(client.call_count(Endpoint::SubmitResolution), 1);
    assert_eq!(client.call_count(Endpoint::UpdateDefect), 1);
    assert_eq!(workflow.status(), CompletionStatus::DefectsResolved);
}

#[tokio::test]
async fn test_failed_defect_write_does_not_stop_submission() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletedWithDefects)
        .with_acceptance(5)
        .with_defect(1, "Riss", false)
        .with_defect(2, "Fuge", false)
        .failing_defect(1);
    let (client, workflow) = open(scenario, Role::ServiceProvider).await;
    workflow.toggle_defect(DefectId(1)).await.unwrap();
    workflow.toggle_defect(DefectId(2)).await.unwrap();

    let outcome = workflow.submit_resolution("Behoben", "erledigt").await.unwrap();

    let report = outcome.report.unwrap();
    assert_eq!(report.persisted, vec![DefectId(2)]);
    assert_eq!(report.failed_ids(), vec![DefectId(1)]);
    assert_eq!(client.call_count(Endpoint::UpdateDefect), 2);
    assert_eq!(client.call_count(Endpoint::SubmitResolution), 1);
    assert_eq!(workflow.pending_resolutions().await, vec![DefectId(1)]);
}

#[tokio::test]
async fn test_empty_ledger_is_valid_for_resolution() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletedWithDefects).with_acceptance(5);
    let (client, workflow) = open(scenario, Role::ServiceProvider).await;
    assert!(workflow.defects().await.is_empty());

    let outcome = workflow.submit_resolution("Keine offenen Mängel", "").await.unwrap();

    assert_eq!(outcome.to, CompletionStatus::DefectsResolved);
    assert!(outcome.report.unwrap().persisted.is_empty());
    assert_eq!(client.call_count(Endpoint::UpdateDefect), 0);
}

#[tokio::test]
async fn test_defect_fetch_failure_yields_empty_ledger() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletedWithDefects)
        .with_acceptance(5)
        .with_defect(1, "Riss", false)
        .failing(Endpoint::ListDefects);
    let (_client, workflow) = open(scenario, Role::ServiceProvider).await;

    assert!(workflow.defects().await.is_empty());
    assert!(matches!(
        workflow.toggle_defect(DefectId(1)).await,
        Err(Error::UnknownDefect(DefectId(1)))
    ));
}

#[tokio::test]
async fn test_toggle_twice_round_trips() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletedWithDefects)
        .with_acceptance(5)
        .with_defect(1, "Riss", false)
        .with_defect(2, "Fuge", true);
    let (_client, workflow) = open(scenario, Role::ServiceProvider).await;
    let before = workflow.defects().await;

    workflow.toggle_defect(DefectId(2)).await.unwrap();
    workflow.toggle_defect(DefectId(2)).await.unwrap();

    assert_eq!(workflow.defects().await, before);
    assert!(workflow.pending_resolutions().await.is_empty());
}

#[tokio::test]
async fn test_final_acceptance_and_repeat_is_no_op() {
    let scenario = Scenario::trade_at(CompletionStatus::DefectsResolved).with_acceptance(5);
    let (client, workflow) = open(scenario, Role::ProjectOwner).await;

    let outcome = workflow
        .final_accept(FinalAcceptance {
            quality: 4,
            timeliness: 5,
            overall: 4,
            notes: "Sauber gearbeitet".into(),
        })
        .await
        .unwrap();
    assert_eq!(outcome.to, CompletionStatus::Completed);
    assert!(client.acceptances()[0].is_final());

    let again = workflow.final_accept(FinalAcceptance::default()).await.unwrap();
    assert!(!again.changed);
    assert_eq!(client.call_count(Endpoint::FinalAcceptance), 1);

    assert!(matches!(
        workflow.toggle_defect(DefectId(1)).await,
        Err(Error::LedgerFrozen)
    ));
}

#[tokio::test]
async fn test_invalid_ratings_are_not_sent() {
    let scenario = Scenario::trade_at(CompletionStatus::DefectsResolved).with_acceptance(5);
    let (client, workflow) = open(scenario, Role::ProjectOwner).await;

    let result = workflow
        .final_accept(FinalAcceptance {
            quality: 0,
            ..FinalAcceptance::default()
        })
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(client.call_count(Endpoint::FinalAcceptance), 0);
    assert_eq!(workflow.status(), CompletionStatus::DefectsResolved);
}

#[tokio::test]
async fn test_failed_call_rolls_back() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletionRequested)
        .failing(Endpoint::RespondToCompletion);
    let (client, workflow) = open(scenario, Role::ProjectOwner).await;
    let mut changes = workflow.subscribe();

    let err = workflow.respond_to_completion(true, None, None).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Transition {
            action: CompletionAction::AcceptCompletion,
            ..
        }
    ));
    assert_eq!(
        err.user_message(),
        "Fehler bei der Abnahme-Antwort. Bitte versuchen Sie es erneut."
    );
    assert!(err.is_retryable());
    assert_eq!(workflow.status(), CompletionStatus::CompletionRequested);
    assert_eq!(changes.borrow_and_update().status, CompletionStatus::CompletionRequested);
    assert_eq!(client.call_count(Endpoint::CreateNotification), 0);
}

#[tokio::test]
async fn test_rollback_can_be_disabled() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletionRequested)
        .failing(Endpoint::RespondToCompletion);
    let config = WorkflowConfig {
        rollback_on_failure: false,
        ..WorkflowConfig::default()
    };
    let (_client, workflow) = open_with(scenario, Role::ProjectOwner, config).await;

    assert!(workflow.respond_to_completion(true, None, None).await.is_err());
    assert_eq!(workflow.status(), CompletionStatus::Completed);
}

#[tokio::test]
async fn test_wrong_party_is_not_permitted() {
    let scenario = Scenario::trade_at(CompletionStatus::DefectsResolved).with_acceptance(5);
    let (client, workflow) = open(scenario, Role::ServiceProvider).await;

    let result = workflow.final_accept(FinalAcceptance::default()).await;

    assert!(matches!(
        result,
        Err(Error::NotPermitted {
            role: Role::ServiceProvider,
            action: CompletionAction::FinalAccept,
        })
    ));
    assert_eq!(client.call_count(Endpoint::FinalAcceptance), 0);
    assert!(workflow.available_actions().is_empty());
}

#[tokio::test]
async fn test_illegal_transition_is_rejected() {
    let (client, workflow) = open(Scenario::trade_at(CompletionStatus::Completed), Role::ServiceProvider).await;

    let result = workflow.request_completion("Nochmal").await;

    assert!(matches!(result, Err(Error::Rejected(_))));
    assert_eq!(client.call_count(Endpoint::RequestCompletion), 0);
    assert!(!workflow.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_second_transition_while_in_flight_is_busy() {
    let (client, workflow) = open(Scenario::trade_at(CompletionStatus::InProgress), Role::ServiceProvider).await;
    client.set_latency(Some(Duration::from_secs(1)));

    let (first, second) = tokio::join!(
        workflow.request_completion("Fertig"),
        workflow.request_completion("Fertig")
    );

    assert!(first.unwrap().changed);
    assert!(matches!(second, Err(Error::Busy)));
    assert_eq!(client.call_count(Endpoint::RequestCompletion), 1);
    assert!(!workflow.is_busy());
}

#[tokio::test]
async fn test_accept_with_defects_documents_and_loads_ledger() {
    let (client, workflow) = open(
        Scenario::trade_at(CompletionStatus::CompletionRequested),
        Role::ProjectOwner,
    )
    .await;

    let outcome = workflow
        .accept_with_defects(vec![new_defect("Riss"), new_defect("Fuge")], "Abnahme unter Vorbehalt")
        .await
        .unwrap();

    assert_eq!(outcome.to, CompletionStatus::CompletedWithDefects);
    assert_eq!(outcome.report.unwrap().persisted.len(), 2);
    assert_eq!(client.acceptances().len(), 1);
    assert_eq!(workflow.acceptance_id(), Some(client.acceptances()[0].id));
    assert_eq!(client.call_count(Endpoint::CreateDefect), 2);
    assert!(matches!(
        &client.calls_to(Endpoint::SetCompletionStatus)[0],
        RecordedCall::SetCompletionStatus(_, CompletionStatusUpdate {
            status: CompletionStatus::CompletedWithDefects,
            ..
        })
    ));
    assert_eq!(workflow.defects().await.len(), 2);

    match &client.calls_to(Endpoint::CreateNotification)[0] {
        RecordedCall::CreateNotification(request) => {
            assert_eq!(request.recipient_id, UserId(20));
            assert_eq!(request.notification_type, NotificationType::AcceptanceWithDefects);
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_defect_is_rejected_before_any_call() {
    let (client, workflow) = open(
        Scenario::trade_at(CompletionStatus::CompletionRequested),
        Role::ProjectOwner,
    )
    .await;

    let result = workflow.accept_with_defects(vec![new_defect("")], "").await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(client.call_count(Endpoint::CreateAcceptance), 0);
    assert_eq!(workflow.status(), CompletionStatus::CompletionRequested);
}

#[tokio::test]
async fn test_proceed_without_resolution() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletedWithDefects)
        .with_acceptance(5)
        .with_defect(1, "Riss", false);
    let (client, workflow) = open(scenario, Role::ServiceProvider).await;

    let outcome = workflow
        .proceed_without_resolution("Mangel wird gemindert")
        .await
        .unwrap();

    assert_eq!(outcome.to, CompletionStatus::DefectsResolved);
    assert_eq!(client.call_count(Endpoint::UpdateDefect), 0);
    match &client.calls_to(Endpoint::SubmitResolution)[0] {
        RecordedCall::SubmitResolution(_, request) => {
            assert_eq!(
                request.resolution_notes,
                "[Ohne Mängelbehebung] Mangel wird gemindert"
            );
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_resolution_needs_acceptance_record() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletedWithDefects);
    let (client, workflow) = open(scenario, Role::ServiceProvider).await;

    let result = workflow.submit_resolution("Behoben", "").await;

    assert!(matches!(result, Err(Error::MissingAcceptance(MilestoneId(7)))));
    assert_eq!(workflow.status(), CompletionStatus::CompletedWithDefects);
    assert_eq!(client.call_count(Endpoint::SubmitResolution), 0);
}

#[tokio::test]
async fn test_refresh_picks_up_counterparty_change() {
    let (client, workflow) = open(Scenario::trade_at(CompletionStatus::CompletionRequested), Role::ServiceProvider).await;
    let mut changes = workflow.subscribe();

    client.set_server_status(CompletionStatus::UnderReview);
    let applied = workflow.refresh().await.unwrap();

    assert!(matches!(applied, Applied::Changed(_)));
    assert!(changes.has_changed().unwrap());
    assert_eq!(changes.borrow_and_update().status, CompletionStatus::UnderReview);
    assert_eq!(
        workflow.available_actions(),
        vec![CompletionAction::RequestCompletion]
    );
    assert_eq!(workflow.refresh().await.unwrap(), Applied::Unchanged);
}

#[tokio::test]
async fn test_final_acceptance_record_means_completed() {
    let mut scenario = Scenario::trade_at(CompletionStatus::DefectsResolved).with_acceptance(5);
    scenario.acceptances[0].final_completion_date = Some(chrono::Utc::now());
    let (client, workflow) = open(scenario, Role::ProjectOwner).await;

    assert_eq!(workflow.status(), CompletionStatus::Completed);
    workflow.final_accept(FinalAcceptance::default()).await.unwrap();
    assert_eq!(client.call_count(Endpoint::FinalAcceptance), 0);
}

#[tokio::test]
async fn test_progress_update() {
    let (client, workflow) = open(Scenario::trade_at(CompletionStatus::InProgress), Role::ServiceProvider).await;

    assert!(matches!(
        workflow.update_progress(101, "zu viel").await,
        Err(Error::Validation(_))
    ));
    workflow.update_progress(60, "Wände verputzt").await.unwrap();

    assert_eq!(workflow.progress(), 60);
    assert_eq!(client.milestone().progress_percentage, 60);
    assert_eq!(workflow.status(), CompletionStatus::InProgress);
}

#[tokio::test]
async fn test_mark_messages_read() {
    let scenario = Scenario::trade_at(CompletionStatus::InProgress);
    let client = Arc::new(MockClient::from_scenario(scenario));
    client.set_unread(false, true);
    let workflow = CompletionWorkflow::open(
        client.clone(),
        MilestoneId(7),
        Role::ServiceProvider,
        WorkflowConfig::default(),
    )
    .await
    .unwrap();
    assert!(workflow.has_unread_messages());

    workflow.mark_messages_read().await.unwrap();

    assert!(!workflow.has_unread_messages());
    assert!(!client.milestone().has_unread_messages_dienstleister);
    assert!(workflow.polling_suppressed());
}

#[tokio::test]
async fn test_disabled_notifier_sends_nothing() {
    let config = WorkflowConfig {
        notify_counterparty: false,
        ..WorkflowConfig::default()
    };
    let (client, workflow) = open_with(
        Scenario::trade_at(CompletionStatus::InProgress),
        Role::ServiceProvider,
        config,
    )
    .await;

    let outcome = workflow.request_completion("Fertig").await.unwrap();

    assert!(outcome
        .side_effects
        .iter()
        .all(|effect| matches!(effect, SideEffect::Skipped(_))));
    assert_eq!(client.call_count(Endpoint::CreateNotification), 0);
    assert_eq!(client.call_count(Endpoint::CreateTask), 0);
}

#[tokio::test]
async fn test_final_acceptance_persists_owner_marks() {
    let scenario = Scenario::trade_at(CompletionStatus::DefectsResolved)
        .with_acceptance(5)
        .with_defect(1, "Riss", false)
        .with_defect(2, "Fuge", true);
    let (client, workflow) = open(scenario, Role::ProjectOwner).await;

    workflow.toggle_defect(DefectId(1)).await.unwrap();
    let outcome = workflow
        .final_accept(FinalAcceptance {
            notes: "Riss bei Abnahme geprüft".into(),
            ..FinalAcceptance::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome.to, CompletionStatus::Completed);
    assert_eq!(outcome.report.unwrap().persisted, vec![DefectId(1)]);
    match &client.calls_to(Endpoint::UpdateDefect)[..] {
        [RecordedCall::UpdateDefect(id, update)] => {
            assert_eq!(*id, DefectId(1));
            assert!(update.resolved);
            assert_eq!(update.resolution_notes, "Riss bei Abnahme geprüft");
        }
        other => panic!("unexpected calls {other:?}"),
    }
    assert!(client.defects().iter().all(|d| d.resolved));
    assert!(workflow.pending_resolutions().await.is_empty());
}

#[tokio::test]
async fn test_refresh_into_defects_resolved_reloads_ledger() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletedWithDefects)
        .with_acceptance(5)
        .with_defect(1, "Riss", false);
    let (client, workflow) = open(scenario, Role::ProjectOwner).await;
    assert!(!workflow.defects().await[0].resolved);

    client.set_defect_resolved(DefectId(1), true);
    client.set_server_status(CompletionStatus::DefectsResolved);
    let applied = workflow.refresh().await.unwrap();

    assert!(matches!(applied, Applied::Changed(_)));
    assert_eq!(workflow.status(), CompletionStatus::DefectsResolved);
    assert!(workflow.defects().await[0].resolved);
    assert_eq!(client.call_count(Endpoint::ListDefects), 2);
}

#[tokio::test]
async fn test_accept_with_defects_retry_reuses_acceptance() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletionRequested)
        .failing(Endpoint::SetCompletionStatus);
    let (client, workflow) = open(scenario, Role::ProjectOwner).await;
    let defects = vec![new_defect("Riss"), new_defect("Fuge")];

    let err = workflow
        .accept_with_defects(defects.clone(), "Vorbehalt")
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(workflow.status(), CompletionStatus::CompletionRequested);

    client.recover(Endpoint::SetCompletionStatus);
    let outcome = workflow.accept_with_defects(defects, "Vorbehalt").await.unwrap();

    assert_eq!(outcome.to, CompletionStatus::CompletedWithDefects);
    assert_eq!(client.acceptances().len(), 1);
    assert_eq!(client.call_count(Endpoint::CreateAcceptance), 1);
    assert_eq!(client.call_count(Endpoint::CreateDefect), 2);
    assert_eq!(client.defects().len(), 2);
    assert_eq!(outcome.report.unwrap().persisted.len(), 2);
    assert_eq!(workflow.acceptance_id(), Some(client.acceptances()[0].id));
    assert_eq!(client.milestone().completion_status, CompletionStatus::CompletedWithDefects);
}

#[tokio::test]
async fn test_retry_documents_only_missing_defects() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletionRequested)
        .failing(Endpoint::SetCompletionStatus);
    let (client, workflow) = open(scenario, Role::ProjectOwner).await;

    workflow
        .accept_with_defects(vec![new_defect("Riss")], "")
        .await
        .unwrap_err();
    client.recover(Endpoint::SetCompletionStatus);
    let outcome = workflow
        .accept_with_defects(vec![new_defect("Riss"), new_defect("Fuge")], "")
        .await
        .unwrap();

    assert_eq!(client.call_count(Endpoint::CreateDefect), 2);
    let titles: Vec<String> = client.defects().into_iter().map(|d| d.title).collect();
    assert_eq!(titles, vec!["Riss", "Fuge"]);
    assert_eq!(outcome.report.unwrap().persisted.len(), 2);
}

#[tokio::test]
async fn test_schedule_acceptance_appointment() {
    let (client, workflow) = open(
        Scenario::trade_at(CompletionStatus::CompletionRequested),
        Role::ProjectOwner,
    )
    .await;
    let proposed = chrono::Utc::now() + chrono::Duration::days(3);

    workflow
        .schedule_acceptance(proposed, "Zugang über Hof")
        .await
        .unwrap();

    match &client.appointments()[..] {
        [request] => {
            assert_eq!(request.trade_id, MilestoneId(7));
            assert_eq!(request.appointment_type, AppointmentType::Acceptance);
            assert_eq!(request.proposed_date, proposed);
            assert_eq!(request.notes, "Zugang über Hof");
        }
        other => panic!("unexpected appointments {other:?}"),
    }
    assert_eq!(workflow.status(), CompletionStatus::CompletionRequested);
}

#[tokio::test]
async fn test_appointment_only_for_owner_with_open_request() {
    let tomorrow = chrono::Utc::now() + chrono::Duration::days(1);

    let (client, provider) = open(
        Scenario::trade_at(CompletionStatus::CompletionRequested),
        Role::ServiceProvider,
    )
    .await;
    assert!(matches!(
        provider.schedule_acceptance(tomorrow, "").await,
        Err(Error::AppointmentNotAllowed {
            role: Role::ServiceProvider,
            status: CompletionStatus::CompletionRequested,
        })
    ));

    let (_, owner) = open(Scenario::trade_at(CompletionStatus::InProgress), Role::ProjectOwner).await;
    assert!(matches!(
        owner.schedule_acceptance(tomorrow, "").await,
        Err(Error::AppointmentNotAllowed { .. })
    ));
    assert_eq!(client.call_count(Endpoint::ScheduleAppointment), 0);
}

#[tokio::test]
async fn test_past_appointment_is_rejected() {
    let (client, workflow) = open(
        Scenario::trade_at(CompletionStatus::CompletionRequested),
        Role::ProjectOwner,
    )
    .await;

    let result = workflow
        .schedule_acceptance(chrono::Utc::now() - chrono::Duration::hours(1), "")
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(client.call_count(Endpoint::ScheduleAppointment), 0);
}

#[tokio::test]
async fn test_failed_appointment_is_retryable() {
    let scenario = Scenario::trade_at(CompletionStatus::CompletionRequested)
        .failing(Endpoint::ScheduleAppointment);
    let (_client, workflow) = open(scenario, Role::ProjectOwner).await;

    let err = workflow
        .schedule_acceptance(chrono::Utc::now() + chrono::Duration::days(2), "")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Appointment(_)));
    assert!(err.is_retryable());
    assert_eq!(
        err.user_message(),
        "Fehler bei der Terminvereinbarung. Bitte versuchen Sie es erneut."
    );
}
