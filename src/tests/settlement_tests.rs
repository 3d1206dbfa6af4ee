use crate::core::errors::LedgerError;
use crate::core::models::{Group, Profile, SplitType};
use crate::core::services::AddExpenseInput;
use crate::tests::{TestService, group_of, profile, service};

async fn group_with_debt(service: &TestService, debt_major: f64) -> (Profile, Profile, Group) {
    let creditor = profile(service, "Creditor").await;
    let debtor = profile(service, "Debtor").await;
    let group = group_of(service, "Shared", &[&creditor, &debtor]).await;

    // Equal split of 2x the target debt leaves exactly debt_major owed.
    service
        .add_expense(AddExpenseInput {
            group_id: group.id.clone(),
            description: "groceries".to_string(),
            amount: debt_major * 2.0,
            paid_by: creditor.id.clone(),
            split_type: SplitType::Equal,
            participant_ids: vec![creditor.id.clone(), debtor.id.clone()],
            custom_amounts: None,
            custom_percentages: None,
        })
        .await
        .unwrap();

    (creditor, debtor, group)
}

#[tokio::test]
async fn settlement_clears_the_debt_and_is_recorded() {
    let service = service();
    let (creditor, debtor, group) = group_with_debt(&service, 50.0).await;

    let settlement = service
        .settle(&group.id, &debtor.id, &creditor.id, 50.0)
        .await
        .unwrap();
    assert_eq!(settlement.amount.cents(), 5000);
    assert_eq!(settlement.payer_id, debtor.id);
    assert_eq!(settlement.payee_id, creditor.id);

    let balances = service.get_group_balances(&group.id, &creditor.id).await.unwrap();
    assert!(balances.is_empty());

    let history = service.get_group_settlements(&group.id, &creditor.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, settlement.id);
}

#[tokio::test]
async fn settlement_cannot_exceed_the_outstanding_debt() {
    let service = service();
    let (creditor, debtor, group) = group_with_debt(&service, 50.0).await;

    let err = service
        .settle(&group.id, &debtor.id, &creditor.id, 60.0)
        .await
        .unwrap_err();
    match err {
        LedgerError::ExcessSettlementAmount { outstanding } => {
            assert_eq!(outstanding.cents(), 5000);
        }
        other => panic!("expected ExcessSettlementAmount, got {:?}", other),
    }

    // The rejected attempt leaves no trace.
    assert!(service.get_group_settlements(&group.id, &creditor.id).await.unwrap().is_empty());
    let balances = service.get_group_balances(&group.id, &creditor.id).await.unwrap();
    assert_eq!(balances[0].amount.cents(), 5000);
}

#[tokio::test]
async fn partial_settlement_leaves_the_remainder() {
    let service = service();
    let (creditor, debtor, group) = group_with_debt(&service, 50.0).await;

    service.settle(&group.id, &debtor.id, &creditor.id, 20.0).await.unwrap();

    let balances = service.get_group_balances(&group.id, &creditor.id).await.unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].amount.cents(), 3000);
}

#[tokio::test]
async fn residual_within_one_cent_is_zeroed() {
    let service = service();
    let (creditor, debtor, group) = group_with_debt(&service, 50.0).await;

    service.settle(&group.id, &debtor.id, &creditor.id, 49.99).await.unwrap();

    // The one-cent remainder is treated as settled, not left dangling.
    let balances = service.get_group_balances(&group.id, &creditor.id).await.unwrap();
    assert!(balances.is_empty());
}

#[tokio::test]
async fn settlement_requires_an_outstanding_debt() {
    let service = service();
    let (creditor, debtor, group) = group_with_debt(&service, 50.0).await;

    // Wrong direction: the creditor owes nothing to the debtor.
    let err = service
        .settle(&group.id, &creditor.id, &debtor.id, 10.0)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NoOutstandingDebt { .. }));
}

#[tokio::test]
async fn settlement_rejects_bad_amounts_and_self_payment() {
    let service = service();
    let (creditor, debtor, group) = group_with_debt(&service, 50.0).await;

    assert!(matches!(
        service.settle(&group.id, &debtor.id, &creditor.id, 0.0).await,
        Err(LedgerError::InvalidAmount(_))
    ));
    assert!(matches!(
        service.settle(&group.id, &debtor.id, &creditor.id, -5.0).await,
        Err(LedgerError::InvalidAmount(_))
    ));
    assert!(matches!(
        service.settle(&group.id, &debtor.id, &creditor.id, 10.001).await,
        Err(LedgerError::InvalidAmount(_))
    ));
    assert!(matches!(
        service.settle(&group.id, &debtor.id, &debtor.id, 10.0).await,
        Err(LedgerError::SelfSettlement)
    ));
}

#[tokio::test]
async fn settlement_requires_both_parties_in_the_group() {
    let service = service();
    let (creditor, debtor, group) = group_with_debt(&service, 50.0).await;
    let outsider = profile(&service, "Outsider").await;

    assert!(matches!(
        service.settle(&group.id, &outsider.id, &creditor.id, 10.0).await,
        Err(LedgerError::NotGroupMember(_))
    ));
    assert!(matches!(
        service.settle(&group.id, &debtor.id, &outsider.id, 10.0).await,
        Err(LedgerError::NotGroupMember(_))
    ));
}

#[tokio::test]
async fn settlement_history_is_append_only() {
    let service = service();
    let (creditor, debtor, group) = group_with_debt(&service, 50.0).await;

    service.settle(&group.id, &debtor.id, &creditor.id, 10.0).await.unwrap();
    service.settle(&group.id, &debtor.id, &creditor.id, 15.0).await.unwrap();

    let history = service.get_group_settlements(&group.id, &debtor.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].amount.cents(), 1000);
    assert_eq!(history[1].amount.cents(), 1500);

    // Per-user view spans groups and matches.
    let mine = service.get_user_settlements(&debtor.id).await.unwrap();
    assert_eq!(mine.len(), 2);
}
