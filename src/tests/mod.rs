mod settlement_tests;
mod split_tests;

use crate::core::models::{Group, Profile};
use crate::{InMemoryLogging, InMemoryStorage, LedgerService};

pub(crate) type TestService = LedgerService<InMemoryLogging, InMemoryStorage>;

pub(crate) fn service() -> TestService {
    let _ = env_logger::builder().is_test(true).try_init();
    LedgerService::new(InMemoryStorage::new(), InMemoryLogging::new())
}

pub(crate) async fn profile(service: &TestService, name: &str) -> Profile {
    service
        .create_profile(
            name.to_string(),
            format!("{}@example.com", name.to_lowercase()),
        )
        .await
        .unwrap()
}

/// Creates a group owned by the first profile with all profiles as members.
pub(crate) async fn group_of(service: &TestService, name: &str, members: &[&Profile]) -> Group {
    let creator = members[0];
    let group = service
        .create_group(name.to_string(), None, &creator.id)
        .await
        .unwrap();
    for member in &members[1..] {
        service
            .add_member_by_email(&group.id, &member.email, &creator.id)
            .await
            .unwrap();
    }
    service.get_group_details(&group.id, &creator.id).await.unwrap().0
}
