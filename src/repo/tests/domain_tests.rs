//! Unit tests for repository domain values.

use crate::repo::domain::{RepoDomainError, RepoName, Repository};
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[case("acme/widgets", "acme", "widgets")]
#[case("  acme/widgets  ", "acme", "widgets")]
fn repo_name_splits_owner_and_name(
    #[case] raw: &str,
    #[case] owner: &str,
    #[case] name: &str,
) {
    let repo = RepoName::new(raw).expect("valid repo name");

    assert_eq!(repo.owner(), owner);
    assert_eq!(repo.name(), name);
    assert_eq!(repo.to_string(), format!("{owner}/{name}"));
}

#[rstest]
#[case("")]
#[case("widgets")]
#[case("/widgets")]
#[case("acme/")]
#[case("acme/widgets/extra")]
#[case("acme/wid gets")]
fn repo_name_rejects_malformed_values(#[case] raw: &str) {
    assert_eq!(
        RepoName::new(raw),
        Err(RepoDomainError::InvalidName(raw.to_owned()))
    );
}

#[rstest]
fn repo_name_round_trips_through_serde() {
    let repo = RepoName::new("acme/widgets").expect("valid repo name");
    let json = serde_json::to_string(&repo).expect("serialize");

    assert_eq!(json, "\"acme/widgets\"");
    let decoded: RepoName = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, repo);
    assert!(serde_json::from_str::<RepoName>("\"nope\"").is_err());
}

#[rstest]
fn repository_requires_a_path() {
    let name = RepoName::new("acme/widgets").expect("valid repo name");

    assert_eq!(
        Repository::new(name, "  ", &DefaultClock),
        Err(RepoDomainError::EmptyPath)
    );
}
