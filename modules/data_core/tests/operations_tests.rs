//! Composite operation tests: bulk upsert, search, analytics, transactions
//! and the raw query builder.

mod common;

use chrono::{Duration, Utc};
use common::{doc, memory_store, org, org_repo, seed};
use data_core::{DateRange, FilterSet, ListOptions};
use futures::FutureExt;
use serde_json::json;

#[tokio::test]
async fn bulk_upsert_updates_known_ids_and_creates_the_rest() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);

    let existing = repo.create(org("Existing")).await?;
    let results = repo
        .bulk_upsert(
            vec![
                doc(json!({ "id": existing.id.to_string(), "name": "Renamed" })),
                org("Brand New"),
            ],
            &[],
        )
        .await?;

    assert_eq!(results.len(), 2);
    assert_eq!(repo.count(FilterSet::new()).await?, 2);

    let renamed = repo.find_by_id(existing.id).await?.unwrap();
    assert_eq!(renamed.name, "Renamed");
    assert_eq!(renamed.created_at, existing.created_at);
    Ok(())
}

#[tokio::test]
async fn bulk_upsert_matches_on_custom_conflict_columns() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);

    let existing = repo.create(org("Acme")).await?;
    let results = repo
        .bulk_upsert(
            vec![doc(json!({ "name": "Acme", "segment": "catering" }))],
            &["name"],
        )
        .await?;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, existing.id);
    assert_eq!(results[0].segment.as_deref(), Some("catering"));
    assert_eq!(repo.count(FilterSet::new()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn bulk_upsert_creates_when_a_conflict_value_is_missing() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);

    repo.create(doc(json!({ "name": "Acme", "email": "sales@acme.example" })))
        .await?;
    // the item carries no email, so it cannot match and falls through to
    // a plain create
    let results = repo
        .bulk_upsert(vec![org("Second")], &["email"])
        .await?;

    assert_eq!(results.len(), 1);
    assert_eq!(repo.count(FilterSet::new()).await?, 2);
    Ok(())
}

#[tokio::test]
async fn search_matches_only_the_first_requested_field() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);
    repo.create(doc(json!({ "name": "Pasta Palace" }))).await?;
    repo.create(doc(json!({
        "name": "Burger Barn",
        "website": "https://pasta.example",
    })))
    .await?;

    let page = repo
        .search("pasta", &["name", "website"], ListOptions::default())
        .await?;

    // only the name is matched; the website hit does not surface
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].name, "Pasta Palace");
    assert_eq!(page.pagination.total, 1);
    Ok(())
}

#[tokio::test]
async fn search_is_a_case_insensitive_substring_match() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);
    repo.create(org("Pasta Palace")).await?;
    repo.create(org("Burger Barn")).await?;

    let page = repo.search("PASTA", &["name"], ListOptions::default()).await?;
    assert_eq!(page.data.len(), 1);

    let page = repo.search("a P", &["name"], ListOptions::default()).await?;
    assert_eq!(page.data.len(), 1);
    Ok(())
}

#[tokio::test]
async fn search_treats_like_wildcards_as_literals() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);
    repo.create(org("100% Beef")).await?;
    repo.create(org("1000 Beef")).await?;

    let page = repo.search("100%", &["name"], ListOptions::default()).await?;
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].name, "100% Beef");
    Ok(())
}

#[tokio::test]
async fn search_with_no_fields_lists_everything() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);
    seed(&repo, 3, "Org").await?;

    let page = repo.search("anything", &[], ListOptions::default()).await?;
    assert_eq!(page.pagination.total, 3);
    Ok(())
}

#[tokio::test]
async fn analytics_counts_totals_and_ranged_creations() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);
    seed(&repo, 3, "Org").await?;

    let all = repo.get_analytics(None).await?;
    assert_eq!(all.table, "organizations");
    assert_eq!(all.total, 3);
    assert_eq!(all.created_in_range, 3);

    let now = Utc::now();
    let recent = repo
        .get_analytics(Some(DateRange {
            start: now - Duration::hours(1),
            end: now + Duration::hours(1),
        }))
        .await?;
    assert_eq!(recent.total, 3);
    assert_eq!(recent.created_in_range, 3);

    let past = repo
        .get_analytics(Some(DateRange {
            start: now - Duration::days(30),
            end: now - Duration::days(29),
        }))
        .await?;
    assert_eq!(past.total, 3);
    assert_eq!(past.created_in_range, 0);
    Ok(())
}

#[tokio::test]
async fn analytics_ignores_soft_deleted_rows() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);
    let orgs = seed(&repo, 2, "Org").await?;
    repo.soft_delete(orgs[0].id).await?;

    let analytics = repo.get_analytics(None).await?;
    assert_eq!(analytics.total, 1);
    Ok(())
}

#[tokio::test]
async fn transaction_returns_the_closure_result() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);

    let created = repo
        .transaction(|r| {
            async move {
                let a = r.create(org("First")).await?;
                let b = r.create(org("Second")).await?;
                Ok(vec![a.id, b.id])
            }
            .boxed()
        })
        .await?;

    assert_eq!(created.len(), 2);
    assert_eq!(repo.count(FilterSet::new()).await?, 2);
    Ok(())
}

#[tokio::test]
async fn transaction_failure_keeps_earlier_writes() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);

    let result = repo
        .transaction(|r| {
            async move {
                r.create(org("Committed")).await?;
                // missing name fails validation partway through
                r.create(doc(json!({ "segment": "retail" }))).await?;
                Ok(())
            }
            .boxed()
        })
        .await;

    let err = result.unwrap_err();
    assert!(err.is_validation());
    // no rollback: the first write stays committed
    assert_eq!(repo.count(FilterSet::new()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn query_builder_projects_orders_and_windows() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);
    seed(&repo, 5, "Org").await?;

    let docs = repo
        .query()
        .select(["id", "name"])
        .order_by("name", false)
        .limit(2)
        .offset(1)
        .find_docs()
        .await?;

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["name"], json!("Org 03"));
    assert_eq!(docs[1]["name"], json!("Org 02"));
    assert!(docs[0].get("segment").is_none());
    assert!(docs[0].get("id").is_some());
    Ok(())
}

#[tokio::test]
async fn entity_helpers_compose_engine_filters() -> anyhow::Result<()> {
    let store = memory_store();
    let repo = org_repo(&store);
    repo.create(doc(json!({ "name": "A", "segment": "catering", "priority": "A" })))
        .await?;
    repo.create(doc(json!({ "name": "B", "segment": "catering", "priority": "C" })))
        .await?;
    repo.create(doc(json!({ "name": "C", "segment": "retail", "priority": "B" })))
        .await?;

    let catering = repo
        .find_by_segment("catering", ListOptions::default())
        .await?;
    assert_eq!(catering.pagination.total, 2);

    let priority = repo.find_high_priority(ListOptions::default()).await?;
    assert_eq!(priority.pagination.total, 2);
    assert!(priority.data.iter().all(|o| {
        matches!(o.priority.as_deref(), Some("A") | Some("B"))
    }));

    let named = repo.search_by_name("a", ListOptions::default()).await?;
    assert_eq!(named.pagination.total, 1);
    Ok(())
}
