//! One-shot field migrations over a document collection.
//!
//! A [`FieldMigration`] walks one collection and backfills a single
//! top-level field from whatever the derive closure can extract out of
//! the existing body. Documents that already carry the field are left
//! untouched even when the derived value disagrees, so the runner is
//! idempotent: a second run over the same data writes nothing.

use serde_json::{Map, Value};
use tracing::info;

use carelink_core::{
  Error, Result,
  store::{Document, DocumentStore, collections},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
  pub scanned: usize,
  pub updated: usize,
  pub errors:  Vec<String>,
}

pub struct FieldMigration<F> {
  collection:   &'static str,
  target_field: &'static str,
  derive:       F,
}

impl<F> FieldMigration<F>
where
  F: Fn(&Document) -> Option<Value>,
{
  pub fn new(collection: &'static str, target_field: &'static str, derive: F) -> Self {
    Self { collection, target_field, derive }
  }

  /// Run over every document in the collection. Failures on individual
  /// documents are recorded and do not stop the sweep.
  pub async fn run<S>(&self, store: &S) -> Result<MigrationReport>
  where
    S: DocumentStore,
  {
    let docs = store.list(self.collection).await.map_err(Error::store)?;

    let mut report = MigrationReport { scanned: docs.len(), ..MigrationReport::default() };
    for doc in &docs {
      if doc.field(self.target_field).is_some() {
        continue;
      }
      let Some(value) = (self.derive)(doc) else {
        continue;
      };

      let mut patch = Map::new();
      patch.insert(self.target_field.to_owned(), value);
      match store.update(self.collection, &doc.id, patch).await {
        Ok(_) => report.updated += 1,
        Err(err) => report
          .errors
          .push(format!("{}/{}: {err}", self.collection, doc.id)),
      }
    }

    info!(
      collection = self.collection,
      field = self.target_field,
      scanned = report.scanned,
      updated = report.updated,
      errors = report.errors.len(),
      "field migration finished"
    );
    Ok(report)
  }
}

/// Hoist `consultationData.chwId` to a top-level `chwId` on health
/// records, so CHW dashboards can query it directly.
pub fn chw_id_backfill() -> FieldMigration<impl Fn(&Document) -> Option<Value>> {
  FieldMigration::new(collections::HEALTH_RECORDS, "chwId", |doc| {
    doc
      .body
      .pointer("/consultationData/chwId")
      .filter(|v| !v.is_null())
      .cloned()
  })
}

#[cfg(test)]
mod tests {
  use carelink_store_sqlite::SqliteStore;
  use serde_json::{Value, json};

  use carelink_core::store::{DocumentStore, collections};

  use super::{FieldMigration, chw_id_backfill};

  async fn store() -> SqliteStore {
    SqliteStore::open_in_memory().await.unwrap()
  }

  async fn add_record(store: &SqliteStore, body: Value) -> String {
    store
      .add(collections::HEALTH_RECORDS, body)
      .await
      .unwrap()
      .id
  }

  #[tokio::test]
  async fn backfills_chw_id_from_consultation_data() {
    let store = store().await;
    let id = add_record(
      &store,
      json!({
        "patientName": "Grace O.",
        "consultationData": { "chwId": "chw-114", "notes": "stable" },
      }),
    )
    .await;

    let report = chw_id_backfill().run(&store).await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.updated, 1);
    assert!(report.errors.is_empty());

    let doc = store
      .get(collections::HEALTH_RECORDS, &id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(doc.str_field("chwId"), Some("chw-114"));
    // The nested copy stays where it was.
    assert_eq!(
      doc.body.pointer("/consultationData/chwId"),
      Some(&json!("chw-114"))
    );
  }

  #[tokio::test]
  async fn second_run_writes_nothing() {
    let store = store().await;
    add_record(
      &store,
      json!({ "consultationData": { "chwId": "chw-114" } }),
    )
    .await;

    let first = chw_id_backfill().run(&store).await.unwrap();
    assert_eq!(first.updated, 1);

    let second = chw_id_backfill().run(&store).await.unwrap();
    assert_eq!(second.scanned, 1);
    assert_eq!(second.updated, 0);
  }

  #[tokio::test]
  async fn present_value_is_never_overwritten() {
    let store = store().await;
    let id = add_record(
      &store,
      json!({
        "chwId": "chw-001",
        "consultationData": { "chwId": "chw-999" },
      }),
    )
    .await;

    let report = chw_id_backfill().run(&store).await.unwrap();
    assert_eq!(report.updated, 0);

    let doc = store
      .get(collections::HEALTH_RECORDS, &id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(doc.str_field("chwId"), Some("chw-001"));
  }

  #[tokio::test]
  async fn null_target_counts_as_absent() {
    let store = store().await;
    let id = add_record(
      &store,
      json!({
        "chwId": null,
        "consultationData": { "chwId": "chw-114" },
      }),
    )
    .await;

    let report = chw_id_backfill().run(&store).await.unwrap();
    assert_eq!(report.updated, 1);

    let doc = store
      .get(collections::HEALTH_RECORDS, &id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(doc.str_field("chwId"), Some("chw-114"));
  }

  #[tokio::test]
  async fn records_without_a_source_are_skipped() {
    let store = store().await;
    let no_consultation = add_record(&store, json!({ "patientName": "Ike" })).await;
    let null_nested = add_record(
      &store,
      json!({ "consultationData": { "chwId": null } }),
    )
    .await;

    let report = chw_id_backfill().run(&store).await.unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.updated, 0);

    for id in [&no_consultation, &null_nested] {
      let doc = store
        .get(collections::HEALTH_RECORDS, id)
        .await
        .unwrap()
        .unwrap();
      assert_eq!(doc.field("chwId"), None);
    }
  }

  #[tokio::test]
  async fn runner_is_generic_over_the_derivation() {
    let store = store().await;
    let id = store
      .add(collections::USERS, json!({ "email": "nia@example.com" }))
      .await
      .unwrap()
      .id;

    let migration = FieldMigration::new(collections::USERS, "displayName", |doc| {
      let email = doc.str_field("email")?;
      Some(json!(email.split('@').next().unwrap_or(email)))
    });

    let report = migration.run(&store).await.unwrap();
    assert_eq!(report.updated, 1);

    let doc = store.get(collections::USERS, &id).await.unwrap().unwrap();
    assert_eq!(doc.str_field("displayName"), Some("nia"));
  }
}
