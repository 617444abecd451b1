//! Opinion import: reads a JSON array of opinions and stores them in DuckDB.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use sentinsight_core::Opinion;
use sentinsight_store::DuckStore;

/// Read `path` as a JSON array of opinions and insert them in file order.
///
/// Annotation sub-records present in the file are kept, so previously
/// annotated opinions do not re-enter the pending set.
pub fn import_file(store: &DuckStore, path: &Path) -> anyhow::Result<usize> {
    let start = Instant::now();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let opinions: Vec<Opinion> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    eprintln!("  Read {} opinions from {}", opinions.len(), path.display());

    let count = store
        .insert_opinions(&opinions)
        .context("writing opinions to DuckDB")?;
    eprintln!("  Stored {count} opinions in {:.1}s", start.elapsed().as_secs_f64());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinsight_core::{OpinionId, PendingOn, Scope};
    use sentinsight_store::WorkRepository;

    #[tokio::test]
    async fn imports_json_array_in_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("opinions.json");
        std::fs::write(
            &file,
            r#"[
                {"id": "r1", "comment": "explica bien", "professorId": 3,
                 "course": "Cálculo I", "reviewDate": "2024-04-01"},
                {"id": "r2", "comment": "grosero", "professorId": 4,
                 "course": "Química", "reviewDate": "2024-04-02"}
            ]"#,
        )
        .unwrap();

        let store = DuckStore::open().unwrap();
        assert_eq!(import_file(&store, &file).unwrap(), 2);

        let pending = store
            .fetch_pending(&Scope::All, PendingOn::Sentiment, 10, 0)
            .await
            .unwrap();
        let ids: Vec<_> = pending.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["r1", "r2"]);
        let r2 = store.get_opinion(&OpinionId::from("r2")).unwrap().unwrap();
        assert_eq!(r2.professor_id, 4);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("bad.json");
        std::fs::write(&file, "{not json").unwrap();
        let store = DuckStore::open().unwrap();
        let err = import_file(&store, &file).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }
}
