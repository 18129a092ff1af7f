use serde_json::{Value, json};

use crate::storage::StorageError;

type MigrationFn = fn(Value) -> Result<Value, StorageError>;

/// Index `n` migrates version `n + 1` to `n + 2`.
fn get_migrations() -> Vec<MigrationFn> {
    vec![migrate_v1_to_v2]
}

/// Returns 1 if the version field is missing (the task-only layout)
pub fn detect_version(data: &Value) -> Result<u32, StorageError> {
    match data.get("version") {
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| StorageError::MalformedVersion(v.to_string())),
        None => Ok(1),
    }
}

/// Migrations are applied sequentially: v1→v2→v3→...→target
pub fn apply_migrations(
    mut data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<Value, StorageError> {
    if from_version == to_version {
        return Ok(data);
    }

    if from_version > to_version {
        return Err(StorageError::FutureVersion(from_version));
    }

    let migrations = get_migrations();

    for version in from_version..to_version {
        let Some(migration) = version
            .checked_sub(1)
            .and_then(|idx| migrations.get(idx as usize))
        else {
            return Err(StorageError::UnsupportedVersion(version));
        };

        tracing::info!(from = version, to = version + 1, "migrating store");
        data = migration(data)?;
    }

    Ok(data)
}

/// Upgrades the task-only store layout (version 1 or unversioned). Time
/// entries and profiles start empty, and each task's status is derived from
/// `completed_at`.
fn migrate_v1_to_v2(mut value: Value) -> Result<Value, StorageError> {
    if let Some(obj) = value.as_object_mut() {
        obj.insert("version".to_string(), Value::from(2));
        obj.entry("time_entries").or_insert_with(|| json!([]));
        obj.entry("profiles").or_insert_with(|| json!([]));

        if let Some(tasks) = obj.get_mut("tasks").and_then(|t| t.as_array_mut()) {
            for task in tasks {
                if let Some(task_obj) = task.as_object_mut() {
                    let status = if task_obj
                        .get("completed_at")
                        .is_some_and(|c| !c.is_null())
                    {
                        "completed"
                    } else {
                        "pending"
                    };
                    task_obj
                        .entry("status")
                        .or_insert_with(|| Value::from(status));
                }
            }
        }
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_version_with_version_field() {
        let data = json!({"version": 2, "tasks": []});
        assert_eq!(detect_version(&data).unwrap(), 2);
    }

    #[test]
    fn test_detect_version_without_version_field() {
        let data = json!({"tasks": []});
        assert_eq!(detect_version(&data).unwrap(), 1);
    }

    #[test]
    fn test_detect_version_rejects_non_numeric_version() {
        let data = json!({"version": "two"});
        assert!(matches!(
            detect_version(&data),
            Err(StorageError::MalformedVersion(_))
        ));
    }

    #[test]
    fn test_apply_migrations_same_version() {
        let data = json!({"version": 2});
        let result = apply_migrations(data.clone(), 2, 2).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_apply_migrations_future_version() {
        let data = json!({"version": 5});
        let result = apply_migrations(data, 5, 2);
        assert!(matches!(result, Err(StorageError::FutureVersion(5))));
    }

    #[test]
    fn test_apply_migrations_without_a_path() {
        let result = apply_migrations(json!({}), 2, 4);
        assert!(matches!(result, Err(StorageError::UnsupportedVersion(2))));
    }

    #[test]
    fn test_v1_to_v2_backfills_collections_and_status() {
        let v1 = json!({
            "tasks": [
                {"title": "open", "completed_at": null},
                {"title": "done", "completed_at": "2024-03-05T12:00:00Z"},
                {"title": "keeps status", "status": "in-progress"}
            ]
        });

        let v2 = apply_migrations(v1, 1, 2).unwrap();
        assert_eq!(v2["version"], 2);
        assert_eq!(v2["time_entries"], json!([]));
        assert_eq!(v2["profiles"], json!([]));
        assert_eq!(v2["tasks"][0]["status"], "pending");
        assert_eq!(v2["tasks"][1]["status"], "completed");
        assert_eq!(v2["tasks"][2]["status"], "in-progress");
    }
}
