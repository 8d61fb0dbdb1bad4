//! The operation log: ordered, replayable record of committed edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::operation::{Edit, EditError, EditKind, Operation, OperationId};

/// Ordered collection of committed operations for one clip.
///
/// Trim and Speed are singletons: committing one replaces the previous
/// operation of that kind. Everything else accumulates in commit order.
///
/// Deserializing replays the recorded operations through
/// [`OperationLog::commit`], so a stored log is held to the same rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordedLog")]
pub struct OperationLog {
    operations: Vec<Operation>,
    updated_at: DateTime<Utc>,
}

/// Wire shape of a stored log, before replay.
#[derive(Deserialize)]
struct RecordedLog {
    #[serde(default)]
    operations: Vec<Operation>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecordedLog> for OperationLog {
    type Error = EditError;

    fn try_from(recorded: RecordedLog) -> Result<Self, Self::Error> {
        let mut log = Self::from_operations(recorded.operations)?;
        log.updated_at = recorded.updated_at;
        Ok(log)
    }
}

impl OperationLog {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Rebuild a log by replaying recorded operations through [`OperationLog::commit`].
    pub fn from_operations(
        operations: impl IntoIterator<Item = Operation>,
    ) -> Result<Self, EditError> {
        let mut log = Self::new();
        for op in operations {
            log.commit(op)?;
        }
        Ok(log)
    }

    /// Append an operation, replacing any existing one of a singleton kind.
    ///
    /// Invalid edits are rejected and leave the log untouched.
    pub fn commit(&mut self, op: Operation) -> Result<OperationId, EditError> {
        op.edit.validate()?;

        let kind = op.kind();
        if kind.is_singleton() {
            self.operations.retain(|existing| existing.kind() != kind);
        }

        let id = op.id;
        tracing::debug!(operation = %id, kind = %kind, "Operation committed");
        self.operations.push(op);
        self.touch();
        Ok(id)
    }

    /// Wrap `edit` in a new operation and commit it.
    pub fn commit_edit(&mut self, edit: Edit) -> Result<OperationId, EditError> {
        self.commit(Operation::new(edit))
    }

    /// Replace the edit of an existing operation, keeping its id and position.
    ///
    /// Returns `Ok(false)` when no operation has that id.
    pub fn update(&mut self, id: OperationId, edit: Edit) -> Result<bool, EditError> {
        edit.validate()?;

        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let kind = edit.kind();
        self.operations[index].edit = edit;
        if kind.is_singleton() {
            self.operations
                .retain(|existing| existing.id == id || existing.kind() != kind);
        }

        tracing::debug!(operation = %id, kind = %kind, "Operation updated");
        self.touch();
        Ok(true)
    }

    /// Remove the operation with `id`. Absent ids are a no-op.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&mut self, id: OperationId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let removed = self.operations.remove(index);
        tracing::debug!(operation = %id, kind = %removed.kind(), "Operation removed");
        self.touch();
        true
    }

    pub fn clear(&mut self) {
        if !self.operations.is_empty() {
            self.operations.clear();
            self.touch();
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, id: OperationId) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    pub fn contains(&self, id: OperationId) -> bool {
        self.position(id).is_some()
    }

    /// Operations of one kind, in commit order.
    pub fn of_kind(&self, kind: EditKind) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(move |op| op.kind() == kind)
    }

    /// Bounds of the committed trim, if any.
    pub fn trim(&self) -> Option<(f64, f64)> {
        self.operations.iter().find_map(|op| match op.edit {
            Edit::Trim { start, end } => Some((start, end)),
            _ => None,
        })
    }

    /// Committed speed multiplier, if any.
    pub fn speed(&self) -> Option<f64> {
        self.operations.iter().find_map(|op| match op.edit {
            Edit::Speed { multiplier } => Some(multiplier),
            _ => None,
        })
    }

    /// Duration of the output: the trimmed span (or the whole source) divided
    /// by the speed multiplier. Always derived from the current operations.
    pub fn effective_duration(&self, source_duration: f64) -> f64 {
        let base = match self.trim() {
            Some((start, end)) => end - start,
            None => source_duration,
        };
        match self.speed() {
            Some(multiplier) => base / multiplier,
            None => base,
        }
    }

    /// When the log last changed.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn position(&self, id: OperationId) -> Option<usize> {
        self.operations.iter().position(|op| op.id == id)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a OperationLog {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CropRatio, NormalizedRect};
    use crate::operation::{Rotation, StickerOverlay};
    use crate::source::MediaRef;

    fn kinds(log: &OperationLog) -> Vec<EditKind> {
        log.iter().map(Operation::kind).collect()
    }

    #[test]
    fn test_second_trim_replaces_first() {
        let mut log = OperationLog::new();
        log.commit_edit(Edit::Trim { start: 1.0, end: 8.0 }).unwrap();
        log.commit_edit(Edit::Rotate {
            degrees: Rotation::Deg90,
        })
        .unwrap();
        let second = log.commit_edit(Edit::Trim { start: 2.0, end: 6.0 }).unwrap();

        let trims: Vec<_> = log.of_kind(EditKind::Trim).collect();
        assert_eq!(trims.len(), 1);
        assert_eq!(trims[0].id, second);
        assert_eq!(log.trim(), Some((2.0, 6.0)));
        assert_eq!(kinds(&log), vec![EditKind::Rotate, EditKind::Trim]);
    }

    #[test]
    fn test_speed_is_singleton_and_others_accumulate() {
        let mut log = OperationLog::new();
        log.commit_edit(Edit::Speed { multiplier: 2.0 }).unwrap();
        log.commit_edit(Edit::Speed { multiplier: 0.5 }).unwrap();
        for _ in 0..3 {
            log.commit_edit(Edit::Rotate {
                degrees: Rotation::Deg90,
            })
            .unwrap();
        }
        assert_eq!(log.speed(), Some(0.5));
        assert_eq!(log.of_kind(EditKind::Speed).count(), 1);
        assert_eq!(log.of_kind(EditKind::Rotate).count(), 3);
    }

    #[test]
    fn test_invalid_commit_leaves_log_unchanged() {
        let mut log = OperationLog::new();
        log.commit_edit(Edit::Trim { start: 1.0, end: 8.0 }).unwrap();
        let before = log.clone();

        let err = log.commit_edit(Edit::Trim { start: 8.0, end: 3.0 });
        assert!(err.is_err());
        let err = log.commit_edit(Edit::crop(
            NormalizedRect::new(0.0, 0.0, 0.0, 0.5),
            CropRatio::Free,
        ));
        assert!(err.is_err());

        assert_eq!(log, before);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut log = OperationLog::new();
        let keep_a = log
            .commit_edit(Edit::Flip {
                horizontal: true,
                vertical: false,
            })
            .unwrap();
        let gone = log
            .commit_edit(Edit::Rotate {
                degrees: Rotation::Deg180,
            })
            .unwrap();
        let keep_b = log.commit_edit(Edit::Speed { multiplier: 1.5 }).unwrap();

        assert!(log.remove(gone));
        let after_first = log.clone();
        assert!(!log.remove(gone));
        assert_eq!(log, after_first);

        let ids: Vec<_> = log.iter().map(|op| op.id).collect();
        assert_eq!(ids, vec![keep_a, keep_b]);
    }

    #[test]
    fn test_effective_duration_with_trim_and_speed() {
        let mut log = OperationLog::new();
        assert!((log.effective_duration(20.0) - 20.0).abs() < 1e-9);

        log.commit_edit(Edit::Trim { start: 2.0, end: 10.0 }).unwrap();
        log.commit_edit(Edit::Speed { multiplier: 2.0 }).unwrap();
        assert!((log.effective_duration(20.0) - 4.0).abs() < 1e-6);

        let trim_id = log.of_kind(EditKind::Trim).next().unwrap().id;
        log.remove(trim_id);
        assert!((log.effective_duration(20.0) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_update_keeps_position_and_id() {
        let mut log = OperationLog::new();
        log.commit_edit(Edit::Speed { multiplier: 2.0 }).unwrap();
        let middle = log
            .commit_edit(Edit::Rotate {
                degrees: Rotation::Deg90,
            })
            .unwrap();
        log.commit_edit(Edit::Flip {
            horizontal: false,
            vertical: true,
        })
        .unwrap();

        let updated = log
            .update(
                middle,
                Edit::Rotate {
                    degrees: Rotation::Deg270,
                },
            )
            .unwrap();
        assert!(updated);
        assert_eq!(log.operations()[1].id, middle);
        assert_eq!(
            log.operations()[1].edit,
            Edit::Rotate {
                degrees: Rotation::Deg270
            }
        );

        // Turning it into a speed edit evicts the older speed.
        log.update(middle, Edit::Speed { multiplier: 3.0 }).unwrap();
        assert_eq!(log.of_kind(EditKind::Speed).count(), 1);
        assert_eq!(log.speed(), Some(3.0));
        assert_eq!(log.operations()[0].id, middle);
    }

    #[test]
    fn test_update_rejects_invalid_and_missing() {
        let mut log = OperationLog::new();
        let id = log.commit_edit(Edit::Trim { start: 0.0, end: 4.0 }).unwrap();
        assert!(log.update(id, Edit::Trim { start: 4.0, end: 1.0 }).is_err());
        assert_eq!(log.trim(), Some((0.0, 4.0)));
        assert!(!log
            .update(OperationId::new(), Edit::Speed { multiplier: 1.0 })
            .unwrap());
    }

    #[test]
    fn test_from_operations_reapplies_singleton_rule() {
        let recorded = vec![
            Operation::new(Edit::Trim { start: 0.0, end: 5.0 }),
            Operation::new(Edit::Sticker(StickerOverlay {
                image: MediaRef::new("asset://star.png"),
                x: 0.2,
                y: 0.3,
                scale: 1.0,
                rotation: 0.0,
                start_time: 0.0,
                end_time: 3.0,
            })),
            Operation::new(Edit::Trim { start: 1.0, end: 4.0 }),
        ];
        let log = OperationLog::from_operations(recorded).unwrap();
        assert_eq!(kinds(&log), vec![EditKind::Sticker, EditKind::Trim]);
    }

    #[test]
    fn test_deserialized_log_replays_singleton_rule() {
        let json = serde_json::json!({
            "operations": [
                { "id": uuid::Uuid::new_v4().to_string(), "type": "trim", "start": 1.0, "end": 5.0 },
                { "id": uuid::Uuid::new_v4().to_string(), "type": "rotate", "degrees": 90 },
                { "id": uuid::Uuid::new_v4().to_string(), "type": "trim", "start": 2.0, "end": 8.0 }
            ],
            "updated_at": "2026-01-02T03:04:05Z"
        });
        let log: OperationLog = serde_json::from_value(json).unwrap();

        assert_eq!(log.of_kind(EditKind::Trim).count(), 1);
        assert_eq!(log.trim(), Some((2.0, 8.0)));
        assert_eq!(kinds(&log), vec![EditKind::Rotate, EditKind::Trim]);
        assert_eq!(log.updated_at().to_rfc3339(), "2026-01-02T03:04:05+00:00");
    }

    #[test]
    fn test_deserialized_log_rejects_invalid_edit() {
        let json = serde_json::json!({
            "operations": [
                { "id": uuid::Uuid::new_v4().to_string(), "type": "trim", "start": 1.0, "end": 5.0 },
                {
                    "id": uuid::Uuid::new_v4().to_string(),
                    "type": "crop",
                    "x": 0.1, "y": 0.1, "width": 0.0, "height": 0.5,
                    "ratio": "free"
                }
            ]
        });
        assert!(serde_json::from_value::<OperationLog>(json).is_err());
    }

    #[test]
    fn test_serialized_log_round_trips_through_replay() {
        let mut log = OperationLog::new();
        log.commit_edit(Edit::Trim { start: 1.0, end: 4.0 }).unwrap();
        log.commit_edit(Edit::Speed { multiplier: 2.0 }).unwrap();

        let json = serde_json::to_string(&log).unwrap();
        let parsed: OperationLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, log);
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = OperationLog::new();
        log.commit_edit(Edit::Speed { multiplier: 2.0 }).unwrap();
        log.clear();
        assert!(log.is_empty());
    }
}
