//! Edit history ledger.

use chrono::{DateTime, Utc};
use record_types::{Actor, HistoryEntry, Record, RecordChanges};

fn non_empty(v: &Option<String>) -> Option<&String> {
    v.as_ref().filter(|s| !s.is_empty())
}

/// Append a snapshot of the current content, then apply `changes`.
///
/// Text fields are overwritten only when `changes` supplies a non-empty value;
/// `tags` is overwritten whenever supplied, so `[]` clears it. The snapshot is
/// appended even when nothing changes.
pub fn record_edit(record: &mut Record, actor: &Actor, changes: &RecordChanges, at: DateTime<Utc>) {
    record.history.push(HistoryEntry {
        content: record.content.clone(),
        edited_at: at,
        edited_by: actor.id.clone(),
    });

    if let Some(title) = non_empty(&changes.title) {
        record.title = title.clone();
    }
    if let Some(content) = non_empty(&changes.content) {
        record.content = content.clone();
    }
    if let Some(tags) = &changes.tags {
        record.tags = tags.clone();
    }
    if let Some(regulation) = non_empty(&changes.regulation) {
        record.regulation = Some(regulation.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record::new(
            "r1".to_string(),
            "Policy X".to_string(),
            "v1".to_string(),
            Some("iso".to_string()),
            vec!["daily".to_string()],
            "author".to_string(),
        )
    }

    #[test]
    fn snapshot_holds_pre_edit_content() {
        let mut r = record();
        let editor = Actor::new("editor", "");
        let at = Utc::now();
        record_edit(&mut r, &editor, &RecordChanges::content("v2"), at);

        assert_eq!(r.content, "v2");
        assert_eq!(r.history.len(), 1);
        assert_eq!(r.history[0].content, "v1");
        assert_eq!(r.history[0].edited_by, "editor");
        assert_eq!(r.history[0].edited_at, at);
    }

    #[test]
    fn empty_changes_still_append_history() {
        let mut r = record();
        let before = r.clone();
        record_edit(&mut r, &Actor::new("u", ""), &RecordChanges::default(), Utc::now());

        assert_eq!(r.history.len(), 1);
        assert_eq!(r.title, before.title);
        assert_eq!(r.content, before.content);
        assert_eq!(r.tags, before.tags);
        assert_eq!(r.regulation, before.regulation);
    }

    #[test]
    fn empty_strings_keep_prior_fields() {
        let mut r = record();
        let changes = RecordChanges {
            title: Some(String::new()),
            content: Some(String::new()),
            regulation: Some(String::new()),
            tags: None,
        };
        record_edit(&mut r, &Actor::new("u", ""), &changes, Utc::now());

        assert_eq!(r.title, "Policy X");
        assert_eq!(r.content, "v1");
        assert_eq!(r.regulation.as_deref(), Some("iso"));
        assert_eq!(r.tags, vec!["daily".to_string()]);
    }

    #[test]
    fn empty_tag_list_clears_tags() {
        let mut r = record();
        let changes = RecordChanges {
            tags: Some(vec![]),
            ..RecordChanges::default()
        };
        record_edit(&mut r, &Actor::new("u", ""), &changes, Utc::now());

        assert!(r.tags.is_empty());
        assert_eq!(r.content, "v1");
        assert_eq!(r.history.len(), 1);
    }

    #[test]
    fn history_is_append_only_oldest_first() {
        let mut r = record();
        let u = Actor::new("u", "");
        for v in ["v2", "v3", "v4"] {
            record_edit(&mut r, &u, &RecordChanges::content(v), Utc::now());
        }
        let snapshots: Vec<&str> = r.history.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(snapshots, vec!["v1", "v2", "v3"]);
        assert_eq!(r.content, "v4");
    }

    #[test]
    fn applies_all_supplied_fields() {
        let mut r = record();
        let changes = RecordChanges {
            title: Some("Policy Y".to_string()),
            content: None,
            regulation: Some("gdpr".to_string()),
            tags: Some(vec!["weekly".to_string(), "monthly".to_string()]),
        };
        record_edit(&mut r, &Actor::new("u", ""), &changes, Utc::now());

        assert_eq!(r.title, "Policy Y");
        assert_eq!(r.content, "v1");
        assert_eq!(r.regulation.as_deref(), Some("gdpr"));
        assert_eq!(r.tags, vec!["weekly".to_string(), "monthly".to_string()]);
        assert_eq!(r.history[0].content, "v1");
    }
}
