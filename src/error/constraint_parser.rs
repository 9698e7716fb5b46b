use std::sync::OnceLock;

use regex::Regex;

/// Utility for parsing PostgreSQL constraint violation messages.
///
/// Works on the primary message with the `DETAIL` line appended, which is
/// where PostgreSQL reports the offending key and value. Patterns are
/// compiled once and cached.
pub struct ConstraintParser;

/// Suffixes PostgreSQL appends to generated constraint names
const CONSTRAINT_SUFFIXES: &[&str] = &["_key", "_fkey", "_pkey", "_check", "_idx"];

/// Fallback entity when no table can be recovered
const UNKNOWN_ENTITY: &str = "resource";

/// A parsed foreign key violation.
///
/// Raised in two directions: inserting a row that points at a missing parent
/// (`referenced_table` is set), or deleting a parent that children still
/// point at (`referencing_table` is set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyViolation {
    /// Table the failing statement wrote to
    pub table: String,
    /// Column list from the `Key (...)` detail
    pub field: String,
    /// Value list from the `Key (...)=(...)` detail
    pub value: String,
    pub referenced_table: Option<String>,
    pub referencing_table: Option<String>,
}

struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    relation_name: Regex,
    on_table: Regex,
    not_present_in: Regex,
    still_referenced_from: Regex,
    constraint_name: Regex,
}

impl RegexPatterns {
    fn new() -> Self {
        // Literal patterns; compilation cannot fail.
        Self {
            key_value: Regex::new(r"Key \(([^)]+)\)=\((.*)\)").unwrap(),
            column_name: Regex::new(r#"column "([^"]+)""#).unwrap(),
            relation_name: Regex::new(r#"relation "([^"]+)""#).unwrap(),
            on_table: Regex::new(r#"on table "([^"]+)""#).unwrap(),
            not_present_in: Regex::new(r#"is not present in table "([^"]+)""#).unwrap(),
            still_referenced_from: Regex::new(r#"is still referenced from table "([^"]+)""#)
                .unwrap(),
            constraint_name: Regex::new(r#"constraint "([^"]+)""#).unwrap(),
        }
    }
}

static REGEX_PATTERNS: OnceLock<RegexPatterns> = OnceLock::new();

impl ConstraintParser {
    fn patterns() -> &'static RegexPatterns {
        REGEX_PATTERNS.get_or_init(RegexPatterns::new)
    }

    fn capture(re: &Regex, message: &str) -> Option<String> {
        re.captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Parses a unique constraint violation into `(entity, field, value)`.
    ///
    /// Composite keys keep PostgreSQL's formatting, e.g. field
    /// `timetable_run_id, event_key` with value `7, ptm-tuition-1`.
    ///
    /// # Examples
    /// ```
    /// use timetable_ledger::error::ConstraintParser;
    ///
    /// let message = "duplicate key value violates unique constraint \"calendar_events_timetable_run_id_event_key_key\"\nDETAIL: Key (timetable_run_id, event_key)=(7, ptm-tuition-1) already exists.";
    /// let result = ConstraintParser::parse_unique_violation(message, None);
    /// assert_eq!(result, Some((
    ///     "calendar_events".to_string(),
    ///     "timetable_run_id, event_key".to_string(),
    ///     "7, ptm-tuition-1".to_string(),
    /// )));
    /// ```
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let (field, value) = Self::extract_key_value_from_message(message)?;
        let entity = Self::resolve_constraint(message, constraint_name)
            .and_then(|constraint| Self::table_from_constraint(&constraint, &field))
            .or_else(|| Self::extract_relation_from_message(message))
            .unwrap_or_else(|| UNKNOWN_ENTITY.to_string());
        Some((entity, field, value))
    }

    /// Parses a not null constraint violation into `(entity, field)`.
    pub fn parse_not_null_violation(message: &str) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_relation_from_message(message)
            .unwrap_or_else(|| UNKNOWN_ENTITY.to_string());
        Some((entity, field))
    }

    /// Parses a foreign key constraint violation.
    ///
    /// # Examples
    /// ```
    /// use timetable_ledger::error::ConstraintParser;
    ///
    /// let message = "insert or update on table \"calendar_events\" violates foreign key constraint \"calendar_events_timetable_run_id_fkey\"\nDETAIL: Key (timetable_run_id)=(999) is not present in table \"timetable_runs\".";
    /// let fk = ConstraintParser::parse_foreign_key_violation(message, None).unwrap();
    /// assert_eq!(fk.table, "calendar_events");
    /// assert_eq!(fk.field, "timetable_run_id");
    /// assert_eq!(fk.value, "999");
    /// assert_eq!(fk.referenced_table.as_deref(), Some("timetable_runs"));
    /// ```
    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<ForeignKeyViolation> {
        let patterns = Self::patterns();
        let (field, value) = Self::extract_key_value_from_message(message)?;
        let table = Self::capture(&patterns.on_table, message)
            .or_else(|| {
                Self::resolve_constraint(message, constraint_name)
                    .and_then(|constraint| Self::table_from_constraint(&constraint, &field))
            })
            .unwrap_or_else(|| UNKNOWN_ENTITY.to_string());

        Some(ForeignKeyViolation {
            table,
            field,
            value,
            referenced_table: Self::capture(&patterns.not_present_in, message),
            referencing_table: Self::capture(&patterns.still_referenced_from, message),
        })
    }

    /// Parses a check constraint violation into `(entity, field)`.
    ///
    /// The field is recovered from a `{table}_{column}_check` constraint name.
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let entity = Self::extract_relation_from_message(message)?;
        let field = Self::resolve_constraint(message, constraint_name)
            .and_then(|constraint| {
                constraint
                    .strip_prefix(&format!("{}_", entity))
                    .and_then(|rest| rest.strip_suffix("_check"))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "value".to_string());
        Some((entity, field))
    }

    /// Recovers the table name from a generated constraint name.
    ///
    /// PostgreSQL names constraints `{table}_{col1}_{col2}_{suffix}`, and
    /// table names may themselves contain underscores, so the column list is
    /// needed to find the split point: `calendar_events_timetable_run_id_fkey`
    /// with columns `timetable_run_id` yields `calendar_events`.
    pub fn table_from_constraint(constraint_name: &str, columns: &str) -> Option<String> {
        let joined = columns
            .split(',')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("_");

        CONSTRAINT_SUFFIXES.iter().find_map(|suffix| {
            constraint_name
                .strip_suffix(suffix)
                .and_then(|stem| stem.strip_suffix(joined.as_str()))
                .and_then(|stem| stem.strip_suffix('_'))
                .filter(|table| !table.is_empty())
                .map(str::to_string)
        })
    }

    fn resolve_constraint(message: &str, constraint_name: Option<&str>) -> Option<String> {
        constraint_name
            .map(str::to_string)
            .or_else(|| Self::capture(&Self::patterns().constraint_name, message))
    }

    /// Extracts a column name (`column "x"`) from a message.
    pub fn extract_column_from_message(message: &str) -> Option<String> {
        Self::capture(&Self::patterns().column_name, message)
    }

    /// Extracts a relation name (`relation "x"`) from a message.
    pub fn extract_relation_from_message(message: &str) -> Option<String> {
        Self::capture(&Self::patterns().relation_name, message)
    }

    /// Extracts `(field, value)` from a `Key (field)=(value)` detail line.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        let caps = Self::patterns().key_value.captures(message)?;
        let field = caps.get(1)?.as_str().to_string();
        let value = caps.get(2)?.as_str().to_string();
        Some((field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUPLICATE_MAPPING: &str = "duplicate key value violates unique constraint \"calendar_events_timetable_run_id_event_key_key\"\nDETAIL: Key (timetable_run_id, event_key)=(7, ptm-tuition-1) already exists.";

    const MISSING_RUN: &str = "insert or update on table \"calendar_events\" violates foreign key constraint \"calendar_events_timetable_run_id_fkey\"\nDETAIL: Key (timetable_run_id)=(999) is not present in table \"timetable_runs\".";

    const RUN_STILL_MAPPED: &str = "update or delete on table \"timetable_runs\" violates foreign key constraint \"calendar_events_timetable_run_id_fkey\" on table \"calendar_events\"\nDETAIL: Key (id)=(5) is still referenced from table \"calendar_events\".";

    #[test]
    fn test_parse_unique_violation_composite_key() {
        let result = ConstraintParser::parse_unique_violation(
            DUPLICATE_MAPPING,
            Some("calendar_events_timetable_run_id_event_key_key"),
        );
        assert_eq!(
            result,
            Some((
                "calendar_events".to_string(),
                "timetable_run_id, event_key".to_string(),
                "7, ptm-tuition-1".to_string()
            ))
        );
    }

    #[test]
    fn test_parse_unique_violation_reads_constraint_from_message() {
        let result = ConstraintParser::parse_unique_violation(DUPLICATE_MAPPING, None);
        assert_eq!(result.map(|(entity, _, _)| entity), Some("calendar_events".to_string()));
    }

    #[test]
    fn test_parse_unique_violation_without_detail() {
        let message = "duplicate key value violates unique constraint \"timetable_runs_pkey\"";
        assert_eq!(ConstraintParser::parse_unique_violation(message, None), None);
    }

    #[test]
    fn test_parse_not_null_violation() {
        let message = "null value in column \"status\" of relation \"timetable_runs\" violates not-null constraint";
        let result = ConstraintParser::parse_not_null_violation(message);
        assert_eq!(
            result,
            Some(("timetable_runs".to_string(), "status".to_string()))
        );
    }

    #[test]
    fn test_parse_not_null_violation_without_relation() {
        let message = "null value in column \"event_key\" violates not-null constraint";
        let result = ConstraintParser::parse_not_null_violation(message);
        assert_eq!(result, Some(("resource".to_string(), "event_key".to_string())));
    }

    #[test]
    fn test_parse_foreign_key_violation_missing_parent() {
        let fk = ConstraintParser::parse_foreign_key_violation(
            MISSING_RUN,
            Some("calendar_events_timetable_run_id_fkey"),
        )
        .unwrap();
        assert_eq!(fk.table, "calendar_events");
        assert_eq!(fk.field, "timetable_run_id");
        assert_eq!(fk.value, "999");
        assert_eq!(fk.referenced_table.as_deref(), Some("timetable_runs"));
        assert_eq!(fk.referencing_table, None);
    }

    #[test]
    fn test_parse_foreign_key_violation_parent_still_referenced() {
        let fk = ConstraintParser::parse_foreign_key_violation(RUN_STILL_MAPPED, None).unwrap();
        assert_eq!(fk.table, "timetable_runs");
        assert_eq!(fk.field, "id");
        assert_eq!(fk.value, "5");
        assert_eq!(fk.referenced_table, None);
        assert_eq!(fk.referencing_table.as_deref(), Some("calendar_events"));
    }

    #[test]
    fn test_parse_check_violation() {
        let message = "new row for relation \"timetable_runs\" violates check constraint \"timetable_runs_status_check\"";
        let result = ConstraintParser::parse_check_violation(message, None);
        assert_eq!(
            result,
            Some(("timetable_runs".to_string(), "status".to_string()))
        );
    }

    #[test]
    fn test_table_from_constraint() {
        assert_eq!(
            ConstraintParser::table_from_constraint(
                "calendar_events_timetable_run_id_fkey",
                "timetable_run_id"
            ),
            Some("calendar_events".to_string())
        );
        assert_eq!(
            ConstraintParser::table_from_constraint(
                "calendar_events_timetable_run_id_event_key_key",
                "timetable_run_id, event_key"
            ),
            Some("calendar_events".to_string())
        );
        assert_eq!(
            ConstraintParser::table_from_constraint("timetable_runs_pkey", "id"),
            None
        );
        assert_eq!(
            ConstraintParser::table_from_constraint("timetable_runs_id_pkey", "id"),
            Some("timetable_runs".to_string())
        );
    }

    #[test]
    fn test_extract_key_value_keeps_commas_in_value() {
        let result = ConstraintParser::extract_key_value_from_message(DUPLICATE_MAPPING);
        assert_eq!(
            result,
            Some((
                "timetable_run_id, event_key".to_string(),
                "7, ptm-tuition-1".to_string()
            ))
        );
    }

    #[test]
    fn test_regex_patterns_caching() {
        let patterns1 = ConstraintParser::patterns();
        let patterns2 = ConstraintParser::patterns();
        assert!(std::ptr::eq(patterns1, patterns2));
    }

    #[test]
    fn test_graceful_parsing_failures() {
        let message = "completely unrelated error message";
        assert_eq!(ConstraintParser::parse_unique_violation(message, None), None);
        assert_eq!(ConstraintParser::parse_not_null_violation(message), None);
        assert_eq!(ConstraintParser::parse_foreign_key_violation(message, None), None);
        assert_eq!(ConstraintParser::parse_check_violation(message, None), None);
    }
}
