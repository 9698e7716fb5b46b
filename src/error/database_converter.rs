use crate::error::{AppError, ConstraintParser};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Utility for converting database errors to structured AppError variants.
///
/// PostgreSQL splits a violation report into a primary message and a
/// `DETAIL` line; both are handed to [`ConstraintParser`] so the offending
/// key and value can be recovered.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    /// Primary message with the detail line appended, as psql prints it.
    fn full_message(info: &dyn DatabaseErrorInformation) -> String {
        match info.details() {
            Some(details) => format!("{}\nDETAIL: {}", info.message(), details),
            None => info.message().to_string(),
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let message = Self::full_message(info);
        let constraint_name = info.constraint_name();
        let table_name = info.table_name().map(str::to_string);

        let parsed = match kind {
            DatabaseErrorKind::UniqueViolation => {
                ConstraintParser::parse_unique_violation(&message, constraint_name).map(
                    |(entity, field, value)| AppError::Duplicate {
                        entity: table_name.unwrap_or(entity),
                        field,
                        value,
                    },
                )
            }
            DatabaseErrorKind::NotNullViolation => {
                ConstraintParser::parse_not_null_violation(&message).map(|(entity, field)| {
                    AppError::Validation {
                        field: info.column_name().map(str::to_string).unwrap_or(field),
                        reason: format!("Field is required for {}", table_name.unwrap_or(entity)),
                    }
                })
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                ConstraintParser::parse_foreign_key_violation(&message, constraint_name).map(
                    |fk| match (fk.referencing_table, fk.referenced_table) {
                        (Some(referenced_by), _) => AppError::StillReferenced {
                            entity: fk.table,
                            field: fk.field,
                            value: fk.value,
                            referenced_by,
                        },
                        (None, referenced) => AppError::InvalidReference {
                            entity: fk.table,
                            field: fk.field,
                            value: fk.value,
                            referenced: referenced.unwrap_or_else(|| "parent row".to_string()),
                        },
                    },
                )
            }
            DatabaseErrorKind::CheckViolation => {
                ConstraintParser::parse_check_violation(&message, constraint_name).map(
                    |(entity, field)| AppError::Validation {
                        field,
                        reason: format!("Check constraint failed for {}", entity),
                    },
                )
            }
            _ => None,
        };

        parsed.unwrap_or_else(|| AppError::Database {
            operation: operation.to_string(),
            source: anyhow::Error::msg(format!("{:?}: {}", kind, message)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    // Mirrors what libpq reports: primary message and detail kept apart.
    #[derive(Default)]
    struct MockDatabaseErrorInfo {
        message: String,
        details: Option<String>,
        table_name: Option<String>,
        constraint_name: Option<String>,
    }

    impl diesel::result::DatabaseErrorInformation for MockDatabaseErrorInfo {
        fn message(&self) -> &str {
            &self.message
        }

        fn details(&self) -> Option<&str> {
            self.details.as_deref()
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            self.table_name.as_deref()
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint_name.as_deref()
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn convert(kind: DatabaseErrorKind, info: MockDatabaseErrorInfo) -> AppError {
        DatabaseErrorConverter::convert_diesel_error(
            DieselError::DatabaseError(kind, Box::new(info)),
            "test operation",
        )
    }

    #[test]
    fn test_convert_not_found_error() {
        let result = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "find run");
        assert!(matches!(result, AppError::NotFound { .. }));
    }

    #[test]
    fn test_convert_duplicate_mapping() {
        let result = convert(
            DatabaseErrorKind::UniqueViolation,
            MockDatabaseErrorInfo {
                message: "duplicate key value violates unique constraint \"calendar_events_timetable_run_id_event_key_key\"".to_string(),
                details: Some("Key (timetable_run_id, event_key)=(3, ptm-event-Gym-2025-09-15T12:00:00) already exists.".to_string()),
                table_name: Some("calendar_events".to_string()),
                constraint_name: Some("calendar_events_timetable_run_id_event_key_key".to_string()),
            },
        );

        match result {
            AppError::Duplicate {
                entity,
                field,
                value,
            } => {
                assert_eq!(entity, "calendar_events");
                assert_eq!(field, "timetable_run_id, event_key");
                assert_eq!(value, "3, ptm-event-Gym-2025-09-15T12:00:00");
            }
            _ => panic!("Expected Duplicate error, got: {:?}", result),
        }
    }

    #[test]
    fn test_convert_unique_violation_without_detail_falls_back() {
        let result = convert(
            DatabaseErrorKind::UniqueViolation,
            MockDatabaseErrorInfo {
                message: "duplicate key value violates unique constraint \"timetable_runs_pkey\""
                    .to_string(),
                ..Default::default()
            },
        );
        assert!(matches!(result, AppError::Database { .. }));
    }

    #[test]
    fn test_convert_not_null_violation() {
        let result = convert(
            DatabaseErrorKind::NotNullViolation,
            MockDatabaseErrorInfo {
                message: "null value in column \"input_version_hash\" of relation \"timetable_runs\" violates not-null constraint".to_string(),
                ..Default::default()
            },
        );

        match result {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "input_version_hash");
                assert!(reason.contains("timetable_runs"));
            }
            _ => panic!("Expected Validation error, got: {:?}", result),
        }
    }

    #[test]
    fn test_convert_mapping_to_missing_run() {
        let result = convert(
            DatabaseErrorKind::ForeignKeyViolation,
            MockDatabaseErrorInfo {
                message: "insert or update on table \"calendar_events\" violates foreign key constraint \"calendar_events_timetable_run_id_fkey\"".to_string(),
                details: Some("Key (timetable_run_id)=(999) is not present in table \"timetable_runs\".".to_string()),
                table_name: Some("calendar_events".to_string()),
                constraint_name: Some("calendar_events_timetable_run_id_fkey".to_string()),
            },
        );

        match result {
            AppError::InvalidReference {
                entity,
                field,
                value,
                referenced,
            } => {
                assert_eq!(entity, "calendar_events");
                assert_eq!(field, "timetable_run_id");
                assert_eq!(value, "999");
                assert_eq!(referenced, "timetable_runs");
            }
            _ => panic!("Expected InvalidReference error, got: {:?}", result),
        }
    }

    #[test]
    fn test_convert_delete_of_mapped_run() {
        let result = convert(
            DatabaseErrorKind::ForeignKeyViolation,
            MockDatabaseErrorInfo {
                message: "update or delete on table \"timetable_runs\" violates foreign key constraint \"calendar_events_timetable_run_id_fkey\" on table \"calendar_events\"".to_string(),
                details: Some("Key (id)=(5) is still referenced from table \"calendar_events\".".to_string()),
                table_name: Some("calendar_events".to_string()),
                constraint_name: Some("calendar_events_timetable_run_id_fkey".to_string()),
            },
        );

        match result {
            AppError::StillReferenced {
                entity,
                value,
                referenced_by,
                ..
            } => {
                assert_eq!(entity, "timetable_runs");
                assert_eq!(value, "5");
                assert_eq!(referenced_by, "calendar_events");
            }
            _ => panic!("Expected StillReferenced error, got: {:?}", result),
        }
    }

    #[test]
    fn test_convert_check_violation() {
        let result = convert(
            DatabaseErrorKind::CheckViolation,
            MockDatabaseErrorInfo {
                message: "new row for relation \"timetable_runs\" violates check constraint \"timetable_runs_status_check\"".to_string(),
                constraint_name: Some("timetable_runs_status_check".to_string()),
                ..Default::default()
            },
        );

        match result {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "status");
                assert!(reason.contains("Check constraint failed"));
            }
            _ => panic!("Expected Validation error, got: {:?}", result),
        }
    }

    #[test]
    fn test_unclassified_error_keeps_operation() {
        let result = convert(
            DatabaseErrorKind::SerializationFailure,
            MockDatabaseErrorInfo {
                message: "could not serialize access".to_string(),
                ..Default::default()
            },
        );

        match result {
            AppError::Database { operation, source } => {
                assert_eq!(operation, "test operation");
                assert!(source.to_string().contains("could not serialize access"));
            }
            _ => panic!("Expected Database error, got: {:?}", result),
        }
    }
}
