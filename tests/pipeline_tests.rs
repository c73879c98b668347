//! End-to-end tests for the generate run and script loading

mod common;

use apache_avro::types::Value;
use avro_to_postgres::config::Config;
use avro_to_postgres::convert::OnError;
use avro_to_postgres::pipeline::{GenerateOptions, PipelineError, generate};
use avro_to_postgres::validation::ConsistencyError;
use common::*;
use std::path::Path;
use tempfile::TempDir;

fn options(workspace: &Path) -> GenerateOptions {
    GenerateOptions::from_config(&Config::default(), workspace).unwrap()
}

const NOV_01_MICROS: i64 = 1_698_796_800_000_000;

mod generate_tests {
    use super::*;

    fn seed(avro_home: &Path) {
        write_avro(
            &daily_file(avro_home, "20231031"),
            EVENTS_SCHEMA,
            vec![event("20231031", NOV_01_MICROS - 1_000_000, "session_start", vec![])],
        );
        write_avro(
            &daily_file(avro_home, "20231101"),
            EVENTS_SCHEMA,
            vec![
                event(
                    "20231101",
                    NOV_01_MICROS,
                    "page_view",
                    vec![
                        param("page_title", Some("Home"), None),
                        param("engagement_time_msec", None, Some(42)),
                    ],
                ),
                event("20231101", NOV_01_MICROS + 1, "scroll", vec![]),
            ],
        );
        write_avro(
            &daily_file(avro_home, "20231102"),
            EVENTS_SCHEMA,
            vec![event("20231102", NOV_01_MICROS + 86_400_000_000, "it's", vec![])],
        );
    }

    #[test]
    fn test_generate_writes_ddl_and_mirrored_insert_scripts() {
        let dir = TempDir::new().unwrap();
        seed(&dir.path().join("avro"));

        let report = generate(&options(dir.path())).unwrap();

        let sql_home = dir.path().join("sql");
        assert_eq!(
            list_files(&sql_home),
            vec![
                "202310/events_20231031.sql",
                "202311/events_20231101.sql",
                "202311/events_20231102.sql",
                "events_20231102_ddl.sql",
            ]
        );
        assert_eq!(
            report.ddl_path.as_deref(),
            Some(sql_home.join("events_20231102_ddl.sql").as_path())
        );
        let rows: Vec<_> = report
            .files
            .iter()
            .map(|f| (f.table_name.as_str(), f.rows))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("events_20231102", 1),
                ("events_20231101", 2),
                ("events_20231031", 1)
            ]
        );
        assert_eq!(report.total_rows(), 4);
        assert!(report.schema_fingerprint.is_some());
    }

    #[test]
    fn test_ddl_script_content() {
        let dir = TempDir::new().unwrap();
        seed(&dir.path().join("avro"));
        generate(&options(dir.path())).unwrap();

        let ddl =
            std::fs::read_to_string(dir.path().join("sql/events_20231102_ddl.sql")).unwrap();
        let expected = "BEGIN;
CREATE TYPE events_type_2 AS (
    string_value VARCHAR
  , int_value BIGINT
);
CREATE TYPE events_type_1 AS (
    key VARCHAR
  , value events_type_2
);
CREATE TABLE events (
    event_date VARCHAR
  , event_timestamp BIGINT
  , eventtimestamp TIMESTAMP WITH TIME ZONE DEFAULT NULL
  , event_name VARCHAR
  , event_params events_type_1[] NOT NULL
  , user_pseudo_id VARCHAR
) PARTITION BY RANGE (event_date);
CREATE TABLE events_20231031
    PARTITION OF events
    FOR VALUES FROM ('20231031') TO ('20231101');
CREATE TABLE events_20231101
    PARTITION OF events
    FOR VALUES FROM ('20231101') TO ('20231102');
CREATE TABLE events_20231102
    PARTITION OF events
    FOR VALUES FROM ('20231102') TO ('20231103');
COMMIT;
";
        assert_eq!(ddl, expected);
    }

    #[test]
    fn test_insert_script_content() {
        let dir = TempDir::new().unwrap();
        seed(&dir.path().join("avro"));
        generate(&options(dir.path())).unwrap();

        let sql =
            std::fs::read_to_string(dir.path().join("sql/202311/events_20231101.sql")).unwrap();
        let first = "INSERT INTO events_20231101 (
    event_date
  , event_timestamp
  , eventtimestamp
  , event_name
  , event_params
  , user_pseudo_id
)
VALUES (
    '20231101'
  , 1698796800000000
  , '2023-11-01T00:00:00+00:00'
  , 'page_view'
  , ARRAY[ROW('page_title',ROW('Home',NULL)),ROW('engagement_time_msec',ROW(NULL,42))]::events_type_1[]
  , '1234.5678'
);
";
        assert!(sql.starts_with(&format!("BEGIN;\n{}", first)), "{}", sql);
        assert!(sql.contains("  , '2023-11-01T00:00:00.000001+00:00'\n"));
        assert!(sql.contains("  , ARRAY[]::events_type_1[]\n"));
        assert!(sql.ends_with(");\nCOMMIT;\n"));

        let quoted =
            std::fs::read_to_string(dir.path().join("sql/202311/events_20231102.sql")).unwrap();
        assert!(quoted.contains("  , 'it''s'\n"));
    }

    #[test]
    fn test_commit_every_batches_rows() {
        let dir = TempDir::new().unwrap();
        let records = (0..7)
            .map(|i| event("20231101", NOV_01_MICROS + i, "tick", vec![]))
            .collect();
        write_avro(
            &daily_file(&dir.path().join("avro"), "20231101"),
            EVENTS_SCHEMA,
            records,
        );

        let mut opts = options(dir.path());
        opts.commit_every = 3;
        generate(&opts).unwrap();

        let sql =
            std::fs::read_to_string(dir.path().join("sql/202311/events_20231101.sql")).unwrap();
        assert_eq!(sql.matches("INSERT INTO").count(), 7);
        assert_eq!(sql.matches("COMMIT;\nBEGIN;\n").count(), 2);
        assert_eq!(sql.matches("COMMIT;\n").count(), 3);
    }

    #[test]
    fn test_rerun_overwrites_previous_output() {
        let dir = TempDir::new().unwrap();
        seed(&dir.path().join("avro"));
        generate(&options(dir.path())).unwrap();
        let first = std::fs::read_to_string(dir.path().join("sql/events_20231102_ddl.sql")).unwrap();

        generate(&options(dir.path())).unwrap();
        let second =
            std::fs::read_to_string(dir.path().join("sql/events_20231102_ddl.sql")).unwrap();
        assert_eq!(first, second);
        assert_eq!(list_files(&dir.path().join("sql")).len(), 4);
    }

    #[test]
    fn test_new_day_replaces_previous_ddl_script() {
        let dir = TempDir::new().unwrap();
        let avro_home = dir.path().join("avro");
        write_avro(
            &daily_file(&avro_home, "20231101"),
            EVENTS_SCHEMA,
            vec![event("20231101", NOV_01_MICROS, "page_view", vec![])],
        );
        generate(&options(dir.path())).unwrap();

        write_avro(
            &daily_file(&avro_home, "20231102"),
            EVENTS_SCHEMA,
            vec![event("20231102", NOV_01_MICROS + 86_400_000_000, "scroll", vec![])],
        );
        let report = generate(&options(dir.path())).unwrap();

        let sql_home = dir.path().join("sql");
        assert_eq!(
            list_files(&sql_home),
            vec![
                "202311/events_20231101.sql",
                "202311/events_20231102.sql",
                "events_20231102_ddl.sql",
            ]
        );
        assert_eq!(
            report.ddl_path.as_deref(),
            Some(sql_home.join("events_20231102_ddl.sql").as_path())
        );
        let ddl = std::fs::read_to_string(sql_home.join("events_20231102_ddl.sql")).unwrap();
        assert!(ddl.contains("CREATE TABLE events_20231101\n    PARTITION OF events"));
        assert!(ddl.contains("CREATE TABLE events_20231102\n    PARTITION OF events"));
    }
}

mod failure_tests {
    use super::*;

    const WIDER_SCHEMA: &str = r#"{
        "type": "record",
        "name": "Root",
        "fields": [
            {"name": "event_date", "type": ["null", "string"]},
            {"name": "event_timestamp", "type": ["null", "long"]},
            {"name": "event_name", "type": ["null", "string"]},
            {"name": "event_params", "type": {"type": "array", "items": {
                "type": "record",
                "name": "event_params",
                "fields": [
                    {"name": "key", "type": ["null", "string"]},
                    {"name": "value", "type": ["null", {
                        "type": "record",
                        "name": "value",
                        "fields": [
                            {"name": "string_value", "type": ["null", "string"]},
                            {"name": "int_value", "type": ["null", "long"]}
                        ]
                    }]}
                ]
            }}},
            {"name": "user_pseudo_id", "type": ["null", "string"]},
            {"name": "user_id", "type": ["null", "string"]}
        ]
    }"#;

    #[test]
    fn test_schema_mismatch_aborts_without_output() {
        let dir = TempDir::new().unwrap();
        let avro_home = dir.path().join("avro");
        write_avro(
            &daily_file(&avro_home, "20231102"),
            EVENTS_SCHEMA,
            vec![event("20231102", NOV_01_MICROS, "page_view", vec![])],
        );
        let mut wider = event("20231101", NOV_01_MICROS, "page_view", vec![]);
        if let Value::Record(fields) = &mut wider {
            fields.push(("user_id".to_string(), none()));
        }
        write_avro(&daily_file(&avro_home, "20231101"), WIDER_SCHEMA, vec![wider]);

        let err = generate(&options(dir.path())).unwrap_err();
        match err {
            PipelineError::Consistency(ConsistencyError::SchemaMismatch {
                file,
                canonical_file,
                detail,
            }) => {
                assert!(file.ends_with("202311/events_20231101.avro"));
                assert!(canonical_file.ends_with("202311/events_20231102.avro"));
                assert_eq!(detail, "7 columns, expected 6");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(list_files(&dir.path().join("sql")).is_empty());
    }

    #[test]
    fn test_invalid_partition_date_aborts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("avro/202311/events_intraday.avro");
        write_avro(&path, EVENTS_SCHEMA, vec![]);

        let err = generate(&options(dir.path())).unwrap_err();
        assert!(err.to_string().contains("events_intraday"), "{}", err);
        assert!(list_files(&dir.path().join("sql")).is_empty());
    }

    const TIMESTAMP_SCHEMA: &str = r#"{
        "type": "record",
        "name": "Root",
        "fields": [
            {"name": "event_date", "type": "string"},
            {"name": "created", "type": {"type": "long", "logicalType": "timestamp-micros"}}
        ]
    }"#;

    fn seed_out_of_range(avro_home: &Path) {
        write_avro(
            &daily_file(avro_home, "20231102"),
            TIMESTAMP_SCHEMA,
            vec![Value::Record(vec![
                ("event_date".to_string(), Value::String("20231102".to_string())),
                ("created".to_string(), Value::TimestampMicros(NOV_01_MICROS)),
            ])],
        );
        write_avro(
            &daily_file(avro_home, "20231101"),
            TIMESTAMP_SCHEMA,
            vec![Value::Record(vec![
                ("event_date".to_string(), Value::String("20231101".to_string())),
                ("created".to_string(), Value::TimestampMicros(i64::MAX)),
            ])],
        );
    }

    #[test]
    fn test_conversion_error_leaves_no_scripts() {
        let dir = TempDir::new().unwrap();
        seed_out_of_range(&dir.path().join("avro"));

        let err = generate(&options(dir.path())).unwrap_err();
        assert!(matches!(err, PipelineError::Export(_)), "{}", err);
        assert!(err.to_string().contains("timestamp-micros"), "{}", err);
        assert!(list_files(&dir.path().join("sql")).is_empty());
    }

    #[test]
    fn test_null_on_error_substitutes_null() {
        let dir = TempDir::new().unwrap();
        seed_out_of_range(&dir.path().join("avro"));

        let mut opts = options(dir.path());
        opts.on_error = OnError::NullOnError;
        let report = generate(&opts).unwrap();
        assert_eq!(report.total_rows(), 2);

        let sql =
            std::fs::read_to_string(dir.path().join("sql/202311/events_20231101.sql")).unwrap();
        assert!(sql.contains("VALUES (\n    '20231101'\n  , NULL\n);"), "{}", sql);
        let good =
            std::fs::read_to_string(dir.path().join("sql/202311/events_20231102.sql")).unwrap();
        assert!(good.contains("  , '2023-11-01T00:00:00+00:00'\n"), "{}", good);
    }
}

mod load_tests {
    use super::*;
    use async_trait::async_trait;
    use avro_to_postgres::database::{DatabaseResult, SqlExecutor, load_scripts};

    #[derive(Default)]
    struct RecordingExecutor {
        scripts: Vec<String>,
    }

    #[async_trait]
    impl SqlExecutor for RecordingExecutor {
        async fn execute_script(&mut self, sql: &str) -> DatabaseResult<()> {
            self.scripts.push(sql.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_generated_scripts_load_ddl_first() {
        let dir = TempDir::new().unwrap();
        let avro_home = dir.path().join("avro");
        for date in ["20231101", "20231102"] {
            write_avro(
                &daily_file(&avro_home, date),
                EVENTS_SCHEMA,
                vec![event(date, NOV_01_MICROS, "page_view", vec![])],
            );
        }
        generate(&options(dir.path())).unwrap();

        let mut executor = RecordingExecutor::default();
        let report = load_scripts(&mut executor, &dir.path().join("sql"))
            .await
            .unwrap();

        assert_eq!(report.insert_scripts.len(), 2);
        assert_eq!(executor.scripts.len(), 3);
        assert!(executor.scripts[0].contains("PARTITION BY RANGE (event_date)"));
        assert!(executor.scripts[1].contains("INSERT INTO events_20231102"));
        assert!(executor.scripts[2].contains("INSERT INTO events_20231101"));
    }

    #[tokio::test]
    async fn test_daily_rerun_still_loads() {
        let dir = TempDir::new().unwrap();
        let avro_home = dir.path().join("avro");
        for date in ["20231101", "20231102"] {
            write_avro(
                &daily_file(&avro_home, date),
                EVENTS_SCHEMA,
                vec![event(date, NOV_01_MICROS, "page_view", vec![])],
            );
            generate(&options(dir.path())).unwrap();
        }

        let mut executor = RecordingExecutor::default();
        let report = load_scripts(&mut executor, &dir.path().join("sql"))
            .await
            .unwrap();

        assert_eq!(
            report.ddl_script,
            dir.path().join("sql/events_20231102_ddl.sql")
        );
        assert_eq!(report.insert_scripts.len(), 2);
    }
}
