//! DDL fragment model
//!
//! A `DdlFragment` is the structural form of one file's generated schema:
//! the composite types (children before parents) followed by the partitioned
//! table's column list. Fragments compare structurally, so two files agree
//! when names, types, nullability, defaults and ordering agree.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One attribute of a composite type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeField {
    pub name: String,
    pub type_name: String,
}

/// A `CREATE TYPE ... AS (...)` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeType {
    pub name: String,
    pub fields: Vec<CompositeField>,
}

impl CompositeType {
    pub fn to_sql(&self) -> String {
        if self.fields.is_empty() {
            return format!("CREATE TYPE {} AS ();\n", self.name);
        }
        let body = self
            .fields
            .iter()
            .map(|f| format!("{} {}", f.name, f.type_name))
            .collect::<Vec<_>>()
            .join("\n  , ");
        format!("CREATE TYPE {} AS (\n    {}\n);\n", self.name, body)
    }
}

/// One column of the partitioned table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
    /// Rendered default literal; `None` omits the `DEFAULT` clause.
    pub default: Option<String>,
}

impl ColumnDef {
    pub fn to_sql(&self) -> String {
        let mut line = format!("{} {}", self.name, self.type_name);
        if !self.nullable {
            line.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            line.push_str(" DEFAULT ");
            line.push_str(default);
        }
        line
    }
}

/// Column list of the partitioned table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Names of the table's columns in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// `CREATE TABLE <name> (...)` without a trailing terminator.
    pub fn to_sql(&self, name: &str) -> String {
        let body = self
            .columns
            .iter()
            .map(ColumnDef::to_sql)
            .collect::<Vec<_>>()
            .join("\n  , ");
        format!("CREATE TABLE {} (\n    {}\n)", name, body)
    }
}

/// Structural DDL of one input file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlFragment {
    pub composite_types: Vec<CompositeType>,
    pub table: TableDef,
}

impl DdlFragment {
    /// Composite declarations followed by the table body, as it appears in
    /// the DDL script.
    pub fn to_sql(&self, parent_table: &str, partition_column: &str) -> String {
        let mut sql: String = self.composite_types.iter().map(|t| t.to_sql()).collect();
        sql.push_str(&self.table.to_sql(parent_table));
        sql.push_str(&format!(" PARTITION BY RANGE ({});\n", partition_column));
        sql
    }
}

/// One daily partition, `[date_from, date_to)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionSpec {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub table_name: String,
}

impl PartitionSpec {
    pub fn to_sql(&self, parent_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n    PARTITION OF {}\n    FOR VALUES FROM ('{}') TO ('{}');\n",
            self.table_name,
            parent_table,
            self.date_from.format("%Y%m%d"),
            self.date_to.format("%Y%m%d"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, type_name: &str, nullable: bool) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            type_name: type_name.to_string(),
            nullable,
            default: None,
        }
    }

    #[test]
    fn test_composite_type_sql() {
        let ty = CompositeType {
            name: "events_type_1".to_string(),
            fields: vec![
                CompositeField {
                    name: "key".to_string(),
                    type_name: "VARCHAR".to_string(),
                },
                CompositeField {
                    name: "value".to_string(),
                    type_name: "events_type_2".to_string(),
                },
            ],
        };
        assert_eq!(
            ty.to_sql(),
            "CREATE TYPE events_type_1 AS (\n    key VARCHAR\n  , value events_type_2\n);\n"
        );
    }

    #[test]
    fn test_column_sql() {
        let mut col = column("event_date", "VARCHAR", false);
        col.default = Some("'19700101'".to_string());
        assert_eq!(col.to_sql(), "event_date VARCHAR NOT NULL DEFAULT '19700101'");
        assert_eq!(column("x", "BIGINT", true).to_sql(), "x BIGINT");
    }

    #[test]
    fn test_fragment_equality_is_structural() {
        let a = DdlFragment {
            composite_types: vec![],
            table: TableDef {
                columns: vec![column("a", "BIGINT", true), column("b", "VARCHAR", true)],
            },
        };
        let mut b = a.clone();
        assert_eq!(a, b);

        b.table.columns.swap(0, 1);
        assert_ne!(a, b);

        let mut c = a.clone();
        c.table.columns[0].nullable = false;
        assert_ne!(a, c);
    }

    #[test]
    fn test_partition_sql() {
        let spec = PartitionSpec {
            table_name: "events_20231231".to_string(),
            date_from: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(
            spec.to_sql("events"),
            "CREATE TABLE events_20231231\n    PARTITION OF events\n    FOR VALUES FROM ('20231231') TO ('20240101');\n"
        );
    }
}
