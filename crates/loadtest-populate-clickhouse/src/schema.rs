//! DDL generation and the column layout of every insert.
//!
//! Both table families partition by month of `created_date` and order by
//! (surrogate id, `created_at`).
//!
//! Metric table columns:
//!
//! ```text
//! created_date Date, created_at DateTime, time String, tags_id UInt32,
//! [<primary tag>], <field 1>, <field 2>, ...
//! ```
//!
//! Identity table columns:
//!
//! ```text
//! created_date Date, created_at DateTime, id UInt32, <tag 1>, <tag 2>, ...
//! ```

use crate::error::ConfigError;
use bench_core::{ColumnKind, Header, SerializedType};
use std::collections::HashMap;

pub const CREATED_DATE: &str = "created_date";
pub const CREATED_AT: &str = "created_at";
pub const TIME: &str = "time";
pub const TAGS_ID: &str = "tags_id";
pub const ID: &str = "id";

/// Position of `tags_id` in a metric row.
pub const TAGS_ID_POSITION: usize = 3;

const INDEX_GRANULARITY: u32 = 8192;

/// ClickHouse column type for a storage kind.
pub fn clickhouse_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::String => "Nullable(String)",
        ColumnKind::Int32 => "Nullable(Int32)",
        ColumnKind::Int64 => "Nullable(Int64)",
        ColumnKind::Float32 => "Nullable(Float32)",
        ColumnKind::Float64 => "Nullable(Float64)",
        ColumnKind::Map => "Map(LowCardinality(String), String) CODEC(ZSTD(1))",
        ColumnKind::Text => "String",
    }
}

/// Storage kind of a metric field column. Fields are numeric unless the
/// column name is reserved.
pub fn field_kind(field: &str) -> ColumnKind {
    ColumnKind::resolve(field, SerializedType::Float64)
}

fn create_table(table: &str, columns: &[(String, &str)], order_by: &str) -> String {
    let definitions = columns
        .iter()
        .map(|(name, ty)| format!("    {name} {ty}"))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "CREATE TABLE {table} (\n{definitions}\n) ENGINE = MergeTree() \
         PARTITION BY toYYYYMM({CREATED_DATE}) ORDER BY ({order_by}, {CREATED_AT}) \
         SETTINGS index_granularity = {INDEX_GRANULARITY};"
    )
}

/// `CREATE TABLE` for the identity table.
///
/// Tag columns follow the framework columns in the given order, typed by
/// their declared serialized type.
pub fn identity_table_ddl(
    table: &str,
    tag_names: &[String],
    tag_types: &[SerializedType],
) -> Result<String, ConfigError> {
    if tag_names.len() != tag_types.len() {
        return Err(ConfigError::TagCountMismatch {
            names: tag_names.len(),
            types: tag_types.len(),
        });
    }

    let mut columns = vec![
        (CREATED_DATE.to_string(), "Date DEFAULT today()"),
        (CREATED_AT.to_string(), "DateTime DEFAULT now()"),
        (ID.to_string(), "UInt32"),
    ];
    for (name, ty) in tag_names.iter().zip(tag_types) {
        columns.push((name.clone(), clickhouse_type(ColumnKind::resolve(name, *ty))));
    }
    Ok(create_table(table, &columns, ID))
}

/// `CREATE TABLE` for one metric table.
///
/// `in_table_tag` is the primary tag name and type when it is denormalised
/// into the table. Nameless field columns are skipped.
pub fn metric_table_ddl(
    table: &str,
    fields: &[String],
    in_table_tag: Option<(&str, SerializedType)>,
) -> String {
    let mut columns = vec![
        (CREATED_DATE.to_string(), "Date DEFAULT today()"),
        (CREATED_AT.to_string(), "DateTime DEFAULT now()"),
        (TIME.to_string(), "String"),
        (TAGS_ID.to_string(), "UInt32"),
    ];
    if let Some((name, ty)) = in_table_tag {
        columns.push((name.to_string(), clickhouse_type(ColumnKind::resolve(name, ty))));
    }
    for field in fields.iter().filter(|f| !f.is_empty()) {
        columns.push((field.clone(), clickhouse_type(field_kind(field))));
    }
    create_table(table, &columns, TAGS_ID)
}

/// Column layout of one metric table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTable {
    pub name: String,
    /// Field columns, in header order.
    pub fields: Vec<String>,
    pub field_kinds: Vec<ColumnKind>,
    /// Every column of an insert, framework columns first.
    pub columns: Vec<String>,
}

/// Everything the loader derives from the header, computed once per run.
#[derive(Debug, Clone)]
pub struct LoadSchema {
    header: Header,
    tag_kinds: Vec<ColumnKind>,
    identity_table: String,
    identity_columns: Vec<String>,
    in_table_tag: bool,
    tables: HashMap<String, MetricTable>,
}

impl LoadSchema {
    /// Derive the load schema. The header must declare at least one tag and
    /// one table.
    pub fn new(
        header: Header,
        identity_table: impl Into<String>,
        in_table_tag: bool,
    ) -> Result<Self, ConfigError> {
        let primary = header.primary_tag().ok_or(ConfigError::NoTags)?.to_string();
        if header.tables().is_empty() {
            return Err(ConfigError::NoTables);
        }

        let mut identity_columns = vec![
            CREATED_DATE.to_string(),
            CREATED_AT.to_string(),
            ID.to_string(),
        ];
        identity_columns.extend(header.tag_keys().iter().cloned());

        let tables = header
            .tables()
            .iter()
            .map(|table| {
                let fields: Vec<String> = table
                    .fields
                    .iter()
                    .filter(|f| !f.is_empty())
                    .cloned()
                    .collect();
                let mut columns = vec![
                    CREATED_DATE.to_string(),
                    CREATED_AT.to_string(),
                    TIME.to_string(),
                    TAGS_ID.to_string(),
                ];
                if in_table_tag {
                    columns.push(primary.clone());
                }
                columns.extend(fields.iter().cloned());

                let metric = MetricTable {
                    name: table.name.clone(),
                    field_kinds: fields.iter().map(|f| field_kind(f)).collect(),
                    fields,
                    columns,
                };
                (table.name.clone(), metric)
            })
            .collect();

        Ok(Self {
            tag_kinds: header.tag_kinds(),
            header,
            identity_table: identity_table.into(),
            identity_columns,
            in_table_tag,
            tables,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn tag_count(&self) -> usize {
        self.header.tag_keys().len()
    }

    pub fn tag_kinds(&self) -> &[ColumnKind] {
        &self.tag_kinds
    }

    pub fn primary_tag(&self) -> &str {
        self.header.primary_tag().unwrap_or_default()
    }

    pub fn identity_table(&self) -> &str {
        &self.identity_table
    }

    pub fn identity_columns(&self) -> &[String] {
        &self.identity_columns
    }

    pub fn in_table_tag(&self) -> bool {
        self.in_table_tag
    }

    pub fn table(&self, name: &str) -> Option<&MetricTable> {
        self.tables.get(name)
    }

    pub fn identity_ddl(&self) -> Result<String, ConfigError> {
        identity_table_ddl(
            &self.identity_table,
            self.header.tag_keys(),
            self.header.tag_types(),
        )
    }

    /// `(table, DDL)` for every metric table, in header order.
    pub fn metric_ddls(&self) -> Vec<(String, String)> {
        let in_table_tag = if self.in_table_tag {
            self.header
                .tag_types()
                .first()
                .map(|ty| (self.primary_tag(), *ty))
        } else {
            None
        };
        self.header
            .tables()
            .iter()
            .map(|table| {
                (
                    table.name.clone(),
                    metric_table_ddl(&table.name, &table.fields, in_table_tag),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn header() -> Header {
        Header::new(
            strings(&["hostname", "region"]),
            vec![SerializedType::String, SerializedType::String],
        )
        .unwrap()
        .with_table("cpu", strings(&["usage_user", "usage_system"]))
    }

    #[test]
    fn test_metric_table_ddl() {
        let ddl = metric_table_ddl("cpu", &strings(&["usage_user", "usage_system"]), None);
        assert_eq!(
            ddl,
            "CREATE TABLE cpu (\n\
             \x20   created_date Date DEFAULT today(),\n\
             \x20   created_at DateTime DEFAULT now(),\n\
             \x20   time String,\n\
             \x20   tags_id UInt32,\n\
             \x20   usage_user Nullable(Float64),\n\
             \x20   usage_system Nullable(Float64)\n\
             ) ENGINE = MergeTree() PARTITION BY toYYYYMM(created_date) \
             ORDER BY (tags_id, created_at) SETTINGS index_granularity = 8192;"
        );
    }

    #[test]
    fn test_identity_table_ddl() {
        let ddl = identity_table_ddl(
            "tags",
            &strings(&["hostname", "region"]),
            &[SerializedType::String, SerializedType::String],
        )
        .unwrap();
        assert!(ddl.starts_with("CREATE TABLE tags (\n"));
        assert!(ddl.contains(
            "    id UInt32,\n    hostname Nullable(String),\n    region Nullable(String)\n)"
        ));
        assert!(ddl.contains("PARTITION BY toYYYYMM(created_date) ORDER BY (id, created_at)"));
    }

    #[test]
    fn test_tag_count_mismatch() {
        assert_eq!(
            identity_table_ddl("tags", &strings(&["a", "b"]), &[SerializedType::String]),
            Err(ConfigError::TagCountMismatch { names: 2, types: 1 })
        );
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(
            clickhouse_type(ColumnKind::resolve("properties_map", SerializedType::String)),
            "Map(LowCardinality(String), String) CODEC(ZSTD(1))"
        );
        assert_eq!(
            clickhouse_type(ColumnKind::resolve("properties_json", SerializedType::String)),
            "String"
        );
        assert_eq!(clickhouse_type(ColumnKind::Int64), "Nullable(Int64)");
        assert_eq!(clickhouse_type(ColumnKind::Int32), "Nullable(Int32)");
        assert_eq!(clickhouse_type(ColumnKind::Float32), "Nullable(Float32)");
    }

    #[test]
    fn test_in_table_tag_follows_tags_id() {
        let schema = LoadSchema::new(header(), "tags", true).unwrap();
        let cpu = schema.table("cpu").unwrap();
        assert_eq!(
            cpu.columns,
            strings(&[
                "created_date",
                "created_at",
                "time",
                "tags_id",
                "hostname",
                "usage_user",
                "usage_system"
            ])
        );

        let (_, ddl) = &schema.metric_ddls()[0];
        assert!(ddl.contains("tags_id UInt32,\n    hostname Nullable(String),\n    usage_user"));
    }

    #[test]
    fn test_load_schema_columns() {
        let schema = LoadSchema::new(header(), "tags", false).unwrap();
        assert_eq!(schema.primary_tag(), "hostname");
        assert_eq!(
            schema.identity_columns(),
            strings(&["created_date", "created_at", "id", "hostname", "region"])
        );
        assert_eq!(schema.table("cpu").unwrap().columns.len(), 6);
        assert!(schema.table("mem").is_none());
    }

    #[test]
    fn test_header_without_tags_or_tables() {
        let no_tags = Header::new(vec![], vec![]).unwrap().with_table("cpu", vec![]);
        assert_eq!(
            LoadSchema::new(no_tags, "tags", false).unwrap_err(),
            ConfigError::NoTags
        );

        let no_tables = Header::new(strings(&["hostname"]), vec![SerializedType::String]).unwrap();
        assert_eq!(
            LoadSchema::new(no_tables, "tags", false).unwrap_err(),
            ConfigError::NoTables
        );
    }
}
