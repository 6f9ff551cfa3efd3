//! SQL text for the GeoPackage R-tree spatial index extension.
//!
//! For a feature table `t` with geometry column `c` the index is the virtual
//! table `rtree_t_c(id, minx, maxx, miny, maxy)` plus three triggers that keep
//! exactly one row per feature with a non-null, non-empty geometry:
//!
//! - insert: add a row when the new geometry is indexable.
//! - update: when the geometry or the feature id changed, delete the old row
//!   and add a row for the new value if it is indexable.
//! - delete: remove the row unconditionally.
//!
//! The feature count extension keeps `gpkg_ogr_contents.feature_count` of a
//! table current through an insert trigger and a delete trigger.
//!
//! Identifiers must pass [`validate_identifier`] before they reach this module;
//! they are spliced into SQL text as-is.

pub const RTREE_EXTENSION_NAME: &str = "gpkg_rtree_index";
pub const RTREE_EXTENSION_DEFINITION: &str = "http://www.geopackage.org/spec120/#extension_rtree";
pub const RTREE_EXTENSION_SCOPE: &str = "write-only";

pub const EXTENSIONS_TABLE: &str = "gpkg_extensions";
pub const CONTENTS_TABLE: &str = "gpkg_contents";
pub const OGR_CONTENTS_TABLE: &str = "gpkg_ogr_contents";

/// Feature id expression used when the table has no INTEGER PRIMARY KEY.
pub const ROWID: &str = "rowid";

/// Accept only `[A-Za-z0-9_]+`.
pub fn validate_identifier(s: &str) -> Option<&str> {
    if s.is_empty() {
        return None;
    }
    if s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        Some(s)
    } else {
        None
    }
}

pub fn create_extensions_table() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {EXTENSIONS_TABLE} ( \
           table_name TEXT, \
           column_name TEXT, \
           extension_name TEXT NOT NULL, \
           definition TEXT NOT NULL, \
           scope TEXT NOT NULL, \
           CONSTRAINT ge_tce UNIQUE (table_name, column_name, extension_name) \
         )"
    )
}

/// Index DDL for one (table, column) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialIndexDdl<'a> {
    table: &'a str,
    column: &'a str,
    id_column: &'a str,
}

impl<'a> SpatialIndexDdl<'a> {
    /// `id_column` is the INTEGER PRIMARY KEY column, or [`ROWID`].
    pub fn new(table: &'a str, column: &'a str, id_column: &'a str) -> Self {
        Self {
            table,
            column,
            id_column,
        }
    }

    pub fn table(&self) -> &'a str {
        self.table
    }

    pub fn column(&self) -> &'a str {
        self.column
    }

    pub fn id_column(&self) -> &'a str {
        self.id_column
    }

    pub fn rtree_name(&self) -> String {
        format!("rtree_{}_{}", self.table, self.column)
    }

    pub fn trigger_name(&self, event: &str) -> String {
        format!("rtree_{}_{}_{event}", self.table, self.column)
    }

    pub fn trigger_names(&self) -> [String; 3] {
        [
            self.trigger_name("insert"),
            self.trigger_name("update"),
            self.trigger_name("delete"),
        ]
    }

    fn id_ref(&self, row: &str) -> String {
        if self.id_column == ROWID {
            format!("{row}.rowid")
        } else {
            format!("{row}.[{}]", self.id_column)
        }
    }

    /// `minx, maxx, miny, maxy` expressions for the geometry column of `row`
    /// (`NEW`, `OLD`, or a bare table reference when `row` is empty).
    fn bounds(&self, row: &str) -> String {
        let c = self.column_ref(row);
        format!("ST_MinX({c}), ST_MaxX({c}), ST_MinY({c}), ST_MaxY({c})")
    }

    fn column_ref(&self, row: &str) -> String {
        if row.is_empty() {
            format!("[{}]", self.column)
        } else {
            format!("{row}.[{}]", self.column)
        }
    }

    fn indexable(&self, row: &str) -> String {
        let c = self.column_ref(row);
        format!("{c} IS NOT NULL AND ST_IsEmpty({c}) = 0")
    }

    pub fn create_rtree(&self) -> String {
        format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS [{}] USING rtree(id, minx, maxx, miny, maxy)",
            self.rtree_name()
        )
    }

    pub fn clear_rtree(&self) -> String {
        format!("DELETE FROM [{}]", self.rtree_name())
    }

    /// Seed one row per indexable feature already in the table.
    pub fn backfill(&self) -> String {
        let id = if self.id_column == ROWID {
            ROWID.to_string()
        } else {
            format!("[{}]", self.id_column)
        };
        format!(
            "INSERT OR REPLACE INTO [{rtree}] (id, minx, maxx, miny, maxy) \
             SELECT {id}, {bounds} FROM [{table}] WHERE {indexable}",
            rtree = self.rtree_name(),
            bounds = self.bounds(""),
            table = self.table,
            indexable = self.indexable(""),
        )
    }

    pub fn insert_trigger(&self) -> String {
        format!(
            "CREATE TRIGGER IF NOT EXISTS [{name}] AFTER INSERT ON [{table}] \
             WHEN {indexable} \
             BEGIN \
               INSERT OR REPLACE INTO [{rtree}] (id, minx, maxx, miny, maxy) \
               VALUES ({id}, {bounds}); \
             END",
            name = self.trigger_name("insert"),
            table = self.table,
            indexable = self.indexable("NEW"),
            rtree = self.rtree_name(),
            id = self.id_ref("NEW"),
            bounds = self.bounds("NEW"),
        )
    }

    /// A rowid cannot be named in an `UPDATE OF` list, so rowid tables watch
    /// every update and filter in the `WHEN` clause.
    pub fn update_trigger(&self) -> String {
        let event = if self.id_column == ROWID {
            "UPDATE".to_string()
        } else {
            format!("UPDATE OF [{}], [{}]", self.column, self.id_column)
        };
        format!(
            "CREATE TRIGGER IF NOT EXISTS [{name}] AFTER {event} ON [{table}] \
             WHEN {old_id} IS NOT {new_id} OR OLD.[{c}] IS NOT NEW.[{c}] \
             BEGIN \
               DELETE FROM [{rtree}] WHERE id = {old_id}; \
               INSERT OR REPLACE INTO [{rtree}] (id, minx, maxx, miny, maxy) \
               SELECT {new_id}, {bounds} WHERE {indexable}; \
             END",
            c = self.column,
            name = self.trigger_name("update"),
            table = self.table,
            rtree = self.rtree_name(),
            old_id = self.id_ref("OLD"),
            new_id = self.id_ref("NEW"),
            bounds = self.bounds("NEW"),
            indexable = self.indexable("NEW"),
        )
    }

    pub fn delete_trigger(&self) -> String {
        format!(
            "CREATE TRIGGER IF NOT EXISTS [{name}] AFTER DELETE ON [{table}] \
             BEGIN \
               DELETE FROM [{rtree}] WHERE id = {old_id}; \
             END",
            name = self.trigger_name("delete"),
            table = self.table,
            rtree = self.rtree_name(),
            old_id = self.id_ref("OLD"),
        )
    }

    pub fn triggers(&self) -> [String; 3] {
        [
            self.insert_trigger(),
            self.update_trigger(),
            self.delete_trigger(),
        ]
    }

    pub fn drop_triggers(&self) -> [String; 3] {
        self.trigger_names()
            .map(|name| format!("DROP TRIGGER IF EXISTS [{name}]"))
    }

    pub fn drop_rtree(&self) -> String {
        format!("DROP TABLE IF EXISTS [{}]", self.rtree_name())
    }

    pub fn register_extension(&self) -> String {
        format!(
            "INSERT OR IGNORE INTO {EXTENSIONS_TABLE} \
             (table_name, column_name, extension_name, definition, scope) \
             VALUES ('{table}', '{column}', '{RTREE_EXTENSION_NAME}', \
                     '{RTREE_EXTENSION_DEFINITION}', '{RTREE_EXTENSION_SCOPE}')",
            table = self.table,
            column = self.column,
        )
    }

    fn registration_filter(&self) -> String {
        format!(
            "lower(table_name) = lower('{table}') \
             AND lower(column_name) = lower('{column}') \
             AND extension_name = '{RTREE_EXTENSION_NAME}'",
            table = self.table,
            column = self.column,
        )
    }

    pub fn count_registrations(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {EXTENSIONS_TABLE} WHERE {}",
            self.registration_filter()
        )
    }

    pub fn unregister_extension(&self) -> String {
        format!(
            "DELETE FROM {EXTENSIONS_TABLE} WHERE {}",
            self.registration_filter()
        )
    }

    pub fn count_rtree_rows(&self) -> String {
        format!("SELECT COUNT(*) FROM [{}]", self.rtree_name())
    }

    fn contents_filter(&self) -> String {
        format!("lower(table_name) = lower('{}')", self.table)
    }

    pub fn count_contents_rows(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {CONTENTS_TABLE} WHERE {}",
            self.contents_filter()
        )
    }

    /// Refresh the contents extent from the geometry column's bounds.
    pub fn update_contents_extent(&self) -> String {
        let aggregate = |func: &str, bound: &str| {
            format!(
                "(SELECT {func}({bound}([{c}])) FROM [{table}] WHERE {indexable})",
                c = self.column,
                table = self.table,
                indexable = self.indexable(""),
            )
        };
        format!(
            "UPDATE {CONTENTS_TABLE} SET \
               min_x = {min_x}, max_x = {max_x}, min_y = {min_y}, max_y = {max_y} \
             WHERE {filter}",
            min_x = aggregate("MIN", "ST_MinX"),
            max_x = aggregate("MAX", "ST_MaxX"),
            min_y = aggregate("MIN", "ST_MinY"),
            max_y = aggregate("MAX", "ST_MaxY"),
            filter = self.contents_filter(),
        )
    }
}

/// Feature count DDL for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureCountDdl<'a> {
    table: &'a str,
}

impl<'a> FeatureCountDdl<'a> {
    pub fn new(table: &'a str) -> Self {
        Self { table }
    }

    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {OGR_CONTENTS_TABLE} ( \
               table_name TEXT NOT NULL PRIMARY KEY, \
               feature_count INTEGER DEFAULT NULL \
             )"
        )
    }

    fn filter(&self) -> String {
        format!("lower(table_name) = lower('{}')", self.table)
    }

    pub fn trigger_names(&self) -> [String; 2] {
        [
            format!("trigger_insert_feature_count_{}", self.table),
            format!("trigger_delete_feature_count_{}", self.table),
        ]
    }

    /// Replace the table's row with a fresh `COUNT(*)`.
    pub fn reset_count(&self) -> [String; 2] {
        [
            self.delete_row(),
            format!(
                "INSERT INTO {OGR_CONTENTS_TABLE} (table_name, feature_count) \
                 SELECT '{table}', COUNT(*) FROM [{table}]",
                table = self.table,
            ),
        ]
    }

    pub fn delete_row(&self) -> String {
        format!("DELETE FROM {OGR_CONTENTS_TABLE} WHERE {}", self.filter())
    }

    pub fn select_count(&self) -> String {
        format!(
            "SELECT feature_count FROM {OGR_CONTENTS_TABLE} WHERE {}",
            self.filter()
        )
    }

    fn trigger(&self, name: &str, event: &str, step: &str) -> String {
        format!(
            "CREATE TRIGGER IF NOT EXISTS [{name}] AFTER {event} ON [{table}] \
             BEGIN \
               UPDATE {OGR_CONTENTS_TABLE} SET feature_count = feature_count {step} \
               WHERE {filter}; \
             END",
            table = self.table,
            filter = self.filter(),
        )
    }

    pub fn triggers(&self) -> [String; 2] {
        let [insert, delete] = self.trigger_names();
        [
            self.trigger(&insert, "INSERT", "+ 1"),
            self.trigger(&delete, "DELETE", "- 1"),
        ]
    }

    pub fn drop_triggers(&self) -> [String; 2] {
        self.trigger_names()
            .map(|name| format!("DROP TRIGGER IF EXISTS [{name}]"))
    }
}

/// `SELECT COUNT(*)` of schema objects of `kind` named `name`.
pub fn count_schema_objects(kind: &str, name: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = '{kind}' AND lower(name) = lower('{name}')"
    )
}

/// Number of columns of `table` (0 when it does not exist).
pub fn count_table_columns(table: &str) -> String {
    format!("SELECT COUNT(*) FROM pragma_table_info('{table}')")
}

pub fn count_named_columns(table: &str, column: &str) -> String {
    format!("SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE lower(name) = lower('{column}')")
}

/// Name of the single INTEGER PRIMARY KEY column of `table`; no row when the
/// table has none.
pub fn integer_primary_key(table: &str) -> String {
    format!(
        "SELECT name FROM pragma_table_info('{table}') \
         WHERE pk = 1 AND upper(type) = 'INTEGER' \
         AND (SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE pk > 0) = 1"
    )
}
