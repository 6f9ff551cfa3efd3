//! SQLite extension registration via raw FFI.
//!
//! Registers the geopack geometry functions and the spatial-index management
//! functions on a raw `*mut sqlite3` handle. On native targets also exports
//! the `sqlite3_geopack_init` C entry point so SQLite can load this library
//! as a loadable extension.

use crate::ddl::{self, FeatureCountDdl, SpatialIndexDdl};
use crate::sqlite_compat::sqlite_transient;
use crate::sqlite_compat::*;
use std::ffi::{CStr, CString};
use std::os::raw::c_int;

use geopack_core::error::GeoPackError;
use geopack_core::function_catalog::{
    SQLITE_DETERMINISTIC_FUNCTIONS, SQLITE_DIRECT_ONLY_FUNCTIONS,
};
use geopack_core::functions::accessors::*;
use geopack_core::functions::bounds::*;
use geopack_core::functions::constructors::*;
use tracing::debug;

// ── Constants ────────────────────────────────────────────────────────────────

const DET: c_int = SQLITE_UTF8 | SQLITE_DETERMINISTIC | SQLITE_INNOCUOUS;

/// `SQLITE_DIRECTONLY` (0x80000) prevents use from triggers/views.
/// Not yet exported by all `libsqlite3-sys` versions, so we define it here.
const SQLITE_DIRECTONLY_FLAG: c_int = 0x0008_0000;
const DIRECT: c_int = SQLITE_UTF8 | SQLITE_DIRECTONLY_FLAG;

// ── Argument-extraction helpers ──────────────────────────────────────────────

unsafe fn get_blob<'a>(argv: *mut *mut sqlite3_value, i: usize) -> Option<&'a [u8]> {
    let v = *argv.add(i);
    if sqlite3_value_type(v) == SQLITE_NULL {
        return None;
    }
    let ptr = sqlite3_value_blob(v) as *const u8;
    let len = sqlite3_value_bytes(v) as usize;
    if len == 0 {
        return Some(&[]);
    }
    if ptr.is_null() {
        return None;
    }
    Some(std::slice::from_raw_parts(ptr, len))
}

enum SqlTextArg<'a> {
    Null,
    Value(&'a str),
    InvalidUtf8,
}

unsafe fn get_text<'a>(argv: *mut *mut sqlite3_value, i: usize) -> SqlTextArg<'a> {
    let v = *argv.add(i);
    if sqlite3_value_type(v) == SQLITE_NULL {
        return SqlTextArg::Null;
    }
    let ptr = sqlite3_value_text(v);
    let len = sqlite3_value_bytes(v) as usize;
    if ptr.is_null() {
        return SqlTextArg::InvalidUtf8;
    }
    match std::str::from_utf8(std::slice::from_raw_parts(ptr as _, len)) {
        Ok(s) => SqlTextArg::Value(s),
        Err(_) => SqlTextArg::InvalidUtf8,
    }
}

enum SqlArg<T> {
    Null,
    Value(T),
    InvalidType,
}

unsafe fn get_f64_arg(argv: *mut *mut sqlite3_value, i: usize) -> SqlArg<f64> {
    let v = *argv.add(i);
    match sqlite3_value_type(v) {
        SQLITE_NULL => SqlArg::Null,
        SQLITE_INTEGER | SQLITE_FLOAT => SqlArg::Value(sqlite3_value_double(v)),
        _ => SqlArg::InvalidType,
    }
}

unsafe fn get_i32_arg(argv: *mut *mut sqlite3_value, i: usize) -> SqlArg<i32> {
    let v = *argv.add(i);
    match sqlite3_value_type(v) {
        SQLITE_NULL => SqlArg::Null,
        SQLITE_INTEGER => SqlArg::Value(sqlite3_value_int(v)),
        _ => SqlArg::InvalidType,
    }
}

// ── Result-setting helpers ───────────────────────────────────────────────────

fn checked_c_int_len(len: usize) -> Option<c_int> {
    c_int::try_from(len).ok()
}

const ERROR_MSG_TOO_LARGE: &str = "internal error: error message too large";
const PANIC_IN_CALLBACK_MSG: &str = "panic in SQLite callback";

unsafe fn set_blob(ctx: *mut sqlite3_context, data: &[u8]) {
    let Some(len) = checked_c_int_len(data.len()) else {
        set_error(ctx, "internal error: BLOB result too large");
        return;
    };
    sqlite3_result_blob(ctx, data.as_ptr().cast(), len, sqlite_transient());
}

unsafe fn set_text(ctx: *mut sqlite3_context, s: &str) {
    let Some(len) = checked_c_int_len(s.len()) else {
        set_error(ctx, "internal error: text result too large");
        return;
    };
    sqlite3_result_text(ctx, s.as_ptr().cast(), len, sqlite_transient());
}

unsafe fn set_f64(ctx: *mut sqlite3_context, v: f64) {
    sqlite3_result_double(ctx, v);
}
unsafe fn set_i64(ctx: *mut sqlite3_context, v: i64) {
    sqlite3_result_int64(ctx, v);
}
unsafe fn set_i32(ctx: *mut sqlite3_context, v: i32) {
    sqlite3_result_int(ctx, v);
}
unsafe fn set_null(ctx: *mut sqlite3_context) {
    sqlite3_result_null(ctx);
}

unsafe fn set_error(ctx: *mut sqlite3_context, msg: &str) {
    if let Some(len) = checked_c_int_len(msg.len()) {
        sqlite3_result_error(ctx, msg.as_ptr().cast(), len);
        return;
    }
    sqlite3_result_error(
        ctx,
        ERROR_MSG_TOO_LARGE.as_ptr().cast(),
        ERROR_MSG_TOO_LARGE.len() as c_int,
    );
}

unsafe fn xfunc_guard<F>(ctx: *mut sqlite3_context, label: &str, f: F)
where
    F: FnOnce(),
{
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    if result.is_err() {
        set_error(ctx, &format!("{label}: {PANIC_IN_CALLBACK_MSG}"));
    }
}

unsafe fn require_f64_arg(
    ctx: *mut sqlite3_context,
    argv: *mut *mut sqlite3_value,
    i: usize,
    fn_name: &str,
    arg_name: &str,
) -> Option<f64> {
    match get_f64_arg(argv, i) {
        SqlArg::Value(v) => Some(v),
        SqlArg::Null => {
            set_null(ctx);
            None
        }
        SqlArg::InvalidType => {
            set_error(ctx, &format!("{fn_name}: {arg_name} must be numeric"));
            None
        }
    }
}

unsafe fn require_i32_arg(
    ctx: *mut sqlite3_context,
    argv: *mut *mut sqlite3_value,
    i: usize,
    fn_name: &str,
    arg_name: &str,
) -> Option<i32> {
    match get_i32_arg(argv, i) {
        SqlArg::Value(v) => Some(v),
        SqlArg::Null => {
            set_null(ctx);
            None
        }
        SqlArg::InvalidType => {
            set_error(ctx, &format!("{fn_name}: {arg_name} must be integer"));
            None
        }
    }
}

unsafe fn require_text_arg<'a>(
    ctx: *mut sqlite3_context,
    argv: *mut *mut sqlite3_value,
    i: usize,
    fn_name: &str,
    arg_name: &str,
) -> Option<&'a str> {
    match get_text(argv, i) {
        SqlTextArg::Value(v) => Some(v),
        SqlTextArg::Null => {
            set_null(ctx);
            None
        }
        SqlTextArg::InvalidUtf8 => {
            set_error(
                ctx,
                &format!("{fn_name}: {arg_name} must be valid UTF-8 text"),
            );
            None
        }
    }
}

unsafe fn any_arg_is_null(argv: *mut *mut sqlite3_value, arg_count: usize) -> bool {
    for i in 0..arg_count {
        if sqlite3_value_type(*argv.add(i)) == SQLITE_NULL {
            return true;
        }
    }
    false
}

unsafe fn optional_srid_arg(
    ctx: *mut sqlite3_context,
    argv: *mut *mut sqlite3_value,
    with_srid: bool,
    index: usize,
    fn_name: &str,
) -> Option<Option<i32>> {
    if with_srid {
        let srid = require_i32_arg(ctx, argv, index, fn_name, "srid")?;
        Some(Some(srid))
    } else {
        Some(None)
    }
}

// ── Convenience setter wrappers ──────────────────────────────────────────────

unsafe fn set_bool(ctx: *mut sqlite3_context, v: bool) {
    set_i32(ctx, v as i32);
}
unsafe fn set_text_owned(ctx: *mut sqlite3_context, v: impl AsRef<str>) {
    set_text(ctx, v.as_ref());
}

// ── Callback macros ──────────────────────────────────────────────────────────
//
// Each macro generates an `unsafe extern "C" fn` with the standard SQLite
// scalar-function signature. NULL blob/text inputs produce NULL output.
// Errors produce sqlite3_result_error.

/// 1 blob → Result<T>, with a custom setter expression.
macro_rules! xfunc_blob {
    ($name:ident, $label:expr, $func:expr, $set:expr) => {
        unsafe extern "C" fn $name(
            ctx: *mut sqlite3_context,
            _n: c_int,
            argv: *mut *mut sqlite3_value,
        ) {
            xfunc_guard(ctx, $label, || {
                let Some(b) = get_blob(argv, 0) else {
                    set_null(ctx);
                    return;
                };
                match $func(b) {
                    Ok(v) => $set(ctx, v),
                    Err(e) => set_error(ctx, &format!(concat!($label, ": {}"), e)),
                }
            });
        }
    };
}

/// 1 blob → Result<Option<f64>>, where `None` maps to SQL NULL.
macro_rules! xfunc_blob_opt_f64 {
    ($name:ident, $label:expr, $func:expr) => {
        unsafe extern "C" fn $name(
            ctx: *mut sqlite3_context,
            _n: c_int,
            argv: *mut *mut sqlite3_value,
        ) {
            xfunc_guard(ctx, $label, || {
                let Some(blob) = get_blob(argv, 0) else {
                    set_null(ctx);
                    return;
                };
                match $func(blob) {
                    Ok(Some(v)) => set_f64(ctx, v),
                    Ok(None) => set_null(ctx),
                    Err(e) => set_error(ctx, &format!(concat!($label, ": {}"), e)),
                }
            });
        }
    };
}

/// blob + integer arg → Result<Vec<u8>>.
macro_rules! xfunc_blob_i32_blob {
    ($name:ident, $label:expr, $arg_name:expr, $func:expr) => {
        unsafe extern "C" fn $name(
            ctx: *mut sqlite3_context,
            _n: c_int,
            argv: *mut *mut sqlite3_value,
        ) {
            xfunc_guard(ctx, $label, || {
                let Some(b) = get_blob(argv, 0) else {
                    set_null(ctx);
                    return;
                };
                let Some(n) = require_i32_arg(ctx, argv, 1, $label, $arg_name) else {
                    return;
                };
                match ($func)(b, n) {
                    Ok(v) => set_blob(ctx, &v),
                    Err(e) => set_error(ctx, &format!(concat!($label, ": {}"), e)),
                }
            });
        }
    };
}

/// text + optional SRID → blob
macro_rules! xfunc_text_optsrid_blob {
    ($name1:ident, $name2:ident, $label:expr, $func:expr) => {
        unsafe extern "C" fn $name1(
            ctx: *mut sqlite3_context,
            _n: c_int,
            argv: *mut *mut sqlite3_value,
        ) {
            xfunc_guard(ctx, $label, || {
                let Some(t) = require_text_arg(ctx, argv, 0, $label, "wkt") else {
                    return;
                };
                match $func(t, None) {
                    Ok(v) => set_blob(ctx, &v),
                    Err(e) => set_error(ctx, &format!(concat!($label, ": {}"), e)),
                }
            });
        }
        unsafe extern "C" fn $name2(
            ctx: *mut sqlite3_context,
            _n: c_int,
            argv: *mut *mut sqlite3_value,
        ) {
            xfunc_guard(ctx, $label, || {
                let Some(t) = require_text_arg(ctx, argv, 0, $label, "wkt") else {
                    return;
                };
                let Some(srid) = require_i32_arg(ctx, argv, 1, $label, "srid") else {
                    return;
                };
                match $func(t, Some(srid)) {
                    Ok(v) => set_blob(ctx, &v),
                    Err(e) => set_error(ctx, &format!(concat!($label, ": {}"), e)),
                }
            });
        }
    };
}

// ── Constructor callbacks ────────────────────────────────────────────────────

xfunc_text_optsrid_blob!(
    st_geomfromtext_1_xfunc,
    st_geomfromtext_2_xfunc,
    "ST_GeomFromText",
    geom_from_text
);

unsafe fn st_point_impl(ctx: *mut sqlite3_context, argv: *mut *mut sqlite3_value, with_srid: bool) {
    let arg_count = if with_srid { 3 } else { 2 };
    if any_arg_is_null(argv, arg_count) {
        set_null(ctx);
        return;
    }

    let Some(x) = require_f64_arg(ctx, argv, 0, "ST_Point", "x") else {
        return;
    };
    let Some(y) = require_f64_arg(ctx, argv, 1, "ST_Point", "y") else {
        return;
    };
    let Some(srid) = optional_srid_arg(ctx, argv, with_srid, 2, "ST_Point") else {
        return;
    };

    match st_point(x, y, srid) {
        Ok(v) => set_blob(ctx, &v),
        Err(e) => set_error(ctx, &format!("ST_Point: {e}")),
    }
}

unsafe extern "C" fn st_point_2_xfunc(
    ctx: *mut sqlite3_context,
    _n: c_int,
    argv: *mut *mut sqlite3_value,
) {
    xfunc_guard(ctx, "ST_Point", || {
        st_point_impl(ctx, argv, false);
    });
}

unsafe extern "C" fn st_point_3_xfunc(
    ctx: *mut sqlite3_context,
    _n: c_int,
    argv: *mut *mut sqlite3_value,
) {
    xfunc_guard(ctx, "ST_Point", || {
        st_point_impl(ctx, argv, true);
    });
}

// ── Accessor callbacks ───────────────────────────────────────────────────────

xfunc_blob!(st_isempty_xfunc, "ST_IsEmpty", st_is_empty, set_bool);
xfunc_blob!(st_srid_xfunc, "ST_SRID", st_srid, set_i32);
xfunc_blob_i32_blob!(st_setsrid_xfunc, "ST_SetSRID", "srid", st_set_srid);
xfunc_blob!(
    st_geometrytype_xfunc,
    "ST_GeometryType",
    st_geometry_type,
    set_text_owned
);
xfunc_blob!(st_ndims_xfunc, "ST_NDims", st_ndims, set_i32);
xfunc_blob!(st_astext_xfunc, "ST_AsText", st_as_text, set_text_owned);

// ── Bounds callbacks ─────────────────────────────────────────────────────────

xfunc_blob_opt_f64!(st_minx_xfunc, "ST_MinX", st_min_x);
xfunc_blob_opt_f64!(st_maxx_xfunc, "ST_MaxX", st_max_x);
xfunc_blob_opt_f64!(st_miny_xfunc, "ST_MinY", st_min_y);
xfunc_blob_opt_f64!(st_maxy_xfunc, "ST_MaxY", st_max_y);
xfunc_blob_opt_f64!(st_minz_xfunc, "ST_MinZ", st_min_z);
xfunc_blob_opt_f64!(st_maxz_xfunc, "ST_MaxZ", st_max_z);
xfunc_blob_opt_f64!(st_minm_xfunc, "ST_MinM", st_min_m);
xfunc_blob_opt_f64!(st_maxm_xfunc, "ST_MaxM", st_max_m);

// ── Statement helpers ────────────────────────────────────────────────────────

fn sql_to_cstring(sql: &str) -> std::result::Result<CString, std::ffi::NulError> {
    CString::new(sql)
}

unsafe fn errmsg(db: *mut sqlite3) -> String {
    let ptr = sqlite3_errmsg(db);
    if ptr.is_null() {
        return "unknown SQLite error".to_string();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Run SQL via `sqlite3_exec`. On failure returns the message from SQLite,
/// freed via `sqlite3_free`.
unsafe fn exec_sql(db: *mut sqlite3, sql: &str) -> Result<(), String> {
    let c_sql = sql_to_cstring(sql)
        .map_err(|_| "internal error: generated SQL contains NUL byte".to_string())?;

    let mut err_msg: *mut std::ffi::c_char = std::ptr::null_mut();
    let rc = sqlite3_exec(db, c_sql.as_ptr(), None, std::ptr::null_mut(), &mut err_msg);

    let result = if rc == SQLITE_OK {
        Ok(())
    } else if err_msg.is_null() {
        Err(format!("SQLite error code {rc}"))
    } else {
        Err(CStr::from_ptr(err_msg).to_string_lossy().into_owned())
    };

    if !err_msg.is_null() {
        sqlite3_free(err_msg.cast());
    }
    result
}

/// Step `sql` once and extract column 0 of the first row, `None` when the
/// statement yields no rows.
unsafe fn query_first<T, F>(db: *mut sqlite3, sql: &str, extract: F) -> Result<Option<T>, String>
where
    F: FnOnce(*mut sqlite3_stmt) -> T,
{
    let c_sql = sql_to_cstring(sql)
        .map_err(|_| "internal error: generated SQL contains NUL byte".to_string())?;
    let mut stmt = std::ptr::null_mut();
    if sqlite3_prepare_v2(db, c_sql.as_ptr(), -1, &mut stmt, std::ptr::null_mut()) != SQLITE_OK {
        return Err(errmsg(db));
    }
    let result = match sqlite3_step(stmt) {
        SQLITE_ROW => Ok(Some(extract(stmt))),
        SQLITE_DONE => Ok(None),
        _ => Err(errmsg(db)),
    };
    sqlite3_finalize(stmt);
    result
}

unsafe fn query_count(db: *mut sqlite3, sql: &str) -> Result<i64, String> {
    Ok(query_first(db, sql, |stmt| sqlite3_column_int64(stmt, 0))?.unwrap_or(0))
}

unsafe fn query_text(db: *mut sqlite3, sql: &str) -> Result<Option<String>, String> {
    let text = query_first(db, sql, |stmt| {
        let ptr = sqlite3_column_text(stmt, 0);
        if ptr.is_null() {
            None
        } else {
            Some(CStr::from_ptr(ptr as _).to_string_lossy().into_owned())
        }
    })?;
    Ok(text.flatten())
}

/// Best-effort rollback; the error that triggered it is what the caller sees.
unsafe fn rollback_savepoint(db: *mut sqlite3, savepoint: &str) {
    let _ = exec_sql(db, &format!("ROLLBACK TO {savepoint}"));
    let _ = exec_sql(db, &format!("RELEASE {savepoint}"));
}

/// Run `body` inside `SAVEPOINT savepoint`, rolling everything back when it
/// fails.
unsafe fn with_savepoint<T, F>(db: *mut sqlite3, savepoint: &str, body: F) -> Result<T, String>
where
    F: FnOnce() -> Result<T, String>,
{
    exec_sql(db, &format!("SAVEPOINT {savepoint}"))?;
    let value = match body() {
        Ok(value) => value,
        Err(e) => {
            rollback_savepoint(db, savepoint);
            return Err(e);
        }
    };
    if let Err(e) = exec_sql(db, &format!("RELEASE {savepoint}")) {
        rollback_savepoint(db, savepoint);
        return Err(e);
    }
    Ok(value)
}

unsafe fn exec_all<I>(db: *mut sqlite3, statements: I) -> Result<(), String>
where
    I: IntoIterator<Item = String>,
{
    for sql in statements {
        exec_sql(db, &sql)?;
    }
    Ok(())
}

// ── Spatial index helpers ────────────────────────────────────────────────────

/// Extract and validate the identifier in arg `i`; `what` names it in errors.
/// On failure, sets an error on `ctx` and returns `None`.
unsafe fn get_identifier<'a>(
    ctx: *mut sqlite3_context,
    argv: *mut *mut sqlite3_value,
    i: usize,
    label: &str,
    what: &str,
) -> Option<&'a str> {
    let value = match get_text(argv, i) {
        SqlTextArg::Value(v) => v,
        SqlTextArg::Null => {
            set_error(ctx, &format!("{label}: {what} name must not be NULL"));
            return None;
        }
        SqlTextArg::InvalidUtf8 => {
            set_error(
                ctx,
                &format!("{label}: {what} name must be valid UTF-8 text"),
            );
            return None;
        }
    };
    let Some(value) = ddl::validate_identifier(value) else {
        set_error(
            ctx,
            &format!("{label}: invalid {what} name (only [a-zA-Z0-9_] allowed)"),
        );
        return None;
    };
    Some(value)
}

/// Extract and validate `(table, column)` identifiers from the first two args.
unsafe fn get_table_column<'a>(
    ctx: *mut sqlite3_context,
    argv: *mut *mut sqlite3_value,
    label: &str,
) -> Option<(&'a str, &'a str)> {
    let table = get_identifier(ctx, argv, 0, label, "table")?;
    let column = get_identifier(ctx, argv, 1, label, "column")?;
    Some((table, column))
}

unsafe fn table_exists(db: *mut sqlite3, table: &str) -> Result<bool, String> {
    Ok(query_count(db, &ddl::count_schema_objects("table", table))? > 0)
}

/// Fail unless `table` exists and has a column named `column`.
unsafe fn require_table_column(db: *mut sqlite3, table: &str, column: &str) -> Result<(), String> {
    if query_count(db, &ddl::count_table_columns(table))? == 0 {
        return Err(format!("no such table: {table}"));
    }
    if query_count(db, &ddl::count_named_columns(table, column))? == 0 {
        return Err(format!("no such column: {table}.{column}"));
    }
    Ok(())
}

/// Feature id column: the single INTEGER PRIMARY KEY column, else rowid.
unsafe fn feature_id_column(db: *mut sqlite3, table: &str) -> Result<String, String> {
    match query_text(db, &ddl::integer_primary_key(table))? {
        Some(name) => match ddl::validate_identifier(&name) {
            Some(name) => Ok(name.to_string()),
            None => Err(format!(
                "unsupported primary key column name {name:?} (only [a-zA-Z0-9_] allowed)"
            )),
        },
        None => Ok(ddl::ROWID.to_string()),
    }
}

unsafe fn is_registered(db: *mut sqlite3, index: &SpatialIndexDdl<'_>) -> Result<bool, String> {
    if !table_exists(db, ddl::EXTENSIONS_TABLE)? {
        return Ok(false);
    }
    Ok(query_count(db, &index.count_registrations())? > 0)
}

fn not_registered(index: &SpatialIndexDdl<'_>) -> String {
    GeoPackError::IndexConsistency {
        table: index.table().to_string(),
        column: index.column().to_string(),
    }
    .to_string()
}

/// Clear and re-seed the R-tree, then (re)install the triggers. Returns the
/// number of indexed rows.
unsafe fn reseed(db: *mut sqlite3, index: &SpatialIndexDdl<'_>) -> Result<i64, String> {
    exec_sql(db, &index.create_rtree())?;
    exec_sql(db, &index.clear_rtree())?;
    exec_sql(db, &index.backfill())?;
    exec_all(db, index.drop_triggers())?;
    exec_all(db, index.triggers())?;
    query_count(db, &index.count_rtree_rows())
}

// ── Spatial index operations ─────────────────────────────────────────────────

unsafe fn create_spatial_index(db: *mut sqlite3, table: &str, column: &str) -> Result<i64, String> {
    require_table_column(db, table, column)?;
    let id_column = feature_id_column(db, table)?;
    let index = SpatialIndexDdl::new(table, column, &id_column);

    let rows = with_savepoint(db, "geopack_create_spatial_index", || {
        exec_sql(db, &ddl::create_extensions_table())?;
        exec_sql(db, &index.register_extension())?;
        if !is_registered(db, &index)? {
            return Err(not_registered(&index));
        }
        reseed(db, &index)
    })?;

    debug!(
        table,
        column,
        id_column = index.id_column(),
        rows,
        "created spatial index"
    );
    Ok(rows)
}

unsafe fn rebuild_spatial_index(db: *mut sqlite3, table: &str, column: &str) -> Result<i64, String> {
    require_table_column(db, table, column)?;
    let id_column = feature_id_column(db, table)?;
    let index = SpatialIndexDdl::new(table, column, &id_column);
    if !is_registered(db, &index)? {
        return Err(not_registered(&index));
    }

    let rows = with_savepoint(db, "geopack_rebuild_spatial_index", || reseed(db, &index))?;

    debug!(table, column, rows, "rebuilt spatial index");
    Ok(rows)
}

unsafe fn drop_spatial_index(db: *mut sqlite3, table: &str, column: &str) -> Result<(), String> {
    let index = SpatialIndexDdl::new(table, column, ddl::ROWID);

    with_savepoint(db, "geopack_drop_spatial_index", || {
        // Triggers first: they reference the R-tree table.
        exec_all(db, index.drop_triggers())?;
        exec_sql(db, &index.drop_rtree())?;
        if table_exists(db, ddl::EXTENSIONS_TABLE)? {
            exec_sql(db, &index.unregister_extension())?;
        }
        Ok(())
    })?;

    debug!(table, column, "dropped spatial index");
    Ok(())
}

unsafe fn has_spatial_index(db: *mut sqlite3, table: &str, column: &str) -> Result<bool, String> {
    let index = SpatialIndexDdl::new(table, column, ddl::ROWID);
    Ok(is_registered(db, &index)? && table_exists(db, &index.rtree_name())?)
}

unsafe fn update_contents_extent(db: *mut sqlite3, table: &str, column: &str) -> Result<i64, String> {
    require_table_column(db, table, column)?;
    if !table_exists(db, ddl::CONTENTS_TABLE)? {
        return Ok(0);
    }
    let index = SpatialIndexDdl::new(table, column, ddl::ROWID);
    let rows = query_count(db, &index.count_contents_rows())?;
    if rows == 0 {
        return Ok(0);
    }
    exec_sql(db, &index.update_contents_extent())?;
    debug!(table, column, rows, "updated contents extent");
    Ok(rows)
}

// ── Feature count operations ─────────────────────────────────────────────────

/// Register `table` in `gpkg_ogr_contents` with its current row count and
/// install the counting triggers. Returns the count.
unsafe fn add_feature_count(db: *mut sqlite3, table: &str) -> Result<i64, String> {
    if !table_exists(db, table)? {
        return Err(format!("no such table: {table}"));
    }
    let counter = FeatureCountDdl::new(table);

    let count = with_savepoint(db, "geopack_add_feature_count", || {
        exec_sql(db, &FeatureCountDdl::create_table())?;
        exec_all(db, counter.reset_count())?;
        exec_all(db, counter.drop_triggers())?;
        exec_all(db, counter.triggers())?;
        query_count(db, &counter.select_count())
    })?;

    debug!(table, count, "added feature count");
    Ok(count)
}

unsafe fn drop_feature_count(db: *mut sqlite3, table: &str) -> Result<(), String> {
    let counter = FeatureCountDdl::new(table);

    with_savepoint(db, "geopack_drop_feature_count", || {
        exec_all(db, counter.drop_triggers())?;
        if table_exists(db, ddl::OGR_CONTENTS_TABLE)? {
            exec_sql(db, &counter.delete_row())?;
        }
        Ok(())
    })?;

    debug!(table, "dropped feature count");
    Ok(())
}

// ── Spatial index callbacks ──────────────────────────────────────────────────

unsafe fn set_created(ctx: *mut sqlite3_context, _rows: i64) {
    set_i32(ctx, 1);
}
unsafe fn set_dropped(ctx: *mut sqlite3_context, _: ()) {
    set_i32(ctx, 1);
}

/// (table, column) → Result<T>, run against the calling connection.
macro_rules! xfunc_table_column {
    ($name:ident, $label:expr, $func:expr, $set:expr) => {
        unsafe extern "C" fn $name(
            ctx: *mut sqlite3_context,
            _n: c_int,
            argv: *mut *mut sqlite3_value,
        ) {
            xfunc_guard(ctx, $label, || {
                let Some((table, column)) = get_table_column(ctx, argv, $label) else {
                    return;
                };
                let db = sqlite3_context_db_handle(ctx);
                match $func(db, table, column) {
                    Ok(v) => $set(ctx, v),
                    Err(e) => set_error(ctx, &format!(concat!($label, ": {}"), e)),
                }
            });
        }
    };
}

xfunc_table_column!(
    create_spatial_index_xfunc,
    "CreateSpatialIndex",
    create_spatial_index,
    set_created
);
xfunc_table_column!(
    rebuild_spatial_index_xfunc,
    "RebuildSpatialIndex",
    rebuild_spatial_index,
    set_i64
);
xfunc_table_column!(
    drop_spatial_index_xfunc,
    "DropSpatialIndex",
    drop_spatial_index,
    set_dropped
);
xfunc_table_column!(
    has_spatial_index_xfunc,
    "HasSpatialIndex",
    has_spatial_index,
    set_bool
);
xfunc_table_column!(
    update_contents_extent_xfunc,
    "UpdateContentsExtent",
    update_contents_extent,
    set_i64
);

/// (table) → Result<T>, run against the calling connection.
macro_rules! xfunc_table {
    ($name:ident, $label:expr, $func:expr, $set:expr) => {
        unsafe extern "C" fn $name(
            ctx: *mut sqlite3_context,
            _n: c_int,
            argv: *mut *mut sqlite3_value,
        ) {
            xfunc_guard(ctx, $label, || {
                let Some(table) = get_identifier(ctx, argv, 0, $label, "table") else {
                    return;
                };
                let db = sqlite3_context_db_handle(ctx);
                match $func(db, table) {
                    Ok(v) => $set(ctx, v),
                    Err(e) => set_error(ctx, &format!(concat!($label, ": {}"), e)),
                }
            });
        }
    };
}

xfunc_table!(
    add_feature_count_xfunc,
    "AddFeatureCount",
    add_feature_count,
    set_i64
);
xfunc_table!(
    drop_feature_count_xfunc,
    "DropFeatureCount",
    drop_feature_count,
    set_dropped
);

// ── Registration ─────────────────────────────────────────────────────────────

unsafe fn reg(
    db: *mut sqlite3,
    name: &str,
    n_arg: c_int,
    flags: c_int,
    xfunc: unsafe extern "C" fn(*mut sqlite3_context, c_int, *mut *mut sqlite3_value),
) -> c_int {
    let c_name = match CString::new(name) {
        Ok(v) => v,
        Err(_) => return SQLITE_ERROR,
    };
    sqlite3_create_function_v2(
        db,
        c_name.as_ptr(),
        n_arg,
        flags,
        std::ptr::null_mut(),
        Some(xfunc),
        None,
        None,
        None,
    )
}

/// Register all geopack functions into an open SQLite database.
///
/// Returns `SQLITE_OK` (0) on success, or the first error code on failure.
///
/// # Safety
/// `db` must be a valid, open SQLite database handle for the lifetime of the call.
pub unsafe fn register_functions(db: *mut sqlite3) -> c_int {
    type XFunc = unsafe extern "C" fn(*mut sqlite3_context, c_int, *mut *mut sqlite3_value);

    let deterministic_callbacks: &[(&str, c_int, XFunc)] = &[
        // Constructors
        ("ST_GeomFromText", 1, st_geomfromtext_1_xfunc),
        ("ST_GeomFromText", 2, st_geomfromtext_2_xfunc),
        ("ST_Point", 2, st_point_2_xfunc),
        ("ST_Point", 3, st_point_3_xfunc),
        // Accessors
        ("ST_IsEmpty", 1, st_isempty_xfunc),
        ("ST_SRID", 1, st_srid_xfunc),
        ("ST_SetSRID", 2, st_setsrid_xfunc),
        ("ST_GeometryType", 1, st_geometrytype_xfunc),
        ("ST_NDims", 1, st_ndims_xfunc),
        ("ST_AsText", 1, st_astext_xfunc),
        // Bounds
        ("ST_MinX", 1, st_minx_xfunc),
        ("ST_MaxX", 1, st_maxx_xfunc),
        ("ST_MinY", 1, st_miny_xfunc),
        ("ST_MaxY", 1, st_maxy_xfunc),
        ("ST_MinZ", 1, st_minz_xfunc),
        ("ST_MaxZ", 1, st_maxz_xfunc),
        ("ST_MinM", 1, st_minm_xfunc),
        ("ST_MaxM", 1, st_maxm_xfunc),
    ];

    if deterministic_callbacks.len() != SQLITE_DETERMINISTIC_FUNCTIONS.len() {
        return SQLITE_ERROR;
    }

    for entry in SQLITE_DETERMINISTIC_FUNCTIONS {
        let Some((_, _, xfunc)) = deterministic_callbacks
            .iter()
            .find(|(name, n_arg, _)| *name == entry.name && *n_arg == entry.n_arg as c_int)
        else {
            return SQLITE_ERROR;
        };

        let rc = reg(db, entry.name, entry.n_arg as c_int, DET, *xfunc);
        if rc != SQLITE_OK {
            return rc;
        }
    }

    let direct_only_callbacks: &[(&str, c_int, XFunc)] = &[
        ("CreateSpatialIndex", 2, create_spatial_index_xfunc),
        ("RebuildSpatialIndex", 2, rebuild_spatial_index_xfunc),
        ("DropSpatialIndex", 2, drop_spatial_index_xfunc),
        ("HasSpatialIndex", 2, has_spatial_index_xfunc),
        ("UpdateContentsExtent", 2, update_contents_extent_xfunc),
        ("AddFeatureCount", 1, add_feature_count_xfunc),
        ("DropFeatureCount", 1, drop_feature_count_xfunc),
    ];

    if direct_only_callbacks.len() != SQLITE_DIRECT_ONLY_FUNCTIONS.len() {
        return SQLITE_ERROR;
    }

    for entry in SQLITE_DIRECT_ONLY_FUNCTIONS {
        let Some((_, _, xfunc)) = direct_only_callbacks
            .iter()
            .find(|(name, n_arg, _)| *name == entry.name && *n_arg == entry.n_arg as c_int)
        else {
            return SQLITE_ERROR;
        };

        let rc = reg(db, entry.name, entry.n_arg as c_int, DIRECT, *xfunc);
        if rc != SQLITE_OK {
            return rc;
        }
    }

    debug!(
        deterministic = SQLITE_DETERMINISTIC_FUNCTIONS.len(),
        direct_only = SQLITE_DIRECT_ONLY_FUNCTIONS.len(),
        "registered geopack functions"
    );
    SQLITE_OK
}

// ── C entry point for loadable extension (native only) ───────────────────────

/// `sqlite3_geopack_init` is the entry point called by SQLite when loading
/// this library as a loadable extension (`.load_extension('geopack')`).
#[cfg(not(target_arch = "wasm32"))]
#[no_mangle]
pub unsafe extern "C" fn sqlite3_geopack_init(
    db: *mut sqlite3,
    _pz_err_msg: *mut *mut std::ffi::c_char,
    _p_api: *mut sqlite3_api_routines,
) -> c_int {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| register_functions(db))) {
        Ok(rc) => rc,
        Err(_) => SQLITE_ERROR,
    }
}

/// Compatibility entry point name expected by SQLite's default loader rules for
/// libraries named like `libgeopack_sqlite`.
#[cfg(not(target_arch = "wasm32"))]
#[no_mangle]
pub unsafe extern "C" fn sqlite3_geopacksqlite_init(
    db: *mut sqlite3,
    pz_err_msg: *mut *mut std::ffi::c_char,
    p_api: *mut sqlite3_api_routines,
) -> c_int {
    sqlite3_geopack_init(db, pz_err_msg, p_api)
}
