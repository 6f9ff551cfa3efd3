macro_rules! define_shared_cases {
    ($test_attr:meta) => {
// ── Geometry functions ───────────────────────────────────────────────────────

// POINT Z (1 2 3), little-endian, no envelope, SRS id 0.
const POINT_Z_BLOB: &str = "X'475000010000000001E9030000000000000000F03F00000000000000400000000000000840'";

// LINESTRING M (0 1 100, 2 -3 50), big-endian, XY-only envelope, SRS id 4326.
const LINESTRING_M_BLOB: &str = "X'47500002000010E600000000000000004000000000000000C0080000000000003FF000000000000000000007D20000000200000000000000003FF000000000000040590000000000004000000000000000C0080000000000004049000000000000'";

#[$test_attr]
fn point_bounds_degenerate_to_the_point() {
    let db = ActiveTestDb::open();
    assert_eq!(db.query_f64("SELECT ST_MinX(ST_Point(1.5, -2))"), 1.5);
    assert_eq!(db.query_f64("SELECT ST_MaxX(ST_Point(1.5, -2))"), 1.5);
    assert_eq!(db.query_f64("SELECT ST_MinY(ST_Point(1.5, -2))"), -2.0);
    assert_eq!(db.query_f64("SELECT ST_MaxY(ST_Point(1.5, -2))"), -2.0);
    assert!(db.query_is_null("SELECT ST_MinZ(ST_Point(1.5, -2))"));
}

#[$test_attr]
fn null_in_null_out() {
    let db = ActiveTestDb::open();
    assert!(db.query_is_null("SELECT ST_MinX(NULL)"));
    assert!(db.query_is_null("SELECT ST_IsEmpty(NULL)"));
    assert!(db.query_is_null("SELECT ST_SRID(NULL)"));
    assert!(db.query_is_null("SELECT ST_Point(NULL, 1)"));
    assert!(db.query_is_null("SELECT ST_GeomFromText(NULL)"));
}

#[$test_attr]
fn empty_geometries_have_null_bounds() {
    let db = ActiveTestDb::open();
    for wkt in ["POINT EMPTY", "LINESTRING Z EMPTY", "POLYGON EMPTY", "MULTIPOLYGON ZM EMPTY"] {
        let blob = format!("ST_GeomFromText('{wkt}')");
        assert_eq!(db.query_i64(&format!("SELECT ST_IsEmpty({blob})")), 1, "{wkt}");
        assert!(db.query_is_null(&format!("SELECT ST_MinX({blob})")), "{wkt}");
        assert!(db.query_is_null(&format!("SELECT ST_MaxY({blob})")), "{wkt}");
    }
    assert_eq!(db.query_i64("SELECT ST_IsEmpty(ST_Point(0, 0))"), 0);
}

#[$test_attr]
fn geometry_type_and_dimensions() {
    let db = ActiveTestDb::open();
    assert_eq!(
        db.query_text("SELECT ST_GeometryType(ST_GeomFromText('LINESTRING Z EMPTY'))"),
        "LINESTRING Z"
    );
    assert_eq!(
        db.query_i64("SELECT ST_NDims(ST_GeomFromText('MULTIPOINT ZM EMPTY'))"),
        4
    );
    assert_eq!(db.query_text(&format!("SELECT ST_GeometryType({POINT_Z_BLOB})")), "POINT Z");
    assert_eq!(db.query_i64(&format!("SELECT ST_NDims({POINT_Z_BLOB})")), 3);
}

#[$test_attr]
fn z_and_m_bounds() {
    let db = ActiveTestDb::open();
    assert_eq!(db.query_f64(&format!("SELECT ST_MinZ({POINT_Z_BLOB})")), 3.0);
    assert_eq!(db.query_f64(&format!("SELECT ST_MaxZ({POINT_Z_BLOB})")), 3.0);
    assert!(db.query_is_null(&format!("SELECT ST_MinM({POINT_Z_BLOB})")));

    // The header envelope is XY only; M bounds come from the coordinates.
    assert_eq!(db.query_text(&format!("SELECT ST_GeometryType({LINESTRING_M_BLOB})")), "LINESTRING M");
    assert_eq!(db.query_i64(&format!("SELECT ST_SRID({LINESTRING_M_BLOB})")), 4326);
    assert_eq!(db.query_f64(&format!("SELECT ST_MinY({LINESTRING_M_BLOB})")), -3.0);
    assert_eq!(db.query_f64(&format!("SELECT ST_MinM({LINESTRING_M_BLOB})")), 50.0);
    assert_eq!(db.query_f64(&format!("SELECT ST_MaxM({LINESTRING_M_BLOB})")), 100.0);
    assert!(db.query_is_null(&format!("SELECT ST_MaxZ({LINESTRING_M_BLOB})")));
}

#[$test_attr]
fn srid_round_trip() {
    let db = ActiveTestDb::open();
    assert_eq!(db.query_i64("SELECT ST_SRID(ST_Point(1, 2))"), 0);
    assert_eq!(db.query_i64("SELECT ST_SRID(ST_Point(1, 2, 3857))"), 3857);
    assert_eq!(db.query_i64("SELECT ST_SRID(ST_SetSRID(ST_Point(1, 2), 4326))"), 4326);
    assert_eq!(
        db.query_i64("SELECT ST_SRID(ST_GeomFromText('POINT(1 2)', 4326))"),
        4326
    );
}

#[$test_attr]
fn wkt_output() {
    let db = ActiveTestDb::open();
    assert_eq!(
        db.query_text("SELECT ST_AsText(ST_GeomFromText('POINT EMPTY'))"),
        "POINT EMPTY"
    );
    let wkt = db.query_text("SELECT ST_AsText(ST_GeomFromText('POLYGON((0 0,1 0,1 1,0 1,0 0))'))");
    assert!(wkt.starts_with("POLYGON"), "got: {wkt}");
}

#[$test_attr]
fn malformed_blobs_raise_format_errors() {
    let db = ActiveTestDb::open();
    let err = db
        .try_query_i64("SELECT ST_SRID(X'0102')")
        .expect_err("two bytes are not a geometry");
    assert!(err.contains("ST_SRID: malformed geometry blob at byte 0"), "got: {err}");

    // Version 1 is not supported.
    let err = db
        .try_query_i64("SELECT ST_IsEmpty(X'475001010000000001010000000000000000F03F0000000000000040')")
        .expect_err("unsupported version");
    assert!(err.contains("malformed geometry blob at byte 2"), "got: {err}");
}

#[$test_attr]
fn invalid_arguments_are_rejected() {
    let db = ActiveTestDb::open();
    let err = db
        .try_query_i64("SELECT ST_Point('a', 1)")
        .expect_err("text x");
    assert!(err.contains("ST_Point: x must be numeric"), "got: {err}");

    let err = db
        .try_query_i64("SELECT ST_SetSRID(ST_Point(1, 2), 1.5)")
        .expect_err("fractional srid");
    assert!(err.contains("ST_SetSRID: srid must be integer"), "got: {err}");
}

#[$test_attr]
fn geometry_collections_are_unsupported() {
    let db = ActiveTestDb::open();
    let err = db
        .try_query_i64("SELECT ST_GeomFromText('GEOMETRYCOLLECTION(POINT(1 2))')")
        .expect_err("collections are not stored");
    assert!(err.contains("unsupported geometry type code 7"), "got: {err}");
}

// ── Spatial Index tests ──────────────────────────────────────────────────────

#[$test_attr]
fn spatial_index_create_query_drop() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE places (id INTEGER PRIMARY KEY, geom BLOB)");
    db.exec(
        "INSERT INTO places (geom) VALUES (ST_GeomFromText('POINT(1 2)')),\
         (ST_GeomFromText('POINT(3 4)')),\
         (ST_GeomFromText('POINT(5 6)'))",
    );

    let rc = db.query_i64("SELECT CreateSpatialIndex('places', 'geom')");
    assert_eq!(rc, 1);

    let count = db.query_i64("SELECT COUNT(*) FROM rtree_places_geom");
    assert_eq!(count, 3);

    let hits = db.query_all_i64(
        "SELECT id FROM rtree_places_geom WHERE minx >= 2 AND maxx <= 6 AND miny >= 3 AND maxy <= 7 ORDER BY id",
    );
    assert_eq!(hits, vec![2, 3]);

    let rc = db.query_i64("SELECT DropSpatialIndex('places', 'geom')");
    assert_eq!(rc, 1);

    let count = db.query_i64("SELECT COUNT(*) FROM sqlite_master WHERE name LIKE 'rtree_places_geom%'");
    assert_eq!(count, 0, "R-tree and triggers should be gone");
}

#[$test_attr]
fn spatial_index_create_idempotent() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE pts (id INTEGER PRIMARY KEY, geom BLOB)");
    db.exec(
        "INSERT INTO pts (geom) VALUES (ST_Point(1, 2)), (ST_Point(3, 4)), (ST_Point(5, 6))",
    );

    let rc = db.query_i64("SELECT CreateSpatialIndex('pts', 'geom')");
    assert_eq!(rc, 1);
    let rc = db.query_i64("SELECT CreateSpatialIndex('pts', 'geom')");
    assert_eq!(rc, 1);

    // No duplicate rows after repeated create.
    let count = db.query_i64("SELECT COUNT(*) FROM rtree_pts_geom");
    assert_eq!(count, 3);
    let registrations = db.query_i64("SELECT COUNT(*) FROM gpkg_extensions");
    assert_eq!(registrations, 1);
}

#[$test_attr]
fn spatial_index_registers_extension() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE roads (fid INTEGER PRIMARY KEY, geom BLOB)");
    assert_eq!(db.query_i64("SELECT HasSpatialIndex('roads', 'geom')"), 0);

    db.exec("SELECT CreateSpatialIndex('roads', 'geom')");
    assert_eq!(db.query_i64("SELECT HasSpatialIndex('roads', 'geom')"), 1);
    assert_eq!(
        db.query_text(
            "SELECT extension_name FROM gpkg_extensions \
             WHERE table_name = 'roads' AND column_name = 'geom'"
        ),
        "gpkg_rtree_index"
    );
    assert_eq!(
        db.query_text("SELECT scope FROM gpkg_extensions WHERE table_name = 'roads'"),
        "write-only"
    );
    assert_eq!(
        db.query_text("SELECT definition FROM gpkg_extensions WHERE table_name = 'roads'"),
        "http://www.geopackage.org/spec120/#extension_rtree"
    );

    db.exec("SELECT DropSpatialIndex('roads', 'geom')");
    assert_eq!(db.query_i64("SELECT HasSpatialIndex('roads', 'geom')"), 0);
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM gpkg_extensions"), 0);
}

#[$test_attr]
fn spatial_index_lifecycle() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE features (id INTEGER PRIMARY KEY, geom BLOB)");
    db.exec("SELECT CreateSpatialIndex('features', 'geom')");

    db.exec("INSERT INTO features (id, geom) VALUES (1, ST_Point(10, 10)), (2, ST_Point(5, 5))");
    assert_eq!(
        db.query_text(
            "SELECT id || ',' || minx || ',' || maxx || ',' || miny || ',' || maxy \
             FROM rtree_features_geom WHERE id = 1"
        ),
        "1,10.0,10.0,10.0,10.0"
    );

    db.exec("UPDATE features SET geom = ST_Point(20, 20) WHERE id = 1");
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM rtree_features_geom WHERE id = 1"), 1);
    assert_eq!(db.query_f64("SELECT minx FROM rtree_features_geom WHERE id = 1"), 20.0);
    assert_eq!(db.query_f64("SELECT maxy FROM rtree_features_geom WHERE id = 1"), 20.0);

    db.exec("UPDATE features SET geom = NULL WHERE id = 1");
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM rtree_features_geom WHERE id = 1"), 0);

    db.exec("DELETE FROM features WHERE id = 2");
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM rtree_features_geom WHERE id = 2"), 0);
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM rtree_features_geom"), 0);
}

#[$test_attr]
fn spatial_index_follows_feature_id_changes() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE features (fid INTEGER PRIMARY KEY, geom BLOB)");
    db.exec("INSERT INTO features (fid, geom) VALUES (2, ST_Point(3, 4))");
    db.exec("SELECT CreateSpatialIndex('features', 'geom')");

    db.exec("UPDATE features SET fid = 7 WHERE fid = 2");
    assert_eq!(db.query_all_i64("SELECT id FROM rtree_features_geom"), vec![7]);
    assert_eq!(db.query_f64("SELECT minx FROM rtree_features_geom WHERE id = 7"), 3.0);
}

#[$test_attr]
fn spatial_index_uses_rowid_without_integer_primary_key() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE named (name TEXT PRIMARY KEY, geom BLOB)");
    db.exec("INSERT INTO named (name, geom) VALUES ('a', ST_Point(1, 1)), ('b', ST_Point(2, 2))");
    db.exec("SELECT CreateSpatialIndex('named', 'geom')");

    let ids = db.query_all_i64("SELECT id FROM rtree_named_geom ORDER BY id");
    let rowids = db.query_all_i64("SELECT rowid FROM named ORDER BY rowid");
    assert_eq!(ids, rowids);

    db.exec("INSERT INTO named (name, geom) VALUES ('c', ST_Point(3, 3))");
    db.exec("DELETE FROM named WHERE name = 'a'");
    let ids = db.query_all_i64("SELECT id FROM rtree_named_geom ORDER BY id");
    let rowids = db.query_all_i64("SELECT rowid FROM named ORDER BY rowid");
    assert_eq!(ids, rowids);
}

#[$test_attr]
fn spatial_index_follows_rowid_changes() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE p (name TEXT, geom BLOB)");
    db.exec("SELECT CreateSpatialIndex('p', 'geom')");
    db.exec("INSERT INTO p (name, geom) VALUES ('a', ST_Point(10, 10))");
    assert_eq!(db.query_all_i64("SELECT id FROM rtree_p_geom"), vec![1]);

    db.exec("UPDATE p SET rowid = 7");
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM rtree_p_geom WHERE id = 1"), 0);
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM rtree_p_geom WHERE id = 7"), 1);

    // Updates touching neither the rowid nor the geometry leave the index alone.
    db.exec("UPDATE p SET name = 'b'");
    assert_eq!(db.query_all_i64("SELECT id FROM rtree_p_geom"), vec![7]);
    assert_eq!(db.query_f64("SELECT maxy FROM rtree_p_geom WHERE id = 7"), 10.0);
}

#[$test_attr]
fn spatial_index_create_rolls_back_when_population_fails() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE broken (id INTEGER PRIMARY KEY, geom INTEGER)");
    db.exec("INSERT INTO broken (geom) VALUES (42)");

    let err = db
        .try_query_i64("SELECT CreateSpatialIndex('broken', 'geom')")
        .expect_err("index creation should fail for invalid geometry payloads");
    assert!(
        err.contains("malformed geometry blob"),
        "unexpected error message: {err}"
    );
    assert!(
        !err.to_ascii_uppercase().contains("ROLLBACK"),
        "original populate error should not be overwritten by rollback errors: {err}"
    );

    let leftovers = db.query_i64(
        "SELECT COUNT(*) FROM sqlite_master WHERE name LIKE 'rtree_broken_geom%' OR name = 'gpkg_extensions'",
    );
    assert_eq!(leftovers, 0, "failed create should leave no schema objects behind");
}

#[$test_attr]
fn spatial_index_drop_rolls_back_when_drop_table_fails() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE broken (id INTEGER PRIMARY KEY, geom BLOB)");

    // Object with the R-tree's name that DROP TABLE cannot remove.
    db.exec("CREATE VIEW rtree_broken_geom AS SELECT 1 AS id, 0.0 AS minx, 0.0 AS maxx, 0.0 AS miny, 0.0 AS maxy");
    db.exec("CREATE TRIGGER rtree_broken_geom_insert AFTER INSERT ON broken BEGIN SELECT 1; END");
    db.exec("CREATE TRIGGER rtree_broken_geom_update AFTER UPDATE OF geom ON broken BEGIN SELECT 1; END");
    db.exec("CREATE TRIGGER rtree_broken_geom_delete AFTER DELETE ON broken BEGIN SELECT 1; END");

    let err = db
        .try_query_i64("SELECT DropSpatialIndex('broken', 'geom')")
        .expect_err("dropping a view with DROP TABLE should fail");
    assert!(err.contains("DROP VIEW"), "unexpected error message: {err}");

    let trigger_count = db.query_i64(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'trigger' AND name LIKE 'rtree_broken_geom_%'",
    );
    assert_eq!(trigger_count, 3, "all triggers should remain after rollback");
}

#[$test_attr]
fn spatial_index_rebuild() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE pts (id INTEGER PRIMARY KEY, geom BLOB)");
    db.exec("INSERT INTO pts (geom) VALUES (ST_Point(1, 2)), (ST_Point(3, 4)), (NULL)");

    let err = db
        .try_query_i64("SELECT RebuildSpatialIndex('pts', 'geom')")
        .expect_err("rebuild needs a registered index");
    assert!(
        err.contains("spatial index for pts.geom is not registered"),
        "unexpected error message: {err}"
    );

    db.exec("SELECT CreateSpatialIndex('pts', 'geom')");
    db.exec("DELETE FROM rtree_pts_geom");
    assert_eq!(db.query_i64("SELECT RebuildSpatialIndex('pts', 'geom')"), 2);
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM rtree_pts_geom"), 2);

    // Triggers are still in place after a rebuild.
    db.exec("INSERT INTO pts (geom) VALUES (ST_Point(9, 9))");
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM rtree_pts_geom"), 3);
}

#[$test_attr]
fn spatial_index_trigger_rejects_malformed_geometry() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE t (id INTEGER PRIMARY KEY, geom BLOB)");
    db.exec("SELECT CreateSpatialIndex('t', 'geom')");

    let err = db
        .try_exec("INSERT INTO t (geom) VALUES (X'0102')")
        .expect_err("trigger should surface the format error");
    assert!(err.contains("malformed geometry blob"), "unexpected error message: {err}");
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM t"), 0);
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM rtree_t_geom"), 0);
}

#[$test_attr]
fn spatial_index_narrows_candidates() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE grid (id INTEGER PRIMARY KEY, geom BLOB)");

    // 100 points in a 10×10 grid: (0,0) through (9,9)
    for x in 0..10 {
        for y in 0..10 {
            db.exec(&format!(
                "INSERT INTO grid (geom) VALUES (ST_Point({x}, {y}))"
            ));
        }
    }
    db.exec("SELECT CreateSpatialIndex('grid', 'geom')");

    let full_scan = db.query_i64("SELECT COUNT(*) FROM grid");
    assert_eq!(full_scan, 100);

    // bbox [1.5,1.5 → 3.5,3.5] holds (2,2),(2,3),(3,2),(3,3)
    let rtree_hits = db.query_all_i64(
        "SELECT g.id FROM grid g \
         JOIN rtree_grid_geom r ON g.id = r.id \
         WHERE r.minx >= 1.5 AND r.maxx <= 3.5 AND r.miny >= 1.5 AND r.maxy <= 3.5",
    );
    assert_eq!(rtree_hits.len(), 4);
}

#[$test_attr]
fn spatial_index_ignores_empty_geometries() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE empties (id INTEGER PRIMARY KEY, geom BLOB)");
    db.exec(
        "INSERT INTO empties (id, geom) VALUES \
         (1, ST_Point(1, 2)), \
         (2, ST_GeomFromText('POLYGON EMPTY')), \
         (3, ST_GeomFromText('MULTIPOINT EMPTY'))",
    );

    let rc = db.query_i64("SELECT CreateSpatialIndex('empties', 'geom')");
    assert_eq!(rc, 1);

    let count = db.query_i64("SELECT COUNT(*) FROM rtree_empties_geom");
    assert_eq!(count, 1, "only non-empty geometries should be indexed");

    db.exec("UPDATE empties SET geom = ST_GeomFromText('POINT EMPTY') WHERE id = 1");
    let count = db.query_i64("SELECT COUNT(*) FROM rtree_empties_geom");
    assert_eq!(count, 0, "row should be removed when geometry becomes empty");

    db.exec("UPDATE empties SET geom = ST_Point(5, 6) WHERE id = 2");
    let count = db.query_i64("SELECT COUNT(*) FROM rtree_empties_geom");
    assert_eq!(count, 1, "row should be indexed when geometry becomes non-empty");
}

#[$test_attr]
fn spatial_index_rejects_invalid_names() {
    let db = ActiveTestDb::open();

    // SQL injection attempt
    let res = db.try_query_i64("SELECT CreateSpatialIndex('places; DROP TABLE x', 'geom')");
    assert!(res.is_err(), "should reject: {res:?}");

    let res = db.try_query_i64("SELECT CreateSpatialIndex('', 'geom')");
    assert!(res.is_err(), "should reject empty: {res:?}");

    let res = db.try_query_i64("SELECT CreateSpatialIndex('my table', 'geom')");
    assert!(res.is_err(), "should reject spaces: {res:?}");

    let res = db.try_query_i64("SELECT DropSpatialIndex('ok', 'col name')");
    assert!(res.is_err(), "should reject spaces in col: {res:?}");

    let res = db.try_query_i64("SELECT HasSpatialIndex('ok', 'x''y')");
    assert!(res.is_err(), "should reject quotes: {res:?}");
}

#[$test_attr]
fn spatial_index_requires_existing_table_and_column() {
    let db = ActiveTestDb::open();
    let err = db
        .try_query_i64("SELECT CreateSpatialIndex('missing', 'geom')")
        .expect_err("missing table");
    assert!(err.contains("no such table: missing"), "got: {err}");

    db.exec("CREATE TABLE t (id INTEGER PRIMARY KEY, shape BLOB)");
    let err = db
        .try_query_i64("SELECT CreateSpatialIndex('t', 'geom')")
        .expect_err("missing column");
    assert!(err.contains("no such column: t.geom"), "got: {err}");
}

#[$test_attr]
fn spatial_index_drop_idempotent() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE pts (id INTEGER PRIMARY KEY, geom BLOB)");
    db.exec("SELECT CreateSpatialIndex('pts', 'geom')");

    let rc = db.query_i64("SELECT DropSpatialIndex('pts', 'geom')");
    assert_eq!(rc, 1);

    let rc = db.query_i64("SELECT DropSpatialIndex('pts', 'geom')");
    assert_eq!(rc, 1);
}

// ── Feature counts ───────────────────────────────────────────────────────────

#[$test_attr]
fn feature_count_tracks_inserts_and_deletes() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE roads (fid INTEGER PRIMARY KEY, geom BLOB)");
    db.exec("INSERT INTO roads (geom) VALUES (ST_Point(1, 1)), (ST_Point(2, 2))");

    assert_eq!(db.query_i64("SELECT AddFeatureCount('roads')"), 2);
    assert_eq!(
        db.query_i64("SELECT feature_count FROM gpkg_ogr_contents WHERE table_name = 'roads'"),
        2
    );

    db.exec("INSERT INTO roads (geom) VALUES (ST_Point(3, 3)), (NULL)");
    db.exec("DELETE FROM roads WHERE fid = 1");
    assert_eq!(
        db.query_i64("SELECT feature_count FROM gpkg_ogr_contents WHERE table_name = 'roads'"),
        3
    );

    // Adding again recounts instead of duplicating the row.
    assert_eq!(db.query_i64("SELECT AddFeatureCount('roads')"), 3);
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM gpkg_ogr_contents"), 1);

    assert_eq!(db.query_i64("SELECT DropFeatureCount('roads')"), 1);
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM gpkg_ogr_contents"), 0);
    assert_eq!(
        db.query_i64(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'trigger' AND name LIKE '%feature_count%'"
        ),
        0
    );
    db.exec("INSERT INTO roads (geom) VALUES (ST_Point(4, 4))");
    assert_eq!(db.query_i64("SELECT DropFeatureCount('roads')"), 1);
}

#[$test_attr]
fn feature_count_requires_existing_table() {
    let db = ActiveTestDb::open();
    let err = db
        .try_query_i64("SELECT AddFeatureCount('missing')")
        .expect_err("missing table");
    assert!(err.contains("no such table: missing"), "got: {err}");

    let err = db
        .try_query_i64("SELECT AddFeatureCount('a; DROP TABLE b')")
        .expect_err("invalid name");
    assert!(err.contains("invalid table name"), "got: {err}");
    assert_eq!(
        db.query_i64("SELECT COUNT(*) FROM sqlite_master WHERE name = 'gpkg_ogr_contents'"),
        0
    );
}

// ── Contents extent ──────────────────────────────────────────────────────────

#[$test_attr]
fn update_contents_extent_from_observed_envelopes() {
    let db = ActiveTestDb::open();
    db.exec("CREATE TABLE parcels (id INTEGER PRIMARY KEY, geom BLOB)");
    db.exec(
        "INSERT INTO parcels (geom) VALUES \
         (ST_GeomFromText('POLYGON((0 0,4 0,4 3,0 3,0 0))')), \
         (ST_Point(10, -2)), \
         (ST_GeomFromText('POINT EMPTY')), \
         (NULL)",
    );

    // No gpkg_contents table yet.
    assert_eq!(db.query_i64("SELECT UpdateContentsExtent('parcels', 'geom')"), 0);

    db.exec(
        "CREATE TABLE gpkg_contents (table_name TEXT PRIMARY KEY, data_type TEXT, \
         min_x DOUBLE, min_y DOUBLE, max_x DOUBLE, max_y DOUBLE, srs_id INTEGER)",
    );
    // No contents row for the table.
    assert_eq!(db.query_i64("SELECT UpdateContentsExtent('parcels', 'geom')"), 0);

    db.exec("INSERT INTO gpkg_contents (table_name, data_type) VALUES ('parcels', 'features')");
    assert_eq!(db.query_i64("SELECT UpdateContentsExtent('parcels', 'geom')"), 1);
    assert_eq!(db.query_f64("SELECT min_x FROM gpkg_contents"), 0.0);
    assert_eq!(db.query_f64("SELECT max_x FROM gpkg_contents"), 10.0);
    assert_eq!(db.query_f64("SELECT min_y FROM gpkg_contents"), -2.0);
    assert_eq!(db.query_f64("SELECT max_y FROM gpkg_contents"), 3.0);
}
    };
}
