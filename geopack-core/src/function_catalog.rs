//! Canonical SQLite function catalog shared across adapters.

/// Canonical SQLite function declaration metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteFunctionSpec {
    pub name: &'static str,
    pub n_arg: i32,
}

/// Pure functions over geometry blobs, safe to use from triggers and views.
pub const SQLITE_DETERMINISTIC_FUNCTIONS: &[SqliteFunctionSpec] = &[
    // Constructors
    SqliteFunctionSpec {
        name: "ST_GeomFromText",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_GeomFromText",
        n_arg: 2,
    },
    SqliteFunctionSpec {
        name: "ST_Point",
        n_arg: 2,
    },
    SqliteFunctionSpec {
        name: "ST_Point",
        n_arg: 3,
    },
    // Accessors
    SqliteFunctionSpec {
        name: "ST_IsEmpty",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_SRID",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_SetSRID",
        n_arg: 2,
    },
    SqliteFunctionSpec {
        name: "ST_GeometryType",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_NDims",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_AsText",
        n_arg: 1,
    },
    // Bounds
    SqliteFunctionSpec {
        name: "ST_MinX",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_MaxX",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_MinY",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_MaxY",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_MinZ",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_MaxZ",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_MinM",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "ST_MaxM",
        n_arg: 1,
    },
];

/// Spatial index and feature count management, callable only from top-level
/// SQL.
pub const SQLITE_DIRECT_ONLY_FUNCTIONS: &[SqliteFunctionSpec] = &[
    SqliteFunctionSpec {
        name: "CreateSpatialIndex",
        n_arg: 2,
    },
    SqliteFunctionSpec {
        name: "RebuildSpatialIndex",
        n_arg: 2,
    },
    SqliteFunctionSpec {
        name: "DropSpatialIndex",
        n_arg: 2,
    },
    SqliteFunctionSpec {
        name: "HasSpatialIndex",
        n_arg: 2,
    },
    SqliteFunctionSpec {
        name: "UpdateContentsExtent",
        n_arg: 2,
    },
    // Feature counts
    SqliteFunctionSpec {
        name: "AddFeatureCount",
        n_arg: 1,
    },
    SqliteFunctionSpec {
        name: "DropFeatureCount",
        n_arg: 1,
    },
];
