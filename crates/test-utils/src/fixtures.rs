//! Common test fixtures for hazard tests.
//!
//! This module provides pre-defined locations and input tables that
//! represent common scenarios.

/// Common bounding boxes as `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Florida peninsula
    pub const FLORIDA: (f64, f64, f64, f64) = (-82.5, 25.0, -80.0, 28.0);

    /// Gulf of Mexico coast
    pub const GULF_COAST: (f64, f64, f64, f64) = (-97.5, 26.0, -82.0, 30.5);

    /// A box a few cells wide
    pub const SMALL_BOX: (f64, f64, f64, f64) = (-80.3, 25.7, -80.1, 25.9);

    /// Single point (degenerate bbox)
    pub const POINT: (f64, f64, f64, f64) = (0.0, 0.0, 0.0, 0.0);
}

/// Named locations as `(lat, lon)`.
pub mod locations {
    pub const MIAMI: (f64, f64) = (25.7617, -80.1918);
    pub const HOUSTON: (f64, f64) = (29.7604, -95.3698);
    pub const MANILA: (f64, f64) = (14.5995, 120.9842);
    pub const SUVA: (f64, f64) = (-18.1248, 178.4501);
}

/// Location tables as the CLI reads them.
pub mod csv {
    /// Canonical column names with location ids.
    pub const LOCATIONS: &str = "\
location_id,latitude,longitude
miami,25.7617,-80.1918
houston,29.7604,-95.3698
manila,14.5995,120.9842
";

    /// Alias column names without location ids.
    pub const ALIASED: &str = "\
Lat,Lon,elevation
25.7617,-80.1918,2
29.7604,-95.3698,15
";

    /// Duplicate location ids.
    pub const DUPLICATE_IDS: &str = "\
id,lat,lon
a,25.0,-80.0
a,26.0,-81.0
";

    /// No recognizable longitude column.
    pub const MISSING_LON: &str = "\
lat,long
25.0,-80.0
";
}
