/// Column-name constants for zonecast table schemas.
/// Single source of truth - exported to Python via PyO3.

// ── Zone columns ────────────────────────────────────────────────────────────
pub mod zone {
    pub const ZONE_ID: &str = "zone_id";
}

// ── Designated-area mask columns ────────────────────────────────────────────
pub mod designated {
    pub const ZONE_ID: &str = "zone_id";
    pub const AREA_ID: &str = "designated_area_id";
}

// ── Zone-translation weight columns ─────────────────────────────────────────
pub mod translation {
    pub const FROM_ZONE_ID: &str = "from_zone_id";
    pub const TO_ZONE_ID: &str = "to_zone_id";
    pub const SPLIT_FRACTION: &str = "split_fraction";

    pub const ALL: [&str; 3] = [FROM_ZONE_ID, TO_ZONE_ID, SPLIT_FRACTION];
}

// ── Constraint method values ────────────────────────────────────────────────
pub mod constraint_method {
    pub const PERCENTAGE: &str = "Percentage";
    pub const AVERAGE: &str = "Average";
}

// ── Constraint area values ──────────────────────────────────────────────────
pub mod constraint_area {
    pub const ZONE: &str = "Zone";
    pub const DESIGNATED: &str = "Designated";
    pub const ALL: &str = "All";
}

// ── Constraint on values ────────────────────────────────────────────────────
pub mod constraint_on {
    pub const GROWTH: &str = "Growth";
    pub const ALL: &str = "All";
}

// ── Constraint source values ────────────────────────────────────────────────
pub mod constraint_source {
    pub const DEFAULT: &str = "Default";
    pub const GROWN_BASE: &str = "Grown Base";
    pub const MODEL_GROWN_BASE: &str = "Model Grown Base";
}

// ── Translation aggregation values ──────────────────────────────────────────
pub mod translation_aggregation {
    pub const SUM: &str = "sum";
    pub const MEAN: &str = "mean";
}
