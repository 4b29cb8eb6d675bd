//! Region preset listing.

use axum::Json;
use sst_common::{presets, RegionPreset};

/// GET /regions - Named bounding boxes accepted by `region=`
pub async fn regions_handler() -> Json<&'static [RegionPreset]> {
    Json(presets())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_regions_include_dateline_presets() {
        let Json(regions) = regions_handler().await;
        assert!(regions.iter().any(|r| r.key == "east_asia"));
        assert!(regions
            .iter()
            .any(|r| r.bbox.wraps_antimeridian()));
    }
}
