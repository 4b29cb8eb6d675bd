//! Integration tests for AnomalyFieldResolver against in-memory datasets.

mod common;

use anomaly_resolver::{
    resolve_dataset, AnomalyFieldResolver, Coordinate, Dataset, Dimension, LabeledArray,
    ResolverError, StaticProvider,
};
use chrono::{TimeZone, Utc};
use sst_common::{BoundingBox, GriddedAnomalyField, TieBreak};

use common::{day, encode, Fixture};

fn resolve(
    fixture: &Fixture,
    target: chrono::DateTime<Utc>,
    bbox: Option<&BoundingBox>,
) -> Result<GriddedAnomalyField, ResolverError> {
    resolve_dataset(&fixture.dataset(), "anom", target, bbox, TieBreak::Earlier)
}

/// Assert every cell holds the value encoded for its coordinates.
fn assert_values_match(field: &GriddedAnomalyField, t: usize) {
    for (i, &lat) in field.latitudes().iter().enumerate() {
        for (j, &lon) in field.longitudes().iter().enumerate() {
            assert_eq!(
                field.get(i, j),
                Some(encode(t, lat, lon)),
                "cell ({}, {}) at lat {} lon {}",
                i,
                j,
                lat,
                lon
            );
        }
    }
}

fn assert_within(field: &GriddedAnomalyField, bbox: &BoundingBox) {
    for &lat in field.latitudes() {
        assert!(bbox.contains_lat(lat), "lat {} outside {}", lat, bbox);
    }
    for &lon in field.longitudes() {
        assert!(bbox.contains_lon(lon), "lon {} outside {}", lon, bbox);
    }
}

// ============================================================================
// Time clamping and nearest-step selection
// ============================================================================

#[test]
fn test_clamp_before_first_step() {
    let field = resolve(&Fixture::default(), day(1975, 1, 1), None).unwrap();
    assert_eq!(field.timestamp(), day(1981, 9, 1));
    assert_values_match(&field, 0);
}

#[test]
fn test_clamp_after_last_step() {
    let field = resolve(&Fixture::default(), day(2030, 1, 1), None).unwrap();
    assert_eq!(field.timestamp(), day(2024, 6, 30));
    assert_values_match(&field, 4);
}

#[test]
fn test_exact_match_keeps_timestamp() {
    let field = resolve(&Fixture::default(), day(2023, 7, 15), None).unwrap();
    assert_eq!(field.timestamp(), day(2023, 7, 15));
    assert_values_match(&field, 2);
}

#[test]
fn test_nearest_step() {
    let target = Utc.with_ymd_and_hms(2023, 7, 16, 18, 0, 0).unwrap();
    let field = resolve(&Fixture::default(), target, None).unwrap();
    assert_eq!(field.timestamp(), day(2023, 7, 17));
    assert_values_match(&field, 3);
}

#[test]
fn test_tie_break_both_ways() {
    let dataset = Fixture::default().dataset();
    let midpoint = day(2023, 7, 16);

    let earlier = resolve_dataset(&dataset, "anom", midpoint, None, TieBreak::Earlier).unwrap();
    assert_eq!(earlier.timestamp(), day(2023, 7, 15));

    let later = resolve_dataset(&dataset, "anom", midpoint, None, TieBreak::Later).unwrap();
    assert_eq!(later.timestamp(), day(2023, 7, 17));
}

#[test]
fn test_resolved_timestamp_is_always_on_the_axis() {
    let fixture = Fixture::default();
    for target in [day(1900, 1, 1), day(2000, 1, 1), day(2023, 7, 16), day(2100, 1, 1)] {
        let field = resolve(&fixture, target, None).unwrap();
        assert!(fixture.times.contains(&field.timestamp()));
    }
}

// ============================================================================
// Spatial slicing
// ============================================================================

#[test]
fn test_full_domain_without_bbox() {
    let field = resolve(&Fixture::default(), day(2023, 7, 15), None).unwrap();
    assert_eq!(field.shape(), (180, 360));
    assert_eq!(field.longitudes().first(), Some(&-179.5));
    assert_eq!(field.longitudes().last(), Some(&179.5));
    assert!(field.latitudes().windows(2).all(|w| w[0] < w[1]));
    assert!(field.longitudes().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_east_asia_bbox() {
    let bbox = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
    let field = resolve(&Fixture::default(), day(2023, 7, 15), Some(&bbox)).unwrap();

    assert_eq!(field.shape(), (50, 45));
    assert_eq!(field.latitudes()[0], 5.5);
    assert_eq!(field.longitudes()[0], 105.5);
    assert_within(&field, &bbox);
    assert_values_match(&field, 2);
}

#[test]
fn test_antimeridian_bbox_union() {
    let bbox = BoundingBox::new(-10.0, 10.0, 170.0, -170.0);
    let field = resolve(&Fixture::default(), day(2023, 7, 15), Some(&bbox)).unwrap();

    let lons = field.longitudes();
    assert_eq!(lons.len(), 20);
    // [170, 180] first, then [-180, -170], each ascending
    assert_eq!(&lons[..3], &[170.5, 171.5, 172.5]);
    assert_eq!(lons[9], 179.5);
    assert_eq!(lons[10], -179.5);
    assert_eq!(lons[19], -170.5);

    let mut unique: Vec<i64> = lons.iter().map(|l| (l * 10.0) as i64).collect();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), lons.len(), "duplicate longitude columns");

    assert_within(&field, &bbox);
    assert_values_match(&field, 2);
}

#[test]
fn test_antimeridian_with_meridian_columns() {
    // Integer-degree axis carrying both -180 and 180
    let mut fixture = Fixture::default();
    fixture.lons = (-180..=180).map(f64::from).collect();
    let bbox = BoundingBox::new(-5.0, 5.0, 175.0, -175.0);
    let field = resolve(&fixture, day(2023, 7, 15), Some(&bbox)).unwrap();

    let lons = field.longitudes();
    assert_eq!(
        lons,
        &[175.0, 176.0, 177.0, 178.0, 179.0, 180.0, -179.0, -178.0, -177.0, -176.0, -175.0]
    );
}

#[test]
fn test_bbox_bounds_outside_signed_range_are_wrapped() {
    let bbox = BoundingBox::new(0.0, 10.0, 350.0, 10.0);
    let field = resolve(&Fixture::default(), day(2023, 7, 15), Some(&bbox)).unwrap();
    assert_eq!(field.longitudes().len(), 20);
    assert_eq!(field.longitudes()[0], -9.5);
    assert_eq!(field.longitudes()[19], 9.5);
}

#[test]
fn test_shape_invariant_across_boxes() {
    let fixture = Fixture::default();
    let boxes = [
        BoundingBox::global(),
        BoundingBox::new(5.0, 55.0, 105.0, 150.0),
        BoundingBox::new(-20.0, 20.0, 150.0, -80.0),
        BoundingBox::new(0.0, 0.9, 0.0, 0.9),
        BoundingBox::new(-90.0, 90.0, 179.0, -179.0),
    ];
    for bbox in boxes {
        let field = resolve(&fixture, day(2023, 7, 15), Some(&bbox)).unwrap();
        let (rows, cols) = field.shape();
        assert_eq!(field.values().len(), rows * cols, "shape for {}", bbox);
        assert!(rows > 0 && cols > 0);
    }
}

#[test]
fn test_empty_region() {
    let bbox = BoundingBox::new(10.1, 10.2, 120.1, 120.2);
    match resolve(&Fixture::default(), day(2023, 7, 15), Some(&bbox)) {
        Err(ResolverError::EmptyRegion { bbox: reported }) => assert_eq!(reported, bbox),
        other => panic!("Expected EmptyRegion, got {:?}", other),
    }
}

// ============================================================================
// Source layout irregularities
// ============================================================================

#[test]
fn test_descending_latitudes_match_ascending_source() {
    let bbox = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
    let baseline = resolve(&Fixture::default(), day(2023, 7, 15), Some(&bbox)).unwrap();
    let flipped = resolve(
        &Fixture::default().descending_lats(),
        day(2023, 7, 15),
        Some(&bbox),
    )
    .unwrap();
    assert_eq!(baseline, flipped);
}

#[test]
fn test_lon_major_source_matches_lat_major() {
    let bbox = BoundingBox::new(-10.0, 10.0, 170.0, -170.0);
    let baseline = resolve(&Fixture::default(), day(2023, 7, 15), Some(&bbox)).unwrap();
    let transposed = resolve(&Fixture::default().lon_major(), day(2023, 7, 15), Some(&bbox)).unwrap();
    assert_eq!(baseline, transposed);
}

#[test]
fn test_0_360_source_matches_signed_source() {
    let fixture = Fixture::default().lons_0_360();
    for bbox in [
        None,
        Some(BoundingBox::new(-10.0, 10.0, 170.0, -170.0)),
        Some(BoundingBox::new(-10.0, 10.0, -20.0, 20.0)),
    ] {
        let baseline = resolve(&Fixture::default(), day(2023, 7, 15), bbox.as_ref()).unwrap();
        let shifted = resolve(&fixture, day(2023, 7, 15), bbox.as_ref()).unwrap();
        assert_eq!(baseline, shifted, "bbox {:?}", bbox);
    }
}

#[test]
fn test_alternative_axis_names() {
    let bbox = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
    let baseline = resolve(&Fixture::default(), day(2023, 7, 15), Some(&bbox)).unwrap();
    let renamed = resolve(
        &Fixture::default().names("date", "lat", "lon").level(Some("depth")),
        day(2023, 7, 15),
        Some(&bbox),
    )
    .unwrap();
    assert_eq!(baseline, renamed);
}

#[test]
fn test_without_vertical_axis() {
    let field = resolve(&Fixture::default().level(None), day(2023, 7, 15), None).unwrap();
    assert_values_match(&field, 2);
}

#[test]
fn test_first_vertical_level_is_selected() {
    // Level 1 is all NaN in the fixture
    let field = resolve(&Fixture::default(), day(2023, 7, 15), None).unwrap();
    assert!(field.values().iter().all(|v| !v.is_nan()));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_axis_name_is_malformed() {
    let fixture = Fixture::default().names("time", "nav_lat", "longitude");
    let result = resolve(&fixture, day(2023, 7, 15), None);
    assert!(matches!(result, Err(ResolverError::MalformedCoordinates(_))));
}

#[test]
fn test_duplicate_axis_role_is_malformed() {
    let fixture = Fixture::default().names("time", "lat", "latitude");
    let result = resolve(&fixture, day(2023, 7, 15), None);
    assert!(matches!(result, Err(ResolverError::MalformedCoordinates(_))));
}

#[test]
fn test_missing_variable_is_unavailable() {
    let dataset = Fixture::default().dataset();
    let result = resolve_dataset(&dataset, "sst", day(2023, 7, 15), None, TieBreak::Earlier);
    assert!(matches!(result, Err(ResolverError::DataUnavailable(_))));
}

#[test]
fn test_missing_time_axis_is_unavailable() {
    let array = LabeledArray::new(
        vec![
            Dimension::new("lat", Coordinate::Values(vec![0.0])),
            Dimension::new("lon", Coordinate::Values(vec![0.0])),
        ],
        vec![1.0],
        None,
    )
    .unwrap();
    let dataset = Dataset::new().with_variable("anom", array);
    let result = resolve_dataset(&dataset, "anom", day(2023, 7, 15), None, TieBreak::Earlier);
    assert!(matches!(result, Err(ResolverError::DataUnavailable(_))));
}

#[test]
fn test_unordered_time_axis_is_unavailable() {
    let mut fixture = Fixture::default();
    fixture.times.swap(1, 2);
    let result = resolve(&fixture, day(2023, 7, 15), None);
    assert!(matches!(result, Err(ResolverError::DataUnavailable(_))));
}

// ============================================================================
// Async resolver
// ============================================================================

#[tokio::test]
async fn test_resolve_through_provider_is_idempotent() {
    let provider = StaticProvider::new("fixture", Fixture::default().dataset());
    let resolver = AnomalyFieldResolver::new(provider, "anom");
    let bbox = BoundingBox::new(30.0, 45.0, 120.0, 135.0);

    let first = resolver.resolve(day(2023, 7, 15), Some(&bbox)).await.unwrap();
    let second = resolver.resolve(day(2023, 7, 15), Some(&bbox)).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.timestamp(), day(2023, 7, 15));
}

#[tokio::test]
async fn test_resolver_tie_break_setting() {
    let provider = StaticProvider::new("fixture", Fixture::default().dataset());
    let resolver = AnomalyFieldResolver::new(provider, "anom").with_tie_break(TieBreak::Later);
    let field = resolver.resolve(day(2023, 7, 16), None).await.unwrap();
    assert_eq!(field.timestamp(), day(2023, 7, 17));
}
