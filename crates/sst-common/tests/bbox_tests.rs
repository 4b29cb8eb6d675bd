//! Tests for BoundingBox parsing, wraparound and containment.

use sst_common::bbox::{BboxParseError, BoundingBox};

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-90.0, 90.0, -180.0, 180.0);
    assert_eq!(bbox.lat_min, -90.0);
    assert_eq!(bbox.lat_max, 90.0);
    assert_eq!(bbox.lon_min, -180.0);
    assert_eq!(bbox.lon_max, 180.0);
    assert_eq!(bbox, BoundingBox::global());
}

#[test]
fn test_bbox_default_is_global() {
    assert_eq!(BoundingBox::default(), BoundingBox::global());
}

// ============================================================================
// from_query_string tests
// ============================================================================

#[test]
fn test_parse_query_bbox_floating() {
    let bbox = BoundingBox::from_query_string("-12.5,30.25,100.75,150.125").unwrap();
    assert!((bbox.lat_min - (-12.5)).abs() < 0.001);
    assert!((bbox.lat_max - 30.25).abs() < 0.001);
    assert!((bbox.lon_min - 100.75).abs() < 0.001);
    assert!((bbox.lon_max - 150.125).abs() < 0.001);
}

#[test]
fn test_parse_query_bbox_tolerates_spaces() {
    let bbox = BoundingBox::from_query_string(" 5, 55, 105, 150 ").unwrap();
    assert_eq!(bbox, BoundingBox::new(5.0, 55.0, 105.0, 150.0));
}

#[test]
fn test_parse_query_bbox_wrapping() {
    let bbox = BoundingBox::from_query_string("-10,10,170,-170").unwrap();
    assert!(bbox.wraps_antimeridian());
}

#[test]
fn test_parse_query_bbox_invalid_format_too_few() {
    let result = BoundingBox::from_query_string("0,0,100");
    assert!(matches!(result, Err(BboxParseError::InvalidFormat(_))));
}

#[test]
fn test_parse_query_bbox_invalid_format_too_many() {
    let result = BoundingBox::from_query_string("0,0,100,100,200");
    assert!(matches!(result, Err(BboxParseError::InvalidFormat(_))));
}

#[test]
fn test_parse_query_bbox_invalid_number() {
    let result = BoundingBox::from_query_string("abc,0,100,100");
    assert!(matches!(result, Err(BboxParseError::InvalidNumber(_))));
}

#[test]
fn test_parse_query_bbox_rejects_nan() {
    let result = BoundingBox::from_query_string("NaN,10,100,110");
    assert!(matches!(result, Err(BboxParseError::InvalidNumber(_))));
}

#[test]
fn test_parse_query_bbox_inverted_latitude() {
    let result = BoundingBox::from_query_string("55,5,105,150");
    assert!(matches!(
        result,
        Err(BboxParseError::InvertedLatitude { .. })
    ));
}

#[test]
fn test_parse_query_bbox_latitude_out_of_range() {
    let result = BoundingBox::from_query_string("-95,10,0,10");
    assert!(matches!(
        result,
        Err(BboxParseError::LatitudeOutOfRange { .. })
    ));
}

// ============================================================================
// Longitude range tests
// ============================================================================

#[test]
fn test_longitude_ranges_plain() {
    let bbox = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
    assert_eq!(bbox.longitude_ranges(), vec![(105.0, 150.0)]);
    assert_eq!(bbox.lon_span(), 45.0);
}

#[test]
fn test_longitude_ranges_full_circle_in_360_convention() {
    let bbox = BoundingBox::new(-90.0, 90.0, 0.0, 360.0);
    assert_eq!(bbox.longitude_ranges(), vec![(-180.0, 180.0)]);
    assert!(!bbox.wraps_antimeridian());
}

#[test]
fn test_longitude_ranges_360_bounds_are_wrapped() {
    // 150E to 230E (= 130W) crosses the dateline
    let bbox = BoundingBox::new(20.0, 60.0, 150.0, 230.0);
    assert_eq!(
        bbox.longitude_ranges(),
        vec![(150.0, 180.0), (-180.0, -130.0)]
    );
}

#[test]
fn test_lon_span_wrapping() {
    let bbox = BoundingBox::new(20.0, 60.0, 150.0, -130.0);
    assert_eq!(bbox.lon_span(), 80.0);
    assert_eq!(bbox.lat_span(), 40.0);
}

// ============================================================================
// Containment tests
// ============================================================================

#[test]
fn test_contains_point_inside() {
    let bbox = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
    assert!(bbox.contains_point(35.0, 127.0));
}

#[test]
fn test_contains_point_on_edges() {
    let bbox = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
    assert!(bbox.contains_point(5.0, 105.0));
    assert!(bbox.contains_point(55.0, 150.0));
}

#[test]
fn test_contains_point_outside() {
    let bbox = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
    assert!(!bbox.contains_point(60.0, 127.0));
    assert!(!bbox.contains_point(35.0, 160.0));
}

#[test]
fn test_contains_lon_wrapping() {
    let bbox = BoundingBox::new(-10.0, 10.0, 170.0, -170.0);
    assert!(bbox.contains_lon(175.0));
    assert!(bbox.contains_lon(-175.0));
    assert!(bbox.contains_lon(180.0));
    assert!(bbox.contains_lon(-180.0));
    assert!(!bbox.contains_lon(0.0));
    assert!(!bbox.contains_lon(160.0));
}

#[test]
fn test_contains_lon_360_convention() {
    let bbox = BoundingBox::new(-10.0, 10.0, 170.0, -170.0);
    // 185E is 175W
    assert!(bbox.contains_lon(185.0));
    assert!(!bbox.contains_lon(200.0));
}

// ============================================================================
// Cache key tests
// ============================================================================

#[test]
fn test_cache_key_stable_under_float_noise() {
    let a = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
    let b = BoundingBox::new(5.000_000_01, 55.0, 105.0, 150.0);
    assert_eq!(a.cache_key(), b.cache_key());
}

#[test]
fn test_cache_key_distinguishes_boxes() {
    let a = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
    let b = BoundingBox::new(5.0, 55.0, 105.0, 151.0);
    assert_ne!(a.cache_key(), b.cache_key());
}

// ============================================================================
// Serialization tests
// ============================================================================

#[test]
fn test_bbox_json_roundtrip() {
    let bbox = BoundingBox::new(20.0, 60.0, 150.0, -130.0);
    let json = serde_json::to_string(&bbox).unwrap();
    assert!(json.contains("\"lon_min\":150.0"));
    let back: BoundingBox = serde_json::from_str(&json).unwrap();
    assert_eq!(bbox, back);
}
