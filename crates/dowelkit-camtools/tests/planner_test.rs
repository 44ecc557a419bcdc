use dowelkit_camtools::dowel::{
    pass_count, DowelSettings, DowelSettingsFields, MotionSegment, Position, ToolpathPlanner,
};
use dowelkit_camtools::CamToolError;
use dowelkit_core::units::UnitSystem;

fn two_by_one() -> DowelSettings {
    DowelSettings::create(DowelSettingsFields {
        grid_count_x: 2,
        grid_count_y: 1,
        dowel_diameter: 5.0,
        dowel_length: 10.0,
        tool_diameter: 3.17,
        feed_rate: 100.0,
        pass_depth: 2.0,
        safety_height: 5.0,
        units: UnitSystem::Metric,
    })
    .unwrap()
}

#[test]
fn test_two_by_one_grid() {
    let plan = ToolpathPlanner::new().plan(&two_by_one()).unwrap();

    assert_eq!(plan.hole_count(), 2);
    assert_eq!(plan.passes_per_hole, 5);
    assert_eq!(plan.len(), 14);
    assert_eq!(plan.end_position(), Position::new(10.0, 0.0, 5.0));

    let mut expected = Vec::new();
    for x in [0.0, 10.0] {
        expected.push(MotionSegment::rapid(Position::new(x, 0.0, 5.0)));
        for depth in [2.0, 4.0, 6.0, 8.0, 10.0] {
            expected.push(MotionSegment::linear(Position::new(x, 0.0, -depth), 100.0));
        }
        expected.push(MotionSegment::rapid(Position::new(x, 0.0, 5.0)));
    }
    assert_eq!(plan.segments, expected);
}

#[test]
fn test_row_order_is_y_outer() {
    let settings = DowelSettings::create(DowelSettingsFields {
        grid_count_x: 3,
        grid_count_y: 2,
        pass_depth: 10.0,
        ..Default::default()
    })
    .unwrap();
    let plan = ToolpathPlanner::new().plan(&settings).unwrap();

    let hole_starts: Vec<(f64, f64)> = plan
        .segments
        .chunks(3)
        .map(|hole| (hole[0].end().x, hole[0].end().y))
        .collect();
    assert_eq!(
        hole_starts,
        vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (20.0, 0.0),
            (0.0, 10.0),
            (10.0, 10.0),
            (20.0, 10.0),
        ]
    );
}

#[test]
fn test_uneven_last_pass() {
    let settings = DowelSettings::create(DowelSettingsFields {
        grid_count_x: 1,
        grid_count_y: 1,
        dowel_length: 10.0,
        pass_depth: 3.0,
        ..Default::default()
    })
    .unwrap();
    let plan = ToolpathPlanner::new().plan(&settings).unwrap();

    let depths: Vec<f64> = plan
        .segments
        .iter()
        .filter(|s| !s.is_rapid())
        .map(|s| s.end().z)
        .collect();
    assert_eq!(depths, vec![-3.0, -6.0, -9.0, -10.0]);
    assert_eq!(pass_count(10.0, 3.0), 4);
}

#[test]
fn test_imperial_plan_is_in_millimeters() {
    let settings = DowelSettings::create(DowelSettingsFields {
        grid_count_x: 2,
        grid_count_y: 1,
        dowel_diameter: 0.5,
        dowel_length: 1.0,
        tool_diameter: 0.25,
        feed_rate: 20.0,
        pass_depth: 0.5,
        safety_height: 0.25,
        units: UnitSystem::Imperial,
    })
    .unwrap();
    let plan = ToolpathPlanner::new().plan(&settings).unwrap();

    assert_eq!(plan.units, UnitSystem::Imperial);
    assert_eq!(plan.spacing, 25.4);
    assert_eq!(plan.safety_height, 6.35);
    assert_eq!(plan.min_z(), -25.4);
    let feed = plan.segments[1].feed_rate().unwrap();
    assert!((feed - 508.0).abs() < 1e-9);
    assert_eq!(plan.end_position(), Position::new(25.4, 0.0, 6.35));
}

#[test]
fn test_wider_spacing_factor() {
    let planner = ToolpathPlanner::with_spacing_factor(3.0).unwrap();
    let plan = planner.plan(&two_by_one()).unwrap();
    assert_eq!(plan.spacing, 15.0);
    assert_eq!(plan.end_position(), Position::new(15.0, 0.0, 5.0));
}

#[test]
fn test_spacing_factor_below_minimum() {
    let err = ToolpathPlanner::with_spacing_factor(1.0).unwrap_err();
    assert!(matches!(err, CamToolError::InvalidParameters(_)));
}

#[test]
fn test_zero_safety_height_plan() {
    let settings = DowelSettings::create(DowelSettingsFields {
        grid_count_x: 1,
        grid_count_y: 1,
        safety_height: 0.0,
        ..Default::default()
    })
    .unwrap();
    let plan = ToolpathPlanner::new().plan(&settings).unwrap();
    assert_eq!(plan.end_position().z, 0.0);
    assert_eq!(plan.len(), 7);
}

#[test]
fn test_planning_is_deterministic() {
    let planner = ToolpathPlanner::new();
    let a = planner.plan(&DowelSettings::default()).unwrap();
    let b = planner.plan(&DowelSettings::default()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.content_hash(), b.content_hash());
}

#[test]
fn test_unbounded_plan_sizes_are_rejected_before_planning() {
    let sliver_passes = DowelSettingsFields {
        dowel_length: 10.0,
        pass_depth: 1e-300,
        ..Default::default()
    };
    let err = DowelSettings::create(sliver_passes).unwrap_err();
    assert!(err.has_field("pass_depth"));

    let huge_grid = DowelSettingsFields {
        grid_count_x: 1_000_000,
        grid_count_y: 1_000_000,
        ..Default::default()
    };
    let err = DowelSettings::create(huge_grid).unwrap_err();
    assert!(err.has_field("grid_count_x"));
}

#[test]
fn test_largest_pass_count_plans() {
    let settings = DowelSettings::create(DowelSettingsFields {
        grid_count_x: 1,
        grid_count_y: 1,
        dowel_length: 10.0,
        pass_depth: 0.001,
        ..Default::default()
    })
    .unwrap();
    let plan = ToolpathPlanner::new().plan(&settings).unwrap();
    assert_eq!(plan.passes_per_hole, pass_count(10.0, 0.001));
    assert_eq!(plan.len(), plan.passes_per_hole + 2);
    assert_eq!(plan.min_z(), -10.0);
}
