use dowelkit_camtools::dowel::{DowelSettings, DowelSettingsFields, GcodeEmitter, ToolpathPlanner};
use dowelkit_core::units::UnitSystem;
use dowelkit_visualizer::{compare_lines, decode_program, LineStyle, PreviewAdapter};
use proptest::prelude::*;

fn check_round_trip(settings: &DowelSettings, comments: bool) -> Result<(), TestCaseError> {
    let plan = ToolpathPlanner::new().plan(settings).unwrap();
    let text = GcodeEmitter::new().with_comments(comments).emit_to_string(&plan);
    let decoded = decode_program(&text).unwrap();
    let preview = PreviewAdapter::to_primitives(&plan);

    prop_assert_eq!(decoded.units, settings.units());
    let result = compare_lines(&preview, &decoded.lines, decoded.tolerance());
    prop_assert!(result.is_ok(), "{:?}", result);

    let feed_mm = settings.units().to_mm(settings.feed_rate());
    for (line, feed) in decoded.lines.iter().zip(&decoded.feed_rates) {
        match line.style {
            LineStyle::Rapid => prop_assert!(feed.is_none()),
            LineStyle::Feed => {
                let feed = feed.unwrap();
                // Feeds keep at least three significant digits.
                prop_assert!(feed > 0.0);
                prop_assert!((feed - feed_mm).abs() <= feed_mm * 5e-3 + 1e-12);
            }
        }
    }
    Ok(())
}

#[test]
fn test_two_by_one_decodes_to_preview() {
    let settings = DowelSettings::create(DowelSettingsFields {
        grid_count_x: 2,
        grid_count_y: 1,
        ..Default::default()
    })
    .unwrap();
    check_round_trip(&settings, true).unwrap();
}

#[test]
fn test_imperial_fraction_sizes_decode_to_preview() {
    let settings = DowelSettings::create(DowelSettingsFields {
        grid_count_x: 3,
        grid_count_y: 2,
        dowel_diameter: 0.375,
        dowel_length: 0.8125,
        tool_diameter: 0.25,
        feed_rate: 15.0,
        pass_depth: 0.1875,
        safety_height: 0.25,
        units: UnitSystem::Imperial,
    })
    .unwrap();
    check_round_trip(&settings, false).unwrap();
}

#[test]
fn test_slow_feed_survives_emission() {
    for units in [UnitSystem::Metric, UnitSystem::Imperial] {
        let settings = DowelSettings::create(DowelSettingsFields {
            feed_rate: 0.04,
            dowel_length: if units == UnitSystem::Metric { 10.0 } else { 0.5 },
            pass_depth: if units == UnitSystem::Metric { 2.0 } else { 0.1 },
            dowel_diameter: if units == UnitSystem::Metric { 5.0 } else { 0.25 },
            tool_diameter: if units == UnitSystem::Metric { 3.17 } else { 0.125 },
            safety_height: if units == UnitSystem::Metric { 5.0 } else { 0.2 },
            units,
            ..Default::default()
        })
        .unwrap();
        check_round_trip(&settings, false).unwrap();
    }
}

prop_compose! {
    fn valid_settings()(
        grid_count_x in 1u32..5,
        grid_count_y in 1u32..5,
        dowel_diameter in 1.0f64..25.0,
        tool_ratio in 0.05f64..=1.0,
        dowel_length in 0.5f64..60.0,
        pass_ratio in 0.05f64..=1.0,
        feed_rate in 0.001f64..3000.0,
        safety_height in 0.0f64..25.0,
        imperial in any::<bool>(),
    ) -> DowelSettings {
        DowelSettings::create(DowelSettingsFields {
            grid_count_x,
            grid_count_y,
            dowel_diameter,
            dowel_length,
            tool_diameter: dowel_diameter * tool_ratio,
            feed_rate,
            pass_depth: dowel_length * pass_ratio,
            safety_height,
            units: if imperial { UnitSystem::Imperial } else { UnitSystem::Metric },
        })
        .unwrap()
    }
}

proptest! {
    #[test]
    fn prop_emitted_program_matches_preview(settings in valid_settings(), comments in any::<bool>()) {
        check_round_trip(&settings, comments)?;
    }
}
