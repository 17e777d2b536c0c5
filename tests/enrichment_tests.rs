/// Unit tests for the lead engine
/// Tests distance calculation, relevance classification, scoring, and the
/// filter & sort pipeline
use steel_leads_api::enrichment::{
    haversine_miles, lead_score, Category, GeoPoint, LeadEngine, Priority, RelevanceEntry,
    RelevanceTable,
};
use steel_leads_api::models::RawPermit;

/// Business location used throughout: 1641 Poland Ave, New Orleans.
const BUSINESS: GeoPoint = GeoPoint {
    lat: 29.9584,
    lng: -90.0192,
};

fn engine() -> LeadEngine {
    LeadEngine::new(BUSINESS, RelevanceTable::default(), 25.0)
}

fn permit(id: &str, code: &str, value: Option<f64>, location: Option<&str>) -> RawPermit {
    RawPermit {
        permit_id: id.to_string(),
        address: Some("123 Example St, New Orleans, LA".to_string()),
        issuedate: None,
        code: code.to_string(),
        permit_type: None,
        description: None,
        constrval: value,
        applicant: None,
        contractors: None,
        currentstatus: Some("Permit Issued".to_string()),
        location_1: location.map(str::to_string),
    }
}

#[cfg(test)]
mod distance_tests {
    use super::*;

    #[test]
    fn test_identity_is_zero() {
        assert_eq!(haversine_miles(BUSINESS, BUSINESS), 0.0);

        let point = GeoPoint { lat: 45.0, lng: 12.5 };
        assert_eq!(haversine_miles(point, point), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let cbd = GeoPoint {
            lat: 29.9499,
            lng: -90.0701,
        };
        let there = haversine_miles(BUSINESS, cbd);
        let back = haversine_miles(cbd, BUSINESS);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_quarter_meridian() {
        // Pole to equator along a meridian is a quarter circumference:
        // 3959 * pi / 2 miles.
        let equator = GeoPoint { lat: 0.0, lng: 0.0 };
        let pole = GeoPoint { lat: 90.0, lng: 0.0 };
        let distance = haversine_miles(equator, pole);
        assert!((distance - 6218.78).abs() < 0.1, "got {}", distance);
    }

    #[test]
    fn test_nearby_point_is_short_hop() {
        // The CBD is a few miles from the business, not tens
        let cbd = GeoPoint {
            lat: 29.9499,
            lng: -90.0701,
        };
        let distance = haversine_miles(BUSINESS, cbd);
        assert!(distance > 1.0 && distance < 10.0, "got {}", distance);
    }
}

#[cfg(test)]
mod relevance_tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        let table = RelevanceTable::default();

        let roof = table.lookup("ROOF").expect("ROOF is in the table");
        assert_eq!(roof.category, Category::MetalRoofing);
        assert_eq!(roof.priority, Priority::High);
        assert_eq!(roof.color, "#3b82f6");

        let rnvs = table.lookup("RNVS").expect("RNVS is in the table");
        assert_eq!(rnvs.category, Category::StructuralSteel);
        assert_eq!(rnvs.priority, Priority::High);

        let newc = table.lookup("NEWC").expect("NEWC is in the table");
        assert_eq!(newc.category, Category::StructuralSteel);
        assert_eq!(newc.priority, Priority::High);

        let rnvn = table.lookup("RNVN").expect("RNVN is in the table");
        assert_eq!(rnvn.category, Category::GeneralConstruction);
        assert_eq!(rnvn.priority, Priority::Medium);

        let demo = table.lookup("DEMO").expect("DEMO is in the table");
        assert_eq!(demo.category, Category::Opportunity);
        assert_eq!(demo.priority, Priority::Medium);
    }

    #[test]
    fn test_unknown_code_is_not_an_error() {
        let table = RelevanceTable::default();
        assert!(table.lookup("XYZQ").is_none());
        assert!(table.lookup("").is_none());
        assert!(table.lookup("roof").is_none()); // codes are case-sensitive
    }

    #[test]
    fn test_codes_listing_is_sorted() {
        let table = RelevanceTable::default();
        assert_eq!(table.codes(), vec!["DEMO", "NEWC", "RNVN", "RNVS", "ROOF"]);
    }
}

#[cfg(test)]
mod score_tests {
    use super::*;

    fn entry_for(code: &str) -> RelevanceEntry {
        RelevanceTable::default()
            .lookup(code)
            .expect("known code")
            .clone()
    }

    #[test]
    fn test_metal_roofing_example() {
        // ROOF at $120k, 8 miles out:
        // priority high 40 + category 15 + value 12 + tiers (50k,100k) 25
        // + proximity (<=10mi) 20 = 112
        let entry = entry_for("ROOF");
        assert_eq!(lead_score(120_000.0, Some(&entry), Some(8.0)), 112);
    }

    #[test]
    fn test_unknown_code_scores_zero() {
        assert_eq!(lead_score(0.0, None, None), 0);
    }

    #[test]
    fn test_value_component_caps_at_30() {
        // Same tier bonuses, value component capped for both
        assert_eq!(
            lead_score(300_000.0, None, None),
            lead_score(499_999.0, None, None)
        );
        // 30 value points + all four tier bonuses
        assert_eq!(lead_score(10_000_000.0, None, None), 100);
    }

    #[test]
    fn test_value_tiers_stack() {
        // $600k: capped value 30 + 10 + 15 + 20 + 25
        assert_eq!(lead_score(600_000.0, None, None), 100);
        // $60k: value 6 + first tier only
        assert_eq!(lead_score(60_000.0, None, None), 16);
    }

    #[test]
    fn test_distance_brackets_do_not_stack() {
        // Nearest matching bracket only, unlike the value tiers
        assert_eq!(lead_score(0.0, None, Some(4.0)), 25);
        assert_eq!(lead_score(0.0, None, Some(5.0)), 25);
        assert_eq!(lead_score(0.0, None, Some(10.0)), 20);
        assert_eq!(lead_score(0.0, None, Some(10.1)), 15);
        assert_eq!(lead_score(0.0, None, Some(15.0)), 15);
        assert_eq!(lead_score(0.0, None, Some(25.0)), 10);
        assert_eq!(lead_score(0.0, None, Some(35.0)), 5);
        assert_eq!(lead_score(0.0, None, Some(35.1)), 0);
    }

    #[test]
    fn test_unknown_distance_contributes_nothing() {
        assert_eq!(lead_score(0.0, None, None), 0);
        let entry = entry_for("DEMO");
        // priority medium 25, no category bonus for Opportunity
        assert_eq!(lead_score(0.0, Some(&entry), None), 25);
    }

    #[test]
    fn test_priority_and_category_bonuses() {
        let roof = entry_for("ROOF");
        // high 40 + metal roofing 15
        assert_eq!(lead_score(0.0, Some(&roof), None), 55);

        let rnvn = entry_for("RNVN");
        // medium 25, general construction has no category bonus
        assert_eq!(lead_score(0.0, Some(&rnvn), None), 25);

        let fencing = RelevanceEntry::new(
            Category::FencingGates,
            Priority::Highest,
            "Fencing - Posts, panels, gates",
            "#22c55e",
        );
        // highest 50 + fencing 20
        assert_eq!(lead_score(0.0, Some(&fencing), None), 70);
    }

    #[test]
    fn test_score_rounds_to_nearest_integer() {
        // $5.5k -> 0.55 value points -> rounds to 1
        assert_eq!(lead_score(5_500.0, None, None), 1);
        // $4.9k -> 0.49 -> rounds to 0
        assert_eq!(lead_score(4_900.0, None, None), 0);
    }

    #[test]
    fn test_score_never_negative() {
        assert_eq!(lead_score(-50_000.0, None, None), 0);
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;

    #[test]
    fn test_enrich_parses_string_coordinates() {
        let raw = permit(
            "24-000001-ROOF",
            "ROOF",
            Some(120_000.0),
            Some(r#"{"latitude": "29.9641", "longitude": "-90.0443"}"#),
        );
        let lead = engine().enrich(&raw);

        assert_eq!(lead.latitude, Some(29.9641));
        assert_eq!(lead.longitude, Some(-90.0443));

        let expected = haversine_miles(
            BUSINESS,
            GeoPoint {
                lat: 29.9641,
                lng: -90.0443,
            },
        );
        let expected_rounded = (expected * 10.0).round() / 10.0;
        assert_eq!(lead.distance_miles, Some(expected_rounded));

        assert!(lead.is_relevant);
        assert_eq!(lead.category, Category::MetalRoofing);
        assert_eq!(lead.priority, Priority::High);
        assert!(!lead.category_description.is_empty());
    }

    #[test]
    fn test_enrich_parses_numeric_coordinates() {
        let raw = permit(
            "24-000002-NEWC",
            "NEWC",
            Some(285_000.0),
            Some(r#"{"latitude": 29.9499, "longitude": -90.0701}"#),
        );
        let lead = engine().enrich(&raw);
        assert_eq!(lead.latitude, Some(29.9499));
        assert_eq!(lead.longitude, Some(-90.0701));
        assert!(lead.distance_miles.is_some());
    }

    #[test]
    fn test_enrich_malformed_location_keeps_lead() {
        let raw = permit(
            "24-000003-DEMO",
            "DEMO",
            Some(10_000.0),
            Some("POINT(-90.07 29.95)"),
        );
        let lead = engine().enrich(&raw);

        assert_eq!(lead.latitude, None);
        assert_eq!(lead.longitude, None);
        assert_eq!(lead.distance_miles, None);
        // still classified and scored, just without a proximity component
        assert!(lead.is_relevant);
        assert_eq!(lead.lead_score, 26); // value 1 + medium 25
    }

    #[test]
    fn test_enrich_partial_coordinates_treated_as_absent() {
        let raw = permit(
            "24-000004-ROOF",
            "ROOF",
            None,
            Some(r#"{"latitude": "29.9641"}"#),
        );
        let lead = engine().enrich(&raw);
        assert_eq!(lead.latitude, None);
        assert_eq!(lead.longitude, None);
        assert_eq!(lead.distance_miles, None);
    }

    #[test]
    fn test_enrich_at_reference_point_is_zero_miles() {
        let raw = permit(
            "24-000005-ROOF",
            "ROOF",
            None,
            Some(r#"{"latitude": "29.9584", "longitude": "-90.0192"}"#),
        );
        let lead = engine().enrich(&raw);
        assert_eq!(lead.distance_miles, Some(0.0));
        // value 0 + high 40 + roofing 15 + proximity 25
        assert_eq!(lead.lead_score, 80);
    }

    #[test]
    fn test_enrich_unknown_code_defaults() {
        let raw = permit("24-000006-ELEC", "ELEC", Some(75_000.0), None);
        let lead = engine().enrich(&raw);

        assert!(!lead.is_relevant);
        assert_eq!(lead.category, Category::Other);
        assert_eq!(lead.priority, Priority::None);
        assert_eq!(lead.category_description, "");
        // value 7.5 -> 8 after rounding, + first tier 10
        assert_eq!(lead.lead_score, 18);
    }

    #[test]
    fn test_enrich_missing_value_normalizes_to_zero() {
        let raw = permit("24-000007-DEMO", "DEMO", None, None);
        let lead = engine().enrich(&raw);
        assert_eq!(lead.value, 0.0);
        assert_eq!(lead.lead_score, 25); // medium priority only
    }

    #[test]
    fn test_engine_takes_arbitrary_reference_and_table() {
        // A deployment in Houston with a fencing-focused table
        let houston = GeoPoint {
            lat: 29.7604,
            lng: -95.3698,
        };
        let table = RelevanceTable::from_entries([(
            "FENC".to_string(),
            RelevanceEntry::new(
                Category::FencingGates,
                Priority::Highest,
                "Fencing - Posts, panels, gates",
                "#22c55e",
            ),
        )]);
        let custom = LeadEngine::new(houston, table, 40.0);

        let raw = permit("H-0001-FENC", "FENC", Some(20_000.0), None);
        let lead = custom.enrich(&raw);
        assert!(lead.is_relevant);
        // value 2 + highest 50 + fencing 20
        assert_eq!(lead.lead_score, 72);

        // ROOF means nothing to this table
        let roof = custom.enrich(&permit("H-0002-ROOF", "ROOF", None, None));
        assert!(!roof.is_relevant);
        assert_eq!(roof.lead_score, 0);
    }
}

#[cfg(test)]
mod rank_tests {
    use super::*;

    /// Bywater, roughly 1.7 miles from the business.
    const NEARBY: &str = r#"{"latitude": "29.9641", "longitude": "-90.0443"}"#;
    /// Kenner, well outside a tight radius.
    const FAR: &str = r#"{"latitude": "30.0035", "longitude": "-90.2417"}"#;

    #[test]
    fn test_radius_cut_is_inclusive() {
        let eng = engine();
        let raw = permit("24-100001-ROOF", "ROOF", None, Some(NEARBY));
        let distance = eng.enrich(&raw).distance_miles.expect("has coordinates");

        // Exactly at the boundary: retained
        let kept = eng.rank(std::slice::from_ref(&raw), Some(distance));
        assert_eq!(kept.len(), 1);

        // Just below it: excluded
        let dropped = eng.rank(std::slice::from_ref(&raw), Some(distance - 0.1));
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_unknown_distance_never_excluded() {
        let eng = engine();
        let permits = vec![
            permit("24-100002-ROOF", "ROOF", Some(50_000.0), None),
            permit("24-100003-DEMO", "DEMO", None, Some("not json at all")),
        ];

        // Even a zero-mile radius keeps leads without geodata
        let leads = eng.rank(&permits, Some(0.0));
        assert_eq!(leads.len(), 2);
        assert!(leads.iter().all(|l| l.distance_miles.is_none()));
    }

    #[test]
    fn test_default_radius_applies_when_unspecified() {
        let eng = engine(); // default radius 25 miles
        let permits = vec![
            permit("24-100004-ROOF", "ROOF", None, Some(NEARBY)),
            permit("24-100005-ROOF", "ROOF", None, Some(FAR)),
        ];

        let far_distance = eng.enrich(&permits[1]).distance_miles.expect("far lead");
        assert!(far_distance <= 25.0, "fixture must sit inside 25 mi");

        // Both inside the default radius
        assert_eq!(eng.rank(&permits, None).len(), 2);
        // A tight explicit radius keeps only the nearby one
        let tight = eng.rank(&permits, Some(5.0));
        assert_eq!(tight.len(), 1);
        assert_eq!(tight[0].id, "24-100004-ROOF");
    }

    #[test]
    fn test_sorted_descending_by_score() {
        let eng = engine();
        let permits = vec![
            permit("24-100006-DEMO", "DEMO", Some(10_000.0), None),
            permit("24-100007-NEWC", "NEWC", Some(600_000.0), Some(NEARBY)),
            permit("24-100008-ROOF", "ROOF", Some(120_000.0), Some(NEARBY)),
        ];

        let leads = eng.rank(&permits, None);
        assert_eq!(leads.len(), 3);
        assert!(leads
            .windows(2)
            .all(|pair| pair[0].lead_score >= pair[1].lead_score));
        assert_eq!(leads[0].id, "24-100007-NEWC");
    }

    #[test]
    fn test_ties_preserve_input_order() {
        let eng = engine();
        // Identical permits score identically
        let permits = vec![
            permit("24-100009-ROOF", "ROOF", Some(80_000.0), Some(NEARBY)),
            permit("24-100010-ROOF", "ROOF", Some(80_000.0), Some(NEARBY)),
            permit("24-100011-ROOF", "ROOF", Some(80_000.0), Some(NEARBY)),
        ];

        let leads = eng.rank(&permits, None);
        let ids: Vec<&str> = leads.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["24-100009-ROOF", "24-100010-ROOF", "24-100011-ROOF"]
        );
    }

    #[test]
    fn test_no_record_dropped_by_enrichment() {
        let eng = engine();
        let permits = vec![
            permit("24-100012-ROOF", "ROOF", Some(80_000.0), Some(NEARBY)),
            permit("24-100013-DEMO", "DEMO", None, Some("{broken")),
            permit("24-100014-ELEC", "ELEC", None, None),
        ];

        // A generous radius: parse failures and unknown codes still show up
        let leads = eng.rank(&permits, Some(1_000.0));
        assert_eq!(leads.len(), 3);
    }
}
