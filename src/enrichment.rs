/// Lead scoring and geofiltering engine.
///
/// This module turns raw permit rows into ranked, distance-annotated leads:
/// 1. Parse the embedded location and measure distance from the business
/// 2. Classify the permit code against the product relevance table
/// 3. Compute the lead score from value, relevance, and proximity
/// 4. Apply the radius cut and sort best-first
///
/// The whole pass is pure and synchronous; degenerate inputs (missing value,
/// missing coordinates, unknown codes) degrade to zero contribution instead
/// of failing, so a bad row never drops a lead or poisons a batch.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::models::{EnrichedLead, RawPermit};

/// Radius of Earth in miles.
const EARTH_RADIUS_MILES: f64 = 3959.0;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Great-circle distance between two points in miles (haversine).
///
/// Pure function of its inputs; no range validation is performed, so
/// out-of-range coordinates produce a mathematically defined but
/// meaningless result. Callers validate upstream where it matters.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Product category a permit code maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Fencing & Gates")]
    FencingGates,
    #[serde(rename = "Metal Roofing")]
    MetalRoofing,
    #[serde(rename = "Structural Steel")]
    StructuralSteel,
    #[serde(rename = "General Construction")]
    GeneralConstruction,
    #[serde(rename = "Opportunity")]
    Opportunity,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    /// Flat bonus stacked on top of the priority bonus for direct product
    /// matches. Only applied to relevant permits.
    fn bonus(self) -> f64 {
        match self {
            Category::FencingGates => 20.0,
            Category::MetalRoofing | Category::StructuralSteel => 15.0,
            Category::GeneralConstruction | Category::Opportunity | Category::Other => 0.0,
        }
    }
}

/// Sales priority tier of a permit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Highest,
    High,
    Medium,
    None,
}

impl Priority {
    fn bonus(self) -> f64 {
        match self {
            Priority::Highest => 50.0,
            Priority::High => 40.0,
            Priority::Medium => 25.0,
            Priority::None => 0.0,
        }
    }
}

/// Classification attached to a relevant permit code.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceEntry {
    pub category: Category,
    pub priority: Priority,
    pub description: String,
    /// Display color for map markers.
    pub color: String,
}

impl RelevanceEntry {
    pub fn new(category: Category, priority: Priority, description: &str, color: &str) -> Self {
        Self {
            category,
            priority,
            description: description.to_string(),
            color: color.to_string(),
        }
    }
}

/// Immutable mapping from permit-type code to product relevance.
///
/// Built once at startup and never mutated. Codes absent from the table are
/// not an error; they classify as Other/none and score no relevance bonus.
#[derive(Debug, Clone)]
pub struct RelevanceTable {
    entries: HashMap<String, RelevanceEntry>,
}

impl RelevanceTable {
    /// Build a table from arbitrary entries (used by tests and custom
    /// deployments; production uses [`RelevanceTable::default`]).
    pub fn from_entries(entries: impl IntoIterator<Item = (String, RelevanceEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn lookup(&self, code: &str) -> Option<&RelevanceEntry> {
        self.entries.get(code)
    }

    /// All codes in the table, for the store's allow-list filter.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.entries.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Entries sorted by code, for the codes endpoint.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (&String, &RelevanceEntry)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }
}

impl Default for RelevanceTable {
    /// The product-relevant permit codes observed in the municipal feed.
    fn default() -> Self {
        let entries = [
            // Roofing & siding - direct product match
            (
                "ROOF",
                RelevanceEntry::new(
                    Category::MetalRoofing,
                    Priority::High,
                    "Roofing - Metal panels, trim, accessories",
                    "#3b82f6",
                ),
            ),
            // Structural steel - high-value projects
            (
                "RNVS",
                RelevanceEntry::new(
                    Category::StructuralSteel,
                    Priority::High,
                    "Structural Renovation - Steel reinforcement, framing",
                    "#ef4444",
                ),
            ),
            (
                "NEWC",
                RelevanceEntry::new(
                    Category::StructuralSteel,
                    Priority::High,
                    "New Commercial - Steel buildings, framing",
                    "#ef4444",
                ),
            ),
            // General construction - good opportunities
            (
                "RNVN",
                RelevanceEntry::new(
                    Category::GeneralConstruction,
                    Priority::Medium,
                    "Non-structural Renovation - Metal roofing, siding, trim",
                    "#f59e0b",
                ),
            ),
            // Demolition - often leads to new construction
            (
                "DEMO",
                RelevanceEntry::new(
                    Category::Opportunity,
                    Priority::Medium,
                    "Demolition - Often leads to new construction",
                    "#a855f7",
                ),
            ),
        ];

        Self::from_entries(entries.map(|(code, entry)| (code.to_string(), entry)))
    }
}

/// Compute the lead score from construction value, relevance, and distance.
///
/// The score is a sum of independent weighted components, rounded to the
/// nearest integer. There are no error paths: an absent value or distance
/// contributes zero.
pub fn lead_score(value: f64, relevance: Option<&RelevanceEntry>, distance_miles: Option<f64>) -> u32 {
    // Base score from construction value, capped at 30 points
    let mut score = (value / 10_000.0).min(30.0).max(0.0);

    if let Some(entry) = relevance {
        score += entry.priority.bonus();
        score += entry.category.bonus();
    }

    // High-value project bonuses; all applicable tiers stack
    if value >= 50_000.0 {
        score += 10.0;
    }
    if value >= 100_000.0 {
        score += 15.0;
    }
    if value >= 250_000.0 {
        score += 20.0;
    }
    if value >= 500_000.0 {
        score += 25.0;
    }

    // Distance bonus, nearest bracket only (closer is much better for delivery)
    if let Some(distance) = distance_miles {
        score += if distance <= 5.0 {
            25.0
        } else if distance <= 10.0 {
            20.0
        } else if distance <= 15.0 {
            15.0
        } else if distance <= 25.0 {
            10.0
        } else if distance <= 35.0 {
            5.0
        } else {
            0.0
        };
    }

    score.round().max(0.0) as u32
}

/// Parse the embedded `location_1` JSON string into coordinates.
///
/// The store encodes latitude/longitude as strings or numbers; partial or
/// non-finite coordinates are treated as wholly absent. An unparseable
/// string is logged and treated as absent rather than failing the batch.
fn parse_location(raw: &str, permit_id: &str) -> Option<(f64, f64)> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!("Could not parse location for permit: {}", permit_id);
            return None;
        }
    };

    let latitude = coordinate(value.get("latitude"))?;
    let longitude = coordinate(value.get("longitude"))?;
    Some((latitude, longitude))
}

fn coordinate(field: Option<&Value>) -> Option<f64> {
    let parsed = match field? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn round_tenth(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}

/// The lead scorer & filter engine.
///
/// Holds the fixed reference point, the relevance table, and the default
/// search radius as explicit configuration so the engine is independently
/// testable with arbitrary locations and tables.
#[derive(Debug, Clone)]
pub struct LeadEngine {
    reference_point: GeoPoint,
    relevance: RelevanceTable,
    default_radius: f64,
}

impl LeadEngine {
    pub fn new(reference_point: GeoPoint, relevance: RelevanceTable, default_radius: f64) -> Self {
        Self {
            reference_point,
            relevance,
            default_radius,
        }
    }

    /// Engine with the default relevance table, located per the service
    /// configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            GeoPoint {
                lat: config.business_lat,
                lng: config.business_lng,
            },
            RelevanceTable::default(),
            config.default_radius_miles,
        )
    }

    pub fn reference_point(&self) -> GeoPoint {
        self.reference_point
    }

    pub fn relevance(&self) -> &RelevanceTable {
        &self.relevance
    }

    pub fn default_radius(&self) -> f64 {
        self.default_radius
    }

    /// Transform one raw permit into an enriched lead.
    ///
    /// Never fails: unparseable locations yield null coordinates, unknown
    /// codes classify as Other, and absent values score zero.
    pub fn enrich(&self, permit: &RawPermit) -> EnrichedLead {
        let coordinates = permit
            .location_1
            .as_deref()
            .and_then(|raw| parse_location(raw, &permit.permit_id));

        let distance_miles = coordinates.map(|(lat, lng)| {
            round_tenth(haversine_miles(self.reference_point, GeoPoint { lat, lng }))
        });

        let entry = self.relevance.lookup(&permit.code);
        let value = permit.constrval.unwrap_or(0.0);
        let score = lead_score(value, entry, distance_miles);

        EnrichedLead {
            id: permit.permit_id.clone(),
            address: permit.address.clone(),
            issuedate: permit.issuedate,
            code: permit.code.clone(),
            permit_type: permit.permit_type.clone(),
            description: permit.description.clone(),
            value,
            applicant: permit.applicant.clone(),
            contractor: permit.contractors.clone(),
            status: permit.currentstatus.clone(),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lng)| lng),
            distance_miles,
            is_relevant: entry.is_some(),
            category: entry.map_or(Category::Other, |e| e.category),
            priority: entry.map_or(Priority::None, |e| e.priority),
            category_description: entry.map_or_else(String::new, |e| e.description.clone()),
            lead_score: score,
        }
    }

    /// Enrich a batch, apply the radius cut, and sort best-first.
    ///
    /// Leads without a distance are always retained: missing geodata must
    /// not lose a lead. The radius boundary is inclusive. Sorting is stable,
    /// so leads with equal scores keep their input order (the store already
    /// orders by construction value).
    pub fn rank(&self, permits: &[RawPermit], radius: Option<f64>) -> Vec<EnrichedLead> {
        let radius = radius.unwrap_or(self.default_radius);

        let mut leads: Vec<EnrichedLead> = permits
            .iter()
            .map(|permit| self.enrich(permit))
            .filter(|lead| lead.distance_miles.map_or(true, |d| d <= radius))
            .collect();

        leads.sort_by(|a, b| b.lead_score.cmp(&a.lead_score));
        leads
    }
}
