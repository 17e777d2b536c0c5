use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::enrichment::{Category, Priority};

// ============ Permit Store Models ============

/// A raw building-permit row as it comes out of the `permit_leads` table.
///
/// Read-only input to the lead engine; never mutated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RawPermit {
    /// Unique identifier assigned by the municipality.
    pub permit_id: String,
    /// Street address of the job site.
    pub address: Option<String>,
    /// Date the permit was issued.
    pub issuedate: Option<NaiveDate>,
    /// Permit-type code (e.g., "ROOF", "NEWC").
    pub code: String,
    /// Human-readable permit type.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub permit_type: Option<String>,
    /// Free-text work description.
    pub description: Option<String>,
    /// Declared construction value in dollars. May be absent or zero.
    pub constrval: Option<f64>,
    /// Applicant name.
    pub applicant: Option<String>,
    /// Contractor name(s).
    pub contractors: Option<String>,
    /// Current permit status.
    pub currentstatus: Option<String>,
    /// Embedded location, stored as a JSON-ish string that may fail to parse.
    pub location_1: Option<String>,
}

/// A permit annotated with relevance, distance, and a lead score.
///
/// Built fresh on every request; discarded after being returned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedLead {
    pub id: String,
    pub address: Option<String>,
    pub issuedate: Option<NaiveDate>,
    pub code: String,
    #[serde(rename = "type")]
    pub permit_type: Option<String>,
    pub description: Option<String>,
    /// Construction value, absent values normalized to 0.
    pub value: f64,
    pub applicant: Option<String>,
    pub contractor: Option<String>,
    pub status: Option<String>,
    /// Both present or both absent; partial coordinates are treated as absent.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Great-circle distance from the business location in miles, rounded
    /// to one decimal place. `None` when coordinates are absent.
    pub distance_miles: Option<f64>,
    /// Whether the permit code has an entry in the relevance table.
    pub is_relevant: bool,
    pub category: Category,
    pub priority: Priority,
    pub category_description: String,
    /// Ranking score; leads are served best-first.
    pub lead_score: u32,
}

/// Caller-supplied filter spec for the permits endpoint.
///
/// All fields are optional; date bounds are ISO dates, `codes` is a
/// comma-separated allow-list, and `radius` defaults to the configured
/// search radius.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermitFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub codes: Option<String>,
    pub keyword: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub radius: Option<f64>,
    pub status: Option<String>,
}

impl PermitFilters {
    /// Parse the comma-separated `codes` param into an allow-list.
    ///
    /// Returns `None` when the param is absent; an empty list when it is
    /// present but names no codes (a caller error the handler rejects).
    pub fn code_list(&self) -> Option<Vec<String>> {
        self.codes.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

/// One relevance-table entry as served to filter ribbons and map legends.
#[derive(Debug, Clone, Serialize)]
pub struct RelevantCode {
    pub code: String,
    pub category: Category,
    pub priority: Priority,
    pub description: String,
    /// Display color for map markers, e.g. "#3b82f6".
    pub color: String,
}

// ============ Contractor Pipeline Models ============

/// A raw contractor row from `fence_contractors_raw` / `gc_contractors_raw`.
#[derive(Debug, Clone, FromRow)]
pub struct ContractorRow {
    pub id: i64,
    pub company_name: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub site: Option<String>,
    pub email_1: Option<String>,
    pub full_address: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    /// Carrier type from the phone-enricher column
    /// (`phone.phones_enricher.carrier_type`); "mobile" marks cell numbers.
    pub carrier_type: Option<String>,
}

impl ContractorRow {
    /// Whether this contractor has a confirmed mobile number.
    pub fn has_mobile(&self) -> bool {
        self.phone.is_some() && self.carrier_type.as_deref() == Some("mobile")
    }
}

/// Stages of the contractor status board. Cards start in `New`; stage
/// changes happen client-side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    New,
    Queued,
    Contacted,
    FollowUp,
    Done,
}

/// A contractor card on the status board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCard {
    pub id: String,
    pub company: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    pub status: Stage,
    pub created_at: DateTime<Utc>,
}

/// A named pipeline of contractor cards.
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    pub id: String,
    pub name: String,
    pub cards: Vec<PipelineCard>,
}
