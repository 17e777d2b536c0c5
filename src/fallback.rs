use crate::models::RawPermit;

/// Sample permits bundled into the binary.
static STUB_PERMITS_JSON: &str = include_str!("../data/stub_permits.json");

/// Bundled sample dataset served when the permit store query fails.
///
/// The rows have the same raw shape the store returns and flow through the
/// lead engine like live rows, so fallback responses are indistinguishable
/// in structure from real ones.
pub fn stub_permits() -> Vec<RawPermit> {
    match serde_json::from_str(STUB_PERMITS_JSON) {
        Ok(permits) => permits,
        Err(e) => {
            tracing::error!("Bundled stub permit data failed to parse: {}", e);
            Vec::new()
        }
    }
}
