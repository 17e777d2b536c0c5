use crate::errors::{AppError, ResultExt};
use crate::models::{ContractorRow, PermitFilters, Pipeline, PipelineCard, RawPermit, Stage};
use chrono::Utc;
use sqlx::PgPool;

/// Queries against the municipal permit store.
pub struct PermitService {
    pool: PgPool,
}

impl PermitService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch raw permit rows matching the caller's filter spec.
    ///
    /// The query-level filters (date range, code allow-list, keyword, value
    /// bounds, status) are applied here; the radius cut and score sort need
    /// the enriched fields and happen in the lead engine afterwards. Rows
    /// are ordered by construction value so the fixed cap keeps the highest
    /// value permits, and rows without a location are skipped at the source.
    ///
    /// # Arguments
    ///
    /// * `filters` - The caller-supplied filter spec.
    /// * `codes` - Permit-code allow-list (the caller's, or the relevance
    ///   table's codes when no filter was given).
    /// * `limit` - Fixed row cap for the query.
    pub async fn fetch_permits(
        &self,
        filters: &PermitFilters,
        codes: &[String],
        limit: i64,
    ) -> Result<Vec<RawPermit>, AppError> {
        let keyword = filters
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(|keyword| format!("%{}%", keyword));

        let permits = sqlx::query_as::<_, RawPermit>(
            r#"
            SELECT permit_id::text AS permit_id,
                   address,
                   issuedate::date AS issuedate,
                   code,
                   "type",
                   description,
                   constrval::float8 AS constrval,
                   applicant,
                   contractors,
                   currentstatus,
                   location_1::text AS location_1
            FROM permit_leads
            WHERE location_1 IS NOT NULL
              AND COALESCE(constrval, 0) >= 0
              AND code = ANY($1)
              AND ($2::date IS NULL OR issuedate::date >= $2)
              AND ($3::date IS NULL OR issuedate::date <= $3)
              AND ($4::text IS NULL
                   OR address ILIKE $4
                   OR contractors ILIKE $4
                   OR description ILIKE $4)
              AND ($5::float8 IS NULL OR constrval >= $5)
              AND ($6::float8 IS NULL OR constrval <= $6)
              AND ($7::text IS NULL OR currentstatus = $7)
            ORDER BY constrval DESC NULLS LAST
            LIMIT $8
            "#,
        )
        .bind(codes.to_vec())
        .bind(filters.start_date)
        .bind(filters.end_date)
        .bind(keyword)
        .bind(filters.min_value)
        .bind(filters.max_value)
        .bind(filters.status.as_deref())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("fetching permit leads")?;

        tracing::info!("Fetched {} permit rows from store", permits.len());
        Ok(permits)
    }
}

/// Queries against the raw contractor-contact tables.
pub struct ContractorService {
    pool: PgPool,
}

impl ContractorService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch both contractor tables and organize them into the four fixed
    /// pipelines, partitioned on whether the contact phone's enriched
    /// carrier type is mobile.
    pub async fn fetch_pipelines(&self) -> Result<Vec<Pipeline>, AppError> {
        let fence = self.fetch_contractors("fence_contractors_raw").await?;
        let gc = self.fetch_contractors("gc_contractors_raw").await?;

        tracing::info!(
            "Fetched {} fence and {} GC contractors",
            fence.len(),
            gc.len()
        );
        Ok(build_pipelines(fence, gc))
    }

    async fn fetch_contractors(&self, table: &str) -> Result<Vec<ContractorRow>, AppError> {
        // Table name comes from the two fixed literals above, never from input
        let sql = format!(
            r#"
            SELECT id::int8 AS id,
                   company_name,
                   city,
                   phone,
                   site,
                   email_1,
                   full_address,
                   rating::float8 AS rating,
                   reviews::int8 AS reviews,
                   "phone.phones_enricher.carrier_type" AS carrier_type
            FROM {}
            "#,
            table
        );

        sqlx::query_as::<_, ContractorRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("fetching contractors from {}", table))
    }
}

fn build_pipelines(fence: Vec<ContractorRow>, gc: Vec<ContractorRow>) -> Vec<Pipeline> {
    let (fence_mobile, fence_rest): (Vec<_>, Vec<_>) =
        fence.into_iter().partition(|c| c.has_mobile());
    let (gc_mobile, gc_rest): (Vec<_>, Vec<_>) = gc.into_iter().partition(|c| c.has_mobile());

    vec![
        pipeline("fence-mobile", "Fence – Mobile", fence_mobile),
        pipeline("fence-no-mobile", "Fence – No Mobile", fence_rest),
        pipeline("gc-mobile", "GC – Mobile", gc_mobile),
        pipeline("gc-no-mobile", "GC – No Mobile", gc_rest),
    ]
}

fn pipeline(id: &str, name: &str, rows: Vec<ContractorRow>) -> Pipeline {
    Pipeline {
        id: id.to_string(),
        name: name.to_string(),
        cards: rows.into_iter().map(card_from_contractor).collect(),
    }
}

/// All cards start in the `new` stage; the board mutates stages client-side.
fn card_from_contractor(row: ContractorRow) -> PipelineCard {
    PipelineCard {
        id: row.id.to_string(),
        company: row.company_name,
        city: row.city,
        phone: row.phone,
        website: row.site,
        email: row.email_1,
        address: row.full_address,
        rating: row.rating,
        reviews: row.reviews,
        status: Stage::New,
        created_at: Utc::now(),
    }
}
