use serde::Deserialize;

/// Default business location: 1641 Poland Ave, New Orleans, LA 70117.
const DEFAULT_BUSINESS_LAT: f64 = 29.9584;
const DEFAULT_BUSINESS_LNG: f64 = -90.0192;
const DEFAULT_BUSINESS_ADDRESS: &str = "1641 Poland Ave, New Orleans, LA 70117";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Latitude of the business location all distances are measured from.
    pub business_lat: f64,
    /// Longitude of the business location.
    pub business_lng: f64,
    /// Street address of the business location (served to map clients).
    pub business_address: String,
    /// Search radius in miles applied when the caller does not supply one.
    pub default_radius_miles: f64,
    /// Row cap for the permit store query.
    pub permit_query_limit: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            business_lat: std::env::var("BUSINESS_LAT")
                .unwrap_or_else(|_| DEFAULT_BUSINESS_LAT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BUSINESS_LAT must be a valid number"))
                .and_then(|lat: f64| {
                    if !(-90.0..=90.0).contains(&lat) {
                        anyhow::bail!("BUSINESS_LAT must be between -90 and 90");
                    }
                    Ok(lat)
                })?,
            business_lng: std::env::var("BUSINESS_LNG")
                .unwrap_or_else(|_| DEFAULT_BUSINESS_LNG.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BUSINESS_LNG must be a valid number"))
                .and_then(|lng: f64| {
                    if !(-180.0..=180.0).contains(&lng) {
                        anyhow::bail!("BUSINESS_LNG must be between -180 and 180");
                    }
                    Ok(lng)
                })?,
            business_address: std::env::var("BUSINESS_ADDRESS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BUSINESS_ADDRESS.to_string()),
            default_radius_miles: std::env::var("DEFAULT_RADIUS_MILES")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DEFAULT_RADIUS_MILES must be a valid number"))
                .and_then(|radius: f64| {
                    if radius <= 0.0 {
                        anyhow::bail!("DEFAULT_RADIUS_MILES must be positive");
                    }
                    Ok(radius)
                })?,
            permit_query_limit: std::env::var("PERMIT_QUERY_LIMIT")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PERMIT_QUERY_LIMIT must be a valid number"))
                .and_then(|limit: i64| {
                    if limit <= 0 {
                        anyhow::bail!("PERMIT_QUERY_LIMIT must be positive");
                    }
                    Ok(limit)
                })?,
        };

        // Log successful configuration load (without credentials)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!(
            "Business location: {}, {} ({})",
            config.business_lat,
            config.business_lng,
            config.business_address
        );
        tracing::debug!("Default radius: {} miles", config.default_radius_miles);
        tracing::debug!("Permit query limit: {}", config.permit_query_limit);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
