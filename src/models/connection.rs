use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SmartwatchConnection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: Provider,
    // Tokens never leave the server.
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_sync: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "watch_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Fitbit,
    #[sqlx(rename = "google-fit")]
    #[serde(rename = "google-fit")]
    GoogleFit,
    #[sqlx(rename = "apple-health")]
    #[serde(rename = "apple-health")]
    AppleHealth,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Fitbit => "fitbit",
            Provider::GoogleFit => "google-fit",
            Provider::AppleHealth => "apple-health",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// POST /api/watch/connect/:provider. Fitbit sends an OAuth `code`;
/// Google Fit passes its tokens straight through.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub code: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderBody {
    pub provider: Provider,
}

/// Public view of a connection for GET /api/watch/status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub provider: Provider,
    pub is_active: bool,
    pub last_sync: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&SmartwatchConnection> for ConnectionStatus {
    fn from(conn: &SmartwatchConnection) -> Self {
        Self {
            provider: conn.provider,
            is_active: conn.is_active,
            last_sync: conn.last_sync,
            expires_at: conn.expires_at,
        }
    }
}
