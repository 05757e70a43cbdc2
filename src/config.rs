use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,

    pub fitbit_client_id: String,
    pub fitbit_client_secret: String,

    pub groq_api_key: String,
    pub groq_model: String,

    /// Upper bound on any single smartwatch/AI upstream call.
    pub provider_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            fitbit_client_id: env::var("FITBIT_CLIENT_ID").unwrap_or_else(|_| String::new()),
            fitbit_client_secret: env::var("FITBIT_CLIENT_SECRET")
                .unwrap_or_else(|_| String::new()),

            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_else(|_| String::new()),
            groq_model: env::var("GROQ_MODEL").unwrap_or_else(|_| "llama3-8b-8192".into()),

            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
