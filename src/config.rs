use std::env;
use std::env::VarError;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_token: Option<String>,
    pub firebase_project_id: String,
    pub firebase_api_key: String,
    pub firebase_jwks_url: String,
    pub storage_type: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    pub upload_dir: String,
    pub base_url: String,
    pub port: u16,
    pub testing_mode: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "file:farmabeth365.db".to_string()),
            database_token: env::var("DATABASE_TOKEN").ok(),
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")?,
            firebase_api_key: env::var("FIREBASE_API_KEY")?,
            firebase_jwks_url: env::var("FIREBASE_JWKS_URL").unwrap_or_else(|_| {
                "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
                    .to_string()
            }),
            storage_type: env::var("STORAGE_TYPE").unwrap_or_else(|_| "local".to_string()),
            cloudinary_cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .unwrap_or_else(|_| "didxwy6sp".to_string()),
            cloudinary_upload_preset: env::var("CLOUDINARY_UPLOAD_PRESET")
                .unwrap_or_else(|_| "imagenesFarmaBeth".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            testing_mode: env::var("TESTING_MODE")
                .map(|v| v == "true")
                .unwrap_or(false),
        })
    }
}
