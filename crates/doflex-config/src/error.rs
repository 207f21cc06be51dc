use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "no valid DigitalOcean token was found. Provide one through:\n\
        - a JSON file {{\"token\": \"...\"}} named by DIGITALOCEAN_TOKEN_FILE_PATH\n\
        - the DIGITALOCEAN_TOKEN environment variable\n\
        - /etc/kubernetes/digitalocean.json"
    )]
    TokenNotFound,

    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidSetting {
        name: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
