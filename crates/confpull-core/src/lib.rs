mod config;
mod error;
mod kind;
mod registry;
mod request;

pub use config::{
    ConfpullConfig, DEFAULT_BACKUP_DIR, DEFAULT_CONFIG_FILE_NAME, KEY_PASSPHRASE_ENV,
};
pub use error::{FailureKind, FlowError};
pub use kind::FileKind;
pub use registry::{validate_app_name, FileRegistry, KnownFile, DEFAULT_OAUTH_KEYS_PATH};
pub use request::FetchRequest;
