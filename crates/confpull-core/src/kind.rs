/// Format category used to pick a validation rule for a downloaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Certificate,
    EnvFile,
    PrivateKey,
    JsonConfig,
    Unknown,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Certificate => "crt",
            Self::EnvFile => "env",
            Self::PrivateKey => "key",
            Self::JsonConfig => "json",
            Self::Unknown => "unknown",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::EnvFile => "environment file",
            Self::PrivateKey => "private key",
            Self::JsonConfig => "json config",
            Self::Unknown => "unrecognized file",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "crt" | "cer" => Some(Self::Certificate),
            "env" => Some(Self::EnvFile),
            "key" => Some(Self::PrivateKey),
            "json" => Some(Self::JsonConfig),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Derives the kind from the text after the last `.` of `file_name`,
    /// so `.env` counts as extension `env`.
    pub fn from_file_name(file_name: &str) -> Self {
        let Some((_, extension)) = file_name.rsplit_once('.') else {
            return Self::Unknown;
        };
        if extension.is_empty() {
            return Self::Unknown;
        }
        match extension.to_ascii_lowercase().as_str() {
            "crt" | "cer" => Self::Certificate,
            "env" => Self::EnvFile,
            "key" => Self::PrivateKey,
            "json" => Self::JsonConfig,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
