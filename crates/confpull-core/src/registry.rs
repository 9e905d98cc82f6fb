use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::FileKind;

pub const DEFAULT_OAUTH_KEYS_PATH: &str = ".env.files/keys/oAuth/";

/// One entry of the static file registry.
///
/// `path` is the directory template the file is installed under. Entries with
/// `per_application = true` get an extra directory named after the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnownFile {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub per_application: bool,
    #[serde(default, with = "kind_tag", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FileKind>,
}

impl KnownFile {
    pub fn global(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            per_application: false,
            kind: None,
        }
    }

    pub fn per_application(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            per_application: true,
            kind: None,
        }
    }

    pub fn kind(&self) -> FileKind {
        self.kind
            .unwrap_or_else(|| FileKind::from_file_name(&self.name))
    }
}

/// Immutable lookup table from logical file name to install location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRegistry {
    files: BTreeMap<String, KnownFile>,
}

impl Default for FileRegistry {
    fn default() -> Self {
        let files = [
            KnownFile::global(".env", ""),
            KnownFile::per_application("upaid-trevica-openapi.crt", DEFAULT_OAUTH_KEYS_PATH),
            KnownFile::per_application("upaid.pl.key", DEFAULT_OAUTH_KEYS_PATH),
            KnownFile::global("frontend.json", "config/frontend_config/"),
        ]
        .into_iter()
        .map(|entry| (entry.name.clone(), entry))
        .collect();
        Self { files }
    }
}

impl FileRegistry {
    pub fn from_entries(entries: Vec<KnownFile>) -> Result<Self> {
        let mut files = BTreeMap::new();
        for entry in entries {
            validate_file_name(&entry.name)?;
            let name = entry.name.clone();
            if files.insert(name.clone(), entry).is_some() {
                return Err(anyhow!("duplicate registry entry for '{name}'"));
            }
        }
        Ok(Self { files })
    }

    pub fn get(&self, file_name: &str) -> Option<&KnownFile> {
        self.files.get(file_name)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.files.contains_key(file_name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &KnownFile> {
        self.files.values()
    }

    /// Validation kind for `file_name`: the entry's explicit tag when it has one,
    /// otherwise whatever the extension says.
    pub fn kind_for(&self, file_name: &str) -> FileKind {
        match self.files.get(file_name) {
            Some(entry) => entry.kind(),
            None => FileKind::from_file_name(file_name),
        }
    }

    /// Maps a logical file name to its install path, relative to the working root
    /// unless the entry's template is absolute.
    ///
    /// Global entries ignore `app_name`. Returns `None` for names missing from the
    /// registry and for per-application entries without a usable application name.
    pub fn resolve(&self, file_name: &str, app_name: Option<&str>) -> Option<PathBuf> {
        let entry = self.files.get(file_name)?;
        let base = PathBuf::from(&entry.path);
        if !entry.per_application {
            return Some(base.join(&entry.name));
        }

        let app_name = app_name?;
        validate_app_name(app_name).ok()?;
        Some(base.join(app_name).join(&entry.name))
    }
}

/// Application names become a single directory component of the install path.
pub fn validate_app_name(app_name: &str) -> Result<()> {
    if app_name.trim().is_empty() {
        return Err(anyhow!("application name must not be empty"));
    }
    if app_name == "." || app_name == ".." {
        return Err(anyhow!("invalid application name: {app_name}"));
    }
    if app_name.contains(['/', '\\']) {
        return Err(anyhow!(
            "invalid application name '{app_name}': must not contain path separators"
        ));
    }
    Ok(())
}

pub(crate) fn validate_file_name(file_name: &str) -> Result<()> {
    if file_name.trim().is_empty() {
        return Err(anyhow!("registry file name must not be empty"));
    }
    if file_name == "." || file_name == ".." || file_name.contains(['/', '\\']) {
        return Err(anyhow!(
            "invalid registry file name '{file_name}': must be a bare file name"
        ));
    }
    Ok(())
}

mod kind_tag {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::FileKind;

    pub fn serialize<S>(value: &Option<FileKind>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(kind) => serializer.serialize_str(kind.as_str()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<FileKind>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(tag) => FileKind::parse(&tag)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown file kind '{tag}'"))),
        }
    }
}
