use anyhow::{anyhow, Result};

/// A single fetch invocation: the source URL plus the names derived from its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub file_name: String,
    /// Second-to-last path segment, empty when the URL path has only one segment.
    pub app_name: String,
}

impl FetchRequest {
    pub fn parse(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("configuration url must not be empty"));
        }

        let segments = path_segments(trimmed);
        let Some((file_name, rest)) = segments.split_last() else {
            return Err(anyhow!(
                "configuration url has no file name segment: {trimmed}"
            ));
        };
        let app_name = rest.last().copied().unwrap_or_default();

        Ok(Self {
            url: trimmed.to_string(),
            file_name: (*file_name).to_string(),
            app_name: app_name.to_string(),
        })
    }

    pub fn app_name(&self) -> Option<&str> {
        if self.app_name.is_empty() {
            None
        } else {
            Some(&self.app_name)
        }
    }
}

fn path_segments(url: &str) -> Vec<&str> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);

    let path = match without_query.split_once("://") {
        Some((_, after_scheme)) => match after_scheme.split_once('/') {
            Some((_authority, path)) => path,
            None => "",
        },
        None => without_query,
    };

    path.split('/').filter(|segment| !segment.is_empty()).collect()
}
