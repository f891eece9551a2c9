use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hostname or URL: optional scheme, one or more `label.` segments, a 2+ letter TLD,
/// optional port and optional path.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?://)?([a-z0-9-]+\.)+[a-z]{2,}(:\d+)?(/.*)?$")
        .expect("url pattern is valid")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w-]+(\.[\w-]+)*@([\w-]+\.)+[a-zA-Z]{2,7}$").expect("email pattern is valid")
});

const MIN_PHONE_CHARS: usize = 10;

/// Business details submitted for a credibility assessment.
///
/// Optional fields arrive as empty strings from form clients; both `None` and a blank
/// string count as "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub business_name: String,
    pub domain: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub hashtags: Option<String>,
}

impl AnalysisRequest {
    pub fn new(business_name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            business_name: business_name.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Trim every field and strip scheme/`www.` from the domain.
    pub fn normalized(mut self) -> Self {
        self.business_name = self.business_name.trim().to_string();
        self.domain = normalize_domain(&self.domain);
        for field in [
            &mut self.email,
            &mut self.phone,
            &mut self.address,
            &mut self.facebook_url,
            &mut self.instagram_url,
            &mut self.hashtags,
        ] {
            *field = field
                .take()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
        }
        self
    }

    /// Check required fields and the shape of URL, email and phone values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.business_name.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "businessName",
            });
        }
        if self.domain.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "domain" });
        }
        if !is_valid_url(&self.domain) {
            return Err(ValidationError::InvalidUrl { field: "domain" });
        }
        if let Some(url) = provided(&self.facebook_url) {
            if !is_valid_url(url) {
                return Err(ValidationError::InvalidUrl {
                    field: "facebookUrl",
                });
            }
        }
        if let Some(url) = provided(&self.instagram_url) {
            if !is_valid_url(url) {
                return Err(ValidationError::InvalidUrl {
                    field: "instagramUrl",
                });
            }
        }
        if let Some(email) = provided(&self.email) {
            if !EMAIL_PATTERN.is_match(email) {
                return Err(ValidationError::InvalidEmail);
            }
        }
        if let Some(phone) = provided(&self.phone) {
            if phone.chars().count() < MIN_PHONE_CHARS {
                return Err(ValidationError::InvalidPhone);
            }
        }
        Ok(())
    }
}

/// Client-correctable problems with a submission. No network call is made when these occur.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please provide a value for `{field}`")]
    MissingField { field: &'static str },
    #[error("please provide a valid URL for `{field}`")]
    InvalidUrl { field: &'static str },
    #[error("please provide a valid email address")]
    InvalidEmail,
    #[error("please provide a valid phone number (at least 10 characters)")]
    InvalidPhone,
}

/// Strip a leading `http://`/`https://` scheme and a `www.` prefix.
pub fn normalize_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = strip_prefix_ignore_case(trimmed, "https://")
        .or_else(|| strip_prefix_ignore_case(trimmed, "http://"))
        .unwrap_or(trimmed);
    strip_prefix_ignore_case(without_scheme, "www.")
        .unwrap_or(without_scheme)
        .to_string()
}

pub fn is_valid_url(candidate: &str) -> bool {
    URL_PATTERN.is_match(candidate)
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        input.get(prefix.len()..)
    } else {
        None
    }
}

fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
