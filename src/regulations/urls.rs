//! URL construction and API key handling

use std::fmt;
use std::path::Path;

use crate::regulations::{RegulationsApi, RegulationsError};

/// Regulations.gov API key. `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    /// Resolve the key from an inline value, then a key file, then the environment
    pub fn resolve(
        inline: Option<&str>,
        file: Option<&Path>,
        env: Option<&str>,
    ) -> Result<Self, RegulationsError> {
        if let Some(key) = inline.filter(|key| !key.trim().is_empty()) {
            return Ok(Self::new(key));
        }

        if let Some(path) = file {
            let key = std::fs::read_to_string(path)?;
            if key.trim().is_empty() {
                return Err(RegulationsError::MissingApiKey);
            }
            return Ok(Self::new(key));
        }

        match env.filter(|key| !key.trim().is_empty()) {
            Some(key) => Ok(Self::new(key)),
            None => Err(RegulationsError::MissingApiKey),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Builds the query URLs for one API host
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base_url: String,
    api_key: ApiKey,
}

impl UrlBuilder {
    pub fn new(base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Listing URL for one page (1-indexed) of a docket's comments.
    ///
    /// The docket id is passed through as-is; a malformed id is rejected by the
    /// remote API, not here.
    pub fn docket_page(&self, docket_id: &str, page_number: u32, page_size: u32) -> String {
        format!(
            "{}{}?{}={}&page[number]={}&page[size]={}&api_key={}",
            self.base_url,
            RegulationsApi::COMMENTS_ENDPOINT,
            RegulationsApi::DOCKET_FILTER,
            docket_id,
            page_number,
            page_size,
            self.api_key.as_str()
        )
    }

    /// Smallest possible listing request, used only to read the quota header
    pub fn quota_probe(&self) -> String {
        format!(
            "{}{}?page[number]=1&page[size]={}&api_key={}",
            self.base_url,
            RegulationsApi::COMMENTS_ENDPOINT,
            crate::config::MIN_PAGE_SIZE,
            self.api_key.as_str()
        )
    }

    /// Detail URL of a comment, asking for its attachments to be included
    pub fn comment_detail(&self, self_url: &str) -> String {
        format!(
            "{}?include=attachments&api_key={}",
            self_url,
            self.api_key.as_str()
        )
    }
}

/// Replace the value of an `api_key` query parameter so URLs can be logged
pub fn redact(url: &str) -> String {
    match url.find("api_key=") {
        Some(start) => {
            let value_start = start + "api_key=".len();
            let value_end = url[value_start..]
                .find('&')
                .map(|offset| value_start + offset)
                .unwrap_or(url.len());
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn builder() -> UrlBuilder {
        UrlBuilder::new("https://api.regulations.gov/", ApiKey::new("DEMO_KEY"))
    }

    #[test]
    fn test_docket_page_url() {
        let url = builder().docket_page("CMS-2011-0142", 2, 25);
        assert_eq!(
            url,
            "https://api.regulations.gov/v4/comments?filter[docketId]=CMS-2011-0142&page[number]=2&page[size]=25&api_key=DEMO_KEY"
        );
        // Pure function of its inputs
        assert_eq!(url, builder().docket_page("CMS-2011-0142", 2, 25));
    }

    #[test]
    fn test_comment_detail_url() {
        let url = builder().comment_detail("https://api.regulations.gov/v4/comments/CMS-2011-0142-0002");
        assert_eq!(
            url,
            "https://api.regulations.gov/v4/comments/CMS-2011-0142-0002?include=attachments&api_key=DEMO_KEY"
        );
    }

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("https://x/v4/comments?filter[docketId]=A&api_key=SECRET&page[size]=5"),
            "https://x/v4/comments?filter[docketId]=A&api_key=***&page[size]=5"
        );
        assert_eq!(redact("https://x/c/1?include=attachments&api_key=SECRET"), "https://x/c/1?include=attachments&api_key=***");
        assert_eq!(redact("https://x/file.pdf"), "https://x/file.pdf");
    }

    #[test]
    fn test_api_key_resolution_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "FILE_KEY").unwrap();

        let key = ApiKey::resolve(Some("INLINE"), Some(file.path()), Some("ENV")).unwrap();
        assert_eq!(key.as_str(), "INLINE");

        let key = ApiKey::resolve(None, Some(file.path()), Some("ENV")).unwrap();
        assert_eq!(key.as_str(), "FILE_KEY");

        let key = ApiKey::resolve(None, None, Some("ENV")).unwrap();
        assert_eq!(key.as_str(), "ENV");

        assert!(matches!(
            ApiKey::resolve(None, None, None),
            Err(RegulationsError::MissingApiKey)
        ));
        assert_eq!(format!("{:?}", ApiKey::new("SECRET")), "ApiKey(***)");
    }
}
