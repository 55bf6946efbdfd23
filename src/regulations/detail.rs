//! Per-comment detail fetching: full text, metadata and attachment links

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{AggregateTable, AttachmentLinks, Field};
use crate::regulations::fetcher::{RateLimit, RateLimitedFetcher};
use crate::regulations::urls::{redact, UrlBuilder};
use crate::regulations::{CommentDetailEnvelope, RegulationsError};

/// Full attributes and attachment links of one comment
#[derive(Debug, Clone)]
pub struct CommentDetail {
    pub attributes: Map<String, Value>,
    pub attachments: AttachmentLinks,
}

impl CommentDetail {
    /// The `comment` attribute. A missing key is an error, `null` is absent text.
    pub fn comment_text(&self, url: &str) -> Result<Field<String>, RegulationsError> {
        match self.attributes.get("comment") {
            None => Err(RegulationsError::MissingField {
                field: "comment",
                url: redact(url),
            }),
            Some(Value::Null) => Ok(Field::Absent),
            Some(Value::String(text)) => Ok(Field::Present(text.clone())),
            Some(other) => Ok(Field::Present(other.to_string())),
        }
    }
}

/// Fetches comment details through the shared rate-limited fetcher
pub struct CommentDetailFetcher<'a> {
    fetcher: &'a RateLimitedFetcher,
    urls: &'a UrlBuilder,
}

impl<'a> CommentDetailFetcher<'a> {
    pub fn new(fetcher: &'a RateLimitedFetcher, urls: &'a UrlBuilder) -> Self {
        Self { fetcher, urls }
    }

    pub async fn fetch_detail(
        &self,
        self_url: &str,
        rate_limit: RateLimit,
    ) -> Result<(CommentDetail, RateLimit), RegulationsError> {
        let url = self.urls.comment_detail(self_url);
        let (envelope, rate_limit): (CommentDetailEnvelope, _) =
            self.fetcher.fetch_json(&url, rate_limit).await?;

        let attachments = extract_attachment_links(&envelope, &url)?;
        Ok((
            CommentDetail {
                attributes: envelope.data.attributes,
                attachments,
            },
            rate_limit,
        ))
    }

    /// Fill `comment_text` and `attach_link` for every record, in index order.
    ///
    /// Strictly one comment at a time: every call spends from the same quota.
    /// The first failure aborts the whole batch.
    pub async fn attach_details(
        &self,
        table: &mut AggregateTable,
        rate_limit: RateLimit,
    ) -> Result<RateLimit, RegulationsError> {
        let mut rate_limit = rate_limit;
        let total = table.len();

        for (index, record) in table.records.iter_mut().enumerate() {
            let (detail, updated) = self.fetch_detail(&record.links.self_url, rate_limit).await?;
            rate_limit = updated;

            record.comment_text = detail.comment_text(&record.links.self_url)?;
            record.attach_link = Field::Present(detail.attachments);

            debug!(
                "Comment {}/{} {}: {} attachment(s), quota remaining {}",
                index + 1,
                total,
                record.id,
                record.attach_link.present().map(|links| links.urls().len()).unwrap_or(0),
                rate_limit
            );
        }

        Ok(rate_limit)
    }
}

/// First file-format URL of every included attachment, in response order.
///
/// No `included` section means the comment has no attachments.
pub fn extract_attachment_links(
    envelope: &CommentDetailEnvelope,
    url: &str,
) -> Result<AttachmentLinks, RegulationsError> {
    let Some(included) = &envelope.included else {
        return Ok(AttachmentLinks::NoAttachments);
    };

    included
        .iter()
        .map(|attachment| {
            attachment
                .attributes
                .file_formats
                .as_ref()
                .and_then(|formats| formats.first())
                .map(|format| format.file_url.clone())
                .ok_or_else(|| RegulationsError::MissingField {
                    field: "fileFormats",
                    url: redact(url),
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(AttachmentLinks::Links)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://api.regulations.gov/v4/comments/CMS-2011-0142-0009?include=attachments&api_key=K";

    fn envelope(json: &str) -> CommentDetailEnvelope {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_links_follow_included_order() {
        let detail = envelope(
            r#"{
                "data": {"id": "CMS-2011-0142-0009", "attributes": {"comment": "See attached"}},
                "included": [
                    {"id": "a1", "attributes": {"title": "Letter", "fileFormats": [
                        {"fileUrl": "https://downloads.regulations.gov/CMS-2011-0142-0009/attachment_1.pdf", "format": "pdf", "size": 1024},
                        {"fileUrl": "https://downloads.regulations.gov/CMS-2011-0142-0009/attachment_1.docx", "format": "docx"}
                    ]}},
                    {"id": "a2", "attributes": {"fileFormats": [
                        {"fileUrl": "https://downloads.regulations.gov/CMS-2011-0142-0009/attachment_2.pdf"}
                    ]}}
                ]
            }"#,
        );

        let links = extract_attachment_links(&detail, URL).unwrap();
        assert_eq!(
            links,
            AttachmentLinks::Links(vec![
                "https://downloads.regulations.gov/CMS-2011-0142-0009/attachment_1.pdf".to_string(),
                "https://downloads.regulations.gov/CMS-2011-0142-0009/attachment_2.pdf".to_string(),
            ])
        );
    }

    #[test]
    fn test_no_included_is_sentinel() {
        let detail = envelope(r#"{"data": {"attributes": {"comment": "Plain"}}}"#);
        let links = extract_attachment_links(&detail, URL).unwrap();
        assert_eq!(links, AttachmentLinks::NoAttachments);
        assert_eq!(links.to_cell(), "");
    }

    #[test]
    fn test_attachment_without_file_formats_is_an_error() {
        let detail = envelope(
            r#"{"data": {"attributes": {"comment": "x"}}, "included": [{"attributes": {"fileFormats": null}}]}"#,
        );
        let err = extract_attachment_links(&detail, URL).unwrap_err();
        assert!(matches!(err, RegulationsError::MissingField { field: "fileFormats", .. }));
        assert!(!err.to_string().contains("api_key=K"));
    }

    #[test]
    fn test_comment_text() {
        let mut attributes = Map::new();
        attributes.insert("comment".to_string(), Value::String("I support this rule".to_string()));
        let detail = CommentDetail {
            attributes,
            attachments: AttachmentLinks::NoAttachments,
        };
        assert_eq!(detail.comment_text(URL).unwrap(), Field::Present("I support this rule".to_string()));

        let mut attributes = Map::new();
        attributes.insert("comment".to_string(), Value::Null);
        let detail = CommentDetail { attributes, attachments: AttachmentLinks::NoAttachments };
        assert_eq!(detail.comment_text(URL).unwrap(), Field::Absent);

        let detail = CommentDetail { attributes: Map::new(), attachments: AttachmentLinks::NoAttachments };
        assert!(matches!(
            detail.comment_text(URL),
            Err(RegulationsError::MissingField { field: "comment", .. })
        ));
    }
}
