//! Response envelopes returned by the Regulations.gov v4 comments API

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::CommentRecord;

/// Listing page returned by `GET /v4/comments?filter[docketId]=...`
#[derive(Debug, Deserialize)]
pub struct CommentPage {
    /// Pagination metadata for the whole listing
    pub meta: PageMeta,
    /// Comments on this page, in page order
    pub data: Vec<CommentRecord>,
}

/// Pagination metadata of a listing page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Total number of pages at the requested page size
    pub total_pages: u32,
    /// Total number of comments in the docket
    pub total_elements: u64,
    /// Whether another page follows this one
    #[serde(default)]
    pub has_next_page: bool,
}

/// Detail response returned by a comment's `self` link with `include=attachments`
#[derive(Debug, Deserialize)]
pub struct CommentDetailEnvelope {
    pub data: CommentDetailData,
    /// Present only when the comment has attachments
    #[serde(default)]
    pub included: Option<Vec<IncludedAttachment>>,
}

#[derive(Debug, Deserialize)]
pub struct CommentDetailData {
    /// Full comment metadata, including the `comment` text
    pub attributes: Map<String, Value>,
}

/// One entry of the `included` section
#[derive(Debug, Deserialize)]
pub struct IncludedAttachment {
    pub attributes: AttachmentAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentAttributes {
    /// Available renditions of the attachment; the first one is downloaded
    #[serde(default)]
    pub file_formats: Option<Vec<FileFormat>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFormat {
    pub file_url: String,
}

/// Regulations.gov API endpoints and constants
pub struct RegulationsApi;

impl RegulationsApi {
    /// Base URL for the Regulations.gov API
    pub const BASE_URL: &'static str = "https://api.regulations.gov";
    /// Comments listing endpoint
    pub const COMMENTS_ENDPOINT: &'static str = "/v4/comments";
    /// Query parameter filtering the listing by docket
    pub const DOCKET_FILTER: &'static str = "filter[docketId]";
    /// Response header carrying the remaining request quota
    pub const RATE_LIMIT_HEADER: &'static str = "X-RateLimit-Remaining";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_page_deserialization() {
        let sample = r#"{
            "data": [
                {
                    "id": "CMS-2011-0142-0002",
                    "type": "comments",
                    "attributes": {
                        "documentType": "Public Submission",
                        "lastModifiedDate": "2011-11-08T19:20:26Z",
                        "highlightedContent": "",
                        "withdrawn": false,
                        "agencyId": "CMS",
                        "title": "Comment from Jane Doe",
                        "objectId": "0900006480f5e6a1",
                        "postedDate": "2011-11-08T05:00:00Z"
                    },
                    "links": {
                        "self": "https://api.regulations.gov/v4/comments/CMS-2011-0142-0002"
                    }
                }
            ],
            "meta": {
                "hasNextPage": true,
                "hasPreviousPage": false,
                "numberOfElements": 25,
                "pageNumber": 1,
                "pageSize": 25,
                "totalElements": 61,
                "totalPages": 3,
                "firstPage": true,
                "lastPage": false
            }
        }"#;

        let page: CommentPage = serde_json::from_str(sample).unwrap();
        assert_eq!(page.meta.total_pages, 3);
        assert_eq!(page.meta.total_elements, 61);
        assert!(page.meta.has_next_page);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "CMS-2011-0142-0002");
        assert_eq!(
            page.data[0].links.self_url,
            "https://api.regulations.gov/v4/comments/CMS-2011-0142-0002"
        );
        assert_eq!(page.data[0].attributes["agencyId"], "CMS");
    }

    #[test]
    fn test_detail_without_included() {
        let sample = r#"{"data": {"id": "X-1", "attributes": {"comment": "Hello"}}}"#;
        let detail: CommentDetailEnvelope = serde_json::from_str(sample).unwrap();
        assert!(detail.included.is_none());
        assert_eq!(detail.data.attributes["comment"], "Hello");
    }
}
