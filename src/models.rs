use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One public comment of a docket, as listed by the comments endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Nested listing attributes (title, dates, agency, ...)
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub links: CommentLinks,
    /// Full comment text, filled in by the detail fetch
    #[serde(skip)]
    pub comment_text: Field<String>,
    /// Attachment URLs, filled in by the detail fetch
    #[serde(skip)]
    pub attach_link: Field<AttachmentLinks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentLinks {
    /// Detail endpoint of the comment
    #[serde(rename = "self")]
    pub self_url: String,
}

/// A column value that is either present or was never populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Present(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    pub fn present(&self) -> Option<&T> {
        match self {
            Field::Absent => None,
            Field::Present(value) => Some(value),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Present(value),
            None => Field::Absent,
        }
    }
}

/// Attachment links extracted from a comment's `included` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentLinks {
    /// The detail response had no `included` section
    NoAttachments,
    /// One URL per included attachment, in response order
    Links(Vec<String>),
}

impl AttachmentLinks {
    /// Links to download, empty for [`AttachmentLinks::NoAttachments`]
    pub fn urls(&self) -> &[String] {
        match self {
            AttachmentLinks::NoAttachments => &[],
            AttachmentLinks::Links(urls) => urls,
        }
    }

    /// CSV rendering: `""` without attachments, a JSON array of URLs otherwise
    pub fn to_cell(&self) -> String {
        match self {
            AttachmentLinks::NoAttachments => String::new(),
            AttachmentLinks::Links(urls) => {
                serde_json::to_string(urls).unwrap_or_else(|_| String::from("[]"))
            }
        }
    }
}

/// All comments of one docket, in page order then in-page order.
#[derive(Debug, Clone)]
pub struct AggregateTable {
    pub docket_id: String,
    /// `totalElements` reported by the first listing page
    pub total_elements: u64,
    pub records: Vec<CommentRecord>,
}

impl AggregateTable {
    pub fn new(docket_id: impl Into<String>, total_elements: u64) -> Self {
        Self {
            docket_id: docket_id.into(),
            total_elements,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn extend(&mut self, page: Vec<CommentRecord>) {
        self.records.extend(page);
    }

    /// Dense positional index 0..N-1, one entry per record
    pub fn index(&self) -> std::ops::Range<usize> {
        0..self.records.len()
    }

    /// Identifiers that appear more than once, in first-repeat order
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for record in &self.records {
            if !seen.insert(record.id.as_str()) && !duplicates.contains(&record.id.as_str()) {
                duplicates.push(record.id.as_str());
            }
        }
        duplicates
    }

    /// Number of attachment links collected across all records
    pub fn attachment_count(&self) -> usize {
        self.records
            .iter()
            .filter_map(|record| record.attach_link.present())
            .map(|links| links.urls().len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> CommentRecord {
        CommentRecord {
            id: id.to_string(),
            kind: "comments".to_string(),
            attributes: Map::new(),
            links: CommentLinks {
                self_url: format!("https://api.regulations.gov/v4/comments/{}", id),
            },
            comment_text: Field::Absent,
            attach_link: Field::Absent,
        }
    }

    #[test]
    fn test_attachment_links_cell() {
        assert_eq!(AttachmentLinks::NoAttachments.to_cell(), "");
        assert!(AttachmentLinks::NoAttachments.urls().is_empty());

        let links = AttachmentLinks::Links(vec![
            "https://downloads.regulations.gov/A-1/attachment_1.pdf".to_string(),
            "https://downloads.regulations.gov/A-1/attachment_2.docx".to_string(),
        ]);
        assert_eq!(
            links.to_cell(),
            r#"["https://downloads.regulations.gov/A-1/attachment_1.pdf","https://downloads.regulations.gov/A-1/attachment_2.docx"]"#
        );
        assert_eq!(AttachmentLinks::Links(vec![]).to_cell(), "[]");
    }

    #[test]
    fn test_duplicate_ids_and_index() {
        let mut table = AggregateTable::new("CMS-2011-0142", 4);
        table.extend(vec![record("a"), record("b")]);
        table.extend(vec![record("b"), record("c")]);

        assert_eq!(table.len(), 4);
        assert_eq!(table.index(), 0..4);
        assert_eq!(table.duplicate_ids(), vec!["b"]);
    }

    #[test]
    fn test_field_from_option() {
        assert_eq!(Field::from(Some(3)), Field::Present(3));
        assert_eq!(Field::<i32>::from(None), Field::Absent);
        assert!(!Field::<String>::default().is_present());
    }
}
