use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum number of tags a single trip can carry.
pub const MAX_TRIP_TAGS: usize = 7;

/// Color given to tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#22c55e";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Check that `name` can join `existing` without clashing.
///
/// Names are trimmed before comparison; the comparison itself is exact.
pub fn validate_new_tag_name(existing: &[Tag], name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyTagName);
    }
    if existing.iter().any(|t| t.name == name) {
        return Err(ValidationError::DuplicateTagName(name.to_string()));
    }
    Ok(name.to_string())
}

/// Check that `tag` can be attached to a trip currently holding `attached`.
pub fn validate_attach(attached: &[Tag], tag: &Tag) -> Result<(), ValidationError> {
    if attached.len() >= MAX_TRIP_TAGS {
        return Err(ValidationError::TooManyTags { max: MAX_TRIP_TAGS });
    }
    if attached.iter().any(|t| t.name == tag.name && t.id != tag.id) {
        return Err(ValidationError::DuplicateTagName(tag.name.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(n: usize) -> Vec<Tag> {
        (0..n)
            .map(|i| Tag::new(i.to_string(), format!("tag-{}", i), DEFAULT_TAG_COLOR))
            .collect()
    }

    #[test]
    fn test_new_tag_name_trimmed() {
        assert_eq!(validate_new_tag_name(&tags(2), "  beach "), Ok("beach".to_string()));
    }

    #[test]
    fn test_new_tag_name_rejects_duplicates_and_blank() {
        assert_eq!(
            validate_new_tag_name(&tags(2), " tag-1"),
            Err(ValidationError::DuplicateTagName("tag-1".to_string()))
        );
        assert_eq!(validate_new_tag_name(&tags(2), "   "), Err(ValidationError::EmptyTagName));
    }

    #[test]
    fn test_attach_cap() {
        let extra = Tag::new("x", "extra", DEFAULT_TAG_COLOR);
        assert!(validate_attach(&tags(6), &extra).is_ok());
        assert_eq!(
            validate_attach(&tags(7), &extra),
            Err(ValidationError::TooManyTags { max: 7 })
        );
    }

    #[test]
    fn test_attach_rejects_same_name_other_id() {
        let clash = Tag::new("other", "tag-0", "#000000");
        assert!(matches!(
            validate_attach(&tags(1), &clash),
            Err(ValidationError::DuplicateTagName(_))
        ));
    }
}
