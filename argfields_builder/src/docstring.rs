use std::collections::BTreeMap;

use thiserror::Error;

/// The documentation attached to an attribute of a structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDocString {
    /// The docstring written directly below the attribute.
    pub docstring_below: Option<String>,
    /// The comment written on the line(s) above the attribute.
    pub comment_above: Option<String>,
    /// The comment written at the end of the attribute's line.
    pub comment_inline: Option<String>,
}

impl AttributeDocString {
    /// Document an attribute with the docstring below it.
    pub fn below(docstring: impl Into<String>) -> Self {
        Self {
            docstring_below: Some(docstring.into()),
            ..Self::default()
        }
    }

    /// Document an attribute with the comment above it.
    pub fn above(comment: impl Into<String>) -> Self {
        Self {
            comment_above: Some(comment.into()),
            ..Self::default()
        }
    }

    /// Document an attribute with its inline comment.
    pub fn inline(comment: impl Into<String>) -> Self {
        Self {
            comment_inline: Some(comment.into()),
            ..Self::default()
        }
    }

    /// The help text: the first non-empty of the docstring below, the comment above, and the inline comment.
    pub fn help(&self) -> Option<String> {
        [
            &self.docstring_below,
            &self.comment_above,
            &self.comment_inline,
        ]
        .into_iter()
        .flatten()
        .find(|text| !text.is_empty())
        .cloned()
    }
}

/// Error when looking up the documentation of an attribute.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocstringError {
    /// The documentation source does not describe the owner.
    #[error("no documentation for type '{owner}'.")]
    UnknownOwner {
        /// The owning structure.
        owner: String,
    },
    /// The owner is known, but has no such attribute.
    #[error("type '{owner}' has no attribute '{attribute}'.")]
    UnknownAttribute {
        /// The owning structure.
        owner: String,
        /// The attribute.
        attribute: String,
    },
}

/// A table of attribute documentation for a single structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocTable {
    owner: String,
    entries: BTreeMap<String, AttributeDocString>,
}

impl DocTable {
    pub(crate) fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            entries: BTreeMap::default(),
        }
    }

    pub(crate) fn insert(&mut self, attribute: impl Into<String>, doc: AttributeDocString) {
        self.entries.insert(attribute.into(), doc);
    }

    pub(crate) fn lookup(
        &self,
        owner: &str,
        attribute: &str,
    ) -> Result<AttributeDocString, DocstringError> {
        if owner != self.owner {
            return Err(DocstringError::UnknownOwner {
                owner: owner.to_string(),
            });
        }

        self.entries
            .get(attribute)
            .cloned()
            .ok_or_else(|| DocstringError::UnknownAttribute {
                owner: owner.to_string(),
                attribute: attribute.to_string(),
            })
    }
}
