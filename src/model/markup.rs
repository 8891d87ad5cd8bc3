//! Signature markup of API declarations.
//!
//! A markup record lives in the string table and is a sequence of tokens:
//!
//! ```text
//! token_count: i32
//! token_count x { kind: u8, text: i32 (string offset), [guid: 16 bytes if kind == Reference] }
//! ```
//!
//! An all-zero GUID marks a reference to an API that is not part of the catalog.

use std::{fmt, iter::FusedIterator};

use strum::FromRepr;
use uguid::Guid;

use crate::{
    catalog::TableKind,
    file::io::{guid_at, i32_at, u8_at, GUID_SIZE},
    model::Api,
    Catalog,
};

/// The syntactic role of a markup token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum MarkupTokenKind {
    /// A line break
    LineBreak = 0,
    /// Whitespace
    Whitespace = 1,
    /// Punctuation such as `[`, `(` or `;`
    Punctuation = 2,
    /// A language keyword
    Keyword = 3,
    /// An identifier that does not refer to a catalog API
    Identifier = 4,
    /// A reference to another API, carrying its stable id
    Reference = 5,
    /// A string literal, including its quotes
    LiteralString = 6,
    /// A numeric literal
    LiteralNumber = 7,
}

/// One token of a signature.
#[derive(Clone, Copy)]
pub struct MarkupToken<'a> {
    catalog: &'a Catalog,
    kind: MarkupTokenKind,
    text: &'a str,
    reference: Option<Guid>,
}

impl<'a> MarkupToken<'a> {
    /// Returns the token kind.
    #[must_use]
    pub fn kind(&self) -> MarkupTokenKind {
        self.kind
    }

    /// Returns the token text.
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Returns the stable id of the referenced API for resolved reference tokens.
    #[must_use]
    pub fn reference(&self) -> Option<Guid> {
        self.reference
    }

    /// Resolves the referenced API within the catalog.
    #[must_use]
    pub fn reference_api(&self) -> Option<Api<'a>> {
        self.reference.and_then(|guid| self.catalog.api_by_guid(guid))
    }
}

impl fmt::Debug for MarkupToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkupToken")
            .field("kind", &self.kind)
            .field("text", &self.text)
            .field("reference", &self.reference)
            .finish()
    }
}

/// The signature markup of a declaration.
#[derive(Clone, Copy)]
pub struct Markup<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

impl<'a> Markup<'a> {
    pub(crate) fn new(catalog: &'a Catalog, offset: u32) -> Self {
        Markup { catalog, offset }
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        super::array_len(self.catalog.table(TableKind::Strings), self.offset as usize)
    }

    /// Returns `true` if the markup has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the tokens in order.
    #[must_use]
    pub fn tokens(&self) -> MarkupTokens<'a> {
        MarkupTokens {
            catalog: self.catalog,
            position: self.offset as usize + 4,
            remaining: self.len(),
        }
    }
}

impl PartialEq for Markup<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.catalog, other.catalog) && self.offset == other.offset
    }
}

impl Eq for Markup<'_> {}

impl fmt::Debug for Markup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tokens()).finish()
    }
}

/// Renders the signature as plain text.
impl fmt::Display for Markup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in self.tokens() {
            match token.kind() {
                MarkupTokenKind::LineBreak => f.write_str("\n")?,
                _ => f.write_str(token.text())?,
            }
        }
        Ok(())
    }
}

/// Iterator over the tokens of a [`Markup`].
///
/// Tokens have variable width, so the sequence can only be walked forward.
#[derive(Clone)]
pub struct MarkupTokens<'a> {
    catalog: &'a Catalog,
    position: usize,
    remaining: usize,
}

impl<'a> Iterator for MarkupTokens<'a> {
    type Item = MarkupToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let table = self.catalog.table(TableKind::Strings);
        let kind = MarkupTokenKind::from_repr(u8_at(table, self.position))
            .unwrap_or(MarkupTokenKind::Identifier);
        let text = self.catalog.string(i32_at(table, self.position + 1));
        self.position += 5;

        let mut reference = None;
        if kind == MarkupTokenKind::Reference {
            let guid = guid_at(table, self.position);
            self.position += GUID_SIZE;
            if guid != Guid::ZERO {
                reference = Some(guid);
            }
        }

        Some(MarkupToken {
            catalog: self.catalog,
            kind,
            text,
            reference,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for MarkupTokens<'_> {}

impl FusedIterator for MarkupTokens<'_> {}
