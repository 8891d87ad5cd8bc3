//! The API forest.
//!
//! APIs form a forest of namespaces, types and members. Each row stores its parent offset
//! (or [`super::NO_ROW`] for roots) and an inline array of child offsets in insertion order,
//! followed by the declarations and usages of the API:
//!
//! ```text
//! guid: 16 | kind: u8 | parent: i32 | name: i32
//! child_count: i32, child: i32 x n
//! declaration_count: i32, (assembly: i32, markup: i32) x n
//! usage_count: i32, (usage_source: i32, percentage: f32) x n
//! ```

use std::{cmp::Ordering, fmt, iter::FusedIterator};

use strum::{EnumIter, FromRepr};
use uguid::Guid;

use crate::{
    catalog::TableKind,
    file::io::{guid_at, i32_at, u8_at},
    model::{row_reference, skip_array, ApiDeclaration, ApiUsage, Enumerator},
    Catalog,
};

pub(crate) mod fields {
    pub const GUID: usize = 0;
    pub const KIND: usize = 16;
    pub const PARENT: usize = 17;
    pub const NAME: usize = 21;
    pub const CHILDREN: usize = 25;
    pub const DECLARATION_SIZE: usize = 8;
    pub const USAGE_SIZE: usize = 8;
}

/// Base URL of the .NET API reference documentation.
const HELP_LINK_BASE: &str = "https://learn.microsoft.com/en-us/dotnet/api/";

/// Top-level namespaces sorted before all others, in reverse priority.
const NAMESPACE_PRIORITY_REVERSED: [&str; 3] = ["Windows", "Microsoft", "System"];

/// The kind of an API, stored as one byte.
///
/// The discriminant order of members is their sort priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromRepr, EnumIter, strum::Display,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum ApiKind {
    /// A namespace
    Namespace = 0,
    /// An interface
    Interface = 1,
    /// A delegate type
    Delegate = 2,
    /// An enum type
    Enum = 3,
    /// A value type
    Struct = 4,
    /// A class
    Class = 5,
    /// A constant field
    Constant = 6,
    /// A member of an enum
    #[strum(serialize = "enum item")]
    EnumItem = 7,
    /// A field
    Field = 8,
    /// An instance or static constructor
    Constructor = 9,
    /// A finalizer
    Destructor = 10,
    /// A property or indexer
    Property = 11,
    /// The getter of a property
    #[strum(serialize = "property getter")]
    PropertyGetter = 12,
    /// The setter of a property
    #[strum(serialize = "property setter")]
    PropertySetter = 13,
    /// A method
    Method = 14,
    /// An operator overload
    Operator = 15,
    /// An event
    Event = 16,
    /// The add accessor of an event
    #[strum(serialize = "event adder")]
    EventAdder = 17,
    /// The remove accessor of an event
    #[strum(serialize = "event remover")]
    EventRemover = 18,
    /// The raise accessor of an event
    #[strum(serialize = "event raiser")]
    EventRaiser = 19,
}

impl ApiKind {
    /// Returns `true` for interfaces, delegates, enums, structs and classes.
    #[must_use]
    pub fn is_type(self) -> bool {
        matches!(
            self,
            ApiKind::Interface
                | ApiKind::Delegate
                | ApiKind::Enum
                | ApiKind::Struct
                | ApiKind::Class
        )
    }

    /// Returns `true` for every kind declared inside a type.
    #[must_use]
    pub fn is_member(self) -> bool {
        (self as u8) >= (ApiKind::Constant as u8)
    }

    /// Returns `true` for property and event accessors.
    #[must_use]
    pub fn is_accessor(self) -> bool {
        matches!(
            self,
            ApiKind::PropertyGetter
                | ApiKind::PropertySetter
                | ApiKind::EventAdder
                | ApiKind::EventRemover
                | ApiKind::EventRaiser
        )
    }
}

/// A namespace, type or member.
///
/// # Examples
///
/// ```rust,no_run
/// # fn example(catalog: &apicatalog::Catalog) {
/// for api in catalog.all_apis().filter(|api| api.kind().is_type()) {
///     println!("{} -> {}", api.full_name(), api.help_link());
/// }
/// # }
/// ```
#[derive(Clone, Copy)]
pub struct Api<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

super::catalog_view!(Api, TableKind::Apis);

impl<'a> Api<'a> {
    /// Returns the stable id of this API.
    #[must_use]
    pub fn guid(&self) -> Guid {
        guid_at(self.table(), self.base() + fields::GUID)
    }

    /// Returns the API kind.
    #[must_use]
    pub fn kind(&self) -> ApiKind {
        ApiKind::from_repr(u8_at(self.table(), self.base() + fields::KIND))
            .unwrap_or(ApiKind::Namespace)
    }

    /// Returns the parent API; `None` for roots.
    #[must_use]
    pub fn parent(&self) -> Option<Api<'a>> {
        row_reference(i32_at(self.table(), self.base() + fields::PARENT))
            .map(|offset| Api::new(self.catalog, offset))
    }

    /// Returns the simple name, including type and call parameters, e.g. `Add(T)`.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.catalog
            .string(i32_at(self.table(), self.base() + fields::NAME))
    }

    /// Returns the children in insertion order.
    #[must_use]
    pub fn children(&self) -> Enumerator<'a, Api<'a>> {
        Enumerator::new(
            self.catalog,
            TableKind::Apis,
            self.offset,
            self.children_start(),
        )
    }

    /// Returns the declarations of this API, one per declaring assembly.
    #[must_use]
    pub fn declarations(&self) -> Enumerator<'a, ApiDeclaration<'a>> {
        Enumerator::new(
            self.catalog,
            TableKind::Apis,
            self.offset,
            self.declarations_start(),
        )
    }

    /// Returns the usage statistics of this API.
    #[must_use]
    pub fn usages(&self) -> Enumerator<'a, ApiUsage<'a>> {
        Enumerator::new(
            self.catalog,
            TableKind::Apis,
            self.offset,
            self.usages_start(),
        )
    }

    /// Returns the ancestors, nearest first.
    #[must_use]
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors {
            catalog: self.catalog,
            next: self.parent().map(|parent| parent.offset),
        }
    }

    /// Returns this API followed by its ancestors, nearest first.
    #[must_use]
    pub fn ancestors_and_self(&self) -> Ancestors<'a> {
        Ancestors {
            catalog: self.catalog,
            next: Some(self.offset),
        }
    }

    /// Returns all descendants in pre-order, children in insertion order.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants::from_roots(self.catalog, self.children())
    }

    /// Returns this API followed by all its descendants in pre-order.
    #[must_use]
    pub fn descendants_and_self(&self) -> Descendants<'a> {
        Descendants {
            catalog: self.catalog,
            stack: vec![self.offset],
        }
    }

    /// Returns the dotted name from the root, e.g. `System.Collections.Generic.List<T>.Add(T)`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut names: Vec<&str> = self.ancestors_and_self().map(|api| api.name()).collect();
        names.reverse();
        names.join(".")
    }

    /// Returns the name of the enclosing namespace, or an empty string outside any namespace.
    #[must_use]
    pub fn namespace_name(&self) -> &'a str {
        self.ancestors_and_self()
            .find(|api| api.kind() == ApiKind::Namespace)
            .map_or("", |api| api.name())
    }

    /// Returns the URL of the reference documentation page.
    ///
    /// The path is the lower-cased dotted name with generic arity written as `-N` and call
    /// parameters removed: `List<T>.Add(T)` becomes `list-1.add`.
    #[must_use]
    pub fn help_link(&self) -> String {
        let mut segments: Vec<&str> = self.ancestors_and_self().map(|api| api.name()).collect();
        segments.reverse();

        let mut link = String::from(HELP_LINK_BASE);
        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                link.push('.');
            }
            append_help_segment(&mut link, segment);
        }
        link
    }

    fn children_start(&self) -> usize {
        self.base() + fields::CHILDREN
    }

    fn declarations_start(&self) -> usize {
        skip_array(self.table(), self.children_start(), 4)
    }

    fn usages_start(&self) -> usize {
        skip_array(
            self.table(),
            self.declarations_start(),
            fields::DECLARATION_SIZE,
        )
    }
}

/// Appends one name to a help link, rewriting `<T,U>` to `-2` and stopping at `(`.
fn append_help_segment(link: &mut String, segment: &str) {
    let mut generic_depth = 0usize;
    let mut arity = 0usize;

    for c in segment.chars() {
        match c {
            '(' if generic_depth == 0 => break,
            '<' => {
                if generic_depth == 0 {
                    arity = 1;
                }
                generic_depth += 1;
            }
            '>' => {
                generic_depth = generic_depth.saturating_sub(1);
                if generic_depth == 0 {
                    link.push('-');
                    link.push_str(&arity.to_string());
                }
            }
            ',' if generic_depth == 1 => arity += 1,
            _ if generic_depth > 0 => {}
            _ => link.extend(c.to_lowercase()),
        }
    }
}

/// Splits a name into its base name and its type and call parameter counts.
fn name_shape(name: &str) -> (&str, usize, usize) {
    let base_end = name.find(['<', '(']).unwrap_or(name.len());
    let base = &name[..base_end];
    let rest = &name[base_end..];

    let type_parameters = if rest.starts_with('<') {
        top_level_items(&rest[1..], '>')
    } else {
        0
    };
    let parameters = rest
        .find('(')
        .map_or(0, |open| top_level_items(&rest[open + 1..], ')'));

    (base, type_parameters, parameters)
}

/// Counts the comma separated items before the `close` delimiter matching an already consumed
/// opening delimiter.
fn top_level_items(text: &str, close: char) -> usize {
    let mut depth = 0usize;
    let mut items = 0usize;
    let mut seen_content = false;

    for c in text.chars() {
        match c {
            '<' | '(' | '[' => depth += 1,
            c if c == close && depth == 0 => break,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => items += 1,
            c if c.is_whitespace() => continue,
            _ => {}
        }
        seen_content = true;
    }

    if seen_content {
        items + 1
    } else {
        0
    }
}

fn namespace_priority(name: &str) -> Option<usize> {
    let top_level = name.split('.').next().unwrap_or(name);
    NAMESPACE_PRIORITY_REVERSED
        .iter()
        .position(|candidate| *candidate == top_level)
}

impl Ord for Api<'_> {
    /// Orders namespaces before types and types before members; members by kind; well-known
    /// namespaces first; then by base name. Overloads with the same base name order by fewer
    /// type parameters, then fewer parameters, then by full name. Rows with identical names
    /// fall back to their offset.
    fn cmp(&self, other: &Self) -> Ordering {
        let kind = self.kind();
        let other_kind = other.kind();

        let result = kind_group(kind).cmp(&kind_group(other_kind));
        if result != Ordering::Equal {
            return result;
        }

        if kind.is_member() {
            let result = kind.cmp(&other_kind);
            if result != Ordering::Equal {
                return result;
            }
        }

        let name = self.name();
        let other_name = other.name();

        if kind == ApiKind::Namespace {
            // Higher index in the reversed list sorts first; unlisted namespaces sort last.
            let result = namespace_priority(other_name).cmp(&namespace_priority(name));
            if result != Ordering::Equal {
                return result;
            }
        }

        let (base, type_parameters, parameters) = name_shape(name);
        let (other_base, other_type_parameters, other_parameters) = name_shape(other_name);

        base.cmp(other_base)
            .then(type_parameters.cmp(&other_type_parameters))
            .then(parameters.cmp(&other_parameters))
            .then_with(|| name.cmp(other_name))
            .then_with(|| (self.catalog as *const Catalog).cmp(&(other.catalog as *const Catalog)))
            .then(self.offset.cmp(&other.offset))
    }
}

/// Namespaces, then types, then members.
fn kind_group(kind: ApiKind) -> u8 {
    if kind.is_member() {
        2
    } else if kind.is_type() {
        1
    } else {
        0
    }
}

impl PartialOrd for Api<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Api<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("id", &self.offset)
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

impl fmt::Display for Api<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Iterator following parent offsets up to a root.
#[derive(Clone)]
pub struct Ancestors<'a> {
    catalog: &'a Catalog,
    next: Option<u32>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = Api<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let api = Api::new(self.catalog, self.next?);
        self.next = api.parent().map(|parent| parent.offset);
        Some(api)
    }
}

impl FusedIterator for Ancestors<'_> {}

/// Pre-order iterator over a subtree or the whole forest.
///
/// Uses an explicit stack, so arbitrarily deep trees do not recurse.
#[derive(Clone)]
pub struct Descendants<'a> {
    catalog: &'a Catalog,
    stack: Vec<u32>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn from_roots(catalog: &'a Catalog, roots: Enumerator<'a, Api<'a>>) -> Self {
        Descendants {
            catalog,
            stack: roots.rev().map(|api| api.offset).collect(),
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = Api<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let api = Api::new(self.catalog, self.stack.pop()?);
        self.stack
            .extend(api.children().rev().map(|child| child.offset));
        Some(api)
    }
}

impl FusedIterator for Descendants<'_> {}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kind_classification() {
        let types: Vec<ApiKind> = ApiKind::iter().filter(|kind| kind.is_type()).collect();
        assert_eq!(
            types,
            [
                ApiKind::Interface,
                ApiKind::Delegate,
                ApiKind::Enum,
                ApiKind::Struct,
                ApiKind::Class
            ]
        );

        assert!(!ApiKind::Namespace.is_type());
        assert!(!ApiKind::Namespace.is_member());
        assert!(ApiKind::Constant.is_member());
        assert!(ApiKind::EventRaiser.is_member());
        assert!(ApiKind::PropertySetter.is_accessor());
        assert!(!ApiKind::Property.is_accessor());
        assert_eq!(ApiKind::iter().filter(|kind| kind.is_member()).count(), 14);
    }

    #[test]
    fn kind_repr_and_display() {
        assert_eq!(ApiKind::from_repr(14), Some(ApiKind::Method));
        assert_eq!(ApiKind::from_repr(20), None);
        assert_eq!(ApiKind::Class.to_string(), "class");
        assert_eq!(ApiKind::EnumItem.to_string(), "enum item");
        assert_eq!(ApiKind::PropertyGetter.to_string(), "property getter");
    }

    #[test]
    fn name_shapes() {
        assert_eq!(name_shape("List<T>"), ("List", 1, 0));
        assert_eq!(name_shape("Dictionary<TKey, TValue>"), ("Dictionary", 2, 0));
        assert_eq!(name_shape("Add(T)"), ("Add", 0, 1));
        assert_eq!(name_shape("Clear()"), ("Clear", 0, 0));
        assert_eq!(
            name_shape("Convert<TIn, TOut>(Func<TIn, TOut>, IList<TIn>)"),
            ("Convert", 2, 2)
        );
        assert_eq!(name_shape("Item[Int32]"), ("Item[Int32]", 0, 0));
        assert_eq!(name_shape("System"), ("System", 0, 0));
    }

    #[test]
    fn help_segments() {
        let mut link = String::new();
        append_help_segment(&mut link, "Dictionary<TKey,TValue>");
        assert_eq!(link, "dictionary-2");

        let mut link = String::new();
        append_help_segment(&mut link, "TryGetValue(TKey, out TValue)");
        assert_eq!(link, "trygetvalue");

        let mut link = String::new();
        append_help_segment(&mut link, "Select<TSource,TResult>(IEnumerable<TSource>)");
        assert_eq!(link, "select-2");

        let mut link = String::new();
        append_help_segment(&mut link, "Task<List<T>>");
        assert_eq!(link, "task-1");
    }

    #[test]
    fn namespace_priorities() {
        assert_eq!(namespace_priority("System.Collections"), Some(2));
        assert_eq!(namespace_priority("Microsoft.Win32"), Some(1));
        assert_eq!(namespace_priority("Windows"), Some(0));
        assert_eq!(namespace_priority("Newtonsoft.Json"), None);
        assert!(namespace_priority("Newtonsoft.Json") < namespace_priority("Windows"));
    }
}
