use std::fmt;

use chrono::NaiveDate;

use crate::{
    catalog::TableKind,
    file::io::{f32_at, i32_at},
    model::{enumerator::ArrayElement, Api},
    Catalog,
};

pub(crate) mod fields {
    // Usage source row
    pub const NAME: usize = 0;
    pub const DAY_NUMBER: usize = 4;
    pub const SOURCE_SIZE: usize = 8;

    // Usage entry inline in an API row
    pub const USAGE_SOURCE: usize = 0;
    pub const PERCENTAGE: usize = 4;
    pub const USAGE_SIZE: usize = 8;
}

/// A source of usage statistics, e.g. a crawl of public packages at a given date.
#[derive(Clone, Copy)]
pub struct UsageSource<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

super::catalog_view!(UsageSource, TableKind::UsageSources);

impl<'a> UsageSource<'a> {
    /// Returns the name of the source.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.catalog
            .string(i32_at(self.table(), self.base() + fields::NAME))
    }

    /// Returns the stored day number, counting 0001-01-01 as day 1.
    #[must_use]
    pub fn day_number(&self) -> i32 {
        i32_at(self.table(), self.base() + fields::DAY_NUMBER)
    }

    /// Returns the date the usage data was collected, if the day number is a valid date.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_num_days_from_ce_opt(self.day_number())
    }
}

impl fmt::Debug for UsageSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsageSource")
            .field("id", &self.offset)
            .field("name", &self.name())
            .field("date", &self.date())
            .finish()
    }
}

/// How often an API is used according to one [`UsageSource`].
#[derive(Clone, Copy)]
pub struct ApiUsage<'a> {
    catalog: &'a Catalog,
    api: u32,
    position: usize,
}

impl<'a> ApiUsage<'a> {
    /// Returns the API this usage entry belongs to.
    #[must_use]
    pub fn api(&self) -> Api<'a> {
        Api::new(self.catalog, self.api)
    }

    /// Returns the source of the statistic.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn source(&self) -> UsageSource<'a> {
        let table = self.catalog.table(TableKind::Apis);
        let offset = i32_at(table, self.position + fields::USAGE_SOURCE);
        UsageSource::new(self.catalog, offset as u32)
    }

    /// Returns the share of the source's corpus using the API, in `0.0..=1.0`.
    #[must_use]
    pub fn percentage(&self) -> f32 {
        f32_at(
            self.catalog.table(TableKind::Apis),
            self.position + fields::PERCENTAGE,
        )
    }
}

impl PartialEq for ApiUsage<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.catalog, other.catalog) && self.position == other.position
    }
}

impl Eq for ApiUsage<'_> {}

impl<'a> ArrayElement<'a> for ApiUsage<'a> {
    const SIZE: usize = fields::USAGE_SIZE;

    fn read(catalog: &'a Catalog, _source: TableKind, owner: u32, position: usize) -> Self {
        ApiUsage {
            catalog,
            api: owner,
            position,
        }
    }
}

impl fmt::Debug for ApiUsage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiUsage")
            .field("api", &self.api)
            .field("source", &self.source().name())
            .field("percentage", &self.percentage())
            .finish()
    }
}
