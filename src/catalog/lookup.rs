//! Binary search over the sorted fact tables.
//!
//! Obsoletion, platform support and preview requirement rows have a fixed width and start with
//! the same `(api: i32, assembly: i32)` key. Rows are sorted by that key compared as signed
//! integers, so assembly-wide facts (api `-1`) come first. Only the platform support table
//! holds more than one row per key.
//!
//! Lookups are split in two pure steps: [`find_first_row`] locates the first row of the run
//! matching a key and [`rows_with_key`] walks forward over the run.

use std::iter::FusedIterator;

use crate::file::io::i32_at;

/// Reads the `(api, assembly)` key of the row at byte `offset`.
fn key_at(table: &[u8], offset: usize) -> (i32, i32) {
    (i32_at(table, offset), i32_at(table, offset + 4))
}

/// Returns the index of the first row keyed `(api, assembly)`, or `None` if no row matches.
///
/// Rows beyond the last complete row are ignored.
#[must_use]
pub fn find_first_row(table: &[u8], row_size: usize, api: i32, assembly: i32) -> Option<usize> {
    if row_size < 8 {
        return None;
    }

    let key = (api, assembly);
    let mut low = 0;
    let mut high = table.len() / row_size;
    let mut found = None;

    while low < high {
        let mid = low + (high - low) / 2;
        match key_at(table, mid * row_size).cmp(&key) {
            std::cmp::Ordering::Less => low = mid + 1,
            std::cmp::Ordering::Greater => high = mid,
            std::cmp::Ordering::Equal => {
                found = Some(mid);
                break;
            }
        }
    }

    let mut row = found?;
    while row > 0 && key_at(table, (row - 1) * row_size) == key {
        row -= 1;
    }
    Some(row)
}

/// Returns an iterator over the byte offsets of all rows keyed `(api, assembly)`, in stored
/// order.
#[must_use]
pub fn rows_with_key(table: &[u8], row_size: usize, api: i32, assembly: i32) -> KeyRun<'_> {
    let rows = if row_size == 0 {
        0
    } else {
        table.len() / row_size
    };
    let next = find_first_row(table, row_size, api, assembly).unwrap_or(rows);

    KeyRun {
        table,
        row_size,
        key: (api, assembly),
        next,
        rows,
    }
}

/// Forward scan over a run of rows sharing one key. Yields byte offsets within the table.
#[derive(Clone, Debug)]
pub struct KeyRun<'a> {
    table: &'a [u8],
    row_size: usize,
    key: (i32, i32),
    next: usize,
    rows: usize,
}

impl Iterator for KeyRun<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.rows {
            return None;
        }

        let offset = self.next * self.row_size;
        if key_at(self.table, offset) != self.key {
            self.next = self.rows;
            return None;
        }

        self.next += 1;
        Some(offset)
    }
}

impl FusedIterator for KeyRun<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::io::write_le;

    const ROW: usize = 13;

    fn table(keys: &[(i32, i32)]) -> Vec<u8> {
        let mut data = Vec::new();
        for (index, (api, assembly)) in keys.iter().enumerate() {
            write_le(&mut data, *api);
            write_le(&mut data, *assembly);
            write_le(&mut data, i32::try_from(index).unwrap());
            write_le(&mut data, 1u8);
        }
        data
    }

    fn payloads(data: &[u8], run: KeyRun<'_>) -> Vec<i32> {
        run.map(|offset| i32_at(data, offset + 8)).collect()
    }

    #[test]
    fn find_unique_keys() {
        let data = table(&[(-1, 0), (-1, 40), (0, 0), (12, 40), (96, 0)]);

        assert_eq!(find_first_row(&data, ROW, -1, 0), Some(0));
        assert_eq!(find_first_row(&data, ROW, -1, 40), Some(1));
        assert_eq!(find_first_row(&data, ROW, 12, 40), Some(3));
        assert_eq!(find_first_row(&data, ROW, 96, 0), Some(4));
        assert_eq!(find_first_row(&data, ROW, 12, 0), None);
        assert_eq!(find_first_row(&data, ROW, 200, 0), None);
        assert_eq!(find_first_row(&data, ROW, -2, 0), None);
    }

    #[test]
    fn find_first_of_duplicate_run() {
        let keys = [
            (0, 0),
            (5, 8),
            (5, 8),
            (5, 8),
            (5, 8),
            (5, 8),
            (5, 8),
            (5, 8),
            (9, 0),
        ];
        let data = table(&keys);

        assert_eq!(find_first_row(&data, ROW, 5, 8), Some(1));
        assert_eq!(
            payloads(&data, rows_with_key(&data, ROW, 5, 8)),
            [1, 2, 3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn run_at_table_edges() {
        let data = table(&[(1, 1), (1, 1), (2, 2), (3, 3), (3, 3)]);

        assert_eq!(payloads(&data, rows_with_key(&data, ROW, 1, 1)), [0, 1]);
        assert_eq!(payloads(&data, rows_with_key(&data, ROW, 3, 3)), [3, 4]);
        assert_eq!(payloads(&data, rows_with_key(&data, ROW, 2, 2)), [2]);
        assert_eq!(rows_with_key(&data, ROW, 4, 4).count(), 0);
    }

    #[test]
    fn empty_table() {
        assert_eq!(find_first_row(&[], ROW, 0, 0), None);
        assert_eq!(rows_with_key(&[], ROW, 0, 0).count(), 0);
    }

    #[test]
    fn ignores_trailing_partial_row() {
        let mut data = table(&[(1, 1)]);
        data.extend_from_slice(&[0xFF; 5]);

        assert_eq!(find_first_row(&data, ROW, 1, 1), Some(0));
        assert_eq!(rows_with_key(&data, ROW, 1, 1).count(), 1);
    }
}
