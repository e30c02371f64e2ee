//! Variable-width LZW decoding.
//!
//! Codes start at 9 bits and grow to at most 12; code 256 clears the
//! table, 257 ends the data. With `/EarlyChange` (the default) the width
//! grows one code earlier than the table size alone would require.

use bitreader::BitReader;

const CLEAR_TABLE: usize = 256;
const EOD: usize = 257;
const TABLE_BASE: usize = 258;
const MAX_ENTRIES: usize = 4096;

pub(crate) fn decode(data: &[u8], early_change: bool) -> Option<Vec<u8>> {
    let mut table = Table::new(early_change);
    let mut reader = BitReader::new(data);
    let mut decoded = vec![];
    let mut prev: Option<usize> = None;

    loop {
        let code = reader.read_u16(table.code_width()).ok()? as usize;

        match code {
            CLEAR_TABLE => {
                table.clear();
                prev = None;
            }
            EOD => return Some(decoded),
            code => {
                if let Some(entry) = table.get(code) {
                    decoded.extend_from_slice(entry);

                    if let Some(prev) = prev {
                        let first = table.get(code)?[0];
                        table.extend(prev, first)?;
                    }
                } else {
                    // The one-ahead case: the entry being defined is the
                    // previous sequence plus its own first byte.
                    let prev = prev?;
                    let first = table.get(prev)?[0];
                    let entry = table.extend(prev, first)?;

                    decoded.extend_from_slice(entry);
                }

                prev = Some(code);
            }
        }
    }
}

struct Table {
    entries: Vec<Vec<u8>>,
    early_change: bool,
}

impl Table {
    fn new(early_change: bool) -> Self {
        let mut entries: Vec<Vec<u8>> = (0..=255).map(|b| vec![b]).collect();

        // Placeholders so entry indices line up past the two control codes.
        entries.push(vec![]);
        entries.push(vec![]);

        Self {
            entries,
            early_change,
        }
    }

    fn get(&self, code: usize) -> Option<&[u8]> {
        let entry = self.entries.get(code)?;

        if entry.is_empty() {
            return None;
        }

        Some(entry)
    }

    fn extend(&mut self, prev: usize, byte: u8) -> Option<&[u8]> {
        if self.entries.len() >= MAX_ENTRIES {
            return None;
        }

        let mut entry = Vec::with_capacity(self.entries[prev].len() + 1);
        entry.extend_from_slice(self.get(prev)?);
        entry.push(byte);
        self.entries.push(entry);

        self.entries.last().map(|e| &**e)
    }

    fn clear(&mut self) {
        self.entries.truncate(TABLE_BASE);
    }

    fn code_width(&self) -> u8 {
        let len = self.entries.len() + usize::from(self.early_change);

        match len {
            0..=511 => 9,
            512..=1023 => 10,
            1024..=2047 => 11,
            _ => 12,
        }
    }
}
