use crate::domain::order::PositionDraft;
use crate::error::{Result, ShopError};
use std::io::Read;

/// Reads order positions from a CSV source.
///
/// Expects a `name, price, quantity, item_id` header. Empty cells become
/// missing values so half-filled rows can be skipped later on. Whitespace is
/// trimmed and short records are accepted.
pub struct PositionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PositionReader<R> {
    /// Creates a new `PositionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes position drafts.
    pub fn positions(self) -> impl Iterator<Item = Result<PositionDraft>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ShopError::from))
    }
}
