use crate::Result;
use crate::catalog::{Column, RepositoryRecord};
use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;
use strum::IntoEnumIterator;

/// Write a header row followed by one row per record, in the order given.
pub fn generate<W: Write>(records: &[RepositoryRecord], writer: W) -> Result<()> {
    let mut tsv = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    tsv.write_record(Column::iter().map(Column::title))?;
    for record in records {
        tsv.write_record(record.cells())?;
    }

    tsv.flush()?;
    Ok(())
}
