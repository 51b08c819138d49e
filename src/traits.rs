//! Traits at the seams of langsheet: package I/O and table reconciliation.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Cursor, Read, Seek, Write},
    path::Path,
};

use crate::{
    error::Error,
    types::{CultureKey, EntryChange, ResourceEntity},
};

/// A trait for reading and writing a zip-packaged document.
///
/// # Example
///
/// ```rust,no_run
/// use langsheet::{Workbook, traits::Parser};
/// let workbook = Workbook::read_from("Resources.xlsx")?;
/// workbook.write_to("Resources_copy.xlsx")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Parse from any seekable reader.
    fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from file path. The file is closed before this returns, on success or failure.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path).map_err(Error::Io)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Parse from bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Write to any seekable writer (file, memory, etc.).
    fn to_writer<W: Write + Seek>(&self, writer: W) -> Result<(), Error>;

    /// Write to file path.
    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write into a fresh byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut cursor = Cursor::new(Vec::new());
        self.to_writer(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Reconciles a string table against one entity and reports what differs.
///
/// `table[0]` is the header: `fixed_columns` followed by language columns named
/// per [`crate::types::LanguageColumn`]. Every further row is keyed by its fixed
/// columns. Implementations must not mutate the entity.
pub trait TableImporter {
    fn import_table(
        &self,
        entity: &ResourceEntity,
        fixed_columns: &[&str],
        table: &[Vec<String>],
        languages: &[CultureKey],
        comment_languages: &[CultureKey],
    ) -> Result<Vec<EntryChange>, Error>;
}
