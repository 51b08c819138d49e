/// This module provides the `Codec` struct, which owns a set of resource
/// entities and moves them in and out of `.xlsx` workbooks.
///
/// Export writes the entities in either sheet layout; import compares a
/// workbook against the entities and returns the proposed changes without
/// applying them. The entity set can also be cached to JSON and loaded back.
///
use std::{
    io::{Seek, Write},
    path::Path,
};

use tracing::debug;

use crate::{
    diff::EntryTableImporter,
    error::Error,
    export::export_workbook,
    import::import_workbook,
    options::{ExportOptions, ImportOptions},
    scope::Scope,
    traits::{Parser, TableImporter},
    types::{EntryChange, ResourceEntity},
    workbook::Workbook,
};

/// A collection of resource entities plus the workbook export/import operations over it.
///
/// Scopes passed to the export methods must borrow from [`Codec::entities`];
/// entries are matched to their entity by identity.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    /// The entities managed by this codec.
    pub entities: Vec<ResourceEntity>,
}

impl Codec {
    /// Creates a new, empty `Codec`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `Codec` over the given entities.
    pub fn from_entities(entities: Vec<ResourceEntity>) -> Self {
        Codec { entities }
    }

    pub fn add_entity(&mut self, entity: ResourceEntity) {
        self.entities.push(entity);
    }

    /// Finds an entity by project and unique name, ignoring case.
    pub fn find_entity(&self, project_name: &str, unique_name: &str) -> Option<&ResourceEntity> {
        self.entities.iter().find(|e| {
            crate::types::eq_ignore_case(&e.project_name, project_name)
                && crate::types::eq_ignore_case(&e.unique_name, unique_name)
        })
    }

    /// Renders the entities into an in-memory workbook.
    pub fn export_workbook(
        &self,
        scope: Option<&Scope<'_>>,
        options: &ExportOptions,
    ) -> Result<Workbook, Error> {
        export_workbook(&self.entities, scope, options)
    }

    /// Writes the entities to an `.xlsx` file, replacing any existing file.
    ///
    /// # Parameters
    /// - `path`: Destination file.
    /// - `scope`: Optional restriction of entries and languages; `None` exports everything.
    /// - `options`: Layout and sheet naming.
    pub fn export_excel_file<P: AsRef<Path>>(
        &self,
        path: P,
        scope: Option<&Scope<'_>>,
        options: &ExportOptions,
    ) -> Result<(), Error> {
        let workbook = self.export_workbook(scope, options)?;
        workbook.write_to(&path)?;
        debug!(path = %path.as_ref().display(), "wrote workbook");
        Ok(())
    }

    /// Writes the entities as an `.xlsx` package to any seekable writer.
    pub fn export_excel_to_writer<W: Write + Seek>(
        &self,
        writer: W,
        scope: Option<&Scope<'_>>,
        options: &ExportOptions,
    ) -> Result<(), Error> {
        self.export_workbook(scope, options)?.to_writer(writer)
    }

    /// Compares an in-memory workbook against the entities.
    pub fn import_workbook(
        &self,
        workbook: &Workbook,
        options: &ImportOptions,
    ) -> Result<Vec<EntryChange>, Error> {
        self.import_workbook_with(workbook, options, &EntryTableImporter)
    }

    /// Like [`Codec::import_workbook`], with a custom table importer.
    pub fn import_workbook_with(
        &self,
        workbook: &Workbook,
        options: &ImportOptions,
        importer: &dyn TableImporter,
    ) -> Result<Vec<EntryChange>, Error> {
        let (languages, comment_languages) = options.resolve(&self.entities);
        import_workbook(
            &self.entities,
            workbook,
            &languages,
            &comment_languages,
            importer,
        )
    }

    /// Reads an `.xlsx` file and returns the changes it proposes. Nothing is applied.
    pub fn import_excel_file<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ImportOptions,
    ) -> Result<Vec<EntryChange>, Error> {
        self.import_excel_file_with(path, options, &EntryTableImporter)
    }

    /// Like [`Codec::import_excel_file`], with a custom table importer.
    pub fn import_excel_file_with<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ImportOptions,
        importer: &dyn TableImporter,
    ) -> Result<Vec<EntryChange>, Error> {
        let workbook = Workbook::read_from(&path)?;
        debug!(path = %path.as_ref().display(), sheets = workbook.sheets.len(), "read workbook");
        self.import_workbook_with(&workbook, options, importer)
    }

    /// Caches the entities to a JSON file.
    ///
    /// # Parameters
    /// - `path`: Destination file path for the cache.
    ///
    /// # Returns
    ///
    /// `Ok(())` if caching succeeds, or an `Error` if file I/O or serialization fails.
    pub fn cache_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut writer = std::fs::File::create(path).map_err(Error::Io)?;
        serde_json::to_writer(&mut writer, &self.entities).map_err(Error::Parse)?;
        Ok(())
    }

    /// Loads entities from a JSON cache file.
    ///
    /// # Parameters
    /// - `path`: Path to the JSON file containing cached entities.
    ///
    /// # Returns
    ///
    /// `Ok(Codec)` with loaded entities, or an `Error` if loading or deserialization fails.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut reader = std::fs::File::open(path).map_err(Error::Io)?;
        let entities: Vec<ResourceEntity> =
            serde_json::from_reader(&mut reader).map_err(Error::Parse)?;
        Ok(Codec { entities })
    }
}
