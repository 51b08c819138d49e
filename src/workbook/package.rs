//! SpreadsheetML package plumbing: locating parts inside the zip container and
//! reading/writing the workbook, relationship, worksheet and shared-string parts.
//!
//! Only the plain-text subset of the format is handled. Styles, formulas and
//! merged cells are ignored on read and never written.

use std::io::{Read, Seek, Write};

use indoc::indoc;
use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use zip::{
    CompressionMethod, ZipArchive, ZipWriter, result::ZipError, write::FileOptions,
};

use super::{
    Sheet, Workbook,
    cells::{Cell, CellContent, CellReference},
};
use crate::error::Error;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const WORKSHEET_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const SHARED_STRINGS_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
const OFFICE_DOCUMENT_REL_SUFFIX: &str = "/officeDocument";
const SHARED_STRINGS_REL_SUFFIX: &str = "/sharedStrings";

const ROOT_RELS_PART: &str = "_rels/.rels";
const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Largest uncompressed size accepted for a single package part.
const MAX_PART_BYTES: u64 = 256 * 1024 * 1024;

const WORKBOOK_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const WORKSHEET_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const SHARED_STRINGS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

/// A `<sheet>` element of `workbook.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SheetDeclaration {
    name: String,
    relationship_id: String,
}

/// A `<Relationship>` element of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    kind: String,
    target: String,
    external: bool,
}

pub(crate) fn read_package<R: Read + Seek>(reader: R) -> Result<Workbook, Error> {
    let mut archive = ZipArchive::new(reader)?;

    let workbook_part = match read_part(&mut archive, ROOT_RELS_PART)? {
        Some(xml) => parse_relationships(&xml)?
            .into_iter()
            .find(|rel| !rel.external && rel.kind.ends_with(OFFICE_DOCUMENT_REL_SUFFIX))
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string()),
        None => DEFAULT_WORKBOOK_PART.to_string(),
    };

    let workbook_xml = read_part(&mut archive, &workbook_part)?
        .ok_or_else(|| Error::invalid_workbook(format!("missing workbook part `{}`", workbook_part)))?;
    let declarations = parse_workbook(&workbook_xml)?;

    let relationships = match read_part(&mut archive, &relationships_path(&workbook_part))? {
        Some(xml) => parse_relationships(&xml)?,
        None => Vec::new(),
    };

    let shared_strings_part = relationships
        .iter()
        .find(|rel| !rel.external && rel.kind.ends_with(SHARED_STRINGS_REL_SUFFIX))
        .map(|rel| resolve_target(&workbook_part, &rel.target))
        .unwrap_or_else(|| resolve_target(&workbook_part, "sharedStrings.xml"));
    let shared_strings = read_part(&mut archive, &shared_strings_part)?
        .map(|xml| parse_shared_strings(&xml))
        .transpose()?;

    let mut sheets = Vec::with_capacity(declarations.len());
    for declaration in declarations {
        let relationship = relationships
            .iter()
            .find(|rel| rel.id == declaration.relationship_id)
            .ok_or_else(|| {
                Error::invalid_workbook(format!(
                    "sheet `{}` references unknown relationship `{}`",
                    declaration.name, declaration.relationship_id
                ))
            })?;
        let part = resolve_target(&workbook_part, &relationship.target);
        let xml = read_part(&mut archive, &part)?.ok_or_else(|| {
            Error::invalid_workbook(format!(
                "missing worksheet part `{}` for sheet `{}`",
                part, declaration.name
            ))
        })?;
        sheets.push(Sheet {
            name: declaration.name,
            rows: parse_worksheet(&xml)?,
        });
    }

    Ok(Workbook {
        sheets,
        shared_strings,
    })
}

pub(crate) fn write_package<W: Write + Seek>(workbook: &Workbook, writer: W) -> Result<(), Error> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    write_content_types(&mut zip, workbook)?;

    zip.start_file(ROOT_RELS_PART, options)?;
    zip.write_all(root_rels_xml().as_bytes())?;

    zip.start_file(DEFAULT_WORKBOOK_PART, options)?;
    write_workbook(&mut zip, workbook)?;

    zip.start_file(WORKBOOK_RELS_PART, options)?;
    write_workbook_rels(&mut zip, workbook)?;

    for (index, sheet) in workbook.sheets.iter().enumerate() {
        zip.start_file(worksheet_part(index), options)?;
        write_worksheet(&mut zip, &sheet.rows)?;
    }

    if let Some(shared_strings) = &workbook.shared_strings {
        zip.start_file(SHARED_STRINGS_PART, options)?;
        write_shared_strings(&mut zip, shared_strings)?;
    }

    zip.finish()?;
    Ok(())
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, Error> {
    read_part_with_limit(archive, name, MAX_PART_BYTES)
}

/// Reads a part, or `None` when the archive has no such entry.
///
/// The declared size in the zip header is not trusted: at most `max_bytes + 1`
/// bytes are inflated before the part is rejected.
fn read_part_with_limit<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    max_bytes: u64,
) -> Result<Option<Vec<u8>>, Error> {
    let file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if file.is_dir() {
        return Ok(None);
    }

    let too_large = |size: u64| Error::PartTooLarge {
        part: name.to_string(),
        size,
        max: max_bytes,
    };
    if file.size() > max_bytes {
        return Err(too_large(file.size()));
    }

    let mut buf = Vec::new();
    file.take(max_bytes.saturating_add(1)).read_to_end(&mut buf)?;
    let observed = buf.len() as u64;
    if observed > max_bytes {
        return Err(too_large(observed));
    }
    Ok(Some(buf))
}

/// Path of the `.rels` part describing `part`'s relationships.
fn relationships_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolves a relationship target relative to the directory of `source_part`.
fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments.join("/")
}

fn worksheet_part(index: usize) -> String {
    format!("xl/worksheets/sheet{}.xml", index + 1)
}

fn attribute_error(err: impl std::fmt::Display) -> Error {
    Error::invalid_workbook(format!("malformed attribute: {}", err))
}

fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>, Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut rel = Relationship {
                    id: String::new(),
                    kind: String::new(),
                    target: String::new(),
                    external: false,
                };
                for attr in e.attributes().with_checks(false) {
                    let attr = attr.map_err(attribute_error)?;
                    match attr.key.local_name().as_ref() {
                        b"Id" => rel.id = attr.unescape_value()?.to_string(),
                        b"Type" => rel.kind = attr.unescape_value()?.to_string(),
                        b"Target" => rel.target = attr.unescape_value()?.to_string(),
                        b"TargetMode" => rel.external = attr.unescape_value()? == "External",
                        _ => {}
                    }
                }
                relationships.push(rel);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(relationships)
}

fn parse_workbook(xml: &[u8]) -> Result<Vec<SheetDeclaration>, Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut declarations = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut relationship_id = None;
                for attr in e.attributes().with_checks(false) {
                    let attr = attr.map_err(attribute_error)?;
                    match (attr.key.prefix().is_some(), attr.key.local_name().as_ref()) {
                        (false, b"name") => name = Some(attr.unescape_value()?.to_string()),
                        (true, b"id") => relationship_id = Some(attr.unescape_value()?.to_string()),
                        _ => {}
                    }
                }
                let name = name
                    .ok_or_else(|| Error::invalid_workbook("sheet element missing 'name'"))?;
                let relationship_id = relationship_id.ok_or_else(|| {
                    Error::invalid_workbook(format!("sheet `{}` missing 'r:id'", name))
                })?;
                declarations.push(SheetDeclaration {
                    name,
                    relationship_id,
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(declarations)
}

/// Reads every `<si>` item as the concatenation of its `<t>` runs.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, Error> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut items = Vec::new();
    let mut item: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => item = Some(String::new()),
                b"t" => in_text = item.is_some(),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => items.push(String::new()),
            Event::Text(e) if in_text => {
                if let Some(item) = item.as_mut() {
                    item.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) if in_text => {
                if let Some(item) = item.as_mut() {
                    item.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => {
                    if let Some(item) = item.take() {
                        items.push(item);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(items)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Value,
    Text,
}

/// A `<c>` element whose children are still being read.
struct PendingCell {
    column: usize,
    shared: bool,
    value: Option<String>,
    text: String,
}

impl PendingCell {
    fn from_start(e: &BytesStart, fallback_column: usize) -> Result<Self, Error> {
        let mut column = fallback_column;
        let mut shared = false;
        for attr in e.attributes().with_checks(false) {
            let attr = attr.map_err(attribute_error)?;
            match attr.key.local_name().as_ref() {
                b"r" => {
                    if let Some(reference) = CellReference::parse(&attr.unescape_value()?) {
                        column = reference.column;
                    }
                }
                b"t" => shared = attr.unescape_value()? == "s",
                _ => {}
            }
        }
        Ok(Self {
            column,
            shared,
            value: None,
            text: String::new(),
        })
    }

    fn push(&mut self, capture: Capture, text: &str) {
        match capture {
            Capture::Value => self.value.get_or_insert_with(String::new).push_str(text),
            Capture::Text => self.text.push_str(text),
        }
    }

    fn finish(self) -> Cell {
        let content = match self.value {
            Some(value) if self.shared => CellContent::SharedString(value),
            Some(value) => CellContent::Value(value),
            None => CellContent::Text(self.text),
        };
        Cell::new(self.column, content)
    }
}

fn next_column(row: &Option<Vec<Cell>>) -> usize {
    row.as_ref()
        .and_then(|cells| cells.last())
        .map_or(0, |cell| cell.column + 1)
}

/// Reads the `<row>` elements of a worksheet in document order.
fn parse_worksheet(xml: &[u8]) -> Result<Vec<Vec<Cell>>, Error> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut rows = Vec::new();
    let mut row: Option<Vec<Cell>> = None;
    let mut cell: Option<PendingCell> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row = Some(Vec::new()),
                b"c" if row.is_some() => cell = Some(PendingCell::from_start(&e, next_column(&row))?),
                b"v" => {
                    if let Some(cell) = cell.as_mut() {
                        cell.value.get_or_insert_with(String::new);
                        capture = Some(Capture::Value);
                    }
                }
                b"t" if cell.is_some() => capture = Some(Capture::Text),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => rows.push(Vec::new()),
                b"c" if row.is_some() => {
                    let pending = PendingCell::from_start(&e, next_column(&row))?;
                    if let Some(row) = row.as_mut() {
                        row.push(pending.finish());
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if let (Some(capture), Some(cell)) = (capture, cell.as_mut()) {
                    cell.push(capture, &e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let (Some(capture), Some(cell)) = (capture, cell.as_mut()) {
                    cell.push(capture, &String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = None,
                b"c" => {
                    if let (Some(pending), Some(row)) = (cell.take(), row.as_mut()) {
                        row.push(pending.finish());
                    }
                }
                b"row" => {
                    if let Some(row) = row.take() {
                        rows.push(row);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn root_rels_xml() -> &'static str {
    indoc! {r#"
        <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
        <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
          <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
        </Relationships>
    "#}
}

fn write_declaration<W: Write>(xml_writer: &mut Writer<W>) -> Result<(), Error> {
    xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    xml_writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

fn write_content_types<W: Write>(writer: W, workbook: &Workbook) -> Result<(), Error> {
    let mut xml_writer = Writer::new(writer);
    write_declaration(&mut xml_writer)?;

    xml_writer.write_event(Event::Start(
        BytesStart::new("Types").with_attributes([("xmlns", CONTENT_TYPES_NS)]),
    ))?;
    xml_writer.write_event(Event::Empty(BytesStart::new("Default").with_attributes([
        ("Extension", "rels"),
        (
            "ContentType",
            "application/vnd.openxmlformats-package.relationships+xml",
        ),
    ])))?;
    xml_writer.write_event(Event::Empty(
        BytesStart::new("Default")
            .with_attributes([("Extension", "xml"), ("ContentType", "application/xml")]),
    ))?;

    let mut overrides = vec![(format!("/{}", DEFAULT_WORKBOOK_PART), WORKBOOK_CONTENT_TYPE)];
    overrides.extend(
        (0..workbook.sheets.len()).map(|index| (format!("/{}", worksheet_part(index)), WORKSHEET_CONTENT_TYPE)),
    );
    if workbook.shared_strings.is_some() {
        overrides.push((format!("/{}", SHARED_STRINGS_PART), SHARED_STRINGS_CONTENT_TYPE));
    }
    for (part_name, content_type) in &overrides {
        let mut elem = BytesStart::new("Override");
        elem.push_attribute(("PartName", part_name.as_str()));
        elem.push_attribute(("ContentType", *content_type));
        xml_writer.write_event(Event::Empty(elem))?;
    }

    xml_writer.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(())
}

fn write_workbook<W: Write>(writer: W, workbook: &Workbook) -> Result<(), Error> {
    let mut xml_writer = Writer::new(writer);
    write_declaration(&mut xml_writer)?;

    xml_writer.write_event(Event::Start(
        BytesStart::new("workbook")
            .with_attributes([("xmlns", MAIN_NS), ("xmlns:r", RELATIONSHIPS_NS)]),
    ))?;
    xml_writer.write_event(Event::Start(BytesStart::new("sheets")))?;
    for (index, sheet) in workbook.sheets.iter().enumerate() {
        let sheet_id = (index + 1).to_string();
        let relationship_id = format!("rId{}", index + 1);
        let mut elem = BytesStart::new("sheet");
        elem.push_attribute(("name", sheet.name.as_str()));
        elem.push_attribute(("sheetId", sheet_id.as_str()));
        elem.push_attribute(("r:id", relationship_id.as_str()));
        xml_writer.write_event(Event::Empty(elem))?;
    }
    xml_writer.write_event(Event::End(BytesEnd::new("sheets")))?;
    xml_writer.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(())
}

fn write_workbook_rels<W: Write>(writer: W, workbook: &Workbook) -> Result<(), Error> {
    let mut xml_writer = Writer::new(writer);
    write_declaration(&mut xml_writer)?;

    xml_writer.write_event(Event::Start(
        BytesStart::new("Relationships").with_attributes([("xmlns", PACKAGE_RELATIONSHIPS_NS)]),
    ))?;

    let mut relationships: Vec<(&str, String)> = (0..workbook.sheets.len())
        .map(|index| (WORKSHEET_REL_TYPE, format!("worksheets/sheet{}.xml", index + 1)))
        .collect();
    if workbook.shared_strings.is_some() {
        relationships.push((SHARED_STRINGS_REL_TYPE, "sharedStrings.xml".to_string()));
    }
    for (index, (kind, target)) in relationships.iter().enumerate() {
        let id = format!("rId{}", index + 1);
        let mut elem = BytesStart::new("Relationship");
        elem.push_attribute(("Id", id.as_str()));
        elem.push_attribute(("Type", *kind));
        elem.push_attribute(("Target", target.as_str()));
        xml_writer.write_event(Event::Empty(elem))?;
    }

    xml_writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(())
}

fn write_text_element<W: Write>(xml_writer: &mut Writer<W>, text: &str) -> Result<(), Error> {
    xml_writer.write_event(Event::Start(
        BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
    ))?;
    xml_writer.write_event(Event::Text(BytesText::new(text)))?;
    xml_writer.write_event(Event::End(BytesEnd::new("t")))?;
    Ok(())
}

fn write_worksheet<W: Write>(writer: W, rows: &[Vec<Cell>]) -> Result<(), Error> {
    let mut xml_writer = Writer::new(writer);
    write_declaration(&mut xml_writer)?;

    xml_writer.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", MAIN_NS)]),
    ))?;
    xml_writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    for (row_index, cells) in rows.iter().enumerate() {
        let row_number = (row_index + 1).to_string();
        let mut row_elem = BytesStart::new("row");
        row_elem.push_attribute(("r", row_number.as_str()));
        xml_writer.write_event(Event::Start(row_elem))?;

        for cell in cells {
            let reference = CellReference::new(cell.column, row_index).to_string();
            let mut elem = BytesStart::new("c");
            elem.push_attribute(("r", reference.as_str()));
            match &cell.content {
                CellContent::Text(text) => {
                    elem.push_attribute(("t", "inlineStr"));
                    xml_writer.write_event(Event::Start(elem))?;
                    xml_writer.write_event(Event::Start(BytesStart::new("is")))?;
                    write_text_element(&mut xml_writer, text)?;
                    xml_writer.write_event(Event::End(BytesEnd::new("is")))?;
                }
                CellContent::SharedString(raw) | CellContent::Value(raw) => {
                    if matches!(cell.content, CellContent::SharedString(_)) {
                        elem.push_attribute(("t", "s"));
                    }
                    xml_writer.write_event(Event::Start(elem))?;
                    xml_writer.write_event(Event::Start(BytesStart::new("v")))?;
                    xml_writer.write_event(Event::Text(BytesText::new(raw)))?;
                    xml_writer.write_event(Event::End(BytesEnd::new("v")))?;
                }
            }
            xml_writer.write_event(Event::End(BytesEnd::new("c")))?;
        }

        xml_writer.write_event(Event::End(BytesEnd::new("row")))?;
    }

    xml_writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    xml_writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(())
}

fn write_shared_strings<W: Write>(writer: W, items: &[String]) -> Result<(), Error> {
    let mut xml_writer = Writer::new(writer);
    write_declaration(&mut xml_writer)?;

    let count = items.len().to_string();
    let mut sst = BytesStart::new("sst");
    sst.push_attribute(("xmlns", MAIN_NS));
    sst.push_attribute(("count", count.as_str()));
    sst.push_attribute(("uniqueCount", count.as_str()));
    xml_writer.write_event(Event::Start(sst))?;
    for item in items {
        xml_writer.write_event(Event::Start(BytesStart::new("si")))?;
        write_text_element(&mut xml_writer, item)?;
        xml_writer.write_event(Event::End(BytesEnd::new("si")))?;
    }
    xml_writer.write_event(Event::End(BytesEnd::new("sst")))?;
    Ok(())
}
