//! Built-in extraction adapters

use super::{ExtractError, Extractor};
use async_trait::async_trait;

/// UTF-8 text and source code, read as-is (invalid sequences replaced)
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor {
    fn name(&self) -> &str {
        "text"
    }

    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Comma-separated data, passed through with a short header
pub struct CsvExtractor;

#[async_trait]
impl Extractor for CsvExtractor {
    fn name(&self) -> &str {
        "csv"
    }

    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        let body = String::from_utf8_lossy(&bytes);
        Ok(format!("Datos CSV:\n{}", body.trim_end()))
    }
}

/// Paragraph text of a Word document (`word/document.xml`)
#[cfg(feature = "docx")]
pub struct DocxExtractor;

#[cfg(feature = "docx")]
#[async_trait]
impl Extractor for DocxExtractor {
    fn name(&self) -> &str {
        "docx"
    }

    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        tokio::task::spawn_blocking(move || docx_text(&bytes))
            .await
            .map_err(|e| ExtractError::new(format!("DOCX extraction task panicked: {}", e)))?
    }
}

#[cfg(feature = "docx")]
fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;
    use std::io::{Cursor, Read};

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::new(format!("not a DOCX archive: {}", e)))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::new(format!("missing document body: {}", e)))?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;
    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractError::new(format!("malformed document XML: {}", e)))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| ExtractError::new(format!("malformed document text: {}", e)))?;
                text.push_str(&unescaped);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

/// Cell values of an Office Open XML workbook, one tab-separated line per
/// row. Legacy binary `.xls` files are not archives and are rejected.
#[cfg(feature = "xlsx")]
pub struct SpreadsheetExtractor;

#[cfg(feature = "xlsx")]
#[async_trait]
impl Extractor for SpreadsheetExtractor {
    fn name(&self) -> &str {
        "spreadsheet"
    }

    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        tokio::task::spawn_blocking(move || xlsx_text(&bytes))
            .await
            .map_err(|e| ExtractError::new(format!("spreadsheet extraction task panicked: {}", e)))?
    }
}

#[cfg(feature = "xlsx")]
fn xlsx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    use std::io::Cursor;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::new(format!("not an XLSX archive: {}", e)))?;

    let shared = match read_entry(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => shared_strings(&xml)?,
        None => Vec::new(),
    };
    let sheet_names = match read_entry(&mut archive, "xl/workbook.xml")? {
        Some(xml) => sheet_names(&xml)?,
        None => Vec::new(),
    };

    let mut sheets: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|path| {
            let index = path
                .strip_prefix("xl/worksheets/sheet")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((index, path.to_string()))
        })
        .collect();
    if sheets.is_empty() {
        return Err(ExtractError::new("workbook has no worksheets"));
    }
    sheets.sort();

    let mut text = String::from("Datos tabulares:");
    for (position, (index, path)) in sheets.iter().enumerate() {
        let xml = read_entry(&mut archive, path)?.unwrap_or_default();
        let name = sheet_names
            .get(position)
            .cloned()
            .unwrap_or_else(|| format!("Sheet{}", index));
        text.push_str(&format!("\n[{}]\n", name));
        for row in sheet_rows(&xml, &shared)? {
            text.push_str(&row.join("\t"));
            text.push('\n');
        }
    }

    Ok(text.trim_end().to_string())
}

#[cfg(feature = "xlsx")]
fn read_entry<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
) -> Result<Option<String>, ExtractError> {
    use std::io::Read;

    let mut entry = match archive.by_name(path) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ExtractError::new(format!("unreadable {}: {}", path, e))),
    };
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

#[cfg(feature = "xlsx")]
fn xml_error(e: impl std::fmt::Display) -> ExtractError {
    ExtractError::new(format!("malformed workbook XML: {}", e))
}

/// Entries of `xl/sharedStrings.xml`, with rich-text runs concatenated and
/// phonetic hints left out
#[cfg(feature = "xlsx")]
fn shared_strings(xml: &str) -> Result<Vec<String>, ExtractError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text && !in_phonetic => {
                current.push_str(&t.unescape().map_err(xml_error)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

/// Sheet names from `xl/workbook.xml`, in workbook order
#[cfg(feature = "xlsx")]
fn sheet_names(xml: &str) -> Result<Vec<String>, ExtractError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut names = Vec::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if let Some(name) = e.try_get_attribute("name").map_err(xml_error)? {
                    names.push(name.unescape_value().map_err(xml_error)?.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(names)
}

/// Rows of one worksheet. Cells are placed by their `r` reference so
/// skipped columns stay aligned; trailing empty cells are dropped.
#[cfg(feature = "xlsx")]
fn sheet_rows(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>, ExtractError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell_type = String::new();
    let mut column = 0usize;
    let mut value = String::new();
    let mut in_value = false;
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row.clear(),
                b"c" => {
                    cell_type.clear();
                    column = row.len();
                    value.clear();
                    for attr in e.attributes() {
                        let attr = attr.map_err(xml_error)?;
                        match attr.key.local_name().as_ref() {
                            b"t" => cell_type = String::from_utf8_lossy(&attr.value).into_owned(),
                            b"r" => {
                                if let Some(index) = column_index(&attr.value) {
                                    column = index;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    let resolved = match cell_type.as_str() {
                        "s" => value
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|i| shared.get(i))
                            .cloned()
                            .unwrap_or_default(),
                        "b" if value.trim() == "1" => "TRUE".to_string(),
                        "b" => "FALSE".to_string(),
                        _ => value.clone(),
                    };
                    if row.len() <= column {
                        row.resize(column + 1, String::new());
                    }
                    row[column] = resolved;
                }
                b"row" => {
                    while row.last().is_some_and(|cell| cell.is_empty()) {
                        row.pop();
                    }
                    rows.push(std::mem::take(&mut row));
                }
                _ => {}
            },
            Event::Text(t) if in_value => value.push_str(&t.unescape().map_err(xml_error)?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}

/// Zero-based column of a cell reference such as `AB12`
#[cfg(feature = "xlsx")]
fn column_index(reference: &[u8]) -> Option<usize> {
    let letters: Vec<u8> = reference
        .iter()
        .take_while(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let number = letters
        .iter()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1));
    Some(number - 1)
}

/// PDF text layer, extracted off the async executor
#[cfg(feature = "pdf")]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
#[async_trait]
impl Extractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractError::new(format!("PDF extraction task panicked: {}", e)))?
            .map_err(|e| ExtractError::new(format!("PDF extraction failed: {}", e)))?;

        if text.trim().is_empty() {
            return Err(ExtractError::new(
                "PDF contains no extractable text (may be image-only or encrypted)",
            ));
        }
        Ok(text)
    }
}
