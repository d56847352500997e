//! OOXML Word (.docx) text extraction
//!
//! Reads `word/document.xml` out of the zip container and concatenates the
//! `w:t` runs, one line per paragraph.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use super::run_blocking;
use super::types::ExtractionResult;

pub async fn extract_docx(data: Vec<u8>) -> ExtractionResult {
    run_blocking("DOCX", move || docx_text(&data)).await
}

fn docx_text(data: &[u8]) -> Result<String, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(data)).map_err(|e| format!("not a valid DOCX archive: {}", e))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| "could not find word/document.xml in DOCX file".to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| format!("could not read document.xml: {}", e))?;

    document_xml_text(&xml)
}

fn document_xml_text(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut content = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| format!("XML decode error: {}", err))?;
                content.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => content.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => content.push('\t'),
                b"w:br" | b"w:cr" | b"w:p" => content.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parsing error: {}", e)),
            _ => {}
        }
    }

    Ok(content.trim_end().to_string())
}
