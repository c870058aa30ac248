//! Minimal SpreadsheetML writer: one worksheet, inline strings, fixed column
//! widths, wrapped top-aligned cells and estimated row heights.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::ExportError;
use crate::profile::ExportLayout;
use crate::record::ResultTable;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

// Indexes into cellXfs in styles.xml.
const HEADER_STYLE: usize = 1;
const BODY_STYLE: usize = 2;

pub fn write_xlsx(
    table: &ResultTable,
    path: &Path,
    layout: &ExportLayout,
) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", content_types()),
        ("_rels/.rels", root_rels()),
        ("xl/workbook.xml", workbook()),
        ("xl/_rels/workbook.xml.rels", workbook_rels()),
        ("xl/styles.xml", styles()),
        ("xl/worksheets/sheet1.xml", worksheet(table, layout)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())
            .map_err(|source| ExportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
    }
    zip.finish()?;
    Ok(())
}

/// Lines a wrapped cell needs: one per `width * chars_per_width_unit`
/// characters, plus one.
pub fn estimated_lines(text: &str, width: f64, chars_per_width_unit: f64) -> usize {
    let per_line = (width * chars_per_width_unit).max(1.0);
    (text.chars().count() as f64 / per_line).floor() as usize + 1
}

pub fn row_height(cells: &[String], widths: &[f64], layout: &ExportLayout) -> f64 {
    let lines = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| estimated_lines(cell, *width, layout.chars_per_width_unit))
        .max()
        .unwrap_or(1);
    // Cap, then floor at one line.
    (layout.line_height * lines as f64)
        .min(layout.max_row_height)
        .max(layout.line_height)
}

/// Spreadsheet column name for a zero-based index: 0 → A, 25 → Z, 26 → AA.
pub fn column_name(mut idx: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn worksheet(table: &ResultTable, layout: &ExportLayout) -> String {
    let widths: Vec<f64> = table
        .headers
        .iter()
        .map(|header| layout.width_for(header))
        .collect();

    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">"#));

    if !widths.is_empty() {
        xml.push_str("<cols>");
        for (idx, width) in widths.iter().enumerate() {
            let n = idx + 1;
            xml.push_str(&format!(
                r#"<col min="{n}" max="{n}" width="{width}" customWidth="1"/>"#
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    push_row(&mut xml, 1, &table.headers, layout.header_row_height, HEADER_STYLE);
    for (idx, row) in table.rows.iter().enumerate() {
        let height = row_height(row, &widths, layout);
        push_row(&mut xml, idx + 2, row, height, BODY_STYLE);
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row(xml: &mut String, number: usize, cells: &[String], height: f64, style: usize) {
    xml.push_str(&format!(
        r#"<row r="{number}" ht="{height}" customHeight="1">"#
    ));
    for (col, value) in cells.iter().enumerate() {
        let cell_ref = format!("{}{number}", column_name(col));
        xml.push_str(&format!(
            r#"<c r="{cell_ref}" s="{style}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            escape_xml(value)
        ));
    }
    xml.push_str("</row>");
}

/// Escapes markup characters and drops code points XML 1.0 cannot carry.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

fn content_types() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
            r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
            "</Types>"
        ),
        decl = XML_DECL
    )
}

fn root_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn workbook() -> String {
    format!(
        r#"{XML_DECL}<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn workbook_rels() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="{pkg}">"#,
            r#"<Relationship Id="rId1" Type="{rel}/worksheet" Target="worksheets/sheet1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="{rel}/styles" Target="styles.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
        pkg = PKG_REL_NS,
        rel = REL_NS
    )
}

fn styles() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<styleSheet xmlns="{ns}">"#,
            r#"<fonts count="2">"#,
            r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
            r#"<font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
            "</fonts>",
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
            r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="3">"#,
            r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
            r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1" applyAlignment="1"><alignment wrapText="1" vertical="top"/></xf>"#,
            r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment wrapText="1" vertical="top"/></xf>"#,
            "</cellXfs>",
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            "</styleSheet>"
        ),
        decl = XML_DECL,
        ns = MAIN_NS
    )
}
