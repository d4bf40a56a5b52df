//! Test-only builders for small `.xlsx` and `.ods` workbooks.
//!
//! Grid cells follow one convention for both formats: an empty string leaves
//! the cell out, `TRUE`/`FALSE` become booleans, anything that parses as a
//! number becomes a number, and everything else is text.

use quick_xml::escape::escape;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Rows of one sheet, top to bottom.
pub(crate) type Rows<'a> = Vec<Vec<&'a str>>;

const ODS_MIME_TYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

fn write_archive(path: &Path, entries: &[(&str, String)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn is_number(value: &str) -> bool {
    value.parse::<f64>().is_ok() && value.chars().any(|character| character.is_ascii_digit())
}

fn column_letters(col: usize) -> String {
    crate::spreadsheet::reference::index_to_reference(0, col).trim_end_matches('1').to_owned()
}

/// Writes an `.xlsx` package; text cells go through the shared string table.
pub(crate) fn write_xlsx(path: &Path, sheets: &[(&str, Rows)]) {
    let mut shared_strings = Vec::<String>::new();
    let mut workbook = String::from("<workbook><workbookPr/><sheets>");
    let mut relationships = String::from("<Relationships>");
    let mut worksheets = Vec::<(String, String)>::new();

    for (index, (name, rows)) in sheets.iter().enumerate() {
        let number = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{number}" r:id="rId{number}"/>"#, escape(*name)));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
        ));

        let mut worksheet = String::from("<worksheet><sheetData>");
        for (row, cells) in rows.iter().enumerate() {
            worksheet.push_str(&format!(r#"<row r="{}">"#, row + 1));
            for (col, value) in cells.iter().enumerate() {
                let reference = format!("{}{}", column_letters(col), row + 1);
                match *value {
                    "" => (),
                    "TRUE" | "FALSE" => worksheet.push_str(&format!(
                        r#"<c r="{reference}" t="b"><v>{}</v></c>"#,
                        if *value == "TRUE" { 1 } else { 0 }
                    )),
                    number if is_number(number) => {
                        worksheet.push_str(&format!(r#"<c r="{reference}"><v>{number}</v></c>"#))
                    }
                    text => {
                        let id = match shared_strings.iter().position(|shared| shared == text) {
                            Some(id) => id,
                            None => {
                                shared_strings.push(text.to_owned());
                                shared_strings.len() - 1
                            }
                        };
                        worksheet.push_str(&format!(r#"<c r="{reference}" t="s"><v>{id}</v></c>"#));
                    }
                }
            }
            worksheet.push_str("</row>");
        }
        worksheet.push_str("</sheetData></worksheet>");
        worksheets.push((format!("xl/worksheets/sheet{number}.xml"), worksheet));
    }
    workbook.push_str("</sheets></workbook>");
    relationships.push_str("</Relationships>");

    let mut shared = String::from("<sst>");
    for text in &shared_strings {
        shared.push_str(&format!("<si><t>{}</t></si>", escape(text.as_str())));
    }
    shared.push_str("</sst>");

    let mut entries = vec![
        ("xl/workbook.xml", workbook),
        ("xl/_rels/workbook.xml.rels", relationships),
        ("xl/sharedStrings.xml", shared),
    ];
    for (name, content) in &worksheets {
        entries.push((name.as_str(), content.to_owned()));
    }
    write_archive(path, &entries);
}

/// Writes a single-sheet `.xlsx` package from raw XML parts; the sheet is `rId1`.
pub(crate) fn write_xlsx_parts(
    path: &Path,
    workbook: &str,
    styles: Option<&str>,
    shared_strings: Option<&str>,
    worksheet: &str,
) {
    let mut entries = vec![
        ("xl/workbook.xml", workbook.to_owned()),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet1.xml"/></Relationships>"#.to_owned(),
        ),
        ("xl/worksheets/sheet1.xml", worksheet.to_owned()),
    ];
    if let Some(styles) = styles {
        entries.push(("xl/styles.xml", styles.to_owned()));
    }
    if let Some(shared_strings) = shared_strings {
        entries.push(("xl/sharedStrings.xml", shared_strings.to_owned()));
    }
    write_archive(path, &entries);
}

/// Writes an `.ods` package with one `table:table` per sheet.
pub(crate) fn write_ods(path: &Path, sheets: &[(&str, Rows)]) {
    let mut body = String::new();
    for (name, rows) in sheets {
        body.push_str(&format!(r#"<table:table table:name="{}">"#, escape(*name)));
        for cells in rows {
            body.push_str("<table:table-row>");
            for value in cells {
                match *value {
                    "" => body.push_str("<table:table-cell/>"),
                    "TRUE" | "FALSE" => body.push_str(&format!(
                        r#"<table:table-cell office:value-type="boolean" office:boolean-value="{}"><text:p>{value}</text:p></table:table-cell>"#,
                        value.to_ascii_lowercase()
                    )),
                    number if is_number(number) => body.push_str(&format!(
                        r#"<table:table-cell office:value-type="float" office:value="{number}"><text:p>{number}</text:p></table:table-cell>"#
                    )),
                    text => body.push_str(&format!(
                        r#"<table:table-cell office:value-type="string"><text:p>{}</text:p></table:table-cell>"#,
                        escape(text)
                    )),
                }
            }
            body.push_str("</table:table-row>");
        }
        body.push_str("</table:table>");
    }
    write_ods_content(path, &body);
}

/// Writes an `.ods` package around raw `office:spreadsheet` content.
pub(crate) fn write_ods_content(path: &Path, tables: &str) {
    let content = format!(
        "<office:document-content><office:body><office:spreadsheet>{tables}</office:spreadsheet></office:body></office:document-content>"
    );
    let manifest = r#"<manifest:manifest><manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/></manifest:manifest>"#;
    write_archive(
        path,
        &[
            ("mimetype", ODS_MIME_TYPE.to_owned()),
            ("META-INF/manifest.xml", manifest.to_owned()),
            ("content.xml", content),
        ],
    );
}
