//! Loading uploaded ticket sheets and writing filtered rows back out.
//!
//! - **Delimiter resolution**: `.tsv` → tab, anything else → comma, unless
//!   overridden.
//! - **Encoding**: input is decoded to UTF-8 through `encoding_rs_io`, which
//!   also drops the byte-order mark spreadsheet exports prepend. Output is
//!   UTF-8 unless another `encoding_rs` label is requested.
//! - **Workbooks**: `.xlsx`, `.xlsm`, `.xlsb`, `.xls` and `.ods` inputs are read
//!   through `calamine`, first sheet unless one is named.
//! - **stdin/stdout**: the `-` path routes through standard streams.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use calamine::{Data, DataType, Range, Reader, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;
use log::info;

use crate::dataset::Dataset;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WORKBOOK_EXTENSIONS.iter().any(|w| ext.eq_ignore_ascii_case(w)))
}

/// Reads a whole delimited file or workbook sheet into a [`Dataset`]. Header
/// names are trimmed and empty fields load as null. `sheet` only applies to
/// workbooks.
pub fn load_dataset(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    sheet: Option<&str>,
) -> Result<Dataset> {
    if is_workbook(path) {
        let dataset = read_workbook(path, sheet)?;
        info!(
            "Loaded {} row(s) with {} column(s) from workbook {:?}",
            dataset.len(),
            dataset.columns().len(),
            path
        );
        return Ok(dataset);
    }
    let source: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    let dataset = read_dataset(source, delimiter, encoding)
        .with_context(|| format!("Reading tickets from {path:?}"))?;
    info!(
        "Loaded {} row(s) with {} column(s) from {:?}",
        dataset.len(),
        dataset.columns().len(),
        path
    );
    Ok(dataset)
}

pub fn read_dataset<R: Read>(source: R, delimiter: u8, encoding: &'static Encoding) -> Result<Dataset> {
    let decoded = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .bom_override(true)
        .strip_bom(true)
        .build(source);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(decoded);

    let headers = reader
        .headers()
        .context("Reading header row")?
        .iter()
        .map(|h| h.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}').to_string())
        .collect::<Vec<_>>();
    let mut records = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(Dataset::from_records(&headers, records)?)
}

/// Reads one sheet (the first when `sheet` is `None`) of a workbook.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .with_context(|| format!("Reading sheet '{name}' of {path:?}"))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("Workbook {path:?} has no worksheets"))?
            .with_context(|| format!("Reading first sheet of {path:?}"))?,
    };
    dataset_from_range(&range)
}

/// First row of the range is the header. Rows with no value at all are
/// skipped; blank header cells become `column_<n>`.
pub fn dataset_from_range(range: &Range<Data>) -> Result<Dataset> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Dataset::from_cells(Vec::new(), Vec::new())?);
    };
    let headers = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| match cell_text(cell) {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("column_{}", idx + 1),
        })
        .collect::<Vec<_>>();
    let cells = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(Option::is_some))
        .collect::<Vec<_>>();
    Ok(Dataset::from_cells(headers, cells)?)
}

/// Text of one workbook cell. Whole floats drop their `.0` (ticket numbers
/// are often stored as numbers) and dates render as `%Y-%m-%d`.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(value) if value.is_empty() => None,
        Data::String(value) => Some(value.clone()),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            Some((*value as i64).to_string())
        }
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.date().format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            })
            .or_else(|| Some(cell.to_string())),
        other => Some(other.to_string()),
    }
}

/// Writes a header row plus one line per row. `None` or `-` writes to stdout.
pub fn write_dataset(
    dataset: &Dataset,
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let target: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout().lock()),
    };
    write_to(dataset, target, delimiter, encoding)?;
    if let Some(p) = path.filter(|p| !is_dash(p)) {
        info!("Wrote {} row(s) to {:?}", dataset.len(), p);
    }
    Ok(())
}

pub fn write_to<W: Write>(
    dataset: &Dataset,
    mut target: W,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let text = to_delimited_string(dataset, delimiter)?;
    if encoding == UTF_8 {
        target.write_all(text.as_bytes())?;
    } else {
        let (encoded, _, had_errors) = encoding.encode(&text);
        if had_errors {
            return Err(anyhow!(
                "Failed to encode output using {}",
                encoding.name()
            ));
        }
        target.write_all(&encoded)?;
    }
    target.flush()?;
    Ok(())
}

/// Delimited UTF-8 text of the dataset, header first.
pub fn to_delimited_string(dataset: &Dataset, delimiter: u8) -> Result<String> {
    let (headers, rows) = dataset.to_table();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(&headers)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV output: {}", err.error()))?;
    Ok(String::from_utf8(bytes)?)
}
