// Pre-election polls of 2020. Both are downloaded by hand; the presidential
// one comes as a workbook and only its national tab is kept.

use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx};

use crate::pipeline::io_common::*;
use crate::pipeline::*;

fn cell_text(cell: &calamine::DataType) -> String {
    match cell {
        calamine::DataType::String(s) => s.clone(),
        calamine::DataType::Int(i) => i.to_string(),
        calamine::DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        calamine::DataType::Float(f) => f.to_string(),
        calamine::DataType::Bool(b) => b.to_string(),
        calamine::DataType::DateTime(d) => d.to_string(),
        calamine::DataType::Error(e) => {
            warn!("cell_text: error cell {:?}", e);
            String::new()
        }
        _ => String::new(),
    }
}

/// Writes one worksheet of a workbook as CSV. Returns the number of lines.
pub fn export_worksheet(xlsx_path: &Path, sheet: &str, csv_path: &Path) -> PrepResult<usize> {
    let path = path_str(xlsx_path);
    let mut workbook: Xlsx<_> =
        open_workbook(xlsx_path).context(OpeningExcelSnafu { path: path.clone() })?;
    let wrange = workbook
        .worksheet_range(sheet)
        .context(MissingWorksheetSnafu {
            name: sheet,
            path: path.clone(),
        })?
        .context(OpeningExcelSnafu { path })?;
    let mut rows = wrange
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    let header = rows.next().context(EmptyExcelSnafu {})?;
    debug!("export_worksheet: header: {:?}", header);
    let n = write_csv(csv_path, &header, rows)?;
    Ok(n + 1)
}

/// Converts the presidential poll workbook when it is there and its CSV is not.
pub fn convert_pre_election_polls(data_dir: &Path, force_refresh: bool) -> PrepResult<()> {
    let xlsx = data_path(data_dir, PRES_POLL_XLSX);
    let csv = data_path(data_dir, PRES_POLL_CSV);
    if !xlsx.exists() {
        debug!("convert_pre_election_polls: no workbook {}", path_str(&xlsx));
        return Ok(());
    }
    if csv.exists() && !force_refresh {
        return Ok(());
    }
    let n = export_worksheet(&xlsx, PRES_POLL_SHEET, &csv)?;
    info!(
        "convert_pre_election_polls: {} lines written to {}",
        n,
        path_str(&csv)
    );
    Ok(())
}

pub fn parse_2020_pres_results() {
    warn!("parse_2020_pres_results: not implemented yet, skipping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::DataType;

    #[test]
    fn cells() {
        assert_eq!(cell_text(&DataType::Float(52.0)), "52");
        assert_eq!(cell_text(&DataType::Float(0.25)), "0.25");
        assert_eq!(cell_text(&DataType::String("Biden".to_string())), "Biden");
        assert_eq!(cell_text(&DataType::Empty), "");
    }

    #[test]
    fn nothing_to_convert() {
        let dir = tempfile::tempdir().unwrap();
        convert_pre_election_polls(dir.path(), false).unwrap();
        assert!(!dir.path().join(PRES_POLL_CSV).exists());
    }

    #[test]
    fn unreadable_workbook() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PRES_POLL_XLSX), "not a workbook").unwrap();
        assert!(convert_pre_election_polls(dir.path(), false).is_err());
    }
}
