//! CSV export of per-unit reports.
//!
//! The file opens in spreadsheet tools as UTF-8 thanks to the leading byte order mark.

use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use quiz_core::model::UnitSummary;

use crate::error::ExportError;

/// UTF-8 byte order mark written before the header.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column titles: unit, accuracy (%), grade, questions, correct, study time (min), last studied.
pub const HEADER: [&str; 7] = [
    "単元",
    "正答率(%)",
    "評価",
    "問題数",
    "正解数",
    "学習時間(分)",
    "最終学習日",
];

const DATE_FORMAT: &str = "%Y/%m/%d";

fn record(summary: &UnitSummary) -> [String; 7] {
    [
        summary.unit.as_str().to_owned(),
        summary.accuracy.to_string(),
        summary.grade().symbol().to_owned(),
        summary.total_count.to_string(),
        summary.correct_count.to_string(),
        summary.minutes_spent().to_string(),
        summary
            .last_study_at
            .map(|at| at.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
    ]
}

/// Write the BOM, header and one row per summary to `out`.
///
/// # Errors
///
/// Returns `ExportError` if writing fails.
pub fn write_unit_summaries_csv<W: Write>(
    mut out: W,
    summaries: &[UnitSummary],
) -> Result<(), ExportError> {
    out.write_all(UTF8_BOM)?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);
    writer.write_record(HEADER)?;
    for summary in summaries {
        writer.write_record(record(summary))?;
    }
    writer.flush()?;
    Ok(())
}

/// Render summaries as a CSV document.
///
/// # Errors
///
/// Returns `ExportError` if the CSV writer fails.
pub fn unit_summaries_csv(summaries: &[UnitSummary]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    write_unit_summaries_csv(&mut buf, summaries)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use quiz_core::model::UnitName;

    fn summary(unit: &str) -> UnitSummary {
        UnitSummary {
            unit: UnitName::new(unit).unwrap(),
            total_count: 10,
            correct_count: 7,
            accuracy: 72,
            last_study_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()),
            total_answer_time: 600,
        }
    }

    fn text(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn writes_bom_header_and_row() {
        let bytes = unit_summaries_csv(&[summary("Unit1")]).unwrap();

        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        let body = text(&bytes[3..]);
        assert_eq!(
            body,
            "単元,正答率(%),評価,問題数,正解数,学習時間(分),最終学習日\n\
             Unit1,72,○,10,7,10,2024/01/01\n"
        );
    }

    #[test]
    fn quotes_fields_with_commas_and_quotes() {
        let bytes = unit_summaries_csv(&[summary("Ratios, \"basic\"")]).unwrap();
        let body = text(&bytes[3..]);
        let row = body.lines().nth(1).unwrap();
        assert!(row.starts_with("\"Ratios, \"\"basic\"\"\",72,"));
    }

    #[test]
    fn missing_last_study_leaves_date_empty() {
        let mut row = summary("Unit2");
        row.last_study_at = None;
        row.total_answer_time = 89;
        let bytes = unit_summaries_csv(&[row]).unwrap();
        let body = text(&bytes[3..]);
        assert_eq!(body.lines().nth(1), Some("Unit2,72,○,10,7,1,"));
    }

    #[test]
    fn empty_report_has_only_header() {
        let bytes = unit_summaries_csv(&[]).unwrap();
        assert_eq!(text(&bytes[3..]).lines().count(), 1);
    }
}
