//! Interactive front end. Asks the same questions as the original console
//! flow and resolves the answers into an `ExportRequest`; nothing here
//! touches the network or the output files.

use crate::config::ExportConfig;
use crate::error::EtlError;
use crate::models::{DateRange, Interval};
use crate::pipeline::{ExportRequest, FinanceRequest};
use crate::transform::parse_range_bound;
use crate::utils::{clean_list, clean_symbols};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::io::{BufRead, Write};
use tracing::warn;

pub fn read_request<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    paths: &ExportConfig,
) -> Result<ExportRequest> {
    let mode = ask(input, output, "Export (weather/finance/both)?: ")?.to_lowercase();

    match mode.as_str() {
        "weather" => {
            let cities = ask(
                input,
                output,
                "Enter cities separated by comma (example: Portland,London,Karachi): ",
            )?;
            Ok(ExportRequest::Weather {
                cities: clean_list(&[cities]),
                out: paths.weather_path.clone(),
            })
        }
        "finance" => {
            let symbols = ask(input, output, "Enter symbols separated by comma (example: AAPL,MSFT): ")?;
            let interval = ask(input, output, "Interval (Daily/Intraday) [Daily]: ")?;
            let start = ask(input, output, "Start date (YYYY-MM-DD) or blank: ")?;
            let end = ask(input, output, "End date (YYYY-MM-DD) or blank: ")?;

            Ok(ExportRequest::Finance {
                symbols: clean_symbols(&[symbols]),
                request: FinanceRequest {
                    interval: Interval::from_answer(&interval),
                    range: DateRange {
                        start: optional_bound("start", &start),
                        end: optional_bound("end", &end),
                    },
                },
                out: paths.finance_path.clone(),
            })
        }
        "both" => {
            let cities = ask(input, output, "Cities (comma separated): ")?;
            let symbols = ask(input, output, "Symbols (comma separated): ")?;
            Ok(ExportRequest::Both {
                cities: clean_list(&[cities]),
                symbols: clean_symbols(&[symbols]),
                request: FinanceRequest::default(),
                weather_out: paths.weather_path.clone(),
                finance_out: paths.finance_path.clone(),
            })
        }
        _ => Err(EtlError::Validation(
            "Invalid mode selected. Please choose 'weather', 'finance', or 'both'.".to_string(),
        )
        .into()),
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Blank means unbounded; an unparseable date is reported and ignored.
fn optional_bound(label: &str, answer: &str) -> Option<NaiveDateTime> {
    if answer.trim().is_empty() {
        return None;
    }
    match parse_range_bound(answer) {
        Ok(ts) => Some(ts),
        Err(e) => {
            warn!("Ignoring {} date: {}", label, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn run(answers: &str) -> (Result<ExportRequest>, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = read_request(&mut input, &mut output, &ExportConfig::default());
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_weather_mode() {
        let (req, shown) = run("Weather\nPortland, ,London\n");
        assert_eq!(
            req.unwrap(),
            ExportRequest::Weather {
                cities: vec!["Portland".into(), "London".into()],
                out: PathBuf::from("WeatherData_combined.csv"),
            }
        );
        assert!(shown.starts_with("Export (weather/finance/both)?: "));
    }

    #[test]
    fn test_finance_mode_with_dates() {
        let (req, _) = run("finance\naapl,msft\nIntraday\n2024-01-02\nnot-a-date\n");
        match req.unwrap() {
            ExportRequest::Finance { symbols, request, .. } => {
                assert_eq!(symbols, ["AAPL", "MSFT"]);
                assert_eq!(request.interval, Interval::Intraday);
                assert_eq!(request.range.start.unwrap().to_string(), "2024-01-02 00:00:00");
                assert_eq!(request.range.end, None);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_finance_mode_defaults() {
        let (req, _) = run("finance\nIBM\n\n\n\n");
        match req.unwrap() {
            ExportRequest::Finance { request, .. } => {
                assert_eq!(request, FinanceRequest::default());
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_both_mode() {
        let (req, _) = run("both\nTokyo\nnvda\n");
        match req.unwrap() {
            ExportRequest::Both { cities, symbols, .. } => {
                assert_eq!(cities, ["Tokyo"]);
                assert_eq!(symbols, ["NVDA"]);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_mode() {
        let (req, _) = run("stocks\n");
        let err = req.unwrap_err();
        assert!(matches!(err.downcast_ref::<EtlError>(), Some(EtlError::Validation(_))));
    }
}
