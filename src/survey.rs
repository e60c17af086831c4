use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_weights::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;
mod views;

use crate::survey::config_reader::*;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The spreadsheet has no worksheet or no header row"))]
    EmptyExcel {},
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno}: could not read the weight {content:?}"))]
    InvalidWeight { lineno: usize, content: String },
    #[snafu(display("The respondents of {path} do not form a valid table"))]
    InvalidTable {
        source: survey_weights::TableError,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the report to {path}"))]
    WritingReport { source: std::io::Error, path: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Unknown data provider {provider:?} (expected csv or xlsx)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown view {view:?}"))]
    UnknownView { view: String },
    #[snafu(display("Unknown column group {group:?}"))]
    UnknownGroup { group: String },
    #[snafu(display("Could not understand filter {arg:?} (expected attribute=value1,value2)"))]
    InvalidFilter { arg: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

fn read_respondents(root_path: &Path, source: &DataSource) -> SurveyResult<Table> {
    let p: PathBuf = root_path.join(&source.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read respondents file {:?}", p2);
    let table = match source.provider.as_str() {
        "csv" => io_csv::read_csv_table(&p2, source),
        "xlsx" | "excel" => io_xlsx::read_excel_table(&p2, source),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }?;
    info!(
        "Read {} respondents, {} columns, weight column: {:?}",
        table.len(),
        table.columns().len(),
        table.weight_column()
    );
    if !table.is_weighted() {
        warn!(
            "No weight column {:?} in {}: tabulating without weights",
            source.weight_column(),
            p2
        );
    }
    Ok(table)
}

/// Parses a filter given on the command line, such as `sexo=F,M`.
pub fn parse_filter_arg(arg: &str) -> SurveyResult<(String, Vec<String>)> {
    let (attribute, values) = arg
        .split_once('=')
        .context(InvalidFilterSnafu { arg })?;
    let attribute = attribute.trim();
    ensure!(!attribute.is_empty(), InvalidFilterSnafu { arg });
    let values: Vec<String> = values
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    Ok((attribute.to_string(), values))
}

fn build_selection(args: &Args, config: &DashboardConfig) -> SurveyResult<FilterSelection> {
    let mut selection = FilterSelection::new();
    if args.clear_filters {
        return Ok(selection);
    }
    if !args.filter.is_empty() {
        for arg in args.filter.iter() {
            let (attribute, values) = parse_filter_arg(arg)?;
            selection.insert(&attribute, values.as_slice());
        }
    } else if let Some(filters) = &config.filters {
        for (attribute, values) in filters.iter() {
            selection.insert(attribute, values.as_slice());
        }
    }
    Ok(selection)
}

fn write_report(args: &Args, config: &DashboardConfig, root_p: &Path, js: &str) -> SurveyResult<()> {
    let out_path: Option<String> = match (&args.out, &config.output_settings.output_directory) {
        (Some(p), _) if p == "stdout" => None,
        (Some(p), _) => Some(p.clone()),
        (None, Some(dir)) => {
            let p: PathBuf = root_p.join(dir).join(config.output_settings.report_file_name());
            Some(p.display().to_string())
        }
        (None, None) => None,
    };
    match out_path {
        Some(path) => {
            info!("Writing report to {:?}", path);
            fs::write(&path, js).context(WritingReportSnafu { path })?;
        }
        None => {
            println!("{}", js);
        }
    }
    Ok(())
}

/// Computes the dashboard described by the configuration and writes its
/// report. Returns the report.
pub fn run_dashboard(args: &Args) -> SurveyResult<JSValue> {
    let config_p = Path::new(args.config.as_str());
    let config: DashboardConfig = read_config(&args.config)?;
    debug!("config: {:?}", config);

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;

    let mut source = config.data_source.clone();
    if let Some(input) = &args.input {
        source.file_path = input.clone();
    }
    if let Some(input_type) = &args.input_type {
        source.provider = input_type.clone();
    }
    if let Some(weight_column) = &args.weight_column {
        source.weight_column = Some(weight_column.clone());
    }
    // Inputs given on the command line are relative to the working directory.
    let data_root: &Path = if args.input.is_some() {
        Path::new("")
    } else {
        root_p
    };
    let table = read_respondents(data_root, &source)?;

    let selection = build_selection(args, &config)?;
    info!("{}", selection);

    let report = views::build_report(&config, &table, &selection, args.view.as_deref())?;

    let pretty_js = serde_json::to_string_pretty(&report).context(ParsingJsonSnafu {})?;
    write_report(args, &config, root_p, &pretty_js)?;

    // The reference report, if provided for comparison
    if let Some(reference_p) = &args.reference {
        let reference = read_report(reference_p)?;
        let pretty_js_reference =
            serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
        if pretty_js_reference != pretty_js {
            warn!("Found differences with the reference report");
            print_diff(pretty_js_reference.as_str(), pretty_js.as_str(), "\n");
            whatever!("Difference detected between computed report and reference report")
        }
        info!("The report matches the reference {:?}", reference_p);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_config() -> String {
        format!(
            "{}/demos/sergipe/dashboard_config.json",
            env!("CARGO_MANIFEST_DIR")
        )
    }

    fn demo_args() -> Args {
        Args {
            config: demo_config(),
            reference: None,
            out: Some(temp_path("demo_report.json")),
            input: None,
            input_type: None,
            weight_column: None,
            filter: Vec::new(),
            clear_filters: false,
            view: None,
            verbose: false,
        }
    }

    fn temp_path(name: &str) -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("surveytab-{}-{}", std::process::id(), name));
        p.display().to_string()
    }

    fn panel<'a>(report: &'a JSValue, view: &str, title: &str) -> &'a JSValue {
        report["views"]
            .as_array()
            .unwrap()
            .iter()
            .find(|v| v["id"] == view)
            .and_then(|v| {
                v["panels"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .find(|p| p["title"] == title)
            })
            .unwrap_or_else(|| panic!("missing panel {} / {}", view, title))
    }

    fn percent_of(data: &JSValue, category: &str) -> Option<f64> {
        data.as_array()
            .unwrap()
            .iter()
            .find(|e| e["category"] == category)
            .and_then(|e| e["percent"].as_f64())
    }

    #[test]
    fn parses_filter_args() {
        assert_eq!(
            parse_filter_arg("sexo=F").unwrap(),
            ("sexo".to_string(), vec!["F".to_string()])
        );
        assert_eq!(
            parse_filter_arg("faixa de idade = 16 a 24, 25 a 34,").unwrap(),
            (
                "faixa de idade".to_string(),
                vec!["16 a 24".to_string(), "25 a 34".to_string()]
            )
        );
        assert!(matches!(
            parse_filter_arg("sexo"),
            Err(SurveyError::InvalidFilter { .. })
        ));
        assert!(parse_filter_arg("=F").is_err());
    }

    #[test]
    fn demo_dashboard() {
        let _ = env_logger::builder().is_test(true).try_init();
        let report = run_dashboard(&demo_args()).unwrap();
        assert_eq!(report["respondents"], 8);
        assert_eq!(report["weightedPopulation"].as_f64(), Some(10.0));
        assert_eq!(report["views"].as_array().unwrap().len(), 5);
        assert_eq!(report["filters"], "No filters applied. Showing all data.");

        let regions = &panel(&report, "demografico", "Distribuição por Região")["data"];
        assert_eq!(regions[0]["category"], "Agreste");
        assert_eq!(regions[1]["category"], "Grande Aracaju");
        assert_eq!(percent_of(regions, "Baixo São Francisco"), Some(20.0));

        // The respondent without an answer still weighs in the denominator.
        let gov = &panel(&report, "governo", "Avaliação do Governador")["data"];
        assert_eq!(percent_of(gov, "Bom"), Some(50.0));
        let total: f64 = gov
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["percent"].as_f64().unwrap())
            .sum();
        assert!((total - 90.0).abs() < 0.01);

        let policies = &panel(&report, "governo", "Avaliação de Políticas Públicas")["data"];
        assert_eq!(policies[0]["item"], "saúde");
        assert_eq!(percent_of(&policies[0]["values"], "Regular"), Some(50.0));

        let programs = &panel(&report, "programas", "Conhecimento dos Programas")["data"];
        assert_eq!(programs[0]["item"], "cnh social");
        assert_eq!(programs[0]["yes"].as_f64(), Some(72.22));
        assert_eq!(programs[0]["no"].as_f64(), Some(27.78));

        let ranking = &panel(&report, "programas", "Top Programas Mais Conhecidos")["data"];
        assert_eq!(ranking[0]["category"], "cnh social");
        assert_eq!(ranking[1]["category"], "mão amiga");
        assert_eq!(ranking[1]["percent"].as_f64(), Some(33.33));

        let by_region = &panel(&report, "figuras", "Conhecimento por Região")["data"];
        let sertao = by_region
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["row"] == "Sertão")
            .unwrap();
        assert_eq!(sertao["percent"].as_f64(), Some(100.0));

        let options = &report["filterOptions"]["sexo"];
        assert_eq!(options, &serde_json::json!(["F", "M"]));
    }

    #[test]
    fn demo_dashboard_filtered() {
        let mut args = demo_args();
        args.filter = vec!["sexo=F".to_string()];
        args.view = Some("midia".to_string());
        let report = run_dashboard(&args).unwrap();
        assert_eq!(report["respondents"], 4);
        assert_eq!(report["filters"], "Filters applied: Sexo: F");
        assert_eq!(report["views"].as_array().unwrap().len(), 1);

        let networks = &panel(&report, "midia", "Uso de Redes Sociais")["data"];
        assert_eq!(percent_of(networks, "whatsapp"), Some(100.0));
        assert_eq!(percent_of(networks, "instagram"), Some(60.0));
    }

    #[test]
    fn empty_population_is_insufficient() {
        let mut args = demo_args();
        args.filter = vec!["cidade=Canindé de São Francisco".to_string()];
        let report = run_dashboard(&args).unwrap();
        assert_eq!(report["respondents"], 0);
        for view in report["views"].as_array().unwrap() {
            for p in view["panels"].as_array().unwrap() {
                assert_eq!(p["status"], "insufficientData", "{}", p["title"]);
            }
        }
    }

    #[test]
    fn unknown_view() {
        let mut args = demo_args();
        args.view = Some("economia".to_string());
        assert!(matches!(
            run_dashboard(&args),
            Err(SurveyError::UnknownView { .. })
        ));
    }

    #[test]
    fn reference_check() {
        let mut args = demo_args();
        let reference = temp_path("reference_report.json");
        args.out = Some(reference.clone());
        run_dashboard(&args).unwrap();

        args.out = Some(temp_path("checked_report.json"));
        args.reference = Some(reference);
        assert!(run_dashboard(&args).is_ok());

        // A different population does not match the reference.
        args.filter = vec!["região=Agreste".to_string()];
        assert!(run_dashboard(&args).is_err());
    }
}
