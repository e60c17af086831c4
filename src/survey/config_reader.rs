use crate::survey::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_DELIMITER: u8 = b';';
pub const DEFAULT_YES: &str = "Sim";
pub const DEFAULT_NO: &str = "Não";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "dashboardName")]
    pub dashboard_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

impl OutputSettings {
    pub fn report_file_name(&self) -> String {
        let simplified: String = self
            .dashboard_name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_report.json", simplified)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub delimiter: Option<String>,
    #[serde(rename = "weightColumn")]
    pub weight_column: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl DataSource {
    pub fn delimiter(&self) -> SurveyResult<u8> {
        match self.delimiter.as_deref() {
            None => Ok(DEFAULT_DELIMITER),
            Some("\\t") | Some("tab") => Ok(b'\t'),
            Some(s) if s.len() == 1 => Ok(s.as_bytes()[0]),
            Some(s) => whatever!("delimiter must be a single ASCII character, got {:?}", s),
        }
    }

    pub fn weight_column(&self) -> &str {
        self.weight_column
            .as_deref()
            .unwrap_or(survey_weights::DEFAULT_WEIGHT_COLUMN)
    }
}

/// How the items of a multi-column panel are named.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ItemLabel {
    /// The part of the column name after `:` ("avaliação saúde: hospitais" -> "hospitais").
    #[serde(rename = "item")]
    Item,
    /// The part of the column name before `:` ("avaliação saúde: hospitais" -> "avaliação saúde").
    #[serde(rename = "area")]
    Area,
}

/// The panels of a view. Each kind maps to one aggregation of the engine.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PanelSpec {
    #[serde(rename = "distribution")]
    Distribution {
        title: String,
        column: String,
        top: Option<usize>,
    },
    #[serde(rename = "validShare")]
    ValidShare {
        title: String,
        columns: Option<Vec<String>>,
        group: Option<String>,
        #[serde(rename = "labelBy")]
        label_by: Option<ItemLabel>,
        #[serde(rename = "stripPrefix")]
        strip_prefix: Option<String>,
    },
    #[serde(rename = "positiveShare")]
    PositiveShare {
        title: String,
        columns: Option<Vec<String>>,
        group: Option<String>,
        positive: Option<String>,
        #[serde(rename = "stripPrefix")]
        strip_prefix: Option<String>,
    },
    #[serde(rename = "awareness")]
    Awareness {
        title: String,
        columns: Option<Vec<String>>,
        group: Option<String>,
        yes: Option<String>,
        no: Option<String>,
        limit: Option<usize>,
    },
    #[serde(rename = "awarenessRanking")]
    AwarenessRanking {
        title: String,
        columns: Option<Vec<String>>,
        group: Option<String>,
        yes: Option<String>,
        no: Option<String>,
        top: Option<usize>,
    },
    #[serde(rename = "crosstab")]
    Crosstab {
        title: String,
        #[serde(rename = "rowColumn")]
        row_column: String,
        #[serde(rename = "colColumn")]
        col_column: String,
        select: Option<String>,
    },
}

impl PanelSpec {
    pub fn title(&self) -> &str {
        match self {
            PanelSpec::Distribution { title, .. }
            | PanelSpec::ValidShare { title, .. }
            | PanelSpec::PositiveShare { title, .. }
            | PanelSpec::Awareness { title, .. }
            | PanelSpec::AwarenessRanking { title, .. }
            | PanelSpec::Crosstab { title, .. } => title,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PanelSpec::Distribution { .. } => "distribution",
            PanelSpec::ValidShare { .. } => "validShare",
            PanelSpec::PositiveShare { .. } => "positiveShare",
            PanelSpec::Awareness { .. } => "awareness",
            PanelSpec::AwarenessRanking { .. } => "awarenessRanking",
            PanelSpec::Crosstab { .. } => "crosstab",
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub id: String,
    pub title: String,
    pub panels: Vec<PanelSpec>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSource")]
    pub data_source: DataSource,
    #[serde(rename = "filterAttributes")]
    pub filter_attributes: Option<Vec<String>>,
    pub filters: Option<BTreeMap<String, Vec<String>>>,
    #[serde(rename = "columnGroups")]
    pub column_groups: Option<BTreeMap<String, Vec<String>>>,
    pub views: Vec<ViewConfig>,
}

impl DashboardConfig {
    /// The columns of a panel, given either directly or through a named group.
    pub fn resolve_columns(
        &self,
        columns: &Option<Vec<String>>,
        group: &Option<String>,
    ) -> SurveyResult<Vec<String>> {
        match (columns, group) {
            (Some(cols), _) => Ok(cols.clone()),
            (None, Some(g)) => self
                .column_groups
                .as_ref()
                .and_then(|groups| groups.get(g))
                .cloned()
                .context(UnknownGroupSnafu { group: g }),
            (None, None) => whatever!("panel needs either columns or a group"),
        }
    }
}

pub fn read_config(path: &str) -> SurveyResult<DashboardConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DashboardConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_report(path: &str) -> SurveyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
