// Assembles the JSON report of a dashboard.

use serde_json::json;
use serde_json::Map as JSMap;

use crate::survey::{
    io_common::{area_label, short_label},
    *,
};

const DEFAULT_RANKING_SIZE: usize = 5;

type PanelResult = Result<JSValue, InsufficientData>;

fn distribution_to_json(d: &Distribution, label: impl Fn(&str) -> String) -> JSValue {
    let entries: Vec<JSValue> = d
        .iter()
        .map(|(c, p)| json!({"category": label(c.as_str()), "percent": p}))
        .collect();
    JSValue::Array(entries)
}

// The reason reported when none of the columns of a panel had anything to show.
fn missing_data(table: &Table, columns: &[String]) -> InsufficientData {
    match columns.iter().find(|c| table.has_column(c)) {
        None if !columns.is_empty() => InsufficientData::AbsentColumn(columns[0].clone()),
        _ => InsufficientData::EmptyPopulation,
    }
}

fn distribution_panel(table: &Table, column: &str, top: Option<usize>) -> PanelResult {
    let d = try_weighted_percentage(table, column)?;
    let d = match top {
        Some(n) => top_n(&d, n),
        None => d,
    };
    if d.is_empty() {
        return Err(InsufficientData::EmptyPopulation);
    }
    Ok(distribution_to_json(&d, |c| c.to_string()))
}

fn valid_share_panel(
    table: &Table,
    columns: &[String],
    label_by: ItemLabel,
    strip_prefix: Option<&str>,
) -> PanelResult {
    let mut items: Vec<JSValue> = Vec::new();
    for column in columns.iter() {
        let label = match label_by {
            ItemLabel::Item => short_label(column),
            ItemLabel::Area => area_label(column, strip_prefix),
        };
        match try_weighted_percentage_of_valid(table, column) {
            Ok(d) => items.push(json!({
                "item": label,
                "values": distribution_to_json(&d, |c| c.to_string()),
            })),
            Err(e) => debug!("valid_share_panel: skipping {:?}: {}", column, e),
        }
    }
    if items.is_empty() {
        return Err(missing_data(table, columns));
    }
    Ok(JSValue::Array(items))
}

fn positive_share_panel(
    table: &Table,
    columns: &[String],
    positive: &str,
    strip_prefix: Option<&str>,
) -> PanelResult {
    if table.is_empty() || (table.is_weighted() && table.total_weight() == 0.0) {
        return Err(InsufficientData::EmptyPopulation);
    }
    let d = positive_share(table, columns, positive);
    if d.is_empty() {
        return Err(missing_data(table, columns));
    }
    Ok(distribution_to_json(&d, |c| match strip_prefix {
        Some(prefix) => c.strip_prefix(prefix).unwrap_or(c).to_string(),
        None => c.to_string(),
    }))
}

fn awareness_panel(
    table: &Table,
    columns: &[String],
    yes: &str,
    no: &str,
    limit: Option<usize>,
) -> PanelResult {
    let items: Vec<JSValue> = columns
        .iter()
        .filter_map(|c| {
            awareness_split(table, c, yes, no)
                .map(|s| json!({"item": short_label(c), "yes": s.yes, "no": s.no}))
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    if items.is_empty() {
        return Err(missing_data(table, columns));
    }
    Ok(JSValue::Array(items))
}

fn awareness_ranking_panel(
    table: &Table,
    columns: &[String],
    yes: &str,
    no: &str,
    top: Option<usize>,
) -> PanelResult {
    let ranking = awareness_ranking(table, columns, yes, no);
    let d = top_n(&ranking, top.unwrap_or(DEFAULT_RANKING_SIZE));
    if d.is_empty() {
        return Err(missing_data(table, columns));
    }
    Ok(distribution_to_json(&d, short_label))
}

fn crosstab_panel(
    table: &Table,
    row_column: &str,
    col_column: &str,
    select: Option<&str>,
) -> PanelResult {
    let ct = try_weighted_crosstab(table, row_column, col_column)?;
    match select {
        Some(value) => {
            // A value nobody gave is at zero in every defined row.
            let series: Vec<(String, Option<f64>)> = match ct.column_series(value) {
                Some(series) => series,
                None => ct
                    .rows()
                    .iter()
                    .map(|r| (r.value.clone(), r.is_defined().then(|| 0.0)))
                    .collect(),
            };
            Ok(JSValue::Array(
                series
                    .into_iter()
                    .map(|(row, percent)| json!({"row": row, "percent": percent}))
                    .collect(),
            ))
        }
        None => {
            let rows: Vec<JSValue> = ct
                .rows()
                .iter()
                .map(|r| json!({"row": r.value, "total": round2(r.total), "cells": r.cells}))
                .collect();
            Ok(json!({"columns": ct.columns(), "rows": rows}))
        }
    }
}

fn panel_to_json(config: &DashboardConfig, table: &Table, panel: &PanelSpec) -> SurveyResult<JSValue> {
    let res: PanelResult = match panel {
        PanelSpec::Distribution { column, top, .. } => distribution_panel(table, column, *top),
        PanelSpec::ValidShare {
            columns,
            group,
            label_by,
            strip_prefix,
            ..
        } => {
            let cols = config.resolve_columns(columns, group)?;
            valid_share_panel(
                table,
                &cols,
                label_by.unwrap_or(ItemLabel::Item),
                strip_prefix.as_deref(),
            )
        }
        PanelSpec::PositiveShare {
            columns,
            group,
            positive,
            strip_prefix,
            ..
        } => {
            let cols = config.resolve_columns(columns, group)?;
            positive_share_panel(
                table,
                &cols,
                positive.as_deref().unwrap_or(DEFAULT_YES),
                strip_prefix.as_deref(),
            )
        }
        PanelSpec::Awareness {
            columns,
            group,
            yes,
            no,
            limit,
            ..
        } => {
            let cols = config.resolve_columns(columns, group)?;
            awareness_panel(
                table,
                &cols,
                yes.as_deref().unwrap_or(DEFAULT_YES),
                no.as_deref().unwrap_or(DEFAULT_NO),
                *limit,
            )
        }
        PanelSpec::AwarenessRanking {
            columns,
            group,
            yes,
            no,
            top,
            ..
        } => {
            let cols = config.resolve_columns(columns, group)?;
            awareness_ranking_panel(
                table,
                &cols,
                yes.as_deref().unwrap_or(DEFAULT_YES),
                no.as_deref().unwrap_or(DEFAULT_NO),
                *top,
            )
        }
        PanelSpec::Crosstab {
            row_column,
            col_column,
            select,
            ..
        } => crosstab_panel(table, row_column, col_column, select.as_deref()),
    };

    let js = match res {
        Ok(data) => json!({
            "title": panel.title(),
            "kind": panel.kind(),
            "status": "ok",
            "data": data,
        }),
        Err(reason) => {
            info!("Panel {:?}: insufficient data: {}", panel.title(), reason);
            json!({
                "title": panel.title(),
                "kind": panel.kind(),
                "status": "insufficientData",
                "reason": reason.to_string(),
            })
        }
    };
    Ok(js)
}

fn filter_options(config: &DashboardConfig, table: &Table) -> JSMap<String, JSValue> {
    let mut options: JSMap<String, JSValue> = JSMap::new();
    for attribute in config.filter_attributes.iter().flatten() {
        match table.distinct_values(attribute) {
            Some(values) => {
                options.insert(attribute.clone(), json!(values));
            }
            None => warn!("Filter attribute {:?} is not a column of the data", attribute),
        }
    }
    options
}

/// Computes the views of the dashboard over the respondents that pass the
/// filters. The filter options are always taken from the whole table.
pub fn build_report(
    config: &DashboardConfig,
    table: &Table,
    selection: &FilterSelection,
    only_view: Option<&str>,
) -> SurveyResult<JSValue> {
    let views: Vec<&ViewConfig> = match only_view {
        Some(id) => {
            let v = config
                .views
                .iter()
                .find(|v| v.id == id)
                .context(UnknownViewSnafu { view: id })?;
            vec![v]
        }
        None => config.views.iter().collect(),
    };

    let filtered = apply_filters(table, selection);
    info!(
        "{} of {} respondents selected",
        filtered.len(),
        table.len()
    );
    let population = if filtered.is_weighted() {
        filtered.total_weight()
    } else {
        filtered.len() as f64
    };

    let mut views_js: Vec<JSValue> = Vec::new();
    for view in views {
        debug!("build_report: view {:?}", view.id);
        let panels: Vec<JSValue> = view
            .panels
            .iter()
            .map(|p| panel_to_json(config, &filtered, p))
            .collect::<SurveyResult<Vec<JSValue>>>()?;
        views_js.push(json!({"id": view.id, "title": view.title, "panels": panels}));
    }

    Ok(json!({
        "dashboard": config.output_settings.dashboard_name,
        "filters": selection.to_string(),
        "filterOptions": filter_options(config, table),
        "respondents": filtered.len(),
        "weightedPopulation": round2(population),
        "views": views_js,
    }))
}
