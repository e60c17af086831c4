use log::debug;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::table::{ColumnId, Response, Table};

/// The values accepted for each attribute.
///
/// An attribute that is absent, or whose set is empty, does not restrict the
/// respondents.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FilterSelection {
    selected: BTreeMap<String, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> FilterSelection {
        FilterSelection::default()
    }

    /// Adds the given values to the accepted set of an attribute.
    pub fn with<S: AsRef<str>>(mut self, attribute: &str, values: &[S]) -> FilterSelection {
        self.insert(attribute, values);
        self
    }

    pub fn insert<S: AsRef<str>>(&mut self, attribute: &str, values: &[S]) {
        let e = self.selected.entry(attribute.to_string()).or_default();
        for v in values {
            e.insert(v.as_ref().to_string());
        }
    }

    /// Keeps the attributes, but removes all their values.
    pub fn clear(&mut self) {
        for values in self.selected.values_mut() {
            values.clear();
        }
    }

    /// The attributes that effectively restrict the respondents.
    pub fn active_attributes(&self) -> Vec<&str> {
        self.selected
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(a, _)| a.as_str())
            .collect()
    }

    /// True if no attribute restricts the respondents.
    pub fn is_empty(&self) -> bool {
        self.selected.values().all(|values| values.is_empty())
    }
}

impl Display for FilterSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        for (attribute, values) in self.selected.iter() {
            if values.is_empty() {
                continue;
            }
            let values_s = if values.len() <= 3 {
                values.iter().cloned().collect::<Vec<String>>().join(", ")
            } else {
                format!("{} selected", values.len())
            };
            parts.push(format!("{}: {}", title_case(attribute), values_s));
        }
        if parts.is_empty() {
            write!(f, "No filters applied. Showing all data.")
        } else {
            write!(f, "Filters applied: {}", parts.join(" | "))
        }
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Keeps the respondents matching every active attribute of the selection.
///
/// Attributes that are not columns of the table are ignored. The rows keep
/// their original order and the input is left untouched.
pub fn apply_filters(table: &Table, selection: &FilterSelection) -> Table {
    let mut active: Vec<(ColumnId, &BTreeSet<String>)> = Vec::new();
    for (attribute, values) in selection.selected.iter() {
        if values.is_empty() {
            continue;
        }
        match table.column(attribute) {
            Some(cid) => active.push((cid, values)),
            None => {
                debug!("apply_filters: ignoring unknown attribute {:?}", attribute);
            }
        }
    }

    if active.is_empty() {
        return table.clone();
    }

    let rows: Vec<Response> = table
        .rows
        .iter()
        .filter(|r| {
            active.iter().all(|(cid, values)| match r.answer(*cid).text() {
                Some(s) => values.contains(s),
                None => false,
            })
        })
        .cloned()
        .collect();
    debug!(
        "apply_filters: kept {} of {} rows",
        rows.len(),
        table.rows.len()
    );
    table.with_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn people() -> Table {
        let mut b = Builder::weighted(&["sexo", "cidade"], "weight").unwrap();
        b.add_row(&["F", "Aracaju"], Some(1.0)).unwrap();
        b.add_row(&["M", "Aracaju"], Some(2.0)).unwrap();
        b.add_row(&["F", "Lagarto"], Some(3.0)).unwrap();
        b.add_row(&["M", "Itabaiana"], Some(4.0)).unwrap();
        b.add_row(&["F", ""], Some(5.0)).unwrap();
        b.build()
    }

    fn weights(t: &Table) -> Vec<f64> {
        t.rows().iter().map(|r| r.weight()).collect()
    }

    #[test]
    fn keeps_matching_rows_in_order() {
        let t = people();
        let sel = FilterSelection::new().with("sexo", &["F"]);
        let res = apply_filters(&t, &sel);
        assert_eq!(res.len(), 3);
        assert_eq!(weights(&res), vec![1.0, 3.0, 5.0]);
        // The input is untouched.
        assert_eq!(t.len(), 5);
        assert_eq!(res.columns(), t.columns());
    }

    #[test]
    fn combines_attributes() {
        let t = people();
        let sel = FilterSelection::new()
            .with("sexo", &["F"])
            .with("cidade", &["Aracaju", "Lagarto"]);
        let res = apply_filters(&t, &sel);
        assert_eq!(weights(&res), vec![1.0, 3.0]);
    }

    #[test]
    fn empty_and_unknown_attributes() {
        let t = people();
        let empty: [&str; 0] = [];
        let sel = FilterSelection::new()
            .with("sexo", &empty)
            .with("religião", &["Católica"])
            .with("weight", &["1"]);
        assert_eq!(apply_filters(&t, &sel), t);
        assert_eq!(apply_filters(&t, &FilterSelection::new()), t);
    }

    #[test]
    fn no_match_gives_empty_table() {
        let t = people();
        let sel = FilterSelection::new().with("cidade", &["Estância"]);
        let res = apply_filters(&t, &sel);
        assert!(res.is_empty());
        assert_eq!(res.columns(), t.columns());
        assert!(res.is_weighted());
    }

    #[test]
    fn idempotent() {
        let t = people();
        let sel = FilterSelection::new()
            .with("sexo", &["M"])
            .with("cidade", &["Aracaju", "Itabaiana"]);
        let once = apply_filters(&t, &sel);
        assert_eq!(apply_filters(&once, &sel), once);
    }

    #[test]
    fn monotonic() {
        let t = people();
        let mut sel = FilterSelection::new().with("cidade", &["Aracaju"]);
        let mut previous = apply_filters(&t, &sel).len();
        for city in ["Lagarto", "Itabaiana", "Estância"] {
            sel.insert("cidade", &[city]);
            let n = apply_filters(&t, &sel).len();
            assert!(n >= previous);
            previous = n;
        }
        assert_eq!(previous, 4);
    }

    #[test]
    fn sentinel_can_be_selected() {
        let mut b = Builder::new(&["religião"]).unwrap();
        b.add_row(&["."], None).unwrap();
        b.add_row(&["Católica"], None).unwrap();
        let t = b.build();
        let res = apply_filters(&t, &FilterSelection::new().with("religião", &["."]));
        assert_eq!(res.len(), 1);
    }

    #[test]
    fn summary_text() {
        assert_eq!(
            FilterSelection::new().to_string(),
            "No filters applied. Showing all data."
        );
        let mut sel = FilterSelection::new()
            .with("sexo", &["F"])
            .with("faixa de idade", &["16 a 24", "25 a 34", "35 a 44", "45 a 59"]);
        assert_eq!(
            sel.to_string(),
            "Filters applied: Faixa De Idade: 4 selected | Sexo: F"
        );
        sel.clear();
        assert!(sel.is_empty());
        assert!(sel.active_attributes().is_empty());
        assert_eq!(sel.to_string(), "No filters applied. Showing all data.");
    }
}
