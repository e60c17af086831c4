mod config;
mod crosstab;
mod table;

pub mod builder;
pub mod filter;
pub mod manual;

use log::{debug, info};

use std::{cmp::Ordering, collections::BTreeMap};

pub use crate::config::*;
pub use crate::crosstab::{try_weighted_crosstab, weighted_crosstab};
pub use crate::filter::{apply_filters, FilterSelection};
pub use crate::table::{ColumnId, Response, Table};

// **** Private structures ****

/// What each category is measured against.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Measure {
    /// Percentage of the weight of the whole table, including the respondents
    /// that did not answer.
    ShareOfAll,
    /// Percentage of the weight of the respondents that answered.
    ShareOfValid,
    /// Raw weighted sum.
    Sum,
}

#[derive(PartialEq, Debug, Clone, Copy)]
struct Group {
    weight: f64,
    count: usize,
    first_seen: usize,
}

/// Rounds a percentage to two decimals, the precision of every result.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn group_by_category<'a>(table: &'a Table, cid: ColumnId) -> BTreeMap<&'a str, Group> {
    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
    for (idx, r) in table.rows.iter().enumerate() {
        if let Some(cat) = r.answer(cid).category() {
            let g = groups.entry(cat).or_insert(Group {
                weight: 0.0,
                count: 0,
                first_seen: idx,
            });
            g.weight += r.weight;
            g.count += 1;
        }
    }
    groups
}

fn sort_entries(entries: &mut [(String, f64, usize)], order: DistributionOrder) {
    // The entries come in lexical order, the sorts below are stable.
    match order {
        DistributionOrder::Descending => {
            entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
        }
        DistributionOrder::FirstSeen => entries.sort_by_key(|e| e.2),
        DistributionOrder::Lexical => {}
    }
}

fn tabulate(
    table: &Table,
    column: &str,
    measure: Measure,
    order: DistributionOrder,
) -> Result<Distribution, InsufficientData> {
    let cid = table.lookup(column)?;
    let groups = group_by_category(table, cid);
    if groups.is_empty() {
        debug!("tabulate: no valid answer for {:?}", column);
        return Err(InsufficientData::EmptyPopulation);
    }

    let mut entries: Vec<(String, f64, usize)> = if table.is_weighted() {
        weighted_entries(table, &groups, measure)?
    } else {
        unweighted_entries(&groups, measure)
    };
    sort_entries(&mut entries, order);

    debug!("tabulate: {:?} {:?}: {:?}", column, measure, entries);
    Ok(Distribution {
        entries: entries.into_iter().map(|(c, v, _)| (c, v)).collect(),
    })
}

fn weighted_entries(
    table: &Table,
    groups: &BTreeMap<&str, Group>,
    measure: Measure,
) -> Result<Vec<(String, f64, usize)>, InsufficientData> {
    let total_weight = table.total_weight();
    if total_weight == 0.0 {
        return Err(InsufficientData::EmptyPopulation);
    }
    let denominator = match measure {
        Measure::ShareOfAll => Some(total_weight),
        Measure::ShareOfValid => {
            let valid_weight: f64 = groups.values().map(|g| g.weight).sum();
            if valid_weight == 0.0 {
                return Err(InsufficientData::EmptyPopulation);
            }
            Some(valid_weight)
        }
        Measure::Sum => None,
    };
    Ok(groups
        .iter()
        .map(|(cat, g)| {
            let v = match denominator {
                Some(d) => g.weight / d * 100.0,
                None => g.weight,
            };
            (cat.to_string(), round2(v), g.first_seen)
        })
        .collect())
}

// The tables without weights: every respondent counts once.
fn unweighted_entries(groups: &BTreeMap<&str, Group>, measure: Measure) -> Vec<(String, f64, usize)> {
    let num_valid: usize = groups.values().map(|g| g.count).sum();
    groups
        .iter()
        .map(|(cat, g)| {
            let v = match measure {
                Measure::ShareOfAll | Measure::ShareOfValid => {
                    g.count as f64 / num_valid as f64 * 100.0
                }
                Measure::Sum => g.count as f64,
            };
            (cat.to_string(), round2(v), g.first_seen)
        })
        .collect()
}

/// Computes the weighted percentage of each answer of a column.
///
/// The percentages are taken over the weight of all the respondents of the
/// table, including those who left the question blank or answered `.`. The
/// percentages may then add up to less than 100.
///
/// Tables without a weight column fall back to the relative frequency among
/// the respondents who answered.
pub fn try_weighted_percentage(
    table: &Table,
    column: &str,
) -> Result<Distribution, InsufficientData> {
    tabulate(
        table,
        column,
        Measure::ShareOfAll,
        DistributionOrder::Descending,
    )
}

/// Same as [`try_weighted_percentage`], returning an empty distribution
/// when there is nothing to tabulate.
pub fn weighted_percentage(table: &Table, column: &str) -> Distribution {
    try_weighted_percentage(table, column).unwrap_or_default()
}

/// Same as [`weighted_percentage`], with the entries in the requested order.
pub fn weighted_percentage_ordered(
    table: &Table,
    column: &str,
    order: DistributionOrder,
) -> Distribution {
    tabulate(table, column, Measure::ShareOfAll, order).unwrap_or_default()
}

/// Computes the weighted sum of each answer of a column (plain counts for
/// tables without weights), largest first.
pub fn try_weighted_count(table: &Table, column: &str) -> Result<Distribution, InsufficientData> {
    tabulate(table, column, Measure::Sum, DistributionOrder::Descending)
}

pub fn weighted_count(table: &Table, column: &str) -> Distribution {
    try_weighted_count(table, column).unwrap_or_default()
}

/// Computes the weighted percentage of each answer among the respondents that
/// answered the question. The result adds up to 100.
pub fn try_weighted_percentage_of_valid(
    table: &Table,
    column: &str,
) -> Result<Distribution, InsufficientData> {
    tabulate(
        table,
        column,
        Measure::ShareOfValid,
        DistributionOrder::Descending,
    )
}

pub fn weighted_percentage_of_valid(table: &Table, column: &str) -> Distribution {
    try_weighted_percentage_of_valid(table, column).unwrap_or_default()
}

/// Keeps the first `n` entries of a distribution.
pub fn top_n(distribution: &Distribution, n: usize) -> Distribution {
    Distribution {
        entries: distribution.entries.iter().take(n).cloned().collect(),
    }
}

// The weight of the respondents whose answer is the given value.
fn weight_of(table: &Table, cid: ColumnId, value: &str) -> f64 {
    table
        .rows
        .iter()
        .filter(|r| r.answer(cid).category() == Some(value))
        .map(|r| if table.is_weighted() { r.weight } else { 1.0 })
        .sum()
}

/// For each column, the percentage of the whole population that gave the
/// `positive` answer (such as "uses WhatsApp": `Sim`).
///
/// The entries follow the order of the columns and are labeled with the column
/// names. Columns absent from the table are skipped.
pub fn positive_share<S: AsRef<str>>(table: &Table, columns: &[S], positive: &str) -> Distribution {
    let population = if table.is_weighted() {
        table.total_weight()
    } else {
        table.len() as f64
    };
    let mut entries: Vec<(String, f64)> = Vec::new();
    for column in columns.iter().map(|c| c.as_ref()) {
        let cid = match table.column(column) {
            Some(cid) => cid,
            None => {
                debug!("positive_share: skipping absent column {:?}", column);
                continue;
            }
        };
        let w = weight_of(table, cid, positive);
        let share = if w > 0.0 && population > 0.0 {
            round2(w / population * 100.0)
        } else {
            0.0
        };
        entries.push((column.to_string(), share));
    }
    Distribution { entries }
}

/// The split between `yes` and `no` answers, among the respondents that gave
/// one of them.
pub fn awareness_split(table: &Table, column: &str, yes: &str, no: &str) -> Option<AwarenessSplit> {
    let cid = table.column(column)?;
    let yes_w = weight_of(table, cid, yes);
    let no_w = weight_of(table, cid, no);
    let total = yes_w + no_w;
    if total > 0.0 {
        Some(AwarenessSplit {
            yes: round2(yes_w / total * 100.0),
            no: round2(no_w / total * 100.0),
        })
    } else {
        None
    }
}

/// The share of `yes` answers for each column, largest first.
///
/// Columns that are absent or that nobody answered are not listed.
pub fn awareness_ranking<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    yes: &str,
    no: &str,
) -> Distribution {
    let mut entries: Vec<(String, f64)> = columns
        .iter()
        .filter_map(|c| {
            awareness_split(table, c.as_ref(), yes, no).map(|s| (c.as_ref().to_string(), s.yes))
        })
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    info!(
        "awareness_ranking: {} of {} columns ranked",
        entries.len(),
        columns.len()
    );
    Distribution { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cities(rows: &[(&str, f64)]) -> Table {
        let mut b = Builder::weighted(&["cidade"], "weight").unwrap();
        for (c, w) in rows {
            b.add_row(&[*c], Some(*w)).unwrap();
        }
        b.build()
    }

    fn pairs(d: &Distribution) -> Vec<(&str, f64)> {
        d.iter().map(|(c, v)| (c.as_str(), *v)).collect()
    }

    #[test]
    fn sentinel_weight_stays_in_denominator() {
        init();
        let t = cities(&[("A", 2.0), ("A", 2.0), ("B", 1.0), (".", 5.0)]);
        let d = weighted_percentage(&t, "cidade");
        assert_eq!(pairs(&d), vec![("A", 40.0), ("B", 10.0)]);
        assert!((d.total() - 50.0).abs() < 0.01);
    }

    #[test]
    fn blank_weight_stays_in_denominator() {
        let t = cities(&[("A", 1.0), ("", 1.0), ("B", 2.0)]);
        let d = weighted_percentage(&t, "cidade");
        assert_eq!(pairs(&d), vec![("B", 50.0), ("A", 25.0)]);
    }

    #[test]
    fn sums_to_100_without_missing_answers() {
        let t = cities(&[("A", 0.3), ("B", 1.7), ("C", 0.9), ("B", 0.2), ("D", 1.1)]);
        let d = weighted_percentage(&t, "cidade");
        assert!((d.total() - 100.0).abs() <= 0.01 + 1e-9, "{:?}", d);
        let values: Vec<f64> = d.iter().map(|(_, v)| *v).collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn ties_are_deterministic() {
        let t = cities(&[("Lagarto", 1.0), ("Aracaju", 1.0), ("Estância", 1.0)]);
        let d = weighted_percentage(&t, "cidade");
        assert_eq!(
            d.categories(),
            vec!["Aracaju".to_string(), "Estância".to_string(), "Lagarto".to_string()]
        );
        assert_eq!(d, weighted_percentage(&t, "cidade"));
    }

    #[test]
    fn rounds_to_two_decimals() {
        let t = cities(&[("A", 1.0), ("B", 1.0), ("C", 1.0)]);
        let d = weighted_percentage(&t, "cidade");
        assert_eq!(d.get("A"), Some(33.33));
        assert_eq!(round2(200.0 / 3.0), 66.67);
        assert_eq!(round2(12.5), 12.5);
    }

    #[test]
    fn orders() {
        let t = cities(&[("B", 1.0), ("C", 3.0), ("A", 2.0), ("C", 1.0)]);
        let first = weighted_percentage_ordered(&t, "cidade", DistributionOrder::FirstSeen);
        assert_eq!(first.categories(), vec!["B", "C", "A"]);
        let lexical = weighted_percentage_ordered(&t, "cidade", DistributionOrder::Lexical);
        assert_eq!(lexical.categories(), vec!["A", "B", "C"]);
        let desc = weighted_percentage_ordered(&t, "cidade", DistributionOrder::Descending);
        assert_eq!(desc, weighted_percentage(&t, "cidade"));
        assert_eq!(desc.categories(), vec!["C", "A", "B"]);
    }

    #[test]
    fn absent_column_and_empty_table() {
        let t = cities(&[("A", 1.0)]);
        assert!(weighted_percentage(&t, "sexo").is_empty());
        assert_eq!(
            try_weighted_percentage(&t, "sexo"),
            Err(InsufficientData::AbsentColumn("sexo".to_string()))
        );
        let empty = t.empty_like();
        assert!(weighted_percentage(&empty, "cidade").is_empty());
        assert_eq!(
            try_weighted_percentage(&empty, "cidade"),
            Err(InsufficientData::EmptyPopulation)
        );
        assert!(weighted_count(&empty, "cidade").is_empty());
        assert!(weighted_percentage_of_valid(&empty, "cidade").is_empty());
    }

    #[test]
    fn only_missing_answers() {
        let t = cities(&[(".", 1.0), ("", 2.0)]);
        assert_eq!(
            try_weighted_percentage(&t, "cidade"),
            Err(InsufficientData::EmptyPopulation)
        );
    }

    #[test]
    fn zero_total_weight() {
        let t = cities(&[("A", 0.0), ("B", 0.0)]);
        assert_eq!(
            try_weighted_percentage(&t, "cidade"),
            Err(InsufficientData::EmptyPopulation)
        );
        assert!(weighted_count(&t, "cidade").is_empty());
    }

    #[test]
    fn weight_column_is_not_a_category() {
        let t = cities(&[("A", 1.0)]);
        assert!(weighted_percentage(&t, "weight").is_empty());
    }

    #[test]
    fn unweighted_fallback() {
        let mut b = Builder::new(&["sexo"]).unwrap();
        for s in ["F", "F", "M", ".", ""] {
            b.add_row(&[s], None).unwrap();
        }
        let t = b.build();
        // Only the answers are counted, the sum is 100.
        let d = weighted_percentage(&t, "sexo");
        assert_eq!(pairs(&d), vec![("F", 66.67), ("M", 33.33)]);
        let c = weighted_count(&t, "sexo");
        assert_eq!(pairs(&c), vec![("F", 2.0), ("M", 1.0)]);
    }

    #[test]
    fn weighted_counts() {
        let t = cities(&[("A", 2.5), ("A", 2.0), ("B", 7.125), (".", 5.0)]);
        let d = weighted_count(&t, "cidade");
        assert_eq!(pairs(&d), vec![("B", 7.13), ("A", 4.5)]);
    }

    #[test]
    fn valid_denominator() {
        let t = cities(&[("A", 2.0), ("A", 2.0), ("B", 1.0), (".", 5.0)]);
        let d = weighted_percentage_of_valid(&t, "cidade");
        assert_eq!(pairs(&d), vec![("A", 80.0), ("B", 20.0)]);
    }

    #[test]
    fn top_n_selection() {
        let t = cities(&[("A", 5.0), ("B", 4.0), ("C", 3.0), ("D", 2.0), ("E", 1.0)]);
        let d = weighted_percentage(&t, "cidade");
        let top = top_n(&d, 3);
        assert_eq!(top.categories(), vec!["A", "B", "C"]);
        for e in top.iter() {
            assert!(d.entries().contains(e));
        }
        assert_eq!(top_n(&d, 10), d);
        assert!(top_n(&d, 0).is_empty());
        assert!(top_n(&Distribution::default(), 3).is_empty());
    }

    fn networks() -> Table {
        let mut b = Builder::weighted(&["usa: whatsapp", "usa: tiktok"], "peso").unwrap();
        b.add_row(&["Sim", "Não"], Some(1.0)).unwrap();
        b.add_row(&["Sim", "Sim"], Some(2.0)).unwrap();
        b.add_row(&["Não", "."], Some(1.0)).unwrap();
        b.build()
    }

    #[test]
    fn positive_shares() {
        let t = networks();
        let d = positive_share(&t, &["usa: whatsapp", "usa: x", "usa: tiktok"], "Sim");
        assert_eq!(pairs(&d), vec![("usa: whatsapp", 75.0), ("usa: tiktok", 50.0)]);
        let filtered = apply_filters(&t, &FilterSelection::new().with("usa: whatsapp", &["Não"]));
        let d = positive_share(&filtered, &["usa: tiktok"], "Sim");
        assert_eq!(pairs(&d), vec![("usa: tiktok", 0.0)]);
        assert!(positive_share(&t, &["usa: x"], "Sim").is_empty());
    }

    #[test]
    fn awareness() {
        let t = networks();
        assert_eq!(
            awareness_split(&t, "usa: tiktok", "Sim", "Não"),
            Some(AwarenessSplit {
                yes: 66.67,
                no: 33.33
            })
        );
        assert_eq!(awareness_split(&t, "usa: x", "Sim", "Não"), None);
        assert_eq!(awareness_split(&t, "usa: tiktok", "Talvez", "Nunca"), None);

        let r = awareness_ranking(&t, &["usa: tiktok", "usa: whatsapp", "usa: x"], "Sim", "Não");
        assert_eq!(pairs(&r), vec![("usa: whatsapp", 75.0), ("usa: tiktok", 66.67)]);
    }
}
