/// Output formatting: terminal table, JSON and bare columns.
use std::collections::BTreeMap;

use pawrank_core::{IntransitivityReport, ItemId, RankedOrdering, RankingMethod, Tally};
use serde::Serialize;

use crate::bail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Columns,
}

pub fn parse_format(value: &str) -> OutputFormat {
    match value {
        "table" => OutputFormat::Table,
        "json" => OutputFormat::Json,
        "columns" => OutputFormat::Columns,
        other => bail(format!("Unknown format \"{other}\". Use \"table\", \"json\" or \"columns\".")),
    }
}

#[derive(Serialize)]
struct JsonRankedItem {
    rank: usize,
    item: ItemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    score: serde_json::Value,
}

#[derive(Serialize)]
struct JsonOutput {
    method: &'static str,
    items: Vec<JsonRankedItem>,
}

/// One row per ranked item. Tied items share a rank unless `flatten` is set,
/// in which case ranks run 1..=N in listing order.
fn rows(ordering: &RankedOrdering, flatten: bool) -> Vec<(usize, ItemId, Option<f64>)> {
    let mut rows = Vec::with_capacity(ordering.len());
    for (tier_idx, tier) in ordering.tiers.iter().enumerate() {
        for r in tier {
            let rank = if flatten { rows.len() + 1 } else { tier_idx + 1 };
            rows.push((rank, r.item, r.score));
        }
    }
    rows
}

fn format_score(score: Option<f64>) -> String {
    match score {
        None => "-".to_string(),
        Some(s) if s == f64::INFINITY => "inf".to_string(),
        Some(s) if s == f64::NEG_INFINITY => "-inf".to_string(),
        Some(s) => format!("{s:.4}"),
    }
}

/// JSON has no infinity: non-finite scores are written as strings.
fn json_score(score: Option<f64>) -> serde_json::Value {
    match score {
        None => serde_json::Value::Null,
        Some(s) if s.is_finite() => serde_json::json!(s),
        Some(s) => serde_json::Value::String(format_score(Some(s))),
    }
}

pub fn render_table(
    ordering: &RankedOrdering,
    names: &BTreeMap<ItemId, String>,
    method: RankingMethod,
    flatten: bool,
) -> String {
    let rows = rows(ordering, flatten);
    let label = |item: ItemId| names.get(&item).cloned().unwrap_or_else(|| format!("#{item}"));

    let name_width = rows
        .iter()
        .map(|&(_, item, _)| label(item).len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut out = String::new();
    out.push_str(&format!("  # | {:<name_width$} |      Score\n", "Item"));
    out.push_str(&format!("----|-{}-|-----------\n", "-".repeat(name_width)));
    for (rank, item, score) in &rows {
        out.push_str(&format!("{:>3} | {:<name_width$} | {:>10}\n", rank, label(*item), format_score(*score)));
    }
    out.push_str(&format!("\n{} items ranked by {} in {} tiers\n", rows.len(), method, ordering.tiers.len()));
    out
}

pub fn render_json(
    ordering: &RankedOrdering,
    names: &BTreeMap<ItemId, String>,
    method: RankingMethod,
    flatten: bool,
) -> String {
    let items = rows(ordering, flatten)
        .into_iter()
        .map(|(rank, item, score)| JsonRankedItem {
            rank,
            item,
            name: names.get(&item).cloned(),
            score: json_score(score),
        })
        .collect();
    let output = JsonOutput { method: method.as_str(), items };
    to_pretty_json(&output)
}

/// One tier per line as comma-joined ids, or one id per line when flattened.
pub fn render_columns(ordering: &RankedOrdering, flatten: bool) -> String {
    let lines: Vec<String> = if flatten {
        ordering.flatten().iter().map(ItemId::to_string).collect()
    } else {
        ordering
            .tier_ids()
            .iter()
            .map(|tier| tier.iter().map(ItemId::to_string).collect::<Vec<_>>().join(","))
            .collect()
    };
    lines.iter().map(|l| format!("{l}\n")).collect()
}

#[derive(Serialize)]
struct JsonItem<'a> {
    item: ItemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

pub fn render_items(items: &[(ItemId, Option<String>)], json: bool) -> String {
    if json {
        let rows: Vec<JsonItem> = items
            .iter()
            .map(|(item, name)| JsonItem { item: *item, name: name.as_deref() })
            .collect();
        return to_pretty_json(&rows);
    }
    if items.is_empty() {
        return "(no items yet)\n".to_string();
    }
    let mut out = String::from("  Item | Name\n");
    out.push_str("-------|------\n");
    for (item, name) in items {
        let label = name.clone().unwrap_or_else(|| format!("#{item}"));
        out.push_str(&format!("{item:>6} | {label}\n"));
    }
    out
}

pub fn render_matchups(item: ItemId, summary: &BTreeMap<ItemId, Tally>, json: bool) -> String {
    if json {
        return to_pretty_json(summary);
    }
    let mut out = format!("Matchups for item {item}\n");
    out.push_str("Opponent |  Wins | Losses |  Ties\n");
    out.push_str("---------|-------|--------|------\n");
    for (opponent, tally) in summary {
        out.push_str(&format!(
            "{:>8} | {:>5} | {:>6} | {:>5}\n",
            opponent, tally.wins, tally.losses, tally.ties
        ));
    }
    if summary.is_empty() {
        out.push_str("(no votes yet)\n");
    }
    out
}

pub fn render_intransitivity(report: &IntransitivityReport, json: bool) -> String {
    if json {
        return to_pretty_json(report);
    }
    format!(
        "{} of {} voters hold intransitive preferences ({} voters have no votes in scope)\n",
        report.intransitive, report.total_voters, report.voters_without_votes
    )
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    let mut json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| bail(format!("Failed to serialize output: {e}")));
    json.push('\n');
    json
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawrank_core::RankedItem;

    fn ordering() -> RankedOrdering {
        RankedOrdering::new(vec![
            vec![RankedItem { item: 4, score: Some(f64::INFINITY) }],
            vec![RankedItem { item: 1, score: Some(0.5) }, RankedItem { item: 2, score: Some(0.5) }],
            vec![RankedItem { item: 3, score: Some(0.0) }],
        ])
    }

    #[test]
    fn test_columns_by_tier_and_flat() {
        assert_eq!(render_columns(&ordering(), false), "4\n1,2\n3\n");
        assert_eq!(render_columns(&ordering(), true), "4\n1\n2\n3\n");
    }

    #[test]
    fn test_json_writes_infinity_as_string() {
        let json = render_json(&ordering(), &BTreeMap::new(), RankingMethod::WinRatio, false);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["method"], "win_ratio");
        assert_eq!(value["items"][0]["score"], "inf");
        assert_eq!(value["items"][1]["rank"], 2);
        assert_eq!(value["items"][2]["rank"], 2);
        assert_eq!(value["items"][3]["score"], 0.0);
    }

    #[test]
    fn test_flatten_gives_distinct_ranks() {
        let json = render_json(&ordering(), &BTreeMap::new(), RankingMethod::WinRatio, true);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let ranks: Vec<u64> = (0..4).map(|i| value["items"][i]["rank"].as_u64().unwrap()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_table_uses_names() {
        let names: BTreeMap<ItemId, String> = [(1, "Biscuit".to_string())].into_iter().collect();
        let table = render_table(&ordering(), &names, RankingMethod::Copeland, false);
        assert!(table.contains("Biscuit"));
        assert!(table.contains("#3"));
        assert!(table.contains("4 items ranked by copeland in 3 tiers"));
    }

    #[test]
    fn test_items_table_and_json() {
        let items = vec![(1, Some("Biscuit".to_string())), (2, None)];
        let table = render_items(&items, false);
        assert!(table.contains("     1 | Biscuit"));
        assert!(table.contains("     2 | #2"));
        assert_eq!(render_items(&[], false), "(no items yet)\n");

        let value: serde_json::Value = serde_json::from_str(&render_items(&items, true)).unwrap();
        assert_eq!(value[0]["name"], "Biscuit");
        assert_eq!(value[1]["item"], 2);
        assert!(value[1].get("name").is_none());
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(None), "-");
        assert_eq!(format_score(Some(f64::NEG_INFINITY)), "-inf");
        assert_eq!(format_score(Some(0.25)), "0.2500");
    }
}
