//! Plain-text rendering for the terminal

use std::fmt::Write;

use serde_json::Value;

use shared::messages::EGGS_PER_TRAY;
use shared::{
    DashboardOverview, DetailedReport, DetailedReportKind, FarmLayout, GridModel, RecordHistory, RecordKind, ReportGrid,
    UserRecord,
};

use crate::types::{Notification, SubmissionReceipt};

const UNSET: &str = "·";

/// Layout overview: cages, partitions and box addresses
pub fn render_layout(layout: &FarmLayout) -> String {
    let mut out = String::new();
    for cage in layout.cages() {
        let _ = writeln!(out, "Cage {} ({}): {} boxes", cage.id, cage.cage_type, cage.box_count());
        for partition in &cage.partitions {
            let _ = writeln!(
                out,
                "  {} [partition {}]: {} rows x {} boxes, addresses {}-{}-0-0 .. {}-{}-{}-{}",
                partition.side.label(),
                partition.index,
                partition.rows,
                partition.columns,
                cage.id,
                partition.index,
                cage.id,
                partition.index,
                partition.rows.saturating_sub(1),
                partition.columns.saturating_sub(1),
            );
        }
    }
    let _ = writeln!(out, "Capacity: {} chickens", layout.chicken_capacity());
    out
}

/// The in-progress grid; unset boxes show as a dot, rejected input as `!`
pub fn render_grid(grid: &GridModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Collection for {}", grid.date());

    for cage in grid.layout().cages() {
        let _ = writeln!(out, "Cage {} ({})", cage.id, cage.cage_type);
        for partition in &cage.partitions {
            let _ = writeln!(out, "  {}", partition.side.label());
            for address_row in cage
                .addresses()
                .filter(|a| a.partition == partition.index)
                .collect::<Vec<_>>()
                .chunks(partition.columns.max(1))
            {
                let cells: Vec<String> = address_row
                    .iter()
                    .map(|address| match (grid.get_count(address), grid.field_error(address)) {
                        (_, Some(_)) => "!".to_string(),
                        (Some(count), None) => count.to_string(),
                        (None, None) => UNSET.to_string(),
                    })
                    .collect();
                let _ = writeln!(out, "    {}", cells.join(" "));
            }
        }
    }

    let shade = grid.shade_eggs().map_or_else(|| UNSET.to_string(), |n| n.to_string());
    let _ = writeln!(out, "Shade eggs: {shade}");
    let _ = writeln!(out, "Box eggs: {}", grid.box_total());

    for (address, message) in grid.field_errors() {
        let _ = writeln!(out, "  box {address}: {message}");
    }
    out
}

pub fn render_receipt(receipt: &SubmissionReceipt) -> String {
    format!(
        "Recorded {} eggs for {} ({} from boxes, {} shade)",
        receipt.total(),
        receipt.date,
        receipt.box_eggs,
        receipt.shade_eggs
    )
}

/// Recorded day: summary followed by each cage's partitions
pub fn render_report(report: &ReportGrid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Egg collection for {}", report.date);
    let _ = writeln!(out, "  Grand total: {}", report.grand_total);
    let _ = writeln!(out, "  Shade eggs: {}", report.shade_total);
    let _ = writeln!(
        out,
        "  Trays: {} full, {} loose",
        report.grand_total / EGGS_PER_TRAY,
        report.grand_total % EGGS_PER_TRAY
    );
    if let Some(percentage) = report.laying_percentage {
        let _ = writeln!(out, "  Laying: {percentage:.1}%");
    }
    if let Some(comment) = report.performance_comment.as_deref().filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "  Performance: {comment}");
    }

    for cage in &report.cages {
        let kind = cage.cage_type.map(|t| format!(" ({t})")).unwrap_or_default();
        let _ = writeln!(out, "Cage {}{}: {} eggs", cage.cage_id, kind, cage.cage_total);
        for partition in &cage.partitions {
            let _ = writeln!(out, "  {}: {} eggs", partition.side.label(), partition.total());
            for row in &partition.rows {
                let cells: Vec<String> = row.iter().map(|b| b.eggs.to_string()).collect();
                let _ = writeln!(out, "    {}", cells.join(" "));
            }
        }
    }
    out
}

pub fn render_dashboard(overview: &DashboardOverview, layout: &FarmLayout) -> String {
    let mut out = String::new();
    let chickens = overview
        .total_chickens
        .map_or_else(|| "unknown".to_string(), |n| n.to_string());
    let _ = writeln!(out, "Chickens: {chickens}");
    let _ = writeln!(out, "Eggs today: {}", overview.eggs_today.unwrap_or(0));
    let _ = writeln!(out, "Laying: {:.1}%", overview.laying_percentage());
    let _ = writeln!(out, "Trays in store: {:.1}", overview.trays_in_store());
    let _ = writeln!(out, "Daily feed: {:.1} kg", overview.daily_feed_kg());
    let _ = writeln!(out, "Expenses today: {:.2}", overview.expenses_today());
    let _ = writeln!(out, "Shade eggs today: {}", overview.shade_eggs_today());

    for cage in layout.cages() {
        let breakdown = overview.cage_breakdown(cage.id.0);
        let _ = writeln!(
            out,
            "Cage {}: {} (front {}, back {})",
            cage.id, breakdown.total, breakdown.front, breakdown.back
        );
    }
    out
}

pub fn render_users(users: &[UserRecord]) -> String {
    if users.is_empty() {
        return "No users\n".to_string();
    }
    let mut out = String::new();
    for user in users {
        let role = user.role.as_deref().unwrap_or("-");
        let status = match user.is_approved {
            Some(false) => " (pending)",
            _ => "",
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<20} {:<30} {}{}",
            user.id,
            user.display_name(),
            user.email.as_deref().unwrap_or(""),
            role,
            status
        );
    }
    out
}

pub fn render_notifications(notifications: &[Notification]) -> String {
    let mut out = String::new();
    for notification in notifications {
        let _ = writeln!(
            out,
            "[{}] {}",
            notification.raised_at.format("%H:%M:%S"),
            notification.message
        );
    }
    out
}

/// History sections rendered as one line per entry
pub fn render_history(kind: RecordKind, history: &RecordHistory) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} to {})",
        kind.title(),
        history.date_range.start_date,
        history.date_range.end_date
    );

    for (key, value) in &history.summary {
        let _ = writeln!(out, "  {}: {}", key, scalar(value));
    }

    for (name, entries) in &history.sections {
        let Some(entries) = entries.as_array() else {
            continue;
        };
        let _ = writeln!(out, "{} ({})", name, entries.len());
        for entry in entries {
            let _ = writeln!(out, "  {}", entry_line(entry));
        }
    }
    out
}

pub fn render_detailed(kind: DetailedReportKind, report: &DetailedReport) -> String {
    let range = &report.date_range;
    let totals = &report.summary_totals;
    let mut out = String::new();

    match kind {
        DetailedReportKind::Feed => {
            let _ = writeln!(out, "Feed report ({} to {})", range.start_date, range.end_date);
            let _ = writeln!(out, "Purchases:");
            for purchase in &report.feed_purchase_records {
                let _ = writeln!(
                    out,
                    "  {}: {:.1} kg {} for {:.2}",
                    purchase.date,
                    purchase.quantity_kg(),
                    purchase.feed_type,
                    purchase.total_cost()
                );
            }
            let _ = writeln!(out, "Consumption:");
            for consumption in &report.feed_consumption_records {
                let _ = writeln!(out, "  {}: {:.1} kg used", consumption.date, consumption.quantity_used_kg());
            }
            let _ = writeln!(out, "  Total feed used: {:.1} kg", totals.feed_used_kg());
            let _ = writeln!(out, "  Feed remaining: {:.1} kg", report.feed_remaining_kg());
        }
        DetailedReportKind::Performance => {
            let _ = writeln!(out, "Performance report ({} to {})", range.start_date, range.end_date);
            let _ = writeln!(out, "Records:");
            for record in &report.egg_collection_records {
                let cage = record.cage_id.map_or("N/A".to_string(), |id| id.to_string());
                let partition = record.partition_index.map_or("N/A".to_string(), |index| index.to_string());
                let _ = writeln!(
                    out,
                    "  {} cage {} partition {}: {} eggs, by {} ({})",
                    record.laid_date,
                    cage,
                    partition,
                    record.count,
                    record.recorded_by.as_deref().unwrap_or("unknown"),
                    record.source.as_deref().unwrap_or("-")
                );
            }
            let _ = writeln!(out, "Daily:");
            for day in &report.daily_summaries {
                let _ = writeln!(out, "  {}: {} eggs", day.date, day.eggs_collected);
            }
            let _ = writeln!(out, "  Total eggs: {}", totals.total_eggs);
        }
        DetailedReportKind::Weekly => {
            let _ = writeln!(out, "Weekly collection ({} to {})", range.start_date, range.end_date);
            let _ = writeln!(out, "  Total eggs: {}", totals.total_eggs);
            let _ = writeln!(out, "  Trays sold: {}", totals.trays_sold());
            let _ = writeln!(out, "Daily:");
            for day in &report.daily_summaries {
                let status = day.status.as_deref().map(|s| format!(" ({s})")).unwrap_or_default();
                let _ = writeln!(out, "  {}: {} eggs{}", day.date, day.eggs_collected, status);
            }
            let _ = writeln!(out, "  Average per day: {}", report.average_daily_eggs());
            if let Some(best) = report.most_productive_day() {
                let _ = writeln!(out, "  Best day: {} ({} eggs)", best.date, best.eggs_collected);
            }
        }
        DetailedReportKind::Monthly => {
            let _ = writeln!(out, "Monthly collection, {}", range.start_date.format("%B %Y"));
            let _ = writeln!(out, "  Total eggs: {}", totals.total_eggs);
            let _ = writeln!(out, "  Trays sold: {}", totals.trays_sold());
            let _ = writeln!(out, "  Average per day: {}", report.average_daily_eggs());
            let _ = writeln!(
                out,
                "  Days recorded: {}, not recorded: {}",
                report.recorded_days(),
                report.unrecorded_days()
            );
            if let Some(best) = report.best_week() {
                let _ = writeln!(out, "  Best week: week {} from {} ({} eggs)", best.week, best.start_date, best.total);
            }
        }
    }
    out
}

fn entry_line(entry: &Value) -> String {
    match entry.as_object() {
        Some(fields) => fields
            .iter()
            .map(|(key, value)| format!("{key}={}", scalar(value)))
            .collect::<Vec<_>>()
            .join(" "),
        None => scalar(entry),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
