//! Plain-text rendering of the list view, dashboard and notices.

use client_core::{DashboardSummary, ListState, Mood, Notice, NoticeLevel};
use shared::domain::{Client, ClientStatus, PaymentStatus, SortColumn, SortDirection, Theme};

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: &'static str,
    pub good: &'static str,
    pub warn: &'static str,
    pub bad: &'static str,
    pub dim: &'static str,
    pub enabled: bool,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                accent: "\x1b[1;36m",
                good: "\x1b[32m",
                warn: "\x1b[33m",
                bad: "\x1b[31m",
                dim: "\x1b[90m",
                enabled: true,
            },
            Theme::Light => Self {
                accent: "\x1b[1;34m",
                good: "\x1b[32m",
                warn: "\x1b[35m",
                bad: "\x1b[31m",
                dim: "\x1b[37m",
                enabled: true,
            },
        }
    }

    pub fn plain() -> Self {
        Self {
            accent: "",
            good: "",
            warn: "",
            bad: "",
            dim: "",
            enabled: false,
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.enabled {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{text}{}", " ".repeat(width - count))
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn header_label(label: &str, column: SortColumn, state: &ListState) -> String {
    if state.query.sort != column {
        return label.to_string();
    }
    let arrow = match state.query.order {
        SortDirection::Asc => "▲",
        SortDirection::Desc => "▼",
    };
    format!("{label} {arrow}")
}

fn status_cell(status: ClientStatus, palette: &Palette) -> String {
    let color = match status {
        ClientStatus::Active => palette.good,
        ClientStatus::Inactive => palette.dim,
    };
    palette.paint(color, &fit(status.as_str(), 9))
}

fn payment_cell(payment: PaymentStatus, palette: &Palette) -> String {
    let color = match payment {
        PaymentStatus::Paid => palette.good,
        PaymentStatus::Unpaid => palette.warn,
    };
    palette.paint(color, &fit(payment.as_str(), 8))
}

fn row(client: &Client, selected: bool, palette: &Palette) -> String {
    format!(
        "{} {} {} {} {} {} {} {}",
        if selected { "[x]" } else { "[ ]" },
        fit(&client.id.to_string(), 5),
        fit(&client.full_name, 22),
        fit(&client.phone, 15),
        fit(&client.course, 14),
        status_cell(client.status, palette),
        payment_cell(client.payment_status, palette),
        client.created_at.format("%Y-%m-%d"),
    )
}

/// Active filters in one line, or `None` when nothing is filtered.
pub fn filter_line(state: &ListState) -> Option<String> {
    let query = &state.query;
    let mut parts = Vec::new();
    if !query.text.is_empty() {
        parts.push(format!("q=\"{}\"", query.text));
    }
    if let Some(status) = query.status {
        parts.push(format!("status={status}"));
    }
    if let Some(payment) = query.payment {
        parts.push(format!("payment={payment}"));
    }
    if !query.course.trim().is_empty() {
        parts.push(format!("course=\"{}\"", query.course.trim()));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

pub fn render_table(state: &ListState, palette: &Palette) -> String {
    let select_all = if state.all_selected_on_page() {
        "[x]"
    } else if state.any_selected_on_page() {
        "[-]"
    } else {
        "[ ]"
    };
    let header = format!(
        "{} {} {} {} {} {} {} {}",
        select_all,
        fit("ID", 5),
        fit(&header_label("Full name", SortColumn::FullName, state), 22),
        fit("Phone", 15),
        fit("Course", 14),
        fit(&header_label("Status", SortColumn::Status, state), 9),
        fit(&header_label("Payment", SortColumn::PaymentStatus, state), 8),
        header_label("Created", SortColumn::CreatedAt, state),
    );

    let mut lines = vec![palette.paint(palette.accent, &header)];
    if let Some(filters) = filter_line(state) {
        lines.insert(0, palette.paint(palette.dim, &format!("filters: {filters}")));
    }
    if state.items.is_empty() && !state.loading {
        lines.push(palette.paint(palette.dim, "  No clients found"));
    }
    for client in &state.items {
        lines.push(row(client, state.selection.contains(client.id), palette));
    }

    let mut summary = state.summary_line();
    if !state.selection.is_empty() {
        summary.push_str(&format!(" • {} selected", state.selection.len()));
    }
    let summary_color = if state.error.is_some() {
        palette.bad
    } else {
        palette.dim
    };
    lines.push(palette.paint(summary_color, &summary));
    lines.join("\n")
}

/// Detail view of a single client with the follow-up actions.
pub fn render_detail(client: &Client, palette: &Palette) -> String {
    let label = |text: &str| palette.paint(palette.dim, &fit(text, 11));
    let status_color = match client.status {
        ClientStatus::Active => palette.good,
        ClientStatus::Inactive => palette.dim,
    };
    let payment_color = match client.payment_status {
        PaymentStatus::Paid => palette.good,
        PaymentStatus::Unpaid => palette.warn,
    };
    [
        palette.paint(palette.accent, "Client details"),
        format!("{}{}", label("ID"), client.id),
        format!("{}{}", label("Full name"), client.full_name),
        format!("{}{}", label("Phone"), client.phone),
        format!("{}{}", label("Course"), client.course),
        format!(
            "{}{}",
            label("Status"),
            palette.paint(status_color, client.status.as_str())
        ),
        format!(
            "{}{}",
            label("Payment"),
            palette.paint(payment_color, client.payment_status.as_str())
        ),
        format!(
            "{}{}",
            label("Created at"),
            client.created_at.format("%Y-%m-%d %H:%M UTC")
        ),
        palette.paint(
            palette.dim,
            &format!("actions: edit {id} key=value...  |  del {id}", id = client.id),
        ),
    ]
    .join("\n")
}

pub fn render_notice(notice: &Notice, palette: &Palette) -> String {
    let (color, tag) = match notice.level {
        NoticeLevel::Success => (palette.good, "ok"),
        NoticeLevel::Info => (palette.accent, "info"),
        NoticeLevel::Error => (palette.bad, "error"),
    };
    palette.paint(color, &format!("[{tag}] {}", notice.message))
}

fn bar(pct: u8) -> String {
    let filled = usize::from(pct) / 5;
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}

pub fn render_dashboard(summary: &DashboardSummary, palette: &Palette) -> String {
    let mood_color = match summary.mood {
        Mood::Excellent => palette.good,
        Mood::Good => palette.warn,
        Mood::NeedsAttention => palette.bad,
    };
    let stats = &summary.stats;
    [
        palette.paint(palette.accent, "Dashboard"),
        format!("Total clients   {}", stats.total),
        format!("New today       {}", summary.today_new()),
        format!("New last 7 days {}", summary.last7_new()),
        format!(
            "Paid            {:>3}% {} ({} paid / {} unpaid)",
            summary.paid_rate_pct(),
            bar(summary.paid_rate_pct()),
            stats.paid,
            stats.unpaid
        ),
        format!(
            "Active          {:>3}% {} ({} active)",
            summary.active_rate_pct(),
            bar(summary.active_rate_pct()),
            stats.active
        ),
        format!(
            "Health score    {:>3}  {}",
            summary.health_score,
            palette.paint(mood_color, summary.mood.label())
        ),
        palette.paint(palette.dim, summary.mood.hint()),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{domain::ClientId, protocol::StatsOverview};

    fn sample_client(id: i64, name: &str) -> Client {
        Client {
            id: ClientId(id),
            full_name: name.into(),
            phone: "+998901234567".into(),
            course: "Frontend".into(),
            status: ClientStatus::Active,
            payment_status: PaymentStatus::Unpaid,
            created_at: "2024-03-09T12:00:00Z".parse().expect("timestamp"),
        }
    }

    #[test]
    fn table_marks_selection_and_sort_column() {
        let mut state = ListState {
            items: vec![sample_client(1, "Ali"), sample_client(2, "Vali")],
            total: 2,
            ..ListState::default()
        };
        state.selection.toggle(ClientId(2));
        state.query.toggle_sort(SortColumn::FullName);

        let out = render_table(&state, &Palette::plain());
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("[-]"));
        assert!(lines[0].contains("Full name ▲"));
        assert!(lines[1].starts_with("[ ] 1"));
        assert!(lines[2].starts_with("[x] 2"));
        assert!(lines[2].contains("2024-03-09"));
        assert_eq!(
            lines[3],
            "Showing 1–2 of 2 • Page 1/1 • 1 selected"
        );
    }

    #[test]
    fn empty_page_shows_placeholder_and_filters() {
        let mut state = ListState::default();
        state.query.set_text("zzz");
        state.query.set_status(Some(ClientStatus::Inactive));

        let out = render_table(&state, &Palette::plain());
        assert!(out.starts_with("filters: q=\"zzz\" status=inactive"));
        assert!(out.contains("No clients found"));
        assert!(out.ends_with("Showing 0–0 of 0 • Page 1/1"));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(fit("Abdurakhmonov", 6), "Abdur…");
        assert_eq!(fit("Ali", 5), "Ali  ");
    }

    #[test]
    fn detail_lists_every_field_and_actions() {
        let mut client = sample_client(7, "Ali Valiyev");
        client.payment_status = PaymentStatus::Paid;
        let state = ListState {
            items: vec![sample_client(3, "Vali"), client],
            total: 2,
            ..ListState::default()
        };

        let found = state.find(ClientId(7)).expect("visible");
        let out = render_detail(found, &Palette::plain());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Client details",
                "ID         7",
                "Full name  Ali Valiyev",
                "Phone      +998901234567",
                "Course     Frontend",
                "Status     active",
                "Payment    paid",
                "Created at 2024-03-09 12:00 UTC",
                "actions: edit 7 key=value...  |  del 7",
            ]
        );
        assert!(state.find(ClientId(99)).is_none());
    }

    #[test]
    fn dashboard_shows_score_and_mood() {
        let summary = DashboardSummary::from_stats(StatsOverview {
            total: 10,
            paid: 10,
            unpaid: 0,
            active: 5,
            today_new: Some(1),
            last7_new: None,
        });
        let out = render_dashboard(&summary, &Palette::plain());
        assert!(out.contains("Health score     80  Excellent"));
        assert!(out.contains("New last 7 days 0"));
        assert!(out.contains("Everything looks solid."));
    }

    #[test]
    fn colours_follow_theme() {
        let notice = Notice::error("Delete error");
        let dark = render_notice(&notice, &Palette::for_theme(Theme::Dark));
        assert!(dark.starts_with("\x1b[31m[error] Delete error"));
        assert_eq!(
            render_notice(&Notice::info("Deleted"), &Palette::plain()),
            "[info] Deleted"
        );
        assert_ne!(
            Palette::for_theme(Theme::Dark).accent,
            Palette::for_theme(Theme::Light).accent
        );
    }
}
