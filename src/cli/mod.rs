//! Terminal rendering for the `labkeeper` binary.

use crate::access::{FieldLock, FieldRuleTable};
use crate::identity::{PendingAdmin, Session, SessionStore};
use crate::screen::Inspection;

const MAX_COL_WIDTH: usize = 60;

/// Render rows under a header as an ASCII table.
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| display_len(h).min(MAX_COL_WIDTH)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(display_len(cell).min(MAX_COL_WIDTH));
        }
    }
    let sep = build_separator(&widths);
    let head: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(sep.clone());
    out.push(build_row(&head, &widths));
    out.push(sep.clone());
    for r in rows {
        out.push(build_row(r, &widths));
    }
    out.push(sep);
    out.join("\n")
}

pub fn render_inspection(i: &Inspection) -> String {
    let yes_no = |b: bool| if b { "yes".to_string() } else { "no".to_string() };
    let lock = |l: FieldLock| match l {
        FieldLock::Editable => "editable".to_string(),
        FieldLock::Locked => "locked".to_string(),
    };
    let deps = if i.dependents.is_empty() {
        "-".to_string()
    } else {
        i.dependents.iter().map(|d| format!("{}#{}.{}", d.kind, d.id, d.field)).collect::<Vec<_>>().join(", ")
    };
    let rows = vec![
        vec!["record".to_string(), format!("{} #{}", i.kind, i.record_id)],
        vec!["principal".to_string(), format!("{} ({})", i.principal, i.role)],
        vec!["owned".to_string(), yes_no(i.owned)],
        vec!["dependents".to_string(), deps],
        vec!["can edit".to_string(), yes_no(i.decision.can_edit)],
        vec!["can delete".to_string(), yes_no(i.decision.can_delete)],
        vec!["fields".to_string(), lock(i.decision.fields)],
        vec!["updateable flag".to_string(), lock(i.decision.updateable_flag)],
    ];
    let mut s = render_table(&["check", "result"], &rows);
    for n in i.notices() {
        s.push_str("\nnote: ");
        s.push_str(&n);
    }
    s
}

pub fn render_status(store: &SessionStore, session: Option<&Session>) -> String {
    match session {
        Some(s) => {
            let now = store.clock().now();
            let remaining = s.expires_at() - now;
            format!(
                "{} | {}\nsession valid, expires at {} ({}m left)",
                store.current_role(),
                store.current_principal(),
                s.expires_at().format("%Y-%m-%d %H:%M:%S UTC"),
                remaining.num_minutes().max(0)
            )
        }
        None => format!("{} | {}\nnot logged in", store.current_role(), store.current_principal()),
    }
}

pub fn render_rules(t: &FieldRuleTable) -> String {
    let rows: Vec<Vec<String>> = t
        .entries()
        .into_iter()
        .map(|e| vec![
            e.role.to_string(),
            e.owner.to_string(),
            e.mutable.to_string(),
            format!("{:?}", e.fields).to_lowercase(),
            format!("{:?}", e.updateable_flag).to_lowercase(),
        ])
        .collect();
    render_table(&["role", "owner", "updateable", "fields", "updateable flag"], &rows)
}

pub fn render_pending_admins(admins: &[PendingAdmin]) -> String {
    if admins.is_empty() {
        return "No unconfirmed admins found.".to_string();
    }
    let rows: Vec<Vec<String>> = admins.iter().map(|a| vec![a.id.to_string(), a.username.clone()]).collect();
    render_table(&["id", "name"], &rows)
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let text = truncate(&cell, *w);
        s.push(' ');
        s.push_str(&text);
        s.push_str(&" ".repeat(w.saturating_sub(display_len(&text))));
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}
