//! Zero-row probe statements used to discover a query's column layout.

/// Rewrite `sql` into a statement that returns the same columns and no rows.
///
/// Everything from the first `;` onwards is dropped (unless the `;` is the very first
/// character) and ` LIMIT 0;` is appended. This is plain text surgery, not parsing:
/// a `LIMIT` already present before the `;` is kept, so such statements probe with
/// two limits and are rejected by the store.
#[must_use]
pub fn probe_statement(sql: &str) -> String {
    let head = match sql.find(';') {
        Some(idx) if idx > 0 => &sql[..idx],
        _ => sql,
    };
    format!("{head} LIMIT 0;")
}
