//! Logical targets shared by the built-in recipes.

use action_locator::{LogicalTarget, Pick, SelectorCandidate};

/// Menu entry: exact text, then a link containing it, then `fallback`.
pub fn menu_entry(label: &str, fallback: SelectorCandidate) -> LogicalTarget {
    LogicalTarget::new(format!("nav:{label}")).with_candidates([
        SelectorCandidate::text(label),
        SelectorCandidate::contains(label).within("a"),
        fallback,
    ])
}

/// Top-level CRM module link.
pub fn crm_menu() -> LogicalTarget {
    menu_entry("CRM", SelectorCandidate::attribute("href", "crm").within("a"))
}

/// Sub-menu entry rendered as a `span` inside the side menu.
pub fn submenu(label: &str) -> LogicalTarget {
    menu_entry(label, SelectorCandidate::contains(label).within("span"))
}

pub fn excel_trigger() -> LogicalTarget {
    LogicalTarget::new("export-trigger").with_candidates([
        SelectorCandidate::attribute("title", "Excel").within("button"),
        SelectorCandidate::contains("Excel").within("button"),
        SelectorCandidate::css("i.fa-file-excel"),
        SelectorCandidate::css(".excel-icon"),
        SelectorCandidate::attribute("aria-label", "Excel").within("button"),
    ])
}

/// The newest "Aceptar" button; stacked dialogs render it last.
pub fn confirm_last() -> LogicalTarget {
    LogicalTarget::new("export-confirm")
        .with_candidate(SelectorCandidate::contains("Aceptar").within("button"))
        .with_pick(Pick::Last)
}

/// Other renderings of the confirmation button, still newest first.
pub fn confirm_fallbacks() -> Vec<LogicalTarget> {
    vec![LogicalTarget::new("export-confirm-fallback")
        .with_candidates([
            SelectorCandidate::text("Aceptar").within("button"),
            SelectorCandidate::script(
                "Array.from(document.querySelectorAll('.ui-button')).filter((el) => (el.innerText || '').includes('Aceptar'))",
            ),
            SelectorCandidate::script(
                "Array.from(document.querySelectorAll('button[type=\"button\"]')).filter((el) => (el.innerText || '').includes('Aceptar'))",
            ),
            SelectorCandidate::css(".ui-confirmdialog-yes"),
        ])
        .with_pick(Pick::Last)]
}

pub fn tasks_filter_button() -> LogicalTarget {
    LogicalTarget::new("tasks-filter-open")
        .with_candidate(SelectorCandidate::attribute("title", "Filtro").within("button"))
}

pub fn tasks_filter_submit() -> LogicalTarget {
    LogicalTarget::new("tasks-filter-submit").with_candidate(
        SelectorCandidate::attribute("id", "btnFiltroAceptarTareas").within("button"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_entries_try_exact_text_first() {
        let target = submenu("Clientes");
        assert_eq!(target.name, "nav:Clientes");
        assert_eq!(
            target.describe_candidates(),
            vec![
                "text=\"Clientes\"",
                "a:text~\"Clientes\"",
                "span:text~\"Clientes\"",
            ]
        );
    }

    #[test]
    fn confirmation_picks_last() {
        assert_eq!(confirm_last().pick, Pick::Last);
        assert!(confirm_fallbacks()
            .iter()
            .all(|target| target.pick == Pick::Last));
    }
}
