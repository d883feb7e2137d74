//! Page preparation before filtering: zoom and a table probe.

use std::time::Duration;

use cdp_adapter::{AdapterError, BrowserPage};
use crm_recipes::ZoomSpec;
use l6_observe::TransitionObserver;
use serde::Deserialize;
use tracing::{debug, info};

const TABLE_PROBE: &str = r#"(() => {
    const headers = Array.from(document.querySelectorAll('th')).map((th) => (th.textContent || '').trim());
    const textInputs = Array.from(document.querySelectorAll('input[type="text"]'));
    const tableInputs = textInputs.filter((input) => input.closest('table') !== null);
    return {
        headers,
        totalInputs: textInputs.length,
        tableInputs: tableInputs.length,
        rows: document.querySelectorAll('tbody tr').length,
    };
})()"#;

/// Shape of the results grid as rendered after zooming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProbe {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub total_inputs: usize,
    #[serde(default)]
    pub table_inputs: usize,
    #[serde(default)]
    pub rows: usize,
}

impl TableProbe {
    pub fn has_column(&self, column: &str) -> bool {
        let needle = column.to_lowercase();
        self.headers
            .iter()
            .any(|header| header.to_lowercase().contains(&needle))
    }
}

pub fn zoom_script(factor: f64) -> String {
    format!("document.body.style.zoom = '{}'", factor)
}

/// Apply the zoom, wait for reflow and probe the table.
///
/// Only the zoom itself can fail; the probe is diagnostic and yields `None`
/// when the page does not answer in the expected shape.
pub async fn prepare_page(
    page: &dyn BrowserPage,
    zoom: &ZoomSpec,
    observer: &dyn TransitionObserver,
) -> Result<Option<TableProbe>, AdapterError> {
    page.evaluate(&zoom_script(zoom.factor)).await?;
    info!(factor = zoom.factor, "page zoom applied");
    tokio::time::sleep(Duration::from_millis(zoom.settle_ms)).await;
    observer.on_transition(page, "zoom_applied").await;

    let probe = match page.evaluate(TABLE_PROBE).await {
        Ok(value) => match serde_json::from_value::<TableProbe>(value) {
            Ok(probe) => Some(probe),
            Err(err) => {
                debug!(error = %err, "table probe returned an unexpected shape");
                None
            }
        },
        Err(err) => {
            debug!(error = %err, "table probe failed");
            None
        }
    };

    if let Some(probe) = &probe {
        debug!(
            headers = probe.headers.len(),
            total_inputs = probe.total_inputs,
            table_inputs = probe.table_inputs,
            rows = probe.rows,
            "table probe"
        );
        if let Some(column) = &zoom.probe_column {
            debug!(column = %column, present = probe.has_column(column), "filter column check");
        }
    }
    Ok(probe)
}
