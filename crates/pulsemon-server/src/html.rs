use pulsemon_common::Metric;

/// Renders the stored metrics as a minimal HTML table, sorted order as
/// provided by the storage listing.
pub fn render_metrics(metrics: &[Metric]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>pulsemon metrics</title></head>\n<body>\n\
         <h1>Metrics</h1>\n<table border=\"1\">\n\
         <tr><th>Name</th><th>Kind</th><th>Value</th></tr>\n",
    );
    for metric in metrics {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&metric.name),
            metric.kind,
            metric.value_string(),
        ));
    }
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

/// Metric names arrive from clients, so the listing escapes them.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
