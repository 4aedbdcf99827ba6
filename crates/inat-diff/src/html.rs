//! Self-contained HTML report rendering

use std::fmt::Write as _;

use crate::diff::ClassifiedSpecies;
use crate::query::{NewSpeciesReport, SpeciesListReport};
use crate::resolve::PlaceMatch;

const STYLE: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    max-width: 1200px;
    margin: 0 auto;
    padding: 20px;
    background-color: #f5f5f5;
}
.header {
    background-color: #74ac00;
    color: white;
    padding: 20px;
    border-radius: 8px;
    margin-bottom: 20px;
}
.header h1 { margin: 0 0 10px 0; }
.header p { margin: 5px 0; opacity: 0.9; }
.summary {
    background-color: white;
    padding: 20px;
    border-radius: 8px;
    margin-bottom: 20px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
}
.stats {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
    gap: 15px;
    margin-top: 15px;
}
.stat {
    background-color: #f8f8f8;
    padding: 15px;
    border-radius: 4px;
    border-left: 4px solid #74ac00;
}
.stat-value { font-size: 24px; font-weight: bold; color: #333; }
.stat-label { font-size: 14px; color: #666; margin-top: 5px; }
.species-section {
    background-color: white;
    padding: 20px;
    border-radius: 8px;
    margin-bottom: 20px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
}
.species-list { list-style: none; padding: 0; margin: 0; }
.species-item { padding: 15px; border-bottom: 1px solid #eee; }
.species-item:last-child { border-bottom: none; }
.species-item:hover { background-color: #f8f8f8; }
.species-name { font-size: 16px; font-weight: bold; color: #333; }
.species-name-latin { font-style: italic; color: #666; font-size: 14px; margin-left: 8px; }
.species-meta { font-size: 13px; color: #888; margin-top: 4px; }
.species-badge {
    display: inline-block;
    padding: 2px 8px;
    border-radius: 3px;
    font-size: 11px;
    font-weight: bold;
    margin-right: 6px;
    text-transform: uppercase;
}
.badge-new { background-color: #ff4444; color: white; }
.badge-rank { background-color: #e8e8e8; color: #666; }
.warning {
    background-color: #fff3cd;
    border-left: 4px solid #ffc107;
    padding: 12px 15px;
    border-radius: 4px;
    margin-bottom: 20px;
}
a { color: #74ac00; }
"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>iNaturalist Species Report: {}</title>\n\
         <style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

fn stat(value: &str, label: &str) -> String {
    format!(
        "<div class=\"stat\"><div class=\"stat-value\">{}</div>\
         <div class=\"stat-label\">{}</div></div>",
        escape(value),
        escape(label)
    )
}

fn species_item(species: &ClassifiedSpecies, is_new: bool) -> String {
    let latin = species.name.as_deref().unwrap_or("Unknown");
    let display = species.preferred_common_name.as_deref().unwrap_or(latin);

    let mut item = String::from("<li class=\"species-item\"><div class=\"species-info\">");
    let _ = write!(
        item,
        "<span class=\"species-name\">{}</span>",
        escape(display)
    );
    if species.preferred_common_name.is_some() {
        let _ = write!(
            item,
            "<span class=\"species-name-latin\">{}</span>",
            escape(latin)
        );
    }
    item.push_str("<div class=\"species-meta\">");
    if is_new {
        item.push_str("<span class=\"species-badge badge-new\">New</span>");
    }
    if let Some(rank) = species.rank.as_deref() {
        let _ = write!(
            item,
            "<span class=\"species-badge badge-rank\">{}</span>",
            escape(rank)
        );
    }
    let _ = write!(item, "{} observations", species.observation_count);
    if !is_new {
        let _ = write!(item, " ({} historical)", species.historical_count);
    }
    if let Some(quality) = species.highest_quality_grade_label.as_deref() {
        let _ = write!(item, " &middot; Best quality: {}", escape(quality));
    }
    let _ = write!(
        item,
        " &middot; <a href=\"https://www.inaturalist.org/taxa/{}\">View on iNaturalist</a>",
        species.id
    );
    item.push_str("</div></div></li>");
    item
}

/// Render the all-new-species report as a standalone HTML document
pub fn render_new_species_html(report: &NewSpeciesReport) -> String {
    let query = &report.query;
    let mut body = String::new();

    let _ = write!(
        body,
        "<div class=\"header\"><h1>New Species in {}</h1>\
         <p>Period: {} ({} to {})</p>\
         <p>Lookback: {} years ({})</p></div>",
        escape(&query.place_display_name),
        escape(&query.time_period),
        escape(&query.start_date),
        escape(&query.end_date),
        report.lookback_years,
        escape(&report.lookback_period)
    );

    if query.place_matched_as == PlaceMatch::Fallback.label() {
        let _ = write!(
            body,
            "<div class=\"warning\">No exact place match for \"{}\" - \
             results are for the first search result.</div>",
            escape(&query.region)
        );
    }

    body.push_str("<div class=\"summary\"><h2>Summary</h2><div class=\"stats\">");
    body.push_str(&stat(
        &report.total_species_in_period.to_string(),
        "Total species observed",
    ));
    body.push_str(&stat(&report.new_species_count.to_string(), "New species"));
    body.push_str(&stat(
        &report.established_species_count.to_string(),
        "Established species",
    ));
    body.push_str("</div></div>");

    body.push_str("<div class=\"species-section\">");
    if report.new_species.is_empty() {
        body.push_str("<h2>No new species found in this period</h2>");
    } else {
        let _ = write!(body, "<h2>New Species ({})</h2>", report.new_species.len());
        body.push_str("<ul class=\"species-list\">");
        for species in &report.new_species {
            body.push_str(&species_item(species, true));
        }
        body.push_str("</ul>");
    }
    body.push_str("</div>");

    document(&query.place_display_name, &body)
}

/// Render the species list report as a standalone HTML document
pub fn render_species_list_html(report: &SpeciesListReport) -> String {
    let query = &report.query;
    let mut body = String::new();

    let _ = write!(
        body,
        "<div class=\"header\"><h1>Species in {}</h1>\
         <p>Period: {} ({} to {})</p></div>",
        escape(&query.place_display_name),
        escape(&query.time_period),
        escape(&query.start_date),
        escape(&query.end_date)
    );

    body.push_str("<div class=\"summary\"><h2>Summary</h2><div class=\"stats\">");
    body.push_str(&stat(&report.species_count.to_string(), "Unique species"));
    body.push_str(&stat(
        &report.total_observations.to_string(),
        "Total observations",
    ));
    body.push_str("</div></div>");

    body.push_str("<div class=\"species-section\"><ul class=\"species-list\">");
    for species in &report.species {
        let latin = species.name.as_deref().unwrap_or("Unknown");
        let display = species.preferred_common_name.as_deref().unwrap_or(latin);
        let _ = write!(
            body,
            "<li class=\"species-item\"><div class=\"species-info\">\
             <span class=\"species-name\">{}</span>",
            escape(display)
        );
        if species.preferred_common_name.is_some() {
            let _ = write!(
                body,
                "<span class=\"species-name-latin\">{}</span>",
                escape(latin)
            );
        }
        let _ = write!(
            body,
            "<div class=\"species-meta\">{} observations</div></div></li>",
            species.observation_count
        );
    }
    body.push_str("</ul></div>");

    document(&query.place_display_name, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryInfo;

    fn report() -> NewSpeciesReport {
        NewSpeciesReport {
            query: QueryInfo {
                region: "Oregon".to_string(),
                place_id: 10,
                place_display_name: "Oregon, US".to_string(),
                place_matched_as: "priority type".to_string(),
                taxon_name: None,
                taxon_id: None,
                time_period: "this month".to_string(),
                start_date: "2024-02-01".to_string(),
                end_date: "2024-02-29".to_string(),
            },
            lookback_period: "2004-02-05 to 2024-01-31".to_string(),
            lookback_years: 20,
            total_species_in_period: 2,
            new_species_count: 1,
            established_species_count: 1,
            new_species: vec![ClassifiedSpecies {
                id: 47219,
                name: Some("Apis <mellifera>".to_string()),
                preferred_common_name: Some("Western Honey Bee".to_string()),
                rank: Some("species".to_string()),
                iconic_taxon: Some("Insecta".to_string()),
                observation_count: 12,
                historical_count: 0,
                highest_quality_grade_label: Some("Research Grade".to_string()),
            }],
            established_species: vec![],
            rate_limit_seconds: 1.2,
        }
    }

    #[test]
    fn html_document_is_complete_and_escaped() {
        let html = render_new_species_html(&report());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>New Species in Oregon, US</h1>"));
        assert!(html.contains("Apis &lt;mellifera&gt;"));
        assert!(html.contains("https://www.inaturalist.org/taxa/47219"));
        assert!(html.contains("Best quality: Research Grade"));
        assert!(!html.contains("class=\"warning\""));
    }

    #[test]
    fn fallback_match_renders_a_warning() {
        let mut r = report();
        r.query.place_matched_as = PlaceMatch::Fallback.label().to_string();
        let html = render_new_species_html(&r);
        assert!(html.contains("class=\"warning\""));
    }
}
