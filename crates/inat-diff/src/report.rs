//! Text, Markdown and JSON report rendering
//!
//! Purely presentational: each renderer walks an immutable report
//! snapshot and never touches the network.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::diff::ClassifiedSpecies;
use crate::error::Result;
use crate::query::{
    NewSpeciesReport, ObservationReport, SingleSpeciesReport, SpeciesListReport,
};
use crate::resolve::PlaceMatch;

/// Species shown before truncation in the text renderer
const TEXT_SPECIES_LIMIT: usize = 20;
/// Species shown before truncation in the Markdown renderer
const MARKDOWN_SPECIES_LIMIT: usize = 50;

/// Serialize a report snapshot and write it to `path`
pub fn save_json<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

fn species_line(species: &ClassifiedSpecies) -> String {
    let name = species.name.as_deref().unwrap_or("Unknown");
    let rank = species.rank.as_deref().unwrap_or("");
    match species.preferred_common_name.as_deref() {
        Some(common) => format!(
            "  {} ({}) [{}]: {} observations",
            name, common, rank, species.observation_count
        ),
        None => format!("  {} [{}]: {} observations", name, rank, species.observation_count),
    }
}

/// Plain-text rendering of the all-new-species report
pub fn render_new_species_text(report: &NewSpeciesReport) -> String {
    let mut out = String::new();
    let query = &report.query;

    let _ = writeln!(out, "Region searched: {}", query.region);
    let _ = writeln!(
        out,
        "Resolved to: {} (ID: {})",
        query.place_display_name, query.place_id
    );
    if query.place_matched_as == PlaceMatch::Fallback.label() {
        let _ = writeln!(out, "WARNING: No exact match found - using first search result");
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Period: {} ({} to {})",
        query.time_period, query.start_date, query.end_date
    );
    let _ = writeln!(
        out,
        "Lookback: {} years ({})",
        report.lookback_years, report.lookback_period
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Total species in period: {}", report.total_species_in_period);
    let _ = writeln!(
        out,
        "New species (no prior observations): {}",
        report.new_species_count
    );
    let _ = writeln!(out, "Established species: {}", report.established_species_count);

    if !report.new_species.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "=== NEW SPECIES ({}) ===", report.new_species.len());
        for species in report.new_species.iter().take(TEXT_SPECIES_LIMIT) {
            let _ = writeln!(out, "{}", species_line(species));
        }
        if report.new_species.len() > TEXT_SPECIES_LIMIT {
            let _ = writeln!(
                out,
                "  ... and {} more",
                report.new_species.len() - TEXT_SPECIES_LIMIT
            );
        }
    }

    out
}

/// Markdown rendering of the all-new-species report
pub fn render_new_species_markdown(report: &NewSpeciesReport) -> String {
    let mut out = String::new();
    let query = &report.query;

    let _ = writeln!(out, "# New Species in {}", query.place_display_name);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "**Period:** {} ({} to {})",
        query.time_period, query.start_date, query.end_date
    );
    let _ = writeln!(
        out,
        "**Lookback:** {} years ({})",
        report.lookback_years, report.lookback_period
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out, "- **Total species observed:** {}", report.total_species_in_period);
    let _ = writeln!(
        out,
        "- **New species (no prior observations):** {}",
        report.new_species_count
    );
    let _ = writeln!(out, "- **Established species:** {}", report.established_species_count);
    let _ = writeln!(out);

    if report.new_species.is_empty() {
        let _ = writeln!(out, "No new species found in this period.");
    } else {
        let _ = writeln!(out, "## New Species ({})", report.new_species.len());
        let _ = writeln!(out);

        for (i, species) in report
            .new_species
            .iter()
            .take(MARKDOWN_SPECIES_LIMIT)
            .enumerate()
        {
            let name = species.name.as_deref().unwrap_or("Unknown");
            let rank = species.rank.as_deref().unwrap_or("");
            let quality = species
                .highest_quality_grade_label
                .as_deref()
                .unwrap_or("Unknown");

            match species.preferred_common_name.as_deref() {
                Some(common) => {
                    let _ = writeln!(
                        out,
                        "{}. **{}** ({}) - {} observations [{}] - Quality: {}",
                        i + 1,
                        name,
                        common,
                        species.observation_count,
                        rank,
                        quality
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "{}. **{}** - {} observations [{}] - Quality: {}",
                        i + 1,
                        name,
                        species.observation_count,
                        rank,
                        quality
                    );
                }
            }
            let _ = writeln!(
                out,
                "   - View on iNaturalist: https://www.inaturalist.org/taxa/{}",
                species.id
            );
        }

        if report.new_species.len() > MARKDOWN_SPECIES_LIMIT {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "*... and {} more species*",
                report.new_species.len() - MARKDOWN_SPECIES_LIMIT
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = writeln!(
        out,
        "*Note: 'New' means no observations in the {}-year lookback period. \
         This doesn't necessarily mean the species is truly invasive or newly arrived.*",
        report.lookback_years
    );

    out
}

/// Plain-text rendering of the single-species check
pub fn render_single_species_text(report: &SingleSpeciesReport) -> String {
    let mut out = String::new();
    let query = &report.query;

    let _ = writeln!(
        out,
        "Query: {} in {}",
        query.taxon_name.as_deref().unwrap_or("Unknown"),
        query.region
    );
    let _ = writeln!(
        out,
        "Period: {} ({} to {})",
        query.time_period, query.start_date, query.end_date
    );
    let _ = writeln!(out, "Total observations: {}", report.total_results);
    let _ = writeln!(
        out,
        "New to region: {}",
        if report.is_new_to_region { "YES" } else { "NO" }
    );
    let _ = writeln!(out, "Analysis: {}", report.analysis);

    out
}

/// Plain-text rendering of the raw observation query
pub fn render_observations_text(report: &ObservationReport) -> String {
    let mut out = String::new();
    let query = &report.query;

    let _ = writeln!(
        out,
        "Query: {} in {}",
        query.taxon_name.as_deref().unwrap_or("Unknown"),
        query.region
    );
    let _ = writeln!(
        out,
        "Period: {} ({} to {})",
        query.time_period, query.start_date, query.end_date
    );
    let _ = writeln!(out, "Total observations: {}", report.total_results);

    out
}

/// Plain-text rendering of the species list
pub fn render_species_list_text(report: &SpeciesListReport) -> String {
    let mut out = String::new();
    let query = &report.query;

    let _ = writeln!(out, "Region: {}", query.region);
    let _ = writeln!(
        out,
        "Period: {} ({} to {})",
        query.time_period, query.start_date, query.end_date
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Unique species found: {}", report.species_count);

    for species in report.species.iter().take(10) {
        let name = species.name.as_deref().unwrap_or("Unknown");
        match species.preferred_common_name.as_deref() {
            Some(common) => {
                let _ = writeln!(
                    out,
                    "  {} ({}): {} observations",
                    name, common, species.observation_count
                );
            }
            None => {
                let _ = writeln!(out, "  {}: {} observations", name, species.observation_count);
            }
        }
    }
    if report.species.len() > 10 {
        let _ = writeln!(out, "  ... and {} more", report.species.len() - 10);
    }

    out
}
