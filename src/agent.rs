//! The `WaterSeeker` pipeline
//!
//! One [`WaterSeekerAgent`] performs one run: analysis generation, record
//! reconciliation, recommendation generation, sanitizing and enrichment with
//! place metadata. The agent owns its log and its generator session; only
//! generation errors reach the caller.

use tracing::{info, instrument};

use crate::Result;
use crate::agent_log::AgentLog;
use crate::generation::{Prompt, TextGenerator};
use crate::location_resolver::LocationLookup;
use crate::models::recommendation::RECOMMENDATION_UNAVAILABLE;
use crate::models::{AnalysisRecord, LocationQuery, Recommendation, ResultBundle};
use crate::parsing::{parse_analysis, sanitize_recommendation};

const MODEL_LABEL: &str = "watsonx.ai (Granite-3-8B model)";
const NO_LOCATIONS_ANALYSIS: &str = "No locations provided for analysis.";
const NO_LOCATIONS_RECOMMENDATION: &str = "- No recommendation: No locations provided.";

pub struct WaterSeekerAgent<'a, G, R> {
    generator: G,
    resolver: &'a R,
    log: AgentLog,
}

impl<'a, G, R> WaterSeekerAgent<'a, G, R>
where
    G: TextGenerator,
    R: LocationLookup,
{
    #[must_use]
    pub fn new(generator: G, resolver: &'a R) -> Self {
        Self {
            generator,
            resolver,
            log: AgentLog::new(),
        }
    }

    /// Run the whole pipeline for one query
    #[instrument(skip_all, fields(locations = query.len()))]
    pub async fn run(mut self, query: &LocationQuery) -> Result<ResultBundle> {
        if query.is_empty() {
            self.log.push(format!("❌ {NO_LOCATIONS_ANALYSIS}"));
            return Ok(ResultBundle {
                analysis_text: NO_LOCATIONS_ANALYSIS.to_string(),
                recommendation_text: NO_LOCATIONS_RECOMMENDATION.to_string(),
                coordinates: Vec::new(),
                agent_log: self.log.display_text(),
                water_resources: Vec::new(),
                records: Vec::new(),
                recommendation: None,
                places: Vec::new(),
                count_mismatch: false,
            });
        }

        self.log.push(format!(
            "📋 Preparing to analyze {} location(s):",
            query.len()
        ));
        self.log.push(query.prompt_text());

        self.log
            .push(format!("🤖 Running analysis with {MODEL_LABEL}..."));
        let raw_analysis = self.generator.generate(&Prompt::analysis(query)).await?;
        self.log.push("✅ Analysis complete:");
        self.log.push(raw_analysis.clone());

        let parse = parse_analysis(&raw_analysis, query);
        self.log.extend(parse.log.iter().cloned());

        let (recommendation_text, recommendation) = if query.can_recommend() {
            let recommendation = self.recommend(&parse.text(), query, &parse.records).await?;
            (recommendation.display_text().to_string(), Some(recommendation))
        } else {
            info!("Single location selected, skipping recommendation");
            (RECOMMENDATION_UNAVAILABLE.to_string(), None)
        };

        let mut places = Vec::with_capacity(query.len());
        for coordinate in query.iter() {
            places.push(self.resolver.resolve(*coordinate, &mut self.log).await);
        }

        let mut analysis_lines: Vec<String> = parse.mismatch_marker().into_iter().collect();
        analysis_lines.extend(
            parse
                .records
                .iter()
                .zip(&places)
                .map(|(record, place)| record.enriched_line(&place.country, &place.city)),
        );

        info!(
            "Run finished with {} record(s), recommended index {:?}",
            parse.records.len(),
            recommendation.as_ref().and_then(|r| r.recommended_index)
        );

        Ok(ResultBundle {
            analysis_text: analysis_lines.join("\n"),
            recommendation_text,
            coordinates: query.coordinates().to_vec(),
            agent_log: self.log.display_text(),
            water_resources: places.iter().map(|p| p.water_note.clone()).collect(),
            records: parse.records,
            recommendation,
            places,
            count_mismatch: parse.count_mismatch,
        })
    }

    async fn recommend(
        &mut self,
        analysis: &str,
        query: &LocationQuery,
        records: &[AnalysisRecord],
    ) -> Result<Recommendation> {
        self.log
            .push("🔍 Performing comparison for recommendation...");
        self.log.extend(records.iter().map(|r| r.summary_line()));

        self.log
            .push(format!("🤖 Generating recommendation with {MODEL_LABEL}..."));
        let raw = self
            .generator
            .generate(&Prompt::recommendation(analysis, query.len()))
            .await?;

        let recommendation = sanitize_recommendation(&raw, query.len());
        if recommendation.is_empty() {
            self.log.push("❌ Failed to generate a valid recommendation.");
        } else {
            self.log.push("✅ Recommendation generated:");
            self.log.push(recommendation.text.clone());
        }
        Ok(recommendation)
    }
}
