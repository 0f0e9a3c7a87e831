use quorum_core::engine::{Recommendation, RecommendationPriority};
use quorum_core::IdeaId;

use crate::commands::common::{parse_id, print_json, CliContext};
use crate::error::CliError;

pub fn run_recommend(ctx: &CliContext, idea: &str, as_json: bool) -> Result<(), CliError> {
    let idea_id: IdeaId = parse_id("idea", idea)?;
    let service = ctx.open_service()?;
    let recommendations = service.recommendations(&idea_id)?;

    if as_json {
        print_json(&recommendations)?;
    } else if recommendations.is_empty() {
        println!("Nothing to recommend");
    } else {
        for recommendation in &recommendations {
            println!("{}", format_recommendation(recommendation));
        }
    }
    Ok(())
}

pub fn format_recommendation(recommendation: &Recommendation) -> String {
    let priority = match recommendation.priority {
        RecommendationPriority::High => "high",
        RecommendationPriority::Medium => "medium",
        RecommendationPriority::Low => "low",
    };
    let mut line = format!(
        "[{priority}] {}: {}",
        recommendation.title, recommendation.description
    );
    if !recommendation.suggestion_ids.is_empty() {
        line.push_str(&format!(" ({} suggestions)", recommendation.suggestion_ids.len()));
    }
    line
}
