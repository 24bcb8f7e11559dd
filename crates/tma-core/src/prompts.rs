use crate::state::AnalysisModifiers;
use crate::state::AnalysisType;
use crate::state::Framework;

const RISK_DETECTION_PROMPT: &str = "You are a transformation management expert specializing in risk detection. \
Analyze the provided information for early warning signs of resistance, delays, or issues. \
Identify patterns that might indicate problems 2-3 weeks ahead. Provide specific, actionable insights.";

const CHANGE_GUIDANCE_PROMPT: &str = "You are a change management consultant providing practical guidance. \
Based on the situation described, provide contextually relevant best practices from proven frameworks \
like ADKAR, Kotter's 8-Step Process, or Prosci methodology. Be specific and actionable.";

const TEAM_ANALYSIS_PROMPT: &str = "You are analyzing team communications and sentiment. \
Identify resistance patterns, engagement levels, and collaboration issues. \
Highlight both positive indicators and areas of concern.";

const RECOMMENDATIONS_PROMPT: &str = "You are providing strategic recommendations for transformation success. \
Based on the current situation, suggest targeted interventions, timeline adjustments, \
and stakeholder management strategies.";

pub fn instruction_for(kind: AnalysisType) -> &'static str {
    match kind {
        AnalysisType::RiskDetection => RISK_DETECTION_PROMPT,
        AnalysisType::ChangeGuidance => CHANGE_GUIDANCE_PROMPT,
        AnalysisType::TeamAnalysis => TEAM_ANALYSIS_PROMPT,
        AnalysisType::Recommendations => RECOMMENDATIONS_PROMPT,
    }
}

/// Unknown tags deliberately get the risk detection instruction.
pub fn instruction_for_tag(tag: &str) -> &'static str {
    instruction_for(AnalysisType::from_tag(tag).unwrap_or(AnalysisType::RiskDetection))
}

/// Text sent as the user message. The stored record keeps the raw input.
pub fn compose_user_text(kind: AnalysisType, input: &str, modifiers: AnalysisModifiers) -> String {
    match kind {
        AnalysisType::ChangeGuidance if modifiers.framework != Framework::AutoSelect => format!(
            "{input}\n\nPreferred framework: {}",
            modifiers.framework.label()
        ),
        AnalysisType::Recommendations => {
            format!("{input}\n\nUrgency level: {}", modifiers.urgency.label())
        }
        _ => input.to_string(),
    }
}

/// Short description shown under each analysis tab heading.
pub fn tab_blurb(kind: AnalysisType) -> &'static str {
    match kind {
        AnalysisType::RiskDetection => {
            "Identify transformation risks 2-3 weeks early through pattern analysis"
        }
        AnalysisType::ChangeGuidance => {
            "Get contextually relevant best practices from proven frameworks"
        }
        AnalysisType::TeamAnalysis => "Analyze team sentiment and identify resistance patterns",
        AnalysisType::Recommendations => "Get targeted interventions and action plans",
    }
}

pub fn input_hint(kind: AnalysisType) -> &'static str {
    match kind {
        AnalysisType::RiskDetection => {
            "Describe the current project status, recent communications, or concerns"
        }
        AnalysisType::ChangeGuidance => "Describe the change management challenge",
        AnalysisType::TeamAnalysis => {
            "Paste team communications (emails, chat logs, meeting notes)"
        }
        AnalysisType::Recommendations => "Describe the current transformation situation",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::state::Urgency;

    #[test]
    fn every_type_has_a_distinct_instruction() {
        let mut seen: Vec<&str> = AnalysisType::ALL.into_iter().map(instruction_for).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn unknown_tag_falls_back_to_risk_detection() {
        assert_eq!(instruction_for_tag("sentiment"), RISK_DETECTION_PROMPT);
        assert_eq!(instruction_for_tag(""), RISK_DETECTION_PROMPT);
        assert_eq!(instruction_for_tag("team_analysis"), TEAM_ANALYSIS_PROMPT);
    }

    #[test]
    fn auto_select_framework_leaves_input_untouched() {
        let text = compose_user_text(
            AnalysisType::ChangeGuidance,
            "Low adoption",
            AnalysisModifiers::default(),
        );
        assert_eq!(text, "Low adoption");
    }

    #[test]
    fn chosen_framework_is_appended() {
        let modifiers = AnalysisModifiers {
            framework: Framework::Kotter,
            ..AnalysisModifiers::default()
        };
        let text = compose_user_text(AnalysisType::ChangeGuidance, "Low adoption", modifiers);
        assert_eq!(text, "Low adoption\n\nPreferred framework: Kotter's 8-Step");
    }

    #[test]
    fn urgency_is_always_appended_for_recommendations() {
        let text = compose_user_text(
            AnalysisType::Recommendations,
            "Go-live slipping",
            AnalysisModifiers::default(),
        );
        assert_eq!(text, "Go-live slipping\n\nUrgency level: Low");

        let modifiers = AnalysisModifiers {
            urgency: Urgency::Critical,
            ..AnalysisModifiers::default()
        };
        let text = compose_user_text(AnalysisType::Recommendations, "x", modifiers);
        assert_eq!(text, "x\n\nUrgency level: Critical");
    }

    #[test]
    fn modifiers_do_not_leak_into_other_tabs() {
        let modifiers = AnalysisModifiers {
            framework: Framework::Adkar,
            urgency: Urgency::High,
        };
        assert_eq!(
            compose_user_text(AnalysisType::RiskDetection, "notes", modifiers),
            "notes"
        );
    }
}
