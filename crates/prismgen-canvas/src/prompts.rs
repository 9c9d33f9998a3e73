//! Prompts for canvas question generation and report writing.

use crate::question::QuestionHistoryItem;
use crate::templates::CanvasTemplate;

/// System prompt for question generation.
#[must_use]
pub(crate) fn question_system_prompt(template: CanvasTemplate) -> String {
    format!(
        r#"You are an expert product strategist and technical architect helping users explore and refine their ideas through guided questioning.

Your role is to ask ONE thoughtful question at a time to help the user think through their idea comprehensively. Like a skilled consultant, you guide them toward clarity through discovery rather than lecturing.

CONTEXT FOR THIS SESSION:
{}

QUESTION STYLE GUIDELINES:
1. Ask ONE question at a time - never multiple questions in one response
2. ALWAYS provide 3-5 multiple choice options - users can still type custom answers
3. When there are clear trade-offs between approaches, present them as an "approach" type with pros/cons
4. Include your recommendation and explain why briefly
5. Questions should build on previous answers logically
6. Be conversational but efficient - don't waste the user's time

QUESTION TYPES:
- "single_choice": ALWAYS use this type with 3-5 options
- "approach": When presenting 2-3 different approaches with trade-offs (include pros/cons)

JSON OUTPUT FORMAT:
{{
  "question": "Your question text here?",
  "type": "single_choice" | "approach",
  "options": [
    {{"id": "opt_1", "label": "Option 1", "description": "Brief explanation", "recommended": true}}
  ],
  "approaches": [
    {{"id": "approach_1", "title": "Approach Name", "description": "What this means", "pros": ["Pro 1"], "cons": ["Con 1"], "recommended": true}}
  ],
  "context": "Optional context about why you're asking this"
}}

Return ONLY valid JSON, no markdown formatting."#,
        template.context()
    )
}

/// User prompt for the first question of a session.
#[must_use]
pub(crate) fn first_question_prompt(idea: &str, template: CanvasTemplate) -> String {
    format!(
        r#"The user wants to explore this idea:

"{idea}"

Template type: {template}

Generate the FIRST question to start exploring this idea. This should be a foundational question that helps establish the core direction. Consider what's the most important thing to understand first about their idea.

Return the question as JSON."#
    )
}

/// Render the running history as a Q&A transcript.
#[must_use]
pub(crate) fn history_transcript(history: &[QuestionHistoryItem]) -> String {
    let mut out = String::new();
    for (i, item) in history.iter().enumerate() {
        out.push_str(&format!(
            "\nQ{n}: {q}\nA{n}: {a}\n",
            n = i + 1,
            q = item.question.prompt,
            a = item.answer
        ));
    }
    out
}

/// User prompt for each subsequent question, carrying the full history and
/// the completion criteria.
#[must_use]
pub(crate) fn next_question_prompt(
    idea: &str,
    history: &[QuestionHistoryItem],
    question_count: u32,
) -> String {
    format!(
        r#"Original idea: "{idea}"

Conversation so far:
{transcript}

Questions asked: {question_count}

IMPORTANT - COMPLETION CRITERIA:
Evaluate whether you have gathered enough information to create a useful implementation spec. You should STOP asking questions and set "suggest_complete": true when:
1. You understand the core concept, goals, and target users
2. Key technical/implementation decisions have been made
3. You have a clear picture of scope and priorities
4. Asking more questions would provide diminishing returns

For simple ideas, 5-8 questions may be enough.
For complex projects, 10-15 questions may be needed.
Do NOT ask unnecessary questions just to reach a number.

If you determine we have enough information, return:
{{
  "suggest_complete": true,
  "summary": "Brief summary of what we've learned and are ready to spec out"
}}

Otherwise, generate the NEXT logical question that addresses the most important remaining gap.

Return your response as JSON."#,
        transcript = history_transcript(history)
    )
}

/// System prompt for report generation.
#[must_use]
pub(crate) fn report_system_prompt(template: CanvasTemplate) -> String {
    let (doc_type, writer_role, sections) = template.report_shape();
    format!(
        r#"You are an {writer_role}. Your task is to generate a comprehensive {doc_type} document based on the user's idea exploration session.

The document should be in Markdown format. Structure it with the following sections (adapt as needed based on the idea):

{sections}

Make the document actionable, specific, and tailored to the decisions made during the exploration session. Use proper Markdown formatting with headers, bullet points, and emphasis where appropriate."#
    )
}

/// User prompt for report generation.
#[must_use]
pub(crate) fn report_user_prompt(
    idea: &str,
    template: CanvasTemplate,
    history: &[QuestionHistoryItem],
) -> String {
    let (doc_type, _, _) = template.report_shape();
    format!(
        r#"Based on the following idea exploration session, generate a comprehensive {doc_type} document.

ORIGINAL IDEA:
{idea}

TEMPLATE: {template}

EXPLORATION Q&A:
{transcript}

Please generate a detailed, actionable {doc_type} document in Markdown format. Make sure to reference the specific decisions and answers provided during the exploration."#,
        transcript = history_transcript(history)
    )
}

/// Markdown decision-log section appended to reports.
#[must_use]
pub(crate) fn decision_log(history: &[QuestionHistoryItem]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut out = String::from("## Decision Log\n");
    for item in history {
        out.push_str(&format!(
            "\n- **{}**\n  - {}\n",
            item.question.prompt, item.answer
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{CanvasQuestion, QuestionKind};

    fn history() -> Vec<QuestionHistoryItem> {
        vec![QuestionHistoryItem {
            question: CanvasQuestion {
                id: "q_1".into(),
                prompt: "Who is it for?".into(),
                kind: QuestionKind::SingleChoice { options: vec![] },
                context: None,
            },
            answer: "Freelancers".into(),
        }]
    }

    #[test]
    fn test_system_prompt_embeds_template_context() {
        let prompt = question_system_prompt(CanvasTemplate::Startup);
        assert!(prompt.contains("plan a startup"));
        assert!(prompt.contains("ONLY valid JSON"));
    }

    #[test]
    fn test_next_question_prompt_carries_transcript() {
        let prompt = next_question_prompt("task app", &history(), 1);
        assert!(prompt.contains("Q1: Who is it for?"));
        assert!(prompt.contains("A1: Freelancers"));
        assert!(prompt.contains("suggest_complete"));
    }

    #[test]
    fn test_decision_log_lists_pairs() {
        let log = decision_log(&history());
        assert!(log.starts_with("## Decision Log"));
        assert!(log.contains("Freelancers"));
        assert!(decision_log(&[]).is_empty());
    }
}
