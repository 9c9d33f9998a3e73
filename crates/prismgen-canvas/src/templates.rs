//! Canvas templates and their exploration contexts.

use serde::{Deserialize, Serialize};

/// Exploration template chosen at session start. Shapes the question
/// system prompt and the report structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasTemplate {
    Startup,
    WebApp,
    AiAgent,
    ProjectSpec,
    TechStack,
    ImplementFeature,
    SolveProblem,
    Performance,
    Scaling,
    SecurityReview,
    CodeArchitecture,
    Custom,
}

impl CanvasTemplate {
    /// Canonical snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::WebApp => "web_app",
            Self::AiAgent => "ai_agent",
            Self::ProjectSpec => "project_spec",
            Self::TechStack => "tech_stack",
            Self::ImplementFeature => "implement_feature",
            Self::SolveProblem => "solve_problem",
            Self::Performance => "performance",
            Self::Scaling => "scaling",
            Self::SecurityReview => "security_review",
            Self::CodeArchitecture => "code_architecture",
            Self::Custom => "custom",
        }
    }

    /// Focus areas injected into the question system prompt.
    #[must_use]
    pub const fn context(&self) -> &'static str {
        match self {
            Self::Startup => {
                "The user wants to plan a startup. Focus on:\n\
                 - One compelling story or statistic that illustrates the problem, and why it matters now\n\
                 - Who exactly has this pain and how they solve it today\n\
                 - The core solution, key differentiators, and MVP scope\n\
                 - Target market size, acquisition strategy, go-to-market approach\n\
                 - Revenue or impact model, team and resources, key risks and mitigation"
            }
            Self::WebApp => {
                "The user wants to build a web application. Focus on:\n\
                 - Core functionality and features\n\
                 - Target users and use cases\n\
                 - Tech stack decisions (frontend, backend, database)\n\
                 - Architecture approach (monolith, microservices, serverless)\n\
                 - Authentication and authorization\n\
                 - Deployment, infrastructure, and scalability"
            }
            Self::AiAgent => {
                "The user wants to build an AI/agentic system. Focus on:\n\
                 - Agent purpose and capabilities\n\
                 - Tool integrations needed\n\
                 - Memory and state management\n\
                 - Orchestration approach (single agent, multi-agent)\n\
                 - LLM provider and model selection\n\
                 - Guardrails, safety measures, and evaluation strategy"
            }
            Self::ProjectSpec => {
                "The user wants to plan a project. Focus on:\n\
                 - Project goals and success criteria\n\
                 - Scope and deliverables\n\
                 - Key milestones and timeline\n\
                 - Dependencies and blockers\n\
                 - Resource requirements, risk assessment, and documentation"
            }
            Self::TechStack => {
                "The user wants to make technology decisions. Focus on:\n\
                 - Requirements and constraints\n\
                 - Options with trade-offs\n\
                 - Team expertise and learning curve\n\
                 - Performance and scalability needs\n\
                 - Ecosystem support, cost, and migration challenges"
            }
            Self::ImplementFeature => {
                "The user wants to implement a feature. Focus on:\n\
                 - Feature requirements and acceptance criteria\n\
                 - User stories and edge cases\n\
                 - Dependencies and integration points\n\
                 - Implementation approach, testing strategy, and rollout plan"
            }
            Self::SolveProblem => {
                "The user wants to explore approaches to a technical problem. Focus on:\n\
                 - Problem definition and constraints\n\
                 - Available resources and limitations\n\
                 - Present 2-4 DIFFERENT APPROACHES with clear trade-offs\n\
                 - For each approach: pros, cons, complexity, when to use\n\
                 - Your recommendation with reasoning\n\
                 IMPORTANT: Always present multiple approaches so the user can make an informed decision."
            }
            Self::Performance => {
                "The user wants to optimize performance. Focus on:\n\
                 - Current bottlenecks and symptoms\n\
                 - Metrics, benchmarks, and profiling approach\n\
                 - Quick wins vs long-term optimizations\n\
                 - Implementation priority and validation plan"
            }
            Self::Scaling => {
                "The user wants to scale a system. Focus on:\n\
                 - Current load and capacity limits, target scale\n\
                 - Horizontal vs vertical scaling trade-offs\n\
                 - Database, caching, and CDN strategies\n\
                 - Cost implications, migration plan, rollback strategy"
            }
            Self::SecurityReview => {
                "The user wants to review and improve security. Focus on:\n\
                 - Threat model and attack surface\n\
                 - Authentication, authorization, and encryption\n\
                 - Input validation and dependency vulnerabilities\n\
                 - Compliance requirements and security testing approach"
            }
            Self::CodeArchitecture => {
                "The user wants to design or refactor code architecture. Focus on:\n\
                 - Current pain points and technical debt\n\
                 - Design patterns and module structure\n\
                 - Dependency management and testing architecture\n\
                 - Migration strategy if refactoring"
            }
            Self::Custom => {
                "The user has a custom idea. Adapt your questions to explore:\n\
                 - Core concept and goals\n\
                 - Target audience/users\n\
                 - Key requirements and constraints\n\
                 - Implementation approach, challenges, and success criteria"
            }
        }
    }

    /// Report document type and section guidance for this template.
    #[must_use]
    pub const fn report_shape(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Startup | Self::WebApp | Self::AiAgent | Self::TechStack => (
                "Implementation Plan",
                "expert technical writer and product strategist",
                "1. **Executive Summary** - A brief overview of the project\n\
                 2. **Project Overview** - Goals, target users, and key value propositions\n\
                 3. **Technical Architecture** - Recommended stack, components, and patterns\n\
                 4. **Feature Breakdown** - Features organized by priority (MVP, Phase 2, Future)\n\
                 5. **Implementation Roadmap** - Phased approach with milestones\n\
                 6. **Risk Analysis** - Challenges and mitigation strategies\n\
                 7. **Success Metrics** - KPIs and how to measure success\n\
                 8. **Next Steps** - Immediate action items",
            ),
            Self::ProjectSpec => (
                "Project Specification",
                "expert project manager and technical writer",
                "1. **Executive Summary** - Brief overview of the project scope\n\
                 2. **Project Goals & Objectives** - What success looks like\n\
                 3. **Scope & Deliverables** - What's included and excluded\n\
                 4. **Requirements** - Functional and non-functional requirements\n\
                 5. **Timeline & Milestones** - Key dates and checkpoints\n\
                 6. **Resources & Budget** - Required resources and cost estimates\n\
                 7. **Risks & Dependencies** - Potential blockers and mitigation\n\
                 8. **Acceptance Criteria** - How deliverables will be validated",
            ),
            Self::ImplementFeature | Self::SolveProblem | Self::Performance | Self::Scaling
            | Self::SecurityReview | Self::CodeArchitecture => (
                "Feature Specification",
                "expert product manager and technical writer",
                "1. **Overview** - What this work does and why it matters\n\
                 2. **User Stories** - Who benefits and how\n\
                 3. **Functional Requirements** - Detailed behavior specifications\n\
                 4. **Technical Approach** - How to implement it\n\
                 5. **Edge Cases & Error Handling** - What could go wrong\n\
                 6. **Testing Strategy** - How to validate it works\n\
                 7. **Rollout Plan** - How to release safely",
            ),
            Self::Custom => (
                "Comprehensive Plan",
                "expert writer who adapts to any domain",
                "Analyze the idea and Q&A to determine the appropriate structure.\n\
                 Choose sections that make sense for this specific idea: creative\n\
                 projects want vision/audience/production sections, business ideas\n\
                 want market/model/go-to-market sections, research wants\n\
                 background/methodology/outcomes sections.",
            ),
        }
    }
}

impl std::fmt::Display for CanvasTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CanvasTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "startup" => Ok(Self::Startup),
            "web_app" => Ok(Self::WebApp),
            "ai_agent" => Ok(Self::AiAgent),
            "project_spec" => Ok(Self::ProjectSpec),
            "tech_stack" => Ok(Self::TechStack),
            "implement_feature" => Ok(Self::ImplementFeature),
            "solve_problem" => Ok(Self::SolveProblem),
            "performance" => Ok(Self::Performance),
            "scaling" => Ok(Self::Scaling),
            "security_review" => Ok(Self::SecurityReview),
            "code_architecture" => Ok(Self::CodeArchitecture),
            "custom" => Ok(Self::Custom),
            other => Err(format!("Unknown canvas template '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for template in [
            CanvasTemplate::Startup,
            CanvasTemplate::WebApp,
            CanvasTemplate::SolveProblem,
            CanvasTemplate::Custom,
        ] {
            let parsed: CanvasTemplate = template.as_str().parse().unwrap();
            assert_eq!(parsed, template);
        }
    }

    #[test]
    fn test_every_template_has_context_and_shape() {
        for template in [
            CanvasTemplate::Startup,
            CanvasTemplate::WebApp,
            CanvasTemplate::AiAgent,
            CanvasTemplate::ProjectSpec,
            CanvasTemplate::TechStack,
            CanvasTemplate::ImplementFeature,
            CanvasTemplate::SolveProblem,
            CanvasTemplate::Performance,
            CanvasTemplate::Scaling,
            CanvasTemplate::SecurityReview,
            CanvasTemplate::CodeArchitecture,
            CanvasTemplate::Custom,
        ] {
            assert!(!template.context().is_empty());
            let (doc_type, writer_role, sections) = template.report_shape();
            assert!(!doc_type.is_empty());
            assert!(!writer_role.is_empty());
            assert!(!sections.is_empty());
        }
    }
}
