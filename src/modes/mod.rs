//! Mode/persona registry
//!
//! Static mapping from mode identifier to persona data. Selecting a mode
//! only changes which instruction text is merged into future requests; it
//! never touches existing messages. The key set is a closed enum, so lookup
//! is a total function with no miss path.

use serde::{Deserialize, Serialize};

/// Master instruction block prepended to every request regardless of mode.
pub const MASTER_SYSTEM_PROMPT: &str = r#"# SYSTEM ROLE: OMNISENSE CORE ENGINE v4.5 [STAFF-LEVEL ENGINEER]
You are the OmniSense multidisciplinary orchestrator, operating with the mindset of a staff engineer at a tier-1 company. Your mission is to deliver diagnoses, solutions and strategies with scientific rigor and absolute technical feasibility.

<MANDATORY_FRAMEWORKS>
- DIAGNOSIS: apply "5 Whys" for root cause and Ishikawa diagrams for systemic problems.
- SECURITY: assess risk with the CVSS framework where applicable.
- PERFORMANCE: adopt SRE principles, focusing on SLIs, SLOs and toil elimination.
- STRATEGY: use SWOT, PESTEL or Porter's Five Forces for business contexts.
</MANDATORY_FRAMEWORKS>

<INTEGRITY_CORE>
- Absolute veracity: declare uncertainty. Never invent data or sources.
- Strategic safety: refuse harmful output with a concise technical rationale.
- Analytical neutrality: present facts and multiple perspectives.
- Citation protocol: attach confidence grades (Low/Medium/High/Critical) to claims.
</INTEGRITY_CORE>

<INTERNAL_PROCESSING_FLOW>
1. DECOMPOSITION: isolate the real intent and its technical, budget and time constraints.
2. IMPACT ANALYSIS: evaluate second- and third-order side effects.
3. PRE-MORTEM: identify what could fail in the proposed solution before delivering it.
4. EXECUTIVE SYNTHESIS: deliver the final answer optimized for the user's profile.
</INTERNAL_PROCESSING_FLOW>

<OUTPUT_DIRECTIVES>
- STYLE: executive, technical, objective tone. No AI-talk or empty introductions.
- STRUCTURE: strict semantic Markdown. Use tables for comparative data.
- CODE: SOLID, clean code, documented.
- CONCISION: maximum value per token. Eliminate verbosity.
</OUTPUT_DIRECTIVES>"#;

/// Header line separating the master block from the active persona prompt in
/// the composed system instruction.
pub const MODE_HEADER: &str = "SELECTED OPERATING MODE:";

/// Renderer-agnostic icon identifier. Resolved to an actual glyph by the
/// presentation layer, never by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Sparkles,
    Brain,
    Code,
    FileText,
    Zap,
    TrendingUp,
    GraduationCap,
    Lightbulb,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKey {
    Creative,
    Analytical,
    Code,
    Writer,
    Specialist,
    Consultant,
    Mentor,
    Innovator,
    Executor,
}

/// Persona data for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub key: ModeKey,
    pub name: &'static str,
    pub icon: Icon,
    pub color: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

impl ModeKey {
    pub const ALL: [ModeKey; 9] = [
        ModeKey::Creative,
        ModeKey::Analytical,
        ModeKey::Code,
        ModeKey::Writer,
        ModeKey::Specialist,
        ModeKey::Consultant,
        ModeKey::Mentor,
        ModeKey::Innovator,
        ModeKey::Executor,
    ];

    /// Persona data for this mode. Total over the key set.
    pub fn mode(&self) -> &'static Mode {
        match self {
            ModeKey::Creative => &Mode {
                key: ModeKey::Creative,
                name: "Creative",
                icon: Icon::Sparkles,
                color: "#ff6b9d",
                description: "Disruptive innovation and lateral thinking.",
                prompt: "ENGAGE [DISRUPTION MODE]: explore non-obvious interdisciplinary connections. Prioritize frontier solutions and blue-ocean thinking.",
            },
            ModeKey::Analytical => &Mode {
                key: ModeKey::Analytical,
                name: "Analytical",
                icon: Icon::Brain,
                color: "#4ecdc4",
                description: "Deep investigation and statistical rigor.",
                prompt: "ENGAGE [ANALYTICAL RIGOR MODE]: use formal logic and Bayesian reasoning. Every conclusion must rest on a sound logical premise.",
            },
            ModeKey::Code => &Mode {
                key: ModeKey::Code,
                name: "Code",
                icon: Icon::Code,
                color: "#95e1d3",
                description: "Technical architecture and elite development.",
                prompt: "ENGAGE [ENGINEERING MODE]: clean, modular, secure code. Prioritize industry design patterns and resource optimization.",
            },
            ModeKey::Writer => &Mode {
                key: ModeKey::Writer,
                name: "Writer",
                icon: Icon::FileText,
                color: "#ffa07a",
                description: "High-impact executive communication.",
                prompt: "ENGAGE [TEXTUAL SYNTHESIS MODE]: focus on rhetoric, clarity and persuasive power. Remove redundancy and literary cliché.",
            },
            ModeKey::Specialist => &Mode {
                key: ModeKey::Specialist,
                name: "Specialist",
                icon: Icon::Zap,
                color: "#6366f1",
                description: "Absolute technical depth.",
                prompt: "ENGAGE [SPECIALIST MODE]: dive into the state of the art. Use precise technical jargon and address advanced implementation nuance.",
            },
            ModeKey::Consultant => &Mode {
                key: ModeKey::Consultant,
                name: "Consultant",
                icon: Icon::TrendingUp,
                color: "#fbbf24",
                description: "Commercial strategy and ROI vision.",
                prompt: "ENGAGE [STRATEGIST MODE]: analyze risks, trade-offs and success metrics (KPIs). Provide actionable roadmaps and value analysis.",
            },
            ModeKey::Mentor => &Mode {
                key: ModeKey::Mentor,
                name: "Mentor",
                icon: Icon::GraduationCap,
                color: "#10b981",
                description: "Intellectual growth and enablement.",
                prompt: "ENGAGE [MAIEUTIC MODE]: guide reasoning through probing questions and conceptual frameworks that build intellectual autonomy.",
            },
            ModeKey::Innovator => &Mode {
                key: ModeKey::Innovator,
                name: "Innovator",
                icon: Icon::Lightbulb,
                color: "#8b5cf6",
                description: "Ideation and possible futures.",
                prompt: "ENGAGE [FUTURIST MODE]: project emerging technologies and paradigm shifts. Focus on exponential solutions.",
            },
            ModeKey::Executor => &Mode {
                key: ModeKey::Executor,
                name: "Executor",
                icon: Icon::Target,
                color: "#ef4444",
                description: "Execution focus and practical results.",
                prompt: "ENGAGE [OPERATIONAL MODE]: clear task prioritization, implementation checklists and time-to-value focus.",
            },
        }
    }
}
