//! Role catalogue for the campaign workflows

/// An LLM role: its unit name, a short description and its default instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    pub name: &'static str,
    pub description: &'static str,
    pub instruction: &'static str,
}

pub const CEO: Role = Role {
    name: "ceo_agent",
    description: "Reviews the brief, sets strategy and gives final sign-off",
    instruction: "You are the CEO of {{ brand }} ({{ region }}). Objective: {{ objective }}.\n\
Brief: {{ inputs.brief }}\n\
Current pipeline state: {{ state }}\n\
If no campaign exists yet, set goals, constraints and success metrics. \
If a recommendation exists, give final sign-off.\n\
Return JSON with keys: goals, constraints, success_metrics, sign_off (true|false).",
};

pub const COPYWRITER: Role = Role {
    name: "copywriter_agent",
    description: "Writes the campaign brief with A and B variants",
    instruction: "You are a pharmaceutical copywriter for {{ brand }}.\n\
Brief: {{ inputs.brief }}\n\
Strategy: {{ state.ceo_agent }}\n\
Legal feedback on your previous draft (may be empty): {{ state.legal_agent }}\n\
Reviewer recommendation (may be empty): {{ state.aggregator_agent }}\n\
Create two variants A and B, each with headline, body, cta and rationale.\n\
Return JSON: {\"campaign_brief\": {\"A\": {...}, \"B\": {...}}}",
};

pub const LEGAL: Role = Role {
    name: "legal_agent",
    description: "Checks claims for compliance and sets the all_clear flag",
    instruction: "You are regulatory counsel reviewing drug marketing copy for {{ region }}.\n\
Copy under review: {{ state.copywriter_agent }}\n\
Identify non-compliant claims (missing fair balance, off-label or unsupported efficacy claims) \
and propose edits.\n\
Return JSON: {\"edits\": [...], \"all_clear\": true|false}",
};

pub const MARKET_RESEARCH: Role = Role {
    name: "market_research_agent",
    description: "Designs the reviewer survey for comparing A and B",
    instruction: "Design a lightweight research plan to validate variant A against variant B \
with key opinion leaders.\n\
Campaign: {{ state.copywriter_agent }}\n\
Return JSON: {\"survey\": {...}, \"metrics\": [\"notes\", \"score\", \"go_no_go\"]}",
};

pub const REVIEWER: Role = Role {
    name: "kol",
    description: "Key opinion leader giving structured feedback on one variant",
    instruction: "You are {{ unit }}, a key opinion leader.\n\
Variant assignment by reviewer: {{ state.ab_assignment }}\n\
Campaign: {{ state.copywriter_agent }}\n\
Survey: {{ state.market_research_agent }}\n\
Review only the variant assigned to you.\n\
Return JSON: {\"variant\": \"A\"|\"B\", \"notes\": str, \"score\": 1-10, \"go_no_go\": \"go\"|\"no-go\"}",
};

pub const AGGREGATOR: Role = Role {
    name: "aggregator_agent",
    description: "Aggregates reviewer feedback and recommends A or B",
    instruction: "Aggregate the reviewer feedback found under the kol_* entries of this state: \
{{ state }}\n\
Compute the average score per variant and recommend one.\n\
Return JSON: {\"summary\": str, \"avg_scores\": {\"A\": num, \"B\": num}, \"recommendation\": \"A\"|\"B\"}",
};

pub const LEAD_FINDER: Role = Role {
    name: "lead_finder_agent",
    description: "Reviews a company's product pages for FDA-compliance issues",
    instruction: "Review the drug product marketing pages of {{ inputs.company_url }} \
for FDA-compliance issues: missing fair balance, overstated efficacy, off-label promotion.\n\
Return JSON: {\"company_url\": str, \"pages\": [{\"url\": str, \"issues\": [...], \
\"compliance_status\": \"compliant\"|\"needs_review\"}]}",
};

pub const EMAIL_DRAFTER: Role = Role {
    name: "email_drafter_agent",
    description: "Drafts outreach based on the compliance findings",
    instruction: "Draft a short, professional outreach email to the marketing team at \
{{ inputs.company_url }} offering help with the issues found: {{ state.lead_finder_agent }}\n\
Return JSON: {\"subject\": str, \"body\": str}",
};

/// Unit name of the A/B assignment step
pub const AB_ASSIGNMENT: &str = "ab_assignment";

/// Name of the `id`-th reviewer, counting from 1
pub fn reviewer(id: usize) -> String {
    format!("kol_{}", id)
}

/// Names of the first `count` reviewers
pub fn reviewers(count: usize) -> Vec<String> {
    (1..=count).map(reviewer).collect()
}

pub fn all_roles() -> [Role; 8] {
    [
        CEO,
        COPYWRITER,
        LEGAL,
        MARKET_RESEARCH,
        REVIEWER,
        AGGREGATOR,
        LEAD_FINDER,
        EMAIL_DRAFTER,
    ]
}

/// Role names accepted as instruction override keys
pub fn known_role_names() -> Vec<&'static str> {
    all_roles().iter().map(|role| role.name).collect()
}
