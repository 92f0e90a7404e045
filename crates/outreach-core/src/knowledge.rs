//! Static outreach knowledge base.
//!
//! Channel rules, follow-up cadences, purpose angles and specialty hooks
//! used to ground every pipeline stage. Lookups are pure and never fail:
//! unknown channels resolve to the email tables and unknown specialties to
//! a generic hook.

use serde::{Deserialize, Serialize};

/// A titled rule of thumb for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRule {
    pub title: String,
    pub details: String,
}

/// Knowledge relevant to one (channel, purpose, specialty) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeContext {
    pub channel: String,
    pub principles: Vec<String>,
    pub principles_named: Vec<KnowledgeRule>,
    pub followup_plan: Vec<String>,
    pub purpose_angles: Vec<String>,
    pub specialty_hook: String,
    pub objection_handling: Vec<String>,
    pub cta_examples: Vec<String>,
}

/// A scored search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeHit {
    pub topic: String,
    pub content: String,
}

const EMAIL_RULES: &[(&str, &str)] = &[
    ("Subject line", "Use 4-8 words, specific outcome, no hype or urgency bait."),
    (
        "Body structure",
        "1) personalized opener 2) value in one sentence 3) clear low-friction CTA.",
    ),
    ("Length", "Target 80-140 words for first touch."),
];

const WHATSAPP_RULES: &[(&str, &str)] = &[
    ("Opening", "Ask permission quickly and reference context in the first sentence."),
    ("Length", "Keep first message under 60 words; one ask only."),
    ("Tone", "Conversational and respectful; avoid formal bulk-message style."),
];

const TELEGRAM_RULES: &[(&str, &str)] = &[
    ("Clarity", "Lead with why this message matters to them now."),
    ("Formatting", "Use short paragraphs and one bullet max for readability."),
    ("CTA", "Offer a simple yes/no next step."),
];

const CHANNEL_RULES: &[(&str, &[(&str, &str)])] = &[
    ("email", EMAIL_RULES),
    ("whatsapp", WHATSAPP_RULES),
    ("telegram", TELEGRAM_RULES),
];

const FOLLOWUP_CADENCE: &[(&str, &[&str])] = &[
    (
        "email",
        &[
            "Day 0: personalized first touch",
            "Day 3: follow-up with one concrete benefit",
            "Day 7: add lightweight proof point or case snippet",
            "Day 12: short close-out with opt-out",
        ],
    ),
    (
        "whatsapp",
        &[
            "Day 0: permission-based intro",
            "Day 2: quick reminder with one-line value",
            "Day 5: ask a binary question to reduce friction",
        ],
    ),
    (
        "telegram",
        &[
            "Day 0: contextual opener",
            "Day 3: concise follow-up with one resource",
            "Day 7: close-out note with easy reply prompt",
        ],
    ),
];

const PURPOSE_ANGLES: &[(&str, &[&str])] = &[
    (
        "lead generation",
        &[
            "Focus on appointment volume and no-show reduction.",
            "Position the offer as a small pilot, not a full commitment.",
        ],
    ),
    (
        "phone outreach",
        &[
            "Use short scripts that request permission before pitching.",
            "Offer two time-slot options to simplify replies.",
        ],
    ),
    (
        "partnership",
        &[
            "Emphasize mutual value and audience fit.",
            "Propose one concrete collaboration experiment.",
        ],
    ),
];

const GENERIC_PURPOSE_ANGLES: &[&str] = &[
    "Keep the message focused on one measurable outcome.",
    "Suggest a low-risk next step with minimal setup.",
];

/// Keyword-matched specialty hooks, first match wins.
const SPECIALTY_HOOKS: &[(&str, &str)] = &[
    (
        "dent",
        "You can reference preventive care reminders and retention for recurring visits.",
    ),
    (
        "cardio",
        "Highlight adherence follow-ups and continuity of care communication.",
    ),
    (
        "pedi",
        "Mention family-friendly communication and appointment reminder consistency.",
    ),
    (
        "diab",
        "Frame value around monitoring cadence and patient education touchpoints.",
    ),
    (
        "nutrition",
        "Use behavior-change nudges and periodic check-in messaging as examples.",
    ),
];

const DEFAULT_SPECIALTY_HOOK: &str =
    "Anchor personalization on patient experience, operational efficiency, and trust.";

const OBJECTION_HANDLING: &[&str] = &[
    "No time: propose a 10-15 minute intro with two scheduling options.",
    "Already using another tool: ask what is missing and offer a focused pilot.",
    "Not interested: thank them, leave one useful resource, and pause outreach respectfully.",
];

/// Stock call-to-action lines, most neutral first.
pub const CTA_EXAMPLES: &[&str] = &[
    "Would you be open to a short 15-minute intro next week?",
    "If useful, I can share a 3-step outline tailored to your practice.",
    "Would Tuesday 11:00 or Wednesday 14:00 work better for a quick call?",
];

fn normalize_channel(channel: &str) -> String {
    let normalized = channel.trim().to_lowercase();
    if normalized.is_empty() {
        "email".to_string()
    } else {
        normalized
    }
}

fn channel_rules(channel: &str) -> &'static [(&'static str, &'static str)] {
    CHANNEL_RULES
        .iter()
        .find(|(name, _)| *name == channel)
        .map(|(_, rules)| *rules)
        .unwrap_or(EMAIL_RULES)
}

fn followup_plan(channel: &str) -> &'static [&'static str] {
    FOLLOWUP_CADENCE
        .iter()
        .find(|(name, _)| *name == channel)
        .or_else(|| FOLLOWUP_CADENCE.first())
        .map(|(_, steps)| *steps)
        .unwrap_or(&[])
}

/// Match a specialty to its hook by case-insensitive keyword containment.
pub fn specialty_hook(specialty: &str) -> &'static str {
    let lower = specialty.to_lowercase();
    SPECIALTY_HOOKS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, hook)| *hook)
        .unwrap_or(DEFAULT_SPECIALTY_HOOK)
}

/// Match a campaign purpose to messaging angles. An empty purpose has none.
pub fn purpose_angles(purpose: &str) -> Vec<String> {
    let lower = purpose.trim().to_lowercase();
    if lower.is_empty() {
        return Vec::new();
    }

    let angles = PURPOSE_ANGLES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, angles)| *angles)
        .unwrap_or(GENERIC_PURPOSE_ANGLES);

    to_strings(angles)
}

/// Build the knowledge context for a channel, purpose and specialty.
pub fn build_context(channel: &str, purpose: &str, specialty: &str) -> KnowledgeContext {
    let channel = normalize_channel(channel);
    let rules = channel_rules(&channel);

    KnowledgeContext {
        principles: rules.iter().map(|(_, details)| details.to_string()).collect(),
        principles_named: rules
            .iter()
            .map(|(title, details)| KnowledgeRule {
                title: title.to_string(),
                details: details.to_string(),
            })
            .collect(),
        followup_plan: to_strings(followup_plan(&channel)),
        purpose_angles: purpose_angles(purpose),
        specialty_hook: specialty_hook(specialty).to_string(),
        objection_handling: to_strings(OBJECTION_HANDLING),
        cta_examples: to_strings(CTA_EXAMPLES),
        channel,
    }
}

/// Keyword search over every knowledge entry.
///
/// Each query term longer than two characters scores one point when it
/// appears in the entry; the whole query appearing verbatim adds two more.
/// Results are ordered by score (ties keep table order) and `limit` is
/// clamped to `1..=10`.
pub fn search(query: &str, limit: usize) -> Vec<KnowledgeHit> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }

    let terms: Vec<&str> = q.split_whitespace().filter(|t| t.chars().count() > 2).collect();

    let mut scored: Vec<(usize, KnowledgeHit)> = corpus()
        .into_iter()
        .filter_map(|hit| {
            let text = format!("{} {}", hit.topic, hit.content).to_lowercase();
            let mut score = terms.iter().filter(|term| text.contains(*term)).count();
            if text.contains(&q) {
                score += 2;
            }
            (score > 0).then_some((score, hit))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit.clamp(1, 10))
        .map(|(_, hit)| hit)
        .collect()
}

fn corpus() -> Vec<KnowledgeHit> {
    let mut entries = Vec::new();

    for (channel, rules) in CHANNEL_RULES {
        for (title, details) in *rules {
            entries.push(hit(format!("{}: {}", channel, title), details));
        }
    }
    for (channel, steps) in FOLLOWUP_CADENCE {
        for step in *steps {
            entries.push(hit(format!("{}: follow-up", channel), step));
        }
    }
    for (purpose, angles) in PURPOSE_ANGLES {
        for angle in *angles {
            entries.push(hit(format!("purpose: {}", purpose), angle));
        }
    }
    for (keyword, hook) in SPECIALTY_HOOKS {
        entries.push(hit(format!("specialty: {}", keyword), hook));
    }
    for item in OBJECTION_HANDLING {
        entries.push(hit("objection handling".to_string(), item));
    }

    entries
}

fn hit(topic: String, content: &str) -> KnowledgeHit {
    KnowledgeHit {
        topic,
        content: content.to_string(),
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
