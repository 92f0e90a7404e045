//! Lead enrichment: names, personalization hook and source fingerprint.

use outreach_core::sha256_hex;
use outreach_database::Lead;

use crate::context::LeadProfile;

/// Phrase the copy can lean on, from whatever of specialty and city is known.
pub fn personalization_hook(specialty: &str, city: &str) -> String {
    match (specialty.is_empty(), city.is_empty()) {
        (false, false) => format!("{} care in {}", specialty, city),
        (false, true) => format!("{} practice", specialty),
        (true, false) => format!("healthcare professionals in {}", city),
        (true, true) => "your medical practice".to_string(),
    }
}

/// Fingerprint of the fields that identify where a lead came from.
pub fn source_hash(email: &str, address: &str, specialty: &str, city: &str) -> String {
    sha256_hex(&format!("{}|{}|{}|{}", email, address, specialty, city))
}

/// Normalize a lead and derive its hook and hash.
///
/// Pure and idempotent: the same lead always yields the same profile.
pub fn enrich(lead: &Lead) -> LeadProfile {
    let text = |value: &Option<String>| value.as_deref().unwrap_or("").trim().to_string();

    let mut full_name = text(&lead.full_name);
    let mut first_name = text(&lead.first_name);
    let mut last_name = text(&lead.last_name);

    if full_name.is_empty() && (!first_name.is_empty() || !last_name.is_empty()) {
        full_name = format!("{} {}", first_name, last_name).trim().to_string();
    }

    if !full_name.is_empty() && first_name.is_empty() {
        let mut parts = full_name.split_whitespace();
        first_name = parts.next().unwrap_or_default().to_string();
        let rest: Vec<&str> = parts.collect();
        if !rest.is_empty() {
            last_name = rest.join(" ");
        }
    }

    let specialty = text(&lead.specialty);
    let city = text(&lead.city);
    let address = lead.address.clone().unwrap_or_default();

    LeadProfile {
        id: lead.id,
        personalization_hook: personalization_hook(&specialty, &city),
        source_hash: source_hash(&lead.email, &address, &specialty, &city),
        full_name,
        first_name,
        last_name,
        email: lead.email.clone(),
        phone: text(&lead.phone),
        specialty,
        city,
        address,
    }
}
