/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;
use std::collections::BTreeMap;
use tenant_verify::errors::VerificationError;
use tenant_verify::models::*;
use tenant_verify::scoring::{calculate_overall_score, calculate_risk_level};
use tenant_verify::validation::{
    is_valid_email, normalize_identity_number, normalize_phone, normalize_tax_id,
};

const SCORED: [ProviderKind; 4] = [
    ProviderKind::Identity,
    ProviderKind::Tax,
    ProviderKind::Telecom,
    ProviderKind::Email,
];

/// 0 = not configured, 1 = configured but unverified, 2 = verified
fn build(states: &[u8]) -> BTreeMap<ProviderKind, ProviderResult> {
    SCORED
        .iter()
        .zip(states)
        .map(|(&kind, &state)| {
            let result = match state {
                0 => ProviderResult::failure(kind, &VerificationError::NotConfigured(kind)),
                1 => ProviderResult::failure(kind, &VerificationError::Transport("down".into())),
                _ => {
                    let details = match kind {
                        ProviderKind::Identity => ProviderDetails::Identity(Default::default()),
                        ProviderKind::Tax => ProviderDetails::Tax(Default::default()),
                        ProviderKind::Telecom => ProviderDetails::Telecom(Default::default()),
                        _ => ProviderDetails::Email(Default::default()),
                    };
                    ProviderResult::success(kind, true, details)
                }
            };
            (kind, result)
        })
        .collect()
}

// Property: normalisers never panic and only return canonical values
proptest! {
    #[test]
    fn identity_normalizer_output_is_twelve_digits(raw in "\\PC*") {
        if let Ok(clean) = normalize_identity_number(&raw) {
            prop_assert_eq!(clean.len(), 12);
            prop_assert!(clean.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn formatted_identity_numbers_normalize(digits in "[0-9]{12}", sep in "[ -]?") {
        let formatted = format!("{}{}{}{}{}", &digits[..4], sep, &digits[4..8], sep, &digits[8..]);
        prop_assert_eq!(normalize_identity_number(&formatted).unwrap(), digits);
    }

    #[test]
    fn tax_normalizer_output_is_uppercase_alnum(raw in "\\PC*") {
        if let Ok(clean) = normalize_tax_id(&raw) {
            prop_assert_eq!(clean.len(), 10);
            prop_assert!(clean.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn phone_normalizer_never_panics(raw in "\\PC*") {
        let _ = normalize_phone(&raw);
    }

    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }

    #[test]
    fn simple_emails_are_accepted(
        local in "[a-z0-9.]{1,12}",
        domain in "[a-z]{1,10}",
        tld in "[a-z]{2,4}"
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        prop_assert!(is_valid_email(&email));
    }
}

// Property: scoring stays in range and rewards verification
proptest! {
    #[test]
    fn score_is_bounded(states in proptest::collection::vec(0u8..3, 4)) {
        let score = calculate_overall_score(&build(&states));
        prop_assert!(score <= 100);
    }

    #[test]
    fn verifying_a_provider_never_lowers_score(
        states in proptest::collection::vec(0u8..3, 4),
        idx in 0usize..4
    ) {
        let mut before = states.clone();
        before[idx] = 1;
        let mut after = states;
        after[idx] = 2;

        prop_assert!(
            calculate_overall_score(&build(&after)) >= calculate_overall_score(&build(&before))
        );
    }

    #[test]
    fn risk_level_is_monotone_in_score(a in 0u8..=100, b in 0u8..=100) {
        let rank = |level: RiskLevel| match level {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
            RiskLevel::VeryHigh => 3,
            RiskLevel::Unknown => 4,
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rank(calculate_risk_level(hi)) <= rank(calculate_risk_level(lo)));
    }
}
