// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Row identifiers are prefixed Crockford Base32 strings, e.g. `R_K7NP3X`
//! for a resume. The alphabet leaves out I, L, O and U so ids survive being
//! read aloud or retyped from a screenshot.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPrefix {
    /// Account (U_)
    User,
    /// Uploaded resume (R_)
    Resume,
    /// Stored job description (J_)
    JobDescription,
    /// Posting found for a stored job (RJ_)
    RelatedJob,
    /// Outreach message (M_)
    Message,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Resume => "R",
            EntityPrefix::JobDescription => "J",
            EntityPrefix::RelatedJob => "RJ",
            EntityPrefix::Message => "M",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
///
/// # Example
/// ```ignore
/// let resume_id = generate_id(EntityPrefix::Resume);
/// // Returns something like "R_8MWQT2"
/// ```
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(6))
}

// ============================================================================
// Convenience functions for each entity type
// ============================================================================

pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

pub fn generate_resume_id() -> String {
    generate_id(EntityPrefix::Resume)
}

pub fn generate_job_description_id() -> String {
    generate_id(EntityPrefix::JobDescription)
}

pub fn generate_related_job_id() -> String {
    generate_id(EntityPrefix::RelatedJob)
}

pub fn generate_message_id() -> String {
    generate_id(EntityPrefix::Message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let resume_id = generate_resume_id();
        assert!(resume_id.starts_with("R_"));
        assert_eq!(resume_id.len(), 8); // "R_" + 6 chars

        let related = generate_related_job_id();
        assert!(related.starts_with("RJ_"));
        assert_eq!(related.len(), 9);
    }

    #[test]
    fn test_crockford_alphabet_only() {
        let id = generate_job_description_id();
        let random_part = &id[2..];

        for c in random_part.chars() {
            assert!(
                CROCKFORD_ALPHABET.contains(&(c as u8)),
                "Character '{}' not in Crockford alphabet",
                c
            );
        }

        assert!(!random_part.contains('I'));
        assert!(!random_part.contains('L'));
        assert!(!random_part.contains('O'));
        assert!(!random_part.contains('U'));
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            let id = generate_message_id();
            assert!(ids.insert(id), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_all_prefixes() {
        assert!(generate_user_id().starts_with("U_"));
        assert!(generate_resume_id().starts_with("R_"));
        assert!(generate_job_description_id().starts_with("J_"));
        assert!(generate_related_job_id().starts_with("RJ_"));
        assert!(generate_message_id().starts_with("M_"));
    }
}
