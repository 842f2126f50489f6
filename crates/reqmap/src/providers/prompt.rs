//! Prompt templates for cluster naming

use crate::error::{Error, Result};

/// Prompt builder for cluster naming requests
pub struct NamingPrompt;

impl NamingPrompt {
    /// System instruction shared by chat-style providers
    pub fn system() -> &'static str {
        "You are an expert at analyzing software requirements and grouping them into meaningful categories. \
         Given a list of related requirements, provide a concise, descriptive name (2-4 words) that captures the common theme. \
         Examples: 'User Authentication', 'Payment Processing', 'Data Management', 'Security Features'."
    }

    /// User message listing the cluster's requirements, numbered from 1
    pub fn user(texts: &[String]) -> String {
        let listing = texts
            .iter()
            .enumerate()
            .map(|(i, text)| format!("{}. {}", i + 1, text.trim()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Analyze these requirements and suggest a concise name for this cluster:\n\n{}\n\nProvide only the cluster name, nothing else.",
            listing
        )
    }

    /// Single prompt for completion-style providers
    pub fn completion(texts: &[String]) -> String {
        format!("{}\n\n{}\n\nCluster name:", Self::system(), Self::user(texts))
    }
}

/// Reduce a raw model reply to a bare cluster name.
///
/// Takes the first non-empty line, drops quote characters and a trailing
/// period. An empty result is an error so the caller can use its fallback.
pub fn clean_cluster_name(raw: &str) -> Result<String> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    let cleaned: String = line
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`' | '“' | '”' | '‘' | '’'))
        .collect();
    let cleaned = cleaned
        .trim()
        .trim_start_matches("Cluster name:")
        .trim()
        .trim_end_matches('.')
        .trim()
        .to_string();

    if cleaned.is_empty() {
        return Err(Error::naming("model returned an empty name"));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_numbers_requirements() {
        let texts = vec!["Users can log in".to_string(), " Users can reset passwords ".to_string()];
        let prompt = NamingPrompt::user(&texts);

        assert!(prompt.contains("1. Users can log in\n2. Users can reset passwords"));
        assert!(prompt.ends_with("Provide only the cluster name, nothing else."));
    }

    #[test]
    fn test_clean_strips_quotes_and_whitespace() {
        assert_eq!(clean_cluster_name("  \"User Authentication\"\n").unwrap(), "User Authentication");
        assert_eq!(clean_cluster_name("'Payment Processing'.").unwrap(), "Payment Processing");
    }

    #[test]
    fn test_clean_takes_first_line() {
        let raw = "\nCluster name: Data Export\nThese requirements all concern exports.";
        assert_eq!(clean_cluster_name(raw).unwrap(), "Data Export");
    }

    #[test]
    fn test_clean_rejects_empty() {
        assert!(clean_cluster_name("  \"\"  ").is_err());
        assert!(clean_cluster_name("").is_err());
    }
}
