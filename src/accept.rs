use anyhow::Result;

/// Glob rules deciding which media file names may be copied.
///
/// Rules are evaluated in order and the last match wins; a leading `!`
/// turns a rule into an exclusion. An empty rule set accepts everything.
pub struct AcceptRules {
    patterns: Vec<AcceptPattern>,
}

struct AcceptPattern {
    pattern: glob::Pattern,
    negated: bool,
}

const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl AcceptRules {
    pub fn new<S: AsRef<str>>(rules: &[S]) -> Result<Self> {
        let mut patterns = Vec::new();

        for rule in rules {
            let rule = rule.as_ref().trim();
            if rule.is_empty() || rule.starts_with('#') {
                continue;
            }

            let (pattern_str, negated) = match rule.strip_prefix('!') {
                Some(stripped) => (stripped, true),
                None => (rule, false),
            };

            let pattern = glob::Pattern::new(pattern_str)
                .map_err(|e| anyhow::anyhow!("Invalid pattern '{}': {}", pattern_str, e))?;

            patterns.push(AcceptPattern { pattern, negated });
        }

        Ok(Self { patterns })
    }

    pub fn accept_all() -> Self {
        Self { patterns: vec![] }
    }

    pub fn is_accepted(&self, file_name: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let mut accepted = false;
        for pattern in &self.patterns {
            if pattern.pattern.matches_with(file_name, MATCH_OPTIONS) {
                accepted = !pattern.negated;
            }
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rules_accept_everything() {
        let rules = AcceptRules::new::<&str>(&[]).unwrap();
        assert!(rules.is_accepted("anything.bin"));
        assert!(AcceptRules::accept_all().is_accepted("clip.mp4"));
    }

    #[test]
    fn only_listed_types_are_accepted() {
        let rules = AcceptRules::new(&["*.png", "*.jpg", "*.jpeg"]).unwrap();
        assert!(rules.is_accepted("photo.jpg"));
        assert!(rules.is_accepted("PHOTO.JPEG"));
        assert!(!rules.is_accepted("notes.txt"));
    }

    #[test]
    fn later_rules_override_earlier() {
        let rules = AcceptRules::new(&["*", "!*.exe"]).unwrap();
        assert!(rules.is_accepted("clip.mp4"));
        assert!(!rules.is_accepted("setup.exe"));

        let rules = AcceptRules::new(&["!*.gif", "*.gif"]).unwrap();
        assert!(rules.is_accepted("anim.gif"));
    }

    #[test]
    fn comments_and_blank_rules_are_skipped() {
        let rules = AcceptRules::new(&["# images", "", "*.webp"]).unwrap();
        assert!(rules.is_accepted("a.webp"));
        assert!(!rules.is_accepted("a.png"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(AcceptRules::new(&["["]).is_err());
    }
}
