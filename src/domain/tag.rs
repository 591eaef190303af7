use crate::domain::version;
use semver::Version;

/// Tag naming template (e.g. "v{version}", "release/{version}").
///
/// The same template formats new tags and recognises versions inside
/// existing ones. A template without the `{version}` placeholder never
/// yields versions but still formats to itself, which lets a literal
/// tag name ride through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTemplate {
    template: String,
}

impl TagTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        TagTemplate {
            template: template.into(),
        }
    }

    /// Substitute a version into the template.
    /// Example: template="release/{version}", version="1.2.3" -> "release/1.2.3".
    pub fn format(&self, version: &str) -> String {
        self.template.replace("{version}", version)
    }

    /// The template as a git tag glob, matching any version.
    pub fn glob(&self) -> String {
        self.template.replace("{version}", "*")
    }

    /// The version strings embedded in tags shaped like this template.
    /// Tags whose captured text is not a parseable version are skipped,
    /// as are tags shaped differently.
    pub fn extract(&self, tags: &[String]) -> Vec<String> {
        let escaped = regex::escape(&self.template);
        let pattern = format!("^{}$", escaped.replace(r"\{version\}", "(.*)"));
        // escape() guarantees the pattern compiles
        let re = match regex::Regex::new(&pattern) {
            Ok(re) => re,
            Err(_) => return Vec::new(),
        };
        tags.iter()
            .filter_map(|tag| re.captures(tag))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|text| version::try_parse(text).is_some())
            .collect()
    }

    /// Like [`extract`](Self::extract), parsed.
    pub fn versions(&self, tags: &[String]) -> Vec<Version> {
        self.extract(tags)
            .iter()
            .filter_map(|text| version::try_parse(text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_pool() -> Vec<String> {
        [
            "0.0.0",
            "0.1.0",
            "v0.2.0",
            "0.3.0v",
            "my_project/0.4.0",
            "my_project/0.5.0/releases",
            "my_project/0.6.0-RC.2+build-99/releases",
            "someones_code",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_format() {
        let template = TagTemplate::new("release/{version}");
        assert_eq!(template.format("1.2.3"), "release/1.2.3");
        assert_eq!(template.glob(), "release/*");
    }

    #[test]
    fn test_extract_without_placeholder_finds_nothing() {
        let template = TagTemplate::new("");
        assert!(template.extract(&tag_pool()).is_empty());
        let template = TagTemplate::new("someones_code");
        assert!(template.extract(&tag_pool()).is_empty());
    }

    #[test]
    fn test_extract_with_prefix() {
        let template = TagTemplate::new("v{version}");
        assert_eq!(template.extract(&tag_pool()), vec!["0.2.0"]);
    }

    #[test]
    fn test_extract_bare_placeholder() {
        let template = TagTemplate::new("{version}");
        assert_eq!(template.extract(&tag_pool()), vec!["0.0.0", "0.1.0"]);
    }

    #[test]
    fn test_extract_with_path_prefix() {
        let template = TagTemplate::new("my_project/{version}");
        assert_eq!(template.extract(&tag_pool()), vec!["0.4.0"]);
    }

    #[test]
    fn test_extract_with_prefix_and_suffix() {
        let template = TagTemplate::new("my_project/{version}/releases");
        assert_eq!(
            template.extract(&tag_pool()),
            vec!["0.5.0", "0.6.0-RC.2+build-99"]
        );
    }

    #[test]
    fn test_versions_parses_extracted_text() {
        let template = TagTemplate::new("my_project/{version}/releases");
        let versions = template.versions(&tag_pool());
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].to_string(), "0.5.0");
        assert!(!versions[1].build.is_empty());
    }
}
