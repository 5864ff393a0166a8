//! Domain Policy (spec §4.2) — is a URL in scope for the crawl?

use url::Url;

pub struct DomainPolicy {
    base_host: String,
    allow_list: Vec<String>,
}

impl DomainPolicy {
    /// `base_host` is computed from the first entry point. An empty
    /// `allow_list` means the same-host-or-subdomain rule applies
    /// unconditionally; a non-empty list overrides it entirely.
    pub fn new(base_host: impl Into<String>, allow_list: Vec<String>) -> Self {
        Self {
            base_host: base_host.into(),
            allow_list,
        }
    }

    pub fn from_entry_point(entry_point: &str, allow_list: Vec<String>) -> Option<Self> {
        let host = Url::parse(entry_point).ok()?.host_str()?.to_lowercase();
        Some(Self::new(host, allow_list))
    }

    pub fn is_in_scope(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_lowercase();

        if !self.allow_list.is_empty() {
            return self
                .allow_list
                .iter()
                .any(|needle| host.contains(&needle.to_lowercase()));
        }

        host == self.base_host || host.ends_with(&format!(".{}", self.base_host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_host_is_in_scope() {
        let policy = DomainPolicy::new("example.test", vec![]);
        assert!(policy.is_in_scope("https://example.test/path"));
    }

    #[test]
    fn subdomain_is_in_scope() {
        let policy = DomainPolicy::new("example.test", vec![]);
        assert!(policy.is_in_scope("https://docs.example.test/path"));
    }

    #[test]
    fn unrelated_host_is_out_of_scope() {
        let policy = DomainPolicy::new("example.test", vec![]);
        assert!(!policy.is_in_scope("https://other.test/path"));
    }

    #[test]
    fn host_that_merely_ends_with_base_as_substring_is_not_subdomain() {
        // "evilexample.test" must not be treated as a subdomain of "example.test"
        let policy = DomainPolicy::new("example.test", vec![]);
        assert!(!policy.is_in_scope("https://evilexample.test/path"));
    }

    #[test]
    fn allow_list_overrides_same_host_rule() {
        let policy = DomainPolicy::new("example.test", vec!["other.test".to_string()]);
        assert!(policy.is_in_scope("https://other.test/path"));
        assert!(!policy.is_in_scope("https://example.test/path"));
    }

    #[test]
    fn parse_failure_is_out_of_scope() {
        let policy = DomainPolicy::new("example.test", vec![]);
        assert!(!policy.is_in_scope("not a url"));
    }
}
