use std::collections::HashSet;

/// Set of application names whose notifications are forwarded.
///
/// An empty allow-list means every application is allowed (open policy).
/// Names are matched exactly, case included.
#[derive(Debug, Clone, Default)]
pub struct AppAllowlist {
    names: HashSet<String>,
}

impl AppAllowlist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// An allow-list that lets everything through.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn is_allowed(&self, app_name: &str) -> bool {
        self.names.is_empty() || self.names.contains(app_name)
    }

    pub fn is_open(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn empty_allowlist_allows_everyone() {
        let list = AppAllowlist::open();
        assert!(list.is_open());
        assert!(list.is_allowed("Server"));
        assert!(list.is_allowed(""));
    }

    #[rstest]
    #[case("Server", true)]
    #[case("Backups", true)]
    #[case("Other", false)]
    #[case("server", false)]
    #[case("Server ", false)]
    fn exact_membership(#[case] name: &str, #[case] allowed: bool) {
        let list = AppAllowlist::new(["Server", "Backups"]);
        assert_eq!(list.is_allowed(name), allowed);
    }

    #[test]
    fn duplicates_collapse() {
        let list = AppAllowlist::new(vec!["A".to_string(), "A".to_string()]);
        assert_eq!(list.len(), 1);
        assert!(!list.is_open());
    }
}
