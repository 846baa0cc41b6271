//! Host classification for rule selection.

/// Which host-class rule follows the base rule in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostClass {
    /// Git forges: github, gitlab, bitbucket and their subdomains.
    Git,
    /// Q&A and discussion sites.
    Forum,
    /// Documentation and API reference sites.
    Docs,
    /// Everything else.
    General,
}

/// Path fragments that mark a documentation URL regardless of host.
const DOC_PATH_KEYWORDS: [&str; 6] = [
    "/docs/",
    "/doc/",
    "/api/",
    "/reference/",
    "/guide/",
    "/documentation/",
];

fn is_git_host(host: &str) -> bool {
    host == "github.com"
        || host.ends_with(".github.com")
        || host == "gitlab.com"
        || host.ends_with(".gitlab.com")
        || host == "bitbucket.org"
        || host.ends_with(".bitbucket.org")
}

fn is_forum_host(host: &str) -> bool {
    host == "stackoverflow.com"
        || host.ends_with(".stackexchange.com")
        || host == "reddit.com"
        || host.starts_with("forum.")
        || host.starts_with("forums.")
}

fn is_docs_host(host: &str, path: &str) -> bool {
    DOC_PATH_KEYWORDS.iter().any(|key| path.contains(key))
        || host.starts_with("docs.")
        || host.starts_with("api.")
}

/// Select the host class for a URL. `host` and `path` must already be
/// lowercased (the parser lowercases hosts; lowercase the path before
/// calling).
#[must_use]
pub fn classify(host: &str, path: &str) -> HostClass {
    if is_git_host(host) {
        return HostClass::Git;
    }
    if is_forum_host(host) {
        return HostClass::Forum;
    }
    if is_docs_host(host, path) {
        return HostClass::Docs;
    }
    HostClass::General
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_hosts_and_subdomains() {
        assert_eq!(classify("github.com", "/user/repo"), HostClass::Git);
        assert_eq!(classify("gist.github.com", "/x"), HostClass::Git);
        assert_eq!(classify("gitlab.com", "/org/project"), HostClass::Git);
        assert_eq!(classify("bitbucket.org", "/team/repo"), HostClass::Git);
        assert_eq!(classify("notgithub.com", "/"), HostClass::General);
    }

    #[test]
    fn test_forum_hosts() {
        assert_eq!(classify("stackoverflow.com", "/questions/1"), HostClass::Forum);
        assert_eq!(classify("unix.stackexchange.com", "/q/2"), HostClass::Forum);
        assert_eq!(classify("reddit.com", "/r/rust"), HostClass::Forum);
        assert_eq!(classify("forum.test", "/thread/55"), HostClass::Forum);
        assert_eq!(classify("forums.example.com", "/t/1"), HostClass::Forum);
    }

    #[test]
    fn test_docs_by_path_keyword() {
        assert_eq!(classify("example.com", "/docs/intro"), HostClass::Docs);
        assert_eq!(classify("example.com", "/v2/reference/types"), HostClass::Docs);
        assert_eq!(classify("site.com", "/fr-fr/doc/help//"), HostClass::Docs);
    }

    #[test]
    fn test_docs_by_host_prefix() {
        assert_eq!(classify("docs.microsoft.com", "/azure"), HostClass::Docs);
        assert_eq!(classify("api.example.com", "/"), HostClass::Docs);
    }

    #[test]
    fn test_git_wins_over_docs_keyword() {
        // A forge path containing /docs/ still gets the git rule.
        assert_eq!(classify("github.com", "/user/repo/docs/"), HostClass::Git);
    }

    #[test]
    fn test_everything_else_is_general() {
        assert_eq!(classify("example.com", "/a/b"), HostClass::General);
        assert_eq!(classify("127.0.0.1", "/"), HostClass::General);
    }
}
