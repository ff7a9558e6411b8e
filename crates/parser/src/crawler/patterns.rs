//! Text patterns for spotting HTTP operations and shell commands

use apidoc_mcp_common::{HttpMethod, RawParameter, Schema};
use regex::Regex;
use std::sync::LazyLock;

static PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:/[a-zA-Z0-9{}/?=&%.:\-_~]+)+)").expect("path pattern is valid")
});

static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(GET|POST|PUT|DELETE|PATCH|OPTIONS|HEAD)\b").expect("method pattern is valid")
});

static COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:python|pip|mcp|docker|kubectl|aws|gcloud|az|\./|bash)\s+.*")
        .expect("command pattern is valid")
});

static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("path parameter pattern is valid"));

static COMMAND_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(--[a-zA-Z0-9\-]+(?:=[^ ]+)?)|(-[a-zA-Z][a-zA-Z0-9\-]*)|(<[^>]+>)")
        .expect("argument pattern is valid")
});

static LIST_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w\-]+)\s*[:\-]\s*(.*)").expect("list pattern is valid"));

static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,;:)\s]+$").expect("punctuation pattern is valid"));

/// First HTTP method token in the text
pub fn find_method(text: &str) -> Option<HttpMethod> {
    METHOD
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| HttpMethod::parse(m.as_str()))
}

/// Most path-like token in the text
///
/// Among all candidates the first one with the most `/` wins. A leading
/// `//host` segment from an absolute URL and any query string are dropped.
pub fn find_path(text: &str) -> Option<String> {
    let mut best: Option<&str> = None;
    for candidate in PATH.find_iter(text).map(|m| m.as_str()) {
        let better = best
            .map(|b| candidate.matches('/').count() > b.matches('/').count())
            .unwrap_or(true);
        if better {
            best = Some(candidate);
        }
    }

    let mut path = best?;
    if let Some(without_scheme) = path.strip_prefix("//") {
        path = without_scheme
            .find('/')
            .map(|i| &without_scheme[i..])
            .unwrap_or("");
    }
    if let Some(i) = path.find('?') {
        path = &path[..i];
    }
    let path = TRAILING_PUNCTUATION.replace(path, "");

    (path.contains('/') && path.len() > 2).then(|| path.into_owned())
}

/// True when the line looks like a shell invocation
pub fn is_command(line: &str) -> bool {
    COMMAND.is_match(line)
}

/// Required `path` parameters for each `{name}` in the path
pub fn path_parameters(path: &str) -> Vec<RawParameter> {
    PATH_PARAM
        .captures_iter(path)
        .filter_map(|c| c.get(1))
        .map(|m| RawParameter {
            name: m.as_str().to_string(),
            location: Some("path".to_string()),
            required: true,
            description: format!("Path parameter: {}", m.as_str()),
            schema: Schema::string(),
        })
        .collect()
}

/// Options (`--flag`, `-f`) and `<placeholder>` arguments of a command line
pub fn command_arguments(line: &str) -> Vec<RawParameter> {
    COMMAND_ARG
        .find_iter(line)
        .map(|m| {
            let arg = m.as_str();
            if arg.starts_with('-') {
                let name = arg.split('=').next().unwrap_or(arg).to_string();
                RawParameter {
                    description: format!("Command-line option: {}", name),
                    name,
                    location: Some("option".to_string()),
                    required: false,
                    schema: Schema::string(),
                }
            } else {
                let name = arg.trim_start_matches('<').trim_end_matches('>').to_string();
                RawParameter {
                    description: format!("Command-line placeholder: {}", name),
                    name,
                    location: Some("argument".to_string()),
                    required: true,
                    schema: Schema::string(),
                }
            }
        })
        .collect()
}

/// `name: description` or `name - description` list items
pub fn list_parameter(text: &str) -> Option<RawParameter> {
    let caps = LIST_PARAM.captures(text)?;
    Some(RawParameter {
        name: caps.get(1)?.as_str().trim().to_string(),
        location: None,
        required: false,
        description: caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default().to_string(),
        schema: Schema::string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_method() {
        assert_eq!(find_method("curl -X post /users"), Some(HttpMethod::Post));
        assert_eq!(find_method("forget about it"), None);
    }

    #[test]
    fn test_find_path_prefers_most_segments() {
        assert_eq!(
            find_path("see /docs then GET /v1/users/{id}."),
            Some("/v1/users/{id}".to_string())
        );
        assert_eq!(find_path("a / b"), None);
    }

    #[test]
    fn test_find_path_strips_host_and_query() {
        assert_eq!(
            find_path("curl https://api.example.com/v1/pets?limit=10"),
            Some("/v1/pets".to_string())
        );
    }

    #[test]
    fn test_command_arguments() {
        let args = command_arguments("docker run --name=web -d <image>");
        let names: Vec<&str> = args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["--name", "-d", "image"]);
        assert!(args[2].required);
        assert_eq!(args[0].location.as_deref(), Some("option"));
        assert!(is_command("docker run --name=web -d <image>"));
        assert!(!is_command("GET /users"));
    }

    #[test]
    fn test_list_parameter() {
        let param = list_parameter("limit: maximum number of results").unwrap();
        assert_eq!(param.name, "limit");
        assert_eq!(param.description, "maximum number of results");
        assert!(list_parameter("Just prose here").is_none());
    }
}
