//! Bypass paths and backend routing.

use std::collections::{BTreeMap, HashMap};

use url::Url;

use crate::config::BackendConfig;

#[derive(Debug, thiserror::Error)]
pub enum RoutePolicyError {
    #[error("invalid bypass path pattern `{path}`: {source}")]
    BypassPattern {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("invalid backend URL `{url}`: {source}")]
    BackendUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend URL `{0}` must use http or https")]
    UnsupportedScheme(String),
}

/// Paths forwarded without identification or evaluation.
#[derive(Clone)]
pub struct BypassMatcher {
    matcher: matchit::Router<()>,
}

impl BypassMatcher {
    /// # Errors
    ///
    /// Returns [`RoutePolicyError::BypassPattern`] for an invalid or
    /// conflicting pattern.
    pub fn new<S: AsRef<str>>(paths: &[S]) -> Result<Self, RoutePolicyError> {
        let mut matcher = matchit::Router::new();
        for path in paths {
            let path = path.as_ref();
            matcher
                .insert(path, ())
                .map_err(|source| RoutePolicyError::BypassPattern {
                    path: path.to_owned(),
                    source,
                })?;
        }
        Ok(Self { matcher })
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.at(path).is_ok()
    }
}

/// Resource type → backend base URL, with an optional default.
#[derive(Debug, Clone)]
pub struct BackendRoutes {
    routes: HashMap<String, Url>,
    default: Option<Url>,
}

impl BackendRoutes {
    /// # Errors
    ///
    /// Returns [`RoutePolicyError`] if a URL does not parse or is not http(s).
    pub fn from_config(cfg: &BackendConfig) -> Result<Self, RoutePolicyError> {
        Self::new(cfg.default_url.as_deref(), &cfg.routes)
    }

    /// # Errors
    ///
    /// Returns [`RoutePolicyError`] if a URL does not parse or is not http(s).
    pub fn new(
        default: Option<&str>,
        routes: &BTreeMap<String, String>,
    ) -> Result<Self, RoutePolicyError> {
        let routes = routes
            .iter()
            .map(|(resource_type, url)| Ok((resource_type.clone(), parse_base(url)?)))
            .collect::<Result<HashMap<_, _>, RoutePolicyError>>()?;
        let default = default.map(parse_base).transpose()?;
        Ok(Self { routes, default })
    }

    /// Backend for `resource_type`, falling back to the default.
    #[must_use]
    pub fn for_resource(&self, resource_type: &str) -> Option<&Url> {
        self.routes.get(resource_type).or(self.default.as_ref())
    }

    /// Backend for bypass traffic.
    #[must_use]
    pub fn default_backend(&self) -> Option<&Url> {
        self.default.as_ref()
    }
}

fn parse_base(raw: &str) -> Result<Url, RoutePolicyError> {
    let url = Url::parse(raw).map_err(|source| RoutePolicyError::BackendUrl {
        url: raw.to_owned(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(RoutePolicyError::UnsupportedScheme(raw.to_owned())),
    }
}
