//! Route table for the API surface.
//!
//! Routes are registered as `(method, template, handler)` and evaluated in
//! registration order; the first route whose compiled matcher accepts the
//! path wins. Templates use `{name}` or `{name:regex}` segments, e.g.
//! `/api/room/{roomID:[0-9]+}`. A bare `{name}` matches one path segment.

use axum::{http::Method, response::Response};
use regex::Regex;
use std::{future::Future, pin::Pin, sync::Arc};

use crate::error::{Result, RoomRatesError};

const DEFAULT_SEGMENT_PATTERN: &str = "[^/]+";

pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Bound route handler receiving shared state `S` and the extracted parameters
pub type Handler<S> = Arc<dyn Fn(S, RouteParams) -> HandlerFuture + Send + Sync>;

/// Wrap an async fn as a [`Handler`]
pub fn handler<S, F, Fut>(f: F) -> Handler<S>
where
    F: Fn(S, RouteParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |state, params| Box::pin(f(state, params)))
}

/// Named parameters captured from a matched path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    entries: Vec<(String, String)>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Path template compiled into an anchored regex
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    matcher: Regex,
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compile a template such as `/api/room/{roomID:[0-9]+}`
    pub fn compile(template: &str) -> Result<Self> {
        let mut source = String::from("^");
        let mut param_names = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            source.push_str(&regex::escape(&rest[..open]));
            let close = find_closing_brace(&rest[open..]).ok_or_else(|| {
                RoomRatesError::Config(format!("Unbalanced braces in route template: {}", template))
            })? + open;

            let segment = &rest[open + 1..close];
            let (name, pattern) = match segment.split_once(':') {
                Some((name, pattern)) => (name, pattern),
                None => (segment, DEFAULT_SEGMENT_PATTERN),
            };
            if name.is_empty() || pattern.is_empty() {
                return Err(RoomRatesError::Config(format!(
                    "Empty parameter in route template: {}",
                    template
                )));
            }
            if param_names.iter().any(|existing| existing == name) {
                return Err(RoomRatesError::Config(format!(
                    "Duplicate parameter '{}' in route template: {}",
                    name, template
                )));
            }

            source.push_str(&format!("(?P<{}>{})", name, pattern));
            param_names.push(name.to_string());
            rest = &rest[close + 1..];
        }

        if rest.contains('}') {
            return Err(RoomRatesError::Config(format!(
                "Unbalanced braces in route template: {}",
                template
            )));
        }
        source.push_str(&regex::escape(rest));
        source.push('$');

        Ok(Self {
            template: template.to_string(),
            matcher: Regex::new(&source)?,
            param_names,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Match the full path, returning captured parameters
    pub fn captures(&self, path: &str) -> Option<RouteParams> {
        let caps = self.matcher.captures(path)?;
        let mut params = RouteParams::new();
        for name in &self.param_names {
            let value = caps.name(name).map(|m| m.as_str()).unwrap_or_default();
            params.insert(name.as_str(), value);
        }
        Some(params)
    }
}

/// Byte offset of the brace closing the one at the start of `s`.
/// Nested braces belong to the regex (e.g. `[0-9]{2,4}`).
fn find_closing_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

pub struct Route<S> {
    method: Method,
    pattern: PathPattern,
    handler: Handler<S>,
}

impl<S> Route<S> {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    pub fn handler(&self) -> &Handler<S> {
        &self.handler
    }
}

/// Outcome of matching a request against the table
pub enum RouteMatch<'a, S> {
    Matched {
        route: &'a Route<S>,
        params: RouteParams,
    },
    /// Some route accepts the path, but not with this method
    MethodNotAllowed,
    NotFound,
}

/// Ordered, immutable-after-build set of routes
pub struct RouteTable<S> {
    routes: Vec<Route<S>>,
}

impl<S> Default for RouteTable<S> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<S> RouteTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Fails if the template does not compile.
    pub fn route(mut self, method: Method, template: &str, handler: Handler<S>) -> Result<Self> {
        let pattern = PathPattern::compile(template)?;
        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First route in registration order accepting both method and path
    pub fn match_request(&self, method: &Method, path: &str) -> RouteMatch<'_, S> {
        let mut path_matched = false;

        for route in &self.routes {
            if let Some(params) = route.pattern.captures(path) {
                if route.method == *method {
                    return RouteMatch::Matched { route, params };
                }
                path_matched = true;
            }
        }

        if path_matched {
            RouteMatch::MethodNotAllowed
        } else {
            RouteMatch::NotFound
        }
    }
}
