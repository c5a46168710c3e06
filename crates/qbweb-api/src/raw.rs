//! Untyped calls for endpoints without a dedicated wrapper.

use crate::error::{ApiError, ApiResult};

/// Namespace a raw action is posted under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawScope {
    /// `POST /<action>`; the action carries its own namespace (`torrents/createTags`).
    Root,
    /// `POST /rss/<action>`.
    Rss,
}

/// A form-encoded POST to an arbitrary action path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawCall {
    /// Path prefix.
    pub scope: RawScope,
    /// Action name appended to the scope.
    pub action: String,
    /// URL-encoded form parameters, in order.
    pub params: Vec<(String, String)>,
}

impl RawCall {
    /// Call `/<action>`.
    #[must_use]
    pub fn root(action: impl Into<String>) -> Self {
        Self {
            scope: RawScope::Root,
            action: action.into(),
            params: Vec::new(),
        }
    }

    /// Call `/rss/<action>`.
    #[must_use]
    pub fn rss(action: impl Into<String>) -> Self {
        Self {
            scope: RawScope::Rss,
            action: action.into(),
            params: Vec::new(),
        }
    }

    /// Append a form parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Endpoint path relative to the API base.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidAction`] when the action is empty, has a
    /// `.` or `..` segment, or carries a query or fragment, any of which would
    /// leave the scoped endpoint.
    pub fn path(&self) -> ApiResult<String> {
        let action = self.action.trim_start_matches('/');
        let escapes = action.is_empty()
            || action.contains(['?', '#', '\\'])
            || action
                .split('/')
                .any(|segment| segment == "." || segment == ".." || segment.is_empty());
        if escapes {
            return Err(ApiError::InvalidAction {
                action: self.action.clone(),
            });
        }
        Ok(match self.scope {
            RawScope::Root => format!("/{action}"),
            RawScope::Rss => format!("/rss/{action}"),
        })
    }
}
