use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as dot-namespaced opaque strings
/// (e.g. `"users.view"`, `"roles.assign-permissions"`). The substring before
/// the first `.` names the resource, the rest names the action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(Cow<'static, str>);

impl PermissionName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource prefix: everything before the first `.`.
    ///
    /// A name without a `.` is its own resource.
    pub fn resource(&self) -> &str {
        match self.0.split_once('.') {
            Some((resource, _)) => resource,
            None => &self.0,
        }
    }

    /// Action suffix: everything after the first `.`, or the literal
    /// `"other"` when the name carries no `.`.
    pub fn action(&self) -> &str {
        match self.0.split_once('.') {
            Some((_, action)) => action,
            None => "other",
        }
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PermissionName {
    fn from(value: &str) -> Self {
        Self(Cow::Owned(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_resource_and_action_at_first_dot() {
        let p = PermissionName::new("api.tokens.create");
        assert_eq!(p.resource(), "api");
        assert_eq!(p.action(), "tokens.create");
    }

    #[test]
    fn dotless_name_falls_back_to_other() {
        let p = PermissionName::new("superuser");
        assert_eq!(p.resource(), "superuser");
        assert_eq!(p.action(), "other");
    }
}
