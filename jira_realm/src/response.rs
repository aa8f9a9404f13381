//! Parsing of Jira user documents

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Username, UsernameRef};

/// A Jira user and the names of the groups they belong to
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserGroups {
    username: Username,
    key: Option<String>,
    display_name: Option<String>,
    email_address: Option<String>,
    active: Option<bool>,
    groups: BTreeSet<String>,
}

impl UserGroups {
    /// The user's name, never empty
    #[inline]
    pub fn username(&self) -> &UsernameRef {
        &self.username
    }

    /// The user's key, if reported
    #[inline]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The user's display name, if reported
    #[inline]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The user's email address, if reported
    #[inline]
    pub fn email_address(&self) -> Option<&str> {
        self.email_address.as_deref()
    }

    /// Whether the user account is active, if reported
    #[inline]
    pub fn active(&self) -> Option<bool> {
        self.active
    }

    /// The names of the groups the user belongs to
    ///
    /// Empty unless the groups were requested and the user is a member of
    /// at least one group.
    #[inline]
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Whether the user belongs to the named group
    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Takes ownership of the group names
    pub fn into_groups(self) -> BTreeSet<String> {
        self.groups
    }
}

/// The response body is not a usable Jira user document
#[derive(Debug, Error)]
pub enum MalformedResponse {
    /// The body is not JSON of the expected shape
    #[error("response body is not a Jira user document")]
    Json(#[from] serde_json::Error),
    /// The document does not name a user
    #[error("response body does not name a user")]
    MissingUsername,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    name: Option<String>,
    key: Option<String>,
    display_name: Option<String>,
    email_address: Option<String>,
    active: Option<bool>,
    groups: Option<GroupsDto>,
}

#[derive(Debug, Deserialize)]
struct GroupsDto {
    items: Option<Vec<GroupDto>>,
}

#[derive(Debug, Deserialize)]
struct GroupDto {
    name: Option<String>,
}

/// Parses a Jira user document
///
/// Absent or empty group information yields an empty group set.
pub fn parse(body: &str) -> Result<UserGroups, MalformedResponse> {
    let dto: UserDto = serde_json::from_str(body)?;

    let username = match dto.name {
        Some(name) if !name.is_empty() => Username::from(name),
        _ => return Err(MalformedResponse::MissingUsername),
    };

    let groups = dto
        .groups
        .and_then(|g| g.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|g| g.name)
        .collect();

    Ok(UserGroups {
        username,
        key: dto.key,
        display_name: dto.display_name,
        email_address: dto.email_address,
        active: dto.active,
        groups,
    })
}
