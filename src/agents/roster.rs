// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Round-robin roster of peer experts.

use std::collections::VecDeque;

use super::AgentProfile;

/// FIFO-rotatable sequence of peer experts.
///
/// Rotation moves the head to the tail, so within one full cycle every
/// expert is selected exactly once. The size only changes through
/// [`PeerRoster::replace`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerRoster {
    experts: VecDeque<AgentProfile>,
}

impl PeerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profiles(profiles: impl IntoIterator<Item = AgentProfile>) -> Self {
        Self {
            experts: profiles.into_iter().collect(),
        }
    }

    /// Build profiles from `"Name: description"` strings, keeping at most `max`.
    pub fn parse_descriptions<S: AsRef<str>>(descriptions: &[S], max: usize) -> Vec<AgentProfile> {
        descriptions
            .iter()
            .filter_map(|d| AgentProfile::parse(d.as_ref()))
            .take(max)
            .collect()
    }

    /// Next expert in line, without rotating.
    pub fn head(&self) -> Option<&AgentProfile> {
        self.experts.front()
    }

    /// Take the head, move it to the tail and return it.
    pub fn rotate(&mut self) -> Option<AgentProfile> {
        let head = self.experts.pop_front()?;
        self.experts.push_back(head.clone());
        Some(head)
    }

    /// Replace the whole roster.
    pub fn replace(&mut self, profiles: Vec<AgentProfile>) {
        self.experts = profiles.into();
    }

    pub fn len(&self) -> usize {
        self.experts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentProfile> {
        self.experts.iter()
    }

    /// Snapshot of the roster in selection order.
    pub fn profiles(&self) -> Vec<AgentProfile> {
        self.experts.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> PeerRoster {
        PeerRoster::from_profiles(names.iter().map(|n| AgentProfile::new(*n, "")))
    }

    #[test]
    fn test_rotate_cycles_in_order() {
        let mut roster = roster(&["E1", "E2", "E3"]);
        let picked: Vec<_> = (0..6)
            .map(|_| roster.rotate().unwrap().role_name)
            .collect();
        assert_eq!(picked, vec!["E1", "E2", "E3", "E1", "E2", "E3"]);
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn test_head_does_not_rotate() {
        let roster = roster(&["E1", "E2"]);
        assert_eq!(roster.head().unwrap().role_name, "E1");
        assert_eq!(roster.head().unwrap().role_name, "E1");
    }

    #[test]
    fn test_empty_roster() {
        let mut roster = PeerRoster::new();
        assert!(roster.head().is_none());
        assert!(roster.rotate().is_none());
        assert!(roster.is_empty());
    }

    #[test]
    fn test_parse_descriptions_truncates_and_skips_blank() {
        let descriptions = vec![
            "Architect: module boundaries".to_string(),
            "".to_string(),
            "Tester: edge cases".to_string(),
            "Reviewer: style".to_string(),
        ];
        let parsed = PeerRoster::parse_descriptions(&descriptions, 2);
        let names: Vec<_> = parsed.iter().map(|p| p.role_name.as_str()).collect();
        assert_eq!(names, vec!["Architect", "Tester"]);
    }

    #[test]
    fn test_replace_resets_rotation() {
        let mut roster = roster(&["E1", "E2"]);
        roster.rotate();
        roster.replace(vec![AgentProfile::new("X", ""), AgentProfile::new("Y", "")]);
        assert_eq!(roster.rotate().unwrap().role_name, "X");
        assert_eq!(
            roster.profiles().iter().map(|p| p.role_name.as_str()).collect::<Vec<_>>(),
            vec!["Y", "X"]
        );
    }
}
