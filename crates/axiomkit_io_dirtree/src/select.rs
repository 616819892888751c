//! File selection predicate.

use std::io;
use std::time::SystemTime;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::entry::SpecFileInfo;
use crate::spec::{DirTreeError, EnumSelectCombineMode, SpecSelectionCriteria, SpecTreeOptions};

/// Compiled form of [`SpecSelectionCriteria`].
///
/// Patterns are compiled once per operation. A pattern that does not compile
/// is kept as `err_pattern` and reported by every evaluation, so each file is
/// skipped on its own while the walk goes on.
#[derive(Debug, Clone)]
pub struct SpecSelectionMatcher {
    l_glob: Vec<GlobMatcher>,
    regex_name: Option<Regex>,
    time_older_than: Option<SystemTime>,
    time_newer_than: Option<SystemTime>,
    permission_mask: Option<u32>,
    rule_combine: EnumSelectCombineMode,
    err_pattern: Option<(String, String)>,
}

impl SpecSelectionCriteria {
    /// Compile glob and regex patterns. Blank patterns are skipped.
    pub fn compile(&self) -> SpecSelectionMatcher {
        let mut err_pattern: Option<(String, String)> = None;

        let mut l_glob = Vec::with_capacity(self.patterns_name.len());
        for pattern in self.patterns_name.iter().filter(|p| !p.trim().is_empty()) {
            match Glob::new(pattern) {
                Ok(glob) => l_glob.push(glob.compile_matcher()),
                Err(e) => {
                    err_pattern.get_or_insert_with(|| (pattern.clone(), e.to_string()));
                }
            }
        }

        let regex_name = match self.pattern_regex.as_deref() {
            Some(pattern) if !pattern.trim().is_empty() => match Regex::new(pattern) {
                Ok(v) => Some(v),
                Err(e) => {
                    err_pattern.get_or_insert_with(|| (pattern.to_string(), e.to_string()));
                    None
                }
            },
            _ => None,
        };

        SpecSelectionMatcher {
            l_glob,
            regex_name,
            time_older_than: self.time_older_than,
            time_newer_than: self.time_newer_than,
            permission_mask: self.permission_mask,
            rule_combine: self.rule_combine,
            err_pattern,
        }
    }
}

impl SpecTreeOptions {
    /// Check flag consistency and compile the selection criteria.
    ///
    /// Conflicting flags surface here, before any I/O. Malformed patterns do
    /// not; they fail each file they are evaluated against.
    pub fn prepare(&self) -> Result<SpecSelectionMatcher, DirTreeError> {
        self.validate()?;
        Ok(self.spec_select.compile())
    }
}

impl Default for SpecSelectionMatcher {
    fn default() -> Self {
        Self {
            l_glob: Vec::new(),
            regex_name: None,
            time_older_than: None,
            time_newer_than: None,
            permission_mask: None,
            rule_combine: EnumSelectCombineMode::And,
            err_pattern: None,
        }
    }
}

impl SpecSelectionMatcher {
    /// True when at least one criterion takes part in matching.
    pub fn is_active(&self) -> bool {
        !self.l_glob.is_empty()
            || self.regex_name.is_some()
            || self.time_older_than.is_some()
            || self.time_newer_than.is_some()
            || self.permission_mask.is_some()
            || self.err_pattern.is_some()
    }

    /// Evaluate every active criterion against `file_info` and combine them.
    ///
    /// With no active criterion the result is `true` in both combine modes.
    /// A pattern that failed to compile yields
    /// [`DirTreeError::InvalidPattern`] for every file.
    pub fn matches(&self, file_info: &SpecFileInfo) -> Result<bool, DirTreeError> {
        if let Some((pattern, message)) = &self.err_pattern {
            return Err(DirTreeError::InvalidPattern {
                pattern: pattern.clone(),
                message: message.clone(),
            });
        }

        let mut l_votes: Vec<bool> = Vec::with_capacity(5);

        if !self.l_glob.is_empty() {
            l_votes.push(self.l_glob.iter().any(|g| g.is_match(&file_info.name)));
        }
        if let Some(time_limit) = self.time_older_than {
            l_votes.push(require_mtime(file_info)? < time_limit);
        }
        if let Some(time_limit) = self.time_newer_than {
            l_votes.push(require_mtime(file_info)? > time_limit);
        }
        if let Some(mask) = self.permission_mask {
            l_votes.push(file_info.permission_bits() == mask & 0o7777);
        }
        if let Some(regex) = &self.regex_name {
            l_votes.push(regex.is_match(&file_info.name));
        }

        if l_votes.is_empty() {
            return Ok(true);
        }
        Ok(match self.rule_combine {
            EnumSelectCombineMode::And => l_votes.iter().all(|v| *v),
            EnumSelectCombineMode::Or => l_votes.iter().any(|v| *v),
        })
    }
}

fn require_mtime(file_info: &SpecFileInfo) -> Result<SystemTime, DirTreeError> {
    file_info.time_modified.ok_or_else(|| {
        DirTreeError::io(
            &file_info.path,
            io::Error::other("modification time is unavailable"),
        )
    })
}

/// Compile `criteria` and evaluate it against one file.
///
/// Malformed patterns are returned as [`DirTreeError::InvalidPattern`].
pub fn matches(
    file_info: &SpecFileInfo,
    criteria: &SpecSelectionCriteria,
) -> Result<bool, DirTreeError> {
    criteria.compile().matches(file_info)
}
