// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Unified diff rendering for proposed edits.
//!
//! Output matches `diff -u` conventions: `---`/`+++` headers, `@@` range
//! lines, and an empty string when nothing changed. Rendering is CPU bound;
//! async callers run it on a blocking thread.

use std::fmt::Write;

/// Context lines shown around each change.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Largest LCS table built for one edit, in cells.
const MAX_TABLE_CELLS: usize = 4_000_000;

/// A change operation from the diff algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    /// Line kept (old index, new index).
    Keep(usize, usize),
    /// Line deleted from old (with index).
    Delete(usize),
    /// Line added from new (with index).
    Add(usize),
}

impl Change {
    fn is_edit(&self) -> bool {
        !matches!(self, Change::Keep(..))
    }

    fn consumes_old(&self) -> bool {
        !matches!(self, Change::Add(_))
    }

    fn consumes_new(&self) -> bool {
        !matches!(self, Change::Delete(_))
    }
}

/// Render a unified diff of `old` against `new`, labelled with `filename`.
pub fn unified_diff(old: &str, new: &str, filename: &str, context_lines: usize) -> String {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let changes = compute_diff(&old_lines, &new_lines);

    let ranges = hunk_ranges(&changes, context_lines);
    if ranges.is_empty() {
        return String::new();
    }

    // old_pos[k] / new_pos[k]: lines of each side consumed before change k
    let mut old_pos = Vec::with_capacity(changes.len() + 1);
    let mut new_pos = Vec::with_capacity(changes.len() + 1);
    let (mut o, mut n) = (0usize, 0usize);
    for change in &changes {
        old_pos.push(o);
        new_pos.push(n);
        o += usize::from(change.consumes_old());
        n += usize::from(change.consumes_new());
    }
    old_pos.push(o);
    new_pos.push(n);

    let mut out = String::new();
    let _ = writeln!(out, "--- {}", filename);
    let _ = write!(out, "+++ {}", filename);

    for (start, end) in ranges {
        let _ = write!(
            out,
            "\n@@ -{} +{} @@",
            format_range(old_pos[start], old_pos[end]),
            format_range(new_pos[start], new_pos[end]),
        );
        for change in &changes[start..end] {
            let _ = match change {
                Change::Keep(i, _) => write!(out, "\n {}", old_lines[*i]),
                Change::Delete(i) => write!(out, "\n-{}", old_lines[*i]),
                Change::Add(j) => write!(out, "\n+{}", new_lines[*j]),
            };
        }
    }

    out
}

/// `start,len` with 1-based start; a single line omits the length and an
/// empty range points at the line before it.
fn format_range(start: usize, stop: usize) -> String {
    let length = stop - start;
    match length {
        1 => format!("{}", start + 1),
        0 => format!("{},0", start),
        _ => format!("{},{}", start + 1, length),
    }
}

/// Compute the diff between two sequences.
///
/// The common prefix and suffix are matched directly. The remaining middle
/// goes through an LCS table when it fits in [`MAX_TABLE_CELLS`], and is
/// otherwise reported as one block of deletions followed by additions.
fn compute_diff(old: &[&str], new: &[&str]) -> Vec<Change> {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut changes = Vec::with_capacity(old.len() + new_mid.len());
    changes.extend((0..prefix).map(|i| Change::Keep(i, i)));
    diff_middle(old_mid, new_mid, prefix, &mut changes);
    let (old_tail, new_tail) = (old.len() - suffix, new.len() - suffix);
    changes.extend((0..suffix).map(|k| Change::Keep(old_tail + k, new_tail + k)));
    changes
}

/// Diff the differing middle of both sides. Indices are offset by `base`.
fn diff_middle(old: &[&str], new: &[&str], base: usize, changes: &mut Vec<Change>) {
    let m = old.len();
    let n = new.len();
    let width = n + 1;

    if m == 0 || n == 0 || (m + 1).saturating_mul(width) > MAX_TABLE_CELLS {
        changes.extend((0..m).map(|i| Change::Delete(base + i)));
        changes.extend((0..n).map(|j| Change::Add(base + j)));
        return;
    }

    // table[i * width + j] = length of LCS of old[i..] and new[j..]
    let mut table = vec![0u32; (m + 1) * width];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            table[i * width + j] = if old[i] == new[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[i * width + j + 1].max(table[(i + 1) * width + j])
            };
        }
    }

    let (mut i, mut j) = (0usize, 0usize);
    while i < m || j < n {
        if i < m && j < n && old[i] == new[j] {
            changes.push(Change::Keep(base + i, base + j));
            i += 1;
            j += 1;
        } else if i < m && (j >= n || table[(i + 1) * width + j] >= table[i * width + j + 1]) {
            changes.push(Change::Delete(base + i));
            i += 1;
        } else {
            changes.push(Change::Add(base + j));
            j += 1;
        }
    }
}

/// Half-open index ranges into `changes`, one per hunk.
fn hunk_ranges(changes: &[Change], context_lines: usize) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();

    for (idx, change) in changes.iter().enumerate() {
        if !change.is_edit() {
            continue;
        }
        let start = idx.saturating_sub(context_lines);
        let end = (idx + 1 + context_lines).min(changes.len());

        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => ranges.push((start, end)),
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_is_empty() {
        assert_eq!(unified_diff("a\nb\n", "a\nb\n", "f.txt", 3), "");
    }

    #[test]
    fn test_single_line_change() {
        let diff = unified_diff("line1\nline2\nline3", "line1\nmodified\nline3", "f.txt", 3);
        let expected = "--- f.txt\n+++ f.txt\n@@ -1,3 +1,3 @@\n line1\n-line2\n+modified\n line3";
        assert_eq!(diff, expected);
    }

    #[test]
    fn test_new_file() {
        let diff = unified_diff("", "fn main() {}\n", "src/main.rs", 3);
        assert_eq!(diff, "--- src/main.rs\n+++ src/main.rs\n@@ -0,0 +1 @@\n+fn main() {}");
    }

    #[test]
    fn test_deleted_content() {
        let diff = unified_diff("a\nb", "", "gone.txt", 3);
        assert_eq!(diff, "--- gone.txt\n+++ gone.txt\n@@ -1,2 +0,0 @@\n-a\n-b");
    }

    #[test]
    fn test_distant_changes_make_separate_hunks() {
        let old: Vec<String> = (1..=20).map(|i| format!("l{}", i)).collect();
        let mut new = old.clone();
        new[1] = "changed2".to_string();
        new[17] = "changed18".to_string();

        let diff = unified_diff(&old.join("\n"), &new.join("\n"), "f", 3);
        assert_eq!(diff.matches("\n@@ ").count(), 2);
        assert!(diff.contains("@@ -1,5 +1,5 @@"));
        assert!(diff.contains("@@ -15,6 +15,6 @@"));
    }

    #[test]
    fn test_close_changes_merge_into_one_hunk() {
        let old = "a\nb\nc\nd\ne\nf";
        let new = "A\nb\nc\nd\ne\nF";
        let diff = unified_diff(old, new, "f", 3);
        assert_eq!(diff.matches("\n@@ ").count(), 1);
        assert!(diff.contains("@@ -1,6 +1,6 @@"));
    }

    #[test]
    fn test_single_change_in_large_file() {
        let old: Vec<String> = (1..=30_000).map(|i| format!("line {}", i)).collect();
        let mut new = old.clone();
        new[14_999] = "rewritten".to_string();

        let diff = unified_diff(&old.join("\n"), &new.join("\n"), "gen.rs", 3);
        assert_eq!(diff.matches("\n@@ ").count(), 1);
        assert!(diff.contains("@@ -14997,7 +14997,7 @@"));
        assert!(diff.contains("\n-line 15000\n+rewritten"));
        assert!(diff.len() < 256);
    }

    #[test]
    fn test_oversized_rewrite_is_one_replace_hunk() {
        let old: Vec<String> = (1..=5_000).map(|i| format!("old {}", i)).collect();
        let new: Vec<String> = (1..=5_000).map(|i| format!("new {}", i)).collect();

        let diff = unified_diff(&old.join("\n"), &new.join("\n"), "big.txt", 3);
        assert!(diff.starts_with("--- big.txt\n+++ big.txt\n@@ -1,5000 +1,5000 @@\n-old 1\n"));
        assert_eq!(diff.lines().filter(|l| l.starts_with("-old ")).count(), 5_000);
        assert_eq!(diff.lines().filter(|l| l.starts_with("+new ")).count(), 5_000);
        assert!(diff.ends_with("\n+new 5000"));
    }

    #[test]
    fn test_shared_edges_with_changed_middle() {
        let diff = unified_diff("a\nb\nc\nd", "a\nx\ny\nd", "f", 1);
        assert_eq!(diff, "--- f\n+++ f\n@@ -1,4 +1,4 @@\n a\n-b\n-c\n+x\n+y\n d");
    }
}
