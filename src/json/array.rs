//! Array edit scripts.
//!
//! Arrays are positional, so they are not diffed key-by-key. Instead the
//! common prefix and suffix are trimmed and a longest-common-subsequence
//! table over the remaining middle section yields a minimal sequence of
//! keeps, removals and insertions. A removal immediately followed by an
//! insertion of a container of the same kind (object for object, array for
//! array) is folded into a nested `Edit`, so changing one field of one
//! element in a list of objects stores only that field.
//!
//! The script is read against the source array from left to right; it must
//! consume the source exactly.
//!
//! The LCS table is quadratic in the middle section. Past `LCS_CELL_BUDGET`
//! cells the middle is emitted as a plain removal followed by an insertion,
//! which still patches correctly but is no longer minimal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diff::{diff_values, patch_value, Diff};
use super::DiffError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayOp {
    /// Copy the next `n` source elements.
    Keep(usize),
    /// Skip the next `n` source elements.
    Remove(usize),
    /// Emit these elements without consuming source.
    Insert(Vec<Value>),
    /// Patch the next source element with a nested diff.
    Edit(Diff),
}

/// Largest LCS table built before falling back to remove-then-insert.
const LCS_CELL_BUDGET: usize = 4_000_000;

/// Raw single-element steps produced by the LCS walk.
enum Step {
    Keep,
    Remove(usize),
    Insert(usize),
}

pub(crate) fn diff_arrays(target: &[Value], source: &[Value]) -> Vec<ArrayOp> {
    let prefix = target
        .iter()
        .zip(source)
        .take_while(|(t, s)| t == s)
        .count();
    let suffix = target[prefix..]
        .iter()
        .rev()
        .zip(source[prefix..].iter().rev())
        .take_while(|(t, s)| t == s)
        .count();

    let target_mid = &target[prefix..target.len() - suffix];
    let source_mid = &source[prefix..source.len() - suffix];

    let mut script = Script::default();
    script.keep(prefix);

    let mut removed: Vec<usize> = Vec::new();
    let mut inserted: Vec<usize> = Vec::new();
    for step in lcs_steps(target_mid, source_mid) {
        match step {
            Step::Keep => {
                script.replace_run(&removed, &inserted, target_mid, source_mid);
                removed.clear();
                inserted.clear();
                script.keep(1);
            }
            Step::Remove(at) => removed.push(at),
            Step::Insert(at) => inserted.push(at),
        }
    }
    script.replace_run(&removed, &inserted, target_mid, source_mid);

    script.keep(suffix);
    script.finish()
}

/// Backtrack an LCS table into single steps, source-major.
fn lcs_steps(target: &[Value], source: &[Value]) -> Vec<Step> {
    let rows = source.len() + 1;
    let cols = target.len() + 1;
    if rows.saturating_mul(cols) > LCS_CELL_BUDGET {
        return (0..source.len())
            .map(Step::Remove)
            .chain((0..target.len()).map(Step::Insert))
            .collect();
    }
    // table[i * cols + j] = LCS length of source[i..] and target[j..]
    let mut table = vec![0usize; rows * cols];
    for i in (0..source.len()).rev() {
        for j in (0..target.len()).rev() {
            table[i * cols + j] = if source[i] == target[j] {
                table[(i + 1) * cols + j + 1] + 1
            } else {
                table[(i + 1) * cols + j].max(table[i * cols + j + 1])
            };
        }
    }

    let mut steps = Vec::with_capacity(source.len() + target.len());
    let (mut i, mut j) = (0, 0);
    while i < source.len() && j < target.len() {
        if source[i] == target[j] {
            steps.push(Step::Keep);
            i += 1;
            j += 1;
        } else if table[(i + 1) * cols + j] >= table[i * cols + j + 1] {
            steps.push(Step::Remove(i));
            i += 1;
        } else {
            steps.push(Step::Insert(j));
            j += 1;
        }
    }
    steps.extend((i..source.len()).map(Step::Remove));
    steps.extend((j..target.len()).map(Step::Insert));
    steps
}

fn same_container(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    )
}

/// Accumulates ops, merging adjacent runs of the same kind.
#[derive(Default)]
struct Script {
    ops: Vec<ArrayOp>,
    pending_remove: usize,
    pending_insert: Vec<Value>,
}

impl Script {
    fn keep(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.flush();
        if let Some(ArrayOp::Keep(count)) = self.ops.last_mut() {
            *count += n;
        } else {
            self.ops.push(ArrayOp::Keep(n));
        }
    }

    fn edit(&mut self, diff: Diff) {
        self.flush();
        self.ops.push(ArrayOp::Edit(diff));
    }

    /// Emit a run of removals and insertions found between two keeps,
    /// pairing them up as nested edits where possible.
    fn replace_run(
        &mut self,
        removed: &[usize],
        inserted: &[usize],
        target: &[Value],
        source: &[Value],
    ) {
        let paired = removed.len().min(inserted.len());
        for k in 0..paired {
            let old = &source[removed[k]];
            let new = &target[inserted[k]];
            if same_container(new, old) {
                self.edit(diff_values(new, old));
            } else {
                self.pending_remove += 1;
                self.pending_insert.push(new.clone());
            }
        }
        self.pending_remove += removed.len() - paired;
        self.pending_insert
            .extend(inserted[paired..].iter().map(|&at| target[at].clone()));
    }

    fn flush(&mut self) {
        if self.pending_remove > 0 {
            self.ops.push(ArrayOp::Remove(self.pending_remove));
            self.pending_remove = 0;
        }
        if !self.pending_insert.is_empty() {
            self.ops
                .push(ArrayOp::Insert(std::mem::take(&mut self.pending_insert)));
        }
    }

    fn finish(mut self) -> Vec<ArrayOp> {
        self.flush();
        self.ops
    }
}

pub(crate) fn patch_array(source: &[Value], ops: &[ArrayOp]) -> Result<Vec<Value>, DiffError> {
    let mut patched = Vec::with_capacity(source.len());
    let mut cursor = 0usize;

    for op in ops {
        match op {
            ArrayOp::Keep(n) => {
                let end = consume(source, cursor, *n, "keep")?;
                patched.extend_from_slice(&source[cursor..end]);
                cursor = end;
            }
            ArrayOp::Remove(n) => {
                cursor = consume(source, cursor, *n, "remove")?;
            }
            ArrayOp::Insert(values) => patched.extend(values.iter().cloned()),
            ArrayOp::Edit(diff) => {
                let end = consume(source, cursor, 1, "edit")?;
                patched.push(patch_value(&source[cursor], diff)?);
                cursor = end;
            }
        }
    }

    if cursor != source.len() {
        return Err(DiffError::Mismatch(format!(
            "array script consumed {} of {} elements",
            cursor,
            source.len()
        )));
    }

    Ok(patched)
}

fn consume(source: &[Value], cursor: usize, n: usize, op: &str) -> Result<usize, DiffError> {
    cursor
        .checked_add(n)
        .filter(|&end| end <= source.len())
        .ok_or_else(|| {
            DiffError::Mismatch(format!(
                "{} of {} element(s) at index {} runs past array of length {}",
                op,
                n,
                cursor,
                source.len()
            ))
        })
}
