//! Built-in Workloads
//!
//! Small closures shipped with the binary for comparing common costs:
//! building and dropping an error versus tiny heap allocations.

use std::hint::black_box;

use anyhow::{anyhow, bail, Result};

/// A named, built-in action
#[derive(Clone, Copy, Debug)]
pub struct Workload {
    /// Name used on the command line
    pub name: &'static str,
    /// One-line description for `--list`
    pub description: &'static str,
    /// The measured action
    pub action: fn(),
}

fn error_roundtrip() {
    let outcome: Result<()> = Err(anyhow!("kek"));
    if let Err(e) = black_box(outcome) {
        drop(black_box(e));
    }
}

fn vec_push() {
    let mut v = Vec::new();
    v.push(black_box(1));
    black_box(v);
}

fn string_format() {
    black_box(format!("{}", black_box(42)));
}

fn box_alloc() {
    black_box(Box::new(black_box(7u64)));
}

const WORKLOADS: &[Workload] = &[
    Workload {
        name: "error-roundtrip",
        description: "create an error value and discard it",
        action: error_roundtrip,
    },
    Workload {
        name: "vec-push",
        description: "allocate a vector and push one element",
        action: vec_push,
    },
    Workload {
        name: "string-format",
        description: "format an integer into a new string",
        action: string_format,
    },
    Workload {
        name: "box-alloc",
        description: "box a single integer",
        action: box_alloc,
    },
];

/// All built-in workloads, in default run order
pub fn all() -> &'static [Workload] {
    WORKLOADS
}

/// Resolve workload names, preserving the requested order.
///
/// An empty request selects every workload.
pub fn select(names: &[String]) -> Result<Vec<Workload>> {
    if names.is_empty() {
        return Ok(WORKLOADS.to_vec());
    }

    let mut selected: Vec<Workload> = Vec::with_capacity(names.len());
    for name in names {
        let Some(workload) = WORKLOADS.iter().find(|w| w.name == name) else {
            let available: Vec<_> = WORKLOADS.iter().map(|w| w.name).collect();
            bail!(
                "unknown workload '{name}' (available: {})",
                available.join(", ")
            );
        };
        if !selected.iter().any(|w| w.name == workload.name) {
            selected.push(*workload);
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique() {
        let names: HashSet<_> = all().iter().map(|w| w.name).collect();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn test_select_all_by_default() {
        assert_eq!(select(&[]).unwrap().len(), all().len());
    }

    #[test]
    fn test_select_preserves_order_and_dedups() {
        let picked = select(&["box-alloc".into(), "vec-push".into(), "box-alloc".into()]).unwrap();
        let names: Vec<_> = picked.iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["box-alloc", "vec-push"]);
    }

    #[test]
    fn test_unknown_workload() {
        let err = select(&["nope".into()]).unwrap_err().to_string();
        assert!(err.contains("unknown workload 'nope'"));
        assert!(err.contains("vec-push"));
    }

    #[test]
    fn test_actions_run() {
        for workload in all() {
            (workload.action)();
        }
    }
}
