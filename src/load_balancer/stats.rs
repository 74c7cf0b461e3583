//! HAProxy `show stat` parsing.
//!
//! The runtime API answers `show stat` with a CSV document whose first line is
//! a `# `-prefixed header. Each proxy contributes one row per server plus an
//! aggregate `BACKEND` row (and a `FRONTEND` row for frontends).

use std::collections::HashMap;

use crate::load_balancer::backend::{BackendGroup, Server, RESPONSE_COUNTERS};
use crate::load_balancer::{BalancerError, BalancerResult};

const FRONTEND: &str = "FRONTEND";
const BACKEND: &str = "BACKEND";

struct Columns {
    pxname: usize,
    svname: usize,
    weight: usize,
    counters: Vec<(&'static str, usize)>,
}

impl Columns {
    fn from_header(line: &str) -> BalancerResult<Self> {
        let header = line
            .strip_prefix('#')
            .ok_or_else(|| BalancerError::Stats("missing '#' header line".to_string()))?;
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |col: &str| names.iter().position(|n| *n == col);
        let required = |col: &str| {
            find(col).ok_or_else(|| BalancerError::Stats(format!("missing column '{}'", col)))
        };

        Ok(Self {
            pxname: required("pxname")?,
            svname: required("svname")?,
            weight: required("weight")?,
            counters: RESPONSE_COUNTERS
                .iter()
                .filter_map(|c| find(c).map(|idx| (*c, idx)))
                .collect(),
        })
    }
}

fn field<'a>(row: &[&'a str], idx: usize) -> &'a str {
    row.get(idx).copied().unwrap_or("")
}

fn number(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}

/// Parse one process's `show stat` output into backend groups, in the order
/// they first appear.
pub fn parse_stats(output: &str) -> BalancerResult<Vec<BackendGroup>> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| BalancerError::Stats("empty output".to_string()))?;
    let columns = Columns::from_header(header)?;

    let mut groups: Vec<BackendGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in lines {
        let row: Vec<&str> = line.split(',').collect();
        let pxname = field(&row, columns.pxname);
        let svname = field(&row, columns.svname);
        if pxname.is_empty() || svname == FRONTEND {
            continue;
        }

        let slot = *index.entry(pxname.to_string()).or_insert_with(|| {
            groups.push(BackendGroup::new(pxname));
            groups.len() - 1
        });
        let group = &mut groups[slot];

        if svname == BACKEND {
            for (name, idx) in &columns.counters {
                group.counters.insert(name.to_string(), number(field(&row, *idx)));
            }
        } else {
            let weight = number(field(&row, columns.weight)) as u32;
            group.servers.push(Server::new(svname, weight));
        }
    }

    Ok(groups)
}

/// Merge per-process snapshots of the same balancer.
///
/// Counters are summed across processes; servers and weights come from the
/// first process that reports the group.
pub fn merge_processes(per_process: Vec<Vec<BackendGroup>>) -> Vec<BackendGroup> {
    let mut merged: Vec<BackendGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for groups in per_process {
        for group in groups {
            match index.get(&group.name) {
                Some(&slot) => {
                    let target = &mut merged[slot];
                    for (name, value) in group.counters {
                        *target.counters.entry(name).or_insert(0) += value;
                    }
                }
                None => {
                    index.insert(group.name.clone(), merged.len());
                    merged.push(group);
                }
            }
        }
    }

    merged
}
