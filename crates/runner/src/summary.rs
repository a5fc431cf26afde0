use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use kb_protocol::ChildStatus;

use crate::client::Uploaded;

/// Terminal-latency stats over all resources that reached a terminal state.
#[derive(Debug, Serialize)]
pub struct Timings {
    pub avg_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct ExtensionTally {
    pub indexed: usize,
    pub error: usize,
}

#[derive(Debug, Serialize)]
pub struct FailureDetail {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Machine-readable outcome of one smoke run.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub uploaded: usize,
    pub indexed_count: usize,
    pub error_count: usize,
    pub timings: Timings,
    pub per_extension: BTreeMap<String, ExtensionTally>,
    pub failures: Vec<FailureDetail>,
}

/// p-th percentile with linear interpolation, p in [0,1].
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let k = (sorted.len() - 1) as f64 * p;
    let f = k.floor() as usize;
    let c = (f + 1).min(sorted.len() - 1);
    if f == c {
        return sorted[f];
    }
    sorted[f] * (c as f64 - k) + sorted[c] * (k - f as f64)
}

/// Fold final poll results into a [`Summary`] and a process exit code.
///
/// Exit code is 0 when every upload reached a terminal state and at least
/// one was indexed; a deterministic `error` outcome is a valid pipeline
/// result, a timeout is not.
pub fn summarize(
    uploaded: &[Uploaded],
    last_items: &[ChildStatus],
    terminal_at: &HashMap<String, i64>,
) -> (Summary, i32) {
    let items_by_id: HashMap<&str, &ChildStatus> = last_items
        .iter()
        .map(|it| (it.resource_id.as_str(), it))
        .collect();

    let mut durations_ms: Vec<f64> = Vec::new();
    let mut indexed_count = 0;
    let mut error_count = 0;
    let mut per_extension: BTreeMap<String, ExtensionTally> = BTreeMap::new();
    let mut failures = Vec::new();

    for up in uploaded {
        let ext = kb_lifecycle::extension(&up.path).unwrap_or_default();
        let tally = per_extension.entry(ext).or_default();

        if let Some(term_ms) = terminal_at.get(&up.token) {
            durations_ms.push((term_ms - up.created_at_ms) as f64);
        }

        let item = items_by_id.get(up.token.as_str());
        let status = item.map(|it| it.status);
        match status {
            Some(kb_lifecycle::LifecycleStatus::Indexed) => {
                indexed_count += 1;
                tally.indexed += 1;
            }
            Some(kb_lifecycle::LifecycleStatus::Error) => {
                error_count += 1;
                tally.error += 1;
                failures.push(FailureDetail {
                    path: up.path.clone(),
                    error_code: item.and_then(|it| it.error_code.clone()),
                    error_message: item.and_then(|it| it.error_message.clone()),
                });
            }
            _ => failures.push(FailureDetail {
                path: up.path.clone(),
                error_code: Some("timeout".to_string()),
                error_message: Some("not terminal".to_string()),
            }),
        }
    }

    let avg_ms = if durations_ms.is_empty() {
        0.0
    } else {
        durations_ms.iter().sum::<f64>() / durations_ms.len() as f64
    };
    let summary = Summary {
        uploaded: uploaded.len(),
        indexed_count,
        error_count,
        timings: Timings {
            avg_ms,
            p95_ms: percentile(&durations_ms, 0.95),
            max_ms: durations_ms.iter().copied().fold(0.0, f64::max),
        },
        per_extension,
        failures,
    };
    let all_terminal = indexed_count + error_count == uploaded.len();
    let exit_code = if all_terminal && indexed_count > 0 { 0 } else { 1 };
    (summary, exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kb_lifecycle::LifecycleStatus;
    use pretty_assertions::assert_eq;

    fn item(id: &str, status: LifecycleStatus, code: Option<&str>) -> ChildStatus {
        ChildStatus {
            resource_id: id.to_string(),
            resource_path: format!("{id}.txt"),
            status,
            updated_at: 0,
            error_code: code.map(str::to_string),
            error_message: code.map(|_| "boom".to_string()),
        }
    }

    fn up(token: &str, path: &str, created: i64) -> Uploaded {
        Uploaded {
            token: token.to_string(),
            path: path.to_string(),
            created_at_ms: created,
        }
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&values, 0.0), 10.0);
        assert_eq!(percentile(&values, 1.0), 40.0);
        assert_eq!(percentile(&values, 0.5), 25.0);
        assert_eq!(percentile(&[], 0.95), 0.0);
        assert_eq!(percentile(&[7.0], 0.95), 7.0);
    }

    #[test]
    fn all_indexed_exits_zero() {
        let uploaded = vec![up("t1", "a/one.txt", 100), up("t2", "b/two.md", 100)];
        let items = vec![
            item("t1", LifecycleStatus::Indexed, None),
            item("t2", LifecycleStatus::Indexed, None),
        ];
        let terminal_at = HashMap::from([("t1".to_string(), 1_300), ("t2".to_string(), 1_500)]);

        let (summary, code) = summarize(&uploaded, &items, &terminal_at);
        assert_eq!(code, 0);
        assert_eq!(summary.indexed_count, 2);
        assert_eq!(summary.error_count, 0);
        assert_eq!(summary.timings.max_ms, 1_400.0);
        assert_eq!(summary.per_extension["txt"].indexed, 1);
        assert_eq!(summary.per_extension["md"].indexed, 1);
    }

    #[test]
    fn terminal_errors_still_exit_zero() {
        let uploaded = vec![up("t1", "a/one.txt", 100), up("t2", "b/two.txt", 100)];
        let items = vec![
            item("t1", LifecycleStatus::Indexed, None),
            item("t2", LifecycleStatus::Error, None),
        ];
        let terminal_at = HashMap::from([("t1".to_string(), 1_300), ("t2".to_string(), 1_200)]);

        let (summary, code) = summarize(&uploaded, &items, &terminal_at);
        assert_eq!(code, 0, "deterministic error outcomes are valid results");
        assert_eq!(summary.error_count, 1);
    }

    #[test]
    fn timeouts_exit_nonzero() {
        let uploaded = vec![up("t1", "a/one.txt", 100), up("t2", "b/two.txt", 100)];
        let items = vec![item("t1", LifecycleStatus::Error, Some("kb_mismatch"))];
        let terminal_at = HashMap::from([("t1".to_string(), 1_300)]);

        let (summary, code) = summarize(&uploaded, &items, &terminal_at);
        assert_eq!(code, 1);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].error_code.as_deref(), Some("kb_mismatch"));
        assert_eq!(summary.failures[1].error_code.as_deref(), Some("timeout"));
    }

    #[test]
    fn empty_run_is_a_failure() {
        let (_, code) = summarize(&[], &[], &HashMap::new());
        assert_eq!(code, 1);
    }
}
