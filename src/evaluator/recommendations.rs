//! Canned recommendations per issue type.

use std::collections::HashSet;

use super::types::{Category, Issue, IssueType, Priority, Recommendation};

fn recommendation(
    priority: Priority,
    category: Category,
    title: &str,
    message: &str,
    actions: &[&str],
    references: &[&str],
) -> Recommendation {
    Recommendation {
        priority,
        category,
        title: title.to_string(),
        message: message.to_string(),
        actions: actions.iter().map(ToString::to_string).collect(),
        references: references.iter().map(ToString::to_string).collect(),
    }
}

/// The recommendation attached to an issue type.
#[must_use]
pub fn for_issue(issue_type: IssueType) -> Recommendation {
    match issue_type {
        IssueType::LowAvailability => recommendation(
            Priority::High,
            Category::Scaling,
            "Improve system availability",
            "Current availability does not meet production requirements.",
            &[
                "Check service health and find the cause of frequent failures",
                "Add instances for a highly available deployment",
                "Configure health checks and automatic restarts",
                "Introduce circuit breaking and graceful degradation",
            ],
            &[
                "https://redis.io/topics/sentinel",
                "https://kafka.apache.org/documentation/#replication",
            ],
        ),
        IssueType::HighP95Latency | IssueType::HighP99Latency => recommendation(
            Priority::Medium,
            Category::Optimization,
            "Optimize response latency",
            "Latency is outside the acceptable range.",
            &[
                "Analyze the slow log and optimize hot operations",
                "Check network latency and bandwidth bottlenecks",
                "Optimize data structures and access patterns",
                "Consider a cache layer or read/write splitting",
                "Verify that hardware resources are sufficient",
            ],
            &[],
        ),
        IssueType::HighErrorRate => recommendation(
            Priority::High,
            Category::Configuration,
            "Reduce error rate",
            "A high error rate can interrupt dependent services.",
            &[
                "Review error logs and break errors down by type",
                "Check client configuration (timeouts, retries)",
                "Verify server-side configuration",
                "Add error handling and retry logic",
            ],
            &[],
        ),
        IssueType::DataLossDetected => recommendation(
            Priority::High,
            Category::Configuration,
            "Prevent data loss",
            "Data loss was detected and needs immediate attention.",
            &[
                "Check persistence configuration",
                "Ensure a sufficient replica count",
                "Configure an fsync policy",
                "Add data verification",
            ],
            &[],
        ),
        IssueType::SlowRecovery => recommendation(
            Priority::Medium,
            Category::Optimization,
            "Speed up failure recovery",
            "Mean time to recovery is long enough to hurt availability.",
            &[
                "Tune health check frequency and timeouts",
                "Use a more aggressive retry policy",
                "Add a standby connection pool",
                "Improve failure detection",
            ],
            &[],
        ),
        IssueType::LowReconnectRate => recommendation(
            Priority::Medium,
            Category::Configuration,
            "Improve reconnect success rate",
            "Reconnects fail too often, which hurts stability.",
            &[
                "Check network stability",
                "Adjust reconnect interval and maximum attempts",
                "Use exponential backoff",
                "Check server-side connection limits",
            ],
            &[],
        ),
        IssueType::HighMessageLag => recommendation(
            Priority::Medium,
            Category::Scaling,
            "Reduce consumer lag",
            "Consumers are not keeping up with producers.",
            &[
                "Add consumers to the consumer group",
                "Increase partition count to allow more parallelism",
                "Profile per-message processing time",
            ],
            &[],
        ),
    }
}

/// Recommendation for a key-value backend whose hit rate is low.
#[must_use]
pub fn cache_hit_rate(hit_rate: f64) -> Recommendation {
    Recommendation {
        priority: Priority::Medium,
        category: Category::Optimization,
        title: "Improve cache hit rate".to_string(),
        message: format!("Current hit rate {:.2}% is low.", hit_rate * 100.0),
        actions: vec![
            "Analyze key access patterns".to_string(),
            "Adjust the expiration policy".to_string(),
            "Consider increasing cache capacity".to_string(),
        ],
        references: Vec::new(),
    }
}

/// One recommendation per issue, ordered by priority and deduplicated.
#[must_use]
pub fn synthesize(issues: &[Issue]) -> Vec<Recommendation> {
    finalize(issues.iter().map(|issue| for_issue(issue.issue_type)).collect())
}

/// Stable sort by descending priority, then keep the first of each title.
#[must_use]
pub fn finalize(mut recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    let mut seen = HashSet::new();
    recommendations.retain(|rec| seen.insert(rec.title.clone()));
    recommendations
}
