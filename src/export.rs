//! CSV and JSON serialization of study data for user-triggered export.
//! Pure string builders; writing the result anywhere is the caller's job.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::models::{Analytics, SessionRecord, Task};

fn csv_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| csv_cell(c))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn sessions_to_csv(sessions: &[SessionRecord]) -> String {
    if sessions.is_empty() {
        return "No data available".to_string();
    }

    let header = [
        "Session ID",
        "Start Time",
        "End Time",
        "Duration (min)",
        "Subject",
        "Preset",
        "Focused Time (min)",
        "Distracted Time (min)",
        "Focus Rate (%)",
        "Blink Count",
        "Face Detection Lost Count",
    ]
    .join(",");

    let mut lines = vec![header];
    for session in sessions {
        let duration_min = (session.total_seconds() as f64 / 60.0).round() as u32;
        let focused_min = (session.focused_seconds as f64 / 60.0).round() as u32;
        let distracted_min = (session.distracted_seconds as f64 / 60.0).round() as u32;
        let preset = session
            .preset
            .map(|p| format!("{p:?}").to_lowercase())
            .unwrap_or_else(|| "N/A".to_string());
        let end_time = session
            .end_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "In Progress".to_string());

        lines.push(csv_line(&[
            session.id.to_string(),
            session.start_time.to_rfc3339(),
            end_time,
            duration_min.to_string(),
            session.subject.clone(),
            preset,
            focused_min.to_string(),
            distracted_min.to_string(),
            session.focus_rate().to_string(),
            session.blink_count.to_string(),
            session.face_detection_lost.to_string(),
        ]));
    }

    lines.join("\n")
}

pub fn analytics_to_csv(analytics: &Analytics, exported_at: DateTime<Utc>) -> String {
    let rows: Vec<(&str, String)> = vec![
        ("Total Sessions", analytics.sessions.len().to_string()),
        (
            "Total Focused Minutes",
            analytics.total_focused_minutes.to_string(),
        ),
        (
            "Total Distraction Minutes",
            analytics.total_distraction_minutes.to_string(),
        ),
        (
            "Average Session Length (min)",
            analytics.average_session_length.to_string(),
        ),
        ("Focus Score (%)", analytics.focus_score.to_string()),
        ("Export Date", exported_at.to_rfc3339()),
    ];

    let mut lines = vec!["Metric,Value".to_string()];
    for (metric, value) in rows {
        lines.push(csv_line(&[metric.to_string(), value]));
    }
    lines.join("\n")
}

pub fn tasks_to_csv(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks available".to_string();
    }

    let header = [
        "Task ID",
        "Title",
        "Description",
        "Subject",
        "Priority",
        "Status",
        "Due Date",
        "Estimated Time (min)",
        "Created At",
        "Updated At",
    ]
    .join(",");

    let mut lines = vec![header];
    for task in tasks {
        lines.push(csv_line(&[
            task.id.clone(),
            task.title.clone(),
            task.description.clone().unwrap_or_default(),
            task.subject.clone().unwrap_or_default(),
            format!("{:?}", task.priority).to_lowercase(),
            if task.completed { "Completed" } else { "Active" }.to_string(),
            task.due_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "No due date".to_string()),
            task.estimated_minutes
                .map(|m| m.to_string())
                .unwrap_or_default(),
            task.created_at.to_rfc3339(),
            task.updated_at.to_rfc3339(),
        ]));
    }

    lines.join("\n")
}

/// All study data as one pretty-printed JSON document.
pub fn export_all_json(
    analytics: &Analytics,
    tasks: &[Task],
    exported_at: DateTime<Utc>,
) -> Result<String> {
    let document = json!({
        "exportedAt": exported_at.to_rfc3339(),
        "analytics": analytics,
        "sessions": analytics.sessions,
        "tasks": tasks,
    });
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActiveSession, Priority, SessionMeta, TaskInput};
    use chrono::TimeZone;

    fn sample_session() -> SessionRecord {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let mut session = ActiveSession::new(
            SessionMeta {
                subject: Some("Algebra".to_string()),
                ..SessionMeta::default()
            },
            start,
        );
        session.focused_seconds = 540;
        session.distracted_seconds = 60;
        session.blink_count = 42;
        session.finalize(start + chrono::Duration::seconds(600))
    }

    #[test]
    fn sessions_csv_has_header_and_rows() {
        let csv = sessions_to_csv(&[sample_session()]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Session ID,Start Time"));
        assert!(lines[1].contains("\"Algebra\""));
        assert!(lines[1].contains("\"90\"")); // focus rate
    }

    #[test]
    fn empty_exports_say_so() {
        assert_eq!(sessions_to_csv(&[]), "No data available");
        assert_eq!(tasks_to_csv(&[]), "No tasks available");
    }

    #[test]
    fn quotes_are_escaped() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let task = crate::models::Task::from_input(
            TaskInput {
                title: "review \"hard\" proofs".to_string(),
                description: None,
                subject: None,
                priority: Priority::High,
                due_date: None,
                estimated_minutes: None,
            },
            now,
        );
        let csv = tasks_to_csv(&[task]);
        assert!(csv.contains("\"review \"\"hard\"\" proofs\""));
    }

    #[test]
    fn json_export_includes_all_sections() {
        let mut analytics = Analytics::default();
        analytics.sessions.push(sample_session());
        let exported_at = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

        let doc = export_all_json(&analytics, &[], exported_at).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert!(parsed.get("analytics").is_some());
        assert_eq!(parsed["sessions"].as_array().unwrap().len(), 1);
        assert!(parsed["tasks"].as_array().unwrap().is_empty());
    }
}
