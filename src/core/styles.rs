//! Visual style of the status badge for each terminal status.

use super::models::JobStatus;

const BADGE_SIZE: &str = "width:10em; height:2em;";
const DEAD_STYLE: &str = "width:10em; height:2em; background: rgba(230, 110, 30, 1);";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub class: &'static str,
    pub style: &'static str,
}

/// Returns the badge style for a terminal status, or `None` when the status
/// is not one the page knows how to render.
pub fn status_style(status: &JobStatus) -> Option<StatusStyle> {
    let style = match status {
        JobStatus::Ok => StatusStyle {
            class: "label label-success",
            style: BADGE_SIZE,
        },
        JobStatus::Skipped => StatusStyle {
            class: "label label-default",
            style: BADGE_SIZE,
        },
        JobStatus::Error => StatusStyle {
            class: "label label-danger",
            style: BADGE_SIZE,
        },
        JobStatus::Dead => StatusStyle {
            class: "label label-warning",
            style: DEAD_STYLE,
        },
        JobStatus::Other(_) => return None,
    };

    Some(style)
}
