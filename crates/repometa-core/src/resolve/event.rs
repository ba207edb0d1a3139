//! Event Classifier

use super::refs::ParsedRef;
use crate::types::{EventInfo, EventName};

/// Derives `event.name` and the category flags from raw event fields.
///
/// Rules apply in priority order; the first match wins:
/// schedule, workflow_dispatch, pull request, release, tag push, branch push.
/// Events outside that set fall through to the ref-based rules.
pub struct EventClassifier;

impl EventClassifier {
    /// Classify one invocation
    pub fn classify(event_name: &str, parsed: &ParsedRef<'_>, action: Option<&str>) -> EventInfo {
        let mut info = EventInfo {
            name: EventName::Push,
            is_tag_push: false,
            is_branch_push: false,
            is_pull_request: false,
            is_release: false,
            is_schedule: false,
            is_workflow_dispatch: false,
            tag_push_event: false,
            trigger: event_name.to_string(),
            action: action.unwrap_or_default().to_string(),
        };

        match event_name {
            "schedule" => {
                info.name = EventName::Schedule;
                info.is_schedule = true;
            }
            "workflow_dispatch" => {
                info.name = EventName::WorkflowDispatch;
                info.is_workflow_dispatch = true;
            }
            "pull_request" | "pull_request_target" => {
                info.name = EventName::PullRequest;
                info.is_pull_request = true;
            }
            _ if parsed.pull_number().is_some() => {
                info.name = EventName::PullRequest;
                info.is_pull_request = true;
            }
            "release" if is_published_release(action) => {
                info.name = EventName::Release;
                info.is_release = true;
            }
            _ => match parsed {
                ParsedRef::Tag(tag) => {
                    info.is_tag_push = true;
                    info.tag_push_event = is_version_tag(tag);
                }
                _ => info.is_branch_push = true,
            },
        }

        info
    }
}

/// Release actions that publish; an absent action counts as published.
/// Drafts, edits and deletions fall through to the ref rules.
fn is_published_release(action: Option<&str>) -> bool {
    matches!(action, None | Some("published" | "released" | "prereleased"))
}

/// Matches `v<digits>(.<digits>)*`, e.g. `v1`, `v1.2.3`
pub fn is_version_tag(tag: &str) -> bool {
    let Some(rest) = tag.strip_prefix('v') else {
        return false;
    };
    !rest.is_empty()
        && rest
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}
