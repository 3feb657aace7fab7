//! Post-selection resolution: turning a committed selection into a fully
//! specified operation (which manage action, which exact install target).

use anyhow::Result;

use crate::catalog::CatalogClient;
use crate::error::FlowError;
use crate::model::{ManageAction, Selection};
use crate::prompt;
use crate::theme::Theme;

/// Ensure the selection carries a manage action from the approved set.
/// A shortcut-committed selection already has one; a plain-enter commit
/// gets one here, without a menu when only one action is approved.
pub fn resolve_manage_action(selection: &Selection, theme: &Theme) -> Result<ManageAction> {
    resolve_with(&selection.approved_actions, selection.manage_action, || {
        let options: Vec<(String, ManageAction)> = selection
            .approved_actions
            .iter()
            .map(|a| (a.label().to_string(), *a))
            .collect();
        prompt::select_one("What would you like to do?", &options, theme)
    })
}

fn resolve_with(
    approved: &[ManageAction],
    current: Option<ManageAction>,
    pick: impl FnOnce() -> Result<ManageAction>,
) -> Result<ManageAction> {
    if let Some(action) = current {
        if approved.contains(&action) {
            return Ok(action);
        }
    }
    match approved {
        [] => Err(FlowError::NoApprovedActions.into()),
        [only] => Ok(*only),
        _ => {
            let picked = pick()?;
            if approved.contains(&picked) {
                Ok(picked)
            } else {
                Err(FlowError::NoApprovedActions.into())
            }
        }
    }
}

/// Resolve a catalog model into the exact `name:tag` to pull. Fetches the
/// model's tag page, then asks for a tag plus confirmation in one form.
pub fn resolve_install_target(
    catalog: &CatalogClient,
    name: &str,
    theme: &Theme,
) -> Result<String> {
    let fetch_catalog = catalog.clone();
    let fetch_name = name.to_string();
    let tags = prompt::run_with_spinner(&format!("Fetching tags for {name}..."), move || {
        fetch_catalog.fetch_tags(&fetch_name)
    })??;

    resolve_target_with(name, &tags, |tags| {
        prompt::select_with_confirm(&format!("Choose a tag for {name}"), tags, theme)
    })
}

/// No tags is an error before any prompt; a declined confirmation produces
/// no target at all, so nothing downstream can start a pull.
fn resolve_target_with(
    name: &str,
    tags: &[String],
    pick: impl FnOnce(&[String]) -> Result<Option<String>>,
) -> Result<String> {
    if tags.is_empty() {
        return Err(FlowError::NoTags(name.to_string()).into());
    }
    let tag = pick(tags)?.ok_or(FlowError::Declined)?;
    Ok(format!("{name}:{tag}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::flow_error;

    #[test]
    fn committed_approved_action_is_kept() {
        let got = resolve_with(
            &[ManageAction::Update, ManageAction::Delete],
            Some(ManageAction::Delete),
            || panic!("should not prompt"),
        )
        .unwrap();
        assert_eq!(got, ManageAction::Delete);
    }

    #[test]
    fn single_approved_action_assigns_silently() {
        let got = resolve_with(&[ManageAction::Chat], None, || panic!("should not prompt"))
            .unwrap();
        assert_eq!(got, ManageAction::Chat);
    }

    #[test]
    fn empty_approved_set_is_an_error() {
        let err = resolve_with(&[], None, || panic!("should not prompt")).unwrap_err();
        assert!(matches!(
            flow_error(&err),
            Some(FlowError::NoApprovedActions)
        ));
    }

    #[test]
    fn multiple_approved_actions_prompt() {
        let got = resolve_with(
            &[ManageAction::Update, ManageAction::Delete],
            None,
            || Ok(ManageAction::Update),
        )
        .unwrap();
        assert_eq!(got, ManageAction::Update);
    }

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn declined_confirmation_yields_no_install_target() {
        let err = resolve_target_with("llama3", &tags(&["latest", "8b"]), |_| Ok(None))
            .unwrap_err();
        assert!(matches!(flow_error(&err), Some(FlowError::Declined)));
    }

    #[test]
    fn confirmed_tag_builds_the_full_target() {
        let got = resolve_target_with("llama3", &tags(&["latest", "8b"]), |t| {
            Ok(Some(t[1].clone()))
        })
        .unwrap();
        assert_eq!(got, "llama3:8b");
    }

    #[test]
    fn missing_tags_error_without_prompting() {
        let err = resolve_target_with("llama3", &[], |_| panic!("should not prompt"))
            .unwrap_err();
        assert!(matches!(flow_error(&err), Some(FlowError::NoTags(n)) if n == "llama3"));
    }

    #[test]
    fn resolved_action_is_always_approved() {
        let sets: &[&[ManageAction]] = &[
            &[ManageAction::Update],
            &[ManageAction::Update, ManageAction::Chat],
            &[ManageAction::Update, ManageAction::Delete, ManageAction::Chat],
        ];
        for approved in sets {
            let got = resolve_with(approved, None, || Ok(approved[approved.len() - 1])).unwrap();
            assert!(approved.contains(&got));
        }
    }
}
