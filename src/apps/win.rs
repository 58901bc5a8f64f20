//! Windows application scan
//!
//! `Get-StartApps` lists everything pinned into the Start menu; only
//! packaged (UWP) entries are kept, since Win32 Start entries carry
//! shortcut AppIDs the launcher would have to re-resolve anyway. Each
//! AppID is wrapped into the `shell:AppsFolder` form the classifier and
//! icon extractor already understand.

use serde::Deserialize;
use std::time::Duration;

use super::InstalledApp;
use crate::common::powershell::run_powershell_with_timeout;
use crate::common::win_app_id::is_uwp_app_id;

// Cold Start-Apps enumeration can far outrun the icon-script deadline.
const LIST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct StartApp {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "AppID")]
    app_id: Option<String>,
}

pub async fn list_apps() -> Vec<InstalledApp> {
    let Some(stdout) =
        run_powershell_with_timeout("Get-StartApps | ConvertTo-Json -Compress", LIST_TIMEOUT).await
    else {
        return Vec::new();
    };
    parse_start_apps(&stdout)
}

/// A single Start entry serializes as a bare object, not a one-element
/// array.
pub(crate) fn parse_start_apps(json: &str) -> Vec<InstalledApp> {
    let apps: Vec<StartApp> = match serde_json::from_str::<Vec<StartApp>>(json) {
        Ok(list) => list,
        Err(_) => serde_json::from_str::<StartApp>(json)
            .map(|app| vec![app])
            .unwrap_or_default(),
    };

    apps.into_iter()
        .filter_map(|app| {
            let name = app.name.filter(|n| !n.is_empty())?;
            let app_id = app.app_id.filter(|id| is_uwp_app_id(id))?;
            Some(InstalledApp {
                label: name,
                file_path: format!("shell:AppsFolder\\{app_id}"),
            })
        })
        .collect()
}
