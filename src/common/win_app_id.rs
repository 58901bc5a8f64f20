//! Windows AppUserModelId parsing, shared by icon resolution and launch
//! classification.

use std::sync::LazyLock;

static APP_USER_MODEL_ID: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?i)shell:AppsFolder\\(.+)$").unwrap());

/// Extract the AppUserModelId from a `shell:AppsFolder\...` string.
pub fn parse_app_user_model_id(path: &str) -> Option<String> {
    APP_USER_MODEL_ID.captures(path).map(|c| c[1].to_string())
}

/// UWP AppUserModelIds are `PackageFamilyName!AppId`; Win32 registrations
/// (`CompanyName.AppName` or `{CLSID}\xxx.exe`) have no `!`.
pub fn is_uwp_app_id(app_id: &str) -> bool {
    app_id.contains('!')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_app_user_model_id_case_insensitively() {
        assert_eq!(
            parse_app_user_model_id(
                "shell:AppsFolder\\Microsoft.WindowsCalculator_8wekyb3d8bbwe!App"
            ),
            Some("Microsoft.WindowsCalculator_8wekyb3d8bbwe!App".to_string())
        );
        assert_eq!(
            parse_app_user_model_id("SHELL:appsfolder\\Company.Tool"),
            Some("Company.Tool".to_string())
        );
        assert_eq!(parse_app_user_model_id("C:\\Tools\\app.exe"), None);
        assert_eq!(parse_app_user_model_id(""), None);
    }

    #[test]
    fn uwp_detection_by_bang() {
        assert!(is_uwp_app_id("Pkg_8wekyb3d8bbwe!App"));
        assert!(!is_uwp_app_id("Company.AppName"));
        assert!(!is_uwp_app_id("{1AC14E77-02E7-4E5D-B744-2EB1AE5198B7}\\magnify.exe"));
    }
}
