//! Windows icon extraction
//!
//! Targets are classified first (CLSID virtual paths, UWP package IDs,
//! plain shell AppIDs, exe/lnk/generic files), then each class runs its
//! own chain of PowerShell-backed strategies. Extraction scripts return
//! base64 PNG bytes; any script failure or timeout is a failed strategy,
//! never an error.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::DynamicImage;
use regex::Regex;
use std::sync::LazyLock;

use crate::common::image as img;
use crate::common::powershell::{escape_ps, run_powershell};
use crate::common::win_app_id::{is_uwp_app_id, parse_app_user_model_id};
use crate::profile::KeyConfig;

static CLSID_EXE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\{[0-9A-Fa-f-]+\})\\(.+\.exe)$").unwrap());

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%([^%]+)%").unwrap());

/// Known shell folder GUIDs that show up as CLSID-prefixed virtual paths,
/// mapped to their real base directories (environment-variable form).
const CLSID_FOLDERS: &[(&str, &str)] = &[
    ("{1AC14E77-02E7-4E5D-B744-2EB1AE5198B7}", "%SystemRoot%\\System32"),
    ("{D65231B0-B2F1-4857-A4CE-A8E7C6EA7D27}", "%SystemRoot%\\SysWOW64"),
    ("{6D809377-6AF0-444B-8957-A3773F02200E}", "%ProgramFiles%"),
    ("{7C5A40EF-A0FB-4BFC-874A-C0F2E0B9FA8E}", "%ProgramFiles(x86)%"),
    ("{905E63B6-C1BF-494E-B29C-65B732D3D21A}", "%ProgramFiles%"),
    ("{F7F1ED05-9F6D-47A2-AAAE-29D317C6F066}", "%ProgramFiles%\\Common Files"),
];

/// Expand `%VAR%` references; unknown variables are left intact.
pub(crate) fn expand_env_vars(path: &str) -> String {
    ENV_VAR
        .replace_all(path, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| format!("%{}%", &caps[1]))
        })
        .into_owned()
}

/// Resolve a CLSID-based exe reference (e.g. `{1AC14E77-...}\magnify.exe`)
/// to the real filesystem path, if the GUID is a known folder.
pub(crate) fn parse_clsid_exe_path(app_id: &str) -> Option<String> {
    let caps = CLSID_EXE_PATH.captures(app_id)?;
    let clsid = caps[1].to_uppercase();
    let relative = &caps[2];

    let base = CLSID_FOLDERS
        .iter()
        .find(|(guid, _)| *guid == clsid)
        .map(|(_, base)| *base)?;

    Some(expand_env_vars(&format!("{base}\\{relative}")))
}

/// How a target should be approached for icon purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IconSource {
    ClsidExe(String),
    UwpApp { app_id: String, fallback: String },
    ShellApp { app_id: String, fallback: String },
    ExeFile(String),
    LnkFile(String),
    GenericFile(String),
    None,
}

pub(crate) fn identify_icon_source(key: &KeyConfig) -> IconSource {
    let target = key.icon_target().to_string();
    let app_id = parse_app_user_model_id(&key.file_path)
        .or_else(|| parse_app_user_model_id(key.arguments.as_deref().unwrap_or("")));

    if let Some(app_id) = app_id {
        if let Some(exe_path) = parse_clsid_exe_path(&app_id) {
            return IconSource::ClsidExe(exe_path);
        }
        if is_uwp_app_id(&app_id) {
            return IconSource::UwpApp { app_id, fallback: target };
        }
        return IconSource::ShellApp { app_id, fallback: target };
    }

    if target.is_empty() {
        return IconSource::None;
    }

    let lower = target.to_lowercase();
    if lower.ends_with(".exe") {
        IconSource::ExeFile(target)
    } else if lower.ends_with(".lnk") {
        IconSource::LnkFile(target)
    } else {
        IconSource::GenericFile(target)
    }
}

pub async fn extract(key: &KeyConfig) -> Option<DynamicImage> {
    match identify_icon_source(key) {
        IconSource::ClsidExe(path) => match extract_exe_icon(&path).await {
            Some(icon) => Some(icon),
            None => system_icon(&path).await,
        },
        IconSource::UwpApp { app_id, fallback } => match extract_uwp_icon(&app_id).await {
            Some(icon) => Some(icon),
            None => system_icon(&fallback).await,
        },
        IconSource::ShellApp { app_id, fallback } => {
            match extract_shell_app_icon(&app_id).await {
                Some(icon) => Some(icon),
                None => system_icon(&fallback).await,
            }
        }
        IconSource::ExeFile(path) => match extract_exe_icon(&path).await {
            Some(icon) => Some(icon),
            None => system_icon(&path).await,
        },
        IconSource::LnkFile(path) => match extract_lnk_icon(&path).await {
            Some(icon) => Some(icon),
            None => system_icon(&path).await,
        },
        IconSource::GenericFile(path) => system_icon(&path).await,
        IconSource::None => None,
    }
}

/// Run a script whose stdout is base64 PNG data and decode it.
async fn powershell_icon(script: &str) -> Option<DynamicImage> {
    let base64_data = run_powershell(script).await?;
    let bytes = BASE64.decode(base64_data.as_bytes()).ok()?;
    img::decode(&bytes)
}

const PS_EXTRACT_ASSOCIATED_ICON: &str = r#"
Add-Type -AssemblyName System.Drawing
$icon = [System.Drawing.Icon]::ExtractAssociatedIcon($targetPath)
if ($icon) {
  $bitmap = $icon.ToBitmap()
  $ms = New-Object System.IO.MemoryStream
  $bitmap.Save($ms, [System.Drawing.Imaging.ImageFormat]::Png)
  [Convert]::ToBase64String($ms.ToArray())
  $ms.Close(); $bitmap.Dispose(); $icon.Dispose()
}"#;

async fn extract_exe_icon(path: &str) -> Option<DynamicImage> {
    let script = format!(
        "$targetPath = '{}'\n{PS_EXTRACT_ASSOCIATED_ICON}",
        escape_ps(path)
    );
    powershell_icon(&script).await
}

/// The shell's associated icon doubles as the generic file icon.
async fn system_icon(path: &str) -> Option<DynamicImage> {
    if path.is_empty() {
        return None;
    }
    extract_exe_icon(path).await
}

async fn extract_lnk_icon(lnk_path: &str) -> Option<DynamicImage> {
    let script = format!(
        r#"
$ErrorActionPreference = 'Stop'
$wsh = New-Object -ComObject WScript.Shell
$lnk = $wsh.CreateShortcut('{}')
$targetPath = $lnk.TargetPath

if (-not $targetPath -or -not (Test-Path $targetPath)) {{ exit 1 }}
{PS_EXTRACT_ASSOCIATED_ICON}"#,
        escape_ps(lnk_path)
    );
    powershell_icon(&script).await
}

/// Locate a UWP package's logo asset: parse the AppxManifest for the
/// square logo, try the scale-suffixed variants, then fall back to the
/// largest Logo/Icon PNG under Assets.
async fn extract_uwp_icon(app_user_model_id: &str) -> Option<DynamicImage> {
    let package_family = app_user_model_id.split('!').next()?;
    if package_family.is_empty() {
        return None;
    }

    let script = format!(
        r#"
$ErrorActionPreference = 'Stop'
$pkg = Get-AppxPackage | Where-Object {{ $_.PackageFamilyName -eq '{}' }} | Select-Object -First 1
if (-not $pkg) {{ exit 1 }}

$manifestPath = Join-Path $pkg.InstallLocation 'AppxManifest.xml'
if (-not (Test-Path $manifestPath)) {{ exit 1 }}

[xml]$manifest = Get-Content $manifestPath
$app = $manifest.Package.Applications.Application | Select-Object -First 1
$logoPath = $app.VisualElements.Square44x44Logo
if (-not $logoPath) {{ $logoPath = $app.VisualElements.Square150x150Logo }}
if (-not $logoPath) {{ exit 1 }}

$logoDir = Join-Path $pkg.InstallLocation (Split-Path $logoPath)
$baseName = [IO.Path]::GetFileNameWithoutExtension($logoPath)
$ext = [IO.Path]::GetExtension($logoPath)

$actualPath = @('.scale-200','.scale-150','.scale-125','.scale-100','') | ForEach-Object {{
  $p = Join-Path $logoDir "$baseName$_$ext"
  if (Test-Path $p) {{ $p }}
}} | Select-Object -First 1

if (-not $actualPath) {{
  $assetsDir = Join-Path $pkg.InstallLocation 'Assets'
  if (Test-Path $assetsDir) {{
    $actualPath = Get-ChildItem $assetsDir -Filter '*.png' |
      Where-Object {{ $_.Name -match 'Logo|Icon' }} |
      Sort-Object Length -Descending |
      Select-Object -First 1 -ExpandProperty FullName
  }}
}}

if (-not $actualPath -or -not (Test-Path $actualPath)) {{ exit 1 }}
[Convert]::ToBase64String([IO.File]::ReadAllBytes($actualPath))"#,
        escape_ps(package_family)
    );

    powershell_icon(&script).await
}

/// Resolve a Win32 shell AppID to a real executable: Start Menu shortcuts
/// by app-name match first, then common install directories, skipping
/// uninstallers, updaters and crash handlers. The name match is a loose
/// substring on purpose; tightening it regresses legitimately ambiguous
/// app names.
async fn find_shell_app_exe(app_user_model_id: &str) -> Option<String> {
    let script = format!(
        r#"
$ErrorActionPreference = 'SilentlyContinue'
$appId = '{}'

$shell = New-Object -ComObject Shell.Application
$app = $shell.NameSpace('shell:AppsFolder').Items() |
  Where-Object {{ $_.Path -eq $appId }} |
  Select-Object -First 1

$appName = if ($app) {{ $app.Name }} else {{ $appId.Split('.')[-1] }}
$searchNames = @($appName, $appId.Split('.')[-1]) | Select-Object -Unique

$wsh = New-Object -ComObject WScript.Shell
$smUser = [Environment]::GetFolderPath('StartMenu') + '\Programs'
$smCommon = [Environment]::GetFolderPath('CommonStartMenu') + '\Programs'
@($smUser, $smCommon) | Where-Object {{ Test-Path $_ }} | ForEach-Object {{
  $lnks = Get-ChildItem $_ -Filter '*.lnk' -Recurse -ErrorAction SilentlyContinue
  foreach ($lnk in $lnks) {{
    foreach ($name in $searchNames) {{
      if ($lnk.BaseName -eq $name -or $lnk.BaseName -like "*$name*") {{
        $target = $wsh.CreateShortcut($lnk.FullName).TargetPath
        if ($target -and (Test-Path $target)) {{
          Write-Output $target; exit 0
        }}
      }}
    }}
  }}
}}

$x86 = [Environment]::GetEnvironmentVariable('ProgramFiles(x86)')
$localPrograms = Join-Path $env:LOCALAPPDATA 'Programs'
@($localPrograms, $env:LOCALAPPDATA, $env:APPDATA, $env:ProgramFiles, $x86) |
  Where-Object {{ $_ }} | ForEach-Object {{
    foreach ($name in $searchNames) {{
      $subDir = Join-Path $_ $name
      if (Test-Path $subDir) {{
        $exe = Get-ChildItem $subDir -Filter '*.exe' -Recurse -ErrorAction SilentlyContinue |
          Where-Object {{ $_.Name -notmatch 'unins|update|crash' }} |
          Select-Object -First 1
        if ($exe) {{ Write-Output $exe.FullName; exit 0 }}
      }}
    }}
  }}
exit 1"#,
        escape_ps(app_user_model_id)
    );

    run_powershell(&script).await
}

async fn extract_shell_app_icon(app_user_model_id: &str) -> Option<DynamicImage> {
    let exe_path = find_shell_app_exe(app_user_model_id).await?;

    // Direct extraction for real executables; associated icon covers the
    // rest (.msc and friends).
    if exe_path.to_lowercase().ends_with(".exe") {
        extract_exe_icon(&exe_path).await
    } else {
        system_icon(&exe_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn key_with_path(file_path: &str) -> KeyConfig {
        KeyConfig {
            file_path: file_path.to_string(),
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn clsid_path_resolves_known_folder() {
        unsafe { std::env::set_var("SystemRoot", "C:\\Windows") };
        let resolved =
            parse_clsid_exe_path("{1AC14E77-02E7-4E5D-B744-2EB1AE5198B7}\\magnify.exe").unwrap();
        assert_eq!(resolved, "C:\\Windows\\System32\\magnify.exe");
    }

    #[test]
    fn clsid_path_rejects_unknown_guid_and_non_exe() {
        assert!(parse_clsid_exe_path("{00000000-0000-0000-0000-000000000000}\\foo.exe").is_none());
        assert!(
            parse_clsid_exe_path("{1AC14E77-02E7-4E5D-B744-2EB1AE5198B7}\\readme.txt").is_none()
        );
    }

    #[test]
    #[serial]
    fn env_expansion_leaves_unknown_vars() {
        unsafe { std::env::remove_var("GRIDKEY_NO_SUCH_VAR") };
        assert_eq!(
            expand_env_vars("%GRIDKEY_NO_SUCH_VAR%\\x"),
            "%GRIDKEY_NO_SUCH_VAR%\\x"
        );
    }

    #[test]
    fn identifies_uwp_and_shell_sources() {
        let uwp = key_with_path("shell:AppsFolder\\Pkg_8wekyb3d8bbwe!App");
        assert!(matches!(
            identify_icon_source(&uwp),
            IconSource::UwpApp { .. }
        ));

        let shell = key_with_path("shell:AppsFolder\\Company.Tool");
        assert!(matches!(
            identify_icon_source(&shell),
            IconSource::ShellApp { .. }
        ));
    }

    #[test]
    fn app_id_in_arguments_is_considered() {
        let mut key = key_with_path("C:\\Windows\\explorer.exe");
        key.arguments = Some("shell:AppsFolder\\Pkg_8wekyb3d8bbwe!App".to_string());
        assert!(matches!(
            identify_icon_source(&key),
            IconSource::UwpApp { .. }
        ));
    }

    #[test]
    fn identifies_plain_files_by_extension() {
        assert!(matches!(
            identify_icon_source(&key_with_path("C:\\Tools\\App.EXE")),
            IconSource::ExeFile(_)
        ));
        assert!(matches!(
            identify_icon_source(&key_with_path("C:\\Users\\me\\Desktop\\app.lnk")),
            IconSource::LnkFile(_)
        ));
        assert!(matches!(
            identify_icon_source(&key_with_path("C:\\docs\\report.pdf")),
            IconSource::GenericFile(_)
        ));
        assert!(matches!(
            identify_icon_source(&key_with_path("")),
            IconSource::None
        ));
    }

    #[test]
    fn icon_path_override_takes_precedence_for_files() {
        let mut key = key_with_path("C:\\docs\\report.pdf");
        key.icon_path = Some("C:\\Tools\\App.exe".to_string());
        assert!(matches!(
            identify_icon_source(&key),
            IconSource::ExeFile(_)
        ));
    }
}
