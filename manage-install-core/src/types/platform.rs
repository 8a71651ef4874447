//! Android-side descriptors: SDK levels, request codes, intents

use std::fmt;
use std::ops::BitOr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `Build.VERSION.SDK_INT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SdkLevel(pub u32);

impl SdkLevel {
    /// Android 6.0
    pub const M: Self = Self(23);
    /// Android 7.0, first release with `FileProvider` content URIs for the installer
    pub const N: Self = Self(24);
    /// Android 8.0, introduces the per-source install permission
    pub const O: Self = Self(26);

    /// Packages must be copied to public storage before the installer can read them.
    pub fn requires_public_staging(self) -> bool {
        self <= Self::M
    }

    pub fn supports_content_uris(self) -> bool {
        self >= Self::N
    }

    /// `REQUEST_INSTALL_PACKAGES` is granted per source app.
    pub fn has_install_permission(self) -> bool {
        self >= Self::O
    }
}

impl fmt::Display for SdkLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API {}", self.0)
    }
}

/// Request code tying an activity result to the launch that caused it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(pub i32);

impl CorrelationToken {
    /// Shared by the permission request and the installer launch.
    pub const PERMISSION_OR_INSTALL: Self = Self(1024);
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::PERMISSION_OR_INSTALL
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// `Activity.RESULT_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityResultCode {
    Ok,
    Canceled,
    Other(i32),
}

impl ActivityResultCode {
    pub const RESULT_OK: i32 = -1;
    pub const RESULT_CANCELED: i32 = 0;

    pub fn from_raw(code: i32) -> Self {
        match code {
            Self::RESULT_OK => Self::Ok,
            Self::RESULT_CANCELED => Self::Canceled,
            other => Self::Other(other),
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ActivityResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("RESULT_OK"),
            Self::Canceled => f.write_str("RESULT_CANCELED"),
            Self::Other(code) => write!(f, "RESULT({code})"),
        }
    }
}

/// `Intent.FLAG_*` bit set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentFlags(pub u32);

impl IntentFlags {
    pub const GRANT_READ_URI_PERMISSION: Self = Self(0x0000_0001);
    pub const CLEAR_TASK: Self = Self(0x0000_8000);
    pub const CLEAR_TOP: Self = Self(0x0400_0000);
    pub const NEW_TASK: Self = Self(0x1000_0000);
    pub const SINGLE_TOP: Self = Self(0x2000_0000);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for IntentFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Data URI handed to the installer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "camelCase")]
pub enum PackageUri {
    /// `Uri.fromFile`, only readable by the installer before Android N
    File { path: PathBuf },
    /// `FileProvider.getUriForFile`
    Content { authority: String, path: String },
}

impl PackageUri {
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Content { .. })
    }
}

impl fmt::Display for PackageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path } => write!(f, "file://{}", path.display()),
            Self::Content { authority, path } => write!(f, "content://{authority}/{path}"),
        }
    }
}

/// `ACTION_VIEW` intent that opens a package with the system installer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallIntent {
    pub data: PackageUri,
    pub flags: IntentFlags,
    /// `Intent.EXTRA_RETURN_RESULT`
    pub return_result: bool,
}

impl InstallIntent {
    pub const ACTION: &'static str = "android.intent.action.VIEW";
    pub const MIME_TYPE: &'static str = "application/vnd.android.package-archive";

    /// Installer intent with single-top/new-task/clear-top semantics and a
    /// result requested.
    #[must_use]
    pub fn new(data: PackageUri) -> Self {
        let mut flags = IntentFlags::NEW_TASK
            | IntentFlags::CLEAR_TOP
            | IntentFlags::CLEAR_TASK
            | IntentFlags::SINGLE_TOP;
        if data.is_content() {
            flags = flags | IntentFlags::GRANT_READ_URI_PERMISSION;
        }
        Self {
            data,
            flags,
            return_result: true,
        }
    }
}

/// Something the host surface launches for a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostAction {
    /// `Settings.ACTION_MANAGE_UNKNOWN_APP_SOURCES` for `package:<target>`
    RequestInstallPermission { package_uri: String },
    LaunchInstaller(InstallIntent),
}

impl HostAction {
    pub const MANAGE_UNKNOWN_APP_SOURCES: &'static str =
        "android.settings.MANAGE_UNKNOWN_APP_SOURCES";

    #[must_use]
    pub fn request_install_permission(target: &str) -> Self {
        Self::RequestInstallPermission {
            package_uri: format!("package:{target}"),
        }
    }

    /// Intent action string the host should start
    pub fn action(&self) -> &'static str {
        match self {
            Self::RequestInstallPermission { .. } => Self::MANAGE_UNKNOWN_APP_SOURCES,
            Self::LaunchInstaller(_) => InstallIntent::ACTION,
        }
    }

    pub fn is_permission_request(&self) -> bool {
        matches!(self, Self::RequestInstallPermission { .. })
    }
}
