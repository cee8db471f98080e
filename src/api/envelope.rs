use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::ApiError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    #[default]
    Error,
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

/// The `{status, message?, errorCode?}` wrapper every backend call returns.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            ..Default::default()
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            error_code: Some(code.as_str().to_owned()),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.error_code
            .as_deref()
            .map(ErrorCode::parse)
            .unwrap_or(ErrorCode::Unknown)
    }

    /// Server message when present, otherwise the fixed table entry for the code.
    pub fn user_message(&self) -> String {
        match self.message.as_deref() {
            Some(message) if !message.trim().is_empty() => message.to_owned(),
            _ => self.code().message().to_owned(),
        }
    }
}

/// Response types that carry a flattened [`Envelope`].
pub trait Enveloped: DeserializeOwned + Default {
    fn envelope(&self) -> &Envelope;
    fn envelope_mut(&mut self) -> &mut Envelope;

    fn is_ok(&self) -> bool {
        self.envelope().status.is_ok()
    }

    fn from_envelope(envelope: Envelope) -> Self {
        let mut response = Self::default();
        *response.envelope_mut() = envelope;
        response
    }

    fn from_error(err: &ApiError) -> Self {
        let code = err.code();
        Self::from_envelope(Envelope::failure(code, code.message()))
    }
}

macro_rules! enveloped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Enveloped for $ty {
                fn envelope(&self) -> &Envelope {
                    &self.envelope
                }

                fn envelope_mut(&mut self) -> &mut Envelope {
                    &mut self.envelope
                }
            }
        )*
    };
}

enveloped!(
    BasicResponse,
    CheckResponse,
    StageResponse,
    ProgressResponse,
    AnnouncementResponse,
    CarouselResponse,
    BackgroundsResponse,
);

/// Endpoints with no extra fields (`/init`, `/open-url`, window controls).
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BasicResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub game_exists: bool,
    #[serde(default)]
    pub needs_update: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<String>,
}

/// Result of `/game/clone`, `/game/update` and `/game/launch`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launcher_path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub eta: String,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub total_objects: u64,
    #[serde(default)]
    pub received_objects: u64,
    #[serde(default)]
    pub indexed_objects: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub show_on_startup: bool,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AnnouncementResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub announcement: Option<Announcement>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    #[default]
    Dialog,
    Link,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CarouselSlide {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(rename = "type", default)]
    pub kind: SlideKind,
    #[serde(default)]
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CarouselResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub slides: Vec<CarouselSlide>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Background {
    pub id: String,
    pub name: String,
    pub image_url: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BackgroundsResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backgrounds: Option<Vec<Background>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Network,
    Server,
    VersionParse,
    PermissionDenied,
    Git,
    FileNotFound,
    DiskFull,
    GameDir,
    LauncherNotFound,
    Launcher,
    Unknown,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 11] = [
        ErrorCode::Network,
        ErrorCode::Server,
        ErrorCode::VersionParse,
        ErrorCode::PermissionDenied,
        ErrorCode::Git,
        ErrorCode::FileNotFound,
        ErrorCode::DiskFull,
        ErrorCode::GameDir,
        ErrorCode::LauncherNotFound,
        ErrorCode::Launcher,
        ErrorCode::Unknown,
    ];

    /// Unrecognised codes collapse to [`ErrorCode::Unknown`].
    pub fn parse(code: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == code)
            .unwrap_or(ErrorCode::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Network => "NETWORK_ERROR",
            ErrorCode::Server => "SERVER_ERROR",
            ErrorCode::VersionParse => "VERSION_PARSE_ERROR",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::Git => "GIT_ERROR",
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::DiskFull => "DISK_FULL",
            ErrorCode::GameDir => "GAME_DIR_ERROR",
            ErrorCode::LauncherNotFound => "LAUNCHER_NOT_FOUND",
            ErrorCode::Launcher => "LAUNCHER_ERROR",
            ErrorCode::Unknown => "UNKNOWN_ERROR",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Network => "Network connection failed, please check your connection",
            ErrorCode::Server => "The server is temporarily unavailable, please try again later",
            ErrorCode::VersionParse => {
                "Could not parse version information, the version file may be corrupted"
            }
            ErrorCode::PermissionDenied => {
                "Permission denied, please check the application's permissions"
            }
            ErrorCode::Git => {
                "Git repository operation failed, please check the network or repository address"
            }
            ErrorCode::FileNotFound => "A required file or directory could not be found",
            ErrorCode::DiskFull => "Not enough disk space, please free some space and retry",
            ErrorCode::GameDir => "Could not access the game directory, please check its permissions",
            ErrorCode::LauncherNotFound => {
                "Launcher program not found, the game may not be installed correctly"
            }
            ErrorCode::Launcher => "The launcher failed to start, please check compatibility settings",
            ErrorCode::Unknown => "An unknown error occurred, please retry or contact support",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("GIT_ERROR", ErrorCode::Git)]
    #[case("DISK_FULL", ErrorCode::DiskFull)]
    #[case("LAUNCHER_NOT_FOUND", ErrorCode::LauncherNotFound)]
    #[case("SOMETHING_NEW", ErrorCode::Unknown)]
    #[case("", ErrorCode::Unknown)]
    fn parses_codes_with_fallback(#[case] raw: &str, #[case] expected: ErrorCode) {
        assert_eq!(ErrorCode::parse(raw), expected);
    }

    #[test]
    fn every_code_round_trips_through_its_name() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::parse(code.as_str()), code);
            assert!(!code.message().is_empty());
        }
    }

    #[test]
    fn user_message_prefers_server_text() {
        let envelope = Envelope {
            status: Status::Error,
            message: Some("repo locked".into()),
            error_code: Some("GIT_ERROR".into()),
        };
        assert_eq!(envelope.user_message(), "repo locked");

        let envelope = Envelope {
            message: Some("  ".into()),
            error_code: Some("DISK_FULL".into()),
            ..Default::default()
        };
        assert_eq!(envelope.user_message(), ErrorCode::DiskFull.message());

        assert_eq!(
            Envelope::default().user_message(),
            ErrorCode::Unknown.message()
        );
    }

    #[test]
    fn decodes_check_response() {
        let check: CheckResponse = serde_json::from_str(
            r#"{"status":"ok","gameExists":true,"needsUpdate":true,
                "currentVersion":"1.0.0","remoteVersion":"1.1.0","gamePath":"/games/mc"}"#,
        )
        .unwrap();
        assert!(check.is_ok());
        assert!(check.game_exists);
        assert!(check.needs_update);
        assert_eq!(check.remote_version.as_deref(), Some("1.1.0"));
    }

    #[test]
    fn missing_status_is_an_error_and_odd_status_is_unknown() {
        let stage: StageResponse = serde_json::from_str(r#"{"version":"1.0"}"#).unwrap();
        assert_eq!(stage.envelope.status, Status::Error);

        let stage: StageResponse = serde_json::from_str(r#"{"status":"cancel"}"#).unwrap();
        assert_eq!(stage.envelope.status, Status::Unknown);
        assert!(!stage.is_ok());
    }

    #[test]
    fn decodes_progress_with_missing_fields() {
        let progress: ProgressResponse =
            serde_json::from_str(r#"{"status":"ok","percentage":42.5,"stage":"Receiving"}"#)
                .unwrap();
        assert_eq!(progress.percentage, 42.5);
        assert_eq!(progress.total_objects, 0);
        assert!(!progress.is_complete);
    }

    #[test]
    fn decodes_flat_announcement() {
        let response: AnnouncementResponse = serde_json::from_str(
            r#"{"status":"ok","id":"a-1","title":"Hello","content":"<p>hi</p>",
                "show_on_startup":true,"created_at":"2025-04-12T08:00:00Z"}"#,
        )
        .unwrap();
        let announcement = response.announcement.unwrap();
        assert_eq!(announcement.id, "a-1");
        assert!(announcement.show_on_startup);
    }

    #[test]
    fn error_response_without_announcement_fields() {
        let response: AnnouncementResponse =
            serde_json::from_str(r#"{"status":"error","message":"none"}"#).unwrap();
        assert!(!response.is_ok());
        assert!(response.announcement.is_none());
    }

    #[test]
    fn slide_kind_uses_type_key() {
        let slide: CarouselSlide = serde_json::from_str(
            r#"{"id":"s","title":"t","type":"link","content":"https://example.com"}"#,
        )
        .unwrap();
        assert_eq!(slide.kind, SlideKind::Link);
    }
}
