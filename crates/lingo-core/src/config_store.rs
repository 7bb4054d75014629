//! 설정 파일 저장소.
//!
//! JSON 설정 파일 하나를 소유한다. 처음 열 때 파일이 없으면 기본 설정으로
//! 만든다. 저장은 같은 디렉토리의 임시 파일에 쓴 뒤 rename 하므로 도중에
//! 끊겨도 반쯤 쓰인 설정 파일이 남지 않는다.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::CoreError;

const FILE_NAME: &str = "config.json";
const APP_NAME: &str = "lingo";

/// 열린 설정이 어디서 왔는지
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// 기존 파일에서 읽음
    Loaded,
    /// 파일이 없어 기본값으로 새로 씀
    Created,
}

/// 설정 저장소 — 복제하면 같은 설정을 공유한다
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    origin: ConfigOrigin,
    current: Arc<RwLock<AppConfig>>,
}

impl ConfigStore {
    /// 플랫폼 설정 디렉토리의 `lingo/config.json` 열기
    pub fn open_default() -> Result<Self, CoreError> {
        Self::open(default_path()?)
    }

    /// 지정한 파일 열기 — 없으면 기본 설정으로 생성
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let (config, origin) = match read_config(&path)? {
            Some(config) => (config, ConfigOrigin::Loaded),
            None => {
                let config = AppConfig::default_config();
                write_atomic(&path, &config)?;
                info!(path = %path.display(), "기본 설정 파일 생성");
                (config, ConfigOrigin::Created)
            }
        };
        config.validate()?;
        debug!(path = %path.display(), ?origin, "설정 열림");

        Ok(Self {
            path,
            origin,
            current: Arc::new(RwLock::new(config)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> ConfigOrigin {
        self.origin
    }

    /// 현재 설정 복제본
    pub fn snapshot(&self) -> AppConfig {
        self.current.read().clone()
    }

    /// 설정 수정 후 저장.
    ///
    /// 수정 결과가 검증을 통과하고 파일에 쓰인 뒤에만 반영된다. 실패하면
    /// 메모리와 파일 모두 이전 설정 그대로다.
    pub fn modify<F>(&self, edit: F) -> Result<AppConfig, CoreError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut current = self.current.write();
        let mut next = current.clone();
        edit(&mut next);
        next.validate()?;
        write_atomic(&self.path, &next)?;
        *current = next.clone();
        debug!(path = %self.path.display(), "설정 저장");
        Ok(next)
    }

    /// 설정 전체 교체 후 저장
    pub fn replace(&self, config: AppConfig) -> Result<(), CoreError> {
        self.modify(|current| *current = config).map(|_| ())
    }

    /// 파일을 다시 읽어 반영 — 파일이 사라졌으면 에러
    pub fn reload(&self) -> Result<(), CoreError> {
        let config = read_config(&self.path)?.ok_or_else(|| {
            CoreError::Config(format!("{}: 설정 파일이 없습니다", self.path.display()))
        })?;
        config.validate()?;
        *self.current.write() = config;
        info!(path = %self.path.display(), "설정 다시 읽음");
        Ok(())
    }
}

/// 플랫폼 기본 설정 파일 경로
///
/// - Linux: `~/.config/lingo/config.json`
/// - macOS: `~/Library/Application Support/lingo/config.json`
/// - Windows: `%APPDATA%\lingo\config\config.json`
pub fn default_path() -> Result<PathBuf, CoreError> {
    let dirs = ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| CoreError::Config("홈 디렉토리를 찾을 수 없습니다".to_string()))?;
    Ok(dirs.config_dir().join(FILE_NAME))
}

/// 설정 파일 읽기 — 파일이 없으면 None
fn read_config(path: &Path) -> Result<Option<AppConfig>, CoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(file_error(path, "읽기", e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| CoreError::Config(format!("{}: JSON 형식 오류: {e}", path.display())))
}

/// 임시 파일에 쓰고 rename
fn write_atomic(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| file_error(dir, "디렉토리 생성", e))?;
    }
    let json = serde_json::to_vec_pretty(config)?;
    let staging = staging_path(path);
    fs::write(&staging, json).map_err(|e| file_error(&staging, "쓰기", e))?;
    fs::rename(&staging, path).map_err(|e| file_error(path, "교체", e))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn file_error(path: &Path, action: &str, e: std::io::Error) -> CoreError {
    CoreError::Config(format!("{}: 설정 파일 {action} 실패: {e}", path.display()))
}
