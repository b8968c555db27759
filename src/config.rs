use crate::conversation::DEFAULT_ANALYSIS_PREFIX_CHARS;
use crate::mode::Mode;
use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

const CONFIG_DIR_NAME: &str = "codemate";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub temperature: f32,
    pub mode: Mode,
    pub analysis_prefix_chars: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
    temperature: Option<f32>,
    mode: Option<String>,
    analysis_prefix_chars: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Loads the config file (the explicit one, or the discovered default),
    /// then layers `.env` and process environment variables on top.
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let (config_path, file_config) = match explicit_path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Failed to load config {}: file not found", path.display());
                }
                (path.to_path_buf(), load_file_config(path)?)
            }
            None => {
                let path = discover_config_path()?;
                let raw = load_file_config(&path)?;
                (path, raw)
            }
        };
        let file = file_config.unwrap_or_default();

        // Existing process variables win over .env entries.
        dotenvy::dotenv().ok();

        let temperature = file.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(config_error(
                &config_path,
                "temperature",
                "must be between 0.0 and 2.0",
            ));
        }

        let analysis_prefix_chars = file
            .analysis_prefix_chars
            .unwrap_or(DEFAULT_ANALYSIS_PREFIX_CHARS);
        if analysis_prefix_chars == 0 {
            return Err(config_error(
                &config_path,
                "analysis_prefix_chars",
                "must be at least 1",
            ));
        }

        Ok(Self {
            gemini_api_key: env_non_empty("GEMINI_API_KEY")
                .or_else(|| env_non_empty("GOOGLE_API_KEY"))
                .or_else(|| file.gemini_api_key.as_deref().and_then(non_empty)),
            gemini_model: env_non_empty("GEMINI_MODEL")
                .or_else(|| file.gemini_model.as_deref().and_then(non_empty))
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env_non_empty("GEMINI_BASE_URL")
                .or_else(|| file.gemini_base_url.as_deref().and_then(non_empty))
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            temperature,
            mode: Mode::resolve(file.mode.as_deref()),
            analysis_prefix_chars,
            config_path,
        })
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().as_deref().and_then(non_empty)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn config_error(config_path: &Path, key: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key}: {reason}",
        config_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_TEMPERATURE};
    use crate::mode::Mode;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn reset_vars() {
        unsafe {
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("GOOGLE_API_KEY");
            env::remove_var("GEMINI_MODEL");
            env::remove_var("GEMINI_BASE_URL");
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    fn with_cwd<T>(path: &Path, f: impl FnOnce() -> T) -> T {
        let cwd = env::current_dir().expect("current dir");
        env::set_current_dir(path).expect("set current dir");
        let result = f();
        env::set_current_dir(cwd).expect("restore current dir");
        result
    }

    fn write_default_config(root: &Path, content: &str) -> PathBuf {
        let dir = root.join("codemate");
        fs::create_dir_all(&dir).expect("create config dir");
        let path = dir.join("config.toml");
        fs::write(&path, content).expect("write config");
        path
    }

    #[test]
    #[serial]
    fn defaults_apply_without_file_or_env() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load"));
        assert_eq!(cfg.gemini_api_key, None);
        assert_eq!(cfg.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(cfg.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(cfg.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(cfg.mode, Mode::General);
        assert_eq!(cfg.analysis_prefix_chars, 3_000);
        assert_eq!(cfg.config_path, tmp.path().join("codemate/config.toml"));
    }

    #[test]
    #[serial]
    fn env_overrides_file_values() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_default_config(
            tmp.path(),
            r#"
gemini_api_key = "file_key"
gemini_model = "file_model"
gemini_base_url = "https://example.com"
"#,
        );

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("GEMINI_API_KEY", "os_key");
            env::set_var("GEMINI_MODEL", "os_model");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load"));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.gemini_model, "os_model");
        assert_eq!(cfg.gemini_base_url, "https://example.com");
    }

    #[test]
    #[serial]
    fn google_api_key_is_accepted_as_fallback() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("GOOGLE_API_KEY", "google_key");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load"));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("google_key"));
    }

    #[test]
    #[serial]
    fn dotenv_does_not_override_process_env() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(".env"),
            "GEMINI_API_KEY=dotenv_key\nGEMINI_MODEL=dotenv_model\n",
        )
        .expect("write .env");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("GEMINI_API_KEY", "os_key");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load"));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.gemini_model, "dotenv_model");
        reset_vars();
    }

    #[test]
    #[serial]
    fn file_sets_mode_temperature_and_prefix() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_default_config(
            tmp.path(),
            r#"
mode = "Code Generator"
temperature = 0.7
analysis_prefix_chars = 500
"#,
        );
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load"));
        assert_eq!(cfg.mode, Mode::CodeGenerator);
        assert_eq!(cfg.temperature, 0.7);
        assert_eq!(cfg.analysis_prefix_chars, 500);
    }

    #[test]
    #[serial]
    fn unknown_mode_in_file_falls_back_to_general() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_default_config(tmp.path(), r#"mode = "Wizard""#);
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load"));
        assert_eq!(cfg.mode, Mode::General);
    }

    #[test]
    #[serial]
    fn explicit_path_skips_discovery() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_default_config(tmp.path(), r#"gemini_model = "discovered""#);
        let explicit = tmp.path().join("custom.toml");
        fs::write(&explicit, r#"gemini_model = "explicit""#).expect("write explicit");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || {
            AppConfig::load_with_path(Some(&explicit)).expect("load")
        });
        assert_eq!(cfg.gemini_model, "explicit");
        assert_eq!(cfg.config_path, explicit);
    }

    #[test]
    #[serial]
    fn explicit_path_must_exist() {
        reset_vars();
        let err = AppConfig::load_with_path(Some(Path::new("/definitely/missing/codemate.toml")))
            .expect_err("missing explicit config");
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    #[serial]
    fn empty_xdg_config_home_is_an_error() {
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "   ");
        }

        let err = AppConfig::load().expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("Failed to resolve config path: XDG_CONFIG_HOME is set but empty")
        );
        reset_vars();
    }

    #[test]
    #[serial]
    fn unknown_keys_are_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_default_config(tmp.path(), "theme = \"dark\"");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("load should fail"));
        assert!(err.to_string().contains("Failed to load config"));
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    #[serial]
    fn out_of_range_values_are_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        write_default_config(tmp.path(), "temperature = 3.5");
        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("temperature"));
        assert!(
            err.to_string()
                .contains("temperature: must be between 0.0 and 2.0")
        );

        write_default_config(tmp.path(), "analysis_prefix_chars = 0");
        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("prefix"));
        assert!(err.to_string().contains("analysis_prefix_chars: must be at least 1"));
    }
}
