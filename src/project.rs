//! Project layout and the file-level operations behind the CLI.
//!
//! A project is a directory holding `deck.yaml`, `brief.json`,
//! `outline.json`, a `sources/` tree of input material, `assets/` for
//! uploaded media and `generated/` for derived artifacts. Building and
//! serving the deck itself is delegated to the configured bundler commands.

use crate::config::{load_config, save_config, ProjectConfig, CONFIG_FILE};
use crate::deck::Deck;
use crate::schema::{
    validate_brief, validate_manifest, validate_outline, Brief, FileKind, Manifest, ManifestFile, Outline,
    OutlineSlide, ValidationIssue, ValidationReport, MANIFEST_VERSION,
};
use crate::theme::Theme;
use crate::{Error, Result};
use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use walkdir::WalkDir;

pub const BRIEF_FILE: &str = "brief.json";
pub const OUTLINE_FILE: &str = "outline.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// A deck project rooted at a directory.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

/// Validation outcome for one project document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    pub file: String,
    pub report: ValidationReport,
}

impl Project {
    /// Open the project at `root`. A missing `deck.yaml` yields defaults.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config = load_config(&root.join(CONFIG_FILE));
        Self { root, config }
    }

    /// Scaffold a new project. Existing files are left untouched.
    pub fn init(root: impl Into<PathBuf>, id: &str, title: &str, theme: &str) -> Result<Self> {
        let root = root.into();
        let theme = Theme::lookup(theme)?;
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            return Err(Error::ConfigError(format!(
                "{} already exists; refusing to overwrite",
                config_path.display()
            )));
        }

        let config = ProjectConfig {
            id: id.to_string(),
            title: title.to_string(),
            theme: theme.name.to_string(),
            ..ProjectConfig::default()
        };
        save_config(&config, &config_path)?;

        let project = Self { root, config };
        for dir in [project.sources_dir(), project.assets_dir(), project.generated_dir()] {
            std::fs::create_dir_all(&dir)?;
        }

        let brief = Brief {
            title: title.to_string(),
            audience: "Who is in the room".to_string(),
            goal: "What the audience should decide or remember".to_string(),
            tone: None,
            duration_minutes: Some(20),
            key_messages: Vec::new(),
            theme: Some(theme.name.to_string()),
        };
        let outline = Outline {
            title: Some(title.to_string()),
            theme: Some(theme.name.to_string()),
            slides: vec![
                OutlineSlide {
                    id: "title".to_string(),
                    slide_type: "title-hero".to_string(),
                    intent: "Introduce the topic".to_string(),
                    headline: Some(title.to_string()),
                    body: None,
                    bullets: Vec::new(),
                    notes: None,
                },
                OutlineSlide {
                    id: "closing".to_string(),
                    slide_type: "closing".to_string(),
                    intent: "State the ask".to_string(),
                    headline: Some("Thank you".to_string()),
                    body: None,
                    bullets: Vec::new(),
                    notes: None,
                },
            ],
        };
        write_json_if_missing(&project.root.join(BRIEF_FILE), &brief)?;
        write_json_if_missing(&project.root.join(OUTLINE_FILE), &outline)?;

        info!("Initialized project '{}' in {}", id, project.root.display());
        Ok(project)
    }

    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.sources)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.assets)
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.generated)
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.dist)
    }

    pub fn site_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.site)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.generated_dir().join(MANIFEST_FILE)
    }

    pub fn theme(&self) -> Result<&'static Theme> {
        Theme::lookup(&self.config.theme)
    }

    pub fn deck(&self) -> Result<Deck> {
        self.config.deck(&self.root)
    }

    /// Scan `sources/` into `generated/manifest.json`.
    pub fn ingest(&self) -> Result<Manifest> {
        let sources = self.sources_dir();
        if !sources.is_dir() {
            return Err(Error::ConfigError(format!(
                "Sources directory {} does not exist",
                sources.display()
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&sources).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Other(format!("Failed to scan sources: {}", e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let data = std::fs::read(entry.path())?;
            let relative = entry
                .path()
                .strip_prefix(&sources)
                .map_err(|e| Error::Other(e.to_string()))?;
            let kind = relative
                .extension()
                .and_then(|e| e.to_str())
                .map(FileKind::from_extension)
                .unwrap_or(FileKind::Other);
            files.push(ManifestFile {
                path: slash_path(relative),
                kind,
                bytes: data.len() as u64,
                sha256: hex::encode(Sha256::digest(&data)),
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            files,
        };
        let path = self.manifest_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
        info!("Ingested {} files into {}", manifest.files.len(), path.display());
        Ok(manifest)
    }

    /// Validate brief, outline and (when present) the manifest.
    pub fn validate(&self) -> Result<Vec<DocumentReport>> {
        let mut reports = vec![
            self.validate_file(&self.root.join(BRIEF_FILE), BRIEF_FILE, validate_brief)?,
            self.validate_file(&self.root.join(OUTLINE_FILE), OUTLINE_FILE, validate_outline)?,
        ];
        let manifest = self.manifest_path();
        if manifest.exists() {
            reports.push(self.validate_file(&manifest, "generated/manifest.json", validate_manifest)?);
        }
        Ok(reports)
    }

    fn validate_file(
        &self,
        path: &Path,
        label: &str,
        validate: fn(&serde_json::Value) -> ValidationReport,
    ) -> Result<DocumentReport> {
        let report = if !path.exists() {
            single_issue("file not found")
        } else {
            let data = std::fs::read_to_string(path)?;
            match serde_json::from_str::<serde_json::Value>(&data) {
                Ok(value) => validate(&value),
                Err(e) => single_issue(&format!("invalid JSON: {}", e)),
            }
        };
        Ok(DocumentReport {
            file: label.to_string(),
            report,
        })
    }

    /// Run the bundler build command.
    pub fn build(&self) -> Result<()> {
        run_shell(&self.config.commands.build, &self.root)
    }

    /// Start the bundler dev server in the background. The process is
    /// killed when the returned guard is dropped.
    pub fn spawn_dev_server(&self) -> Result<DevProcess> {
        let command = self.config.commands.dev.clone();
        let child = spawn_shell(&command, &self.root)?;
        Ok(DevProcess { command, child: Some(child) })
    }

    /// Copy the bundler output into the static site directory.
    ///
    /// The site directory is replaced wholesale and gets a `.nojekyll` marker
    /// so GitHub Pages serves underscore-prefixed assets. Returns the number
    /// of files copied.
    pub fn export_static(&self) -> Result<usize> {
        let dist = self.dist_dir();
        if !dist.join("index.html").is_file() {
            return Err(Error::ConfigError(format!(
                "No build output at {}; run `slidewright build` first",
                dist.display()
            )));
        }
        let site = self.site_dir();
        if site.exists() {
            std::fs::remove_dir_all(&site)?;
        }
        let copied = copy_tree(&dist, &site)?;
        std::fs::write(site.join(".nojekyll"), b"")?;
        info!("Exported {} files to {}", copied, site.display());
        Ok(copied)
    }

    /// Commit the static site to the publish branch and force-push it.
    pub fn publish_github(&self, message: &str) -> Result<()> {
        let site = self.site_dir();
        if !site.join(".nojekyll").is_file() {
            return Err(Error::ConfigError(format!(
                "No static export at {}; run `slidewright export-static` first",
                site.display()
            )));
        }

        let remote = &self.config.publish.remote;
        let branch = &self.config.publish.branch;
        let remote_url = git(&["remote", "get-url", remote], &self.root)?;

        if !site.join(".git").exists() {
            git(&["init", "--quiet"], &site)?;
        }
        git(&["checkout", "--quiet", "-B", branch], &site)?;
        git(&["add", "--all"], &site)?;
        git(&["commit", "--quiet", "--allow-empty", "-m", message], &site)?;
        git(&["push", "--quiet", "--force", &remote_url, &format!("HEAD:{}", branch)], &site)?;
        info!("Published {} to {} ({})", site.display(), remote, branch);
        Ok(())
    }
}

fn single_issue(message: &str) -> ValidationReport {
    ValidationReport {
        issues: vec![ValidationIssue {
            path: String::new(),
            message: message.to_string(),
        }],
    }
}

fn write_json_if_missing<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if path.exists() {
        debug!("Keeping existing {}", path.display());
        return Ok(());
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

// Forward slashes on every platform so manifests are portable.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Recursively copy `from` into `to`. Returns the number of files copied.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| Error::Other(format!("Failed to walk {}: {}", from.display(), e)))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| Error::Other(e.to_string()))?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        } else {
            warn!("Skipping non-regular file {}", entry.path().display());
        }
    }
    Ok(copied)
}

fn shell(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run a shell command in `cwd`, failing on a non-zero exit.
pub fn run_shell(command: &str, cwd: &Path) -> Result<()> {
    info!("Running `{}`", command);
    let status = shell(command)
        .current_dir(cwd)
        .status()
        .map_err(|e| Error::CommandFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;
    if !status.success() {
        return Err(Error::CommandFailed {
            command: command.to_string(),
            reason: format!("exited with {}", status),
        });
    }
    Ok(())
}

/// Start a shell command in `cwd` without waiting for it.
pub fn spawn_shell(command: &str, cwd: &Path) -> Result<Child> {
    info!("Starting `{}`", command);
    shell(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| Error::CommandFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })
}

/// A background bundler process owned by the CLI.
#[derive(Debug)]
pub struct DevProcess {
    command: String,
    child: Option<Child>,
}

impl DevProcess {
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Kill the process (if still running) and reap it.
    pub fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if child.try_wait()?.is_none() {
            info!("Stopping `{}`", self.command);
            child.kill()?;
        }
        child.wait()?;
        Ok(())
    }
}

impl Drop for DevProcess {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop `{}`: {}", self.command, e);
        }
    }
}

/// Run `git` with `args` in `cwd` and return its trimmed stdout.
pub fn git(args: &[&str], cwd: &Path) -> Result<String> {
    let rendered = format!("git {}", args.join(" "));
    debug!("Running `{}` in {}", rendered, cwd.display());
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| Error::CommandFailed {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: rendered,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
