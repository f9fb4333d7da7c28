//! Bootstrap configuration types
//!
//! Every field has a built-in default, so a config file only needs to name the
//! values it changes. An absent file means "use the defaults".

pub mod loader;

pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE};

use serde::{Deserialize, Serialize};

/// Package manager used when nothing else is configured
pub const DEFAULT_PACKAGE_MANAGER: &str = "uv";

/// Remote installer for the default package manager
pub const DEFAULT_INSTALLER_URL: &str = "https://astral.sh/uv/install.sh";

/// Project descriptor looked up in the working directory
pub const DEFAULT_DESCRIPTOR: &str = "pyproject.toml";

/// Kernel identifier registered with Jupyter
pub const DEFAULT_KERNEL_ID: &str = "code-agent";

/// Kernel display name shown by notebook front ends
pub const DEFAULT_KERNEL_DISPLAY_NAME: &str = "Python (code-agent)";

/// Main bootstrap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Package manager executable (e.g. `uv`)
    pub package_manager: String,

    /// URL of the shell installer fetched when the package manager is missing
    pub installer_url: String,

    /// Directories the installer drops the executable into.
    /// `~` and `$HOME` are expanded before they are prepended to the search path.
    pub installer_dirs: Vec<String>,

    /// Base installer package upgraded before anything else
    pub pip_package: String,

    /// Project descriptor file name, relative to the working directory
    pub descriptor: String,

    /// Runtime libraries
    pub runtime_dependencies: Vec<String>,

    /// Development-only libraries
    pub dev_dependencies: Vec<String>,

    /// Extra flags passed to every `pip install` (e.g. `--system`)
    pub install_flags: Vec<String>,

    /// Python interpreter used to register the kernel
    pub python: String,

    /// Kernel configuration
    pub kernel: KernelConfig,

    /// Where the run summary is written, relative to the working directory
    pub summary_path: String,

    /// Timeout for the installer download, in seconds
    pub http_timeout_secs: u64,
}

/// Notebook kernel registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Kernel identifier (`--name`)
    pub id: String,

    /// Kernel display name (`--display-name`)
    pub display_name: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_KERNEL_ID.to_string(),
            display_name: DEFAULT_KERNEL_DISPLAY_NAME.to_string(),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            package_manager: DEFAULT_PACKAGE_MANAGER.to_string(),
            installer_url: DEFAULT_INSTALLER_URL.to_string(),
            installer_dirs: vec!["~/.local/bin".to_string(), "~/.cargo/bin".to_string()],
            pip_package: "pip".to_string(),
            descriptor: DEFAULT_DESCRIPTOR.to_string(),
            runtime_dependencies: strings(&["google-genai", "arxiv", "python-dotenv", "pytz"]),
            dev_dependencies: strings(&["pytest", "ipykernel"]),
            install_flags: Vec::new(),
            python: "python".to_string(),
            kernel: KernelConfig::default(),
            summary_path: ".py-bootstrap/last-run.json".to_string(),
            http_timeout_secs: 60,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl BootstrapConfig {
    /// Parse a config from YAML. Missing fields keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to null, not to an empty mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Reject values that would make the generated commands meaningless
    pub fn validate(&self) -> Result<(), crate::BootstrapError> {
        let required = [
            ("package_manager", &self.package_manager),
            ("installer_url", &self.installer_url),
            ("pip_package", &self.pip_package),
            ("descriptor", &self.descriptor),
            ("python", &self.python),
            ("kernel.id", &self.kernel.id),
            ("kernel.display_name", &self.kernel.display_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(crate::BootstrapError::Config(format!(
                    "'{field}' must not be empty"
                )));
            }
        }
        if self.kernel.id.chars().any(char::is_whitespace) {
            return Err(crate::BootstrapError::Config(format!(
                "kernel id '{}' must not contain whitespace",
                self.kernel.id
            )));
        }
        Ok(())
    }
}
