//! RON script loader

use crate::error::{Error, Result};
use crate::schema::ScenarioScript;
use ghostline_core::WorldConfig;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Loaded world config and scenario scripts
#[derive(Debug, Default)]
pub struct ScenarioDefs {
    /// World configuration; `None` means the defaults
    pub config: Option<WorldConfig>,
    /// Scripts by name
    pub scripts: HashMap<String, ScenarioScript>,
}

impl ScenarioDefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded config, or the defaults if none was loaded
    pub fn world_config(&self) -> WorldConfig {
        self.config.clone().unwrap_or_default()
    }

    /// Get a script by name
    pub fn get_script(&self, name: &str) -> Option<&ScenarioScript> {
        self.scripts.get(name)
    }
}

/// Loader for RON configs and scenario scripts
pub struct Loader {
    defs: ScenarioDefs,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            defs: ScenarioDefs::new(),
        }
    }

    /// Load a single RON file
    ///
    /// Files whose name contains `config` are world configs; anything else
    /// is a scenario script.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        if filename.contains("config") {
            self.load_config_str(&content)
        } else {
            self.load_script_str(&content)
        }
    }

    /// Load a world config from a RON string
    pub fn load_config_str(&mut self, content: &str) -> Result<()> {
        let config: WorldConfig = ron::from_str(content)?;
        config.validate()?;
        if self.defs.config.is_some() {
            return Err(Error::DuplicateDefinition("world config".to_string()));
        }
        debug!(charges = config.rewind.max_charges, "world config loaded");
        self.defs.config = Some(config);
        Ok(())
    }

    /// Load a scenario script from a RON string
    pub fn load_script_str(&mut self, content: &str) -> Result<()> {
        let script: ScenarioScript = ron::from_str(content)?;
        script.validate()?;
        if self.defs.scripts.contains_key(&script.name) {
            return Err(Error::DuplicateDefinition(format!("script {}", script.name)));
        }
        debug!(script = %script.name, frames = script.total_frames(), "script loaded");
        self.defs.scripts.insert(script.name.clone(), script);
        Ok(())
    }

    /// Load all RON files from a directory
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries: Vec<_> = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Finish loading and return the definitions
    pub fn finish(self) -> ScenarioDefs {
        self.defs
    }

    /// Get the current definitions (for inspection during loading)
    pub fn defs(&self) -> &ScenarioDefs {
        &self.defs
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
