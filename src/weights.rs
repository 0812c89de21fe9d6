use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::models::Generator;
use crate::rng::rng_from_seed;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk form of a trained generator: enough to rebuild the network and
/// restore every parameter in [`Generator::params`] order.
#[derive(Serialize, Deserialize)]
pub struct GeneratorJson {
    pub config: ModelConfig,
    pub params: Vec<Vec<f32>>,
}

impl GeneratorJson {
    pub fn from_generator(generator: &Generator) -> Self {
        Self {
            config: generator.config().clone(),
            params: generator
                .params()
                .iter()
                .map(|p| p.value.data.clone())
                .collect(),
        }
    }

    /// Rebuild the generator and copy the stored values into it.
    pub fn into_generator(self) -> Result<Generator> {
        let mut rng = rng_from_seed(Some(0));
        let mut generator = Generator::new(&self.config, &mut rng);
        let mut params = generator.parameters();
        if params.len() != self.params.len() {
            return Err(Error::Checkpoint(format!(
                "expected {} parameter tensors, found {}",
                params.len(),
                self.params.len()
            )));
        }
        for (i, (param, values)) in params.iter_mut().zip(self.params).enumerate() {
            let expected = param.len();
            let found = values.len();
            if !param.load(values) {
                return Err(Error::Checkpoint(format!(
                    "parameter {i}: expected {expected} values, found {found}"
                )));
            }
        }
        Ok(generator)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn save_generator<P: AsRef<Path>>(path: P, generator: &Generator) -> Result<()> {
    save_checkpoint(path, &GeneratorJson::from_generator(generator))
}

pub fn load_generator<P: AsRef<Path>>(path: P) -> Result<Generator> {
    let json: GeneratorJson = load_checkpoint(path)?;
    json.into_generator()
}

/// Save an arbitrary checkpoint structure to `path` using JSON serialisation.
pub fn save_checkpoint<T: Serialize, P: AsRef<Path>>(path: P, state: &T) -> Result<()> {
    let path = path.as_ref();
    let txt = serde_json::to_string(state)?;
    ensure_parent(path)?;
    fs::write(path, txt)?;
    log::info!("Saved checkpoint to {}", path.display());
    Ok(())
}

/// Load a checkpoint from `path` that was saved with [`save_checkpoint`].
pub fn load_checkpoint<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let txt = fs::read_to_string(path)?;
    let state = serde_json::from_str(&txt)?;
    log::info!("Loaded checkpoint from {}", path.display());
    Ok(state)
}
