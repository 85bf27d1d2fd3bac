use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use datasmith_core::{Property, Value, ValueKind};

use crate::assets::embedded_json;
use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::providers::{draw_avoiding, Params, Provider, ProviderRegistry};

pub fn register(registry: &mut ProviderRegistry) {
    registry.register("company.name", |params| {
        Params::new("company.name", params, &[])?;
        Ok(Box::new(CompanyNameProvider::new()))
    });
}

#[derive(Debug, Clone, Deserialize)]
struct CompanyData {
    stems: Vec<String>,
    suffixes: Vec<String>,
}

/// Company-name provider over the embedded stem/suffix dataset.
pub struct CompanyNameProvider {
    stems: Vec<String>,
    suffixes: Vec<String>,
    rng: ChaCha8Rng,
}

impl CompanyNameProvider {
    pub fn new() -> Self {
        Self {
            stems: Vec::new(),
            suffixes: Vec::new(),
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl Default for CompanyNameProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for CompanyNameProvider {
    fn id(&self) -> &'static str {
        "company.name"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
    }

    fn load(&mut self, _property: &Property, _row_count: usize) -> Result<(), GenerationError> {
        let data: CompanyData = embedded_json("company.json")?;
        if data.stems.is_empty() || data.suffixes.is_empty() {
            return Err(GenerationError::Asset(
                "company dataset is missing stems or suffixes".to_string(),
            ));
        }
        self.stems = data.stems;
        self.suffixes = data.suffixes;
        Ok(())
    }

    fn value_by_id(&self, id: &str) -> Result<Value, GenerationError> {
        if let Some((stem, suffix)) = id.rsplit_once(' ')
            && self.stems.iter().any(|entry| entry == stem)
            && self.suffixes.iter().any(|entry| entry == suffix)
        {
            return Ok(Value::Text(id.to_string()));
        }
        Err(GenerationError::UnknownValueId {
            provider: self.id().to_string(),
            id: id.to_string(),
        })
    }

    fn row_value(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let stems = &self.stems;
        let suffixes = &self.suffixes;
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            let stem = stems.choose(rng).cloned().unwrap_or_default();
            let suffix = suffixes.choose(rng).cloned().unwrap_or_default();
            Value::Text(format!("{stem} {suffix}"))
        })
    }
}
