use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use datasmith_core::{Property, Value, ValueKind};

use crate::assets::embedded_json;
use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::providers::{draw_avoiding, Params, Provider, ProviderRegistry};

pub fn register(registry: &mut ProviderRegistry) {
    registry.register("person.first_name", |params| {
        Params::new("person.first_name", params, &[])?;
        Ok(Box::new(NamePartProvider::first_names()))
    });
    registry.register("person.last_name", |params| {
        Params::new("person.last_name", params, &[])?;
        Ok(Box::new(NamePartProvider::last_names()))
    });
    registry.register("person.full_name", |params| {
        Params::new("person.full_name", params, &[])?;
        Ok(Box::new(FullNameProvider::new()))
    });
    registry.register("person.email", |params| {
        Params::new("person.email", params, &[])?;
        Ok(Box::new(EmailProvider::new()))
    });
}

#[derive(Debug, Clone, Deserialize)]
struct PersonData {
    first_names: Vec<String>,
    last_names: Vec<String>,
    email_domains: Vec<String>,
}

fn load_person_data() -> Result<PersonData, GenerationError> {
    let data: PersonData = embedded_json("person.json")?;
    if data.first_names.is_empty() || data.last_names.is_empty() || data.email_domains.is_empty() {
        return Err(GenerationError::Asset(
            "person dataset is missing names or domains".to_string(),
        ));
    }
    Ok(data)
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}

/// First-name or last-name provider over the embedded person dataset.
pub struct NamePartProvider {
    id: &'static str,
    names: Vec<String>,
    rng: ChaCha8Rng,
}

impl NamePartProvider {
    pub fn first_names() -> Self {
        Self {
            id: "person.first_name",
            names: Vec::new(),
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    pub fn last_names() -> Self {
        Self {
            id: "person.last_name",
            names: Vec::new(),
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl Provider for NamePartProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn load(&mut self, _property: &Property, _row_count: usize) -> Result<(), GenerationError> {
        let data = load_person_data()?;
        self.names = if self.id == "person.first_name" {
            data.first_names
        } else {
            data.last_names
        };
        Ok(())
    }

    fn value_by_id(&self, id: &str) -> Result<Value, GenerationError> {
        if self.names.iter().any(|name| name == id) {
            Ok(Value::Text(id.to_string()))
        } else {
            Err(GenerationError::UnknownValueId {
                provider: self.id.to_string(),
                id: id.to_string(),
            })
        }
    }

    fn row_value(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let names = &self.names;
        let rng = &mut self.rng;
        draw_avoiding(self.id, excluded, || {
            Value::Text(names.choose(rng).cloned().unwrap_or_default())
        })
    }
}

/// Full-name provider combining first and last names.
pub struct FullNameProvider {
    first: Vec<String>,
    last: Vec<String>,
    rng: ChaCha8Rng,
}

impl FullNameProvider {
    pub fn new() -> Self {
        Self {
            first: Vec::new(),
            last: Vec::new(),
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl Default for FullNameProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for FullNameProvider {
    fn id(&self) -> &'static str {
        "person.full_name"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn load(&mut self, _property: &Property, _row_count: usize) -> Result<(), GenerationError> {
        let data = load_person_data()?;
        self.first = data.first_names;
        self.last = data.last_names;
        Ok(())
    }

    fn value_by_id(&self, id: &str) -> Result<Value, GenerationError> {
        if let Some((first, last)) = id.split_once(' ')
            && self.first.iter().any(|name| name == first)
            && self.last.iter().any(|name| name == last)
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
        let first = &self.first;
        let last = &self.last;
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            let first = first.choose(rng).cloned().unwrap_or_default();
            let last = last.choose(rng).cloned().unwrap_or_default();
            Value::Text(format!("{first} {last}"))
        })
    }
}

/// Email provider.
///
/// When the property binds a `name` argument the address is derived from the
/// sibling's generated name; otherwise a name is drawn through an internal
/// full-name source via a detached single-row context.
pub struct EmailProvider {
    name_source: FullNameProvider,
    name_property: Property,
    domains: Vec<String>,
    rng: ChaCha8Rng,
}

impl EmailProvider {
    pub fn new() -> Self {
        Self {
            name_source: FullNameProvider::new(),
            name_property: Property::new("person.full_name", ValueKind::Text),
            domains: Vec::new(),
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl Default for EmailProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for EmailProvider {
    fn id(&self) -> &'static str {
        "person.email"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
        self.name_source
            .initialize_randomizer(seed.map(|seed| seed.rotate_left(17)));
    }

    fn load(&mut self, property: &Property, row_count: usize) -> Result<(), GenerationError> {
        let data = load_person_data()?;
        self.domains = data.email_domains;
        self.name_source.load(property, row_count)
    }

    fn supported_arguments(&self) -> &[(&'static str, ValueKind)] {
        &[("name", ValueKind::Text)]
    }

    fn row_value(
        &mut self,
        ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let base = if ctx.has_argument("name") {
            slugify(&ctx.argument_str("name")?)
        } else {
            let detached = GenerationContext::detached(&self.name_property);
            let name = self.name_source.row_value(&detached, &[])?;
            slugify(name.as_str().unwrap_or_default())
        };
        let base = if base.is_empty() {
            "user".to_string()
        } else {
            base
        };

        let domains = &self.domains;
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            let number = rng.random_range(1..=9999);
            let domain = domains.choose(rng).cloned().unwrap_or_default();
            Value::Text(format!("{base}{number}@{domain}"))
        })
    }
}

/// Lowercase a display name into an address-safe local part.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_separator = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            slug.push('.');
            last_was_separator = true;
        }
    }
    slug.trim_matches('.').to_string()
}
