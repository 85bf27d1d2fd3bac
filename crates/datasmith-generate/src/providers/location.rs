use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::warn;

use datasmith_core::{Property, Value, ValueKind};

use crate::assets::embedded_json;
use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::providers::{draw_avoiding, Params, Provider, ProviderRegistry};

pub fn register(registry: &mut ProviderRegistry) {
    registry.register("location.country", |params| {
        Params::new("location.country", params, &[])?;
        Ok(Box::new(CountryProvider::new()))
    });
    registry.register("location.city", |params| {
        Params::new("location.city", params, &[])?;
        Ok(Box::new(CityProvider::new()))
    });
}

#[derive(Debug, Clone, Deserialize)]
struct Country {
    code: String,
    name: String,
    cities: Vec<String>,
}

fn load_countries() -> Result<Vec<Country>, GenerationError> {
    let countries: Vec<Country> = embedded_json("world.json")?;
    if countries.is_empty() {
        return Err(GenerationError::Asset("world dataset is empty".to_string()));
    }
    Ok(countries)
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}

/// Country provider over the embedded world dataset.
///
/// Value ids are ISO country codes, so weighted declarations survive the
/// id round-trip even when spelled by display name.
pub struct CountryProvider {
    countries: Vec<Country>,
    rng: ChaCha8Rng,
}

impl CountryProvider {
    pub fn new() -> Self {
        Self {
            countries: Vec::new(),
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl Default for CountryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for CountryProvider {
    fn id(&self) -> &'static str {
        "location.country"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn load(&mut self, _property: &Property, _row_count: usize) -> Result<(), GenerationError> {
        self.countries = load_countries()?;
        Ok(())
    }

    fn value_id(&self, value: &Value) -> Result<String, GenerationError> {
        let name = value.as_str().unwrap_or_default();
        self.countries
            .iter()
            .find(|country| country.name == name)
            .map(|country| country.code.clone())
            .ok_or_else(|| GenerationError::UnknownValueId {
                provider: self.id().to_string(),
                id: name.to_string(),
            })
    }

    fn value_by_id(&self, id: &str) -> Result<Value, GenerationError> {
        self.countries
            .iter()
            .find(|country| country.code == id)
            .map(|country| Value::Text(country.name.clone()))
            .ok_or_else(|| GenerationError::UnknownValueId {
                provider: self.id().to_string(),
                id: id.to_string(),
            })
    }

    fn row_value(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let countries = &self.countries;
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            Value::Text(
                countries
                    .choose(rng)
                    .map(|country| country.name.clone())
                    .unwrap_or_default(),
            )
        })
    }
}

/// City provider.
///
/// With a bound `country` argument the pick is restricted to cities of the
/// current row's country; an unknown country falls back to the full city
/// list (provider-local policy, logged as a warning).
pub struct CityProvider {
    countries: Vec<Country>,
    rng: ChaCha8Rng,
}

impl CityProvider {
    pub fn new() -> Self {
        Self {
            countries: Vec::new(),
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

fn all_cities(countries: &[Country]) -> Vec<&String> {
    countries
        .iter()
        .flat_map(|country| country.cities.iter())
        .collect()
}

impl Default for CityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for CityProvider {
    fn id(&self) -> &'static str {
        "location.city"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn load(&mut self, _property: &Property, _row_count: usize) -> Result<(), GenerationError> {
        self.countries = load_countries()?;
        Ok(())
    }

    fn supported_arguments(&self) -> &[(&'static str, ValueKind)] {
        &[("country", ValueKind::Text)]
    }

    fn value_by_id(&self, id: &str) -> Result<Value, GenerationError> {
        if self
            .countries
            .iter()
            .any(|country| country.cities.iter().any(|city| city == id))
        {
            Ok(Value::Text(id.to_string()))
        } else {
            Err(GenerationError::UnknownValueId {
                provider: self.id().to_string(),
                id: id.to_string(),
            })
        }
    }

    fn row_value(
        &mut self,
        ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let countries = &self.countries;
        let pool: Vec<&String> = if ctx.has_argument("country") {
            let country_name = ctx.argument_str("country")?;
            match countries
                .iter()
                .find(|country| country.name == country_name)
            {
                Some(country) => country.cities.iter().collect(),
                None => {
                    warn!(
                        country = %country_name,
                        property = %ctx.property().id,
                        "unknown country, falling back to full city list"
                    );
                    all_cities(countries)
                }
            }
        } else {
            all_cities(countries)
        };

        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            Value::Text(pool.choose(rng).map(|city| (*city).clone()).unwrap_or_default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn loaded<P: Provider>(mut provider: P) -> P {
        provider
            .load(&Property::new("place", ValueKind::Text), 10)
            .unwrap();
        provider.initialize_randomizer(Some(9));
        provider
    }

    #[test]
    fn country_ids_round_trip_through_codes() {
        let provider = loaded(CountryProvider::new());
        let id = provider.value_id(&Value::Text("Brazil".into())).unwrap();
        assert_eq!(id, "BR");
        assert_eq!(
            provider.value_by_id("BR").unwrap(),
            Value::Text("Brazil".into())
        );
        assert!(provider.value_by_id("XX").is_err());
        assert!(provider.value_id(&Value::Text("Atlantis".into())).is_err());
    }

    #[test]
    fn city_respects_bound_country_argument() {
        let mut provider = loaded(CityProvider::new());
        let property =
            Property::new("city", ValueKind::Text).with_argument("country", ["country"]);
        let row = HashMap::from([("country".to_string(), Value::Text("Portugal".into()))]);
        let kinds = HashMap::from([("country".to_string(), ValueKind::Text)]);
        let ctx = GenerationContext::new(0, 10, &property, &row, &kinds);

        let portugal_cities = ["Lisbon", "Porto", "Braga", "Coimbra", "Faro", "Aveiro"];
        for _ in 0..50 {
            let value = provider.row_value(&ctx, &[]).unwrap();
            assert!(portugal_cities.contains(&value.as_str().unwrap()));
        }
    }

    #[test]
    fn city_without_argument_draws_from_full_list() {
        let mut provider = loaded(CityProvider::new());
        let property = Property::new("city", ValueKind::Text);
        let row = HashMap::new();
        let kinds = HashMap::new();
        let ctx = GenerationContext::new(0, 10, &property, &row, &kinds);

        let value = provider.row_value(&ctx, &[]).unwrap();
        assert!(provider.value_by_id(value.as_str().unwrap()).is_ok());
    }
}
