use chrono::{Duration, NaiveDate};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use datasmith_core::{Value, ValueKind, WeightedRange};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::providers::{
    draw_avoiding, draw_outside_ranges, Params, Provider, ProviderRegistry,
};

const DEFAULT_INT_MIN: i64 = 0;
const DEFAULT_INT_MAX: i64 = 10000;
const DEFAULT_FLOAT_MIN: f64 = 0.0;
const DEFAULT_FLOAT_MAX: f64 = 10000.0;
const DEFAULT_TEXT_MIN_LEN: usize = 6;
const DEFAULT_TEXT_MAX_LEN: usize = 16;
const DEFAULT_MAX_REPEAT: u32 = 32;
const DEFAULT_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const DEFAULT_DATE_MIN: &str = "2024-01-01";
const DEFAULT_DATE_MAX: &str = "2025-01-01";

pub fn register(registry: &mut ProviderRegistry) {
    registry.register("primitive.bool", |params| {
        Params::new("primitive.bool", params, &[])?;
        Ok(Box::new(BoolProvider::new()))
    });
    registry.register("primitive.int", |params| {
        Ok(Box::new(IntProvider::from_params(params)?))
    });
    registry.register("primitive.float", |params| {
        Ok(Box::new(FloatProvider::from_params(params)?))
    });
    registry.register("primitive.date", |params| {
        Ok(Box::new(DateProvider::from_params(params)?))
    });
    registry.register("primitive.text", |params| {
        Ok(Box::new(TextProvider::from_params(params)?))
    });
    registry.register("primitive.text.pattern", |params| {
        Ok(Box::new(TextPatternProvider::from_params(params)?))
    });
    registry.register("primitive.uuid", |params| {
        Params::new("primitive.uuid", params, &[])?;
        Ok(Box::new(UuidProvider::new()))
    });
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}

pub struct BoolProvider {
    rng: ChaCha8Rng,
}

impl BoolProvider {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl Default for BoolProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for BoolProvider {
    fn id(&self) -> &'static str {
        "primitive.bool"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Bool
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn row_value(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || Value::Bool(rng.random_bool(0.5)))
    }
}

pub struct IntProvider {
    min: i64,
    max: i64,
    rng: ChaCha8Rng,
}

impl IntProvider {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    fn from_params(raw: Option<&serde_json::Value>) -> Result<Self, GenerationError> {
        let params = Params::new("primitive.int", raw, &["min", "max"])?;
        let min = params.i64("min", DEFAULT_INT_MIN)?;
        let max = params.i64("max", DEFAULT_INT_MAX)?;
        if min > max {
            return Err(GenerationError::InvalidParams {
                provider: "primitive.int".to_string(),
                reason: "min must be <= max".to_string(),
            });
        }
        Ok(Self::new(min, max))
    }

    fn int_bounds(&self, min: &Value, max: &Value) -> Result<(i64, i64), GenerationError> {
        match (min.as_i64(), max.as_i64()) {
            (Some(min), Some(max)) if min < max => Ok((min, max)),
            _ => Err(GenerationError::InvalidParams {
                provider: self.id().to_string(),
                reason: "range bounds must be int values with min < max".to_string(),
            }),
        }
    }
}

impl Provider for IntProvider {
    fn id(&self) -> &'static str {
        "primitive.int"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Int
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn row_value(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let (min, max) = (self.min, self.max);
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            Value::Int(rng.random_range(min..=max))
        })
    }

    fn ranged_value(
        &mut self,
        min: &Value,
        max: &Value,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let (min, max) = self.int_bounds(min, max)?;
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            Value::Int(rng.random_range(min..max))
        })
    }

    fn row_value_outside(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded_ranges: &[WeightedRange],
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let (min, max) = (self.min, self.max);
        let id = self.id();
        let rng = &mut self.rng;
        draw_outside_ranges(id, excluded_ranges, excluded, || {
            Value::Int(rng.random_range(min..=max))
        })
    }
}

pub struct FloatProvider {
    min: f64,
    max: f64,
    rng: ChaCha8Rng,
}

impl FloatProvider {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    fn from_params(raw: Option<&serde_json::Value>) -> Result<Self, GenerationError> {
        let params = Params::new("primitive.float", raw, &["min", "max"])?;
        let min = params.f64("min", DEFAULT_FLOAT_MIN)?;
        let max = params.f64("max", DEFAULT_FLOAT_MAX)?;
        if min > max {
            return Err(GenerationError::InvalidParams {
                provider: "primitive.float".to_string(),
                reason: "min must be <= max".to_string(),
            });
        }
        Ok(Self::new(min, max))
    }

    fn float_bounds(&self, min: &Value, max: &Value) -> Result<(f64, f64), GenerationError> {
        match (min.as_f64(), max.as_f64()) {
            (Some(min), Some(max)) if min < max => Ok((min, max)),
            _ => Err(GenerationError::InvalidParams {
                provider: self.id().to_string(),
                reason: "range bounds must be float values with min < max".to_string(),
            }),
        }
    }
}

impl Provider for FloatProvider {
    fn id(&self) -> &'static str {
        "primitive.float"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Float
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn row_value(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let (min, max) = (self.min, self.max);
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            Value::Float(rng.random_range(min..=max))
        })
    }

    fn ranged_value(
        &mut self,
        min: &Value,
        max: &Value,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let (min, max) = self.float_bounds(min, max)?;
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            Value::Float(rng.random_range(min..max))
        })
    }

    fn row_value_outside(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded_ranges: &[WeightedRange],
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let (min, max) = (self.min, self.max);
        let id = self.id();
        let rng = &mut self.rng;
        draw_outside_ranges(id, excluded_ranges, excluded, || {
            Value::Float(rng.random_range(min..=max))
        })
    }
}

pub struct DateProvider {
    min: NaiveDate,
    max: NaiveDate,
    rng: ChaCha8Rng,
}

impl DateProvider {
    pub fn new(min: NaiveDate, max: NaiveDate) -> Self {
        Self {
            min,
            max,
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    fn from_params(raw: Option<&serde_json::Value>) -> Result<Self, GenerationError> {
        let params = Params::new("primitive.date", raw, &["min", "max"])?;
        let min = parse_date("primitive.date", &params.str("min", DEFAULT_DATE_MIN)?)?;
        let max = parse_date("primitive.date", &params.str("max", DEFAULT_DATE_MAX)?)?;
        if min > max {
            return Err(GenerationError::InvalidParams {
                provider: "primitive.date".to_string(),
                reason: "min must be <= max".to_string(),
            });
        }
        Ok(Self::new(min, max))
    }

    fn date_bounds(&self, min: &Value, max: &Value) -> Result<(NaiveDate, NaiveDate), GenerationError> {
        match (min.as_date(), max.as_date()) {
            (Some(min), Some(max)) if min < max => Ok((min, max)),
            _ => Err(GenerationError::InvalidParams {
                provider: self.id().to_string(),
                reason: "range bounds must be date values with min < max".to_string(),
            }),
        }
    }
}

fn parse_date(provider: &str, raw: &str) -> Result<NaiveDate, GenerationError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| GenerationError::InvalidParams {
        provider: provider.to_string(),
        reason: format!("invalid date '{raw}': {err}"),
    })
}

impl Provider for DateProvider {
    fn id(&self) -> &'static str {
        "primitive.date"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Date
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn row_value(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let min = self.min;
        let span = (self.max - self.min).num_days().max(0);
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            Value::Date(min + Duration::days(rng.random_range(0..=span)))
        })
    }

    fn ranged_value(
        &mut self,
        min: &Value,
        max: &Value,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let (min, max) = self.date_bounds(min, max)?;
        let span = (max - min).num_days().max(1);
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            Value::Date(min + Duration::days(rng.random_range(0..span)))
        })
    }

    fn row_value_outside(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded_ranges: &[WeightedRange],
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let min = self.min;
        let span = (self.max - self.min).num_days().max(0);
        let id = self.id();
        let rng = &mut self.rng;
        draw_outside_ranges(id, excluded_ranges, excluded, || {
            Value::Date(min + Duration::days(rng.random_range(0..=span)))
        })
    }
}

pub struct TextProvider {
    min_len: usize,
    max_len: usize,
    charset: Vec<char>,
    rng: ChaCha8Rng,
}

impl TextProvider {
    fn from_params(raw: Option<&serde_json::Value>) -> Result<Self, GenerationError> {
        let params = Params::new("primitive.text", raw, &["min_len", "max_len", "charset"])?;
        let min_len = params.usize("min_len", DEFAULT_TEXT_MIN_LEN)?;
        let max_len = params.usize("max_len", DEFAULT_TEXT_MAX_LEN)?;
        let charset: Vec<char> = params.str("charset", DEFAULT_CHARSET)?.chars().collect();
        if min_len > max_len || charset.is_empty() {
            return Err(GenerationError::InvalidParams {
                provider: "primitive.text".to_string(),
                reason: "min_len must be <= max_len and charset non-empty".to_string(),
            });
        }
        Ok(Self {
            min_len,
            max_len,
            charset,
            rng: ChaCha8Rng::from_os_rng(),
        })
    }
}

impl Provider for TextProvider {
    fn id(&self) -> &'static str {
        "primitive.text"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn row_value(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let (min_len, max_len) = (self.min_len, self.max_len);
        let charset = &self.charset;
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            let len = rng.random_range(min_len..=max_len);
            let text: String = (0..len)
                .map(|_| charset[rng.random_range(0..charset.len())])
                .collect();
            Value::Text(text)
        })
    }
}

pub struct TextPatternProvider {
    sampler: rand_regex::Regex,
    matcher: regex::Regex,
    rng: ChaCha8Rng,
}

impl TextPatternProvider {
    fn from_params(raw: Option<&serde_json::Value>) -> Result<Self, GenerationError> {
        let params = Params::new("primitive.text.pattern", raw, &["pattern", "max_repeat"])?;
        let pattern = params.require_str("pattern")?;
        let max_repeat = params.usize("max_repeat", DEFAULT_MAX_REPEAT as usize)? as u32;

        let sampler = rand_regex::Regex::compile(&pattern, max_repeat).map_err(|err| {
            GenerationError::InvalidParams {
                provider: "primitive.text.pattern".to_string(),
                reason: format!("invalid pattern '{pattern}': {err}"),
            }
        })?;
        let matcher = regex::Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
            GenerationError::InvalidParams {
                provider: "primitive.text.pattern".to_string(),
                reason: format!("invalid pattern '{pattern}': {err}"),
            }
        })?;

        Ok(Self {
            sampler,
            matcher,
            rng: ChaCha8Rng::from_os_rng(),
        })
    }
}

impl Provider for TextPatternProvider {
    fn id(&self) -> &'static str {
        "primitive.text.pattern"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn value_by_id(&self, id: &str) -> Result<Value, GenerationError> {
        if self.matcher.is_match(id) {
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
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let sampler = &self.sampler;
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            Value::Text(rng.sample::<String, _>(sampler))
        })
    }
}

pub struct UuidProvider {
    rng: ChaCha8Rng,
}

impl UuidProvider {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl Default for UuidProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for UuidProvider {
    fn id(&self) -> &'static str {
        "primitive.uuid"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Uuid
    }

    fn initialize_randomizer(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
    }

    fn row_value(
        &mut self,
        _ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let id = self.id();
        let rng = &mut self.rng;
        draw_avoiding(id, excluded, || {
            let mut bytes = [0_u8; 16];
            rng.fill_bytes(&mut bytes);
            bytes[6] = (bytes[6] & 0x0f) | 0x40;
            bytes[8] = (bytes[8] & 0x3f) | 0x80;
            Value::Uuid(uuid::Uuid::from_bytes(bytes).to_string())
        })
    }
}
